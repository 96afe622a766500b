//! Streaming PGN parser: splits a PGN stream into games, validates every
//! move (variations included) against a rules engine and hands each clean
//! game's main line, with a running position hash per move, to a consumer.

pub mod chess;

pub use chess::{
    CollectGames, CompressionMode, GameConsumer, GameLexer, GameRecord, JsonLines, NoProgress,
    ParseError, ParserConfig, ProcessStatus, Progress, ProgressReport, ShakmatyEngine,
    StandardStartOnly, StreamSummary, process,
};
