pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod headers;
pub mod json;
pub mod lexer;
pub mod log;
pub mod reader;
pub mod ring;
pub mod source;
pub mod state;
pub mod types;
pub mod variation;

#[cfg(test)]
mod reference;

pub use config::ParserConfig;
pub use dispatch::{
    CollectGames, GameConsumer, NoProgress, ProcessStatus, Progress, ProgressReport,
    StandardStartOnly, StreamSummary,
};
pub use engine::{EngineError, HASH_SEED, PositionEngine, ShakmatyEngine};
pub use error::{ErrorAccumulator, ParseError};
pub use json::JsonLines;
pub use lexer::GameLexer;
pub use reader::{CompressionMode, GameSplitter, GameText, process};
pub use state::ParseState;
pub use types::{ExtraTags, GameRecord};
