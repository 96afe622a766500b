use std::io::{self, Write};
use std::ops::ControlFlow;

use serde_json::{Value, json};
use tracing::warn;

use super::dispatch::GameConsumer;
use super::engine::{PositionEngine, ShakmatyEngine};
use super::types::GameRecord;

fn opt_str(s: &str) -> Value {
    if s.is_empty() {
        Value::Null
    } else {
        Value::String(s.to_string())
    }
}

/// SAN of every main-line move, replayed from the game's starting position.
pub fn san_moves(game: &GameRecord) -> Option<Vec<String>> {
    let mut engine = ShakmatyEngine::new();
    if let Some(fen) = game.fen() {
        engine.load_fen(fen).ok()?;
    }
    let sans = game
        .moves
        .iter()
        .map(|&m| {
            let san = engine.san(m);
            engine.apply(m);
            san
        })
        .collect();
    Some(sans)
}

pub fn game_to_json(game: &GameRecord) -> Value {
    let moves = san_moves(game);
    if moves.is_none() {
        warn!(fen = game.fen(), "cannot replay moves from starting position");
    }
    let hashes: Vec<String> = game.hashes.iter().map(|h| format!("{h:016x}")).collect();

    json!({
        "event": opt_str(&game.event),
        "site": opt_str(&game.site),
        "date": opt_str(&game.date),
        "date_value": game.date_value().map(|d| d.to_string()),
        "round": opt_str(&game.round),
        "white": opt_str(&game.white),
        "black": opt_str(&game.black),
        "result": opt_str(&game.result),
        "white_elo": game.white_elo_value(),
        "black_elo": game.black_elo_value(),
        "eco": opt_str(&game.eco),
        "fen": game.fen(),
        "first_move_offset": game.first_move_offset,
        "moves": moves,
        "hashes": hashes,
        "diagnostics": game.diagnostics,
    })
}

/// Writes one JSON object per game, newline separated.
///
/// A write failure aborts the stream; the error is kept for
/// [`JsonLines::finish`].
#[derive(Debug)]
pub struct JsonLines<W: Write> {
    out: W,
    written: u64,
    error: Option<io::Error>,
}

impl<W: Write> JsonLines<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            written: 0,
            error: None,
        }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    fn write_game(&mut self, game: &GameRecord) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, &game_to_json(game))?;
        self.out.write_all(b"\n")
    }

    /// Flushes and returns the writer, or the first write error.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> GameConsumer for JsonLines<W> {
    fn game(&mut self, game: &GameRecord) -> ControlFlow<()> {
        match self.write_game(game) {
            Ok(()) => {
                self.written += 1;
                ControlFlow::Continue(())
            }
            Err(err) => {
                warn!(error = %err, "json output failed");
                self.error = Some(err);
                ControlFlow::Break(())
            }
        }
    }

    fn stream_complete(&mut self, _total_games: u64) {
        if let Err(err) = self.out.flush() {
            self.error.get_or_insert(err);
        }
    }
}
