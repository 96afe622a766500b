use thiserror::Error;

use super::engine::EngineError;

/// Collects non-fatal diagnostics for the game being parsed.
#[derive(Debug, Clone, Default)]
pub struct ErrorAccumulator(Option<String>);

impl ErrorAccumulator {
    pub fn push(&mut self, msg: &str) {
        match &mut self.0 {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(msg);
            }
            None => {
                self.0 = Some(msg.to_string());
            }
        }
    }

    pub fn take(&mut self) -> Option<String> {
        self.0.take()
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

/// A failure that aborts the current game only. The stream resumes at the
/// next game boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("bad move number '{0}'")]
    BadMoveNumber(String),
    #[error("internal buffer overflow ({0} chars)")]
    BufferOverflow(usize),
    #[error("too many pops: ')' without matching '('")]
    TooManyPops,
    #[error("variation nesting exceeds {0} levels")]
    VariationTooDeep(usize),
    #[error("{0} variation(s) left open at end of game")]
    UnclosedVariation(usize),
    #[error("move synchronization: ply {index} but only {count} moves recorded")]
    MoveSync { index: usize, count: usize },
    #[error("move at ply {ply} precedes the first move of the game (ply {first})")]
    MoveBeforeStart { ply: usize, first: usize },
    #[error("empty move after stripping annotation glyphs from '{0}'")]
    EmptyMove(String),
    #[error("cannot convert move '{text}': {source}")]
    IllegalMove { text: String, source: EngineError },
    #[error("game too big: more than {0} plies")]
    GameTooBig(usize),
    #[error("bad starting position: {0}")]
    BadFen(EngineError),
}

impl ParseError {
    /// Stable name used for per-kind counters.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadMoveNumber(_) => "bad_move_number",
            Self::BufferOverflow(_) => "buffer_overflow",
            Self::TooManyPops => "too_many_pops",
            Self::VariationTooDeep(_) => "variation_too_deep",
            Self::UnclosedVariation(_) => "unclosed_variation",
            Self::MoveSync { .. } => "move_sync",
            Self::MoveBeforeStart { .. } => "move_before_start",
            Self::EmptyMove(_) => "empty_move",
            Self::IllegalMove { .. } => "illegal_move",
            Self::GameTooBig(_) => "game_too_big",
            Self::BadFen(_) => "bad_fen",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorAccumulator, ParseError};

    #[test]
    fn test_push_single_message() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("first error");

        assert_eq!(accumulator.take().as_deref(), Some("first error"));
    }

    #[test]
    fn test_push_multiple_messages_uses_separator() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("first");
        accumulator.push("second");

        assert_eq!(accumulator.take().as_deref(), Some("first; second"));
    }

    #[test]
    fn test_take_consumes_accumulator() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("error");

        assert_eq!(accumulator.take().as_deref(), Some("error"));
        assert!(accumulator.is_empty());
        assert!(accumulator.take().is_none());
    }

    #[test]
    fn test_clear_discards_messages() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("stale");
        accumulator.clear();

        assert!(accumulator.is_empty());
        accumulator.push("fresh");
        assert_eq!(accumulator.take().as_deref(), Some("fresh"));
    }

    #[test]
    fn test_parse_error_display_and_kind() {
        let err = ParseError::MoveSync { index: 16, count: 6 };
        assert_eq!(err.kind(), "move_sync");
        assert_eq!(
            err.to_string(),
            "move synchronization: ply 16 but only 6 moves recorded"
        );
        assert_eq!(ParseError::TooManyPops.kind(), "too_many_pops");
    }
}
