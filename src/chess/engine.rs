use shakmaty::{
    CastlingMode, Chess, EnPassantMode, Move, Position,
    fen::Fen,
    san::{San, SanPlus},
    zobrist::Zobrist64,
};
use thiserror::Error;

/// Value of the running hash before the first move of every game.
pub const HASH_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid FEN '{fen}': {reason}")]
    Fen { fen: String, reason: String },
    #[error("{0}")]
    Move(String),
}

/// Rules engine driven by the game lexer.
///
/// The lexer owns one engine per stream and snapshots it (via `Clone`) when
/// entering a variation.
pub trait PositionEngine: Clone {
    /// Standard initial position.
    fn reset(&mut self);

    fn load_fen(&mut self, fen: &str) -> Result<(), EngineError>;

    /// Resolves algebraic move text against the current position.
    fn parse_natural(&self, text: &str) -> Result<Move, EngineError>;

    /// Folds `m` into `running`. Must be called *before* `apply(m)`.
    fn hash_update(&self, running: u64, m: Move) -> u64;

    fn apply(&mut self, m: Move);
}

#[derive(Debug, Clone, Default)]
pub struct ShakmatyEngine {
    pos: Chess,
}

impl ShakmatyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> &Chess {
        &self.pos
    }

    pub fn fen(&self) -> String {
        Fen::from_position(&self.pos, EnPassantMode::Legal).to_string()
    }

    /// SAN of `m` in the current position.
    pub fn san(&self, m: Move) -> String {
        San::from_move(&self.pos, m).to_string()
    }
}

impl PositionEngine for ShakmatyEngine {
    fn reset(&mut self) {
        self.pos = Chess::default();
    }

    fn load_fen(&mut self, fen: &str) -> Result<(), EngineError> {
        let fen = fen.trim();
        let setup = Fen::from_ascii(fen.as_bytes()).map_err(|e| EngineError::Fen {
            fen: fen.to_string(),
            reason: e.to_string(),
        })?;
        self.pos = setup
            .into_position(CastlingMode::Standard)
            .map_err(|e| EngineError::Fen {
                fen: fen.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn parse_natural(&self, text: &str) -> Result<Move, EngineError> {
        let san_plus =
            SanPlus::from_ascii(text.as_bytes()).map_err(|e| EngineError::Move(e.to_string()))?;
        san_plus
            .san
            .to_move(&self.pos)
            .map_err(|e| EngineError::Move(e.to_string()))
    }

    fn hash_update(&self, running: u64, m: Move) -> u64 {
        // XOR of the Zobrist delta, so the seed survives every update.
        match self
            .pos
            .update_zobrist_hash(Zobrist64(running), m, EnPassantMode::Legal)
        {
            Some(updated) => u64::from(updated),
            None => {
                let before: Zobrist64 = self.pos.zobrist_hash(EnPassantMode::Legal);
                let mut after = self.pos.clone();
                after.play_unchecked(m);
                let after: Zobrist64 = after.zobrist_hash(EnPassantMode::Legal);
                running ^ u64::from(before) ^ u64::from(after)
            }
        }
    }

    fn apply(&mut self, m: Move) {
        self.pos.play_unchecked(m);
    }
}
