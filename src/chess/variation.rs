use shakmaty::Move;
use smallvec::SmallVec;

use super::engine::PositionEngine;
use super::error::ParseError;
use super::state::ParseState;

pub type MoveList = SmallVec<[Move; 128]>;
pub type HashList = SmallVec<[u64; 128]>;

/// Moves of one line of play, counted from the start of the game, with the
/// running hash after each of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    pub moves: MoveList,
    pub hashes: HashList,
}

impl Line {
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn clear(&mut self) {
        self.moves.clear();
        self.hashes.clear();
    }

    pub fn truncate(&mut self, len: usize) {
        self.moves.truncate(len);
        self.hashes.truncate(len);
    }

    pub fn push(&mut self, m: Move, hash: u64) {
        self.moves.push(m);
        self.hashes.push(hash);
    }

    /// Running hash after the last recorded move.
    pub fn last_hash(&self, seed: u64) -> u64 {
        self.hashes.last().copied().unwrap_or(seed)
    }
}

/// Where scanning resumes in the parent line after `)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnPoint {
    pub state: ParseState,
    pub move_number: u32,
}

/// One open `(`: the parent's position at the point of divergence and the
/// line being built inside the variation.
#[derive(Debug, Clone)]
pub struct VariationFrame<E> {
    pub return_point: ReturnPoint,
    pub position_snapshot: E,
    pub line: Line,
}

#[derive(Debug, Clone)]
pub struct VariationStack<E> {
    main: Line,
    frames: Vec<VariationFrame<E>>,
    max_depth: usize,
}

impl<E: PositionEngine> VariationStack<E> {
    /// `max_depth` counts the main line as one level.
    pub fn new(max_depth: usize) -> Self {
        Self {
            main: Line::default(),
            frames: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    pub fn reset(&mut self) {
        self.main.clear();
        self.frames.clear();
    }

    /// Open variations; 0 on the main line.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn main_line(&self) -> &Line {
        &self.main
    }

    pub fn take_main_line(&mut self) -> Line {
        std::mem::take(&mut self.main)
    }

    pub fn current(&self) -> &Line {
        self.frames.last().map_or(&self.main, |frame| &frame.line)
    }

    pub fn current_mut(&mut self) -> &mut Line {
        match self.frames.last_mut() {
            Some(frame) => &mut frame.line,
            None => &mut self.main,
        }
    }

    /// Enters `(`. The new line starts as a copy of the current one and the
    /// engine position is saved for `pop`.
    pub fn push(&mut self, return_point: ReturnPoint, engine: &E) -> Result<(), ParseError> {
        if self.frames.len() + 1 >= self.max_depth {
            return Err(ParseError::VariationTooDeep(self.max_depth));
        }
        let line = self.current().clone();
        self.frames.push(VariationFrame {
            return_point,
            position_snapshot: engine.clone(),
            line,
        });
        Ok(())
    }

    /// Leaves `)`, restoring the engine to the position saved by `push`.
    pub fn pop(&mut self, engine: &mut E) -> Result<ReturnPoint, ParseError> {
        let frame = self.frames.pop().ok_or(ParseError::TooManyPops)?;
        *engine = frame.position_snapshot;
        Ok(frame.return_point)
    }
}
