use std::mem;

use super::config::ParserConfig;
use super::engine::{HASH_SEED, PositionEngine, ShakmatyEngine};
use super::error::{ErrorAccumulator, ParseError};
use super::headers::{Tag, extract_value, split_tag_line};
use super::ring::DebugRing;
use super::source::CharSource;
use super::state::{CommentStyle, ParseState};
use super::types::GameRecord;
use super::variation::{ReturnPoint, VariationStack};

pub(crate) const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n')
}

fn is_move_delimiter(c: char) -> bool {
    is_blank(c) || matches!(c, '(' | ')' | '{' | '}' | '$')
}

/// Character-level state machine over one game's movetext.
///
/// Every move is resolved against the engine as it is read; variations are
/// validated too, but only the main line ends up in the game record.
#[derive(Debug)]
pub struct GameLexer<E = ShakmatyEngine> {
    config: ParserConfig,
    engine: E,
    stack: VariationStack<E>,
    record: GameRecord,
    diagnostics: ErrorAccumulator,
    fen_from_reptor: bool,

    state: ParseState,
    saved_state: ParseState,
    comment_style: CommentStyle,
    prev: char,
    move_number: u32,
    field: String,
    move_text: String,
    comment: String,
    comment_len: usize,
    nag: u32,
    ring: Option<DebugRing>,
}

impl<E: PositionEngine + Default> GameLexer<E> {
    pub fn new(config: ParserConfig) -> Self {
        Self::with_engine(config, E::default())
    }
}

impl<E: PositionEngine> GameLexer<E> {
    pub fn with_engine(config: ParserConfig, engine: E) -> Self {
        let ring = config.debug_ring.map(DebugRing::new);
        let stack = VariationStack::new(config.max_variation_depth);
        Self {
            config,
            engine,
            stack,
            record: GameRecord::default(),
            diagnostics: ErrorAccumulator::default(),
            fen_from_reptor: false,
            state: ParseState::MoveNumber,
            saved_state: ParseState::MoveNumber,
            comment_style: CommentStyle::Brace,
            prev: '\n',
            move_number: 0,
            field: String::new(),
            move_text: String::new(),
            comment: String::new(),
            comment_len: 0,
            nag: 0,
            ring,
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Open variations.
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn record(&self) -> &GameRecord {
        &self.record
    }

    /// Value of the last `$n` glyph.
    pub fn last_nag(&self) -> u32 {
        self.nag
    }

    /// Text of the last comment, cut at the configured bound.
    pub fn last_comment(&self) -> &str {
        &self.comment
    }

    /// Recent characters and states, if the ring is enabled.
    pub fn ring_dump(&self) -> Option<String> {
        self.ring.as_ref().map(DebugRing::render)
    }

    /// Resets all per-game state.
    pub fn begin_game(&mut self) {
        self.engine.reset();
        self.stack.reset();
        self.record.clear();
        self.diagnostics.clear();
        self.fen_from_reptor = false;
        self.state = ParseState::MoveNumber;
        self.saved_state = ParseState::MoveNumber;
        self.comment_style = CommentStyle::Brace;
        self.prev = '\n';
        self.move_number = 0;
        self.field.clear();
        self.move_text.clear();
        self.comment.clear();
        self.comment_len = 0;
        self.nag = 0;
        if let Some(ring) = &mut self.ring {
            ring.clear();
        }
    }

    /// Parses a complete game: tag-pair lines, then movetext.
    pub fn parse_game<I, S>(&mut self, tags: I, movetext: &str) -> Result<GameRecord, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.begin_game();
        for line in tags {
            self.tag_line(line.as_ref())?;
        }
        self.movetext(movetext)?;
        Ok(self.finish_game())
    }

    /// Applies one `[Key "Value"]` line. Lines that are not tag pairs and
    /// unknown keys are ignored.
    pub fn tag_line(&mut self, line: &str) -> Result<(), ParseError> {
        let Some(raw) = split_tag_line(line) else {
            return Ok(());
        };
        let Some(tag) = Tag::from_key(raw.key) else {
            return Ok(());
        };

        let value = extract_value(raw.raw, tag.is_restricted(), self.config.max_tag_value);
        if value.truncated {
            self.diagnostics.push(&format!(
                "{} truncated to {} chars",
                raw.key, self.config.max_tag_value
            ));
        }

        let record = &mut self.record;
        let slot = match tag {
            Tag::Event => &mut record.event,
            Tag::Site => &mut record.site,
            Tag::Date => &mut record.date,
            Tag::Round => &mut record.round,
            Tag::White => &mut record.white,
            Tag::Black => &mut record.black,
            Tag::Result => &mut record.result,
            Tag::WhiteElo => &mut record.white_elo,
            Tag::BlackElo => &mut record.black_elo,
            Tag::Eco => &mut record.eco,
            Tag::Desc => &mut record.extra.desc,
            Tag::Desc2 => &mut record.extra.desc2,
            Tag::Name => &mut record.extra.name,
            Tag::Variation => &mut record.extra.variation,
            Tag::MoveOrder => &mut record.extra.move_order,
            Tag::Fen | Tag::FenReptor => return self.set_start_position(tag, &value.text),
        };

        // First non-empty value wins.
        if slot.is_empty() {
            *slot = value.text;
        }
        Ok(())
    }

    fn set_start_position(&mut self, tag: Tag, fen: &str) -> Result<(), ParseError> {
        let fen = fen.trim();
        if fen.is_empty() {
            return Ok(());
        }
        if tag == Tag::Fen && (self.fen_from_reptor || self.record.fen.is_some()) {
            self.diagnostics.push("ignored repeated FEN tag");
            return Ok(());
        }

        self.engine.load_fen(fen).map_err(ParseError::BadFen)?;
        self.record.fen = Some(fen.to_string());
        self.fen_from_reptor |= tag == Tag::FenReptor;
        Ok(())
    }

    /// Runs the state machine over `text` until a result token, an error,
    /// or the end of the text. Running out of text ends the game as if a
    /// result had been read.
    pub fn movetext(&mut self, text: &str) -> Result<(), ParseError> {
        let mut source = CharSource::new(text);
        self.run(&mut source)?;
        if !self.state.is_terminal() {
            // Flush a token that runs up to the end of the text.
            let mut tail = CharSource::new("\n");
            self.run(&mut tail)?;
        }

        let depth = self.stack.depth();
        if depth > 0 {
            self.state = ParseState::Error;
            return Err(ParseError::UnclosedVariation(depth));
        }
        Ok(())
    }

    /// Moves the main line into the record and hands it over.
    pub fn finish_game(&mut self) -> GameRecord {
        let line = self.stack.take_main_line();
        let mut record = mem::take(&mut self.record);
        record.moves = line.moves;
        record.hashes = line.hashes;
        record.diagnostics = self.diagnostics.take();
        record
    }

    fn run(&mut self, source: &mut CharSource<'_>) -> Result<(), ParseError> {
        while let Some(c) = source.next() {
            if let Err(err) = self.step(c, source) {
                self.state = ParseState::Error;
                return Err(err);
            }
            if self.state.is_terminal() {
                break;
            }
        }
        Ok(())
    }

    fn step(&mut self, c: char, source: &mut CharSource<'_>) -> Result<(), ParseError> {
        let state = self.state;
        let prev = mem::replace(&mut self.prev, c);
        if let Some(ring) = &mut self.ring {
            ring.record(c, state);
        }

        if (c == '{' || c == ';') && state.accepts_annotation() {
            self.saved_state = state;
            self.comment_style = if c == '{' {
                CommentStyle::Brace
            } else {
                CommentStyle::Line
            };
            self.comment.clear();
            self.comment_len = 0;
            self.state = ParseState::InComment;
            return Ok(());
        }

        if state == ParseState::InComment {
            let closes = match self.comment_style {
                CommentStyle::Brace => c == '}',
                CommentStyle::Line => c != ';' && prev == '\n',
            };
            if closes {
                if self.comment_style == CommentStyle::Line {
                    // First character of the next line is movetext.
                    source.push_back(c);
                }
                self.state = match self.saved_state {
                    ParseState::InDollar | ParseState::MoveNumber => ParseState::BetweenMoves,
                    saved => saved,
                };
                return Ok(());
            }
        }

        if c == '$' && state.accepts_annotation() && state != ParseState::InDollar {
            self.saved_state = state;
            self.nag = 0;
            self.state = ParseState::InDollar;
            return Ok(());
        }

        if state == ParseState::InDollar {
            if let Some(digit) = c.to_digit(10) {
                self.nag = self.nag.saturating_mul(10).saturating_add(digit);
                return Ok(());
            }
            source.push_back(c);
            self.state = match self.saved_state {
                ParseState::InComment => ParseState::BetweenMoves,
                saved => saved,
            };
            return Ok(());
        }

        if c == '(' && state.accepts_variation() {
            let point = ReturnPoint {
                state,
                move_number: self.move_number,
            };
            self.stack.push(point, &self.engine)?;
            self.state = ParseState::BetweenMoves;
            return Ok(());
        }

        if c == ')' && state.accepts_variation() {
            let point = self.stack.pop(&mut self.engine)?;
            self.state = point.state;
            self.move_number = point.move_number;
            self.field.clear();
            return Ok(());
        }

        match state {
            ParseState::MoveNumber => self.move_number_char(c, source)?,
            ParseState::PostMoveNumber => {
                if c == '.' {
                    self.state = ParseState::PostMoveNumberDot;
                } else if !is_blank(c) {
                    return Err(ParseError::BadMoveNumber(format!("{}{c}", self.move_number)));
                }
            }
            ParseState::PostMoveNumberDot => {
                if c == '.' {
                    self.state = ParseState::PostMoveNumberBlack;
                } else {
                    source.push_back(c);
                    self.state = ParseState::PreMoveWhite;
                }
            }
            ParseState::PostMoveNumberBlack => {
                if c != '.' {
                    source.push_back(c);
                    self.state = ParseState::PreMoveBlack;
                }
            }
            ParseState::PreMoveWhite | ParseState::PreMoveBlack => {
                if c.is_ascii_digit() {
                    source.push_back(c);
                    self.field.clear();
                    self.state = ParseState::MoveNumber;
                } else if !is_blank(c) && c != '}' {
                    source.push_back(c);
                    self.move_text.clear();
                    self.state = if state == ParseState::PreMoveWhite {
                        ParseState::InMoveWhite
                    } else {
                        ParseState::InMoveBlack
                    };
                }
            }
            ParseState::InMoveWhite => self.move_char(c, source, true)?,
            ParseState::InMoveBlack => self.move_char(c, source, false)?,
            ParseState::BetweenMoves => {
                if c.is_ascii_digit() {
                    source.push_back(c);
                    self.field.clear();
                    self.state = ParseState::MoveNumber;
                }
            }
            ParseState::InComment => {
                if self.comment_len < self.config.max_comment {
                    self.comment.push(c);
                    self.comment_len += 1;
                }
            }
            ParseState::InDollar | ParseState::Error | ParseState::NormalExit => {}
        }
        Ok(())
    }

    fn is_result_token(&self, token: &str) -> bool {
        RESULT_TOKENS.contains(&token) || (!self.record.result.is_empty() && token == self.record.result)
    }

    fn move_number_char(&mut self, c: char, source: &mut CharSource<'_>) -> Result<(), ParseError> {
        if c != '.' && !is_blank(c) {
            if self.field.len() >= self.config.max_move_text {
                return Err(ParseError::BufferOverflow(self.config.max_move_text));
            }
            self.field.push(c);
            return Ok(());
        }

        if self.field.is_empty() {
            return Ok(());
        }
        if self.is_result_token(&self.field) {
            self.state = ParseState::NormalExit;
            return Ok(());
        }

        match self.field.parse::<u32>() {
            Ok(number) if number > 0 => {
                self.move_number = number;
                self.field.clear();
                if c == '.' {
                    source.push_back(c);
                }
                self.state = ParseState::PostMoveNumber;
                Ok(())
            }
            _ => Err(ParseError::BadMoveNumber(mem::take(&mut self.field))),
        }
    }

    fn move_char(
        &mut self,
        c: char,
        source: &mut CharSource<'_>,
        white: bool,
    ) -> Result<(), ParseError> {
        if !is_move_delimiter(c) {
            if self.move_text.len() >= self.config.max_move_text {
                return Err(ParseError::BufferOverflow(self.config.max_move_text));
            }
            self.move_text.push(c);
            return Ok(());
        }

        let text = mem::take(&mut self.move_text);
        if text.is_empty() {
            return Ok(());
        }
        if !is_blank(c) {
            source.push_back(c);
        }
        if self.is_result_token(&text) {
            self.state = ParseState::NormalExit;
            return Ok(());
        }

        self.do_move(white, &text)?;
        self.state = if white {
            ParseState::PreMoveBlack
        } else {
            ParseState::BetweenMoves
        };
        Ok(())
    }

    /// Validates `raw` as the move at the current move number and side and
    /// appends it to the current line.
    fn do_move(&mut self, white: bool, raw: &str) -> Result<(), ParseError> {
        let ply = self.move_number.saturating_sub(1) as usize * 2 + usize::from(!white);
        let first = *self.record.first_move_offset.get_or_insert(ply);
        let index = ply
            .checked_sub(first)
            .ok_or(ParseError::MoveBeforeStart { ply, first })?;

        if index >= self.config.max_plies {
            return Err(ParseError::GameTooBig(self.config.max_plies));
        }
        let count = self.stack.current().len();
        if index > count {
            return Err(ParseError::MoveSync { index, count });
        }
        if index < count {
            self.replay(index)?;
        }

        let text = raw.trim_end_matches(['!', '?']);
        if text.is_empty() {
            return Err(ParseError::EmptyMove(raw.to_string()));
        }
        let m = self
            .engine
            .parse_natural(text)
            .map_err(|source| ParseError::IllegalMove {
                text: text.to_string(),
                source,
            })?;

        let line = self.stack.current_mut();
        let hash = self.engine.hash_update(line.last_hash(HASH_SEED), m);
        self.engine.apply(m);
        line.push(m, hash);
        Ok(())
    }

    /// Rebuilds the position before ply `index` of the current line by
    /// replaying it from the game's starting position.
    fn replay(&mut self, index: usize) -> Result<(), ParseError> {
        match self.record.fen() {
            Some(fen) => self.engine.load_fen(fen).map_err(ParseError::BadFen)?,
            None => self.engine.reset(),
        }
        let line = self.stack.current_mut();
        line.truncate(index);
        for &m in &line.moves {
            self.engine.apply(m);
        }
        Ok(())
    }
}
