use std::io::{self, BufRead, BufReader, Read};
use std::mem;

use tracing::debug;
use zstd::stream::read::Decoder as ZstdDecoder;

use super::config::ParserConfig;
use super::dispatch::{Dispatcher, GameConsumer, Progress, StreamSummary};
use super::headers::is_tag_line;
use super::lexer::{GameLexer, RESULT_TOKENS};

pub type PgnInput = Box<dyn Read + Send>;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CompressionMode {
    #[default]
    Plain,
    Zstd,
}

impl CompressionMode {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(
                "Invalid compression value ''. Supported values: 'zstd' or omitted.".to_string(),
            );
        }

        if normalized.eq_ignore_ascii_case("zstd") {
            Ok(Self::Zstd)
        } else {
            Err(format!(
                "Invalid compression value '{}'. Supported values: 'zstd' or omitted.",
                normalized
            ))
        }
    }

    /// Wraps `input` in the matching decoder.
    pub fn wrap<R: Read + Send + 'static>(self, input: R) -> io::Result<BufReader<PgnInput>> {
        let input: PgnInput = match self {
            Self::Plain => Box::new(input),
            Self::Zstd => Box::new(ZstdDecoder::new(input)?),
        };
        Ok(BufReader::new(input))
    }
}

/// Tag lines and movetext of one game, as found in the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameText {
    pub tags: Vec<String>,
    pub movetext: String,
}

impl GameText {
    fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.movetext.trim().is_empty()
    }
}

/// Comment and result tracking over the movetext lines of one game.
#[derive(Debug, Default)]
struct MovetextScan {
    in_comment: bool,
    after_result: bool,
}

impl MovetextScan {
    fn end_token(&mut self, token: &mut String) {
        if !token.is_empty() {
            self.after_result = RESULT_TOKENS.contains(&token.as_str());
            token.clear();
        }
    }

    fn feed(&mut self, line: &str) {
        let mut token = String::new();
        for c in line.chars() {
            if self.in_comment {
                self.in_comment = c != '}';
                continue;
            }
            match c {
                '{' => {
                    self.end_token(&mut token);
                    self.in_comment = true;
                }
                ';' => break,
                '(' | ')' => {
                    self.end_token(&mut token);
                    self.after_result = false;
                }
                c if c.is_whitespace() => self.end_token(&mut token),
                c => token.push(c),
            }
        }
        self.end_token(&mut token);
    }
}

/// Splits a PGN stream into games.
///
/// A game ends at a tag line that follows its movetext (or follows the
/// blank line closing a tag block without movetext), and at a blank line
/// after a result token. Lines inside an open `{` comment never end a game.
#[derive(Debug)]
pub struct GameSplitter<R> {
    input: R,
    buf: Vec<u8>,
    pending_tag: Option<String>,
    lines: u64,
}

impl<R: BufRead> GameSplitter<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            buf: Vec::new(),
            pending_tag: None,
            lines: 0,
        }
    }

    /// Lines read so far.
    pub fn lines(&self) -> u64 {
        self.lines
    }

    fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        if self.input.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        self.lines += 1;
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }

        let bytes = mem::take(&mut self.buf);
        let mut line = match String::from_utf8(bytes) {
            Ok(line) => line,
            // Latin-1 maps every byte to the code point of the same value.
            Err(err) => err.as_bytes().iter().map(|&b| char::from(b)).collect(),
        };
        line.retain(|c| c != '\r');
        Ok(Some(line))
    }

    pub fn next_game(&mut self) -> io::Result<Option<GameText>> {
        let mut game = GameText::default();
        let mut in_movetext = false;
        let mut tags_closed = false;
        let mut scan = MovetextScan::default();
        if let Some(tag) = self.pending_tag.take() {
            game.tags.push(tag);
        }

        while let Some(line) = self.next_line()? {
            if !scan.in_comment {
                if line.starts_with('%') {
                    continue;
                }
                if is_tag_line(&line) {
                    if in_movetext || tags_closed {
                        self.pending_tag = Some(line);
                        return Ok(Some(game));
                    }
                    game.tags.push(line);
                    continue;
                }
                if line.trim().is_empty() {
                    if in_movetext && scan.after_result {
                        return Ok(Some(game));
                    }
                    tags_closed |= !in_movetext && !game.tags.is_empty();
                    if !in_movetext {
                        continue;
                    }
                }
            }

            in_movetext = true;
            scan.feed(&line);
            game.movetext.push_str(&line);
            game.movetext.push('\n');
        }

        Ok((!game.is_empty()).then_some(game))
    }
}

impl<R: BufRead> Iterator for GameSplitter<R> {
    type Item = io::Result<GameText>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_game().transpose()
    }
}

/// Parses every game of `input`, hands the clean ones to `consumer` and
/// returns the stream counters.
///
/// Game errors are counted and logged; only I/O errors of the underlying
/// reader end the call with `Err`.
pub fn process<R, C, P>(
    input: R,
    config: &ParserConfig,
    consumer: C,
    progress: P,
) -> io::Result<StreamSummary>
where
    R: BufRead,
    C: GameConsumer,
    P: Progress,
{
    let mut splitter = GameSplitter::new(input);
    let mut lexer: GameLexer = GameLexer::new(config.clone());
    let mut dispatcher = Dispatcher::new(consumer, progress);

    while let Some(text) = splitter.next_game()? {
        let outcome = lexer.parse_game(&text.tags, &text.movetext);
        let ring = match &outcome {
            Ok(_) => None,
            Err(_) => lexer.ring_dump(),
        };
        if dispatcher.game_finished(outcome, ring).is_break() {
            break;
        }
    }

    debug!(lines = splitter.lines(), "input consumed");
    let (summary, _) = dispatcher.finish();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::dispatch::{CollectGames, NoProgress, ProcessStatus, ProgressReport};
    use std::io::Cursor;
    use std::ops::ControlFlow;

    const TWO_GAMES: &str = r#"[Event "First"]
[White "A"]
[Black "B"]
[Result "1/2-1/2"]

1. e4 e5 2. Nf3 Nc6 1/2-1/2

[Event "Second"]
[Result "1-0"]

1. d4 d5 2. c4 1-0
"#;

    fn run(text: &str) -> (StreamSummary, CollectGames) {
        let mut games = CollectGames::default();
        let summary = process(
            Cursor::new(text.as_bytes()),
            &ParserConfig::default(),
            &mut games,
            NoProgress,
        )
        .unwrap();
        (summary, games)
    }

    #[test]
    fn test_compression_mode_parse() {
        assert_eq!(CompressionMode::parse("zstd"), Ok(CompressionMode::Zstd));
        assert_eq!(CompressionMode::parse(" ZSTD "), Ok(CompressionMode::Zstd));
        assert!(CompressionMode::parse("").is_err());
        assert!(
            CompressionMode::parse("gzip")
                .unwrap_err()
                .contains("'gzip'")
        );
        assert_eq!(CompressionMode::default(), CompressionMode::Plain);
    }

    #[test]
    fn test_splitter_separates_games_at_tag_lines() {
        let games: Vec<GameText> = GameSplitter::new(Cursor::new(TWO_GAMES))
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].tags.len(), 4);
        assert_eq!(games[0].movetext, "1. e4 e5 2. Nf3 Nc6 1/2-1/2\n");
        assert_eq!(games[1].tags, [r#"[Event "Second"]"#, r#"[Result "1-0"]"#]);
        assert_eq!(games[1].movetext, "1. d4 d5 2. c4 1-0\n");
    }

    #[test]
    fn test_tag_line_inside_comment_stays_in_game() {
        let text = "[White \"A\"]\n\n1. e4 {see\n[Event \"quoted\"] game} e5 *\n";
        let games: Vec<GameText> = GameSplitter::new(Cursor::new(text))
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].tags, [r#"[White "A"]"#]);
        assert_eq!(games[0].movetext, "1. e4 {see\n[Event \"quoted\"] game} e5 *\n");

        let (summary, collected) = run(text);
        assert_eq!(summary.dispatched, 1);
        assert_eq!(collected.games[0].moves.len(), 2);
    }

    #[test]
    fn test_blank_line_after_result_ends_untagged_game() {
        let games: Vec<GameText> =
            GameSplitter::new(Cursor::new("1. e4 e5 1-0\n\n1. d4 d5 0-1\n"))
                .collect::<io::Result<_>>()
                .unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].movetext, "1. e4 e5 1-0\n");
        assert_eq!(games[1].movetext, "1. d4 d5 0-1\n");

        let (summary, collected) = run("1. e4 e5 1-0\n\n1. d4 d5 0-1\n");
        assert_eq!(summary.dispatched, 2);
        assert_eq!(collected.games[1].moves.len(), 2);
    }

    #[test]
    fn test_blank_line_inside_movetext_keeps_game() {
        let text = "[White \"A\"]\n\n1. e4 e5\n\n2. Nf3 Nc6 {done 1-0}\n\n3. Bb5 *\n";
        let games: Vec<GameText> = GameSplitter::new(Cursor::new(text))
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].movetext, "1. e4 e5\n\n2. Nf3 Nc6 {done 1-0}\n\n3. Bb5 *\n");
    }

    #[test]
    fn test_tags_only_game_is_kept_apart() {
        let text = "[Event \"Empty\"]\n\n[Event \"Next\"]\n\n1. e4 *\n";
        let games: Vec<GameText> = GameSplitter::new(Cursor::new(text))
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].tags, [r#"[Event "Empty"]"#]);
        assert!(games[0].movetext.is_empty());
        assert_eq!(games[1].tags, [r#"[Event "Next"]"#]);
        assert_eq!(games[1].movetext, "1. e4 *\n");
    }

    #[test]
    fn test_splitter_skips_escape_lines_and_carriage_returns() {
        let text = "% generated\r\n[White \"A\"]\r\n\r\n1. e4\r\n% mid-game escape\r\ne5 *\r\n";
        let mut splitter = GameSplitter::new(Cursor::new(text));
        let game = splitter.next_game().unwrap().unwrap();
        assert_eq!(game.tags, [r#"[White "A"]"#]);
        assert_eq!(game.movetext, "1. e4\ne5 *\n");
        assert!(splitter.next_game().unwrap().is_none());
        assert_eq!(splitter.lines(), 6);
    }

    #[test]
    fn test_splitter_decodes_latin1() {
        let mut bytes = b"[White \"Ren".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b"\"]\n\n1. e4 *\n");
        let game = GameSplitter::new(Cursor::new(bytes))
            .next_game()
            .unwrap()
            .unwrap();
        assert_eq!(game.tags, ["[White \"Ren\u{e9}\"]"]);
    }

    #[test]
    fn test_process_dispatches_each_game() {
        let (summary, games) = run(TWO_GAMES);
        assert_eq!(summary.status, ProcessStatus::Completed);
        assert_eq!(summary.games, 2);
        assert_eq!(summary.dispatched, 2);
        assert_eq!(games.total, Some(2));
        assert_eq!(games.games[0].white, "A");
        assert_eq!(games.games[0].moves.len(), 4);
        assert_eq!(games.games[1].event, "Second");
        assert_eq!(games.games[1].moves.len(), 3);
    }

    #[test]
    fn test_malformed_game_is_skipped_and_counted() {
        let text = "[Event \"Bad\"]\n\n1. e4 e5 2x. Nf3 *\n\n[Event \"Good\"]\n\n1. e4 e5 *\n";
        let (summary, games) = run(text);
        assert_eq!(summary.games, 2);
        assert_eq!(summary.dispatched, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors_by_kind.get("bad_move_number"), Some(&1));
        assert_eq!(games.games.len(), 1);
        assert_eq!(games.games[0].event, "Good");
        assert_eq!(games.total, Some(2));
    }

    #[test]
    fn test_move_gap_does_not_stop_stream() {
        let text = "[Event \"Gap\"]\n\n1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 9. Ba4 *\n\n\
                    [Event \"Next\"]\n\n1. c4 *\n";
        let (summary, games) = run(text);
        assert_eq!(summary.errors_by_kind.get("move_sync"), Some(&1));
        assert_eq!(games.games.len(), 1);
        assert_eq!(games.games[0].event, "Next");
    }

    #[test]
    fn test_deep_nesting_fails_only_its_game() {
        let deep = format!("1. e4 {}{} e5 *", "(".repeat(21), ")".repeat(21));
        let ok = format!("1. e4 {}{} e5 *", "(".repeat(19), ")".repeat(19));
        let text = format!(
            "[Event \"Deep\"]\n\n{deep}\n\n[Event \"Nineteen\"]\n\n{ok}\n\n[Event \"Plain\"]\n\n1. d4 *\n"
        );
        let (summary, games) = run(&text);
        assert_eq!(summary.games, 3);
        assert_eq!(summary.errors_by_kind.get("variation_too_deep"), Some(&1));
        let events: Vec<&str> = games.games.iter().map(|g| g.event.as_str()).collect();
        assert_eq!(events, ["Nineteen", "Plain"]);
    }

    #[test]
    fn test_zero_move_game_is_dispatched() {
        let (summary, games) = run("[Event \"Empty\"]\n[Result \"*\"]\n\n*\n");
        assert_eq!(summary.dispatched, 1);
        assert!(games.games[0].moves.is_empty());
    }

    #[test]
    fn test_progress_abort_stops_stream() {
        let mut games = CollectGames::default();
        let summary = process(
            Cursor::new(TWO_GAMES.as_bytes()),
            &ParserConfig::default(),
            &mut games,
            |_: &ProgressReport| ControlFlow::Break(()),
        )
        .unwrap();
        assert_eq!(summary.status, ProcessStatus::Aborted);
        assert_eq!(summary.games, 1);
        assert_eq!(games.games.len(), 1);
        assert_eq!(games.total, None);
    }

    #[test]
    fn test_process_zstd_input() {
        let compressed = zstd::stream::encode_all(TWO_GAMES.as_bytes(), 0).unwrap();
        let input = CompressionMode::Zstd.wrap(Cursor::new(compressed)).unwrap();
        let mut games = CollectGames::default();
        let summary =
            process(input, &ParserConfig::default(), &mut games, NoProgress).unwrap();
        assert_eq!(summary.dispatched, 2);
        assert_eq!(games.games[1].moves.len(), 3);
    }

    #[test]
    fn test_movetext_without_tags() {
        let (summary, games) = run("1. e4 e5 2. Nf3 1-0\n");
        assert_eq!(summary.dispatched, 1);
        assert_eq!(games.games[0].moves.len(), 3);
    }
}
