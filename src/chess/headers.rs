use std::sync::LazyLock;

use regex::Regex;

/// `[Key "` prefix of a tag-pair line; the value is everything after the
/// opening quote.
static TAG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*\[\s*([A-Za-z0-9_+#=:-]+)\s*"(.*)$"#).expect("tag-pair pattern compiles")
});

/// Tags with a slot in the game record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Date,
    White,
    Black,
    Result,
    Eco,
    Site,
    Event,
    Desc,
    Desc2,
    Name,
    Variation,
    MoveOrder,
    Fen,
    FenReptor,
    Round,
    WhiteElo,
    BlackElo,
}

impl Tag {
    pub fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "Date" => Self::Date,
            "White" => Self::White,
            "Black" => Self::Black,
            "Result" => Self::Result,
            "ECO" => Self::Eco,
            "Site" => Self::Site,
            "Event" => Self::Event,
            "Desc" => Self::Desc,
            "Desc2" => Self::Desc2,
            "Name" => Self::Name,
            "Variation" => Self::Variation,
            "MoveOrder" => Self::MoveOrder,
            "FEN" => Self::Fen,
            "FENreptor" => Self::FenReptor,
            "Round" => Self::Round,
            "WhiteElo" => Self::WhiteElo,
            "BlackElo" => Self::BlackElo,
            _ => return None,
        })
    }

    /// Restricted tags only keep a leading run of plain characters, which
    /// protects them against broken quoting.
    pub fn is_restricted(self) -> bool {
        matches!(
            self,
            Self::Date | Self::Eco | Self::Round | Self::WhiteElo | Self::BlackElo | Self::MoveOrder
        )
    }
}

/// A tag-pair line split into its key and the raw text after the opening
/// quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTagLine<'a> {
    pub key: &'a str,
    pub raw: &'a str,
}

pub fn split_tag_line(line: &str) -> Option<RawTagLine<'_>> {
    let caps = TAG_LINE.captures(line)?;
    Some(RawTagLine {
        key: caps.get(1)?.as_str(),
        raw: caps.get(2)?.as_str(),
    })
}

pub fn is_tag_line(line: &str) -> bool {
    TAG_LINE.is_match(line)
}

fn is_restricted_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | ' ' | '-' | '\'' | '/')
}

/// Extracted tag value and whether it was cut at `max_len` characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagValue {
    pub text: String,
    pub truncated: bool,
}

/// Reads a value from the text following the opening quote.
///
/// Free-text values run up to the closing quote (a backslash-escaped quote
/// does not close the value and is kept as written). Restricted values stop
/// at the first character outside `[A-Za-z0-9.' /-]`.
pub fn extract_value(raw: &str, restricted: bool, max_len: usize) -> TagValue {
    let mut text = String::new();
    let mut count = 0usize;
    let mut truncated = false;
    let mut escaped = false;

    for c in raw.chars() {
        if restricted {
            if !is_restricted_char(c) {
                break;
            }
        } else if c == '"' && !escaped {
            break;
        }
        escaped = !escaped && c == '\\';

        if count == max_len {
            truncated = true;
            break;
        }
        text.push(c);
        count += 1;
    }

    TagValue { text, truncated }
}
