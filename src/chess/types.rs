use chrono::{Datelike, NaiveDate};

use super::variation::{HashList, MoveList};

/// Tags kept for consumers that want them but not part of the core record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraTags {
    pub desc: String,
    pub desc2: String,
    pub name: String,
    pub variation: String,
    pub move_order: String,
}

/// Accumulated data of one game. Reset at every game start, handed to the
/// consumer once the movetext ends cleanly, never shared across games.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameRecord {
    pub event: String,
    pub site: String,
    pub date: String,
    pub round: String,
    pub white: String,
    pub black: String,
    pub result: String,
    pub white_elo: String,
    pub black_elo: String,
    pub eco: String,
    /// Non-standard starting position, if the game declared one.
    pub fen: Option<String>,
    pub extra: ExtraTags,

    /// Main-line moves, index 0 being the first move seen in the game.
    pub moves: MoveList,
    /// Running hash after each entry of `moves`.
    pub hashes: HashList,
    /// Ply index of the first move number seen; subtracted from every later
    /// index so fragments starting mid-game still fill `moves` from 0.
    pub first_move_offset: Option<usize>,

    /// Non-fatal problems found while reading the game.
    pub diagnostics: Option<String>,
}

impl GameRecord {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn fen(&self) -> Option<&str> {
        self.fen.as_deref().filter(|fen| !fen.is_empty())
    }

    pub fn white_elo_value(&self) -> Option<u32> {
        parse_elo(&self.white_elo)
    }

    pub fn black_elo_value(&self) -> Option<u32> {
        parse_elo(&self.black_elo)
    }

    /// Calendar date from a PGN `YYYY.MM.DD` date. Unknown month or day
    /// (`??`, or cut off by tag cleanup) fall back to 1, a day past the end of the month is clamped,
    /// and an unknown year means no date at all.
    pub fn date_value(&self) -> Option<NaiveDate> {
        let norm = self.date.trim().replace('-', ".");
        let mut parts = norm.split('.');
        let (year, month, day) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() || year.contains('?') {
            return None;
        }

        let year = year.parse::<i32>().ok()?;
        let month = if month.is_empty() || month.contains('?') {
            1
        } else {
            month.parse::<u32>().ok()?
        };
        let day = if day.is_empty() || day.contains('?') {
            1
        } else {
            day.parse::<u32>().ok()?
        };

        let last_day = last_day_of_month(year, month)?;
        let date = NaiveDate::from_ymd_opt(year, month, day.clamp(1, last_day))?;
        (date.year() > 0).then_some(date)
    }
}

fn parse_elo(raw: &str) -> Option<u32> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<u32>().ok()
}

fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let first_day_next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month.checked_add(1)?, 1)?
    };

    first_day_next_month.pred_opt().map(|d| d.day())
}
