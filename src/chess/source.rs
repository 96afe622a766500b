use std::str::Chars;

/// Character source with a single pushback slot. Carriage returns are
/// dropped before the lexer ever sees them.
#[derive(Debug, Clone)]
pub struct CharSource<'a> {
    chars: Chars<'a>,
    pending: Option<char>,
}

impl<'a> CharSource<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars(),
            pending: None,
        }
    }

    /// Re-queues `c` for the next call to `next`.
    ///
    /// At most one character may be pending; a second pushback before the
    /// first is consumed is a lexer bug.
    pub fn push_back(&mut self, c: char) {
        debug_assert!(
            self.pending.is_none(),
            "second pushback of {c:?} while {:?} is pending",
            self.pending
        );
        self.pending = Some(c);
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Iterator for CharSource<'_> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        if let Some(c) = self.pending.take() {
            return Some(c);
        }
        self.chars.by_ref().find(|&c| c != '\r')
    }
}

#[cfg(test)]
mod tests {
    use super::CharSource;

    #[test]
    fn test_carriage_returns_are_dropped() {
        let source = CharSource::new("1.\r\ne4\r");
        assert_eq!(source.collect::<String>(), "1.\ne4");
    }

    #[test]
    fn test_push_back_is_read_first() {
        let mut source = CharSource::new("ab");
        assert_eq!(source.next(), Some('a'));
        source.push_back('a');
        assert!(source.has_pending());
        assert_eq!(source.next(), Some('a'));
        assert!(!source.has_pending());
        assert_eq!(source.next(), Some('b'));
        assert_eq!(source.next(), None);
    }

    #[test]
    #[should_panic(expected = "second pushback")]
    #[cfg(debug_assertions)]
    fn test_double_push_back_panics_in_debug() {
        let mut source = CharSource::new("");
        source.push_back('x');
        source.push_back('y');
    }
}
