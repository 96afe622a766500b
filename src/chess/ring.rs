use super::state::ParseState;

/// Last N characters consumed by the lexer together with the state that
/// consumed them. Only used to make error reports readable.
#[derive(Debug, Clone)]
pub struct DebugRing {
    slots: Vec<(char, ParseState)>,
    mask: usize,
    next: usize,
    filled: bool,
}

impl DebugRing {
    /// Capacity is rounded up to a power of two (minimum 2).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2).next_power_of_two();
        Self {
            slots: vec![(' ', ParseState::MoveNumber); capacity],
            mask: capacity - 1,
            next: 0,
            filled: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn record(&mut self, c: char, state: ParseState) {
        self.slots[self.next] = (c, state);
        self.next = (self.next + 1) & self.mask;
        if self.next == 0 {
            self.filled = true;
        }
    }

    pub fn clear(&mut self) {
        self.next = 0;
        self.filled = false;
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = (char, ParseState)> + '_ {
        let (start, len) = if self.filled {
            (self.next, self.slots.len())
        } else {
            (0, self.next)
        };
        (0..len).map(move |i| self.slots[(start + i) & self.mask])
    }

    /// Two lines: the characters, and under each the state code.
    pub fn render(&self) -> String {
        let mut text = String::new();
        let mut codes = String::new();
        for (c, state) in self.iter() {
            let shown = if c.is_whitespace() { ' ' } else { c };
            text.push(shown);
            codes.push(state.code());
        }
        format!("{text}\n{codes}")
    }
}
