/// Move-array capacity of a single game.
pub const MOVE_CAPACITY: usize = 1024;
/// Headroom kept below `MOVE_CAPACITY`.
pub const MOVE_MARGIN: usize = 8;

/// Per-game bounds. Exceeding any of them fails the current game, except
/// comments and tag values, which are truncated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Variation frames including the main line.
    pub max_variation_depth: usize,
    pub max_plies: usize,
    pub max_move_text: usize,
    pub max_comment: usize,
    pub max_tag_value: usize,
    /// Size of the diagnostic ring, `None` to disable it.
    pub debug_ring: Option<usize>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_variation_depth: 20,
            max_plies: MOVE_CAPACITY - MOVE_MARGIN,
            max_move_text: 32,
            max_comment: 4096,
            max_tag_value: 255,
            debug_ring: Some(64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bounds() {
        let config = ParserConfig::default();
        assert_eq!(config.max_variation_depth, 20);
        assert_eq!(config.max_plies, 1016);
        assert_eq!(config.debug_ring, Some(64));
    }
}
