/// Lexer states for per-game movetext.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseState {
    MoveNumber,
    PostMoveNumber,
    PostMoveNumberDot,
    PostMoveNumberBlack,
    PreMoveWhite,
    PreMoveBlack,
    InMoveWhite,
    InMoveBlack,
    BetweenMoves,
    InComment,
    InDollar,
    Error,
    NormalExit,
}

impl ParseState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Error | Self::NormalExit)
    }

    pub fn in_move(self) -> bool {
        matches!(self, Self::InMoveWhite | Self::InMoveBlack)
    }

    /// Comments and NAGs may open here.
    pub(crate) fn accepts_annotation(self) -> bool {
        !self.in_move() && self != Self::InComment
    }

    /// `(` and `)` are honoured here.
    pub(crate) fn accepts_variation(self) -> bool {
        self.accepts_annotation() && self != Self::Error
    }

    /// Single-letter tag used in the debug ring.
    pub(crate) fn code(self) -> char {
        match self {
            Self::MoveNumber => 'N',
            Self::PostMoveNumber => 'n',
            Self::PostMoveNumberDot => '.',
            Self::PostMoveNumberBlack => ':',
            Self::PreMoveWhite => 'w',
            Self::PreMoveBlack => 'b',
            Self::InMoveWhite => 'W',
            Self::InMoveBlack => 'B',
            Self::BetweenMoves => '_',
            Self::InComment => 'C',
            Self::InDollar => '$',
            Self::Error => 'E',
            Self::NormalExit => 'X',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `{ ... }`
    Brace,
    /// `; ...` up to end of line
    Line,
}
