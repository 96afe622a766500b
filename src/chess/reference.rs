//! Main-line SAN as read by `pgn-reader`, used to cross-check the lexer.

use std::io;
use std::ops::ControlFlow;

use pgn_reader::{Nag, Outcome, RawComment, Reader, SanPlus, Skip, Visitor};

macro_rules! skip_annotations_and_variations {
    () => {
        fn nag(&mut self, _: &mut Self::Movetext, _: Nag) -> ControlFlow<Self::Output> {
            ControlFlow::Continue(())
        }

        fn comment(
            &mut self,
            _: &mut Self::Movetext,
            _: RawComment<'_>,
        ) -> ControlFlow<Self::Output> {
            ControlFlow::Continue(())
        }

        fn partial_comment(
            &mut self,
            _: &mut Self::Movetext,
            _: RawComment<'_>,
        ) -> ControlFlow<Self::Output> {
            ControlFlow::Continue(())
        }

        fn begin_variation(&mut self, _: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
            ControlFlow::Continue(Skip(true))
        }
    };
}

#[derive(Default)]
struct MainlineVisitor {
    sans: Vec<String>,
}

impl Visitor for MainlineVisitor {
    type Tags = ();
    type Movetext = ();
    type Output = ();

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        self.sans.clear();
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, _tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        ControlFlow::Continue(())
    }

    fn san(
        &mut self,
        _movetext: &mut Self::Movetext,
        san_plus: SanPlus,
    ) -> ControlFlow<Self::Output> {
        // Check and mate suffixes are dropped to match `San` rendering.
        self.sans.push(san_plus.san.to_string());
        ControlFlow::Continue(())
    }

    skip_annotations_and_variations!();

    fn outcome(
        &mut self,
        _movetext: &mut Self::Movetext,
        _outcome: Outcome,
    ) -> ControlFlow<Self::Output> {
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, _movetext: Self::Movetext) -> Self::Output {}
}

pub(crate) fn reference_mainline(movetext: &str) -> Vec<String> {
    let mut reader = Reader::new(io::Cursor::new(movetext.as_bytes()));
    let mut visitor = MainlineVisitor::default();
    match reader.read_game(&mut visitor) {
        Ok(Some(())) => visitor.sans,
        Ok(None) | Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::reference_mainline;

    #[test]
    fn test_reference_skips_variations_and_suffixes() {
        assert_eq!(
            reference_mainline("1. e4 (1. d4) e5 2. Qh5 Nc6 3. Bc4 Nf6 4. Qxf7# 1-0"),
            ["e4", "e5", "Qh5", "Nc6", "Bc4", "Nf6", "Qxf7"]
        );
    }
}
