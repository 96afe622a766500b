use std::collections::BTreeMap;
use std::ops::ControlFlow;

use tracing::{debug, info, warn};

use super::error::ParseError;
use super::types::GameRecord;

/// Receives every game that parsed cleanly.
pub trait GameConsumer {
    /// Returning `Break` aborts the whole stream.
    fn game(&mut self, game: &GameRecord) -> ControlFlow<()>;

    /// Called once after the last game unless the stream was aborted.
    fn stream_complete(&mut self, _total_games: u64) {}
}

impl<C: GameConsumer + ?Sized> GameConsumer for &mut C {
    fn game(&mut self, game: &GameRecord) -> ControlFlow<()> {
        (**self).game(game)
    }

    fn stream_complete(&mut self, total_games: u64) {
        (**self).stream_complete(total_games);
    }
}

/// Counters handed to the progress hook after every game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressReport {
    pub games: u64,
    pub dispatched: u64,
    pub failed: u64,
}

/// Cancellation hook, polled once per completed game.
pub trait Progress {
    fn poll(&mut self, report: &ProgressReport) -> ControlFlow<()>;
}

impl<F> Progress for F
where
    F: FnMut(&ProgressReport) -> ControlFlow<()>,
{
    fn poll(&mut self, report: &ProgressReport) -> ControlFlow<()> {
        self(report)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn poll(&mut self, _report: &ProgressReport) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Completed,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSummary {
    pub status: ProcessStatus,
    /// Every game seen, including failed ones.
    pub games: u64,
    pub dispatched: u64,
    pub failed: u64,
    pub errors_by_kind: BTreeMap<&'static str, u64>,
}

impl StreamSummary {
    fn new() -> Self {
        Self {
            status: ProcessStatus::Completed,
            games: 0,
            dispatched: 0,
            failed: 0,
            errors_by_kind: BTreeMap::new(),
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.status == ProcessStatus::Aborted
    }

    fn report(&self) -> ProgressReport {
        ProgressReport {
            games: self.games,
            dispatched: self.dispatched,
            failed: self.failed,
        }
    }
}

/// Routes parse outcomes to the consumer, keeps the stream counters and
/// polls the progress hook at every game boundary.
pub struct Dispatcher<C, P> {
    consumer: C,
    progress: P,
    summary: StreamSummary,
}

impl<C: GameConsumer, P: Progress> Dispatcher<C, P> {
    pub fn new(consumer: C, progress: P) -> Self {
        Self {
            consumer,
            progress,
            summary: StreamSummary::new(),
        }
    }

    pub fn summary(&self) -> &StreamSummary {
        &self.summary
    }

    /// Records the outcome of one game. `ring` is the lexer's debug dump,
    /// only rendered into the log when the game failed.
    pub fn game_finished(
        &mut self,
        outcome: Result<GameRecord, ParseError>,
        ring: Option<String>,
    ) -> ControlFlow<()> {
        self.summary.games += 1;
        let index = self.summary.games;

        let flow = match outcome {
            Ok(game) => {
                debug!(game = index, plies = game.moves.len(), "dispatching game");
                self.summary.dispatched += 1;
                self.consumer.game(&game)
            }
            Err(err) => {
                self.summary.failed += 1;
                *self.summary.errors_by_kind.entry(err.kind()).or_default() += 1;
                match ring {
                    Some(ring) => {
                        warn!(game = index, kind = err.kind(), error = %err, "game skipped\n{ring}")
                    }
                    None => warn!(game = index, kind = err.kind(), error = %err, "game skipped"),
                }
                ControlFlow::Continue(())
            }
        };

        let flow = match flow {
            ControlFlow::Continue(()) => self.progress.poll(&self.summary.report()),
            brk => brk,
        };
        if flow.is_break() {
            self.summary.status = ProcessStatus::Aborted;
            info!(games = index, "stream aborted");
        }
        flow
    }

    /// Ends the stream, calling the completion hook unless it was aborted.
    pub fn finish(mut self) -> (StreamSummary, C) {
        if !self.summary.is_aborted() {
            self.consumer.stream_complete(self.summary.games);
            info!(
                games = self.summary.games,
                dispatched = self.summary.dispatched,
                failed = self.summary.failed,
                "stream complete"
            );
        }
        (self.summary, self.consumer)
    }
}

/// Keeps every dispatched game in memory.
#[derive(Debug, Clone, Default)]
pub struct CollectGames {
    pub games: Vec<GameRecord>,
    pub total: Option<u64>,
}

impl GameConsumer for CollectGames {
    fn game(&mut self, game: &GameRecord) -> ControlFlow<()> {
        self.games.push(game.clone());
        ControlFlow::Continue(())
    }

    fn stream_complete(&mut self, total_games: u64) {
        self.total = Some(total_games);
    }
}

/// Forwards only games played from the standard initial position.
#[derive(Debug, Clone, Default)]
pub struct StandardStartOnly<C> {
    inner: C,
    skipped: u64,
}

impl<C> StandardStartOnly<C> {
    pub fn new(inner: C) -> Self {
        Self { inner, skipped: 0 }
    }

    /// Games dropped for carrying a starting FEN.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: GameConsumer> GameConsumer for StandardStartOnly<C> {
    fn game(&mut self, game: &GameRecord) -> ControlFlow<()> {
        if game.fen().is_some() {
            self.skipped += 1;
            return ControlFlow::Continue(());
        }
        self.inner.game(game)
    }

    fn stream_complete(&mut self, total_games: u64) {
        self.inner.stream_complete(total_games);
    }
}
