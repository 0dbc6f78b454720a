//! Time-budgeted chunk coordination and queue settings.
#![forbid(unsafe_code)]

mod progress;
pub mod settings;

pub use progress::{ChannelSubscriber, LoggingSubscriber, ProgressEvent, ProgressSubscriber};
pub use settings::Settings;

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parcel_geom::ChunkPos;
use parcel_queue::RegionError;
use parcel_world::ChunkWorld;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("no chunk consumer configured")]
    MissingConsumer,
    #[error("chunk ({cx}, {cz}) could not be loaded")]
    ChunkLoad { cx: i32, cz: i32 },
    #[error("task for chunk ({cx}, {cz}) failed: {reason}")]
    Task { cx: i32, cz: i32, reason: String },
    #[error(transparent)]
    Region(#[from] RegionError),
}

/// World the coordinator loads and unloads chunks in.
pub trait ChunkHost {
    fn load_chunk(&mut self, pos: ChunkPos) -> Result<(), CoordinatorError>;
    fn unload_chunk(&mut self, pos: ChunkPos);
}

impl ChunkHost for ChunkWorld {
    fn load_chunk(&mut self, pos: ChunkPos) -> Result<(), CoordinatorError> {
        ChunkWorld::load_chunk(self, pos);
        Ok(())
    }

    /// The column moves to storage and keeps its blocks.
    fn unload_chunk(&mut self, pos: ChunkPos) {
        ChunkWorld::unload_chunk(self, pos);
    }
}

type Consumer<'a, H> = Box<dyn FnMut(&mut H, ChunkPos) -> Result<(), CoordinatorError> + 'a>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CoordinatorState {
    Pending,
    Running,
    Done,
    Cancelled,
}

#[derive(Copy, Clone, Debug)]
pub struct TickReport {
    pub processed: usize,
    pub failed: usize,
    pub remaining: usize,
    pub elapsed: Duration,
    pub batch_size: usize,
    pub state: CoordinatorState,
}

pub struct ChunkCoordinatorBuilder<'a, H> {
    max_iteration_time: Duration,
    initial_batch_size: usize,
    chunks: Vec<ChunkPos>,
    consumer: Option<Consumer<'a, H>>,
    when_done: Option<Box<dyn FnOnce() + 'a>>,
    throwable_consumer: Option<Box<dyn FnMut(CoordinatorError) + 'a>>,
    unload_after: bool,
    subscribers: Vec<Box<dyn ProgressSubscriber + 'a>>,
}

impl<'a, H: ChunkHost> ChunkCoordinatorBuilder<'a, H> {
    pub fn new() -> Self {
        let defaults = settings::QueueSettings::default();
        Self {
            max_iteration_time: defaults.target_time(),
            initial_batch_size: defaults.initial_batch_size,
            chunks: Vec::new(),
            consumer: None,
            when_done: None,
            throwable_consumer: None,
            unload_after: false,
            subscribers: Vec::new(),
        }
    }

    pub fn from_settings(mut self, settings: &Settings) -> Self {
        self.max_iteration_time = settings.queue.target_time();
        self.initial_batch_size = settings.queue.initial_batch_size;
        self.unload_after = settings.chunk_processor.auto_trim;
        self
    }

    pub fn max_iteration_time(mut self, budget: Duration) -> Self {
        self.max_iteration_time = budget;
        self
    }

    pub fn initial_batch_size(mut self, n: usize) -> Self {
        self.initial_batch_size = n;
        self
    }

    pub fn with_chunks(mut self, chunks: impl IntoIterator<Item = ChunkPos>) -> Self {
        self.chunks.extend(chunks);
        self
    }

    pub fn with_consumer<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut H, ChunkPos) -> Result<(), CoordinatorError> + 'a,
    {
        self.consumer = Some(Box::new(f));
        self
    }

    pub fn when_done<F: FnOnce() + 'a>(mut self, f: F) -> Self {
        self.when_done = Some(Box::new(f));
        self
    }

    pub fn with_throwable_consumer<F: FnMut(CoordinatorError) + 'a>(mut self, f: F) -> Self {
        self.throwable_consumer = Some(Box::new(f));
        self
    }

    pub fn unload_after(mut self, unload: bool) -> Self {
        self.unload_after = unload;
        self
    }

    pub fn with_progress_subscriber<S: ProgressSubscriber + 'a>(mut self, s: S) -> Self {
        self.subscribers.push(Box::new(s));
        self
    }

    pub fn build(self) -> Result<ChunkCoordinator<'a, H>, CoordinatorError> {
        let consumer = self.consumer.ok_or(CoordinatorError::MissingConsumer)?;
        let throwable_consumer = self.throwable_consumer.unwrap_or_else(|| {
            Box::new(|e: CoordinatorError| log::warn!("chunk task failed: {}", e))
        });
        let total = self.chunks.len();
        Ok(ChunkCoordinator {
            max_iteration_time: self.max_iteration_time,
            batch_size: self.initial_batch_size.max(1),
            queue: self.chunks.into(),
            total,
            consumer,
            when_done: self.when_done,
            throwable_consumer,
            unload_after: self.unload_after,
            subscribers: self.subscribers,
            state: CoordinatorState::Pending,
            processed: 0,
            failed: 0,
        })
    }
}

impl<'a, H: ChunkHost> Default for ChunkCoordinatorBuilder<'a, H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs one task per chunk across host ticks, within a per-tick time budget.
///
/// Each tick handles at most `batch_size` chunks and stops early once the
/// budget is spent (always at least one chunk). The batch grows by one after
/// a full batch that used under half the budget and shrinks after a tick that
/// overran it.
pub struct ChunkCoordinator<'a, H> {
    max_iteration_time: Duration,
    batch_size: usize,
    queue: VecDeque<ChunkPos>,
    total: usize,
    consumer: Consumer<'a, H>,
    when_done: Option<Box<dyn FnOnce() + 'a>>,
    throwable_consumer: Box<dyn FnMut(CoordinatorError) + 'a>,
    unload_after: bool,
    subscribers: Vec<Box<dyn ProgressSubscriber + 'a>>,
    state: CoordinatorState,
    processed: usize,
    failed: usize,
}

impl<'a, H: ChunkHost> ChunkCoordinator<'a, H> {
    pub fn builder() -> ChunkCoordinatorBuilder<'a, H> {
        ChunkCoordinatorBuilder::new()
    }

    #[inline]
    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    #[inline]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn progress(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        (self.total - self.queue.len()) as f32 / self.total as f32
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        matches!(self.state, CoordinatorState::Done | CoordinatorState::Cancelled)
    }

    fn report(&self, processed: usize, failed: usize, elapsed: Duration) -> TickReport {
        TickReport {
            processed,
            failed,
            remaining: self.queue.len(),
            elapsed,
            batch_size: self.batch_size,
            state: self.state,
        }
    }

    fn run_chunk(&mut self, host: &mut H, pos: ChunkPos) -> bool {
        if let Err(e) = host.load_chunk(pos) {
            (self.throwable_consumer)(e);
            return false;
        }
        let ok = match (self.consumer)(host, pos) {
            Ok(()) => true,
            Err(e) => {
                (self.throwable_consumer)(e);
                false
            }
        };
        if self.unload_after {
            host.unload_chunk(pos);
        }
        ok
    }

    /// Process one tick's worth of chunks.
    pub fn tick(&mut self, host: &mut H) -> TickReport {
        if self.is_finished() {
            return self.report(0, 0, Duration::ZERO);
        }
        self.state = CoordinatorState::Running;
        let start = Instant::now();
        let mut processed = 0;
        let mut failed = 0;
        while processed < self.batch_size {
            if processed > 0 && start.elapsed() >= self.max_iteration_time {
                break;
            }
            let Some(pos) = self.queue.pop_front() else {
                break;
            };
            if !self.run_chunk(host, pos) {
                failed += 1;
            }
            processed += 1;
        }
        let elapsed = start.elapsed();
        self.processed += processed;
        self.failed += failed;

        if elapsed > self.max_iteration_time {
            self.batch_size = (self.batch_size - 1).max(1);
        } else if processed == self.batch_size && elapsed * 2 < self.max_iteration_time {
            self.batch_size += 1;
        }
        log::trace!(
            "coordinator tick: {} chunks ({} failed) in {:?}, {} left, next batch {}",
            processed,
            failed,
            elapsed,
            self.queue.len(),
            self.batch_size
        );

        let progress = self.progress();
        for s in self.subscribers.iter_mut() {
            s.notify_progress(progress);
        }
        if self.queue.is_empty() {
            self.finish(CoordinatorState::Done);
        }
        self.report(processed, failed, elapsed)
    }

    fn finish(&mut self, state: CoordinatorState) {
        self.state = state;
        for s in self.subscribers.iter_mut() {
            s.notify_end();
        }
        if state == CoordinatorState::Done {
            log::debug!(
                "coordinator finished: {} chunks, {} failed",
                self.processed,
                self.failed
            );
            if let Some(done) = self.when_done.take() {
                done();
            }
        }
    }

    /// Drop all pending chunks. `when_done` is not run.
    pub fn cancel(&mut self) {
        if self.is_finished() {
            return;
        }
        log::debug!("coordinator cancelled with {} chunks left", self.queue.len());
        self.queue.clear();
        self.finish(CoordinatorState::Cancelled);
    }

    /// Tick until every chunk ran. Returns the number of ticks taken.
    pub fn run_to_completion(&mut self, host: &mut H) -> usize {
        let mut ticks = 0;
        while !self.is_finished() {
            self.tick(host);
            ticks += 1;
        }
        ticks
    }
}
