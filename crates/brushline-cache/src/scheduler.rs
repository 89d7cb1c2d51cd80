//! Batch scheduling
//!
//! Runs a set of independent jobs in bounded parallel batches: up to
//! `batch_size` jobs run on their own threads, the scheduler joins them
//! all, optionally pauses, then starts the next batch. Scoped threads
//! let jobs borrow from the caller without any 'static gymnastics.

use std::panic;
use std::thread;
use std::time::Duration;

/// Runs jobs in fixed-size parallel batches
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    batch_size: usize,
    pause_between_batches: Duration,
}

impl BatchScheduler {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            pause_between_batches: Duration::ZERO,
        }
    }

    /// Sleep between batches, giving shared resources room to breathe
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause_between_batches = pause;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Run every item through `job`, preserving input order in the output
    pub fn run<I, R, F>(&self, items: Vec<I>, job: F) -> Vec<R>
    where
        I: Send,
        R: Send,
        F: Fn(I) -> R + Sync,
    {
        let mut results = Vec::with_capacity(items.len());
        let mut remaining = items.into_iter().peekable();
        let job = &job;

        while remaining.peek().is_some() {
            let batch: Vec<I> = remaining.by_ref().take(self.batch_size).collect();

            let joined: Vec<thread::Result<R>> = thread::scope(|scope| {
                let handles: Vec<_> = batch
                    .into_iter()
                    .map(|item| scope.spawn(move || job(item)))
                    .collect();
                handles.into_iter().map(|h| h.join()).collect()
            });

            for outcome in joined {
                match outcome {
                    Ok(value) => results.push(value),
                    Err(payload) => panic::resume_unwind(payload),
                }
            }

            if remaining.peek().is_some() && !self.pause_between_batches.is_zero() {
                thread::sleep(self.pause_between_batches);
            }
        }

        results
    }
}
