//! Midstate-optimized nonce search loop
//!
//! One search covers one job: capture the midstate over the header's fixed
//! first 64 bytes, then for each nonce rewrite 4 bytes of the cached tail
//! block and run two compressions instead of a full double pass. That cache
//! is the single performance-critical optimization in this system.

use crate::sha256::{finalize_double, Midstate, TailBlock};
use crate::types::{Job, Nonce, Share, Target};
use std::ops::RangeInclusive;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Default number of nonces tried between cancellation checks
pub const DEFAULT_BATCH_SIZE: u32 = 1 << 20;

/// Terminal state of a search.
///
/// `Found` and `Exhausted` are distinct outcomes: leaving the nonce space
/// without a match is never reported as success. `Cancelled` is the
/// pre-emption hook; nothing in the engine triggers it yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A nonce satisfied the target; search stopped at the first match
    Found(Share),
    /// The nonce space was fully scanned without a match
    Exhausted,
    /// The search was pre-empted via its cancellation token
    Cancelled,
}

/// Counters for one search run
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    /// Digests computed
    pub hashes: u64,
    /// Wall time spent searching
    pub elapsed: Duration,
}

impl SearchStats {
    /// Hashes per second over the run
    pub fn hash_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.hashes as f64 / secs
        } else {
            0.0
        }
    }
}

/// A prepared search over one job's nonce space.
///
/// Construction is the Idle → MidstatePrepared transition: the midstate and
/// tail block are derived once and reused for every nonce. Both are
/// invalidated with the job; a new job means a new `NonceSearch`.
#[derive(Debug, Clone)]
pub struct NonceSearch {
    midstate: Midstate,
    tail: TailBlock,
    target: Target,
    job_id: u64,
    batch_size: u32,
}

impl NonceSearch {
    /// Derive the midstate and tail block for a job (one compression call)
    pub fn prepare(job: &Job, batch_size: u32) -> Self {
        Self {
            midstate: Midstate::of(&job.header),
            tail: TailBlock::new(&job.header),
            target: job.target,
            job_id: job.id,
            batch_size: batch_size.max(1),
        }
    }

    /// Scan the full 32-bit nonce space to a terminal state
    pub fn run(&mut self, cancellation: &CancellationToken) -> (SearchOutcome, SearchStats) {
        self.run_range(0..=u32::MAX, cancellation)
    }

    /// Scan an inclusive nonce range to a terminal state.
    ///
    /// Cancellation is checked between batches; an in-flight batch always
    /// completes.
    pub fn run_range(
        &mut self,
        range: RangeInclusive<u32>,
        cancellation: &CancellationToken,
    ) -> (SearchOutcome, SearchStats) {
        let (start, end) = range.into_inner();
        let started = Instant::now();
        let mut stats = SearchStats::default();

        let mut nonce = start;
        loop {
            if cancellation.is_cancelled() {
                debug!(job_id = self.job_id, "search cancelled");
                stats.elapsed = started.elapsed();
                return (SearchOutcome::Cancelled, stats);
            }

            let batch_end = nonce.saturating_add(self.batch_size - 1).min(end);
            for n in nonce..=batch_end {
                let candidate = Nonce::new(n);
                self.tail.set_nonce(candidate);
                let hash = finalize_double(&self.midstate, &self.tail);
                stats.hashes += 1;

                if self.target.meets(&hash) {
                    stats.elapsed = started.elapsed();
                    debug!(
                        job_id = self.job_id,
                        nonce = %candidate,
                        hashes = stats.hashes,
                        "solution found"
                    );
                    return (SearchOutcome::Found(Share::new(candidate, hash)), stats);
                }
            }

            let secs = started.elapsed().as_secs_f64();
            let rate = if secs > 0.0 {
                stats.hashes as f64 / secs
            } else {
                0.0
            };
            trace!(
                job_id = self.job_id,
                hashes = stats.hashes,
                rate_mhs = rate / 1e6,
                "batch complete"
            );

            if batch_end == end {
                break;
            }
            nonce = batch_end + 1;
        }

        stats.elapsed = started.elapsed();
        debug!(
            job_id = self.job_id,
            hashes = stats.hashes,
            "nonce space exhausted without a match"
        );
        (SearchOutcome::Exhausted, stats)
    }
}
