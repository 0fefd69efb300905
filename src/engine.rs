//! Job processing engine
//!
//! Single logical control flow over one transport: ingest a job, search its
//! nonce space to a terminal state, emit a share on success, then return to
//! ingestion. One job is active at a time; a new job is not read until the
//! prior search finishes. Ingestion errors are recoverable at this boundary
//! and abort only the offending job.

use crate::miner::{NonceSearch, SearchOutcome};
use crate::protocol::{read_job, write_share};
use crate::transport::Transport;
use crate::{Error, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Drives the ingest → search → emit cycle over a transport
pub struct Engine {
    batch_size: u32,
    cancellation: CancellationToken,
}

impl Engine {
    /// Create an engine; `batch_size` sets nonces tried per cancellation check
    pub fn new(batch_size: u32) -> Self {
        Self {
            batch_size,
            cancellation: CancellationToken::new(),
        }
    }

    /// Token that pre-empts the in-flight search and all future ones.
    ///
    /// The engine itself never cancels a running search; the token is the
    /// hook for an ingest path that supersedes stale jobs.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Process jobs from the transport until the connection ends.
    ///
    /// Returns `Ok(())` when the transport closes; recoverable ingestion
    /// errors are logged and skipped.
    pub async fn run(&self, transport: &mut dyn Transport) -> Result<()> {
        let mut next_id: u64 = 0;

        loop {
            let job = match read_job(transport, next_id).await {
                Ok(job) => job,
                Err(err) if err.is_recoverable() => {
                    warn!(category = err.category(), %err, "rejecting job");
                    continue;
                }
                Err(Error::Transport { message }) => {
                    info!(%message, "connection closed");
                    return Ok(());
                }
                Err(err) => return Err(err),
            };
            next_id += 1;

            info!(
                job_id = job.id,
                difficulty = job.target.difficulty_level(),
                time = job.header.time(),
                "job ingested"
            );

            let mut search = NonceSearch::prepare(&job, self.batch_size);
            let token = self.cancellation.child_token();
            let (outcome, stats) = tokio::task::spawn_blocking(move || search.run(&token))
                .await
                .map_err(|e| Error::Io(std::io::Error::other(e)))?;

            match outcome {
                SearchOutcome::Found(share) => {
                    info!(
                        job_id = job.id,
                        nonce = %share.nonce,
                        hashes = stats.hashes,
                        rate_mhs = stats.hash_rate() / 1e6,
                        "share found"
                    );
                    write_share(transport, &share).await?;
                }
                SearchOutcome::Exhausted => {
                    // Distinct from success: the nonce space held no solution
                    info!(
                        job_id = job.id,
                        hashes = stats.hashes,
                        "nonce space exhausted, no solution for this job"
                    );
                }
                SearchOutcome::Cancelled => {
                    info!(job_id = job.id, hashes = stats.hashes, "search pre-empted");
                }
            }
        }
    }
}
