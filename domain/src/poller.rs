//! Operation polling.
//!
//! A submitted operation is queried on a fixed interval until it reports `done`,
//! the overall deadline passes, polling is cancelled, or a non-recoverable error
//! occurs. Exactly one [`PollOutcome`] is produced per run.
//!
//! The loop waits on three sources at once: the cancellation token, the deadline,
//! and the next poll step (tick followed by the status request). Only one branch runs
//! per wakeup and queries are strictly serial. The deadline wins over an in-flight
//! request, which is dropped.

use log::*;
use service::config::Config;
use speech_ai::traits::transcription::Provider;
use speech_ai::types::recognition::{OperationHandle, OperationStatus};
use speech_ai::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// Time between two status queries. The first query happens one interval after start.
    pub interval: Duration,
    /// Overall deadline counted from the start of polling.
    pub timeout: Duration,
    /// Consecutive transient failures tolerated before polling aborts.
    pub max_retries: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            timeout: Duration::from_secs(60),
            max_retries: 3,
        }
    }
}

impl From<&Config> for PollerConfig {
    fn from(config: &Config) -> Self {
        Self {
            interval: config.poll_interval(),
            timeout: config.poll_timeout(),
            max_retries: config.max_poll_retries,
        }
    }
}

/// Terminal state of one polling run.
#[derive(Debug)]
pub enum PollOutcome {
    /// The operation finished; carries the joined transcript.
    Done(String),
    /// The deadline passed first.
    TimedOut,
    /// A parse error, a failed operation, or too many transport failures.
    Aborted(Error),
    /// The caller cancelled the job.
    Cancelled,
}

impl PollOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, PollOutcome::Done(_))
    }
}

pub struct OperationPoller {
    provider: Arc<dyn Provider>,
    config: PollerConfig,
}

impl OperationPoller {
    pub fn new(provider: Arc<dyn Provider>, config: PollerConfig) -> Self {
        Self { provider, config }
    }

    /// Poll `handle` until a terminal state is reached.
    pub async fn run(&self, handle: &OperationHandle, cancel: &CancellationToken) -> PollOutcome {
        let start = Instant::now();
        let mut ticker = time::interval_at(start + self.config.interval, self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let deadline = time::sleep_until(start + self.config.timeout);
        tokio::pin!(deadline);

        let mut attempts: u32 = 0;
        let mut failures: u32 = 0;

        debug!(
            "Polling operation {} every {:?} for up to {:?}",
            handle, self.config.interval, self.config.timeout
        );

        loop {
            let step = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Polling of operation {} cancelled", handle);
                    return PollOutcome::Cancelled;
                }
                _ = &mut deadline => {
                    warn!(
                        "Operation {} not done after {:?} ({} queries)",
                        handle, self.config.timeout, attempts
                    );
                    return PollOutcome::TimedOut;
                }
                step = self.next_status(&mut ticker, handle) => step,
            };
            attempts += 1;

            match step {
                Ok(OperationStatus::Done(transcript)) => {
                    info!(
                        "Operation {} done after {} queries with {} chunks",
                        handle,
                        attempts,
                        transcript.chunks.len()
                    );
                    return PollOutcome::Done(transcript.text());
                }
                Ok(OperationStatus::Running) => {
                    failures = 0;
                    trace!("Operation {} still running", handle);
                }
                Err(e) if e.is_transient() && failures < self.config.max_retries => {
                    failures += 1;
                    warn!(
                        "Query {} of operation {} failed ({}/{} retries): {}",
                        attempts, handle, failures, self.config.max_retries, e
                    );
                }
                Err(e) => {
                    error!("Polling of operation {} aborted: {}", handle, e);
                    return PollOutcome::Aborted(e);
                }
            }
        }
    }

    async fn next_status(
        &self,
        ticker: &mut Interval,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, Error> {
        ticker.tick().await;
        self.provider.get_operation(handle).await
    }
}
