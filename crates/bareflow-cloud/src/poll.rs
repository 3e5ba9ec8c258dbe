//! Bounded readiness polling
//!
//! The only retry loop in the core: a fixed-interval wait for asynchronous
//! provisioning to publish some remote-assigned field. The loop aborts at a
//! hard wall-clock deadline or when the ambient cancellation token fires,
//! whichever comes first. The interval is fixed; this is a readiness check,
//! not an error retry, so there is no backoff.

use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Deadline and interval for one readiness wait.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub timeout: Duration,
    pub interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("deadline exceeded while waiting for readiness")]
    TimedOut,
    #[error("operation cancelled while waiting for readiness")]
    Cancelled,
}

/// One bounded wait. The deadline is fixed at construction time.
#[derive(Debug)]
pub struct Poller {
    deadline: Instant,
    interval: Duration,
    cancel: CancellationToken,
}

impl Poller {
    pub fn new(config: PollConfig, cancel: CancellationToken) -> Self {
        Self {
            deadline: Instant::now() + config.timeout,
            interval: config.interval,
            cancel,
        }
    }

    /// Sleep one interval between probes. Returns the abort reason once the
    /// deadline passes or cancellation fires.
    pub async fn wait(&self) -> Result<(), PollError> {
        if self.cancel.is_cancelled() {
            return Err(PollError::Cancelled);
        }
        if Instant::now() >= self.deadline {
            return Err(PollError::TimedOut);
        }
        tokio::select! {
            _ = self.cancel.cancelled() => Err(PollError::Cancelled),
            _ = tokio::time::sleep(self.interval) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PollConfig {
        PollConfig {
            timeout: Duration::from_secs(300),
            interval: Duration::from_secs(10),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn waits_until_the_deadline() {
        let poller = Poller::new(config(), CancellationToken::new());
        let mut laps = 0;
        loop {
            match poller.wait().await {
                Ok(()) => laps += 1,
                Err(reason) => {
                    assert_eq!(reason, PollError::TimedOut);
                    break;
                }
            }
        }
        // 300s deadline at a 10s interval: 30 sleeps, abort on the next lap.
        assert_eq!(laps, 30);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_sleep() {
        let cancel = CancellationToken::new();
        let poller = Poller::new(config(), cancel.clone());

        let waiter = tokio::spawn(async move { poller.wait().await });
        cancel.cancel();
        assert_eq!(waiter.await.unwrap(), Err(PollError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn each_lap_sleeps_one_interval() {
        let poller = Poller::new(config(), CancellationToken::new());
        let before = Instant::now();
        poller.wait().await.unwrap();
        assert_eq!(Instant::now() - before, Duration::from_secs(10));
    }
}
