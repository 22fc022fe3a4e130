//! Waiting for distributed state to converge.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::Error;

/// Result of a poll.
#[derive(Debug, Eq, PartialEq)]
pub enum PollOutcome<T> {
    /// The predicate held for this value.
    Satisfied(T),

    /// The deadline passed first.
    TimedOut {
        /// Queries made.
        attempts: u32,

        /// Value returned by the last query.
        last: Option<T>,
    },
}

impl<T> PollOutcome<T> {
    /// Convert a timeout into [`Error::ConvergenceTimeout`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConvergenceTimeout`] for [`PollOutcome::TimedOut`].
    pub fn satisfied(self, condition: &str, elapsed: Duration) -> Result<T, Error> {
        match self {
            Self::Satisfied(value) => Ok(value),
            Self::TimedOut { attempts, .. } => Err(Error::ConvergenceTimeout {
                condition: condition.to_string(),
                attempts,
                elapsed,
            }),
        }
    }
}

/// Repeatedly queries until a predicate holds.
#[derive(Clone, Copy, Debug)]
pub struct Poller {
    interval: Duration,
    deadline: Option<Duration>,
}

impl Default for Poller {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            deadline: Some(Duration::from_secs(30 * 60)),
        }
    }
}

impl Poller {
    /// Create a poller. `deadline` of `None` polls forever.
    #[must_use]
    pub const fn new(interval: Duration, deadline: Option<Duration>) -> Self {
        Self { interval, deadline }
    }

    /// Query, test, sleep, repeat.
    ///
    /// # Errors
    ///
    /// A query error is returned immediately without further attempts.
    pub async fn poll_until<T, E, Q, Fut, P>(
        &self,
        mut query: Q,
        mut predicate: P,
    ) -> Result<PollOutcome<T>, E>
    where
        Q: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: FnMut(&T) -> bool,
        T: std::fmt::Debug,
    {
        let started = Instant::now();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let value = query().await?;

            if predicate(&value) {
                debug!("condition met after {attempts} queries: {value:?}");
                return Ok(PollOutcome::Satisfied(value));
            }

            let mut pause = self.interval;
            if let Some(deadline) = self.deadline {
                let elapsed = started.elapsed();
                if elapsed >= deadline {
                    warn!("condition not met after {attempts} queries, last value {value:?}");
                    return Ok(PollOutcome::TimedOut {
                        attempts,
                        last: Some(value),
                    });
                }
                // Last query lands on the deadline, not after it.
                pause = pause.min(deadline - elapsed);
            }

            debug!("condition not met yet ({value:?}), checking again in {pause:?}");
            tokio::time::sleep(pause).await;
        }
    }

    /// Like [`Self::poll_until`], but turns a timeout into
    /// [`Error::ConvergenceTimeout`] naming `condition`.
    ///
    /// # Errors
    ///
    /// Returns the query error, or the converted timeout.
    pub async fn wait_for<T, E, Q, Fut, P>(
        &self,
        condition: &str,
        query: Q,
        predicate: P,
    ) -> Result<T, E>
    where
        E: From<Error>,
        Q: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: FnMut(&T) -> bool,
        T: std::fmt::Debug,
    {
        let started = Instant::now();
        let outcome = self.poll_until(query, predicate).await?;
        outcome
            .satisfied(condition, started.elapsed())
            .map_err(E::from)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_third_query_satisfies() {
        let _ = tracing_subscriber::fmt::try_init();

        let poller = Poller::new(Duration::from_millis(100), None);
        let queries = AtomicU32::new(0);
        let counter = &queries;

        let started = Instant::now();
        let outcome = poller
            .poll_until(
                || async move { Ok::<_, Error>(counter.fetch_add(1, Ordering::SeqCst) + 1) },
                |n| *n == 3,
            )
            .await
            .unwrap();
        let elapsed = started.elapsed();

        assert_eq!(outcome, PollOutcome::Satisfied(3));
        assert!(elapsed >= Duration::from_millis(200), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(250), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_yields_timeout() {
        let poller = Poller::new(Duration::from_secs(1), Some(Duration::from_secs(5)));

        let outcome = poller
            .poll_until(|| async { Ok::<_, Error>(false) }, |done| *done)
            .await
            .unwrap();

        match outcome {
            PollOutcome::TimedOut { attempts, last } => {
                // Queries at 0s through 5s.
                assert_eq!(attempts, 6);
                assert_eq!(last, Some(false));
            }
            PollOutcome::Satisfied(_) => panic!("condition can never hold"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_does_not_overshoot_deadline() {
        let poller = Poller::new(Duration::from_secs(10), Some(Duration::from_secs(15)));

        let started = Instant::now();
        let outcome = poller
            .poll_until(|| async { Ok::<_, Error>(0) }, |n| *n == 1)
            .await
            .unwrap();

        // Queries at 0s, 10s and 15s; the last pause is shortened.
        assert_eq!(
            outcome,
            PollOutcome::TimedOut {
                attempts: 3,
                last: Some(0)
            }
        );
        assert_eq!(started.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_error_stops_polling() {
        let poller = Poller::default();
        let queries = AtomicU32::new(0);
        let counter = &queries;

        let result = poller
            .poll_until(
                || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<bool, _>("unreachable")
                },
                |_| true,
            )
            .await;

        assert_eq!(result.unwrap_err(), "unreachable");
        assert_eq!(queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_maps_timeout() {
        let poller = Poller::new(Duration::from_secs(1), Some(Duration::from_secs(2)));

        let err = poller
            .wait_for("signer to change", || async { Ok::<_, Error>(1) }, |n| *n == 2)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ConvergenceTimeout { .. }));
        assert!(err.to_string().contains("signer to change"));
    }
}
