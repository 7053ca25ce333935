//! Single-flight refresh coordinator.
//!
//! When several concurrent requests hit the same expired-access-token 401,
//! exactly one of them should call the refresh endpoint; the rest wait for
//! that call and then retry with the refreshed cookie. The coordinator keys
//! this on a generation counter: callers capture the generation before their
//! request, and a refresh only runs if no one else has refreshed since that
//! point.

use tokio::sync::Mutex;

/// Explicit single-flight guard for token refresh.
///
/// The mutex is held for the duration of the refresh call, so concurrent
/// callers queue behind it. Each completed refresh bumps the generation;
/// queued callers observe the bump and skip their own refresh.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    generation: Mutex<u64>,
}

impl RefreshCoordinator {
    /// Create a new coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current refresh generation.
    ///
    /// Capture this before issuing a request; pass it to [`Self::refresh`]
    /// when the request comes back with an expired-token 401.
    pub async fn generation(&self) -> u64 {
        *self.generation.lock().await
    }

    /// Run `refresh` unless another caller already completed a refresh after
    /// `observed_generation` was captured.
    ///
    /// Returns `Ok(true)` if this caller performed the refresh, `Ok(false)`
    /// if it piggybacked on someone else's.
    ///
    /// # Errors
    ///
    /// Propagates the refresh operation's error. A failed refresh does not
    /// bump the generation, so the next caller tries again.
    pub async fn refresh<F, Fut, E>(
        &self,
        observed_generation: u64,
        refresh: F,
    ) -> Result<bool, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let mut generation = self.generation.lock().await;

        if *generation > observed_generation {
            // Someone refreshed while we were waiting for the lock.
            return Ok(false);
        }

        refresh().await?;
        *generation += 1;

        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_single_caller_refreshes() {
        let coordinator = RefreshCoordinator::new();
        let generation = coordinator.generation().await;

        let ran = coordinator
            .refresh(generation, || async { Ok::<_, ()>(()) })
            .await
            .unwrap();

        assert!(ran);
        assert_eq!(coordinator.generation().await, generation + 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_collapse_into_one_refresh() {
        let coordinator = Arc::new(RefreshCoordinator::new());
        let refresh_count = Arc::new(AtomicUsize::new(0));

        // All tasks observe the same generation, as if their requests raced
        // on the same expired token.
        let observed = coordinator.generation().await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let coordinator = Arc::clone(&coordinator);
            let refresh_count = Arc::clone(&refresh_count);
            handles.push(tokio::spawn(async move {
                coordinator
                    .refresh(observed, || {
                        let refresh_count = Arc::clone(&refresh_count);
                        async move {
                            refresh_count.fetch_add(1, Ordering::SeqCst);
                            Ok::<_, ()>(())
                        }
                    })
                    .await
                    .unwrap()
            }));
        }

        let mut performed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                performed += 1;
            }
        }

        assert_eq!(refresh_count.load(Ordering::SeqCst), 1);
        assert_eq!(performed, 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_generation_for_retry() {
        let coordinator = RefreshCoordinator::new();
        let observed = coordinator.generation().await;

        let result = coordinator
            .refresh(observed, || async { Err::<(), _>("boom") })
            .await;
        assert_eq!(result, Err("boom"));

        // Generation unchanged: the next caller gets to try again.
        assert_eq!(coordinator.generation().await, observed);
        let ran = coordinator
            .refresh(observed, || async { Ok::<_, &str>(()) })
            .await
            .unwrap();
        assert!(ran);
    }

    #[tokio::test]
    async fn test_stale_observation_skips_refresh() {
        let coordinator = RefreshCoordinator::new();
        let stale = coordinator.generation().await;

        coordinator
            .refresh(stale, || async { Ok::<_, ()>(()) })
            .await
            .unwrap();

        // A 401 observed before the refresh above must not trigger another.
        let ran = coordinator
            .refresh(stale, || async { Ok::<_, ()>(()) })
            .await
            .unwrap();
        assert!(!ran);
    }
}
