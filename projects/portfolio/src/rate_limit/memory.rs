use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::{sync::Mutex, time::Instant};

use super::{RateLimitConfig, RateLimitDecision, RateLimitStore, RateLimitStoreError};

/// Number of tracked keys above which idle ones are dropped.
const PRUNE_THRESHOLD: usize = 1024;

/// Sliding-log limiter held in process memory.
///
/// Each key keeps the instants of its accepted hits; hits older than the
/// window fall off on the next check, so the quota frees up one slot at a
/// time rather than all at once. State is lost on restart.
#[derive(Debug)]
pub struct InMemoryRateLimiter {
    config: RateLimitConfig,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            hits: Mutex::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.hits.lock().await.len()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimiter {
    async fn try_acquire(&self, key: &str) -> Result<RateLimitDecision, RateLimitStoreError> {
        let now = Instant::now();
        let window = self.config.window;
        let max_requests = self.config.max_requests as usize;

        let mut hits = self.hits.lock().await;

        if hits.len() >= PRUNE_THRESHOLD {
            hits.retain(|_, log| {
                log.back()
                    .is_some_and(|last| now.duration_since(*last) < window)
            });
        }

        let log = hits.entry(key.to_string()).or_default();
        while log
            .front()
            .is_some_and(|oldest| now.duration_since(*oldest) >= window)
        {
            log.pop_front();
        }

        if log.len() >= max_requests {
            let retry_after = log
                .front()
                .map(|oldest| window.saturating_sub(now.duration_since(*oldest)))
                .unwrap_or(window);
            return Ok(RateLimitDecision::Limited { retry_after });
        }

        log.push_back(now);
        let remaining = (max_requests - log.len()) as u32;

        Ok(RateLimitDecision::Allowed { remaining })
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use pretty_assertions::assert_eq;
    use tokio::{task::JoinSet, time::advance};

    use super::*;

    fn limiter() -> InMemoryRateLimiter {
        InMemoryRateLimiter::new(RateLimitConfig::contact_form())
    }

    #[tokio::test(start_paused = true)]
    async fn allows_three_then_limits_the_fourth() {
        let limiter = limiter();

        for remaining in [2, 1, 0] {
            assert_eq!(
                limiter.try_acquire("203.0.113.9").await.unwrap(),
                RateLimitDecision::Allowed { remaining }
            );
        }

        assert_eq!(
            limiter.try_acquire("203.0.113.9").await.unwrap(),
            RateLimitDecision::Limited {
                retry_after: Duration::from_secs(15 * 60)
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_counted_independently() {
        let limiter = limiter();

        for _ in 0..3 {
            limiter.try_acquire("a").await.unwrap();
        }

        assert_eq!(
            limiter.try_acquire("b").await.unwrap(),
            RateLimitDecision::Allowed { remaining: 2 }
        );
        assert!(matches!(
            limiter.try_acquire("a").await.unwrap(),
            RateLimitDecision::Limited { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn slots_free_up_as_hits_leave_the_window() {
        let limiter = limiter();

        limiter.try_acquire("a").await.unwrap();
        advance(Duration::from_secs(5 * 60)).await;
        limiter.try_acquire("a").await.unwrap();
        advance(Duration::from_secs(5 * 60)).await;
        limiter.try_acquire("a").await.unwrap();

        advance(Duration::from_secs(4 * 60)).await;
        assert_eq!(
            limiter.try_acquire("a").await.unwrap(),
            RateLimitDecision::Limited {
                retry_after: Duration::from_secs(60)
            }
        );

        // the first hit is now fifteen minutes old
        advance(Duration::from_secs(60)).await;
        assert_eq!(
            limiter.try_acquire("a").await.unwrap(),
            RateLimitDecision::Allowed { remaining: 0 }
        );
        assert!(matches!(
            limiter.try_acquire("a").await.unwrap(),
            RateLimitDecision::Limited { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_hits_do_not_extend_the_window() {
        let limiter = limiter();

        for _ in 0..3 {
            limiter.try_acquire("a").await.unwrap();
        }
        for _ in 0..5 {
            advance(Duration::from_secs(60)).await;
            limiter.try_acquire("a").await.unwrap();
        }

        advance(Duration::from_secs(10 * 60)).await;
        assert_eq!(
            limiter.try_acquire("a").await.unwrap(),
            RateLimitDecision::Allowed { remaining: 2 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn idle_keys_are_pruned_once_the_map_grows() {
        let limiter = limiter();

        for i in 0..PRUNE_THRESHOLD {
            limiter.try_acquire(&format!("client-{i}")).await.unwrap();
        }
        assert_eq!(limiter.tracked_keys().await, PRUNE_THRESHOLD);

        advance(Duration::from_secs(15 * 60)).await;
        limiter.try_acquire("fresh").await.unwrap();

        assert_eq!(limiter.tracked_keys().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_hits_on_one_key_admit_exactly_the_quota() {
        let limiter = Arc::new(limiter());

        let mut tasks = JoinSet::new();
        for _ in 0..64 {
            let limiter = Arc::clone(&limiter);
            tasks.spawn(async move { limiter.try_acquire("k").await.unwrap() });
        }

        let mut allowed = 0;
        while let Some(decision) = tasks.join_next().await {
            if matches!(decision.unwrap(), RateLimitDecision::Allowed { .. }) {
                allowed += 1;
            }
        }

        assert_eq!(allowed, 3);
    }
}
