use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// デフォルトの最小リクエスト間隔
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1000);

/// 全ブラウザ操作で共有する最小間隔リミッター
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// 前回から min_interval 経過するまで待機する。
    ///
    /// スロットはロック内で予約し、待機自体はロック外で行う。
    pub async fn wait_for_slot(&self) {
        let slot = {
            let mut last = self.last_request.lock().await;
            let now = Instant::now();
            let slot = match *last {
                Some(prev) => (prev + self.min_interval).max(now),
                None => now,
            };
            *last = Some(slot);
            slot
        };

        let now = Instant::now();
        if slot > now {
            debug!("Rate limit: waiting {:?}", slot - now);
            sleep_until(slot).await;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_first_call_does_not_wait() {
        let limiter = RateLimiter::default();
        let start = Instant::now();
        limiter.wait_for_slot().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_calls_are_spaced() {
        let limiter = RateLimiter::new(Duration::from_millis(1000));
        limiter.wait_for_slot().await;
        let first = Instant::now();
        limiter.wait_for_slot().await;
        let second = Instant::now();

        assert!(second - first >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_only_the_remaining_delta() {
        let limiter = RateLimiter::new(Duration::from_millis(1000));
        limiter.wait_for_slot().await;
        tokio::time::advance(Duration::from_millis(600)).await;

        let start = Instant::now();
        limiter.wait_for_slot().await;
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(400));
        assert!(waited < Duration::from_millis(450));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_interval_elapsed() {
        let limiter = RateLimiter::new(Duration::from_millis(1000));
        limiter.wait_for_slot().await;
        tokio::time::advance(Duration::from_millis(1500)).await;

        let start = Instant::now();
        limiter.wait_for_slot().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_cadence() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(1000)));
        let start = Instant::now();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    limiter.wait_for_slot().await;
                    Instant::now()
                })
            })
            .collect();

        let mut released = Vec::new();
        for handle in handles {
            released.push(handle.await.unwrap() - start);
        }
        released.sort();

        assert!(released[0] < Duration::from_millis(50));
        assert!(released[1] >= Duration::from_millis(1000));
        assert!(released[2] >= Duration::from_millis(2000));
        assert!(released[2] - released[1] >= Duration::from_millis(1000));
    }
}
