//! Admission control for the service boundary.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use purchases_common::{constants, PurchasesError, Result};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Permits granted per refresh period.
    pub limit_for_period: u32,
    /// Length of one refresh period.
    pub refresh_period: Duration,
    /// Maximum time a caller waits for a permit.
    pub timeout: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            limit_for_period: constants::RATE_LIMIT_PER_PERIOD,
            refresh_period: constants::rate_limit_refresh_period(),
            timeout: constants::rate_limit_timeout(),
        }
    }
}

impl RateLimiterConfig {
    /// Validate configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.limit_for_period == 0 {
            return Err("Rate limit per period must be positive".to_string());
        }

        if self.refresh_period.is_zero() {
            return Err("Rate limit refresh period must be positive".to_string());
        }

        Ok(())
    }
}

/// Permit counter for the current refresh cycle.
///
/// `permits` goes negative when callers reserve permits of future cycles.
#[derive(Debug)]
struct Bucket {
    cycle_start: Instant,
    permits: i64,
}

/// Token bucket refilled to `limit_for_period` at the start of every cycle.
///
/// A caller that finds the bucket empty reserves a permit in the first cycle
/// with one free, provided that cycle starts within `timeout`; it then sleeps
/// until the cycle begins. Otherwise it is rejected immediately. A caller
/// dropped while sleeping forfeits its reservation.
pub struct RateLimiterGate {
    config: RateLimiterConfig,
    bucket: Mutex<Bucket>,
}

impl RateLimiterGate {
    /// Create a gate with a full bucket.
    pub fn new(config: RateLimiterConfig) -> Self {
        let permits = config.limit_for_period as i64;
        Self {
            config,
            bucket: Mutex::new(Bucket {
                cycle_start: Instant::now(),
                permits,
            }),
        }
    }

    /// Wait for a permit, or fail with `RateLimited`.
    pub async fn acquire(&self) -> Result<()> {
        let wait = self.reserve(Instant::now())?;

        if !wait.is_zero() {
            debug!(wait_ms = wait.as_millis() as u64, "Waiting for rate limiter permit");
            tokio::time::sleep(wait).await;
        }

        Ok(())
    }

    /// Run `operation` once a permit is granted.
    ///
    /// The operation is not polled at all when admission is rejected.
    pub async fn run<F>(&self, operation: F) -> Result<F::Output>
    where
        F: Future,
    {
        self.acquire().await?;
        Ok(operation.await)
    }

    /// Permits left in the current cycle; negative when future cycles are reserved.
    pub fn available_permits(&self) -> i64 {
        let mut bucket = self.bucket.lock();
        self.refresh(&mut bucket, Instant::now());
        bucket.permits
    }

    /// Get the configuration.
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Take or reserve a permit and return how long to wait for it.
    fn reserve(&self, now: Instant) -> Result<Duration> {
        let mut bucket = self.bucket.lock();
        self.refresh(&mut bucket, now);

        if bucket.permits > 0 {
            bucket.permits -= 1;
            return Ok(Duration::ZERO);
        }

        let wait = self.wait_for_next_permit(&bucket, now);
        if wait > self.config.timeout {
            warn!(
                retry_after_ms = wait.as_millis() as u64,
                "Rate limit exceeded"
            );
            return Err(PurchasesError::RateLimited {
                retry_after_ms: wait.as_millis() as u64,
            });
        }

        bucket.permits -= 1;
        Ok(wait)
    }

    /// Start new cycles that elapsed since the last call.
    fn refresh(&self, bucket: &mut Bucket, now: Instant) {
        let period = self.config.refresh_period.as_nanos();
        let elapsed = now.saturating_duration_since(bucket.cycle_start).as_nanos();
        let cycles = elapsed / period;

        if cycles == 0 {
            return;
        }

        bucket.cycle_start = now - Duration::from_nanos((elapsed % period) as u64);

        let limit = self.config.limit_for_period as i64;
        let refill = i64::try_from(cycles)
            .unwrap_or(i64::MAX)
            .saturating_mul(limit);
        bucket.permits = bucket.permits.saturating_add(refill).min(limit);
    }

    /// Time until the first cycle with an unreserved permit starts.
    fn wait_for_next_permit(&self, bucket: &Bucket, now: Instant) -> Duration {
        let period = self.config.refresh_period;
        let until_next_cycle = (bucket.cycle_start + period).saturating_duration_since(now);

        let reserved = bucket.permits.unsigned_abs();
        let full_cycles = reserved / self.config.limit_for_period as u64;

        until_next_cycle + period.saturating_mul(u32::try_from(full_cycles).unwrap_or(u32::MAX))
    }
}

impl Default for RateLimiterGate {
    fn default() -> Self {
        Self::new(RateLimiterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn config(limit: u32, period_ms: u64, timeout_ms: u64) -> RateLimiterConfig {
        RateLimiterConfig {
            limit_for_period: limit,
            refresh_period: Duration::from_millis(period_ms),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_eleventh_request_in_window_is_rejected() {
        let gate = RateLimiterGate::default();

        for _ in 0..10 {
            gate.acquire().await.unwrap();
        }
        let eleventh = gate.acquire().await;

        assert_eq!(
            eleventh,
            Err(PurchasesError::RateLimited {
                retry_after_ms: 1000
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_permits_refill_after_period() {
        let gate = RateLimiterGate::default();
        for _ in 0..10 {
            gate.acquire().await.unwrap();
        }
        assert_eq!(gate.available_permits(), 0);

        tokio::time::advance(Duration::from_secs(1)).await;

        assert_eq!(gate.available_permits(), 10);
        assert!(gate.acquire().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_does_not_accumulate() {
        let gate = RateLimiterGate::default();

        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(gate.available_permits(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_caller_waits_for_next_cycle_within_timeout() {
        let gate = RateLimiterGate::new(config(1, 400, 500));
        gate.acquire().await.unwrap();

        let started = Instant::now();
        gate.acquire().await.unwrap();

        let waited = started.elapsed();
        assert!(waited >= Duration::from_millis(400));
        assert!(waited < Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reservations_queue_into_later_cycles() {
        let gate = RateLimiterGate::new(config(1, 200, 500));
        gate.acquire().await.unwrap();

        // Reserve cycles 1 and 2 without waiting for them.
        assert_eq!(gate.reserve(Instant::now()), Ok(Duration::from_millis(200)));
        assert_eq!(gate.reserve(Instant::now()), Ok(Duration::from_millis(400)));

        // Cycle 3 starts 600ms out, past the timeout.
        assert!(matches!(
            gate.reserve(Instant::now()),
            Err(PurchasesError::RateLimited { retry_after_ms: 600 })
        ));
        assert_eq!(gate.available_permits(), -2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_operation_is_never_polled() {
        let gate = RateLimiterGate::new(config(1, 1000, 0));
        gate.acquire().await.unwrap();

        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let result = gate
            .run(async move {
                flag.store(true, Ordering::SeqCst);
            })
            .await;

        assert!(result.is_err());
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_returns_operation_output() {
        let gate = RateLimiterGate::default();
        assert_eq!(gate.run(async { 42 }).await, Ok(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_admit_exactly_limit() {
        let gate = Arc::new(RateLimiterGate::default());

        let handles: Vec<_> = (0..30)
            .map(|_| {
                let gate = gate.clone();
                tokio::spawn(async move { gate.acquire().await.is_ok() })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 10);
    }

    #[test]
    fn test_config_validation() {
        assert!(RateLimiterConfig::default().validate().is_ok());
        assert!(config(0, 1000, 500).validate().is_err());
        assert!(config(10, 0, 500).validate().is_err());
    }
}
