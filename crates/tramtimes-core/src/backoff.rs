//! Jittered backoff delays.
//!
//! One calculator serves both the retry loop (quadratic growth per attempt)
//! and the polite pauses between day and stop fetches (flat base). The
//! randomness source is always passed in explicitly so delays are
//! reproducible under a fixed seed.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// No computed delay is ever shorter than this.
pub const MIN_DELAY: Duration = Duration::from_millis(100);

/// Jitter magnitude as a fraction of the (scaled) base delay.
pub const DEFAULT_JITTER_FACTOR: f64 = 0.5;

/// Compute a jittered delay.
///
/// With `attempt = Some(n)` the base grows to `base * n^2` first. The result
/// is `scaled + scaled * jitter_factor * u` for `u` uniform in `[-1, 1)`,
/// floored at [`MIN_DELAY`].
pub fn jittered_delay<R: Rng + ?Sized>(
    base: Duration,
    attempt: Option<u32>,
    jitter_factor: f64,
    rng: &mut R,
) -> Duration {
    let mut base_ms = base.as_secs_f64() * 1000.0;
    if let Some(attempt) = attempt {
        base_ms *= f64::from(attempt).powi(2);
    }

    let u = rng.gen_range::<f64, _>(-1.0..1.0);
    let jitter_ms = base_ms * jitter_factor * u;

    let delay = Duration::try_from_secs_f64((base_ms + jitter_ms).max(0.0) / 1000.0)
        .unwrap_or(Duration::MAX);
    delay.max(MIN_DELAY)
}

/// Shared, seedable jitter source.
///
/// Cloning shares the underlying RNG, so the whole run draws from a single
/// sequence.
#[derive(Debug, Clone)]
pub struct Backoff {
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl Backoff {
    pub fn from_entropy() -> Self {
        Self::from_rng(ChaCha8Rng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    fn from_rng(rng: ChaCha8Rng) -> Self {
        Self {
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    /// Draw the next delay for `base` (and optional retry attempt).
    pub fn delay(&self, base: Duration, attempt: Option<u32>) -> Duration {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Recovered from poisoned jitter mutex");
            poisoned.into_inner()
        });
        jittered_delay(base, attempt, DEFAULT_JITTER_FACTOR, &mut *rng)
    }

    /// Sleep for a jittered `base` delay.
    pub async fn pause(&self, base: Duration) {
        let delay = self.delay(base, None);
        tracing::debug!(delay_ms = %delay.as_millis(), "Pausing between requests");
        tokio::time::sleep(delay).await;
    }
}
