//! In-memory rate limiting for login attempts.
//!
//! Fixed-window counter per key; overflowing the window escalates to an
//! explicit timed block. The table is owned by `AuthState`, guarded by a
//! mutex, bounded, and driven by an injected clock so tests control time.
//! State is process-local: under a multi-instance deployment the limits are
//! per instance, not global. A shared-store backend would be needed for
//! cluster-wide limits.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Copy, Debug)]
pub struct RateLimitSettings {
    /// Attempts allowed per window. Zero disables limiting entirely.
    pub limit: u32,
    /// Window length. Zero disables limiting entirely.
    pub window: Duration,
    /// Block applied once the limit is exceeded; `None` blocks for the
    /// remainder of the current window.
    pub block: Option<Duration>,
    /// Table capacity before expired entries are swept.
    pub max_entries: usize,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            limit: 5,
            window: Duration::from_secs(60),
            block: Some(Duration::from_secs(15 * 60)),
            max_entries: 10_000,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { remaining: u32 },
    Blocked { retry_after: Duration },
}

impl RateLimitDecision {
    #[must_use]
    pub fn is_limited(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

#[derive(Debug)]
struct Entry {
    window_start_ms: u64,
    count: u32,
    blocked_until_ms: u64,
}

type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

/// Fixed-window limiter keyed by caller identity (IP, or IP plus username).
pub struct FixedWindowLimiter {
    settings: RateLimitSettings,
    entries: Mutex<HashMap<String, Entry>>,
    clock: Clock,
}

impl FixedWindowLimiter {
    #[must_use]
    pub fn new(settings: RateLimitSettings) -> Self {
        Self::with_clock(settings, Arc::new(wall_clock_ms))
    }

    /// Limiter with a caller-supplied clock returning epoch milliseconds.
    #[must_use]
    pub fn with_clock(settings: RateLimitSettings, clock: Clock) -> Self {
        Self {
            settings,
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Register an attempt for `key` and decide whether to admit it.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let limit = self.settings.limit;
        let window_ms = duration_ms(self.settings.window);
        // Non-positive limit or window means misconfiguration; degrade to
        // always-allow rather than locking out all traffic.
        if limit == 0 || window_ms == 0 {
            return RateLimitDecision::Allowed { remaining: limit };
        }

        let now = (self.clock)();
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };

        if entries.len() >= self.settings.max_entries {
            entries.retain(|_, entry| {
                entry.blocked_until_ms > now
                    || entry.window_start_ms.saturating_add(window_ms) > now
            });
        }

        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            window_start_ms: now,
            count: 0,
            blocked_until_ms: 0,
        });

        // An active block outlives any window reset.
        if entry.blocked_until_ms > now {
            return RateLimitDecision::Blocked {
                retry_after: Duration::from_millis(entry.blocked_until_ms - now),
            };
        }

        if now >= entry.window_start_ms.saturating_add(window_ms) {
            // Window start only ever moves forward.
            entry.window_start_ms = now.max(entry.window_start_ms);
            entry.count = 0;
            entry.blocked_until_ms = 0;
        }

        entry.count = entry.count.saturating_add(1);
        if entry.count > limit {
            let blocked_until = match self.settings.block {
                Some(block) => now.saturating_add(duration_ms(block)),
                None => entry.window_start_ms.saturating_add(window_ms),
            };
            entry.blocked_until_ms = blocked_until;
            return RateLimitDecision::Blocked {
                retry_after: Duration::from_millis(blocked_until.saturating_sub(now)),
            };
        }

        RateLimitDecision::Allowed {
            remaining: limit - entry.count,
        }
    }

    #[cfg(test)]
    fn entry_count(&self) -> usize {
        match self.entries.lock() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

fn wall_clock_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn manual_clock(start_ms: u64) -> (Arc<AtomicU64>, Clock) {
        let time = Arc::new(AtomicU64::new(start_ms));
        let handle = Arc::clone(&time);
        (time, Arc::new(move || handle.load(Ordering::SeqCst)))
    }

    fn settings() -> RateLimitSettings {
        RateLimitSettings {
            limit: 5,
            window: Duration::from_secs(60),
            block: Some(Duration::from_secs(300)),
            max_entries: 10_000,
        }
    }

    #[test]
    fn sixth_attempt_in_window_is_denied() {
        let (_, clock) = manual_clock(1_000);
        let limiter = FixedWindowLimiter::with_clock(settings(), clock);

        for attempt in 0..5 {
            assert_eq!(
                limiter.check("10.0.0.1:alice"),
                RateLimitDecision::Allowed {
                    remaining: 4 - attempt
                }
            );
        }
        assert!(limiter.check("10.0.0.1:alice").is_limited());
    }

    #[test]
    fn keys_are_independent() {
        let (_, clock) = manual_clock(1_000);
        let limiter = FixedWindowLimiter::with_clock(settings(), clock);

        for _ in 0..6 {
            limiter.check("10.0.0.1:alice");
        }
        assert!(limiter.check("10.0.0.1:alice").is_limited());
        assert!(!limiter.check("10.0.0.2:alice").is_limited());
    }

    #[test]
    fn elapsed_window_starts_fresh() {
        let (time, clock) = manual_clock(1_000);
        let limiter = FixedWindowLimiter::with_clock(
            RateLimitSettings {
                block: None,
                ..settings()
            },
            clock,
        );

        for _ in 0..6 {
            limiter.check("key");
        }
        assert!(limiter.check("key").is_limited());

        time.store(1_000 + 60_001, Ordering::SeqCst);
        assert_eq!(limiter.check("key"), RateLimitDecision::Allowed { remaining: 4 });
    }

    #[test]
    fn block_outlasts_the_window() {
        let (time, clock) = manual_clock(1_000);
        let limiter = FixedWindowLimiter::with_clock(settings(), clock);

        for _ in 0..6 {
            limiter.check("key");
        }

        // Two windows later the block (300s) is still active.
        time.store(1_000 + 120_000, Ordering::SeqCst);
        let decision = limiter.check("key");
        assert_eq!(
            decision,
            RateLimitDecision::Blocked {
                retry_after: Duration::from_millis(180_000)
            }
        );

        // Once the block expires the key is admitted again.
        time.store(1_000 + 300_001, Ordering::SeqCst);
        assert_eq!(limiter.check("key"), RateLimitDecision::Allowed { remaining: 4 });
    }

    #[test]
    fn overflow_without_block_denies_for_window_remainder() {
        let (time, clock) = manual_clock(10_000);
        let limiter = FixedWindowLimiter::with_clock(
            RateLimitSettings {
                block: None,
                ..settings()
            },
            clock,
        );

        for _ in 0..5 {
            limiter.check("key");
        }
        time.store(20_000, Ordering::SeqCst);
        let decision = limiter.check("key");
        // Window started at 10_000 and runs 60s; 50s remain.
        assert_eq!(
            decision,
            RateLimitDecision::Blocked {
                retry_after: Duration::from_millis(50_000)
            }
        );
    }

    #[test]
    fn misconfigured_limits_always_allow() {
        let (_, clock) = manual_clock(1_000);
        let limiter = FixedWindowLimiter::with_clock(
            RateLimitSettings {
                limit: 0,
                ..settings()
            },
            clock,
        );
        for _ in 0..100 {
            assert!(!limiter.check("key").is_limited());
        }

        let (_, clock) = manual_clock(1_000);
        let limiter = FixedWindowLimiter::with_clock(
            RateLimitSettings {
                window: Duration::ZERO,
                ..settings()
            },
            clock,
        );
        for _ in 0..100 {
            assert!(!limiter.check("key").is_limited());
        }
    }

    #[test]
    fn expired_entries_are_swept_at_capacity() {
        let (time, clock) = manual_clock(1_000);
        let limiter = FixedWindowLimiter::with_clock(
            RateLimitSettings {
                max_entries: 4,
                ..settings()
            },
            clock,
        );

        for key in ["a", "b", "c", "d"] {
            limiter.check(key);
        }
        assert_eq!(limiter.entry_count(), 4);

        // All four windows have elapsed; inserting a fifth key sweeps them.
        time.store(1_000 + 61_000, Ordering::SeqCst);
        limiter.check("e");
        assert_eq!(limiter.entry_count(), 1);
    }

    #[test]
    fn live_entries_survive_the_sweep() {
        let (time, clock) = manual_clock(1_000);
        let limiter = FixedWindowLimiter::with_clock(
            RateLimitSettings {
                max_entries: 2,
                ..settings()
            },
            clock,
        );

        for _ in 0..6 {
            limiter.check("blocked-key");
        }
        limiter.check("idle-key");

        // "idle-key"'s window has elapsed, "blocked-key" is still blocked.
        time.store(1_000 + 61_000, Ordering::SeqCst);
        limiter.check("fresh-key");
        assert_eq!(limiter.entry_count(), 2);
        assert!(limiter.check("blocked-key").is_limited());
    }
}
