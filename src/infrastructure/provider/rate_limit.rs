//! Client-side pacing for the text-generation backend
//!
//! Two mechanisms: a minimum spacing between consecutive requests, and a
//! cooldown window entered when the backend answers 429. During cooldown
//! callers are told to skip the network entirely.

use std::fmt::Debug;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Clock abstraction so pacing decisions are testable without sleeping.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

/// Wall-clock implementation used in production.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// What the caller should do before issuing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Throttle {
    /// Send immediately.
    Proceed,
    /// Wait this long, then send.
    Delay(Duration),
    /// In cooldown after a 429; do not send at all.
    Cooldown,
}

/// Configuration for request pacing
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Minimum spacing between consecutive requests
    pub min_interval: Duration,
    /// How long to back off after the backend answers 429
    pub cooldown: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(1000),
            cooldown: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Default)]
struct LimiterState {
    last_request_at: Option<Instant>,
    cooldown_until: Option<Instant>,
}

/// Paces outbound requests and tracks 429-triggered cooldowns.
#[derive(Debug)]
pub struct RateLimiter<C: Clock = SystemClock> {
    config: RateLimiterConfig,
    clock: C,
    state: Mutex<LimiterState>,
}

impl RateLimiter<SystemClock> {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> RateLimiter<C> {
    pub fn with_clock(config: RateLimiterConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            state: Mutex::new(LimiterState::default()),
        }
    }

    /// Decides whether the next request may go out. On `Proceed` or
    /// `Delay` the request slot is claimed; `Cooldown` claims nothing.
    pub fn begin_request(&self) -> Throttle {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap();

        if let Some(until) = state.cooldown_until {
            if now < until {
                return Throttle::Cooldown;
            }
            state.cooldown_until = None;
        }

        let throttle = match state.last_request_at {
            Some(last) => {
                let elapsed = now.duration_since(last);
                if elapsed >= self.config.min_interval {
                    Throttle::Proceed
                } else {
                    Throttle::Delay(self.config.min_interval - elapsed)
                }
            }
            None => Throttle::Proceed,
        };

        // The slot is claimed at the time the request will actually fire.
        state.last_request_at = Some(match throttle {
            Throttle::Delay(wait) => now + wait,
            _ => now,
        });

        throttle
    }

    /// Enters cooldown; called when the backend answers 429.
    pub fn note_rate_limited(&self) {
        let mut state = self.state.lock().unwrap();
        state.cooldown_until = Some(self.clock.now() + self.config.cooldown);
    }

    /// Whether the limiter is currently in cooldown.
    pub fn in_cooldown(&self) -> bool {
        let state = self.state.lock().unwrap();
        matches!(state.cooldown_until, Some(until) if self.clock.now() < until)
    }
}
