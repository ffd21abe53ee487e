use std::time::{Duration, Instant};

use tracing::warn;

use crate::error::{ErrorKind, GenError, GenResult};

/// Blocks new submissions for a fixed window after the provider rate-limits us.
#[derive(Clone, Debug)]
pub struct CooldownGate {
    window: Duration,
    until: Option<Instant>,
}

impl CooldownGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            until: None,
        }
    }

    pub fn check(&self, now: Instant) -> GenResult<()> {
        let remaining = self.remaining(now);
        if remaining.is_zero() {
            return Ok(());
        }
        Err(GenError::CoolingDown {
            remaining_secs: ceil_secs(remaining),
        })
    }

    /// Starts the window when `err` is a rate limit; other errors leave the gate alone.
    pub fn record(&mut self, err: &GenError, now: Instant) {
        if err.kind() != ErrorKind::RateLimited {
            return;
        }
        warn!(
            cooldown_secs = self.window.as_secs(),
            "rate limited, pausing new submissions"
        );
        self.until = Some(now + self.window);
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.until
            .map(|until| until.saturating_duration_since(now))
            .unwrap_or_default()
    }

    pub fn remaining_secs(&self, now: Instant) -> u64 {
        ceil_secs(self.remaining(now))
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 { secs + 1 } else { secs }
}
