//! Delay sources: how long the simulator pauses between transitions.
//!
//! Production runs use `RandomDelay` to mimic dispatch and processing jitter;
//! tests plug in `NoDelay` or `FixedDelay` for deterministic timing.

use std::ops::Range;
use std::time::Duration;

use pulsedrive_core::DelaySource;
use rand::Rng;

/// Uniformly random delay in `[start, end)` milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomDelay;

impl DelaySource for RandomDelay {
    fn pick(&self, range_ms: Range<u64>) -> Duration {
        // gen_range panics on an empty range.
        if range_ms.start >= range_ms.end {
            return Duration::from_millis(range_ms.start);
        }
        Duration::from_millis(rand::thread_rng().gen_range(range_ms))
    }
}

/// Always the same pause, regardless of range.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl DelaySource for FixedDelay {
    fn pick(&self, _range_ms: Range<u64>) -> Duration {
        self.0
    }
}

/// No pause at all; the simulator never sleeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl DelaySource for NoDelay {
    fn pick(&self, _range_ms: Range<u64>) -> Duration {
        Duration::ZERO
    }
}
