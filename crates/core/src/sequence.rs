//! Generation counters for latest-request-wins updates.
//!
//! Each outgoing request takes a [`Generation`] before it starts. When its
//! response comes back, the receiver compares generations and drops anything
//! older than what it has already applied.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Monotonic request stamp. Higher is newer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Generation(u64);

impl Generation {
    /// Older than anything a [`Sequencer`] hands out.
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out strictly increasing generations. Shareable across tasks.
#[derive(Debug, Default)]
pub struct Sequencer {
    last: AtomicU64,
}

impl Sequencer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Stamp a new request.
    pub fn next(&self) -> Generation {
        Generation(self.last.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// The most recently issued generation.
    #[must_use]
    pub fn current(&self) -> Generation {
        Generation(self.last.load(Ordering::Acquire))
    }

    /// Whether `generation` is still the newest one issued.
    #[must_use]
    pub fn is_latest(&self, generation: Generation) -> bool {
        self.current() == generation
    }
}
