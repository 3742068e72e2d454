//! Concurrency ceilings for the bounded scheduler.

use core::fmt;
use std::num::NonZeroUsize;

/// Maximum number of in-flight operations.
///
/// The ceiling bounds logical operations, not threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Concurrency {
    /// No ceiling; every item starts immediately.
    #[default]
    Unbounded,
    /// At most `n` operations outstanding.
    Limited(NonZeroUsize),
}

impl Concurrency {
    /// One operation at a time.
    pub const SERIES: Self = Self::Limited(NonZeroUsize::MIN);

    /// A ceiling of `n`; zero is clamped to one so the scheduler always makes progress.
    #[must_use]
    pub fn limited(n: usize) -> Self {
        Self::Limited(NonZeroUsize::new(n).unwrap_or(NonZeroUsize::MIN))
    }

    /// Returns true if another operation may start with `in_flight` outstanding.
    #[must_use]
    pub fn admits(self, in_flight: usize) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Limited(n) => in_flight < n.get(),
        }
    }

    /// The numeric ceiling, if any.
    #[must_use]
    pub fn get(self) -> Option<usize> {
        match self {
            Self::Unbounded => None,
            Self::Limited(n) => Some(n.get()),
        }
    }
}

impl fmt::Display for Concurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => write!(f, "unbounded"),
            Self::Limited(n) => write!(f, "{n}"),
        }
    }
}
