//! Identifier types for futures.
//!
//! A [`FutureId`] names one settlement record. It is the identity used by the
//! adoption cycle guard and by log events; handles cloned from the same future
//! share one id.

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_FUTURE_ID: AtomicU64 = AtomicU64::new(1);

/// A unique identifier for a future's settlement record.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FutureId(u64);

impl FutureId {
    /// Allocates a fresh identifier.
    #[must_use]
    pub(crate) fn next() -> Self {
        Self(NEXT_FUTURE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates a future ID for testing purposes.
    #[doc(hidden)]
    #[must_use]
    pub const fn new_for_test(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for FutureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FutureId({})", self.0)
    }
}

impl fmt::Display for FutureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.0)
    }
}
