//! Test utilities for Pledge.
//!
//! Shared helpers for unit tests:
//! - Consistent tracing-based logging initialization
//! - Phase/section macros for readable test output
//! - Locks for process-wide state (environment, unhandled-rejection hook)
//! - Timer-backed futures and an in-flight tracker for scheduler tests

use crate::future::{Future, Resolution};
use crate::runtime;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::{Mutex, MutexGuard, Once};
use tracing_subscriber::fmt::format::FmtSpan;

static INIT_LOGGING: Once = Once::new();
static ENV_LOCK: Mutex<()> = Mutex::new(());
static HOOK_LOCK: Mutex<()> = Mutex::new(());

/// Initialize test logging with trace-level output.
///
/// Safe to call multiple times; only initializes once.
pub fn init_test_logging() {
    init_test_logging_with_level(tracing::Level::TRACE);
}

/// Initialize test logging with a custom level.
///
/// The first call wins; later calls are no-ops.
pub fn init_test_logging_with_level(level: tracing::Level) {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .try_init();
    });
}

/// Initialize logging and announce the test by name.
pub fn init_test(name: &str) {
    init_test_logging();
    crate::test_phase!(name);
}

/// Acquire the global environment lock for tests that mutate env vars.
pub(crate) fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Acquire the lock for tests that install the unhandled-rejection hook.
pub(crate) fn hook_lock() -> MutexGuard<'static, ()> {
    HOOK_LOCK
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// A future fulfilled with `value` after `ms` of virtual time.
pub(crate) fn fulfill_after<T: Clone + 'static>(ms: u64, value: T) -> Future<T> {
    let (future, resolver) = Future::pending();
    runtime::set_timer(ms, move || resolver.fulfill(value));
    future
}

/// A future rejected with `reason` after `ms` of virtual time.
pub(crate) fn reject_after<T: Clone + 'static>(ms: u64, reason: crate::Error) -> Future<T> {
    let (future, resolver) = Future::pending();
    runtime::set_timer(ms, move || resolver.reject(reason));
    future
}

/// Counts operations currently outstanding and the peak seen.
#[derive(Debug, Clone, Default)]
pub(crate) struct InFlight {
    current: Rc<Cell<usize>>,
    peak: Rc<Cell<usize>>,
}

impl InFlight {
    /// Marks one operation started; returns a future that fulfils with
    /// `value` after `ms` and marks it finished.
    pub(crate) fn track<T: Clone + 'static>(&self, ms: u64, value: T) -> Resolution<T> {
        self.current.set(self.current.get() + 1);
        self.peak.set(self.peak.get().max(self.current.get()));
        let current = Rc::clone(&self.current);
        Resolution::Future(fulfill_after(ms, ()).map(move |()| {
            current.set(current.get() - 1);
            Ok(value)
        }))
    }

    pub(crate) fn peak(&self) -> usize {
        self.peak.get()
    }

    pub(crate) fn current(&self) -> usize {
        self.current.get()
    }
}

/// Log a test phase transition with a visual separator.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(phase = %$name, "========================================");
        tracing::info!(phase = %$name, "TEST PHASE: {}", $name);
        tracing::info!(phase = %$name, "========================================");
    };
}

/// Log a section within a test phase.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        tracing::debug!(section = %$name, "--- {} ---", $name);
    };
}

/// Log before assertions for context.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        tracing::debug!(
            expected = ?$expected,
            actual = ?$actual,
            "Asserting: {}",
            $msg
        );
        assert!($cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    };
}

/// Drive the loop and assert the future fulfilled with a value.
#[macro_export]
macro_rules! assert_fulfilled {
    ($future:expr, $expected:expr) => {
        match $crate::runtime::block_on(&$future) {
            Ok(v) => assert_eq!(v, $expected),
            Err(e) => unreachable!("expected fulfilment with {:?}, got {e}", $expected),
        }
    };
}

/// Drive the loop and assert the future rejected with an error kind.
#[macro_export]
macro_rules! assert_rejected {
    ($future:expr, $kind:expr) => {
        match $crate::runtime::block_on(&$future) {
            Err(e) => assert_eq!(e.kind(), $kind, "unexpected rejection: {e}"),
            Ok(v) => unreachable!("expected rejection of kind {:?}, got {:?}", $kind, v),
        }
    };
}
