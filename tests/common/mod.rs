#![allow(dead_code)]
#![allow(unused_imports)]
//! Shared integration test utilities.
//!
//! Import with:
//! ```
//! mod common;
//! use common::*;
//! ```

use pledge::runtime::{self, set_timer};
use pledge::{Error, Future, Resolution};
use proptest::prelude::ProptestConfig;
use proptest::test_runner::RngSeed;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Once;
use tracing_subscriber::fmt::format::FmtSpan;

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

/// Log test completion.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "test completed successfully");
    };
}

static INIT_LOGGING: Once = Once::new();

/// Default seed for property tests when running under CI.
pub const DEFAULT_PROPTEST_SEED: u64 = 0x5EED_5EED;

const PROPTEST_SEED_ENV: &str = "PLEDGE_PROPTEST_SEED";

/// Build a ProptestConfig with deterministic seed support for CI.
#[must_use]
pub fn test_proptest_config(cases: u32) -> ProptestConfig {
    let mut config = ProptestConfig::with_cases(cases);
    if matches!(config.rng_seed, RngSeed::Random) {
        if let Some(seed) = read_proptest_seed() {
            config.rng_seed = RngSeed::Fixed(seed);
        }
    }
    config
}

fn read_proptest_seed() -> Option<u64> {
    if let Ok(value) = std::env::var(PROPTEST_SEED_ENV) {
        return value.parse::<u64>().ok();
    }
    std::env::var("CI").ok().map(|_| DEFAULT_PROPTEST_SEED)
}

/// Initialize test logging with trace-level output.
pub fn init_test_logging() {
    init_test_logging_with_level(tracing::Level::TRACE);
}

/// Initialize test logging with a custom level.
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

/// Initialize logging and announce the test.
pub fn init_test(name: &str) {
    init_test_logging();
    test_phase!(name);
}

/// Drive the loop until `future` settles and return its value.
pub fn fulfilled<T: Clone + 'static>(future: &Future<T>) -> T {
    match runtime::block_on(future) {
        Ok(value) => value,
        Err(reason) => panic!("expected fulfilment, got {reason}"),
    }
}

/// Drive the loop until `future` settles and return its rejection reason.
pub fn rejected<T: Clone + std::fmt::Debug + 'static>(future: &Future<T>) -> Error {
    match runtime::block_on(future) {
        Ok(value) => panic!("expected rejection, got {value:?}"),
        Err(reason) => reason,
    }
}

/// A future fulfilled with `value` after `ms` of virtual time.
pub fn fulfill_after<T: Clone + 'static>(ms: u64, value: T) -> Future<T> {
    let (future, resolver) = Future::pending();
    set_timer(ms, move || resolver.fulfill(value));
    future
}

/// A future rejected with `reason` after `ms` of virtual time.
pub fn reject_after<T: Clone + 'static>(ms: u64, reason: Error) -> Future<T> {
    let (future, resolver) = Future::pending();
    set_timer(ms, move || resolver.reject(reason));
    future
}

/// Counts operations outstanding and the peak seen.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    current: Rc<Cell<usize>>,
    peak: Rc<Cell<usize>>,
}

impl InFlight {
    /// Starts one tracked operation that fulfils with `value` after `ms`.
    pub fn track<T: Clone + 'static>(&self, ms: u64, value: T) -> Resolution<T> {
        self.current.set(self.current.get() + 1);
        self.peak.set(self.peak.get().max(self.current.get()));
        let current = Rc::clone(&self.current);
        Resolution::Future(fulfill_after(ms, ()).map(move |()| {
            current.set(current.get() - 1);
            Ok(value)
        }))
    }

    /// Highest number of operations outstanding at once.
    pub fn peak(&self) -> usize {
        self.peak.get()
    }

    /// Operations outstanding right now.
    pub fn current(&self) -> usize {
        self.current.get()
    }
}
