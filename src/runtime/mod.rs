//! Event loop, configuration and the unhandled-rejection registry.
//!
//! - [`config`]: Runtime configuration types
//! - [`env_config`]: `PLEDGE_*` environment overrides and TOML loading
//! - [`local`]: the thread-local microtask queue and virtual clock
//! - [`timer`]: timer heap backing [`set_timer`]
//! - [`unhandled`]: process-wide unhandled-rejection hook
//!
//! # Driving the loop
//!
//! ```
//! use pledge::{runtime, Future};
//!
//! let doubled = Future::fulfilled(21).map(|v| Ok(v * 2));
//! assert_eq!(runtime::block_on(&doubled).unwrap(), 42);
//! ```
//!
//! Reactions never run synchronously. They are queued as microtasks and run
//! when the owning thread drains its loop.

pub mod config;
pub mod env_config;
pub mod local;
pub mod timer;
pub mod unhandled;

pub use config::RuntimeConfig;
pub use env_config::ConfigError;
pub use local::{
    advance_time, clear, clear_timer, config, configure, defer, now, pending_microtasks,
    pending_timers, run_until_stalled, set_timer,
};
pub use timer::TimerId;
pub use unhandled::{
    clear_unhandled_rejection_hook, has_unhandled_rejection_hook, set_unhandled_rejection_hook,
    HookGuard, UnhandledRejection,
};

use crate::error::{Error, ErrorKind, Result};
use crate::future::Future;

/// Drains microtasks and fires timers until there is no work left.
///
/// The virtual clock jumps straight to each next deadline. Returns the number
/// of microtasks run. Stops early if a drain hits the step limit.
pub fn run_until_idle() -> u64 {
    let mut steps = 0;
    loop {
        steps += run_until_stalled();
        if pending_microtasks() > 0 || local::next_deadline().is_none() {
            return steps;
        }
        local::fire_next_timer(u64::MAX);
    }
}

/// Drives the loop until `future` settles and returns its outcome.
///
/// Marks the future as handled. If the loop runs out of work first the
/// result is an error of kind [`ErrorKind::Stalled`].
pub fn block_on<T: Clone + 'static>(future: &Future<T>) -> Result<T> {
    future.mark_handled();
    loop {
        run_until_stalled();
        if let Some(outcome) = future.inspect() {
            return outcome;
        }
        if pending_microtasks() > 0 || !local::fire_next_timer(u64::MAX) {
            break;
        }
    }
    Err(Error::new(ErrorKind::Stalled).with_message(format!(
        "{} still pending after the loop ran out of work",
        future.id()
    )))
}
