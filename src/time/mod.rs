//! Time primitives over the runtime's virtual clock.
//!
//! - [`sleep`]: a future that fulfils after a number of milliseconds
//! - [`delay`]: a value, fulfilled late
//! - [`timeout`]: races a future against a timer
//!
//! Cancelling a future on a timer is [`Future::cancel_after`].
//!
//! # Example
//!
//! ```
//! use pledge::{runtime, time, Resolution};
//!
//! let slow = time::delay(50, Resolution::Value("done"));
//! let raced = time::timeout(10, &slow);
//! assert!(runtime::block_on(&raced).unwrap_err().is_timeout());
//! assert_eq!(runtime::block_on(&slow).unwrap(), "done");
//! ```

use crate::error::Error;
use crate::future::{Future, Resolution};
use crate::runtime::{clear_timer, set_timer};
use crate::tracing_compat::debug;

/// Fulfils with `()` after `ms` of virtual time.
///
/// Cancelling the returned future clears its timer.
#[must_use]
pub fn sleep(ms: u64) -> Future<()> {
    let (future, resolver) = Future::pending();
    let wake = resolver.clone();
    let timer = set_timer(ms, move || wake.fulfill(()));
    resolver.on_cancel(move || {
        clear_timer(timer);
    });
    future
}

/// Fulfils with `value` `ms` after it becomes available.
///
/// A pending value is awaited first, then the delay starts. A rejection
/// passes through without waiting.
pub fn delay<T: Clone + 'static>(ms: u64, value: Resolution<T>) -> Future<T> {
    match value {
        Resolution::Value(value) => sleep(ms).yield_value(value),
        pending => pending
            .into_future()
            .then(move |value| Ok(Resolution::Future(sleep(ms).yield_value(value)))),
    }
}

/// Settles like `source`, unless `ms` elapse first; then rejects with
/// [`ErrorKind::Timeout`](crate::ErrorKind::Timeout).
///
/// The source is not cancelled when the timer wins. The timer is cleared
/// once either side wins.
pub fn timeout<T: Clone + 'static>(ms: u64, source: &Future<T>) -> Future<T> {
    if !source.is_pending() {
        return source.fork();
    }
    let (future, resolver) = Future::pending();
    let expire = resolver.clone();
    let timer = set_timer(ms, move || {
        if expire.is_pending() {
            debug!(after_ms = ms, "timed out");
            expire.reject(Error::timeout(ms));
        }
    });
    resolver.on_cancel(move || {
        clear_timer(timer);
    });
    source.on_settle(move |outcome| {
        clear_timer(timer);
        match outcome {
            Ok(value) => resolver.fulfill(value),
            Err(reason) => resolver.reject(reason),
        }
    });
    future
}
