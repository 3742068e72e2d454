//! Foreign-future interop.
//!
//! Anything that can register a fulfilment callback and a rejection callback
//! implements [`Thenable`]. When a [`Resolver`](crate::Resolver) is handed a
//! thenable it does not treat it as a value: it calls `then` from a microtask
//! and adopts whatever the thenable reports. The callbacks are single-use;
//! only the first call to either of them counts.

use super::Future;
use crate::error::{Error, Result};
use std::fmt;
use std::rc::Rc;

/// Fulfilment callback handed to [`Thenable::then`].
pub type OnFulfilled<T> = Box<dyn FnOnce(Resolution<T>)>;

/// Rejection callback handed to [`Thenable::then`].
pub type OnRejected = Box<dyn FnOnce(Error)>;

/// A foreign asynchronous value exposing two-callback registration.
pub trait Thenable<T> {
    /// Registers the callbacks. An `Err` return (or a panic) rejects the
    /// adopting future unless a callback was already invoked.
    fn then(&self, on_fulfilled: OnFulfilled<T>, on_rejected: OnRejected) -> Result<()>;

    /// Returns the native future behind this thenable, if there is one.
    /// Native futures are adopted directly so cycles through them are seen.
    #[doc(hidden)]
    fn native_future(&self) -> Option<Future<T>> {
        None
    }
}

/// What a producer or handler settles a future with.
pub enum Resolution<T> {
    /// A plain value; the future fulfils with it.
    Value(T),
    /// A native future; its outcome is adopted.
    Future(Future<T>),
    /// A foreign thenable; its outcome is adopted.
    Thenable(Rc<dyn Thenable<T>>),
}

/// The result of a handler or per-item operation. `Err` is a synchronous
/// failure and rejects the derived future.
pub type Attempt<T> = Result<Resolution<T>>;

/// A successful attempt carrying a plain value.
pub fn ready<T>(value: T) -> Attempt<T> {
    Ok(Resolution::Value(value))
}

impl<T> Resolution<T> {
    /// Wraps a foreign thenable.
    pub fn thenable(thenable: impl Thenable<T> + 'static) -> Self {
        Self::Thenable(Rc::new(thenable))
    }

    /// Returns true if adopting this resolution needs no waiting.
    #[must_use]
    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}

impl<T: Clone + 'static> Resolution<T> {
    /// Transforms the eventual value, staying synchronous for plain values.
    pub fn map<U, F>(self, f: F) -> Resolution<U>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> U + 'static,
    {
        match self {
            Self::Value(value) => Resolution::Value(f(value)),
            other => Resolution::Future(other.into_future().map(move |value| Ok(f(value)))),
        }
    }

    /// A future for this resolution.
    #[must_use]
    pub fn into_future(self) -> Future<T> {
        Future::from_resolution(self)
    }
}

impl<T> From<Future<T>> for Resolution<T> {
    fn from(future: Future<T>) -> Self {
        Self::Future(future)
    }
}

impl<T> From<Rc<dyn Thenable<T>>> for Resolution<T> {
    fn from(thenable: Rc<dyn Thenable<T>>) -> Self {
        Self::Thenable(thenable)
    }
}

impl<T: Clone> Clone for Resolution<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Value(v) => Self::Value(v.clone()),
            Self::Future(f) => Self::Future(f.clone()),
            Self::Thenable(t) => Self::Thenable(Rc::clone(t)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Resolution<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Future(fut) => f.debug_tuple("Future").field(&fut.node.id()).finish(),
            Self::Thenable(t) => f
                .debug_tuple("Thenable")
                .field(&Rc::as_ptr(t).cast::<()>())
                .finish(),
        }
    }
}

/// Adapts a closure with the two-callback calling convention.
pub struct FnThenable<F>(F);

impl<F> FnThenable<F> {
    /// Wraps `register`.
    pub fn new(register: F) -> Self {
        Self(register)
    }
}

impl<T, F> Thenable<T> for FnThenable<F>
where
    F: Fn(OnFulfilled<T>, OnRejected) -> Result<()>,
{
    fn then(&self, on_fulfilled: OnFulfilled<T>, on_rejected: OnRejected) -> Result<()> {
        (self.0)(on_fulfilled, on_rejected)
    }
}

impl<F> fmt::Debug for FnThenable<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnThenable(..)")
    }
}

impl<T: Clone + 'static> Thenable<T> for Future<T> {
    fn then(&self, on_fulfilled: OnFulfilled<T>, on_rejected: OnRejected) -> Result<()> {
        self.on_settle(move |outcome| match outcome {
            Ok(value) => on_fulfilled(Resolution::Value(value)),
            Err(reason) => on_rejected(reason),
        });
        Ok(())
    }

    fn native_future(&self) -> Option<Future<T>> {
        Some(self.clone())
    }
}
