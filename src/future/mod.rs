//! The future handle and its resolution engine.
//!
//! A [`Future`] is a cheap, cloneable handle to a settlement record. It is
//! created pending by [`Future::new`] or [`Future::pending`], or already
//! settled by [`Future::fulfilled`] and [`Future::rejected`]. Continuations are
//! registered with [`then`](Future::then) and friends; each returns a new
//! derived future and runs on a later microtask, never synchronously.
//!
//! # Example
//!
//! ```
//! use pledge::{runtime, Error, Future, Resolution};
//!
//! let (source, resolver) = Future::pending();
//! let doubled = source.then(|v: u32| Ok(Resolution::Value(v * 2)));
//!
//! resolver.fulfill(21);
//! assert_eq!(runtime::block_on(&doubled).unwrap(), 42);
//!
//! let recovered = Future::<u32>::rejected(Error::user("nope"))
//!     .otherwise(|_| Ok(Resolution::Value(0)));
//! assert_eq!(runtime::block_on(&recovered).unwrap(), 0);
//! ```

mod node;
mod resolver;
mod thenable;

pub use resolver::Resolver;
pub use thenable::{ready, Attempt, FnThenable, OnFulfilled, OnRejected, Resolution, Thenable};

use crate::cancel::{self, CancelLink, CancelMode};
use crate::error::{catch_panic, Error, Result};
use crate::runtime::local;
use crate::tracing_compat::trace;
use crate::types::{FutureId, Progress, State};
use node::{Node, ProgressFn, Reaction};
use std::fmt;
use std::rc::{Rc, Weak};

/// Progress transformer registered with [`Future::on_progress`].
type ProgressListener = Rc<dyn Fn(Progress) -> Result<Progress>>;

/// Handle to an eventually-settled value.
pub struct Future<T> {
    node: Rc<Node<T>>,
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<T: Clone + 'static> Future<T> {
    fn from_node(node: Rc<Node<T>>) -> Self {
        Self { node }
    }

    fn pending_with(
        mode: CancelMode,
        cancel_parent: Option<Weak<dyn CancelLink>>,
    ) -> (Self, Resolver<T>) {
        let node = Node::pending(mode, cancel_parent);
        (Self::from_node(Rc::clone(&node)), Resolver::new(node))
    }

    /// Runs `producer` synchronously with this future's resolver.
    ///
    /// An `Err` return or a panic rejects the future, unless the producer had
    /// already settled it.
    pub fn new<P>(producer: P) -> Self
    where
        P: FnOnce(Resolver<T>) -> Result<()>,
    {
        let (future, resolver) = Self::pending();
        let handed = resolver.clone();
        if let Err(reason) = catch_panic(move || producer(handed)) {
            resolver.reject(reason);
        }
        future
    }

    /// Creates a pending future together with its resolver.
    #[must_use]
    pub fn pending() -> (Self, Resolver<T>) {
        Self::pending_with(CancelMode::Linked, None)
    }

    /// An already-fulfilled future.
    #[must_use]
    pub fn fulfilled(value: T) -> Self {
        Self::from_node(Node::settled(Ok(value)))
    }

    /// An already-rejected future.
    #[must_use]
    pub fn rejected(reason: Error) -> Self {
        Self::from_node(Node::settled(Err(reason)))
    }

    /// A future for `resolution`: values are fulfilled immediately, futures
    /// and thenables are adopted.
    #[must_use]
    pub fn from_resolution(resolution: Resolution<T>) -> Self {
        match resolution {
            Resolution::Value(value) => Self::fulfilled(value),
            other => {
                let (future, resolver) = Self::pending();
                resolver.resolve(other);
                future
            }
        }
    }

    /// A future for the outcome of a handler or operation.
    #[must_use]
    pub fn from_attempt(attempt: Attempt<T>) -> Self {
        match attempt {
            Ok(resolution) => Self::from_resolution(resolution),
            Err(reason) => Self::rejected(reason),
        }
    }

    /// Identity of the underlying settlement record.
    #[must_use]
    pub fn id(&self) -> FutureId {
        self.node.id()
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> State {
        self.node.state()
    }

    /// Returns true while the future has not settled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.node.is_pending()
    }

    /// Synchronous inspection: `None` while pending, the outcome otherwise.
    ///
    /// Inspecting does not count as handling a rejection.
    #[must_use]
    pub fn inspect(&self) -> Option<Result<T>> {
        self.node.inspect()
    }

    /// Suppresses the unhandled-rejection report for this future.
    pub fn mark_handled(&self) {
        self.node.mark_handled();
    }

    /// Registers `handler` to settle a new derived future once this one
    /// settles. `listener` transforms progress on the way through; without
    /// one, progress passes unchanged.
    fn derive<U, H>(&self, handler: H, listener: Option<ProgressListener>) -> Future<U>
    where
        U: Clone + 'static,
        H: FnOnce(Result<T>, &Resolver<U>) + 'static,
    {
        let parent = Rc::downgrade(&self.node);
        let parent: Weak<dyn CancelLink> = parent;
        let (derived, resolver) = Future::<U>::pending_with(CancelMode::Linked, Some(parent));

        let forward = resolver.clone();
        let progress: ProgressFn = Rc::new(move |progress: &Progress| {
            if !forward.is_pending() {
                return;
            }
            match &listener {
                None => forward.progress(progress.clone()),
                Some(listener) => match catch_panic(|| listener(progress.clone())) {
                    Ok(next) => forward.progress(next),
                    Err(reason) if reason.is_stop_progress() => {
                        trace!(future = %forward.id(), "progress propagation stopped");
                    }
                    Err(reason) => forward.reject(reason),
                },
            }
        });

        self.node.subscribe(Reaction {
            settle: Box::new(move |outcome| {
                // A cancelled derived future skips its handler.
                if resolver.is_pending() {
                    handler(outcome, &resolver);
                }
            }),
            progress: Some(progress),
        });
        derived
    }

    /// Chains a fulfilment handler. Rejections pass through unchanged.
    pub fn then<U, F>(&self, on_fulfilled: F) -> Future<U>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Attempt<U> + 'static,
    {
        self.derive(
            move |outcome, resolver| match outcome {
                Ok(value) => resolver.settle_with(catch_panic(move || on_fulfilled(value))),
                Err(reason) => resolver.reject(reason),
            },
            None,
        )
    }

    /// Chains both a fulfilment and a rejection handler.
    pub fn then_or_else<U, F, R>(&self, on_fulfilled: F, on_rejected: R) -> Future<U>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Attempt<U> + 'static,
        R: FnOnce(Error) -> Attempt<U> + 'static,
    {
        self.derive(
            move |outcome, resolver| {
                let attempt = match outcome {
                    Ok(value) => catch_panic(move || on_fulfilled(value)),
                    Err(reason) => catch_panic(move || on_rejected(reason)),
                };
                resolver.settle_with(attempt);
            },
            None,
        )
    }

    /// Chains fulfilment, rejection and progress handlers.
    ///
    /// The progress handler's `Ok` value is forwarded to the derived future.
    /// Returning [`Error::stop_progress`] stops forwarding silently; any other
    /// error rejects the derived future.
    pub fn then_with_progress<U, F, R, P>(
        &self,
        on_fulfilled: F,
        on_rejected: R,
        on_progress: P,
    ) -> Future<U>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Attempt<U> + 'static,
        R: FnOnce(Error) -> Attempt<U> + 'static,
        P: Fn(Progress) -> Result<Progress> + 'static,
    {
        self.derive(
            move |outcome, resolver| {
                let attempt = match outcome {
                    Ok(value) => catch_panic(move || on_fulfilled(value)),
                    Err(reason) => catch_panic(move || on_rejected(reason)),
                };
                resolver.settle_with(attempt);
            },
            Some(Rc::new(on_progress)),
        )
    }

    /// Transforms the fulfilled value.
    pub fn map<U, F>(&self, f: F) -> Future<U>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Result<U> + 'static,
    {
        self.then(move |value| f(value).map(Resolution::Value))
    }

    /// Chains a rejection handler. Values pass through unchanged.
    pub fn otherwise<R>(&self, on_rejected: R) -> Self
    where
        R: FnOnce(Error) -> Attempt<T> + 'static,
    {
        self.derive(
            move |outcome, resolver| match outcome {
                Ok(value) => resolver.fulfill(value),
                Err(reason) => resolver.settle_with(catch_panic(move || on_rejected(reason))),
            },
            None,
        )
    }

    /// Registers a progress listener; the outcome passes through unchanged.
    pub fn on_progress<P>(&self, listener: P) -> Self
    where
        P: Fn(Progress) -> Result<Progress> + 'static,
    {
        self.derive(
            |outcome, resolver| resolver.settle_with(outcome.map(Resolution::Value)),
            Some(Rc::new(listener)),
        )
    }

    /// Node-style callback: `callback` receives the outcome once.
    ///
    /// A panic inside the callback surfaces as an unhandled rejection.
    pub fn on_settle<C>(&self, callback: C)
    where
        C: FnOnce(Result<T>) + 'static,
    {
        let _settled: Future<()> = self.derive(
            move |outcome, resolver| {
                resolver.settle_with(catch_panic(move || {
                    callback(outcome);
                    Ok(Resolution::Value(()))
                }));
            },
            None,
        );
    }

    /// Replaces the fulfilled value with `value`.
    pub fn yield_value<U: Clone + 'static>(&self, value: U) -> Future<U> {
        self.then(move |_| Ok(Resolution::Value(value)))
    }

    /// Replaces the fulfilled value with a rejection.
    pub fn yield_reason(&self, reason: Error) -> Self {
        self.then(move |_| Err(reason))
    }

    /// Runs `on_settled` on either outcome, then restores that outcome.
    ///
    /// If `on_settled` fails (or its future rejects), the derived future
    /// rejects with that reason instead.
    pub fn ensure<F>(&self, on_settled: F) -> Self
    where
        F: FnOnce() -> Attempt<()> + 'static,
    {
        self.derive(
            move |outcome, resolver| {
                let cleanup = Future::from_attempt(catch_panic(on_settled));
                let restored = cleanup.then(move |()| outcome.map(Resolution::Value));
                resolver.resolve(Resolution::Future(restored));
            },
            None,
        )
    }

    /// Runs a side effect on fulfilment and keeps the original value.
    pub fn tap<F>(&self, side_effect: F) -> Self
    where
        F: FnOnce(T) -> Attempt<()> + 'static,
    {
        self.then(move |value| {
            let kept = value.clone();
            let effect = Future::from_attempt(side_effect(value));
            Ok(Resolution::Future(
                effect.then(move |()| Ok(Resolution::Value(kept))),
            ))
        })
    }

    /// Cancels this future if it is still pending and forwards the request
    /// up the cancellation chain.
    pub fn cancel(&self) {
        let link: Rc<dyn CancelLink> = self.node.clone();
        cancel::propagate(link);
    }

    /// Cancels this future after `ms` of virtual time; returns a handle to it.
    pub fn cancel_after(&self, ms: u64) -> Self {
        let target = self.clone();
        local::set_timer(ms, move || target.cancel());
        self.clone()
    }

    /// A future with the same eventual outcome whose cancellation does not
    /// reach this one.
    #[must_use]
    pub fn fork(&self) -> Self {
        let (forked, resolver) = Self::pending();
        resolver.follow(self, false);
        forked
    }

    /// A future with the same eventual outcome that ignores cancellation.
    #[must_use]
    pub fn uncancellable(&self) -> Self {
        let (shielded, resolver) = Self::pending_with(CancelMode::Uncancellable, None);
        resolver.follow(self, false);
        shielded
    }
}

impl<T> fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future").field("id", &self.node.id()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::future::ready;
    use crate::runtime::{block_on, run_until_stalled, set_unhandled_rejection_hook};
    use std::cell::RefCell;

    #[test]
    fn handlers_never_run_synchronously() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&order);
        let _chained = Future::fulfilled(1).then(move |v: i32| {
            seen.borrow_mut().push("handler");
            ready(v)
        });
        order.borrow_mut().push("after then");
        run_until_stalled();
        assert_eq!(*order.borrow(), vec!["after then", "handler"]);
    }

    #[test]
    fn reactions_run_in_registration_order() {
        let (source, resolver) = Future::pending();
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in 0..4 {
            let order = Rc::clone(&order);
            source.on_settle(move |_: Result<u8>| order.borrow_mut().push(tag));
        }
        resolver.fulfill(1);
        run_until_stalled();
        assert_eq!(*order.borrow(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn first_settlement_wins() {
        let (future, resolver) = Future::pending();
        resolver.fulfill("first");
        resolver.reject(Error::user("second"));
        resolver.fulfill("third");
        assert_eq!(block_on(&future).unwrap(), "first");
    }

    #[test]
    fn producer_error_rejects() {
        let future = Future::<u8>::new(|_| Err(Error::user("sync throw")));
        let err = block_on(&future).unwrap_err();
        assert_eq!(err.payload::<&str>(), Some(&"sync throw"));
    }

    #[test]
    fn producer_panic_rejects_with_panicked() {
        let future = Future::<u8>::new(|_| panic!("producer exploded"));
        let err = block_on(&future).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Panicked);
        assert_eq!(err.message(), Some("producer exploded"));
    }

    #[test]
    fn producer_error_after_resolve_is_ignored() {
        let future = Future::new(|resolver| {
            resolver.fulfill(5);
            Err(Error::user("late"))
        });
        assert_eq!(block_on(&future).unwrap(), 5);
    }

    #[test]
    fn adopting_pending_future_waits_for_it() {
        let (inner, inner_resolver) = Future::pending();
        let outer = Future::from_resolution(Resolution::Future(inner));
        run_until_stalled();
        assert!(outer.is_pending());

        inner_resolver.fulfill(9);
        assert_eq!(block_on(&outer).unwrap(), 9);
    }

    #[test]
    fn adopting_rejection_keeps_reason_identity() {
        let reason = Error::user("inner");
        let (outer, resolver) = Future::<u8>::pending();
        resolver.resolve(Resolution::Future(Future::rejected(reason.clone())));
        let err = block_on(&outer).unwrap_err();
        assert!(err.same_payload(&reason));
    }

    #[test]
    fn self_resolution_is_circular() {
        let (future, resolver) = Future::<u8>::pending();
        resolver.resolve(Resolution::Future(future.clone()));
        let err = block_on(&future).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CircularResolution);
    }

    #[test]
    fn mutual_adoption_is_circular() {
        let (a, resolve_a) = Future::<u8>::pending();
        let (b, resolve_b) = Future::<u8>::pending();
        resolve_a.resolve(Resolution::Future(b.clone()));
        resolve_b.resolve(Resolution::Future(a.clone()));
        let err = block_on(&b).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CircularResolution);
        assert_eq!(block_on(&a).unwrap_err().kind(), ErrorKind::CircularResolution);
    }

    #[test]
    fn progress_flows_until_settlement() {
        let (source, resolver) = Future::<u8>::pending();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let watched = source.on_progress(move |p| {
            sink.borrow_mut().push(*p.downcast_ref::<u32>().unwrap());
            Ok(p)
        });

        resolver.progress(Progress::new(10_u32));
        run_until_stalled();
        resolver.progress(Progress::new(20_u32));
        resolver.fulfill(1);
        resolver.progress(Progress::new(30_u32));
        run_until_stalled();

        assert_eq!(*seen.borrow(), vec![10]);
        assert_eq!(block_on(&watched).unwrap(), 1);
    }

    #[test]
    fn progress_listener_transforms_and_stops() {
        let (source, resolver) = Future::<u8>::pending();
        let downstream = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&downstream);
        let _watched = source
            .on_progress(|p| {
                let n = *p.downcast_ref::<u32>().unwrap();
                if n > 1 {
                    Err(Error::stop_progress())
                } else {
                    Ok(Progress::new(n * 100))
                }
            })
            .on_progress(move |p| {
                sink.borrow_mut().push(*p.downcast_ref::<u32>().unwrap());
                Ok(p)
            });

        resolver.progress(Progress::new(1_u32));
        resolver.progress(Progress::new(2_u32));
        run_until_stalled();
        assert_eq!(*downstream.borrow(), vec![100]);
    }

    #[test]
    fn failing_progress_listener_rejects_derived() {
        let (source, resolver) = Future::<u8>::pending();
        let watched = source.on_progress(|_| Err(Error::user("listener failed")));
        resolver.progress(Progress::empty());
        run_until_stalled();
        let err = block_on(&watched).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::User);
        assert!(source.is_pending());
    }

    #[test]
    fn ensure_restores_outcome() {
        let ran = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&ran);
        let future = Future::fulfilled(4).ensure(move || {
            *flag.borrow_mut() = true;
            ready(())
        });
        assert_eq!(block_on(&future).unwrap(), 4);
        assert!(*ran.borrow());

        let failed = Future::<u8>::rejected(Error::user("kept")).ensure(|| ready(()));
        assert_eq!(block_on(&failed).unwrap_err().payload::<&str>(), Some(&"kept"));
    }

    #[test]
    fn ensure_failure_replaces_outcome() {
        let future = Future::fulfilled(4).ensure(|| Err(Error::user("cleanup failed")));
        let err = block_on(&future).unwrap_err();
        assert_eq!(err.payload::<&str>(), Some(&"cleanup failed"));
    }

    #[test]
    fn tap_keeps_value_and_yield_replaces_it() {
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        let tapped = Future::fulfilled(7).tap(move |v| {
            *sink.borrow_mut() = Some(v);
            ready(())
        });
        assert_eq!(block_on(&tapped).unwrap(), 7);
        assert_eq!(*seen.borrow(), Some(7));

        assert_eq!(block_on(&tapped.yield_value("other")).unwrap(), "other");
        let err = block_on(&tapped.yield_reason(Error::user("no"))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::User);
    }

    #[test]
    fn cancel_after_fires_on_virtual_clock() {
        let (future, _resolver) = Future::<u8>::pending();
        let future = future.cancel_after(50);
        crate::runtime::advance_time(49);
        assert!(future.is_pending());
        crate::runtime::advance_time(1);
        assert_eq!(future.state(), State::Cancelled);
    }

    #[test]
    fn unhandled_rejection_reported_once_per_chain() {
        let _lock = crate::test_utils::hook_lock();
        let reports = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = std::sync::Arc::clone(&reports);
        let _guard = set_unhandled_rejection_hook(move |r| sink.lock().push(r.future));

        let (source_id, derived_id) = {
            let source = Future::<u8>::rejected(Error::user("lost"));
            let derived = source.map(|v| Ok(v + 1));
            run_until_stalled();
            (source.id(), derived.id())
        };
        let handled_id = {
            let handled = Future::<u8>::rejected(Error::user("seen"));
            let _recovered = handled.otherwise(|_| ready(0));
            run_until_stalled();
            handled.id()
        };

        let reports = reports.lock();
        assert_eq!(reports.iter().filter(|id| **id == derived_id).count(), 1);
        assert!(!reports.contains(&source_id));
        assert!(!reports.contains(&handled_id));
    }
}
