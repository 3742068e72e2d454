//! The producer-facing half of a future.
//!
//! A [`Resolver`] is handed to the producer passed to
//! [`Future::new`](super::Future::new) or returned by
//! [`Future::pending`](super::Future::pending). The first accepted
//! `resolve`/`reject` wins; everything after it is ignored.
//!
//! Resolving with a native future or a [`Thenable`] adopts its outcome. Each
//! adoption step first checks for a cycle: a native chain is walked through
//! its adoption links, and every thenable unwrapped by one resolution is
//! remembered by identity, so a chain that comes back to itself rejects with
//! [`ErrorKind::CircularResolution`](crate::error::ErrorKind::CircularResolution)
//! instead of waiting forever.

use super::node::{Node, Reaction};
use super::thenable::{Attempt, OnFulfilled, OnRejected, Resolution, Thenable};
use super::Future;
use crate::cancel::{self, CancelLink};
use crate::error::{catch_panic, Error};
use crate::runtime::local;
use crate::tracing_compat::debug;
use crate::types::{FutureId, Progress};
use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Settles the future it was created with.
pub struct Resolver<T> {
    node: Rc<Node<T>>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<T: Clone + 'static> Resolver<T> {
    pub(crate) fn new(node: Rc<Node<T>>) -> Self {
        Self { node }
    }

    /// Identity of the future this resolver settles.
    #[must_use]
    pub fn id(&self) -> FutureId {
        self.node.id()
    }

    /// Returns a handle to the future this resolver settles.
    #[must_use]
    pub fn future(&self) -> Future<T> {
        Future::from_node(Rc::clone(&self.node))
    }

    /// Returns true while the future has not settled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.node.is_pending()
    }

    /// Settles with `resolution`, adopting it if it is a future or thenable.
    pub fn resolve(&self, resolution: Resolution<T>) {
        if self.node.lock() {
            self.adopt(resolution);
        }
    }

    /// Fulfils with `value`.
    pub fn fulfill(&self, value: T) {
        self.resolve(Resolution::Value(value));
    }

    /// Rejects with `reason`. Reasons are never unwrapped.
    pub fn reject(&self, reason: Error) {
        if self.node.lock() {
            self.node.settle(Err(reason));
        }
    }

    /// Resolves with `Ok`, rejects with `Err`.
    pub fn settle_with(&self, attempt: Attempt<T>) {
        match attempt {
            Ok(resolution) => self.resolve(resolution),
            Err(reason) => self.reject(reason),
        }
    }

    /// Notifies progress listeners. Ignored once the future has settled.
    pub fn progress(&self, progress: Progress) {
        self.node.notify_progress(&progress);
    }

    /// Registers `hook` to run if the future is cancelled.
    ///
    /// Runs on the next microtask if the future was already cancelled; is
    /// dropped unrun once the future settles any other way.
    pub fn on_cancel(&self, hook: impl FnOnce() + 'static) {
        self.node.add_cancel_hook(Box::new(hook));
    }

    /// Adopts `source` without going through `resolve`'s public guard.
    /// With `link_cancel` off, cancelling this future stops here.
    pub(crate) fn follow(&self, source: &Future<T>, link_cancel: bool) {
        if self.node.lock() {
            self.adopt_future(source, link_cancel);
        }
    }

    fn adopt(&self, resolution: Resolution<T>) {
        match resolution {
            Resolution::Value(value) => {
                self.node.settle(Ok(value));
            }
            Resolution::Future(source) => self.adopt_future(&source, true),
            Resolution::Thenable(thenable) => self.adopt_thenable(thenable),
        }
    }

    fn adopt_future(&self, source: &Future<T>, link_cancel: bool) {
        let target = self.node.id();
        let start: Rc<dyn CancelLink> = source.node.clone();
        if cancel::follows(start, target) {
            let detail = if source.id() == target {
                format!("{target} resolved with itself")
            } else {
                format!("{target} would adopt itself through {}", source.id())
            };
            self.node.settle(Err(Error::circular(detail)));
            return;
        }

        let link = Rc::downgrade(&source.node);
        let link: Weak<dyn CancelLink> = link;
        self.node.set_following(link, link_cancel);
        debug!(adopter = %target, source = %source.id(), "adopting future");

        let settle_target = Rc::clone(&self.node);
        let progress_target = Rc::clone(&self.node);
        source.node.subscribe(Reaction {
            settle: Box::new(move |outcome| {
                settle_target.settle(outcome);
            }),
            progress: Some(Rc::new(move |progress: &Progress| {
                progress_target.notify_progress(progress);
            })),
        });
    }

    fn adopt_thenable(&self, thenable: Rc<dyn Thenable<T>>) {
        if let Some(native) = thenable.native_future() {
            self.adopt_future(&native, false);
            return;
        }
        if !self.node.first_visit(&thenable) {
            self.node.settle(Err(Error::circular(format!(
                "thenable chain adopted by {} resolves to itself",
                self.node.id()
            ))));
            return;
        }
        let resolver = self.clone();
        local::defer(move || resolver.call_thenable(thenable.as_ref()));
    }

    fn call_thenable(&self, thenable: &dyn Thenable<T>) {
        if !self.node.is_pending() {
            return;
        }
        let called = Rc::new(Cell::new(false));

        let on_fulfilled: OnFulfilled<T> = {
            let resolver = self.clone();
            let called = Rc::clone(&called);
            Box::new(move |resolution| {
                if !called.replace(true) {
                    resolver.adopt(resolution);
                }
            })
        };
        let on_rejected: OnRejected = {
            let node = Rc::clone(&self.node);
            let called = Rc::clone(&called);
            Box::new(move |reason| {
                if !called.replace(true) {
                    node.settle(Err(reason));
                }
            })
        };

        if let Err(reason) = catch_panic(|| thenable.then(on_fulfilled, on_rejected)) {
            if !called.replace(true) {
                self.node.settle(Err(reason));
            }
        }
    }
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver").field("id", &self.node.id()).finish()
    }
}
