//! Settlement records.
//!
//! A [`Node`] is the shared state behind every handle to one future. It is
//! the only place state transitions happen: `settle` moves a pending record
//! to fulfilled or rejected exactly once and hands every queued reaction to
//! the microtask queue in registration order.

use super::thenable::Thenable;
use crate::cancel::{CancelLink, CancelMode};
use crate::error::{panic_message, Error, Result};
use crate::runtime::local;
use crate::runtime::unhandled::{self, UnhandledRejection};
use crate::tracing_compat::{error, trace};
use crate::types::{FutureId, Progress, State};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::mem;
use std::rc::{Rc, Weak};

pub(crate) type SettleFn<T> = Box<dyn FnOnce(Result<T>)>;
pub(crate) type ProgressFn = Rc<dyn Fn(&Progress)>;

/// A registered continuation. `settle` runs once; `progress` may run any
/// number of times while the record is pending.
pub(crate) struct Reaction<T> {
    pub(crate) settle: SettleFn<T>,
    pub(crate) progress: Option<ProgressFn>,
}

enum Outcome<T> {
    Pending,
    Fulfilled(T),
    Rejected(Error),
}

impl<T: Clone> Outcome<T> {
    fn snapshot(&self) -> Option<Result<T>> {
        match self {
            Self::Pending => None,
            Self::Fulfilled(value) => Some(Ok(value.clone())),
            Self::Rejected(reason) => Some(Err(reason.clone())),
        }
    }
}

struct Record<T> {
    outcome: Outcome<T>,
    cancelled: bool,
    /// Set once `resolve`/`reject` has been accepted; later calls are ignored.
    locked: bool,
    /// Set once any reaction was registered.
    handled: bool,
    reactions: SmallVec<[Reaction<T>; 1]>,
    cancel_parent: Option<Weak<dyn CancelLink>>,
    following: Option<Weak<dyn CancelLink>>,
    cancel_hooks: Vec<Box<dyn FnOnce()>>,
    /// Thenables unwrapped so far by this record's resolution; kept alive so
    /// their addresses stay unique.
    thenables: SmallVec<[Rc<dyn Thenable<T>>; 1]>,
}

pub(crate) struct Node<T> {
    id: FutureId,
    mode: CancelMode,
    record: RefCell<Record<T>>,
}

impl<T> Node<T> {
    pub(crate) fn id(&self) -> FutureId {
        self.id
    }
}

impl<T: Clone + 'static> Node<T> {
    fn with_outcome(outcome: Outcome<T>, mode: CancelMode) -> Rc<Self> {
        let locked = !matches!(outcome, Outcome::Pending);
        Rc::new(Self {
            id: FutureId::next(),
            mode,
            record: RefCell::new(Record {
                outcome,
                cancelled: false,
                locked,
                handled: false,
                reactions: SmallVec::new(),
                cancel_parent: None,
                following: None,
                cancel_hooks: Vec::new(),
                thenables: SmallVec::new(),
            }),
        })
    }

    pub(crate) fn pending(mode: CancelMode, cancel_parent: Option<Weak<dyn CancelLink>>) -> Rc<Self> {
        let node = Self::with_outcome(Outcome::Pending, mode);
        node.record.borrow_mut().cancel_parent = cancel_parent;
        node
    }

    pub(crate) fn settled(outcome: Result<T>) -> Rc<Self> {
        let outcome = match outcome {
            Ok(value) => Outcome::Fulfilled(value),
            Err(reason) => Outcome::Rejected(reason),
        };
        Self::with_outcome(outcome, CancelMode::Linked)
    }

    pub(crate) fn state(&self) -> State {
        let record = self.record.borrow();
        match record.outcome {
            Outcome::Pending => State::Pending,
            Outcome::Fulfilled(_) => State::Fulfilled,
            Outcome::Rejected(_) if record.cancelled => State::Cancelled,
            Outcome::Rejected(_) => State::Rejected,
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        matches!(self.record.borrow().outcome, Outcome::Pending)
    }

    pub(crate) fn inspect(&self) -> Option<Result<T>> {
        self.record.borrow().outcome.snapshot()
    }

    pub(crate) fn mark_handled(&self) {
        self.record.borrow_mut().handled = true;
    }

    /// Claims the right to resolve. Returns false if the record already
    /// settled or a resolution is in progress.
    pub(crate) fn lock(&self) -> bool {
        let mut record = self.record.borrow_mut();
        if record.locked || !matches!(record.outcome, Outcome::Pending) {
            return false;
        }
        record.locked = true;
        true
    }

    /// Points the record at the future it now adopts.
    pub(crate) fn set_following(&self, source: Weak<dyn CancelLink>, link_cancel: bool) {
        let mut record = self.record.borrow_mut();
        if link_cancel {
            record.cancel_parent = Some(source.clone());
        }
        record.following = Some(source);
    }

    /// Records `thenable` as part of this resolution. Returns false if it was
    /// already unwrapped once, which means the chain loops.
    pub(crate) fn first_visit(&self, thenable: &Rc<dyn Thenable<T>>) -> bool {
        let mut record = self.record.borrow_mut();
        let address = Rc::as_ptr(thenable).cast::<()>();
        if record
            .thenables
            .iter()
            .any(|seen| Rc::as_ptr(seen).cast::<()>() == address)
        {
            return false;
        }
        record.thenables.push(Rc::clone(thenable));
        true
    }

    pub(crate) fn add_cancel_hook(&self, hook: Box<dyn FnOnce()>) {
        let run_now = {
            let mut record = self.record.borrow_mut();
            if matches!(record.outcome, Outcome::Pending) {
                record.cancel_hooks.push(hook);
                None
            } else if record.cancelled {
                Some(hook)
            } else {
                None
            }
        };
        if let Some(hook) = run_now {
            local::defer(hook);
        }
    }

    pub(crate) fn subscribe(&self, reaction: Reaction<T>) {
        let ready = {
            let mut record = self.record.borrow_mut();
            record.handled = true;
            match record.outcome.snapshot() {
                Some(outcome) => Some((reaction, outcome)),
                None => {
                    record.reactions.push(reaction);
                    None
                }
            }
        };
        if let Some((Reaction { settle, progress }, outcome)) = ready {
            drop(progress);
            local::defer(move || settle(outcome));
        }
    }

    /// Moves a pending record to its terminal state. Returns false if it had
    /// already settled.
    pub(crate) fn settle(&self, outcome: Result<T>) -> bool {
        let (reactions, stale) = {
            let mut record = self.record.borrow_mut();
            if !matches!(record.outcome, Outcome::Pending) {
                return false;
            }
            record.outcome = match &outcome {
                Ok(value) => Outcome::Fulfilled(value.clone()),
                Err(reason) => Outcome::Rejected(reason.clone()),
            };
            record.locked = true;
            record.cancel_parent = None;
            record.following = None;
            let stale = (
                mem::take(&mut record.cancel_hooks),
                mem::take(&mut record.thenables),
            );
            (mem::take(&mut record.reactions), stale)
        };
        drop(stale);

        if local::with_config(|c| c.trace_settlements) {
            trace!(
                future = %self.id,
                state = %self.state(),
                reactions = reactions.len(),
                "future settled"
            );
        }

        for Reaction { settle, progress } in reactions {
            drop(progress);
            let outcome = outcome.clone();
            local::defer(move || settle(outcome));
        }
        true
    }

    /// Queues `progress` for every listener registered so far. Delivery is
    /// skipped if the record settles before the microtask runs.
    pub(crate) fn notify_progress(self: &Rc<Self>, progress: &Progress) {
        let listeners: SmallVec<[ProgressFn; 2]> = {
            let record = self.record.borrow();
            if !matches!(record.outcome, Outcome::Pending) {
                return;
            }
            record
                .reactions
                .iter()
                .filter_map(|r| r.progress.clone())
                .collect()
        };
        for listener in listeners {
            let node = Rc::downgrade(self);
            let progress = progress.clone();
            local::defer(move || {
                if node.upgrade().is_some_and(|node| node.is_pending()) {
                    listener(&progress);
                }
            });
        }
    }
}

impl<T: Clone + 'static> CancelLink for Node<T> {
    fn link_id(&self) -> FutureId {
        self.id
    }

    fn request_cancel(&self) -> Option<Rc<dyn CancelLink>> {
        if self.mode == CancelMode::Uncancellable {
            return None;
        }
        let (parent, hooks) = {
            let mut record = self.record.borrow_mut();
            if !matches!(record.outcome, Outcome::Pending) {
                return None;
            }
            record.cancelled = true;
            (
                record.cancel_parent.take(),
                mem::take(&mut record.cancel_hooks),
            )
        };
        self.settle(Err(Error::cancelled()));

        for hook in hooks {
            if let Err(payload) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(hook)) {
                error!(
                    future = %self.id,
                    panic = %panic_message(payload.as_ref()),
                    "cancellation hook panicked"
                );
            }
        }
        parent.and_then(|parent| parent.upgrade())
    }

    fn following(&self) -> Option<Rc<dyn CancelLink>> {
        self.record
            .borrow()
            .following
            .as_ref()
            .and_then(Weak::upgrade)
    }
}

impl<T> Drop for Node<T> {
    fn drop(&mut self) {
        let record = self.record.get_mut();
        if record.handled {
            return;
        }
        let Outcome::Rejected(reason) = &record.outcome else {
            return;
        };
        if reason.is_cancelled() && !local::with_config(|c| c.report_cancellations) {
            return;
        }
        unhandled::report(&UnhandledRejection {
            future: self.id,
            reason: reason.clone(),
        });
    }
}
