//! Cancellation graph.
//!
//! There is no separate store: every settlement record keeps a weak
//! `cancel_parent` edge to the record it derives from or adopts. Cancelling a
//! future settles it with [`ErrorKind::Cancelled`](crate::error::ErrorKind::Cancelled)
//! and then walks those edges upward, one record at a time, until a record is
//! already settled, is uncancellable, or has no parent. Forked futures are
//! created without a parent edge, so the walk stops at them.
//!
//! Cancellation is cooperative. Producer work already in flight keeps running;
//! it only finds its late `resolve`/`reject` ignored and its
//! [`on_cancel`](crate::Resolver::on_cancel) hooks invoked.

use crate::tracing_compat::debug;
use crate::types::FutureId;
use std::collections::HashSet;
use std::rc::Rc;

/// How a record reacts to a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum CancelMode {
    /// Cancels itself and forwards the request to its parent.
    #[default]
    Linked,
    /// Ignores every request.
    Uncancellable,
}

/// Type-erased view of a settlement record used by graph walks.
pub(crate) trait CancelLink {
    /// Identity of the record.
    fn link_id(&self) -> FutureId;

    /// Cancels the record if it is still pending and accepts cancellation.
    ///
    /// Returns the parent the request should continue to.
    fn request_cancel(&self) -> Option<Rc<dyn CancelLink>>;

    /// The record this one is adopting, if any.
    fn following(&self) -> Option<Rc<dyn CancelLink>>;
}

/// Cancels `start` and propagates upward. Returns the number of records
/// the request reached, `start` included.
pub(crate) fn propagate(start: Rc<dyn CancelLink>) -> usize {
    let origin = start.link_id();
    let mut cancelled = 0;
    let mut visited = HashSet::new();
    let mut next = Some(start);
    while let Some(link) = next {
        if !visited.insert(link.link_id()) {
            break;
        }
        let parent = link.request_cancel();
        cancelled += 1;
        if let Some(parent) = &parent {
            debug!(
                origin = %origin,
                from = %link.link_id(),
                to = %parent.link_id(),
                "propagating cancellation"
            );
        }
        next = parent;
    }
    cancelled
}

/// Returns true if following adoption edges from `start` reaches `target`.
pub(crate) fn follows(start: Rc<dyn CancelLink>, target: FutureId) -> bool {
    let mut visited = HashSet::new();
    let mut next = Some(start);
    while let Some(link) = next {
        let id = link.link_id();
        if id == target {
            return true;
        }
        if !visited.insert(id) {
            return false;
        }
        next = link.following();
    }
    false
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::runtime::{block_on, run_until_stalled};
    use crate::types::State;
    use crate::{Future, Resolution};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn cancel_settles_with_cancelled_reason() {
        let (future, _resolver) = Future::<u32>::pending();
        future.cancel();
        assert_eq!(future.state(), State::Cancelled);
        let err = block_on(&future).expect_err("cancelled");
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn cancel_after_settlement_is_noop() {
        let future = Future::fulfilled(3);
        future.cancel();
        assert_eq!(future.state(), State::Fulfilled);
    }

    #[test]
    fn cancelling_derived_cancels_source() {
        let hook_hits = Rc::new(Cell::new(0));
        let hits = Rc::clone(&hook_hits);
        let source = Future::<u32>::new(move |resolver| {
            resolver.on_cancel(move || hits.set(hits.get() + 1));
            Ok(())
        });
        let derived = source.map(|v| Ok(v + 1));
        derived.cancel();

        assert_eq!(source.state(), State::Cancelled);
        assert_eq!(derived.state(), State::Cancelled);
        assert_eq!(hook_hits.get(), 1);
    }

    #[test]
    fn late_resolve_after_cancel_is_ignored() {
        let (future, resolver) = Future::pending();
        future.cancel();
        resolver.fulfill(1);
        run_until_stalled();
        assert!(block_on(&future).unwrap_err().is_cancelled());
    }

    #[test]
    fn fork_does_not_propagate_upward() {
        let (source, resolver) = Future::pending();
        let forked = source.fork();
        forked.cancel();
        assert_eq!(forked.state(), State::Cancelled);
        assert_eq!(source.state(), State::Pending);

        resolver.fulfill("still here");
        assert_eq!(block_on(&source).unwrap(), "still here");
    }

    #[test]
    fn uncancellable_ignores_requests_but_adopts() {
        let (source, resolver) = Future::pending();
        let shielded = source.uncancellable();
        shielded.cancel();
        shielded.map(|v: u8| Ok(v)).cancel();
        assert_eq!(shielded.state(), State::Pending);
        assert_eq!(source.state(), State::Pending);

        resolver.fulfill(8_u8);
        assert_eq!(block_on(&shielded).unwrap(), 8);
    }

    #[test]
    fn adoption_links_cancellation_to_adoptee() {
        let (inner, _inner_resolver) = Future::<u8>::pending();
        let (outer, outer_resolver) = Future::<u8>::pending();
        outer_resolver.resolve(Resolution::Future(inner.clone()));
        outer.cancel();
        assert_eq!(inner.state(), State::Cancelled);
    }
}
