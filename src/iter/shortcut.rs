//! Early-terminating searches: `detect`, `some` and `every`.
//!
//! Each runs the predicate through the bounded scheduler and breaks out with
//! the first item whose verdict settles the question. No item after that is
//! started; verdicts still in flight are discarded.

use super::Collection;
use crate::future::{Attempt, Future};
use crate::scheduler::run_bounded;
use crate::types::Concurrency;
use std::ops::ControlFlow;

impl<T: Clone + 'static> Collection<T> {
    /// Fulfils with the first item, in completion order, whose verdict is
    /// `wanted`, or `None` if no verdict is.
    fn find_verdict<P>(&self, concurrency: Concurrency, wanted: bool, mut predicate: P) -> Future<Option<T>>
    where
        P: FnMut(&T) -> Attempt<bool> + 'static,
    {
        let found = self.with_items(move |items| {
            run_bounded(items, concurrency, move |item: T| {
                let verdict = predicate(&item)?;
                Ok(verdict.map(move |passed| {
                    if passed == wanted {
                        ControlFlow::Break(item)
                    } else {
                        ControlFlow::Continue(())
                    }
                }))
            })
        });
        found.map(|flow| {
            Ok(match flow {
                ControlFlow::Break(item) => Some(item),
                ControlFlow::Continue(_) => None,
            })
        })
    }

    /// The first item whose predicate fulfils `true`.
    pub fn detect_with<P>(&self, concurrency: Concurrency, predicate: P) -> Future<Option<T>>
    where
        P: FnMut(&T) -> Attempt<bool> + 'static,
    {
        self.find_verdict(concurrency, true, predicate)
    }

    /// Unbounded [`detect_with`](Self::detect_with).
    pub fn detect<P>(&self, predicate: P) -> Future<Option<T>>
    where
        P: FnMut(&T) -> Attempt<bool> + 'static,
    {
        self.detect_with(Concurrency::Unbounded, predicate)
    }

    /// Sequential [`detect_with`](Self::detect_with); the predicate is not
    /// called again after the first match.
    pub fn detect_series<P>(&self, predicate: P) -> Future<Option<T>>
    where
        P: FnMut(&T) -> Attempt<bool> + 'static,
    {
        self.detect_with(Concurrency::SERIES, predicate)
    }

    /// Bounded [`detect_with`](Self::detect_with).
    pub fn detect_limited<P>(&self, limit: usize, predicate: P) -> Future<Option<T>>
    where
        P: FnMut(&T) -> Attempt<bool> + 'static,
    {
        self.detect_with(Concurrency::limited(limit), predicate)
    }

    /// `true` as soon as one predicate fulfils `true`; `false` for an empty
    /// collection.
    pub fn some_with<P>(&self, concurrency: Concurrency, predicate: P) -> Future<bool>
    where
        P: FnMut(&T) -> Attempt<bool> + 'static,
    {
        self.find_verdict(concurrency, true, predicate)
            .map(|hit| Ok(hit.is_some()))
    }

    /// Unbounded [`some_with`](Self::some_with).
    pub fn some<P>(&self, predicate: P) -> Future<bool>
    where
        P: FnMut(&T) -> Attempt<bool> + 'static,
    {
        self.some_with(Concurrency::Unbounded, predicate)
    }

    /// Sequential [`some_with`](Self::some_with).
    pub fn some_series<P>(&self, predicate: P) -> Future<bool>
    where
        P: FnMut(&T) -> Attempt<bool> + 'static,
    {
        self.some_with(Concurrency::SERIES, predicate)
    }

    /// Bounded [`some_with`](Self::some_with).
    pub fn some_limited<P>(&self, limit: usize, predicate: P) -> Future<bool>
    where
        P: FnMut(&T) -> Attempt<bool> + 'static,
    {
        self.some_with(Concurrency::limited(limit), predicate)
    }

    /// `false` as soon as one predicate fulfils `false`; `true` for an empty
    /// collection.
    pub fn every_with<P>(&self, concurrency: Concurrency, predicate: P) -> Future<bool>
    where
        P: FnMut(&T) -> Attempt<bool> + 'static,
    {
        self.find_verdict(concurrency, false, predicate)
            .map(|miss| Ok(miss.is_none()))
    }

    /// Unbounded [`every_with`](Self::every_with).
    pub fn every<P>(&self, predicate: P) -> Future<bool>
    where
        P: FnMut(&T) -> Attempt<bool> + 'static,
    {
        self.every_with(Concurrency::Unbounded, predicate)
    }

    /// Sequential [`every_with`](Self::every_with).
    pub fn every_series<P>(&self, predicate: P) -> Future<bool>
    where
        P: FnMut(&T) -> Attempt<bool> + 'static,
    {
        self.every_with(Concurrency::SERIES, predicate)
    }

    /// Bounded [`every_with`](Self::every_with).
    pub fn every_limited<P>(&self, limit: usize, predicate: P) -> Future<bool>
    where
        P: FnMut(&T) -> Attempt<bool> + 'static,
    {
        self.every_with(Concurrency::limited(limit), predicate)
    }
}
