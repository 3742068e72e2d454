//! Collection operations over an eventual sequence.
//!
//! A [`Collection`] wraps a `Future<Vec<T>>` and runs per-item operations
//! through the bounded scheduler. Every operation comes in three flavours:
//! unbounded, `_series` (one at a time) and `_limited(n)`, all sharing one
//! `_with(Concurrency, ..)` form. Results always follow input order.
//!
//! ```
//! use pledge::{ready, runtime, Collection};
//!
//! let doubled = Collection::new(vec![1, 2, 3]).map_limited(2, |x| ready(x * 2));
//! assert_eq!(runtime::block_on(&doubled).unwrap(), vec![2, 4, 6]);
//! ```

pub(crate) mod fold;
mod shortcut;
mod sort;

pub use sort::sort_by_shared;

use crate::future::{Attempt, Future, Resolution};
use crate::scheduler::map_limited;
use crate::types::{Concurrency, Shape};
use std::fmt;

/// An eventual sequence with bounded-concurrency operations.
pub struct Collection<T> {
    items: Future<Vec<T>>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
        }
    }
}

impl<T> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection").field("items", &self.items).finish()
    }
}

impl<T: Clone + 'static> From<Future<Vec<T>>> for Collection<T> {
    fn from(items: Future<Vec<T>>) -> Self {
        Self::from_future(items)
    }
}

impl<T: Clone + 'static> Collection<T> {
    /// A collection of already-known items.
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        Self::from_future(Future::fulfilled(items))
    }

    /// A collection of the items `future` fulfils with.
    #[must_use]
    pub fn from_future(items: Future<Vec<T>>) -> Self {
        Self { items }
    }

    /// A collection of a sequence's items. Mappings and scalars are not
    /// sequences and become the empty collection.
    #[must_use]
    pub fn from_shape(shape: Shape<T>) -> Self {
        Self::new(shape.into_sequence().unwrap_or_default())
    }

    /// The underlying future.
    #[must_use]
    pub fn future(&self) -> &Future<Vec<T>> {
        &self.items
    }

    /// Consumes the collection, returning the underlying future.
    #[must_use]
    pub fn into_future(self) -> Future<Vec<T>> {
        self.items
    }

    /// Runs `op` once the items are known.
    fn with_items<U, F>(&self, op: F) -> Future<U>
    where
        U: Clone + 'static,
        F: FnOnce(Vec<T>) -> Future<U> + 'static,
    {
        self.items
            .then(move |items| Ok(Resolution::Future(op(items))))
    }

    /// Maps every item with at most `concurrency` operations outstanding.
    pub fn map_with<O, F>(&self, concurrency: Concurrency, op: F) -> Future<Vec<O>>
    where
        O: Clone + 'static,
        F: FnMut(T) -> Attempt<O> + 'static,
    {
        self.with_items(move |items| map_limited(items, concurrency, op))
    }

    /// [`map_with`](Self::map_with) without a ceiling.
    pub fn map<O, F>(&self, op: F) -> Future<Vec<O>>
    where
        O: Clone + 'static,
        F: FnMut(T) -> Attempt<O> + 'static,
    {
        self.map_with(Concurrency::Unbounded, op)
    }

    /// [`map_with`](Self::map_with) one item at a time.
    pub fn map_series<O, F>(&self, op: F) -> Future<Vec<O>>
    where
        O: Clone + 'static,
        F: FnMut(T) -> Attempt<O> + 'static,
    {
        self.map_with(Concurrency::SERIES, op)
    }

    /// [`map_with`](Self::map_with) with at most `limit` outstanding.
    pub fn map_limited<O, F>(&self, limit: usize, op: F) -> Future<Vec<O>>
    where
        O: Clone + 'static,
        F: FnMut(T) -> Attempt<O> + 'static,
    {
        self.map_with(Concurrency::limited(limit), op)
    }

    /// Runs `op` for its effect on every item.
    pub fn each_with<F>(&self, concurrency: Concurrency, op: F) -> Future<()>
    where
        F: FnMut(T) -> Attempt<()> + 'static,
    {
        self.map_with(concurrency, op).map(|_| Ok(()))
    }

    /// Unbounded [`each_with`](Self::each_with).
    pub fn each<F>(&self, op: F) -> Future<()>
    where
        F: FnMut(T) -> Attempt<()> + 'static,
    {
        self.each_with(Concurrency::Unbounded, op)
    }

    /// Sequential [`each_with`](Self::each_with).
    pub fn each_series<F>(&self, op: F) -> Future<()>
    where
        F: FnMut(T) -> Attempt<()> + 'static,
    {
        self.each_with(Concurrency::SERIES, op)
    }

    /// Bounded [`each_with`](Self::each_with).
    pub fn each_limited<F>(&self, limit: usize, op: F) -> Future<()>
    where
        F: FnMut(T) -> Attempt<()> + 'static,
    {
        self.each_with(Concurrency::limited(limit), op)
    }

    /// Keeps the items whose predicate fulfils with `keep`.
    fn retain_with<P>(&self, concurrency: Concurrency, keep: bool, mut predicate: P) -> Future<Vec<T>>
    where
        P: FnMut(&T) -> Attempt<bool> + 'static,
    {
        let kept = self.map_with(concurrency, move |item: T| {
            let verdict = predicate(&item)?;
            Ok(verdict.map(move |passed| (passed == keep).then_some(item)))
        });
        kept.map(|slots| Ok(slots.into_iter().flatten().collect()))
    }

    /// Keeps the items whose predicate fulfils `true`, in input order.
    pub fn filter_with<P>(&self, concurrency: Concurrency, predicate: P) -> Future<Vec<T>>
    where
        P: FnMut(&T) -> Attempt<bool> + 'static,
    {
        self.retain_with(concurrency, true, predicate)
    }

    /// Unbounded [`filter_with`](Self::filter_with).
    pub fn filter<P>(&self, predicate: P) -> Future<Vec<T>>
    where
        P: FnMut(&T) -> Attempt<bool> + 'static,
    {
        self.filter_with(Concurrency::Unbounded, predicate)
    }

    /// Sequential [`filter_with`](Self::filter_with).
    pub fn filter_series<P>(&self, predicate: P) -> Future<Vec<T>>
    where
        P: FnMut(&T) -> Attempt<bool> + 'static,
    {
        self.filter_with(Concurrency::SERIES, predicate)
    }

    /// Bounded [`filter_with`](Self::filter_with).
    pub fn filter_limited<P>(&self, limit: usize, predicate: P) -> Future<Vec<T>>
    where
        P: FnMut(&T) -> Attempt<bool> + 'static,
    {
        self.filter_with(Concurrency::limited(limit), predicate)
    }

    /// Keeps the items whose predicate fulfils `false`, in input order.
    pub fn filter_out_with<P>(&self, concurrency: Concurrency, predicate: P) -> Future<Vec<T>>
    where
        P: FnMut(&T) -> Attempt<bool> + 'static,
    {
        self.retain_with(concurrency, false, predicate)
    }

    /// Unbounded [`filter_out_with`](Self::filter_out_with).
    pub fn filter_out<P>(&self, predicate: P) -> Future<Vec<T>>
    where
        P: FnMut(&T) -> Attempt<bool> + 'static,
    {
        self.filter_out_with(Concurrency::Unbounded, predicate)
    }

    /// Sequential [`filter_out_with`](Self::filter_out_with).
    pub fn filter_out_series<P>(&self, predicate: P) -> Future<Vec<T>>
    where
        P: FnMut(&T) -> Attempt<bool> + 'static,
    {
        self.filter_out_with(Concurrency::SERIES, predicate)
    }

    /// Bounded [`filter_out_with`](Self::filter_out_with).
    pub fn filter_out_limited<P>(&self, limit: usize, predicate: P) -> Future<Vec<T>>
    where
        P: FnMut(&T) -> Attempt<bool> + 'static,
    {
        self.filter_out_with(Concurrency::limited(limit), predicate)
    }

    /// Maps every item to a sequence and flattens the results in input order.
    pub fn concat_with<O, F>(&self, concurrency: Concurrency, op: F) -> Future<Vec<O>>
    where
        O: Clone + 'static,
        F: FnMut(T) -> Attempt<Vec<O>> + 'static,
    {
        self.map_with(concurrency, op)
            .map(|chunks| Ok(chunks.into_iter().flatten().collect()))
    }

    /// Unbounded [`concat_with`](Self::concat_with).
    pub fn concat<O, F>(&self, op: F) -> Future<Vec<O>>
    where
        O: Clone + 'static,
        F: FnMut(T) -> Attempt<Vec<O>> + 'static,
    {
        self.concat_with(Concurrency::Unbounded, op)
    }

    /// Sequential [`concat_with`](Self::concat_with).
    pub fn concat_series<O, F>(&self, op: F) -> Future<Vec<O>>
    where
        O: Clone + 'static,
        F: FnMut(T) -> Attempt<Vec<O>> + 'static,
    {
        self.concat_with(Concurrency::SERIES, op)
    }

    /// Bounded [`concat_with`](Self::concat_with).
    pub fn concat_limited<O, F>(&self, limit: usize, op: F) -> Future<Vec<O>>
    where
        O: Clone + 'static,
        F: FnMut(T) -> Attempt<Vec<O>> + 'static,
    {
        self.concat_with(Concurrency::limited(limit), op)
    }
}
