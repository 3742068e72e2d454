//! Sorting by eventual keys.
//!
//! Keys are computed through the bounded scheduler, paired with their source
//! index and ordered by `(key, index)`, so equal keys keep input order. The
//! permutation is applied to the caller's vector in place.

use super::Collection;
use crate::error::Error;
use crate::future::{Attempt, Future};
use crate::scheduler::map_limited;
use crate::tracing_compat::debug;
use crate::types::Concurrency;
use std::cell::RefCell;
use std::rc::Rc;

/// Sorts `shared` in place by the keys `key` fulfils with, stable on ties.
///
/// Fulfils with the same `Rc` once the vector is reordered. The vector is
/// snapshotted when the run starts; if its length changed by the time the
/// keys are known, the sort rejects and leaves it untouched.
pub fn sort_by_shared<T, K, F>(
    shared: &Rc<RefCell<Vec<T>>>,
    concurrency: Concurrency,
    mut key: F,
) -> Future<Rc<RefCell<Vec<T>>>>
where
    T: Clone + 'static,
    K: Ord + Clone + 'static,
    F: FnMut(&T) -> Attempt<K> + 'static,
{
    let snapshot = shared.borrow().clone();
    let expected = snapshot.len();
    let target = Rc::clone(shared);
    let keys = map_limited(snapshot, concurrency, move |item: T| key(&item));
    keys.map(move |keys| {
        let mut order: Vec<(K, usize)> = keys.into_iter().zip(0..).collect();
        order.sort();
        {
            let mut items = target.borrow_mut();
            if items.len() != expected {
                return Err(Error::internal(format!(
                    "vector changed length during sort: {expected} -> {}",
                    items.len()
                )));
            }
            let mut taken: Vec<Option<T>> = items.drain(..).map(Some).collect();
            items.extend(order.into_iter().filter_map(|(_, index)| taken[index].take()));
        }
        debug!(len = expected, "sorted shared vector");
        Ok(target)
    })
}

impl<T: Clone + 'static> Collection<T> {
    /// Sorts the items by the keys `key` fulfils with; ties keep input order.
    pub fn sort_by_with<K, F>(&self, concurrency: Concurrency, key: F) -> Future<Vec<T>>
    where
        K: Ord + Clone + 'static,
        F: FnMut(&T) -> Attempt<K> + 'static,
    {
        self.with_items(move |items| {
            let shared = Rc::new(RefCell::new(items));
            sort_by_shared(&shared, concurrency, key).map(|sorted| Ok(sorted.take()))
        })
    }

    /// Unbounded [`sort_by_with`](Self::sort_by_with).
    pub fn sort_by<K, F>(&self, key: F) -> Future<Vec<T>>
    where
        K: Ord + Clone + 'static,
        F: FnMut(&T) -> Attempt<K> + 'static,
    {
        self.sort_by_with(Concurrency::Unbounded, key)
    }

    /// Sequential [`sort_by_with`](Self::sort_by_with).
    pub fn sort_by_series<K, F>(&self, key: F) -> Future<Vec<T>>
    where
        K: Ord + Clone + 'static,
        F: FnMut(&T) -> Attempt<K> + 'static,
    {
        self.sort_by_with(Concurrency::SERIES, key)
    }

    /// Bounded [`sort_by_with`](Self::sort_by_with).
    pub fn sort_by_limited<K, F>(&self, limit: usize, key: F) -> Future<Vec<T>>
    where
        K: Ord + Clone + 'static,
        F: FnMut(&T) -> Attempt<K> + 'static,
    {
        self.sort_by_with(Concurrency::limited(limit), key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::future::{ready, Resolution};
    use crate::runtime::block_on;
    use crate::test_utils::{fulfill_after, init_test};

    #[test]
    fn sorts_in_place_and_keeps_identity() {
        init_test("sorts_in_place_and_keeps_identity");
        let shared = Rc::new(RefCell::new(vec![3_u64, 2, 4, 1]));
        let out = sort_by_shared(&shared, Concurrency::Unbounded, |x| {
            Ok(Resolution::Future(fulfill_after(*x * 5, *x)))
        });
        let sorted = block_on(&out).unwrap();
        assert!(Rc::ptr_eq(&sorted, &shared));
        assert_eq!(*shared.borrow(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn ties_keep_input_order() {
        init_test("ties_keep_input_order");
        let words = vec!["bb", "a", "cc", "d", "ee"];
        let out = Collection::new(words).sort_by_limited(2, |w| ready(w.len()));
        assert_eq!(block_on(&out).unwrap(), vec!["a", "d", "bb", "cc", "ee"]);
    }

    #[test]
    fn length_change_rejects() {
        init_test("length_change_rejects");
        let shared = Rc::new(RefCell::new(vec![2, 1]));
        let out = sort_by_shared(&shared, Concurrency::SERIES, |x| {
            Ok(Resolution::Future(fulfill_after(5, *x)))
        });
        shared.borrow_mut().push(0);
        assert_eq!(block_on(&out).unwrap_err().kind(), ErrorKind::Internal);
        assert_eq!(*shared.borrow(), vec![2, 1, 0]);
    }
}
