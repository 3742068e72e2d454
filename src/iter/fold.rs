//! Sequential folds.

use super::Collection;
use crate::error::catch_panic;
use crate::future::{Attempt, Future, Resolution, Resolver};
use std::cell::RefCell;
use std::rc::Rc;

struct Fold<I, F> {
    items: I,
    step: F,
}

impl<T: Clone + 'static> Collection<T> {
    /// Folds from the first item to the last.
    ///
    /// `memo` may be pending; it settles before the first step runs. Each step
    /// starts only after the previous one's result settled. An empty
    /// collection fulfils with the memo.
    pub fn fold_left<M, F>(&self, memo: Resolution<M>, step: F) -> Future<M>
    where
        M: Clone + 'static,
        F: FnMut(M, T) -> Attempt<M> + 'static,
    {
        self.with_items(move |items| fold(items.into_iter(), memo, step))
    }

    /// Folds from the last item to the first.
    pub fn fold_right<M, F>(&self, memo: Resolution<M>, step: F) -> Future<M>
    where
        M: Clone + 'static,
        F: FnMut(M, T) -> Attempt<M> + 'static,
    {
        self.with_items(move |items| fold(items.into_iter().rev(), memo, step))
    }
}

pub(crate) fn fold<T, M, I, F>(items: I, memo: Resolution<M>, step: F) -> Future<M>
where
    M: Clone + 'static,
    I: Iterator<Item = T> + 'static,
    F: FnMut(M, T) -> Attempt<M> + 'static,
{
    let (future, resolver) = Future::pending();
    let state = Rc::new(RefCell::new(Fold { items, step }));
    continue_with(state, resolver, Ok(memo));
    future
}

/// Applies steps inline while they complete synchronously and parks on the
/// first pending memo.
fn continue_with<T, M, I, F>(state: Rc<RefCell<Fold<I, F>>>, resolver: Resolver<M>, mut attempt: Attempt<M>)
where
    M: Clone + 'static,
    I: Iterator<Item = T> + 'static,
    F: FnMut(M, T) -> Attempt<M> + 'static,
{
    loop {
        if !resolver.is_pending() {
            return;
        }
        let memo = match attempt {
            Err(reason) => return resolver.reject(reason),
            Ok(Resolution::Value(memo)) => memo,
            Ok(pending) => {
                pending.into_future().on_settle(move |outcome| {
                    continue_with(state, resolver, outcome.map(Resolution::Value));
                });
                return;
            }
        };
        let next = state.borrow_mut().items.next();
        let Some(item) = next else {
            return resolver.fulfill(memo);
        };
        attempt = {
            let mut fold = state.borrow_mut();
            catch_panic(|| (fold.step)(memo, item))
        };
    }
}
