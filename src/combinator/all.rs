//! `all` and `join`.

use super::{observe, slots, Observer};
use crate::future::{Future, Resolution};
use crate::types::Shape;
use std::cell::RefCell;
use std::rc::Rc;

struct Collected<T> {
    values: Vec<Option<T>>,
    remaining: usize,
}

/// Fulfils once every input fulfils, with values in the input's shape.
/// Rejects with the first rejection reason.
pub fn all<T, S>(input: S) -> Future<Shape<T>>
where
    T: Clone + 'static,
    S: Into<Shape<Resolution<T>>>,
{
    let (layout, slots) = match slots(input.into()) {
        Ok(split) => split,
        Err(reason) => return Future::rejected(reason),
    };
    if slots.is_empty() {
        return Future::fulfilled(layout.empty());
    }

    let (future, resolver) = Future::pending();
    let state = Rc::new(RefCell::new(Collected {
        values: vec![None; slots.len()],
        remaining: slots.len(),
    }));
    let observer: Observer<T> = Rc::new(move |slot, outcome| match outcome {
        Ok(value) => {
            let complete = {
                let mut state = state.borrow_mut();
                if state.values[slot].is_some() {
                    return;
                }
                state.values[slot] = Some(value);
                state.remaining -= 1;
                (state.remaining == 0).then(|| std::mem::take(&mut state.values))
            };
            if let Some(values) = complete {
                let entries = values
                    .into_iter()
                    .enumerate()
                    .filter_map(|(slot, v)| v.map(|v| (slot, v)))
                    .collect();
                resolver.fulfill(layout.rebuild(entries));
            }
        }
        Err(reason) => resolver.reject(reason),
    });
    observe(slots, &observer);
    future
}

/// Waits for two futures of different types.
pub fn join<A, B>(a: &Future<A>, b: &Future<B>) -> Future<(A, B)>
where
    A: Clone + 'static,
    B: Clone + 'static,
{
    let (future, resolver) = Future::pending();
    let pair: Rc<RefCell<(Option<A>, Option<B>)>> = Rc::new(RefCell::new((None, None)));

    let complete = {
        let resolver = resolver.clone();
        Rc::new(move |pair: &RefCell<(Option<A>, Option<B>)>| {
            let ready = {
                let mut pair = pair.borrow_mut();
                if pair.0.is_some() && pair.1.is_some() {
                    pair.0.take().zip(pair.1.take())
                } else {
                    None
                }
            };
            if let Some(values) = ready {
                resolver.fulfill(values);
            }
        })
    };

    {
        let pair = Rc::clone(&pair);
        let resolver = resolver.clone();
        let complete = Rc::clone(&complete);
        a.on_settle(move |outcome| match outcome {
            Ok(value) => {
                pair.borrow_mut().0 = Some(value);
                complete(&pair);
            }
            Err(reason) => resolver.reject(reason),
        });
    }
    b.on_settle(move |outcome| match outcome {
        Ok(value) => {
            pair.borrow_mut().1 = Some(value);
            complete(&pair);
        }
        Err(reason) => resolver.reject(reason),
    });
    future
}
