//! `some(n)`: `n` of `total` inputs must fulfil.
//!
//! The winners are reported in input order with the losers left out, so a
//! sequence result is shorter than the input. The combinator gives up as soon
//! as more than `total - n` inputs rejected, reporting only the reasons that
//! counted.

use super::{aggregate, observe, slots, Observer};
use crate::future::{Future, Resolution};
use crate::types::Shape;
use std::cell::RefCell;
use std::rc::Rc;

struct Tally<T> {
    wins: Vec<(usize, T)>,
    losses: Vec<(usize, crate::Error)>,
    settled: bool,
}

/// Fulfils once `count` inputs fulfilled, with just those values.
///
/// `count == 0` fulfils immediately with an empty result; a `count` larger
/// than the input rejects immediately.
pub fn some<T, S>(count: usize, input: S) -> Future<Shape<T>>
where
    T: Clone + 'static,
    S: Into<Shape<Resolution<T>>>,
{
    let (layout, slots) = match slots(input.into()) {
        Ok(split) => split,
        Err(reason) => return Future::rejected(reason),
    };
    let total = slots.len();
    if count == 0 {
        return Future::fulfilled(layout.empty());
    }
    if count > total {
        let detail = format!("need {count} fulfilments but only {total} inputs");
        return Future::rejected(aggregate(layout.empty(), detail));
    }

    let tolerated = total - count;
    let (future, resolver) = Future::pending();
    let tally = Rc::new(RefCell::new(Tally {
        wins: Vec::with_capacity(count),
        losses: Vec::new(),
        settled: false,
    }));
    let observer: Observer<T> = Rc::new(move |slot, outcome| {
        let mut tally = tally.borrow_mut();
        if tally.settled {
            return;
        }
        match outcome {
            Ok(value) => {
                tally.wins.push((slot, value));
                if tally.wins.len() == count {
                    tally.settled = true;
                    let wins = std::mem::take(&mut tally.wins);
                    drop(tally);
                    resolver.fulfill(layout.rebuild(wins));
                }
            }
            Err(reason) => {
                tally.losses.push((slot, reason));
                if tally.losses.len() > tolerated {
                    tally.settled = true;
                    let losses = std::mem::take(&mut tally.losses);
                    drop(tally);
                    let detail = format!("{} of {total} inputs rejected", losses.len());
                    resolver.reject(aggregate(layout.rebuild(losses), detail));
                }
            }
        }
    });
    observe(slots, &observer);
    future
}
