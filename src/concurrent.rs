//! Task lists: run them in series, in parallel, or as a pipeline.
//!
//! A task is any `FnOnce` returning an [`Attempt`]. `sequence` and `parallel`
//! hand every task the same argument; `pipeline` threads each task's result
//! into the next one.

use crate::future::{Attempt, Future, Resolution};
use crate::iter::fold::fold;
use crate::scheduler::map_limited;
use crate::types::Concurrency;

/// Runs `tasks` one after another, each with a clone of `arg`, and fulfils
/// with their results in order.
pub fn sequence<A, T, F>(tasks: Vec<F>, arg: A) -> Future<Vec<T>>
where
    A: Clone + 'static,
    T: Clone + 'static,
    F: FnOnce(A) -> Attempt<T> + 'static,
{
    map_limited(tasks, Concurrency::SERIES, move |task| task(arg.clone()))
}

/// Starts every task at once, each with a clone of `arg`, and fulfils with
/// their results in order.
pub fn parallel<A, T, F>(tasks: Vec<F>, arg: A) -> Future<Vec<T>>
where
    A: Clone + 'static,
    T: Clone + 'static,
    F: FnOnce(A) -> Attempt<T> + 'static,
{
    map_limited(tasks, Concurrency::Unbounded, move |task| task(arg.clone()))
}

/// Feeds `initial` to the first task and each result to the next, fulfilling
/// with the last result. No tasks fulfils with `initial`.
pub fn pipeline<T, F>(initial: Resolution<T>, tasks: Vec<F>) -> Future<T>
where
    T: Clone + 'static,
    F: FnOnce(T) -> Attempt<T> + 'static,
{
    fold(tasks.into_iter(), initial, |value, task| task(value))
}
