//! Bounded-concurrency scheduler.
//!
//! [`run_bounded`] drives an ordered list of inputs through a per-item
//! operation with at most `C` operations outstanding. A cursor walks the
//! inputs; whenever an operation completes its slot is freed and the cursor
//! immediately starts the next item. Results land in a slot array indexed by
//! input position, so completion order never shows in the output.
//!
//! Each operation reports a [`ControlFlow`]:
//!
//! - `Continue(o)` stores `o` in the item's slot.
//! - `Break(s)` is a shortcut: the cursor jumps to the end and the run
//!   settles with `Break(s)` at once.
//! - `Err(e)`, returned synchronously or as a rejected future, also jumps the
//!   cursor to the end and rejects the run with `e`.
//!
//! Operations already in flight when the run stops are not cancelled; their
//! results are discarded.

use crate::error::{catch_panic, Error};
use crate::future::{Attempt, Future, Resolution, Resolver};
use crate::tracing_compat::{debug, debug_span};
use crate::types::Concurrency;
use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::ops::ControlFlow;
use std::rc::Rc;

/// Counters for one scheduler run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Operations started.
    pub started: usize,
    /// Operations whose outcome was recorded.
    pub completed: usize,
    /// Highest number of operations outstanding at once.
    pub peak_in_flight: usize,
}

/// Live view of a run's [`SchedulerStats`].
#[derive(Debug, Clone, Default)]
pub struct StatsHandle(Rc<Cell<SchedulerStats>>);

impl StatsHandle {
    /// Current counters.
    #[must_use]
    pub fn get(&self) -> SchedulerStats {
        self.0.get()
    }

    fn update(&self, f: impl FnOnce(&mut SchedulerStats)) {
        let mut stats = self.0.get();
        f(&mut stats);
        self.0.set(stats);
    }
}

struct Run<I, O, S, F> {
    inputs: std::vec::IntoIter<I>,
    next_index: usize,
    slots: Vec<Option<O>>,
    in_flight: usize,
    limit: Concurrency,
    op: Option<F>,
    resolver: Resolver<ControlFlow<S, Vec<O>>>,
    stats: StatsHandle,
    done: bool,
}

type Shared<I, O, S, F> = Rc<RefCell<Run<I, O, S, F>>>;

/// What the pump should do next.
enum Step<I, F> {
    Start(usize, I, F),
    Wait,
}

/// Runs `op` over `inputs` with at most `concurrency` operations outstanding.
///
/// Fulfils with `Continue(outputs)` in input order, or `Break(s)` for the
/// first shortcut taken. Empty input fulfils immediately without calling `op`.
pub fn run_bounded<I, O, S, F>(
    inputs: Vec<I>,
    concurrency: Concurrency,
    op: F,
) -> Future<ControlFlow<S, Vec<O>>>
where
    I: 'static,
    O: Clone + 'static,
    S: Clone + 'static,
    F: FnMut(I) -> Attempt<ControlFlow<S, O>> + 'static,
{
    run_bounded_with_stats(inputs, concurrency, op).0
}

/// [`run_bounded`], also returning a live view of the run's counters.
pub fn run_bounded_with_stats<I, O, S, F>(
    inputs: Vec<I>,
    concurrency: Concurrency,
    op: F,
) -> (Future<ControlFlow<S, Vec<O>>>, StatsHandle)
where
    I: 'static,
    O: Clone + 'static,
    S: Clone + 'static,
    F: FnMut(I) -> Attempt<ControlFlow<S, O>> + 'static,
{
    let (future, resolver) = Future::pending();
    let stats = StatsHandle::default();
    let total = inputs.len();

    let span = debug_span!("run_bounded", total, limit = %concurrency);
    let _guard = span.enter();
    debug!(run = %future.id(), total, limit = %concurrency, "bounded run started");

    let mut slots = Vec::with_capacity(total);
    slots.resize_with(total, || None);
    let run = Rc::new(RefCell::new(Run {
        inputs: inputs.into_iter(),
        next_index: 0,
        slots,
        in_flight: 0,
        limit: concurrency,
        op: Some(op),
        resolver,
        stats: stats.clone(),
        done: false,
    }));
    pump(&run);
    (future, stats)
}

/// Starts as many operations as the ceiling allows, completing synchronous
/// ones inline.
fn pump<I, O, S, F>(run: &Shared<I, O, S, F>)
where
    I: 'static,
    O: Clone + 'static,
    S: Clone + 'static,
    F: FnMut(I) -> Attempt<ControlFlow<S, O>> + 'static,
{
    loop {
        let (index, item, mut op) = match next_step(run) {
            Step::Start(index, item, op) => (index, item, op),
            Step::Wait => return,
        };
        let attempt = catch_panic(|| op(item));
        let finished_op = {
            let mut state = run.borrow_mut();
            if state.done {
                Some(op)
            } else {
                state.op = Some(op);
                None
            }
        };
        drop(finished_op);

        match attempt {
            Err(reason) => return fail(run, reason),
            Ok(Resolution::Value(flow)) => {
                if !record(run, index, flow) {
                    return;
                }
            }
            Ok(pending) => {
                let run = Rc::clone(run);
                pending.into_future().on_settle(move |outcome| match outcome {
                    Ok(flow) => {
                        if record(&run, index, flow) {
                            pump(&run);
                        }
                    }
                    Err(reason) => fail(&run, reason),
                });
            }
        }
    }
}

fn next_step<I, O, S, F>(run: &Shared<I, O, S, F>) -> Step<I, F>
where
    O: Clone + 'static,
    S: Clone + 'static,
{
    let finished = {
        let mut state = run.borrow_mut();
        if state.done || !state.limit.admits(state.in_flight) {
            return Step::Wait;
        }
        // The op is out while it runs; the pump that holds it continues.
        if state.op.is_none() {
            return Step::Wait;
        }
        if let Some(item) = state.inputs.next() {
            let Some(op) = state.op.take() else {
                return Step::Wait;
            };
            let index = state.next_index;
            state.next_index += 1;
            state.in_flight += 1;
            let in_flight = state.in_flight;
            state.stats.update(|s| {
                s.started += 1;
                s.peak_in_flight = s.peak_in_flight.max(in_flight);
            });
            return Step::Start(index, item, op);
        }
        if state.in_flight > 0 {
            return Step::Wait;
        }
        state.done = true;
        let outputs: Vec<O> = state.slots.drain(..).flatten().collect();
        (state.resolver.clone(), outputs, state.op.take())
    };
    let (resolver, outputs, op) = finished;
    drop(op);
    debug!(run = %resolver.id(), outputs = outputs.len(), "bounded run completed");
    resolver.fulfill(ControlFlow::Continue(outputs));
    Step::Wait
}

/// Records one completed operation. Returns true if the run continues.
fn record<I, O, S, F>(run: &Shared<I, O, S, F>, index: usize, flow: ControlFlow<S, O>) -> bool
where
    O: Clone + 'static,
    S: Clone + 'static,
{
    let mut state = run.borrow_mut();
    if state.done {
        return false;
    }
    state.in_flight -= 1;
    state.stats.update(|s| s.completed += 1);
    match flow {
        ControlFlow::Continue(output) => {
            state.slots[index] = Some(output);
            true
        }
        ControlFlow::Break(shortcut) => {
            debug!(run = %state.resolver.id(), index, "bounded run shortcut");
            let stopped = stop(&mut state);
            let resolver = state.resolver.clone();
            drop(state);
            drop(stopped);
            resolver.fulfill(ControlFlow::Break(shortcut));
            false
        }
    }
}

/// Stops the run with a rejection.
fn fail<I, O, S, F>(run: &Shared<I, O, S, F>, reason: Error)
where
    O: Clone + 'static,
    S: Clone + 'static,
{
    let mut state = run.borrow_mut();
    if state.done {
        return;
    }
    debug!(run = %state.resolver.id(), reason = %reason, "bounded run failed");
    let stopped = stop(&mut state);
    let resolver = state.resolver.clone();
    drop(state);
    drop(stopped);
    resolver.reject(reason);
}

/// Forces the cursor to the end and hands back what the run still owned so
/// it is dropped after the borrow ends.
fn stop<I, O, S, F>(state: &mut Run<I, O, S, F>) -> (Vec<I>, Option<F>, Vec<Option<O>>) {
    state.done = true;
    let rest = state.inputs.by_ref().collect();
    (rest, state.op.take(), std::mem::take(&mut state.slots))
}

/// Runs `op` over `inputs` with at most `concurrency` outstanding and
/// fulfils with the outputs in input order.
pub fn map_limited<I, O, F>(inputs: Vec<I>, concurrency: Concurrency, mut op: F) -> Future<Vec<O>>
where
    I: 'static,
    O: Clone + 'static,
    F: FnMut(I) -> Attempt<O> + 'static,
{
    if inputs.is_empty() {
        return Future::fulfilled(Vec::new());
    }
    let run = run_bounded(inputs, concurrency, move |item| {
        op(item).map(|resolution| resolution.map(ControlFlow::<Infallible, O>::Continue))
    });
    run.map(|flow| match flow {
        ControlFlow::Continue(outputs) => Ok(outputs),
        ControlFlow::Break(never) => match never {},
    })
}
