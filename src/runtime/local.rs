//! Thread-local event loop.
//!
//! Every thread that touches a [`Future`](crate::Future) owns one loop: a FIFO
//! microtask queue plus a timer heap driven by a virtual millisecond clock.
//! Nothing advances on its own; callers drive the loop with
//! [`run_until_stalled`], [`advance_time`] or [`run_until_idle`](super::run_until_idle).
//!
//! User callbacks never run while the loop is borrowed, and anything that
//! may own a future is dropped after the borrow is released.

use super::config::RuntimeConfig;
use super::timer::{TimerHeap, TimerId};
use crate::tracing_compat::error;
use std::cell::RefCell;
use std::collections::VecDeque;

type Microtask = Box<dyn FnOnce()>;

#[derive(Default)]
struct EventLoop {
    microtasks: VecDeque<Microtask>,
    timers: TimerHeap,
    now: u64,
    draining: bool,
}

thread_local! {
    static EVENT_LOOP: RefCell<EventLoop> = RefCell::new(EventLoop::default());
    static CONFIG: RefCell<RuntimeConfig> = RefCell::new(RuntimeConfig::default());
}

/// Queues `task` to run after the current synchronous work, in FIFO order.
///
/// Tasks deferred while the thread is tearing down are dropped unrun. A task
/// deferred while the loop itself is borrowed is dropped and logged.
pub fn defer(task: impl FnOnce() + 'static) {
    let task: Microtask = Box::new(task);
    let rejected = EVENT_LOOP
        .try_with(|lp| match lp.try_borrow_mut() {
            Ok(mut lp) => {
                lp.microtasks.push_back(task);
                None
            }
            Err(_) => Some(task),
        })
        .ok()
        .flatten();
    if rejected.is_some() {
        error!("event loop busy; deferred task dropped");
    }
    drop(rejected);
}

/// Number of queued microtasks.
#[must_use]
pub fn pending_microtasks() -> usize {
    EVENT_LOOP.with(|lp| lp.borrow().microtasks.len())
}

/// Number of armed timers.
#[must_use]
pub fn pending_timers() -> usize {
    EVENT_LOOP.with(|lp| lp.borrow().timers.len())
}

/// Current virtual time in milliseconds.
#[must_use]
pub fn now() -> u64 {
    EVENT_LOOP.with(|lp| lp.borrow().now)
}

/// Arms a timer that runs `callback` once the clock reaches `now() + delay_ms`.
pub fn set_timer(delay_ms: u64, callback: impl FnOnce() + 'static) -> TimerId {
    EVENT_LOOP.with(|lp| {
        let mut lp = lp.borrow_mut();
        let deadline = lp.now.saturating_add(delay_ms);
        lp.timers.insert(deadline, Box::new(callback))
    })
}

/// Disarms a timer. Returns false if it already fired or was cleared.
pub fn clear_timer(id: TimerId) -> bool {
    let callback = EVENT_LOOP.with(|lp| lp.borrow_mut().timers.remove(id));
    callback.is_some()
}

struct DrainGuard;

impl Drop for DrainGuard {
    fn drop(&mut self) {
        let _ = EVENT_LOOP.try_with(|lp| {
            if let Ok(mut lp) = lp.try_borrow_mut() {
                lp.draining = false;
            }
        });
    }
}

/// Runs queued microtasks until the queue is empty.
///
/// Returns the number of microtasks run. A call made from inside a running
/// microtask returns 0 immediately; the outer drain picks up the work.
/// Draining stops early once [`RuntimeConfig::max_steps`] tasks have run.
pub fn run_until_stalled() -> u64 {
    let entered = EVENT_LOOP.with(|lp| {
        let mut lp = lp.borrow_mut();
        if lp.draining {
            false
        } else {
            lp.draining = true;
            true
        }
    });
    if !entered {
        return 0;
    }
    let _guard = DrainGuard;
    let max_steps = with_config(|c| c.max_steps);

    let mut steps = 0_u64;
    loop {
        if max_steps.is_some_and(|max| steps >= max) {
            error!(
                steps,
                remaining = pending_microtasks(),
                "microtask step limit reached; drain aborted"
            );
            break;
        }
        let task = EVENT_LOOP.with(|lp| lp.borrow_mut().microtasks.pop_front());
        let Some(task) = task else { break };
        task();
        steps += 1;
    }
    steps
}

/// Fires the earliest timer due at or before `limit`, moving the clock to
/// its deadline. Returns false when no timer is due.
pub(crate) fn fire_next_timer(limit: u64) -> bool {
    let due = EVENT_LOOP.with(|lp| {
        let mut lp = lp.borrow_mut();
        let (deadline, callback) = lp.timers.pop_due(limit)?;
        lp.now = lp.now.max(deadline);
        Some(callback)
    });
    match due {
        Some(callback) => {
            callback();
            true
        }
        None => false,
    }
}

/// Deadline of the next armed timer.
pub(crate) fn next_deadline() -> Option<u64> {
    EVENT_LOOP.with(|lp| lp.borrow_mut().timers.peek_deadline())
}

/// Moves the virtual clock forward by `ms`, firing every timer that falls
/// due in deadline order and draining microtasks after each one.
///
/// Returns the number of timers fired.
pub fn advance_time(ms: u64) -> u64 {
    let target = now().saturating_add(ms);
    run_until_stalled();
    let mut fired = 0;
    while fire_next_timer(target) {
        fired += 1;
        run_until_stalled();
    }
    EVENT_LOOP.with(|lp| {
        let mut lp = lp.borrow_mut();
        lp.now = lp.now.max(target);
    });
    fired
}

/// Discards every queued microtask and timer on this thread.
///
/// Returns how many were discarded. The clock is left where it is.
pub fn clear() -> usize {
    let (tasks, timers) = EVENT_LOOP.with(|lp| {
        let mut lp = lp.borrow_mut();
        let tasks: Vec<Microtask> = lp.microtasks.drain(..).collect();
        (tasks, lp.timers.take_all())
    });
    tasks.len() + timers.len()
}

/// Installs the configuration for this thread's loop.
pub fn configure(mut config: RuntimeConfig) {
    config.normalize();
    CONFIG.with(|c| *c.borrow_mut() = config);
}

/// Returns a copy of this thread's configuration.
#[must_use]
pub fn config() -> RuntimeConfig {
    with_config(RuntimeConfig::clone)
}

/// Reads the configuration, falling back to defaults during teardown.
pub(crate) fn with_config<R>(f: impl FnOnce(&RuntimeConfig) -> R) -> R {
    let snapshot = CONFIG
        .try_with(|c| c.try_borrow().ok().map(|c| c.clone()))
        .ok()
        .flatten();
    f(&snapshot.unwrap_or_default())
}
