//! Pledge: cancellable, progress-aware futures with bounded-concurrency
//! collection combinators.
//!
//! # Overview
//!
//! A [`Future`] is a handle to a value that settles once: fulfilled,
//! rejected, or cancelled. Continuations never run synchronously. They are
//! queued on a single-threaded event loop and run when the owning thread
//! drives it, so ordering is deterministic and virtual time makes timers
//! testable.
//!
//! # Core Guarantees
//!
//! - **Settle once**: later `resolve`/`reject` calls on a settled future are ignored
//! - **Ordered reactions**: reactions run after the current code, in registration order
//! - **No self-resolution hangs**: cycles through futures or foreign thenables reject
//!   with [`ErrorKind::CircularResolution`]
//! - **Cooperative cancellation**: cancelling walks up the chain of derived futures
//!   and notifies producers; it never halts work already running
//! - **Bounded concurrency**: collection operations never exceed their ceiling, and
//!   results keep input order regardless of completion order
//! - **No silent losses**: a rejection nobody handled is reported through a
//!   process-wide hook
//!
//! # Module Structure
//!
//! - [`error`]: Error kinds and the rejection reason type
//! - [`types`]: Identifiers, progress payloads, shapes and concurrency ceilings
//! - [`future`]: The future handle, its resolver and thenable interop
//! - [`runtime`]: Event loop, virtual clock, configuration and unhandled-rejection hook
//! - [`combinator`]: `all`, `any`, `some` and `join`
//! - [`scheduler`]: The bounded-concurrency map underneath collections
//! - [`iter`]: Collection operations with series and limited variants
//! - [`time`]: Sleep, delay and timeout
//! - [`concurrent`]: Task lists in sequence, in parallel, or as a pipeline
//!
//! # Example
//!
//! ```
//! use pledge::{ready, runtime, Collection, Future, Resolution};
//!
//! let (source, resolver) = Future::<Vec<&str>>::pending();
//! let lengths = Collection::from_future(source).map_series(|word| ready(word.len()));
//! resolver.fulfill(vec!["one", "three"]);
//! assert_eq!(runtime::block_on(&lengths).unwrap(), vec![3, 5]);
//!
//! let failed = Future::<u8>::rejected(pledge::Error::user("boom"))
//!     .otherwise(|_| Ok(Resolution::Value(0)));
//! assert_eq!(runtime::block_on(&failed).unwrap(), 0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_inception)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::needless_pass_by_value)]

mod cancel;
pub mod combinator;
pub mod concurrent;
pub mod error;
pub mod future;
pub mod iter;
pub mod runtime;
pub mod scheduler;
pub mod time;
pub mod tracing_compat;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-exports for convenient access to core types
pub use combinator::{all, any, join, some};
pub use error::{Error, ErrorKind, Result};
pub use future::{ready, Attempt, FnThenable, Future, Resolution, Resolver, Thenable};
pub use iter::{sort_by_shared, Collection};
pub use runtime::{block_on, RuntimeConfig, UnhandledRejection};
pub use scheduler::{map_limited, run_bounded, SchedulerStats};
pub use types::{Concurrency, FutureId, Progress, Shape, State};
