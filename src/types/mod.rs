//! Core types shared by the engine, the scheduler and the combinators.
//!
//! - [`id`]: Future identity (`FutureId`)
//! - [`state`]: Settlement state snapshot
//! - [`progress`]: Type-erased progress payloads
//! - [`shape`]: Sequence/mapping containers for combinators
//! - [`concurrency`]: Concurrency ceilings

pub mod concurrency;
pub mod id;
pub mod progress;
pub mod shape;
pub mod state;

pub use concurrency::Concurrency;
pub use id::FutureId;
pub use progress::Progress;
pub use shape::Shape;
pub(crate) use shape::Layout;
pub use state::State;
