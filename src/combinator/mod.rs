//! Shape-preserving aggregation of sibling futures.
//!
//! - [`all`]: every input must fulfil; first rejection wins
//! - [`any`]: first fulfilment wins; rejects only when every input rejected
//! - [`some`]: `n` of `total` must fulfil
//! - [`join`]: two futures of different types
//!
//! Inputs are a [`Shape`] of [`Resolution`]s: a sequence or a string-keyed
//! mapping whose elements are plain values, futures or thenables. Results keep
//! the input's shape and each element's position or key. A
//! [`Shape::Scalar`] input rejects with [`ErrorKind::TypeMismatch`]; an empty
//! input settles immediately.
//!
//! No combinator cancels the inputs it stops caring about.

pub mod all;
pub mod any;
pub mod some;

pub use all::{all, join};
pub use any::any;
pub use some::some;

use crate::error::{Error, ErrorKind};
use crate::future::{Future, Resolution};
use crate::types::Layout;
use crate::types::Shape;
use std::collections::BTreeMap;
use std::rc::Rc;

type Observer<T> = Rc<dyn Fn(usize, crate::Result<T>)>;

/// Splits `input` into its layout and slots, or builds the rejection for a
/// scalar input.
pub(crate) fn slots<T>(input: Shape<Resolution<T>>) -> Result<(Layout, Vec<Resolution<T>>), Error> {
    input
        .into_slots()
        .map_err(|scalar| Error::type_mismatch(scalar.kind_name()))
}

/// Reports each slot's outcome to `observer`. Plain values are reported
/// synchronously, in slot order; the rest as they settle.
pub(crate) fn observe<T: Clone + 'static>(slots: Vec<Resolution<T>>, observer: &Observer<T>) {
    for (slot, resolution) in slots.into_iter().enumerate() {
        match resolution {
            Resolution::Value(value) => observer(slot, Ok(value)),
            pending => {
                let observer = Rc::clone(observer);
                pending
                    .into_future()
                    .on_settle(move |outcome| observer(slot, outcome));
            }
        }
    }
}

/// The rejection used when too many inputs rejected.
pub(crate) fn aggregate(reasons: Shape<Error>, detail: String) -> Error {
    Error::new(ErrorKind::Aggregate)
        .with_message(detail)
        .with_payload(reasons)
}

impl<T> From<Vec<Future<T>>> for Shape<Resolution<T>> {
    fn from(futures: Vec<Future<T>>) -> Self {
        Self::Sequence(futures.into_iter().map(Resolution::Future).collect())
    }
}

impl<T> From<BTreeMap<String, Future<T>>> for Shape<Resolution<T>> {
    fn from(futures: BTreeMap<String, Future<T>>) -> Self {
        Self::Mapping(
            futures
                .into_iter()
                .map(|(key, future)| (key, Resolution::Future(future)))
                .collect(),
        )
    }
}
