//! `any`: the first fulfilment wins.

use super::{aggregate, observe, slots, Observer};
use crate::future::{Future, Resolution};
use crate::types::Shape;
use std::cell::RefCell;
use std::rc::Rc;

/// Fulfils with the first input to fulfil, or `None` for empty input.
///
/// An empty sequence or mapping has no winner to report, so the empty
/// result is expressed as `None` rather than as an empty container of the
/// input's shape. Every non-empty outcome is `Some`.
///
/// Rejects only once every input rejected, with an
/// [`ErrorKind::Aggregate`](crate::ErrorKind::Aggregate) error whose payload
/// is a `Shape<Error>` of every reason, positioned like the input.
pub fn any<T, S>(input: S) -> Future<Option<T>>
where
    T: Clone + 'static,
    S: Into<Shape<Resolution<T>>>,
{
    let (layout, slots) = match slots(input.into()) {
        Ok(split) => split,
        Err(reason) => return Future::rejected(reason),
    };
    if slots.is_empty() {
        return Future::fulfilled(None);
    }

    let total = slots.len();
    let (future, resolver) = Future::pending();
    let reasons = Rc::new(RefCell::new(Vec::with_capacity(total)));
    let observer: Observer<T> = Rc::new(move |slot, outcome| match outcome {
        Ok(value) => resolver.fulfill(Some(value)),
        Err(reason) => {
            let exhausted = {
                let mut reasons = reasons.borrow_mut();
                reasons.push((slot, reason));
                (reasons.len() == total).then(|| std::mem::take(&mut *reasons))
            };
            if let Some(reasons) = exhausted {
                let detail = format!("all {total} inputs rejected");
                resolver.reject(aggregate(layout.rebuild(reasons), detail));
            }
        }
    });
    observe(slots, &observer);
    future
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind};
    use crate::runtime::block_on;
    use crate::test_utils::{fulfill_after, init_test, reject_after};
    use std::collections::BTreeMap;

    #[test]
    fn empty_input_fulfils_with_none() {
        init_test("empty_input_fulfils_with_none");
        let out = any(Vec::<Future<u8>>::new());
        assert_eq!(block_on(&out).unwrap(), None);
    }

    #[test]
    fn first_fulfilment_wins() {
        init_test("first_fulfilment_wins");
        let out = any(vec![
            reject_after(1, Error::user("early failure")),
            fulfill_after(30, "slow"),
            fulfill_after(10, "fast"),
        ]);
        assert_eq!(block_on(&out).unwrap(), Some("fast"));
    }

    #[test]
    fn all_rejections_are_collected_by_key() {
        init_test("all_rejections_are_collected_by_key");
        let mut input = BTreeMap::new();
        input.insert("x".to_string(), reject_after::<u8>(5, Error::user("x failed")));
        input.insert("y".to_string(), reject_after(2, Error::user("y failed")));
        let err = block_on(&any(input)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Aggregate);

        let reasons = err.payload::<Shape<Error>>().unwrap().as_mapping().unwrap();
        assert_eq!(reasons["x"].payload::<&str>(), Some(&"x failed"));
        assert_eq!(reasons["y"].payload::<&str>(), Some(&"y failed"));
    }

    #[test]
    fn scalar_is_a_type_mismatch() {
        init_test("any_scalar_is_a_type_mismatch");
        let out = any(Shape::Scalar(Resolution::Value(1_u8)));
        assert_eq!(block_on(&out).unwrap_err().kind(), ErrorKind::TypeMismatch);
    }
}
