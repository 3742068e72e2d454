//! Progress payloads.
//!
//! Progress values are delivered to listeners while a future is pending. They
//! are type-erased so a single future can report any kind of progress, and a
//! listener may transform the value before it reaches the derived future.

use core::fmt;
use std::any::Any;
use std::rc::Rc;

/// A cloneable, type-erased progress value.
#[derive(Clone)]
pub struct Progress(Rc<dyn Any>);

impl Progress {
    /// Wraps `value` as a progress payload.
    #[must_use]
    pub fn new<V: Any>(value: V) -> Self {
        Self(Rc::new(value))
    }

    /// An empty progress notification.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(())
    }

    /// Returns the value if it has type `V`.
    #[must_use]
    pub fn downcast_ref<V: Any>(&self) -> Option<&V> {
        self.0.downcast_ref::<V>()
    }

    /// Returns true if both payloads share one allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Progress(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downcast_by_type() {
        let p = Progress::new(2_i32);
        assert_eq!(p.downcast_ref::<i32>(), Some(&2));
        assert!(p.downcast_ref::<u8>().is_none());
    }

    #[test]
    fn clones_share_allocation() {
        let p = Progress::new("half");
        assert!(p.ptr_eq(&p.clone()));
        assert!(!p.ptr_eq(&Progress::new("half")));
    }
}
