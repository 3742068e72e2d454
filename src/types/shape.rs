//! Shape-preserving containers for combinator input and output.
//!
//! Combinators accept either an ordered sequence or a string-keyed mapping and
//! answer with the same shape. Anything else arrives as [`Shape::Scalar`] and
//! is reported as a type mismatch by the combinators, or treated as an empty
//! sequence by the iteration library.

use std::collections::BTreeMap;

/// An ordered sequence, a keyed mapping, or a lone value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape<T> {
    /// Ordered sequence; positions are identities.
    Sequence(Vec<T>),
    /// Keyed mapping; keys are identities.
    Mapping(BTreeMap<String, T>),
    /// Neither a sequence nor a mapping.
    Scalar(T),
}

impl<T> Shape<T> {
    /// An empty sequence.
    #[must_use]
    pub const fn empty_sequence() -> Self {
        Self::Sequence(Vec::new())
    }

    /// Number of entries (a scalar counts as one).
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Sequence(v) => v.len(),
            Self::Mapping(m) => m.len(),
            Self::Scalar(_) => 1,
        }
    }

    /// Returns true if a sequence or mapping has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A short name for the variant, used in type mismatch messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
            Self::Scalar(_) => "scalar",
        }
    }

    /// Returns the sequence, if this is one.
    #[must_use]
    pub fn into_sequence(self) -> Option<Vec<T>> {
        match self {
            Self::Sequence(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the mapping, if this is one.
    #[must_use]
    pub fn into_mapping(self) -> Option<BTreeMap<String, T>> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Borrows the sequence, if this is one.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[T]> {
        match self {
            Self::Sequence(v) => Some(v),
            _ => None,
        }
    }

    /// Borrows the mapping, if this is one.
    #[must_use]
    pub fn as_mapping(&self) -> Option<&BTreeMap<String, T>> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Maps every entry, keeping positions and keys.
    pub fn map<U, F: FnMut(T) -> U>(self, mut f: F) -> Shape<U> {
        match self {
            Self::Sequence(v) => Shape::Sequence(v.into_iter().map(f).collect()),
            Self::Mapping(m) => Shape::Mapping(m.into_iter().map(|(k, v)| (k, f(v))).collect()),
            Self::Scalar(v) => Shape::Scalar(f(v)),
        }
    }

    /// Splits a sequence or mapping into its layout and flat, indexed entries.
    ///
    /// A scalar is handed back unchanged as the error.
    pub(crate) fn into_slots(self) -> Result<(Layout, Vec<T>), Self> {
        match self {
            Self::Sequence(v) => Ok((Layout::Sequence, v)),
            Self::Mapping(m) => {
                let (keys, values) = m.into_iter().unzip();
                Ok((Layout::Mapping(keys), values))
            }
            scalar @ Self::Scalar(_) => Err(scalar),
        }
    }
}

impl<T> Default for Shape<T> {
    fn default() -> Self {
        Self::empty_sequence()
    }
}

impl<T> From<Vec<T>> for Shape<T> {
    fn from(v: Vec<T>) -> Self {
        Self::Sequence(v)
    }
}

impl<T> From<BTreeMap<String, T>> for Shape<T> {
    fn from(m: BTreeMap<String, T>) -> Self {
        Self::Mapping(m)
    }
}

/// Where flat slot indices came from, so results can be rebuilt in shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Layout {
    Sequence,
    Mapping(Vec<String>),
}

impl Layout {
    /// Rebuilds a shape from `(slot, value)` entries.
    ///
    /// Entries may be sparse; sequences keep slot order with holes dropped,
    /// mappings keep only the keys whose slot is present.
    pub(crate) fn rebuild<U>(&self, mut entries: Vec<(usize, U)>) -> Shape<U> {
        entries.sort_by_key(|(slot, _)| *slot);
        match self {
            Self::Sequence => Shape::Sequence(entries.into_iter().map(|(_, v)| v).collect()),
            Self::Mapping(keys) => Shape::Mapping(
                entries
                    .into_iter()
                    .map(|(slot, v)| (keys[slot].clone(), v))
                    .collect(),
            ),
        }
    }

    /// An empty shape of this layout.
    pub(crate) fn empty<U>(&self) -> Shape<U> {
        match self {
            Self::Sequence => Shape::Sequence(Vec::new()),
            Self::Mapping(_) => Shape::Mapping(BTreeMap::new()),
        }
    }
}
