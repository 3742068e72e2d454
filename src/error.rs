//! Error types and rejection reasons for Pledge.
//!
//! Every rejected [`Future`](crate::Future) carries an [`Error`]. The core only
//! ever interprets the [`ErrorKind`]; caller-supplied reasons travel as opaque
//! payloads attached with [`Error::user`] or [`Error::with_payload`].
//!
//! # Error Kinds
//!
//! - **Cancelled**: the future was cancelled through [`Future::cancel`](crate::Future::cancel)
//! - **Timeout**: the timer collaborator won the race against a settlement
//! - **CircularResolution**: a future (or thenable chain) resolved to itself
//! - **TypeMismatch**: a combinator received neither a sequence nor a mapping
//! - **StopProgressPropagation**: the reserved marker a progress listener raises
//!   to halt propagation without rejecting anything
//! - **Aggregate**: `any`/`some` could not be satisfied; the payload is a
//!   [`Shape`](crate::types::Shape) of the reasons that counted
//! - **Panicked**: a producer, handler or thenable panicked
//! - **Stalled**: [`block_on`](crate::runtime::block_on) ran out of work with the
//!   future still pending
//! - **User**: caller-supplied reason

use core::fmt;
use std::any::Any;
use std::sync::Arc;

/// The kind of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Future was cancelled.
    Cancelled,
    /// A timer elapsed before the future settled.
    Timeout,
    /// A future or thenable chain resolved to itself.
    CircularResolution,
    /// A combinator received an input that is neither a sequence nor a mapping.
    TypeMismatch,
    /// Reserved marker thrown by progress listeners to halt propagation.
    StopProgressPropagation,
    /// Structured collection of reasons (`any`, `some`).
    Aggregate,
    /// A producer, handler or thenable panicked.
    Panicked,
    /// The runtime went idle while the awaited future was still pending.
    Stalled,
    /// Internal invariant violation (bug).
    Internal,
    /// Caller-supplied rejection reason.
    User,
}

impl ErrorKind {
    /// Returns true for the kinds the core itself produces as unwind conventions
    /// rather than failures.
    #[must_use]
    pub const fn is_control(&self) -> bool {
        matches!(self, Self::Cancelled | Self::StopProgressPropagation)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cancelled => "cancelled",
            Self::Timeout => "timeout",
            Self::CircularResolution => "circular resolution",
            Self::TypeMismatch => "type mismatch",
            Self::StopProgressPropagation => "stop progress propagation",
            Self::Aggregate => "aggregate",
            Self::Panicked => "panicked",
            Self::Stalled => "stalled",
            Self::Internal => "internal",
            Self::User => "user",
        };
        f.write_str(name)
    }
}

/// Opaque payload attached to an [`Error`].
type Payload = Arc<dyn Any + Send + Sync>;

/// The rejection reason carried by every rejected future.
///
/// Cheap to clone: message, payload and source are shared.
#[derive(Clone)]
pub struct Error {
    kind: ErrorKind,
    message: Option<Arc<str>>,
    payload: Option<Payload>,
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            payload: None,
            source: None,
        }
    }

    /// Creates a caller-supplied rejection reason carrying `payload`.
    #[must_use]
    pub fn user<P: Any + Send + Sync>(payload: P) -> Self {
        Self::new(ErrorKind::User).with_payload(payload)
    }

    /// Creates the distinguished cancellation reason.
    #[must_use]
    pub const fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled)
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(after_ms: u64) -> Self {
        Self::new(ErrorKind::Timeout).with_message(format!("timed out after {after_ms}ms"))
    }

    /// Creates a circular resolution error.
    #[must_use]
    pub fn circular(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::CircularResolution).with_message(detail)
    }

    /// Creates a type mismatch error naming what was received.
    #[must_use]
    pub fn type_mismatch(received: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeMismatch).with_message(format!(
            "expected a sequence or a mapping, got {}",
            received.into()
        ))
    }

    /// Creates the reserved marker that halts progress propagation.
    #[must_use]
    pub const fn stop_progress() -> Self {
        Self::new(ErrorKind::StopProgressPropagation)
    }

    /// Creates an error from a caught panic payload.
    #[must_use]
    pub fn panicked(payload: &(dyn Any + Send)) -> Self {
        Self::new(ErrorKind::Panicked).with_message(panic_message(payload))
    }

    /// Creates an internal error (runtime bug).
    #[must_use]
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal).with_message(detail)
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns true if this error represents cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }

    /// Returns true if this error is a timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout)
    }

    /// Returns true if this is the reserved stop-propagation marker.
    #[must_use]
    pub const fn is_stop_progress(&self) -> bool {
        matches!(self.kind, ErrorKind::StopProgressPropagation)
    }

    /// Adds a message description to the error.
    #[must_use]
    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(Arc::from(msg.into()));
        self
    }

    /// Attaches an opaque payload.
    #[must_use]
    pub fn with_payload<P: Any + Send + Sync>(mut self, payload: P) -> Self {
        self.payload = Some(Arc::new(payload));
        self
    }

    /// Adds a source error to the chain.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Returns the error message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns the payload if it has type `P`.
    #[must_use]
    pub fn payload<P: Any>(&self) -> Option<&P> {
        self.payload.as_deref().and_then(|p| p.downcast_ref::<P>())
    }

    /// Returns true if both errors share the same payload allocation.
    ///
    /// This is the identity check for caller-supplied reasons: a reason that
    /// propagates unchanged through a chain keeps its payload pointer.
    #[must_use]
    pub fn same_payload(&self, other: &Self) -> bool {
        match (&self.payload, &other.payload) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Error");
        s.field("kind", &self.kind);
        if let Some(msg) = &self.message {
            s.field("message", msg);
        }
        if self.payload.is_some() {
            s.field("payload", &"..");
        }
        s.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(msg) = &self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// A specialized Result type for Pledge operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Extracts a human-readable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Runs `f`, converting a panic into a `Panicked` rejection reason.
pub(crate) fn catch_panic<R>(f: impl FnOnce() -> Result<R>) -> Result<R> {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(Error::panicked(payload.as_ref())),
    }
}
