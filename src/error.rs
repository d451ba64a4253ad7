//! Error taxonomy shared by the page cache family and the segmented LIRS cache.
//!
//! Both cores report failures through the same [`CacheError`] enum rather than
//! through ad hoc panics, so a caller wiring either core into a larger engine
//! has exactly one error shape to match on.

use core::fmt;

/// The single error type returned by fallible operations in this crate.
///
/// Variants correspond to the four error kinds named in the design: a bad
/// argument supplied by the caller, a cache that cannot be constructed as
/// requested, an internal invariant violation (a programming error, not a
/// runtime condition), and a propagated I/O failure from a [`CacheWriter`]
/// collaborator.
///
/// [`CacheWriter`]: crate::page::writer::CacheWriter
#[derive(Debug)]
pub enum CacheError {
    /// A caller-supplied argument was out of range or otherwise invalid.
    InvalidArgument {
        /// Name of the offending parameter.
        param: &'static str,
        /// Human-readable description of why the value was rejected.
        reason: alloc::string::String,
    },
    /// The cache could not be constructed or reconfigured in its current state.
    InvalidState {
        /// Description of the state that could not be reached.
        reason: alloc::string::String,
    },
    /// An internal bookkeeping invariant was violated.
    ///
    /// These indicate a bug in the caller's use of the cache (e.g. a
    /// duplicate `put` at an already-occupied position) or in the cache
    /// itself; they are never expected to occur in correct, single-threaded
    /// (Core A) or single-segment-locked (Core B) use.
    InternalInvariant {
        /// Description of the invariant that was found broken.
        detail: alloc::string::String,
    },
    /// A [`CacheWriter`] operation (`flushLog`/`writeBack`) failed.
    ///
    /// The cache does not interpret this error; it unwinds the in-progress
    /// eviction pass, restores `maxMemory`, and propagates the failure
    /// unchanged.
    ///
    /// [`CacheWriter`]: crate::page::writer::CacheWriter
    IoFailure(alloc::boxed::Box<dyn core::fmt::Debug + Send + Sync>),
}

impl CacheError {
    /// Builds an [`CacheError::InvalidArgument`] with a formatted reason.
    pub(crate) fn invalid_argument(param: &'static str, reason: alloc::string::String) -> Self {
        CacheError::InvalidArgument { param, reason }
    }

    /// Builds an [`CacheError::InvalidState`] with a formatted reason.
    pub(crate) fn invalid_state(reason: alloc::string::String) -> Self {
        CacheError::InvalidState { reason }
    }

    /// Builds an [`CacheError::InternalInvariant`] with a formatted detail.
    pub(crate) fn internal_invariant(detail: alloc::string::String) -> Self {
        CacheError::InternalInvariant { detail }
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::InvalidArgument { param, reason } => {
                write!(f, "invalid argument `{param}`: {reason}")
            }
            CacheError::InvalidState { reason } => write!(f, "invalid cache state: {reason}"),
            CacheError::InternalInvariant { detail } => {
                write!(f, "internal invariant violated: {detail}")
            }
            CacheError::IoFailure(err) => write!(f, "writer I/O failure: {err:?}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CacheError {}

/// Convenience alias for results returned by this crate's fallible operations.
pub type Result<T> = core::result::Result<T, CacheError>;
