//! Unified error type for registration and loading.
//!
//! Structural failures (duplicate, unknown, sealed, mismatched argument) are
//! surfaced to the immediate caller. Two callers deliberately downgrade them
//! instead of propagating: the facade's bootstrap-time environment creation
//! and the declaration scanner both log and continue, so a single bad
//! extension point or declaration cannot abort startup. Load-operation
//! failures are never downgraded - they abort the remainder of the load pass
//! for that producer.
//!
//! Two failure modes from the original taxonomy have no variants here
//! because the type system rules them out: an environment cannot be
//! constructed without its point type or operation, and an entrypoint cannot
//! be absent (`Arc` is never null). [`EntrypointTypeMismatch`] covers the one
//! dynamic gap left by type erasure.
//!
//! [`EntrypointTypeMismatch`]: LoaderError::EntrypointTypeMismatch

use thiserror::Error;

use crate::loader_id::LoaderId;

/// Convenience alias for results carrying a [`LoaderError`].
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Errors raised by the environment registry, the facade, and the scanner.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The extension-point marker was implemented on a sized type rather
    /// than a trait-object contract.
    #[error("'{point}' is not an interface-like contract")]
    NotAnInterface {
        /// The offending point's display name.
        point: &'static str,
    },

    /// An environment for this extension point already exists.
    #[error("an environment has already been registered for '{point}'")]
    DuplicateExtensionPoint {
        /// The point's display name.
        point: &'static str,
    },

    /// No environment has been registered for this extension point.
    #[error("an environment has not been registered for '{point}'")]
    UnknownExtensionPoint {
        /// The point's display name.
        point: &'static str,
    },

    /// A bundled extension point was registered after the registry sealed.
    #[error("the bundled extension point '{point}' cannot be registered after bootstrap")]
    SealedExtensionPoint {
        /// The point's display name.
        point: &'static str,
    },

    /// A type-erased entrypoint did not hold a value of the point's type.
    #[error("entrypoint value does not implement '{point}'")]
    EntrypointTypeMismatch {
        /// The point's display name.
        point: &'static str,
    },

    /// `load` was called with no producer identifiers.
    #[error("at least one producer identifier is required to load entrypoints")]
    EmptyProducerList,

    /// Bootstrap finished without a single registered extension point.
    ///
    /// This is a fatal configuration error: the host must stop startup.
    #[error("no extension points were registered during bootstrap")]
    NoExtensionPoints,

    /// A loader identifier failed validation.
    #[error("invalid loader identifier '{value}': {reason}")]
    InvalidLoaderId {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// An entrypoint's load operation failed.
    ///
    /// Raised fail-fast out of a load pass: entrypoints loaded before the
    /// failure are cleared, the failing value and the remainder stay filed.
    #[error("entrypoint '{entry}' failed to load for '{point}'")]
    LoadFailure {
        /// The point being loaded.
        point: &'static str,
        /// The failing entrypoint's identifier.
        entry: LoaderId,
        /// The operation's own error.
        #[source]
        source: anyhow::Error,
    },
}
