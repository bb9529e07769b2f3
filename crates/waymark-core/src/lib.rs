//! Core contracts for the waymark loading runtime.
//!
//! This crate defines the vocabulary shared by every other waymark crate:
//!
//! - [`LoaderId`] - the owning identifier of a registrable value
//! - [`Loaded`] - the minimal contract every registrable value exposes
//! - [`ExtensionPoint`] - the marker implemented for `dyn Trait` types that
//!   act as extension points
//! - the bundled extension-point traits ([`CommonLoaded`], [`ClientLoaded`],
//!   [`ServerLoaded`], [`DataGenerating`])
//! - [`LoaderError`] - the unified error type for registration and loading
//!
//! The stateful registry, the facade, and the declaration scanner live in
//! `waymark-registry`.

pub mod error;
pub mod loaded;
pub mod loader_id;
pub mod points;

pub use error::{LoaderError, LoaderResult};
pub use loaded::{DEFAULT_PRIORITY, ExtensionPoint, Loaded, is_contract};
pub use loader_id::LoaderId;
pub use points::{ClientLoaded, CommonLoaded, DataGenerating, ServerLoaded};
