//! The stateful half of the waymark loading runtime.
//!
//! - [`LoaderEnvironment`] - the immutable binding of an extension point to
//!   its load operation
//! - [`LoaderEnvironmentRegistry`] - all registered environments and their
//!   accumulated per-producer entrypoints
//! - [`Loader`] - the facade hosts pass through their bootstrap call chain:
//!   environment creation, pending-queue registration, per-producer loading
//! - [`AutoLoader`] - the declaration scanner that registers a module's
//!   members without per-member boilerplate
//!
//! Contracts (identifiers, the `Loaded` trait, extension-point markers,
//! errors) live in `waymark-core`.

pub mod auto_loader;
pub mod environment;
pub mod loader;
pub mod registry;

pub use auto_loader::{AutoLoader, DeclarationBuilder, NestedBuilder};
pub use environment::{LoadFn, LoaderEnvironment};
pub use loader::{BootstrapProfile, Loader, Side};
pub use registry::{ExtensionPointInfo, LoaderEnvironmentRegistry};
