//! waymark - an extension-point registration and deferred-loading runtime.
//!
//! Independently-compiled producers declare typed extension points, register
//! concrete values against them in any order, and a consumer later triggers
//! the load of every value filed under its producer identifier - exactly
//! once, in a controlled order.
//!
//! # Overview
//!
//! An **extension point** is a trait-object contract (`dyn SomethingLoaded`)
//! with an [`ExtensionPoint`] marker impl. A **loader environment** binds a
//! point to the operation applied to each of its values. The [`Loader`]
//! facade owns the environment registry, queues registrations that arrive
//! before their point exists, and dispatches per-producer load passes. The
//! [`AutoLoader`] scanner lets a module register all of its declared members
//! at once, ordered by priority and filtered by per-point exclusions.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use waymark::prelude::*;
//!
//! struct Banner;
//!
//! impl Loaded for Banner {
//!     fn loader_id(&self) -> LoaderId {
//!         LoaderId::new("mymod", "banner").unwrap()
//!     }
//! }
//!
//! impl CommonLoaded for Banner {
//!     fn load_common(&self) -> anyhow::Result<()> {
//!         println!("banner loaded");
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<(), LoaderError> {
//! let mut loader = Loader::new();
//! loader.bootstrap(BootstrapProfile::server());
//!
//! loader.register::<dyn CommonLoaded>(Arc::new(Banner))?;
//! loader.finish_bootstrap()?;
//!
//! loader.load::<dyn CommonLoaded>(&["mymod"])?;
//! # Ok(())
//! # }
//! ```

pub use waymark_core::{
    ClientLoaded, CommonLoaded, DEFAULT_PRIORITY, DataGenerating, ExtensionPoint, Loaded,
    LoaderError, LoaderId, LoaderResult, ServerLoaded, is_contract,
};
pub use waymark_registry::{
    AutoLoader, BootstrapProfile, DeclarationBuilder, ExtensionPointInfo, LoadFn, Loader,
    LoaderEnvironment, LoaderEnvironmentRegistry, NestedBuilder, Side,
};

/// The commonly-needed surface in one import.
pub mod prelude {
    pub use waymark_core::{
        ClientLoaded, CommonLoaded, DataGenerating, ExtensionPoint, Loaded, LoaderError, LoaderId,
        LoaderResult, ServerLoaded,
    };
    pub use waymark_registry::{
        AutoLoader, BootstrapProfile, Loader, LoaderEnvironment, LoaderEnvironmentRegistry, Side,
    };
}
