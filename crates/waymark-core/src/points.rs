//! Bundled extension points.
//!
//! These four contracts ship with the runtime; the facade's bootstrap step
//! creates their environments according to the host's profile. They are
//! `BUNDLED`, so once the registry is sealed they can no longer be
//! (re)registered - custom extension points remain open.

use anyhow::Result;

use crate::loaded::{ExtensionPoint, Loaded};

/// A value loaded on both the client and the server.
///
/// If only one side should load the value, see [`ClientLoaded`] and
/// [`ServerLoaded`].
pub trait CommonLoaded: Loaded {
    /// Loads this value at runtime.
    fn load_common(&self) -> Result<()>;
}

impl ExtensionPoint for dyn CommonLoaded {
    const POINT_NAME: &'static str = "CommonLoaded";
    const BUNDLED: bool = true;
}

/// A value loaded only on the client.
pub trait ClientLoaded: Loaded {
    /// Loads this value at runtime on the client.
    fn load_client(&self) -> Result<()>;
}

impl ExtensionPoint for dyn ClientLoaded {
    const POINT_NAME: &'static str = "ClientLoaded";
    const BUNDLED: bool = true;
}

/// A value loaded only on the server.
pub trait ServerLoaded: Loaded {
    /// Loads this value at runtime on the server.
    fn load_server(&self) -> Result<()>;
}

impl ExtensionPoint for dyn ServerLoaded {
    const POINT_NAME: &'static str = "ServerLoaded";
    const BUNDLED: bool = true;
}

/// A value loaded during data generation.
///
/// Only created when the server profile enables data generation.
pub trait DataGenerating: Loaded {
    /// Runs this value's data-generation step.
    fn generate(&self) -> Result<()>;
}

impl ExtensionPoint for dyn DataGenerating {
    const POINT_NAME: &'static str = "DataGenerating";
    const BUNDLED: bool = true;
}
