//! The entrypoint contract and the extension-point marker.

use std::mem;

use crate::loader_id::LoaderId;

/// The default loading priority for scanner declarations.
///
/// Higher priorities load sooner; the default sits in the middle so
/// declarations can opt into loading before or after the bulk.
pub const DEFAULT_PRIORITY: i32 = 0;

/// A value that should be loaded at runtime.
///
/// This is the minimal capability every registrable value exposes: an owning
/// identifier. The zero-argument load operation lives on the extension-point
/// trait the value implements (see [`CommonLoaded`](crate::CommonLoaded) and
/// friends), because one value may participate in several extension points
/// with a different load method for each.
pub trait Loaded: Send + Sync {
    /// Returns this value's owning identifier.
    ///
    /// The identifier's namespace selects the producer bucket the value is
    /// filed under during registration.
    fn loader_id(&self) -> LoaderId;
}

/// Marker implemented for the `dyn Trait` type of an extension point.
///
/// An extension point is a trait-object contract that producers supply
/// implementations of. The marker is implemented for the object type itself,
/// never for concrete values:
///
/// ```
/// use anyhow::Result;
/// use waymark_core::{ExtensionPoint, Loaded};
///
/// trait WorldgenLoaded: Loaded {
///     fn load_worldgen(&self) -> Result<()>;
/// }
///
/// impl ExtensionPoint for dyn WorldgenLoaded {
///     const POINT_NAME: &'static str = "WorldgenLoaded";
/// }
/// ```
///
/// The registry keys environments by `TypeId::of::<P>()` and rejects marker
/// impls on sized types at registration time (see [`is_contract`]).
pub trait ExtensionPoint: Loaded + 'static {
    /// Display name used in errors and log records.
    const POINT_NAME: &'static str;

    /// Whether this point ships with the runtime itself.
    ///
    /// Bundled points may not be registered once the registry is sealed at
    /// the end of the bootstrap phase.
    const BUNDLED: bool = false;
}

/// Returns whether `P` is an interface-like contract.
///
/// Extension points must be trait-object types; a reference to one is a fat
/// pointer. A marker impl on a concrete sized type produces a thin reference
/// and is rejected by the registry with
/// [`NotAnInterface`](crate::LoaderError::NotAnInterface). The check runs at
/// registration time because producers cannot be type-checked against
/// extension points they do not know about statically.
pub fn is_contract<P: ExtensionPoint + ?Sized>() -> bool {
    mem::size_of::<&P>() > mem::size_of::<usize>()
}
