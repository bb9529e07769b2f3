//! The binding of an extension point to its load operation.

use waymark_core::ExtensionPoint;

/// The operation applied to each entrypoint of an extension point.
///
/// Operations are arbitrary host code (typically a call into the point
/// trait's load method) and report failure through `anyhow`.
pub type LoadFn<P> = Box<dyn Fn(&P) -> anyhow::Result<()> + Send + Sync>;

/// Immutable binding of an extension point to its load operation.
///
/// Created exactly once per extension point and handed to the registry. The
/// point type is the type parameter and the operation is a required
/// argument, so a half-constructed environment is unrepresentable.
pub struct LoaderEnvironment<P: ExtensionPoint + ?Sized> {
    load: LoadFn<P>,
}

impl<P: ExtensionPoint + ?Sized> LoaderEnvironment<P> {
    /// Creates an environment from its load operation.
    pub fn new<F>(load: F) -> Self
    where
        F: Fn(&P) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            load: Box::new(load),
        }
    }

    /// The bound extension point's display name.
    pub fn point_name(&self) -> &'static str {
        P::POINT_NAME
    }

    /// Whether the bound extension point ships with the runtime.
    pub fn is_bundled(&self) -> bool {
        P::BUNDLED
    }

    /// Applies the load operation to one entrypoint.
    ///
    /// Failures from the operation are returned unchanged; handling them is
    /// the caller's responsibility.
    pub fn load_value(&self, value: &P) -> anyhow::Result<()> {
        (self.load)(value)
    }
}
