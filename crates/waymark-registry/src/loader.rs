//! The loading facade: environment creation, registration with a pending
//! queue, and per-producer load dispatch.
//!
//! Producers may register values before the extension point they target has
//! been created - bootstrap ordering is decided by the host, not by this
//! crate. Until [`Loader::finish_bootstrap`] runs, values aimed at a
//! still-missing point are held in a pending queue and flushed once the
//! bootstrap environments exist. After that, registration against an unknown
//! point is an error: late producers must target an already-known point.

use std::any::{Any, TypeId};
use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rustc_hash::FxHashMap;
use waymark_core::{
    ClientLoaded, CommonLoaded, DataGenerating, ExtensionPoint, LoaderError, ServerLoaded,
};

use crate::environment::LoaderEnvironment;
use crate::registry::{ExtensionPointInfo, LoaderEnvironmentRegistry};

/// Which side of the runtime the process hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// A client process.
    Client,
    /// A dedicated or integrated server process.
    Server,
}

/// Selects which bundled environments [`Loader::bootstrap`] creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapProfile {
    /// The hosting side.
    pub side: Side,
    /// Whether the data-generation environment is created (server only).
    pub data_generation: bool,
}

impl BootstrapProfile {
    /// A client-side profile.
    pub fn client() -> Self {
        Self {
            side: Side::Client,
            data_generation: false,
        }
    }

    /// A server-side profile.
    pub fn server() -> Self {
        Self {
            side: Side::Server,
            data_generation: false,
        }
    }

    /// Enables the data-generation environment.
    pub fn with_data_generation(mut self) -> Self {
        self.data_generation = true;
        self
    }
}

/// A value registered before its extension point existed.
struct QueuedEntrypoint {
    /// Display name of the targeted point, for flush diagnostics.
    point: &'static str,
    /// Holds an `Arc<P>` of the targeted point's object type.
    value: Arc<dyn Any + Send + Sync>,
}

/// The process entry point for extension-point loading.
///
/// Owns the [`LoaderEnvironmentRegistry`]; hosts pass one instance through
/// their bootstrap call chain rather than sharing a global.
///
/// # Lifecycle
///
/// ```ignore
/// let mut loader = Loader::new();
///
/// // 1. Host, pre-launch: bundled environments, then seal.
/// loader.bootstrap(BootstrapProfile::server());
///
/// // 2. Producers run; custom environments and registrations, in any order.
/// loader.create_environment(|value: &(dyn WorldgenLoaded + 'static)| value.load_worldgen());
/// loader.register::<dyn CommonLoaded>(my_item)?;
///
/// // 3. Host: flip the bootstrap flag and flush queued registrations.
/// loader.finish_bootstrap()?;
///
/// // 4. Per producer, per point, typically once per process lifetime:
/// loader.load::<dyn CommonLoaded>(&["mymod"])?;
/// ```
#[derive(Default)]
pub struct Loader {
    registry: LoaderEnvironmentRegistry,
    pending: FxHashMap<TypeId, Vec<QueuedEntrypoint>>,
    bootstrapped: AtomicBool,
}

impl Loader {
    /// Creates a facade with an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the owned registry.
    pub fn registry(&self) -> &LoaderEnvironmentRegistry {
        &self.registry
    }

    /// Creates and registers an environment for the point `P`.
    ///
    /// Registration failures are logged at WARN and swallowed: environment
    /// creation runs inside a fixed bootstrap sequence, and one bad
    /// extension point should not abort the whole process.
    pub fn create_environment<P, F>(&mut self, load: F)
    where
        P: ExtensionPoint + ?Sized,
        F: Fn(&P) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        if let Err(err) = self.registry.register(LoaderEnvironment::new(load)) {
            tracing::warn!(point = P::POINT_NAME, %err, "failed to create loader environment");
        }
    }

    /// Registers a value against the point `P`.
    ///
    /// Before bootstrap completes, values targeting a not-yet-created point
    /// are queued and flushed by [`finish_bootstrap`](Self::finish_bootstrap).
    /// Afterwards the point must already exist, or registration fails with
    /// [`UnknownExtensionPoint`](LoaderError::UnknownExtensionPoint).
    pub fn register<P: ExtensionPoint + ?Sized>(
        &mut self,
        value: Arc<P>,
    ) -> Result<(), LoaderError> {
        let queue_if_missing = !self.bootstrapped.load(Ordering::Acquire);

        if !queue_if_missing || self.registry.has::<P>() {
            self.registry.add_entrypoint(value)
        } else {
            self.pending
                .entry(TypeId::of::<P>())
                .or_default()
                .push(QueuedEntrypoint {
                    point: P::POINT_NAME,
                    value: Arc::new(value),
                });
            Ok(())
        }
    }

    /// Registers every value in the sequence, in order, stopping at the
    /// first failure.
    pub fn register_all<P: ExtensionPoint + ?Sized>(
        &mut self,
        values: impl IntoIterator<Item = Arc<P>>,
    ) -> Result<(), LoaderError> {
        for value in values {
            self.register(value)?;
        }
        Ok(())
    }

    /// Type-erased registration used by the declaration scanner.
    ///
    /// Follows the same queue-or-apply decision as [`register`](Self::register).
    pub(crate) fn register_erased(
        &mut self,
        info: ExtensionPointInfo,
        value: Arc<dyn Any + Send + Sync>,
    ) -> Result<(), LoaderError> {
        let queue_if_missing = !self.bootstrapped.load(Ordering::Acquire);

        if !queue_if_missing || self.registry.has_point(info.type_id) {
            self.registry
                .add_entrypoint_erased(info.type_id, info.name, value.as_ref())
        } else {
            self.pending
                .entry(info.type_id)
                .or_default()
                .push(QueuedEntrypoint {
                    point: info.name,
                    value,
                });
            Ok(())
        }
    }

    /// Loads every entrypoint filed for `P` under each given producer.
    ///
    /// Fails with [`EmptyProducerList`](LoaderError::EmptyProducerList) when
    /// no producers are given - loading with no target is a caller mistake,
    /// not a no-op.
    pub fn load<P: ExtensionPoint + ?Sized>(
        &mut self,
        producers: &[&str],
    ) -> Result<(), LoaderError> {
        if producers.is_empty() {
            return Err(LoaderError::EmptyProducerList);
        }

        for producer in producers {
            self.registry.load_entrypoints::<P>(producer)?;
        }
        Ok(())
    }

    /// Creates the bundled environments selected by `profile`, then seals
    /// the registry against further bundled registrations.
    ///
    /// Hosts call this before any producer runs; producers may still create
    /// custom environments until [`finish_bootstrap`](Self::finish_bootstrap).
    pub fn bootstrap(&mut self, profile: BootstrapProfile) {
        tracing::info!(?profile, "initializing bundled loader environments");

        self.create_environment(|value: &(dyn CommonLoaded + 'static)| value.load_common());

        match profile.side {
            Side::Client => {
                self.create_environment(|value: &(dyn ClientLoaded + 'static)| {
                    value.load_client()
                });
            }
            Side::Server => {
                self.create_environment(|value: &(dyn ServerLoaded + 'static)| {
                    value.load_server()
                });

                if profile.data_generation {
                    self.create_environment(|value: &(dyn DataGenerating + 'static)| {
                        value.generate()
                    });
                }
            }
        }

        self.registry.seal();
    }

    /// Marks the bootstrap sequence complete and flushes the pending queue.
    ///
    /// The completion flag flips false-to-true exactly once; calls after the
    /// first skip the flush. Queued values whose point never materialized
    /// (or whose facet type mismatches) are dropped with a WARN - producer
    /// problems degrade that producer, they do not halt startup. An empty
    /// registry, by contrast, is a configuration error fatal to the host and
    /// is returned as [`NoExtensionPoints`](LoaderError::NoExtensionPoints).
    pub fn finish_bootstrap(&mut self) -> Result<(), LoaderError> {
        if self
            .bootstrapped
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            for (type_id, queued) in mem::take(&mut self.pending) {
                for entry in queued {
                    let applied = self.registry.add_entrypoint_erased(
                        type_id,
                        entry.point,
                        entry.value.as_ref(),
                    );

                    if let Err(err) = applied {
                        tracing::warn!(point = entry.point, %err, "dropping queued entrypoint");
                    }
                }
            }
        }

        if self.registry.is_empty() {
            return Err(LoaderError::NoExtensionPoints);
        }
        Ok(())
    }
}
