//! The environment registry: all registered extension points and their
//! accumulated entrypoints.
//!
//! # Storage model
//!
//! One map keyed by the extension point's `TypeId`, each entry holding the
//! point's [`LoaderEnvironment`] and its per-producer buckets. Entries are
//! stored behind an object-safe slot trait so a single map covers every
//! point type; the typed surface recovers the concrete type through the
//! erased path's downcast.
//!
//! # Thread safety
//!
//! The registry is **not thread-safe** by design. Registration happens
//! single-threaded during bootstrap and loading happens strictly afterwards
//! on the same thread; every mutating operation takes `&mut self`. A host
//! with multi-threaded producers must wrap the registry (or the facade that
//! owns it) in a mutex. The seal flag alone is atomic so the false-to-true
//! transition stays exactly-once even behind shared wrappers.

use std::any::{Any, TypeId};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rustc_hash::FxHashMap;
use waymark_core::{ExtensionPoint, LoaderError, is_contract};

use crate::environment::LoaderEnvironment;

/// Snapshot descriptor of one registered extension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionPointInfo {
    /// The point's type key.
    pub type_id: TypeId,
    /// The point's display name.
    pub name: &'static str,
    /// Whether the point ships with the runtime.
    pub bundled: bool,
}

/// Object-safe face of one registry entry.
///
/// `load` and `add_erased` close over the entry's point type, which lets the
/// facade flush queued values and the scanner feed values for points it only
/// knows by `TypeId`.
trait EnvironmentSlot: Send + Sync {
    fn info(&self) -> ExtensionPointInfo;

    /// Files a type-erased entrypoint; the value must hold an `Arc<P>` of
    /// this slot's point type.
    fn add_erased(&mut self, value: &(dyn Any + Send + Sync)) -> Result<(), LoaderError>;

    /// Invokes the load operation on every entrypoint filed under the given
    /// producer, clearing the bucket as values load.
    fn load(&mut self, producer: &str) -> Result<(), LoaderError>;
}

/// One registered extension point: its environment plus the entrypoints
/// accumulated per producer namespace.
struct RegistryEntry<P: ExtensionPoint + ?Sized> {
    environment: LoaderEnvironment<P>,
    entrypoints: FxHashMap<String, Vec<Arc<P>>>,
}

impl<P: ExtensionPoint + ?Sized> RegistryEntry<P> {
    fn new(environment: LoaderEnvironment<P>) -> Self {
        Self {
            environment,
            entrypoints: FxHashMap::default(),
        }
    }

    /// Files a value into its producer's bucket.
    ///
    /// Buckets are insertion-ordered sets: the same value (same allocation)
    /// filed twice under one producer is kept once. Identity is the value
    /// within its namespace, not its path - two distinct values sharing a
    /// path both stay.
    fn insert(&mut self, value: Arc<P>) {
        let producer = value.loader_id().namespace().to_owned();
        let bucket = self.entrypoints.entry(producer).or_default();

        if !bucket.iter().any(|existing| Arc::ptr_eq(existing, &value)) {
            bucket.push(value);
        }
    }
}

impl<P: ExtensionPoint + ?Sized> EnvironmentSlot for RegistryEntry<P> {
    fn info(&self) -> ExtensionPointInfo {
        ExtensionPointInfo {
            type_id: TypeId::of::<P>(),
            name: P::POINT_NAME,
            bundled: P::BUNDLED,
        }
    }

    fn add_erased(&mut self, value: &(dyn Any + Send + Sync)) -> Result<(), LoaderError> {
        let value = value
            .downcast_ref::<Arc<P>>()
            .ok_or(LoaderError::EntrypointTypeMismatch {
                point: P::POINT_NAME,
            })?
            .clone();

        self.insert(value);
        Ok(())
    }

    fn load(&mut self, producer: &str) -> Result<(), LoaderError> {
        // An absent bucket means the producer never registered here or was
        // already loaded; repeated loads are no-ops, not errors.
        let Some(bucket) = self.entrypoints.get_mut(producer) else {
            return Ok(());
        };

        // Fail-fast: values are removed one by one as they load, so the
        // first failure leaves the failing value and the remainder filed.
        while let Some(value) = bucket.first() {
            if let Err(source) = self.environment.load_value(value) {
                return Err(LoaderError::LoadFailure {
                    point: P::POINT_NAME,
                    entry: value.loader_id(),
                    source,
                });
            }
            bucket.remove(0);
        }

        self.entrypoints.remove(producer);
        Ok(())
    }
}

/// Retains every registered loader environment and its entrypoints.
#[derive(Default)]
pub struct LoaderEnvironmentRegistry {
    slots: FxHashMap<TypeId, Box<dyn EnvironmentSlot>>,
    sealed: AtomicBool,
}

impl LoaderEnvironmentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an environment for its extension point.
    ///
    /// Fails with [`NotAnInterface`] if the point type is not a trait-object
    /// contract, with [`SealedExtensionPoint`] if the point is bundled and
    /// the registry has sealed, and with [`DuplicateExtensionPoint`] if an
    /// environment for the point already exists. Nothing is mutated on
    /// failure.
    ///
    /// [`NotAnInterface`]: LoaderError::NotAnInterface
    /// [`SealedExtensionPoint`]: LoaderError::SealedExtensionPoint
    /// [`DuplicateExtensionPoint`]: LoaderError::DuplicateExtensionPoint
    pub fn register<P: ExtensionPoint + ?Sized>(
        &mut self,
        environment: LoaderEnvironment<P>,
    ) -> Result<(), LoaderError> {
        if !is_contract::<P>() {
            return Err(LoaderError::NotAnInterface {
                point: P::POINT_NAME,
            });
        }
        if P::BUNDLED && self.is_sealed() {
            return Err(LoaderError::SealedExtensionPoint {
                point: P::POINT_NAME,
            });
        }

        let type_id = TypeId::of::<P>();

        if self.slots.contains_key(&type_id) {
            return Err(LoaderError::DuplicateExtensionPoint {
                point: P::POINT_NAME,
            });
        }

        self.slots
            .insert(type_id, Box::new(RegistryEntry::new(environment)));
        Ok(())
    }

    /// Files an entrypoint under its producer's bucket for the given point.
    ///
    /// Fails with [`UnknownExtensionPoint`](LoaderError::UnknownExtensionPoint)
    /// if no environment has been registered for `P`.
    pub fn add_entrypoint<P: ExtensionPoint + ?Sized>(
        &mut self,
        value: Arc<P>,
    ) -> Result<(), LoaderError> {
        let slot =
            self.slots
                .get_mut(&TypeId::of::<P>())
                .ok_or(LoaderError::UnknownExtensionPoint {
                    point: P::POINT_NAME,
                })?;

        slot.add_erased(&value)
    }

    /// Files a type-erased entrypoint for the point keyed by `type_id`.
    ///
    /// The erased value must hold an `Arc` of the point's object type; a
    /// mismatch fails with
    /// [`EntrypointTypeMismatch`](LoaderError::EntrypointTypeMismatch).
    /// `point` is only used for diagnostics when the point is unknown.
    pub fn add_entrypoint_erased(
        &mut self,
        type_id: TypeId,
        point: &'static str,
        value: &(dyn Any + Send + Sync),
    ) -> Result<(), LoaderError> {
        let slot = self
            .slots
            .get_mut(&type_id)
            .ok_or(LoaderError::UnknownExtensionPoint { point })?;

        slot.add_erased(value)
    }

    /// Loads every entrypoint filed under `producer` for the point `P`,
    /// clearing that bucket.
    ///
    /// Entrypoints load in the order they were filed. The first operation
    /// failure is returned as [`LoadFailure`](LoaderError::LoadFailure):
    /// values loaded before it stay cleared, the rest stay filed. Loading an
    /// already-cleared bucket is a no-op.
    pub fn load_entrypoints<P: ExtensionPoint + ?Sized>(
        &mut self,
        producer: &str,
    ) -> Result<(), LoaderError> {
        let slot =
            self.slots
                .get_mut(&TypeId::of::<P>())
                .ok_or(LoaderError::UnknownExtensionPoint {
                    point: P::POINT_NAME,
                })?;

        slot.load(producer)
    }

    /// Returns whether an environment for `P` was previously registered.
    pub fn has<P: ExtensionPoint + ?Sized>(&self) -> bool {
        self.slots.contains_key(&TypeId::of::<P>())
    }

    /// Returns whether an environment keyed by `type_id` was registered.
    pub fn has_point(&self, type_id: TypeId) -> bool {
        self.slots.contains_key(&type_id)
    }

    /// Returns an owned snapshot of every registered extension point.
    ///
    /// Safe to iterate while registration continues on the live registry.
    pub fn extension_points(&self) -> Vec<ExtensionPointInfo> {
        self.slots.values().map(|slot| slot.info()).collect()
    }

    /// Returns the number of registered extension points.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns whether no extension points are registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Seals the registry against further bundled registrations.
    ///
    /// Monotonic: the first call flips the flag, later calls are no-ops.
    pub fn seal(&self) {
        let _ = self
            .sealed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire);
    }

    /// Returns whether the registry has sealed.
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }
}
