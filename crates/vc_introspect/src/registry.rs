use alloc::sync::Arc;
use core::any::{Any, TypeId};
use core::fmt;
use std::sync::{LazyLock, PoisonError, RwLock};

use crate::hash::HashMap;
use crate::introspection::TypeIntrospection;

// -----------------------------------------------------------------------------
// IntrospectionLookup

/// Finds the introspection of a type by its id.
///
/// Returning `None` means the type was never introspected; callers treat
/// that as "leave the type alone".
pub trait IntrospectionLookup: Send + Sync {
    fn find_introspection(&self, type_id: TypeId) -> Option<Arc<TypeIntrospection>>;
}

// -----------------------------------------------------------------------------
// IntrospectionRegistry

/// A thread-safe set of [`TypeIntrospection`]s, keyed by [`TypeId`].
///
/// The first introspection registered for a type is kept.
///
/// # Examples
///
/// ```
/// use vc_introspect::{IntrospectionLookup, IntrospectionRegistry, TypeIntrospection};
///
/// struct Empty;
///
/// let registry = IntrospectionRegistry::new();
/// assert!(registry.find::<Empty>().is_none());
///
/// registry.register(TypeIntrospection::builder::<Empty>().default_constructor(|| Empty).build());
/// assert!(registry.contains::<Empty>());
/// assert!(registry.find_introspection(core::any::TypeId::of::<Empty>()).is_some());
/// ```
pub struct IntrospectionRegistry {
    introspections: RwLock<HashMap<TypeId, Arc<TypeIntrospection>>>,
}

impl IntrospectionRegistry {
    pub fn new() -> Self {
        Self {
            introspections: RwLock::new(HashMap::default()),
        }
    }

    /// The process-wide registry.
    ///
    /// With the `auto_register` feature, introspections submitted through
    /// [`submit_introspection!`](crate::submit_introspection) are collected
    /// here the first time it is accessed.
    pub fn shared() -> &'static IntrospectionRegistry {
        static SHARED: LazyLock<IntrospectionRegistry> = LazyLock::new(|| {
            let registry = IntrospectionRegistry::new();
            #[cfg(feature = "auto_register")]
            registry.register_submitted();
            registry
        });
        &SHARED
    }

    /// Registers `introspection`, returning `false` if its type was already present.
    pub fn register(&self, introspection: TypeIntrospection) -> bool {
        self.register_arc(Arc::new(introspection))
    }

    pub fn register_arc(&self, introspection: Arc<TypeIntrospection>) -> bool {
        let mut introspections = self.introspections.write().unwrap_or_else(PoisonError::into_inner);
        // `Arc` is `Any` itself, so the inherent method is named explicitly.
        match introspections.entry(TypeIntrospection::type_id(&introspection)) {
            hashbrown::hash_map::Entry::Occupied(_) => {
                log::debug!(
                    "Introspection of `{}` is already registered, keeping the first one.",
                    introspection.type_name(),
                );
                false
            }
            hashbrown::hash_map::Entry::Vacant(entry) => {
                entry.insert(introspection);
                true
            }
        }
    }

    /// Collects every introspection submitted with `submit_introspection!`.
    #[cfg(feature = "auto_register")]
    pub fn register_submitted(&self) {
        for submitted in inventory::iter::<AutoIntrospection> {
            self.register((submitted.build)());
        }
    }

    #[inline]
    pub fn find<T: Any>(&self) -> Option<Arc<TypeIntrospection>> {
        self.find_introspection(TypeId::of::<T>())
    }

    #[inline]
    pub fn contains<T: Any>(&self) -> bool {
        self.find::<T>().is_some()
    }

    pub fn len(&self) -> usize {
        self.introspections.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for IntrospectionRegistry {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl IntrospectionLookup for IntrospectionRegistry {
    fn find_introspection(&self, type_id: TypeId) -> Option<Arc<TypeIntrospection>> {
        self.introspections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .cloned()
    }
}

impl fmt::Debug for IntrospectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let introspections = self.introspections.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_set()
            .entries(introspections.values().map(|i| i.type_name()))
            .finish()
    }
}

/// Looks up introspections in [`IntrospectionRegistry::shared`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedIntrospector;

impl IntrospectionLookup for SharedIntrospector {
    #[inline]
    fn find_introspection(&self, type_id: TypeId) -> Option<Arc<TypeIntrospection>> {
        IntrospectionRegistry::shared().find_introspection(type_id)
    }
}

// -----------------------------------------------------------------------------
// Auto registration

/// A statically submitted introspection factory.
///
/// Created by [`submit_introspection!`](crate::submit_introspection).
#[cfg(feature = "auto_register")]
pub struct AutoIntrospection {
    build: fn() -> TypeIntrospection,
}

#[cfg(feature = "auto_register")]
impl AutoIntrospection {
    #[doc(hidden)]
    pub const fn new(build: fn() -> TypeIntrospection) -> Self {
        Self { build }
    }
}

#[cfg(feature = "auto_register")]
inventory::collect!(AutoIntrospection);

/// Submits an introspection factory to the shared registry.
///
/// The factory runs once, the first time the shared registry is accessed.
///
/// ```
/// use vc_introspect::{IntrospectionRegistry, TypeIntrospection};
///
/// #[derive(Default)]
/// struct Marker;
///
/// fn marker() -> TypeIntrospection {
///     TypeIntrospection::builder::<Marker>().default_constructor(Marker::default).build()
/// }
///
/// vc_introspect::submit_introspection!(marker);
///
/// assert!(IntrospectionRegistry::shared().contains::<Marker>());
/// ```
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! submit_introspection {
    ($build:path) => {
        $crate::__macro_exports::inventory::submit! {
            $crate::AutoIntrospection::new($build)
        }
    };
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    struct First;
    struct Second;

    #[test]
    fn first_registration_wins() {
        let registry = IntrospectionRegistry::new();
        let one = TypeIntrospection::builder::<First>().default_constructor(|| First).build();
        let two = TypeIntrospection::builder::<First>().build();

        assert!(registry.register(one));
        assert!(!registry.register(two));
        assert_eq!(registry.len(), 1);

        let found = registry.find::<First>().unwrap();
        assert!(found.instantiate().is_ok());
    }

    #[test]
    fn keyed_by_introspected_type() {
        let registry = IntrospectionRegistry::new();
        assert!(registry.register(TypeIntrospection::builder::<First>().default_constructor(|| First).build()));
        assert!(registry.register_arc(Arc::new(TypeIntrospection::builder::<Second>().build())));
        assert_eq!(registry.len(), 2);

        let first = registry.find_introspection(TypeId::of::<First>()).unwrap();
        assert_eq!(TypeIntrospection::type_id(&first), TypeId::of::<First>());
        let second = registry.find::<Second>().unwrap();
        assert_eq!(second.type_name(), core::any::type_name::<Second>());
        assert!(registry.find_introspection(TypeId::of::<Arc<TypeIntrospection>>()).is_none());
    }

    #[test]
    fn lookup_miss() {
        let registry = IntrospectionRegistry::default();
        assert!(registry.find_introspection(TypeId::of::<u8>()).is_none());
        assert!(SharedIntrospector.find_introspection(TypeId::of::<First>()).is_none());
    }
}
