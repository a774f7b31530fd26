//! # Type Registry
//!
//! Maps a small type key to the handler that knows how to process records
//! of that type. Populated once at startup by explicit registration calls
//! (or a [`RegistryBuilder`] manifest), then only read.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// A handler that knows its own registry key.
pub trait Keyed<K> {
    /// The key this handler serves.
    fn key(&self) -> K;
}

impl<K, V: Keyed<K> + ?Sized> Keyed<K> for Box<V> {
    fn key(&self) -> K {
        (**self).key()
    }
}

/// Key -> handler map.
///
/// Registering the same key twice keeps the later handler.
/// Resolving an unknown key yields `None`, which callers treat as
/// "skip this record".
pub struct TypeRegistry<K, V> {
    handlers: HashMap<K, V>,
}

impl<K, V> Default for TypeRegistry<K, V> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash + Debug, V> TypeRegistry<K, V> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a registration manifest.
    #[must_use]
    pub fn builder() -> RegistryBuilder<K, V> {
        RegistryBuilder {
            registry: Self::new(),
        }
    }

    /// Registers `handler` under `key`. Returns the handler it replaced.
    pub fn register(&mut self, key: K, handler: V) -> Option<V> {
        let previous = self.handlers.insert(key, handler);
        if previous.is_some() {
            tracing::debug!(?key, "handler replaced by later registration");
        } else {
            tracing::trace!(?key, "handler registered");
        }
        previous
    }

    /// Registers a handler under its own key.
    pub fn register_keyed(&mut self, handler: V) -> Option<V>
    where
        V: Keyed<K>,
    {
        let key = handler.key();
        self.register(key, handler)
    }

    /// Looks up the handler for `key`.
    #[inline]
    #[must_use]
    pub fn resolve(&self, key: K) -> Option<&V> {
        self.handlers.get(&key)
    }

    /// True if a handler serves `key`.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.handlers.contains_key(&key)
    }

    /// Number of registered keys.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True when nothing is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<K>
    where
        K: Ord,
    {
        let mut keys: Vec<K> = self.handlers.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}

impl<K: Debug, V> Debug for TypeRegistry<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

/// Manifest-style construction of a [`TypeRegistry`].
///
/// ```rust
/// use glint_core::TypeRegistry;
///
/// let registry = TypeRegistry::<u16, &str>::builder()
///     .with(0, "marker")
///     .with(5, "scorch")
///     .build();
/// assert_eq!(registry.resolve(5), Some(&"scorch"));
/// ```
pub struct RegistryBuilder<K, V> {
    registry: TypeRegistry<K, V>,
}

impl<K: Copy + Eq + Hash + Debug, V> RegistryBuilder<K, V> {
    /// Adds a handler under `key`.
    #[must_use]
    pub fn with(mut self, key: K, handler: V) -> Self {
        self.registry.register(key, handler);
        self
    }

    /// Adds a handler under its own key.
    #[must_use]
    pub fn with_keyed(mut self, handler: V) -> Self
    where
        V: Keyed<K>,
    {
        self.registry.register_keyed(handler);
        self
    }

    /// Finishes the manifest.
    #[must_use]
    pub fn build(self) -> TypeRegistry<K, V> {
        self.registry
    }
}
