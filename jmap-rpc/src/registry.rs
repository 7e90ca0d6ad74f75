// jmap-rpc/src/registry.rs
use crate::capability::{Capability, CapabilityRegistry};
use crate::method::{MethodRegistry, MethodResponse};
use crate::methods::DataType;
use serde::de::DeserializeOwned;
use std::any::Any;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Lets decoded trait objects be downcast back to their concrete type.
pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Name-to-constructor table shared by the capability and method registries.
///
/// Lookups clone the factory out so the lock is never held while decoding.
pub(crate) struct FactoryTable<F> {
    entries: RwLock<HashMap<String, F>>,
}

impl<F: Clone> FactoryTable<F> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Later registrations for the same name replace earlier ones.
    pub(crate) fn insert(&self, name: String, factory: F) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, factory);
    }

    pub(crate) fn get(&self, name: &str) -> Option<F> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub(crate) fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

/// Capability and method tables used to decode sessions and responses.
///
/// A `Registry` is an ordinary value: a client owns one (behind an `Arc`),
/// and independent clients in one process may use different registries.
/// Registration works through a shared reference, but should be finished
/// before the registry is used by concurrent requests.
pub struct Registry {
    capabilities: CapabilityRegistry,
    methods: MethodRegistry,
}

impl Registry {
    /// An empty registry. Only the `"error"` response is known.
    pub fn new() -> Self {
        Self {
            capabilities: CapabilityRegistry::new(),
            methods: MethodRegistry::new(),
        }
    }

    pub fn capabilities(&self) -> &CapabilityRegistry {
        &self.capabilities
    }

    pub fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    pub fn register_capability<C: Capability>(&self) {
        self.capabilities.register::<C>();
    }

    pub fn register_method<R>(&self, name: &str)
    where
        R: MethodResponse + DeserializeOwned,
    {
        self.methods.register::<R>(name);
    }

    /// Registers the `/get`, `/changes`, `/set`, `/query` and `/queryChanges`
    /// responses of a data type.
    pub fn register_data_type<T: DataType>(&self) {
        crate::methods::register::<T>(&self.methods);
    }
}

impl Default for Registry {
    /// A registry that knows the Core capability and its methods.
    fn default() -> Self {
        let registry = Self::new();
        crate::core::register(&registry);
        registry
    }
}
