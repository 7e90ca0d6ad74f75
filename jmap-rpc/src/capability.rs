// jmap-rpc/src/capability.rs
use crate::error::{Error, Result};
use crate::registry::{AsAny, FactoryTable};
use crate::types::Uri;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Metadata object advertised for a capability URI, in the session's
/// `capabilities` map or in an account's `accountCapabilities`.
///
/// ```ignore
/// #[derive(Debug, Deserialize)]
/// #[serde(rename_all = "camelCase")]
/// struct Contacts { max_address_books: Option<u64> }
///
/// impl Capability for Contacts {
///     const URI: &'static str = "urn:ietf:params:jmap:contacts";
/// }
/// ```
pub trait Capability: DeserializeOwned + fmt::Debug + Send + Sync + 'static {
    const URI: &'static str;
}

/// A decoded capability object of any registered type.
pub trait AnyCapability: AsAny + fmt::Debug {}

impl<T: fmt::Debug + Send + Sync + 'static> AnyCapability for T {}

impl dyn AnyCapability {
    pub fn downcast_ref<T: AnyCapability>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

type CapabilityFactory =
    Arc<dyn Fn(Value) -> serde_json::Result<Arc<dyn AnyCapability>> + Send + Sync>;

pub struct CapabilityRegistry {
    table: FactoryTable<CapabilityFactory>,
}

impl CapabilityRegistry {
    pub(crate) fn new() -> Self {
        Self {
            table: FactoryTable::new(),
        }
    }

    pub fn register<C: Capability>(&self) {
        self.register_with(C::URI, |raw| {
            let capability: C = serde_json::from_value(raw)?;
            Ok(Arc::new(capability) as Arc<dyn AnyCapability>)
        });
    }

    /// Registers a custom constructor for `uri`, replacing any earlier one.
    pub fn register_with<F>(&self, uri: &str, factory: F)
    where
        F: Fn(Value) -> serde_json::Result<Arc<dyn AnyCapability>> + Send + Sync + 'static,
    {
        self.table.insert(uri.to_string(), Arc::new(factory));
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.table.contains(uri)
    }

    pub fn uris(&self) -> Vec<String> {
        self.table.names()
    }

    /// Decodes every advertised capability that has a registered constructor.
    /// Unregistered URIs are skipped, so unknown or future capabilities
    /// never fail a session.
    pub fn decode(&self, raw: &HashMap<Uri, Value>) -> Result<Capabilities> {
        let mut decoded = HashMap::with_capacity(raw.len());
        for (uri, value) in raw {
            let Some(factory) = self.table.get(uri.as_str()) else {
                log::trace!("ignoring unregistered capability {}", uri);
                continue;
            };
            let capability = factory(value.clone()).map_err(|source| Error::DecodeCapability {
                uri: uri.clone(),
                source,
            })?;
            decoded.insert(uri.clone(), capability);
        }
        Ok(Capabilities(decoded))
    }
}

/// Decoded capability objects, keyed by URI.
#[derive(Debug, Clone, Default)]
pub struct Capabilities(HashMap<Uri, Arc<dyn AnyCapability>>);

impl Capabilities {
    pub fn get<C: Capability>(&self) -> Option<&C> {
        self.0.get(C::URI).and_then(|c| c.downcast_ref::<C>())
    }

    pub fn get_raw(&self, uri: &str) -> Option<&Arc<dyn AnyCapability>> {
        self.0.get(uri)
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.0.contains_key(uri)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn uris(&self) -> impl Iterator<Item = &Uri> {
        self.0.keys()
    }
}
