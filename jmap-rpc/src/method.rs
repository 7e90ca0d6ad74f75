// jmap-rpc/src/method.rs
use crate::error::{Error, MethodError, Result};
use crate::registry::{AsAny, FactoryTable};
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Name of the invocation the server sends in place of a failed method's
/// response.
pub const ERROR: &str = "error";

/// A JMAP method call. The implementing type is serialized as the
/// invocation's arguments.
pub trait Method: Serialize {
    /// eg `"Core/echo"`
    fn name(&self) -> Cow<'static, str>;

    /// Capability URIs that must appear in the request's `using` list.
    fn requires(&self) -> &'static [&'static str];
}

/// Decoded arguments of a response invocation.
pub trait MethodResponse: AsAny + fmt::Debug {
    fn to_json(&self) -> serde_json::Result<Value>;
}

impl<T> MethodResponse for T
where
    T: Serialize + fmt::Debug + Send + Sync + 'static,
{
    fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

impl dyn MethodResponse {
    pub fn is<T: MethodResponse>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: MethodResponse>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast<T: MethodResponse>(self: Box<Self>) -> Option<Box<T>> {
        self.into_any().downcast::<T>().ok()
    }
}

impl Serialize for dyn MethodResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

type ResponseFactory = Arc<
    dyn Fn(Value) -> Result<Box<dyn MethodResponse>, serde_path_to_error::Error<serde_json::Error>>
        + Send
        + Sync,
>;

/// Maps response method names to the type their arguments decode into.
pub struct MethodRegistry {
    table: FactoryTable<ResponseFactory>,
}

impl MethodRegistry {
    /// A registry where only `"error"` is known. An `"error"` payload
    /// always decodes, however malformed.
    pub(crate) fn new() -> Self {
        let registry = Self {
            table: FactoryTable::new(),
        };
        let lenient: ResponseFactory = Arc::new(|raw: Value| {
            let err = serde_json::from_value::<MethodError>(raw.clone())
                .unwrap_or_else(|_| salvage_method_error(raw));
            Ok(Box::new(err) as Box<dyn MethodResponse>)
        });
        registry.table.insert(ERROR.to_string(), lenient);
        registry
    }

    pub fn register<R>(&self, name: &str)
    where
        R: MethodResponse + DeserializeOwned,
    {
        let factory: ResponseFactory = Arc::new(|raw: Value| {
            let response: R = serde_path_to_error::deserialize(raw)?;
            Ok(Box::new(response) as Box<dyn MethodResponse>)
        });
        self.table.insert(name.to_string(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.table.names()
    }

    /// Decodes `args` into the type registered for `name`.
    pub fn decode(
        &self,
        name: &str,
        call_id: &str,
        args: Value,
    ) -> Result<Box<dyn MethodResponse>> {
        let factory = self
            .table
            .get(name)
            .ok_or_else(|| Error::UnknownMethod(name.to_string()))?;
        factory(args).map_err(|source| Error::DecodeArguments {
            method: name.to_string(),
            call_id: call_id.to_string(),
            source,
        })
    }
}

/// Keeps what it can of an error payload that isn't a well-formed object.
/// A non-string `type` or `description` is kept as its JSON text.
fn salvage_method_error(raw: Value) -> MethodError {
    let mut extra = match raw {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => Map::from_iter([("value".to_string(), other)]),
    };
    let text = |value: Value| match value {
        Value::String(s) => s,
        other => other.to_string(),
    };
    MethodError {
        error_type: extra.remove("type").map(text).unwrap_or_default(),
        description: extra.remove("description").map(text),
        extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Ping {
        count: u32,
    }

    #[test]
    fn test_decode_registered_method() {
        let registry = MethodRegistry::new();
        registry.register::<Ping>("Test/ping");

        let resp = registry
            .decode("Test/ping", "0", json!({"count": 3}))
            .unwrap();
        assert_eq!(resp.downcast_ref::<Ping>(), Some(&Ping { count: 3 }));
        assert!(!resp.is::<MethodError>());
    }

    #[test]
    fn test_decode_unknown_method() {
        let registry = MethodRegistry::new();
        let err = registry.decode("Test/ping", "0", json!({})).unwrap_err();
        assert!(matches!(err, Error::UnknownMethod(name) if name == "Test/ping"));
    }

    #[test]
    fn test_decode_error_tags_method_and_path() {
        let registry = MethodRegistry::new();
        registry.register::<Ping>("Test/ping");

        let err = registry
            .decode("Test/ping", "c1", json!({"count": "three"}))
            .unwrap_err();
        match &err {
            Error::DecodeArguments {
                method,
                call_id,
                source,
            } => {
                assert_eq!(method, "Test/ping");
                assert_eq!(call_id, "c1");
                assert_eq!(source.path().to_string(), "count");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_error_is_always_registered() {
        let registry = MethodRegistry::new();
        let resp = registry.decode(ERROR, "0", json!({})).unwrap();
        assert!(resp.is::<MethodError>());

        let resp = registry
            .decode(ERROR, "1", json!({"type": "unknownMethod"}))
            .unwrap();
        let err = resp.downcast::<MethodError>().unwrap();
        assert_eq!(err.error_type, "unknownMethod");
    }

    #[test]
    fn test_malformed_error_still_decodes() {
        let registry = MethodRegistry::new();

        let resp = registry.decode(ERROR, "0", Value::Null).unwrap();
        let err = resp.downcast::<MethodError>().unwrap();
        assert_eq!(err.error_type, "");
        assert!(err.extra.is_empty());

        let resp = registry
            .decode(ERROR, "1", json!({"type": 5, "retryAfter": 30}))
            .unwrap();
        let err = resp.downcast::<MethodError>().unwrap();
        assert_eq!(err.error_type, "5");
        assert_eq!(err.extra.get("retryAfter"), Some(&json!(30)));

        let resp = registry.decode(ERROR, "2", json!("serverFail")).unwrap();
        let err = resp.downcast::<MethodError>().unwrap();
        assert_eq!(err.extra.get("value"), Some(&json!("serverFail")));
    }

    #[test]
    fn test_serialize_trait_object() {
        let resp: Box<dyn MethodResponse> = Box::new(Ping { count: 1 });
        assert_eq!(serde_json::to_value(&resp).unwrap(), json!({"count": 1}));
    }
}
