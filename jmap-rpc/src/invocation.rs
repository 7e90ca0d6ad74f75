// jmap-rpc/src/invocation.rs
use crate::error::{Error, MethodError, Result};
use crate::method::{MethodRegistry, MethodResponse, ERROR};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// One `[name, arguments, callId]` element of a batch.
///
/// Requests carry raw JSON arguments; decoded responses carry a
/// [`MethodResponse`] whose concrete type was chosen by `name`.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation<A = Value> {
    pub name: String,
    pub args: A,
    pub call_id: String,
}

impl<A> Invocation<A> {
    pub fn new(name: impl Into<String>, args: A, call_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args,
            call_id: call_id.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.name == ERROR
    }
}

impl<A: Serialize> Serialize for Invocation<A> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.name, &self.args, &self.call_id).serialize(serializer)
    }
}

impl<'de, A: Deserialize<'de>> Deserialize<'de> for Invocation<A> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (name, args, call_id) = <(String, A, String)>::deserialize(deserializer)?;
        Ok(Self {
            name,
            args,
            call_id,
        })
    }
}

impl Invocation<Box<dyn MethodResponse>> {
    /// Decodes one response element, picking the argument type from the
    /// method name. Unregistered names are an error.
    pub fn decode(raw: Value, methods: &MethodRegistry) -> Result<Self> {
        let elements: Vec<Value> = serde_json::from_value(raw)?;
        let [name, args, call_id]: [Value; 3] = elements
            .try_into()
            .map_err(|elements: Vec<Value>| Error::MalformedInvocation(elements.len()))?;

        let name: String = serde_json::from_value(name)?;
        let call_id: String = serde_json::from_value(call_id)?;
        let args = methods.decode(&name, &call_id, args)?;

        Ok(Self {
            name,
            args,
            call_id,
        })
    }

    /// The server's error, if this invocation failed.
    pub fn error(&self) -> Option<&MethodError> {
        if !self.is_error() {
            return None;
        }
        self.args.downcast_ref::<MethodError>()
    }
}
