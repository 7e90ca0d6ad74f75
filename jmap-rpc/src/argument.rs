// jmap-rpc/src/argument.rs
use crate::types::Id;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};

/// Points an argument at part of an earlier response in the same request.
/// The server resolves it; the client only sends it under `#<argument>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultReference {
    /// Call id of the earlier invocation.
    pub result_of: String,
    /// Expected response name of that invocation, eg `"Foo/query"`.
    pub name: String,
    /// JSON pointer into its arguments. `*` maps through arrays.
    pub path: String,
}

impl ResultReference {
    pub fn new(
        result_of: impl Into<String>,
        name: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            result_of: result_of.into(),
            name: name.into(),
            path: path.into(),
        }
    }
}

/// A method argument given either directly or as a result reference, never
/// both.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument<T> {
    Value(T),
    Reference(ResultReference),
}

impl<T: Serialize> Argument<T> {
    /// Writes the argument as `key` or, for a reference, `#key`.
    pub fn serialize_entry<M: SerializeMap>(&self, key: &str, map: &mut M) -> Result<(), M::Error> {
        match self {
            Argument::Value(value) => map.serialize_entry(key, value),
            Argument::Reference(reference) => map.serialize_entry(&format!("#{key}"), reference),
        }
    }
}

impl<T> From<T> for Argument<T> {
    fn from(value: T) -> Self {
        Argument::Value(value)
    }
}

impl From<ResultReference> for Argument<Vec<Id>> {
    fn from(reference: ResultReference) -> Self {
        Argument::Reference(reference)
    }
}

impl From<ResultReference> for Argument<Vec<String>> {
    fn from(reference: ResultReference) -> Self {
        Argument::Reference(reference)
    }
}
