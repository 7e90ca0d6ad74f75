// jmap-rpc/src/core.rs
use crate::capability::Capability;
use crate::error::SetError;
use crate::method::Method;
use crate::registry::Registry;
use crate::types::Id;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::HashMap;

pub const URI: &str = "urn:ietf:params:jmap:core";

pub(crate) fn register(registry: &Registry) {
    registry.register_capability::<CoreCapability>();
    registry.register_method::<Echo>("Core/echo");
    registry.register_method::<BlobCopyResponse>("Blob/copy");
}

/// Server limits advertised under `urn:ietf:params:jmap:core`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreCapability {
    /// Largest single upload, in octets.
    pub max_size_upload: u64,
    pub max_concurrent_upload: u64,
    /// Largest API request body, in octets.
    pub max_size_request: u64,
    pub max_concurrent_requests: u64,
    pub max_calls_in_request: u64,
    pub max_objects_in_get: u64,
    /// Combined limit on create, update and destroy in one `/set`.
    pub max_objects_in_set: u64,
    /// See [`collation`](crate::types::collation).
    pub collation_algorithms: Vec<String>,
}

impl Capability for CoreCapability {
    const URI: &'static str = URI;
}

/// `Core/echo`: the server answers with the same arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Echo {
    #[serde(flatten)]
    pub arguments: Map<String, Value>,
}

impl Echo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }
}

impl Method for Echo {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("Core/echo")
    }

    fn requires(&self) -> &'static [&'static str] {
        &[URI]
    }
}

/// `Blob/copy`: copies blobs between accounts without a download and
/// re-upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobCopy {
    pub from_account_id: Id,
    pub account_id: Id,
    pub blob_ids: Vec<Id>,
}

impl Method for BlobCopy {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("Blob/copy")
    }

    fn requires(&self) -> &'static [&'static str] {
        &[URI]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobCopyResponse {
    pub from_account_id: Id,
    pub account_id: Id,
    /// Source blob id to the id in the destination account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copied: Option<HashMap<Id, Id>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_copied: Option<HashMap<Id, SetError>>,
}
