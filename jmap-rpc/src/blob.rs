// jmap-rpc/src/blob.rs
use crate::types::Id;
use serde::{Deserialize, Serialize};
use uritemplate::UriTemplate;

/// Body of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub account_id: Id,
    pub blob_id: Id,
    /// Media type as sent in the upload's `Content-Type`.
    #[serde(rename = "type")]
    pub media_type: String,
    /// Octets.
    pub size: u64,
}

/// Expands an RFC 6570 template such as the session's `downloadUrl`.
/// Values are percent-encoded; variables not given expand to nothing.
pub fn expand_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut uri = UriTemplate::new(template);
    for (name, value) in vars {
        uri.set(name, value.to_string());
    }
    uri.build()
}
