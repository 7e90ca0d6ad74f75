// jmap-rpc/src/error.rs
use crate::http::HttpError;
use crate::types::{IdError, Uri};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no session endpoint is set")]
    NoSessionEndpoint,

    #[error("couldn't authenticate: session endpoint returned HTTP {status}")]
    Authentication { status: u16 },

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Request(#[from] RequestError),

    /// Non-200 API response whose body is not a JMAP problem document.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("server doesn't support required capability '{0}'")]
    UnsupportedCapability(Uri),

    #[error("method '{0}' not registered")]
    UnknownMethod(String),

    #[error("invocation must have exactly 3 elements, found {0}")]
    MalformedInvocation(usize),

    #[error(
        "couldn't decode {method} response ({call_id}) at '{}': {}",
        .source.path(),
        .source.inner()
    )]
    DecodeArguments {
        method: String,
        call_id: String,
        source: serde_path_to_error::Error<serde_json::Error>,
    },

    #[error("couldn't decode capability '{uri}': {source}")]
    DecodeCapability {
        uri: Uri,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    InvalidId(#[from] IdError),

    #[error("call id '{0}' is already used in this request")]
    DuplicateCallId(String),

    #[error("no call with id '{0}' precedes this one in the request")]
    UnknownCallId(String),

    #[error("argument '{0}' is set both directly and as a result reference")]
    ConflictingArgument(String),

    #[error("no response for call id '{0}'")]
    MissingResponse(String),

    #[error("response to '{call_id}' is {actual}, not the requested type")]
    UnexpectedResponse { call_id: String, actual: String },

    #[error(transparent)]
    Method(#[from] MethodError),

    #[error("invalid session: {0}")]
    InvalidSession(String),

    #[error("JMAP discovery for {domain} failed: {message}")]
    Discovery { domain: String, message: String },
}

/// Problem document returned with a non-200 status from the API endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestError {
    /// eg "urn:ietf:params:jmap:error:limit"
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub detail: String,
    /// Name of the exceeded limit, for `urn:ietf:params:jmap:error:limit`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.limit {
            Some(limit) => write!(f, "{}: {} ({})", self.error_type, self.detail, limit),
            None => write!(f, "{}: {}", self.error_type, self.detail),
        }
    }
}

impl std::error::Error for RequestError {}

/// Returned in place of a method's response when the server failed to process
/// that one invocation. Its invocation name is always `"error"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodError {
    #[serde(rename = "type", default)]
    pub error_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Type-specific fields, eg `existingId` for `alreadyExists`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl fmt::Display for MethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(description) => write!(f, "method error {}: {}", self.error_type, description),
            None => write!(f, "method error {}", self.error_type),
        }
    }
}

impl std::error::Error for MethodError {}

/// Per-record failure inside a `/set` or `/copy` response. This is response
/// data, never propagated as an [`Error`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetError {
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Offending properties, for `invalidProperties`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<String>>,
}

impl SetError {
    pub fn is(&self, error_type: &str) -> bool {
        self.error_type == error_type
    }
}

impl fmt::Display for SetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error_type)?;
        if let Some(description) = &self.description {
            write!(f, ": {}", description)?;
        }
        if let Some(properties) = &self.properties {
            write!(f, " [{}]", properties.join(", "))?;
        }
        Ok(())
    }
}

pub mod error_types {
    // Request-level problem types (RFC 8620, section 3.6.1)
    pub const UNKNOWN_CAPABILITY: &str = "urn:ietf:params:jmap:error:unknownCapability";
    pub const NOT_JSON: &str = "urn:ietf:params:jmap:error:notJSON";
    pub const NOT_REQUEST: &str = "urn:ietf:params:jmap:error:notRequest";
    pub const LIMIT: &str = "urn:ietf:params:jmap:error:limit";

    // Method-level errors (RFC 8620, section 3.6.2)
    pub const SERVER_UNAVAILABLE: &str = "serverUnavailable";
    pub const SERVER_FAIL: &str = "serverFail";
    pub const SERVER_PARTIAL_FAIL: &str = "serverPartialFail";
    pub const UNKNOWN_METHOD: &str = "unknownMethod";
    pub const INVALID_ARGUMENTS: &str = "invalidArguments";
    pub const INVALID_RESULT_REFERENCE: &str = "invalidResultReference";
    pub const FORBIDDEN: &str = "forbidden";
    pub const ACCOUNT_NOT_FOUND: &str = "accountNotFound";
    pub const ACCOUNT_NOT_SUPPORTED_BY_METHOD: &str = "accountNotSupportedByMethod";
    pub const ACCOUNT_READ_ONLY: &str = "accountReadOnly";
    pub const REQUEST_TOO_LARGE: &str = "requestTooLarge";
    pub const CANNOT_CALCULATE_CHANGES: &str = "cannotCalculateChanges";
    pub const STATE_MISMATCH: &str = "stateMismatch";
    pub const FROM_ACCOUNT_NOT_FOUND: &str = "fromAccountNotFound";
    pub const FROM_ACCOUNT_NOT_SUPPORTED_BY_METHOD: &str = "fromAccountNotSupportedByMethod";
    pub const ANCHOR_NOT_FOUND: &str = "anchorNotFound";
    pub const UNSUPPORTED_SORT: &str = "unsupportedSort";
    pub const UNSUPPORTED_FILTER: &str = "unsupportedFilter";
    pub const TOO_MANY_CHANGES: &str = "tooManyChanges";

    // SetError types (RFC 8620, section 5.3)
    pub const OVER_QUOTA: &str = "overQuota";
    pub const TOO_LARGE: &str = "tooLarge";
    pub const RATE_LIMIT: &str = "rateLimit";
    pub const NOT_FOUND: &str = "notFound";
    pub const INVALID_PATCH: &str = "invalidPatch";
    pub const WILL_DESTROY: &str = "willDestroy";
    pub const INVALID_PROPERTIES: &str = "invalidProperties";
    pub const SINGLETON: &str = "singleton";
    pub const ALREADY_EXISTS: &str = "alreadyExists";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_error_with_limit() {
        let err: RequestError = serde_json::from_value(json!({
            "type": "urn:ietf:params:jmap:error:limit",
            "status": 400,
            "detail": "Too many calls",
            "limit": "maxCallsInRequest"
        }))
        .unwrap();
        assert_eq!(err.error_type, error_types::LIMIT);
        assert_eq!(err.status, 400);
        assert_eq!(err.limit.as_deref(), Some("maxCallsInRequest"));
        assert_eq!(
            err.to_string(),
            "urn:ietf:params:jmap:error:limit: Too many calls (maxCallsInRequest)"
        );
    }

    #[test]
    fn test_method_error_tolerates_missing_fields() {
        let err: MethodError = serde_json::from_value(json!({})).unwrap();
        assert_eq!(err.error_type, "");
        assert!(err.description.is_none());
    }

    #[test]
    fn test_method_error_keeps_extra_fields() {
        let err: MethodError = serde_json::from_value(json!({
            "type": "alreadyExists",
            "existingId": "M123"
        }))
        .unwrap();
        assert_eq!(err.error_type, error_types::ALREADY_EXISTS);
        assert_eq!(err.extra.get("existingId"), Some(&json!("M123")));
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"type": "alreadyExists", "existingId": "M123"})
        );
    }

    #[test]
    fn test_set_error_invalid_properties() {
        let err: SetError = serde_json::from_value(json!({
            "type": "invalidProperties",
            "description": "bad values",
            "properties": ["name", "parentId"]
        }))
        .unwrap();
        assert!(err.is(error_types::INVALID_PROPERTIES));
        assert_eq!(err.to_string(), "invalidProperties: bad values [name, parentId]");
    }
}
