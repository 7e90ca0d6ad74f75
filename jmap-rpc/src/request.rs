// jmap-rpc/src/request.rs
use crate::argument::ResultReference;
use crate::error::{Error, Result};
use crate::invocation::Invocation;
use crate::method::Method;
use crate::types::{Id, Uri};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A batch of method calls sent to the API endpoint in one HTTP request.
///
/// ```ignore
/// let mut req = Request::new();
/// let query = req.invoke(&Query::<Note>::new(account.clone()))?;
/// let ids = req.reference(&query, "/ids")?;
/// req.invoke(&Get::<Note>::new(account).ids(ids))?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    using: Vec<Uri>,
    method_calls: Vec<Invocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_ids: Option<HashMap<Id, Id>>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client-chosen creation ids mapped to server ids from earlier requests.
    pub fn with_created_ids(mut self, created_ids: HashMap<Id, Id>) -> Self {
        self.created_ids = Some(created_ids);
        self
    }

    /// Capabilities required by the queued calls, in first-seen order.
    pub fn using(&self) -> &[Uri] {
        &self.using
    }

    pub fn method_calls(&self) -> &[Invocation] {
        &self.method_calls
    }

    pub fn created_ids(&self) -> Option<&HashMap<Id, Id>> {
        self.created_ids.as_ref()
    }

    pub fn len(&self) -> usize {
        self.method_calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.method_calls.is_empty()
    }

    /// Queues a call and returns its call id: the hex index of the call,
    /// eg `"0"`, `"1"`, ... `"a"`. An index already taken by an explicit
    /// call id is skipped.
    pub fn invoke<M: Method>(&mut self, method: &M) -> Result<String> {
        let mut n = self.method_calls.len();
        let call_id = loop {
            let id = format!("{:x}", n);
            if !self.method_calls.iter().any(|c| c.call_id == id) {
                break id;
            }
            n += 1;
        };
        self.invoke_as(call_id, method)
    }

    /// Queues a call under a caller-chosen call id.
    ///
    /// The arguments are serialized immediately, so invalid ids and arguments
    /// given both directly and as a `#` reference are rejected here rather
    /// than by the server.
    pub fn invoke_as<M: Method>(
        &mut self,
        call_id: impl Into<String>,
        method: &M,
    ) -> Result<String> {
        let call_id = call_id.into();
        if self.method_calls.iter().any(|c| c.call_id == call_id) {
            return Err(Error::DuplicateCallId(call_id));
        }

        let args = serde_json::to_value(method)?;
        check_references(&args)?;

        for uri in method.requires() {
            if !self.using.iter().any(|u| u.as_str() == *uri) {
                self.using.push(Uri::from(*uri));
            }
        }
        self.method_calls
            .push(Invocation::new(method.name(), args, call_id.clone()));
        Ok(call_id)
    }

    /// Builds a reference to `path` in the response of an already queued call.
    pub fn reference(&self, call_id: &str, path: impl Into<String>) -> Result<ResultReference> {
        let call = self
            .method_calls
            .iter()
            .find(|c| c.call_id == call_id)
            .ok_or_else(|| Error::UnknownCallId(call_id.to_string()))?;
        Ok(ResultReference::new(call_id, call.name.clone(), path))
    }
}

fn check_references(args: &Value) -> Result<()> {
    let Value::Object(map) = args else {
        return Ok(());
    };
    for key in map.keys() {
        if let Some(name) = key.strip_prefix('#') {
            if map.get(name).is_some_and(|v| !v.is_null()) {
                return Err(Error::ConflictingArgument(name.to_string()));
            }
        }
    }
    Ok(())
}
