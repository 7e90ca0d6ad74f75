// jmap-rpc/src/response.rs
use crate::error::{Error, MethodError, Result};
use crate::invocation::Invocation;
use crate::method::{MethodRegistry, MethodResponse};
use crate::types::Id;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Decoded reply to a [`Request`](crate::Request).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Results in the order the server processed the calls.
    pub method_responses: Vec<Invocation<Box<dyn MethodResponse>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_ids: Option<HashMap<Id, Id>>,
    /// Compare with [`Session::state`](crate::Session) to detect a stale session.
    pub session_state: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResponse {
    method_responses: Vec<Value>,
    #[serde(default)]
    created_ids: Option<HashMap<Id, Id>>,
    #[serde(default)]
    session_state: String,
}

impl Response {
    /// Decodes a response body. Any invocation whose name isn't registered
    /// fails the whole response, so results always line up with the calls.
    pub fn from_slice(data: &[u8], methods: &MethodRegistry) -> Result<Self> {
        let raw: RawResponse = serde_json::from_slice(data)?;
        let method_responses = raw
            .method_responses
            .into_iter()
            .map(|inv| Invocation::decode(inv, methods))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            method_responses,
            created_ids: raw.created_ids,
            session_state: raw.session_state,
        })
    }

    /// First invocation answering `call_id`.
    pub fn invocation(&self, call_id: &str) -> Option<&Invocation<Box<dyn MethodResponse>>> {
        self.method_responses.iter().find(|inv| inv.call_id == call_id)
    }

    /// The result of type `R` for `call_id`. A call may produce several
    /// responses (eg an implicit `/set`), so all of them are searched.
    pub fn get<R: MethodResponse>(&self, call_id: &str) -> Result<&R> {
        let mut answers = self
            .method_responses
            .iter()
            .filter(|inv| inv.call_id == call_id)
            .peekable();
        if answers.peek().is_none() {
            return Err(Error::MissingResponse(call_id.to_string()));
        }

        let mut actual = None;
        for inv in answers {
            if let Some(resp) = inv.args.downcast_ref::<R>() {
                return Ok(resp);
            }
            if let Some(err) = inv.error() {
                return Err(Error::Method(err.clone()));
            }
            actual.get_or_insert_with(|| inv.name.clone());
        }
        Err(Error::UnexpectedResponse {
            call_id: call_id.to_string(),
            actual: actual.unwrap_or_default(),
        })
    }

    /// Like [`get`](Self::get), but moves the result out of the response.
    pub fn take<R: MethodResponse>(&mut self, call_id: &str) -> Result<R> {
        self.get::<R>(call_id)?;
        let pos = self
            .method_responses
            .iter()
            .position(|inv| inv.call_id == call_id && inv.args.is::<R>())
            .ok_or_else(|| Error::MissingResponse(call_id.to_string()))?;
        let inv = self.method_responses.remove(pos);
        let name = inv.name;
        inv.args
            .downcast::<R>()
            .map(|resp| *resp)
            .ok_or_else(|| Error::UnexpectedResponse {
                call_id: call_id.to_string(),
                actual: name,
            })
    }

    /// Call ids and errors of every invocation the server failed.
    pub fn method_errors(&self) -> impl Iterator<Item = (&str, &MethodError)> {
        self.method_responses
            .iter()
            .filter_map(|inv| inv.error().map(|err| (inv.call_id.as_str(), err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Echo;
    use crate::registry::Registry;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Test {
        #[serde(rename = "Hello")]
        hello: String,
    }

    fn registry() -> Registry {
        let registry = Registry::default();
        registry.register_method::<Test>("Test/method");
        registry
    }

    #[test]
    fn test_unmarshal() {
        let data = br#"{"sessionState":"state","methodResponses":[["Test/method",{"Hello":"world"},"0"]]}"#;
        let resp = Response::from_slice(data, registry().methods()).unwrap();

        assert_eq!(resp.session_state, "state");
        assert_eq!(resp.method_responses.len(), 1);
        let inv = &resp.method_responses[0];
        assert_eq!(inv.name, "Test/method");
        assert_eq!(inv.call_id, "0");
        assert_eq!(resp.get::<Test>("0").unwrap().hello, "world");
    }

    #[test]
    fn test_round_trip() {
        let data = br#"{"sessionState":"s1","methodResponses":[["Test/method",{"Hello":"world"},"0"]]}"#;
        let resp = Response::from_slice(data, registry().methods()).unwrap();

        let original: Value = serde_json::from_slice(data).unwrap();
        assert_eq!(serde_json::to_value(&resp).unwrap(), original);
        assert_eq!(
            serde_json::to_string(&resp).unwrap(),
            r#"{"methodResponses":[["Test/method",{"Hello":"world"},"0"]],"sessionState":"s1"}"#
        );
    }

    #[test]
    fn test_unknown_method_fails_whole_response() {
        let data = br#"{"sessionState":"s","methodResponses":[
            ["Test/method",{"Hello":"a"},"0"],
            ["Foo/bar",{},"1"]
        ]}"#;
        let err = Response::from_slice(data, registry().methods()).unwrap_err();
        assert!(matches!(err, Error::UnknownMethod(name) if name == "Foo/bar"));
    }

    #[test]
    fn test_method_error_is_typed() {
        let data = br#"{"sessionState":"s","methodResponses":[
            ["Core/echo",{"ok":true},"0"],
            ["error",{"type":"invalidArguments","description":"bad"},"1"]
        ]}"#;
        let resp = Response::from_slice(data, registry().methods()).unwrap();

        assert!(resp.get::<Echo>("0").is_ok());
        match resp.get::<Echo>("1").unwrap_err() {
            Error::Method(err) => {
                assert_eq!(err.error_type, "invalidArguments");
                assert_eq!(err.description.as_deref(), Some("bad"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let errors: Vec<_> = resp.method_errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, "1");
    }

    #[test]
    fn test_get_wrong_type_and_missing() {
        let data = br#"{"sessionState":"s","methodResponses":[["Core/echo",{},"0"]]}"#;
        let resp = Response::from_slice(data, registry().methods()).unwrap();

        match resp.get::<Test>("0").unwrap_err() {
            Error::UnexpectedResponse { call_id, actual } => {
                assert_eq!(call_id, "0");
                assert_eq!(actual, "Core/echo");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(resp.get::<Echo>("9"), Err(Error::MissingResponse(_))));
    }

    #[test]
    fn test_take_searches_every_answer() {
        let data = br#"{"sessionState":"s","methodResponses":[
            ["Core/echo",{"first":1},"0"],
            ["Test/method",{"Hello":"implicit"},"0"]
        ],"createdIds":{"k1":"M1"}}"#;
        let mut resp = Response::from_slice(data, registry().methods()).unwrap();

        assert_eq!(resp.created_ids.as_ref().unwrap()["k1"], Id::from("M1"));
        let test = resp.take::<Test>("0").unwrap();
        assert_eq!(test.hello, "implicit");
        assert_eq!(resp.method_responses.len(), 1);
        assert!(resp.take::<Test>("0").is_err());
    }
}
