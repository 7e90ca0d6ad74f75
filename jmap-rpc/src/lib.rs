// jmap-rpc/src/lib.rs
pub mod argument;
pub mod blob;
pub mod capability;
pub mod client;
pub mod core;
pub mod discover;
pub mod error;
pub mod filter;
pub mod http;
pub mod invocation;
pub mod method;
pub mod methods;
pub mod registry;
pub mod request;
pub mod response;
pub mod session;
pub mod types;

pub use argument::{Argument, ResultReference};
pub use blob::{expand_template, UploadResponse};
pub use capability::{AnyCapability, Capabilities, Capability, CapabilityRegistry};
pub use client::Client;
pub use error::{Error, MethodError, RequestError, Result, SetError};
pub use filter::{Filter, FilterOperator, Operator};
pub use http::{HttpClient, HttpError, HttpResponse};
pub use invocation::Invocation;
pub use method::{Method, MethodRegistry, MethodResponse};
pub use methods::{
    Changes, ChangesResponse, DataType, Get, GetResponse, Query, QueryChanges,
    QueryChangesResponse, QueryResponse, Set, SetResponse,
};
pub use registry::Registry;
pub use request::Request;
pub use response::Response;
pub use session::{Account, Session};
pub use types::{AddedItem, Comparator, Date, Id, IdError, PatchObject, Uri, UtcDate};

// Re-export error types separately
pub use error::error_types;

// Re-export reqwest client when feature is enabled
#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
