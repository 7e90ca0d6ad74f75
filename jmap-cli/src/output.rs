// jmap-cli/src/output.rs
use jmap_rpc::error_types;
use serde::Serialize;
use std::fmt;

/// Standard JSON response envelope
#[derive(Debug, Serialize)]
pub struct Response<T> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<Meta>,
}

impl<T> Response<T> {
    pub fn ok(result: T) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
            meta: None,
        }
    }

    pub fn ok_with_meta(result: T, meta: Meta) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
            meta: Some(meta),
        }
    }

    pub fn error(error: ErrorResponse) -> Response<()> {
        Response::<()> {
            ok: false,
            result: None,
            error: Some(error),
            meta: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    type_: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retryable: Option<bool>,
}

impl ErrorResponse {
    fn new(type_: &'static str, message: String, retryable: bool) -> Self {
        Self {
            type_,
            message,
            retryable: Some(retryable),
        }
    }

    /// Classifies a command failure. Library errors get a specific type and
    /// exit code; anything else is a permanent failure.
    pub fn from_error(err: &anyhow::Error) -> (Self, ExitCode) {
        use jmap_rpc::Error;

        let message = format!("{:#}", err);
        if err.downcast_ref::<SafetyRejected>().is_some() {
            return (
                Self::new("safety_rejected", message, false),
                ExitCode::SafetyRejected,
            );
        }
        let Some(err) = err.downcast_ref::<Error>() else {
            return (Self::new("error", message, false), ExitCode::PermanentError);
        };

        let (type_, transient) = match err {
            Error::Http(_) => ("transport", true),
            Error::Status { status, .. } => ("http_status", is_transient_status(*status)),
            Error::Request(e) if e.error_type == error_types::LIMIT => ("limit", false),
            Error::Request(e) => ("request_error", is_transient_status(e.status)),
            Error::Method(e) => (
                "method_error",
                e.error_type == error_types::SERVER_UNAVAILABLE,
            ),
            Error::NoSessionEndpoint | Error::Authentication { .. } => ("authentication", false),
            Error::UnsupportedCapability(_) => ("unsupported_capability", false),
            Error::Discovery { .. } => ("discovery", false),
            Error::InvalidId(_)
            | Error::DuplicateCallId(_)
            | Error::UnknownCallId(_)
            | Error::ConflictingArgument(_) => ("validation_failed", false),
            _ => ("protocol_error", false),
        };

        let code = if transient {
            ExitCode::TransientError
        } else {
            ExitCode::PermanentError
        };
        (Self::new(type_, message, transient), code)
    }
}

/// A command refused to do something destructive without `--force`.
#[derive(Debug)]
pub struct SafetyRejected(pub String);

impl fmt::Display for SafetyRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for SafetyRejected {}

fn is_transient_status(status: u16) -> bool {
    status == 429 || status >= 500
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

/// Exit codes for agent decision making
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    TransientError = 1,
    PermanentError = 2,
    SafetyRejected = 3,
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::TransientError => write!(f, "transient_error"),
            Self::PermanentError => write!(f, "permanent_error"),
            Self::SafetyRejected => write!(f, "safety_rejected"),
        }
    }
}

impl ExitCode {
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

// Print response to stdout
pub fn print_response<T: Serialize>(resp: &Response<T>) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(resp)?);
    Ok(())
}

/// Print a styled success message
pub fn print_success(message: &str) {
    let term = console::Term::stdout();
    let _ = term.write_str(&format!("{} {}\n", console::style("✓").green(), message));
}

/// Print a styled error message
pub fn print_error(message: &str) {
    let term = console::Term::stderr();
    let _ = term.write_str(&format!("{} {}\n", console::style("Error:").red(), message));
}

/// Print a styled info/header
pub fn print_header(key: &str, value: &str) {
    let term = console::Term::stdout();
    let _ = term.write_str(&format!("{}: {}\n", console::style(key).bold(), value));
}
