// jmap-rpc/src/http/mod.rs
use async_trait::async_trait;

/// Transport-level failure: the request never produced an HTTP response, or
/// its body couldn't be read.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub status: Option<u16>,
    pub message: String,
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(status) = self.status {
            write!(f, "HTTP error {}: {}", status, self.message)
        } else {
            write!(f, "HTTP error: {}", self.message)
        }
    }
}

impl std::error::Error for HttpError {}

/// A complete HTTP response, whatever its status.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// True for `application/json` and `application/problem+json`, ignoring
    /// parameters such as `charset`.
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|mime| {
                let mime = mime.trim();
                mime.eq_ignore_ascii_case("application/json")
                    || mime.eq_ignore_ascii_case("application/problem+json")
            })
            .unwrap_or(false)
    }
}

/// Generic HTTP client trait - users can implement their own. Implementations
/// own authentication; the JMAP client never builds auth headers itself.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError>;

    async fn post(
        &self,
        url: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<HttpResponse, HttpError>;

    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<HttpResponse, HttpError> {
        self.post(url, "application/json", body).await
    }
}

#[cfg(feature = "reqwest")]
pub mod reqwest;

#[cfg(feature = "reqwest")]
pub use self::reqwest::ReqwestClient;

#[cfg(test)]
mod tests {
    use super::*;

    fn response(content_type: Option<&str>) -> HttpResponse {
        HttpResponse {
            status: 400,
            content_type: content_type.map(String::from),
            body: Vec::new(),
        }
    }

    #[test]
    fn test_is_json() {
        assert!(response(Some("application/json")).is_json());
        assert!(response(Some("application/json; charset=utf-8")).is_json());
        assert!(response(Some("application/problem+json")).is_json());
        assert!(!response(Some("text/html")).is_json());
        assert!(!response(None).is_json());
    }

    #[test]
    fn test_http_error_display() {
        let err = HttpError {
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error: connection refused");
    }
}
