// jmap-rpc/src/http/reqwest.rs
use super::{HttpClient, HttpError, HttpResponse};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

enum Auth {
    None,
    Bearer(String),
    Basic { username: String, password: String },
}

pub struct ReqwestClient {
    inner: reqwest::Client,
    auth: Auth,
}

impl ReqwestClient {
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
            auth: Auth::None,
        }
    }

    pub fn with_client(mut self, inner: reqwest::Client) -> Self {
        self.inner = inner;
        self
    }

    pub fn with_token(mut self, token: String) -> Self {
        self.auth = Auth::Bearer(token);
        self
    }

    pub fn with_basic_auth(mut self, username: String, password: String) -> Self {
        self.auth = Auth::Basic { username, password };
        self
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Auth::None => req,
            Auth::Bearer(token) => req.bearer_auth(token),
            Auth::Basic { username, password } => req.basic_auth(username, Some(password)),
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<HttpResponse, HttpError> {
        let resp = self.authorize(req).send().await.map_err(|e| HttpError {
            status: None,
            message: e.to_string(),
        })?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body = resp
            .bytes()
            .await
            .map_err(|e| HttpError {
                status: Some(status),
                message: e.to_string(),
            })?
            .to_vec();

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        self.send(self.inner.get(url)).await
    }

    async fn post(
        &self,
        url: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<HttpResponse, HttpError> {
        let req = self
            .inner
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(body);
        self.send(req).await
    }
}
