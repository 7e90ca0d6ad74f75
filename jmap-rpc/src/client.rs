// jmap-rpc/src/client.rs
use crate::blob::UploadResponse;
use crate::error::{Error, RequestError, Result};
use crate::http::{HttpClient, HttpResponse};
use crate::registry::Registry;
use crate::request::Request;
use crate::response::Response;
use crate::session::Session;
use std::sync::{Arc, PoisonError, RwLock};

/// A JMAP client over any [`HttpClient`].
///
/// The session is fetched on first use (or by [`authenticate`](Self::authenticate))
/// and then reused until the caller authenticates again. A client can be
/// shared between tasks.
pub struct Client<C: HttpClient> {
    http: C,
    registry: Arc<Registry>,
    session_endpoint: Option<String>,
    session: RwLock<Option<Arc<Session>>>,
}

impl<C: HttpClient> Client<C> {
    /// A client using the default registry (Core only).
    pub fn new(http: C) -> Self {
        Self::with_registry(http, Arc::new(Registry::default()))
    }

    pub fn with_registry(http: C, registry: Arc<Registry>) -> Self {
        Self {
            http,
            registry,
            session_endpoint: None,
            session: RwLock::new(None),
        }
    }

    /// URL of the session resource, eg `https://example.com/.well-known/jmap`.
    pub fn with_session_endpoint(mut self, url: impl Into<String>) -> Self {
        self.session_endpoint = Some(url.into());
        self
    }

    /// Starts out with an already fetched session.
    pub fn with_session(self, session: Session) -> Self {
        self.set_session(Arc::new(session));
        self
    }

    /// Finds the session endpoint through DNS SRV and authenticates against
    /// the first candidate that answers.
    #[cfg(feature = "srv")]
    pub async fn discover(mut self, domain: &str) -> Result<Self> {
        let mut last_err = None;
        for url in crate::discover::discover(domain).await? {
            self.session_endpoint = Some(url);
            match self.authenticate().await {
                Ok(_) => return Ok(self),
                Err(e) => {
                    log::debug!("discovery candidate failed: {}", e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| Error::Discovery {
            domain: domain.to_string(),
            message: "no usable session endpoint".to_string(),
        }))
    }

    pub fn http(&self) -> &C {
        &self.http
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn session_endpoint(&self) -> Option<&str> {
        self.session_endpoint.as_deref()
    }

    /// The current session, if one has been fetched.
    pub fn session(&self) -> Option<Arc<Session>> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_session(&self, session: Arc<Session>) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    /// Fetches the session, replacing any held one. Concurrent calls may
    /// both fetch; the last to finish wins.
    pub async fn authenticate(&self) -> Result<Arc<Session>> {
        let endpoint = self
            .session_endpoint
            .as_deref()
            .ok_or(Error::NoSessionEndpoint)?;

        log::debug!("fetching session from {}", endpoint);
        let resp = self.http.get(endpoint).await?;
        if !resp.is_ok() {
            return Err(Error::Authentication {
                status: resp.status,
            });
        }

        let session = Arc::new(Session::from_slice(
            &resp.body,
            self.registry.capabilities(),
        )?);
        log::debug!(
            "session for '{}' has {} accounts, state {}",
            session.username,
            session.accounts.len(),
            session.state
        );
        self.set_session(session.clone());
        Ok(session)
    }

    /// The cached session, fetching it only if none is held yet.
    pub async fn current_session(&self) -> Result<Arc<Session>> {
        match self.session() {
            Some(session) => Ok(session),
            None => self.authenticate().await,
        }
    }

    /// Sends a request to the API endpoint.
    ///
    /// Capabilities the session doesn't advertise are rejected before
    /// anything is sent. Method errors come back inside the [`Response`].
    pub async fn execute(&self, request: &Request) -> Result<Response> {
        let session = self.current_session().await?;
        if let Some(uri) = request
            .using()
            .iter()
            .find(|uri| !session.supports(uri.as_str()))
        {
            return Err(Error::UnsupportedCapability(uri.clone()));
        }

        let body = serde_json::to_vec(request)?;
        log::debug!(
            "POST {} ({} calls, using {:?})",
            session.api_url,
            request.len(),
            request.using()
        );
        let resp = self.http.post_json(&session.api_url, body).await?;
        if !resp.is_ok() {
            return Err(request_error(resp));
        }

        let response = Response::from_slice(&resp.body, self.registry.methods())?;
        if response.session_state != session.state {
            log::debug!(
                "session state changed from {} to {}",
                session.state,
                response.session_state
            );
        }
        Ok(response)
    }

    /// Uploads a blob to `account_id`.
    pub async fn upload(
        &self,
        account_id: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<UploadResponse> {
        let session = self.current_session().await?;
        let url = session.upload_url_for(account_id)?;

        log::debug!("uploading {} bytes to {}", data.len(), url);
        let resp = self.http.post(&url, content_type, data).await?;
        if !is_success(&resp) {
            return Err(request_error(resp));
        }
        Ok(serde_json::from_slice(&resp.body)?)
    }

    /// Downloads a blob. `name` and `media_type` only shape the server's
    /// `Content-Disposition` and `Content-Type`.
    pub async fn download(
        &self,
        account_id: &str,
        blob_id: &str,
        media_type: &str,
        name: &str,
    ) -> Result<Vec<u8>> {
        let session = self.current_session().await?;
        let url = session.download_url_for(account_id, blob_id, media_type, name)?;

        log::debug!("downloading {}", url);
        let resp = self.http.get(&url).await?;
        if !is_success(&resp) {
            return Err(request_error(resp));
        }
        Ok(resp.body)
    }
}

fn is_success(resp: &HttpResponse) -> bool {
    (200..300).contains(&resp.status)
}

/// Problem document if the body is one, otherwise the bare status.
fn request_error(resp: HttpResponse) -> Error {
    if resp.is_json() {
        if let Ok(mut err) = serde_json::from_slice::<RequestError>(&resp.body) {
            if err.status == 0 {
                err.status = resp.status;
            }
            return Error::Request(err);
        }
    }
    log::warn!(
        "HTTP {} without a JMAP problem document ({})",
        resp.status,
        resp.content_type.as_deref().unwrap_or("no content type")
    );
    Error::Status {
        status: resp.status,
        body: String::from_utf8_lossy(&resp.body).into_owned(),
    }
}
