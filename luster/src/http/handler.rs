//! Low-level HTTP transport.
//!
//! [`HttpHandler`] owns one pooled `reqwest` client and attaches the
//! credential header to every request. The endpoint methods live in
//! [`crate::api`] as traits implemented on this type.

use std::fmt::{self, Debug, Formatter};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use reqwest::{multipart, Client, ClientBuilder, Method, Proxy, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    config::{ClientConfig, Credentials},
    error::{handle_api_error, LusterError},
    types::error_types::Error as ApiError,
    util::build_url,
};

pub const USER_AGENT: &str = concat!(
    "luster (https://github.com/nerdguyahmad/luster, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Performs authenticated requests against the REST API and Autumn.
#[derive(Clone)]
pub struct HttpHandler {
    config: Arc<ClientConfig>,
    http: Client,
    credentials: Arc<Mutex<Credentials>>,
    closed: Arc<AtomicBool>,
}

impl Debug for HttpHandler {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpHandler")
            .field("api_url", &self.config.api_url)
            .field("autumn_url", &self.config.autumn_url)
            .field("proxy", &self.config.proxy)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Build a handler for the public instance with default settings.
pub fn create_http_handler(token: impl Into<String>, bot: bool) -> Result<HttpHandler, LusterError> {
    HttpHandler::new(ClientConfig::default(), Credentials::new(token, bot))
}

impl HttpHandler {
    pub fn new(config: ClientConfig, credentials: Credentials) -> Result<Self, LusterError> {
        let mut builder = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .use_rustls_tls();

        if let Some(proxy_url) = config.proxy_url()? {
            let proxy = Proxy::all(proxy_url.as_str()).map_err(|e| {
                LusterError::InvalidConfig(format!("invalid proxy URL `{proxy_url}`: {e}"))
            })?;
            builder = builder.proxy(proxy);
        }

        let http = builder.build()?;

        Ok(Self {
            config: Arc::new(config),
            http,
            credentials: Arc::new(Mutex::new(credentials)),
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn credentials(&self) -> Credentials {
        self.credentials.lock().await.clone()
    }

    pub async fn set_credentials(&self, credentials: Credentials) {
        *self.credentials.lock().await = credentials;
    }

    /// Replace the token, keeping the account kind.
    pub async fn set_token(&self, token: impl Into<String>) {
        let mut guard = self.credentials.lock().await;
        *guard = Credentials::new(token, guard.is_bot());
    }

    /// Mark the handler as closed; every later request fails with
    /// [`LusterError::Closed`]. Idempotent.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("HTTP handler closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// URL of a REST route.
    pub fn api_url(&self, segments: &[&str]) -> String {
        build_url(&self.config.api_url, segments)
    }

    /// URL of an Autumn route.
    pub fn autumn_url(&self, segments: &[&str]) -> String {
        build_url(&self.config.autumn_url, segments)
    }

    /// Build an authenticated `reqwest::RequestBuilder`.
    async fn authed_request(
        &self,
        method: Method,
        url: &str,
        extra_headers: Option<&[(&str, &str)]>,
    ) -> Result<RequestBuilder, LusterError> {
        if self.is_closed() {
            return Err(LusterError::Closed);
        }

        let credentials = self.credentials.lock().await.clone();
        debug!(%method, url, "sending request");

        let mut req = self
            .http
            .request(method, url)
            .header("Accept", "application/json")
            .header(credentials.header_name(), credentials.token());

        if let Some(hdrs) = extra_headers {
            for (k, v) in hdrs {
                req = req.header(*k, *v);
            }
        }

        Ok(req)
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, LusterError> {
        req.send().await.map_err(LusterError::ReqwestError)
    }

    /* ───────────── Convenience wrappers around HTTP verbs ───────────── */

    pub async fn authed_get(
        &self,
        url: &str,
        extra_headers: Option<&[(&str, &str)]>,
    ) -> Result<Response, LusterError> {
        let req = self.authed_request(Method::GET, url, extra_headers).await?;
        self.send(req).await
    }

    pub async fn authed_post<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        extra_headers: Option<&[(&str, &str)]>,
    ) -> Result<Response, LusterError> {
        let req = self.authed_request(Method::POST, url, extra_headers).await?;
        self.send(req.json(body)).await
    }

    pub async fn authed_post_empty(
        &self,
        url: &str,
        extra_headers: Option<&[(&str, &str)]>,
    ) -> Result<Response, LusterError> {
        let req = self.authed_request(Method::POST, url, extra_headers).await?;
        self.send(req).await
    }

    pub async fn authed_post_multipart(
        &self,
        url: &str,
        form: multipart::Form,
    ) -> Result<Response, LusterError> {
        let req = self.authed_request(Method::POST, url, None).await?;
        self.send(req.multipart(form)).await
    }

    pub async fn authed_patch<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        extra_headers: Option<&[(&str, &str)]>,
    ) -> Result<Response, LusterError> {
        let req = self.authed_request(Method::PATCH, url, extra_headers).await?;
        self.send(req.json(body)).await
    }

    pub async fn authed_delete(
        &self,
        url: &str,
        extra_headers: Option<&[(&str, &str)]>,
    ) -> Result<Response, LusterError> {
        let req = self.authed_request(Method::DELETE, url, extra_headers).await?;
        self.send(req).await
    }

    pub async fn authed_delete_with_query<Q: Serialize + ?Sized>(
        &self,
        url: &str,
        query: &Q,
        extra_headers: Option<&[(&str, &str)]>,
    ) -> Result<Response, LusterError> {
        let req = self.authed_request(Method::DELETE, url, extra_headers).await?;
        self.send(req.query(query)).await
    }
}

/// Turn a non-2xx response into an error, parsing the API error body when
/// possible.
fn status_error(status: u16, bytes: &[u8]) -> LusterError {
    if let Ok(api_err) = serde_json::from_slice::<ApiError>(bytes) {
        return handle_api_error(status, api_err);
    }

    LusterError::HttpStatus {
        code: status,
        body: String::from_utf8_lossy(bytes).to_string(),
    }
}

/// Parse the body as JSON **iff** the response status is success.
pub async fn parse_json_if_ok<T: DeserializeOwned>(resp: Response) -> Result<T, LusterError> {
    let status = resp.status();
    let bytes = resp.bytes().await.map_err(LusterError::ReqwestError)?;

    if !status.is_success() {
        return Err(status_error(status.as_u16(), &bytes));
    }

    serde_json::from_slice::<T>(&bytes).map_err(LusterError::SerdeError)
}

/// Check the status of a response whose body is not needed (usually `204`).
pub async fn expect_success(resp: Response) -> Result<(), LusterError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }

    let bytes = resp.bytes().await.map_err(LusterError::ReqwestError)?;
    Err(status_error(status.as_u16(), &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_prefers_api_body() {
        let err = status_error(403, br#"{"type":"NotOwner"}"#);
        assert!(err.is_forbidden());
        assert!(err.api_error().is_some());

        let err = status_error(502, b"bad gateway");
        assert!(matches!(err, LusterError::HttpStatus { code: 502, ref body } if body == "bad gateway"));
    }

    #[tokio::test]
    async fn closed_handler_refuses_requests() {
        let http = create_http_handler("t", true).unwrap();
        http.close();
        http.close();
        assert!(http.is_closed());
        let res = http.authed_get("http://127.0.0.1:9/", None).await;
        assert!(matches!(res, Err(LusterError::Closed)));
    }

    #[tokio::test]
    async fn set_token_keeps_account_kind() {
        let http = create_http_handler("old", false).unwrap();
        http.set_token("new").await;
        assert_eq!(http.credentials().await, Credentials::User("new".into()));
    }
}
