//! The shared HTTP client.
//!
//! One `reqwest::Client` for every service, one [`Session`] holding the bearer
//! token. Cloning an [`ApiClient`] is cheap and clones share the session, so
//! signing out through one handle signs out all of them.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ServiceUrls;
use crate::error::ApiError;

/// Backend service a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Catalog,
    Orders,
    Users,
    Zones,
    Routes,
    Notifications,
    Cart,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Service::Catalog => "catalog",
            Service::Orders => "orders",
            Service::Users => "users",
            Service::Zones => "zones",
            Service::Routes => "routes",
            Service::Notifications => "notifications",
            Service::Cart => "cart",
        };
        f.write_str(name)
    }
}

/// Per-request switches.
#[derive(Debug, Clone, Copy)]
pub struct RequestOptions {
    /// Attach the bearer token (when one is present).
    pub auth: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self { auth: true }
    }
}

impl RequestOptions {
    /// For sign-in and other public endpoints.
    pub fn anonymous() -> Self {
        Self { auth: false }
    }
}

/// Notified when the backend rejects the token (forced sign-out).
pub trait SessionListener: Send + Sync {
    fn session_expired(&self);
}

#[derive(Default)]
struct SessionInner {
    token: Option<String>,
    listener: Option<Arc<dyn SessionListener>>,
}

/// Bearer token shared by every clone of an [`ApiClient`].
#[derive(Clone, Default)]
pub struct Session {
    inner: Arc<RwLock<SessionInner>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl Session {
    pub fn token(&self) -> Option<String> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).token.clone()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).token = Some(token.into());
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).token.is_some()
    }

    pub fn set_listener(&self, listener: Arc<dyn SessionListener>) {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).listener = Some(listener);
    }

    /// Voluntary sign-out. The listener is not called.
    pub fn sign_out(&self) {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).token = None;
    }

    /// Drop the token and tell the listener. Called on any 401.
    pub(crate) fn expire(&self) {
        let listener = {
            let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            inner.token = None;
            inner.listener.clone()
        };
        // Outside the lock: the listener may well read the session.
        if let Some(listener) = listener {
            listener.session_expired();
        }
    }
}

/// Authenticated JSON client for all backend services.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    urls: Arc<ServiceUrls>,
    session: Session,
}

impl ApiClient {
    pub fn new(urls: ServiceUrls) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("reparto/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_http(http, urls))
    }

    pub fn with_http(http: reqwest::Client, urls: ServiceUrls) -> Self {
        Self {
            http,
            urls: Arc::new(urls),
            session: Session::default(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Full URL of `path` on `service`.
    pub fn url(&self, service: Service, path: &str) -> String {
        let base = match service {
            Service::Catalog => &self.urls.catalog,
            Service::Orders => &self.urls.orders,
            Service::Users => &self.urls.users,
            Service::Zones => &self.urls.zones,
            Service::Routes => &self.urls.routes,
            Service::Notifications => &self.urls.notifications,
            Service::Cart => &self.urls.cart,
        };
        format!("{}{}", base.trim_end_matches('/'), path)
    }

    pub async fn get<T: DeserializeOwned>(&self, service: Service, path: &str) -> Result<T, ApiError> {
        self.request::<(), T>(Method::GET, service, path, None, RequestOptions::default())
            .await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        service: Service,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::POST, service, path, Some(body), RequestOptions::default())
            .await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        service: Service,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::PUT, service, path, Some(body), RequestOptions::default())
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, service: Service, path: &str) -> Result<T, ApiError> {
        self.request::<(), T>(Method::DELETE, service, path, None, RequestOptions::default())
            .await
    }

    /// Issue a request and decode the JSON response.
    ///
    /// Failures are logged here with the call site (service, method, url) and
    /// then returned to the caller unchanged.
    pub async fn request<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        service: Service,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let url = self.url(service, path);
        let result = self.send(method.clone(), &url, body, options).await;

        if let Err(err) = &result {
            tracing::warn!(%service, %method, %url, error = %err, "api request failed");
        }
        result
    }

    async fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let mut request: RequestBuilder = self.http.request(method, url);
        if options.auth {
            if let Some(token) = self.session.token() {
                request = request.bearer_auth(token);
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            tracing::info!(url, "session rejected by backend, signing out");
            self.session.expire();
            return Err(ApiError::SessionExpired);
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: backend_message(&text),
            });
        }

        decode_body(&text)
    }
}

/// Decode a success body. An empty body reads as JSON `null`, so `()` and
/// `Option<T>` callers accept 204 responses.
fn decode_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    let text = if text.trim().is_empty() { "null" } else { text };
    Ok(serde_json::from_str(text)?)
}

/// Pull the human message out of an error body.
///
/// Backends answer `{"message": ...}`, `{"error": ...}` or `{"detail": ...}`;
/// validation errors sometimes carry a list of messages. Anything else is
/// returned as raw text.
fn backend_message(text: &str) -> String {
    let Ok(Value::Object(body)) = serde_json::from_str::<Value>(text) else {
        return text.trim().to_string();
    };

    for key in ["message", "error", "detail"] {
        match body.get(key) {
            Some(Value::String(message)) => return message.clone(),
            Some(Value::Array(items)) => {
                let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                if !parts.is_empty() {
                    return parts.join(", ");
                }
            }
            _ => {}
        }
    }
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn urls_join_base_and_path() {
        let client = ApiClient::with_http(
            reqwest::Client::new(),
            ServiceUrls::all("https://api.example.cl/"),
        );
        assert_eq!(client.url(Service::Catalog, "/skus/7/precio"), "https://api.example.cl/skus/7/precio");
        assert_eq!(client.url(Service::Zones, "/zones/3"), "https://api.example.cl/zones/3");
    }

    #[test]
    fn backend_message_shapes() {
        assert_eq!(backend_message(r#"{"message":"Stock insuficiente"}"#), "Stock insuficiente");
        assert_eq!(backend_message(r#"{"error":"Forbidden"}"#), "Forbidden");
        assert_eq!(backend_message(r#"{"message":["name is required","qty must be positive"]}"#), "name is required, qty must be positive");
        assert_eq!(backend_message(r#"{"statusCode":500}"#), r#"{"statusCode":500}"#);
        assert_eq!(backend_message(" Bad Gateway \n"), "Bad Gateway");
    }

    #[test]
    fn empty_body_decodes_as_unit() {
        decode_body::<()>("").unwrap();
        assert_eq!(decode_body::<Option<u32>>("  ").unwrap(), None);
        assert_eq!(decode_body::<u32>("7").unwrap(), 7);
        assert!(decode_body::<u32>("{").is_err());
    }

    struct Counter(AtomicUsize);

    impl SessionListener for Counter {
        fn session_expired(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn expiry_clears_token_and_notifies() {
        let session = Session::default();
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        session.set_listener(counter.clone());
        session.set_token("t0k3n");

        let shared = session.clone();
        shared.expire();

        assert!(!session.is_authenticated());
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);

        session.set_token("again");
        session.sign_out();
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }
}
