//! API client with CSRF header injection and one-shot session recovery.

use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::cookie::Jar;
use reqwest::header::HeaderName;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::audit::{self, LogFields, LogSink, TracingLogSink};
use crate::config::ClientConfig;
use crate::cookies::{CookieStore, JarCookies};
use crate::i18n::{Catalog, SESSION_EXPIRED_KEY, SESSION_REFRESH_FAILED_KEY, Translator};
use crate::notify::{Notifier, ToastKind};
use crate::runtime::{LogNavigator, MemoryStorage, Navigator, Storage};
use crate::session::{MemorySessionStore, SessionStore};

use super::error::{ApiError, ErrorBody};
use super::interceptor::attach_csrf;
use super::recovery::{PendingRequest, Recovery};
use super::request::{ApiRequest, ApiResponse};

/// HTTP client that keeps the backend session alive.
///
/// Mutating requests carry the CSRF cookie as a header. A rejected CSRF token or a
/// 401 triggers one token fetch or session refresh followed by one replay of the
/// original request. Every other failure is shown to the user once and returned.
#[derive(Clone)]
pub struct SessionClient {
    client: Client,
    config: Arc<ClientConfig>,
    csrf_header: HeaderName,
    cookies: Arc<dyn CookieStore>,
    notifier: Arc<dyn Notifier>,
    translator: Arc<dyn Translator>,
    log: Arc<dyn LogSink>,
    session: Arc<dyn SessionStore>,
    storage: Arc<dyn Storage>,
    navigator: Arc<dyn Navigator>,
}

pub struct SessionClientBuilder {
    config: ClientConfig,
    notifier: Arc<dyn Notifier>,
    jar: Option<Arc<Jar>>,
    cookies: Option<Arc<dyn CookieStore>>,
    translator: Option<Arc<dyn Translator>>,
    log: Option<Arc<dyn LogSink>>,
    session: Option<Arc<dyn SessionStore>>,
    storage: Option<Arc<dyn Storage>>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl SessionClientBuilder {
    /// Cookie jar installed on the underlying reqwest client.
    pub fn cookie_jar(mut self, jar: Arc<Jar>) -> Self {
        self.jar = Some(jar);
        self
    }

    /// Where the CSRF token is read from. Defaults to the cookie jar.
    pub fn cookie_store(mut self, cookies: Arc<dyn CookieStore>) -> Self {
        self.cookies = Some(cookies);
        self
    }

    /// Message catalog used to render notification keys.
    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Destination for request/response events.
    pub fn log_sink(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = Some(log);
        self
    }

    /// Session state reset on forced logout.
    pub fn session_store(mut self, session: Arc<dyn SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    /// Local storage wiped on forced logout.
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Where the user is sent after a forced logout.
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn build(self) -> Result<SessionClient> {
        let base_url = self.config.validate()?;
        let csrf_header = self.config.header_name()?;
        let jar = self.jar.unwrap_or_default();

        let mut builder = Client::builder()
            .user_agent(self.config.user_agent.as_str())
            .cookie_provider(Arc::clone(&jar));
        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        let cookies: Arc<dyn CookieStore> = match self.cookies {
            Some(cookies) => cookies,
            None => Arc::new(JarCookies::new(jar, base_url)),
        };

        let translator: Arc<dyn Translator> = match (self.translator, &self.config.messages) {
            (Some(translator), _) => translator,
            (None, Some(path)) => Arc::new(Catalog::load(path)?),
            (None, None) => Arc::new(Catalog::default()),
        };

        Ok(SessionClient {
            client,
            config: Arc::new(self.config),
            csrf_header,
            cookies,
            notifier: self.notifier,
            translator,
            log: self.log.unwrap_or_else(|| Arc::new(TracingLogSink)),
            session: self
                .session
                .unwrap_or_else(|| Arc::new(MemorySessionStore::default())),
            storage: self
                .storage
                .unwrap_or_else(|| Arc::new(MemoryStorage::default())),
            navigator: self
                .navigator
                .unwrap_or_else(|| Arc::new(LogNavigator::default())),
        })
    }
}

impl SessionClient {
    /// Starts building a client. The notifier is required so failures always have
    /// somewhere to go.
    pub fn builder(config: ClientConfig, notifier: Arc<dyn Notifier>) -> SessionClientBuilder {
        SessionClientBuilder {
            config,
            notifier,
            jar: None,
            cookies: None,
            translator: None,
            log: None,
            session: None,
            storage: None,
            navigator: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cookies(&self) -> Arc<dyn CookieStore> {
        Arc::clone(&self.cookies)
    }

    pub fn session(&self) -> Arc<dyn SessionStore> {
        Arc::clone(&self.session)
    }

    /// Sends `request`, recovering the session at most once per failure kind.
    ///
    /// Errors are the original failure, except when fetching a new CSRF token
    /// fails, in which case that failure is returned.
    #[tracing::instrument(skip(self, request), fields(method = %request.method(), path = %request.path()))]
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let endpoint = self.config.endpoint_of(request.path());
        let mut pending = PendingRequest::new(request);

        loop {
            let error = match self.dispatch(pending.request()).await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            match pending.recover(error.kind(), endpoint) {
                Recovery::RefreshCsrf => {
                    debug!("CSRF token rejected, fetching a new one");
                    if let Err(refresh_error) = self.refresh_csrf().await {
                        warn!("CSRF token refresh failed: {}", refresh_error);
                        self.notify(SESSION_REFRESH_FAILED_KEY, ToastKind::Error);
                        return Err(refresh_error);
                    }
                }
                Recovery::RefreshAuth => {
                    debug!("Unauthorized, refreshing session");
                    if let Err(refresh_error) = self.refresh_auth().await {
                        warn!("Session refresh failed: {}", refresh_error);
                        self.force_logout().await;
                        return Err(error);
                    }
                }
                Recovery::SessionExpired => {
                    self.notify(SESSION_EXPIRED_KEY, ToastKind::Warning);
                    return Err(error);
                }
                Recovery::ForceLogout => {
                    self.force_logout().await;
                    return Err(error);
                }
                Recovery::Surface(key) => {
                    debug!("Request failed: {}", error);
                    self.notify(&key, ToastKind::Error);
                    return Err(error);
                }
            }

            debug!(
                "Replaying {} {} ({:?})",
                pending.request().method(),
                pending.request().path(),
                pending.retry()
            );
        }
    }

    /// Sends a GET request.
    pub async fn get(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.execute(ApiRequest::get(path)).await
    }

    /// Sends a POST request with a JSON body.
    pub async fn post(&self, path: &str, body: Value) -> Result<ApiResponse, ApiError> {
        self.execute(ApiRequest::post(path).with_json(body)).await
    }

    /// Sends a PUT request with a JSON body.
    pub async fn put(&self, path: &str, body: Value) -> Result<ApiResponse, ApiError> {
        self.execute(ApiRequest::put(path).with_json(body)).await
    }

    /// Sends a PATCH request with a JSON body.
    pub async fn patch(&self, path: &str, body: Value) -> Result<ApiResponse, ApiError> {
        self.execute(ApiRequest::patch(path).with_json(body)).await
    }

    /// Sends a DELETE request.
    pub async fn delete(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.execute(ApiRequest::delete(path)).await
    }

    /// Performs a GET request and deserializes the JSON response.
    #[tracing::instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.get(path).await?;
        response
            .json::<T>()
            .with_context(|| format!("Failed to parse JSON response from {}", path))
    }

    /// Asks the backend for a CSRF token and returns the cookie it set.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_csrf_token(&self) -> Result<Option<String>, ApiError> {
        self.execute(ApiRequest::post(self.config.csrf_path.as_str()))
            .await?;
        Ok(self.cookies.get(&self.config.csrf_cookie))
    }

    async fn refresh_csrf(&self) -> Result<(), ApiError> {
        self.dispatch(&ApiRequest::post(self.config.csrf_path.as_str()))
            .await
            .map(|_| ())
    }

    async fn refresh_auth(&self) -> Result<(), ApiError> {
        self.dispatch(&ApiRequest::post(self.config.refresh_path.as_str()))
            .await
            .map(|_| ())
    }

    /// Tears down all local session state and sends the user to sign in.
    async fn force_logout(&self) {
        warn!("Session could not be renewed, logging out");

        self.storage.clear();
        self.cookies.clear(&self.config.csrf_cookie);
        self.session.logout();

        if let Err(e) = self
            .dispatch(&ApiRequest::post(self.config.logout_path.as_str()))
            .await
        {
            debug!("Server logout failed: {}", e);
        }

        self.notify(SESSION_EXPIRED_KEY, ToastKind::Warning);
        self.navigator.redirect(&self.config.login_route);
    }

    fn notify(&self, key: &str, kind: ToastKind) {
        let message = self.translator.translate(key);
        self.notifier.show(&message, kind);
    }

    /// One round trip: CSRF header, send, read body, log. No recovery.
    async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let method = request.method().clone();

        let url = match self.config.url_for(request.path()) {
            Ok(url) => url,
            Err(e) => {
                let error = ApiError::Unexpected(e);
                self.log.error(
                    "http.error",
                    &error_fields(&method, request.path(), &error),
                );
                return Err(error);
            }
        };

        let mut headers = request.headers().clone();
        attach_csrf(
            &mut headers,
            &method,
            self.cookies.as_ref(),
            &self.config.csrf_cookie,
            &self.csrf_header,
        );

        self.log
            .info("http.request", &request_fields(&method, url.as_str()));

        let mut builder = self
            .client
            .request(method.clone(), url.clone())
            .headers(headers);
        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let result = read_response(builder, &method, &url).await;
        match &result {
            Ok(response) => self.log.info(
                "http.response",
                &response_fields(&method, url.as_str(), response.status()),
            ),
            Err(error) => self
                .log
                .error("http.error", &error_fields(&method, url.as_str(), error)),
        }
        result
    }
}

async fn read_response(
    builder: RequestBuilder,
    method: &Method,
    url: &Url,
) -> Result<ApiResponse, ApiError> {
    let transport =
        |source: reqwest::Error| ApiError::from_transport(method.clone(), url.to_string(), source);

    let response = builder.send().await.map_err(transport)?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await.map_err(transport)?.to_vec();

    if status.is_success() {
        Ok(ApiResponse::new(status, headers, body))
    } else {
        Err(ApiError::Status {
            method: method.clone(),
            url: url.to_string(),
            status,
            body: ErrorBody::parse(&body),
        })
    }
}

fn request_fields(method: &Method, url: &str) -> LogFields {
    let mut fields = audit::fields();
    fields.insert("method".to_string(), Value::from(method.as_str()));
    fields.insert("url".to_string(), Value::from(url));
    fields
}

fn response_fields(method: &Method, url: &str, status: StatusCode) -> LogFields {
    let mut fields = request_fields(method, url);
    fields.insert("status".to_string(), Value::from(status.as_u16()));
    fields
}

fn error_fields(method: &Method, url: &str, error: &ApiError) -> LogFields {
    let mut fields = request_fields(method, url);
    if let Some(status) = error.status() {
        fields.insert("status".to_string(), Value::from(status.as_u16()));
    }
    if let Some(code) = error.code() {
        fields.insert("code".to_string(), Value::from(code));
    }
    fields.insert("error".to_string(), Value::from(error.to_string()));
    fields
}
