//! Resilient API transport
//!
//! [`ApiClient`] executes one logical operation as a bounded sequence of
//! physical attempts:
//!
//! 1. generate a correlation id (`X-Request-ID`), reused by every attempt
//! 2. resolve the tenant once, from the page context or an explicit argument
//! 3. fetch a bearer token once; a provider failure ends the operation
//!    before any request is sent
//! 4. attempt, classify, back off, repeat, until success, a permanent
//!    failure, or `max_retries + 1` attempts
//!
//! Only rate limits (429), server errors (5xx) and failures without a
//! response are retried. 429 waits honour `Retry-After` when present.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use smsdesk_common::error::ErrorClassification;
use smsdesk_common::resilience::{
    Backoff, Jitter, RetryConfig, RetryDecision, RetryExecutor, RetryPolicy, Sleeper,
    TokioSleeper,
};
use smsdesk_domain::constants::{
    CONTENT_TYPE_JSON, DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_MS,
    DEFAULT_SHOP_DOMAIN_SUFFIX, HEADER_AUTHORIZATION, HEADER_CONTENT_TYPE, HEADER_REQUEST_ID,
    HEADER_RETRY_AFTER, HEADER_SHOP_DOMAIN, SHOP_QUERY_PARAM,
};
use smsdesk_domain::{ClientConfig, ShopDomain};
use tracing::{debug, info, instrument, warn, Span};
use url::Url;
use uuid::Uuid;

use super::auth::CredentialProvider;
use super::errors::{ApiError, ErrorBody};
use super::request::OutgoingRequest;
use super::shop::{PageContext, ShopInputs, ShopResolver, StaticPageContext};
use crate::http::{HttpClient, HttpResponse};

/// Configuration for API client
#[derive(Debug, Clone, PartialEq)]
pub struct ApiClientConfig {
    /// Base URL for API (e.g., "https://api.smsdesk.app/v1")
    pub base_url: String,
    /// Upper bound for one physical attempt, response body included
    pub timeout: Duration,
    /// `User-Agent` sent with every request
    pub user_agent: Option<String>,
    /// Attempt budget and backoff schedule
    pub retry: RetryConfig,
    /// Suffix every tenant identifier must carry
    pub shop_domain_suffix: String,
    /// Tenant used when no page context is attached
    pub shop: Option<String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            user_agent: None,
            retry: RetryConfig::default(),
            shop_domain_suffix: DEFAULT_SHOP_DOMAIN_SUFFIX.to_string(),
            shop: None,
        }
    }
}

impl From<&ClientConfig> for ApiClientConfig {
    fn from(config: &ClientConfig) -> Self {
        let retry = RetryConfig::builder()
            .max_retries(config.retry.max_retries)
            .base_delay(Duration::from_millis(config.retry.base_delay_ms))
            .max_delay(Duration::from_millis(config.retry.max_delay_ms))
            .jitter(if config.retry.jitter { Jitter::Equal } else { Jitter::None })
            .build();

        Self {
            base_url: config.api.base_url.clone(),
            timeout: Duration::from_millis(config.api.request_timeout_ms),
            user_agent: config.api.user_agent.clone(),
            retry,
            shop_domain_suffix: config.shop.domain_suffix.clone(),
            shop: config.shop.shop.clone(),
        }
    }
}

/// Default retry policy: retry rate limits, server errors and failures
/// without a response; stop on everything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransientFailurePolicy;

impl RetryPolicy<ApiError> for TransientFailurePolicy {
    fn should_retry(&self, error: &ApiError, _attempt: u32) -> RetryDecision {
        match error {
            ApiError::RateLimited { retry_after, .. } => RetryDecision::RetryAfter(*retry_after),
            _ if error.is_retryable() => RetryDecision::Retry,
            _ => RetryDecision::Stop,
        }
    }
}

/// API client with resilience patterns
pub struct ApiClient {
    http_client: HttpClient,
    auth: Arc<dyn CredentialProvider>,
    page_context: Arc<dyn PageContext>,
    resolver: ShopResolver,
    sleeper: Arc<dyn Sleeper>,
    config: ApiClientConfig,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("config", &self.config).finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client without a page context
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the base URL is invalid or the HTTP
    /// client cannot be created
    pub fn new(
        config: ApiClientConfig,
        auth: Arc<dyn CredentialProvider>,
    ) -> Result<Self, ApiError> {
        Self::builder().config(config).auth(auth).build()
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Configuration the client was built with
    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// Resolve the tenant from the attached page context
    pub fn resolve_shop(&self) -> Option<ShopDomain> {
        self.resolver.resolve(&self.page_context.shop_inputs())
    }

    /// Execute `request` for the tenant resolved from the page context
    ///
    /// # Errors
    ///
    /// Returns the terminal [`ApiError`] once retries are exhausted or the
    /// failure is permanent
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: OutgoingRequest,
    ) -> Result<T, ApiError> {
        let shop = self.resolve_shop();
        self.execute_for_shop(request, shop.as_ref()).await
    }

    /// Execute `request` for an explicit tenant (`None` omits the tenant)
    pub async fn execute_for_shop<T: DeserializeOwned>(
        &self,
        request: OutgoingRequest,
        shop: Option<&ShopDomain>,
    ) -> Result<T, ApiError> {
        self.execute_with_policy(request, shop, TransientFailurePolicy).await
    }

    /// Execute `request` under a caller-supplied retry policy
    #[instrument(
        skip(self, request, shop, policy),
        fields(
            method = %request.method(),
            path = %request.path(),
            shop = shop.map(ShopDomain::as_str).unwrap_or(""),
            request_id = tracing::field::Empty,
        )
    )]
    pub async fn execute_with_policy<T, P>(
        &self,
        request: OutgoingRequest,
        shop: Option<&ShopDomain>,
        policy: P,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        P: RetryPolicy<ApiError>,
    {
        let request_id = Uuid::new_v4().to_string();
        Span::current().record("request_id", request_id.as_str());

        let url = self.build_url(&request, shop)?;

        let token = self.auth.access_token().await.map_err(|err| {
            warn!(error = %err, "credential provider failed, request not sent");
            ApiError::Credential(err.to_string())
        })?;

        let headers = build_headers(&request, &token, &request_id, shop)?;

        let backoff = self.config.retry.backoff;
        let executor =
            RetryExecutor::new(self.config.retry, policy).with_sleeper(Arc::clone(&self.sleeper));

        let request = &request;
        let url = &url;
        let headers = &headers;
        let outcome = executor
            .execute_with_outcome(move |attempt| {
                self.send_attempt(request, url, headers, backoff, attempt)
            })
            .await;

        let attempts = outcome.attempts();
        let value = outcome.into_result().map_err(|err| {
            let error = err.into_inner();
            warn!(attempts, error = %error, "API request failed");
            error
        })?;

        info!(attempts, "API request completed");
        serde_json::from_value(value)
            .map_err(|e| ApiError::Decode(format!("Unexpected response shape: {e}")))
    }

    /// One physical attempt; any non-2xx status becomes an [`ApiError`]
    async fn send_attempt(
        &self,
        request: &OutgoingRequest,
        url: &Url,
        headers: &HeaderMap,
        backoff: Backoff,
        attempt: u32,
    ) -> Result<Value, ApiError> {
        let mut builder = self
            .http_client
            .request(request.method().clone(), url.clone())
            .headers(headers.clone());
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = self.http_client.send(builder).await?;
        let status = response.status();

        if status.is_success() {
            return read_json(&response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = retry_after(response.headers())
                .map(|delay| backoff.clamp(delay))
                .unwrap_or_else(|| backoff.delay_for(attempt));
            let body = ErrorBody::parse(&response.text());
            debug!(attempt, ?retry_after, "rate limited");
            return Err(ApiError::RateLimited { retry_after, body });
        }

        let body = ErrorBody::parse(&response.text());
        debug!(attempt, status = status.as_u16(), error = %body.summary(), "request rejected");
        Err(ApiError::Status { status: status.as_u16(), body })
    }

    fn build_url(
        &self,
        request: &OutgoingRequest,
        shop: Option<&ShopDomain>,
    ) -> Result<Url, ApiError> {
        let base = self.config.base_url.trim_end_matches('/');
        let path = request.path();
        let joined = if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };

        let mut url = Url::parse(&joined)
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid URL {joined}: {e}")))?;

        if !request.query_pairs().is_empty() || shop.is_some() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in request.query_pairs() {
                pairs.append_pair(key, value);
            }
            if let Some(shop) = shop {
                pairs.append_pair(SHOP_QUERY_PARAM, shop.as_str());
            }
        }

        Ok(url)
    }
}

fn build_headers(
    request: &OutgoingRequest,
    token: &str,
    request_id: &str,
    shop: Option<&ShopDomain>,
) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    insert_header(&mut headers, HEADER_AUTHORIZATION, &format!("Bearer {token}"))?;
    insert_header(&mut headers, HEADER_REQUEST_ID, request_id)?;
    insert_header(&mut headers, HEADER_CONTENT_TYPE, CONTENT_TYPE_JSON)?;
    if let Some(shop) = shop {
        insert_header(&mut headers, HEADER_SHOP_DOMAIN, shop.as_str())?;
    }
    for (name, value) in request.headers() {
        insert_header(&mut headers, name, value)?;
    }
    Ok(headers)
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), ApiError> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid header name {name}: {e}")))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid value for header {name}: {e}")))?;
    headers.insert(header_name, header_value);
    Ok(())
}

/// `Retry-After` in (possibly fractional) seconds
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let raw = headers.get(HEADER_RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(seconds) = raw.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    raw.parse::<f64>().ok().and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
}

fn read_json(response: &HttpResponse) -> Result<Value, ApiError> {
    let status = response.status();
    // These status codes have no body by RFC spec
    if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
        return Ok(Value::Null);
    }

    let bytes = response.body();
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }

    serde_json::from_slice(bytes)
        .map_err(|e| ApiError::Decode(format!("Failed to parse response: {e}")))
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ApiClientConfig>,
    auth: Option<Arc<dyn CredentialProvider>>,
    page_context: Option<Arc<dyn PageContext>>,
    sleeper: Option<Arc<dyn Sleeper>>,
}

impl ApiClientBuilder {
    /// Set the API configuration
    pub fn config(mut self, config: ApiClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the credential provider
    pub fn auth(mut self, auth: Arc<dyn CredentialProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Set the source of tenant inputs
    pub fn page_context(mut self, context: Arc<dyn PageContext>) -> Self {
        self.page_context = Some(context);
        self
    }

    /// Replace the sleeper used between retries
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns error if required fields are missing or client creation fails
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.unwrap_or_default();
        let auth = self
            .auth
            .ok_or_else(|| ApiError::Config("Credential provider not set".to_string()))?;

        Url::parse(&config.base_url).map_err(|e| {
            ApiError::Config(format!("Invalid base URL {}: {e}", config.base_url))
        })?;

        let mut http = HttpClient::builder().timeout(config.timeout);
        if let Some(agent) = &config.user_agent {
            http = http.user_agent(agent.clone());
        }
        let http_client = http.build()?;

        let page_context = self.page_context.unwrap_or_else(|| {
            let inputs = ShopInputs { context_shop: config.shop.clone(), page_url: None };
            Arc::new(StaticPageContext::new(inputs))
        });

        Ok(ApiClient {
            http_client,
            auth,
            page_context,
            resolver: ShopResolver::new(config.shop_domain_suffix.clone()),
            sleeper: self.sleeper.unwrap_or_else(|| Arc::new(TokioSleeper)),
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use smsdesk_common::resilience::RecordingSleeper;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::auth::StaticTokenProvider;

    fn client(server: &MockServer, shop: Option<&str>) -> ApiClient {
        let config = ApiClientConfig {
            base_url: server.uri(),
            shop: shop.map(str::to_string),
            ..Default::default()
        };
        ApiClient::builder()
            .config(config)
            .auth(Arc::new(StaticTokenProvider::new("test-token")))
            .sleeper(Arc::new(RecordingSleeper::new()))
            .build()
            .expect("api client")
    }

    #[tokio::test]
    async fn sends_wire_headers_and_shop_parameter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/campaigns"))
            .and(header("authorization", "Bearer test-token"))
            .and(header("x-shop-domain", "foo.myshopify.com"))
            .and(header("content-type", "application/json"))
            .and(query_param("shop", "foo.myshopify.com"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server, Some("foo.myshopify.com"));
        let value: Value =
            client.execute(OutgoingRequest::get("/campaigns").query("page", 2)).await.unwrap();
        assert_eq!(value, json!({"ok": true}));

        let requests = server.received_requests().await.unwrap();
        let request_id = requests[0].headers.get("x-request-id").expect("request id");
        assert!(Uuid::parse_str(request_id.to_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn omits_tenant_when_unresolved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .mount(&server)
            .await;

        let client = client(&server, None);
        let _: Value = client.execute(OutgoingRequest::get("/health")).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("x-shop-domain").is_none());
        assert!(requests[0].url.query_pairs().all(|(key, _)| key != "shop"));
    }

    #[tokio::test]
    async fn no_content_decodes_as_unit() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = client(&server, None);
        let result: Result<(), ApiError> =
            client.execute(OutgoingRequest::delete("/contacts/1")).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server, None);
        let result: Result<Value, ApiError> = client.execute(OutgoingRequest::get("/x")).await;
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn request_headers_override_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("content-type", "application/merge-patch+json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server, None);
        let request = OutgoingRequest::post("/x")
            .header("Content-Type", "application/merge-patch+json")
            .json(&json!({"a": 1}))
            .unwrap();
        let _: Value = client.execute(request).await.unwrap();
    }

    #[test]
    fn retry_after_accepts_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("2"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(2)));

        headers.insert("retry-after", HeaderValue::from_static("0.5"));
        assert_eq!(retry_after(&headers), Some(Duration::from_millis(500)));

        headers.insert("retry-after", HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(retry_after(&headers), None);
    }

    #[test]
    fn policy_only_retries_transient_failures() {
        let policy = TransientFailurePolicy;
        let status = |code| ApiError::Status { status: code, body: ErrorBody::default() };

        assert_eq!(policy.should_retry(&status(503), 0), RetryDecision::Retry);
        assert_eq!(policy.should_retry(&status(404), 0), RetryDecision::Stop);
        assert_eq!(
            policy.should_retry(&ApiError::Credential("expired".into()), 0),
            RetryDecision::Stop
        );
        assert_eq!(
            policy.should_retry(
                &ApiError::RateLimited {
                    retry_after: Duration::from_secs(3),
                    body: ErrorBody::default()
                },
                1
            ),
            RetryDecision::RetryAfter(Duration::from_secs(3))
        );
    }

    #[test]
    fn config_conversion_uses_client_settings() {
        let mut settings = ClientConfig::default();
        settings.retry.max_retries = 5;
        settings.retry.base_delay_ms = 10;
        settings.shop.shop = Some("foo.myshopify.com".into());

        let config = ApiClientConfig::from(&settings);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.backoff.base_delay, Duration::from_millis(10));
        assert_eq!(config.shop.as_deref(), Some("foo.myshopify.com"));
    }

    #[test]
    fn missing_auth_is_a_config_error() {
        assert!(matches!(ApiClient::builder().build(), Err(ApiError::Config(_))));
    }
}
