//! Main API client implementation

use crate::config::ClientConfig;
use crate::endpoints::{ProfilesApi, WorkersApi};
use crate::error::{ApiError, ApiResult};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;
use workkar_core::retry::{CircuitBreaker, CircuitState};

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// API key header for Supabase
const APIKEY_HEADER: &str = "apikey";

/// WorkKar backend client with built-in resilience patterns
///
/// Wraps `reqwest` for the Supabase PostgREST API and adds:
/// - Automatic retry with exponential backoff
/// - Circuit breaker to stop hammering a failing backend
/// - Request correlation IDs for tracing
#[derive(Clone)]
pub struct WorkkarClient {
    inner: Client,
    config: Arc<ClientConfig>,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl WorkkarClient {
    /// Create a new client with specific configuration
    pub fn with_config(config: ClientConfig) -> ApiResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("workkar-api-client/", env!("CARGO_PKG_VERSION"))),
        );

        if let Some(ref key) = config.anon_key {
            let apikey = HeaderValue::from_str(key)
                .map_err(|_| ApiError::config("anon_key contains invalid header characters"))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| ApiError::config("anon_key contains invalid header characters"))?;
            default_headers.insert(APIKEY_HEADER, apikey);
            default_headers.insert(AUTHORIZATION, bearer);
        }

        let inner = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(ApiError::Request)?;

        let circuit_breaker = Arc::new(CircuitBreaker::new(config.circuit_breaker.clone()));

        Ok(Self {
            inner,
            config: Arc::new(config),
            circuit_breaker,
        })
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get circuit breaker state
    #[must_use]
    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }

    /// Reset the circuit breaker
    pub fn reset_circuit(&self) {
        self.circuit_breaker.reset();
    }

    /// Access the worker directory view
    #[must_use]
    pub fn workers(&self) -> WorkersApi {
        WorkersApi::new(self.clone())
    }

    /// Access the profile view
    #[must_use]
    pub fn profiles(&self) -> ProfilesApi {
        ProfilesApi::new(self.clone())
    }

    /// GET rows from a PostgREST view or table with resilience patterns
    #[instrument(skip(self, query), fields(request_id))]
    pub async fn select<T: DeserializeOwned>(
        &self,
        view: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let url = format!("{}/{}", self.config.rest_url(), view);
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        if !self.circuit_breaker.can_execute() {
            warn!(request_id = %request_id, url = %url, "Circuit breaker is open, rejecting request");
            return Err(ApiError::CircuitOpen);
        }

        self.execute_with_retry(&request_id, &url, query).await
    }

    /// Execute request with retry logic
    async fn execute_with_retry<T: DeserializeOwned>(
        &self,
        request_id: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let retry_config = &self.config.retry;
        let mut last_error: Option<ApiError> = None;

        for attempt in 0..retry_config.max_attempts {
            if attempt > 0 {
                let delay = retry_config.delay_for_attempt(attempt);
                debug!(
                    request_id = %request_id,
                    attempt = attempt,
                    delay_ms = delay.as_millis(),
                    "Retrying after delay"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();
            let result = self.execute_single_request(request_id, url, query).await;
            let elapsed = start.elapsed();

            match result {
                Ok(value) => {
                    self.circuit_breaker.record_success();
                    debug!(
                        request_id = %request_id,
                        attempt = attempt + 1,
                        elapsed_ms = elapsed.as_millis(),
                        "Request succeeded"
                    );
                    return Ok(value);
                }
                Err(e) => {
                    self.circuit_breaker.record_failure();

                    if e.is_retryable() && attempt + 1 < retry_config.max_attempts {
                        debug!(request_id = %request_id, attempt = attempt + 1, error = %e, "Request failed, will retry");
                        last_error = Some(e);
                    } else if e.is_retryable() && attempt > 0 {
                        warn!(request_id = %request_id, attempts = attempt + 1, error = %e, "Request failed, giving up");
                        return Err(ApiError::RetriesExhausted {
                            attempts: attempt + 1,
                            last_error: e.to_string(),
                        });
                    } else {
                        debug!(request_id = %request_id, attempt = attempt + 1, error = %e, "Request failed, not retrying");
                        return Err(e);
                    }
                }
            }
        }

        Err(ApiError::RetriesExhausted {
            attempts: retry_config.max_attempts,
            last_error: last_error.map_or_else(|| "Unknown error".to_string(), |e| e.to_string()),
        })
    }

    /// Execute a single request without retry
    async fn execute_single_request<T: DeserializeOwned>(
        &self,
        request_id: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let response = self
            .inner
            .get(url)
            .query(query)
            .header(X_REQUEST_ID, request_id)
            .send()
            .await?;

        handle_response(response).await
    }
}

/// Handle HTTP response and deserialize
pub(crate) async fn handle_response<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();

    if status.is_success() {
        response.json().await.map_err(ApiError::Request)
    } else {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ApiError::api_response(status.as_u16(), message))
    }
}

impl std::fmt::Debug for WorkkarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkkarClient")
            .field("base_url", &self.config.base_url)
            .field("circuit", &self.circuit_breaker.state())
            .finish_non_exhaustive()
    }
}
