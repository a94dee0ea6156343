//! HTTP transport
//!
//! Every adapter call goes through [`Transport::send`]: the path is joined
//! onto the base URL and API prefix, the bearer token is attached, the
//! request is retried per [`RetryPolicy`], and failures are classified into
//! [`ClientError`]. Outbound `customProperties` are encoded to wire envelopes
//! and inbound ones decoded to plain values before typed deserialization.
//! [`Transport::send_raw`] skips both steps for read-modify-write of stored
//! envelopes.

use model_registry_core::PropertyCodec;
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::auth::TokenProvider;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::retry::RetryPolicy;

struct TransportInner {
    http: reqwest::Client,
    base_url: Url,
    prefix: Vec<String>,
    tokens: TokenProvider,
    retry: RetryPolicy,
    timeout: Duration,
    codec: PropertyCodec,
}

/// Shared, cloneable HTTP transport
#[derive(Clone)]
pub struct Transport {
    inner: Arc<TransportInner>,
}

impl Transport {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let builder = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout);
        let http = config
            .tls
            .apply(builder)?
            .build()
            .map_err(|e| ClientError::Config(format!("cannot build HTTP client: {}", e)))?;

        let tokens = TokenProvider::new(config.token, config.token_path)
            .with_policy(config.auth_policy);

        Ok(Self::from_parts(
            http,
            config.base_url,
            &config.api_prefix,
            tokens,
            config.retry,
            config.timeout,
            config.codec,
        ))
    }

    /// Assemble from pre-built pieces (custom token reader, shared client)
    pub fn from_parts(
        http: reqwest::Client,
        base_url: Url,
        api_prefix: &str,
        tokens: TokenProvider,
        retry: RetryPolicy,
        timeout: Duration,
        codec: PropertyCodec,
    ) -> Self {
        let prefix = api_prefix
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            inner: Arc::new(TransportInner {
                http,
                base_url,
                prefix,
                tokens,
                retry,
                timeout,
                codec,
            }),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn codec(&self) -> PropertyCodec {
        self.inner.codec
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.inner.retry
    }

    /// Full URL for `segments` under the API prefix
    ///
    /// Each segment is percent-encoded, so ids and names may contain `/`.
    pub fn url(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.inner.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ClientError::Config(format!("base URL {} cannot carry a path", self.inner.base_url))
            })?;
            path.pop_if_empty();
            path.extend(self.inner.prefix.iter().map(String::as_str));
            path.extend(segments);
        }
        Ok(url)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        self.send(Method::GET, segments, query, None).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
        body: &B,
    ) -> ClientResult<T> {
        let body = to_body(body)?;
        self.send(Method::POST, segments, query, Some(body)).await
    }

    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> ClientResult<T> {
        let body = to_body(body)?;
        self.send(Method::PATCH, segments, &[], Some(body)).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> ClientResult<T> {
        let body = to_body(body)?;
        self.send(Method::PUT, segments, &[], Some(body)).await
    }

    pub async fn delete(&self, segments: &[&str]) -> ClientResult<()> {
        let _: Value = self.send(Method::DELETE, segments, &[], None).await?;
        Ok(())
    }

    /// Issue one logical request, retrying per policy
    #[instrument(skip(self, method, query, body), fields(method = %method))]
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> ClientResult<T> {
        let url = self.request_url(segments, query)?;
        let body = match body {
            Some(mut body) => {
                self.inner.codec.encode_in_place(&mut body)?;
                Some(body)
            }
            None => None,
        };

        let response = self.dispatch(&method, &url, body.as_ref()).await?;
        let mut value = self.read_json(&url, response).await?;
        self.inner.codec.decode_in_place(&mut value)?;
        serde_json::from_value(value).map_err(|e| ClientError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Like [`Transport::send`] but `customProperties` pass through as wire
    /// envelopes in both directions
    #[instrument(skip(self, method, query, body), fields(method = %method))]
    pub async fn send_raw(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> ClientResult<Value> {
        let url = self.request_url(segments, query)?;
        let response = self.dispatch(&method, &url, body.as_ref()).await?;
        self.read_json(&url, response).await
    }

    fn request_url(&self, segments: &[&str], query: &[(&str, String)]) -> ClientResult<Url> {
        let mut url = self.url(segments)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    /// Send until success or a non-retryable failure
    async fn dispatch(&self, method: &Method, url: &Url, body: Option<&Value>) -> ClientResult<Response> {
        let token = self.inner.tokens.token()?;
        let auth_header = match &token {
            Some(token) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                    .map_err(|_| ClientError::Auth("token contains invalid header characters".to_string()))?;
                value.set_sensitive(true);
                Some(value)
            }
            None => None,
        };

        let mut attempt = 1;
        loop {
            let mut request = self
                .inner
                .http
                .request(method.clone(), url.clone())
                .timeout(self.inner.timeout)
                .header(ACCEPT, "application/json");
            if let Some(value) = &auth_header {
                request = request.header(AUTHORIZATION, value.clone());
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!(url = %url, attempt, "Sending request");
            let response = request
                .send()
                .await
                .map_err(|e| ClientError::from_transport(url.as_str(), self.inner.timeout, e))?;
            let status = response.status();

            if status.is_success() {
                debug!(url = %url, status = status.as_u16(), "Request succeeded");
                return Ok(response);
            }

            if self.inner.retry.should_retry(method, status.as_u16(), attempt) {
                let delay = self.inner.retry.delay(attempt);
                warn!(
                    url = %url,
                    status = status.as_u16(),
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying request"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            let text = response.text().await.unwrap_or_default();
            debug!(url = %url, status = status.as_u16(), attempt, "Request failed");
            return Err(ClientError::from_response(status.as_u16(), text));
        }
    }

    async fn read_json(&self, url: &Url, response: Response) -> ClientResult<Value> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::from_transport(url.as_str(), self.inner.timeout, e))?;

        if text.trim().is_empty() || status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ClientError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.inner.base_url.as_str())
            .field("prefix", &self.inner.prefix)
            .field("timeout", &self.inner.timeout)
            .finish()
    }
}

fn to_body<B: Serialize + ?Sized>(body: &B) -> ClientResult<Value> {
    serde_json::to_value(body).map_err(|e| ClientError::Config(format!("cannot serialize request body: {}", e)))
}
