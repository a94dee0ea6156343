//! Readiness polling
//!
//! Used by jobs and tests that start alongside the service and must wait for
//! it to answer before doing real work.

use reqwest::StatusCode;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::{seconds, EnvSettings};
use crate::error::{ClientError, ClientResult};
use crate::tls::TlsSettings;

pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_POLL_MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Polls a URL until it reports ready
#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    url: Url,
    /// Delay after the first failed probe
    pub initial_interval: Duration,
    /// Growth factor per failed probe; `1.0` keeps the interval constant
    pub multiplier: f64,
    pub max_interval: Duration,
    /// Overall deadline
    pub timeout: Duration,
    /// Exact status to wait for; otherwise any non-5xx status counts
    pub expected_status: Option<u16>,
    http: reqwest::Client,
}

impl ReadinessProbe {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            initial_interval: DEFAULT_POLL_INTERVAL,
            multiplier: 2.0,
            max_interval: DEFAULT_POLL_MAX_BACKOFF,
            timeout: DEFAULT_POLL_TIMEOUT,
            expected_status: None,
            http: reqwest::Client::new(),
        }
    }

    /// Apply `CATALOG_POLL_*` overrides
    pub fn from_settings(url: Url, settings: &EnvSettings) -> ClientResult<Self> {
        let mut probe = Self::new(url);
        if let Some(timeout) = seconds("CATALOG_POLL_TIMEOUT", settings.catalog_poll_timeout)? {
            probe.timeout = timeout;
        }
        if let Some(interval) = seconds("CATALOG_POLL_INTERVAL", settings.catalog_poll_interval)? {
            probe.initial_interval = interval;
        }
        if let Some(max) = seconds("CATALOG_POLL_MAX_BACKOFF", settings.catalog_poll_max_backoff)? {
            probe.max_interval = max;
        }
        Ok(probe)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_interval(mut self, initial: Duration, multiplier: f64, max: Duration) -> Self {
        self.initial_interval = initial;
        self.multiplier = if multiplier.is_finite() && multiplier >= 1.0 {
            multiplier
        } else {
            1.0
        };
        self.max_interval = max;
        self
    }

    pub fn with_expected_status(mut self, status: u16) -> Self {
        self.expected_status = Some(status);
        self
    }

    /// Probe with the same TLS trust as the clients
    pub fn with_tls(mut self, tls: &TlsSettings) -> ClientResult<Self> {
        self.http = tls
            .apply(reqwest::Client::builder())?
            .build()
            .map_err(|e| ClientError::Config(format!("cannot build HTTP client: {}", e)))?;
        Ok(self)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn is_ready(&self, status: StatusCode) -> bool {
        match self.expected_status {
            Some(expected) => status.as_u16() == expected,
            None => !status.is_server_error(),
        }
    }

    /// Wait until the URL is ready; returns the status that satisfied the probe
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn wait_ready(&self) -> ClientResult<u16> {
        let started = Instant::now();
        let deadline = started + self.timeout;
        let mut interval = self.initial_interval;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let remaining = deadline.saturating_duration_since(Instant::now());
            let outcome = self
                .http
                .get(self.url.clone())
                .timeout(remaining.max(Duration::from_millis(1)))
                .send()
                .await;

            match outcome {
                Ok(response) if self.is_ready(response.status()) => {
                    let status = response.status().as_u16();
                    info!(status, attempts, "Service is ready");
                    return Ok(status);
                }
                Ok(response) => {
                    debug!(status = response.status().as_u16(), attempts, "Not ready yet");
                }
                Err(e) => {
                    debug!(error = %e, attempts, "Probe failed");
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(ClientError::Timeout {
                    elapsed: now.duration_since(started),
                    url: self.url.to_string(),
                });
            }
            tokio::time::sleep(interval.min(deadline - now)).await;
            interval = interval.mul_f64(self.multiplier).min(self.max_interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn probe(server: &MockServer) -> ReadinessProbe {
        let url = Url::parse(&format!("{}/readyz/isDirty", server.uri())).unwrap();
        ReadinessProbe::new(url).with_interval(
            Duration::from_millis(5),
            2.0,
            Duration::from_millis(20),
        )
    }

    #[tokio::test]
    async fn test_ready_after_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/readyz/isDirty"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/readyz/isDirty"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let status = probe(&server)
            .with_timeout(Duration::from_secs(5))
            .wait_ready()
            .await
            .unwrap();
        assert_eq!(status, 200);
    }

    #[tokio::test]
    async fn test_any_non_5xx_counts_without_expected_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        assert_eq!(probe(&server).wait_ready().await.unwrap(), 401);
    }

    #[tokio::test]
    async fn test_times_out_naming_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = probe(&server)
            .with_expected_status(200)
            .with_timeout(Duration::from_millis(100))
            .wait_ready()
            .await
            .unwrap_err();

        match err {
            ClientError::Timeout { url, elapsed } => {
                assert!(url.ends_with("/readyz/isDirty"));
                assert!(elapsed >= Duration::from_millis(100));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_settings_override_defaults() {
        let settings = EnvSettings {
            catalog_poll_timeout: Some(5.0),
            catalog_poll_interval: Some(0.5),
            ..Default::default()
        };
        let probe =
            ReadinessProbe::from_settings(Url::parse("http://svc/health").unwrap(), &settings)
                .unwrap();
        assert_eq!(probe.timeout, Duration::from_secs(5));
        assert_eq!(probe.initial_interval, Duration::from_millis(500));
        assert_eq!(probe.max_interval, DEFAULT_POLL_MAX_BACKOFF);
    }
}
