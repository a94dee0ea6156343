//! Client configuration
//!
//! [`EnvSettings`] is the raw environment, read through the `config` crate so
//! tests can inject a map instead of mutating the process environment.
//! [`ClientConfig`] is what a [`Transport`](crate::transport::Transport) is
//! built from.

use config::{Config, Environment};
use model_registry_core::PropertyCodec;
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::auth::{AuthPolicy, DEFAULT_SA_TOKEN_PATH};
use crate::error::{ClientError, ClientResult};
use crate::retry::RetryPolicy;
use crate::tls::TlsSettings;

/// Default registry REST prefix
pub const REGISTRY_API_PREFIX: &str = "/api/model_registry/v1alpha3";

/// Default catalog REST prefix
pub const CATALOG_API_PREFIX: &str = "/api/model_catalog/v1alpha1";

/// Per-call timeout when `CATALOG_CLIENT_TIMEOUT` is unset
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Recognised environment variables
///
/// Field names are the lower-cased variable names.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvSettings {
    /// `MODEL_REGISTRY_URL`
    pub model_registry_url: Option<String>,
    /// `CATALOG_URL`
    pub catalog_url: Option<String>,
    /// `MODEL_REGISTRY_TOKEN`
    pub model_registry_token: Option<String>,
    /// `AUTH_TOKEN`
    pub auth_token: Option<String>,
    /// `VERIFY_SSL`
    pub verify_ssl: Option<bool>,
    /// `MODELREGISTRY_CA_CERT_PATH`
    pub modelregistry_ca_cert_path: Option<String>,
    /// `CATALOG_CLIENT_TIMEOUT`, seconds
    pub catalog_client_timeout: Option<f64>,
    /// `CATALOG_POLL_TIMEOUT`, seconds
    pub catalog_poll_timeout: Option<f64>,
    /// `CATALOG_POLL_INTERVAL`, seconds
    pub catalog_poll_interval: Option<f64>,
    /// `CATALOG_POLL_MAX_BACKOFF`, seconds
    pub catalog_poll_max_backoff: Option<f64>,
}

impl EnvSettings {
    /// Read the process environment
    pub fn load() -> ClientResult<Self> {
        Self::build(Environment::default())
    }

    /// Read from an explicit map of variable name to value
    pub fn from_map<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> ClientResult<Self>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let map: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::build(Environment::default().source(Some(map)))
    }

    fn build(environment: Environment) -> ClientResult<Self> {
        let settings = Config::builder()
            .add_source(environment.try_parsing(true))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// First non-empty of `MODEL_REGISTRY_TOKEN`, `AUTH_TOKEN`
    pub fn token(&self) -> Option<&str> {
        [&self.model_registry_token, &self.auth_token]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|t| !t.trim().is_empty())
    }

    pub fn client_timeout(&self) -> ClientResult<Option<Duration>> {
        seconds("CATALOG_CLIENT_TIMEOUT", self.catalog_client_timeout)
    }
}

/// Convert a seconds setting, rejecting negative and non-finite values
pub(crate) fn seconds(name: &str, value: Option<f64>) -> ClientResult<Option<Duration>> {
    match value {
        None => Ok(None),
        Some(secs) if secs.is_finite() && secs >= 0.0 => Ok(Some(Duration::from_secs_f64(secs))),
        Some(secs) => Err(ClientError::Config(format!(
            "{} must be a non-negative number of seconds, got {}",
            name, secs
        ))),
    }
}

/// Which service a client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Registry,
    Catalog,
}

impl ServiceKind {
    pub fn default_api_prefix(&self) -> &'static str {
        match self {
            ServiceKind::Registry => REGISTRY_API_PREFIX,
            ServiceKind::Catalog => CATALOG_API_PREFIX,
        }
    }

    pub fn url_variable(&self) -> &'static str {
        match self {
            ServiceKind::Registry => "MODEL_REGISTRY_URL",
            ServiceKind::Catalog => "CATALOG_URL",
        }
    }
}

/// Everything needed to build a transport
#[derive(Debug)]
pub struct ClientConfig {
    /// Scheme, host and port (any path is kept in front of the API prefix)
    pub base_url: Url,
    /// REST prefix such as `/api/model_registry/v1alpha3`
    pub api_prefix: String,
    /// Explicit bearer token
    pub token: Option<SecretString>,
    /// Service-account token file consulted when no explicit token is set
    pub token_path: Option<PathBuf>,
    pub auth_policy: AuthPolicy,
    pub tls: TlsSettings,
    /// Per-call timeout
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub codec: PropertyCodec,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(base_url: &str, api_prefix: impl Into<String>) -> ClientResult<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            api_prefix: api_prefix.into(),
            token: None,
            token_path: Some(PathBuf::from(DEFAULT_SA_TOKEN_PATH)),
            auth_policy: AuthPolicy::default(),
            tls: TlsSettings::default(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            codec: PropertyCodec::default(),
            user_agent: format!("model-registry-client/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Registry client at `base_url` with the default prefix
    pub fn registry(base_url: &str) -> ClientResult<Self> {
        Self::new(base_url, REGISTRY_API_PREFIX)
    }

    /// Catalog client at `base_url` with the default prefix
    pub fn catalog(base_url: &str) -> ClientResult<Self> {
        Self::new(base_url, CATALOG_API_PREFIX)
    }

    /// Build from the process environment
    pub fn from_env(kind: ServiceKind) -> ClientResult<Self> {
        Self::from_settings(kind, &EnvSettings::load()?, None)
    }

    /// Build from loaded settings; `base_url` overrides the URL variable
    pub fn from_settings(
        kind: ServiceKind,
        settings: &EnvSettings,
        base_url: Option<&str>,
    ) -> ClientResult<Self> {
        let env_url = match kind {
            ServiceKind::Registry => settings.model_registry_url.as_deref(),
            ServiceKind::Catalog => settings.catalog_url.as_deref(),
        };
        let url = base_url.or(env_url).ok_or_else(|| {
            ClientError::Config(format!("{} is not set", kind.url_variable()))
        })?;

        let mut config = Self::new(url, kind.default_api_prefix())?;
        if let Some(token) = settings.token() {
            config.token = Some(SecretString::new(token.trim().to_string()));
        }
        if let Some(verify) = settings.verify_ssl {
            config.tls.verify_ssl = verify;
        }
        if let Some(path) = settings.modelregistry_ca_cert_path.as_deref() {
            if !path.trim().is_empty() {
                config.tls.ca_bundle = Some(PathBuf::from(path));
            }
        }
        if let Some(timeout) = settings.client_timeout()? {
            config.timeout = timeout;
        }
        Ok(config)
    }

    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::new(token.into()));
        self
    }

    pub fn with_token_path(mut self, path: Option<PathBuf>) -> Self {
        self.token_path = path;
        self
    }

    pub fn with_auth_policy(mut self, policy: AuthPolicy) -> Self {
        self.auth_policy = policy;
        self
    }

    pub fn with_tls(mut self, tls: TlsSettings) -> Self {
        self.tls = tls;
        self
    }

    /// Explicit CA bundle; takes precedence over `MODELREGISTRY_CA_CERT_PATH`
    pub fn with_ca_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.tls.ca_bundle = Some(path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_codec(mut self, codec: PropertyCodec) -> Self {
        self.codec = codec;
        self
    }
}
