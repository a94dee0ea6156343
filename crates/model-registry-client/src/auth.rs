//! Bearer-token resolution
//!
//! An explicitly configured token always wins. Otherwise the Kubernetes
//! service-account token file is read and cached against its modification
//! time, so a rotated token is picked up without re-reading the file on
//! every request.

use secrecy::{ExposeSecret, SecretString};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};

/// In-cluster service-account token
pub const DEFAULT_SA_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Behaviour when no token can be found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPolicy {
    /// Send the request without an `Authorization` header
    #[default]
    Permissive,
    /// Fail with [`ClientError::Auth`]
    Strict,
}

/// File access used for the token file
#[cfg_attr(test, mockall::automock)]
pub trait TokenFileReader: Send + Sync {
    fn modified(&self, path: &Path) -> io::Result<SystemTime>;
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Reads from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsTokenReader;

impl TokenFileReader for FsTokenReader {
    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

struct CachedToken {
    modified: SystemTime,
    token: SecretString,
}

/// Supplies the bearer token for each request
pub struct TokenProvider {
    explicit: Option<SecretString>,
    token_path: Option<PathBuf>,
    reader: Box<dyn TokenFileReader>,
    policy: AuthPolicy,
    cache: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(explicit: Option<SecretString>, token_path: Option<PathBuf>) -> Self {
        Self {
            explicit: explicit.filter(|t| !t.expose_secret().trim().is_empty()),
            token_path,
            reader: Box::new(FsTokenReader),
            policy: AuthPolicy::default(),
            cache: Mutex::new(None),
        }
    }

    /// No explicit token, no token file
    pub fn anonymous() -> Self {
        Self::new(None, None)
    }

    pub fn with_reader(mut self, reader: impl TokenFileReader + 'static) -> Self {
        self.reader = Box::new(reader);
        self
    }

    pub fn with_policy(mut self, policy: AuthPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> AuthPolicy {
        self.policy
    }

    /// Current token, or `None` when permissive and nothing is configured
    pub fn token(&self) -> ClientResult<Option<SecretString>> {
        if let Some(explicit) = &self.explicit {
            return Ok(Some(SecretString::new(
                explicit.expose_secret().trim().to_string(),
            )));
        }

        let token = match &self.token_path {
            Some(path) => self.read_file_token(path),
            None => None,
        };

        match (token, self.policy) {
            (Some(token), _) => Ok(Some(token)),
            (None, AuthPolicy::Permissive) => Ok(None),
            (None, AuthPolicy::Strict) => Err(ClientError::Auth(
                "no bearer token configured and no service-account token found".to_string(),
            )),
        }
    }

    fn read_file_token(&self, path: &Path) -> Option<SecretString> {
        let modified = match self.reader.modified(path) {
            Ok(modified) => modified,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No service-account token file");
                return None;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot stat token file");
                return None;
            }
        };

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = cache.as_ref() {
            if cached.modified == modified {
                return Some(SecretString::new(cached.token.expose_secret().clone()));
            }
        }

        let content = match self.reader.read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read token file");
                return None;
            }
        };
        let token = content.trim().to_string();
        if token.is_empty() {
            warn!(path = %path.display(), "Token file is empty");
            *cache = None;
            return None;
        }

        debug!(path = %path.display(), "Loaded service-account token");
        *cache = Some(CachedToken {
            modified,
            token: SecretString::new(token.clone()),
        });
        Some(SecretString::new(token))
    }
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("explicit", &self.explicit.is_some())
            .field("token_path", &self.token_path)
            .field("policy", &self.policy)
            .finish()
    }
}
