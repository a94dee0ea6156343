//! TLS verification settings and CA bundle resolution

use reqwest::{Certificate, ClientBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};

/// CA bundle mounted into every pod
pub const IN_CLUSTER_CA_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";

/// How server certificates are verified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsSettings {
    /// Disable only against test servers
    pub verify_ssl: bool,
    /// Explicit bundle, or the one named by `MODELREGISTRY_CA_CERT_PATH`
    pub ca_bundle: Option<PathBuf>,
    /// Used when no bundle is configured and the file exists
    pub in_cluster_ca: PathBuf,
}

impl TlsSettings {
    pub fn new() -> Self {
        Self {
            verify_ssl: true,
            ca_bundle: None,
            in_cluster_ca: PathBuf::from(IN_CLUSTER_CA_PATH),
        }
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    pub fn with_ca_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_bundle = Some(path.into());
        self
    }

    pub fn with_in_cluster_ca(mut self, path: impl Into<PathBuf>) -> Self {
        self.in_cluster_ca = path.into();
        self
    }

    /// Bundle to trust in addition to the system store, if any
    pub fn resolve_ca_bundle(&self) -> Option<PathBuf> {
        resolve_ca_bundle(self.ca_bundle.as_deref(), &self.in_cluster_ca)
    }

    /// Apply verification and trust settings to a client builder
    pub fn apply(&self, mut builder: ClientBuilder) -> ClientResult<ClientBuilder> {
        if !self.verify_ssl {
            warn!("TLS certificate verification is disabled");
            return Ok(builder.danger_accept_invalid_certs(true));
        }

        if let Some(path) = self.resolve_ca_bundle() {
            let pem = std::fs::read(&path).map_err(|e| {
                ClientError::Config(format!("cannot read CA bundle {}: {}", path.display(), e))
            })?;
            let certs = parse_bundle(&pem).map_err(|e| {
                ClientError::Config(format!("invalid CA bundle {}: {}", path.display(), e))
            })?;
            debug!(path = %path.display(), count = certs.len(), "Trusting CA bundle");
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }

        Ok(builder)
    }
}

impl Default for TlsSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// explicit > in-cluster (when present) > system store only
pub fn resolve_ca_bundle(explicit: Option<&Path>, in_cluster: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if in_cluster.is_file() {
        return Some(in_cluster.to_path_buf());
    }
    None
}

/// Split a PEM file that may hold several certificates
fn parse_bundle(pem: &[u8]) -> Result<Vec<Certificate>, reqwest::Error> {
    let text = String::from_utf8_lossy(pem);
    let end_marker = "-----END CERTIFICATE-----";
    let mut certs = Vec::new();
    let mut rest = text.as_ref();
    while let Some(end) = rest.find(end_marker) {
        let (block, tail) = rest.split_at(end + end_marker.len());
        if let Some(start) = block.find("-----BEGIN CERTIFICATE-----") {
            certs.push(Certificate::from_pem(block[start..].as_bytes())?);
        }
        rest = tail;
    }
    if certs.is_empty() {
        // Let reqwest report why the bundle is unusable
        certs.push(Certificate::from_pem(pem)?);
    }
    Ok(certs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_bundle_wins() {
        let dir = tempfile::tempdir().unwrap();
        let in_cluster = dir.path().join("ca.crt");
        std::fs::write(&in_cluster, "x").unwrap();

        let resolved = resolve_ca_bundle(Some(Path::new("/etc/custom.pem")), &in_cluster);
        assert_eq!(resolved, Some(PathBuf::from("/etc/custom.pem")));
    }

    #[test]
    fn test_in_cluster_bundle_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let in_cluster = dir.path().join("ca.crt");
        assert_eq!(resolve_ca_bundle(None, &in_cluster), None);

        std::fs::write(&in_cluster, "x").unwrap();
        assert_eq!(resolve_ca_bundle(None, &in_cluster), Some(in_cluster));
    }

    #[test]
    fn test_missing_bundle_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings = TlsSettings::new().with_ca_bundle(dir.path().join("absent.pem"));
        let err = settings.apply(reqwest::Client::builder()).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_verification_off_skips_bundle() {
        let settings = TlsSettings::new()
            .with_verify(false)
            .with_ca_bundle("/does/not/exist.pem");
        assert!(settings.apply(reqwest::Client::builder()).is_ok());
    }
}
