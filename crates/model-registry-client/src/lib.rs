//! Async client for the Model Registry and Model Catalog REST APIs
//!
//! All HTTP traffic goes through [`Transport`], which owns authentication,
//! TLS, retry and the custom-property codec. The typed adapters in
//! [`adapters`] sit on top of it:
//!
//! ```no_run
//! use model_registry_client::{ClientConfig, ModelRegistryClient, RegisterModelRequest};
//!
//! # async fn demo() -> model_registry_client::ClientResult<()> {
//! let config = ClientConfig::registry("https://registry.example.com")?;
//! let client = ModelRegistryClient::new(config)?;
//! let registered = client
//!     .register_model(&RegisterModelRequest::new("fraud", "v1", "s3://models/fraud/v1"))
//!     .await?;
//! println!("{:?}", registered.version.id);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod auth;
pub mod blocking;
pub mod config;
pub mod error;
pub mod pages;
pub mod readiness;
pub mod retry;
pub mod tls;
pub mod transport;

pub use adapters::{
    ArtifactListQuery, ModelCatalogClient, ModelRegistryClient, RegisterModelRequest,
    RegisteredModelVersion, RegistryTrackingStore, TrackingStore, ViewType,
};
pub use auth::{AuthPolicy, FsTokenReader, TokenFileReader, TokenProvider};
pub use blocking::BlockingClient;
pub use config::{ClientConfig, EnvSettings, ServiceKind};
pub use error::{ClientError, ClientResult};
pub use pages::{collect_all, page_stream};
pub use readiness::ReadinessProbe;
pub use retry::RetryPolicy;
pub use tls::TlsSettings;
pub use transport::Transport;

pub use model_registry_core as core;
