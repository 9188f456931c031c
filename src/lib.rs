//! Logging Manifest Provider
//!
//! A provider exposing read-only "manifest" data sources for the custom
//! resources of the banzaicloud logging operator (`Logging`,
//! `FluentbitAgent`, `Output`, `Flow`, the syslog-ng kinds, `LoggingRoute`,
//! `EventTailer` and `HostTailer`).
//!
//! # Overview
//!
//! Each data source takes a structured configuration (`metadata` plus a
//! typed `spec`), stamps in the resource's `apiVersion` and `kind`, and
//! returns the rendered Kubernetes manifest in the computed `yaml`
//! attribute. Rendering never talks to a cluster.
//!
//! The crate provides:
//!
//! - **Manifest rendering**: [`manifest`] turns a configuration into YAML
//! - **CRD trees**: typed spec structs with their schemas in [`crds`] and [`k8s`]
//! - **Schema types**: describing data source configurations, with validators
//! - **ProviderService trait**: implemented by [`LoggingManifestsProvider`]
//! - **Server helpers**: functions to start a gRPC server with the handshake protocol
//! - **Logging**: `tracing` output on stderr
//!
//! # Quick Start
//!
//! ```
//! use logging_manifest_provider::crds::Flow;
//! use logging_manifest_provider::manifest::render;
//! use serde_json::json;
//!
//! let yaml = render::<Flow>(&json!({
//!     "metadata": {"name": "nginx", "namespace": "default"},
//!     "spec": {"local_output_refs": ["loki"]}
//! }))
//! .unwrap();
//!
//! assert!(yaml.starts_with("apiVersion: logging.banzaicloud.io/v1beta1\nkind: Flow\n"));
//! assert!(yaml.contains("localOutputRefs"));
//! ```
//!
//! # Handshake Protocol
//!
//! When the provider starts via [`serve`], it outputs a handshake line to stdout:
//!
//! ```text
//! LOGGING_MANIFESTS_PROVIDER|1|127.0.0.1:50051
//! ```
//!
//! Format: `LOGGING_MANIFESTS_PROVIDER|<protocol_version>|<address>`
//!
//! # Provider Protocol
//!
//! - **GetMetadata**: Returns the data source names
//! - **GetSchema**: Returns the schema of every data source
//! - **ValidateProviderConfig** / **Configure**: Accept any (empty) provider configuration
//! - **Stop**: Gracefully shuts down the provider
//! - **ValidateDataSourceConfig**: Validates a data source configuration
//! - **ReadDataSource**: Renders the manifest

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod provider;
pub mod schema;
pub mod server;
pub mod testing;
pub mod types;
pub mod validation;

#[allow(missing_docs)]
pub mod crds;

#[allow(missing_docs)]
pub mod k8s;

#[allow(missing_docs)]
#[allow(clippy::all)]
pub mod generated;

// Re-export main types at crate root
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use manifest::{render, Manifest, ManifestKind};
pub use provider::{DataSource, LoggingManifestsProvider, ManifestDataSource};
pub use schema::ProviderSchema;
pub use server::{
    serve, serve_on, serve_on_with_options, serve_with_options, ProviderService, ServeOptions,
};
pub use types::{ProviderMetadata, HANDSHAKE_PREFIX, PROTOCOL_VERSION};
pub use validation::{is_valid, validate, validate_result};

pub use async_trait::async_trait;
