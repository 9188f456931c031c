//! The provider: a registry of manifest data sources.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use serde_json::Value;
use tracing::debug;

use crate::crds::{
    ClusterFlow, ClusterOutput, EventTailer, Flow, FluentbitAgent, HostTailer, Logging,
    LoggingRoute, Output, SyslogNgClusterFlow, SyslogNgClusterOutput, SyslogNgFlow,
    SyslogNgOutput,
};
use crate::error::ProviderError;
use crate::manifest::{self, ManifestKind};
use crate::schema::{Diagnostic, ProviderSchema, Schema};
use crate::server::ProviderService;
use crate::validation::{validate, validate_result};

/// A read-only data source served by the provider.
pub trait DataSource: Send + Sync {
    /// The data source type name.
    fn type_name(&self) -> &'static str;

    /// The configuration schema.
    fn schema(&self) -> Schema;

    /// Compute the state for a configuration that passed validation.
    fn read(&self, config: Value) -> Result<Value, ProviderError>;
}

/// The data source rendering manifests of kind `K`.
pub struct ManifestDataSource<K>(PhantomData<fn() -> K>);

impl<K> ManifestDataSource<K> {
    /// Create the data source.
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<K> Default for ManifestDataSource<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ManifestKind> DataSource for ManifestDataSource<K> {
    fn type_name(&self) -> &'static str {
        K::DATA_SOURCE
    }

    fn schema(&self) -> Schema {
        manifest::manifest_schema::<K>()
    }

    fn read(&self, config: Value) -> Result<Value, ProviderError> {
        let state = manifest::read::<K>(config)?;
        debug!(
            data_source = K::DATA_SOURCE,
            kind = K::KIND,
            api_version = K::API_VERSION,
            "Rendered manifest"
        );
        Ok(state)
    }
}

/// Provider for the logging operator CRD manifests.
///
/// There is no provider configuration: every data source is a pure
/// function of its own config.
pub struct LoggingManifestsProvider {
    data_sources: BTreeMap<&'static str, Box<dyn DataSource>>,
}

impl LoggingManifestsProvider {
    /// A provider with every logging operator kind registered.
    pub fn new() -> Self {
        Self::empty()
            .with_kind::<Logging>()
            .with_kind::<FluentbitAgent>()
            .with_kind::<Output>()
            .with_kind::<ClusterOutput>()
            .with_kind::<Flow>()
            .with_kind::<ClusterFlow>()
            .with_kind::<SyslogNgOutput>()
            .with_kind::<SyslogNgClusterOutput>()
            .with_kind::<SyslogNgFlow>()
            .with_kind::<SyslogNgClusterFlow>()
            .with_kind::<LoggingRoute>()
            .with_kind::<EventTailer>()
            .with_kind::<HostTailer>()
    }

    /// A provider without data sources.
    pub fn empty() -> Self {
        Self {
            data_sources: BTreeMap::new(),
        }
    }

    /// Register the manifest data source of kind `K`.
    pub fn with_kind<K: ManifestKind>(self) -> Self {
        self.with_data_source(ManifestDataSource::<K>::new())
    }

    /// Register a data source, replacing any with the same type name.
    pub fn with_data_source(mut self, data_source: impl DataSource + 'static) -> Self {
        self.data_sources
            .insert(data_source.type_name(), Box::new(data_source));
        self
    }

    /// Registered data source type names, sorted.
    pub fn data_source_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.data_sources.keys().copied()
    }

    fn data_source(&self, data_source_type: &str) -> Result<&dyn DataSource, ProviderError> {
        self.data_sources
            .get(data_source_type)
            .map(|data_source| data_source.as_ref())
            .ok_or_else(|| ProviderError::UnknownDataSource(data_source_type.to_string()))
    }
}

impl Default for LoggingManifestsProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ProviderService for LoggingManifestsProvider {
    fn schema(&self) -> ProviderSchema {
        self.data_sources.iter().fold(
            ProviderSchema::new().with_provider_config(
                Schema::v0().with_description("The provider takes no configuration."),
            ),
            |schema, (name, data_source)| schema.with_data_source(*name, data_source.schema()),
        )
    }

    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        debug!(config_is_null = config.is_null(), "Provider configured");
        Ok(vec![])
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let data_source = self.data_source(data_source_type)?;
        Ok(validate(&data_source.schema(), &config))
    }

    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let data_source = self.data_source(data_source_type)?;
        validate_result(&data_source.schema(), &config).map_err(|diagnostics| {
            let summaries: Vec<_> = diagnostics.into_iter().map(|d| d.summary).collect();
            ProviderError::Validation(summaries.join("; "))
        })?;
        data_source.read(config)
    }
}
