//! Testing utilities for `ProviderService` implementations.
//!
//! [`ProviderTester`] drives a provider directly, without spinning up a
//! gRPC server.
//!
//! # Example
//!
//! ```
//! use logging_manifest_provider::testing::ProviderTester;
//! use logging_manifest_provider::LoggingManifestsProvider;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let tester = ProviderTester::new(LoggingManifestsProvider::new());
//! let yaml = tester
//!     .read_yaml(
//!         "k8s_logging_banzaicloud_io_flow_v1beta1_manifest",
//!         json!({"metadata": {"name": "nginx", "namespace": "default"}}),
//!     )
//!     .await
//!     .unwrap();
//! assert!(yaml.contains("kind: Flow"));
//! # });
//! ```

use crate::error::ProviderError;
use crate::manifest::YAML_ATTRIBUTE;
use crate::schema::{Diagnostic, DiagnosticSeverity, ProviderSchema};
use crate::server::ProviderService;
use serde_json::Value;

/// A test harness for provider implementations.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Create a new tester for the given provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Get the provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Get the list of data source type names.
    pub fn data_source_types(&self) -> Vec<String> {
        self.provider.metadata().data_sources
    }

    /// Validate provider configuration.
    ///
    /// Returns `Err` with the diagnostics if there are errors.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_provider_config(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Configure the provider.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Stop the provider.
    pub async fn stop(&self) -> Result<(), ProviderError> {
        self.provider.stop().await
    }

    /// Validate a data source configuration.
    pub async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_data_source_config(data_source_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Read a data source.
    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .read_data_source(data_source_type, config)
            .await
    }

    /// Validate, read, and return the rendered `yaml` attribute.
    pub async fn read_yaml(&self, data_source_type: &str, config: Value) -> Result<String, TestError> {
        self.validate_data_source_config(data_source_type, config.clone())
            .await?;
        let state = self.read_data_source(data_source_type, config).await?;
        match state.get(YAML_ATTRIBUTE) {
            Some(Value::String(yaml)) => Ok(yaml.clone()),
            _ => Err(TestError::Provider(ProviderError::Sdk(format!(
                "state of {} has no '{}' string",
                data_source_type, YAML_ATTRIBUTE
            )))),
        }
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug)]
pub enum TestError {
    /// The operation failed with diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    Provider(ProviderError),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "Operation failed with {} diagnostic(s):", diags.len())?;
                for diag in diags {
                    write!(f, "  [{:?}] {}", diag.severity, diag.summary)?;
                    if let Some(detail) = &diag.detail {
                        write!(f, ": {}", detail)?;
                    }
                    if let Some(attr) = &diag.attribute {
                        write!(f, " (at {})", attr)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            },
            TestError::Provider(e) => write!(f, "Provider error: {}", e),
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics
        .iter()
        .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
        .collect();

    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain at least one error.
///
/// # Panics
///
/// Panics if there are no error diagnostics.
pub fn assert_has_errors(diagnostics: &[Diagnostic]) {
    let has_errors = diagnostics
        .iter()
        .any(|d| matches!(d.severity, DiagnosticSeverity::Error));

    assert!(has_errors, "Expected at least one error, but got none");
}

/// Assert that diagnostics contain an error with the given summary substring.
///
/// # Panics
///
/// Panics if no error diagnostic contains the given substring.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let has_matching_error = diagnostics
        .iter()
        .any(|d| matches!(d.severity, DiagnosticSeverity::Error) && d.summary.contains(substring));

    assert!(
        has_matching_error,
        "Expected an error containing '{}', but no matching error found. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain an error reported at `attribute`.
///
/// # Panics
///
/// Panics if no error diagnostic carries the attribute path.
pub fn assert_error_at(diagnostics: &[Diagnostic], attribute: &str) {
    let found = diagnostics
        .iter()
        .any(|d| d.is_error() && d.attribute.as_deref() == Some(attribute));

    assert!(
        found,
        "Expected an error at '{}', but errors were reported at: {:?}",
        attribute,
        diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| d.attribute.as_deref().unwrap_or("<root>"))
            .collect::<Vec<_>>()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crds::Flow;
    use crate::manifest::ManifestKind;
    use crate::provider::LoggingManifestsProvider;
    use serde_json::json;

    fn tester() -> ProviderTester<LoggingManifestsProvider> {
        ProviderTester::new(LoggingManifestsProvider::empty().with_kind::<Flow>())
    }

    #[tokio::test]
    async fn test_tester_configure() {
        let result = tester().configure(json!({})).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_tester_data_source_types() {
        let types = tester().data_source_types();
        assert_eq!(types, vec![Flow::DATA_SOURCE.to_string()]);
        assert!(tester().schema().data_sources.contains_key(Flow::DATA_SOURCE));
    }

    #[tokio::test]
    async fn test_tester_read_yaml() {
        let yaml = tester()
            .read_yaml(
                Flow::DATA_SOURCE,
                json!({"metadata": {"name": "all", "namespace": "default"}, "yaml": null}),
            )
            .await
            .unwrap();

        assert_eq!(
            yaml,
            "apiVersion: logging.banzaicloud.io/v1beta1\nkind: Flow\nmetadata:\n  name: all\n  namespace: default\n"
        );
    }

    #[tokio::test]
    async fn test_tester_read_yaml_reports_diagnostics() {
        let err = tester()
            .read_yaml(Flow::DATA_SOURCE, json!({"metadata": {"name": "all"}}))
            .await
            .unwrap_err();

        match err {
            TestError::Diagnostics(diagnostics) => {
                assert_error_at(&diagnostics, "metadata.namespace");
            },
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_assert_no_errors() {
        let diagnostics = vec![Diagnostic::warning("Just a warning")];
        assert_no_errors(&diagnostics);
    }

    #[test]
    #[should_panic(expected = "Expected no errors")]
    fn test_assert_no_errors_fails() {
        let diagnostics = vec![Diagnostic::error("An error")];
        assert_no_errors(&diagnostics);
    }

    #[test]
    fn test_assert_has_errors() {
        let diagnostics = vec![Diagnostic::error("An error")];
        assert_has_errors(&diagnostics);
    }

    #[test]
    fn test_assert_error_contains() {
        let diagnostics = vec![Diagnostic::error("Invalid configuration value")];
        assert_error_contains(&diagnostics, "Invalid");
        assert_error_contains(&diagnostics, "configuration");
    }

    #[test]
    #[should_panic(expected = "Expected an error at 'spec'")]
    fn test_assert_error_at_fails() {
        let diagnostics = vec![Diagnostic::error("Missing").with_attribute("metadata")];
        assert_error_at(&diagnostics, "spec");
    }

    #[test]
    fn test_test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("First error").with_attribute("field1"),
            Diagnostic::error("Second error").with_detail("More info"),
        ]);

        let display = format!("{}", err);
        assert!(display.contains("First error"));
        assert!(display.contains("Second error"));
        assert!(display.contains("field1"));
        assert!(display.contains("More info"));
    }
}
