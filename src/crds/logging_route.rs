//! `LoggingRoute`: connects the log collectors of one `Logging` to the
//! aggregators of others.

use serde::{Deserialize, Serialize};

use crate::k8s::LabelSelector;
use crate::manifest::ManifestKind;
use crate::schema::{Attribute, Block, NestedBlock, SchemaBlock};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingRouteSpec {
    pub source: String,
    pub targets: LabelSelector,
}

impl SchemaBlock for LoggingRouteSpec {
    fn schema_block() -> Block {
        Block::new()
            .with_description("LoggingRouteSpec defines the desired state of LoggingRoute.")
            .with_attribute(
                "source",
                Attribute::required_string()
                    .with_description("The logging reference of the agents that forward logs."),
            )
            .with_block(
                "targets",
                NestedBlock::single_of::<LabelSelector>()
                    .required()
                    .with_description("Label selector over the Logging resources receiving logs."),
            )
    }
}

pub struct LoggingRoute;

impl ManifestKind for LoggingRoute {
    const DATA_SOURCE: &'static str = "k8s_logging_banzaicloud_io_logging_route_v1beta1_manifest";
    const API_VERSION: &'static str = "logging.banzaicloud.io/v1beta1";
    const KIND: &'static str = "LoggingRoute";
    const NAMESPACED: bool = false;
    const SPEC_REQUIRED: bool = true;
    const DESCRIPTION: &'static str =
        "LoggingRoute connects a log collector with log aggregators from other logging domains";
    type Spec = LoggingRouteSpec;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{manifest_schema, render};
    use crate::validation::validate;
    use serde_json::json;

    #[test]
    fn test_logging_route_golden() {
        let yaml = render::<LoggingRoute>(&json!({
            "metadata": {"name": "ops"},
            "spec": {
                "source": "ops",
                "targets": {"match_labels": {"tenant": "dev"}}
            }
        }))
        .unwrap();

        assert_eq!(
            yaml,
            "apiVersion: logging.banzaicloud.io/v1beta1\n\
             kind: LoggingRoute\n\
             metadata:\n  name: ops\n\
             spec:\n  source: ops\n  targets:\n    matchLabels:\n      tenant: dev\n"
        );
    }

    #[test]
    fn test_logging_route_requires_targets() {
        let diagnostics = validate(
            &manifest_schema::<LoggingRoute>(),
            &json!({"metadata": {"name": "ops"}, "spec": {"source": "ops"}}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("spec.targets".to_string()));
    }
}
