//! `Logging`: the root resource of a logging pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::common::{ImageSpec, KubernetesVolume, Metrics, Security};
use super::flow::Filter;
use crate::k8s::{Affinity, EnvVar, LabelSelector, ResourceRequirements, Toleration};
use crate::manifest::ManifestKind;
use crate::schema::{Attribute, Block, NestedBlock, SchemaBlock, Validator};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct LoggingSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging_ref: Option<String>,
    pub control_namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch_namespaces: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch_namespace_selector: Option<LabelSelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_cluster_resources_from_all_namespaces: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_recreate_workload_on_immutable_field_change: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_config_check_disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_config_override: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_invalid_resources: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_check: Option<ConfigCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_flow: Option<DefaultFlowSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_output_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_filters: Option<Vec<Filter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fluentd: Option<FluentdSpec>,
    #[serde(
        rename(serialize = "syslogNG"),
        skip_serializing_if = "Option::is_none"
    )]
    pub syslog_ng: Option<SyslogNgSpec>,
}

impl SchemaBlock for LoggingSpec {
    fn schema_block() -> Block {
        Block::new()
            .with_description("LoggingSpec defines the desired state of Logging.")
            .with_attribute("logging_ref", Attribute::optional_string())
            .with_attribute(
                "control_namespace",
                Attribute::required_string()
                    .with_description("Namespace for cluster wide configuration resources.")
                    .with_validator(Validator::DnsLabel),
            )
            .with_attribute(
                "watch_namespaces",
                Attribute::optional_string_list()
                    .with_description("Limit namespaces to watch Flow and Output custom resources."),
            )
            .with_block(
                "watch_namespace_selector",
                NestedBlock::single_of::<LabelSelector>(),
            )
            .with_attribute("cluster_domain", Attribute::optional_string())
            .with_attribute(
                "allow_cluster_resources_from_all_namespaces",
                Attribute::optional_bool(),
            )
            .with_attribute(
                "enable_recreate_workload_on_immutable_field_change",
                Attribute::optional_bool(),
            )
            .with_attribute("flow_config_check_disabled", Attribute::optional_bool())
            .with_attribute("flow_config_override", Attribute::optional_string())
            .with_attribute("skip_invalid_resources", Attribute::optional_bool())
            .with_block("config_check", NestedBlock::single_of::<ConfigCheck>())
            .with_block("default_flow", NestedBlock::single_of::<DefaultFlowSpec>())
            .with_attribute("error_output_ref", Attribute::optional_string())
            .with_block("global_filters", NestedBlock::list_of::<Filter>())
            .with_block("fluentd", NestedBlock::single_of::<FluentdSpec>())
            .with_block("syslog_ng", NestedBlock::single_of::<SyslogNgSpec>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct ConfigCheck {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
}

impl SchemaBlock for ConfigCheck {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute(
                "strategy",
                Attribute::optional_string()
                    .with_validator(Validator::one_of(["DryRun", "StartWithTimeout"])),
            )
            .with_attribute(
                "timeout_seconds",
                Attribute::optional_int64().with_validator(Validator::IntAtLeast { min: 0 }),
            )
            .with_attribute("labels", Attribute::optional_string_map())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct DefaultFlowSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Filter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_output_refs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_label_in_router: Option<bool>,
}

impl SchemaBlock for DefaultFlowSpec {
    fn schema_block() -> Block {
        Block::new()
            .with_description("Flow applied to logs no other flow matched.")
            .with_block("filters", NestedBlock::list_of::<Filter>())
            .with_attribute("global_output_refs", Attribute::optional_string_list())
            .with_attribute("flow_label", Attribute::optional_string())
            .with_attribute("include_label_in_router", Attribute::optional_bool())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct FluentdSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_reloader_image: Option<ImageSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<FluentdTls>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_same_log_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_repeated_log_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_msgpack_time_support: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_pvc: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_storage_volume: Option<KubernetesVolume>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scaling: Option<FluentdScaling>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_volume_metrics: Option<Metrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Security>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_vars: Option<Vec<EnvVar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerations: Option<Vec<Toleration>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affinity: Option<Affinity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_priority_class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

impl SchemaBlock for FluentdSpec {
    fn schema_block() -> Block {
        Block::new()
            .with_description("Fluentd statefulset configuration.")
            .with_block("image", NestedBlock::single_of::<ImageSpec>())
            .with_block("config_reloader_image", NestedBlock::single_of::<ImageSpec>())
            .with_block("tls", NestedBlock::single_of::<FluentdTls>())
            .with_attribute(
                "port",
                Attribute::optional_int64().with_validator(Validator::port()),
            )
            .with_attribute(
                "workers",
                Attribute::optional_int64().with_validator(Validator::IntAtLeast { min: 1 }),
            )
            .with_attribute("root_dir", Attribute::optional_string())
            .with_attribute(
                "log_level",
                Attribute::optional_string().with_validator(Validator::one_of([
                    "fatal", "error", "warn", "info", "debug", "trace",
                ])),
            )
            .with_attribute("ignore_same_log_interval", Attribute::optional_string())
            .with_attribute("ignore_repeated_log_interval", Attribute::optional_string())
            .with_attribute("enable_msgpack_time_support", Attribute::optional_bool())
            .with_attribute("disable_pvc", Attribute::optional_bool())
            .with_block(
                "buffer_storage_volume",
                NestedBlock::single_of::<KubernetesVolume>(),
            )
            .with_block("scaling", NestedBlock::single_of::<FluentdScaling>())
            .with_block("metrics", NestedBlock::single_of::<Metrics>())
            .with_block("buffer_volume_metrics", NestedBlock::single_of::<Metrics>())
            .with_block("security", NestedBlock::single_of::<Security>())
            .with_block("resources", NestedBlock::single_of::<ResourceRequirements>())
            .with_block("env_vars", NestedBlock::list_of::<EnvVar>())
            .with_block("tolerations", NestedBlock::list_of::<Toleration>())
            .with_block("affinity", NestedBlock::single_of::<Affinity>())
            .with_attribute("node_selector", Attribute::optional_string_map())
            .with_attribute("pod_priority_class_name", Attribute::optional_string())
            .with_attribute("labels", Attribute::optional_string_map())
            .with_attribute("annotations", Attribute::optional_string_map())
    }
}

/// TLS settings shared by the fluentd and syslog-ng aggregators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct FluentdTls {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_key: Option<String>,
}

impl SchemaBlock for FluentdTls {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("enabled", Attribute::required_bool())
            .with_attribute("secret_name", Attribute::optional_string())
            .with_attribute("shared_key", Attribute::optional_string().sensitive())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct FluentdScaling {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_management_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drain: Option<FluentdDrainConfig>,
}

impl SchemaBlock for FluentdScaling {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute(
                "replicas",
                Attribute::optional_int64().with_validator(Validator::IntAtLeast { min: 0 }),
            )
            .with_attribute(
                "pod_management_policy",
                Attribute::optional_string()
                    .with_validator(Validator::one_of(["OrderedReady", "Parallel"])),
            )
            .with_block("drain", NestedBlock::single_of::<FluentdDrainConfig>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct FluentdDrainConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_volume: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_image: Option<ImageSpec>,
}

impl SchemaBlock for FluentdDrainConfig {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("enabled", Attribute::optional_bool())
            .with_attribute("delete_volume", Attribute::optional_bool())
            .with_block("image", NestedBlock::single_of::<ImageSpec>())
            .with_block("pause_image", NestedBlock::single_of::<ImageSpec>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct SyslogNgSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<FluentdTls>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<i64>,
    #[serde(
        rename(serialize = "logIWSize"),
        skip_serializing_if = "Option::is_none"
    )]
    pub log_iw_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_key_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_key_delim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_options: Option<GlobalOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_date_parser: Option<SourceDateParser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_volume_metrics: Option<Metrics>,
}

impl SchemaBlock for SyslogNgSpec {
    fn schema_block() -> Block {
        Block::new()
            .with_description("Syslog-NG statefulset configuration.")
            .with_block("tls", NestedBlock::single_of::<FluentdTls>())
            .with_attribute(
                "max_connections",
                Attribute::optional_int64().with_validator(Validator::IntAtLeast { min: 1 }),
            )
            .with_attribute(
                "log_iw_size",
                Attribute::optional_int64().with_validator(Validator::IntAtLeast { min: 0 }),
            )
            .with_attribute("json_key_prefix", Attribute::optional_string())
            .with_attribute("json_key_delim", Attribute::optional_string())
            .with_block("global_options", NestedBlock::single_of::<GlobalOptions>())
            .with_block(
                "source_date_parser",
                NestedBlock::single_of::<SourceDateParser>(),
            )
            .with_block("metrics", NestedBlock::single_of::<Metrics>())
            .with_block("buffer_volume_metrics", NestedBlock::single_of::<Metrics>())
    }
}

/// syslog-ng `options {}`; keys keep syslog-ng's snake_case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,
}

impl SchemaBlock for GlobalOptions {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute(
                "log_level",
                Attribute::optional_string()
                    .with_validator(Validator::one_of(["debug", "trace", "verbose", "default"])),
            )
            .with_block("stats", NestedBlock::single_of::<Stats>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freq: Option<i64>,
}

impl SchemaBlock for Stats {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute(
                "level",
                Attribute::optional_int64().with_validator(Validator::IntBetween { min: 0, max: 3 }),
            )
            .with_attribute(
                "freq",
                Attribute::optional_int64().with_validator(Validator::IntAtLeast { min: 0 }),
            )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceDateParser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl SchemaBlock for SourceDateParser {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("format", Attribute::optional_string())
            .with_attribute("template", Attribute::optional_string())
    }
}

pub struct Logging;

impl ManifestKind for Logging {
    const DATA_SOURCE: &'static str = "k8s_logging_banzaicloud_io_logging_v1beta1_manifest";
    const API_VERSION: &'static str = "logging.banzaicloud.io/v1beta1";
    const KIND: &'static str = "Logging";
    const NAMESPACED: bool = false;
    const SPEC_REQUIRED: bool = true;
    const DESCRIPTION: &'static str = "Logging is the Schema for the loggings API";
    type Spec = LoggingSpec;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{manifest_schema, render};
    use crate::validation::validate;
    use serde_json::json;

    #[test]
    fn test_minimal_logging_golden() {
        let yaml = render::<Logging>(&json!({
            "metadata": {"name": "example"},
            "spec": {"control_namespace": "logging"}
        }))
        .unwrap();

        assert_eq!(
            yaml,
            "apiVersion: logging.banzaicloud.io/v1beta1\n\
             kind: Logging\n\
             metadata:\n  name: example\n\
             spec:\n  controlNamespace: logging\n"
        );
    }

    #[test]
    fn test_fluentd_and_syslog_ng_names() {
        let yaml = render::<Logging>(&json!({
            "metadata": {"name": "example", "labels": {"team": "platform"}},
            "spec": {
                "control_namespace": "logging",
                "config_check": {"strategy": "StartWithTimeout", "timeout_seconds": 10},
                "fluentd": {
                    "workers": 2,
                    "log_level": "debug",
                    "scaling": {"replicas": 3, "drain": {"enabled": true}},
                    "buffer_storage_volume": {"pvc": {"spec": {"storage_class_name": "fast"}}}
                },
                "syslog_ng": {"log_iw_size": 1000, "json_key_delim": "~"},
                "global_filters": [{"dedot": {"de_dot_separator": "_"}}]
            }
        }))
        .unwrap();

        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        let spec = &doc["spec"];
        assert_eq!(doc["metadata"]["labels"]["team"], "platform");
        assert_eq!(spec["configCheck"]["strategy"], "StartWithTimeout");
        assert_eq!(spec["configCheck"]["timeoutSeconds"], 10);
        assert_eq!(spec["fluentd"]["workers"], 2);
        assert_eq!(spec["fluentd"]["logLevel"], "debug");
        assert_eq!(spec["fluentd"]["scaling"]["drain"]["enabled"], true);
        assert_eq!(
            spec["fluentd"]["bufferStorageVolume"]["pvc"]["spec"]["storageClassName"],
            "fast"
        );
        assert_eq!(spec["syslogNG"]["logIWSize"], 1000);
        assert_eq!(spec["syslogNG"]["jsonKeyDelim"], "~");
        assert_eq!(spec["globalFilters"][0]["dedot"]["de_dot_separator"], "_");
        assert!(spec.get("watchNamespaces").is_none());
    }

    #[test]
    fn test_logging_requires_control_namespace() {
        let schema = manifest_schema::<Logging>();

        let diagnostics = validate(&schema, &json!({"metadata": {"name": "example"}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("spec".to_string()));

        let diagnostics = validate(
            &schema,
            &json!({"metadata": {"name": "example"}, "spec": {"watch_namespaces": ["a"]}}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute,
            Some("spec.control_namespace".to_string())
        );
    }

    #[test]
    fn test_fluentd_log_level_validated() {
        let diagnostics = validate(
            &manifest_schema::<Logging>(),
            &json!({
                "metadata": {"name": "example"},
                "spec": {"control_namespace": "logging", "fluentd": {"log_level": "chatty", "workers": 0}}
            }),
        );
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|d| d
            .attribute
            .as_deref()
            .is_some_and(|a| a.starts_with("spec.fluentd."))));
    }
}
