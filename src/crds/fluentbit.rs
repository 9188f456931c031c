//! `FluentbitAgent`: the node-level log collector.
//!
//! Fields passed straight into the fluent-bit configuration keep
//! fluent-bit's own spelling (`Mem_Buf_Limit`, `K8S-Logging.Parser`, ...).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::common::{ImageSpec, KubernetesVolume, Metrics, Security};
use crate::k8s::{Affinity, EnvVar, ResourceRequirements, Toleration};
use crate::manifest::ManifestKind;
use crate::schema::{Attribute, Block, NestedBlock, SchemaBlock, Validator};

fn switch() -> Attribute {
    Attribute::optional_string().with_validator(Validator::on_off())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct FluentbitAgentSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<FluentbitTls>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flush: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coro_stack_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tail: Option<InputTail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_kubernetes: Option<FilterKubernetes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_kubernetes_filter: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_storage: Option<BufferStorage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_storage_volume: Option<KubernetesVolume>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positiondb: Option<KubernetesVolume>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Security>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<FluentbitNetwork>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_volume_mounts: Option<Vec<FluentbitVolumeMount>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_vars: Option<Vec<EnvVar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
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

impl SchemaBlock for FluentbitAgentSpec {
    fn schema_block() -> Block {
        Block::new()
            .with_description("FluentbitSpec defines the desired state of FluentbitAgent.")
            .with_attribute("logging_ref", Attribute::optional_string())
            .with_block("image", NestedBlock::single_of::<ImageSpec>())
            .with_block("tls", NestedBlock::single_of::<FluentbitTls>())
            .with_attribute(
                "target_host",
                Attribute::optional_string().with_description("Host of the aggregator to forward to."),
            )
            .with_attribute(
                "target_port",
                Attribute::optional_int64().with_validator(Validator::port()),
            )
            .with_attribute(
                "flush",
                Attribute::optional_int64()
                    .with_description("Interval in seconds to flush output.")
                    .with_validator(Validator::IntAtLeast { min: 0 }),
            )
            .with_attribute(
                "grace",
                Attribute::optional_int64().with_validator(Validator::IntAtLeast { min: 0 }),
            )
            .with_attribute(
                "log_level",
                Attribute::optional_string().with_validator(Validator::one_of([
                    "off", "error", "warn", "info", "debug", "trace",
                ])),
            )
            .with_attribute(
                "coro_stack_size",
                Attribute::optional_int64().with_validator(Validator::IntAtLeast { min: 0 }),
            )
            .with_block("input_tail", NestedBlock::single_of::<InputTail>())
            .with_block("filter_kubernetes", NestedBlock::single_of::<FilterKubernetes>())
            .with_attribute("disable_kubernetes_filter", Attribute::optional_bool())
            .with_block("buffer_storage", NestedBlock::single_of::<BufferStorage>())
            .with_block(
                "buffer_storage_volume",
                NestedBlock::single_of::<KubernetesVolume>(),
            )
            .with_block(
                "positiondb",
                NestedBlock::single_of::<KubernetesVolume>()
                    .with_description("Volume holding the tail input's position database."),
            )
            .with_block("metrics", NestedBlock::single_of::<Metrics>())
            .with_block("security", NestedBlock::single_of::<Security>())
            .with_block("network", NestedBlock::single_of::<FluentbitNetwork>())
            .with_block(
                "extra_volume_mounts",
                NestedBlock::list_of::<FluentbitVolumeMount>(),
            )
            .with_block("env_vars", NestedBlock::list_of::<EnvVar>())
            .with_block("resources", NestedBlock::single_of::<ResourceRequirements>())
            .with_block("tolerations", NestedBlock::list_of::<Toleration>())
            .with_block("affinity", NestedBlock::single_of::<Affinity>())
            .with_attribute("node_selector", Attribute::optional_string_map())
            .with_attribute("pod_priority_class_name", Attribute::optional_string())
            .with_attribute("labels", Attribute::optional_string_map())
            .with_attribute("annotations", Attribute::optional_string_map())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct FluentbitTls {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_key: Option<String>,
}

impl SchemaBlock for FluentbitTls {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("enabled", Attribute::required_bool())
            .with_attribute("secret_name", Attribute::optional_string())
            .with_attribute("shared_key", Attribute::optional_string().sensitive())
    }
}

/// The `tail` input plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputTail {
    #[serde(rename(serialize = "Path"), skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(rename(serialize = "Path_Key"), skip_serializing_if = "Option::is_none")]
    pub path_key: Option<String>,
    #[serde(rename(serialize = "Exclude_Path"), skip_serializing_if = "Option::is_none")]
    pub exclude_path: Option<String>,
    #[serde(rename(serialize = "Tag"), skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(rename(serialize = "Tag_Regex"), skip_serializing_if = "Option::is_none")]
    pub tag_regex: Option<String>,
    #[serde(rename(serialize = "Buffer_Chunk_Size"), skip_serializing_if = "Option::is_none")]
    pub buffer_chunk_size: Option<String>,
    #[serde(rename(serialize = "Buffer_Max_Size"), skip_serializing_if = "Option::is_none")]
    pub buffer_max_size: Option<String>,
    #[serde(rename(serialize = "Mem_Buf_Limit"), skip_serializing_if = "Option::is_none")]
    pub mem_buf_limit: Option<String>,
    #[serde(rename(serialize = "Refresh_Interval"), skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<String>,
    #[serde(rename(serialize = "Rotate_Wait"), skip_serializing_if = "Option::is_none")]
    pub rotate_wait: Option<String>,
    #[serde(rename(serialize = "Ignore_Older"), skip_serializing_if = "Option::is_none")]
    pub ignore_older: Option<String>,
    #[serde(rename(serialize = "Skip_Long_Lines"), skip_serializing_if = "Option::is_none")]
    pub skip_long_lines: Option<String>,
    #[serde(rename(serialize = "DB"), skip_serializing_if = "Option::is_none")]
    pub db: Option<String>,
    #[serde(rename(serialize = "DB_Sync"), skip_serializing_if = "Option::is_none")]
    pub db_sync: Option<String>,
    #[serde(rename(serialize = "Docker_Mode"), skip_serializing_if = "Option::is_none")]
    pub docker_mode: Option<String>,
    #[serde(rename(serialize = "Parser"), skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,
    #[serde(rename(serialize = "multiline.parser"), skip_serializing_if = "Option::is_none")]
    pub multiline_parser: Option<Vec<String>>,
    #[serde(rename(serialize = "storage.type"), skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,
}

impl SchemaBlock for InputTail {
    fn schema_block() -> Block {
        Block::new()
            .with_description("Tail input plugin configuration.")
            .with_attribute("path", Attribute::optional_string())
            .with_attribute("path_key", Attribute::optional_string())
            .with_attribute("exclude_path", Attribute::optional_string())
            .with_attribute("tag", Attribute::optional_string())
            .with_attribute("tag_regex", Attribute::optional_string())
            .with_attribute("buffer_chunk_size", Attribute::optional_string())
            .with_attribute("buffer_max_size", Attribute::optional_string())
            .with_attribute(
                "mem_buf_limit",
                Attribute::optional_string()
                    .with_description("Memory limit of the plugin while appending data, e.g. 5MB."),
            )
            .with_attribute("refresh_interval", Attribute::optional_string())
            .with_attribute("rotate_wait", Attribute::optional_string())
            .with_attribute("ignore_older", Attribute::optional_string())
            .with_attribute("skip_long_lines", switch())
            .with_attribute("db", Attribute::optional_string())
            .with_attribute(
                "db_sync",
                Attribute::optional_string()
                    .with_validator(Validator::one_of(["Extra", "Full", "Normal", "Off"])),
            )
            .with_attribute("docker_mode", switch())
            .with_attribute("parser", Attribute::optional_string())
            .with_attribute("multiline_parser", Attribute::optional_string_list())
            .with_attribute(
                "storage_type",
                Attribute::optional_string().with_validator(Validator::one_of(["filesystem", "memory"])),
            )
    }
}

/// The `kubernetes` filter plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterKubernetes {
    #[serde(rename(serialize = "Match"), skip_serializing_if = "Option::is_none")]
    pub r#match: Option<String>,
    #[serde(rename(serialize = "Buffer_Size"), skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<String>,
    #[serde(rename(serialize = "Kube_URL"), skip_serializing_if = "Option::is_none")]
    pub kube_url: Option<String>,
    #[serde(rename(serialize = "Kube_CA_File"), skip_serializing_if = "Option::is_none")]
    pub kube_ca_file: Option<String>,
    #[serde(rename(serialize = "Kube_Token_File"), skip_serializing_if = "Option::is_none")]
    pub kube_token_file: Option<String>,
    #[serde(rename(serialize = "Kube_Tag_Prefix"), skip_serializing_if = "Option::is_none")]
    pub kube_tag_prefix: Option<String>,
    #[serde(rename(serialize = "Kube_Meta_Cache_TTL"), skip_serializing_if = "Option::is_none")]
    pub kube_meta_cache_ttl: Option<String>,
    #[serde(rename(serialize = "Merge_Log"), skip_serializing_if = "Option::is_none")]
    pub merge_log: Option<String>,
    #[serde(rename(serialize = "Merge_Log_Key"), skip_serializing_if = "Option::is_none")]
    pub merge_log_key: Option<String>,
    #[serde(rename(serialize = "Keep_Log"), skip_serializing_if = "Option::is_none")]
    pub keep_log: Option<String>,
    #[serde(rename(serialize = "tls.verify"), skip_serializing_if = "Option::is_none")]
    pub tls_verify: Option<String>,
    #[serde(rename(serialize = "Use_Journal"), skip_serializing_if = "Option::is_none")]
    pub use_journal: Option<String>,
    #[serde(rename(serialize = "Labels"), skip_serializing_if = "Option::is_none")]
    pub labels: Option<String>,
    #[serde(rename(serialize = "Annotations"), skip_serializing_if = "Option::is_none")]
    pub annotations: Option<String>,
    #[serde(rename(serialize = "K8S-Logging.Parser"), skip_serializing_if = "Option::is_none")]
    pub k8s_logging_parser: Option<String>,
    #[serde(rename(serialize = "K8S-Logging.Exclude"), skip_serializing_if = "Option::is_none")]
    pub k8s_logging_exclude: Option<String>,
}

impl SchemaBlock for FilterKubernetes {
    fn schema_block() -> Block {
        Block::new()
            .with_description("Kubernetes metadata filter configuration.")
            .with_attribute("match", Attribute::optional_string())
            .with_attribute("buffer_size", Attribute::optional_string())
            .with_attribute("kube_url", Attribute::optional_string())
            .with_attribute("kube_ca_file", Attribute::optional_string())
            .with_attribute("kube_token_file", Attribute::optional_string())
            .with_attribute("kube_tag_prefix", Attribute::optional_string())
            .with_attribute("kube_meta_cache_ttl", Attribute::optional_string())
            .with_attribute("merge_log", switch())
            .with_attribute("merge_log_key", Attribute::optional_string())
            .with_attribute("keep_log", switch())
            .with_attribute("tls_verify", switch())
            .with_attribute("use_journal", switch())
            .with_attribute("labels", switch())
            .with_attribute("annotations", switch())
            .with_attribute("k8s_logging_parser", switch())
            .with_attribute("k8s_logging_exclude", switch())
    }
}

/// Filesystem buffering of the fluent-bit service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BufferStorage {
    #[serde(rename(serialize = "storage.path"), skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
    #[serde(rename(serialize = "storage.sync"), skip_serializing_if = "Option::is_none")]
    pub storage_sync: Option<String>,
    #[serde(rename(serialize = "storage.checksum"), skip_serializing_if = "Option::is_none")]
    pub storage_checksum: Option<String>,
    #[serde(
        rename(serialize = "storage.backlog.mem_limit"),
        skip_serializing_if = "Option::is_none"
    )]
    pub storage_backlog_mem_limit: Option<String>,
    #[serde(rename(serialize = "storage.metrics"), skip_serializing_if = "Option::is_none")]
    pub storage_metrics: Option<String>,
}

impl SchemaBlock for BufferStorage {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("storage_path", Attribute::optional_string())
            .with_attribute(
                "storage_sync",
                Attribute::optional_string().with_validator(Validator::one_of(["normal", "full"])),
            )
            .with_attribute("storage_checksum", switch())
            .with_attribute("storage_backlog_mem_limit", Attribute::optional_string())
            .with_attribute("storage_metrics", switch())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct FluentbitNetwork {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout_log_error: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_prefer_ipv4: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_resolver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keepalive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keepalive_idle_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keepalive_max_recycle: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_address: Option<String>,
}

impl SchemaBlock for FluentbitNetwork {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute(
                "connect_timeout",
                Attribute::optional_int64().with_validator(Validator::IntAtLeast { min: 0 }),
            )
            .with_attribute("connect_timeout_log_error", Attribute::optional_bool())
            .with_attribute(
                "dns_mode",
                Attribute::optional_string().with_validator(Validator::one_of(["UDP", "TCP"])),
            )
            .with_attribute("dns_prefer_ipv4", Attribute::optional_bool())
            .with_attribute(
                "dns_resolver",
                Attribute::optional_string().with_validator(Validator::one_of(["LEGACY", "ASYNC"])),
            )
            .with_attribute("keepalive", Attribute::optional_bool())
            .with_attribute(
                "keepalive_idle_timeout",
                Attribute::optional_int64().with_validator(Validator::IntAtLeast { min: 0 }),
            )
            .with_attribute(
                "keepalive_max_recycle",
                Attribute::optional_int64().with_validator(Validator::IntAtLeast { min: 0 }),
            )
            .with_attribute("source_address", Attribute::optional_string())
    }
}

/// A host directory mounted into the fluent-bit pods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct FluentbitVolumeMount {
    pub source: String,
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
}

impl SchemaBlock for FluentbitVolumeMount {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("source", Attribute::required_string())
            .with_attribute("destination", Attribute::required_string())
            .with_attribute("read_only", Attribute::optional_bool())
    }
}

pub struct FluentbitAgent;

impl ManifestKind for FluentbitAgent {
    const DATA_SOURCE: &'static str = "k8s_logging_banzaicloud_io_fluentbit_agent_v1beta1_manifest";
    const API_VERSION: &'static str = "logging.banzaicloud.io/v1beta1";
    const KIND: &'static str = "FluentbitAgent";
    const NAMESPACED: bool = false;
    const DESCRIPTION: &'static str = "FluentbitAgent is the Schema for the loggings API";
    type Spec = FluentbitAgentSpec;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{manifest_schema, render};
    use crate::validation::validate;
    use serde_json::json;

    #[test]
    fn test_fluentbit_agent_field_spellings() {
        let yaml = render::<FluentbitAgent>(&json!({
            "metadata": {"name": "infra"},
            "spec": {
                "logging_ref": "infra",
                "input_tail": {"mem_buf_limit": "5MB", "skip_long_lines": "On"},
                "filter_kubernetes": {"k8s_logging_parser": "On", "kube_url": null},
                "buffer_storage": {"storage_path": "/buffers"},
                "positiondb": {"host_path": {"path": "/var/lib/fluent-bit"}},
                "network": {"dns_prefer_ipv4": true}
            }
        }))
        .unwrap();

        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(doc["kind"], "FluentbitAgent");
        assert!(doc["metadata"].get("namespace").is_none());

        let spec = &doc["spec"];
        assert_eq!(spec["loggingRef"], "infra");
        assert_eq!(spec["inputTail"]["Mem_Buf_Limit"], "5MB");
        assert_eq!(spec["inputTail"]["Skip_Long_Lines"], "On");
        assert_eq!(spec["filterKubernetes"]["K8S-Logging.Parser"], "On");
        assert!(spec["filterKubernetes"].get("Kube_URL").is_none());
        assert_eq!(spec["bufferStorage"]["storage.path"], "/buffers");
        assert_eq!(spec["positiondb"]["hostPath"]["path"], "/var/lib/fluent-bit");
        assert_eq!(spec["network"]["dnsPreferIpv4"], true);
    }

    #[test]
    fn test_fluentbit_agent_switches_validated() {
        let schema = manifest_schema::<FluentbitAgent>();
        let diagnostics = validate(
            &schema,
            &json!({
                "metadata": {"name": "infra"},
                "spec": {
                    "input_tail": {"docker_mode": "true"},
                    "target_port": 0
                }
            }),
        );

        let mut paths: Vec<_> = diagnostics
            .iter()
            .filter_map(|d| d.attribute.clone())
            .collect();
        paths.sort();
        assert_eq!(paths, vec!["spec.input_tail.docker_mode", "spec.target_port"]);
    }

    #[test]
    fn test_tls_requires_enabled() {
        let schema = manifest_schema::<FluentbitAgent>();
        let diagnostics = validate(
            &schema,
            &json!({"metadata": {"name": "infra"}, "spec": {"tls": {"secret_name": "fb-tls"}}}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("spec.tls.enabled".to_string()));
    }
}
