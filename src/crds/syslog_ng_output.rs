//! `SyslogNGOutput` and `SyslogNGClusterOutput`: syslog-ng destination drivers.
//!
//! Driver options keep syslog-ng's snake_case names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::common::Secret;
use crate::manifest::ManifestKind;
use crate::schema::{Attribute, Block, NestedBlock, SchemaBlock, Validator};

fn secret() -> NestedBlock {
    NestedBlock::single_of::<Secret>()
}

fn non_negative() -> Attribute {
    Attribute::optional_int64().with_validator(Validator::IntAtLeast { min: 0 })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct SyslogNgOutputSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syslog: Option<SyslogDestination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileDestination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpDestination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loki: Option<LokiDestination>,
}

impl SchemaBlock for SyslogNgOutputSpec {
    fn schema_block() -> Block {
        Block::new()
            .with_description("SyslogNGOutputSpec defines the desired state of SyslogNGOutput.")
            .with_attribute("logging_ref", Attribute::optional_string())
            .with_block("syslog", NestedBlock::single_of::<SyslogDestination>())
            .with_block("file", NestedBlock::single_of::<FileDestination>())
            .with_block("http", NestedBlock::single_of::<HttpDestination>())
            .with_block("loki", NestedBlock::single_of::<LokiDestination>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct SyslogNgClusterOutputSpec {
    #[serde(flatten)]
    pub output: SyslogNgOutputSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_namespaces: Option<Vec<String>>,
}

impl SchemaBlock for SyslogNgClusterOutputSpec {
    fn schema_block() -> Block {
        SyslogNgOutputSpec::schema_block()
            .with_description(
                "SyslogNGClusterOutputSpec contains Kubernetes spec for SyslogNGClusterOutput.",
            )
            .with_attribute("enabled_namespaces", Attribute::optional_string_list())
    }
}

/// Reliable on-disk buffering of a destination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskBuffer {
    pub disk_buf_size: i64,
    pub reliable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compaction: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mem_buf_length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mem_buf_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q_out_size: Option<i64>,
}

impl SchemaBlock for DiskBuffer {
    fn schema_block() -> Block {
        Block::new()
            .with_description("Disk buffer of the destination driver.")
            .with_attribute(
                "disk_buf_size",
                Attribute::required_int64()
                    .with_description("Maximum size of the disk buffer in bytes.")
                    .with_validator(Validator::IntAtLeast { min: 0 }),
            )
            .with_attribute("reliable", Attribute::required_bool())
            .with_attribute("compaction", Attribute::optional_bool())
            .with_attribute("dir", Attribute::optional_string())
            .with_attribute("mem_buf_length", non_negative())
            .with_attribute("mem_buf_size", non_negative())
            .with_attribute("q_out_size", non_negative())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tls {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_dir: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_file: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_file: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_file: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_verify: Option<bool>,
    #[serde(
        rename(serialize = "use-system-cert-store"),
        skip_serializing_if = "Option::is_none"
    )]
    pub use_system_cert_store: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cipher_suite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_version: Option<String>,
}

impl SchemaBlock for Tls {
    fn schema_block() -> Block {
        Block::new()
            .with_block("ca_dir", secret())
            .with_block("ca_file", secret())
            .with_block("key_file", secret())
            .with_block("cert_file", secret())
            .with_attribute("peer_verify", Attribute::optional_bool())
            .with_attribute("use_system_cert_store", Attribute::optional_bool())
            .with_attribute("cipher_suite", Attribute::optional_string())
            .with_attribute(
                "ssl_version",
                Attribute::optional_string().with_validator(Validator::one_of([
                    "sslv3", "tlsv1", "tlsv1_0", "tlsv1_1", "tlsv1_2", "tlsv1_3",
                ])),
            )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyslogDestination {
    pub host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_on_input: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flush_lines: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub so_keepalive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suppress: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<Tls>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_buffer: Option<DiskBuffer>,
}

impl SchemaBlock for SyslogDestination {
    fn schema_block() -> Block {
        Block::new()
            .with_description("RFC5424 syslog destination.")
            .with_attribute("host", Attribute::required_string())
            .with_attribute(
                "port",
                Attribute::optional_int64().with_validator(Validator::port()),
            )
            .with_attribute(
                "transport",
                Attribute::optional_string().with_validator(Validator::one_of(["tcp", "udp", "tls"])),
            )
            .with_attribute("close_on_input", Attribute::optional_bool())
            .with_attribute("flags", Attribute::optional_string_list())
            .with_attribute("flush_lines", non_negative())
            .with_attribute("so_keepalive", Attribute::optional_bool())
            .with_attribute("suppress", non_negative())
            .with_attribute("template", Attribute::optional_string())
            .with_attribute(
                "ts_format",
                Attribute::optional_string()
                    .with_validator(Validator::one_of(["rfc3164", "bsd", "rfc3339", "iso"])),
            )
            .with_attribute("persist_name", Attribute::optional_string())
            .with_block("tls", NestedBlock::single_of::<Tls>())
            .with_block("disk_buffer", NestedBlock::single_of::<DiskBuffer>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileDestination {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_dirs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir_owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir_perm: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_buffer: Option<DiskBuffer>,
}

impl SchemaBlock for FileDestination {
    fn schema_block() -> Block {
        Block::new()
            .with_description("File destination.")
            .with_attribute("path", Attribute::required_string())
            .with_attribute("create_dirs", Attribute::optional_bool())
            .with_attribute("dir_group", Attribute::optional_string())
            .with_attribute("dir_owner", Attribute::optional_string())
            .with_attribute("dir_perm", non_negative())
            .with_attribute("template", Attribute::optional_string())
            .with_attribute("persist_name", Attribute::optional_string())
            .with_block("disk_buffer", NestedBlock::single_of::<DiskBuffer>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpDestination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_lines: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_bytes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<Tls>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_buffer: Option<DiskBuffer>,
}

impl SchemaBlock for HttpDestination {
    fn schema_block() -> Block {
        Block::new()
            .with_description("HTTP destination.")
            .with_attribute("url", Attribute::optional_string())
            .with_attribute(
                "method",
                Attribute::optional_string().with_validator(Validator::one_of(["POST", "PUT"])),
            )
            .with_attribute("headers", Attribute::optional_string_list())
            .with_attribute("user", Attribute::optional_string())
            .with_block("password", secret())
            .with_attribute("user_agent", Attribute::optional_string())
            .with_attribute("body", Attribute::optional_string())
            .with_attribute("batch_lines", non_negative())
            .with_attribute("batch_bytes", non_negative())
            .with_attribute("batch_timeout", non_negative())
            .with_attribute("timeout", non_negative())
            .with_attribute(
                "workers",
                Attribute::optional_int64().with_validator(Validator::IntAtLeast { min: 1 }),
            )
            .with_attribute("persist_name", Attribute::optional_string())
            .with_block("tls", NestedBlock::single_of::<Tls>())
            .with_block("disk_buffer", NestedBlock::single_of::<DiskBuffer>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LokiDestination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_lines: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_buffer: Option<DiskBuffer>,
}

impl SchemaBlock for LokiDestination {
    fn schema_block() -> Block {
        Block::new()
            .with_description("Grafana Loki destination.")
            .with_attribute("url", Attribute::optional_string())
            .with_attribute(
                "labels",
                Attribute::optional_string_map()
                    .with_description("Loki label name to syslog-ng template."),
            )
            .with_attribute("template", Attribute::optional_string())
            .with_attribute(
                "timestamp",
                Attribute::optional_string()
                    .with_validator(Validator::one_of(["current", "received", "msg"])),
            )
            .with_attribute("batch_lines", non_negative())
            .with_attribute("batch_timeout", non_negative())
            .with_attribute(
                "workers",
                Attribute::optional_int64().with_validator(Validator::IntAtLeast { min: 1 }),
            )
            .with_attribute("persist_name", Attribute::optional_string())
            .with_block("disk_buffer", NestedBlock::single_of::<DiskBuffer>())
    }
}

pub struct SyslogNgOutput;

impl ManifestKind for SyslogNgOutput {
    const DATA_SOURCE: &'static str = "k8s_logging_banzaicloud_io_syslog_ng_output_v1beta1_manifest";
    const API_VERSION: &'static str = "logging.banzaicloud.io/v1beta1";
    const KIND: &'static str = "SyslogNGOutput";
    const NAMESPACED: bool = true;
    const DESCRIPTION: &'static str = "SyslogNGOutput is the Schema for the syslog-ng outputs API";
    type Spec = SyslogNgOutputSpec;
}

pub struct SyslogNgClusterOutput;

impl ManifestKind for SyslogNgClusterOutput {
    const DATA_SOURCE: &'static str =
        "k8s_logging_banzaicloud_io_syslog_ng_cluster_output_v1beta1_manifest";
    const API_VERSION: &'static str = "logging.banzaicloud.io/v1beta1";
    const KIND: &'static str = "SyslogNGClusterOutput";
    const NAMESPACED: bool = true;
    const SPEC_REQUIRED: bool = true;
    const DESCRIPTION: &'static str =
        "SyslogNGClusterOutput is the Schema for the syslog-ng clusteroutputs API";
    type Spec = SyslogNgClusterOutputSpec;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{manifest_schema, render};
    use crate::validation::validate;
    use serde_json::json;

    #[test]
    fn test_syslog_destination_names() {
        let yaml = render::<SyslogNgOutput>(&json!({
            "metadata": {"name": "remote", "namespace": "logging"},
            "spec": {
                "syslog": {
                    "host": "syslog.example.com",
                    "port": 6514,
                    "transport": "tls",
                    "tls": {"ca_file": {"mount_from": {"secret_key_ref": {"name": "tls", "key": "ca.crt"}}}, "use_system_cert_store": true},
                    "disk_buffer": {"disk_buf_size": 512000000, "reliable": true}
                }
            }
        }))
        .unwrap();

        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(doc["kind"], "SyslogNGOutput");
        let syslog = &doc["spec"]["syslog"];
        assert_eq!(syslog["host"], "syslog.example.com");
        assert_eq!(syslog["disk_buffer"]["disk_buf_size"], 512000000);
        assert_eq!(syslog["disk_buffer"]["reliable"], true);
        assert_eq!(syslog["tls"]["use-system-cert-store"], true);
        assert_eq!(
            syslog["tls"]["ca_file"]["mountFrom"]["secretKeyRef"]["key"],
            "ca.crt"
        );
    }

    #[test]
    fn test_disk_buffer_validation() {
        let schema = manifest_schema::<SyslogNgOutput>();
        let diagnostics = validate(
            &schema,
            &json!({
                "metadata": {"name": "file", "namespace": "logging"},
                "spec": {"file": {"path": "/tmp/log", "disk_buffer": {"disk_buf_size": -1}}}
            }),
        );

        let mut paths: Vec<_> = diagnostics
            .iter()
            .filter_map(|d| d.attribute.clone())
            .collect();
        paths.sort();
        assert_eq!(
            paths,
            vec![
                "spec.file.disk_buffer.disk_buf_size",
                "spec.file.disk_buffer.reliable"
            ]
        );
    }

    #[test]
    fn test_cluster_output_enabled_namespaces() {
        let yaml = render::<SyslogNgClusterOutput>(&json!({
            "metadata": {"name": "loki", "namespace": "logging"},
            "spec": {
                "loki": {"url": "http://loki:3100", "labels": {"app": "$PROGRAM"}},
                "enabled_namespaces": ["default"]
            }
        }))
        .unwrap();

        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(doc["spec"]["loki"]["labels"]["app"], "$PROGRAM");
        assert_eq!(doc["spec"]["enabledNamespaces"][0], "default");
    }
}
