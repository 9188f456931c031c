//! `Output` and `ClusterOutput`: fluentd output plugins.
//!
//! Plugin sections keep fluentd's own snake_case parameter names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::common::Secret;
use crate::manifest::ManifestKind;
use crate::schema::{
    Attribute, AttributeFlags, AttributeType, Block, NestedBlock, SchemaBlock, Validator,
};

fn secret() -> NestedBlock {
    NestedBlock::single_of::<Secret>()
}

fn int64_list() -> Attribute {
    Attribute::new(
        AttributeType::list(AttributeType::Int64),
        AttributeFlags::optional(),
    )
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct OutputSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3OutputConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loki: Option<LokiOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elasticsearch: Option<ElasticsearchOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kafka: Option<KafkaOutputConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpOutputConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileOutputConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward: Option<ForwardOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullout: Option<NullOutputConfig>,
}

impl SchemaBlock for OutputSpec {
    fn schema_block() -> Block {
        Block::new()
            .with_description("OutputSpec defines the desired state of Output.")
            .with_attribute(
                "logging_ref",
                Attribute::optional_string()
                    .with_description("Name of the Logging resource this output belongs to."),
            )
            .with_block("s3", NestedBlock::single_of::<S3OutputConfig>())
            .with_block("loki", NestedBlock::single_of::<LokiOutput>())
            .with_block("elasticsearch", NestedBlock::single_of::<ElasticsearchOutput>())
            .with_block("kafka", NestedBlock::single_of::<KafkaOutputConfig>())
            .with_block("http", NestedBlock::single_of::<HttpOutputConfig>())
            .with_block("file", NestedBlock::single_of::<FileOutputConfig>())
            .with_block("forward", NestedBlock::single_of::<ForwardOutput>())
            .with_block("nullout", NestedBlock::single_of::<NullOutputConfig>())
    }
}

/// An [`OutputSpec`] usable from every namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct ClusterOutputSpec {
    #[serde(flatten)]
    pub output: OutputSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_namespaces: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protected: Option<bool>,
}

impl SchemaBlock for ClusterOutputSpec {
    fn schema_block() -> Block {
        OutputSpec::schema_block()
            .with_description("ClusterOutputSpec contains Kubernetes spec for ClusterOutput.")
            .with_attribute(
                "enabled_namespaces",
                Attribute::optional_string_list()
                    .with_description("Namespaces allowed to reference this output."),
            )
            .with_attribute("protected", Attribute::optional_bool())
    }
}

/// The fluentd `<buffer>` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Buffer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_limit_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_limit_records: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_limit_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_limit_length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flush_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flush_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flush_thread_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flush_at_shutdown: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overflow_action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_wait: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_max_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_max_times: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_forever: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timekey: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timekey_wait: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timekey_use_utc: Option<bool>,
}

impl SchemaBlock for Buffer {
    fn schema_block() -> Block {
        Block::new()
            .with_description("Buffer parameters of the output plugin.")
            .with_attribute("disabled", Attribute::optional_bool())
            .with_attribute(
                "type",
                Attribute::optional_string()
                    .with_validator(Validator::one_of(["file", "memory", "file_single"])),
            )
            .with_attribute("tags", Attribute::optional_string())
            .with_attribute("path", Attribute::optional_string())
            .with_attribute("chunk_limit_size", Attribute::optional_string())
            .with_attribute(
                "chunk_limit_records",
                Attribute::optional_int64().with_validator(Validator::IntAtLeast { min: 0 }),
            )
            .with_attribute("total_limit_size", Attribute::optional_string())
            .with_attribute(
                "queue_limit_length",
                Attribute::optional_int64().with_validator(Validator::IntAtLeast { min: 0 }),
            )
            .with_attribute(
                "flush_mode",
                Attribute::optional_string().with_validator(Validator::one_of([
                    "default",
                    "lazy",
                    "interval",
                    "immediate",
                ])),
            )
            .with_attribute("flush_interval", Attribute::optional_string())
            .with_attribute(
                "flush_thread_count",
                Attribute::optional_int64().with_validator(Validator::IntAtLeast { min: 1 }),
            )
            .with_attribute("flush_at_shutdown", Attribute::optional_bool())
            .with_attribute(
                "overflow_action",
                Attribute::optional_string().with_validator(Validator::one_of([
                    "throw_exception",
                    "block",
                    "drop_oldest_chunk",
                ])),
            )
            .with_attribute(
                "retry_type",
                Attribute::optional_string()
                    .with_validator(Validator::one_of(["exponential_backoff", "periodic"])),
            )
            .with_attribute("retry_wait", Attribute::optional_string())
            .with_attribute("retry_max_interval", Attribute::optional_string())
            .with_attribute(
                "retry_max_times",
                Attribute::optional_int64().with_validator(Validator::IntAtLeast { min: 0 }),
            )
            .with_attribute("retry_timeout", Attribute::optional_string())
            .with_attribute("retry_forever", Attribute::optional_bool())
            .with_attribute("timekey", Attribute::optional_string())
            .with_attribute("timekey_wait", Attribute::optional_string())
            .with_attribute("timekey_use_utc", Attribute::optional_bool())
    }
}

/// The fluentd `<format>` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Format {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_newline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_key: Option<String>,
}

impl SchemaBlock for Format {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute(
                "type",
                Attribute::optional_string().with_validator(Validator::one_of([
                    "out_file",
                    "json",
                    "ltsv",
                    "csv",
                    "msgpack",
                    "hash",
                    "single_value",
                ])),
            )
            .with_attribute("add_newline", Attribute::optional_bool())
            .with_attribute("message_key", Attribute::optional_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct S3OutputConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_key_id: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_sec_key: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assume_role_credentials: Option<S3AssumeRoleCredentials>,
    pub s3_bucket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_object_key_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_as: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_path_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_create_bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_object: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Format>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer: Option<Buffer>,
}

impl SchemaBlock for S3OutputConfig {
    fn schema_block() -> Block {
        Block::new()
            .with_description("Amazon S3 output plugin.")
            .with_block("aws_key_id", secret())
            .with_block("aws_sec_key", secret())
            .with_block(
                "assume_role_credentials",
                NestedBlock::single_of::<S3AssumeRoleCredentials>(),
            )
            .with_attribute(
                "s3_bucket",
                Attribute::required_string().with_description("S3 bucket name."),
            )
            .with_attribute("s3_region", Attribute::optional_string())
            .with_attribute("s3_endpoint", Attribute::optional_string())
            .with_attribute("path", Attribute::optional_string())
            .with_attribute("s3_object_key_format", Attribute::optional_string())
            .with_attribute(
                "store_as",
                Attribute::optional_string().with_validator(Validator::one_of([
                    "gzip",
                    "lzo",
                    "json",
                    "txt",
                    "gzip_command",
                    "lzma2",
                    "zstd",
                ])),
            )
            .with_attribute("force_path_style", Attribute::optional_string())
            .with_attribute("auto_create_bucket", Attribute::optional_string())
            .with_attribute("check_bucket", Attribute::optional_string())
            .with_attribute("check_object", Attribute::optional_string())
            .with_block("format", NestedBlock::single_of::<Format>())
            .with_block("buffer", NestedBlock::single_of::<Buffer>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct S3AssumeRoleCredentials {
    pub role_arn: String,
    pub role_session_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

impl SchemaBlock for S3AssumeRoleCredentials {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("role_arn", Attribute::required_string())
            .with_attribute("role_session_name", Attribute::required_string())
            .with_attribute("duration_seconds", Attribute::optional_string())
            .with_attribute("external_id", Attribute::optional_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LokiOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_labels: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract_kubernetes_labels: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configure_kubernetes_labels: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_keys: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_single_key: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure_tls: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer: Option<Buffer>,
}

impl SchemaBlock for LokiOutput {
    fn schema_block() -> Block {
        Block::new()
            .with_description("Grafana Loki output plugin.")
            .with_attribute("url", Attribute::optional_string())
            .with_block("username", secret())
            .with_block("password", secret())
            .with_attribute("tenant", Attribute::optional_string())
            .with_attribute(
                "labels",
                Attribute::optional_string_map()
                    .with_description("Set of labels to include with every Loki stream."),
            )
            .with_attribute("extra_labels", Attribute::optional_string_map())
            .with_attribute("extract_kubernetes_labels", Attribute::optional_bool())
            .with_attribute("configure_kubernetes_labels", Attribute::optional_bool())
            .with_attribute("remove_keys", Attribute::optional_string_list())
            .with_attribute(
                "line_format",
                Attribute::optional_string().with_validator(Validator::one_of(["json", "key_value"])),
            )
            .with_attribute("drop_single_key", Attribute::optional_bool())
            .with_block("ca_cert", secret())
            .with_block("cert", secret())
            .with_block("key", secret())
            .with_attribute("insecure_tls", Attribute::optional_bool())
            .with_block("buffer", NestedBlock::single_of::<Buffer>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElasticsearchOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosts: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_verify: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_file: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_cert: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_key: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logstash_format: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logstash_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_tag_key: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suppress_type_name: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconnect_on_error: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reload_connections: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reload_on_failure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_es_400_reason: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_stream_enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_stream_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer: Option<Buffer>,
}

impl SchemaBlock for ElasticsearchOutput {
    fn schema_block() -> Block {
        Block::new()
            .with_description("Elasticsearch output plugin.")
            .with_attribute("host", Attribute::optional_string())
            .with_attribute(
                "port",
                Attribute::optional_int64().with_validator(Validator::port()),
            )
            .with_attribute("hosts", Attribute::optional_string())
            .with_attribute("user", Attribute::optional_string())
            .with_block("password", secret())
            .with_attribute("path", Attribute::optional_string())
            .with_attribute(
                "scheme",
                Attribute::optional_string().with_validator(Validator::one_of(["http", "https"])),
            )
            .with_attribute("ssl_verify", Attribute::optional_bool())
            .with_attribute(
                "ssl_version",
                Attribute::optional_string().with_validator(Validator::one_of([
                    "SSLv23", "TLSv1", "TLSv1_1", "TLSv1_2",
                ])),
            )
            .with_block("ca_file", secret())
            .with_block("client_cert", secret())
            .with_block("client_key", secret())
            .with_attribute("index_name", Attribute::optional_string())
            .with_attribute("logstash_format", Attribute::optional_bool())
            .with_attribute("logstash_prefix", Attribute::optional_string())
            .with_attribute("include_tag_key", Attribute::optional_bool())
            .with_attribute("tag_key", Attribute::optional_string())
            .with_attribute("suppress_type_name", Attribute::optional_bool())
            .with_attribute("reconnect_on_error", Attribute::optional_bool())
            .with_attribute("reload_connections", Attribute::optional_bool())
            .with_attribute("reload_on_failure", Attribute::optional_bool())
            .with_attribute("request_timeout", Attribute::optional_string())
            .with_attribute("log_es_400_reason", Attribute::optional_bool())
            .with_attribute("data_stream_enable", Attribute::optional_bool())
            .with_attribute("data_stream_name", Attribute::optional_string())
            .with_block("buffer", NestedBlock::single_of::<Buffer>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KafkaOutputConfig {
    pub brokers: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sasl_over_ssl: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scram_mechanism: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_ca_cert: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_client_cert: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_client_cert_key: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_verify_hostname: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_acks: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_codec: Option<String>,
    pub format: Format,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer: Option<Buffer>,
}

impl SchemaBlock for KafkaOutputConfig {
    fn schema_block() -> Block {
        Block::new()
            .with_description("Kafka output plugin.")
            .with_attribute(
                "brokers",
                Attribute::required_string()
                    .with_description("Comma separated list of seed brokers, host:port."),
            )
            .with_attribute("default_topic", Attribute::optional_string())
            .with_attribute("topic_key", Attribute::optional_string())
            .with_attribute("partition_key", Attribute::optional_string())
            .with_attribute("headers", Attribute::optional_string_map())
            .with_attribute("sasl_over_ssl", Attribute::optional_bool())
            .with_block("username", secret())
            .with_block("password", secret())
            .with_attribute(
                "scram_mechanism",
                Attribute::optional_string().with_validator(Validator::one_of(["sha256", "sha512"])),
            )
            .with_block("ssl_ca_cert", secret())
            .with_block("ssl_client_cert", secret())
            .with_block("ssl_client_cert_key", secret())
            .with_attribute("ssl_verify_hostname", Attribute::optional_bool())
            .with_attribute(
                "required_acks",
                Attribute::optional_int64().with_validator(Validator::IntBetween { min: -1, max: 1 }),
            )
            .with_attribute(
                "compression_codec",
                Attribute::optional_string()
                    .with_validator(Validator::one_of(["gzip", "snappy", "lz4", "zstd"])),
            )
            .with_block("format", NestedBlock::single_of::<Format>().required())
            .with_block("buffer", NestedBlock::single_of::<Buffer>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpOutputConfig {
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_array: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_verify_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert_path: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_client_cert_path: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_private_key_path: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_response_as_unrecoverable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable_response_codes: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<HttpAuth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Format>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer: Option<Buffer>,
}

impl SchemaBlock for HttpOutputConfig {
    fn schema_block() -> Block {
        Block::new()
            .with_description("HTTP output plugin.")
            .with_attribute("endpoint", Attribute::required_string())
            .with_attribute(
                "http_method",
                Attribute::optional_string().with_validator(Validator::one_of(["post", "put"])),
            )
            .with_attribute("proxy", Attribute::optional_string())
            .with_attribute("content_type", Attribute::optional_string())
            .with_attribute("json_array", Attribute::optional_bool())
            .with_attribute("headers", Attribute::optional_string_map())
            .with_attribute("open_timeout", Attribute::optional_int64())
            .with_attribute("read_timeout", Attribute::optional_int64())
            .with_attribute("ssl_timeout", Attribute::optional_int64())
            .with_attribute(
                "tls_version",
                Attribute::optional_string().with_validator(Validator::one_of(["TLSv1_1", "TLSv1_2"])),
            )
            .with_attribute(
                "tls_verify_mode",
                Attribute::optional_string().with_validator(Validator::one_of(["none", "peer"])),
            )
            .with_block("tls_ca_cert_path", secret())
            .with_block("tls_client_cert_path", secret())
            .with_block("tls_private_key_path", secret())
            .with_attribute("error_response_as_unrecoverable", Attribute::optional_bool())
            .with_attribute("retryable_response_codes", int64_list())
            .with_block("auth", NestedBlock::single_of::<HttpAuth>())
            .with_block("format", NestedBlock::single_of::<Format>())
            .with_block("buffer", NestedBlock::single_of::<Buffer>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpAuth {
    pub username: Secret,
    pub password: Secret,
}

impl SchemaBlock for HttpAuth {
    fn schema_block() -> Block {
        Block::new()
            .with_block("username", secret().required())
            .with_block("password", secret().required())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileOutputConfig {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub append: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_path_suffix: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symlink_path: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compress: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Format>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer: Option<Buffer>,
}

impl SchemaBlock for FileOutputConfig {
    fn schema_block() -> Block {
        Block::new()
            .with_description("File output plugin.")
            .with_attribute("path", Attribute::required_string())
            .with_attribute("append", Attribute::optional_bool())
            .with_attribute("add_path_suffix", Attribute::optional_bool())
            .with_attribute("path_suffix", Attribute::optional_string())
            .with_attribute("symlink_path", Attribute::optional_bool())
            .with_attribute(
                "compress",
                Attribute::optional_string().with_validator(Validator::one_of(["gzip"])),
            )
            .with_block("format", NestedBlock::single_of::<Format>())
            .with_block("buffer", NestedBlock::single_of::<Buffer>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForwardOutput {
    pub servers: Vec<FluentdServer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_ack_response: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ack_response_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_verify_hostname: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_cert_path: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_client_cert_path: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_client_private_key_path: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<ForwardSecurity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer: Option<Buffer>,
}

impl SchemaBlock for ForwardOutput {
    fn schema_block() -> Block {
        Block::new()
            .with_description("Forward output plugin, sending to another fluentd.")
            .with_block("servers", NestedBlock::list_of::<FluentdServer>().required())
            .with_attribute(
                "transport",
                Attribute::optional_string().with_validator(Validator::one_of(["tcp", "tls"])),
            )
            .with_attribute("require_ack_response", Attribute::optional_bool())
            .with_attribute("ack_response_timeout", Attribute::optional_int64())
            .with_attribute("send_timeout", Attribute::optional_int64())
            .with_attribute(
                "tls_version",
                Attribute::optional_string().with_validator(Validator::one_of(["TLSv1_1", "TLSv1_2"])),
            )
            .with_attribute("tls_verify_hostname", Attribute::optional_bool())
            .with_block("tls_cert_path", secret())
            .with_block("tls_client_cert_path", secret())
            .with_block("tls_client_private_key_path", secret())
            .with_block("security", NestedBlock::single_of::<ForwardSecurity>())
            .with_block("buffer", NestedBlock::single_of::<Buffer>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FluentdServer {
    pub host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_key: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standby: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
}

impl SchemaBlock for FluentdServer {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("host", Attribute::required_string())
            .with_attribute("name", Attribute::optional_string())
            .with_attribute(
                "port",
                Attribute::optional_int64().with_validator(Validator::port()),
            )
            .with_block("shared_key", secret())
            .with_block("username", secret())
            .with_block("password", secret())
            .with_attribute("standby", Attribute::optional_bool())
            .with_attribute(
                "weight",
                Attribute::optional_int64().with_validator(Validator::IntAtLeast { min: 0 }),
            )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForwardSecurity {
    pub self_hostname: String,
    pub shared_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_auth: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_anonymous_source: Option<bool>,
}

impl SchemaBlock for ForwardSecurity {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("self_hostname", Attribute::required_string())
            .with_attribute("shared_key", Attribute::required_string().sensitive())
            .with_attribute("user_auth", Attribute::optional_bool())
            .with_attribute("allow_anonymous_source", Attribute::optional_bool())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NullOutputConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub never_flush: Option<bool>,
}

impl SchemaBlock for NullOutputConfig {
    fn schema_block() -> Block {
        Block::new()
            .with_description("Null output plugin, discarding every event.")
            .with_attribute("never_flush", Attribute::optional_bool())
    }
}

pub struct Output;

impl ManifestKind for Output {
    const DATA_SOURCE: &'static str = "k8s_logging_banzaicloud_io_output_v1beta1_manifest";
    const API_VERSION: &'static str = "logging.banzaicloud.io/v1beta1";
    const KIND: &'static str = "Output";
    const NAMESPACED: bool = true;
    const DESCRIPTION: &'static str = "Output is the Schema for the outputs API";
    type Spec = OutputSpec;
}

pub struct ClusterOutput;

impl ManifestKind for ClusterOutput {
    const DATA_SOURCE: &'static str = "k8s_logging_banzaicloud_io_cluster_output_v1beta1_manifest";
    const API_VERSION: &'static str = "logging.banzaicloud.io/v1beta1";
    const KIND: &'static str = "ClusterOutput";
    const NAMESPACED: bool = true;
    const SPEC_REQUIRED: bool = true;
    const DESCRIPTION: &'static str = "ClusterOutput is the Schema for the clusteroutputs API";
    type Spec = ClusterOutputSpec;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{manifest_schema, render};
    use crate::validation::validate;
    use serde_json::json;

    #[test]
    fn test_s3_output_keeps_plugin_names() {
        let yaml = render::<Output>(&json!({
            "metadata": {"name": "s3-output", "namespace": "logging"},
            "spec": {
                "s3": {
                    "aws_key_id": {"value_from": {"secret_key_ref": {"name": "s3", "key": "id"}}},
                    "s3_bucket": "logs",
                    "s3_region": "eu-west-1",
                    "path": "logs/${tag}/%Y/%m/%d/",
                    "buffer": {"timekey": "10m", "timekey_wait": "30s", "timekey_use_utc": true}
                }
            }
        }))
        .unwrap();

        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(doc["apiVersion"], "logging.banzaicloud.io/v1beta1");
        assert_eq!(doc["kind"], "Output");
        let s3 = &doc["spec"]["s3"];
        assert_eq!(s3["s3_bucket"], "logs");
        assert_eq!(s3["aws_key_id"]["valueFrom"]["secretKeyRef"]["name"], "s3");
        assert_eq!(s3["buffer"]["timekey_use_utc"], true);
        assert!(s3.get("aws_sec_key").is_none());
        assert!(doc["spec"].get("loki").is_none());
    }

    #[test]
    fn test_loki_labels_verbatim() {
        let yaml = render::<Output>(&json!({
            "metadata": {"name": "loki", "namespace": "logging"},
            "spec": {
                "loki": {
                    "url": "http://loki:3100",
                    "labels": {"app.kubernetes.io/name": "$.kubernetes.labels.app"},
                    "configure_kubernetes_labels": true
                }
            }
        }))
        .unwrap();

        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(
            doc["spec"]["loki"]["labels"]["app.kubernetes.io/name"],
            "$.kubernetes.labels.app"
        );
    }

    #[test]
    fn test_cluster_output_flattens_plugins() {
        let spec: ClusterOutputSpec = serde_json::from_value(json!({
            "nullout": {"never_flush": false},
            "enabled_namespaces": ["team-a"],
            "protected": true
        }))
        .unwrap();

        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            json!({
                "nullout": {"never_flush": false},
                "enabledNamespaces": ["team-a"],
                "protected": true
            })
        );
    }

    #[test]
    fn test_output_validation() {
        let schema = manifest_schema::<Output>();

        let diagnostics = validate(
            &schema,
            &json!({
                "metadata": {"name": "kafka", "namespace": "logging"},
                "spec": {"kafka": {"brokers": "kafka:9092", "format": {"type": "json"}, "compression_codec": "brotli"}}
            }),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute,
            Some("spec.kafka.compression_codec".to_string())
        );

        let diagnostics = validate(
            &schema,
            &json!({
                "metadata": {"name": "fwd", "namespace": "logging"},
                "spec": {"forward": {"servers": [{"host": "aggregator", "port": 70000}]}}
            }),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute,
            Some("spec.forward.servers.0.port".to_string())
        );
    }

    #[test]
    fn test_cluster_output_schema_extends_output() {
        let block = ClusterOutputSpec::schema_block();
        assert!(block.blocks.contains_key("elasticsearch"));
        assert!(block.attributes.contains_key("enabled_namespaces"));
        assert!(manifest_schema::<ClusterOutput>().block.blocks["spec"].min_items == 1);
    }
}
