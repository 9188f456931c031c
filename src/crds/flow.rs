//! `Flow` and `ClusterFlow`: fluentd routing and filters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::manifest::ManifestKind;
use crate::schema::{
    Attribute, AttributeFlags, AttributeType, Block, NestedBlock, SchemaBlock, Validator,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct FlowSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#match: Option<Vec<Match>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Filter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_output_refs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_output_refs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_label_in_router: Option<bool>,
}

impl SchemaBlock for FlowSpec {
    fn schema_block() -> Block {
        Block::new()
            .with_description("FlowSpec is the Kubernetes spec for Flows.")
            .with_attribute("logging_ref", Attribute::optional_string())
            .with_block("match", NestedBlock::list_of::<Match>())
            .with_block("filters", NestedBlock::list_of::<Filter>())
            .with_attribute(
                "local_output_refs",
                Attribute::optional_string_list()
                    .with_description("Outputs in the same namespace to send logs to."),
            )
            .with_attribute(
                "global_output_refs",
                Attribute::optional_string_list().with_description("ClusterOutputs to send logs to."),
            )
            .with_attribute("flow_label", Attribute::optional_string())
            .with_attribute("include_label_in_router", Attribute::optional_bool())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct ClusterFlowSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#match: Option<Vec<ClusterMatch>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Filter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_output_refs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_label_in_router: Option<bool>,
}

impl SchemaBlock for ClusterFlowSpec {
    fn schema_block() -> Block {
        Block::new()
            .with_description("ClusterFlowSpec is the Kubernetes spec for ClusterFlows.")
            .with_attribute("logging_ref", Attribute::optional_string())
            .with_block("match", NestedBlock::list_of::<ClusterMatch>())
            .with_block("filters", NestedBlock::list_of::<Filter>())
            .with_attribute("global_output_refs", Attribute::optional_string_list())
            .with_attribute("flow_label", Attribute::optional_string())
            .with_attribute("include_label_in_router", Attribute::optional_bool())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Match {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Select>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Select>,
}

impl SchemaBlock for Match {
    fn schema_block() -> Block {
        Block::new()
            .with_block("select", NestedBlock::single_of::<Select>())
            .with_block("exclude", NestedBlock::single_of::<Select>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Select {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_names: Option<Vec<String>>,
}

impl SchemaBlock for Select {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("labels", Attribute::optional_string_map())
            .with_attribute("hosts", Attribute::optional_string_list())
            .with_attribute("container_names", Attribute::optional_string_list())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterMatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<ClusterSelect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<ClusterSelect>,
}

impl SchemaBlock for ClusterMatch {
    fn schema_block() -> Block {
        Block::new()
            .with_block("select", NestedBlock::single_of::<ClusterSelect>())
            .with_block("exclude", NestedBlock::single_of::<ClusterSelect>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterSelect {
    #[serde(flatten)]
    pub select: Select,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace_labels: Option<BTreeMap<String, String>>,
}

impl SchemaBlock for ClusterSelect {
    fn schema_block() -> Block {
        Select::schema_block()
            .with_attribute("namespaces", Attribute::optional_string_list())
            .with_attribute("namespace_labels", Attribute::optional_string_map())
    }
}

/// One fluentd filter; exactly one plugin is expected to be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_normaliser: Option<TagNormaliser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parser: Option<ParserConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_transformer: Option<RecordTransformer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_modifier: Option<RecordModifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grep: Option<GrepConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedot: Option<DedotFilterConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<StdOutFilterConfig>,
}

impl SchemaBlock for Filter {
    fn schema_block() -> Block {
        Block::new()
            .with_block("tag_normaliser", NestedBlock::single_of::<TagNormaliser>())
            .with_block("parser", NestedBlock::single_of::<ParserConfig>())
            .with_block(
                "record_transformer",
                NestedBlock::single_of::<RecordTransformer>(),
            )
            .with_block("record_modifier", NestedBlock::single_of::<RecordModifier>())
            .with_block("grep", NestedBlock::single_of::<GrepConfig>())
            .with_block("dedot", NestedBlock::single_of::<DedotFilterConfig>())
            .with_block("stdout", NestedBlock::single_of::<StdOutFilterConfig>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagNormaliser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_tag: Option<String>,
}

impl SchemaBlock for TagNormaliser {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute(
                "format",
                Attribute::optional_string()
                    .with_description("Re-tag format, e.g. ${namespace_name}.${pod_name}."),
            )
            .with_attribute("match_tag", Attribute::optional_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserve_time: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserve_data: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_key_name_field: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replace_invalid_sequence: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inject_key_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_value_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emit_invalid_record_to_error: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse: Option<ParseSection>,
}

impl SchemaBlock for ParserConfig {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("key_name", Attribute::optional_string())
            .with_attribute("reserve_time", Attribute::optional_bool())
            .with_attribute("reserve_data", Attribute::optional_bool())
            .with_attribute("remove_key_name_field", Attribute::optional_bool())
            .with_attribute("replace_invalid_sequence", Attribute::optional_bool())
            .with_attribute("inject_key_prefix", Attribute::optional_string())
            .with_attribute("hash_value_field", Attribute::optional_string())
            .with_attribute("emit_invalid_record_to_error", Attribute::optional_bool())
            .with_block("parse", NestedBlock::single_of::<ParseSection>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_time_key: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub null_value_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate_current_event: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_time: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl SchemaBlock for ParseSection {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute(
                "type",
                Attribute::optional_string().with_validator(Validator::one_of([
                    "apache2",
                    "apache_error",
                    "nginx",
                    "syslog",
                    "csv",
                    "tsv",
                    "ltsv",
                    "json",
                    "multiline",
                    "none",
                    "logfmt",
                    "regexp",
                    "multi_format",
                ])),
            )
            .with_attribute("expression", Attribute::optional_string())
            .with_attribute("time_key", Attribute::optional_string())
            .with_attribute("time_format", Attribute::optional_string())
            .with_attribute(
                "time_type",
                Attribute::optional_string()
                    .with_validator(Validator::one_of(["float", "unixtime", "string"])),
            )
            .with_attribute("keep_time_key", Attribute::optional_bool())
            .with_attribute("types", Attribute::optional_string())
            .with_attribute("null_value_pattern", Attribute::optional_string())
            .with_attribute("estimate_current_event", Attribute::optional_bool())
            .with_attribute("local_time", Attribute::optional_bool())
            .with_attribute("utc", Attribute::optional_bool())
            .with_attribute("timezone", Attribute::optional_string())
    }
}

fn record_list() -> Attribute {
    Attribute::new(
        AttributeType::list(AttributeType::map(AttributeType::String)),
        AttributeFlags::optional(),
    )
    .with_description("Records to add, each a map of field name to value.")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordTransformer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_keys: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_keys: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renew_record: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renew_time_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_ruby: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_typecast: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<BTreeMap<String, String>>>,
}

impl SchemaBlock for RecordTransformer {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("remove_keys", Attribute::optional_string())
            .with_attribute("keep_keys", Attribute::optional_string())
            .with_attribute("renew_record", Attribute::optional_bool())
            .with_attribute("renew_time_key", Attribute::optional_string())
            .with_attribute("enable_ruby", Attribute::optional_bool())
            .with_attribute("auto_typecast", Attribute::optional_bool())
            .with_attribute("records", record_list())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordModifier {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prepare_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub char_encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_keys: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whitelist_keys: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaces: Option<Vec<Replace>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<BTreeMap<String, String>>>,
}

impl SchemaBlock for RecordModifier {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("prepare_value", Attribute::optional_string())
            .with_attribute("char_encoding", Attribute::optional_string())
            .with_attribute("remove_keys", Attribute::optional_string())
            .with_attribute("whitelist_keys", Attribute::optional_string())
            .with_block("replaces", NestedBlock::list_of::<Replace>())
            .with_attribute("records", record_list())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Replace {
    pub key: String,
    pub expression: String,
    pub replace: String,
}

impl SchemaBlock for Replace {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("key", Attribute::required_string())
            .with_attribute("expression", Attribute::required_string())
            .with_attribute("replace", Attribute::required_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrepConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regexp: Option<Vec<GrepPattern>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<GrepPattern>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub and: Option<Vec<GrepGroup>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub or: Option<Vec<GrepGroup>>,
}

impl SchemaBlock for GrepConfig {
    fn schema_block() -> Block {
        Block::new()
            .with_block("regexp", NestedBlock::list_of::<GrepPattern>())
            .with_block("exclude", NestedBlock::list_of::<GrepPattern>())
            .with_block("and", NestedBlock::list_of::<GrepGroup>())
            .with_block("or", NestedBlock::list_of::<GrepGroup>())
    }
}

/// A `<regexp>` or `<exclude>` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrepPattern {
    pub key: String,
    pub pattern: String,
}

impl SchemaBlock for GrepPattern {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("key", Attribute::required_string())
            .with_attribute("pattern", Attribute::required_string())
    }
}

/// An `<and>` or `<or>` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrepGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regexp: Option<Vec<GrepPattern>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<GrepPattern>>,
}

impl SchemaBlock for GrepGroup {
    fn schema_block() -> Block {
        Block::new()
            .with_block("regexp", NestedBlock::list_of::<GrepPattern>())
            .with_block("exclude", NestedBlock::list_of::<GrepPattern>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DedotFilterConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub de_dot_nested: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub de_dot_separator: Option<String>,
}

impl SchemaBlock for DedotFilterConfig {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("de_dot_nested", Attribute::optional_bool())
            .with_attribute("de_dot_separator", Attribute::optional_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StdOutFilterConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_type: Option<String>,
}

impl SchemaBlock for StdOutFilterConfig {
    fn schema_block() -> Block {
        Block::new().with_attribute(
            "output_type",
            Attribute::optional_string()
                .with_validator(Validator::one_of(["json", "hash", "inspect", "ltsv"])),
        )
    }
}

pub struct Flow;

impl ManifestKind for Flow {
    const DATA_SOURCE: &'static str = "k8s_logging_banzaicloud_io_flow_v1beta1_manifest";
    const API_VERSION: &'static str = "logging.banzaicloud.io/v1beta1";
    const KIND: &'static str = "Flow";
    const NAMESPACED: bool = true;
    const DESCRIPTION: &'static str = "Flow Kubernetes object";
    type Spec = FlowSpec;
}

pub struct ClusterFlow;

impl ManifestKind for ClusterFlow {
    const DATA_SOURCE: &'static str = "k8s_logging_banzaicloud_io_cluster_flow_v1beta1_manifest";
    const API_VERSION: &'static str = "logging.banzaicloud.io/v1beta1";
    const KIND: &'static str = "ClusterFlow";
    const NAMESPACED: bool = true;
    const DESCRIPTION: &'static str = "ClusterFlow is the Schema for the clusterflows API";
    type Spec = ClusterFlowSpec;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{manifest_schema, render};
    use crate::validation::validate;
    use serde_json::json;

    #[test]
    fn test_flow_golden() {
        let yaml = render::<Flow>(&json!({
            "metadata": {"name": "nginx", "namespace": "web"},
            "spec": {
                "match": [{"select": {"labels": {"app": "nginx"}}}],
                "local_output_refs": ["loki"]
            }
        }))
        .unwrap();

        assert_eq!(
            yaml,
            "apiVersion: logging.banzaicloud.io/v1beta1\n\
             kind: Flow\n\
             metadata:\n  name: nginx\n  namespace: web\n\
             spec:\n  localOutputRefs:\n  - loki\n  match:\n  - select:\n      labels:\n        app: nginx\n"
        );
    }

    #[test]
    fn test_filters_keep_plugin_names() {
        let yaml = render::<Flow>(&json!({
            "metadata": {"name": "f", "namespace": "ns"},
            "spec": {
                "filters": [
                    {"tag_normaliser": {"format": "${namespace_name}.${pod_name}"}},
                    {"parser": {"remove_key_name_field": true, "parse": {"type": "json"}}},
                    {"grep": {"exclude": [{"key": "level", "pattern": "/debug/"}]}},
                    {"record_transformer": {"records": [{"cluster": "prod"}]}}
                ]
            }
        }))
        .unwrap();

        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        let filters = &doc["spec"]["filters"];
        assert_eq!(
            filters[0]["tag_normaliser"]["format"],
            "${namespace_name}.${pod_name}"
        );
        assert_eq!(filters[1]["parser"]["remove_key_name_field"], true);
        assert_eq!(filters[1]["parser"]["parse"]["type"], "json");
        assert_eq!(filters[2]["grep"]["exclude"][0]["key"], "level");
        assert_eq!(filters[3]["record_transformer"]["records"][0]["cluster"], "prod");
    }

    #[test]
    fn test_cluster_select_adds_namespaces() {
        let spec: ClusterFlowSpec = serde_json::from_value(json!({
            "match": [{"exclude": {"namespaces": ["kube-system"]}}],
            "global_output_refs": ["es"]
        }))
        .unwrap();

        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            json!({
                "match": [{"exclude": {"namespaces": ["kube-system"]}}],
                "globalOutputRefs": ["es"]
            })
        );
    }

    #[test]
    fn test_flow_validation_paths() {
        let schema = manifest_schema::<Flow>();
        let diagnostics = validate(
            &schema,
            &json!({
                "metadata": {"name": "f", "namespace": "ns"},
                "spec": {
                    "filters": [{"parser": {"parse": {"type": "yaml"}}}],
                    "match": [{"select": {"pods": ["x"]}}]
                }
            }),
        );

        let paths: Vec<_> = diagnostics
            .iter()
            .filter_map(|d| d.attribute.clone())
            .collect();
        assert_eq!(diagnostics.len(), 2);
        assert!(paths.contains(&"spec.filters.0.parser.parse.type".to_string()));
        assert!(paths.contains(&"spec.match.0.select.pods".to_string()));
    }
}
