//! `SyslogNGFlow` and `SyslogNGClusterFlow`: syslog-ng routing with match
//! expressions, rewrite rules and parsers.

use serde::{Deserialize, Serialize};

use crate::manifest::ManifestKind;
use crate::schema::{Attribute, Block, NestedBlock, SchemaBlock, Validator};

/// How deep `and`/`or`/`not` may nest in a match expression schema.
pub const MAX_MATCH_DEPTH: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct SyslogNgFlowSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#match: Option<MatchExpr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<SyslogNgFilter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_output_refs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_output_refs: Option<Vec<String>>,
}

impl SchemaBlock for SyslogNgFlowSpec {
    fn schema_block() -> Block {
        Block::new()
            .with_description("SyslogNGFlowSpec is the Kubernetes spec for SyslogNGFlows.")
            .with_attribute("logging_ref", Attribute::optional_string())
            .with_block("match", NestedBlock::single_of::<MatchExpr>())
            .with_block("filters", NestedBlock::list_of::<SyslogNgFilter>())
            .with_attribute("local_output_refs", Attribute::optional_string_list())
            .with_attribute("global_output_refs", Attribute::optional_string_list())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct SyslogNgClusterFlowSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#match: Option<MatchExpr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<SyslogNgFilter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_output_refs: Option<Vec<String>>,
}

impl SchemaBlock for SyslogNgClusterFlowSpec {
    fn schema_block() -> Block {
        Block::new()
            .with_description("SyslogNGClusterFlowSpec is the Kubernetes spec for SyslogNGClusterFlows.")
            .with_attribute("logging_ref", Attribute::optional_string())
            .with_block("match", NestedBlock::single_of::<MatchExpr>())
            .with_block("filters", NestedBlock::list_of::<SyslogNgFilter>())
            .with_attribute("global_output_refs", Attribute::optional_string_list())
    }
}

/// A boolean expression over log message fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchExpr {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regexp: Option<RegexpMatchExpr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub and: Option<Vec<MatchExpr>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub or: Option<Vec<MatchExpr>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<MatchExpr>>,
}

impl MatchExpr {
    /// The expression schema, with boolean combinators allowed `depth` more
    /// levels down. At depth zero only `regexp` remains.
    pub fn block_with_depth(depth: usize) -> Block {
        let block = Block::new().with_block("regexp", NestedBlock::single_of::<RegexpMatchExpr>());
        if depth == 0 {
            return block;
        }
        let inner = Self::block_with_depth(depth - 1);
        block
            .with_block("and", NestedBlock::list(inner.clone()))
            .with_block("or", NestedBlock::list(inner.clone()))
            .with_block("not", NestedBlock::single(inner))
    }
}

impl SchemaBlock for MatchExpr {
    fn schema_block() -> Block {
        Self::block_with_depth(MAX_MATCH_DEPTH)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegexpMatchExpr {
    pub pattern: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<Vec<String>>,
}

impl SchemaBlock for RegexpMatchExpr {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("pattern", Attribute::required_string())
            .with_attribute(
                "value",
                Attribute::optional_string()
                    .with_description("Name of the field to match, for example json.kubernetes.labels.app"),
            )
            .with_attribute("template", Attribute::optional_string())
            .with_attribute(
                "type",
                Attribute::optional_string()
                    .with_validator(Validator::one_of(["pcre", "string", "glob"])),
            )
            .with_attribute("flags", Attribute::optional_string_list())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyslogNgFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#match: Option<MatchExpr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<Vec<RewriteRule>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parser: Option<SyslogNgParser>,
}

impl SchemaBlock for SyslogNgFilter {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("id", Attribute::optional_string())
            .with_block("match", NestedBlock::single_of::<MatchExpr>())
            .with_block("rewrite", NestedBlock::list_of::<RewriteRule>())
            .with_block("parser", NestedBlock::single_of::<SyslogNgParser>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewriteRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set: Option<SetRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unset: Option<UnsetRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rename: Option<RenameRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subst: Option<SubstituteRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_unset: Option<GroupUnsetRule>,
}

impl SchemaBlock for RewriteRule {
    fn schema_block() -> Block {
        Block::new()
            .with_block("set", NestedBlock::single_of::<SetRule>())
            .with_block("unset", NestedBlock::single_of::<UnsetRule>())
            .with_block("rename", NestedBlock::single_of::<RenameRule>())
            .with_block("subst", NestedBlock::single_of::<SubstituteRule>())
            .with_block("group_unset", NestedBlock::single_of::<GroupUnsetRule>())
    }
}

fn condition() -> NestedBlock {
    NestedBlock::single_of::<MatchExpr>()
        .with_description("Only rewrite messages matching this expression.")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetRule {
    pub field: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<MatchExpr>,
}

impl SchemaBlock for SetRule {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("field", Attribute::required_string())
            .with_attribute("value", Attribute::required_string())
            .with_block("condition", condition())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnsetRule {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<MatchExpr>,
}

impl SchemaBlock for UnsetRule {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("field", Attribute::required_string())
            .with_block("condition", condition())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenameRule {
    #[serde(rename(serialize = "oldName"))]
    pub old_name: String,
    #[serde(rename(serialize = "newName"))]
    pub new_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<MatchExpr>,
}

impl SchemaBlock for RenameRule {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("old_name", Attribute::required_string())
            .with_attribute("new_name", Attribute::required_string())
            .with_block("condition", condition())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubstituteRule {
    pub pattern: String,
    pub replace: String,
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<MatchExpr>,
}

impl SchemaBlock for SubstituteRule {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("pattern", Attribute::required_string())
            .with_attribute("replace", Attribute::required_string())
            .with_attribute("field", Attribute::required_string())
            .with_attribute(
                "type",
                Attribute::optional_string()
                    .with_validator(Validator::one_of(["pcre", "string", "glob"])),
            )
            .with_attribute("flags", Attribute::optional_string_list())
            .with_block("condition", condition())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupUnsetRule {
    pub pattern: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<MatchExpr>,
}

impl SchemaBlock for GroupUnsetRule {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("pattern", Attribute::required_string())
            .with_block("condition", condition())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyslogNgParser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regexp: Option<RegexpParser>,
    #[serde(
        rename(serialize = "syslog-parser"),
        skip_serializing_if = "Option::is_none"
    )]
    pub syslog_parser: Option<SyslogParser>,
}

impl SchemaBlock for SyslogNgParser {
    fn schema_block() -> Block {
        Block::new()
            .with_block("regexp", NestedBlock::single_of::<RegexpParser>())
            .with_block("syslog_parser", NestedBlock::single_of::<SyslogParser>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegexpParser {
    pub patterns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<Vec<String>>,
}

impl SchemaBlock for RegexpParser {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("patterns", Attribute::required_string_list())
            .with_attribute("prefix", Attribute::optional_string())
            .with_attribute("template", Attribute::optional_string())
            .with_attribute("flags", Attribute::optional_string_list())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyslogParser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<Vec<String>>,
}

impl SchemaBlock for SyslogParser {
    fn schema_block() -> Block {
        Block::new().with_attribute("flags", Attribute::optional_string_list())
    }
}

pub struct SyslogNgFlow;

impl ManifestKind for SyslogNgFlow {
    const DATA_SOURCE: &'static str = "k8s_logging_banzaicloud_io_syslog_ng_flow_v1beta1_manifest";
    const API_VERSION: &'static str = "logging.banzaicloud.io/v1beta1";
    const KIND: &'static str = "SyslogNGFlow";
    const NAMESPACED: bool = true;
    const DESCRIPTION: &'static str = "SyslogNGFlow is the Schema for the syslog-ng flows API";
    type Spec = SyslogNgFlowSpec;
}

pub struct SyslogNgClusterFlow;

impl ManifestKind for SyslogNgClusterFlow {
    const DATA_SOURCE: &'static str =
        "k8s_logging_banzaicloud_io_syslog_ng_cluster_flow_v1beta1_manifest";
    const API_VERSION: &'static str = "logging.banzaicloud.io/v1beta1";
    const KIND: &'static str = "SyslogNGClusterFlow";
    const NAMESPACED: bool = true;
    const DESCRIPTION: &'static str =
        "SyslogNGClusterFlow is the Schema for the syslog-ng clusterflows API";
    type Spec = SyslogNgClusterFlowSpec;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{manifest_schema, render};
    use crate::validation::validate;
    use serde_json::json;

    #[test]
    fn test_match_expression_golden() {
        let yaml = render::<SyslogNgFlow>(&json!({
            "metadata": {"name": "nginx", "namespace": "default"},
            "spec": {
                "match": {"regexp": {"value": "json.kubernetes.labels.app", "pattern": "nginx"}},
                "local_output_refs": ["remote"]
            }
        }))
        .unwrap();

        assert_eq!(
            yaml,
            "apiVersion: logging.banzaicloud.io/v1beta1\n\
             kind: SyslogNGFlow\n\
             metadata:\n  name: nginx\n  namespace: default\n\
             spec:\n  localOutputRefs:\n  - remote\n  \
             match:\n    regexp:\n      pattern: nginx\n      value: json.kubernetes.labels.app\n"
        );
    }

    #[test]
    fn test_rewrite_and_parser_names() {
        let yaml = render::<SyslogNgClusterFlow>(&json!({
            "metadata": {"name": "all", "namespace": "logging"},
            "spec": {
                "filters": [
                    {"rewrite": [
                        {"rename": {"old_name": "json.kubernetes.labels.app", "new_name": "json.app"}},
                        {"group_unset": {"pattern": "json.kubernetes.annotations.*"}}
                    ]},
                    {"parser": {"syslog_parser": {"flags": ["no-hostname"]}}}
                ],
                "global_output_refs": ["archive"]
            }
        }))
        .unwrap();

        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        let filters = &doc["spec"]["filters"];
        assert_eq!(filters[0]["rewrite"][0]["rename"]["oldName"], "json.kubernetes.labels.app");
        assert_eq!(filters[0]["rewrite"][0]["rename"]["newName"], "json.app");
        assert_eq!(
            filters[0]["rewrite"][1]["group_unset"]["pattern"],
            "json.kubernetes.annotations.*"
        );
        assert_eq!(filters[1]["parser"]["syslog-parser"]["flags"][0], "no-hostname");
        assert_eq!(doc["spec"]["globalOutputRefs"][0], "archive");
    }

    #[test]
    fn test_nested_match_within_depth() {
        let schema = manifest_schema::<SyslogNgFlow>();
        let config = json!({
            "metadata": {"name": "nested", "namespace": "default"},
            "spec": {"match": {"and": [
                {"regexp": {"value": "json.kubernetes.namespace_name", "pattern": "prod"}},
                {"not": {"regexp": {"value": "json.kubernetes.labels.app", "pattern": "debug"}}}
            ]}}
        });
        assert!(validate(&schema, &config).is_empty());

        let yaml = render::<SyslogNgFlow>(&config).unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(doc["spec"]["match"]["and"][1]["not"]["regexp"]["pattern"], "debug");
    }

    #[test]
    fn test_match_depth_limit() {
        let leaf = json!({"regexp": {"pattern": "x"}});
        let mut expr = leaf.clone();
        for _ in 0..MAX_MATCH_DEPTH {
            expr = json!({"not": expr});
        }
        let schema = manifest_schema::<SyslogNgFlow>();
        let ok = json!({"metadata": {"name": "deep", "namespace": "default"}, "spec": {"match": expr}});
        assert!(validate(&schema, &ok).is_empty());

        let too_deep = json!({"metadata": {"name": "deep", "namespace": "default"}, "spec": {"match": {"not": expr}}});
        let diagnostics = validate(&schema, &too_deep);
        assert!(diagnostics
            .iter()
            .any(|d| d.summary.starts_with("Unsupported argument")));
    }

    #[test]
    fn test_cluster_flow_rejects_local_refs() {
        let diagnostics = validate(
            &manifest_schema::<SyslogNgClusterFlow>(),
            &json!({
                "metadata": {"name": "all", "namespace": "logging"},
                "spec": {"local_output_refs": ["x"]}
            }),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute,
            Some("spec.local_output_refs".to_string())
        );
    }
}
