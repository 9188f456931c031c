//! Object metadata, references and label selectors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::{Attribute, Block, NestedBlock, SchemaBlock, Validator};

/// The subset of `metadata` a manifest carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

impl ObjectMeta {
    /// Metadata block for namespaced kinds: `name` and `namespace` required.
    pub fn namespaced_block() -> Block {
        Self::cluster_block().with_attribute(
            "namespace",
            Attribute::required_string()
                .with_description("Namespace defines the space within which each name must be unique.")
                .with_validator(Validator::DnsLabel),
        )
    }

    /// Metadata block for cluster-scoped kinds: no `namespace`.
    pub fn cluster_block() -> Block {
        Block::new()
            .with_description("Data that helps uniquely identify this object.")
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_description("Unique identifier for this object.")
                    .with_validator(Validator::DnsSubdomain),
            )
            .with_attribute(
                "labels",
                Attribute::optional_string_map()
                    .with_description("Map of string keys and values used to organize and categorize objects."),
            )
            .with_attribute(
                "annotations",
                Attribute::optional_string_map()
                    .with_description("Unstructured key value map stored with a resource."),
            )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalObjectReference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl SchemaBlock for LocalObjectReference {
    fn schema_block() -> Block {
        Block::new().with_attribute("name", Attribute::optional_string())
    }
}

/// A `secretKeyRef`/`configMapKeyRef` style selector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeySelector {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

impl SchemaBlock for KeySelector {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("key", Attribute::required_string())
            .with_attribute("name", Attribute::optional_string())
            .with_attribute("optional", Attribute::optional_bool())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct LabelSelector {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_labels: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_expressions: Option<Vec<LabelSelectorRequirement>>,
}

impl SchemaBlock for LabelSelector {
    fn schema_block() -> Block {
        Block::new()
            .with_description("A label query over a set of resources.")
            .with_attribute("match_labels", Attribute::optional_string_map())
            .with_block(
                "match_expressions",
                NestedBlock::list_of::<LabelSelectorRequirement>(),
            )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelSelectorRequirement {
    pub key: String,
    pub operator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

impl SchemaBlock for LabelSelectorRequirement {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("key", Attribute::required_string())
            .with_attribute(
                "operator",
                Attribute::required_string()
                    .with_validator(Validator::one_of(["In", "NotIn", "Exists", "DoesNotExist"])),
            )
            .with_attribute("values", Attribute::optional_string_list())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::validation::validate;
    use serde_json::json;

    #[test]
    fn test_metadata_blocks() {
        let namespaced = ObjectMeta::namespaced_block();
        assert!(namespaced.attributes["namespace"].flags.required);

        let cluster = ObjectMeta::cluster_block();
        assert!(!cluster.attributes.contains_key("namespace"));
        assert!(cluster.attributes["name"].flags.required);
    }

    #[test]
    fn test_metadata_omits_absent_fields() {
        let meta: ObjectMeta =
            serde_json::from_value(json!({"name": "x", "namespace": null, "labels": null}))
                .unwrap();
        assert_eq!(serde_json::to_value(&meta).unwrap(), json!({"name": "x"}));
    }

    #[test]
    fn test_label_selector_names() {
        let selector: LabelSelector = serde_json::from_value(json!({
            "match_labels": {"app_name": "nginx"},
            "match_expressions": [{"key": "tier", "operator": "In", "values": ["web"]}]
        }))
        .unwrap();

        assert_eq!(
            serde_json::to_value(&selector).unwrap(),
            json!({
                "matchLabels": {"app_name": "nginx"},
                "matchExpressions": [{"key": "tier", "operator": "In", "values": ["web"]}]
            })
        );
    }

    #[test]
    fn test_label_selector_operator_validated() {
        let schema = Schema::v0().with_block("selector", NestedBlock::single_of::<LabelSelector>());
        let diagnostics = validate(
            &schema,
            &json!({"selector": {"match_expressions": [{"key": "a", "operator": "Like"}]}}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute,
            Some("selector.match_expressions.0.operator".to_string())
        );
    }
}
