//! Scheduling constraints: resources, tolerations and affinity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::meta::LabelSelector;
use crate::schema::{Attribute, Block, NestedBlock, SchemaBlock, Validator};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests: Option<BTreeMap<String, String>>,
}

impl SchemaBlock for ResourceRequirements {
    fn schema_block() -> Block {
        Block::new()
            .with_description("Compute resources required by this container.")
            .with_attribute(
                "limits",
                Attribute::optional_string_map()
                    .with_description("Maximum amount of compute resources allowed, e.g. cpu = \"500m\"."),
            )
            .with_attribute(
                "requests",
                Attribute::optional_string_map()
                    .with_description("Minimum amount of compute resources required."),
            )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Toleration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toleration_seconds: Option<i64>,
}

impl SchemaBlock for Toleration {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("key", Attribute::optional_string())
            .with_attribute(
                "operator",
                Attribute::optional_string().with_validator(Validator::one_of(["Exists", "Equal"])),
            )
            .with_attribute("value", Attribute::optional_string())
            .with_attribute(
                "effect",
                Attribute::optional_string().with_validator(Validator::one_of([
                    "NoSchedule",
                    "PreferNoSchedule",
                    "NoExecute",
                ])),
            )
            .with_attribute("toleration_seconds", Attribute::optional_int64())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Affinity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_affinity: Option<NodeAffinity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_affinity: Option<PodAffinity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_anti_affinity: Option<PodAffinity>,
}

impl SchemaBlock for Affinity {
    fn schema_block() -> Block {
        Block::new()
            .with_description("Scheduling constraints.")
            .with_block("node_affinity", NestedBlock::single_of::<NodeAffinity>())
            .with_block("pod_affinity", NestedBlock::single_of::<PodAffinity>())
            .with_block("pod_anti_affinity", NestedBlock::single_of::<PodAffinity>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct NodeAffinity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_during_scheduling_ignored_during_execution: Option<NodeSelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_during_scheduling_ignored_during_execution:
        Option<Vec<PreferredSchedulingTerm>>,
}

impl SchemaBlock for NodeAffinity {
    fn schema_block() -> Block {
        Block::new()
            .with_block(
                "required_during_scheduling_ignored_during_execution",
                NestedBlock::single_of::<NodeSelector>(),
            )
            .with_block(
                "preferred_during_scheduling_ignored_during_execution",
                NestedBlock::list_of::<PreferredSchedulingTerm>(),
            )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct NodeSelector {
    pub node_selector_terms: Vec<NodeSelectorTerm>,
}

impl SchemaBlock for NodeSelector {
    fn schema_block() -> Block {
        Block::new().with_block(
            "node_selector_terms",
            NestedBlock::list_of::<NodeSelectorTerm>().required(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct NodeSelectorTerm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_expressions: Option<Vec<NodeSelectorRequirement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_fields: Option<Vec<NodeSelectorRequirement>>,
}

impl SchemaBlock for NodeSelectorTerm {
    fn schema_block() -> Block {
        Block::new()
            .with_block(
                "match_expressions",
                NestedBlock::list_of::<NodeSelectorRequirement>(),
            )
            .with_block("match_fields", NestedBlock::list_of::<NodeSelectorRequirement>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSelectorRequirement {
    pub key: String,
    pub operator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

impl SchemaBlock for NodeSelectorRequirement {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("key", Attribute::required_string())
            .with_attribute(
                "operator",
                Attribute::required_string().with_validator(Validator::one_of([
                    "In",
                    "NotIn",
                    "Exists",
                    "DoesNotExist",
                    "Gt",
                    "Lt",
                ])),
            )
            .with_attribute("values", Attribute::optional_string_list())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferredSchedulingTerm {
    pub weight: i64,
    pub preference: NodeSelectorTerm,
}

impl SchemaBlock for PreferredSchedulingTerm {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute(
                "weight",
                Attribute::required_int64().with_validator(Validator::IntBetween { min: 1, max: 100 }),
            )
            .with_block("preference", NestedBlock::single_of::<NodeSelectorTerm>().required())
    }
}

/// Shared by `podAffinity` and `podAntiAffinity`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct PodAffinity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_during_scheduling_ignored_during_execution: Option<Vec<PodAffinityTerm>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_during_scheduling_ignored_during_execution:
        Option<Vec<WeightedPodAffinityTerm>>,
}

impl SchemaBlock for PodAffinity {
    fn schema_block() -> Block {
        Block::new()
            .with_block(
                "required_during_scheduling_ignored_during_execution",
                NestedBlock::list_of::<PodAffinityTerm>(),
            )
            .with_block(
                "preferred_during_scheduling_ignored_during_execution",
                NestedBlock::list_of::<WeightedPodAffinityTerm>(),
            )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct PodAffinityTerm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<LabelSelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace_selector: Option<LabelSelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<Vec<String>>,
    pub topology_key: String,
}

impl SchemaBlock for PodAffinityTerm {
    fn schema_block() -> Block {
        Block::new()
            .with_block("label_selector", NestedBlock::single_of::<LabelSelector>())
            .with_block("namespace_selector", NestedBlock::single_of::<LabelSelector>())
            .with_attribute("namespaces", Attribute::optional_string_list())
            .with_attribute("topology_key", Attribute::required_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct WeightedPodAffinityTerm {
    pub weight: i64,
    pub pod_affinity_term: PodAffinityTerm,
}

impl SchemaBlock for WeightedPodAffinityTerm {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute(
                "weight",
                Attribute::required_int64().with_validator(Validator::IntBetween { min: 1, max: 100 }),
            )
            .with_block(
                "pod_affinity_term",
                NestedBlock::single_of::<PodAffinityTerm>().required(),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_toleration_serialized_names() {
        let toleration: Toleration = serde_json::from_value(json!({
            "key": "dedicated",
            "operator": "Equal",
            "value": "logging",
            "effect": "NoExecute",
            "toleration_seconds": 300
        }))
        .unwrap();

        assert_eq!(
            serde_json::to_value(&toleration).unwrap(),
            json!({
                "key": "dedicated",
                "operator": "Equal",
                "value": "logging",
                "effect": "NoExecute",
                "tolerationSeconds": 300
            })
        );
    }

    #[test]
    fn test_affinity_serialized_names() {
        let affinity: Affinity = serde_json::from_value(json!({
            "node_affinity": {
                "required_during_scheduling_ignored_during_execution": {
                    "node_selector_terms": [{
                        "match_expressions": [{"key": "kubernetes.io/os", "operator": "In", "values": ["linux"]}]
                    }]
                }
            },
            "pod_anti_affinity": {
                "preferred_during_scheduling_ignored_during_execution": [{
                    "weight": 100,
                    "pod_affinity_term": {"topology_key": "kubernetes.io/hostname"}
                }]
            }
        }))
        .unwrap();

        let value = serde_json::to_value(&affinity).unwrap();
        assert_eq!(
            value["nodeAffinity"]["requiredDuringSchedulingIgnoredDuringExecution"]
                ["nodeSelectorTerms"][0]["matchExpressions"][0]["key"],
            "kubernetes.io/os"
        );
        assert_eq!(
            value["podAntiAffinity"]["preferredDuringSchedulingIgnoredDuringExecution"][0]
                ["podAffinityTerm"]["topologyKey"],
            "kubernetes.io/hostname"
        );
        assert!(value.get("podAffinity").is_none());
    }

    #[test]
    fn test_resource_requirements_keep_quantities_verbatim() {
        let resources: ResourceRequirements = serde_json::from_value(json!({
            "limits": {"cpu": "500m", "memory": "128Mi"}
        }))
        .unwrap();

        assert_eq!(
            serde_json::to_value(&resources).unwrap(),
            json!({"limits": {"cpu": "500m", "memory": "128Mi"}})
        );
    }
}
