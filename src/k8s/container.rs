//! Container-level settings: security contexts and environment.

use serde::{Deserialize, Serialize};

use super::meta::KeySelector;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Block, NestedBlock, SchemaBlock};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct SecurityContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_privilege_escalation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Capabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privileged: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only_root_filesystem: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_as_group: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_as_non_root: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_as_user: Option<i64>,
}

impl SchemaBlock for SecurityContext {
    fn schema_block() -> Block {
        Block::new()
            .with_description("Security options the container should be run with.")
            .with_attribute("allow_privilege_escalation", Attribute::optional_bool())
            .with_block("capabilities", NestedBlock::single_of::<Capabilities>())
            .with_attribute("privileged", Attribute::optional_bool())
            .with_attribute("read_only_root_filesystem", Attribute::optional_bool())
            .with_attribute("run_as_group", Attribute::optional_int64())
            .with_attribute("run_as_non_root", Attribute::optional_bool())
            .with_attribute("run_as_user", Attribute::optional_int64())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop: Option<Vec<String>>,
}

impl SchemaBlock for Capabilities {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("add", Attribute::optional_string_list())
            .with_attribute("drop", Attribute::optional_string_list())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct PodSecurityContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fs_group: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_as_group: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_as_non_root: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_as_user: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplemental_groups: Option<Vec<i64>>,
}

impl SchemaBlock for PodSecurityContext {
    fn schema_block() -> Block {
        Block::new()
            .with_description("Pod-level security attributes.")
            .with_attribute("fs_group", Attribute::optional_int64())
            .with_attribute("run_as_group", Attribute::optional_int64())
            .with_attribute("run_as_non_root", Attribute::optional_bool())
            .with_attribute("run_as_user", Attribute::optional_int64())
            .with_attribute(
                "supplemental_groups",
                Attribute::new(
                    AttributeType::list(AttributeType::Int64),
                    AttributeFlags::optional(),
                ),
            )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct EnvVar {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_from: Option<EnvVarSource>,
}

impl SchemaBlock for EnvVar {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("name", Attribute::required_string())
            .with_attribute("value", Attribute::optional_string())
            .with_block("value_from", NestedBlock::single_of::<EnvVarSource>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct EnvVarSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_map_key_ref: Option<KeySelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_ref: Option<ObjectFieldSelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key_ref: Option<KeySelector>,
}

impl SchemaBlock for EnvVarSource {
    fn schema_block() -> Block {
        Block::new()
            .with_block("config_map_key_ref", NestedBlock::single_of::<KeySelector>())
            .with_block("field_ref", NestedBlock::single_of::<ObjectFieldSelector>())
            .with_block("secret_key_ref", NestedBlock::single_of::<KeySelector>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct ObjectFieldSelector {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    pub field_path: String,
}

impl SchemaBlock for ObjectFieldSelector {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("api_version", Attribute::optional_string())
            .with_attribute("field_path", Attribute::required_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct VolumeMount {
    pub mount_path: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_path: Option<String>,
}

impl SchemaBlock for VolumeMount {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("mount_path", Attribute::required_string())
            .with_attribute("name", Attribute::required_string())
            .with_attribute("read_only", Attribute::optional_bool())
            .with_attribute("sub_path", Attribute::optional_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_env_var_from_secret() {
        let env: EnvVar = serde_json::from_value(json!({
            "name": "AWS_ACCESS_KEY_ID",
            "value": null,
            "value_from": {"secret_key_ref": {"name": "s3", "key": "id"}}
        }))
        .unwrap();

        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({
                "name": "AWS_ACCESS_KEY_ID",
                "valueFrom": {"secretKeyRef": {"key": "id", "name": "s3"}}
            })
        );
    }

    #[test]
    fn test_security_context_names() {
        let ctx: SecurityContext = serde_json::from_value(json!({
            "read_only_root_filesystem": true,
            "capabilities": {"drop": ["ALL"]}
        }))
        .unwrap();

        assert_eq!(
            serde_json::to_value(&ctx).unwrap(),
            json!({"capabilities": {"drop": ["ALL"]}, "readOnlyRootFilesystem": true})
        );
    }
}
