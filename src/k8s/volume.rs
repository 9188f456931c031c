//! Volume sources embedded by the logging operator's volume type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::meta::LabelSelector;
use crate::schema::{Attribute, Block, NestedBlock, SchemaBlock, Validator};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostPathVolumeSource {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
}

impl SchemaBlock for HostPathVolumeSource {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("path", Attribute::required_string())
            .with_attribute(
                "type",
                Attribute::optional_string().with_validator(Validator::one_of([
                    "",
                    "DirectoryOrCreate",
                    "Directory",
                    "FileOrCreate",
                    "File",
                    "Socket",
                    "CharDevice",
                    "BlockDevice",
                ])),
            )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct EmptyDirVolumeSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_limit: Option<String>,
}

impl SchemaBlock for EmptyDirVolumeSource {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute(
                "medium",
                Attribute::optional_string().with_validator(Validator::one_of(["", "Memory"])),
            )
            .with_attribute("size_limit", Attribute::optional_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct PersistentVolumeClaimSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_modes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<VolumeResourceRequirements>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<LabelSelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_name: Option<String>,
}

impl SchemaBlock for PersistentVolumeClaimSpec {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("access_modes", Attribute::optional_string_list())
            .with_block(
                "resources",
                NestedBlock::single_of::<VolumeResourceRequirements>(),
            )
            .with_block("selector", NestedBlock::single_of::<LabelSelector>())
            .with_attribute("storage_class_name", Attribute::optional_string())
            .with_attribute(
                "volume_mode",
                Attribute::optional_string().with_validator(Validator::one_of(["Filesystem", "Block"])),
            )
            .with_attribute("volume_name", Attribute::optional_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeResourceRequirements {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests: Option<BTreeMap<String, String>>,
}

impl SchemaBlock for VolumeResourceRequirements {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("limits", Attribute::optional_string_map())
            .with_attribute("requests", Attribute::optional_string_map())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct PersistentVolumeClaimVolumeSource {
    pub claim_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
}

impl SchemaBlock for PersistentVolumeClaimVolumeSource {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("claim_name", Attribute::required_string())
            .with_attribute("read_only", Attribute::optional_bool())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_host_path_type_field() {
        let source: HostPathVolumeSource = serde_json::from_value(json!({
            "path": "/var/log",
            "type": "DirectoryOrCreate"
        }))
        .unwrap();

        assert_eq!(
            serde_json::to_value(&source).unwrap(),
            json!({"path": "/var/log", "type": "DirectoryOrCreate"})
        );
    }

    #[test]
    fn test_pvc_spec_names() {
        let spec: PersistentVolumeClaimSpec = serde_json::from_value(json!({
            "access_modes": ["ReadWriteOnce"],
            "storage_class_name": "fast",
            "resources": {"requests": {"storage": "20Gi"}}
        }))
        .unwrap();

        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            json!({
                "accessModes": ["ReadWriteOnce"],
                "resources": {"requests": {"storage": "20Gi"}},
                "storageClassName": "fast"
            })
        );
    }
}
