//! Building blocks shared by several logging-operator CRDs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::k8s::{
    EmptyDirVolumeSource, HostPathVolumeSource, KeySelector, LocalObjectReference,
    PersistentVolumeClaimSpec, PersistentVolumeClaimVolumeSource, PodSecurityContext,
    ResourceRequirements, SecurityContext, VolumeMount,
};
use crate::schema::{Attribute, Block, NestedBlock, SchemaBlock, Validator};

/// `Always`, `Never` or `IfNotPresent`.
pub fn pull_policy() -> Attribute {
    Attribute::optional_string()
        .with_description("Image pull policy.")
        .with_validator(Validator::one_of(["Always", "Never", "IfNotPresent"]))
}

/// A container image reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct ImageSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_pull_secrets: Option<Vec<LocalObjectReference>>,
}

impl SchemaBlock for ImageSpec {
    fn schema_block() -> Block {
        Block::new()
            .with_description("Container image to use.")
            .with_attribute("repository", Attribute::optional_string())
            .with_attribute("tag", Attribute::optional_string())
            .with_attribute("pull_policy", pull_policy())
            .with_block(
                "image_pull_secrets",
                NestedBlock::list_of::<LocalObjectReference>(),
            )
    }
}

/// A value that is either inline or read from a Kubernetes secret.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Secret {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_from: Option<SecretSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mount_from: Option<SecretSource>,
}

impl SchemaBlock for Secret {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("value", Attribute::optional_string().sensitive())
            .with_block("value_from", NestedBlock::single_of::<SecretSource>())
            .with_block("mount_from", NestedBlock::single_of::<SecretSource>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct SecretSource {
    pub secret_key_ref: KeySelector,
}

impl SchemaBlock for SecretSource {
    fn schema_block() -> Block {
        Block::new().with_block(
            "secret_key_ref",
            NestedBlock::single_of::<KeySelector>().required(),
        )
    }
}

/// Prometheus scrape settings of a component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Metrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_monitor: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_monitor_config: Option<ServiceMonitorConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prometheus_annotations: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prometheus_rules: Option<bool>,
}

impl SchemaBlock for Metrics {
    fn schema_block() -> Block {
        Block::new()
            .with_description("Metrics defines the service monitor endpoints.")
            .with_attribute("interval", Attribute::optional_string())
            .with_attribute("timeout", Attribute::optional_string())
            .with_attribute(
                "port",
                Attribute::optional_int64().with_validator(Validator::port()),
            )
            .with_attribute("path", Attribute::optional_string())
            .with_attribute("service_monitor", Attribute::optional_bool())
            .with_block(
                "service_monitor_config",
                NestedBlock::single_of::<ServiceMonitorConfig>(),
            )
            .with_attribute("prometheus_annotations", Attribute::optional_bool())
            .with_attribute("prometheus_rules", Attribute::optional_bool())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct ServiceMonitorConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_labels: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub honor_labels: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
}

impl SchemaBlock for ServiceMonitorConfig {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("additional_labels", Attribute::optional_string_map())
            .with_attribute("honor_labels", Attribute::optional_bool())
            .with_attribute(
                "scheme",
                Attribute::optional_string().with_validator(Validator::one_of(["http", "https"])),
            )
    }
}

/// A volume backed by a host path, an empty dir or a persistent volume claim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct KubernetesVolume {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_path: Option<HostPathVolumeSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_dir: Option<EmptyDirVolumeSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pvc: Option<PersistentVolumeClaim>,
}

impl SchemaBlock for KubernetesVolume {
    fn schema_block() -> Block {
        Block::new()
            .with_block("host_path", NestedBlock::single_of::<HostPathVolumeSource>())
            .with_block("empty_dir", NestedBlock::single_of::<EmptyDirVolumeSource>())
            .with_block("pvc", NestedBlock::single_of::<PersistentVolumeClaim>())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistentVolumeClaim {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<PersistentVolumeClaimSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PersistentVolumeClaimVolumeSource>,
}

impl SchemaBlock for PersistentVolumeClaim {
    fn schema_block() -> Block {
        Block::new()
            .with_block("spec", NestedBlock::single_of::<PersistentVolumeClaimSpec>())
            .with_block(
                "source",
                NestedBlock::single_of::<PersistentVolumeClaimVolumeSource>(),
            )
    }
}

/// Overrides for the container the operator generates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct ContainerBase {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_context: Option<SecurityContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_mounts: Option<Vec<VolumeMount>>,
}

impl SchemaBlock for ContainerBase {
    fn schema_block() -> Block {
        Block::new()
            .with_block("resources", NestedBlock::single_of::<ResourceRequirements>())
            .with_attribute("image", Attribute::optional_string())
            .with_attribute("pull_policy", pull_policy())
            .with_block("security_context", NestedBlock::single_of::<SecurityContext>())
            .with_block("volume_mounts", NestedBlock::list_of::<VolumeMount>())
    }
}

/// Service account and security contexts of a generated workload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Security {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_based_access_control_create: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_context: Option<SecurityContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_security_context: Option<PodSecurityContext>,
    #[serde(
        rename(serialize = "createOpenShiftSCC"),
        skip_serializing_if = "Option::is_none"
    )]
    pub create_openshift_scc: Option<bool>,
}

impl SchemaBlock for Security {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("service_account", Attribute::optional_string())
            .with_attribute("role_based_access_control_create", Attribute::optional_bool())
            .with_block("security_context", NestedBlock::single_of::<SecurityContext>())
            .with_block(
                "pod_security_context",
                NestedBlock::single_of::<PodSecurityContext>(),
            )
            .with_attribute("create_openshift_scc", Attribute::optional_bool())
    }
}

/// Labels and annotations added to generated workloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkloadMetaBase {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
}

impl SchemaBlock for WorkloadMetaBase {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute("annotations", Attribute::optional_string_map())
            .with_attribute("labels", Attribute::optional_string_map())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::validation::validate;
    use serde_json::json;

    #[test]
    fn test_secret_from_key_ref() {
        let secret: Secret = serde_json::from_value(json!({
            "value": null,
            "value_from": {"secret_key_ref": {"name": "es-auth", "key": "password"}}
        }))
        .unwrap();

        assert_eq!(
            serde_json::to_value(&secret).unwrap(),
            json!({"valueFrom": {"secretKeyRef": {"key": "password", "name": "es-auth"}}})
        );
    }

    #[test]
    fn test_secret_value_is_sensitive() {
        assert!(Secret::schema_block().attributes["value"].flags.sensitive);
    }

    #[test]
    fn test_image_pull_policy_validated() {
        let schema = Schema::v0().with_block("image", NestedBlock::single_of::<ImageSpec>());

        assert!(validate(&schema, &json!({"image": {"pull_policy": "IfNotPresent"}})).is_empty());

        let diagnostics = validate(&schema, &json!({"image": {"pull_policy": "Sometimes"}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("image.pull_policy".to_string()));
    }

    #[test]
    fn test_metrics_names() {
        let metrics: Metrics = serde_json::from_value(json!({
            "port": 2020,
            "service_monitor": true,
            "service_monitor_config": {"additional_labels": {"release": "prometheus"}}
        }))
        .unwrap();

        assert_eq!(
            serde_json::to_value(&metrics).unwrap(),
            json!({
                "port": 2020,
                "serviceMonitor": true,
                "serviceMonitorConfig": {"additionalLabels": {"release": "prometheus"}}
            })
        );
    }

    #[test]
    fn test_security_openshift_key() {
        let security: Security = serde_json::from_value(json!({
            "service_account": "logging",
            "create_openshift_scc": true
        }))
        .unwrap();

        assert_eq!(
            serde_json::to_value(&security).unwrap(),
            json!({"serviceAccount": "logging", "createOpenShiftSCC": true})
        );
    }

    #[test]
    fn test_volume_pvc() {
        let volume: KubernetesVolume = serde_json::from_value(json!({
            "pvc": {
                "spec": {"access_modes": ["ReadWriteOnce"]},
                "source": {"claim_name": "fluentd-buffer"}
            }
        }))
        .unwrap();

        assert_eq!(
            serde_json::to_value(&volume).unwrap(),
            json!({
                "pvc": {
                    "spec": {"accessModes": ["ReadWriteOnce"]},
                    "source": {"claimName": "fluentd-buffer"}
                }
            })
        );
    }
}
