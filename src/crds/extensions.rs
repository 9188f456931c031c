//! Kinds of the `logging-extensions.banzaicloud.io` group: `EventTailer`
//! and `HostTailer`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::common::{ContainerBase, ImageSpec, KubernetesVolume, WorkloadMetaBase};
use crate::k8s::{Affinity, PodSecurityContext, Toleration};
use crate::manifest::ManifestKind;
use crate::schema::{Attribute, Block, NestedBlock, SchemaBlock, Validator};

const EXTENSIONS_API_VERSION: &str = "logging-extensions.banzaicloud.io/v1alpha1";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct EventTailerSpec {
    pub control_namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_volume: Option<KubernetesVolume>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workload_meta_overrides: Option<WorkloadMetaBase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workload_overrides: Option<WorkloadOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_overrides: Option<ContainerBase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageSpec>,
}

impl SchemaBlock for EventTailerSpec {
    fn schema_block() -> Block {
        Block::new()
            .with_description("EventTailerSpec defines the desired state of EventTailer.")
            .with_attribute(
                "control_namespace",
                Attribute::required_string()
                    .with_description("The resources of EventTailer will be placed into this namespace.")
                    .with_validator(Validator::DnsLabel),
            )
            .with_block(
                "position_volume",
                NestedBlock::single_of::<KubernetesVolume>()
                    .with_description("Volume definition for tracking fluentbit file positions."),
            )
            .with_block(
                "workload_meta_overrides",
                NestedBlock::single_of::<WorkloadMetaBase>(),
            )
            .with_block("workload_overrides", NestedBlock::single_of::<WorkloadOverrides>())
            .with_block("container_overrides", NestedBlock::single_of::<ContainerBase>())
            .with_block("image", NestedBlock::single_of::<ImageSpec>())
    }
}

/// Pod level overrides of a generated workload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct WorkloadOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerations: Option<Vec<Toleration>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affinity: Option<Affinity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_context: Option<PodSecurityContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_class_name: Option<String>,
}

impl SchemaBlock for WorkloadOverrides {
    fn schema_block() -> Block {
        Block::new()
            .with_block("tolerations", NestedBlock::list_of::<Toleration>())
            .with_attribute("node_selector", Attribute::optional_string_map())
            .with_attribute("service_account_name", Attribute::optional_string())
            .with_block("affinity", NestedBlock::single_of::<Affinity>())
            .with_block("security_context", NestedBlock::single_of::<PodSecurityContext>())
            .with_attribute("priority_class_name", Attribute::optional_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct HostTailerSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_tailers: Option<Vec<FileTailer>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub systemd_tailers: Option<Vec<SystemdTailer>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_recreate_workload_on_immutable_field_change: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workload_meta_overrides: Option<WorkloadMetaBase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workload_overrides: Option<WorkloadOverrides>,
}

impl SchemaBlock for HostTailerSpec {
    fn schema_block() -> Block {
        Block::new()
            .with_description("HostTailerSpec defines the desired state of HostTailer.")
            .with_block("file_tailers", NestedBlock::list_of::<FileTailer>())
            .with_block("systemd_tailers", NestedBlock::list_of::<SystemdTailer>())
            .with_attribute(
                "enable_recreate_workload_on_immutable_field_change",
                Attribute::optional_bool(),
            )
            .with_block(
                "workload_meta_overrides",
                NestedBlock::single_of::<WorkloadMetaBase>(),
            )
            .with_block("workload_overrides", NestedBlock::single_of::<WorkloadOverrides>())
    }
}

/// Tails a file on the host. Tailer options use fluent-bit's snake_case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileTailer {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_max_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_chunk_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_long_lines: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_from_head: Option<bool>,
    #[serde(
        rename(serialize = "containerOverrides"),
        skip_serializing_if = "Option::is_none"
    )]
    pub container_overrides: Option<ContainerBase>,
}

impl SchemaBlock for FileTailer {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute(
                "name",
                Attribute::required_string().with_validator(Validator::DnsLabel),
            )
            .with_attribute("path", Attribute::optional_string())
            .with_attribute("disabled", Attribute::optional_bool())
            .with_attribute("buffer_max_size", Attribute::optional_string())
            .with_attribute("buffer_chunk_size", Attribute::optional_string())
            .with_attribute(
                "skip_long_lines",
                Attribute::optional_string().with_validator(Validator::on_off()),
            )
            .with_attribute("read_from_head", Attribute::optional_bool())
            .with_block("container_overrides", NestedBlock::single_of::<ContainerBase>())
    }
}

/// Tails the systemd journal of the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct SystemdTailer {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub systemd_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_overrides: Option<ContainerBase>,
}

impl SchemaBlock for SystemdTailer {
    fn schema_block() -> Block {
        Block::new()
            .with_attribute(
                "name",
                Attribute::required_string().with_validator(Validator::DnsLabel),
            )
            .with_attribute("path", Attribute::optional_string())
            .with_attribute("disabled", Attribute::optional_bool())
            .with_attribute(
                "systemd_filter",
                Attribute::optional_string()
                    .with_description("Filter to select systemd journal entries, e.g. _SYSTEMD_UNIT=kubelet.service"),
            )
            .with_attribute(
                "max_entries",
                Attribute::optional_int64().with_validator(Validator::IntAtLeast { min: 1 }),
            )
            .with_block("container_overrides", NestedBlock::single_of::<ContainerBase>())
    }
}

pub struct EventTailer;

impl ManifestKind for EventTailer {
    const DATA_SOURCE: &'static str =
        "k8s_logging_extensions_banzaicloud_io_event_tailer_v1alpha1_manifest";
    const API_VERSION: &'static str = EXTENSIONS_API_VERSION;
    const KIND: &'static str = "EventTailer";
    const NAMESPACED: bool = false;
    const SPEC_REQUIRED: bool = true;
    const DESCRIPTION: &'static str = "EventTailer is the Schema for the eventtailers API";
    type Spec = EventTailerSpec;
}

pub struct HostTailer;

impl ManifestKind for HostTailer {
    const DATA_SOURCE: &'static str =
        "k8s_logging_extensions_banzaicloud_io_host_tailer_v1alpha1_manifest";
    const API_VERSION: &'static str = EXTENSIONS_API_VERSION;
    const KIND: &'static str = "HostTailer";
    const NAMESPACED: bool = true;
    const DESCRIPTION: &'static str = "HostTailer is the Schema for the hosttailers API";
    type Spec = HostTailerSpec;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{manifest_schema, render};
    use crate::validation::validate;
    use serde_json::json;

    #[test]
    fn test_event_tailer_golden() {
        let yaml = render::<EventTailer>(&json!({
            "metadata": {"name": "events"},
            "spec": {"control_namespace": "logging"}
        }))
        .unwrap();

        assert_eq!(
            yaml,
            "apiVersion: logging-extensions.banzaicloud.io/v1alpha1\n\
             kind: EventTailer\n\
             metadata:\n  name: events\n\
             spec:\n  controlNamespace: logging\n"
        );
    }

    #[test]
    fn test_event_tailer_position_volume() {
        let yaml = render::<EventTailer>(&json!({
            "metadata": {"name": "events"},
            "spec": {
                "control_namespace": "logging",
                "position_volume": {"pvc": {"spec": {"access_modes": ["ReadWriteOnce"]}}},
                "workload_meta_overrides": {"labels": {"team": "ops"}}
            }
        }))
        .unwrap();

        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        let spec = &doc["spec"];
        assert_eq!(
            spec["positionVolume"]["pvc"]["spec"]["accessModes"][0],
            "ReadWriteOnce"
        );
        assert_eq!(spec["workloadMetaOverrides"]["labels"]["team"], "ops");
    }

    #[test]
    fn test_host_tailer_mixed_key_styles() {
        let yaml = render::<HostTailer>(&json!({
            "metadata": {"name": "host", "namespace": "logging"},
            "spec": {
                "file_tailers": [{
                    "name": "nginx-access",
                    "path": "/var/log/nginx/access.log",
                    "buffer_max_size": "64k",
                    "container_overrides": {"image": "fluent/fluent-bit:2.1"}
                }],
                "systemd_tailers": [{
                    "name": "kubelet",
                    "systemd_filter": "_SYSTEMD_UNIT=kubelet.service",
                    "max_entries": 100
                }]
            }
        }))
        .unwrap();

        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        let file = &doc["spec"]["fileTailers"][0];
        assert_eq!(file["buffer_max_size"], "64k");
        assert_eq!(file["containerOverrides"]["image"], "fluent/fluent-bit:2.1");

        let systemd = &doc["spec"]["systemdTailers"][0];
        assert_eq!(systemd["systemdFilter"], "_SYSTEMD_UNIT=kubelet.service");
        assert_eq!(systemd["maxEntries"], 100);
    }

    #[test]
    fn test_tailer_name_required() {
        let diagnostics = validate(
            &manifest_schema::<HostTailer>(),
            &json!({
                "metadata": {"name": "host", "namespace": "logging"},
                "spec": {"systemd_tailers": [{"max_entries": 0}]}
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
                "spec.systemd_tailers.0.max_entries",
                "spec.systemd_tailers.0.name"
            ]
        );
    }
}
