//! Rendering of typed CRD trees into Kubernetes manifests.
//!
//! Every data source of this provider has the same shape: a typed `spec`
//! tree, a schema describing that tree, and a read that stamps in the CRD's
//! `apiVersion`/`kind` and serializes the result to YAML. [`ManifestKind`]
//! captures the per-CRD constants; [`manifest_schema`] and [`render`] are
//! the shared parts.

use serde::de::DeserializeOwned;
use serde::ser;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProviderError;
use crate::k8s::ObjectMeta;
use crate::schema::{Attribute, NestedBlock, Schema, SchemaBlock};

/// Name of the computed attribute holding the rendered manifest.
pub const YAML_ATTRIBUTE: &str = "yaml";

/// Compile-time description of one custom resource kind.
pub trait ManifestKind: 'static {
    /// Data source type name, e.g. `k8s_logging_banzaicloud_io_flow_v1beta1_manifest`.
    const DATA_SOURCE: &'static str;
    /// Value of `apiVersion` (`<group>/<version>`).
    const API_VERSION: &'static str;
    /// Value of `kind`.
    const KIND: &'static str;
    /// Whether objects of this kind live in a namespace.
    const NAMESPACED: bool;
    /// Whether a `spec` block must be given.
    const SPEC_REQUIRED: bool = false;
    /// Description published with the data source schema.
    const DESCRIPTION: &'static str;

    /// The typed `spec` tree.
    type Spec: Serialize + DeserializeOwned + SchemaBlock;
}

/// A rendered custom resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest<S> {
    /// `<group>/<version>` of the resource.
    pub api_version: &'static str,
    /// Kind of the resource.
    pub kind: &'static str,
    /// Object metadata.
    pub metadata: ObjectMeta,
    /// Desired state, omitted when not configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<S>,
}

impl<S: Serialize> Manifest<S> {
    /// Build a manifest of kind `K`.
    pub fn new<K>(metadata: ObjectMeta, spec: Option<S>) -> Self
    where
        K: ManifestKind<Spec = S>,
    {
        Self {
            api_version: K::API_VERSION,
            kind: K::KIND,
            metadata,
            spec,
        }
    }

    /// Serialize the manifest as a YAML document.
    ///
    /// The tree goes through a JSON value first, so mapping keys come out
    /// sorted at every level, as `sigs.k8s.io/yaml` emits them.
    pub fn to_yaml(&self) -> Result<String, ProviderError> {
        let tree = serde_json::to_value(self).map_err(<serde_yaml::Error as ser::Error>::custom)?;
        Ok(serde_yaml::to_string(&tree)?)
    }
}

/// The part of a data source configuration that becomes the manifest.
#[derive(Debug, Deserialize)]
struct ManifestConfig<S> {
    metadata: ObjectMeta,
    spec: Option<S>,
}

/// The data source schema of kind `K`.
///
/// `metadata` is always required, `spec` only when the kind says so, and
/// `yaml` is computed.
pub fn manifest_schema<K: ManifestKind>() -> Schema {
    let metadata = if K::NAMESPACED {
        ObjectMeta::namespaced_block()
    } else {
        ObjectMeta::cluster_block()
    };

    let mut spec = NestedBlock::single_of::<K::Spec>();
    if K::SPEC_REQUIRED {
        spec = spec.required();
    }

    Schema::v0()
        .with_description(K::DESCRIPTION)
        .with_block("metadata", NestedBlock::single(metadata).required())
        .with_block("spec", spec)
        .with_attribute(
            YAML_ATTRIBUTE,
            Attribute::computed_string().with_description("The generated manifest in YAML format."),
        )
}

/// Decode a data source configuration into a manifest of kind `K`.
pub fn manifest_from_config<K: ManifestKind>(
    config: &Value,
) -> Result<Manifest<K::Spec>, ProviderError> {
    let decoded: ManifestConfig<K::Spec> = serde_json::from_value(config.clone())
        .map_err(|e| ProviderError::InvalidConfig(e.to_string()))?;
    Ok(Manifest::new::<K>(decoded.metadata, decoded.spec))
}

/// Render a data source configuration of kind `K` as YAML.
///
/// Keys are sorted, so output can be compared byte for byte with manifests
/// rendered through `sigs.k8s.io/yaml`.
pub fn render<K: ManifestKind>(config: &Value) -> Result<String, ProviderError> {
    manifest_from_config::<K>(config)?.to_yaml()
}

/// Echo `config` back with the computed `yaml` attribute filled in.
pub fn read<K: ManifestKind>(config: Value) -> Result<Value, ProviderError> {
    let yaml = render::<K>(&config)?;
    let mut state = match config {
        Value::Object(map) => map,
        other => {
            return Err(ProviderError::InvalidConfig(format!(
                "expected an object, got {}",
                other
            )))
        },
    };
    state.insert(YAML_ATTRIBUTE.to_string(), Value::String(yaml));
    Ok(Value::Object(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Block, DiagnosticSeverity};
    use crate::validation::validate;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all(serialize = "camelCase"))]
    struct WidgetSpec {
        replica_count: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        log_level: Option<String>,
    }

    impl SchemaBlock for WidgetSpec {
        fn schema_block() -> Block {
            Block::new()
                .with_attribute("replica_count", Attribute::required_int64())
                .with_attribute("log_level", Attribute::optional_string())
        }
    }

    struct Widget;

    impl ManifestKind for Widget {
        const DATA_SOURCE: &'static str = "k8s_example_com_widget_v1_manifest";
        const API_VERSION: &'static str = "example.com/v1";
        const KIND: &'static str = "Widget";
        const NAMESPACED: bool = true;
        const SPEC_REQUIRED: bool = true;
        const DESCRIPTION: &'static str = "Widget manifest";
        type Spec = WidgetSpec;
    }

    struct Gadget;

    impl ManifestKind for Gadget {
        const DATA_SOURCE: &'static str = "k8s_example_com_gadget_v1_manifest";
        const API_VERSION: &'static str = "example.com/v1";
        const KIND: &'static str = "Gadget";
        const NAMESPACED: bool = false;
        const DESCRIPTION: &'static str = "Gadget manifest";
        type Spec = WidgetSpec;
    }

    #[test]
    fn test_render_stamps_api_version_and_kind() {
        let yaml = render::<Widget>(&json!({
            "metadata": {"name": "w", "namespace": "default"},
            "spec": {"replica_count": 2, "log_level": null}
        }))
        .unwrap();

        assert_eq!(
            yaml,
            "apiVersion: example.com/v1\n\
             kind: Widget\n\
             metadata:\n  name: w\n  namespace: default\n\
             spec:\n  replicaCount: 2\n"
        );
    }

    #[test]
    fn test_render_sorts_keys() {
        let yaml = render::<Widget>(&json!({
            "metadata": {
                "name": "w",
                "namespace": "default",
                "labels": {"zone": "a", "app": "w"}
            },
            "spec": {"replica_count": 1, "log_level": "info"}
        }))
        .unwrap();

        assert_eq!(
            yaml,
            "apiVersion: example.com/v1\n\
             kind: Widget\n\
             metadata:\n  labels:\n    app: w\n    zone: a\n  name: w\n  namespace: default\n\
             spec:\n  logLevel: info\n  replicaCount: 1\n"
        );
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(ser::Error::custom("value cannot be represented"))
        }
    }

    #[test]
    fn test_to_yaml_failure_is_marshal_error() {
        let manifest = Manifest {
            api_version: "example.com/v1",
            kind: "Widget",
            metadata: ObjectMeta::default(),
            spec: Some(Unserializable),
        };

        let err = manifest.to_yaml().unwrap_err();
        assert!(matches!(err, ProviderError::Marshal(_)));
        assert_eq!(
            err.to_diagnostic().summary,
            crate::error::MARSHAL_ERROR_SUMMARY
        );
    }

    #[test]
    fn test_config_without_spec_key_decodes() {
        let manifest =
            manifest_from_config::<Widget>(&json!({"metadata": {"name": "w", "namespace": "ns"}}))
                .unwrap();
        assert!(manifest.spec.is_none());
        assert_eq!(manifest.metadata.namespace.as_deref(), Some("ns"));
    }

    #[test]
    fn test_render_without_spec() {
        let yaml = render::<Gadget>(&json!({"metadata": {"name": "g"}, "spec": null})).unwrap();
        assert_eq!(yaml, "apiVersion: example.com/v1\nkind: Gadget\nmetadata:\n  name: g\n");
    }

    #[test]
    fn test_render_keeps_label_keys_verbatim() {
        let yaml = render::<Gadget>(&json!({
            "metadata": {
                "name": "g",
                "labels": {"app.kubernetes.io/name": "gadget", "some_label": "x"}
            }
        }))
        .unwrap();

        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(doc["metadata"]["labels"]["app.kubernetes.io/name"], "gadget");
        assert_eq!(doc["metadata"]["labels"]["some_label"], "x");
    }

    #[test]
    fn test_undecodable_config_is_invalid_config() {
        let err = render::<Widget>(&json!({"metadata": {"namespace": "default"}})).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidConfig(_)));

        let err = read::<Widget>(json!("not an object")).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidConfig(_)));
    }

    #[test]
    fn test_read_echoes_config_with_yaml() {
        let config = json!({
            "metadata": {"name": "g", "labels": null},
            "yaml": null
        });
        let state = read::<Gadget>(config).unwrap();

        assert_eq!(state["metadata"]["name"], "g");
        assert!(state["metadata"]["labels"].is_null());
        assert_eq!(
            state[YAML_ATTRIBUTE],
            "apiVersion: example.com/v1\nkind: Gadget\nmetadata:\n  name: g\n"
        );
    }

    #[test]
    fn test_manifest_schema_shape() {
        let schema = manifest_schema::<Widget>();
        assert_eq!(schema.block.description.as_deref(), Some("Widget manifest"));
        assert!(schema.block.attributes[YAML_ATTRIBUTE].flags.computed);
        assert_eq!(schema.block.blocks["metadata"].min_items, 1);
        assert_eq!(schema.block.blocks["spec"].min_items, 1);
        assert!(schema.block.blocks["metadata"]
            .block
            .attributes
            .contains_key("namespace"));

        let schema = manifest_schema::<Gadget>();
        assert_eq!(schema.block.blocks["spec"].min_items, 0);
        assert!(!schema.block.blocks["metadata"]
            .block
            .attributes
            .contains_key("namespace"));
    }

    #[test]
    fn test_manifest_schema_validation() {
        let schema = manifest_schema::<Widget>();

        let diagnostics = validate(&schema, &json!({"metadata": {"name": "w", "namespace": "ns"}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, DiagnosticSeverity::Error);
        assert_eq!(diagnostics[0].attribute, Some("spec".to_string()));

        let diagnostics = validate(
            &manifest_schema::<Gadget>(),
            &json!({"metadata": {"name": "g", "namespace": "ns"}}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("metadata.namespace".to_string()));
    }

    #[test]
    fn test_manifest_new_uses_kind_constants() {
        let manifest = Manifest::new::<Widget>(
            ObjectMeta {
                name: "w".to_string(),
                ..Default::default()
            },
            None,
        );
        assert_eq!(manifest.api_version, "example.com/v1");
        assert_eq!(manifest.kind, "Widget");
        assert_eq!(Widget::DATA_SOURCE, "k8s_example_com_widget_v1_manifest");
    }
}
