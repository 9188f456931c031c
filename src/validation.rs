//! Schema validation helpers.
//!
//! Validates a data source configuration (`serde_json::Value`) against its
//! [`Schema`] before anything is rendered, producing one diagnostic per
//! problem with the dotted attribute path.
//!
//! # Example
//!
//! ```
//! use logging_manifest_provider::schema::{Attribute, Schema, Validator};
//! use logging_manifest_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("log_level", Attribute::optional_string()
//!         .with_validator(Validator::one_of(["info", "debug"])));
//!
//! assert!(validate(&schema, &json!({"log_level": "info"})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"log_level": "loud"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("log_level".to_string()));
//! ```

use crate::schema::{
    Attribute, AttributeType, Block, BlockNestingMode, Diagnostic, DiagnosticSeverity, NestedBlock,
    Schema, Validator,
};
use serde_json::Value;

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics for any validation errors found.
/// An empty list means the value is valid.
///
/// # Validation Rules
///
/// - Required attributes must be present and non-null
/// - Optional attributes may be absent or null
/// - Computed-only attributes are skipped (the provider sets these)
/// - Attribute types must match the schema
/// - Attribute validators must hold for present values
/// - Keys not declared in the schema are rejected
/// - Nested blocks are validated recursively with min/max item constraints
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_block(&schema.block, value, "", &mut diagnostics);
    diagnostics
}

/// Validate a JSON value against a schema, returning Ok if valid or Err with diagnostics.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

fn validate_block(block: &Block, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let obj = match value {
        Value::Object(map) => map,
        Value::Null => return,
        _ => {
            diagnostics.push(
                Diagnostic::error("Expected object")
                    .with_detail(format!("Got {}", value_type_name(value)))
                    .with_attribute_if_not_empty(path),
            );
            return;
        },
    };

    for (name, attr) in &block.attributes {
        let attr_path = join_path(path, name);
        validate_attribute(attr, obj.get(name), &attr_path, diagnostics);
    }

    for (name, nested_block) in &block.blocks {
        let block_path = join_path(path, name);
        validate_nested_block(nested_block, obj.get(name), &block_path, diagnostics);
    }

    for key in obj.keys() {
        if !block.attributes.contains_key(key) && !block.blocks.contains_key(key) {
            let key_path = join_path(path, key);
            diagnostics.push(
                Diagnostic::error(format!("Unsupported argument '{}'", key_path))
                    .with_detail("An argument with this name is not expected here")
                    .with_attribute(key_path),
            );
        }
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if attr.flags.computed && !attr.flags.optional && !attr.flags.required {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
        },
        Some(v) => {
            let before = diagnostics.len();
            validate_attribute_type(&attr.attr_type, v, path, diagnostics);
            // Validators assume the declared type.
            if diagnostics.len() == before {
                for validator in &attr.validators {
                    if let Some(diagnostic) = check_validator(validator, v, path) {
                        diagnostics.push(diagnostic);
                    }
                }
            }
        },
    }
}

fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match attr_type {
        AttributeType::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        },
        AttributeType::Int64 => {
            if !is_int64(value) {
                diagnostics.push(type_error(path, "int64", value));
            }
        },
        AttributeType::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        },
        AttributeType::List(element_type) => {
            if let Some(arr) = value.as_array() {
                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}.{}", path, i);
                    validate_attribute_type(element_type, elem, &elem_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "list", value));
            }
        },
        AttributeType::Map(value_type) => {
            if let Some(obj) = value.as_object() {
                for (key, val) in obj {
                    let key_path = format!("{}.{}", path, key);
                    validate_attribute_type(value_type, val, &key_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "map", value));
            }
        },
        AttributeType::Dynamic => {},
    }
}

fn check_validator(validator: &Validator, value: &Value, path: &str) -> Option<Diagnostic> {
    let failure = match validator {
        Validator::OneOf { values } => {
            let s = value.as_str()?;
            if values.iter().any(|v| v == s) {
                return None;
            }
            format!("Value must be one of: {}, got \"{}\"", values.join(", "), s)
        },
        Validator::LengthBetween { min, max } => {
            let len = value.as_str()?.chars().count();
            if (*min..=*max).contains(&len) {
                return None;
            }
            format!(
                "String length must be between {} and {}, got {}",
                min, max, len
            )
        },
        Validator::IntAtLeast { min } => {
            let n = value.as_i64()?;
            if n >= *min {
                return None;
            }
            format!("Value must be at least {}, got {}", min, n)
        },
        Validator::IntBetween { min, max } => {
            let n = value.as_i64()?;
            if (*min..=*max).contains(&n) {
                return None;
            }
            format!("Value must be between {} and {}, got {}", min, max, n)
        },
        Validator::DnsSubdomain => {
            let s = value.as_str()?;
            if is_dns_subdomain(s) {
                return None;
            }
            format!(
                "\"{}\" must consist of lower case alphanumeric characters, '-' or '.', \
                 start and end with an alphanumeric character, and be at most 253 characters",
                s
            )
        },
        Validator::DnsLabel => {
            let s = value.as_str()?;
            if is_dns_label(s) {
                return None;
            }
            format!(
                "\"{}\" must consist of lower case alphanumeric characters or '-', \
                 start and end with an alphanumeric character, and be at most 63 characters",
                s
            )
        },
    };

    Some(
        Diagnostic::error(format!("Invalid value for attribute '{}'", path))
            .with_detail(failure)
            .with_attribute(path),
    )
}

fn validate_nested_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match nested.nesting_mode {
        BlockNestingMode::Single => validate_single_block(nested, value, path, diagnostics),
        BlockNestingMode::List => validate_list_block(nested, value, path, diagnostics),
        BlockNestingMode::Map => validate_map_block(nested, value, path, diagnostics),
    }
}

fn validate_single_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match value {
        None | Some(Value::Null) => {
            if nested.min_items > 0 {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required block '{}'", path))
                        .with_detail("At least one block is required")
                        .with_attribute(path),
                );
            }
        },
        Some(v) => validate_block(&nested.block, v, path, diagnostics),
    }
}

fn validate_list_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match value {
        None | Some(Value::Null) => {
            if nested.min_items > 0 {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s)",
                        path, nested.min_items
                    ))
                    .with_attribute(path),
                );
            }
        },
        Some(Value::Array(arr)) => {
            check_cardinality(nested, arr.len(), path, diagnostics);
            for (i, item) in arr.iter().enumerate() {
                let item_path = format!("{}.{}", path, i);
                validate_block(&nested.block, item, &item_path, diagnostics);
            }
        },
        Some(v) => {
            diagnostics.push(
                Diagnostic::error(format!("Expected list for block '{}'", path))
                    .with_detail(format!("Got {}", value_type_name(v)))
                    .with_attribute(path),
            );
        },
    }
}

fn validate_map_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match value {
        None | Some(Value::Null) => {
            if nested.min_items > 0 {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s)",
                        path, nested.min_items
                    ))
                    .with_attribute(path),
                );
            }
        },
        Some(Value::Object(obj)) => {
            check_cardinality(nested, obj.len(), path, diagnostics);
            for (key, item) in obj {
                let item_path = format!("{}.{}", path, key);
                validate_block(&nested.block, item, &item_path, diagnostics);
            }
        },
        Some(v) => {
            diagnostics.push(
                Diagnostic::error(format!("Expected map for block '{}'", path))
                    .with_detail(format!("Got {}", value_type_name(v)))
                    .with_attribute(path),
            );
        },
    }
}

fn check_cardinality(
    nested: &NestedBlock,
    len: usize,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let len = u32::try_from(len).unwrap_or(u32::MAX);

    if len < nested.min_items {
        diagnostics.push(
            Diagnostic::error(format!(
                "Block '{}' requires at least {} item(s), got {}",
                path, nested.min_items, len
            ))
            .with_attribute(path),
        );
    }

    // 0 means unlimited
    if nested.max_items > 0 && len > nested.max_items {
        diagnostics.push(
            Diagnostic::error(format!(
                "Block '{}' allows at most {} item(s), got {}",
                path, nested.max_items, len
            ))
            .with_attribute(path),
        );
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64(),
        _ => false,
    }
}

fn is_dns_label(s: &str) -> bool {
    let bytes = s.as_bytes();
    !bytes.is_empty()
        && bytes.len() <= 63
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        && bytes[0].is_ascii_alphanumeric()
        && bytes[bytes.len() - 1].is_ascii_alphanumeric()
}

fn is_dns_subdomain(s: &str) -> bool {
    !s.is_empty() && s.len() <= 253 && s.split('.').all(is_dns_label)
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic {
        severity: DiagnosticSeverity::Error,
        summary: format!("Invalid type for attribute '{}'", path),
        detail: Some(format!(
            "Expected {}, got {}",
            expected,
            value_type_name(got)
        )),
        attribute: Some(path.to_string()),
    }
}

trait DiagnosticExt {
    fn with_attribute_if_not_empty(self, path: &str) -> Self;
}

impl DiagnosticExt for Diagnostic {
    fn with_attribute_if_not_empty(self, path: &str) -> Self {
        if path.is_empty() {
            self
        } else {
            self.with_attribute(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, Block, NestedBlock, Schema};
    use serde_json::json;

    #[test]
    fn test_validate_required_string() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        assert!(validate(&schema, &json!({"name": "test"})).is_empty());

        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("name".to_string()));

        let diagnostics = validate(&schema, &json!({"name": null}));
        assert_eq!(diagnostics.len(), 1);

        let diagnostics = validate(&schema, &json!({"name": 123}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid type"));
    }

    #[test]
    fn test_validate_optional_attribute() {
        let schema = Schema::v0().with_attribute("workers", Attribute::optional_int64());

        assert!(validate(&schema, &json!({"workers": 2})).is_empty());
        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"workers": null})).is_empty());
        assert_eq!(validate(&schema, &json!({"workers": "two"})).len(), 1);
        assert_eq!(validate(&schema, &json!({"workers": 2.5})).len(), 1);
    }

    #[test]
    fn test_validate_computed_attribute_skipped() {
        let schema = Schema::v0().with_attribute("yaml", Attribute::computed_string());

        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"yaml": 123})).is_empty());
    }

    #[test]
    fn test_validate_unsupported_argument() {
        let schema = Schema::v0().with_attribute("name", Attribute::optional_string());

        let diagnostics = validate(&schema, &json!({"nmae": "typo"}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Unsupported argument"));
        assert_eq!(diagnostics[0].attribute, Some("nmae".to_string()));
    }

    #[test]
    fn test_validate_list_and_map() {
        let schema = Schema::v0()
            .with_attribute("watch_namespaces", Attribute::optional_string_list())
            .with_attribute("labels", Attribute::optional_string_map());

        assert!(validate(
            &schema,
            &json!({"watch_namespaces": ["a", "b"], "labels": {"app.kubernetes.io/name": "x"}})
        )
        .is_empty());

        let diagnostics = validate(&schema, &json!({"watch_namespaces": ["a", 1]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute,
            Some("watch_namespaces.1".to_string())
        );

        let diagnostics = validate(&schema, &json!({"labels": ["not", "a", "map"]}));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_validate_dynamic_accepts_anything() {
        let schema = Schema::v0().with_attribute("filters", Attribute::optional_dynamic());

        assert!(validate(&schema, &json!({"filters": [{"any": {"shape": 1}}]})).is_empty());
        assert!(validate(&schema, &json!({"filters": "string"})).is_empty());
    }

    #[test]
    fn test_validate_one_of() {
        let schema = Schema::v0().with_attribute(
            "pull_policy",
            Attribute::optional_string()
                .with_validator(Validator::one_of(["Always", "Never", "IfNotPresent"])),
        );

        assert!(validate(&schema, &json!({"pull_policy": "Always"})).is_empty());

        let diagnostics = validate(&schema, &json!({"pull_policy": "Sometimes"}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid value"));
        assert!(diagnostics[0]
            .detail
            .as_ref()
            .unwrap()
            .contains("Always, Never, IfNotPresent"));
    }

    #[test]
    fn test_validator_skipped_on_type_error() {
        let schema = Schema::v0().with_attribute(
            "port",
            Attribute::optional_int64().with_validator(Validator::port()),
        );

        let diagnostics = validate(&schema, &json!({"port": "80"}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid type"));
    }

    #[test]
    fn test_validate_int_ranges() {
        let schema = Schema::v0()
            .with_attribute(
                "port",
                Attribute::optional_int64().with_validator(Validator::port()),
            )
            .with_attribute(
                "workers",
                Attribute::optional_int64().with_validator(Validator::IntAtLeast { min: 1 }),
            );

        assert!(validate(&schema, &json!({"port": 24240, "workers": 1})).is_empty());
        assert_eq!(validate(&schema, &json!({"port": 0})).len(), 1);
        assert_eq!(validate(&schema, &json!({"port": 70000})).len(), 1);
        assert_eq!(validate(&schema, &json!({"workers": 0})).len(), 1);
    }

    #[test]
    fn test_validate_length_between() {
        let schema = Schema::v0().with_attribute(
            "name",
            Attribute::optional_string()
                .with_validator(Validator::LengthBetween { min: 1, max: 3 }),
        );

        assert!(validate(&schema, &json!({"name": "abc"})).is_empty());
        assert_eq!(validate(&schema, &json!({"name": ""})).len(), 1);
        assert_eq!(validate(&schema, &json!({"name": "abcd"})).len(), 1);
    }

    #[test]
    fn test_dns_names() {
        assert!(is_dns_label("logging"));
        assert!(is_dns_label("kube-system"));
        assert!(!is_dns_label("Logging"));
        assert!(!is_dns_label("-logging"));
        assert!(!is_dns_label("logging-"));
        assert!(!is_dns_label(""));
        assert!(!is_dns_label(&"a".repeat(64)));

        assert!(is_dns_subdomain("all-to-file"));
        assert!(is_dns_subdomain("logging.banzaicloud.io"));
        assert!(!is_dns_subdomain("double..dot"));
        assert!(!is_dns_subdomain("under_score"));
    }

    #[test]
    fn test_validate_dns_validators() {
        let schema = Schema::v0()
            .with_attribute(
                "name",
                Attribute::required_string().with_validator(Validator::DnsSubdomain),
            )
            .with_attribute(
                "namespace",
                Attribute::required_string().with_validator(Validator::DnsLabel),
            );

        assert!(validate(&schema, &json!({"name": "a.b", "namespace": "ns"})).is_empty());

        let diagnostics = validate(&schema, &json!({"name": "A_B", "namespace": "a.b"}));
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_validate_nested_block_single() {
        let schema = Schema::v0().with_block(
            "metadata",
            NestedBlock::single(Block::new().with_attribute("name", Attribute::required_string()))
                .required(),
        );

        assert!(validate(&schema, &json!({"metadata": {"name": "x"}})).is_empty());

        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Missing required block"));

        let diagnostics = validate(&schema, &json!({"metadata": {}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("metadata.name".to_string()));

        let diagnostics = validate(&schema, &json!({"metadata": "x"}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Expected object"));
    }

    #[test]
    fn test_validate_nested_block_list() {
        let schema = Schema::v0().with_block(
            "tolerations",
            NestedBlock::list(Block::new().with_attribute("key", Attribute::required_string()))
                .with_max_items(2),
        );

        assert!(validate(&schema, &json!({"tolerations": [{"key": "a"}]})).is_empty());
        assert!(validate(&schema, &json!({"tolerations": []})).is_empty());

        let diagnostics = validate(
            &schema,
            &json!({"tolerations": [{"key": "a"}, {"key": "b"}, {"key": "c"}]}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("at most 2"));

        let diagnostics = validate(&schema, &json!({"tolerations": [{}]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("tolerations.0.key".to_string()));

        let diagnostics = validate(&schema, &json!({"tolerations": {"key": "a"}}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Expected list"));
    }

    #[test]
    fn test_validate_nested_block_map() {
        let schema = Schema::v0().with_block(
            "outputs",
            NestedBlock::map(Block::new().with_attribute("path", Attribute::required_string()))
                .with_min_items(1),
        );

        assert!(validate(&schema, &json!({"outputs": {"a": {"path": "/tmp"}}})).is_empty());

        let diagnostics = validate(&schema, &json!({"outputs": {}}));
        assert_eq!(diagnostics.len(), 1);

        let diagnostics = validate(&schema, &json!({"outputs": {"a": {}}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("outputs.a.path".to_string()));
    }

    #[test]
    fn test_validate_result_and_is_valid() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        assert!(is_valid(&schema, &json!({"name": "x"})));
        assert!(!is_valid(&schema, &json!({})));
        assert!(validate_result(&schema, &json!({"name": "x"})).is_ok());
        assert_eq!(validate_result(&schema, &json!({})).unwrap_err().len(), 1);
    }
}
