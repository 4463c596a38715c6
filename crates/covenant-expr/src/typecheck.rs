//! # Static Type Checker — CI-Time Signature Validation
//!
//! Checks declared constraint type signatures against a schema field
//! registry without executing any expression. Runs standalone in CI,
//! decoupled from the evaluator: the registry comes from the
//! business-schema layer, and the checker only needs field names and type
//! strings.
//!
//! Errors are contract violations (wrong schema, non-boolean output);
//! warnings are best-effort gaps (missing signature, unknown field,
//! unrecognized type string that looks like a forward schema reference).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::constraint::ConstraintFile;

/// Known primitive type names in constraint signatures.
const PRIMITIVE_TYPES: &[&str] = &[
    "boolean",
    "bigint",
    "bigint_coercible",
    "string",
    "number",
    "array",
    "object",
    "unknown",
];

/// Registry of schemas available for type checking: schema id → known
/// root field names and their declared types.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    schemas: BTreeMap<String, BTreeMap<String, String>>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema with its field → type map.
    pub fn register(
        &mut self,
        schema_id: impl Into<String>,
        fields: impl IntoIterator<Item = (String, String)>,
    ) {
        self.schemas
            .insert(schema_id.into(), fields.into_iter().collect());
    }

    /// Fields of a registered schema.
    pub fn fields(&self, schema_id: &str) -> Option<&BTreeMap<String, String>> {
        self.schemas.get(schema_id)
    }

    /// Whether the schema id is known.
    pub fn contains(&self, schema_id: &str) -> bool {
        self.schemas.contains_key(schema_id)
    }
}

/// An error found during type checking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCheckError {
    pub constraint_id: String,
    pub expression_fragment: String,
    pub expected_type: String,
    pub actual_type: String,
    pub message: String,
}

/// A non-fatal finding during type checking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCheckWarning {
    pub constraint_id: String,
    pub message: String,
}

/// Result of type-checking a constraint file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCheckReport {
    pub valid: bool,
    pub errors: Vec<TypeCheckError>,
    pub warnings: Vec<TypeCheckWarning>,
}

/// Type-check a constraint file against the registry.
///
/// Never executes expressions. Checks, per the contract:
///
/// 1. The file's `schema_id` exists in the registry (error).
/// 2. Each `type_signature.input_schema` matches the file's `schema_id`
///    (error).
/// 3. Each declared `output_type` is `"boolean"` — every constraint
///    predicate reduces to a boolean (error).
/// 4. Each `field_types` entry names a root field known to the registry
///    (warning) and uses a recognized type string (warning).
pub fn type_check_constraint_file(
    file: &ConstraintFile,
    registry: &FieldRegistry,
) -> TypeCheckReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let schema_fields = registry.fields(&file.schema_id);
    if schema_fields.is_none() {
        errors.push(TypeCheckError {
            constraint_id: file.schema_id.clone(),
            expression_fragment: file.schema_id.clone(),
            expected_type: "registered schema".into(),
            actual_type: "unknown".into(),
            message: format!("schema '{}' not found in registry", file.schema_id),
        });
        // Individual constraints can still be checked.
    }

    for constraint in &file.constraints {
        let Some(sig) = &constraint.type_signature else {
            warnings.push(TypeCheckWarning {
                constraint_id: constraint.id.clone(),
                message: format!(
                    "constraint '{}' has no type_signature — cannot type-check",
                    constraint.id
                ),
            });
            continue;
        };

        if let Some(input_schema) = &sig.input_schema {
            if input_schema != &file.schema_id {
                errors.push(TypeCheckError {
                    constraint_id: constraint.id.clone(),
                    expression_fragment: input_schema.clone(),
                    expected_type: file.schema_id.clone(),
                    actual_type: input_schema.clone(),
                    message: format!(
                        "type_signature.input_schema '{input_schema}' does not match file schema_id '{}'",
                        file.schema_id
                    ),
                });
            }
        }

        if let Some(output_type) = &sig.output_type {
            if output_type != "boolean" {
                errors.push(TypeCheckError {
                    constraint_id: constraint.id.clone(),
                    expression_fragment: format!("output_type: {output_type}"),
                    expected_type: "boolean".into(),
                    actual_type: output_type.clone(),
                    message: format!("constraint output_type must be 'boolean', got '{output_type}'"),
                });
            }
        }

        let primitives: BTreeSet<&str> = PRIMITIVE_TYPES.iter().copied().collect();
        for (field_path, field_type) in &sig.field_types {
            let base = normalize_type(field_type);
            let is_schema_reference = base.starts_with(|c: char| c.is_ascii_uppercase());
            if !primitives.contains(base.as_str()) && !is_schema_reference {
                warnings.push(TypeCheckWarning {
                    constraint_id: constraint.id.clone(),
                    message: format!(
                        "field '{field_path}' has type '{field_type}' — not a primitive constraint type (may be a schema reference)"
                    ),
                });
            }

            if let Some(fields) = schema_fields {
                let root = field_path.split('.').next().unwrap_or(field_path);
                if !fields.is_empty() && !fields.contains_key(root) {
                    warnings.push(TypeCheckWarning {
                        constraint_id: constraint.id.clone(),
                        message: format!(
                            "field path '{field_path}' root '{root}' not found in schema '{}' fields",
                            file.schema_id
                        ),
                    });
                }
            }
        }
    }

    TypeCheckReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Reduce a compound type string to its base: `string[]` → `string`,
/// `Record<string, integer>` → `object`.
fn normalize_type(field_type: &str) -> String {
    let stripped = field_type.strip_suffix("[]").unwrap_or(field_type);
    if stripped.starts_with("Record<") && stripped.ends_with('>') {
        return "object".into();
    }
    stripped.to_string()
}
