//! # Constraint Files — Declarative Cross-Field Invariants
//!
//! The serde data model for constraint files: a schema-scoped collection
//! of constraint expressions with severities and messages, plus the
//! report helper that evaluates a whole file against one document.
//!
//! A failed constraint is a result — `false` plus the declared severity
//! and message — never a crash. Only authoring mistakes (malformed
//! expressions) surface as errors, and those belong in CI.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::context::EvaluationContext;
use crate::eval::evaluate_constraint;
use crate::token::ExprError;

/// How a constraint file came to exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintOrigin {
    /// Shipped with the schema from the start.
    #[default]
    Genesis,
    /// Added through a governance proposal.
    Enacted,
    /// Carried over from an earlier schema revision.
    Migrated,
}

/// Supported expression grammar revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpressionVersion {
    #[serde(rename = "1.0")]
    V1_0,
    #[serde(rename = "2.0")]
    V2_0,
}

/// Severity a violated constraint reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Where a constraint is enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationGeometry {
    /// Evaluated by this engine from the expression string.
    #[default]
    Expression,
    /// Enforced natively by the resource implementation; the expression
    /// is documentation and conformance reference only.
    Native,
}

/// Description of a natively-enforced constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeEnforcement {
    pub strategy: String,
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Pointer at the reference implementation enforcing this constraint.
    pub reference_impl: String,
}

/// Static type signature for a constraint expression, consumed by the
/// type checker. All fields are optional: a missing signature downgrades
/// checking to best-effort.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSignature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_type: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub field_types: BTreeMap<String, String>,
}

/// A single cross-field constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub id: String,
    pub expression: String,
    pub severity: Severity,
    pub message: String,
    /// Fields the expression reads, for documentation and impact
    /// analysis.
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub evaluation_geometry: EvaluationGeometry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_enforcement: Option<NativeEnforcement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_signature: Option<TypeSignature>,
}

/// A schema-scoped collection of constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintFile {
    pub schema_id: String,
    #[serde(default)]
    pub origin: ConstraintOrigin,
    pub contract_version: String,
    pub expression_version: ExpressionVersion,
    pub constraints: Vec<Constraint>,
}

/// One violated constraint in a file report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    pub constraint_id: String,
    pub severity: Severity,
    pub message: String,
}

/// Result of evaluating every expression-geometry constraint in a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintFileReport {
    /// True when no `error`-severity constraint was violated.
    pub passed: bool,
    pub violations: Vec<ConstraintViolation>,
    /// Constraints skipped because their geometry is `native`.
    pub skipped_native: Vec<String>,
}

/// Evaluate all constraints in a file against one document.
///
/// Constraints with `native` geometry are recorded as skipped — their
/// enforcement lives in the resource implementation. The report passes
/// when no `error`-severity constraint fails; warnings and infos are
/// reported but do not fail the document.
///
/// # Errors
///
/// Returns the first [`ExprError`] from a malformed expression. A file
/// that reaches production should have been through the syntax validator
/// and type checker in CI, so this is an authoring failure, not a data
/// failure.
pub fn evaluate_constraint_file(
    file: &ConstraintFile,
    document: &Value,
    eval_ctx: Option<&EvaluationContext>,
) -> Result<ConstraintFileReport, ExprError> {
    let mut violations = Vec::new();
    let mut skipped_native = Vec::new();

    for constraint in &file.constraints {
        if constraint.evaluation_geometry == EvaluationGeometry::Native {
            skipped_native.push(constraint.id.clone());
            continue;
        }
        let satisfied = evaluate_constraint(document, &constraint.expression, eval_ctx)?;
        if !satisfied {
            violations.push(ConstraintViolation {
                constraint_id: constraint.id.clone(),
                severity: constraint.severity,
                message: constraint.message.clone(),
            });
        }
    }

    let passed = !violations
        .iter()
        .any(|v| v.severity == Severity::Error);
    Ok(ConstraintFileReport {
        passed,
        violations,
        skipped_native,
    })
}
