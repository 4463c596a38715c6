//! # Evaluation Values — Closed Value Domain with Total Accessors
//!
//! Constraint contexts are loosely-typed JSON documents, so the evaluator
//! works over a closed sum type instead of host reflection: every value is
//! `Undefined`, a JSON value, or an arbitrary-precision integer produced
//! by a builtin. All accessors are total — a missing field, a wrong type,
//! or a failed coercion yields `Undefined`/`false`, never a panic.
//!
//! Truthiness, equality, and ordering deliberately reproduce the reference
//! implementation's semantics so that identical `(context, expression)`
//! inputs produce identical booleans in every language:
//!
//! - `0`, `NaN`, `""`, `null`, `undefined`, and `0n` are falsy; empty
//!   arrays and objects are truthy.
//! - `== null` treats `null` and `undefined` as interchangeable.
//! - Relational operators on mixed types are `false`; mixed-type `==`
//!   degrades to strict (same-type) equality.
//! - String ordering is lexicographic by Unicode code point.
//! - An integer comparison where one side is a `BigInt` coerces the other
//!   side from a numeric string or integer number.

use num_bigint::BigInt;
use serde_json::Value;

use crate::ast::BinaryOp;

/// A value produced during constraint evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalValue {
    /// Absent field, unknown function, or failed coercion.
    Undefined,
    /// Any JSON value resolved from the context or written as a literal.
    Json(Value),
    /// Arbitrary-precision integer produced by a `bigint_*` builtin.
    BigInt(BigInt),
}

impl EvalValue {
    /// JS-compatible truthiness.
    pub fn truthy(&self) -> bool {
        match self {
            EvalValue::Undefined => false,
            EvalValue::BigInt(b) => *b != BigInt::from(0),
            EvalValue::Json(v) => match v {
                Value::Null => false,
                Value::Bool(b) => *b,
                Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
                Value::String(s) => !s.is_empty(),
                Value::Array(_) | Value::Object(_) => true,
            },
        }
    }

    /// Whether this value is `null` or `undefined`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, EvalValue::Undefined | EvalValue::Json(Value::Null))
    }

    /// The `type_of` name for this value. Arrays and null are
    /// distinguished from plain objects.
    pub fn type_name(&self) -> &'static str {
        match self {
            EvalValue::Undefined => "undefined",
            EvalValue::BigInt(_) => "bigint",
            EvalValue::Json(Value::Null) => "null",
            EvalValue::Json(Value::Bool(_)) => "boolean",
            EvalValue::Json(Value::Number(_)) => "number",
            EvalValue::Json(Value::String(_)) => "string",
            EvalValue::Json(Value::Array(_)) => "array",
            EvalValue::Json(Value::Object(_)) => "object",
        }
    }

    /// Borrow the underlying JSON array, if this is one.
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            EvalValue::Json(Value::Array(items)) => Some(items),
            _ => None,
        }
    }

    /// Borrow the underlying JSON object, if this is one.
    pub fn as_object(&self) -> Option<&serde_json::Map<String, Value>> {
        match self {
            EvalValue::Json(Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    /// Borrow the underlying string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            EvalValue::Json(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of this value, when it is a JSON number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            EvalValue::Json(Value::Number(n)) => n.as_f64(),
            _ => None,
        }
    }

    /// Strict (same-type) equality, the `eq` builtin and the fallback for
    /// mixed-type `==`. `null` and `undefined` are NOT interchangeable
    /// here.
    pub fn strict_eq(&self, other: &EvalValue) -> bool {
        match (self, other) {
            (EvalValue::Undefined, EvalValue::Undefined) => true,
            (EvalValue::BigInt(a), EvalValue::BigInt(b)) => a == b,
            (EvalValue::Json(a), EvalValue::Json(b)) => match (a, b) {
                (Value::Null, Value::Null) => true,
                (Value::Bool(x), Value::Bool(y)) => x == y,
                (Value::Number(x), Value::Number(y)) => {
                    match (x.as_f64(), y.as_f64()) {
                        (Some(fx), Some(fy)) => fx == fy,
                        _ => false,
                    }
                }
                (Value::String(x), Value::String(y)) => x == y,
                // Reference identity for arrays/objects is not observable
                // in a pure evaluator; structural equality is the
                // deterministic stand-in.
                (Value::Array(x), Value::Array(y)) => x == y,
                (Value::Object(x), Value::Object(y)) => x == y,
                _ => false,
            },
            _ => false,
        }
    }

    /// Coerce to an arbitrary-precision integer.
    ///
    /// `null`/`undefined` coerce to 0 (the reference semantics for
    /// `bigint_*` arguments); integer-valued numbers and integer strings
    /// (optional leading `-`) coerce; everything else is `None`.
    pub fn to_bigint(&self) -> Option<BigInt> {
        match self {
            EvalValue::Undefined | EvalValue::Json(Value::Null) => Some(BigInt::from(0)),
            EvalValue::BigInt(b) => Some(b.clone()),
            EvalValue::Json(Value::String(s)) => parse_bigint_str(s),
            EvalValue::Json(Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    Some(BigInt::from(i))
                } else if let Some(u) = n.as_u64() {
                    Some(BigInt::from(u))
                } else {
                    let f = n.as_f64()?;
                    if f.is_finite() && f.fract() == 0.0 {
                        // Integral float literal (e.g. `300` parsed as f64).
                        Some(BigInt::from(f as i64))
                    } else {
                        None
                    }
                }
            }
            _ => None,
        }
    }
}

/// Parse an integer string with optional leading `-`.
///
/// Decimal points, whitespace, and empty strings all fail. A leading `-`
/// is accepted: the engine is sign-agnostic and non-negativity of
/// conservation fields is a schema-layer concern.
pub fn parse_bigint_str(s: &str) -> Option<BigInt> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Evaluate a comparison operator over two values.
///
/// Callers hand in only the six comparison operators; boolean connectives
/// and implication are short-circuited in the evaluator and never reach
/// this function.
pub fn compare(left: &EvalValue, op: BinaryOp, right: &EvalValue) -> bool {
    use BinaryOp::*;

    // Null literal on either side: null and undefined are interchangeable
    // for equality, and never ordered.
    if matches!(right, EvalValue::Json(Value::Null)) {
        return match op {
            Eq => left.is_nullish(),
            Ne => !left.is_nullish(),
            _ => false,
        };
    }
    if matches!(left, EvalValue::Json(Value::Null)) {
        return match op {
            Eq => right.is_nullish(),
            Ne => !right.is_nullish(),
            _ => false,
        };
    }

    // BigInt against numeric string or number: pull the other side up.
    let (l, r) = coerce_pair(left, right);

    match (&l, &r) {
        (EvalValue::BigInt(a), EvalValue::BigInt(b)) => match op {
            Eq => a == b,
            Ne => a != b,
            Lt => a < b,
            Gt => a > b,
            Le => a <= b,
            Ge => a >= b,
            _ => false,
        },
        (EvalValue::Json(Value::Number(a)), EvalValue::Json(Value::Number(b))) => {
            match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => match op {
                    Eq => x == y,
                    Ne => x != y,
                    Lt => x < y,
                    Gt => x > y,
                    Le => x <= y,
                    Ge => x >= y,
                    _ => false,
                },
                _ => false,
            }
        }
        (EvalValue::Json(Value::String(a)), EvalValue::Json(Value::String(b))) => match op {
            Eq => a == b,
            Ne => a != b,
            Lt => a < b,
            Gt => a > b,
            Le => a <= b,
            Ge => a >= b,
            _ => false,
        },
        (EvalValue::Json(Value::Bool(a)), EvalValue::Json(Value::Bool(b))) => match op {
            Eq => a == b,
            Ne => a != b,
            _ => false,
        },
        // Mixed types: equality degrades to strict, ordering is false.
        _ => match op {
            Eq => l.strict_eq(&r),
            Ne => !l.strict_eq(&r),
            _ => false,
        },
    }
}

/// When exactly one side is a BigInt and the other is a numeric string or
/// number, lift the other side. A failed lift leaves the pair unchanged
/// (mixed-type comparison). Nullish values are NOT lifted here — `0n ==
/// undefined` must stay false even though `bigint_*` arguments coerce
/// nullish to zero.
fn coerce_pair(left: &EvalValue, right: &EvalValue) -> (EvalValue, EvalValue) {
    fn lift(v: &EvalValue) -> Option<BigInt> {
        match v {
            EvalValue::Json(Value::String(_)) | EvalValue::Json(Value::Number(_)) => v.to_bigint(),
            _ => None,
        }
    }
    match (left, right) {
        (EvalValue::BigInt(_), EvalValue::BigInt(_)) => (left.clone(), right.clone()),
        (EvalValue::BigInt(_), other) => match lift(other) {
            Some(b) => (left.clone(), EvalValue::BigInt(b)),
            None => (left.clone(), right.clone()),
        },
        (other, EvalValue::BigInt(_)) => match lift(other) {
            Some(b) => (EvalValue::BigInt(b), right.clone()),
            None => (left.clone(), right.clone()),
        },
        _ => (left.clone(), right.clone()),
    }
}
