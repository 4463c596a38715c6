//! # Evaluator — Pure AST Interpretation over a Data Context
//!
//! Walks a parsed [`Expr`] against a JSON context and produces a boolean.
//! Evaluation is synchronous, side-effect-free, and total: absent fields
//! resolve to `undefined`, unknown functions and wrong arities resolve to
//! `undefined`, and every comparison of incompatible values is `false`.
//! The only errors a caller can see come from tokenizing/parsing the
//! expression itself.
//!
//! `.every` parameters are bound in an overlay scope that shadows context
//! fields of the same name, and the [`EvaluationContext`] is threaded
//! through every recursive sub-evaluation so `now()` stays frozen inside
//! predicates too.

use num_bigint::BigInt;
use serde_json::Value;

use crate::ast::{parse_expression, BinaryOp, Expr, Literal, UnaryOp};
use crate::builtins::{registry, BuiltinEnv, BuiltinImpl, FieldPathBuiltin};
use crate::context::EvaluationContext;
use crate::token::ExprError;
use crate::value::{compare, EvalValue};

/// Evaluate a constraint expression against a data context.
///
/// Returns `Ok(true)` when the constraint is satisfied, `Ok(false)` when
/// violated.
///
/// # Errors
///
/// Only lexical and parse errors surface as `Err`; see the crate docs for
/// the fail-closed treatment of semantic issues.
pub fn evaluate_constraint(
    context: &Value,
    expression: &str,
    eval_ctx: Option<&EvaluationContext>,
) -> Result<bool, ExprError> {
    let ast = parse_expression(expression)?;
    let scope = Scope::root(context);
    let evaluator = Evaluator { eval_ctx };
    Ok(evaluator.eval(&ast, &scope).truthy())
}

/// Resolution scope: the root context plus `.every` parameter bindings.
/// Innermost binding wins, shadowing both outer bindings and context
/// fields of the same name.
struct Scope<'a> {
    root: &'a Value,
    bindings: Vec<(String, Value)>,
}

impl<'a> Scope<'a> {
    fn root(root: &'a Value) -> Self {
        Self {
            root,
            bindings: Vec::new(),
        }
    }

    fn with_binding(&self, name: &str, value: Value) -> Scope<'a> {
        let mut bindings = self.bindings.clone();
        bindings.push((name.to_owned(), value));
        Scope {
            root: self.root,
            bindings,
        }
    }

    /// Resolve a dotted field path. Missing paths and traversal through
    /// non-objects yield `Undefined`.
    fn resolve(&self, segments: &[String]) -> EvalValue {
        let Some((first, rest)) = segments.split_first() else {
            return EvalValue::Undefined;
        };
        let start: Option<&Value> = self
            .bindings
            .iter()
            .rev()
            .find(|(name, _)| name == first)
            .map(|(_, v)| v)
            .or_else(|| self.root.as_object().and_then(|m| m.get(first)));
        let Some(mut current) = start else {
            return EvalValue::Undefined;
        };
        for segment in rest {
            match current.as_object().and_then(|m| m.get(segment)) {
                Some(next) => current = next,
                None => return EvalValue::Undefined,
            }
        }
        EvalValue::Json(current.clone())
    }
}

struct Evaluator<'a> {
    eval_ctx: Option<&'a EvaluationContext>,
}

impl Evaluator<'_> {
    fn eval(&self, expr: &Expr, scope: &Scope) -> EvalValue {
        match expr {
            Expr::Literal(lit) => literal_value(lit),
            Expr::Identifier(name) => scope.resolve(std::slice::from_ref(name)),
            Expr::MemberAccess { object, property } => {
                let obj = self.eval(object, scope);
                if property == "length" {
                    // `.length` is defined for arrays and strings only,
                    // regardless of what fields an object carries.
                    return match &obj {
                        EvalValue::Json(Value::Array(items)) => json_int(items.len() as i64),
                        EvalValue::Json(Value::String(s)) => json_int(s.chars().count() as i64),
                        _ => EvalValue::Undefined,
                    };
                }
                match obj.as_object().and_then(|m| m.get(property)) {
                    Some(v) => EvalValue::Json(v.clone()),
                    None => EvalValue::Undefined,
                }
            }
            Expr::FunctionCall { name, args } => self.call(name, args, scope),
            Expr::UnaryOp {
                op: UnaryOp::Not,
                operand,
            } => bool_value(!self.eval(operand, scope).truthy()),
            Expr::BinaryOp { op, left, right } => match op {
                BinaryOp::Implies => {
                    // a => b  ≡  !a || b, right side unevaluated when the
                    // antecedent is falsy.
                    if !self.eval(left, scope).truthy() {
                        bool_value(true)
                    } else {
                        bool_value(self.eval(right, scope).truthy())
                    }
                }
                BinaryOp::Or => {
                    if self.eval(left, scope).truthy() {
                        bool_value(true)
                    } else {
                        bool_value(self.eval(right, scope).truthy())
                    }
                }
                BinaryOp::And => {
                    if !self.eval(left, scope).truthy() {
                        bool_value(false)
                    } else {
                        bool_value(self.eval(right, scope).truthy())
                    }
                }
                cmp => {
                    let l = self.eval(left, scope);
                    let r = self.eval(right, scope);
                    bool_value(compare(&l, *cmp, &r))
                }
            },
            Expr::ArrayLiteral(elements) => {
                let values: Vec<Value> = elements
                    .iter()
                    .map(|e| match self.eval(e, scope) {
                        EvalValue::Json(v) => v,
                        // Undefined elements act like null (skipped by
                        // bigint_sum); BigInt results carry through as
                        // integer strings.
                        EvalValue::Undefined => Value::Null,
                        EvalValue::BigInt(b) => Value::String(b.to_string()),
                    })
                    .collect();
                EvalValue::Json(Value::Array(values))
            }
            Expr::Every {
                array_path,
                param,
                predicate,
            } => {
                let resolved = scope.resolve(array_path);
                let Some(items) = resolved.as_array() else {
                    return bool_value(false);
                };
                // Vacuously true on empty; short-circuits on first false.
                for item in items {
                    let inner = scope.with_binding(param, item.clone());
                    if !self.eval(predicate, &inner).truthy() {
                        return bool_value(false);
                    }
                }
                bool_value(true)
            }
        }
    }

    fn call(&self, name: &str, arg_exprs: &[Expr], scope: &Scope) -> EvalValue {
        let Some(builtin) = registry().get(name) else {
            // Unknown function: fail closed, never crash the pipeline.
            return EvalValue::Undefined;
        };
        if !builtin.arity.accepts(arg_exprs.len()) {
            return EvalValue::Undefined;
        }
        match &builtin.imp {
            BuiltinImpl::FieldPath(kind) => {
                let Some(path) = extract_field_path(&arg_exprs[0]) else {
                    return EvalValue::Undefined;
                };
                self.field_path_builtin(*kind, &path, scope)
            }
            BuiltinImpl::Pure(f) => {
                let args: Vec<EvalValue> =
                    arg_exprs.iter().map(|e| self.eval(e, scope)).collect();
                let env = BuiltinEnv {
                    eval_ctx: self.eval_ctx,
                };
                f(&args, &env)
            }
        }
    }

    /// `changed`, `previous`, and `delta` compare the current context
    /// against the `_previous` sub-context at the same field path.
    fn field_path_builtin(
        &self,
        kind: FieldPathBuiltin,
        path: &[String],
        scope: &Scope,
    ) -> EvalValue {
        let mut previous_path = Vec::with_capacity(path.len() + 1);
        previous_path.push(PREVIOUS_KEY.to_owned());
        previous_path.extend_from_slice(path);
        let has_previous = scope.resolve(&previous_path[..1]).as_object().is_some();

        match kind {
            FieldPathBuiltin::Changed => {
                if !has_previous {
                    return bool_value(false);
                }
                let current = scope.resolve(path);
                let previous = scope.resolve(&previous_path);
                bool_value(!current.strict_eq(&previous))
            }
            FieldPathBuiltin::Previous => scope.resolve(&previous_path),
            FieldPathBuiltin::Delta => {
                // No previous context: delta is zero without touching the
                // current value.
                if !has_previous {
                    return EvalValue::BigInt(BigInt::from(0));
                }
                let current = scope.resolve(path);
                let previous = scope.resolve(&previous_path);
                if let (Some(cur), Some(prev)) = (current.to_bigint(), previous.to_bigint()) {
                    return EvalValue::BigInt(cur - prev);
                }
                // Number fallback for decimal strings and floats.
                match (numeric_view(&current), numeric_view(&previous)) {
                    (Some(cur), Some(prev)) => {
                        match serde_json::Number::from_f64(cur - prev) {
                            Some(n) => EvalValue::Json(Value::Number(n)),
                            None => EvalValue::BigInt(BigInt::from(0)),
                        }
                    }
                    _ => EvalValue::BigInt(BigInt::from(0)),
                }
            }
        }
    }
}

const PREVIOUS_KEY: &str = "_previous";

fn literal_value(lit: &Literal) -> EvalValue {
    match lit {
        Literal::Null => EvalValue::Json(Value::Null),
        Literal::Undefined => EvalValue::Undefined,
        Literal::Bool(x) => EvalValue::Json(Value::Bool(*x)),
        Literal::Str(s) => EvalValue::Json(Value::String(s.clone())),
        Literal::Number(n) => {
            // Integer literals stay integers; only true decimals become
            // floating point.
            if n.fract() == 0.0 && n.is_finite() && *n >= i64::MIN as f64 && *n <= i64::MAX as f64 {
                json_int(*n as i64)
            } else {
                match serde_json::Number::from_f64(*n) {
                    Some(num) => EvalValue::Json(Value::Number(num)),
                    None => EvalValue::Undefined,
                }
            }
        }
    }
}

fn json_int(n: i64) -> EvalValue {
    EvalValue::Json(Value::Number(n.into()))
}

fn bool_value(x: bool) -> EvalValue {
    EvalValue::Json(Value::Bool(x))
}

/// Numeric view with host-number semantics, used only by the `delta`
/// fallback: numbers pass through, numeric strings parse, everything else
/// is non-numeric.
fn numeric_view(v: &EvalValue) -> Option<f64> {
    match v {
        EvalValue::Json(Value::Number(n)) => n.as_f64(),
        EvalValue::Json(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
}

/// Extract a dotted field path from an argument written as `field` or
/// `a.b.c`. Anything else (a literal, a call) is not a path.
fn extract_field_path(expr: &Expr) -> Option<Vec<String>> {
    match expr {
        Expr::Identifier(name) => Some(vec![name.clone()]),
        Expr::MemberAccess { object, property } => {
            let mut path = extract_field_path(object)?;
            path.push(property.clone());
            Some(path)
        }
        _ => None,
    }
}
