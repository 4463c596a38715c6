//! # Builtin Registry — Fixed Name → (Arity, Impl) Table
//!
//! Every builtin the evaluator dispatches lives in one registry,
//! constructed once and asserted complete against [`EVALUATOR_BUILTINS`]
//! — no conditionals scattered through the evaluator. Unknown names and
//! wrong arities never reach an implementation: the evaluator resolves
//! them to `undefined` so a bad constraint fails closed.
//!
//! Determinism rules that repeat across the table:
//!
//! - Integer arithmetic is arbitrary precision over integer strings;
//!   nullish arguments coerce to zero, anything non-coercible makes a
//!   comparison `false` or a sum zero. Leading `-` is accepted.
//! - Timestamps parse as strict RFC 3339 only. A value the host's date
//!   parser would "helpfully" accept (`June 1, 2026`) is simply `false`.
//! - Weight sums tolerate ±0.001 of IEEE 754 drift.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, Utc};
use num_bigint::BigInt;
use serde_json::Value;

use crate::context::EvaluationContext;
use crate::value::EvalValue;

/// Canonical list of registered evaluator builtins.
///
/// Useful for introspection, documentation generation, and conformance
/// testing. The registry is asserted to cover exactly this list.
pub const EVALUATOR_BUILTINS: &[&str] = &[
    "bigint_sum",
    "bigint_gte",
    "bigint_gt",
    "bigint_eq",
    "bigint_lte",
    "bigint_lt",
    "bigint_sub",
    "bigint_add",
    "eq",
    "all_links_subset_authority",
    "delegation_budget_conserved",
    "links_temporally_ordered",
    "links_form_chain",
    "no_emergent_in_individual",
    "all_emergent_have_evidence",
    "object_keys_subset",
    "changed",
    "previous",
    "delta",
    "len",
    "type_of",
    "is_bigint_coercible",
    "unique_values",
    "tree_budget_conserved",
    "tree_authority_narrowing",
    "saga_amount_conserved",
    "saga_steps_sequential",
    "outcome_consensus_valid",
    "monetary_policy_solvent",
    "permission_boundary_active",
    "proposal_quorum_met",
    "saga_timeout_valid",
    "proposal_weights_normalized",
    "is_after",
    "is_before",
    "is_between",
    "is_stale",
    "is_within",
    "constraint_lifecycle_valid",
    "proposal_execution_valid",
    "now",
    "model_routing_eligible",
    "basket_weights_normalized",
    "execution_checkpoint_valid",
    "audit_trail_chain_valid",
];

/// Language keywords that share the evaluator namespace with builtins.
pub const EVALUATOR_KEYWORDS: &[&str] = &["true", "false", "null", "undefined", "every", "length"];

/// Reserved names in the evaluator namespace: all builtin names plus the
/// language keywords. Consumer schemas should check their field names
/// against this set; arbitrary data-field names are never reserved by the
/// engine itself — collisions merely shadow.
pub fn reserved_evaluator_names() -> &'static BTreeSet<&'static str> {
    static RESERVED: OnceLock<BTreeSet<&'static str>> = OnceLock::new();
    RESERVED.get_or_init(|| {
        EVALUATOR_BUILTINS
            .iter()
            .chain(EVALUATOR_KEYWORDS.iter())
            .copied()
            .collect()
    })
}

/// Environment handed to builtin implementations.
pub(crate) struct BuiltinEnv<'a> {
    pub eval_ctx: Option<&'a EvaluationContext>,
}

/// Accepted argument count.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Arity {
    pub min: usize,
    pub max: usize,
}

impl Arity {
    const fn exact(n: usize) -> Self {
        Self { min: n, max: n }
    }

    const fn range(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn accepts(&self, n: usize) -> bool {
        n >= self.min && n <= self.max
    }
}

/// The three builtins that read their argument as a field *path* rather
/// than a value, comparing against the `_previous` sub-context. The
/// evaluator dispatches these itself because it owns path resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldPathBuiltin {
    Changed,
    Previous,
    Delta,
}

pub(crate) enum BuiltinImpl {
    Pure(fn(&[EvalValue], &BuiltinEnv) -> EvalValue),
    FieldPath(FieldPathBuiltin),
}

pub(crate) struct Builtin {
    pub arity: Arity,
    pub imp: BuiltinImpl,
}

/// The registry, constructed once. Construction asserts bidirectional
/// completeness against [`EVALUATOR_BUILTINS`].
pub(crate) fn registry() -> &'static BTreeMap<&'static str, Builtin> {
    static REGISTRY: OnceLock<BTreeMap<&'static str, Builtin>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut table: BTreeMap<&'static str, Builtin> = BTreeMap::new();
        let mut add = |name: &'static str, arity: Arity, imp: BuiltinImpl| {
            table.insert(name, Builtin { arity, imp });
        };
        use BuiltinImpl::Pure;

        add("bigint_sum", Arity::range(1, 2), Pure(bigint_sum));
        add("bigint_gte", Arity::exact(2), Pure(bigint_gte));
        add("bigint_gt", Arity::exact(2), Pure(bigint_gt));
        add("bigint_eq", Arity::exact(2), Pure(bigint_eq));
        add("bigint_lte", Arity::exact(2), Pure(bigint_lte));
        add("bigint_lt", Arity::exact(2), Pure(bigint_lt));
        add("bigint_sub", Arity::exact(2), Pure(bigint_sub));
        add("bigint_add", Arity::exact(2), Pure(bigint_add));
        add("eq", Arity::exact(2), Pure(strict_eq));
        add(
            "all_links_subset_authority",
            Arity::exact(1),
            Pure(all_links_subset_authority),
        );
        add(
            "delegation_budget_conserved",
            Arity::exact(1),
            Pure(delegation_budget_conserved),
        );
        add(
            "links_temporally_ordered",
            Arity::exact(1),
            Pure(links_temporally_ordered),
        );
        add("links_form_chain", Arity::exact(1), Pure(links_form_chain));
        add(
            "no_emergent_in_individual",
            Arity::exact(2),
            Pure(no_emergent_in_individual),
        );
        add(
            "all_emergent_have_evidence",
            Arity::exact(2),
            Pure(all_emergent_have_evidence),
        );
        add("object_keys_subset", Arity::exact(2), Pure(object_keys_subset));
        add(
            "changed",
            Arity::exact(1),
            BuiltinImpl::FieldPath(FieldPathBuiltin::Changed),
        );
        add(
            "previous",
            Arity::exact(1),
            BuiltinImpl::FieldPath(FieldPathBuiltin::Previous),
        );
        add(
            "delta",
            Arity::exact(1),
            BuiltinImpl::FieldPath(FieldPathBuiltin::Delta),
        );
        add("len", Arity::exact(1), Pure(len));
        add("type_of", Arity::exact(1), Pure(type_of));
        add(
            "is_bigint_coercible",
            Arity::exact(1),
            Pure(is_bigint_coercible),
        );
        add("unique_values", Arity::exact(2), Pure(unique_values));
        add(
            "tree_budget_conserved",
            Arity::exact(1),
            Pure(tree_budget_conserved),
        );
        add(
            "tree_authority_narrowing",
            Arity::exact(1),
            Pure(tree_authority_narrowing),
        );
        add(
            "saga_amount_conserved",
            Arity::exact(1),
            Pure(saga_amount_conserved),
        );
        add(
            "saga_steps_sequential",
            Arity::exact(1),
            Pure(saga_steps_sequential),
        );
        add(
            "outcome_consensus_valid",
            Arity::exact(1),
            Pure(outcome_consensus_valid),
        );
        add(
            "monetary_policy_solvent",
            Arity::exact(2),
            Pure(monetary_policy_solvent),
        );
        add(
            "permission_boundary_active",
            Arity::exact(1),
            Pure(permission_boundary_active),
        );
        add(
            "proposal_quorum_met",
            Arity::exact(1),
            Pure(proposal_quorum_met),
        );
        add("saga_timeout_valid", Arity::exact(1), Pure(saga_timeout_valid));
        add(
            "proposal_weights_normalized",
            Arity::exact(1),
            Pure(proposal_weights_normalized),
        );
        add("is_after", Arity::exact(2), Pure(is_after));
        add("is_before", Arity::exact(2), Pure(is_before));
        add("is_between", Arity::exact(3), Pure(is_between));
        add("is_stale", Arity::exact(3), Pure(is_stale));
        add("is_within", Arity::exact(3), Pure(is_within));
        add(
            "constraint_lifecycle_valid",
            Arity::exact(1),
            Pure(constraint_lifecycle_valid),
        );
        add(
            "proposal_execution_valid",
            Arity::exact(1),
            Pure(proposal_execution_valid),
        );
        add("now", Arity::exact(0), Pure(now));
        add(
            "model_routing_eligible",
            Arity::exact(2),
            Pure(model_routing_eligible),
        );
        add(
            "basket_weights_normalized",
            Arity::exact(1),
            Pure(basket_weights_normalized),
        );
        add(
            "execution_checkpoint_valid",
            Arity::exact(1),
            Pure(execution_checkpoint_valid),
        );
        add(
            "audit_trail_chain_valid",
            Arity::exact(1),
            Pure(audit_trail_chain_valid),
        );

        assert_eq!(
            table.len(),
            EVALUATOR_BUILTINS.len(),
            "builtin registry incomplete"
        );
        for name in EVALUATOR_BUILTINS {
            assert!(table.contains_key(name), "missing builtin impl: {name}");
        }
        table
    })
}

// ── Shared helpers ────────────────────────────────────────────────────

fn b(x: bool) -> EvalValue {
    EvalValue::Json(Value::Bool(x))
}

fn num(n: i64) -> EvalValue {
    EvalValue::Json(Value::Number(n.into()))
}

fn field<'v>(v: &'v Value, key: &str) -> Option<&'v Value> {
    v.as_object().and_then(|m| m.get(key))
}

fn str_field<'v>(v: &'v Value, key: &str) -> Option<&'v str> {
    field(v, key).and_then(Value::as_str)
}

fn f64_field(v: &Value, key: &str) -> Option<f64> {
    field(v, key).and_then(Value::as_f64)
}

fn bigint_field(v: &Value, key: &str) -> Option<BigInt> {
    match field(v, key)? {
        Value::String(s) => crate::value::parse_bigint_str(s),
        Value::Number(n) => n.as_i64().map(BigInt::from),
        _ => None,
    }
}

fn parse_instant(v: &EvalValue) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(v.as_str()?).ok()
}

fn parse_instant_str(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok()
}

/// Max-age argument for staleness builtins: integer number or integer
/// string, in seconds.
fn as_seconds(v: &EvalValue) -> Option<i64> {
    match v {
        EvalValue::Json(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Some(i)
            } else {
                let f = n.as_f64()?;
                (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
            }
        }
        EvalValue::Json(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
}

// ── Arbitrary-precision integer builtins ──────────────────────────────

fn bigint_sum(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    let zero = || EvalValue::BigInt(BigInt::from(0));
    let Some(items) = args[0].as_array() else {
        return zero();
    };

    // Form 2: bigint_sum(array_field, 'field') — sum a field from each
    // element. Form 1: bigint_sum([v1, v2]) — sum direct values.
    let mut sum = BigInt::from(0);
    if args.len() == 2 {
        let Some(field_name) = args[1].as_str() else {
            return zero();
        };
        for item in items {
            match field(item, field_name) {
                None | Some(Value::Null) => continue,
                Some(Value::String(s)) => match crate::value::parse_bigint_str(s) {
                    Some(v) => sum += v,
                    None => return zero(),
                },
                Some(Value::Number(n)) => match n.as_i64() {
                    Some(v) => sum += v,
                    None => return zero(),
                },
                Some(_) => return zero(),
            }
        }
    } else {
        for item in items {
            let v = EvalValue::Json(item.clone());
            if v.is_nullish() {
                continue;
            }
            match v.to_bigint() {
                Some(x) => sum += x,
                None => return zero(),
            }
        }
    }
    EvalValue::BigInt(sum)
}

fn bigint_pair(args: &[EvalValue]) -> Option<(BigInt, BigInt)> {
    Some((args[0].to_bigint()?, args[1].to_bigint()?))
}

fn bigint_gte(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    b(bigint_pair(args).is_some_and(|(x, y)| x >= y))
}

fn bigint_gt(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    b(bigint_pair(args).is_some_and(|(x, y)| x > y))
}

fn bigint_eq(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    b(bigint_pair(args).is_some_and(|(x, y)| x == y))
}

fn bigint_lte(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    b(bigint_pair(args).is_some_and(|(x, y)| x <= y))
}

fn bigint_lt(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    b(bigint_pair(args).is_some_and(|(x, y)| x < y))
}

fn bigint_sub(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    match bigint_pair(args) {
        Some((x, y)) => EvalValue::BigInt(x - y),
        None => EvalValue::BigInt(BigInt::from(0)),
    }
}

fn bigint_add(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    match bigint_pair(args) {
        Some((x, y)) => EvalValue::BigInt(x + y),
        None => EvalValue::BigInt(BigInt::from(0)),
    }
}

// ── Generic value builtins ────────────────────────────────────────────

fn strict_eq(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    b(args[0].strict_eq(&args[1]))
}

fn len(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    match &args[0] {
        EvalValue::Json(Value::Array(items)) => num(items.len() as i64),
        EvalValue::Json(Value::Object(map)) => num(map.len() as i64),
        EvalValue::Json(Value::String(s)) => num(s.chars().count() as i64),
        _ => num(0),
    }
}

fn type_of(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    EvalValue::Json(Value::String(args[0].type_name().into()))
}

fn is_bigint_coercible(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    // Nullish is NOT coercible even though bigint_* arguments default it
    // to zero: this builtin answers "is the field itself an integer?".
    b(!args[0].is_nullish() && args[0].to_bigint().is_some())
}

fn unique_values(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    let Some(items) = args[0].as_array() else {
        return b(false);
    };
    let Some(field_name) = args[1].as_str() else {
        return b(false);
    };
    let mut seen = BTreeSet::new();
    for item in items {
        let key = match field(item, field_name) {
            Some(v) => serde_json::to_string(v).unwrap_or_default(),
            None => String::from("\u{0}undefined"),
        };
        if !seen.insert(key) {
            return b(false);
        }
    }
    b(true)
}

// ── Delegation link-chain builtins ────────────────────────────────────

fn string_set(v: Option<&Value>) -> Option<Vec<String>> {
    v?.as_array().map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect()
    })
}

fn all_links_subset_authority(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    let Some(links) = args[0].as_array() else {
        return b(false);
    };
    for pair in links.windows(2) {
        let child = string_set(field(&pair[1], "authority_scope")).unwrap_or_default();
        let parent = string_set(field(&pair[0], "authority_scope")).unwrap_or_default();
        if child.iter().any(|cap| !parent.contains(cap)) {
            return b(false);
        }
    }
    b(true)
}

fn delegation_budget_conserved(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    let Some(links) = args[0].as_array() else {
        return b(false);
    };
    for pair in links.windows(2) {
        // Links without budget fields are skipped (vacuously conserved).
        let (Some(parent), Some(child)) = (
            bigint_field(&pair[0], "budget_allocated_micro"),
            bigint_field(&pair[1], "budget_allocated_micro"),
        ) else {
            continue;
        };
        if child > parent {
            return b(false);
        }
    }
    b(true)
}

fn links_temporally_ordered(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    let Some(links) = args[0].as_array() else {
        return b(false);
    };
    for pair in links.windows(2) {
        let (Some(a), Some(z)) = (
            str_field(&pair[0], "timestamp").and_then(parse_instant_str),
            str_field(&pair[1], "timestamp").and_then(parse_instant_str),
        ) else {
            return b(false);
        };
        if a > z {
            return b(false);
        }
    }
    b(true)
}

fn links_form_chain(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    let Some(links) = args[0].as_array() else {
        return b(false);
    };
    for pair in links.windows(2) {
        let (Some(delegatee), Some(delegator)) = (
            str_field(&pair[0], "delegatee"),
            str_field(&pair[1], "delegator"),
        ) else {
            return b(false);
        };
        if delegatee != delegator {
            return b(false);
        }
    }
    b(true)
}

// ── Capability-evidence builtins ──────────────────────────────────────

fn no_emergent_in_individual(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    let Some(emergent) = args[0].as_array() else {
        return b(false);
    };
    let Some(individual) = args[1].as_object() else {
        // Null individual: nothing to collide with.
        return b(args[1].is_nullish());
    };
    for cap in emergent.iter().filter_map(Value::as_str) {
        for caps in individual.values() {
            if caps
                .as_array()
                .is_some_and(|list| list.iter().any(|v| v.as_str() == Some(cap)))
            {
                return b(false);
            }
        }
    }
    b(true)
}

fn all_emergent_have_evidence(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    let Some(emergent) = args[0].as_array() else {
        return b(false);
    };
    if emergent.is_empty() {
        return b(true);
    }
    let Some(evidence) = args[1].as_array() else {
        return b(false);
    };
    for cap in emergent.iter().filter_map(Value::as_str) {
        let covered = evidence
            .iter()
            .any(|e| str_field(e, "capability") == Some(cap));
        if !covered {
            return b(false);
        }
    }
    b(true)
}

fn object_keys_subset(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    if args[0].is_nullish() {
        return b(true);
    }
    let Some(record) = args[0].as_object() else {
        return b(false);
    };
    let Some(allowed) = args[1].as_array() else {
        return b(false);
    };
    let allowed: BTreeSet<&str> = allowed.iter().filter_map(Value::as_str).collect();
    b(record.keys().all(|k| allowed.contains(k.as_str())))
}

// ── Tree builtins ─────────────────────────────────────────────────────

fn tree_budget_conserved(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    fn check(node: &Value) -> bool {
        let Some(children) = field(node, "children").and_then(Value::as_array) else {
            return true;
        };
        if let Some(budget) = bigint_field(node, "budget_allocated_micro") {
            let mut child_sum = BigInt::from(0);
            for child in children {
                if let Some(cb) = bigint_field(child, "budget_allocated_micro") {
                    child_sum += cb;
                }
            }
            if child_sum > budget {
                return false;
            }
        }
        children.iter().all(check)
    }
    match &args[0] {
        // A null root has nothing to violate.
        v if v.is_nullish() => b(true),
        EvalValue::Json(node @ Value::Object(_)) => b(check(node)),
        _ => b(false),
    }
}

fn tree_authority_narrowing(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    fn lower(scope: Option<&Value>) -> Vec<String> {
        string_set(scope)
            .unwrap_or_default()
            .into_iter()
            .map(|s| s.to_ascii_lowercase())
            .collect()
    }
    fn check(node: &Value) -> bool {
        let Some(children) = field(node, "children").and_then(Value::as_array) else {
            return true;
        };
        let parent = lower(field(node, "authority_scope"));
        for child in children {
            let child_scope = lower(field(child, "authority_scope"));
            if child_scope.iter().any(|cap| !parent.contains(cap)) {
                return false;
            }
            if !check(child) {
                return false;
            }
        }
        true
    }
    match &args[0] {
        v if v.is_nullish() => b(true),
        EvalValue::Json(node @ Value::Object(_)) => b(check(node)),
        _ => b(false),
    }
}

// ── Saga builtins ─────────────────────────────────────────────────────

fn completed_amount_sum(steps: &[Value]) -> BigInt {
    let mut sum = BigInt::from(0);
    for step in steps {
        if str_field(step, "status") == Some("completed") {
            if let Some(amount) = bigint_field(step, "amount_micro") {
                sum += amount;
            }
        }
    }
    sum
}

fn saga_amount_conserved(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    let Some(saga) = args[0].as_object() else {
        return b(false);
    };
    let steps = saga.get("steps").and_then(Value::as_array);
    let compensation = saga.get("compensation_steps").and_then(Value::as_array);
    let forward = completed_amount_sum(steps.map(Vec::as_slice).unwrap_or_default());
    let reverse = completed_amount_sum(compensation.map(Vec::as_slice).unwrap_or_default());
    // Compensation can only give back what the forward steps moved.
    b(reverse <= forward)
}

fn saga_steps_sequential(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    let Some(saga) = args[0].as_object() else {
        return b(false);
    };
    let steps = saga
        .get("steps")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let mut seen = BTreeSet::new();
    for step in steps {
        if let Some(id) = str_field(step, "step_id") {
            if !seen.insert(id) {
                return b(false);
            }
        }
    }
    b(true)
}

fn saga_timeout_valid(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    let Some(saga) = args[0].as_object() else {
        return b(false);
    };
    let Some(timeout) = saga.get("timeout").and_then(Value::as_object) else {
        return b(true);
    };
    let per_step = timeout.get("per_step_seconds").and_then(Value::as_f64);
    let total = timeout.get("total_seconds").and_then(Value::as_f64);

    let mut elapsed_total = 0.0;
    for key in ["steps", "compensation_steps"] {
        let steps = saga
            .get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for step in steps {
            if str_field(step, "status") != Some("completed") {
                continue;
            }
            let (Some(started), Some(completed)) = (
                str_field(step, "started_at").and_then(parse_instant_str),
                str_field(step, "completed_at").and_then(parse_instant_str),
            ) else {
                // A completed step without timestamps cannot prove it met
                // its deadline.
                return b(false);
            };
            let duration = (completed - started).num_seconds() as f64;
            if per_step.is_some_and(|limit| duration > limit) {
                return b(false);
            }
            elapsed_total += duration;
        }
    }
    b(!total.is_some_and(|limit| elapsed_total > limit))
}

// ── Consensus and governance builtins ─────────────────────────────────

fn outcome_consensus_valid(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    let Some(outcome) = args[0].as_object() else {
        return b(false);
    };
    let Some(kind) = outcome.get("outcome_type").and_then(Value::as_str) else {
        return b(false);
    };
    let votes = outcome
        .get("votes")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let achieved = outcome
        .get("consensus_achieved")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let threshold = outcome
        .get("consensus_threshold")
        .and_then(Value::as_f64)
        .unwrap_or(1.0);
    let agree = votes
        .iter()
        .filter(|v| str_field(v, "vote") == Some("agree"))
        .count();
    let ratio = if votes.is_empty() {
        0.0
    } else {
        agree as f64 / votes.len() as f64
    };

    let valid = match kind {
        "unanimous" => agree == votes.len() && achieved,
        "majority" => ratio >= threshold && achieved,
        "deadlock" => ratio < threshold && !achieved,
        "escalation" => {
            let escalated = outcome
                .get("escalated_to")
                .and_then(Value::as_str)
                .is_some_and(|s| !s.is_empty());
            escalated && !achieved
        }
        _ => false,
    };
    b(valid)
}

fn monetary_policy_solvent(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    let EvalValue::Json(policy @ Value::Object(_)) = &args[0] else {
        return b(false);
    };
    let (Some(ceiling), Some(supply)) = (
        bigint_field(policy, "conservation_ceiling"),
        args[1].to_bigint().filter(|_| !args[1].is_nullish()),
    ) else {
        return b(false);
    };
    b(supply <= ceiling)
}

fn permission_boundary_active(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    let Some(boundary) = args[0].as_object() else {
        return b(false);
    };
    let present = |key: &str| boundary.get(key).is_some_and(|v| !v.is_null());
    b(present("scope") && present("permitted_if") && present("reporting") && present("revocation"))
}

fn vote_weight_sum(proposal: &serde_json::Map<String, Value>) -> Option<(f64, usize)> {
    let votes = proposal.get("voting")?.get("votes_cast")?.as_array()?;
    let sum = votes
        .iter()
        .map(|v| f64_field(v, "weight").unwrap_or(0.0))
        .sum();
    Some((sum, votes.len()))
}

fn proposal_quorum_met(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    let Some(proposal) = args[0].as_object() else {
        return b(false);
    };
    let Some(quorum) = proposal
        .get("voting")
        .and_then(|v| f64_field(v, "quorum_required"))
    else {
        return b(false);
    };
    match vote_weight_sum(proposal) {
        Some((_, 0)) | None => b(false),
        Some((sum, _)) => b(sum >= quorum),
    }
}

fn proposal_weights_normalized(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    let Some(proposal) = args[0].as_object() else {
        return b(false);
    };
    match vote_weight_sum(proposal) {
        None => b(false),
        // No votes yet: nothing to be non-normalized.
        Some((_, 0)) => b(true),
        Some((sum, _)) => b((sum - 1.0).abs() <= 0.001),
    }
}

fn constraint_lifecycle_valid(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    let Some(event) = args[0].as_object() else {
        return b(false);
    };
    let (Some(from), Some(to)) = (
        event.get("from_status").and_then(Value::as_str),
        event.get("to_status").and_then(Value::as_str),
    ) else {
        return b(false);
    };
    const ALLOWED: &[(&str, &str)] = &[
        ("proposed", "under_review"),
        ("proposed", "rejected"),
        ("under_review", "enacted"),
        ("under_review", "rejected"),
        ("enacted", "deprecated"),
    ];
    b(ALLOWED.contains(&(from, to)))
}

fn proposal_execution_valid(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    let Some(execution) = args[0].as_object() else {
        return b(false);
    };
    if execution.get("status").and_then(Value::as_str) != Some("completed") {
        return b(false);
    }
    let changes = execution
        .get("changes_applied")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    b(!changes.is_empty()
        && changes
            .iter()
            .all(|c| str_field(c, "result") == Some("success")))
}

fn model_routing_eligible(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    let Some(cohort) = args[0].as_object() else {
        return b(false);
    };
    let Some(score) = cohort.get("personal_score").and_then(Value::as_f64) else {
        return b(false);
    };
    let Some(signal) = args[1].as_object() else {
        return b(false);
    };
    let Some(qualifying) = signal.get("qualifying_score").and_then(Value::as_f64) else {
        return b(false);
    };
    b(score >= qualifying)
}

fn basket_weights_normalized(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    let Some(basket) = args[0].as_object() else {
        return b(false);
    };
    let Some(entries) = basket.get("entries").and_then(Value::as_array) else {
        return b(false);
    };
    if entries.is_empty() {
        // A basket with no entries routes nothing; unlike proposal votes,
        // this is a malformed composition.
        return b(false);
    }
    let sum: f64 = entries
        .iter()
        .map(|e| f64_field(e, "weight").unwrap_or(0.0))
        .sum();
    b((sum - 1.0).abs() <= 0.001)
}

fn execution_checkpoint_valid(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    let Some(cp) = args[0].as_object() else {
        return b(false);
    };
    let (Some(health), Some(decision)) = (
        cp.get("health_status").and_then(Value::as_str),
        cp.get("proceed_decision").and_then(Value::as_str),
    ) else {
        return b(false);
    };
    let valid = matches!(
        (health, decision),
        ("healthy", "continue") | ("degraded", "continue") | ("degraded", "pause")
            | ("failing", "rollback")
    );
    b(valid)
}

fn audit_trail_chain_valid(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    let Some(trail) = args[0].as_object() else {
        return b(false);
    };
    let (Some(entries), Some(genesis)) = (
        trail.get("entries").and_then(Value::as_array),
        trail.get("genesis_hash").and_then(Value::as_str),
    ) else {
        return b(false);
    };
    let mut expected = genesis;
    for entry in entries {
        let (Some(previous), Some(hash)) = (
            str_field(entry, "previous_hash"),
            str_field(entry, "entry_hash"),
        ) else {
            return b(false);
        };
        if previous != expected {
            return b(false);
        }
        expected = hash;
    }
    b(true)
}

// ── Temporal builtins ─────────────────────────────────────────────────

fn is_after(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    match (parse_instant(&args[0]), parse_instant(&args[1])) {
        (Some(a), Some(z)) => b(a > z),
        _ => b(false),
    }
}

fn is_before(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    match (parse_instant(&args[0]), parse_instant(&args[1])) {
        (Some(a), Some(z)) => b(a < z),
        _ => b(false),
    }
}

fn is_between(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    match (
        parse_instant(&args[0]),
        parse_instant(&args[1]),
        parse_instant(&args[2]),
    ) {
        (Some(d), Some(lo), Some(hi)) => b(lo <= d && d <= hi),
        _ => b(false),
    }
}

fn staleness_elapsed(args: &[EvalValue]) -> Option<(i64, i64)> {
    let ts = parse_instant(&args[0])?;
    let max_age = as_seconds(&args[1])?;
    let reference = parse_instant(&args[2])?;
    if max_age < 0 {
        return None;
    }
    Some(((reference - ts).num_seconds(), max_age))
}

fn is_stale(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    // Strict: at exactly max_age the value is not yet stale.
    b(staleness_elapsed(args).is_some_and(|(elapsed, max_age)| elapsed > max_age))
}

fn is_within(args: &[EvalValue], _env: &BuiltinEnv) -> EvalValue {
    // Inclusive: at exactly max_age the value is still within.
    b(staleness_elapsed(args).is_some_and(|(elapsed, max_age)| elapsed <= max_age))
}

fn now(_args: &[EvalValue], env: &BuiltinEnv) -> EvalValue {
    if let Some(frozen) = env.eval_ctx.and_then(EvaluationContext::valid_frozen_timestamp) {
        return EvalValue::Json(Value::String(frozen.to_owned()));
    }
    EvalValue::Json(Value::String(
        Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
    ))
}
