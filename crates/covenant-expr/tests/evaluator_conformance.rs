//! # Evaluator Conformance Vectors
//!
//! Fixed (context, expression, expected) cases for the structural
//! governance builtins. These are the cases a re-implementation in
//! another language must reproduce exactly; each block pins the edge
//! behavior (vacuous truth, null handling, tolerance windows) that the
//! prose documentation is most likely to under-specify.

use proptest::prelude::*;
use serde_json::{json, Value};

use covenant_expr::evaluate_constraint;

fn eval(data: Value, expr: &str) -> bool {
    evaluate_constraint(&data, expr, None).unwrap()
}

// ── delegation link chains ───────────────────────────────────────────

#[test]
fn links_subset_authority() {
    let ok = json!({"links": [
        {"authority_scope": ["read", "write"]},
        {"authority_scope": ["read"]}
    ]});
    assert!(eval(ok, "all_links_subset_authority(links)"));

    let widened = json!({"links": [
        {"authority_scope": ["read"]},
        {"authority_scope": ["read", "write"]}
    ]});
    assert!(!eval(widened, "all_links_subset_authority(links)"));

    assert!(eval(json!({"links": []}), "all_links_subset_authority(links)"));
    assert!(eval(
        json!({"links": [{"authority_scope": ["read"]}]}),
        "all_links_subset_authority(links)"
    ));
}

#[test]
fn links_budget_conservation() {
    let ok = json!({"links": [
        {"budget_allocated_micro": "1000"},
        {"budget_allocated_micro": "500"}
    ]});
    assert!(eval(ok, "delegation_budget_conserved(links)"));

    let inflated = json!({"links": [
        {"budget_allocated_micro": "500"},
        {"budget_allocated_micro": "1000"}
    ]});
    assert!(!eval(inflated, "delegation_budget_conserved(links)"));

    // Missing budgets are skipped, not violations.
    let partial = json!({"links": [
        {"budget_allocated_micro": "1000"},
        {},
        {"budget_allocated_micro": "9999"}
    ]});
    assert!(eval(partial, "delegation_budget_conserved(links)"));
}

#[test]
fn links_temporal_ordering() {
    let ordered = json!({"links": [
        {"timestamp": "2026-01-01T00:00:00Z"},
        {"timestamp": "2026-01-02T00:00:00Z"}
    ]});
    assert!(eval(ordered, "links_temporally_ordered(links)"));

    let reversed = json!({"links": [
        {"timestamp": "2026-01-02T00:00:00Z"},
        {"timestamp": "2026-01-01T00:00:00Z"}
    ]});
    assert!(!eval(reversed, "links_temporally_ordered(links)"));

    let missing = json!({"links": [
        {"timestamp": "2026-01-01T00:00:00Z"},
        {"timestamp": null}
    ]});
    assert!(!eval(missing, "links_temporally_ordered(links)"));
}

#[test]
fn links_chain_formation() {
    let chained = json!({"links": [
        {"delegatee": "B"},
        {"delegator": "B", "delegatee": "C"}
    ]});
    assert!(eval(chained, "links_form_chain(links)"));

    let broken = json!({"links": [
        {"delegatee": "B"},
        {"delegator": "X", "delegatee": "C"}
    ]});
    assert!(!eval(broken, "links_form_chain(links)"));

    assert!(eval(json!({"links": []}), "links_form_chain(links)"));
}

// ── capability evidence ──────────────────────────────────────────────

#[test]
fn emergent_capability_rules() {
    let distinct = json!({
        "emergent": ["consensus"],
        "individual": {"m1": ["reasoning"], "m2": ["coding"]}
    });
    assert!(eval(distinct, "no_emergent_in_individual(emergent, individual)"));

    let overlapping = json!({
        "emergent": ["reasoning"],
        "individual": {"m1": ["reasoning"], "m2": ["coding"]}
    });
    assert!(!eval(overlapping, "no_emergent_in_individual(emergent, individual)"));

    let with_evidence = json!({
        "emergent": ["consensus"],
        "evidence": [{"capability": "consensus", "test_name": "t1", "score": 0.9}]
    });
    assert!(eval(with_evidence, "all_emergent_have_evidence(emergent, evidence)"));

    let missing_evidence = json!({
        "emergent": ["consensus", "synthesis"],
        "evidence": [{"capability": "consensus", "test_name": "t1", "score": 0.9}]
    });
    assert!(!eval(missing_evidence, "all_emergent_have_evidence(emergent, evidence)"));
}

#[test]
fn object_keys_subset_rules() {
    let ok = json!({"rec": {"a": 1, "b": 2}, "allowed": ["a", "b", "c"]});
    assert!(eval(ok, "object_keys_subset(rec, allowed)"));

    let extra = json!({"rec": {"a": 1, "d": 2}, "allowed": ["a", "b", "c"]});
    assert!(!eval(extra, "object_keys_subset(rec, allowed)"));

    // Null record is vacuously a subset.
    assert!(eval(
        json!({"rec": null, "allowed": ["a"]}),
        "object_keys_subset(rec, allowed)"
    ));
}

#[test]
fn unique_values_rules() {
    let unique = json!({"items": [{"id": "a"}, {"id": "b"}]});
    assert!(eval(unique, "unique_values(items, 'id')"));

    let duplicated = json!({"items": [{"id": "a"}, {"id": "a"}]});
    assert!(!eval(duplicated, "unique_values(items, 'id')"));

    assert!(eval(json!({"items": []}), "unique_values(items, 'id')"));
}

// ── trees ────────────────────────────────────────────────────────────

#[test]
fn tree_budget_conservation() {
    let ok = json!({"root": {
        "node_id": "1", "budget_allocated_micro": "1000",
        "children": [
            {"node_id": "2", "budget_allocated_micro": "500", "children": []},
            {"node_id": "3", "budget_allocated_micro": "500", "children": []}
        ]
    }});
    assert!(eval(ok, "tree_budget_conserved(root)"));

    let overflow = json!({"root": {
        "node_id": "1", "budget_allocated_micro": "1000",
        "children": [
            {"node_id": "2", "budget_allocated_micro": "600", "children": []},
            {"node_id": "3", "budget_allocated_micro": "600", "children": []}
        ]
    }});
    assert!(!eval(overflow, "tree_budget_conserved(root)"));

    // Violation two levels down is still caught.
    let deep = json!({"root": {
        "node_id": "1", "budget_allocated_micro": "1000",
        "children": [{
            "node_id": "2", "budget_allocated_micro": "800",
            "children": [
                {"node_id": "3", "budget_allocated_micro": "500", "children": []},
                {"node_id": "4", "budget_allocated_micro": "400", "children": []}
            ]
        }]
    }});
    assert!(!eval(deep, "tree_budget_conserved(root)"));

    // A null root has nothing to violate.
    assert!(eval(json!({"root": null}), "tree_budget_conserved(root)"));
}

#[test]
fn tree_authority_narrowing_is_case_insensitive() {
    let ok = json!({"root": {
        "node_id": "1", "authority_scope": ["Billing", "INFERENCE"],
        "children": [{"node_id": "2", "authority_scope": ["billing"], "children": []}]
    }});
    assert!(eval(ok, "tree_authority_narrowing(root)"));

    let widened = json!({"root": {
        "node_id": "1", "authority_scope": ["billing"],
        "children": [{"node_id": "2", "authority_scope": ["billing", "inference"], "children": []}]
    }});
    assert!(!eval(widened, "tree_authority_narrowing(root)"));

    let deep_violation = json!({"root": {
        "node_id": "1", "authority_scope": ["billing", "inference", "delegation"],
        "children": [{
            "node_id": "2", "authority_scope": ["billing", "inference"],
            "children": [{
                "node_id": "3", "authority_scope": ["billing", "delegation"],
                "children": []
            }]
        }]
    }});
    assert!(!eval(deep_violation, "tree_authority_narrowing(root)"));

    let empty_leaf = json!({"root": {
        "node_id": "1", "authority_scope": ["billing"],
        "children": [{"node_id": "2", "authority_scope": [], "children": []}]
    }});
    assert!(eval(empty_leaf, "tree_authority_narrowing(root)"));
}

// ── sagas ────────────────────────────────────────────────────────────

#[test]
fn saga_amount_conservation() {
    let forward_only = json!({"saga": {
        "steps": [
            {"step_id": "s1", "step_type": "transfer", "status": "completed", "amount_micro": "1000"},
            {"step_id": "s2", "step_type": "transfer", "status": "completed", "amount_micro": "500"}
        ],
        "compensation_steps": []
    }});
    assert!(eval(forward_only, "saga_amount_conserved(saga)"));

    let compensated = json!({"saga": {
        "steps": [{"step_id": "s1", "status": "completed", "amount_micro": "1000"}],
        "compensation_steps": [{"step_id": "c1", "status": "completed", "amount_micro": "1000"}]
    }});
    assert!(eval(compensated, "saga_amount_conserved(saga)"));

    let over_compensated = json!({"saga": {
        "steps": [{"step_id": "s1", "status": "completed", "amount_micro": "500"}],
        "compensation_steps": [{"step_id": "c1", "status": "completed", "amount_micro": "1000"}]
    }});
    assert!(!eval(over_compensated, "saga_amount_conserved(saga)"));

    // Pending steps do not count toward either side.
    let with_pending = json!({"saga": {
        "steps": [
            {"step_id": "s1", "status": "completed", "amount_micro": "1000"},
            {"step_id": "s2", "status": "pending", "amount_micro": "9999999"}
        ],
        "compensation_steps": []
    }});
    assert!(eval(with_pending, "saga_amount_conserved(saga)"));

    assert!(eval(
        json!({"saga": {"steps": [], "compensation_steps": []}}),
        "saga_amount_conserved(saga)"
    ));
    assert!(!eval(json!({"saga": "not-an-object"}), "saga_amount_conserved(saga)"));
}

#[test]
fn saga_step_uniqueness() {
    let unique = json!({"saga": {"steps": [
        {"step_id": "s1"}, {"step_id": "s2"}, {"step_id": "s3"}
    ]}});
    assert!(eval(unique, "saga_steps_sequential(saga)"));

    let duplicated = json!({"saga": {"steps": [
        {"step_id": "s1"}, {"step_id": "s2"}, {"step_id": "s1"}
    ]}});
    assert!(!eval(duplicated, "saga_steps_sequential(saga)"));

    assert!(eval(json!({"saga": {"steps": []}}), "saga_steps_sequential(saga)"));
    assert!(!eval(json!({"saga": null}), "saga_steps_sequential(saga)"));
}

#[test]
fn saga_timeouts() {
    let within = json!({"saga": {
        "steps": [{
            "step_id": "s1", "status": "completed",
            "started_at": "2026-01-15T10:00:00Z", "completed_at": "2026-01-15T10:00:30Z",
            "amount_micro": "1000"
        }],
        "compensation_steps": [],
        "timeout": {"total_seconds": 300, "per_step_seconds": 60}
    }});
    assert!(eval(within, "saga_timeout_valid(saga)"));

    let exceeded = json!({"saga": {
        "steps": [{
            "step_id": "s1", "status": "completed",
            "started_at": "2026-01-15T10:00:00Z", "completed_at": "2026-01-15T10:02:00Z",
            "amount_micro": "1000"
        }],
        "compensation_steps": [],
        "timeout": {"total_seconds": 300, "per_step_seconds": 60}
    }});
    assert!(!eval(exceeded, "saga_timeout_valid(saga)"));

    let pending_skipped = json!({"saga": {
        "steps": [{"step_id": "s1", "status": "pending", "started_at": null, "completed_at": null}],
        "compensation_steps": [],
        "timeout": {"total_seconds": 300, "per_step_seconds": 60}
    }});
    assert!(eval(pending_skipped, "saga_timeout_valid(saga)"));

    let missing_timestamps = json!({"saga": {
        "steps": [{"step_id": "s1", "status": "completed"}],
        "compensation_steps": [],
        "timeout": {"total_seconds": 300, "per_step_seconds": 60}
    }});
    assert!(!eval(missing_timestamps, "saga_timeout_valid(saga)"));
}

// ── consensus outcomes ───────────────────────────────────────────────

#[test]
fn consensus_outcome_matrix() {
    let unanimous = json!({"outcome": {
        "outcome_type": "unanimous",
        "votes": [{"vote": "agree"}, {"vote": "agree"}, {"vote": "agree"}],
        "consensus_threshold": 1.0,
        "consensus_achieved": true
    }});
    assert!(eval(unanimous, "outcome_consensus_valid(outcome)"));

    let broken_unanimous = json!({"outcome": {
        "outcome_type": "unanimous",
        "votes": [{"vote": "agree"}, {"vote": "disagree"}],
        "consensus_threshold": 1.0,
        "consensus_achieved": true
    }});
    assert!(!eval(broken_unanimous, "outcome_consensus_valid(outcome)"));

    let majority = json!({"outcome": {
        "outcome_type": "majority",
        "votes": [{"vote": "agree"}, {"vote": "agree"}, {"vote": "disagree"}],
        "consensus_threshold": 0.5,
        "consensus_achieved": true
    }});
    assert!(eval(majority, "outcome_consensus_valid(outcome)"));

    let failed_majority = json!({"outcome": {
        "outcome_type": "majority",
        "votes": [{"vote": "agree"}, {"vote": "disagree"}, {"vote": "disagree"}],
        "consensus_threshold": 0.5,
        "consensus_achieved": false
    }});
    assert!(!eval(failed_majority, "outcome_consensus_valid(outcome)"));

    let deadlock = json!({"outcome": {
        "outcome_type": "deadlock",
        "votes": [{"vote": "agree"}, {"vote": "disagree"}],
        "consensus_threshold": 0.75,
        "consensus_achieved": false
    }});
    assert!(eval(deadlock, "outcome_consensus_valid(outcome)"));

    let false_deadlock = json!({"outcome": {
        "outcome_type": "deadlock",
        "votes": [{"vote": "agree"}, {"vote": "agree"}, {"vote": "agree"}],
        "consensus_threshold": 0.5,
        "consensus_achieved": false
    }});
    assert!(!eval(false_deadlock, "outcome_consensus_valid(outcome)"));

    let escalation = json!({"outcome": {
        "outcome_type": "escalation",
        "votes": [{"vote": "disagree"}],
        "consensus_threshold": 1.0,
        "consensus_achieved": false,
        "escalated_to": "admin-agent"
    }});
    assert!(eval(escalation, "outcome_consensus_valid(outcome)"));

    let unrouted_escalation = json!({"outcome": {
        "outcome_type": "escalation",
        "votes": [{"vote": "disagree"}],
        "consensus_threshold": 1.0,
        "consensus_achieved": false
    }});
    assert!(!eval(unrouted_escalation, "outcome_consensus_valid(outcome)"));

    assert!(!eval(json!({"outcome": "bad"}), "outcome_consensus_valid(outcome)"));
}

// ── monetary policy, boundaries, proposals ───────────────────────────

#[test]
fn monetary_policy_solvency() {
    let policy = json!({"conservation_ceiling": "1000000"});
    assert!(eval(
        json!({"policy": policy, "supply": "500000"}),
        "monetary_policy_solvent(policy, supply)"
    ));
    assert!(eval(
        json!({"policy": {"conservation_ceiling": "1000000"}, "supply": "1000000"}),
        "monetary_policy_solvent(policy, supply)"
    ));
    assert!(!eval(
        json!({"policy": {"conservation_ceiling": "1000000"}, "supply": "1500000"}),
        "monetary_policy_solvent(policy, supply)"
    ));
    assert!(!eval(
        json!({"policy": null, "supply": "500000"}),
        "monetary_policy_solvent(policy, supply)"
    ));
}

#[test]
fn permission_boundary_completeness() {
    let complete = json!({"boundary": {
        "scope": "billing",
        "permitted_if": "trust_scopes.scopes.billing == 'verified'",
        "reporting": {"required": true, "report_to": "audit-agent"},
        "revocation": {"trigger": "manual"}
    }});
    assert!(eval(complete, "permission_boundary_active(boundary)"));

    let missing_scope = json!({"boundary": {
        "permitted_if": "true",
        "reporting": {"required": true},
        "revocation": {"trigger": "manual"}
    }});
    assert!(!eval(missing_scope, "permission_boundary_active(boundary)"));

    let missing_reporting = json!({"boundary": {
        "scope": "billing",
        "permitted_if": "true",
        "revocation": {"trigger": "manual"}
    }});
    assert!(!eval(missing_reporting, "permission_boundary_active(boundary)"));

    assert!(!eval(json!({"boundary": null}), "permission_boundary_active(boundary)"));
}

#[test]
fn proposal_quorum() {
    let met = json!({"proposal": {"voting": {
        "quorum_required": 0.5,
        "votes_cast": [
            {"voter_id": "a", "vote": "approve", "weight": 0.3},
            {"voter_id": "b", "vote": "reject", "weight": 0.3}
        ]
    }}});
    assert!(eval(met, "proposal_quorum_met(proposal)"));

    let unmet = json!({"proposal": {"voting": {
        "quorum_required": 0.8,
        "votes_cast": [
            {"voter_id": "a", "vote": "approve", "weight": 0.3},
            {"voter_id": "b", "vote": "approve", "weight": 0.2}
        ]
    }}});
    assert!(!eval(unmet, "proposal_quorum_met(proposal)"));

    let exact = json!({"proposal": {"voting": {
        "quorum_required": 0.5,
        "votes_cast": [{"voter_id": "a", "vote": "approve", "weight": 0.5}]
    }}});
    assert!(eval(exact, "proposal_quorum_met(proposal)"));

    let empty = json!({"proposal": {"voting": {"quorum_required": 0.5, "votes_cast": []}}});
    assert!(!eval(empty, "proposal_quorum_met(proposal)"));

    assert!(!eval(json!({"proposal": null}), "proposal_quorum_met(proposal)"));
}

#[test]
fn proposal_weight_normalization() {
    let normalized = json!({"proposal": {"voting": {"votes_cast": [
        {"voter_id": "a", "weight": 0.3},
        {"voter_id": "b", "weight": 0.4},
        {"voter_id": "c", "weight": 0.3}
    ]}}});
    assert!(eval(normalized, "proposal_weights_normalized(proposal)"));

    let drifted = json!({"proposal": {"voting": {"votes_cast": [
        {"voter_id": "a", "weight": 0.1},
        {"voter_id": "b", "weight": 0.2},
        {"voter_id": "c", "weight": 0.3},
        {"voter_id": "d", "weight": 0.4}
    ]}}});
    // 0.1 + 0.2 + 0.3 + 0.4 is not exactly 1.0 in IEEE 754; the 0.001
    // tolerance absorbs it.
    assert!(eval(drifted, "proposal_weights_normalized(proposal)"));

    let short = json!({"proposal": {"voting": {"votes_cast": [
        {"voter_id": "a", "weight": 0.3},
        {"voter_id": "b", "weight": 0.3}
    ]}}});
    assert!(!eval(short, "proposal_weights_normalized(proposal)"));

    // No votes yet: nothing to be non-normalized.
    let empty = json!({"proposal": {"voting": {"votes_cast": []}}});
    assert!(eval(empty, "proposal_weights_normalized(proposal)"));
}

#[test]
fn constraint_lifecycle_transitions() {
    let valid = [
        ("proposed", "under_review"),
        ("proposed", "rejected"),
        ("under_review", "enacted"),
        ("under_review", "rejected"),
        ("enacted", "deprecated"),
    ];
    for (from, to) in valid {
        assert!(
            eval(
                json!({"event": {"from_status": from, "to_status": to}}),
                "constraint_lifecycle_valid(event)"
            ),
            "{from} -> {to} should be valid"
        );
    }
    let invalid = [
        ("rejected", "proposed"),
        ("deprecated", "enacted"),
        ("enacted", "proposed"),
        ("proposed", "enacted"),
        ("proposed", "deprecated"),
        ("under_review", "deprecated"),
        ("enacted", "enacted"),
        ("active", "inactive"),
    ];
    for (from, to) in invalid {
        assert!(
            !eval(
                json!({"event": {"from_status": from, "to_status": to}}),
                "constraint_lifecycle_valid(event)"
            ),
            "{from} -> {to} should be invalid"
        );
    }
}

#[test]
fn proposal_execution_validity() {
    let completed = json!({"execution": {
        "status": "completed",
        "changes_applied": [{"result": "success"}, {"result": "success"}]
    }});
    assert!(eval(completed, "proposal_execution_valid(execution)"));

    let failed = json!({"execution": {
        "status": "failed",
        "changes_applied": [{"result": "success"}, {"result": "failed"}]
    }});
    assert!(!eval(failed, "proposal_execution_valid(execution)"));

    let skipped = json!({"execution": {
        "status": "completed",
        "changes_applied": [{"result": "success"}, {"result": "skipped"}]
    }});
    assert!(!eval(skipped, "proposal_execution_valid(execution)"));

    let empty = json!({"execution": {"status": "completed", "changes_applied": []}});
    assert!(!eval(empty, "proposal_execution_valid(execution)"));

    let pending = json!({"execution": {
        "status": "pending",
        "changes_applied": [{"result": "success"}]
    }});
    assert!(!eval(pending, "proposal_execution_valid(execution)"));
}

// ── routing and baskets ──────────────────────────────────────────────

#[test]
fn model_routing_eligibility() {
    let eligible = json!({
        "cohort": {"personal_score": 0.8},
        "signal": {"qualifying_score": 0.6}
    });
    assert!(eval(eligible, "model_routing_eligible(cohort, signal)"));

    let below = json!({
        "cohort": {"personal_score": 0.5},
        "signal": {"qualifying_score": 0.6}
    });
    assert!(!eval(below, "model_routing_eligible(cohort, signal)"));

    let unscored = json!({
        "cohort": {"personal_score": null},
        "signal": {"qualifying_score": 0.6}
    });
    assert!(!eval(unscored, "model_routing_eligible(cohort, signal)"));

    assert!(!eval(
        json!({"cohort": null, "signal": {"qualifying_score": 0.6}}),
        "model_routing_eligible(cohort, signal)"
    ));
}

#[test]
fn basket_weight_normalization() {
    let ok = json!({"this": {"entries": [
        {"model_id": "a", "weight": 0.333},
        {"model_id": "b", "weight": 0.333},
        {"model_id": "c", "weight": 0.334}
    ]}});
    assert!(eval(ok, "basket_weights_normalized(this)"));

    let over = json!({"this": {"entries": [
        {"model_id": "a", "weight": 0.6},
        {"model_id": "b", "weight": 0.6}
    ]}});
    assert!(!eval(over, "basket_weights_normalized(this)"));

    let solo = json!({"this": {"entries": [{"model_id": "solo", "weight": 1.0}]}});
    assert!(eval(solo, "basket_weights_normalized(this)"));

    // Unlike proposal votes, an empty basket routes nothing and fails.
    assert!(!eval(json!({"this": {"entries": []}}), "basket_weights_normalized(this)"));
}

#[test]
fn execution_checkpoint_matrix() {
    let cases = [
        ("healthy", "continue", true),
        ("healthy", "pause", false),
        ("healthy", "rollback", false),
        ("degraded", "continue", true),
        ("degraded", "pause", true),
        ("degraded", "rollback", false),
        ("failing", "rollback", true),
        ("failing", "continue", false),
        ("failing", "pause", false),
        ("critical", "rollback", false),
    ];
    for (health, decision, expected) in cases {
        let data = json!({"cp": {"health_status": health, "proceed_decision": decision}});
        assert_eq!(
            eval(data, "execution_checkpoint_valid(cp)"),
            expected,
            "{health} + {decision}"
        );
    }
    assert!(!eval(json!({"cp": null}), "execution_checkpoint_valid(cp)"));
    assert!(!eval(
        json!({"cp": {"proceed_decision": "continue"}}),
        "execution_checkpoint_valid(cp)"
    ));
}

// ── structural audit chain check ─────────────────────────────────────

#[test]
fn audit_trail_chain_structure() {
    let genesis = "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    let hash_a = format!("sha256:{}", "a".repeat(64));
    let hash_b = format!("sha256:{}", "b".repeat(64));

    let empty = json!({"trail": {
        "entries": [], "genesis_hash": genesis,
        "hash_algorithm": "sha256", "integrity_status": "unverified"
    }});
    assert!(eval(empty, "audit_trail_chain_valid(trail)"));

    let chained = json!({"trail": {
        "entries": [
            {"entry_id": "e1", "entry_hash": hash_a.clone(), "previous_hash": genesis},
            {"entry_id": "e2", "entry_hash": hash_b.clone(), "previous_hash": hash_a.clone()}
        ],
        "genesis_hash": genesis,
        "hash_algorithm": "sha256", "integrity_status": "unverified"
    }});
    assert!(eval(chained, "audit_trail_chain_valid(trail)"));

    let unanchored = json!({"trail": {
        "entries": [{"entry_id": "e1", "entry_hash": hash_a.clone(), "previous_hash": hash_b.clone()}],
        "genesis_hash": genesis,
        "hash_algorithm": "sha256", "integrity_status": "unverified"
    }});
    assert!(!eval(unanchored, "audit_trail_chain_valid(trail)"));

    let broken = json!({"trail": {
        "entries": [
            {"entry_id": "e1", "entry_hash": hash_a.clone(), "previous_hash": genesis},
            {"entry_id": "e2", "entry_hash": hash_b.clone(), "previous_hash": hash_b.clone()}
        ],
        "genesis_hash": genesis,
        "hash_algorithm": "sha256", "integrity_status": "unverified"
    }});
    assert!(!eval(broken, "audit_trail_chain_valid(trail)"));

    let no_entries_field = json!({"trail": {"genesis_hash": genesis, "hash_algorithm": "sha256"}});
    assert!(!eval(no_entries_field, "audit_trail_chain_valid(trail)"));

    let no_genesis = json!({"trail": {"entries": [], "hash_algorithm": "sha256"}});
    assert!(!eval(no_genesis, "audit_trail_chain_valid(trail)"));

    let missing_hash = json!({"trail": {
        "entries": [{"entry_id": "e1", "previous_hash": genesis}],
        "genesis_hash": genesis, "hash_algorithm": "sha256"
    }});
    assert!(!eval(missing_hash, "audit_trail_chain_valid(trail)"));
}

// ── properties ───────────────────────────────────────────────────────

proptest! {
    /// Repeated evaluation of the same (context, expression) pair always
    /// returns the same result.
    #[test]
    fn evaluation_is_deterministic(a in any::<i64>(), b in any::<i64>()) {
        let data = json!({"a": a.to_string(), "b": b.to_string()});
        for expr in [
            "bigint_gte(a, b)",
            "bigint_eq(a, b) => bigint_lte(a, b)",
            "bigint_lt(a, b) || bigint_gte(a, b)",
        ] {
            let first = evaluate_constraint(&data, expr, None).unwrap();
            let second = evaluate_constraint(&data, expr, None).unwrap();
            prop_assert_eq!(first, second, "non-deterministic: {}", expr);
        }
    }

    /// Trichotomy over arbitrary integer strings: exactly one of lt, eq,
    /// gt holds.
    #[test]
    fn bigint_comparisons_are_trichotomous(a in any::<i128>(), b in any::<i128>()) {
        let data = json!({"a": a.to_string(), "b": b.to_string()});
        let lt = eval(data.clone(), "bigint_lt(a, b)");
        let eq = eval(data.clone(), "bigint_eq(a, b)");
        let gt = eval(data, "bigint_gt(a, b)");
        prop_assert_eq!(u8::from(lt) + u8::from(eq) + u8::from(gt), 1);
    }

    /// The tokenizer and parser reject or accept arbitrary input without
    /// panicking; evaluation of whatever parses never errors.
    #[test]
    fn engine_never_panics_on_arbitrary_expressions(
        expr in "[a-z0-9 ()\\[\\].,!<>=&|'_]{0,40}",
    ) {
        if covenant_expr::parse_expression(&expr).is_ok() {
            // Parseable input must evaluate without error against any
            // context.
            let result = evaluate_constraint(&json!({"a": 1}), &expr, None);
            prop_assert!(result.is_ok());
        }
    }
}
