//! # covenant-expr — Constraint Expression Engine
//!
//! Tokenizer, parser, and deterministic evaluator for the cross-field
//! constraint language, plus the CI-time static type checker.
//!
//! The language is deliberately small: comparisons, boolean connectives,
//! implication, member access, `.length`, `.every(param => predicate)`,
//! array literals, and a closed registry of builtin functions. There are
//! no loops, no mutation, and no I/O during evaluation — every call is a
//! pure function of `(context, expression, evaluation context)`, which is
//! what lets independent implementations in other languages reproduce
//! results bit-for-bit.
//!
//! ## Error Split
//!
//! - Lexical and parse errors are returned as [`ExprError`] — author-time
//!   mistakes, best caught in CI via [`validate_expression`] or the type
//!   checker.
//! - Semantic issues at evaluation time (unknown function, wrong arity,
//!   wrong operand types) never error: they resolve to `undefined`/`false`
//!   so a malformed-but-parseable constraint fails closed instead of
//!   crashing a mutation pipeline.

pub mod ast;
pub mod builtins;
pub mod constraint;
pub mod context;
pub mod eval;
pub mod grammar;
pub mod token;
pub mod typecheck;
pub mod value;

pub use ast::{parse_expression, BinaryOp, Expr, Literal, UnaryOp, MAX_EXPRESSION_DEPTH};
pub use builtins::{reserved_evaluator_names, EVALUATOR_BUILTINS, EVALUATOR_KEYWORDS};
pub use constraint::{
    evaluate_constraint_file, Constraint, ConstraintFile, ConstraintFileReport,
    ConstraintOrigin, ConstraintViolation, EvaluationGeometry, ExpressionVersion,
    NativeEnforcement, Severity, TypeSignature,
};
pub use context::EvaluationContext;
pub use eval::evaluate_constraint;
pub use grammar::{validate_expression, SyntaxCheck};
pub use token::{tokenize, ExprError, Token, TokenKind};
pub use typecheck::{
    type_check_constraint_file, FieldRegistry, TypeCheckError, TypeCheckReport, TypeCheckWarning,
};
pub use value::EvalValue;
