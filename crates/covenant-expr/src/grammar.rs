//! # Syntax Validator — Grammar Checking Without Evaluation
//!
//! Validates that an expression string conforms to the constraint grammar
//! without touching any data context. Intended for CI checks and
//! constraint-file authoring tools, where the position of the first error
//! matters more than an evaluation result.

use crate::ast::parse_expression;
use crate::token::ExprError;

/// Result of a syntax-only validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxCheck {
    /// The expression parses completely.
    Valid,
    /// The expression is malformed; `position` is the character offset of
    /// the first offending input.
    Invalid { error: String, position: usize },
}

impl SyntaxCheck {
    /// Whether the expression parsed.
    pub fn is_valid(&self) -> bool {
        matches!(self, SyntaxCheck::Valid)
    }
}

/// Validate an expression against the grammar, reporting the first error.
pub fn validate_expression(expr: &str) -> SyntaxCheck {
    match parse_expression(expr) {
        Ok(_) => SyntaxCheck::Valid,
        Err(ExprError::Lexical { message, position })
        | Err(ExprError::Parse { message, position }) => SyntaxCheck::Invalid {
            error: message,
            position,
        },
    }
}
