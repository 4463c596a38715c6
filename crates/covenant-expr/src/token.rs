//! # Tokenizer — Lexical Analysis for Constraint Expressions
//!
//! Single source of truth for token kinds and tokenization rules, shared
//! by the evaluator, the syntax validator, and any authoring tooling.
//!
//! Disambiguation rules, in the order they are applied:
//!
//! - `=>` (arrow) is checked before `==` — both start with `=`.
//! - Two-character operators (`==`, `!=`, `<=`, `>=`, `&&`, `||`) are
//!   checked before single-character ones (`<`, `>`, `!`).
//! - A `.` directly between a number token and a digit merges into the
//!   number (decimal literal); any other `.` is member access.
//! - String literals are single-quoted with `\'` and `\\` escapes only.
//! - Identifiers start with a letter or `_` and continue alphanumeric/`_`.

use thiserror::Error;

/// The kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Numeric literal, including merged decimal forms.
    Number,
    /// Single-quoted string literal (value is unescaped).
    Str,
    /// Identifier or keyword.
    Ident,
    /// Comparison or boolean operator.
    Op,
    /// `(` or `)`.
    Paren,
    /// `[` or `]`.
    Bracket,
    /// `,`.
    Comma,
    /// Member-access dot.
    Dot,
    /// `=>` — implication or lambda, disambiguated by grammar position.
    Arrow,
}

/// A lexical token with its character offset in the source expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    /// Character offset in the original expression.
    pub pos: usize,
}

impl Token {
    fn new(kind: TokenKind, value: impl Into<String>, pos: usize) -> Self {
        Self {
            kind,
            value: value.into(),
            pos,
        }
    }

    /// Whether this token is an operator with the given spelling.
    pub fn is_op(&self, value: &str) -> bool {
        self.kind == TokenKind::Op && self.value == value
    }
}

/// Error raised by the tokenizer or parser. Always carries the character
/// position of the offending input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// Unrecognized character or unterminated string literal.
    #[error("lexical error at position {position}: {message}")]
    Lexical { message: String, position: usize },

    /// The token stream does not satisfy the grammar.
    #[error("parse error at position {position}: {message}")]
    Parse { message: String, position: usize },
}

/// Tokenize a constraint expression into a token stream.
///
/// # Errors
///
/// Returns [`ExprError::Lexical`] on an unterminated string literal or an
/// unrecognized character.
pub fn tokenize(expr: &str) -> Result<Vec<Token>, ExprError> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens: Vec<Token> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        // Arrow — must be checked before '==' since both start with '='.
        if c == '=' && i + 1 < chars.len() && chars[i + 1] == '>' {
            tokens.push(Token::new(TokenKind::Arrow, "=>", i));
            i += 2;
            continue;
        }

        // Two-char operators before single-char ones.
        if i + 1 < chars.len() {
            let two: String = [c, chars[i + 1]].iter().collect();
            if matches!(two.as_str(), "==" | "!=" | "<=" | ">=" | "&&" | "||") {
                tokens.push(Token::new(TokenKind::Op, two, i));
                i += 2;
                continue;
            }
        }

        if matches!(c, '<' | '>' | '!') {
            tokens.push(Token::new(TokenKind::Op, c, i));
            i += 1;
            continue;
        }

        if matches!(c, '(' | ')') {
            tokens.push(Token::new(TokenKind::Paren, c, i));
            i += 1;
            continue;
        }

        if matches!(c, '[' | ']') {
            tokens.push(Token::new(TokenKind::Bracket, c, i));
            i += 1;
            continue;
        }

        if c == ',' {
            tokens.push(Token::new(TokenKind::Comma, ",", i));
            i += 1;
            continue;
        }

        if c == '.' {
            // Decimal point: merge with the preceding number token when a
            // digit follows.
            let digit_follows = i + 1 < chars.len() && chars[i + 1].is_ascii_digit();
            let after_number = tokens
                .last()
                .is_some_and(|t| t.kind == TokenKind::Number);
            if digit_follows && after_number {
                let prev = tokens.pop().expect("checked above");
                let mut num = prev.value;
                num.push('.');
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    num.push(chars[i]);
                    i += 1;
                }
                tokens.push(Token::new(TokenKind::Number, num, prev.pos));
                continue;
            }
            tokens.push(Token::new(TokenKind::Dot, ".", i));
            i += 1;
            continue;
        }

        // String literal: single-quoted, \' and \\ escapes only.
        if c == '\'' {
            let start = i;
            let mut s = String::new();
            i += 1;
            while i < chars.len() && chars[i] != '\'' {
                if chars[i] == '\\' && i + 1 < chars.len() {
                    let next = chars[i + 1];
                    if next == '\'' || next == '\\' {
                        s.push(next);
                        i += 2;
                        continue;
                    }
                }
                s.push(chars[i]);
                i += 1;
            }
            if i >= chars.len() {
                return Err(ExprError::Lexical {
                    message: "unterminated string literal".into(),
                    position: start,
                });
            }
            i += 1; // closing quote
            tokens.push(Token::new(TokenKind::Str, s, start));
            continue;
        }

        if c.is_ascii_digit() {
            let start = i;
            let mut num = String::new();
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                num.push(chars[i]);
                i += 1;
            }
            tokens.push(Token::new(TokenKind::Number, num, start));
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            let mut ident = String::new();
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                ident.push(chars[i]);
                i += 1;
            }
            tokens.push(Token::new(TokenKind::Ident, ident, start));
            continue;
        }

        return Err(ExprError::Lexical {
            message: format!("unexpected character: {c}"),
            position: i,
        });
    }

    Ok(tokens)
}
