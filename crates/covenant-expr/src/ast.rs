//! # Parser / AST — Recursive Descent over the Constraint Grammar
//!
//! Produces the closed [`Expr`] union. Precedence, lowest to highest:
//! implication (`=>`, right-associative) < `||` < `&&` <
//! equality/relational < unary `!` < primary.
//!
//! The `=>` token serves both implication and the `.every` lambda; the two
//! never collide because the lambda arrow is consumed inside the `every`
//! production (between the parameter name and the predicate) before
//! implication parsing resumes outside the closing paren.
//!
//! Array indexing is not part of the grammar: the only things that follow
//! a member chain are `.length` and `.every(param => predicate)`.

use crate::token::{tokenize, ExprError, Token, TokenKind};

/// Maximum expression nesting depth accepted by the parser.
pub const MAX_EXPRESSION_DEPTH: usize = 32;

/// Literal values in constraint expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Undefined,
}

/// Binary operators, including implication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `a => b`, evaluated as `!a || b` with the right side unevaluated
    /// when the left is falsy.
    Implies,
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
}

/// A parsed constraint expression.
///
/// Closed union: every evaluator and tooling `match` over this enum is
/// exhaustive, so adding a node kind is a compile-time event for every
/// consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Identifier(String),
    MemberAccess {
        object: Box<Expr>,
        property: String,
    },
    FunctionCall {
        name: String,
        args: Vec<Expr>,
    },
    BinaryOp {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    ArrayLiteral(Vec<Expr>),
    /// `array_path.every(param => predicate)` — universal quantification
    /// over an array field, with `param` bound only inside `predicate`.
    Every {
        array_path: Vec<String>,
        param: String,
        predicate: Box<Expr>,
    },
}

/// Tokenize and parse a complete expression string.
///
/// # Errors
///
/// Returns [`ExprError::Lexical`] or [`ExprError::Parse`] with the
/// position of the first offending character or token.
pub fn parse_expression(expr: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser::new(&tokens);
    let ast = parser.parse_expr()?;
    parser.expect_end()?;
    Ok(ast)
}

pub(crate) struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn last_pos(&self) -> usize {
        if self.pos > 0 {
            let t = &self.tokens[self.pos - 1];
            t.pos + t.value.len()
        } else {
            0
        }
    }

    fn err(&self, message: impl Into<String>) -> ExprError {
        ExprError::Parse {
            message: message.into(),
            position: self.peek().map(|t| t.pos).unwrap_or_else(|| self.last_pos()),
        }
    }

    fn expect(&mut self, kind: TokenKind, value: Option<&str>) -> Result<(), ExprError> {
        match self.peek() {
            Some(t) if t.kind == kind && value.map_or(true, |v| t.value == v) => {
                self.pos += 1;
                Ok(())
            }
            Some(t) => Err(ExprError::Parse {
                message: format!(
                    "expected {kind:?}{}, got {:?} {:?}",
                    value.map(|v| format!(" {v:?}")).unwrap_or_default(),
                    t.kind,
                    t.value
                ),
                position: t.pos,
            }),
            None => Err(ExprError::Parse {
                message: format!(
                    "expected {kind:?}{}, got end of expression",
                    value.map(|v| format!(" {v:?}")).unwrap_or_default()
                ),
                position: self.last_pos(),
            }),
        }
    }

    /// All tokens must be consumed after the top-level expression.
    pub(crate) fn expect_end(&self) -> Result<(), ExprError> {
        match self.peek() {
            None => Ok(()),
            Some(t) => Err(ExprError::Parse {
                message: format!("unexpected token after expression: {:?} {:?}", t.kind, t.value),
                position: t.pos,
            }),
        }
    }

    /// `expr := or_expr ('=>' expr)?` — implication is right-associative.
    pub(crate) fn parse_expr(&mut self) -> Result<Expr, ExprError> {
        self.depth += 1;
        if self.depth > MAX_EXPRESSION_DEPTH {
            let e = self.err("expression nesting exceeds maximum depth");
            self.depth -= 1;
            return Err(e);
        }
        let left = self.parse_or()?;
        let node = if self.peek().map(|t| t.kind) == Some(TokenKind::Arrow) {
            self.pos += 1;
            let right = self.parse_expr()?;
            Expr::BinaryOp {
                op: BinaryOp::Implies,
                left: Box::new(left),
                right: Box::new(right),
            }
        } else {
            left
        };
        self.depth -= 1;
        Ok(node)
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_and()?;
        while self.peek().is_some_and(|t| t.is_op("||")) {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Expr::BinaryOp {
                op: BinaryOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_comparison()?;
        while self.peek().is_some_and(|t| t.is_op("&&")) {
            self.pos += 1;
            let right = self.parse_comparison()?;
            left = Expr::BinaryOp {
                op: BinaryOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExprError> {
        let left = self.parse_unary()?;
        let op = match self.peek() {
            Some(t) if t.kind == TokenKind::Op => match t.value.as_str() {
                "==" => Some(BinaryOp::Eq),
                "!=" => Some(BinaryOp::Ne),
                "<" => Some(BinaryOp::Lt),
                ">" => Some(BinaryOp::Gt),
                "<=" => Some(BinaryOp::Le),
                ">=" => Some(BinaryOp::Ge),
                _ => None,
            },
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let right = self.parse_unary()?;
            return Ok(Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        if self.peek().is_some_and(|t| t.is_op("!")) {
            self.pos += 1;
            let operand = self.parse_unary()?;
            return Ok(Expr::UnaryOp {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let tok = match self.peek() {
            Some(t) => t.clone(),
            None => return Err(self.err("unexpected end of expression")),
        };

        match tok.kind {
            TokenKind::Paren if tok.value == "(" => {
                self.pos += 1;
                let inner = self.parse_expr()?;
                self.expect(TokenKind::Paren, Some(")"))?;
                Ok(inner)
            }
            TokenKind::Bracket if tok.value == "[" => {
                self.pos += 1;
                let mut elements = Vec::new();
                while let Some(t) = self.peek() {
                    if t.kind == TokenKind::Bracket && t.value == "]" {
                        break;
                    }
                    elements.push(self.parse_expr()?);
                    if self.peek().map(|t| t.kind) == Some(TokenKind::Comma) {
                        self.pos += 1;
                    }
                }
                self.expect(TokenKind::Bracket, Some("]"))?;
                Ok(Expr::ArrayLiteral(elements))
            }
            TokenKind::Number => {
                self.pos += 1;
                let n: f64 = tok.value.parse().map_err(|_| ExprError::Parse {
                    message: format!("malformed number literal {:?}", tok.value),
                    position: tok.pos,
                })?;
                Ok(Expr::Literal(Literal::Number(n)))
            }
            TokenKind::Str => {
                self.pos += 1;
                Ok(Expr::Literal(Literal::Str(tok.value)))
            }
            TokenKind::Ident => match tok.value.as_str() {
                "null" => {
                    self.pos += 1;
                    Ok(Expr::Literal(Literal::Null))
                }
                "undefined" => {
                    self.pos += 1;
                    Ok(Expr::Literal(Literal::Undefined))
                }
                "true" => {
                    self.pos += 1;
                    Ok(Expr::Literal(Literal::Bool(true)))
                }
                "false" => {
                    self.pos += 1;
                    Ok(Expr::Literal(Literal::Bool(false)))
                }
                _ => {
                    // Function call when a paren follows immediately;
                    // otherwise a field path with optional member chain.
                    let next_is_paren = self
                        .tokens
                        .get(self.pos + 1)
                        .is_some_and(|t| t.kind == TokenKind::Paren && t.value == "(");
                    if next_is_paren {
                        self.parse_function_call()
                    } else {
                        self.parse_field_path()
                    }
                }
            },
            _ => Err(ExprError::Parse {
                message: format!("unexpected token: {:?} {:?}", tok.kind, tok.value),
                position: tok.pos,
            }),
        }
    }

    fn parse_function_call(&mut self) -> Result<Expr, ExprError> {
        let name = self
            .advance()
            .expect("caller checked an ident is present")
            .value
            .clone();
        self.expect(TokenKind::Paren, Some("("))?;
        let mut args = Vec::new();
        while let Some(t) = self.peek() {
            if t.kind == TokenKind::Paren && t.value == ")" {
                break;
            }
            args.push(self.parse_expr()?);
            if self.peek().map(|t| t.kind) == Some(TokenKind::Comma) {
                self.pos += 1;
            }
        }
        self.expect(TokenKind::Paren, Some(")"))?;
        Ok(Expr::FunctionCall { name, args })
    }

    /// `path := ident ('.' ident)*` terminated by `.length` or
    /// `.every(param => predicate)`.
    fn parse_field_path(&mut self) -> Result<Expr, ExprError> {
        let first = self
            .advance()
            .expect("caller checked an ident is present")
            .value
            .clone();
        let mut segments = vec![first];

        while self.peek().map(|t| t.kind) == Some(TokenKind::Dot) {
            self.pos += 1; // consume '.'
            let next = match self.peek() {
                Some(t) if t.kind == TokenKind::Ident => t.clone(),
                Some(t) => {
                    return Err(ExprError::Parse {
                        message: "expected identifier after dot".into(),
                        position: t.pos,
                    })
                }
                None => {
                    return Err(ExprError::Parse {
                        message: "expected identifier after dot".into(),
                        position: self.last_pos(),
                    })
                }
            };

            if next.value == "length" {
                self.pos += 1;
                return Ok(Expr::MemberAccess {
                    object: Box::new(path_to_expr(segments)),
                    property: "length".into(),
                });
            }

            if next.value == "every" {
                self.pos += 1;
                self.expect(TokenKind::Paren, Some("("))?;
                let param = match self.peek() {
                    Some(t) if t.kind == TokenKind::Ident => t.value.clone(),
                    _ => return Err(self.err("expected parameter name in .every()")),
                };
                self.pos += 1;
                if self.peek().map(|t| t.kind) != Some(TokenKind::Arrow) {
                    return Err(self.err("expected => in .every() lambda"));
                }
                self.pos += 1;
                let predicate = self.parse_expr()?;
                self.expect(TokenKind::Paren, Some(")"))?;
                return Ok(Expr::Every {
                    array_path: segments,
                    param,
                    predicate: Box::new(predicate),
                });
            }

            self.pos += 1;
            segments.push(next.value);
        }

        Ok(path_to_expr(segments))
    }
}

/// Fold path segments into an identifier or nested member access.
fn path_to_expr(segments: Vec<String>) -> Expr {
    let mut iter = segments.into_iter();
    let mut node = Expr::Identifier(iter.next().expect("paths are never empty"));
    for property in iter {
        node = Expr::MemberAccess {
            object: Box::new(node),
            property,
        };
    }
    node
}
