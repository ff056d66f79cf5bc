/// Recursive descent parser with precedence-climbing expressions for Botlang.
///
/// Every time the parser tests the current token against a kind and the
/// test fails, the kind is recorded as "expected" at that token. Only the
/// furthest token index is kept, so when parsing finally fails the error
/// lists every alternative that was possible at the point the parser got
/// furthest, not just the last one it tried.
use std::collections::BTreeSet;

use diagnostics::{Position, SourceLocation};

use crate::ast::*;
use crate::error::SyntaxError;
use crate::lexer::{unescape, Lexer};
use crate::token::{Token, TokenKind};

/// Parse a complete source string into an AST Program.
///
/// ```
/// use botlang_parser::parse;
///
/// let prog = parse("var x = 1 + 2").unwrap();
/// assert_eq!(prog.statements.len(), 1);
/// ```
pub fn parse(source: &str) -> Result<Program, SyntaxError> {
    let tokens = Lexer::tokenize(source);
    let mut parser = Parser::new(tokens);
    parser.parse_program()
}

/// Binary operators in the order they are reported when none matched.
const BINARY_OPERATORS: &[TokenKind] = &[
    TokenKind::And,
    TokenKind::Or,
    TokenKind::Xor,
    TokenKind::Lt,
    TokenKind::Le,
    TokenKind::Gt,
    TokenKind::Ge,
    TokenKind::Eq,
    TokenKind::Neq,
    TokenKind::Plus,
    TokenKind::Minus,
    TokenKind::DotDot,
    TokenKind::Star,
    TokenKind::Slash,
];

/// Tokens that can start an expression.
const EXPRESSION_STARTERS: &[TokenKind] = &[
    TokenKind::Not,
    TokenKind::Minus,
    TokenKind::LParen,
    TokenKind::LBracket,
    TokenKind::Number,
    TokenKind::True,
    TokenKind::False,
    TokenKind::StringLit,
    TokenKind::Ident,
];

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    next_id: NodeId,
    /// End of the most recently consumed token.
    last_end: Position,
    furthest: usize,
    expected: BTreeSet<&'static str>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            next_id: 0,
            last_end: Position::start_of_file(),
            furthest: 0,
            expected: BTreeSet::new(),
        }
    }

    // ========================================================================
    // Token helpers
    // ========================================================================

    /// Index of the next significant token. Comments are only significant
    /// at statement starts, where `comment` consumes them explicitly.
    fn index(&self) -> usize {
        let mut idx = self.pos;
        while self.tokens[idx].kind == TokenKind::Comment {
            idx += 1;
        }
        idx
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.index()]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn advance(&mut self) -> Token {
        let idx = self.index();
        let tok = self.tokens[idx].clone();
        if tok.kind != TokenKind::Eof {
            self.pos = idx + 1;
            self.last_end = tok.location.end;
        }
        tok
    }

    /// Note that `kind` would have been accepted at the current token.
    fn record(&mut self, kind: TokenKind) {
        let idx = self.index();
        if idx > self.furthest {
            self.furthest = idx;
            self.expected.clear();
        }
        if idx == self.furthest {
            self.expected.insert(kind.describe());
        }
    }

    fn check(&mut self, kind: TokenKind) -> bool {
        if self.peek_kind() == kind {
            true
        } else {
            self.record(kind);
            false
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, SyntaxError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error())
        }
    }

    fn expect_ident(&mut self) -> Result<Identifier, SyntaxError> {
        let tok = self.expect(TokenKind::Ident)?;
        Ok(Identifier {
            name: tok.lexeme,
            location: tok.location,
        })
    }

    /// The error describing the furthest point the parser reached.
    fn error(&self) -> SyntaxError {
        let tok = &self.tokens[self.furthest];
        SyntaxError::new(
            self.expected.iter().map(|s| s.to_string()).collect(),
            tok.describe_found(),
            tok.location,
        )
    }

    fn location_from(&self, start: Position) -> SourceLocation {
        SourceLocation::new(start, self.last_end)
    }

    fn node_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn expr(&mut self, kind: ExprKind, location: SourceLocation) -> Expr {
        Expr {
            id: self.node_id(),
            kind,
            location,
        }
    }

    // ========================================================================
    // Program / Block
    // ========================================================================

    fn parse_program(&mut self) -> Result<Program, SyntaxError> {
        let mut statements = Vec::new();
        loop {
            if let Some(comment) = self.comment() {
                statements.push(comment);
                continue;
            }
            if self.check(TokenKind::Eof) {
                break;
            }
            statements.push(self.parse_statement(true)?);
        }
        Ok(Program {
            statements,
            node_count: self.next_id,
        })
    }

    /// Statements up to (not including) one of `terminators`.
    fn parse_block(&mut self, terminators: &[TokenKind]) -> Result<Vec<Stmt>, SyntaxError> {
        let mut statements = Vec::new();
        loop {
            if let Some(comment) = self.comment() {
                statements.push(comment);
                continue;
            }
            if terminators.iter().any(|kind| self.check(*kind)) {
                break;
            }
            statements.push(self.parse_statement(false)?);
        }
        Ok(statements)
    }

    fn comment(&mut self) -> Option<Stmt> {
        let tok = &self.tokens[self.pos];
        if tok.kind != TokenKind::Comment {
            return None;
        }
        let stmt = Stmt::Comment {
            text: tok.lexeme.clone(),
            location: tok.location,
        };
        self.last_end = tok.location.end;
        self.pos += 1;
        Some(stmt)
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn parse_statement(&mut self, top_level: bool) -> Result<Stmt, SyntaxError> {
        if top_level {
            if self.check(TokenKind::Fun) {
                return self.parse_function();
            }
            if self.check(TokenKind::Record) {
                return self.parse_record();
            }
        }
        if self.check(TokenKind::Var) {
            return self.parse_variable();
        }
        if self.check(TokenKind::Repeat) {
            return self.parse_repeat();
        }
        if self.check(TokenKind::While) {
            return self.parse_while();
        }
        if self.check(TokenKind::If) {
            return self.parse_if();
        }
        if self.check(TokenKind::Return) {
            return self.parse_return();
        }
        if self.check(TokenKind::Break) {
            let location = self.advance().location;
            return Ok(Stmt::Break { location });
        }
        if self.check(TokenKind::Continue) {
            let location = self.advance().location;
            return Ok(Stmt::Continue { location });
        }

        let expr = self.parse_expression()?;
        if expr.kind.is_assignable() && self.eat(TokenKind::Assign) {
            let value = self.parse_expression()?;
            let location = expr.location.join(&value.location);
            return Ok(Stmt::Assignment {
                target: expr,
                value,
                location,
            });
        }
        Ok(Stmt::Expr(expr))
    }

    fn parse_function(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.advance().location.start; // eat `fun`
        let name = self.expect_ident()?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let name = self.expect_ident()?;
                self.expect(TokenKind::Colon)?;
                let type_name = self.expect_ident()?;
                params.push(Parameter {
                    id: self.node_id(),
                    name,
                    type_name,
                });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        let return_type = if self.eat(TokenKind::Colon) {
            Some(self.expect_ident()?)
        } else {
            None
        };
        let body = self.parse_block(&[TokenKind::End])?;
        self.expect(TokenKind::End)?;
        Ok(Stmt::Function(FunctionDecl {
            id: self.node_id(),
            name,
            params,
            return_type,
            body,
            location: self.location_from(start),
        }))
    }

    fn parse_record(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.advance().location.start; // eat `record`
        let name = self.expect_ident()?;
        let mut fields = Vec::new();
        while !self.check(TokenKind::End) {
            let name = self.expect_ident()?;
            self.expect(TokenKind::Colon)?;
            let type_name = self.expect_ident()?;
            fields.push(FieldDecl { name, type_name });
        }
        self.advance(); // eat `end`
        Ok(Stmt::Record(RecordDecl {
            name,
            fields,
            location: self.location_from(start),
        }))
    }

    fn parse_variable(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.advance().location.start; // eat `var`
        let name = self.expect_ident()?;
        let type_name = if self.eat(TokenKind::Colon) {
            Some(self.expect_ident()?)
        } else {
            None
        };
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expression()?;
        Ok(Stmt::Variable(VariableDecl {
            id: self.node_id(),
            name,
            type_name,
            value,
            location: self.location_from(start),
        }))
    }

    fn parse_repeat(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.advance().location.start; // eat `repeat`
        let count = self.parse_expression()?;
        self.expect(TokenKind::Times)?;
        let body = self.parse_block(&[TokenKind::End])?;
        self.expect(TokenKind::End)?;
        Ok(Stmt::Repeat {
            count,
            body,
            location: self.location_from(start),
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.advance().location.start; // eat `while`
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Do)?;
        let body = self.parse_block(&[TokenKind::End])?;
        self.expect(TokenKind::End)?;
        Ok(Stmt::While {
            condition,
            body,
            location: self.location_from(start),
        })
    }

    fn parse_if(&mut self) -> Result<Stmt, SyntaxError> {
        const BRANCH_END: &[TokenKind] = &[TokenKind::Elseif, TokenKind::Else, TokenKind::End];

        let start = self.advance().location.start; // eat `if`
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Then)?;
        let then_block = self.parse_block(BRANCH_END)?;

        let mut else_ifs = Vec::new();
        while self.check(TokenKind::Elseif) {
            let branch_start = self.advance().location.start; // eat `elseif`
            let condition = self.parse_expression()?;
            self.expect(TokenKind::Then)?;
            let body = self.parse_block(BRANCH_END)?;
            else_ifs.push(ElseIf {
                condition,
                body,
                location: self.location_from(branch_start),
            });
        }

        let else_block = if self.eat(TokenKind::Else) {
            self.parse_block(&[TokenKind::End])?
        } else {
            Vec::new()
        };
        self.expect(TokenKind::End)?;
        Ok(Stmt::If {
            condition,
            then_block,
            else_ifs,
            else_block,
            location: self.location_from(start),
        })
    }

    fn parse_return(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.advance().location.start; // eat `return`
        // The value is optional; it is present whenever the next token can
        // start an expression.
        let value = if self.can_start_expression() {
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(Stmt::Return {
            value,
            location: self.location_from(start),
        })
    }

    fn can_start_expression(&mut self) -> bool {
        EXPRESSION_STARTERS.iter().any(|kind| self.check(*kind))
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn parse_expression(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_binary(1)
    }

    /// Left-associative binary levels; `min_bp` is the weakest level the
    /// caller accepts.
    fn parse_binary(&mut self, min_bp: u8) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let Some((bp, op)) = infix_bp(self.peek_kind()) else {
                for kind in BINARY_OPERATORS {
                    self.record(*kind);
                }
                break;
            };
            if bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_binary(bp + 1)?;
            let location = lhs.location.join(&rhs.location);
            lhs = self.expr(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                location,
            );
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        let op = if self.check(TokenKind::Not) {
            UnaryOp::Not
        } else if self.check(TokenKind::Minus) {
            UnaryOp::Negate
        } else {
            return self.parse_primary();
        };
        let start = self.advance().location.start;
        let operand = self.parse_unary()?;
        let location = self.location_from(start);
        Ok(self.expr(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            location,
        ))
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        if self.check(TokenKind::LParen) {
            self.advance();
            let expr = self.parse_expression()?;
            self.expect(TokenKind::RParen)?;
            return Ok(expr);
        }
        if self.check(TokenKind::LBracket) {
            let start = self.advance().location.start;
            let elements = self.parse_arguments(TokenKind::RBracket)?;
            let location = self.location_from(start);
            return Ok(self.expr(ExprKind::List(elements), location));
        }
        if self.check(TokenKind::Number) {
            let tok = self.advance();
            // The lexer only produces `digits ('.' digits)?`.
            let value: f64 = tok.lexeme.parse().unwrap_or_default();
            return Ok(self.expr(ExprKind::Number(value), tok.location));
        }
        if self.check(TokenKind::True) || self.check(TokenKind::False) {
            let tok = self.advance();
            let value = tok.kind == TokenKind::True;
            return Ok(self.expr(ExprKind::Boolean(value), tok.location));
        }
        if self.check(TokenKind::StringLit) {
            let tok = self.advance();
            return Ok(self.expr(ExprKind::String(unescape(&tok.lexeme)), tok.location));
        }
        if self.check(TokenKind::Ident) {
            return self.parse_access_chain();
        }
        Err(self.error())
    }

    /// `name`, `name(args)`, followed by any number of `.field` / `[index]`.
    fn parse_access_chain(&mut self) -> Result<Expr, SyntaxError> {
        let name = self.expect_ident()?;
        let start = name.location.start;
        let mut expr = if self.eat(TokenKind::LParen) {
            let args = self.parse_arguments(TokenKind::RParen)?;
            let location = self.location_from(start);
            self.expr(ExprKind::Call { name, args }, location)
        } else {
            let location = name.location;
            self.expr(ExprKind::Variable(name), location)
        };

        loop {
            if self.eat(TokenKind::Dot) {
                let field = self.expect_ident()?;
                let location = self.location_from(start);
                expr = self.expr(
                    ExprKind::Field {
                        record: Box::new(expr),
                        name: field,
                    },
                    location,
                );
            } else if self.eat(TokenKind::LBracket) {
                let index = self.parse_expression()?;
                self.expect(TokenKind::RBracket)?;
                let location = self.location_from(start);
                expr = self.expr(
                    ExprKind::Index {
                        array: Box::new(expr),
                        index: Box::new(index),
                    },
                    location,
                );
            } else {
                break;
            }
        }
        Ok(expr)
    }

    /// Comma-separated expressions up to and including `close`.
    fn parse_arguments(&mut self, close: TokenKind) -> Result<Vec<Expr>, SyntaxError> {
        let mut args = Vec::new();
        if !self.check(close) {
            loop {
                args.push(self.parse_expression()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(close)?;
        Ok(args)
    }
}

/// Binding power and operator for a binary token; higher binds tighter.
fn infix_bp(kind: TokenKind) -> Option<(u8, BinaryOp)> {
    let entry = match kind {
        TokenKind::And => (1, BinaryOp::And),
        TokenKind::Or => (1, BinaryOp::Or),
        TokenKind::Xor => (1, BinaryOp::Xor),
        TokenKind::Lt => (2, BinaryOp::Lt),
        TokenKind::Le => (2, BinaryOp::Le),
        TokenKind::Gt => (2, BinaryOp::Gt),
        TokenKind::Ge => (2, BinaryOp::Ge),
        TokenKind::Eq => (2, BinaryOp::Eq),
        TokenKind::Neq => (2, BinaryOp::Ne),
        TokenKind::Plus => (3, BinaryOp::Add),
        TokenKind::Minus => (3, BinaryOp::Sub),
        TokenKind::DotDot => (3, BinaryOp::Concat),
        TokenKind::Star => (4, BinaryOp::Mul),
        TokenKind::Slash => (4, BinaryOp::Div),
        _ => return None,
    };
    Some(entry)
}
