//! Recursive-descent parser for the snippet language.
//!
//! The grammar is a small JS-flavored statement language: `let` bindings,
//! assignments (including `+=`-style compounds and `i++` sugar), `if`/
//! `else`, `while`, C-style `for`, named and anonymous `fn` definitions,
//! `return`/`break`/`continue`, and conventional expression syntax with
//! ternaries, arrays, and `{key: value}` object literals. Semicolons are
//! accepted everywhere and required nowhere.

use std::rc::Rc;

use crate::sandbox::ast::{
    AssignOp, AssignTarget, BinOp, Expr, FnDef, Program, Stmt, UnaryOp,
};
use crate::sandbox::token::{tokenize, ParseError, SpannedToken, Token};

/// Hard recursion guard; the validator enforces the user-facing depth
/// limit, this one only protects the parser's own stack.
const MAX_PARSE_DEPTH: u32 = 200;

/// Parses a complete snippet.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let mut body = Vec::new();
    while !parser.at_end() {
        // Stray semicolons are empty statements
        if parser.eat(&Token::Semi) {
            continue;
        }
        body.push(parser.statement()?);
    }
    Ok(Program { body })
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    depth: u32,
}

impl Parser {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn line(&self) -> u32 {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn advance(&mut self) -> Option<&SpannedToken> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<(), ParseError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(ParseError::new(format!("expected {what}"), self.line()))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, ParseError> {
        let line = self.line();
        match self.advance().map(|t| t.token.clone()) {
            Some(Token::Ident(name)) => Ok(name),
            _ => Err(ParseError::new(format!("expected {what}"), line)),
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_PARSE_DEPTH {
            return Err(ParseError::new("expression nested too deeply", self.line()));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        self.enter()?;
        let stmt = self.statement_inner();
        self.leave();
        stmt
    }

    fn statement_inner(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        let stmt = match self.peek() {
            Some(Token::Let) => {
                self.advance();
                let name = self.expect_ident("a variable name after 'let'")?;
                self.expect(&Token::Assign, "'=' in let binding")?;
                let value = self.expression()?;
                Stmt::Let { name, value, line }
            }
            Some(Token::Fn) => {
                // Anonymous `fn (...)` at statement head is an expression;
                // a name makes it a declaration.
                if matches!(
                    self.tokens.get(self.pos + 1).map(|t| &t.token),
                    Some(Token::Ident(_))
                ) {
                    self.advance();
                    let name = self.expect_ident("a function name")?;
                    let def = self.fn_tail(Some(name), line)?;
                    Stmt::FnDecl(def)
                } else {
                    self.simple_statement()?
                }
            }
            Some(Token::If) => return self.if_statement(),
            Some(Token::While) => {
                self.advance();
                self.expect(&Token::LParen, "'(' after 'while'")?;
                let cond = self.expression()?;
                self.expect(&Token::RParen, "')' after while condition")?;
                let body = self.block()?;
                return Ok(Stmt::While { cond, body, line });
            }
            Some(Token::For) => return self.for_statement(),
            Some(Token::Return) => {
                self.advance();
                let value = if self.at_end()
                    || self.check(&Token::Semi)
                    || self.check(&Token::RBrace)
                {
                    None
                } else {
                    Some(self.expression()?)
                };
                Stmt::Return { value, line }
            }
            Some(Token::Break) => {
                self.advance();
                Stmt::Break { line }
            }
            Some(Token::Continue) => {
                self.advance();
                Stmt::Continue { line }
            }
            _ => self.simple_statement()?,
        };
        self.eat(&Token::Semi);
        Ok(stmt)
    }

    /// Expression statement, assignment, or increment/decrement sugar.
    fn simple_statement(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        let expr = self.expression()?;

        let op = match self.peek() {
            Some(Token::Assign) => Some(AssignOp::Set),
            Some(Token::PlusAssign) => Some(AssignOp::Add),
            Some(Token::MinusAssign) => Some(AssignOp::Sub),
            Some(Token::StarAssign) => Some(AssignOp::Mul),
            Some(Token::SlashAssign) => Some(AssignOp::Div),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let target = Self::assign_target(expr, line)?;
            let value = self.expression()?;
            return Ok(Stmt::Assign {
                target,
                op,
                value,
                line,
            });
        }

        if self.check(&Token::PlusPlus) || self.check(&Token::MinusMinus) {
            let op = if self.eat(&Token::PlusPlus) {
                AssignOp::Add
            } else {
                self.advance();
                AssignOp::Sub
            };
            let target = Self::assign_target(expr, line)?;
            return Ok(Stmt::Assign {
                target,
                op,
                value: Expr::Num(1.0, line),
                line,
            });
        }

        Ok(Stmt::Expr(expr))
    }

    fn assign_target(expr: Expr, line: u32) -> Result<AssignTarget, ParseError> {
        match expr {
            Expr::Ident(name, _) => Ok(AssignTarget::Name(name)),
            Expr::Index { target, index, .. } => Ok(AssignTarget::Index {
                target: *target,
                index: *index,
            }),
            _ => Err(ParseError::new("invalid assignment target", line)),
        }
    }

    fn if_statement(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        self.advance();
        self.expect(&Token::LParen, "'(' after 'if'")?;
        let cond = self.expression()?;
        self.expect(&Token::RParen, "')' after if condition")?;
        let then_body = self.block()?;
        let else_body = if self.eat(&Token::Else) {
            if self.check(&Token::If) {
                Some(vec![self.if_statement()?])
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_body,
            else_body,
            line,
        })
    }

    fn for_statement(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        self.advance();
        self.expect(&Token::LParen, "'(' after 'for'")?;

        let init = if self.eat(&Token::Semi) {
            None
        } else {
            let stmt = if self.check(&Token::Let) {
                let let_line = self.line();
                self.advance();
                let name = self.expect_ident("a variable name after 'let'")?;
                self.expect(&Token::Assign, "'=' in let binding")?;
                let value = self.expression()?;
                Stmt::Let {
                    name,
                    value,
                    line: let_line,
                }
            } else {
                self.simple_statement()?
            };
            self.expect(&Token::Semi, "';' after for-loop initializer")?;
            Some(Box::new(stmt))
        };

        let cond = if self.check(&Token::Semi) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(&Token::Semi, "';' after for-loop condition")?;

        let step = if self.check(&Token::RParen) {
            None
        } else {
            Some(Box::new(self.simple_statement()?))
        };
        self.expect(&Token::RParen, "')' after for-loop header")?;

        let body = self.block()?;
        Ok(Stmt::For {
            init,
            cond,
            step,
            body,
            line,
        })
    }

    fn block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(&Token::LBrace, "'{'")?;
        let mut body = Vec::new();
        while !self.check(&Token::RBrace) {
            if self.at_end() {
                return Err(ParseError::new("unterminated block", self.line()));
            }
            if self.eat(&Token::Semi) {
                continue;
            }
            body.push(self.statement()?);
        }
        self.advance();
        Ok(body)
    }

    /// Parameter list and body of a function whose `fn` keyword (and name,
    /// if any) were already consumed.
    fn fn_tail(&mut self, name: Option<String>, line: u32) -> Result<Rc<FnDef>, ParseError> {
        self.expect(&Token::LParen, "'(' after function name")?;
        let mut params = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                params.push(self.expect_ident("a parameter name")?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen, "')' after parameters")?;
        let body = self.block()?;
        Ok(Rc::new(FnDef {
            name,
            params,
            body,
            line,
        }))
    }

    // ========================================================================
    // Expressions, precedence climbing
    // ========================================================================

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.enter()?;
        let expr = self.ternary();
        self.leave();
        expr
    }

    fn ternary(&mut self) -> Result<Expr, ParseError> {
        let cond = self.logic_or()?;
        if self.eat(&Token::Question) {
            let line = cond.line();
            let then_expr = self.expression()?;
            self.expect(&Token::Colon, "':' in conditional expression")?;
            let else_expr = self.expression()?;
            return Ok(Expr::Ternary {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
                line,
            });
        }
        Ok(cond)
    }

    fn logic_or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.logic_and()?;
        while self.check(&Token::OrOr) {
            let line = self.line();
            self.advance();
            let rhs = self.logic_and()?;
            lhs = Expr::Binary {
                op: BinOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn logic_and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.equality()?;
        while self.check(&Token::AndAnd) {
            let line = self.line();
            self.advance();
            let rhs = self.equality()?;
            lhs = Expr::Binary {
                op: BinOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.comparison()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinOp::Eq,
                Some(Token::NotEq) => BinOp::NotEq,
                _ => break,
            };
            let line = self.line();
            self.advance();
            let rhs = self.comparison()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinOp::Lt,
                Some(Token::LtEq) => BinOp::LtEq,
                Some(Token::Gt) => BinOp::Gt,
                Some(Token::GtEq) => BinOp::GtEq,
                _ => break,
            };
            let line = self.line();
            self.advance();
            let rhs = self.additive()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            let line = self.line();
            self.advance();
            let rhs = self.multiplicative()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Rem,
                _ => break,
            };
            let line = self.line();
            self.advance();
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let line = self.line();
        if self.eat(&Token::Minus) {
            self.enter()?;
            let operand = self.unary()?;
            self.leave();
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
                line,
            });
        }
        if self.eat(&Token::Not) {
            self.enter()?;
            let operand = self.unary()?;
            self.leave();
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
                line,
            });
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;
        loop {
            if self.check(&Token::LParen) {
                let line = self.line();
                self.advance();
                let mut args = Vec::new();
                if !self.check(&Token::RParen) {
                    loop {
                        args.push(self.expression()?);
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                }
                self.expect(&Token::RParen, "')' after arguments")?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                    line,
                };
            } else if self.check(&Token::LBracket) {
                let line = self.line();
                self.advance();
                let index = self.expression()?;
                self.expect(&Token::RBracket, "']' after index")?;
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                    line,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let line = self.line();
        match self.advance().map(|t| t.token.clone()) {
            Some(Token::Num(value)) => Ok(Expr::Num(value, line)),
            Some(Token::Str(value)) => Ok(Expr::Str(value, line)),
            Some(Token::True) => Ok(Expr::Bool(true, line)),
            Some(Token::False) => Ok(Expr::Bool(false, line)),
            Some(Token::Null) => Ok(Expr::Null(line)),
            Some(Token::Ident(name)) => Ok(Expr::Ident(name, line)),
            Some(Token::Fn) => Ok(Expr::Func(self.fn_tail(None, line)?)),
            Some(Token::LParen) => {
                let expr = self.expression()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(expr)
            }
            Some(Token::LBracket) => {
                let mut items = Vec::new();
                if !self.check(&Token::RBracket) {
                    loop {
                        items.push(self.expression()?);
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                }
                self.expect(&Token::RBracket, "']' after array literal")?;
                Ok(Expr::Array(items, line))
            }
            Some(Token::LBrace) => {
                let mut entries = Vec::new();
                if !self.check(&Token::RBrace) {
                    loop {
                        let key_line = self.line();
                        let key = match self.advance().map(|t| t.token.clone()) {
                            Some(Token::Ident(name)) => name,
                            Some(Token::Str(text)) => text,
                            _ => {
                                return Err(ParseError::new(
                                    "expected a key in object literal",
                                    key_line,
                                ));
                            }
                        };
                        self.expect(&Token::Colon, "':' after object key")?;
                        entries.push((key, self.expression()?));
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                }
                self.expect(&Token::RBrace, "'}' after object literal")?;
                Ok(Expr::Object(entries, line))
            }
            _ => Err(ParseError::new("expected an expression", line)),
        }
    }
}
