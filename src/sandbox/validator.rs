//! Static validation of parsed snippets.
//!
//! Runs entirely before any sandbox is spawned. The denylist is written
//! against the hosted-JavaScript threat model the snippet contract grew out
//! of: most of these names have no power in this interpreter (there is no
//! `import`, no DOM, no timers), but rejecting them keeps the contract
//! identical for every host and catches snippets that were clearly written
//! to probe the sandbox.

use crate::sandbox::ast::{AssignTarget, Expr, FnDef, Program, Stmt};
use crate::sandbox::token::ParseError;

/// Identifiers that fail validation wherever they appear.
pub const FORBIDDEN_IDENTIFIERS: &[&str] = &[
    "fetch",
    "XMLHttpRequest",
    "Worker",
    "eval",
    "Function",
    "import",
    "require",
    "globalThis",
    "window",
    "document",
    "self",
    "postMessage",
    "importScripts",
    "SharedArrayBuffer",
    "Atomics",
    "WebSocket",
    "EventSource",
    "navigator",
    "location",
    "localStorage",
    "sessionStorage",
    "indexedDB",
    "crypto",
    "setTimeout",
    "setInterval",
    "requestAnimationFrame",
];

/// String literal prefixes that fail validation.
const FORBIDDEN_URL_PREFIXES: &[&str] = &["data:", "blob:", "http:", "https:"];

/// Rejects programs containing denylisted identifiers, URL-ish string
/// literals, or nesting deeper than `max_depth`.
pub fn validate(program: &Program, max_depth: u32) -> Result<(), ParseError> {
    let walker = Walker { max_depth };
    for stmt in &program.body {
        walker.stmt(stmt, 1)?;
    }
    Ok(())
}

struct Walker {
    max_depth: u32,
}

impl Walker {
    fn check_depth(&self, depth: u32, line: u32) -> Result<(), ParseError> {
        if depth > self.max_depth {
            return Err(ParseError::new(
                format!("nesting exceeds the maximum depth of {}", self.max_depth),
                line,
            ));
        }
        Ok(())
    }

    fn check_name(name: &str, line: u32) -> Result<(), ParseError> {
        if FORBIDDEN_IDENTIFIERS.contains(&name) {
            return Err(ParseError::new(
                format!("forbidden identifier '{name}'"),
                line,
            ));
        }
        Ok(())
    }

    fn stmt(&self, stmt: &Stmt, depth: u32) -> Result<(), ParseError> {
        self.check_depth(depth, stmt.line())?;
        match stmt {
            Stmt::Let { name, value, line } => {
                Self::check_name(name, *line)?;
                self.expr(value, depth + 1)
            }
            Stmt::Assign { target, value, .. } => {
                match target {
                    AssignTarget::Name(name) => Self::check_name(name, stmt.line())?,
                    AssignTarget::Index { target, index } => {
                        self.expr(target, depth + 1)?;
                        self.expr(index, depth + 1)?;
                    }
                }
                self.expr(value, depth + 1)
            }
            Stmt::Expr(expr) => self.expr(expr, depth + 1),
            Stmt::If {
                cond,
                then_body,
                else_body,
                ..
            } => {
                self.expr(cond, depth + 1)?;
                for s in then_body {
                    self.stmt(s, depth + 1)?;
                }
                if let Some(body) = else_body {
                    for s in body {
                        self.stmt(s, depth + 1)?;
                    }
                }
                Ok(())
            }
            Stmt::While { cond, body, .. } => {
                self.expr(cond, depth + 1)?;
                for s in body {
                    self.stmt(s, depth + 1)?;
                }
                Ok(())
            }
            Stmt::For {
                init,
                cond,
                step,
                body,
                ..
            } => {
                if let Some(init) = init {
                    self.stmt(init, depth + 1)?;
                }
                if let Some(cond) = cond {
                    self.expr(cond, depth + 1)?;
                }
                if let Some(step) = step {
                    self.stmt(step, depth + 1)?;
                }
                for s in body {
                    self.stmt(s, depth + 1)?;
                }
                Ok(())
            }
            Stmt::FnDecl(def) => self.fn_def(def, depth + 1),
            Stmt::Return { value, .. } => match value {
                Some(expr) => self.expr(expr, depth + 1),
                None => Ok(()),
            },
            Stmt::Break { .. } | Stmt::Continue { .. } => Ok(()),
        }
    }

    fn fn_def(&self, def: &FnDef, depth: u32) -> Result<(), ParseError> {
        if let Some(name) = &def.name {
            Self::check_name(name, def.line)?;
        }
        for param in &def.params {
            Self::check_name(param, def.line)?;
        }
        for stmt in &def.body {
            self.stmt(stmt, depth + 1)?;
        }
        Ok(())
    }

    fn expr(&self, expr: &Expr, depth: u32) -> Result<(), ParseError> {
        self.check_depth(depth, expr.line())?;
        match expr {
            Expr::Num(..) | Expr::Bool(..) | Expr::Null(..) => Ok(()),
            Expr::Str(text, line) => {
                for prefix in FORBIDDEN_URL_PREFIXES {
                    if text.starts_with(prefix) {
                        return Err(ParseError::new(
                            format!("forbidden URL-like string literal '{text}'"),
                            *line,
                        ));
                    }
                }
                Ok(())
            }
            Expr::Ident(name, line) => Self::check_name(name, *line),
            Expr::Array(items, _) => {
                for item in items {
                    self.expr(item, depth + 1)?;
                }
                Ok(())
            }
            Expr::Object(entries, line) => {
                for (key, value) in entries {
                    Self::check_name(key, *line)?;
                    self.expr(value, depth + 1)?;
                }
                Ok(())
            }
            Expr::Unary { operand, .. } => self.expr(operand, depth + 1),
            Expr::Binary { lhs, rhs, .. } => {
                self.expr(lhs, depth + 1)?;
                self.expr(rhs, depth + 1)
            }
            Expr::Ternary {
                cond,
                then_expr,
                else_expr,
                ..
            } => {
                self.expr(cond, depth + 1)?;
                self.expr(then_expr, depth + 1)?;
                self.expr(else_expr, depth + 1)
            }
            Expr::Call { callee, args, .. } => {
                self.expr(callee, depth + 1)?;
                for arg in args {
                    self.expr(arg, depth + 1)?;
                }
                Ok(())
            }
            Expr::Index { target, index, .. } => {
                self.expr(target, depth + 1)?;
                self.expr(index, depth + 1)
            }
            Expr::Func(def) => self.fn_def(def, depth + 1),
        }
    }
}
