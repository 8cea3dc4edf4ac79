//! Tree-walking evaluator for validated snippets.
//!
//! The interpreter owns everything a snippet can touch: the mesh buffer it
//! emits into, its material hints, the seeded RNG, and the scene bounds.
//! Nothing of the host process is reachable from user code; the only
//! outputs are the buffer and the hints, moved out when execution ends.
//!
//! Execution is metered: a fuel counter checks the wall-clock deadline and
//! the abort flag every `fuel_interval` steps, so runaway loops stop within
//! a bounded number of evaluations of the host deciding to stop them.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::mesh::buffer::{MaterialHints, MeshBuffer};
use crate::noise::Mulberry32;
use crate::sandbox::ast::{
    AssignOp, AssignTarget, BinOp, Expr, FnDef, Program, Stmt, UnaryOp,
};
use crate::sandbox::builtins;
use crate::scene::SceneBounds;

/// Maximum user-function call nesting.
const MAX_CALL_DEPTH: u32 = 64;

/// Why execution stopped early.
#[derive(Debug, Clone)]
pub enum Interrupt {
    /// A runtime error in user code, with the source line.
    Error { message: String, line: u32 },
    /// The wall-clock deadline passed.
    Timeout,
    /// The host set the abort flag.
    Cancelled,
}

impl Interrupt {
    pub fn error(message: impl Into<String>, line: u32) -> Self {
        Interrupt::Error {
            message: message.into(),
            line,
        }
    }
}

// ============================================================================
// Values and scopes
// ============================================================================

/// A runtime value. Arrays and objects have shared mutable identity, like
/// the scripting languages the snippet contract imitates.
#[derive(Debug, Clone)]
pub enum Value {
    Num(f64),
    Bool(bool),
    Str(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<FxHashMap<String, Value>>>),
    Func(Rc<Closure>),
    Null,
}

#[derive(Debug)]
pub struct Closure {
    pub def: Rc<FnDef>,
    pub env: Env,
}

impl Value {
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Value::Num(n) => *n != 0.0 && !n.is_nan(),
            Value::Bool(b) => *b,
            Value::Str(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Func(_) => true,
            Value::Null => false,
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Num(_) => "number",
            Value::Bool(_) => "boolean",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Func(_) => "function",
            Value::Null => "null",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Num(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Object(_) => write!(f, "{{object}}"),
            Value::Func(c) => match &c.def.name {
                Some(name) => write!(f, "<fn {name}>"),
                None => write!(f, "<fn>"),
            },
            Value::Null => write!(f, "null"),
        }
    }
}

/// One lexical scope, chained to its parent.
#[derive(Debug)]
pub struct Scope {
    vars: FxHashMap<String, Value>,
    parent: Option<Env>,
}

pub type Env = Rc<RefCell<Scope>>;

impl Scope {
    #[must_use]
    pub fn root() -> Env {
        Rc::new(RefCell::new(Scope {
            vars: FxHashMap::default(),
            parent: None,
        }))
    }

    #[must_use]
    pub fn child(parent: &Env) -> Env {
        Rc::new(RefCell::new(Scope {
            vars: FxHashMap::default(),
            parent: Some(parent.clone()),
        }))
    }
}

fn lookup(env: &Env, name: &str) -> Option<Value> {
    let scope = env.borrow();
    if let Some(value) = scope.vars.get(name) {
        return Some(value.clone());
    }
    scope.parent.as_ref().and_then(|p| lookup(p, name))
}

fn define(env: &Env, name: &str, value: Value) {
    env.borrow_mut().vars.insert(name.to_string(), value);
}

/// Walks the scope chain and overwrites the nearest binding. Returns false
/// when the name is unbound everywhere.
fn assign_existing(env: &Env, name: &str, value: Value) -> bool {
    let mut scope = env.borrow_mut();
    if let Some(slot) = scope.vars.get_mut(name) {
        *slot = value;
        return true;
    }
    match &scope.parent {
        Some(parent) => assign_existing(parent, name, value),
        None => false,
    }
}

/// Statement outcome, threaded through blocks for loop and return control.
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

// ============================================================================
// Interpreter
// ============================================================================

pub struct Interp {
    pub mesh: MeshBuffer,
    pub material: MaterialHints,
    pub rng: Mulberry32,
    pub seed: u32,
    pub scene: SceneBounds,
    deadline: Instant,
    abort: Arc<AtomicBool>,
    fuel: u32,
    fuel_interval: u32,
    call_depth: u32,
}

impl Interp {
    #[must_use]
    pub fn new(
        seed: u32,
        scene: SceneBounds,
        deadline: Instant,
        abort: Arc<AtomicBool>,
        fuel_interval: u32,
        initial_vertex_capacity: usize,
    ) -> Self {
        Self {
            mesh: MeshBuffer::with_initial_capacity(initial_vertex_capacity),
            material: MaterialHints::default(),
            rng: Mulberry32::new(seed),
            seed,
            scene,
            deadline,
            abort,
            fuel: 0,
            fuel_interval: fuel_interval.max(1),
            call_depth: 0,
        }
    }

    /// Executes a whole program. A top-level `return` ends it early; the
    /// emitted mesh stays in `self.mesh` either way.
    pub fn run(&mut self, program: &Program) -> Result<(), Interrupt> {
        let globals = Scope::root();
        for stmt in &program.body {
            match self.exec_stmt(&globals, stmt)? {
                Flow::Normal => (),
                Flow::Return(_) => break,
                Flow::Break | Flow::Continue => {
                    return Err(Interrupt::error(
                        "'break' or 'continue' outside of a loop",
                        stmt.line(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Fuel bookkeeping: periodically poll the abort flag and deadline.
    pub fn tick(&mut self, _line: u32) -> Result<(), Interrupt> {
        self.fuel = self.fuel.wrapping_add(1);
        if self.fuel % self.fuel_interval == 0 {
            if self.abort.load(Ordering::Relaxed) {
                return Err(Interrupt::Cancelled);
            }
            if Instant::now() >= self.deadline {
                return Err(Interrupt::Timeout);
            }
        }
        Ok(())
    }

    fn exec_block(&mut self, env: &Env, body: &[Stmt]) -> Result<Flow, Interrupt> {
        for stmt in body {
            match self.exec_stmt(env, stmt)? {
                Flow::Normal => (),
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, env: &Env, stmt: &Stmt) -> Result<Flow, Interrupt> {
        self.tick(stmt.line())?;
        match stmt {
            Stmt::Let { name, value, .. } => {
                let value = self.eval(env, value)?;
                define(env, name, value);
                Ok(Flow::Normal)
            }
            Stmt::Assign {
                target,
                op,
                value,
                line,
            } => {
                self.exec_assign(env, target, *op, value, *line)?;
                Ok(Flow::Normal)
            }
            Stmt::Expr(expr) => {
                self.eval(env, expr)?;
                Ok(Flow::Normal)
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
                ..
            } => {
                if self.eval(env, cond)?.truthy() {
                    let scope = Scope::child(env);
                    self.exec_block(&scope, then_body)
                } else if let Some(body) = else_body {
                    let scope = Scope::child(env);
                    self.exec_block(&scope, body)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While { cond, body, line } => {
                loop {
                    self.tick(*line)?;
                    if !self.eval(env, cond)?.truthy() {
                        break;
                    }
                    let scope = Scope::child(env);
                    match self.exec_block(&scope, body)? {
                        Flow::Normal | Flow::Continue => (),
                        Flow::Break => break,
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For {
                init,
                cond,
                step,
                body,
                line,
            } => {
                let outer = Scope::child(env);
                if let Some(init) = init {
                    self.exec_stmt(&outer, init)?;
                }
                loop {
                    self.tick(*line)?;
                    if let Some(cond) = cond {
                        if !self.eval(&outer, cond)?.truthy() {
                            break;
                        }
                    }
                    let scope = Scope::child(&outer);
                    match self.exec_block(&scope, body)? {
                        Flow::Normal | Flow::Continue => (),
                        Flow::Break => break,
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                    if let Some(step) = step {
                        self.exec_stmt(&outer, step)?;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::FnDecl(def) => {
                let name = def.name.clone().unwrap_or_default();
                let closure = Value::Func(Rc::new(Closure {
                    def: def.clone(),
                    env: env.clone(),
                }));
                define(env, &name, closure);
                Ok(Flow::Normal)
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval(env, expr)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Break { .. } => Ok(Flow::Break),
            Stmt::Continue { .. } => Ok(Flow::Continue),
        }
    }

    fn exec_assign(
        &mut self,
        env: &Env,
        target: &AssignTarget,
        op: AssignOp,
        value: &Expr,
        line: u32,
    ) -> Result<(), Interrupt> {
        let rhs = self.eval(env, value)?;
        match target {
            AssignTarget::Name(name) => {
                let new_value = if op == AssignOp::Set {
                    rhs
                } else {
                    let current = lookup(env, name).ok_or_else(|| {
                        Interrupt::error(format!("unknown variable '{name}'"), line)
                    })?;
                    compound(&current, op, &rhs, line)?
                };
                if !assign_existing(env, name, new_value.clone()) {
                    define(env, name, new_value);
                }
                Ok(())
            }
            AssignTarget::Index { target, index } => {
                let container = self.eval(env, target)?;
                let index_value = self.eval(env, index)?;
                match container {
                    Value::Array(items) => {
                        let idx = as_index(&index_value, items.borrow().len(), line)?;
                        let mut items = items.borrow_mut();
                        let new_value = if op == AssignOp::Set {
                            rhs
                        } else {
                            compound(&items[idx], op, &rhs, line)?
                        };
                        items[idx] = new_value;
                        Ok(())
                    }
                    Value::Object(map) => {
                        let Value::Str(key) = index_value else {
                            return Err(Interrupt::error("object keys must be strings", line));
                        };
                        let mut map = map.borrow_mut();
                        let new_value = if op == AssignOp::Set {
                            rhs
                        } else {
                            let current = map.get(key.as_ref()).cloned().unwrap_or(Value::Null);
                            compound(&current, op, &rhs, line)?
                        };
                        map.insert(key.to_string(), new_value);
                        Ok(())
                    }
                    other => Err(Interrupt::error(
                        format!("cannot index a {}", other.type_name()),
                        line,
                    )),
                }
            }
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub fn eval(&mut self, env: &Env, expr: &Expr) -> Result<Value, Interrupt> {
        self.tick(expr.line())?;
        match expr {
            Expr::Num(n, _) => Ok(Value::Num(*n)),
            Expr::Str(s, _) => Ok(Value::Str(Rc::from(s.as_str()))),
            Expr::Bool(b, _) => Ok(Value::Bool(*b)),
            Expr::Null(_) => Ok(Value::Null),
            Expr::Ident(name, line) => {
                if let Some(value) = lookup(env, name) {
                    return Ok(value);
                }
                if let Some(value) = builtins::constant(self, name) {
                    return Ok(value);
                }
                Err(Interrupt::error(
                    format!("unknown identifier '{name}'"),
                    *line,
                ))
            }
            Expr::Array(items, _) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(env, item)?);
                }
                Ok(Value::Array(Rc::new(RefCell::new(values))))
            }
            Expr::Object(entries, _) => {
                let mut map = FxHashMap::default();
                for (key, value) in entries {
                    let value = self.eval(env, value)?;
                    map.insert(key.clone(), value);
                }
                Ok(Value::Object(Rc::new(RefCell::new(map))))
            }
            Expr::Unary { op, operand, line } => {
                let value = self.eval(env, operand)?;
                match op {
                    UnaryOp::Neg => match value {
                        Value::Num(n) => Ok(Value::Num(-n)),
                        other => Err(Interrupt::error(
                            format!("cannot negate a {}", other.type_name()),
                            *line,
                        )),
                    },
                    UnaryOp::Not => Ok(Value::Bool(!value.truthy())),
                }
            }
            Expr::Binary { op, lhs, rhs, line } => {
                // Short-circuit forms return the deciding operand
                if *op == BinOp::And {
                    let left = self.eval(env, lhs)?;
                    return if left.truthy() {
                        self.eval(env, rhs)
                    } else {
                        Ok(left)
                    };
                }
                if *op == BinOp::Or {
                    let left = self.eval(env, lhs)?;
                    return if left.truthy() {
                        Ok(left)
                    } else {
                        self.eval(env, rhs)
                    };
                }
                let left = self.eval(env, lhs)?;
                let right = self.eval(env, rhs)?;
                binary(*op, &left, &right, *line)
            }
            Expr::Ternary {
                cond,
                then_expr,
                else_expr,
                ..
            } => {
                if self.eval(env, cond)?.truthy() {
                    self.eval(env, then_expr)
                } else {
                    self.eval(env, else_expr)
                }
            }
            Expr::Call { callee, args, line } => self.eval_call(env, callee, args, *line),
            Expr::Index {
                target,
                index,
                line,
            } => {
                let container = self.eval(env, target)?;
                let index_value = self.eval(env, index)?;
                match container {
                    Value::Array(items) => {
                        let items = items.borrow();
                        let idx = as_index(&index_value, items.len(), *line)?;
                        Ok(items[idx].clone())
                    }
                    Value::Object(map) => {
                        let Value::Str(key) = index_value else {
                            return Err(Interrupt::error("object keys must be strings", *line));
                        };
                        Ok(map.borrow().get(key.as_ref()).cloned().unwrap_or(Value::Null))
                    }
                    other => Err(Interrupt::error(
                        format!("cannot index a {}", other.type_name()),
                        *line,
                    )),
                }
            }
            Expr::Func(def) => Ok(Value::Func(Rc::new(Closure {
                def: def.clone(),
                env: env.clone(),
            }))),
        }
    }

    fn eval_call(
        &mut self,
        env: &Env,
        callee: &Expr,
        args: &[Expr],
        line: u32,
    ) -> Result<Value, Interrupt> {
        // A bare name resolves user bindings first, then builtins
        if let Expr::Ident(name, _) = callee {
            match lookup(env, name) {
                Some(func @ Value::Func(_)) => {
                    let values = self.eval_args(env, args)?;
                    return self.call_value(&func, &values, line);
                }
                Some(other) => {
                    return Err(Interrupt::error(
                        format!("'{name}' is a {}, not a function", other.type_name()),
                        line,
                    ));
                }
                None => {
                    if builtins::is_builtin(name) {
                        let values = self.eval_args(env, args)?;
                        return builtins::call(self, name, &values, line);
                    }
                    return Err(Interrupt::error(
                        format!("unknown function '{name}'"),
                        line,
                    ));
                }
            }
        }

        let func = self.eval(env, callee)?;
        let values = self.eval_args(env, args)?;
        self.call_value(&func, &values, line)
    }

    fn eval_args(&mut self, env: &Env, args: &[Expr]) -> Result<Vec<Value>, Interrupt> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(env, arg)?);
        }
        Ok(values)
    }

    /// Invokes a function value. Missing arguments bind as `null`; extra
    /// arguments are ignored.
    pub fn call_value(
        &mut self,
        callee: &Value,
        args: &[Value],
        line: u32,
    ) -> Result<Value, Interrupt> {
        let Value::Func(closure) = callee else {
            return Err(Interrupt::error(
                format!("cannot call a {}", callee.type_name()),
                line,
            ));
        };
        self.tick(line)?;
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(Interrupt::error("maximum call depth exceeded", line));
        }
        self.call_depth += 1;

        let scope = Scope::child(&closure.env);
        for (i, param) in closure.def.params.iter().enumerate() {
            define(&scope, param, args.get(i).cloned().unwrap_or(Value::Null));
        }

        let mut result = Value::Null;
        let outcome = self.exec_block(&scope, &closure.def.body);
        self.call_depth -= 1;
        match outcome? {
            Flow::Normal => (),
            Flow::Return(value) => result = value,
            Flow::Break | Flow::Continue => {
                return Err(Interrupt::error(
                    "'break' or 'continue' outside of a loop",
                    line,
                ));
            }
        }
        Ok(result)
    }
}

// ============================================================================
// Operator semantics
// ============================================================================

fn as_index(value: &Value, len: usize, line: u32) -> Result<usize, Interrupt> {
    let Value::Num(n) = value else {
        return Err(Interrupt::error(
            format!("array index must be a number, got {}", value.type_name()),
            line,
        ));
    };
    let idx = *n as i64;
    if idx < 0 || (idx as usize) >= len {
        return Err(Interrupt::error(
            format!("array index {idx} out of bounds (length {len})"),
            line,
        ));
    }
    Ok(idx as usize)
}

fn compound(current: &Value, op: AssignOp, rhs: &Value, line: u32) -> Result<Value, Interrupt> {
    let bin_op = match op {
        AssignOp::Add => BinOp::Add,
        AssignOp::Sub => BinOp::Sub,
        AssignOp::Mul => BinOp::Mul,
        AssignOp::Div => BinOp::Div,
        AssignOp::Set => unreachable!("plain assignment handled by the caller"),
    };
    binary(bin_op, current, rhs, line)
}

fn binary(op: BinOp, left: &Value, right: &Value, line: u32) -> Result<Value, Interrupt> {
    use BinOp::{Add, Div, Eq, Gt, GtEq, Lt, LtEq, Mul, NotEq, Rem, Sub};

    match op {
        Add => match (left, right) {
            (Value::Num(a), Value::Num(b)) => Ok(Value::Num(a + b)),
            (Value::Str(_), _) | (_, Value::Str(_)) => {
                Ok(Value::Str(Rc::from(format!("{left}{right}").as_str())))
            }
            _ => Err(type_error("+", left, right, line)),
        },
        Sub | Mul | Div | Rem => match (left, right) {
            (Value::Num(a), Value::Num(b)) => Ok(Value::Num(match op {
                Sub => a - b,
                Mul => a * b,
                Div => a / b,
                Rem => a % b,
                _ => unreachable!(),
            })),
            _ => Err(type_error(op_symbol(op), left, right, line)),
        },
        Eq => Ok(Value::Bool(values_equal(left, right))),
        NotEq => Ok(Value::Bool(!values_equal(left, right))),
        Lt | LtEq | Gt | GtEq => {
            let ordering = match (left, right) {
                (Value::Num(a), Value::Num(b)) => a.partial_cmp(b),
                (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
                _ => None,
            };
            let Some(ordering) = ordering else {
                // NaN comparisons and mixed types are simply false
                return Ok(Value::Bool(false));
            };
            Ok(Value::Bool(match op {
                Lt => ordering.is_lt(),
                LtEq => ordering.is_le(),
                Gt => ordering.is_gt(),
                GtEq => ordering.is_ge(),
                _ => unreachable!(),
            }))
        }
        BinOp::And | BinOp::Or => unreachable!("short-circuit forms handled by the caller"),
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Num(a), Value::Num(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Null, Value::Null) => true,
        (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
        (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
        (Value::Func(a), Value::Func(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

fn op_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Rem => "%",
        _ => "?",
    }
}

fn type_error(op: &str, left: &Value, right: &Value, line: u32) -> Interrupt {
    Interrupt::error(
        format!(
            "operator '{op}' cannot combine {} and {}",
            left.type_name(),
            right.type_name()
        ),
        line,
    )
}
