//! Interpreter
//!
//! Walks a parsed [`Program`] statement by statement, evaluating arguments left to right and
//! dispatching every catalog call through the active [`Run`]. Control flow only decides which
//! calls are made, the run still sees a plain sequence of commands.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{cmp::Ordering, collections::HashMap};

use delta_if::Value;

use super::{
    parser::{BinOp, Call, Expr, Program, Stmt},
    ScriptError,
};
use crate::engine::{binding, CmdError, Run};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Iterations a single loop statement may run before the script is aborted.
pub const MAX_LOOP_ITERATIONS: usize = 1_000_000;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Variable environment of one script execution.
#[derive(Debug, Clone)]
pub struct Interpreter {
    globals: HashMap<String, Value>,

    /// Local scopes, innermost last
    scopes: Vec<HashMap<String, Value>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Reason a script stopped early.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RunError {
    /// Evaluation failed outside of a command
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// A command failed, already recorded by the run
    #[error(transparent)]
    Command(#[from] CmdError),
}

/// How a block finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Normal,
    Break,
    Return,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Create an interpreter with the `ON` and `OFF` globals defined.
    pub fn new() -> Self {
        let mut globals = HashMap::new();
        globals.insert("ON".to_string(), Value::from("ON"));
        globals.insert("OFF".to_string(), Value::from("OFF"));
        Self {
            globals,
            scopes: Vec::new(),
        }
    }

    /// Current value of a variable, `nil` if it was never assigned.
    pub fn var(&self, name: &str) -> Value {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .or_else(|| self.globals.get(name))
            .cloned()
            .unwrap_or(Value::Nil)
    }

    pub fn exec(&mut self, program: &Program, run: &mut Run<'_>) -> Result<(), RunError> {
        self.scoped(None, |interp| interp.exec_block(&program.stmts, run))
            .map(|_| ())
    }

    /// Assign to the innermost local of that name, or to a global if there is none.
    fn assign(&mut self, name: &str, value: Value) {
        match self
            .scopes
            .iter_mut()
            .rev()
            .find(|scope| scope.contains_key(name))
        {
            Some(scope) => {
                scope.insert(name.to_string(), value);
            }
            None => {
                self.globals.insert(name.to_string(), value);
            }
        }
    }

    fn declare(&mut self, name: &str, value: Value) {
        match self.scopes.last_mut() {
            Some(scope) => {
                scope.insert(name.to_string(), value);
            }
            None => {
                self.globals.insert(name.to_string(), value);
            }
        }
    }

    /// Run `f` in a fresh local scope, optionally pre-declaring one local.
    fn scoped<T>(
        &mut self,
        local: Option<(&str, Value)>,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        self.scopes.push(HashMap::new());
        if let Some((name, value)) = local {
            self.declare(name, value);
        }
        let result = f(self);
        self.scopes.pop();
        result
    }

    fn exec_block(&mut self, stmts: &[Stmt], run: &mut Run<'_>) -> Result<Flow, RunError> {
        for stmt in stmts {
            match self.exec_stmt(stmt, run)? {
                Flow::Normal => (),
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, run: &mut Run<'_>) -> Result<Flow, RunError> {
        let line = stmt.line();

        match stmt {
            Stmt::Call(call) => {
                self.call(call, run)?;
            }
            Stmt::Assign { name, value, .. } => {
                let v = self.eval(value, line, run)?;
                self.assign(name, v);
            }
            Stmt::Local { name, value, .. } => {
                let v = match value {
                    Some(value) => self.eval(value, line, run)?,
                    None => Value::Nil,
                };
                self.declare(name, v);
            }
            Stmt::If {
                branches,
                otherwise,
                ..
            } => {
                for branch in branches {
                    if truthy(&self.eval(&branch.cond, branch.line, run)?) {
                        return self.scoped(None, |interp| interp.exec_block(&branch.body, run));
                    }
                }
                if let Some(body) = otherwise {
                    return self.scoped(None, |interp| interp.exec_block(body, run));
                }
            }
            Stmt::While { cond, body, .. } => {
                let mut iterations = 0;
                while truthy(&self.eval(cond, line, run)?) {
                    count_iteration(&mut iterations, line)?;
                    match self.scoped(None, |interp| interp.exec_block(body, run))? {
                        Flow::Normal => (),
                        Flow::Break => break,
                        Flow::Return => return Ok(Flow::Return),
                    }
                }
            }
            Stmt::Repeat { body, cond, .. } => {
                let mut iterations = 0;
                loop {
                    count_iteration(&mut iterations, line)?;
                    // The condition can see the body's locals
                    let (flow, done) = self.scoped(None, |interp| {
                        let flow = interp.exec_block(body, run)?;
                        let done = match flow {
                            Flow::Normal => truthy(&interp.eval(cond, line, run)?),
                            _ => true,
                        };
                        Ok::<_, RunError>((flow, done))
                    })?;
                    if flow == Flow::Return {
                        return Ok(Flow::Return);
                    }
                    if done {
                        break;
                    }
                }
            }
            Stmt::For {
                var,
                start,
                stop,
                step,
                body,
                ..
            } => {
                let start = self.eval(start, line, run)?;
                let stop = self.eval(stop, line, run)?;
                let step = match step {
                    Some(step) => self.eval(step, line, run)?,
                    None => Value::Int(1),
                };

                let mut iterations = 0;
                for value in for_range(&start, &stop, &step, line)? {
                    count_iteration(&mut iterations, line)?;
                    let flow = self.scoped(Some((var.as_str(), value)), |interp| {
                        interp.exec_block(body, run)
                    })?;
                    match flow {
                        Flow::Normal => (),
                        Flow::Break => break,
                        Flow::Return => return Ok(Flow::Return),
                    }
                }
            }
            Stmt::Do { body, .. } => {
                return self.scoped(None, |interp| interp.exec_block(body, run));
            }
            Stmt::Break { .. } => return Ok(Flow::Break),
            Stmt::Return { .. } => return Ok(Flow::Return),
        }

        Ok(Flow::Normal)
    }

    fn call(&mut self, call: &Call, run: &mut Run<'_>) -> Result<Value, RunError> {
        let func = binding::lookup(&call.name).ok_or_else(|| ScriptError::UnknownFunction {
            line: call.line,
            name: call.name.clone(),
        })?;

        let args = call
            .args
            .iter()
            .map(|arg| self.eval(arg, call.line, run))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(run.call(func, &args, Some(call.line))?)
    }

    fn eval(&mut self, expr: &Expr, line: usize, run: &mut Run<'_>) -> Result<Value, RunError> {
        Ok(match expr {
            Expr::Nil => Value::Nil,
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Int(i) => Value::Int(*i),
            Expr::Num(n) => Value::Num(*n),
            Expr::Str(s) => Value::Str(s.clone()),
            Expr::Var(name) => self.var(name),
            Expr::Call(call) => self.call(call, run)?,
            Expr::List(items) => Value::List(
                items
                    .iter()
                    .map(|item| self.eval(item, line, run))
                    .collect::<Result<_, _>>()?,
            ),
            Expr::Index(target, index) => {
                let target = self.eval(target, line, run)?;
                let index = self.eval(index, line, run)?;
                match &target {
                    Value::List(items) => index
                        .as_i64()
                        .and_then(|i| usize::try_from(i).ok())
                        .and_then(|i| i.checked_sub(1))
                        .and_then(|i| items.get(i))
                        .cloned()
                        .unwrap_or(Value::Nil),
                    other => return Err(type_error(line, "index", other).into()),
                }
            }
            Expr::Neg(inner) => {
                let v = self.eval(inner, line, run)?;
                match to_number(&v) {
                    Some(Value::Int(i)) => Value::Int(i.wrapping_neg()),
                    Some(Value::Num(n)) => Value::Num(-n),
                    _ => return Err(type_error(line, "perform arithmetic on", &v).into()),
                }
            }
            Expr::Not(inner) => Value::Bool(!truthy(&self.eval(inner, line, run)?)),
            Expr::Len(inner) => match self.eval(inner, line, run)? {
                Value::Str(s) => Value::Int(s.len() as i64),
                Value::List(items) => Value::Int(items.len() as i64),
                other => return Err(type_error(line, "get length of", &other).into()),
            },
            Expr::Binary(BinOp::And, lhs, rhs) => {
                let lhs = self.eval(lhs, line, run)?;
                if truthy(&lhs) {
                    self.eval(rhs, line, run)?
                } else {
                    lhs
                }
            }
            Expr::Binary(BinOp::Or, lhs, rhs) => {
                let lhs = self.eval(lhs, line, run)?;
                if truthy(&lhs) {
                    lhs
                } else {
                    self.eval(rhs, line, run)?
                }
            }
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval(lhs, line, run)?;
                let rhs = self.eval(rhs, line, run)?;
                binary(*op, &lhs, &rhs, line)?
            }
        })
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Only `nil` and `false` are false.
fn truthy(v: &Value) -> bool {
    !matches!(v, Value::Nil | Value::Bool(false))
}

fn count_iteration(iterations: &mut usize, line: usize) -> Result<(), ScriptError> {
    *iterations += 1;
    if *iterations > MAX_LOOP_ITERATIONS {
        return Err(ScriptError::Runtime {
            line,
            msg: format!("loop exceeded {} iterations", MAX_LOOP_ITERATIONS),
        });
    }
    Ok(())
}

/// Values taken by the control variable of a numeric `for`.
///
/// All integer bounds give integer values, anything else counts in floats.
fn for_range(
    start: &Value,
    stop: &Value,
    step: &Value,
    line: usize,
) -> Result<Box<dyn Iterator<Item = Value>>, ScriptError> {
    let number = |v: &Value, what: &str| {
        to_number(v).ok_or_else(|| ScriptError::Runtime {
            line,
            msg: format!("'for' {} must be a number", what),
        })
    };
    let (start, stop, step) = (
        number(start, "initial value")?,
        number(stop, "limit")?,
        number(step, "step")?,
    );

    if step.as_f64() == Some(0.0) {
        return Err(ScriptError::Runtime {
            line,
            msg: "'for' step is zero".into(),
        });
    }

    Ok(match (start, stop, step) {
        (Value::Int(start), Value::Int(stop), Value::Int(step)) => {
            let mut next = Some(start);
            Box::new(std::iter::from_fn(move || {
                let i = next.filter(|i| if step > 0 { *i <= stop } else { *i >= stop })?;
                next = i.checked_add(step);
                Some(Value::Int(i))
            }))
        }
        (start, stop, step) => {
            let (start, stop, step) = (
                start.as_f64().unwrap_or(f64::NAN),
                stop.as_f64().unwrap_or(f64::NAN),
                step.as_f64().unwrap_or(f64::NAN),
            );
            let mut next = start;
            Box::new(std::iter::from_fn(move || {
                let x = next;
                let in_range = if step > 0.0 { x <= stop } else { x >= stop };
                next += step;
                in_range.then_some(Value::Num(x))
            }))
        }
    })
}

/// Numeric view of a value, converting numeric strings.
fn to_number(v: &Value) -> Option<Value> {
    match v {
        Value::Int(_) | Value::Num(_) => Some(v.clone()),
        Value::Str(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Value::Int)
                .or_else(|_| s.parse::<f64>().map(Value::Num))
                .ok()
        }
        _ => None,
    }
}

/// Equality without coercion, numbers compare by value.
fn equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a == b,
        (a, b) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
    }
}

fn compare(lhs: &Value, rhs: &Value, line: usize) -> Result<Ordering, ScriptError> {
    let ord = match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (a, b) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => {
                return Err(ScriptError::Runtime {
                    line,
                    msg: format!(
                        "attempt to compare {} with {}",
                        a.type_name(),
                        b.type_name()
                    ),
                })
            }
        },
    };

    // NaN is neither less nor greater than anything
    Ok(ord.unwrap_or(Ordering::Equal))
}

fn binary(op: BinOp, lhs: &Value, rhs: &Value, line: usize) -> Result<Value, ScriptError> {
    match op {
        BinOp::Concat => {
            let joinable = |v: &Value| matches!(v, Value::Str(_) | Value::Int(_) | Value::Num(_));
            return match (joinable(lhs), joinable(rhs)) {
                (true, true) => Ok(Value::Str(format!("{}{}", lhs, rhs))),
                (false, _) => Err(type_error(line, "concatenate", lhs)),
                (_, false) => Err(type_error(line, "concatenate", rhs)),
            };
        }
        BinOp::Eq => return Ok(Value::Bool(equal(lhs, rhs))),
        BinOp::Ne => return Ok(Value::Bool(!equal(lhs, rhs))),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let nan = [lhs, rhs]
                .iter()
                .any(|v| matches!(v, Value::Num(n) if n.is_nan()));
            let ord = compare(lhs, rhs, line)?;
            return Ok(Value::Bool(
                !nan && match op {
                    BinOp::Lt => ord == Ordering::Less,
                    BinOp::Le => ord != Ordering::Greater,
                    BinOp::Gt => ord == Ordering::Greater,
                    _ => ord != Ordering::Less,
                },
            ));
        }
        _ => (),
    }

    let (a, b) = match (to_number(lhs), to_number(rhs)) {
        (Some(a), Some(b)) => (a, b),
        (None, _) => return Err(type_error(line, "perform arithmetic on", lhs)),
        (_, None) => return Err(type_error(line, "perform arithmetic on", rhs)),
    };

    Ok(match (op, a, b) {
        (BinOp::Add, Value::Int(x), Value::Int(y)) => Value::Int(x.wrapping_add(y)),
        (BinOp::Sub, Value::Int(x), Value::Int(y)) => Value::Int(x.wrapping_sub(y)),
        (BinOp::Mul, Value::Int(x), Value::Int(y)) => Value::Int(x.wrapping_mul(y)),
        (BinOp::Mod, Value::Int(x), Value::Int(y)) => {
            if y == 0 {
                return Err(ScriptError::Runtime {
                    line,
                    msg: "attempt to perform 'n%%0'".into(),
                });
            }
            // Result takes the sign of the divisor
            let r = x.wrapping_rem(y);
            Value::Int(if r != 0 && (r ^ y) < 0 { r + y } else { r })
        }
        (op, a, b) => {
            let (x, y) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
            Value::Num(match op {
                BinOp::Add => x + y,
                BinOp::Sub => x - y,
                BinOp::Mul => x * y,
                BinOp::Mod => x - (x / y).floor() * y,
                _ => x / y,
            })
        }
    })
}

fn type_error(line: usize, action: &str, culprit: &Value) -> ScriptError {
    ScriptError::Runtime {
        line,
        msg: format!("attempt to {} a {} value", action, culprit.type_name()),
    }
}
