use std::{cell::RefCell, collections::HashMap, rc::Rc};
use thiserror::Error;

use crate::{
    ast::{BinaryExpr, CallExpr, Expr, LiteralExpr, LogicalExpr, Stmt, UnaryExpr},
    globals::BUILTINS,
    scanner::{Token, TokenKind},
};

pub type WrappedEnvironment = Rc<RefCell<Environment>>;

#[derive(Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Function(FnValue),
    NativeFn(NativeFnValue),
}

#[derive(Clone, Debug)]
pub struct NativeFnValue {
    pub name: &'static str,
    pub arity: usize,
    pub native_fn: fn(Vec<Value>) -> EvaluationResult,
}

/// A user-defined function together with the environment captured at its
/// definition site. Lookups inside the body go through that environment, so
/// the function observes bindings as they are at call time.
#[derive(Clone)]
pub struct FnValue {
    pub name: String,
    params: Vec<Token>,
    body: Vec<Stmt>,
    closure: WrappedEnvironment,
}

pub trait Callable: std::fmt::Debug {
    fn arity(&self) -> usize;
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> EvaluationResult;
    fn name(&self) -> String;
}

impl Callable for FnValue {
    fn arity(&self) -> usize {
        self.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> EvaluationResult {
        let new_env = Environment::new(Some(self.closure.clone()));
        for (index, param) in self.params.iter().enumerate() {
            new_env
                .borrow_mut()
                .declare(param.lexeme.clone(), arguments[index].clone());
        }

        for statement in &self.body {
            if let Flow::Return { value, .. } = statement.evaluate(interpreter, new_env.clone())? {
                return Ok(value);
            }
        }
        Ok(Value::Null)
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

impl Callable for NativeFnValue {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, _interpreter: &mut Interpreter, arguments: Vec<Value>) -> EvaluationResult {
        (self.native_fn)(arguments)
    }

    fn name(&self) -> String {
        self.name.into()
    }
}

impl std::fmt::Debug for FnValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // the closure may contain this function; print the name only
        f.debug_struct("FnValue").field("name", &self.name).finish_non_exhaustive()
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => write!(f, "Boolean({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Value::Function(function) => write!(f, "Function({})", function.name),
            Value::NativeFn(native) => write!(f, "NativeFn({})", native.name),
        }
    }
}

impl Value {
    /// Only `null` and `false` are falsy; 0, "" and [] all count as truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }

    /// Numeric coercion used by the arithmetic operators: booleans become
    /// 0/1, null becomes 0, blank strings become 0, non-numeric strings and
    /// all other kinds become NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Boolean(true) => 1.0,
            Value::Boolean(false) => 0.0,
            Value::Null => 0.0,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Array(_) | Value::Function(_) | Value::NativeFn(_) => f64::NAN,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Function(_) | Value::NativeFn(_) => "function",
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Function(function) => write!(f, "<fn {}>", function.name),
            Value::NativeFn(native) => write!(f, "<fn {}>", native.name),
        }
    }
}

/// Loose equality: `null` equals only `null`; same kinds compare natively;
/// number/string/boolean mixes compare after numeric coercion, so a numeric
/// string equals its number and booleans count as 0/1.
pub fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| loose_equals(x, y))
        }
        (Value::Number(_) | Value::Boolean(_) | Value::String(_), Value::Number(_) | Value::Boolean(_) | Value::String(_)) => {
            left.to_number() == right.to_number()
        }
        _ => false,
    }
}

/// Strict equality: no coercion, different kinds are never equal. Callables
/// have no usable identity and never compare equal.
pub fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| strict_equals(x, y))
        }
        _ => false,
    }
}

#[derive(Error, Debug)]
#[error("Runtime Error: {kind}")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
}

#[derive(Error, Debug)]
pub enum RuntimeErrorKind {
    #[error("Undefined variable '{name}' at line {line}")]
    UndefinedVariable { name: String, line: u32 },
    #[error("Can only call functions and classes at line {line}")]
    NotCallable { line: u32 },
    #[error("Expected {expected} arguments but got {got} at line {line}")]
    ArityMismatch {
        expected: usize,
        got: usize,
        line: u32,
    },
    #[error("Foreach expected array, got {found} at line {line}")]
    ForeachNotArray { found: &'static str, line: u32 },
    #[error("Cannot return from top-level code at line {line}")]
    TopLevelReturn { line: u32 },
}

pub type EvaluationResult = Result<Value, RuntimeError>;

/// How a statement finished: fell through normally, or hit a `return` that
/// is unwinding exactly one call frame.
pub enum Flow {
    Normal,
    Return { value: Value, line: u32 },
}

pub struct Environment {
    variables: HashMap<String, Value>,
    enclosing: Option<WrappedEnvironment>,
}

impl Environment {
    pub fn global() -> WrappedEnvironment {
        let mut variables = HashMap::new();
        for builtin in BUILTINS {
            variables.insert(builtin.name.to_string(), Value::NativeFn(builtin.clone()));
        }
        Rc::new(RefCell::new(Environment {
            variables,
            enclosing: None,
        }))
    }

    pub fn new(enclosing: Option<WrappedEnvironment>) -> WrappedEnvironment {
        Rc::new(RefCell::new(Environment {
            variables: HashMap::new(),
            enclosing,
        }))
    }

    pub fn declare(&mut self, name: String, value: Value) {
        self.variables.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.variables.get(name) {
            return Some(value.clone());
        }
        self.enclosing
            .as_ref()
            .and_then(|enclosing| enclosing.borrow().get(name))
    }

    /// Walks the chain and overwrites the first binding with this name; an
    /// unbound name falls through to the end of the walk and is declared
    /// there, so a first assignment lands in the global environment.
    pub fn assign(&mut self, name: String, value: Value) {
        if self.variables.contains_key(&name) || self.enclosing.is_none() {
            self.variables.insert(name, value);
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value);
        }
    }
}

/// Walks statements in source order, collecting echoed text. A runtime error
/// stops execution and lands in the output buffer as its own suffix.
pub struct Interpreter {
    globals: WrappedEnvironment,
    output: String,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            globals: Environment::global(),
            output: String::new(),
        }
    }

    pub fn interpret(&mut self, statements: &[Stmt]) -> String {
        let globals = self.globals.clone();
        for statement in statements {
            match statement.evaluate(self, globals.clone()) {
                Ok(Flow::Normal) => {}
                Ok(Flow::Return { line, .. }) => {
                    let error = RuntimeError {
                        kind: RuntimeErrorKind::TopLevelReturn { line },
                    };
                    self.output.push_str(&error.to_string());
                    break;
                }
                Err(error) => {
                    self.output.push_str(&error.to_string());
                    break;
                }
            }
        }
        std::mem::take(&mut self.output)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

pub trait Evaluate<T = Value> {
    fn evaluate(&self, interpreter: &mut Interpreter, env: WrappedEnvironment)
        -> Result<T, RuntimeError>;
}

impl Evaluate<Flow> for Stmt {
    fn evaluate(
        &self,
        interpreter: &mut Interpreter,
        env: WrappedEnvironment,
    ) -> Result<Flow, RuntimeError> {
        match self {
            Stmt::Expression(expr) => {
                expr.evaluate(interpreter, env)?;
                Ok(Flow::Normal)
            }
            Stmt::Echo(expr) => {
                let value = expr.evaluate(interpreter, env)?;
                interpreter.output.push_str(&value.to_string());
                Ok(Flow::Normal)
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => expr.evaluate(interpreter, env.clone())?,
                    None => Value::Null,
                };
                env.borrow_mut().declare(name.lexeme.clone(), value);
                Ok(Flow::Normal)
            }
            Stmt::Return { keyword, value } => {
                let value = match value {
                    Some(expr) => expr.evaluate(interpreter, env)?,
                    None => Value::Null,
                };
                Ok(Flow::Return {
                    value,
                    line: keyword.line,
                })
            }
            Stmt::Block(statements) => {
                let new_env = Environment::new(Some(env));
                for statement in statements {
                    match statement.evaluate(interpreter, new_env.clone())? {
                        Flow::Normal => {}
                        flow @ Flow::Return { .. } => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::IfElse {
                condition,
                then_branch,
                else_branch,
            } => {
                if condition.evaluate(interpreter, env.clone())?.is_truthy() {
                    then_branch.evaluate(interpreter, env)
                } else if let Some(else_branch) = else_branch {
                    else_branch.evaluate(interpreter, env)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::WhileLoop { condition, body } => {
                while condition.evaluate(interpreter, env.clone())?.is_truthy() {
                    match body.evaluate(interpreter, env.clone())? {
                        Flow::Normal => {}
                        flow @ Flow::Return { .. } => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Foreach { array, item, body } => {
                let value = array.evaluate(interpreter, env.clone())?;
                let items = match value {
                    Value::Array(items) => items,
                    other => {
                        return Err(RuntimeError {
                            kind: RuntimeErrorKind::ForeachNotArray {
                                found: other.type_name(),
                                line: item.line,
                            },
                        })
                    }
                };
                for element in items {
                    let new_env = Environment::new(Some(env.clone()));
                    new_env.borrow_mut().declare(item.lexeme.clone(), element);
                    match body.evaluate(interpreter, new_env)? {
                        Flow::Normal => {}
                        flow @ Flow::Return { .. } => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Function { name, params, body } => {
                let function = FnValue {
                    name: name.lexeme.clone(),
                    params: params.clone(),
                    body: body.clone(),
                    closure: env.clone(),
                };
                env.borrow_mut()
                    .declare(name.lexeme.clone(), Value::Function(function));
                Ok(Flow::Normal)
            }
        }
    }
}

impl Evaluate for Expr {
    fn evaluate(
        &self,
        interpreter: &mut Interpreter,
        env: WrappedEnvironment,
    ) -> EvaluationResult {
        match self {
            Expr::Literal(literal) => Ok(Value::from(literal)),
            Expr::Variable(name) => {
                env.borrow().get(&name.lexeme).ok_or_else(|| RuntimeError {
                    kind: RuntimeErrorKind::UndefinedVariable {
                        name: name.lexeme.clone(),
                        line: name.line,
                    },
                })
            }
            Expr::Assign { name, value } => {
                let value = value.evaluate(interpreter, env.clone())?;
                env.borrow_mut().assign(name.lexeme.clone(), value.clone());
                Ok(value)
            }
            Expr::Grouping(inner) => inner.evaluate(interpreter, env),
            Expr::Unary(unary) => unary.evaluate(interpreter, env),
            Expr::Binary(binary) => binary.evaluate(interpreter, env),
            Expr::Logical(logical) => logical.evaluate(interpreter, env),
            Expr::Call(call) => call.evaluate(interpreter, env),
            Expr::Array(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(element.evaluate(interpreter, env.clone())?);
                }
                Ok(Value::Array(items))
            }
        }
    }
}

impl From<&LiteralExpr> for Value {
    fn from(literal: &LiteralExpr) -> Self {
        match literal {
            LiteralExpr::Null => Value::Null,
            LiteralExpr::Boolean(b) => Value::Boolean(*b),
            LiteralExpr::Number(n) => Value::Number(*n),
            LiteralExpr::String(s) => Value::String(s.clone()),
        }
    }
}

impl Evaluate for UnaryExpr {
    fn evaluate(
        &self,
        interpreter: &mut Interpreter,
        env: WrappedEnvironment,
    ) -> EvaluationResult {
        let right = self.right.evaluate(interpreter, env)?;
        match self.operator.kind {
            TokenKind::Minus => Ok(Value::Number(-right.to_number())),
            TokenKind::Bang => Ok(Value::Boolean(!right.is_truthy())),
            _ => unreachable!("parser only emits '!' and '-' as unary operators"),
        }
    }
}

impl Evaluate for BinaryExpr {
    fn evaluate(
        &self,
        interpreter: &mut Interpreter,
        env: WrappedEnvironment,
    ) -> EvaluationResult {
        let left = self.left.evaluate(interpreter, env.clone())?;
        let right = self.right.evaluate(interpreter, env)?;

        let value = match self.operator.kind {
            // numeric addition only for two numbers, concatenation otherwise
            TokenKind::Plus => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
                _ => Value::String(format!("{left}{right}")),
            },
            TokenKind::Dot => Value::String(format!("{left}{right}")),
            TokenKind::Minus => Value::Number(left.to_number() - right.to_number()),
            TokenKind::Star => Value::Number(left.to_number() * right.to_number()),
            TokenKind::Slash => Value::Number(left.to_number() / right.to_number()),
            TokenKind::Percent => Value::Number(left.to_number() % right.to_number()),
            TokenKind::StarStar => Value::Number(left.to_number().powf(right.to_number())),
            TokenKind::Greater
            | TokenKind::GreaterEqual
            | TokenKind::Less
            | TokenKind::LessEqual => Value::Boolean(compare(self.operator.kind, &left, &right)),
            TokenKind::EqualEqual => Value::Boolean(loose_equals(&left, &right)),
            TokenKind::BangEqual => Value::Boolean(!loose_equals(&left, &right)),
            TokenKind::EqualEqualEqual => Value::Boolean(strict_equals(&left, &right)),
            TokenKind::BangEqualEqual => Value::Boolean(!strict_equals(&left, &right)),
            _ => unreachable!("parser only emits binary operators here"),
        };
        Ok(value)
    }
}

/// Two strings compare lexicographically; any other pairing compares after
/// numeric coercion, so NaN operands make every comparison false.
fn compare(operator: TokenKind, left: &Value, right: &Value) -> bool {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return match operator {
            TokenKind::Greater => a > b,
            TokenKind::GreaterEqual => a >= b,
            TokenKind::Less => a < b,
            TokenKind::LessEqual => a <= b,
            _ => unreachable!("compare is only called for relational operators"),
        };
    }
    let (a, b) = (left.to_number(), right.to_number());
    match operator {
        TokenKind::Greater => a > b,
        TokenKind::GreaterEqual => a >= b,
        TokenKind::Less => a < b,
        TokenKind::LessEqual => a <= b,
        _ => unreachable!("compare is only called for relational operators"),
    }
}

impl Evaluate for LogicalExpr {
    fn evaluate(
        &self,
        interpreter: &mut Interpreter,
        env: WrappedEnvironment,
    ) -> EvaluationResult {
        let left = self.left.evaluate(interpreter, env.clone())?;
        match self.operator.kind {
            TokenKind::And => {
                if left.is_truthy() {
                    self.right.evaluate(interpreter, env)
                } else {
                    Ok(left)
                }
            }
            TokenKind::Or => {
                if left.is_truthy() {
                    Ok(left)
                } else {
                    self.right.evaluate(interpreter, env)
                }
            }
            _ => unreachable!("parser only emits '&&' and '||' as logical operators"),
        }
    }
}

impl Evaluate for CallExpr {
    fn evaluate(
        &self,
        interpreter: &mut Interpreter,
        env: WrappedEnvironment,
    ) -> EvaluationResult {
        let callee = self.callee.evaluate(interpreter, env.clone())?;

        match callee {
            Value::Function(function) => {
                self.check_arity(function.arity())?;
                let arguments = self.evaluate_arguments(interpreter, env)?;
                function.call(interpreter, arguments)
            }
            Value::NativeFn(native) => {
                self.check_arity(native.arity())?;
                let arguments = self.evaluate_arguments(interpreter, env)?;
                native.call(interpreter, arguments)
            }
            _ => Err(RuntimeError {
                kind: RuntimeErrorKind::NotCallable {
                    line: self.paren.line,
                },
            }),
        }
    }
}

impl CallExpr {
    fn check_arity(&self, expected: usize) -> Result<(), RuntimeError> {
        if self.arguments.len() != expected {
            return Err(RuntimeError {
                kind: RuntimeErrorKind::ArityMismatch {
                    expected,
                    got: self.arguments.len(),
                    line: self.paren.line,
                },
            });
        }
        Ok(())
    }

    fn evaluate_arguments(
        &self,
        interpreter: &mut Interpreter,
        env: WrappedEnvironment,
    ) -> Result<Vec<Value>, RuntimeError> {
        let mut evaluated = Vec::with_capacity(self.arguments.len());
        for argument in &self.arguments {
            evaluated.push(argument.evaluate(interpreter, env.clone())?);
        }
        Ok(evaluated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_null_and_false_are_falsy() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(Value::Boolean(true).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::String(String::new()).is_truthy());
        assert!(Value::Array(vec![]).is_truthy());
    }

    #[test]
    fn loose_equality_coerces_across_kinds() {
        assert!(loose_equals(&Value::Null, &Value::Null));
        assert!(!loose_equals(&Value::Null, &Value::Number(0.0)));
        assert!(!loose_equals(&Value::Null, &Value::Boolean(false)));
        assert!(loose_equals(
            &Value::Number(10.0),
            &Value::String("10".into())
        ));
        assert!(loose_equals(&Value::Boolean(true), &Value::Number(1.0)));
        assert!(!loose_equals(
            &Value::Number(1.0),
            &Value::String("one".into())
        ));
        assert!(loose_equals(
            &Value::Array(vec![Value::Number(1.0)]),
            &Value::Array(vec![Value::String("1".into())])
        ));
    }

    #[test]
    fn strict_equality_never_coerces() {
        assert!(strict_equals(&Value::Number(1.0), &Value::Number(1.0)));
        assert!(!strict_equals(
            &Value::Number(1.0),
            &Value::String("1".into())
        ));
        assert!(!strict_equals(&Value::Boolean(true), &Value::Number(1.0)));
        assert!(strict_equals(&Value::Null, &Value::Null));
    }

    #[test]
    fn numeric_coercion_handles_strings_and_booleans() {
        assert_eq!(Value::String("  42 ".into()).to_number(), 42.0);
        assert_eq!(Value::String("".into()).to_number(), 0.0);
        assert!(Value::String("abc".into()).to_number().is_nan());
        assert_eq!(Value::Boolean(true).to_number(), 1.0);
        assert_eq!(Value::Null.to_number(), 0.0);
    }

    #[test]
    fn stringification_trims_integral_doubles() {
        assert_eq!(Value::Number(30.0).to_string(), "30");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(-0.5).to_string(), "-0.5");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(
            Value::Array(vec![Value::Number(1.0), Value::String("x".into())]).to_string(),
            "[1, x]"
        );
    }

    #[test]
    fn assignment_falls_back_to_the_global_environment() {
        let globals = Environment::global();
        let inner = Environment::new(Some(globals.clone()));
        inner
            .borrow_mut()
            .assign("$a".to_string(), Value::Number(1.0));
        assert!(globals.borrow().get("$a").is_some());

        inner
            .borrow_mut()
            .declare("$b".to_string(), Value::Number(2.0));
        inner
            .borrow_mut()
            .assign("$b".to_string(), Value::Number(3.0));
        assert!(globals.borrow().get("$b").is_none());
        assert_eq!(inner.borrow().get("$b").unwrap().to_number(), 3.0);
    }

    #[test]
    fn environment_lookup_walks_the_chain() {
        let globals = Environment::global();
        globals
            .borrow_mut()
            .declare("$x".to_string(), Value::String("outer".into()));
        let inner = Environment::new(Some(globals));
        assert_eq!(inner.borrow().get("$x").unwrap().to_string(), "outer");
        assert!(inner.borrow().get("$missing").is_none());
    }

    #[test]
    fn globals_are_seeded_with_builtins() {
        let globals = Environment::global();
        assert!(matches!(
            globals.borrow().get("strlen"),
            Some(Value::NativeFn(_))
        ));
    }
}
