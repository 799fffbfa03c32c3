use std::fmt;

use crate::scanner::Token;

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expression(Expr),
    Echo(Expr),
    Var {
        name: Token,
        initializer: Option<Expr>,
    },
    Return {
        keyword: Token,
        value: Option<Expr>,
    },
    Block(Vec<Stmt>),
    IfElse {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    WhileLoop {
        condition: Expr,
        body: Box<Stmt>,
    },
    Foreach {
        array: Expr,
        item: Token,
        body: Box<Stmt>,
    },
    Function {
        name: Token,
        params: Vec<Token>,
        body: Vec<Stmt>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(LiteralExpr),
    Variable(Token),
    Assign {
        name: Token,
        value: Box<Expr>,
    },
    Unary(Box<UnaryExpr>),
    Binary(Box<BinaryExpr>),
    Logical(Box<LogicalExpr>),
    Grouping(Box<Expr>),
    Call(Box<CallExpr>),
    Array(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralExpr {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub operator: Token,
    pub right: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: Expr,
    pub operator: Token,
    pub right: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalExpr {
    pub left: Expr,
    pub operator: Token,
    pub right: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: Expr,
    pub paren: Token,
    pub arguments: Vec<Expr>,
}

// Canonical single-line source form. Groupings are preserved as nodes, so
// printing a parsed tree and reparsing it yields a structurally equal tree.

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Expression(expr) => write!(f, "{expr};"),
            Stmt::Echo(expr) => write!(f, "echo {expr};"),
            Stmt::Var { name, initializer } => match initializer {
                Some(init) => write!(f, "var {} = {init};", name.lexeme),
                None => write!(f, "var {};", name.lexeme),
            },
            Stmt::Return { value, .. } => match value {
                Some(value) => write!(f, "return {value};"),
                None => write!(f, "return;"),
            },
            Stmt::Block(statements) => {
                write!(f, "{{ ")?;
                for statement in statements {
                    write!(f, "{statement} ")?;
                }
                write!(f, "}}")
            }
            Stmt::IfElse {
                condition,
                then_branch,
                else_branch,
            } => {
                write!(f, "if ({condition}) {then_branch}")?;
                if let Some(else_branch) = else_branch {
                    write!(f, " else {else_branch}")?;
                }
                Ok(())
            }
            Stmt::WhileLoop { condition, body } => write!(f, "while ({condition}) {body}"),
            Stmt::Foreach { array, item, body } => {
                write!(f, "foreach ({array} as {}) {body}", item.lexeme)
            }
            Stmt::Function { name, params, body } => {
                write!(f, "function {}(", name.lexeme)?;
                for (index, param) in params.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param.lexeme)?;
                }
                write!(f, ") {{ ")?;
                for statement in body {
                    write!(f, "{statement} ")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(literal) => write!(f, "{literal}"),
            Expr::Variable(name) => write!(f, "{}", name.lexeme),
            Expr::Assign { name, value } => write!(f, "{} = {value}", name.lexeme),
            Expr::Unary(unary) => write!(f, "{}{}", unary.operator.lexeme, unary.right),
            Expr::Binary(binary) => {
                write!(f, "{} {} {}", binary.left, binary.operator.lexeme, binary.right)
            }
            Expr::Logical(logical) => {
                write!(f, "{} {} {}", logical.left, logical.operator.lexeme, logical.right)
            }
            Expr::Grouping(inner) => write!(f, "({inner})"),
            Expr::Call(call) => {
                write!(f, "{}(", call.callee)?;
                for (index, argument) in call.arguments.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                write!(f, ")")
            }
            Expr::Array(elements) => {
                write!(f, "[")?;
                for (index, element) in elements.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl fmt::Display for LiteralExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralExpr::Null => write!(f, "null"),
            LiteralExpr::Boolean(value) => write!(f, "{value}"),
            LiteralExpr::Number(value) => write!(f, "{value}"),
            LiteralExpr::String(value) => write!(f, "\"{value}\""),
        }
    }
}
