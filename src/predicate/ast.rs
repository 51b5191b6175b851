//! Predicate expression tree.

use std::fmt;

/// A literal operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Bool(bool),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "{:?}", s),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainsMode {
    Any,
    All,
}

/// Centre (longitude, latitude) and radius in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub longitude: f64,
    pub latitude: f64,
    pub radius: f64,
}

/// A parsed predicate.
///
/// Leaf variants name a single field of the current scope. Dotted paths are
/// represented as nested [`Expr::FieldPath`] nodes, so `a.b.c = 1` and
/// `a(b(c = 1))` produce the same tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Evaluate `inner` with `field` as the new scope.
    FieldPath { field: String, inner: Box<Expr> },
    Comparison {
        field: String,
        op: CompareOp,
        value: Literal,
    },
    Existence { field: String, defined: bool },
    Emptiness { field: String, empty: bool },
    Containment {
        field: String,
        mode: ContainsMode,
        values: Vec<Literal>,
    },
    Membership { field: String, values: Vec<Literal> },
    Within { field: String, circle: Circle },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Group(Box<Expr>),
}

impl Expr {
    pub fn and(self, other: Expr) -> Expr {
        Expr::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Expr) -> Expr {
        Expr::Or(Box::new(self), Box::new(other))
    }
}
