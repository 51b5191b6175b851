//! Query predicate language: tokenizer, parser and evaluator.
//!
//! ```text
//! masterVariant(sku = "S-1") and version > 2
//! custom.fields.color in ("red", "blue")
//! key is not defined or not (tags contains any (:tags))
//! ```

mod ast;
mod error;
mod eval;
mod parser;
mod token;

pub use ast::{Circle, CompareOp, ContainsMode, Expr, Literal};
pub use error::PredicateError;
pub use eval::{matches, Document};
pub use parser::{parse, parse_clauses, Variables, MAX_DEPTH};
pub use token::{tokenize, Span, Token, TokenKind};

pub(crate) use eval::sort_order;
