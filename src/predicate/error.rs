use thiserror::Error;

/// Errors raised while tokenizing or parsing a predicate clause.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredicateError {
    /// The tokenizer hit input it cannot read.
    #[error("syntax error at line {line}, column {column}: unexpected '{fragment}'")]
    Syntax {
        fragment: String,
        line: usize,
        column: usize,
    },

    /// The tokens do not form a valid predicate.
    #[error("invalid query '{clause}': {message} (line {line}, column {column})")]
    InvalidQuery {
        clause: String,
        message: String,
        line: usize,
        column: usize,
    },
}
