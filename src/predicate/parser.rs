//! Recursive-descent predicate parser.
//!
//! ```text
//! or      := and ('or' and)*
//! and     := unary ('and' unary)*
//! unary   := 'not' unary | primary
//! primary := '(' or ')' | path tail
//! path    := IDENT ('.' WORD)*      keyword before an operator counts as IDENT
//! tail    := '(' or ')' | cmp value | 'is' ['not'] ('defined' | 'empty')
//!          | 'contains' ('any' | 'all') list | 'in' list
//!          | 'within' 'circle' '(' num ',' num ',' num ')'
//! ```

use std::collections::HashMap;

use serde_json::Value;

use super::ast::{Circle, CompareOp, ContainsMode, Expr, Literal};
use super::token::{tokenize, Token, TokenKind};
use super::PredicateError;

/// Deepest expression tree a clause may produce. Each `not`, group, nested
/// field scope, path segment and chained `and`/`or` operand counts a level.
pub const MAX_DEPTH: usize = 512;

/// Query variables referenced as `:name` inside a clause.
pub type Variables = HashMap<String, Value>;

/// Parse a single predicate clause.
pub fn parse(clause: &str, vars: &Variables) -> Result<Expr, PredicateError> {
    let tokens = tokenize(clause)?;
    let mut parser = Parser {
        clause,
        tokens,
        pos: 0,
        depth: 0,
        vars,
    };
    if parser.tokens.is_empty() {
        return Err(parser.error_at(None, "empty predicate"));
    }
    let expr = parser.parse_or()?;
    if let Some(token) = parser.tokens.get(parser.pos) {
        let message = format!("unexpected '{}'", token.text);
        return Err(parser.error_at(Some(parser.pos), message));
    }
    Ok(expr)
}

/// Parse every clause and AND them together. `Ok(None)` when there are none.
pub fn parse_clauses(clauses: &[String], vars: &Variables) -> Result<Option<Expr>, PredicateError> {
    let mut combined: Option<Expr> = None;
    for clause in clauses {
        let expr = parse(clause, vars)?;
        combined = Some(match combined {
            Some(acc) => acc.and(expr),
            None => expr,
        });
    }
    Ok(combined)
}

struct Parser<'a> {
    clause: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    vars: &'a Variables,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), PredicateError> {
        if self.eat(&kind) {
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn unexpected(&self, what: &str) -> PredicateError {
        match self.tokens.get(self.pos) {
            Some(token) => {
                let message = format!("expected {}, found '{}'", what, token.text);
                self.error_at(Some(self.pos), message)
            }
            None => self.error_at(None, format!("expected {}, found end of input", what)),
        }
    }

    fn error_at(&self, index: Option<usize>, message: impl Into<String>) -> PredicateError {
        let (line, column) = match index.and_then(|i| self.tokens.get(i)) {
            Some(token) => (token.span.line, token.span.column),
            None => end_position(self.clause),
        };
        PredicateError::InvalidQuery {
            clause: self.clause.to_string(),
            message: message.into(),
            line,
            column,
        }
    }

    /// Enter one more level of the expression tree, right after consuming
    /// the token that opens it.
    fn descend(&mut self) -> Result<(), PredicateError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            let message = format!("expression nests deeper than {} levels", MAX_DEPTH);
            return Err(self.error_at(Some(self.pos.saturating_sub(1)), message));
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expr, PredicateError> {
        let depth = self.depth;
        let mut expr = self.parse_and()?;
        while self.eat(&TokenKind::Or) {
            self.descend()?;
            let rhs = self.parse_and()?;
            expr = expr.or(rhs);
        }
        self.depth = depth;
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr, PredicateError> {
        let depth = self.depth;
        let mut expr = self.parse_unary()?;
        while self.eat(&TokenKind::And) {
            self.descend()?;
            let rhs = self.parse_unary()?;
            expr = expr.and(rhs);
        }
        self.depth = depth;
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, PredicateError> {
        if self.peek() == Some(&TokenKind::Not) && !self.operator_follows() {
            self.pos += 1;
            self.descend()?;
            let inner = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, PredicateError> {
        if self.eat(&TokenKind::LParen) {
            self.descend()?;
            let inner = self.parse_or()?;
            self.expect(TokenKind::RParen, "')'")?;
            self.depth -= 1;
            return Ok(Expr::Group(Box::new(inner)));
        }

        let depth = self.depth;
        let mut segments = self.parse_path()?;
        let last = segments.pop().unwrap_or_default();
        let mut expr = self.parse_tail(last)?;
        while let Some(segment) = segments.pop() {
            expr = Expr::FieldPath {
                field: segment,
                inner: Box::new(expr),
            };
        }
        self.depth = depth;
        Ok(expr)
    }

    fn parse_path(&mut self) -> Result<Vec<String>, PredicateError> {
        // A keyword directly followed by an operator names a field.
        let first = match self.peek() {
            Some(TokenKind::Ident(name)) => Some(name.clone()),
            Some(_) if self.operator_follows() => self.word_at(self.pos),
            _ => None,
        };
        let Some(first) = first else {
            return Err(self.unexpected("a field name"));
        };
        self.pos += 1;
        let mut segments = vec![first];
        while self.eat(&TokenKind::Dot) {
            self.descend()?;
            segments.push(self.path_segment()?);
        }
        Ok(segments)
    }

    /// After a dot any word is a field name, keywords included.
    fn path_segment(&mut self) -> Result<String, PredicateError> {
        match self.word_at(self.pos) {
            Some(name) => {
                self.pos += 1;
                Ok(name)
            }
            None => Err(self.unexpected("a field name after '.'")),
        }
    }

    /// The token at `index` read as a field name: an identifier or a bare keyword.
    fn word_at(&self, index: usize) -> Option<String> {
        let token = self.tokens.get(index)?;
        match &token.kind {
            TokenKind::Ident(name) => Some(name.clone()),
            _ if !token.text.is_empty() && token.text.chars().all(|c| c.is_ascii_alphabetic()) => {
                Some(token.text.clone())
            }
            _ => None,
        }
    }

    /// Whether the token after the current one starts a condition tail.
    fn operator_follows(&self) -> bool {
        matches!(
            self.tokens.get(self.pos + 1).map(|t| &t.kind),
            Some(
                TokenKind::Eq
                    | TokenKind::NotEq
                    | TokenKind::Lt
                    | TokenKind::Le
                    | TokenKind::Gt
                    | TokenKind::Ge
                    | TokenKind::Is
                    | TokenKind::Contains
                    | TokenKind::In
                    | TokenKind::Within
                    | TokenKind::Dot
            )
        )
    }

    fn parse_tail(&mut self, field: String) -> Result<Expr, PredicateError> {
        let Some(kind) = self.peek().cloned() else {
            return Err(self.unexpected(&format!("an operator after '{}'", field)));
        };
        let op = match kind {
            TokenKind::Eq => Some(CompareOp::Eq),
            TokenKind::NotEq => Some(CompareOp::NotEq),
            TokenKind::Lt => Some(CompareOp::Lt),
            TokenKind::Le => Some(CompareOp::Le),
            TokenKind::Gt => Some(CompareOp::Gt),
            TokenKind::Ge => Some(CompareOp::Ge),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let value = self.parse_value()?;
            return Ok(Expr::Comparison { field, op, value });
        }

        match kind {
            TokenKind::LParen => {
                self.pos += 1;
                self.descend()?;
                let inner = self.parse_or()?;
                self.expect(TokenKind::RParen, "')'")?;
                self.depth -= 1;
                Ok(Expr::FieldPath {
                    field,
                    inner: Box::new(inner),
                })
            }
            TokenKind::Is => {
                self.pos += 1;
                let negated = self.eat(&TokenKind::Not);
                if self.eat(&TokenKind::Defined) {
                    Ok(Expr::Existence {
                        field,
                        defined: !negated,
                    })
                } else if self.eat(&TokenKind::Empty) {
                    Ok(Expr::Emptiness {
                        field,
                        empty: !negated,
                    })
                } else {
                    Err(self.unexpected("'defined' or 'empty'"))
                }
            }
            TokenKind::Contains => {
                self.pos += 1;
                let mode = if self.eat(&TokenKind::Any) {
                    ContainsMode::Any
                } else if self.eat(&TokenKind::All) {
                    ContainsMode::All
                } else {
                    return Err(self.unexpected("'any' or 'all'"));
                };
                let values = self.parse_list()?;
                Ok(Expr::Containment {
                    field,
                    mode,
                    values,
                })
            }
            TokenKind::In => {
                self.pos += 1;
                let values = self.parse_list()?;
                Ok(Expr::Membership { field, values })
            }
            TokenKind::Within => {
                self.pos += 1;
                self.expect(TokenKind::Circle, "'circle'")?;
                self.expect(TokenKind::LParen, "'('")?;
                let longitude = self.parse_number()?;
                self.expect(TokenKind::Comma, "','")?;
                let latitude = self.parse_number()?;
                self.expect(TokenKind::Comma, "','")?;
                let radius = self.parse_number()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(Expr::Within {
                    field,
                    circle: Circle {
                        longitude,
                        latitude,
                        radius,
                    },
                })
            }
            _ => Err(self.unexpected(&format!("an operator after '{}'", field))),
        }
    }

    fn parse_value(&mut self) -> Result<Literal, PredicateError> {
        let index = self.pos;
        let literal = match self.advance().map(|t| t.kind.clone()) {
            Some(TokenKind::Str(s)) => Literal::String(s),
            Some(TokenKind::Number(n)) => Literal::Number(n),
            Some(TokenKind::Bool(b)) => Literal::Bool(b),
            Some(TokenKind::Variable(name)) => match self.variable(index, &name)? {
                Value::Array(_) => {
                    let message = format!("variable ':{}' holds a list where a value is expected", name);
                    return Err(self.error_at(Some(index), message));
                }
                value => self.literal_from(index, &name, value)?,
            },
            _ => {
                self.pos = index;
                return Err(self.unexpected("a value"));
            }
        };
        Ok(literal)
    }

    fn parse_list(&mut self) -> Result<Vec<Literal>, PredicateError> {
        if let Some(TokenKind::Variable(name)) = self.peek().cloned() {
            let index = self.pos;
            self.pos += 1;
            return match self.variable(index, &name)? {
                Value::Array(items) => items
                    .iter()
                    .map(|item| self.literal_from(index, &name, item))
                    .collect(),
                value => Ok(vec![self.literal_from(index, &name, value)?]),
            };
        }

        self.expect(TokenKind::LParen, "'('")?;
        let mut values = vec![self.parse_value()?];
        while self.eat(&TokenKind::Comma) {
            values.push(self.parse_value()?);
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(values)
    }

    fn parse_number(&mut self) -> Result<f64, PredicateError> {
        let index = self.pos;
        match self.parse_value()? {
            Literal::Number(n) => Ok(n),
            other => Err(self.error_at(Some(index), format!("expected a number, found {}", other))),
        }
    }

    fn variable(&self, index: usize, name: &str) -> Result<&'a Value, PredicateError> {
        self.vars
            .get(name)
            .ok_or_else(|| self.error_at(Some(index), format!("variable ':{}' is not defined", name)))
    }

    fn literal_from(&self, index: usize, name: &str, value: &Value) -> Result<Literal, PredicateError> {
        match value {
            Value::String(s) => Ok(Literal::String(s.clone())),
            Value::Bool(b) => Ok(Literal::Bool(*b)),
            Value::Number(n) => n
                .as_f64()
                .map(Literal::Number)
                .ok_or_else(|| self.error_at(Some(index), format!("variable ':{}' is out of range", name))),
            _ => Err(self.error_at(
                Some(index),
                format!("variable ':{}' must be a string, number or boolean", name),
            )),
        }
    }
}

fn end_position(clause: &str) -> (usize, usize) {
    let line = clause.matches('\n').count() + 1;
    let column = clause.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse_ok(clause: &str) -> Expr {
        parse(clause, &Variables::new()).unwrap()
    }

    fn eq(field: &str, value: Literal) -> Expr {
        Expr::Comparison {
            field: field.into(),
            op: CompareOp::Eq,
            value,
        }
    }

    fn num(n: f64) -> Literal {
        Literal::Number(n)
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(
            parse_ok("a = 1 or b = 2 and c = 3"),
            eq("a", num(1.0)).or(eq("b", num(2.0)).and(eq("c", num(3.0))))
        );
    }

    #[test]
    fn same_precedence_is_left_associative() {
        assert_eq!(
            parse_ok("a = 1 and b = 2 and c = 3"),
            eq("a", num(1.0)).and(eq("b", num(2.0))).and(eq("c", num(3.0)))
        );
    }

    #[test]
    fn not_applies_to_a_single_term() {
        assert_eq!(
            parse_ok("not a = 1 and b = 2"),
            Expr::Not(Box::new(eq("a", num(1.0)))).and(eq("b", num(2.0)))
        );
    }

    #[test]
    fn groups_override_precedence() {
        assert_eq!(
            parse_ok("(a = 1 or b = 2) and c = 3"),
            Expr::Group(Box::new(eq("a", num(1.0)).or(eq("b", num(2.0))))).and(eq("c", num(3.0)))
        );
    }

    #[test]
    fn dotted_path_matches_nested_form() {
        let dotted = parse_ok(r#"a.b.c = "x""#);
        let nested = parse_ok(r#"a(b(c = "x"))"#);
        assert_eq!(dotted, nested);
        assert_eq!(
            dotted,
            Expr::FieldPath {
                field: "a".into(),
                inner: Box::new(Expr::FieldPath {
                    field: "b".into(),
                    inner: Box::new(eq("c", Literal::String("x".into()))),
                }),
            }
        );
    }

    #[test]
    fn dotted_prefix_before_nested_scope() {
        assert_eq!(
            parse_ok("a.b(c = 1 and d = 2)"),
            parse_ok("a(b(c = 1 and d = 2))")
        );
    }

    #[test]
    fn literals_with_dots_and_parens_stay_literals() {
        assert_eq!(
            parse_ok(r#"version.label = "3.14 (beta)""#),
            Expr::FieldPath {
                field: "version".into(),
                inner: Box::new(eq("label", Literal::String("3.14 (beta)".into()))),
            }
        );
        assert_eq!(parse_ok("price = 3.14"), eq("price", num(3.14)));
    }

    #[test]
    fn keyword_after_dot_is_a_field() {
        assert_eq!(
            parse_ok("custom.fields.all = true"),
            Expr::FieldPath {
                field: "custom".into(),
                inner: Box::new(Expr::FieldPath {
                    field: "fields".into(),
                    inner: Box::new(eq("all", Literal::Bool(true))),
                }),
            }
        );
    }

    #[test]
    fn existence_emptiness_containment_membership() {
        assert_eq!(
            parse_ok("key is not defined"),
            Expr::Existence {
                field: "key".into(),
                defined: false,
            }
        );
        assert_eq!(
            parse_ok("tags is empty"),
            Expr::Emptiness {
                field: "tags".into(),
                empty: true,
            }
        );
        assert_eq!(
            parse_ok(r#"tags contains all ("a", "b")"#),
            Expr::Containment {
                field: "tags".into(),
                mode: ContainsMode::All,
                values: vec![Literal::String("a".into()), Literal::String("b".into())],
            }
        );
        assert_eq!(
            parse_ok("rating in (1, 2)"),
            Expr::Membership {
                field: "rating".into(),
                values: vec![num(1.0), num(2.0)],
            }
        );
    }

    #[test]
    fn within_circle() {
        assert_eq!(
            parse_ok("geoLocation within circle(13.37, 52.52, 1000)"),
            Expr::Within {
                field: "geoLocation".into(),
                circle: Circle {
                    longitude: 13.37,
                    latitude: 52.52,
                    radius: 1000.0,
                },
            }
        );
    }

    #[test]
    fn variables_are_substituted() {
        let mut vars = Variables::new();
        vars.insert("sku".into(), json!("SKU-1"));
        vars.insert("skus".into(), json!(["a", "b"]));
        assert_eq!(
            parse("sku = :sku", &vars).unwrap(),
            eq("sku", Literal::String("SKU-1".into()))
        );
        assert_eq!(
            parse("sku in :skus", &vars).unwrap(),
            Expr::Membership {
                field: "sku".into(),
                values: vec![Literal::String("a".into()), Literal::String("b".into())],
            }
        );
    }

    #[test]
    fn undefined_variable_is_invalid() {
        let err = parse("sku = :missing", &Variables::new()).unwrap_err();
        assert!(matches!(
            err,
            PredicateError::InvalidQuery { line: 1, column: 7, ref message, .. }
                if message.contains("missing")
        ));
    }

    #[test]
    fn missing_value_reports_end_position() {
        let err = parse("name =", &Variables::new()).unwrap_err();
        assert_eq!(
            err,
            PredicateError::InvalidQuery {
                clause: "name =".into(),
                message: "expected a value, found end of input".into(),
                line: 1,
                column: 7,
            }
        );
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        let err = parse("a = 1 b", &Variables::new()).unwrap_err();
        assert!(matches!(err, PredicateError::InvalidQuery { column: 7, .. }));
    }

    #[test]
    fn unknown_operator_is_rejected() {
        assert!(matches!(
            parse("a like 1", &Variables::new()),
            Err(PredicateError::InvalidQuery { .. })
        ));
        assert!(matches!(
            parse("", &Variables::new()),
            Err(PredicateError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn clauses_are_and_combined() {
        let clauses = vec!["a = 1".to_string(), "b = 2".to_string()];
        assert_eq!(
            parse_clauses(&clauses, &Variables::new()).unwrap(),
            Some(eq("a", num(1.0)).and(eq("b", num(2.0))))
        );
        assert_eq!(parse_clauses(&[], &Variables::new()).unwrap(), None);
    }

    #[test]
    fn keyword_named_top_level_fields() {
        assert_eq!(parse_ok("all = true"), eq("all", Literal::Bool(true)));
        assert_eq!(
            parse_ok("empty is defined"),
            Expr::Existence {
                field: "empty".into(),
                defined: true,
            }
        );
        assert_eq!(
            parse_ok("not = 1 and in.x = 2"),
            eq("not", num(1.0)).and(Expr::FieldPath {
                field: "in".into(),
                inner: Box::new(eq("x", num(2.0))),
            })
        );
        assert_eq!(
            parse_ok("not (a = 1)"),
            Expr::Not(Box::new(Expr::Group(Box::new(eq("a", num(1.0))))))
        );
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let depth = 20_000;
        let clause = format!("{}a = 1{}", "(".repeat(depth), ")".repeat(depth));
        let err = parse(&clause, &Variables::new()).unwrap_err();
        assert!(matches!(
            err,
            PredicateError::InvalidQuery { line: 1, column, ref message, .. }
                if column == MAX_DEPTH + 1 && message.contains("deeper")
        ));

        let clause = format!("{}a = 1", "not ".repeat(200_000));
        assert!(matches!(
            parse(&clause, &Variables::new()),
            Err(PredicateError::InvalidQuery { .. })
        ));

        let clause = vec!["a = 1"; 5_000].join(" or ");
        assert!(matches!(
            parse(&clause, &Variables::new()),
            Err(PredicateError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn nesting_within_the_limit_parses() {
        let depth = MAX_DEPTH - 1;
        let clause = format!("{}a = 1{}", "(".repeat(depth), ")".repeat(depth));
        let mut expr = parse_ok(&clause);
        for _ in 0..depth {
            expr = match expr {
                Expr::Group(inner) => *inner,
                other => panic!("expected a group, got {:?}", other),
            };
        }
        assert_eq!(expr, eq("a", num(1.0)));

        let chain = vec!["a = 1"; 100].join(" and ");
        assert!(parse(&chain, &Variables::new()).is_ok());
    }
}
