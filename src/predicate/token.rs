//! Predicate tokenizer built from nom combinators.

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag, take_while, take_while1},
    character::complete::{anychar, char, digit1, satisfy},
    combinator::{map, map_opt, not, opt, recognize, value},
    error::ParseError,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use super::PredicateError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Str(String),
    Number(f64),
    Bool(bool),
    Variable(String),
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
    Is,
    Defined,
    Empty,
    Contains,
    Any,
    All,
    In,
    Within,
    Circle,
    LParen,
    RParen,
    Comma,
    Dot,
}

impl TokenKind {
    fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word.to_ascii_lowercase().as_str() {
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "is" => TokenKind::Is,
            "defined" => TokenKind::Defined,
            "empty" => TokenKind::Empty,
            "contains" => TokenKind::Contains,
            "any" => TokenKind::Any,
            "all" => TokenKind::All,
            "in" => TokenKind::In,
            "within" => TokenKind::Within,
            "circle" => TokenKind::Circle,
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            _ => return None,
        };
        Some(kind)
    }
}

/// Position of a token in the clause. Line and column are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// Raw text of the token in the clause.
    pub text: String,
}

type Res<'a, T, E> = IResult<&'a str, T, E>;

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn word<'a, E: ParseError<&'a str>>(input: &'a str) -> Res<'a, TokenKind, E> {
    map(
        recognize(pair(satisfy(is_ident_start), take_while(is_ident_continue))),
        |w: &str| TokenKind::keyword(w).unwrap_or_else(|| TokenKind::Ident(w.to_string())),
    )(input)
}

fn variable<'a, E: ParseError<&'a str>>(input: &'a str) -> Res<'a, TokenKind, E> {
    map(preceded(char(':'), take_while1(is_ident_continue)), |name: &str| {
        TokenKind::Variable(name.to_string())
    })(input)
}

/// `-?digits(.digits)?`, never directly followed by a letter.
fn number<'a, E: ParseError<&'a str>>(input: &'a str) -> Res<'a, TokenKind, E> {
    map_opt(
        terminated(
            recognize(tuple((opt(char('-')), digit1, opt(pair(char('.'), digit1))))),
            not(satisfy(is_ident_start)),
        ),
        |raw: &str| raw.parse().ok().map(TokenKind::Number),
    )(input)
}

fn escape<'a, E: ParseError<&'a str>>(input: &'a str) -> Res<'a, char, E> {
    alt((value('\n', char('n')), value('\t', char('t')), anychar))(input)
}

fn quoted<'a, E: ParseError<&'a str>>(
    quote: char,
    plain: &'static str,
) -> impl FnMut(&'a str) -> Res<'a, String, E> {
    move |input| {
        map(
            delimited(
                char(quote),
                opt(escaped_transform(is_not(plain), '\\', escape)),
                char(quote),
            ),
            Option::unwrap_or_default,
        )(input)
    }
}

fn string<'a, E: ParseError<&'a str>>(input: &'a str) -> Res<'a, TokenKind, E> {
    map(alt((quoted('"', "\\\""), quoted('\'', "\\'"))), TokenKind::Str)(input)
}

fn operator<'a, E: ParseError<&'a str>>(input: &'a str) -> Res<'a, TokenKind, E> {
    alt((
        value(TokenKind::NotEq, tag("!=")),
        value(TokenKind::NotEq, tag("<>")),
        value(TokenKind::Le, tag("<=")),
        value(TokenKind::Ge, tag(">=")),
        value(TokenKind::Lt, char('<')),
        value(TokenKind::Gt, char('>')),
        value(TokenKind::Eq, char('=')),
    ))(input)
}

fn punctuation<'a, E: ParseError<&'a str>>(input: &'a str) -> Res<'a, TokenKind, E> {
    alt((
        value(TokenKind::LParen, char('(')),
        value(TokenKind::RParen, char(')')),
        value(TokenKind::Comma, char(',')),
        value(TokenKind::Dot, char('.')),
    ))(input)
}

fn token<'a, E: ParseError<&'a str>>(input: &'a str) -> Res<'a, TokenKind, E> {
    alt((string, variable, number, operator, punctuation, word))(input)
}

/// Running line/column as the tokenizer moves forward through the clause.
struct Cursor {
    offset: usize,
    line: usize,
    column: usize,
}

impl Cursor {
    fn advance_to(&mut self, input: &str, offset: usize) -> Span {
        for c in input[self.offset..offset].chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.offset = offset;
        Span {
            offset,
            line: self.line,
            column: self.column,
        }
    }
}

fn syntax_error(rest: &str, span: Span) -> PredicateError {
    // An unterminated string swallows the rest of the clause.
    let fragment = if rest.starts_with(['"', '\'']) {
        rest
    } else {
        let end = rest.find(|c: char| c.is_whitespace()).unwrap_or(rest.len());
        let first = rest.chars().next().map_or(0, |c| c.len_utf8());
        &rest[..end.max(first)]
    };
    PredicateError::Syntax {
        fragment: fragment.to_string(),
        line: span.line,
        column: span.column,
    }
}

/// Split a clause into tokens.
pub fn tokenize(input: &str) -> Result<Vec<Token>, PredicateError> {
    let mut cursor = Cursor {
        offset: 0,
        line: 1,
        column: 1,
    };
    let mut tokens = Vec::new();
    let mut rest = input.trim_start();
    while !rest.is_empty() {
        let span = cursor.advance_to(input, input.len() - rest.len());
        match token::<nom::error::Error<&str>>(rest) {
            Ok((after, kind)) => {
                let end = input.len() - after.len();
                tokens.push(Token {
                    kind,
                    span,
                    text: input[span.offset..end].to_string(),
                });
                rest = after.trim_start();
            }
            Err(_) => return Err(syntax_error(rest, span)),
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn dotted_path_and_string() {
        assert_eq!(
            kinds(r#"a.b = "3.14""#),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Dot,
                TokenKind::Ident("b".into()),
                TokenKind::Eq,
                TokenKind::Str("3.14".into()),
            ]
        );
    }

    #[test]
    fn operators() {
        assert_eq!(
            kinds("!= <> < <= > >= ="),
            vec![
                TokenKind::NotEq,
                TokenKind::NotEq,
                TokenKind::Lt,
                TokenKind::Le,
                TokenKind::Gt,
                TokenKind::Ge,
                TokenKind::Eq,
            ]
        );
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(
            kinds("NOT x IS Defined AND y contains ANY"),
            vec![
                TokenKind::Not,
                TokenKind::Ident("x".into()),
                TokenKind::Is,
                TokenKind::Defined,
                TokenKind::And,
                TokenKind::Ident("y".into()),
                TokenKind::Contains,
                TokenKind::Any,
            ]
        );
    }

    #[test]
    fn numbers_booleans_and_variables() {
        assert_eq!(
            kinds("-1.5 42 true :sku"),
            vec![
                TokenKind::Number(-1.5),
                TokenKind::Number(42.0),
                TokenKind::Bool(true),
                TokenKind::Variable("sku".into()),
            ]
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            kinds(r#""say \"hi\"" 'it\'s'"#),
            vec![
                TokenKind::Str("say \"hi\"".into()),
                TokenKind::Str("it's".into()),
            ]
        );
    }

    #[test]
    fn tracks_line_and_column() {
        let tokens = tokenize("a = 1\n  and b = 2").unwrap();
        let and = &tokens[3];
        assert_eq!(and.kind, TokenKind::And);
        assert_eq!((and.span.line, and.span.column), (2, 3));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = tokenize(r#"name = "open"#).unwrap_err();
        assert_eq!(
            err,
            PredicateError::Syntax {
                fragment: "\"open".into(),
                line: 1,
                column: 8,
            }
        );
    }

    #[test]
    fn stray_character_is_an_error() {
        let err = tokenize("a = 1 # b").unwrap_err();
        assert!(matches!(
            err,
            PredicateError::Syntax { ref fragment, line: 1, column: 7 } if fragment == "#"
        ));
    }

    #[test]
    fn lone_bang_is_an_error() {
        assert!(matches!(
            tokenize("a ! 1"),
            Err(PredicateError::Syntax { .. })
        ));
    }

    #[test]
    fn number_glued_to_a_word_is_an_error() {
        let err = tokenize("qty = 12abc").unwrap_err();
        assert_eq!(
            err,
            PredicateError::Syntax {
                fragment: "12abc".into(),
                line: 1,
                column: 7,
            }
        );
    }

    #[test]
    fn number_then_dot_keeps_the_dot() {
        assert_eq!(
            kinds("1.x"),
            vec![
                TokenKind::Number(1.0),
                TokenKind::Dot,
                TokenKind::Ident("x".into()),
            ]
        );
    }

    #[test]
    fn empty_string_and_unknown_escape() {
        assert_eq!(
            kinds(r#""" 'a\qb' "tab\tx""#),
            vec![
                TokenKind::Str(String::new()),
                TokenKind::Str("aqb".into()),
                TokenKind::Str("tab\tx".into()),
            ]
        );
    }

    #[test]
    fn tokens_keep_their_raw_text() {
        let tokens = tokenize("price >= -2.50 AND name = 'x'").unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["price", ">=", "-2.50", "AND", "name", "=", "'x'"]);
    }
}
