//! Tag grammar using chumsky
//!
//! Each `{{ ... }}` tag is parsed on its own into a [`Tag`]. Matching openers
//! with closers happens afterwards in the tree builder.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::ParseError;
use crate::parser::ast::{BlockKind, MacroArg};
use crate::parser::lexer::{self, Token};

/// A single parsed tag
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    /// `{{key}}`, `{{!key}}`, `{{@key}}`, `{{>key}}`
    Open { kind: BlockKind, key: String },
    /// `{{#name}}`
    Section { name: String },
    /// `{{:key}}`
    Else { key: String },
    /// `{{/key}}`, `{{/@key}}`, `{{/name()}}` or a bare `{{/}}`
    Close { name: Option<String> },
    /// `{{+name}}`
    Include { name: String },
    /// `{{^name}}`
    Extend { name: String },
    /// `{{=key}}` or `{{%key}}`
    Value { escape: bool, key: String },
    /// `{{name(args)}}`
    Macro { name: String, args: Vec<MacroArg> },
}

/// Parse the inside of a tag (without the braces)
pub fn parse_tag(input: &str) -> Result<Tag, Vec<ParseError>> {
    let tokens = lexer::lex(input).map_err(|span| vec![ParseError::unexpected_character(span)])?;
    let len = input.len();

    let token_iter = tokens.into_iter().map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    tag_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

fn tag_parser<'a, I>() -> impl Parser<'a, I, Tag, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let path = select! {
        Token::Path(p) => p,
    };

    let literal = select! {
        Token::Str(s) => s,
    };

    let meta = choice((
        just(Token::At).to(BlockKind::Enumerate),
        just(Token::Bang).to(BlockKind::Negated),
        just(Token::Gt).to(BlockKind::ScopeShift),
    ));

    let value = choice((
        just(Token::Equals).to(false),
        just(Token::Percent).to(true),
    ))
    .then(path.clone())
    .map(|(escape, key)| Tag::Value { escape, key });

    let include = just(Token::Plus)
        .ignore_then(path.clone())
        .map(|name| Tag::Include { name });

    let extend = just(Token::Caret)
        .ignore_then(path.clone())
        .map(|name| Tag::Extend { name });

    let otherwise = just(Token::Colon)
        .ignore_then(path.clone())
        .map(|key| Tag::Else { key });

    let section = just(Token::Hash)
        .ignore_then(path.clone())
        .map(|name| Tag::Section { name });

    // Meta in a closer is accepted but not checked against the opener
    let close = just(Token::Slash)
        .ignore_then(choice((meta.clone().ignored(), just(Token::Hash).ignored())).or_not())
        .ignore_then(path.clone().or_not())
        .then_ignore(just(Token::ParenOpen).then(just(Token::ParenClose)).or_not())
        .map(|name| Tag::Close { name });

    let arg = choice((
        literal.map(MacroArg::Literal),
        path.clone().map(MacroArg::Key),
    ));

    let macro_call = path
        .clone()
        .then(
            arg.separated_by(just(Token::Comma))
                .allow_trailing()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::ParenOpen), just(Token::ParenClose)),
        )
        .map(|(name, args)| Tag::Macro { name, args });

    let open = meta.or_not().then(path).map(|(kind, key)| Tag::Open {
        kind: kind.unwrap_or(BlockKind::Conditional),
        key,
    });

    // Note: macro_call must come before open, both start with a path
    choice((
        value, include, extend, otherwise, section, close, macro_call, open,
    ))
    .then_ignore(end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(input: &str) -> Tag {
        parse_tag(input).expect("Should parse")
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(
            tag("=content"),
            Tag::Value {
                escape: false,
                key: "content".to_string()
            }
        );
        assert_eq!(
            tag(" % data.nested "),
            Tag::Value {
                escape: true,
                key: "data.nested".to_string()
            }
        );
    }

    #[test]
    fn test_parse_empty_value_is_error() {
        assert!(parse_tag("=").is_err());
    }

    #[test]
    fn test_parse_block_openers() {
        assert_eq!(
            tag("exists"),
            Tag::Open {
                kind: BlockKind::Conditional,
                key: "exists".to_string()
            }
        );
        assert_eq!(
            tag("!exists"),
            Tag::Open {
                kind: BlockKind::Negated,
                key: "exists".to_string()
            }
        );
        assert_eq!(
            tag("@list"),
            Tag::Open {
                kind: BlockKind::Enumerate,
                key: "list".to_string()
            }
        );
        assert_eq!(
            tag(">data.nested"),
            Tag::Open {
                kind: BlockKind::ScopeShift,
                key: "data.nested".to_string()
            }
        );
    }

    #[test]
    fn test_parse_section_include_extend() {
        assert_eq!(
            tag("#content"),
            Tag::Section {
                name: "content".to_string()
            }
        );
        assert_eq!(
            tag("+ partials/nav"),
            Tag::Include {
                name: "partials/nav".to_string()
            }
        );
        assert_eq!(
            tag("^layout"),
            Tag::Extend {
                name: "layout".to_string()
            }
        );
    }

    #[test]
    fn test_parse_else() {
        assert_eq!(
            tag(":exists"),
            Tag::Else {
                key: "exists".to_string()
            }
        );
    }

    #[test]
    fn test_parse_closers() {
        assert_eq!(
            tag("/list"),
            Tag::Close {
                name: Some("list".to_string())
            }
        );
        assert_eq!(
            tag("/@list"),
            Tag::Close {
                name: Some("list".to_string())
            }
        );
        assert_eq!(
            tag("/ li()"),
            Tag::Close {
                name: Some("li".to_string())
            }
        );
        assert_eq!(tag("/"), Tag::Close { name: None });
    }

    #[test]
    fn test_parse_macro_call() {
        assert_eq!(
            tag(r#" li(i, n, "a, b") "#),
            Tag::Macro {
                name: "li".to_string(),
                args: vec![
                    MacroArg::Key("i".to_string()),
                    MacroArg::Key("n".to_string()),
                    MacroArg::Literal("a, b".to_string()),
                ],
            }
        );
    }

    #[test]
    fn test_parse_macro_without_args() {
        assert_eq!(
            tag("year()"),
            Tag::Macro {
                name: "year".to_string(),
                args: vec![],
            }
        );
    }

    #[test]
    fn test_trailing_tokens_are_error() {
        assert!(parse_tag("=a b").is_err());
        assert!(parse_tag("li(a").is_err());
    }

    #[test]
    fn test_lex_error_reports_character() {
        let errors = parse_tag("= a * b").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].span(), &(4..5));
    }
}
