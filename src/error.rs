//! Error types for directive parsing

use thiserror::Error;

use crate::parser::ast::Span;
use crate::parser::lexer::Token;

/// A tag whose contents match no directive form.
///
/// Spans are relative to the inside of the tag.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Parse error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },
}

impl ParseError {
    pub fn unexpected_character(span: Span) -> Self {
        ParseError::Syntax {
            span,
            message: "Unexpected character".to_string(),
            expected: vec![],
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            ParseError::Syntax { span, .. } => span,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ParseError::Syntax { message, .. } => message,
        }
    }

    /// Names of the forms that would have been accepted here
    pub fn expected(&self) -> &[String] {
        match self {
            ParseError::Syntax { expected, .. } => expected,
        }
    }

    /// Message with the expected forms appended, for diagnostics
    pub fn describe(&self) -> String {
        match self.expected() {
            [] => self.message().to_string(),
            expected => format!("{}, expected {}", self.message(), expected.join(" or ")),
        }
    }
}

impl<'a> From<chumsky::error::Rich<'a, Token>> for ParseError {
    fn from(err: chumsky::error::Rich<'a, Token>) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => match found {
                Some(tok) => format!("Unexpected {}", format_token(tok)),
                None => "Unexpected end of directive".to_string(),
            },
            RichReason::Custom(msg) => msg.to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of directive".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                chumsky::error::RichPattern::Any => Some("any token".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();

        ParseError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &Token) -> String {
    match tok {
        Token::Path(s) => format!("name '{}'", s),
        Token::Str(s) => format!("string \"{}\"", s),
        Token::At => "'@'".to_string(),
        Token::Bang => "'!'".to_string(),
        Token::Gt => "'>'".to_string(),
        Token::Hash => "'#'".to_string(),
        Token::Caret => "'^'".to_string(),
        Token::Plus => "'+'".to_string(),
        Token::Equals => "'='".to_string(),
        Token::Percent => "'%'".to_string(),
        Token::Colon => "':'".to_string(),
        Token::Slash => "'/'".to_string(),
        Token::ParenOpen => "'('".to_string(),
        Token::ParenClose => "')'".to_string(),
        Token::Comma => "','".to_string(),
    }
}
