//! Lexer for template directives using logos
//!
//! Template text is split into literal text and `{{ ... }}` tags by [`scan`].
//! The inside of each tag is then tokenized by [`lex`].

use logos::Logos;

use super::ast::Span;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
pub enum Token {
    // Block meta characters
    #[token("@")]
    At,
    #[token("!")]
    Bang,
    #[token(">")]
    Gt,

    // Directive sigils
    #[token("#")]
    Hash,
    #[token("^")]
    Caret,
    #[token("+")]
    Plus,
    #[token("=")]
    Equals,
    #[token("%")]
    Percent,
    #[token(":")]
    Colon,
    #[token("/")]
    Slash,

    // Macro call delimiters
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token(",")]
    Comma,

    /// Dotted key path or template name, any Unicode letters or digits
    #[regex(r"[\p{L}\p{N}_$][\p{L}\p{N}_$.\-/]*", |lex| lex.slice().to_string())]
    Path(String),

    /// Quoted macro argument, either quote style
    #[regex(r#""[^"]*""#, unquote)]
    #[regex(r"'[^']*'", unquote)]
    Str(String),
}

fn unquote(lex: &mut logos::Lexer<Token>) -> String {
    let s = lex.slice();
    s[1..s.len() - 1].to_string()
}

/// Tokenize the inside of a tag.
///
/// Returns the span of the first unrecognized character on failure.
pub fn lex(input: &str) -> Result<Vec<(Token, Span)>, Span> {
    Token::lexer(input)
        .spanned()
        .map(|(tok, span)| tok.map(|t| (t, span.clone())).map_err(|_| span))
        .collect()
}

/// A top-level piece of template text
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text
    Text(Span),
    /// A `{{ ... }}` tag; `inner` excludes the braces
    Tag { span: Span, inner: Span },
}

/// Split template text into literal text and tags.
///
/// A tag runs from `{{` to the nearest following `}}`. When several `{{`
/// precede that `}}`, the innermost one opens the tag and the rest is text.
pub fn scan(source: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut pos = 0;

    while pos < source.len() {
        let Some(found) = source[pos..].find(OPEN) else {
            break;
        };
        let open = pos + found;
        let Some(close_found) = source[open + OPEN.len()..].find(CLOSE) else {
            break;
        };
        let close = open + OPEN.len() + close_found;

        // `{{ {{=x}}` opens at the last `{{` before the closer
        let open = match source[open..close].rfind(OPEN) {
            Some(last) => open + last,
            None => open,
        };

        if open > pos {
            segments.push(Segment::Text(pos..open));
        }
        segments.push(Segment::Tag {
            span: open..close + CLOSE.len(),
            inner: open + OPEN.len()..close,
        });
        pos = close + CLOSE.len();
    }

    if pos < source.len() {
        segments.push(Segment::Text(pos..source.len()));
    }
    segments
}
