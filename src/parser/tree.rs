//! Directive tree builder
//!
//! Tags from [`scan`] are parsed one at a time and matched with a stack of
//! open frames. A closer binds to the nearest open frame with the same name,
//! so nested blocks over the same key pair up correctly. Anything that cannot
//! be matched falls back to literal text.

use crate::lint::{LintCategory, LintWarning};
use crate::parser::ast::{
    push_node, Block, BlockKind, Document, MacroArg, MacroCall, Node, Section, Span, Spanned,
};
use crate::parser::grammar::{parse_tag, Tag};
use crate::parser::lexer::{scan, Segment};

/// Parse a template into its directive tree
pub fn parse(source: &str) -> Document {
    parse_with_warnings(source).0
}

/// Parse a template, collecting a warning for every tag emitted as literal text
pub fn parse_with_warnings(source: &str) -> (Document, Vec<LintWarning>) {
    let mut builder = Builder::new(source, true);
    builder.run();
    builder.finish()
}

/// Parse template text that cannot extend a parent.
///
/// An extend tag is ordinary literal text here.
pub fn parse_fragment(source: &str) -> Vec<Node> {
    let mut builder = Builder::new(source, false);
    builder.run();
    builder.finish().0.nodes
}

#[derive(Debug)]
enum Opener {
    Block { kind: BlockKind, key: String },
    Section { name: String },
    Macro { name: String, args: Vec<MacroArg> },
}

impl Opener {
    fn name(&self) -> &str {
        match self {
            Opener::Block { key, .. } => key,
            Opener::Section { name } => name,
            Opener::Macro { name, .. } => name,
        }
    }
}

/// A directive waiting for its closer
#[derive(Debug)]
struct Frame {
    opener: Opener,
    /// Source text of the opening tag
    raw: String,
    span: Span,
    children: Vec<Node>,
    /// Position in `children` and source text of an `{{:key}}` tag
    otherwise: Option<(usize, String)>,
}

impl Frame {
    fn into_node(self) -> Node {
        match self.opener {
            Opener::Block { kind, key } => {
                let mut body = self.children;
                let otherwise = self.otherwise.map(|(at, _)| body.split_off(at));
                Node::Block(Block {
                    kind,
                    key,
                    body,
                    otherwise,
                })
            }
            Opener::Section { name } => Node::Section(Section {
                name,
                body: self.children,
            }),
            Opener::Macro { name, args } => Node::Macro(MacroCall {
                name,
                args,
                body: Some(self.children),
            }),
        }
    }
}

struct Builder<'s> {
    source: &'s str,
    root: Vec<Node>,
    stack: Vec<Frame>,
    extends: Option<Spanned<String>>,
    /// Whether an extend tag would still be the first directive
    extends_allowed: bool,
    /// Extend tags are warned about only in full documents
    document: bool,
    warnings: Vec<LintWarning>,
}

impl<'s> Builder<'s> {
    fn new(source: &'s str, document: bool) -> Self {
        Self {
            source,
            root: Vec::new(),
            stack: Vec::new(),
            extends: None,
            extends_allowed: document,
            document,
            warnings: Vec::new(),
        }
    }

    fn run(&mut self) {
        for segment in scan(self.source) {
            match segment {
                Segment::Text(span) => {
                    let text = &self.source[span];
                    if !text.trim().is_empty() {
                        self.extends_allowed = false;
                    }
                    self.push(Node::Text(text.to_string()));
                }
                Segment::Tag { span, inner } => self.tag(span, inner),
            }
        }
    }

    fn finish(mut self) -> (Document, Vec<LintWarning>) {
        while let Some(frame) = self.stack.pop() {
            self.unwind(frame);
        }
        let document = Document {
            extends: self.extends,
            nodes: self.root,
        };
        (document, self.warnings)
    }

    fn push(&mut self, node: Node) {
        match self.stack.last_mut() {
            // Text after an else tag must not merge into the body
            Some(frame)
                if frame.otherwise.as_ref().map(|(at, _)| *at) == Some(frame.children.len()) =>
            {
                frame.children.push(node)
            }
            Some(frame) => push_node(&mut frame.children, node),
            None => push_node(&mut self.root, node),
        }
    }

    fn literal(&mut self, span: &Span) {
        let text = self.source[span.clone()].to_string();
        self.push(Node::Text(text));
    }

    fn warn(&mut self, category: LintCategory, message: String, span: Span) {
        self.warnings.push(LintWarning::new(category, message, span));
    }

    fn tag(&mut self, span: Span, inner: Span) {
        let first = std::mem::replace(&mut self.extends_allowed, false);

        let tag = match parse_tag(&self.source[inner]) {
            Ok(tag) => tag,
            Err(errors) => {
                self.literal(&span);
                let message = match errors.first() {
                    Some(err) => err.describe(),
                    None => "Unrecognized directive".to_string(),
                };
                self.warn(LintCategory::Malformed, message, span);
                return;
            }
        };

        match tag {
            Tag::Value { escape, key } => self.push(Node::Value { key, escape }),
            Tag::Include { name } => self.push(Node::Include(name)),
            Tag::Extend { name } => {
                if first {
                    self.extends = Some(Spanned::new(name, span));
                } else {
                    self.literal(&span);
                    if self.document {
                        self.warn(
                            LintCategory::MisplacedExtend,
                            format!("'{}' is only a parent when it opens the template", name),
                            span,
                        );
                    }
                }
            }
            Tag::Open { kind, key } => self.open(Opener::Block { kind, key }, span),
            Tag::Section { name } => self.open(Opener::Section { name }, span),
            Tag::Macro { name, args } => self.open(Opener::Macro { name, args }, span),
            Tag::Else { key } => self.otherwise(key, span),
            Tag::Close { name } => self.close(name, span),
        }
    }

    fn open(&mut self, opener: Opener, span: Span) {
        self.stack.push(Frame {
            opener,
            raw: self.source[span.clone()].to_string(),
            span,
            children: Vec::new(),
            otherwise: None,
        });
    }

    fn otherwise(&mut self, key: String, span: Span) {
        // Macros without a closer are transparent to the else tag
        let target = self
            .stack
            .iter()
            .rposition(|f| !matches!(f.opener, Opener::Macro { .. }));

        let matched = target.filter(|&idx| {
            let frame = &self.stack[idx];
            matches!(&frame.opener, Opener::Block { key: k, .. } if *k == key)
                && frame.otherwise.is_none()
        });

        let Some(idx) = matched else {
            self.literal(&span);
            self.warn(
                LintCategory::UnmatchedElse,
                format!("No open block for '{}'", key),
                span,
            );
            return;
        };

        self.unwind_above(idx);
        let raw = self.source[span].to_string();
        if let Some(frame) = self.stack.last_mut() {
            frame.otherwise = Some((frame.children.len(), raw));
        }
    }

    fn close(&mut self, name: Option<String>, span: Span) {
        let target = match &name {
            Some(name) => self.stack.iter().rposition(|f| f.opener.name() == name),
            None => self.stack.len().checked_sub(1),
        };

        let Some(idx) = target else {
            self.literal(&span);
            let message = match name {
                Some(name) => format!("No open directive named '{}'", name),
                None => "No open directive to close".to_string(),
            };
            self.warn(LintCategory::UnmatchedClose, message, span);
            return;
        };

        self.unwind_above(idx);
        if let Some(frame) = self.stack.pop() {
            let node = frame.into_node();
            self.push(node);
        }
    }

    fn unwind_above(&mut self, idx: usize) {
        while self.stack.len() > idx + 1 {
            if let Some(frame) = self.stack.pop() {
                self.unwind(frame);
            }
        }
    }

    /// Flatten a frame that never saw its closer into its parent
    fn unwind(&mut self, frame: Frame) {
        let Frame {
            opener,
            raw,
            span,
            children,
            otherwise,
        } = frame;

        match opener {
            Opener::Macro { name, args } => {
                self.push(Node::Macro(MacroCall {
                    name,
                    args,
                    body: None,
                }));
            }
            Opener::Block { key: name, .. } | Opener::Section { name } => {
                self.warn(
                    LintCategory::Unclosed,
                    format!("'{}' is never closed", name),
                    span,
                );
                self.push(Node::Text(raw));
            }
        }

        let mut before = children;
        let after = match otherwise {
            Some((at, raw)) => {
                let mut rest = before.split_off(at);
                rest.insert(0, Node::Text(raw));
                rest
            }
            None => Vec::new(),
        };
        for child in before.into_iter().chain(after) {
            self.push(child);
        }
    }
}
