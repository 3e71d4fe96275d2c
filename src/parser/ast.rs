//! Directive tree types

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Root of a parsed template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// Parent template declared by a leading `{{^name}}`
    pub extends: Option<Spanned<String>>,
    pub nodes: Vec<Node>,
}

impl Document {
    /// Name of the parent template, if any
    pub fn parent(&self) -> Option<&str> {
        self.extends.as_ref().map(|e| e.node.as_str())
    }
}

/// Block behaviour selected by the meta character after `{{`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// `{{key}}`: render the body when the value is truthy
    Conditional,
    /// `{{!key}}`: render the body when the value is falsy
    Negated,
    /// `{{@key}}`: render the body once per element or entry
    Enumerate,
    /// `{{>key}}`: render the body with the value as the current context
    ScopeShift,
}

/// A single macro argument
#[derive(Debug, Clone, PartialEq)]
pub enum MacroArg {
    /// Quoted string, passed verbatim
    Literal(String),
    /// Key resolved against the current scope
    Key(String),
}

/// `{{[meta]key}} body {{:key}} otherwise {{/key}}`
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub key: String,
    pub body: Vec<Node>,
    pub otherwise: Option<Vec<Node>>,
}

/// `{{#name}} body {{/name}}`
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    pub body: Vec<Node>,
}

/// `{{name(args)}} body {{/name}}`, body optional
#[derive(Debug, Clone, PartialEq)]
pub struct MacroCall {
    pub name: String,
    pub args: Vec<MacroArg>,
    pub body: Option<Vec<Node>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    /// `{{=key}}` or, when `escape` is set, `{{%key}}`
    Value { key: String, escape: bool },
    Block(Block),
    Section(Section),
    /// `{{+name}}`
    Include(String),
    Macro(MacroCall),
}

/// Append a node, merging adjacent text
pub fn push_node(nodes: &mut Vec<Node>, node: Node) {
    if let Node::Text(text) = &node {
        if let Some(Node::Text(prev)) = nodes.last_mut() {
            prev.push_str(text);
            return;
        }
    }
    nodes.push(node);
}
