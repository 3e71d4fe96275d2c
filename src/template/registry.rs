//! Template storage and lookup

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::OnceCell;

use crate::engine::Engine;
use crate::parser::{self, ast::Document, ast::Node};
use crate::value::Value;
use crate::RenderError;

/// A template and its parse caches.
///
/// The source text never changes. The directive tree is parsed at most once,
/// and the tree with extends and includes resolved is built on first render.
/// Clones share both caches.
#[derive(Clone)]
pub struct Template {
    name: Option<String>,
    source: Arc<str>,
    document: Arc<OnceLock<Document>>,
    resolved: Arc<OnceCell<Vec<Node>>>,
}

impl Default for Template {
    fn default() -> Self {
        Self::new("")
    }
}

impl Template {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            name: None,
            source: Arc::from(source.into()),
            document: Arc::new(OnceLock::new()),
            resolved: Arc::new(OnceCell::new()),
        }
    }

    pub fn named(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(source).with_name(name)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The template text as written
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// The directive tree of the source, parsed on first use
    pub fn document(&self) -> &Document {
        self.document.get_or_init(|| parser::parse(&self.source))
    }

    /// Name of the parent template, if the template extends one
    pub fn extends(&self) -> Option<&str> {
        self.document().parent()
    }

    /// The resolved tree, if a render has built it
    pub fn resolved(&self) -> Option<&[Node]> {
        self.resolved.get().map(Vec::as_slice)
    }

    pub(crate) fn resolved_cell(&self) -> &OnceCell<Vec<Node>> {
        &self.resolved
    }

    /// Render this template with `engine`'s templates and macros
    pub async fn render<S: TemplateSource>(
        &self,
        engine: &Engine<S>,
        data: impl Into<Value>,
    ) -> Result<String, RenderError> {
        engine.render(self, data).await
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("resolved", &self.resolved.initialized())
            .finish()
    }
}

impl From<&str> for Template {
    fn from(source: &str) -> Self {
        Template::new(source)
    }
}

impl From<String> for Template {
    fn from(source: String) -> Self {
        Template::new(source)
    }
}

/// Where the engine finds templates referenced by name.
///
/// Lookups are async so that a source may read from disk or the network.
#[async_trait]
pub trait TemplateSource: Send + Sync {
    async fn fetch(&self, name: &str) -> Option<Template>;

    /// Fetch several templates at once.
    ///
    /// Completes only after every lookup has finished. Missing names are
    /// absent from the result.
    async fn fetch_all(&self, names: &[String]) -> HashMap<String, Template> {
        let lookups = names.iter().map(|name| async move {
            let template = self.fetch(name).await;
            (name.clone(), template)
        });

        join_all(lookups)
            .await
            .into_iter()
            .filter_map(|(name, template)| template.map(|t| (name, t)))
            .collect()
    }
}

/// In-memory registry of templates by name
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template, replacing any previous one of the same name
    pub fn put(&mut self, name: impl Into<String>, template: impl Into<Template>) -> Template {
        let name = name.into();
        let template = template.into().with_name(name.clone());
        self.templates.insert(name, template.clone());
        template
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Template> {
        self.templates.remove(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn clear(&mut self) {
        self.templates.clear();
    }
}

#[async_trait]
impl TemplateSource for TemplateRegistry {
    async fn fetch(&self, name: &str) -> Option<Template> {
        self.get(name).cloned()
    }
}
