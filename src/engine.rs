//! Render orchestration

use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::interpreter::Interpreter;
use crate::macros::{Macro, MacroContext, MacroError, MacroRegistry};
use crate::parser::ast::Node;
use crate::scope::Scope;
use crate::template::{
    resolve_extends, resolve_includes, SectionOverrides, Template, TemplateRegistry,
    TemplateSource,
};
use crate::value::Value;
use crate::RenderError;

/// Owns the templates and macros used by a render.
///
/// Rendering resolves the template's parent chain, then its includes, then
/// evaluates the result against the data. The resolved tree is cached on the
/// [`Template`], so later renders of the same template only evaluate.
#[derive(Debug)]
pub struct Engine<S = TemplateRegistry> {
    source: S,
    macros: MacroRegistry,
    config: EngineConfig,
}

impl Default for Engine<TemplateRegistry> {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine<TemplateRegistry> {
    /// Create an engine with an empty in-memory registry
    pub fn new() -> Self {
        Self::with_source(TemplateRegistry::new())
    }

    /// Register a template by name, replacing any previous one
    pub fn put(&mut self, name: impl Into<String>, template: impl Into<Template>) -> Template {
        self.source.put(name, template)
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.source
    }

    pub fn templates_mut(&mut self) -> &mut TemplateRegistry {
        &mut self.source
    }

    /// Remove every template and macro
    pub fn clear(&mut self) {
        self.source.clear();
        self.macros.clear();
    }
}

impl<S: TemplateSource> Engine<S> {
    pub fn with_source(source: S) -> Self {
        Self {
            source,
            macros: MacroRegistry::new(),
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn macros(&self) -> &MacroRegistry {
        &self.macros
    }

    pub fn macros_mut(&mut self) -> &mut MacroRegistry {
        &mut self.macros
    }

    /// Register a macro, replacing any previous one
    pub fn register_macro<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&mut MacroContext<'_>, &[Value]) -> Result<String, MacroError> + Send + Sync + 'static,
    {
        self.macros.register(name, f);
    }

    /// Register `mac` when given and return whatever is registered under `name`
    pub fn define_macro(&mut self, name: impl Into<String>, mac: Option<Macro>) -> Option<Macro> {
        self.macros.define(name, mac)
    }

    pub async fn get(&self, name: &str) -> Option<Template> {
        self.source.fetch(name).await
    }

    /// Fetch several templates, returning once all lookups finish
    pub async fn get_all(&self, names: &[String]) -> HashMap<String, Template> {
        self.source.fetch_all(names).await
    }

    /// Render a template against `data`.
    ///
    /// Always yields to the scheduler before doing any work.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(template = template.name().unwrap_or("<inline>"))
    )]
    pub async fn render(
        &self,
        template: &Template,
        data: impl Into<Value>,
    ) -> Result<String, RenderError> {
        let data = data.into();
        tokio::task::yield_now().await;

        if template.is_empty() {
            return Ok(String::new());
        }

        let nodes = self.resolve(template).await?;
        let mut scope = Scope::new(data);
        Ok(Interpreter::new(&self.macros).render(nodes, &mut scope))
    }

    /// Render a template looked up by name
    pub async fn render_named(
        &self,
        name: &str,
        data: impl Into<Value>,
    ) -> Result<String, RenderError> {
        let template = self.get(name).await.ok_or_else(|| RenderError::NotFound {
            name: name.to_string(),
        })?;
        self.render(&template, data).await
    }

    /// Render template text that is not registered
    pub async fn render_source(
        &self,
        source: &str,
        data: impl Into<Value>,
    ) -> Result<String, RenderError> {
        self.render(&Template::new(source), data).await
    }

    /// The template's tree with extends and includes resolved, built once per template
    pub async fn resolve<'t>(&self, template: &'t Template) -> Result<&'t [Node], RenderError> {
        let cell = template.resolved_cell();
        if let Some(nodes) = cell.get() {
            tracing::debug!("using cached template tree");
            return Ok(nodes.as_slice());
        }

        let nodes = cell
            .get_or_try_init(|| async {
                let limits = &self.config.limits;
                let mut sections = SectionOverrides::new();
                let merged =
                    resolve_extends(template.document(), &self.source, &mut sections, limits)
                        .await?;
                resolve_includes(merged, &self.source, limits).await
            })
            .await?;
        Ok(nodes.as_slice())
    }
}
