//! User-defined macros
//!
//! A macro is a named closure invoked from `{{ name(args) }}`. It receives a
//! [`MacroContext`] over the current scope and the resolved arguments. When a
//! macro fails the directive's body is rendered in its place.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::interpreter::Interpreter;
use crate::parser;
use crate::scope::{self, Scope};
use crate::value::Value;

/// Errors returned by macros
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MacroError {
    #[error("Macro '{name}' is not registered")]
    NotRegistered { name: String },
    #[error("Macro '{name}' panicked")]
    Panicked { name: String },
    #[error("{0}")]
    Failed(String),
}

impl MacroError {
    pub fn msg(message: impl fmt::Display) -> Self {
        MacroError::Failed(message.to_string())
    }
}

type MacroFn = dyn Fn(&mut MacroContext<'_>, &[Value]) -> Result<String, MacroError> + Send + Sync;

/// A registered macro
#[derive(Clone)]
pub struct Macro(Arc<MacroFn>);

impl Macro {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut MacroContext<'_>, &[Value]) -> Result<String, MacroError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, ctx: &mut MacroContext<'_>, args: &[Value]) -> Result<String, MacroError> {
        (self.0)(ctx, args)
    }
}

impl fmt::Debug for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Macro(..)")
    }
}

/// Registry of macros by name
#[derive(Debug, Clone, Default)]
pub struct MacroRegistry {
    macros: HashMap<String, Macro>,
}

impl MacroRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure, replacing any macro of the same name
    pub fn register<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&mut MacroContext<'_>, &[Value]) -> Result<String, MacroError> + Send + Sync + 'static,
    {
        self.macros.insert(name.into(), Macro::new(f));
    }

    /// Register `mac` when given and return whatever is registered under `name`
    pub fn define(&mut self, name: impl Into<String>, mac: Option<Macro>) -> Option<Macro> {
        let name = name.into();
        if let Some(mac) = mac {
            self.macros.insert(name.clone(), mac);
        }
        self.macros.get(&name).cloned()
    }

    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.macros.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Macro> {
        self.macros.remove(name)
    }

    pub fn clear(&mut self) {
        self.macros.clear();
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.macros.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}

/// What a macro sees of the render it was called from
pub struct MacroContext<'a> {
    scope: &'a mut Scope,
    macros: &'a MacroRegistry,
}

impl<'a> MacroContext<'a> {
    pub fn new(scope: &'a mut Scope, macros: &'a MacroRegistry) -> Self {
        Self { scope, macros }
    }

    /// The current data context
    pub fn data(&self) -> &Value {
        self.scope.data()
    }

    /// Resolve a dotted key in the current context
    pub fn get(&self, key: &str) -> Value {
        self.scope.get(key)
    }

    /// Render template text against the current context.
    ///
    /// Includes and extends are not resolved here.
    pub fn parse(&mut self, text: &str) -> String {
        let nodes = parser::parse_fragment(text);
        Interpreter::new(self.macros).render(&nodes, self.scope)
    }

    pub fn escape(&self, value: &Value) -> String {
        scope::escape(value)
    }

    pub fn trim(&self, s: &str) -> String {
        scope::trim(s)
    }
}
