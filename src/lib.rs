//! tplus - A text-templating engine with inheritance, includes and macros
//!
//! Templates are plain text with `{{ ... }}` directives. Rendering parses the
//! template, merges it with its parent chain, inlines included templates and
//! then evaluates the result against a data context.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use tplus::Engine;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut engine = Engine::new();
//!     engine.put("layout", "<h1>{{#title}}Untitled{{/title}}</h1>{{#body}}{{/body}}");
//!
//!     let page = "{{^layout}}{{#body}}{{@items}}<li>{{%val}}</li>{{/items}}{{/body}}";
//!     let html = engine
//!         .render_source(page, json!({ "items": ["a", "<b>"] }))
//!         .await
//!         .unwrap();
//!
//!     assert_eq!(html, "<h1>Untitled</h1><li>a</li><li>&lt;b&gt;</li>");
//! }
//! ```
//!
//! # Directives
//!
//! | Form | Meaning |
//! |---|---|
//! | `{{=key}}` / `{{%key}}` | value, raw / HTML-escaped |
//! | `{{key}}..{{:key}}..{{/key}}` | conditional with optional else |
//! | `{{!key}}..{{/key}}` | negated conditional |
//! | `{{@key}}..{{/key}}` | loop over a sequence (`i`, `n`, `val`) or mapping (`key`, `val`) |
//! | `{{>key}}..{{/key}}` | evaluate the body with `key` as the context |
//! | `{{^name}}` | extend a parent template (first directive only) |
//! | `{{#name}}..{{/name}}` | overridable section |
//! | `{{+name}}` | include another template |
//! | `{{name(args)}}..{{/name}}` | macro call with optional fallback body |

pub mod config;
pub mod engine;
pub mod error;
pub mod interpreter;
pub mod lint;
pub mod macros;
pub mod parser;
pub mod scope;
pub mod template;
pub mod value;

pub use config::{ConfigError, EngineConfig, Limits};
pub use engine::Engine;
pub use error::ParseError;
pub use lint::{LintCategory, LintWarning};
pub use macros::{Macro, MacroContext, MacroError, MacroRegistry};
pub use parser::{parse, Document};
pub use template::{DirectorySource, ResolutionStage, Template, TemplateRegistry, TemplateSource};
pub use value::{Computed, DataError, Value};

use thiserror::Error;

/// Errors that can occur during the render pipeline
#[derive(Debug, Error)]
pub enum RenderError {
    /// A template extends a parent that cannot be found
    #[error("parent template not found: {parent}")]
    MissingParent { parent: String },

    /// A named template cannot be found
    #[error("template not found: {name}")]
    NotFound { name: String },

    /// Resolution did not settle, usually because of a reference cycle
    #[error("{stage} resolution exceeded {limit} passes")]
    RecursionLimit {
        stage: ResolutionStage,
        limit: usize,
    },
}

/// Render template text with a default engine
///
/// This is a convenience function. Use [`Engine`] to register templates and
/// macros.
pub async fn render(source: &str, data: impl Into<Value>) -> Result<String, RenderError> {
    Engine::new().render_source(source, data).await
}
