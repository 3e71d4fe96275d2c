//! Template storage and resolution
//!
//! Templates reference each other by name. A child declares its parent with
//! a leading `{{^parent}}` and overrides the parent's `{{#name}}` sections;
//! `{{+name}}` inlines another template at that position.
//!
//! ```text
//! layout:  <main>{{#content}}default{{/content}}</main>{{+footer}}
//! page:    {{^layout}}{{#content}}Hello {{=user}}{{/content}}
//! ```
//!
//! Lookups go through [`TemplateSource`], implemented by the in-memory
//! [`TemplateRegistry`] and the filesystem-backed [`DirectorySource`].

mod directory;
mod registry;
mod resolver;

pub use directory::DirectorySource;
pub use registry::{Template, TemplateRegistry, TemplateSource};
pub use resolver::{resolve_extends, resolve_includes, ResolutionStage, SectionOverrides};
