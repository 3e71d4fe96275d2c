//! Filesystem-backed template source

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::DirectoryConfig;

use super::registry::{Template, TemplateSource};

/// Loads templates from files under a root directory.
///
/// `partials/header` maps to `<root>/partials/header`, plus the configured
/// extension when the name has none. Loaded templates are kept, so their
/// resolution caches survive across renders.
#[derive(Debug)]
pub struct DirectorySource {
    root: PathBuf,
    extension: Option<String>,
    loaded: RwLock<HashMap<String, Template>>,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: None,
            loaded: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    /// Build from the `[templates]` table; the root defaults to the working directory
    pub fn from_config(config: &DirectoryConfig) -> Self {
        let root = config.dir.clone().unwrap_or_else(|| PathBuf::from("."));
        Self {
            root,
            extension: config.extension.clone(),
            loaded: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path for a template name, or `None` if the name escapes the root
    pub fn path_for(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name);
        let inside = !name.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !inside {
            return None;
        }

        let mut path = self.root.join(relative);
        if let Some(extension) = &self.extension {
            if path.extension().is_none() {
                path.set_extension(extension);
            }
        }
        Some(path)
    }

    /// Forget loaded templates so the next fetch rereads them
    pub async fn reload(&self) {
        self.loaded.write().await.clear();
    }
}

#[async_trait]
impl TemplateSource for DirectorySource {
    async fn fetch(&self, name: &str) -> Option<Template> {
        if let Some(template) = self.loaded.read().await.get(name) {
            return Some(template.clone());
        }

        let Some(path) = self.path_for(name) else {
            tracing::warn!(name, "rejected template name outside the template directory");
            return None;
        };

        let source = match tokio::fs::read_to_string(&path).await {
            Ok(source) => source,
            Err(err) => {
                tracing::debug!(name, path = %path.display(), error = %err, "template not loaded");
                return None;
            }
        };
        tracing::debug!(name, path = %path.display(), "loaded template");

        let mut loaded = self.loaded.write().await;
        let template = loaded
            .entry(name.to_string())
            .or_insert_with(|| Template::named(name, source));
        Some(template.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_for_appends_extension() {
        let source = DirectorySource::new("/srv/views").with_extension("html");
        assert_eq!(
            source.path_for("partials/header"),
            Some(PathBuf::from("/srv/views/partials/header.html"))
        );
        assert_eq!(
            source.path_for("page.txt"),
            Some(PathBuf::from("/srv/views/page.txt"))
        );
    }

    #[test]
    fn test_path_for_rejects_escapes() {
        let source = DirectorySource::new("views");
        assert!(source.path_for("../secret").is_none());
        assert!(source.path_for("a/../../b").is_none());
        assert!(source.path_for("/etc/passwd").is_none());
        assert!(source.path_for("").is_none());
    }

    #[test]
    fn test_from_config() {
        let config = DirectoryConfig {
            dir: None,
            extension: Some("tpl".to_string()),
        };
        let source = DirectorySource::from_config(&config);
        assert_eq!(source.root(), Path::new("."));
        assert_eq!(source.path_for("x"), Some(PathBuf::from("./x.tpl")));
    }
}
