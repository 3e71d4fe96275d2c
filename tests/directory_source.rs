//! Integration tests for rendering from a template directory

use std::fs;

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

use tplus::{DirectorySource, Engine, EngineConfig, RenderError, TemplateSource};

fn write(dir: &TempDir, name: &str, content: &str) {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Should create directory");
    }
    fs::write(path, content).expect("Should write template");
}

#[tokio::test]
async fn test_extends_and_includes_from_disk() {
    let dir = TempDir::new().expect("Should create temp dir");
    write(&dir, "layout.html", "<main>{{#body}}{{/body}}</main>{{+partials/footer}}");
    write(&dir, "partials/footer.html", "<footer>{{=year}}</footer>");

    let engine = Engine::with_source(DirectorySource::new(dir.path()).with_extension("html"));
    let html = engine
        .render_source("{{^layout}}{{#body}}Hello{{/body}}", json!({"year": 2015}))
        .await
        .expect("Should render");

    assert_eq!(html, "<main>Hello</main><footer>2015</footer>");
}

#[tokio::test]
async fn test_missing_parent_file() {
    let dir = TempDir::new().expect("Should create temp dir");
    let engine = Engine::with_source(DirectorySource::new(dir.path()));

    let err = engine
        .render_source("{{^nowhere}}", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, RenderError::MissingParent { parent } if parent == "nowhere"));
}

#[tokio::test]
async fn test_render_named_from_disk() {
    let dir = TempDir::new().expect("Should create temp dir");
    write(&dir, "greeting.txt", "Hi {{%name}}");

    let engine = Engine::with_source(DirectorySource::new(dir.path()).with_extension("txt"));
    let out = engine
        .render_named("greeting", json!({"name": "<ada>"}))
        .await
        .expect("Should render");
    assert_eq!(out, "Hi &lt;ada&gt;");
}

#[tokio::test]
async fn test_loaded_templates_are_kept() {
    let dir = TempDir::new().expect("Should create temp dir");
    write(&dir, "a", "first");

    let source = DirectorySource::new(dir.path());
    let first = source.fetch("a").await.expect("Should load");
    write(&dir, "a", "second");

    let again = source.fetch("a").await.expect("Should load");
    assert_eq!(again.source(), first.source());

    source.reload().await;
    let reloaded = source.fetch("a").await.expect("Should load");
    assert_eq!(reloaded.source(), "second");
}

#[tokio::test]
async fn test_escaping_names_are_rejected() {
    let dir = TempDir::new().expect("Should create temp dir");
    write(&dir, "inner/page", "{{+sub/../../secret}}ok");
    fs::write(dir.path().join("secret"), "leaked").expect("Should write");

    let source = DirectorySource::new(dir.path().join("inner"));
    assert!(source.fetch("../secret").await.is_none());

    let engine = Engine::with_source(source);
    let out = engine.render_named("page", json!({})).await.expect("Should render");
    assert_eq!(out, "ok");
}

#[tokio::test]
async fn test_from_config() {
    let dir = TempDir::new().expect("Should create temp dir");
    write(&dir, "nav.tpl", "<nav/>");

    let config = EngineConfig::new()
        .with_template_dir(dir.path())
        .with_extension("tpl");
    let engine = Engine::with_source(DirectorySource::from_config(&config.templates))
        .with_config(config);

    let out = engine
        .render_source("{{+nav}}", json!({}))
        .await
        .expect("Should render");
    assert_eq!(out, "<nav/>");
}
