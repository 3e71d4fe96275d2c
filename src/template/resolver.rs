//! Template resolution - merges parents and inlines included templates
//!
//! Extends are resolved first: the child's sections override the parent's,
//! and content outside sections comes from the outermost parent. Includes are
//! then replaced with the referenced template's tree, in batches, until none
//! remain.

use std::collections::HashMap;
use std::fmt;

use crate::config::Limits;
use crate::parser::ast::{push_node, Document, Node};
use crate::RenderError;

use super::registry::TemplateSource;

/// Section bodies by name, first definition wins
pub type SectionOverrides = HashMap<String, Vec<Node>>;

/// Resolution pass that hit its limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStage {
    Extend,
    Include,
}

impl fmt::Display for ResolutionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionStage::Extend => write!(f, "extend"),
            ResolutionStage::Include => write!(f, "include"),
        }
    }
}

/// Merge `document` with its chain of parents.
///
/// Sections already present in `sections` take precedence over those found
/// in the chain. The result contains no sections.
pub async fn resolve_extends<S>(
    document: &Document,
    source: &S,
    sections: &mut SectionOverrides,
    limits: &Limits,
) -> Result<Vec<Node>, RenderError>
where
    S: TemplateSource + ?Sized,
{
    let mut nodes = document.nodes.clone();
    let mut pending = document.parent().map(str::to_string);
    let mut hops = 0;
    let mut passes = 0;

    loop {
        record_sections(&nodes, sections);

        if let Some(parent) = pending.take() {
            hops += 1;
            if hops > limits.max_extend_depth {
                return Err(limit_error(ResolutionStage::Extend, limits.max_extend_depth));
            }

            let template = source
                .fetch(&parent)
                .await
                .ok_or_else(|| RenderError::MissingParent {
                    parent: parent.clone(),
                })?;
            tracing::debug!(parent = %parent, hop = hops, "extending parent template");

            let parent_document = template.document();
            nodes = parent_document.nodes.clone();
            pending = parent_document.parent().map(str::to_string);
            continue;
        }

        if !has_sections(&nodes) {
            return Ok(nodes);
        }

        passes += 1;
        if passes > limits.max_extend_depth {
            return Err(limit_error(ResolutionStage::Extend, limits.max_extend_depth));
        }
        nodes = rebuild(nodes, &|node| match node {
            Node::Section(section) => Some(
                sections
                    .get(&section.name)
                    .cloned()
                    .unwrap_or_else(|| section.body.clone()),
            ),
            _ => None,
        });
    }
}

/// Replace every include with the named template's tree.
///
/// Missing templates and templates that extend a parent are replaced with
/// nothing.
pub async fn resolve_includes<S>(
    nodes: Vec<Node>,
    source: &S,
    limits: &Limits,
) -> Result<Vec<Node>, RenderError>
where
    S: TemplateSource + ?Sized,
{
    let mut nodes = nodes;
    let mut passes = 0;

    loop {
        let mut names = Vec::new();
        include_names(&nodes, &mut names);
        if names.is_empty() {
            return Ok(nodes);
        }

        passes += 1;
        if passes > limits.max_include_depth {
            return Err(limit_error(ResolutionStage::Include, limits.max_include_depth));
        }

        let fetched = source.fetch_all(&names).await;
        tracing::debug!(
            requested = names.len(),
            found = fetched.len(),
            pass = passes,
            "resolving includes"
        );

        let bodies: HashMap<String, Vec<Node>> = fetched
            .into_iter()
            .filter(|(_, template)| template.extends().is_none())
            .map(|(name, template)| (name, template.document().nodes.clone()))
            .collect();

        nodes = rebuild(nodes, &|node| match node {
            Node::Include(name) => Some(bodies.get(name).cloned().unwrap_or_default()),
            _ => None,
        });
    }
}

fn limit_error(stage: ResolutionStage, limit: usize) -> RenderError {
    RenderError::RecursionLimit { stage, limit }
}

/// Record outermost sections, looking inside blocks and macro bodies
fn record_sections(nodes: &[Node], sections: &mut SectionOverrides) {
    for node in nodes {
        match node {
            Node::Section(section) => {
                sections
                    .entry(section.name.clone())
                    .or_insert_with(|| unnest(&section.name, section.body.clone()));
            }
            Node::Block(block) => {
                record_sections(&block.body, sections);
                if let Some(otherwise) = &block.otherwise {
                    record_sections(otherwise, sections);
                }
            }
            Node::Macro(call) => {
                if let Some(body) = &call.body {
                    record_sections(body, sections);
                }
            }
            _ => {}
        }
    }
}

/// Replace sections named `name` inside its own body with their contents,
/// so an override never contains the section it overrides
fn unnest(name: &str, body: Vec<Node>) -> Vec<Node> {
    rebuild(body, &|node| match node {
        Node::Section(inner) if inner.name == name => Some(unnest(name, inner.body.clone())),
        _ => None,
    })
}

fn has_sections(nodes: &[Node]) -> bool {
    nodes.iter().any(|node| match node {
        Node::Section(_) => true,
        Node::Block(block) => {
            has_sections(&block.body) || block.otherwise.as_deref().is_some_and(has_sections)
        }
        Node::Macro(call) => call.body.as_deref().is_some_and(has_sections),
        _ => false,
    })
}

fn include_names(nodes: &[Node], names: &mut Vec<String>) {
    for node in nodes {
        match node {
            Node::Include(name) => {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
            Node::Block(block) => {
                include_names(&block.body, names);
                if let Some(otherwise) = &block.otherwise {
                    include_names(otherwise, names);
                }
            }
            Node::Section(section) => include_names(&section.body, names),
            Node::Macro(call) => {
                if let Some(body) = &call.body {
                    include_names(body, names);
                }
            }
            _ => {}
        }
    }
}

/// Rebuild a tree, splicing in `replace`'s result wherever it returns one
fn rebuild(nodes: Vec<Node>, replace: &dyn Fn(&Node) -> Option<Vec<Node>>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());

    for node in nodes {
        if let Some(replacement) = replace(&node) {
            for inserted in replacement {
                push_node(&mut out, inserted);
            }
            continue;
        }

        let node = match node {
            Node::Block(mut block) => {
                block.body = rebuild(block.body, replace);
                block.otherwise = block.otherwise.map(|o| rebuild(o, replace));
                Node::Block(block)
            }
            Node::Section(mut section) => {
                section.body = rebuild(section.body, replace);
                Node::Section(section)
            }
            Node::Macro(mut call) => {
                call.body = call.body.map(|b| rebuild(b, replace));
                Node::Macro(call)
            }
            other => other,
        };
        push_node(&mut out, node);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::template::TemplateRegistry;

    fn text(s: &str) -> Node {
        Node::Text(s.to_string())
    }

    async fn extends(registry: &TemplateRegistry, source: &str) -> Result<Vec<Node>, RenderError> {
        let mut sections = SectionOverrides::new();
        resolve_extends(&parse(source), registry, &mut sections, &Limits::default()).await
    }

    #[tokio::test]
    async fn test_root_sections_render_their_body() {
        let registry = TemplateRegistry::new();
        let nodes = extends(&registry, "{{#content}}i am content{{/content}}")
            .await
            .expect("Should resolve");
        assert_eq!(nodes, vec![text("i am content")]);
    }

    #[tokio::test]
    async fn test_child_sections_override_parent() {
        let mut registry = TemplateRegistry::new();
        registry.put("parent", "{{#content}}parentContent{{/content}} otherContent");

        let nodes = extends(
            &registry,
            "{{^parent}}{{#content}}i am content{{/content}} ignoredContent",
        )
        .await
        .expect("Should resolve");
        assert_eq!(nodes, vec![text("i am content otherContent")]);
    }

    #[tokio::test]
    async fn test_sections_inside_blocks_are_replaced() {
        let mut registry = TemplateRegistry::new();
        registry.put("parent", "{{show}}{{#s}}default{{/s}}{{/show}}");

        let nodes = extends(&registry, "{{^parent}}{{#s}}child{{/s}}")
            .await
            .expect("Should resolve");
        let Node::Block(block) = &nodes[0] else {
            panic!("expected block");
        };
        assert_eq!(block.body, vec![text("child")]);
    }

    #[tokio::test]
    async fn test_section_nested_in_same_name_settles() {
        let registry = TemplateRegistry::new();
        let nodes = extends(&registry, "{{#a}}{{#a}}x{{/a}}{{/a}}")
            .await
            .expect("Should resolve");
        assert_eq!(nodes, vec![text("x")]);
    }

    #[tokio::test]
    async fn test_child_override_containing_own_section() {
        let mut registry = TemplateRegistry::new();
        registry.put("p", "<{{#a}}P{{/a}}>");

        let nodes = extends(&registry, "{{^p}}{{#a}}[{{#a}}inner{{/a}}]{{/a}}")
            .await
            .expect("Should resolve");
        assert_eq!(nodes, vec![text("<[inner]>")]);
    }

    #[tokio::test]
    async fn test_mutually_nested_sections_hit_limit() {
        let registry = TemplateRegistry::new();
        let err = extends(&registry, "{{#a}}{{#b}}{{/b}}{{/a}}{{#b}}{{#a}}{{/a}}{{/b}}")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::RecursionLimit {
                stage: ResolutionStage::Extend,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_parent_is_error() {
        let registry = TemplateRegistry::new();
        let err = extends(&registry, "{{^nowhere}}x").await.unwrap_err();
        assert!(matches!(err, RenderError::MissingParent { parent } if parent == "nowhere"));
    }

    #[tokio::test]
    async fn test_extend_cycle_hits_limit() {
        let mut registry = TemplateRegistry::new();
        registry.put("a", "{{^b}}");
        registry.put("b", "{{^a}}");

        let err = extends(&registry, "{{^a}}").await.unwrap_err();
        assert!(matches!(
            err,
            RenderError::RecursionLimit {
                stage: ResolutionStage::Extend,
                limit: 32
            }
        ));
    }

    #[tokio::test]
    async fn test_includes_inline_and_skip() {
        let mut registry = TemplateRegistry::new();
        registry.put("inc", "[{{=x}}]");
        registry.put("page", "{{^layout}}");

        let nodes = resolve_includes(
            parse("a{{+inc}}b{{+page}}c{{+missing}}d").nodes,
            &registry,
            &Limits::default(),
        )
        .await
        .expect("Should resolve");
        assert_eq!(
            nodes,
            vec![
                text("a["),
                Node::Value {
                    key: "x".to_string(),
                    escape: false
                },
                text("]bcd"),
            ]
        );
    }

    #[tokio::test]
    async fn test_nested_includes() {
        let mut registry = TemplateRegistry::new();
        registry.put("outer", "<{{+inner}}>");
        registry.put("inner", "in");

        let nodes = resolve_includes(parse("{{+outer}}").nodes, &registry, &Limits::default())
            .await
            .expect("Should resolve");
        assert_eq!(nodes, vec![text("<in>")]);
    }

    #[tokio::test]
    async fn test_include_cycle_hits_limit() {
        let mut registry = TemplateRegistry::new();
        registry.put("loop", "x{{+loop}}");

        let limits = Limits::default().with_max_include_depth(4);
        let err = resolve_includes(parse("{{+loop}}").nodes, &registry, &limits)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::RecursionLimit {
                stage: ResolutionStage::Include,
                limit: 4
            }
        ));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(ResolutionStage::Include.to_string(), "include");
    }
}
