//! Directive tree evaluation
//!
//! Walks a resolved tree and produces output text, binding values from the
//! current [`Scope`]. Evaluation never fails: missing data renders empty and
//! failing macros fall back to their body.

use std::panic::{self, AssertUnwindSafe};

use crate::macros::{MacroContext, MacroError, MacroRegistry};
use crate::parser::ast::{Block, BlockKind, MacroArg, MacroCall, Node};
use crate::scope::{escape, Scope};
use crate::value::Value;

pub struct Interpreter<'a> {
    macros: &'a MacroRegistry,
}

impl<'a> Interpreter<'a> {
    pub fn new(macros: &'a MacroRegistry) -> Self {
        Self { macros }
    }

    /// Evaluate `nodes` against `scope`
    pub fn render(&self, nodes: &[Node], scope: &mut Scope) -> String {
        let mut out = String::new();
        self.render_into(nodes, scope, &mut out);
        out
    }

    fn render_into(&self, nodes: &[Node], scope: &mut Scope, out: &mut String) {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Value { key, escape } => self.render_value(key, *escape, scope, out),
                Node::Block(block) => self.render_block(block, scope, out),
                // Only reachable through MacroContext::parse, which skips resolution
                Node::Section(section) => self.render_into(&section.body, scope, out),
                Node::Include(_) => {}
                Node::Macro(call) => self.render_macro(call, scope, out),
            }
        }
    }

    fn render_value(&self, key: &str, escaped: bool, scope: &Scope, out: &mut String) {
        let value = scope.get(key);
        // Zero prints, except as a length
        let zero = value.is_zero() && !key.ends_with(".length");
        if !value.is_truthy() && !zero {
            return;
        }
        if escaped {
            out.push_str(&escape(&value));
        } else {
            out.push_str(&value.to_string());
        }
    }

    fn render_block(&self, block: &Block, scope: &mut Scope, out: &mut String) {
        let value = scope.get(&block.key);

        if !value.is_truthy() {
            match (&block.kind, &block.otherwise) {
                (BlockKind::Negated, _) => self.render_into(&block.body, scope, out),
                (_, Some(otherwise)) => self.render_into(otherwise, scope, out),
                _ => {}
            }
            return;
        }

        match block.kind {
            BlockKind::Conditional => self.render_into(&block.body, scope, out),
            BlockKind::Negated => {}
            BlockKind::Enumerate => match value {
                Value::Sequence(items) => {
                    for (i, item) in items.into_iter().enumerate() {
                        let context = Value::mapping([
                            ("i", Value::from(i)),
                            ("n", Value::from(i + 1)),
                            ("val", item),
                        ]);
                        scope.scoped(context, |s| self.render_into(&block.body, s, out));
                    }
                }
                Value::Mapping(entries) => {
                    for (key, val) in entries {
                        let context = Value::mapping([("key", Value::from(key)), ("val", val)]);
                        scope.scoped(context, |s| self.render_into(&block.body, s, out));
                    }
                }
                _ => {}
            },
            BlockKind::ScopeShift => match value {
                Value::Sequence(items) => {
                    for item in items {
                        scope.scoped(item, |s| self.render_into(&block.body, s, out));
                    }
                }
                other => scope.scoped(other, |s| self.render_into(&block.body, s, out)),
            },
        }
    }

    fn render_macro(&self, call: &MacroCall, scope: &mut Scope, out: &mut String) {
        let args: Vec<Value> = call
            .args
            .iter()
            .map(|arg| match arg {
                MacroArg::Literal(s) => Value::String(s.clone()),
                MacroArg::Key(key) => scope.get(key),
            })
            .collect();

        let result = match self.macros.get(&call.name) {
            Some(mac) => {
                // A panic can unwind out of a nested scope shift
                let saved = scope.data().clone();
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    let mut ctx = MacroContext::new(scope, self.macros);
                    mac.call(&mut ctx, &args)
                }));
                outcome.unwrap_or_else(|_| {
                    scope.replace(saved);
                    Err(MacroError::Panicked {
                        name: call.name.clone(),
                    })
                })
            }
            None => Err(MacroError::NotRegistered {
                name: call.name.clone(),
            }),
        };

        match result {
            Ok(text) => out.push_str(&text),
            Err(err) => {
                tracing::debug!(name = %call.name, error = %err, "macro failed, rendering body");
                if let Some(body) = &call.body {
                    self.render_into(body, scope, out);
                }
            }
        }
    }
}
