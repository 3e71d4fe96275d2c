//! Key resolution against the current data context

use crate::value::Value;

/// The data context a template is evaluated against.
///
/// Loops and scope-shifted blocks swap the data in and out with
/// [`Scope::scoped`]; the enclosing context is always restored.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    data: Value,
}

impl Scope {
    pub fn new(data: impl Into<Value>) -> Self {
        Self { data: data.into() }
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Swap in `data` as the current context, returning the previous one
    pub fn replace(&mut self, data: Value) -> Value {
        std::mem::replace(&mut self.data, data)
    }

    /// Resolve a dotted key in the current context
    pub fn get(&self, key: &str) -> Value {
        resolve(&self.data, key)
    }

    /// Run `f` with `data` as the current context
    pub fn scoped<R>(&mut self, data: Value, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.replace(data);
        let result = f(self);
        self.replace(saved);
        result
    }
}

/// Resolve a dotted key path such as `data.nested.content`.
///
/// Mappings are indexed by key, sequences by position or `length`, strings by
/// `length`. A computed value in the final position is called with the value
/// holding it. Missing and null results come back as an empty string.
pub fn resolve(context: &Value, key: &str) -> Value {
    let segments: Vec<&str> = key.split('.').collect();
    walk(context, &segments)
        .filter(|value| !value.is_null())
        .unwrap_or_else(|| Value::String(String::new()))
}

fn walk(holder: &Value, segments: &[&str]) -> Option<Value> {
    let (segment, rest) = segments.split_first()?;

    match holder {
        Value::Mapping(entries) => step(holder, entries.get(*segment)?, rest),
        Value::Sequence(items) if *segment == "length" => {
            rest.is_empty().then(|| Value::from(items.len()))
        }
        Value::Sequence(items) => {
            let index: usize = segment.parse().ok()?;
            step(holder, items.get(index)?, rest)
        }
        Value::String(s) if *segment == "length" => {
            rest.is_empty().then(|| Value::from(s.chars().count()))
        }
        _ => None,
    }
}

fn step(holder: &Value, value: &Value, rest: &[&str]) -> Option<Value> {
    match value {
        Value::Computed(computed) if rest.is_empty() => Some(computed.call(holder)),
        Value::Computed(_) => None,
        _ if rest.is_empty() => Some(value.clone()),
        _ => walk(value, rest),
    }
}

/// HTML-escape the text form of a value
pub fn escape(value: &Value) -> String {
    let text = value.to_string();
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn trim(s: &str) -> String {
    s.trim().to_string()
}

pub fn trim_all<S: AsRef<str>>(strs: &[S]) -> Vec<String> {
    strs.iter().map(|s| trim(s.as_ref())).collect()
}
