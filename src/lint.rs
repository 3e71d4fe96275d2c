//! Lint pass for detecting directive defects in templates.
//!
//! Rendering never fails on a malformed directive: it is emitted as literal
//! text. This module reports those spots so authors can find them.

use std::fmt;

use ariadne::{Color, Label, Report, ReportKind, Source};

use crate::parser::ast::Span;

/// A lint warning about a directive defect
#[derive(Debug, Clone, PartialEq)]
pub struct LintWarning {
    pub category: LintCategory,
    pub message: String,
    pub span: Span,
}

/// Category of lint defect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintCategory {
    /// Tag contents match no directive form
    Malformed,
    /// Block or section opener without a closer
    Unclosed,
    /// Closer without a matching opener
    UnmatchedClose,
    /// `{{:key}}` outside a block opened with the same key
    UnmatchedElse,
    /// `{{^name}}` that does not open the template
    MisplacedExtend,
}

impl fmt::Display for LintCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintCategory::Malformed => write!(f, "malformed"),
            LintCategory::Unclosed => write!(f, "unclosed"),
            LintCategory::UnmatchedClose => write!(f, "unmatched-close"),
            LintCategory::UnmatchedElse => write!(f, "unmatched-else"),
            LintCategory::MisplacedExtend => write!(f, "misplaced-extend"),
        }
    }
}

impl LintWarning {
    pub fn new(category: LintCategory, message: impl Into<String>, span: Span) -> Self {
        Self {
            category,
            message: message.into(),
            span,
        }
    }

    /// Format the warning with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Warning, filename, self.span.start)
            .with_message(format!("{}: {}", self.category, self.message))
            .with_label(
                Label::new((filename, self.span.clone()))
                    .with_message(&self.message)
                    .with_color(Color::Yellow),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);
        if written.is_err() {
            return format!("{}: {}", self.category, self.message);
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

/// Run all lint checks on template source.
pub fn check(source: &str) -> Vec<LintWarning> {
    crate::parser::parse_with_warnings(source).1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(source: &str) -> Vec<LintCategory> {
        check(source).into_iter().map(|w| w.category).collect()
    }

    #[test]
    fn test_clean_template() {
        assert!(check("{{@list}}{{=val}}{{/list}} {{%name}}").is_empty());
    }

    #[test]
    fn test_malformed_tag() {
        let warnings = check("a {{=}} b");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].category, LintCategory::Malformed);
        assert_eq!(warnings[0].span, 2..7);
    }

    #[test]
    fn test_unclosed_block() {
        assert_eq!(categories("{{@list}}{{=val}}"), vec![LintCategory::Unclosed]);
    }

    #[test]
    fn test_unmatched_close() {
        assert_eq!(categories("text{{/list}}"), vec![LintCategory::UnmatchedClose]);
    }

    #[test]
    fn test_unmatched_else() {
        assert_eq!(
            categories("{{a}}x{{:b}}y{{/a}}"),
            vec![LintCategory::UnmatchedElse]
        );
    }

    #[test]
    fn test_misplaced_extend() {
        assert_eq!(
            categories("hello {{^layout}}"),
            vec![LintCategory::MisplacedExtend]
        );
        assert!(check("  {{^layout}}{{#a}}x{{/a}}").is_empty());
    }

    #[test]
    fn test_self_closing_macro_is_clean() {
        assert!(check("{{ year() }} and more").is_empty());
    }

    #[test]
    fn test_category_display() {
        assert_eq!(LintCategory::UnmatchedElse.to_string(), "unmatched-else");
    }

    #[test]
    fn test_format_mentions_category() {
        let source = "{{#main}}body";
        let warnings = check(source);
        let report = warnings[0].format(source, "page.html");
        assert!(report.contains("unclosed"));
        assert!(report.contains("main"));
    }
}
