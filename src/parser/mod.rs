//! Parser for template directives

pub mod ast;
mod grammar;
pub mod lexer;
mod tree;

pub use ast::*;
pub use grammar::{parse_tag, Tag};
pub use tree::{parse, parse_fragment, parse_with_warnings};
