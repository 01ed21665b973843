//! Template engine for `<{ }>` tag syntax.
//!
//! Template text is lexed into tokens, newlines adjacent to standalone
//! block tags are elided, the tokens are parsed into a node tree, and the
//! tree is rendered against a dynamic context.
//!
//! # Template Syntax
//!
//! - Variable: `<{ [#transformer]* path.to.value }>`
//! - Conditional: `<{ if <condition> }>` … `<{ else }>` … `<{ end }>`
//! - Loop: `<{ for item in path.to.seq }>` … `<{ end }>`
//! - Import: `<{ import "path/relative/to/root" }>`
//!
//! # Example
//!
//! ```text
//! Hello <{ #uppercasingFirstLetter name }>!
//! <{ if packages }>
//! Dependencies:
//! <{ for package in packages }>
//! - <{ package.name }>
//! <{ end }>
//! <{ end }>
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use bootstrapp::template::{Context, TemplateEngine, Value};
//!
//! let engine = TemplateEngine::new("templates");
//! let mut context = Context::new();
//! context.set("name", Value::String("world".into()));
//! let output = engine.render("Hello <{ name }>!", &context)?;
//! ```

pub mod condition;
pub mod context;
pub mod lexer;
pub mod parser;
pub mod renderer;
pub mod scanner;
pub mod tag;
pub mod transformers;

use std::path::{Path, PathBuf};

use crate::error::TemplateError;

pub use condition::{parse_condition, CompareOp, ConditionalExpression};
pub use context::{Context, Value};
pub use lexer::{Delimiters, Token};
pub use parser::Node;
pub use tag::Tag;

/// The template engine facade: lex → elide → parse → render.
pub struct TemplateEngine {
    delimiters: Delimiters,
    root: PathBuf,
}

impl TemplateEngine {
    /// Creates an engine whose `import` tags resolve against `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            delimiters: Delimiters::default(),
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Renders template source against a user context.
    ///
    /// The effective context is the built-in transformers overlaid with the
    /// user's bindings; user entries win on collision.
    pub fn render(&self, source: &str, context: &Context) -> Result<String, TemplateError> {
        let effective = transformers::builtins().merged_with(context);
        let tokens = lexer::tokenize(source, &self.delimiters)?;
        let nodes = parser::parse(&lexer::filter_newlines(tokens))?;
        renderer::Renderer::new(&self.root, &self.delimiters).render(&nodes, &effective)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_with_default_delimiters() {
        let engine = TemplateEngine::new(".");
        let mut context = Context::new();
        context.set("name", Value::String("World".into()));
        let output = engine.render("Hello <{ name }>!", &context).unwrap();
        assert_eq!(output, "Hello World!");
    }

    #[test]
    fn test_render_with_custom_delimiters() {
        let engine = TemplateEngine::new(".").with_delimiters(Delimiters {
            open: "{{".into(),
            close: "}}".into(),
        });
        let mut context = Context::new();
        context.set("name", Value::String("World".into()));
        let output = engine.render("Hello {{ name }}, not <{ name }>", &context).unwrap();
        assert_eq!(output, "Hello World, not <{ name }>");
    }

    #[test]
    fn test_syntax_error_surfaces() {
        let engine = TemplateEngine::new(".");
        assert!(engine.render("<{ if }>x<{ end }>", &Context::new()).is_err());
    }
}
