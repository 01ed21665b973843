//! Template renderer: walks the node tree and produces output text.
//!
//! The renderer resolves variable paths against a [`Context`], applies
//! transformers, evaluates conditionals, iterates sequences with shadowed
//! loop contexts, and re-enters the full lex/parse/render pipeline for
//! `import` tags. Imports always resolve against the renderer's root
//! directory, never against the importing file.

use std::fs;
use std::path::Path;

use crate::error::TemplateError;
use crate::template::context::{Context, Value};
use crate::template::lexer::{self, Delimiters};
use crate::template::parser::{self, Node};

/// Maximum import depth; breaks import cycles with an explicit error.
const MAX_IMPORT_DEPTH: usize = 16;

/// The template renderer.
pub struct Renderer<'a> {
    /// Directory against which `import` paths resolve.
    root: &'a Path,
    delimiters: &'a Delimiters,
    depth: usize,
}

impl<'a> Renderer<'a> {
    pub fn new(root: &'a Path, delimiters: &'a Delimiters) -> Self {
        Self {
            root,
            delimiters,
            depth: 0,
        }
    }

    /// Renders a node list against a context, concatenating node outputs.
    pub fn render(&self, nodes: &[Node], context: &Context) -> Result<String, TemplateError> {
        let mut out = String::new();
        self.render_nodes(nodes, context, &mut out)?;
        Ok(out)
    }

    fn render_nodes(
        &self,
        nodes: &[Node],
        context: &Context,
        out: &mut String,
    ) -> Result<(), TemplateError> {
        for node in nodes {
            self.render_node(node, context, out)?;
        }
        Ok(())
    }

    fn render_node(
        &self,
        node: &Node,
        context: &Context,
        out: &mut String,
    ) -> Result<(), TemplateError> {
        match node {
            Node::Text(text) => out.push_str(text),

            Node::Variable { path, transformers } => {
                let mut value = context.resolve(path);
                for name in transformers {
                    value = apply_transformer(context, name, value);
                }
                if !matches!(value, Value::Null) {
                    out.push_str(&value.to_display_string());
                }
            }

            Node::If {
                condition,
                children,
            } => {
                if condition.evaluate(context) {
                    for child in children {
                        if matches!(child, Node::Else { .. }) {
                            continue;
                        }
                        self.render_node(child, context, out)?;
                    }
                } else if let Some(Node::Else { children }) = children
                    .iter()
                    .find(|child| matches!(child, Node::Else { .. }))
                {
                    self.render_nodes(children, context, out)?;
                }
            }

            // Only meaningful inside an `if`; handled there.
            Node::Else { .. } => {}

            Node::For {
                variable,
                sequence,
                children,
            } => {
                if let Value::List(items) = context.resolve(sequence) {
                    for item in items {
                        let shadowed = context.child_with(variable, item);
                        self.render_nodes(children, &shadowed, out)?;
                    }
                }
            }

            Node::Import { file } => {
                if self.depth + 1 > MAX_IMPORT_DEPTH {
                    return Err(TemplateError::ImportDepthExceeded(MAX_IMPORT_DEPTH));
                }
                let path = self.root.join(file);
                let source =
                    fs::read_to_string(&path).map_err(|e| TemplateError::ImportFailed {
                        file: file.clone(),
                        message: e.to_string(),
                    })?;
                let tokens = lexer::tokenize(&source, self.delimiters)?;
                let nodes = parser::parse(&lexer::filter_newlines(tokens))?;
                let nested = Renderer {
                    root: self.root,
                    delimiters: self.delimiters,
                    depth: self.depth + 1,
                };
                out.push_str(&nested.render(&nodes, context)?);
            }
        }
        Ok(())
    }
}

/// Looks up `name` in the context and applies it if it is a transformer.
/// Unknown names are a no-op, and transformers are identity on non-strings.
fn apply_transformer(context: &Context, name: &str, value: Value) -> Value {
    match (context.get(name), &value) {
        (Some(Value::Transformer(transform)), Value::String(s)) => {
            Value::String(transform(s))
        }
        _ => value,
    }
}
