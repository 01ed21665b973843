//! AST construction from the filtered token stream.
//!
//! `if` and `for` tags open frames that close at the matching `end`; an
//! `else` inside an `if` frame terminates the if-branch and collects the
//! else-branch as an [`Node::Else`] child. Stray `else`/`end` tags and
//! frames left open at end of input are errors.

use crate::error::TemplateError;
use crate::template::condition::ConditionalExpression;
use crate::template::lexer::Token;
use crate::template::tag::Tag;

/// A node in the template tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Variable {
        path: Vec<String>,
        transformers: Vec<String>,
    },
    If {
        condition: ConditionalExpression,
        children: Vec<Node>,
    },
    /// Only ever appears among the children of an [`Node::If`].
    Else {
        children: Vec<Node>,
    },
    For {
        variable: String,
        sequence: Vec<String>,
        children: Vec<Node>,
    },
    Import {
        file: String,
    },
}

/// Parses a filtered token stream into a node list.
pub fn parse(tokens: &[Token]) -> Result<Vec<Node>, TemplateError> {
    let mut pos = 0;
    parse_nodes(tokens, &mut pos, 0)
}

fn parse_nodes(
    tokens: &[Token],
    pos: &mut usize,
    level: usize,
) -> Result<Vec<Node>, TemplateError> {
    let mut nodes = Vec::new();

    while *pos < tokens.len() {
        match &tokens[*pos] {
            Token::Text(s) | Token::Whitespace(s) => {
                nodes.push(Node::Text(s.clone()));
                *pos += 1;
            }
            Token::Newline => {
                nodes.push(Node::Text("\n".to_string()));
                *pos += 1;
            }
            Token::Tag(tag) => match tag {
                Tag::Variable { path, transformers } => {
                    nodes.push(Node::Variable {
                        path: path.clone(),
                        transformers: transformers.clone(),
                    });
                    *pos += 1;
                }
                Tag::Import { file } => {
                    nodes.push(Node::Import { file: file.clone() });
                    *pos += 1;
                }
                Tag::If(condition) => {
                    let condition = condition.clone();
                    *pos += 1;
                    let children = parse_nodes(tokens, pos, level + 1)?;
                    nodes.push(Node::If {
                        condition,
                        children,
                    });
                }
                Tag::For { variable, sequence } => {
                    let (variable, sequence) = (variable.clone(), sequence.clone());
                    *pos += 1;
                    let children = parse_nodes(tokens, pos, level + 1)?;
                    nodes.push(Node::For {
                        variable,
                        sequence,
                        children,
                    });
                }
                Tag::Else => {
                    if level == 0 {
                        return Err(TemplateError::UnbalancedTag("else".to_string()));
                    }
                    // The else-branch parses up to the shared `end`, then
                    // this frame returns with the branch attached.
                    *pos += 1;
                    let children = parse_nodes(tokens, pos, level)?;
                    nodes.push(Node::Else { children });
                    return Ok(nodes);
                }
                Tag::End => {
                    if level == 0 {
                        return Err(TemplateError::UnbalancedTag("end".to_string()));
                    }
                    *pos += 1;
                    return Ok(nodes);
                }
            },
        }
    }

    if level > 0 {
        return Err(TemplateError::UnclosedBlock);
    }
    Ok(nodes)
}
