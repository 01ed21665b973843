//! Parser for a single tag body (the text between delimiters).
//!
//! Dispatches on a leading keyword: `if`, `for`, `else`, `end`, `import`.
//! Anything else is a variable reference with optional `#transformer`
//! prefixes. Trailing non-whitespace after a complete tag body is an error.

use crate::error::TemplateError;
use crate::template::condition::{self, ConditionalExpression};
use crate::template::scanner::Scanner;

/// A parsed tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    If(ConditionalExpression),
    For {
        variable: String,
        sequence: Vec<String>,
    },
    Else,
    End,
    Import {
        file: String,
    },
    Variable {
        path: Vec<String>,
        transformers: Vec<String>,
    },
}

impl Tag {
    /// Block tags participate in newline elision; variables do not.
    pub fn is_block(&self) -> bool {
        !matches!(self, Tag::Variable { .. })
    }
}

/// Parses a tag body into a [`Tag`].
pub fn parse_tag(body: &str) -> Result<Tag, TemplateError> {
    let mut scanner = Scanner::new(body);
    scanner.skip_whitespace();

    if scanner.take_keyword("if") {
        let condition = condition::parse_condition(remainder(&scanner, body))?;
        return Ok(Tag::If(condition));
    }
    if scanner.take_keyword("for") {
        return parse_for(&mut scanner);
    }
    if scanner.take_keyword("else") {
        require_end(&mut scanner, "else")?;
        return Ok(Tag::Else);
    }
    if scanner.take_keyword("end") {
        require_end(&mut scanner, "end")?;
        return Ok(Tag::End);
    }
    if scanner.take_keyword("import") {
        return parse_import(&mut scanner);
    }

    parse_variable(&mut scanner)
}

/// The unconsumed tail of the tag body, handed to the condition parser.
fn remainder<'a>(scanner: &Scanner, body: &'a str) -> &'a str {
    let consumed: usize = body
        .chars()
        .take(scanner.position())
        .map(char::len_utf8)
        .sum();
    &body[consumed..]
}

fn parse_for(scanner: &mut Scanner) -> Result<Tag, TemplateError> {
    scanner.skip_whitespace();
    let variable = scanner
        .take_identifier()
        .ok_or_else(|| TemplateError::MalformedTag("'for' expects a loop variable".into()))?;
    scanner.skip_whitespace();
    if !scanner.take_keyword("in") {
        return Err(TemplateError::MalformedTag(
            "'for' expects 'in' after the loop variable".into(),
        ));
    }
    scanner.skip_whitespace();
    let sequence = scanner
        .take_path()
        .ok_or_else(|| TemplateError::MalformedTag("'for' expects a sequence path".into()))?;
    require_end(scanner, "for")?;
    Ok(Tag::For { variable, sequence })
}

fn parse_import(scanner: &mut Scanner) -> Result<Tag, TemplateError> {
    scanner.skip_whitespace();
    if !scanner.match_literal("\"") {
        return Err(TemplateError::MalformedTag(
            "'import' expects a quoted path".into(),
        ));
    }
    let mut file = String::new();
    loop {
        match scanner.take_char() {
            Some('"') => break,
            Some('\n') => {
                return Err(TemplateError::MalformedTag(
                    "newline inside 'import' path".into(),
                ))
            }
            Some(c) => file.push(c),
            None => {
                return Err(TemplateError::MalformedTag(
                    "unterminated 'import' path".into(),
                ))
            }
        }
    }
    require_end(scanner, "import")?;
    Ok(Tag::Import { file })
}

fn parse_variable(scanner: &mut Scanner) -> Result<Tag, TemplateError> {
    let mut transformers = Vec::new();
    while scanner.match_literal("#") {
        let name = scanner.take_identifier().ok_or_else(|| {
            TemplateError::MalformedTag("'#' expects a transformer name".into())
        })?;
        transformers.push(name);
        scanner.skip_whitespace();
    }
    let path = scanner
        .take_path()
        .ok_or_else(|| TemplateError::MalformedTag("expected a variable path".into()))?;
    require_end(scanner, "variable")?;
    Ok(Tag::Variable { path, transformers })
}

fn require_end(scanner: &mut Scanner, kind: &str) -> Result<(), TemplateError> {
    scanner.skip_whitespace();
    if scanner.at_end() {
        Ok(())
    } else {
        Err(TemplateError::MalformedTag(format!(
            "trailing content after '{}' tag",
            kind
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable() {
        let tag = parse_tag(" project.name ").unwrap();
        assert_eq!(
            tag,
            Tag::Variable {
                path: vec!["project".into(), "name".into()],
                transformers: vec![],
            }
        );
    }

    #[test]
    fn test_variable_with_transformers() {
        let tag = parse_tag("#uppercased #trimmed name").unwrap();
        assert_eq!(
            tag,
            Tag::Variable {
                path: vec!["name".into()],
                transformers: vec!["uppercased".into(), "trimmed".into()],
            }
        );
    }

    #[test]
    fn test_if_tag() {
        let tag = parse_tag("if enabled").unwrap();
        assert!(matches!(tag, Tag::If(_)));
    }

    #[test]
    fn test_for_tag() {
        let tag = parse_tag("for item in project.items").unwrap();
        assert_eq!(
            tag,
            Tag::For {
                variable: "item".into(),
                sequence: vec!["project".into(), "items".into()],
            }
        );
    }

    #[test]
    fn test_for_requires_in_keyword() {
        assert!(parse_tag("for item on items").is_err());
        assert!(parse_tag("for item initems").is_err());
        assert!(parse_tag("for item in items trailing").is_err());
    }

    #[test]
    fn test_else_and_end_are_standalone() {
        assert_eq!(parse_tag("else").unwrap(), Tag::Else);
        assert_eq!(parse_tag(" end ").unwrap(), Tag::End);
        assert!(parse_tag("else something").is_err());
        assert!(parse_tag("end x").is_err());
    }

    #[test]
    fn test_import_tag() {
        let tag = parse_tag("import \"partials/header.txt\"").unwrap();
        assert_eq!(
            tag,
            Tag::Import {
                file: "partials/header.txt".into()
            }
        );
    }

    #[test]
    fn test_import_errors() {
        assert!(parse_tag("import header.txt").is_err());
        assert!(parse_tag("import \"unclosed").is_err());
        assert!(parse_tag("import \"bad\npath\"").is_err());
    }

    #[test]
    fn test_keyword_prefix_is_still_a_variable() {
        // Identifiers that merely start with a keyword are variables.
        let tag = parse_tag("iffy.thing").unwrap();
        assert!(matches!(tag, Tag::Variable { .. }));
        let tag = parse_tag("ending").unwrap();
        assert!(matches!(tag, Tag::Variable { .. }));
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(parse_tag("???").is_err());
        assert!(parse_tag("#").is_err());
        assert!(parse_tag("").is_err());
    }
}
