//! The boolean sub-language used inside `if` tags.
//!
//! Conditions are lexed into a small token stream and parsed by recursive
//! descent:
//!
//! ```text
//! expr      := term   ('or'  term  )*
//! term      := factor ('and' factor)*
//! factor    := 'not'? ( '(' expr ')' | statement )
//! statement := PATH ( ('==' | '!=') STRING )?
//! ```
//!
//! String literals accept either quote character and have no escapes.
//! Evaluation short-circuits; a bare path is truthy unless it resolves to
//! null or boolean false.

use crate::error::TemplateError;
use crate::template::context::Context;
use crate::template::scanner::Scanner;

/// A parsed condition, ready for evaluation against a [`Context`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionalExpression {
    Or(Vec<ConditionalExpression>),
    And(Vec<ConditionalExpression>),
    Not(Box<ConditionalExpression>),
    /// Bare path: true iff the resolved value is neither null nor `false`.
    Terminal(Vec<String>),
    /// Path compared to a string literal; null stringifies to `""`.
    TerminalCompare {
        path: Vec<String>,
        op: CompareOp,
        literal: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
}

impl ConditionalExpression {
    pub fn evaluate(&self, context: &Context) -> bool {
        match self {
            ConditionalExpression::Or(children) => {
                children.iter().any(|child| child.evaluate(context))
            }
            ConditionalExpression::And(children) => {
                children.iter().all(|child| child.evaluate(context))
            }
            ConditionalExpression::Not(child) => !child.evaluate(context),
            ConditionalExpression::Terminal(path) => context.resolve(path).is_truthy(),
            ConditionalExpression::TerminalCompare { path, op, literal } => {
                let value = context.resolve(path).to_display_string();
                match op {
                    CompareOp::Eq => value == *literal,
                    CompareOp::Neq => value != *literal,
                }
            }
        }
    }
}

/// Parses a condition source string into an expression tree.
pub fn parse_condition(source: &str) -> Result<ConditionalExpression, TemplateError> {
    let tokens = lex(source)?;
    let mut parser = CondParser { tokens, pos: 0 };
    let expr = parser.expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(TemplateError::MalformedCondition(format!(
            "unexpected trailing input in '{}'",
            source
        )));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum CondToken {
    Or,
    And,
    Not,
    LParen,
    RParen,
    Eq,
    Neq,
    Str(String),
    Path(Vec<String>),
}

fn lex(source: &str) -> Result<Vec<CondToken>, TemplateError> {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();

    loop {
        scanner.skip_whitespace();
        if scanner.at_end() {
            break;
        }
        if scanner.match_literal("(") {
            tokens.push(CondToken::LParen);
        } else if scanner.match_literal(")") {
            tokens.push(CondToken::RParen);
        } else if scanner.match_literal("==") {
            tokens.push(CondToken::Eq);
        } else if scanner.match_literal("!=") {
            tokens.push(CondToken::Neq);
        } else if scanner.peek() == Some('"') || scanner.peek() == Some('\'') {
            let quote = scanner.take_char().unwrap();
            tokens.push(CondToken::Str(take_string_literal(&mut scanner, quote)?));
        } else if scanner.take_keyword("or") {
            tokens.push(CondToken::Or);
        } else if scanner.take_keyword("and") {
            tokens.push(CondToken::And);
        } else if scanner.take_keyword("not") {
            tokens.push(CondToken::Not);
        } else if let Some(path) = scanner.take_path() {
            tokens.push(CondToken::Path(path));
        } else {
            return Err(TemplateError::MalformedCondition(format!(
                "unexpected character '{}'",
                scanner.peek().unwrap()
            )));
        }
    }

    Ok(tokens)
}

/// The matching quote terminates the literal; end of input before the
/// closing quote is an error.
fn take_string_literal(scanner: &mut Scanner, quote: char) -> Result<String, TemplateError> {
    let mut literal = String::new();
    loop {
        match scanner.take_char() {
            Some(c) if c == quote => return Ok(literal),
            Some(c) => literal.push(c),
            None => {
                return Err(TemplateError::MalformedCondition(
                    "unterminated string literal".to_string(),
                ))
            }
        }
    }
}

struct CondParser {
    tokens: Vec<CondToken>,
    pos: usize,
}

impl CondParser {
    fn peek(&self) -> Option<&CondToken> {
        self.tokens.get(self.pos)
    }

    fn advance_if(&mut self, token: &CondToken) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<ConditionalExpression, TemplateError> {
        let mut children = vec![self.term()?];
        while self.advance_if(&CondToken::Or) {
            children.push(self.term()?);
        }
        Ok(ConditionalExpression::Or(children))
    }

    fn term(&mut self) -> Result<ConditionalExpression, TemplateError> {
        let mut children = vec![self.factor()?];
        while self.advance_if(&CondToken::And) {
            children.push(self.factor()?);
        }
        Ok(ConditionalExpression::And(children))
    }

    fn factor(&mut self) -> Result<ConditionalExpression, TemplateError> {
        if self.advance_if(&CondToken::Not) {
            return Ok(ConditionalExpression::Not(Box::new(self.factor()?)));
        }
        if self.advance_if(&CondToken::LParen) {
            let inner = self.expr()?;
            if !self.advance_if(&CondToken::RParen) {
                return Err(TemplateError::MalformedCondition(
                    "missing closing parenthesis".to_string(),
                ));
            }
            return Ok(inner);
        }
        self.statement()
    }

    fn statement(&mut self) -> Result<ConditionalExpression, TemplateError> {
        let path = match self.peek() {
            Some(CondToken::Path(path)) => {
                let path = path.clone();
                self.pos += 1;
                path
            }
            other => {
                return Err(TemplateError::MalformedCondition(format!(
                    "expected a path, found {:?}",
                    other
                )))
            }
        };

        let op = if self.advance_if(&CondToken::Eq) {
            CompareOp::Eq
        } else if self.advance_if(&CondToken::Neq) {
            CompareOp::Neq
        } else {
            return Ok(ConditionalExpression::Terminal(path));
        };

        match self.peek() {
            Some(CondToken::Str(literal)) => {
                let literal = literal.clone();
                self.pos += 1;
                Ok(ConditionalExpression::TerminalCompare { path, op, literal })
            }
            other => Err(TemplateError::MalformedCondition(format!(
                "expected a string literal after comparison operator, found {:?}",
                other
            ))),
        }
    }
}
