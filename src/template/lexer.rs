//! Template tokenizer and newline elision.
//!
//! Splits template source into `Text`, `Whitespace`, `Newline`, and `Tag`
//! tokens, then drops the newlines that surround standalone block tags so
//! template authors can put `if`/`for`/`end` lines on their own lines
//! without leaking blank lines into the output.

use crate::error::TemplateError;
use crate::template::scanner::Scanner;
use crate::template::tag::{self, Tag};

/// A token of the template layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Text(String),
    Whitespace(String),
    Newline,
    Tag(Tag),
}

/// Tag delimiters. Defaults to `<{` and `}>`.
#[derive(Debug, Clone)]
pub struct Delimiters {
    pub open: String,
    pub close: String,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            open: "<{".to_string(),
            close: "}>".to_string(),
        }
    }
}

/// Tokenizes template source.
pub fn tokenize(source: &str, delimiters: &Delimiters) -> Result<Vec<Token>, TemplateError> {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();
    let open_first = delimiters.open.chars().next().unwrap_or('<');

    while !scanner.at_end() {
        if scanner.match_literal(&delimiters.open) {
            let body = scanner
                .take_until_literal(&delimiters.close)
                .ok_or_else(|| TemplateError::UnterminatedTag(delimiters.close.clone()))?;
            scanner.match_literal(&delimiters.close);
            tokens.push(Token::Tag(tag::parse_tag(&body)?));
            continue;
        }
        if scanner.peek() == Some('\n') {
            scanner.take_char();
            tokens.push(Token::Newline);
            continue;
        }

        // Accumulate up to the next newline or the first delimiter char.
        let mut chunk = String::new();
        let mut lone_opener = false;
        while let Some(c) = scanner.peek() {
            if c == '\n' {
                break;
            }
            if c == open_first {
                let save = scanner.position();
                if scanner.match_literal(&delimiters.open) {
                    scanner.restore(save);
                    break;
                }
                // The opener char without the rest of the delimiter is
                // plain text.
                chunk.push(scanner.take_char().unwrap());
                lone_opener = true;
                break;
            }
            chunk.push(scanner.take_char().unwrap());
        }

        if chunk.is_empty() {
            continue;
        }
        if !lone_opener && chunk.chars().all(|c| c == ' ') {
            tokens.push(Token::Whitespace(chunk));
        } else {
            tokens.push(Token::Text(chunk));
        }
    }

    Ok(tokens)
}

/// Drops newlines adjacent to standalone block tags.
///
/// A `Newline` is elided when the kept tokens immediately before it match
/// one of (`T` = block tag, `W` = whitespace, `N` = newline, `^` =
/// start-of-stream): `^T`, `NT`, `NTW`, `NWT`, `NWTW`. A single
/// left-to-right pass; running it twice changes nothing.
pub fn filter_newlines(tokens: Vec<Token>) -> Vec<Token> {
    let mut kept: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if matches!(token, Token::Newline) && elides_after(&kept) {
            continue;
        }
        kept.push(token);
    }
    kept
}

fn elides_after(kept: &[Token]) -> bool {
    let n = kept.len();
    let block = |i: usize| matches!(&kept[i], Token::Tag(t) if t.is_block());
    let ws = |i: usize| matches!(kept[i], Token::Whitespace(_));
    let nl = |i: usize| matches!(kept[i], Token::Newline);

    // ^T and NT
    if n >= 1 && block(n - 1) && (n == 1 || nl(n - 2)) {
        return true;
    }
    // NTW
    if n >= 3 && ws(n - 1) && block(n - 2) && nl(n - 3) {
        return true;
    }
    // NWT
    if n >= 3 && block(n - 1) && ws(n - 2) && nl(n - 3) {
        return true;
    }
    // NWTW
    if n >= 4 && ws(n - 1) && block(n - 2) && ws(n - 3) && nl(n - 4) {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        tokenize(source, &Delimiters::default()).unwrap()
    }

    /// Reassembles the payloads of a tag-free token stream.
    fn reassemble(tokens: &[Token]) -> String {
        let mut out = String::new();
        for token in tokens {
            match token {
                Token::Text(s) | Token::Whitespace(s) => out.push_str(s),
                Token::Newline => out.push('\n'),
                Token::Tag(_) => panic!("unexpected tag"),
            }
        }
        out
    }

    #[test]
    fn test_plain_text_round_trips() {
        for source in ["hello", "a\nb\n", "  indented\n\n", "x } y > z"] {
            assert_eq!(reassemble(&lex(source)), source);
        }
    }

    #[test]
    fn test_tag_token() {
        let tokens = lex("a<{ name }>b");
        assert_eq!(tokens.len(), 3);
        assert!(matches!(&tokens[1], Token::Tag(Tag::Variable { .. })));
    }

    #[test]
    fn test_unterminated_tag() {
        let err = tokenize("<{ name", &Delimiters::default()).unwrap_err();
        assert_eq!(err, TemplateError::UnterminatedTag("}>".into()));
    }

    #[test]
    fn test_lone_opener_char_is_text() {
        let tokens = lex("a < b");
        assert_eq!(reassemble(&tokens), "a < b");
        // The lone '<' terminates its chunk as text.
        assert_eq!(
            tokens,
            vec![Token::Text("a <".into()), Token::Text(" b".into())]
        );
    }

    #[test]
    fn test_spaces_only_chunk_is_whitespace() {
        let tokens = lex("  \n\ta");
        assert_eq!(tokens[0], Token::Whitespace("  ".into()));
        assert_eq!(tokens[1], Token::Newline);
        // Tabs do not count as whitespace tokens.
        assert_eq!(tokens[2], Token::Text("\ta".into()));
    }

    #[test]
    fn test_custom_delimiters() {
        let delimiters = Delimiters {
            open: "[[".into(),
            close: "]]".into(),
        };
        let tokens = tokenize("x [[ name ]] <{ y }>", &delimiters).unwrap();
        assert!(matches!(&tokens[1], Token::Tag(Tag::Variable { .. })));
        assert!(tokens
            .iter()
            .filter(|t| matches!(t, Token::Tag(_)))
            .count()
            == 1);
    }

    #[test]
    fn test_elision_at_stream_start() {
        // ^ T N
        let tokens = filter_newlines(lex("<{ if x }>\nbody<{ end }>\n"));
        assert!(!tokens.iter().take(2).any(|t| matches!(t, Token::Newline)));
    }

    #[test]
    fn test_elision_between_lines() {
        // N T N and N T W N, with surrounding text untouched
        let tokens = filter_newlines(lex("a\n<{ end }>\nb\n"));
        assert_eq!(
            tokens,
            vec![
                Token::Text("a".into()),
                Token::Newline,
                Token::Tag(Tag::End),
                Token::Text("b".into()),
                Token::Newline,
            ]
        );
    }

    #[test]
    fn test_elision_with_indented_tag() {
        // N W T N
        let tokens = filter_newlines(lex("a\n  <{ end }>\nb"));
        assert_eq!(
            tokens,
            vec![
                Token::Text("a".into()),
                Token::Newline,
                Token::Whitespace("  ".into()),
                Token::Tag(Tag::End),
                Token::Text("b".into()),
            ]
        );
    }

    #[test]
    fn test_elision_with_trailing_whitespace() {
        // N W T W N
        let tokens = filter_newlines(lex("a\n <{ end }> \nb"));
        assert!(!tokens
            .iter()
            .skip(2)
            .take(3)
            .any(|t| matches!(t, Token::Newline)));
    }

    #[test]
    fn test_variable_tags_do_not_elide() {
        let tokens = filter_newlines(lex("a\n<{ x }>\nb"));
        assert_eq!(
            tokens
                .iter()
                .filter(|t| matches!(t, Token::Newline))
                .count(),
            2
        );
    }

    #[test]
    fn test_elision_is_idempotent() {
        let sources = [
            "A\n<{ for x in items }>\n- <{ x }>\n<{ end }>\nB\n",
            "<{ if a }>\nx\n<{ else }>\ny\n<{ end }>\n",
            "plain\n\ntext\n",
            "a\n <{ end }> \nb",
        ];
        for source in sources {
            let once = filter_newlines(lex(source));
            let twice = filter_newlines(once.clone());
            assert_eq!(once, twice, "elision not idempotent for {:?}", source);
        }
    }

    #[test]
    fn test_consecutive_blank_lines_kept_in_plain_text() {
        let tokens = filter_newlines(lex("a\n\n\nb"));
        assert_eq!(
            tokens
                .iter()
                .filter(|t| matches!(t, Token::Newline))
                .count(),
            3
        );
    }
}
