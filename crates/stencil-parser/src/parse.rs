//! Tag tokenizer and section nester.
//!
//! Parsing runs in three passes: tokenize the template into a flat stream
//! using the active delimiter pair, squash adjacent text tokens, then fold
//! the stream into a tree by matching section open/close tags on a stack.
//!
//! The active delimiter pair is a local value threaded through the
//! tokenize loop, so parsing is reentrant; a `{{=<% %>=}}` directive only
//! affects the remainder of the current parse.

use crate::error::ParseError;
use crate::scanner::Scanner;
use crate::token::{Delimiters, Span, Token};

/// Flat token emitted by the tokenizer, before nesting.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RawToken {
    Text { start: usize, end: usize },
    Variable { name: String, raw: bool, start: usize, end: usize },
    SectionOpen { name: String, inverted: bool, start: usize, end: usize },
    SectionClose { name: String, start: usize, end: usize },
    Partial { name: String, start: usize, end: usize },
    Comment { start: usize, end: usize },
    SetDelimiters { start: usize, end: usize },
}

/// Parses a template into a token tree using the given starting
/// delimiters.
pub fn parse(template: &str, tags: &Delimiters) -> Result<Vec<Token>, ParseError> {
    let flat = squash(tokenize(template, tags.clone())?);
    nest(flat, template)
}

fn tokenize(src: &str, mut tags: Delimiters) -> Result<Vec<RawToken>, ParseError> {
    let mut scanner = Scanner::new(src);
    let mut tokens = Vec::new();

    loop {
        let text_start = scanner.pos();
        let text = scanner.scan_until(&tags.open);
        if !text.is_empty() {
            tokens.push(RawToken::Text {
                start: text_start,
                end: scanner.pos(),
            });
        }
        if scanner.eos() {
            break;
        }

        let tag_start = scanner.pos();
        scanner.scan(&tags.open);

        match scanner.peek() {
            Some('=') => {
                scanner.bump();
                let body = scanner.scan_until("=").trim().to_string();
                if !scanner.scan("=") || !scanner.scan(&tags.close) {
                    return Err(ParseError::UnclosedTag { offset: tag_start });
                }
                let mut parts = body.split_whitespace();
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(open), Some(close), None) => {
                        tags = Delimiters::new(open, close);
                    }
                    _ => return Err(ParseError::InvalidDelimiters { offset: tag_start }),
                }
                tokens.push(RawToken::SetDelimiters {
                    start: tag_start,
                    end: scanner.pos(),
                });
            }
            Some('{') => {
                // Triple-mustache raw variable: closes with `}` + close tag.
                scanner.bump();
                let raw_close = format!("}}{}", tags.close);
                let body = scanner.scan_until(&raw_close).trim().to_string();
                if !scanner.scan(&raw_close) {
                    return Err(ParseError::UnclosedTag { offset: tag_start });
                }
                tokens.push(RawToken::Variable {
                    name: body,
                    raw: true,
                    start: tag_start,
                    end: scanner.pos(),
                });
            }
            Some(sigil @ ('#' | '^' | '/' | '>' | '&' | '!')) => {
                scanner.bump();
                let body = scanner.scan_until(&tags.close).trim().to_string();
                if !scanner.scan(&tags.close) {
                    return Err(ParseError::UnclosedTag { offset: tag_start });
                }
                let start = tag_start;
                let end = scanner.pos();
                tokens.push(match sigil {
                    '#' => RawToken::SectionOpen {
                        name: body,
                        inverted: false,
                        start,
                        end,
                    },
                    '^' => RawToken::SectionOpen {
                        name: body,
                        inverted: true,
                        start,
                        end,
                    },
                    '/' => RawToken::SectionClose {
                        name: body,
                        start,
                        end,
                    },
                    '>' => RawToken::Partial {
                        name: body,
                        start,
                        end,
                    },
                    '&' => RawToken::Variable {
                        name: body,
                        raw: true,
                        start,
                        end,
                    },
                    _ => RawToken::Comment { start, end },
                });
            }
            _ => {
                // No sigil: escaped variable.
                let body = scanner.scan_until(&tags.close).trim().to_string();
                if !scanner.scan(&tags.close) {
                    return Err(ParseError::UnclosedTag { offset: tag_start });
                }
                tokens.push(RawToken::Variable {
                    name: body,
                    raw: false,
                    start: tag_start,
                    end: scanner.pos(),
                });
            }
        }
    }

    Ok(tokens)
}

/// Merges adjacent text tokens into single tokens, joining their spans.
fn squash(tokens: Vec<RawToken>) -> Vec<RawToken> {
    let mut out: Vec<RawToken> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if let (
            RawToken::Text { end, .. },
            Some(RawToken::Text { end: prev_end, .. }),
        ) = (&token, out.last_mut())
        {
            *prev_end = *end;
            continue;
        }
        out.push(token);
    }
    out
}

/// An open section awaiting its close tag.
struct OpenSection {
    name: String,
    inverted: bool,
    start: usize,
    inner_start: usize,
    children: Vec<Token>,
}

/// Folds the flat stream into a tree by matching open/close tags by name
/// on an explicit stack.
fn nest(tokens: Vec<RawToken>, src: &str) -> Result<Vec<Token>, ParseError> {
    let mut stack: Vec<OpenSection> = Vec::new();
    let mut top: Vec<Token> = Vec::new();

    for token in tokens {
        match token {
            RawToken::SectionOpen {
                name,
                inverted,
                start,
                end,
            } => {
                stack.push(OpenSection {
                    name,
                    inverted,
                    start,
                    inner_start: end,
                    children: Vec::new(),
                });
            }
            RawToken::SectionClose { name, start, end } => {
                let open = stack.pop().ok_or_else(|| ParseError::UnopenedSection {
                    name: name.clone(),
                    offset: start,
                })?;
                if open.name != name {
                    return Err(ParseError::SectionMismatch {
                        open: open.name,
                        open_offset: open.start,
                        close: name,
                        close_offset: start,
                    });
                }
                let section = Token::Section {
                    name: open.name,
                    inverted: open.inverted,
                    children: open.children,
                    span: Span::new(open.start, end),
                    inner: Span::new(open.inner_start, start),
                };
                sink(&mut stack, &mut top).push(section);
            }
            other => {
                let converted = convert(other, src);
                sink(&mut stack, &mut top).push(converted);
            }
        }
    }

    if let Some(open) = stack.pop() {
        return Err(ParseError::UnclosedSection {
            name: open.name,
            offset: open.start,
        });
    }

    Ok(top)
}

/// Current output list: the innermost open section's children, or the
/// top-level list when no section is open.
fn sink<'v>(stack: &'v mut Vec<OpenSection>, top: &'v mut Vec<Token>) -> &'v mut Vec<Token> {
    match stack.last_mut() {
        Some(open) => &mut open.children,
        None => top,
    }
}

fn convert(token: RawToken, src: &str) -> Token {
    match token {
        RawToken::Text { start, end } => Token::Text {
            text: src[start..end].to_string(),
            span: Span::new(start, end),
        },
        RawToken::Variable {
            name,
            raw,
            start,
            end,
        } => Token::Variable {
            name,
            raw,
            span: Span::new(start, end),
        },
        RawToken::Partial { name, start, end } => Token::Partial {
            name,
            span: Span::new(start, end),
        },
        RawToken::Comment { start, end } => Token::Comment {
            span: Span::new(start, end),
        },
        RawToken::SetDelimiters { start, end } => Token::SetDelimiters {
            span: Span::new(start, end),
        },
        RawToken::SectionOpen { .. } | RawToken::SectionClose { .. } => {
            unreachable!("section tokens are handled by nest")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_default(src: &str) -> Result<Vec<Token>, ParseError> {
        parse(src, &Delimiters::default())
    }

    #[test]
    fn plain_text_single_token() {
        let tokens = parse_default("hello world").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Text {
                text: "hello world".into(),
                span: Span::new(0, 11),
            }]
        );
    }

    #[test]
    fn empty_template() {
        assert_eq!(parse_default("").unwrap(), vec![]);
    }

    #[test]
    fn escaped_variable() {
        let tokens = parse_default("{{ name }}").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Variable {
                name: "name".into(),
                raw: false,
                span: Span::new(0, 10),
            }]
        );
    }

    #[test]
    fn raw_variable_triple_mustache() {
        let tokens = parse_default("{{{html}}}").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Variable {
                name: "html".into(),
                raw: true,
                span: Span::new(0, 10),
            }]
        );
    }

    #[test]
    fn raw_variable_ampersand() {
        let tokens = parse_default("{{& html }}").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Variable {
                name: "html".into(),
                raw: true,
                span: Span::new(0, 11),
            }]
        );
    }

    #[test]
    fn text_around_variable() {
        let tokens = parse_default("a {{b}} c").unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(matches!(&tokens[0], Token::Text { text, .. } if text == "a "));
        assert!(matches!(&tokens[1], Token::Variable { name, .. } if name == "b"));
        assert!(matches!(&tokens[2], Token::Text { text, .. } if text == " c"));
    }

    #[test]
    fn section_collects_children() {
        let tokens = parse_default("{{#items}}{{.}},{{/items}}").unwrap();
        assert_eq!(tokens.len(), 1);
        match &tokens[0] {
            Token::Section {
                name,
                inverted,
                children,
                inner,
                ..
            } => {
                assert_eq!(name, "items");
                assert!(!inverted);
                assert_eq!(children.len(), 2);
                assert_eq!(inner.start, 10);
                assert_eq!(inner.end, 16);
            }
            other => panic!("expected section, got {:?}", other),
        }
    }

    #[test]
    fn section_inner_span_slices_raw_text() {
        let src = "{{#wrapped}} {{x}} here {{/wrapped}}";
        let tokens = parse(src, &Delimiters::default()).unwrap();
        match &tokens[0] {
            Token::Section { inner, .. } => {
                assert_eq!(&src[inner.start..inner.end], " {{x}} here ");
            }
            other => panic!("expected section, got {:?}", other),
        }
    }

    #[test]
    fn inverted_section() {
        let tokens = parse_default("{{^items}}empty{{/items}}").unwrap();
        match &tokens[0] {
            Token::Section { inverted, .. } => assert!(*inverted),
            other => panic!("expected section, got {:?}", other),
        }
    }

    #[test]
    fn nested_sections() {
        let tokens = parse_default("{{#a}}{{#b}}x{{/b}}{{/a}}").unwrap();
        match &tokens[0] {
            Token::Section { name, children, .. } => {
                assert_eq!(name, "a");
                assert!(matches!(
                    &children[0],
                    Token::Section { name, .. } if name == "b"
                ));
            }
            other => panic!("expected section, got {:?}", other),
        }
    }

    #[test]
    fn partial_and_comment() {
        let tokens = parse_default("{{> header }}{{! ignore me }}").unwrap();
        assert!(matches!(&tokens[0], Token::Partial { name, .. } if name == "header"));
        assert!(matches!(&tokens[1], Token::Comment { .. }));
    }

    #[test]
    fn delimiter_change_applies_to_rest_of_parse() {
        let tokens = parse_default("{{=<% %>=}}<% name %>").unwrap();
        assert!(matches!(&tokens[0], Token::SetDelimiters { .. }));
        assert!(matches!(
            &tokens[1],
            Token::Variable { name, raw: false, .. } if name == "name"
        ));
    }

    #[test]
    fn delimiter_change_leaves_old_tags_as_text() {
        let tokens = parse_default("{{=[[ ]]=}}{{name}}[[x]]").unwrap();
        assert!(matches!(&tokens[1], Token::Text { text, .. } if text == "{{name}}"));
        assert!(matches!(&tokens[2], Token::Variable { name, .. } if name == "x"));
    }

    #[test]
    fn delimiter_change_does_not_leak_between_parses() {
        parse_default("{{=<% %>=}}<%a%>").unwrap();
        // A fresh parse starts from the default pair again.
        let tokens = parse_default("{{a}}").unwrap();
        assert!(matches!(&tokens[0], Token::Variable { name, .. } if name == "a"));
    }

    #[test]
    fn custom_starting_delimiters() {
        let tags = Delimiters::new("<%", "%>");
        let tokens = parse("<% name %>", &tags).unwrap();
        assert!(matches!(&tokens[0], Token::Variable { name, .. } if name == "name"));
    }

    #[test]
    fn invalid_delimiter_change_rejected() {
        let err = parse_default("{{=onlyone=}}").unwrap_err();
        assert_eq!(err, ParseError::InvalidDelimiters { offset: 0 });
    }

    #[test]
    fn unterminated_tag_errors_with_offset() {
        let err = parse_default("ok {{name").unwrap_err();
        assert_eq!(err, ParseError::UnclosedTag { offset: 3 });
    }

    #[test]
    fn unterminated_raw_variable() {
        let err = parse_default("{{{name}}").unwrap_err();
        assert_eq!(err, ParseError::UnclosedTag { offset: 0 });
    }

    #[test]
    fn mismatched_close_names_both_sections() {
        let err = parse_default("{{#a}}x{{/b}}").unwrap_err();
        match err {
            ParseError::SectionMismatch {
                open,
                close,
                open_offset,
                close_offset,
            } => {
                assert_eq!(open, "a");
                assert_eq!(close, "b");
                assert_eq!(open_offset, 0);
                assert_eq!(close_offset, 7);
            }
            other => panic!("expected mismatch, got {:?}", other),
        }
    }

    #[test]
    fn orphan_close_is_an_error() {
        let err = parse_default("x{{/a}}").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnopenedSection {
                name: "a".into(),
                offset: 1,
            }
        );
    }

    #[test]
    fn unclosed_section_is_an_error() {
        let err = parse_default("{{#a}}body").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnclosedSection {
                name: "a".into(),
                offset: 0,
            }
        );
    }

    #[test]
    fn squash_merges_adjacent_text_runs() {
        let tokens = squash(vec![
            RawToken::Text { start: 0, end: 2 },
            RawToken::Text { start: 2, end: 5 },
            RawToken::Variable {
                name: "x".into(),
                raw: false,
                start: 5,
                end: 10,
            },
            RawToken::Text { start: 10, end: 11 },
        ]);
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0], RawToken::Text { start: 0, end: 5 });
    }

    #[test]
    fn pipe_suffix_is_kept_in_tag_name() {
        // The renderer splits names on `|`; the parser keeps the body whole.
        let tokens = parse_default("{{created|date('YYYY')|upper}}").unwrap();
        assert!(matches!(
            &tokens[0],
            Token::Variable { name, .. } if name == "created|date('YYYY')|upper"
        ));
    }
}
