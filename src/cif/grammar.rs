//! Line tokenizer for CIF text.
//!
//! Every non-blank line is split into its leading-space indentation and one
//! [`Token`]:
//!
//! ```text
//! # comment                 Comment(" comment")
//! this.is.deep:             ObjectDef(this.is.deep)
//! key = rest of line        FieldDef { key: "key", value: " rest of line" }
//! | more text               ValueContinuation(" more text")
//! , next item               ListContinuation(" next item")
//! ```
//!
//! Values keep their leading whitespace. Tabs in the indentation are an
//! error, never normalized.

use std::fmt;
use std::io::BufRead;

use crate::error::{Result, SettingsError};
use crate::path::{Path, scan_segment};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Comment(String),
    ObjectDef(Path),
    FieldDef { key: String, value: String },
    ValueContinuation(String),
    ListContinuation(String),
}

/// One tokenized line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based, counted over non-blank lines only.
    pub number: usize,
    /// Count of leading spaces.
    pub indent: usize,
    pub token: Token,
    /// The line as read, without its line terminator.
    pub text: String,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>3}{}|{:?}",
            self.number,
            " ".repeat(self.indent),
            self.token
        )
    }
}

/// Split off leading spaces. `None` if a tab appears before the first
/// non-space character.
pub fn split_indent(text: &str) -> Option<(usize, &str)> {
    for (i, c) in text.char_indices() {
        match c {
            ' ' => continue,
            '\t' => return None,
            _ => return Some((i, &text[i..])),
        }
    }
    Some((text.len(), ""))
}

/// Tokenize a single line.
pub fn parse_line(number: usize, text: &str) -> Result<Line> {
    let text = strip_terminator(text);
    let (indent, body) = split_indent(text)
        .ok_or_else(|| SettingsError::grammar(number, text, "tab character in indentation"))?;
    let token = classify(body).map_err(|reason| SettingsError::grammar(number, text, reason))?;
    Ok(Line {
        number,
        indent,
        token,
        text: text.to_string(),
    })
}

fn classify(body: &str) -> Result<Token, &'static str> {
    if let Some(rest) = body.strip_prefix('#') {
        return Ok(Token::Comment(rest.to_string()));
    }
    if let Some(rest) = body.strip_prefix('|') {
        return Ok(Token::ValueContinuation(rest.to_string()));
    }
    if let Some(rest) = body.strip_prefix(',') {
        return Ok(Token::ListContinuation(rest.to_string()));
    }

    let (first, after) = scan_segment(body).map_err(|_| "unrecognized line")?;
    let mut rest = skip_blanks(after);
    if let Some(value) = rest.strip_prefix('=') {
        return Ok(Token::FieldDef {
            key: first,
            value: value.to_string(),
        });
    }

    let mut segments = vec![first];
    loop {
        if let Some(r) = rest.strip_prefix('.') {
            let (segment, after) =
                scan_segment(skip_blanks(r)).map_err(|_| "expected a path segment after '.'")?;
            segments.push(segment);
            rest = skip_blanks(after);
        } else if let Some(r) = rest.strip_prefix(':') {
            if !skip_blanks(r).is_empty() {
                return Err("unexpected text after ':'");
            }
            break;
        } else {
            return Err("expected ':' or '=' after name");
        }
    }
    let path = Path::from_segments(segments).map_err(|_| "invalid object path")?;
    Ok(Token::ObjectDef(path))
}

fn skip_blanks(s: &str) -> &str {
    s.trim_start_matches([' ', '\t'])
}

fn strip_terminator(text: &str) -> &str {
    let text = text.strip_suffix('\n').unwrap_or(text);
    text.strip_suffix('\r').unwrap_or(text)
}

/// Lazy, single-pass iterator of tokenized lines. Blank lines are skipped
/// and do not advance the line number. Stops after the first error.
pub struct Lines<R> {
    reader: R,
    number: usize,
    buf: String,
    done: bool,
}

impl<R: BufRead> Iterator for Lines<R> {
    type Item = Result<Line>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(SettingsError::ReadError(e)));
                }
            }
            if self.buf.trim().is_empty() {
                continue;
            }
            self.number += 1;
            let result = parse_line(self.number, &self.buf);
            self.done = result.is_err();
            return Some(result);
        }
    }
}

/// Tokenize a stream of CIF text.
pub fn lines<R: BufRead>(reader: R) -> Lines<R> {
    Lines {
        reader,
        number: 0,
        buf: String::new(),
        done: false,
    }
}

/// Tokenize an in-memory CIF document.
pub fn tokenize(text: &str) -> Lines<&[u8]> {
    lines(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str) -> Token {
        parse_line(1, text).unwrap().token
    }

    #[test]
    fn comment_keeps_text_verbatim() {
        assert_eq!(
            token("# this is a comment"),
            Token::Comment(" this is a comment".into())
        );
    }

    #[test]
    fn simple_objectdef() {
        assert_eq!(
            token("object:"),
            Token::ObjectDef(Path::parse("object").unwrap())
        );
    }

    #[test]
    fn deep_objectdef() {
        assert_eq!(
            token("deep.nested.object:"),
            Token::ObjectDef(Path::parse("deep.nested.object").unwrap())
        );
    }

    #[test]
    fn objectdef_allows_blanks_between_tokens() {
        assert_eq!(
            token("deep . nested :  "),
            Token::ObjectDef(Path::parse("deep.nested").unwrap())
        );
    }

    #[test]
    fn quoted_objectdef_segment() {
        let Token::ObjectDef(path) = token("app.\"spaces in key\":") else {
            panic!("expected an object definition");
        };
        assert_eq!(path.segments(), ["app", "spaces in key"]);
    }

    #[test]
    fn fielddef_keeps_leading_space() {
        assert_eq!(
            token("foo = bar"),
            Token::FieldDef {
                key: "foo".into(),
                value: " bar".into()
            }
        );
    }

    #[test]
    fn fielddef_value_is_rest_of_line() {
        assert_eq!(
            token("url=pg://host:5432/db # not a comment"),
            Token::FieldDef {
                key: "url".into(),
                value: "pg://host:5432/db # not a comment".into()
            }
        );
    }

    #[test]
    fn fielddef_quoted_key_and_underscores() {
        assert_eq!(
            token("'spaces in key' = baz"),
            Token::FieldDef {
                key: "spaces in key".into(),
                value: " baz".into()
            }
        );
        assert_eq!(
            token("pool_size = 5"),
            Token::FieldDef {
                key: "pool_size".into(),
                value: " 5".into()
            }
        );
    }

    #[test]
    fn continuations() {
        assert_eq!(
            token("| this is a continuation"),
            Token::ValueContinuation(" this is a continuation".into())
        );
        assert_eq!(
            token(", this is a continuation"),
            Token::ListContinuation(" this is a continuation".into())
        );
    }

    #[test]
    fn indentation_counts_leading_spaces() {
        let line = parse_line(4, "       | second line\n").unwrap();
        assert_eq!(line.number, 4);
        assert_eq!(line.indent, 7);
        assert_eq!(line.text, "       | second line");
        assert_eq!(line.token, Token::ValueContinuation(" second line".into()));
    }

    #[test]
    fn tab_in_indentation_rejected() {
        for text in ["\tfoo = bar", "  \t foo = bar"] {
            let err = parse_line(3, text).unwrap_err();
            match err {
                SettingsError::Grammar { line, reason, .. } => {
                    assert_eq!(line, 3);
                    assert!(reason.contains("tab"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn unrecognized_lines_rejected() {
        for text in [
            "just words",
            "= value",
            "a.b = c",
            "a..b:",
            "object: trailing",
            "\"unterminated:",
        ] {
            assert!(
                matches!(parse_line(1, text), Err(SettingsError::Grammar { .. })),
                "{text:?} should not tokenize"
            );
        }
    }

    #[test]
    fn lines_skip_blanks_and_number_meaningful_lines() {
        let text = "\nfield1 = a\n   \n\nobject:\r\n    field2 = b\n";
        let lines: Vec<Line> = tokenize(text).collect::<Result<_>>().unwrap();
        let numbers: Vec<(usize, usize)> = lines.iter().map(|l| (l.number, l.indent)).collect();
        assert_eq!(numbers, [(1, 0), (2, 0), (3, 4)]);
        assert_eq!(
            lines[1].token,
            Token::ObjectDef(Path::parse("object").unwrap())
        );
    }

    #[test]
    fn lines_stop_after_error() {
        let mut lines = tokenize("a = 1\n\tb = 2\nc = 3\n");
        assert!(lines.next().unwrap().is_ok());
        assert!(lines.next().unwrap().is_err());
        assert!(lines.next().is_none());
    }

    #[test]
    fn display_renders_debug_line() {
        let line = parse_line(12, "    foo = bar").unwrap();
        assert_eq!(
            line.to_string(),
            " 12    |FieldDef { key: \"foo\", value: \" bar\" }"
        );
    }

    #[test]
    fn split_indent_variants() {
        assert_eq!(split_indent("   x"), Some((3, "x")));
        assert_eq!(split_indent("x"), Some((0, "x")));
        assert_eq!(split_indent("    "), Some((4, "")));
        assert_eq!(split_indent(" \tx"), None);
    }
}
