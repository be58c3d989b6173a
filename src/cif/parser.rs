//! Indentation-driven parser building a [`ValueStore`] from CIF lines.
//!
//! The parser keeps a stack of open frames. The bottom frame is always the
//! root; every other frame remembers the line and indentation that opened
//! it and the store location it writes to. Each definition line is placed
//! by comparing its indentation with the frame on top:
//!
//! - deeper than the top: a child of the top frame,
//! - equal: a sibling, so the top frame is closed first,
//! - shallower: frames are closed until one at the same indentation is
//!   found, which is then treated as a sibling.
//!
//! Continuation lines attach to the field (or continuation) on top of the
//! stack and never open a container.

use std::io::BufRead;

use log::{debug, trace};

use super::grammar::{Line, Token, lines};
use crate::error::{Result, SettingsError};
use crate::path::Path;
use crate::store::ValueStore;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Frame {
    Root,
    Container {
        line: usize,
        indent: usize,
        path: Path,
    },
    Field {
        line: usize,
        indent: usize,
        path: Path,
        name: String,
    },
    ValueContinuation {
        line: usize,
        indent: usize,
        path: Path,
        name: String,
    },
    ListContinuation {
        line: usize,
        indent: usize,
        path: Path,
        name: String,
    },
}

impl Frame {
    fn indent(&self) -> Option<usize> {
        match self {
            Frame::Root => None,
            Frame::Container { indent, .. }
            | Frame::Field { indent, .. }
            | Frame::ValueContinuation { indent, .. }
            | Frame::ListContinuation { indent, .. } => Some(*indent),
        }
    }

    fn line(&self) -> usize {
        match self {
            Frame::Root => 0,
            Frame::Container { line, .. }
            | Frame::Field { line, .. }
            | Frame::ValueContinuation { line, .. }
            | Frame::ListContinuation { line, .. } => *line,
        }
    }
}

struct Parser {
    store: ValueStore,
    frames: Vec<Frame>,
}

impl Parser {
    fn new() -> Self {
        Self {
            store: ValueStore::new(),
            frames: vec![Frame::Root],
        }
    }

    fn top(&self, line: usize) -> Result<&Frame> {
        self.frames.last().ok_or(SettingsError::StackExhausted { line })
    }

    fn pop(&mut self, line: usize) -> Result<Frame> {
        if self.frames.len() <= 1 {
            return Err(SettingsError::StackExhausted { line });
        }
        self.frames.pop().ok_or(SettingsError::StackExhausted { line })
    }

    fn feed(&mut self, line: Line) -> Result<()> {
        trace!("{line}");
        let Line {
            number,
            indent,
            token,
            text,
        } = line;
        match token {
            Token::Comment(_) => Ok(()),
            Token::ObjectDef(relative) => {
                self.settle(number, indent, &text)?;
                self.open_container(number, indent, &relative, &text)
            }
            Token::FieldDef { key, value } => {
                self.settle(number, indent, &text)?;
                self.open_field(number, indent, key, value, &text)
            }
            Token::ValueContinuation(value) => {
                self.continue_value(number, indent, value, &text)
            }
            Token::ListContinuation(value) => self.continue_list(number, indent, value, &text),
        }
    }

    /// Close frames until the top one can parent a definition at `indent`.
    fn settle(&mut self, line: usize, indent: usize, text: &str) -> Result<()> {
        let top = self.top(line)?.indent();
        match top {
            None => Ok(()),
            Some(top) if top < indent => Ok(()),
            Some(top) if top == indent => self.pop(line).map(drop),
            Some(_) => loop {
                self.pop(line)?;
                let top = self.top(line)?.indent();
                match top {
                    Some(top) if top == indent => return self.pop(line).map(drop),
                    Some(top) if top > indent => continue,
                    _ => {
                        return Err(SettingsError::grammar(
                            line,
                            text,
                            "indentation does not match any enclosing level",
                        ));
                    }
                }
            },
        }
    }

    /// Container path a new definition is placed into.
    fn parent_path(&self, line: usize, text: &str) -> Result<Path> {
        match self.top(line)? {
            Frame::Root => Ok(Path::root()),
            Frame::Container { path, .. } => Ok(path.clone()),
            frame => Err(SettingsError::grammar(
                line,
                text,
                format!(
                    "definition nested under the field opened on line {}",
                    frame.line()
                ),
            )),
        }
    }

    fn open_container(
        &mut self,
        line: usize,
        indent: usize,
        relative: &Path,
        text: &str,
    ) -> Result<()> {
        let path = self.parent_path(line, text)?.concat(relative);
        if let (true, Some(parent), Some(name)) = (
            self.store.contains_container(&path),
            path.parent(),
            path.last(),
        ) {
            return Err(SettingsError::Duplicate {
                line,
                path: parent,
                name: name.to_string(),
            });
        }
        self.store.put_container(&path).map_err(|e| match e {
            SettingsError::TypeConflict { path, name, .. } => {
                SettingsError::Duplicate { line, path, name }
            }
            other => other,
        })?;
        debug!("Created container {path} (line {line})");
        self.frames.push(Frame::Container { line, indent, path });
        Ok(())
    }

    fn open_field(
        &mut self,
        line: usize,
        indent: usize,
        name: String,
        value: String,
        text: &str,
    ) -> Result<()> {
        let path = self.parent_path(line, text)?;
        if self.store.contains(&path, &name) || self.store.contains_container(&path.child(&name))
        {
            return Err(SettingsError::Duplicate { line, path, name });
        }
        self.store.put_field(&path, &name, value)?;
        debug!(
            "Created field {} (line {line})",
            crate::store::field_key(&path, &name)
        );
        self.frames.push(Frame::Field {
            line,
            indent,
            path,
            name,
        });
        Ok(())
    }

    fn continue_value(
        &mut self,
        line: usize,
        indent: usize,
        value: String,
        text: &str,
    ) -> Result<()> {
        let (path, name, replaces_top) = match self.top(line)? {
            Frame::Field {
                indent: at,
                path,
                name,
                ..
            } if *at < indent => (path.clone(), name.clone(), false),
            Frame::ValueContinuation {
                indent: at,
                path,
                name,
                ..
            } if *at == indent => (path.clone(), name.clone(), true),
            frame => return Err(misplaced_continuation(line, text, frame)),
        };
        if replaces_top {
            self.pop(line)?;
        }
        let joined = format!("{}\n{value}", self.store.get_field(&path, &name)?);
        self.store.put_field(&path, &name, joined)?;
        self.frames.push(Frame::ValueContinuation {
            line,
            indent,
            path,
            name,
        });
        Ok(())
    }

    fn continue_list(
        &mut self,
        line: usize,
        indent: usize,
        value: String,
        text: &str,
    ) -> Result<()> {
        let (path, name, replaces_top) = match self.top(line)? {
            Frame::Field {
                indent: at,
                path,
                name,
                ..
            } if *at < indent => (path.clone(), name.clone(), false),
            Frame::ListContinuation {
                indent: at,
                path,
                name,
                ..
            } if *at == indent => (path.clone(), name.clone(), true),
            frame => return Err(misplaced_continuation(line, text, frame)),
        };
        if replaces_top {
            self.pop(line)?;
        }
        self.store.append_field(&path, &name, value)?;
        self.frames.push(Frame::ListContinuation {
            line,
            indent,
            path,
            name,
        });
        Ok(())
    }

    fn finish(self) -> ValueStore {
        self.store
    }
}

fn misplaced_continuation(line: usize, text: &str, top: &Frame) -> SettingsError {
    let reason = match top {
        Frame::Root | Frame::Container { .. } => {
            "continuation line without a preceding field".to_string()
        }
        frame => format!(
            "continuation does not line up with the field opened on line {}",
            frame.line()
        ),
    };
    SettingsError::grammar(line, text, reason)
}

/// Parse CIF text from a buffered reader.
pub fn from_reader<R: BufRead>(reader: R) -> Result<ValueStore> {
    let mut parser = Parser::new();
    for line in lines(reader) {
        parser.feed(line?)?;
    }
    Ok(parser.finish())
}

/// Parse an in-memory CIF document.
pub fn from_str(text: &str) -> Result<ValueStore> {
    from_reader(text.as_bytes())
}
