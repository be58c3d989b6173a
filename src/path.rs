//! Dotted paths addressing containers in a [`ValueStore`](crate::ValueStore).
//!
//! A path is an ordered list of non-empty segments. The empty path is the
//! root of the tree and renders as `.`. Segments follow the same lexical
//! rule as CIF keys: a bare segment is made of alphanumerics, `_` and `-`;
//! anything else is written quoted (`"spaces in key"`). Rendering quotes
//! exactly the segments that need it, so `Path::parse(&p.to_string()) == p`.

use std::fmt;
use std::str::FromStr;

use crate::error::SettingsError;

/// An immutable location in the value tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// The root path (no segments).
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted path literal such as `database.url` or `app."my key"`.
    ///
    /// `""` and `"."` both denote the root. Empty segments (`a..b`, `.a`,
    /// `a.`) are rejected.
    pub fn parse(input: &str) -> Result<Self, SettingsError> {
        if input.is_empty() || input == "." {
            return Ok(Self::root());
        }
        let invalid = |reason: &str| SettingsError::InvalidPath {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut rest = input;
        loop {
            let (segment, after) = scan_segment(rest).map_err(invalid)?;
            segments.push(segment);
            if after.is_empty() {
                break;
            }
            rest = after
                .strip_prefix('.')
                .ok_or_else(|| invalid("expected '.' between segments"))?;
        }
        Ok(Self { segments })
    }

    /// Build a path from explicit segments. Segments are taken verbatim.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::root().join_all(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.segments.iter()
    }

    /// The final segment, or `None` for the root.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The enclosing path, or `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        let (_, init) = self.segments.split_last()?;
        Some(Self {
            segments: init.to_vec(),
        })
    }

    /// Append a single segment, returning a new path.
    pub fn join(&self, segment: impl Into<String>) -> Result<Path, SettingsError> {
        let segment = segment.into();
        if segment.is_empty() {
            return Err(SettingsError::InvalidPath {
                input: format!("{self}"),
                reason: "cannot append an empty segment".into(),
            });
        }
        Ok(self.child(segment))
    }

    /// Append a list of segments, returning a new path.
    pub fn join_all<I, S>(&self, segments: I) -> Result<Path, SettingsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut path = self.clone();
        for segment in segments {
            path = path.join(segment)?;
        }
        Ok(path)
    }

    /// Concatenate two paths.
    pub fn concat(&self, other: &Path) -> Path {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    // Callers guarantee `segment` is non-empty (it came out of another Path
    // or a container name).
    pub(crate) fn child(&self, segment: impl Into<String>) -> Path {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// The first `len` segments.
    pub(crate) fn prefix(&self, len: usize) -> Path {
        Self {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str(".");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write_segment(f, segment)?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl TryFrom<&str> for Path {
    type Error = SettingsError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Path::parse(s)
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

/// Split a dotted field key such as `database.url` into its container path
/// and field name.
pub(crate) fn split_field_key(key: &str) -> Result<(Path, String), SettingsError> {
    let path = Path::parse(key)?;
    match (path.parent(), path.last()) {
        (Some(parent), Some(name)) => Ok((parent, name.to_string())),
        _ => Err(SettingsError::InvalidPath {
            input: key.to_string(),
            reason: "expected a field name".into(),
        }),
    }
}

pub(crate) fn is_bare_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

pub(crate) fn is_bare(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(is_bare_char)
}

/// Write a segment, quoting it when it is not bare.
pub(crate) fn write_segment<W: fmt::Write>(w: &mut W, segment: &str) -> fmt::Result {
    if is_bare(segment) {
        return w.write_str(segment);
    }
    w.write_char('"')?;
    for c in segment.chars() {
        if c == '"' || c == '\\' {
            w.write_char('\\')?;
        }
        w.write_char(c)?;
    }
    w.write_char('"')
}

/// Scan one bare or quoted segment from the start of `input`.
///
/// Returns the unquoted segment and the unconsumed remainder.
pub(crate) fn scan_segment(input: &str) -> Result<(String, &str), &'static str> {
    let mut chars = input.char_indices();
    let Some((_, first)) = chars.next() else {
        return Err("expected a path segment");
    };

    if first == '"' || first == '\'' {
        let mut segment = String::new();
        let mut escaped = false;
        for (i, c) in chars {
            if escaped {
                segment.push(c);
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == first {
                if segment.is_empty() {
                    return Err("empty quoted segment");
                }
                return Ok((segment, &input[i + c.len_utf8()..]));
            } else {
                segment.push(c);
            }
        }
        return Err("unterminated quoted segment");
    }

    let end = input
        .char_indices()
        .find(|(_, c)| !is_bare_char(*c))
        .map_or(input.len(), |(i, _)| i);
    if end == 0 {
        return Err("expected a path segment");
    }
    Ok((input[..end].to_string(), &input[end..]))
}
