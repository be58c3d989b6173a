//! Render a [`ValueStore`] as CIF text.
//!
//! Fields are written before child containers at every level, nesting is
//! four spaces, and values are written exactly as stored (no space is
//! inserted after `=`), so parsing the output yields an equal store.

use crate::error::{Result, SettingsError};
use crate::path::{Path, write_segment};
use crate::store::{Container, Entry, FieldValue, ValueStore, field_key};

const INDENT: usize = 4;

/// Serialize a store to CIF text.
///
/// Fails with `InvalidValue` for anything CIF cannot express: empty names,
/// names containing a line break, list elements containing a newline,
/// single-element lists (they would read back as scalars) and value lines
/// ending in `\r` (the reader drops it as part of a CRLF terminator).
pub fn to_string(store: &ValueStore) -> Result<String> {
    let mut out = String::new();
    write_container(&mut out, store.root(), &Path::root(), 0)?;
    Ok(out)
}

fn write_container(
    out: &mut String,
    container: &Container,
    path: &Path,
    depth: usize,
) -> Result<()> {
    for (name, entry) in container.iter() {
        if let Entry::Field(value) = entry {
            write_field(out, path, name, value, depth)?;
        }
    }
    for (name, entry) in container.iter() {
        if let Entry::Container(child) = entry {
            pad(out, depth);
            push_name(out, path, name)?;
            out.push_str(":\n");
            write_container(out, child, &path.child(name), depth + INDENT)?;
        }
    }
    Ok(())
}

fn write_field(
    out: &mut String,
    path: &Path,
    name: &str,
    value: &FieldValue,
    depth: usize,
) -> Result<()> {
    let invalid = |reason: &str| SettingsError::InvalidValue {
        key: field_key(path, name),
        reason: reason.to_string(),
    };

    pad(out, depth);
    push_name(out, path, name)?;
    out.push('=');
    match value {
        FieldValue::Scalar(text) => {
            if text.split('\n').any(|line| line.ends_with('\r')) {
                return Err(invalid("value lines cannot end in a carriage return"));
            }
            let mut lines = text.split('\n');
            out.push_str(lines.next().unwrap_or_default());
            out.push('\n');
            for line in lines {
                pad(out, depth + INDENT);
                out.push('|');
                out.push_str(line);
                out.push('\n');
            }
        }
        FieldValue::List(items) => {
            if items.len() < 2 {
                return Err(invalid("single-element lists cannot be written as CIF"));
            }
            if items.iter().any(|item| item.contains('\n')) {
                return Err(invalid("list elements cannot span lines"));
            }
            if items.iter().any(|item| item.ends_with('\r')) {
                return Err(invalid("list elements cannot end in a carriage return"));
            }
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    pad(out, depth + INDENT);
                    out.push(',');
                }
                out.push_str(item);
                out.push('\n');
            }
        }
    }
    Ok(())
}

fn pad(out: &mut String, depth: usize) {
    out.extend(std::iter::repeat_n(' ', depth));
}

fn push_name(out: &mut String, path: &Path, name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "empty names cannot be written as CIF"
    } else if name.contains(['\n', '\r']) {
        "names cannot contain line breaks"
    } else {
        write_segment(out, name).ok();
        return Ok(());
    };
    Err(SettingsError::InvalidValue {
        key: field_key(path, name),
        reason: reason.to_string(),
    })
}
