//! Loading configuration files into a [`ValueStore`].
//!
//! The format is picked from the file extension: `.toml` is read as TOML
//! (behind the `toml` feature, on by default), anything else as CIF.
//!
//! TOML values are flattened into the string-valued store:
//!
//! - strings, numbers, booleans and datetimes become scalars,
//! - arrays of those become list fields (empty arrays are skipped, since a
//!   list field cannot be empty),
//! - tables become containers,
//! - arrays of tables and nested arrays are rejected.

use std::path::{Path as FsPath, PathBuf};

use log::debug;

use crate::cif;
use crate::error::{Result, SettingsError};
use crate::store::ValueStore;

/// A supported configuration file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Cif,
    #[cfg(feature = "toml")]
    Toml,
}

impl Format {
    /// Pick a format from the file extension.
    pub fn from_path(path: &FsPath) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            #[cfg(feature = "toml")]
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Format::Toml,
            _ => Format::Cif,
        }
    }
}

/// Parse already-loaded file content. `path` picks the format and labels
/// errors.
pub fn parse_content(path: &FsPath, content: &str) -> Result<ValueStore> {
    match Format::from_path(path) {
        Format::Cif => cif::from_str(content).map_err(|e| SettingsError::InFile {
            path: path.to_path_buf(),
            source: Box::new(e),
        }),
        #[cfg(feature = "toml")]
        Format::Toml => toml_to_store(path, content),
    }
}

/// Read and parse a file.
///
/// A missing file yields an empty store unless `required`. Other I/O errors
/// are always returned.
pub fn load_file(path: impl AsRef<FsPath>, required: bool) -> Result<ValueStore> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(content) => {
            debug!("Loading configuration file {}", path.display());
            parse_content(path, &content)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
            debug!("Configuration file {} not found, skipping", path.display());
            Ok(ValueStore::new())
        }
        Err(e) => Err(SettingsError::IoError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Read every file in `paths` (lowest precedence first), skipping missing
/// ones. Returns `(path, content)` pairs ready for
/// [`ResolveInput::files`](crate::ResolveInput::files).
pub fn read_files<I, P>(paths: I) -> Result<Vec<(PathBuf, String)>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<FsPath>,
{
    let mut results = Vec::new();
    for path in paths {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => results.push((path.to_path_buf(), content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(SettingsError::IoError {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        }
    }
    Ok(results)
}

#[cfg(feature = "toml")]
fn toml_to_store(path: &FsPath, content: &str) -> Result<ValueStore> {
    let table: toml::Table = toml::from_str(content).map_err(|e| SettingsError::TomlError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut store = ValueStore::new();
    insert_table(&mut store, &crate::path::Path::root(), table)?;
    Ok(store)
}

#[cfg(feature = "toml")]
fn insert_table(store: &mut ValueStore, at: &crate::path::Path, table: toml::Table) -> Result<()> {
    use toml::Value;

    for (key, value) in table {
        match value {
            Value::Table(child) => {
                let child_path = at.join(key.as_str())?;
                store.put_container(&child_path)?;
                insert_table(store, &child_path, child)?;
            }
            Value::Array(items) if items.is_empty() => {
                debug!(
                    "Skipping empty array {}",
                    crate::store::field_key(at, &key)
                );
            }
            Value::Array(items) => {
                let values = items
                    .into_iter()
                    .map(|item| {
                        toml_scalar(item).ok_or_else(|| SettingsError::InvalidValue {
                            key: crate::store::field_key(at, &key),
                            reason: "arrays may only contain scalar values".into(),
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                store.put_field_list(at, &key, values)?;
            }
            scalar => {
                if let Some(text) = toml_scalar(scalar) {
                    store.put_field(at, &key, text)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(feature = "toml")]
fn toml_scalar(value: toml::Value) -> Option<String> {
    use toml::Value;

    match value {
        Value::String(s) => Some(s),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Datetime(dt) => Some(dt.to_string()),
        Value::Array(_) | Value::Table(_) => None,
    }
}
