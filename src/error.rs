use std::path::PathBuf;
use thiserror::Error;

use crate::path::Path;
use crate::store::EntryKind;

pub type Result<T, E = SettingsError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Syntax error on line {line}: {reason}: {text:?}")]
    Grammar {
        line: usize,
        text: String,
        reason: String,
    },

    #[error("Duplicate definition of '{name}' in {path} (line {line})")]
    Duplicate {
        line: usize,
        path: Path,
        name: String,
    },

    #[error("Container not found: {0}")]
    ContainerNotFound(Path),

    #[error("Field '{name}' not found in {path}")]
    FieldNotFound { path: Path, name: String },

    #[error("'{name}' in {path} is a {found}, expected a {expected}")]
    TypeConflict {
        path: Path,
        name: String,
        expected: EntryKind,
        found: EntryKind,
    },

    #[error("Invalid path {input:?}: {reason}")]
    InvalidPath { input: String, reason: String },

    #[error("Parser stack exhausted on line {line}")]
    StackExhausted { line: usize },

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to convert {value:?} to {target}")]
    Conversion { value: String, target: &'static str },

    #[error("Missing required environment variable {0}")]
    MissingEnvVar(String),

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read configuration stream: {0}")]
    ReadError(#[source] std::io::Error),

    #[cfg(feature = "toml")]
    #[error("Failed to parse {path}: {source}")]
    TomlError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{path}: {source}")]
    InFile {
        path: PathBuf,
        source: Box<SettingsError>,
    },
}

impl SettingsError {
    /// True for both container and field lookups that found nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SettingsError::ContainerNotFound(_) | SettingsError::FieldNotFound { .. }
        )
    }

    pub fn is_type_conflict(&self) -> bool {
        matches!(self, SettingsError::TypeConflict { .. })
    }

    pub(crate) fn grammar(line: usize, text: &str, reason: impl Into<String>) -> Self {
        SettingsError::Grammar {
            line,
            text: text.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grammar_error_formats_line_and_text() {
        let err = SettingsError::grammar(7, "\tfoo = bar", "tab character in indentation");
        let msg = err.to_string();
        assert!(msg.contains("line 7"));
        assert!(msg.contains("tab character"));
        assert!(msg.contains("foo = bar"));
    }

    #[test]
    fn duplicate_formats_path_and_name() {
        let err = SettingsError::Duplicate {
            line: 3,
            path: Path::parse("object1.object2").unwrap(),
            name: "field4".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("field4"));
        assert!(msg.contains("object1.object2"));
        assert!(msg.contains("line 3"));
    }

    #[test]
    fn type_conflict_formats_kinds() {
        let err = SettingsError::TypeConflict {
            path: Path::root(),
            name: "database".into(),
            expected: EntryKind::Container,
            found: EntryKind::Scalar,
        };
        assert_eq!(
            err.to_string(),
            "'database' in . is a scalar, expected a container"
        );
    }

    #[test]
    fn not_found_predicate() {
        assert!(SettingsError::ContainerNotFound(Path::root()).is_not_found());
        assert!(
            SettingsError::FieldNotFound {
                path: Path::root(),
                name: "x".into()
            }
            .is_not_found()
        );
        assert!(!SettingsError::MissingEnvVar("HOME".into()).is_not_found());
    }

    #[test]
    fn in_file_prefixes_path() {
        let err = SettingsError::InFile {
            path: "/etc/app.cif".into(),
            source: Box::new(SettingsError::StackExhausted { line: 2 }),
        };
        assert!(err.to_string().starts_with("/etc/app.cif: "));
    }
}
