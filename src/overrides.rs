//! Convert dotted-key overrides into a [`ValueStore`].
//!
//! Each `("database.url", "pg://")` pair becomes field `url` in container
//! `database`. Overrides are the highest-precedence layer in
//! [`resolve`](crate::resolve).

use crate::error::{Result, SettingsError};
use crate::path::split_field_key;
use crate::store::ValueStore;

/// Convert dotted-key overrides into a store.
///
/// If multiple entries target the same key, the last one wins. An entry
/// that needs a container where an earlier entry set a field (or the other
/// way round) fails with `TypeConflict`.
pub fn overrides_to_store(entries: &[(String, String)]) -> Result<ValueStore> {
    let mut store = ValueStore::new();
    for (dotted_key, value) in entries {
        let (path, name) = split_field_key(dotted_key)?;
        store.put_container(&path)?;
        store.put_field(&path, &name, value.as_str())?;
    }
    Ok(store)
}

/// Parse a `key=value` override. Only the first `=` separates; the value
/// may contain more of them.
pub fn parse_override(s: &str) -> Result<(String, String)> {
    let (key, value) = s.split_once('=').ok_or_else(|| SettingsError::InvalidValue {
        key: s.to_string(),
        reason: "expected key=value".into(),
    })?;
    split_field_key(key)?;
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::path;
    use crate::path::Path;

    fn entries(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn flat_key() {
        let store = overrides_to_store(&entries(&[("host", "0.0.0.0")])).unwrap();
        assert_eq!(store.get_field(&Path::root(), "host").unwrap(), "0.0.0.0");
    }

    #[test]
    fn nested_key() {
        let store = overrides_to_store(&entries(&[("database.url", "pg://")])).unwrap();
        assert_eq!(store.get_field(&path("database"), "url").unwrap(), "pg://");
    }

    #[test]
    fn deep_nesting() {
        let store = overrides_to_store(&entries(&[("a.b.c.d", "42")])).unwrap();
        assert_eq!(store.get_field(&path("a.b.c"), "d").unwrap(), "42");
    }

    #[test]
    fn empty_list_empty_store() {
        assert!(overrides_to_store(&[]).unwrap().is_empty());
    }

    #[test]
    fn last_entry_wins_for_same_key() {
        let store = overrides_to_store(&entries(&[("port", "3000"), ("port", "5000")])).unwrap();
        assert_eq!(store.get_field(&Path::root(), "port").unwrap(), "5000");
    }

    #[test]
    fn field_then_container_conflicts() {
        let err = overrides_to_store(&entries(&[("database", "x"), ("database.url", "y")]))
            .unwrap_err();
        assert!(err.is_type_conflict());
    }

    #[test]
    fn invalid_keys_rejected() {
        for key in ["", ".", "a..b"] {
            assert!(overrides_to_store(&entries(&[(key, "v")])).is_err(), "{key:?}");
        }
    }

    #[test]
    fn parse_override_success() {
        assert_eq!(
            parse_override("database.url=pg://host").unwrap(),
            ("database.url".to_string(), "pg://host".to_string())
        );
    }

    #[test]
    fn parse_override_extra_equals() {
        assert_eq!(
            parse_override("greeting=hello=world").unwrap(),
            ("greeting".to_string(), "hello=world".to_string())
        );
    }

    #[test]
    fn parse_override_empty_value() {
        assert_eq!(
            parse_override("debug=").unwrap(),
            ("debug".to_string(), String::new())
        );
    }

    #[test]
    fn parse_override_missing_eq() {
        assert!(matches!(
            parse_override("no equal sign"),
            Err(SettingsError::InvalidValue { .. })
        ));
        assert!(parse_override("=value").is_err());
    }
}
