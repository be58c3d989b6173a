//! Read-only typed access to a resolved configuration.
//!
//! Keys are dotted strings naming a field: `"database.pool_size"` is field
//! `pool_size` in container `database`. Every accessor returns `Ok(None)`
//! when the field is absent and a [`Conversion`](crate::SettingsError::Conversion)
//! error when it is present but does not parse.
//!
//! ```ignore
//! let ns = Namespace::new(resolve(&engine, input)?);
//! let timeout = ns.get_duration("database.timeout")?.unwrap_or(Duration::from_secs(30));
//! let replicas = ns.get_list("database.replicas")?.unwrap_or_default();
//! ```

use std::time::Duration;

use crate::converters;
use crate::error::Result;
use crate::path::split_field_key;
use crate::store::{FieldValue, ValueStore};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    store: ValueStore,
}

impl From<ValueStore> for Namespace {
    fn from(store: ValueStore) -> Self {
        Self::new(store)
    }
}

impl Namespace {
    pub fn new(store: ValueStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    pub fn into_store(self) -> ValueStore {
        self.store
    }

    /// True if a field of either shape exists at `key`.
    pub fn contains(&self, key: &str) -> bool {
        matches!(self.get_raw(key), Ok(Some(_)))
    }

    /// The field exactly as stored.
    pub fn get_raw(&self, key: &str) -> Result<Option<&FieldValue>> {
        let (path, name) = split_field_key(key)?;
        absent_as_none(self.store.get(&path, &name))
    }

    fn scalar(&self, key: &str) -> Result<Option<&str>> {
        let (path, name) = split_field_key(key)?;
        absent_as_none(self.store.get_field(&path, &name))
    }

    fn convert<T>(&self, key: &str, f: fn(&str) -> Result<T>) -> Result<Option<T>> {
        self.scalar(key)?.map(f).transpose()
    }

    /// A scalar field with surrounding whitespace removed.
    pub fn get_str(&self, key: &str) -> Result<Option<String>> {
        Ok(self.scalar(key)?.map(|s| s.trim().to_string()))
    }

    /// A scalar field with every whitespace run collapsed to one space.
    /// Useful for values spread over continuation lines.
    pub fn get_flattened(&self, key: &str) -> Result<Option<String>> {
        Ok(self.scalar(key)?.map(converters::to_flattened))
    }

    pub fn get_int(&self, key: &str) -> Result<Option<i64>> {
        self.convert(key, converters::to_int)
    }

    pub fn get_float(&self, key: &str) -> Result<Option<f64>> {
        self.convert(key, converters::to_float)
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        self.convert(key, converters::to_bool)
    }

    pub fn get_duration(&self, key: &str) -> Result<Option<Duration>> {
        self.convert(key, converters::to_duration)
    }

    /// Size in bytes.
    pub fn get_size(&self, key: &str) -> Result<Option<u64>> {
        self.convert(key, converters::to_size)
    }

    /// A percentage as a fraction: `42%` is `0.42`.
    pub fn get_percentage(&self, key: &str) -> Result<Option<f64>> {
        self.convert(key, converters::to_percentage)
    }

    /// A list field with each element trimmed. A scalar field reads as a
    /// one-element list.
    pub fn get_list(&self, key: &str) -> Result<Option<Vec<String>>> {
        Ok(self.get_raw(key)?.map(|value| {
            value
                .values()
                .iter()
                .map(|item| item.trim().to_string())
                .collect()
        }))
    }

    /// Every field as `(dotted key, value)`, depth-first in name order.
    pub fn iter(&self) -> impl Iterator<Item = (String, &FieldValue)> {
        self.store
            .iter_fields()
            .map(|(path, name, value)| (crate::store::field_key(&path, name), value))
    }
}

fn absent_as_none<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
