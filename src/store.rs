//! The hierarchical value store.
//!
//! A [`ValueStore`] is a tree of named containers. Each container maps local
//! names to an [`Entry`]: a scalar field, a non-empty list field, or a child
//! container. Fields and containers share one namespace per container, so a
//! name can never denote both.
//!
//! Every operation is addressed by a container [`Path`] relative to the root
//! plus, for field operations, a field name:
//!
//! ```ignore
//! let mut store = ValueStore::new();
//! let db = Path::parse("database")?;
//! store.put_container(&db)?;
//! store.put_field(&db, "url", "pg://localhost")?;
//! store.append_field(&db, "replica", "pg://a")?;
//! store.append_field(&db, "replica", "pg://b")?;
//! assert_eq!(store.get_field_list(&db, "replica")?, ["pg://a", "pg://b"]);
//! ```
//!
//! Containers must exist before fields are written into them; `put_field`
//! on a missing container fails with
//! [`ContainerNotFound`](SettingsError::ContainerNotFound).

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SettingsError};
use crate::path::Path;

/// The kind of an entry, used in type-conflict diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Container,
    Scalar,
    List,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntryKind::Container => "container",
            EntryKind::Scalar => "scalar",
            EntryKind::List => "list",
        })
    }
}

/// The value of a field: one string, or an ordered non-empty list of strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn kind(&self) -> EntryKind {
        match self {
            FieldValue::Scalar(_) => EntryKind::Scalar,
            FieldValue::List(_) => EntryKind::List,
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(s) => Some(s.as_str()),
            FieldValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items.as_slice()),
            FieldValue::Scalar(_) => None,
        }
    }

    /// All values in order; a scalar is a one-element slice.
    pub fn values(&self) -> &[String] {
        match self {
            FieldValue::Scalar(s) => std::slice::from_ref(s),
            FieldValue::List(items) => items.as_slice(),
        }
    }

    pub fn into_values(self) -> Vec<String> {
        match self {
            FieldValue::Scalar(s) => vec![s],
            FieldValue::List(items) => items,
        }
    }

    /// Append one value, promoting a scalar to a two-element list.
    pub fn push(&mut self, value: String) {
        match self {
            FieldValue::List(items) => items.push(value),
            FieldValue::Scalar(first) => {
                let first = std::mem::take(first);
                *self = FieldValue::List(vec![first, value]);
            }
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Scalar(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Scalar(s.to_string())
    }
}

/// One named slot in a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Field(FieldValue),
    Container(Container),
}

impl Entry {
    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::Field(value) => value.kind(),
            Entry::Container(_) => EntryKind::Container,
        }
    }
}

/// A node in the tree. Read-only outside this module; mutation goes through
/// [`ValueStore`] so path invariants hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Container {
    entries: BTreeMap<String, Entry>,
}

impl Container {
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        match self.entries.get(name)? {
            Entry::Field(value) => Some(value),
            Entry::Container(_) => None,
        }
    }

    pub fn child(&self, name: &str) -> Option<&Container> {
        match self.entries.get(name)? {
            Entry::Container(child) => Some(child),
            Entry::Field(_) => None,
        }
    }

    /// Entries in lexicographic order of name.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Generic nested-mapping form of a store, for interchange and debugging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Value(String),
    List(Vec<String>),
    Map(BTreeMap<String, Node>),
}

/// A tree of containers holding scalar and list fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueStore {
    root: Container,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> &Container {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Ensure a container exists at `path`, creating missing intermediates.
    ///
    /// Idempotent. Fails with `TypeConflict` if a segment names a field.
    pub fn put_container(&mut self, path: &Path) -> Result<()> {
        let mut container = &mut self.root;
        for (depth, segment) in path.iter().enumerate() {
            let entry = container
                .entries
                .entry(segment.clone())
                .or_insert_with(|| Entry::Container(Container::default()));
            container = match entry {
                Entry::Container(child) => child,
                Entry::Field(value) => {
                    return Err(SettingsError::TypeConflict {
                        path: path.prefix(depth),
                        name: segment.clone(),
                        expected: EntryKind::Container,
                        found: value.kind(),
                    });
                }
            };
        }
        Ok(())
    }

    /// Delete the container at `path` with its whole subtree.
    pub fn remove_container(&mut self, path: &Path) -> Result<()> {
        let (Some(parent), Some(name)) = (path.parent(), path.last()) else {
            return Err(SettingsError::InvalidPath {
                input: path.to_string(),
                reason: "the root container cannot be removed".into(),
            });
        };
        let container = self.resolve_mut(&parent)?;
        match container.entries.get(name) {
            Some(Entry::Container(_)) => {
                container.entries.remove(name);
                Ok(())
            }
            Some(Entry::Field(value)) => Err(SettingsError::TypeConflict {
                path: parent,
                name: name.to_string(),
                expected: EntryKind::Container,
                found: value.kind(),
            }),
            None => Err(SettingsError::ContainerNotFound(path.clone())),
        }
    }

    pub fn get_container(&self, path: &Path) -> Result<&Container> {
        self.resolve(path)
    }

    pub fn contains_container(&self, path: &Path) -> bool {
        self.resolve(path).is_ok()
    }

    /// Set a scalar field, replacing any previous scalar or list.
    pub fn put_field(&mut self, path: &Path, name: &str, value: impl Into<String>) -> Result<()> {
        self.put_value(path, name, FieldValue::Scalar(value.into()))
    }

    /// Set a list field, replacing any previous value. `values` must be non-empty.
    pub fn put_field_list(&mut self, path: &Path, name: &str, values: Vec<String>) -> Result<()> {
        self.put_value(path, name, FieldValue::List(values))
    }

    /// Set a field of either shape.
    pub fn put_value(&mut self, path: &Path, name: &str, value: FieldValue) -> Result<()> {
        if matches!(&value, FieldValue::List(items) if items.is_empty()) {
            return Err(SettingsError::InvalidValue {
                key: field_key(path, name),
                reason: "list fields cannot be empty".into(),
            });
        }
        let container = self.resolve_mut(path)?;
        if let Some(Entry::Container(_)) = container.entries.get(name) {
            return Err(SettingsError::TypeConflict {
                path: path.clone(),
                name: name.to_string(),
                expected: value.kind(),
                found: EntryKind::Container,
            });
        }
        container
            .entries
            .insert(name.to_string(), Entry::Field(value));
        Ok(())
    }

    /// Append to a field: absent becomes a scalar, a scalar becomes a
    /// two-element list, a list grows by one.
    pub fn append_field(&mut self, path: &Path, name: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        let container = self.resolve_mut(path)?;
        match container.entries.get_mut(name) {
            None => {
                container
                    .entries
                    .insert(name.to_string(), Entry::Field(FieldValue::Scalar(value)));
            }
            Some(Entry::Field(current)) => current.push(value),
            Some(Entry::Container(_)) => {
                return Err(SettingsError::TypeConflict {
                    path: path.clone(),
                    name: name.to_string(),
                    expected: EntryKind::List,
                    found: EntryKind::Container,
                });
            }
        }
        Ok(())
    }

    /// Delete a field. Absent names are a no-op.
    pub fn remove_field(&mut self, path: &Path, name: &str) -> Result<()> {
        let container = self.resolve_mut(path)?;
        match container.entries.get(name) {
            Some(Entry::Container(_)) => Err(SettingsError::TypeConflict {
                path: path.clone(),
                name: name.to_string(),
                expected: EntryKind::Scalar,
                found: EntryKind::Container,
            }),
            Some(Entry::Field(_)) => {
                container.entries.remove(name);
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Look up a field of either shape.
    pub fn get(&self, path: &Path, name: &str) -> Result<&FieldValue> {
        let container = self.resolve(path)?;
        match container.entries.get(name) {
            Some(Entry::Field(value)) => Ok(value),
            Some(Entry::Container(_)) => Err(SettingsError::TypeConflict {
                path: path.clone(),
                name: name.to_string(),
                expected: EntryKind::Scalar,
                found: EntryKind::Container,
            }),
            None => Err(SettingsError::FieldNotFound {
                path: path.clone(),
                name: name.to_string(),
            }),
        }
    }

    pub fn get_field(&self, path: &Path, name: &str) -> Result<&str> {
        match self.get(path, name)? {
            FieldValue::Scalar(s) => Ok(s.as_str()),
            FieldValue::List(_) => Err(SettingsError::TypeConflict {
                path: path.clone(),
                name: name.to_string(),
                expected: EntryKind::Scalar,
                found: EntryKind::List,
            }),
        }
    }

    pub fn get_field_list(&self, path: &Path, name: &str) -> Result<&[String]> {
        match self.get(path, name) {
            Ok(FieldValue::List(items)) => Ok(items.as_slice()),
            Ok(FieldValue::Scalar(_)) => Err(SettingsError::TypeConflict {
                path: path.clone(),
                name: name.to_string(),
                expected: EntryKind::List,
                found: EntryKind::Scalar,
            }),
            Err(SettingsError::TypeConflict {
                path, name, found, ..
            }) => Err(SettingsError::TypeConflict {
                path,
                name,
                expected: EntryKind::List,
                found,
            }),
            Err(e) => Err(e),
        }
    }

    pub fn contains_field(&self, path: &Path, name: &str) -> bool {
        matches!(self.get(path, name), Ok(FieldValue::Scalar(_)))
    }

    pub fn contains_field_list(&self, path: &Path, name: &str) -> bool {
        matches!(self.get(path, name), Ok(FieldValue::List(_)))
    }

    /// True if a field of either shape exists.
    pub fn contains(&self, path: &Path, name: &str) -> bool {
        self.get(path, name).is_ok()
    }

    /// Every field as `(container path, name, value)`, depth-first with
    /// names in lexicographic order at each level.
    pub fn iter_fields(&self) -> Fields<'_> {
        Fields {
            stack: vec![(Path::root(), self.root.entries.iter())],
        }
    }

    /// Convert to the generic nested-mapping form.
    pub fn dump(&self) -> BTreeMap<String, Node> {
        dump_container(&self.root)
    }

    /// Build a store from the generic nested-mapping form.
    pub fn load(map: &BTreeMap<String, Node>) -> Result<Self> {
        let mut store = Self::new();
        load_into(&mut store, &Path::root(), map)?;
        Ok(store)
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(json_error)
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let map: BTreeMap<String, Node> = serde_json::from_value(value).map_err(json_error)?;
        Self::load(&map)
    }

    fn resolve(&self, path: &Path) -> Result<&Container> {
        let mut container = &self.root;
        for (depth, segment) in path.iter().enumerate() {
            container = match container.entries.get(segment) {
                Some(Entry::Container(child)) => child,
                Some(Entry::Field(value)) => {
                    return Err(traversal_conflict(path, depth, segment, value));
                }
                None => return Err(SettingsError::ContainerNotFound(path.clone())),
            };
        }
        Ok(container)
    }

    fn resolve_mut(&mut self, path: &Path) -> Result<&mut Container> {
        let mut container = &mut self.root;
        for (depth, segment) in path.iter().enumerate() {
            container = match container.entries.get_mut(segment) {
                Some(Entry::Container(child)) => child,
                Some(Entry::Field(value)) => {
                    return Err(traversal_conflict(path, depth, segment, value));
                }
                None => return Err(SettingsError::ContainerNotFound(path.clone())),
            };
        }
        Ok(container)
    }
}

impl Serialize for ValueStore {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.dump().serialize(serializer)
    }
}

/// Lazy depth-first iterator over the fields of a store.
pub struct Fields<'a> {
    stack: Vec<(Path, btree_map::Iter<'a, String, Entry>)>,
}

impl<'a> Iterator for Fields<'a> {
    type Item = (Path, &'a str, &'a FieldValue);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (path, entries) = self.stack.last_mut()?;
            match entries.next() {
                Some((name, Entry::Field(value))) => {
                    return Some((path.clone(), name.as_str(), value));
                }
                Some((name, Entry::Container(child))) => {
                    let child_path = path.child(name.as_str());
                    self.stack.push((child_path, child.entries.iter()));
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Dotted key of a field, quoted where needed so it parses back.
pub(crate) fn field_key(path: &Path, name: &str) -> String {
    path.child(name).to_string()
}

fn traversal_conflict(
    path: &Path,
    depth: usize,
    segment: &str,
    value: &FieldValue,
) -> SettingsError {
    SettingsError::TypeConflict {
        path: path.prefix(depth),
        name: segment.to_string(),
        expected: EntryKind::Container,
        found: value.kind(),
    }
}

fn dump_container(container: &Container) -> BTreeMap<String, Node> {
    container
        .entries
        .iter()
        .map(|(name, entry)| {
            let node = match entry {
                Entry::Field(FieldValue::Scalar(s)) => Node::Value(s.clone()),
                Entry::Field(FieldValue::List(items)) => Node::List(items.clone()),
                Entry::Container(child) => Node::Map(dump_container(child)),
            };
            (name.clone(), node)
        })
        .collect()
}

fn load_into(store: &mut ValueStore, path: &Path, map: &BTreeMap<String, Node>) -> Result<()> {
    for (name, node) in map {
        match node {
            Node::Value(s) => store.put_field(path, name, s.clone())?,
            Node::List(items) => store.put_field_list(path, name, items.clone())?,
            Node::Map(inner) => {
                let child = path.join(name.as_str())?;
                store.put_container(&child)?;
                load_into(store, &child, inner)?;
            }
        }
    }
    Ok(())
}

fn json_error(e: serde_json::Error) -> SettingsError {
    SettingsError::InvalidValue {
        key: "<json>".into(),
        reason: e.to_string(),
    }
}
