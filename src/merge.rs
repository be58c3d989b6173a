//! Field-by-field merging of value stores.
//!
//! A [`MergeEngine`] folds a *proposed* store into a *current* accumulator.
//! For every field of the proposed store it resolves a [`MergeStrategy`]:
//!
//! 1. a field rule registered for exactly `(path, name)`,
//! 2. else a container rule registered for `path`,
//! 3. else the engine default.
//!
//! The strategy combines the current value (if any) with the proposed one
//! and the result is written back into the current store. When the current
//! store has no value, the proposed value is used directly whatever the
//! strategy.

use std::collections::HashMap;
use std::fmt;

use log::{trace, warn};

use crate::error::Result;
use crate::path::Path;
use crate::store::{FieldValue, ValueStore};

/// Combines a current and proposed value at the same field location.
pub trait MergeStrategy: fmt::Debug {
    fn merge(&self, current: &FieldValue, proposed: &FieldValue) -> Result<FieldValue>;
}

/// The proposed value wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct Replace;

/// The current value wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct Keep;

/// Current and proposed values are concatenated into one list.
#[derive(Debug, Clone, Copy, Default)]
pub struct Append;

impl MergeStrategy for Replace {
    fn merge(&self, _current: &FieldValue, proposed: &FieldValue) -> Result<FieldValue> {
        Ok(proposed.clone())
    }
}

impl MergeStrategy for Keep {
    fn merge(&self, current: &FieldValue, _proposed: &FieldValue) -> Result<FieldValue> {
        Ok(current.clone())
    }
}

impl MergeStrategy for Append {
    fn merge(&self, current: &FieldValue, proposed: &FieldValue) -> Result<FieldValue> {
        let mut merged = current.values().to_vec();
        merged.extend_from_slice(proposed.values());
        Ok(FieldValue::List(merged))
    }
}

type RuleKey = (Path, Option<String>);

/// Folds proposed stores into a current store using per-field strategies.
#[derive(Debug)]
pub struct MergeEngine {
    default: Box<dyn MergeStrategy>,
    rules: HashMap<RuleKey, Box<dyn MergeStrategy>>,
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self::new(Replace)
    }
}

impl MergeEngine {
    pub fn new<S: MergeStrategy + 'static>(default: S) -> Self {
        Self {
            default: Box::new(default),
            rules: HashMap::new(),
        }
    }

    /// Use `strategy` for the field `name` in the container at `path`.
    pub fn field_rule<S: MergeStrategy + 'static>(
        mut self,
        path: Path,
        name: &str,
        strategy: S,
    ) -> Self {
        self.rules
            .insert((path, Some(name.to_string())), Box::new(strategy));
        self
    }

    /// Use `strategy` for every field directly inside the container at `path`
    /// that has no field rule of its own.
    pub fn container_rule<S: MergeStrategy + 'static>(mut self, path: Path, strategy: S) -> Self {
        self.rules.insert((path, None), Box::new(strategy));
        self
    }

    /// Resolve the strategy for a field: field rule, then container rule,
    /// then the default.
    pub fn strategy_for(&self, path: &Path, name: &str) -> &dyn MergeStrategy {
        let field_key = (path.clone(), Some(name.to_string()));
        if let Some(strategy) = self.rules.get(&field_key) {
            return strategy.as_ref();
        }
        let container_key = (path.clone(), None);
        if let Some(strategy) = self.rules.get(&container_key) {
            return strategy.as_ref();
        }
        self.default.as_ref()
    }

    /// Merge every field of `proposed` into `current`, in place.
    ///
    /// A strategy that fails is not fatal: the proposed value is written
    /// verbatim for that field and merging continues. Errors writing into
    /// `current` (a proposed field where `current` holds a container) are
    /// returned.
    pub fn merge<'a>(
        &self,
        current: &'a mut ValueStore,
        proposed: &ValueStore,
    ) -> Result<&'a mut ValueStore> {
        for (path, name, proposed_value) in proposed.iter_fields() {
            let value = match current.get(&path, name) {
                Ok(current_value) => {
                    let strategy = self.strategy_for(&path, name);
                    match strategy.merge(current_value, proposed_value) {
                        Ok(merged) => merged,
                        Err(e) => {
                            warn!(
                                "Merge strategy {strategy:?} failed for {}: {e}; using proposed value",
                                crate::store::field_key(&path, name)
                            );
                            proposed_value.clone()
                        }
                    }
                }
                Err(_) => proposed_value.clone(),
            };
            trace!("Merged {} = {value:?}", crate::store::field_key(&path, name));
            current.put_container(&path)?;
            current.put_value(&path, name, value)?;
        }
        Ok(current)
    }

    /// Fold `layers` (lowest precedence first) into a fresh store.
    pub fn merge_all<I>(&self, layers: I) -> Result<ValueStore>
    where
        I: IntoIterator<Item = ValueStore>,
    {
        let mut merged = ValueStore::new();
        for layer in layers {
            self.merge(&mut merged, &layer)?;
        }
        Ok(merged)
    }
}
