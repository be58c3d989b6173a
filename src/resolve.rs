//! Core resolution pipeline: fold every configuration layer into one store.
//!
//! Operates on pre-loaded data ([`ResolveInput`]) with no I/O, so the whole
//! pipeline is testable with synthetic inputs. Layers, lowest precedence
//! first:
//!
//! 1. config files, in the order given (later files win),
//! 2. environment variables,
//! 3. overrides.
//!
//! Each layer is parsed into a [`ValueStore`] and merged into the
//! accumulator by the caller's [`MergeEngine`], so per-field strategies
//! (for example appending list fields across files) apply to every layer.

use std::path::PathBuf;

use log::debug;

use crate::env::EnvironmentParser;
use crate::error::Result;
use crate::file;
use crate::merge::MergeEngine;
use crate::overrides;
use crate::store::ValueStore;

/// All pre-loaded data needed to resolve a configuration. No I/O happens here.
#[derive(Debug, Clone, Default)]
pub struct ResolveInput {
    /// File contents in precedence order: first = lowest priority, last = highest.
    /// The path picks the format and labels errors.
    pub files: Vec<(PathBuf, String)>,
    /// Raw environment variable pairs (pass `std::env::vars().collect()` or synthetic data).
    pub env_vars: Vec<(String, String)>,
    /// How to map `env_vars` into the tree. `None` disables the environment layer.
    pub environment: Option<EnvironmentParser>,
    /// Overrides as `(dotted_key, value)` pairs.
    pub overrides: Vec<(String, String)>,
}

/// Resolve configuration from pre-loaded inputs.
pub fn resolve(engine: &MergeEngine, input: ResolveInput) -> Result<ValueStore> {
    let mut merged = ValueStore::new();

    for (path, content) in &input.files {
        let layer = file::parse_content(path, content)?;
        debug!("Merging file layer {}", path.display());
        engine.merge(&mut merged, &layer)?;
    }

    if let Some(environment) = &input.environment {
        let layer = environment.parse(input.env_vars)?;
        debug!("Merging environment layer");
        engine.merge(&mut merged, &layer)?;
    }

    if !input.overrides.is_empty() {
        let layer = overrides::overrides_to_store(&input.overrides)?;
        debug!("Merging {} overrides", input.overrides.len());
        engine.merge(&mut merged, &layer)?;
    }

    Ok(merged)
}
