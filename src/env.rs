//! Environment variables as a configuration layer.
//!
//! Two mappings are supported and can be combined:
//!
//! - **Explicit bindings**: `var("DATABASE_URL", path, "url", true)` places the
//!   variable's value in field `url` of the container at `path`. A required
//!   binding whose variable is unset fails with
//!   [`MissingEnvVar`](SettingsError::MissingEnvVar).
//! - **Prefix mapping**: with prefix `APP`, `APP__DATABASE__POOL_SIZE` becomes
//!   field `pool_size` in container `database`. Double underscore `__`
//!   separates nesting levels, a single `_` is literal, and segments are
//!   lowercased.
//!
//! Values are kept as strings; conversion happens at the
//! [`Namespace`](crate::Namespace) accessors.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::error::{Result, SettingsError};
use crate::path::Path;
use crate::store::{ValueStore, field_key};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Binding {
    var: String,
    path: Path,
    name: String,
    required: bool,
}

/// Builds a [`ValueStore`] from environment variables.
///
/// The variables are passed in as an iterator so tests can supply synthetic
/// data instead of `std::env::vars()`.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentParser {
    bindings: Vec<Binding>,
    prefix: Option<String>,
}

impl EnvironmentParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `env_var` to field `name` of the container at `path`.
    pub fn var(mut self, env_var: &str, path: Path, name: &str, required: bool) -> Self {
        self.bindings.push(Binding {
            var: env_var.to_string(),
            path,
            name: name.to_string(),
            required,
        });
        self
    }

    /// Map every `{prefix}__*` variable into the store.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Build a store from `(name, value)` pairs.
    ///
    /// Variables are processed in name order. Prefix-mapped variables are
    /// applied first, so an explicit binding to the same field wins. A
    /// prefix-mapped variable that collides with an earlier one of the other
    /// kind (`APP__DB` and `APP__DB__URL`) is skipped with a warning.
    pub fn parse(&self, vars: impl IntoIterator<Item = (String, String)>) -> Result<ValueStore> {
        let vars: BTreeMap<String, String> = vars.into_iter().collect();
        let mut store = ValueStore::new();

        if let Some(prefix) = &self.prefix {
            let needle = format!("{prefix}__");
            for (key, value) in &vars {
                let Some(rest) = key.strip_prefix(&needle) else {
                    continue;
                };
                let Some((path, name)) = split_segments(rest) else {
                    warn!("Ignoring environment variable {key}: empty name segment");
                    continue;
                };
                let placed = store
                    .put_container(&path)
                    .and_then(|()| store.put_field(&path, &name, value.as_str()));
                match placed {
                    Ok(()) => debug!("Environment variable {key} -> {}", field_key(&path, &name)),
                    Err(e) if e.is_type_conflict() => {
                        warn!("Ignoring environment variable {key}: {e}");
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        for binding in &self.bindings {
            match vars.get(&binding.var) {
                Some(value) => {
                    store.put_container(&binding.path)?;
                    store.put_field(&binding.path, &binding.name, value.as_str())?;
                    debug!(
                        "Environment variable {} -> {}",
                        binding.var,
                        field_key(&binding.path, &binding.name)
                    );
                }
                None if binding.required => {
                    return Err(SettingsError::MissingEnvVar(binding.var.clone()));
                }
                None => {}
            }
        }

        Ok(store)
    }
}

/// `DATABASE__POOL_SIZE` → (`database`, `pool_size`).
fn split_segments(rest: &str) -> Option<(Path, String)> {
    let mut segments: Vec<String> = rest.split("__").map(str::to_lowercase).collect();
    if segments.iter().any(String::is_empty) {
        return None;
    }
    let name = segments.pop()?;
    let path = Path::from_segments(segments).ok()?;
    Some((path, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::path;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn prefixed(pairs: &[(&str, &str)]) -> ValueStore {
        EnvironmentParser::new()
            .prefix("MYAPP")
            .parse(vars(pairs))
            .unwrap()
    }

    #[test]
    fn simple_key() {
        let store = prefixed(&[("MYAPP__HOST", "0.0.0.0")]);
        assert_eq!(store.get_field(&Path::root(), "host").unwrap(), "0.0.0.0");
    }

    #[test]
    fn nested_key() {
        let store = prefixed(&[("MYAPP__DATABASE__URL", "postgres://db")]);
        assert_eq!(
            store.get_field(&path("database"), "url").unwrap(),
            "postgres://db"
        );
    }

    #[test]
    fn single_underscore_preserved() {
        let store = prefixed(&[("MYAPP__POOL_SIZE", "10")]);
        assert_eq!(store.get_field(&Path::root(), "pool_size").unwrap(), "10");
    }

    #[test]
    fn values_stay_strings() {
        let store = prefixed(&[("MYAPP__DEBUG", "TRUE"), ("MYAPP__RATE", "1.5")]);
        assert_eq!(store.get_field(&Path::root(), "debug").unwrap(), "TRUE");
        assert_eq!(store.get_field(&Path::root(), "rate").unwrap(), "1.5");
    }

    #[test]
    fn no_matching_prefix_ignored() {
        assert!(prefixed(&[("OTHER__HOST", "x")]).is_empty());
    }

    #[test]
    fn bare_prefix_ignored() {
        assert!(prefixed(&[("MYAPP", "x")]).is_empty());
        assert!(prefixed(&[("MYAPP__", "x")]).is_empty());
    }

    #[test]
    fn prefix_with_single_underscore_not_matched() {
        assert!(prefixed(&[("MYAPP_HOST", "x")]).is_empty());
    }

    #[test]
    fn empty_segment_skipped() {
        assert!(prefixed(&[("MYAPP__A____B", "x")]).is_empty());
    }

    #[test]
    fn field_container_collision_skipped() {
        let store = prefixed(&[("MYAPP__DATABASE__URL", "pg://"), ("MYAPP__DATABASE", "flat")]);
        // sorted order: the field wins, the nested variable is skipped
        assert_eq!(store.get_field(&Path::root(), "database").unwrap(), "flat");
        assert!(!store.contains_container(&path("database")));
    }

    #[test]
    fn multiple_vars_combined() {
        let store = EnvironmentParser::new()
            .prefix("APP")
            .parse(vars(&[
                ("APP__HOST", "0.0.0.0"),
                ("APP__PORT", "3000"),
                ("APP__DATABASE__URL", "pg://"),
                ("APP__DATABASE__POOL_SIZE", "20"),
            ]))
            .unwrap();
        assert_eq!(store.get_field(&Path::root(), "host").unwrap(), "0.0.0.0");
        assert_eq!(store.get_field(&Path::root(), "port").unwrap(), "3000");
        assert_eq!(store.get_field(&path("database"), "url").unwrap(), "pg://");
        assert_eq!(
            store.get_field(&path("database"), "pool_size").unwrap(),
            "20"
        );
    }

    #[test]
    fn explicit_binding() {
        let store = EnvironmentParser::new()
            .var("DATABASE_URL", path("database"), "url", false)
            .parse(vars(&[("DATABASE_URL", "pg://x"), ("UNRELATED", "y")]))
            .unwrap();
        assert_eq!(store.get_field(&path("database"), "url").unwrap(), "pg://x");
        assert_eq!(store.iter_fields().count(), 1);
    }

    #[test]
    fn optional_binding_absent_is_skipped() {
        let store = EnvironmentParser::new()
            .var("DATABASE_URL", path("database"), "url", false)
            .parse(vars(&[]))
            .unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn process_environment_is_not_consulted() {
        // PATH is set in any test process; only the given pairs count.
        let store = EnvironmentParser::new()
            .var("PATH", path("system"), "path", true)
            .parse(vars(&[("PATH", "/given")]))
            .unwrap();
        assert_eq!(store.get_field(&path("system"), "path").unwrap(), "/given");

        let err = EnvironmentParser::new()
            .var("PATH", path("system"), "path", true)
            .parse(vars(&[]))
            .unwrap_err();
        assert!(matches!(err, SettingsError::MissingEnvVar(_)));
    }

    #[test]
    fn required_binding_absent_fails() {
        let err = EnvironmentParser::new()
            .var("DATABASE_URL", path("database"), "url", true)
            .parse(vars(&[]))
            .unwrap_err();
        assert!(matches!(err, SettingsError::MissingEnvVar(ref v) if v == "DATABASE_URL"));
    }

    #[test]
    fn explicit_binding_beats_prefix() {
        let store = EnvironmentParser::new()
            .prefix("APP")
            .var("DB_URL", path("database"), "url", false)
            .parse(vars(&[("APP__DATABASE__URL", "from-prefix"), ("DB_URL", "explicit")]))
            .unwrap();
        assert_eq!(
            store.get_field(&path("database"), "url").unwrap(),
            "explicit"
        );
    }
}
