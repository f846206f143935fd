//! Environment Context
//!
//! An explicit snapshot of environment variables handed to the
//! installation collaborator. The core never reads or writes the process
//! environment on its own; [`EnvironmentContext::capture`] is the only
//! place that looks at it, and only when a caller asks.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Library search path variable
pub const LIBRARY_PATH_VAR: &str = "LD_LIBRARY_PATH";
/// Executable search path variable
pub const BINARY_PATH_VAR: &str = "PATH";

const ARCHIVE_SUFFIXES: [&str; 2] = [".tar.gz", ".tgz"];

/// Captured or constructed set of environment variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentContext {
    vars: BTreeMap<String, String>,
}

impl EnvironmentContext {
    /// Empty context
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Context from explicit pairs
    #[must_use]
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Snapshot of the current process environment (UTF-8 entries only)
    #[must_use]
    pub fn capture() -> Self {
        Self {
            vars: std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
        }
    }

    /// Variable value
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Set a variable
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// All variables, sorted by name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Library search path with the dependencies' `lib` folders prepended
    #[must_use]
    pub fn library_path<S: AsRef<str>>(&self, root: &Path, deps: &[S]) -> String {
        self.search_path(LIBRARY_PATH_VAR, root, deps, "lib")
    }

    /// Executable search path with the dependencies' `bin` folders prepended
    #[must_use]
    pub fn binary_path<S: AsRef<str>>(&self, root: &Path, deps: &[S]) -> String {
        self.search_path(BINARY_PATH_VAR, root, deps, "bin")
    }

    /// Store [`EnvironmentContext::library_path`] in the context
    pub fn apply_library_path<S: AsRef<str>>(&mut self, root: &Path, deps: &[S]) {
        let value = self.library_path(root, deps);
        self.set(LIBRARY_PATH_VAR, value);
    }

    /// Store [`EnvironmentContext::binary_path`] in the context
    pub fn apply_binary_path<S: AsRef<str>>(&mut self, root: &Path, deps: &[S]) {
        let value = self.binary_path(root, deps);
        self.set(BINARY_PATH_VAR, value);
    }

    fn search_path<S: AsRef<str>>(&self, var: &str, root: &Path, deps: &[S], leaf: &str) -> String {
        let mut entries: Vec<String> = dependency_dirs(root, deps, leaf)
            .iter()
            .map(|dir| dir.display().to_string())
            .collect();
        tracing::debug!(var, added = entries.len(), "search path composed");
        if let Some(existing) = self.get(var).filter(|v| !v.is_empty()) {
            entries.push(existing.to_string());
        }
        entries.join(":")
    }
}

/// Existing `<root>/<dep>/<leaf>` folders, in dependency order
fn dependency_dirs<S: AsRef<str>>(root: &Path, deps: &[S], leaf: &str) -> Vec<PathBuf> {
    deps.iter()
        .map(|dep| strip_archive_suffix(dep.as_ref()))
        .filter(|dep| !dep.is_empty())
        .map(|dep| root.join(dep).join(leaf))
        .filter(|dir| dir.is_dir())
        .collect()
}

fn strip_archive_suffix(dep: &str) -> &str {
    ARCHIVE_SUFFIXES
        .iter()
        .find_map(|suffix| dep.strip_suffix(suffix))
        .unwrap_or(dep)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_suffix_stripped() {
        assert_eq!(strip_archive_suffix("lcio-v02.tgz"), "lcio-v02");
        assert_eq!(strip_archive_suffix("root.tar.gz"), "root");
        assert_eq!(strip_archive_suffix("gear"), "gear");
    }

    #[test]
    fn library_path_prepends_existing_dirs_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("lcio/lib")).unwrap();
        std::fs::create_dir_all(dir.path().join("gear/lib")).unwrap();
        std::fs::create_dir_all(dir.path().join("nolib")).unwrap();

        let env = EnvironmentContext::from_pairs([(LIBRARY_PATH_VAR, "/usr/lib")]);
        let value = env.library_path(dir.path(), &["lcio.tgz", "nolib", "gear.tar.gz"]);
        assert_eq!(
            value,
            format!(
                "{}:{}:/usr/lib",
                dir.path().join("lcio/lib").display(),
                dir.path().join("gear/lib").display()
            )
        );
    }

    #[test]
    fn apply_binary_path_only_touches_context() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("slic/bin")).unwrap();
        let mut env = EnvironmentContext::new();
        env.apply_binary_path(dir.path(), &["slic"]);
        assert_eq!(
            env.get(BINARY_PATH_VAR),
            Some(dir.path().join("slic/bin").display().to_string().as_str())
        );
        assert_eq!(env.iter().count(), 1);
    }
}
