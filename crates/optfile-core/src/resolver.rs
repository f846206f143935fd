//! Resource Resolver
//!
//! Maps logical file names to absolute paths inside a job's working
//! directory. A name is looked up by its base name, first directly in the
//! working directory, then in its immediate subdirectories (sorted by name,
//! never recursive). A subdirectory that supplies a file is consumed: no
//! other name in the same call can be resolved from it. Each call starts
//! from a fresh namespace.

use crate::error::ResolveError;
use std::path::{Path, PathBuf};

/// Resolver bound to one working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolver {
    root: PathBuf,
}

impl Resolver {
    /// Resolver for `root`; a relative root is taken from the current
    /// directory
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir().map_or(root.clone(), |cwd| cwd.join(&root))
        };
        Self { root }
    }

    /// Resolver for the process working directory
    ///
    /// # Errors
    /// Returns the error of [`std::env::current_dir`]
    pub fn current_dir() -> std::io::Result<Self> {
        Ok(Self {
            root: std::env::current_dir()?,
        })
    }

    /// Working directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `names` in order
    ///
    /// # Errors
    /// - [`ResolveError::NotFound`] for the first name that cannot be found;
    ///   no partial result is returned
    /// - [`ResolveError::Io`] if the working directory cannot be listed
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<PathBuf>, ResolveError> {
        let mut candidates = self.subdirectories()?;
        let mut resolved = Vec::with_capacity(names.len());

        for name in names {
            let name = name.as_ref();
            let base = base_name(name);
            tracing::debug!(name, base, "resolving resource");
            if base.is_empty() {
                return Err(self.not_found(name));
            }

            let direct = self.root.join(base);
            if direct.is_file() {
                tracing::debug!(path = %direct.display(), "found in working directory");
                resolved.push(direct);
                continue;
            }

            let Some(index) = candidates.iter().position(|dir| dir.join(base).is_file()) else {
                return Err(self.not_found(name));
            };
            let dir = candidates.remove(index);
            let path = dir.join(base);
            tracing::debug!(path = %path.display(), consumed = %dir.display(), "found in subdirectory");
            resolved.push(path);
        }

        tracing::info!(count = resolved.len(), root = %self.root.display(), "resources resolved");
        Ok(resolved)
    }

    fn subdirectories(&self) -> Result<Vec<PathBuf>, ResolveError> {
        let io_error = |source| ResolveError::Io {
            path: self.root.clone(),
            source,
        };
        let mut dirs = Vec::new();
        for entry in std::fs::read_dir(&self.root).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    fn not_found(&self, name: &str) -> ResolveError {
        ResolveError::NotFound {
            name: name.to_string(),
            root: self.root.clone(),
        }
    }
}

/// Last component of a logical file name
fn base_name(name: &str) -> &str {
    let name = name.trim();
    let name = name
        .get(..4)
        .filter(|prefix| prefix.eq_ignore_ascii_case("lfn:"))
        .map_or(name, |_| &name[4..]);
    name.rsplit('/').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn base_name_strips_lfn() {
        assert_eq!(base_name("LFN:/ilc/prod/clic/gen.stdhep"), "gen.stdhep");
        assert_eq!(base_name("/ilc/user/x/overlay.slcio"), "overlay.slcio");
        assert_eq!(base_name("local.slcio"), "local.slcio");
        assert_eq!(base_name("dir/"), "");
    }

    #[test]
    fn working_directory_wins() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("gen.stdhep"));
        touch(&dir.path().join("a/gen.stdhep"));
        let resolver = Resolver::new(dir.path());
        let paths = resolver.resolve(&["/lfn/gen.stdhep"]).unwrap();
        assert_eq!(paths, vec![dir.path().join("gen.stdhep")]);
    }

    #[test]
    fn subdirectory_consumed_once_per_call() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("run1/f.slcio"));
        touch(&dir.path().join("run2/f.slcio"));
        let resolver = Resolver::new(dir.path());

        let paths = resolver.resolve(&["x/f.slcio", "y/f.slcio"]).unwrap();
        assert_eq!(
            paths,
            vec![dir.path().join("run1/f.slcio"), dir.path().join("run2/f.slcio")]
        );

        let err = resolver.resolve(&["f.slcio", "f.slcio", "f.slcio"]).unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { ref name, .. } if name == "f.slcio"));
    }

    #[test]
    fn any_missing_name_fails_the_call() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("present.slcio"));
        let resolver = Resolver::new(dir.path());
        let err = resolver
            .resolve(&["missing.slcio", "present.slcio"])
            .unwrap_err();
        assert!(err.to_string().contains("missing.slcio"));
    }

    #[test]
    fn unreadable_root_is_io_error() {
        let resolver = Resolver::new("/nonexistent/work");
        assert!(matches!(
            resolver.resolve(&["a"]),
            Err(ResolveError::Io { .. })
        ));
    }

    #[test]
    fn empty_request_is_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        let names: [&str; 0] = [];
        assert!(Resolver::new(dir.path()).resolve(&names).unwrap().is_empty());
    }
}
