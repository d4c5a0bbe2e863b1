//! Anchor directory resolution
//!
//! Every path the tool touches is a fixed offset beneath one directory: the
//! directory containing the program itself. This module finds that directory
//! as an absolute, symlink-free path so that the result does not depend on
//! where the caller happens to be standing.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{GenerationError, GenerationResult};

/// Absolute, canonical directory that all layout paths are relative to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDir(PathBuf);

impl ScriptDir {
    /// Resolve the directory containing `invocation`.
    ///
    /// `invocation` may be relative (taken against the current working
    /// directory), absolute, or a symlink; the link is followed before the
    /// parent is taken, so a symlinked program anchors at its real location.
    pub fn resolve<P: AsRef<Path>>(invocation: P) -> GenerationResult<Self> {
        let invocation = invocation.as_ref();
        let canonical = fs::canonicalize(invocation).map_err(|source| GenerationError::Resolve {
            path: invocation.to_path_buf(),
            source,
        })?;

        // Only the filesystem root has no parent
        let dir = match canonical.parent() {
            Some(parent) => parent.to_path_buf(),
            None => canonical,
        };

        debug!("Resolved {} to {}", invocation.display(), dir.display());
        Ok(ScriptDir(dir))
    }

    /// Resolve the directory containing the running executable
    pub fn current() -> GenerationResult<Self> {
        let exe = env::current_exe().map_err(|source| GenerationError::Resolve {
            path: PathBuf::from("<current executable>"),
            source,
        })?;
        Self::resolve(exe)
    }

    /// Use `dir` itself as the anchor, canonicalised the same way
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> GenerationResult<Self> {
        let dir = dir.as_ref();
        let resolve_error = |source| GenerationError::Resolve {
            path: dir.to_path_buf(),
            source,
        };

        let canonical = fs::canonicalize(dir).map_err(resolve_error)?;
        if !canonical.is_dir() {
            return Err(resolve_error(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a directory",
            )));
        }

        Ok(ScriptDir(canonical))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Path of `relative` beneath the anchor
    pub fn join<P: AsRef<Path>>(&self, relative: P) -> PathBuf {
        self.0.join(relative)
    }
}

impl AsRef<Path> for ScriptDir {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_resolve_absolute_path() {
        let temp_dir = tempdir().unwrap();
        let tool = temp_dir.path().join("tool");
        fs::write(&tool, "").unwrap();

        let resolved = ScriptDir::resolve(&tool).unwrap();

        assert_eq!(resolved.path(), fs::canonicalize(temp_dir.path()).unwrap());
        assert!(resolved.path().is_absolute());
    }

    #[test]
    fn test_resolve_relative_path() {
        // cargo runs tests from the package root
        let resolved = ScriptDir::resolve("Cargo.toml").unwrap();
        let expected = fs::canonicalize(env!("CARGO_MANIFEST_DIR")).unwrap();

        assert_eq!(resolved.path(), expected);
    }

    #[test]
    fn test_relative_and_absolute_agree() {
        let relative = ScriptDir::resolve("src/lib.rs").unwrap();
        let absolute =
            ScriptDir::resolve(Path::new(env!("CARGO_MANIFEST_DIR")).join("src/lib.rs")).unwrap();

        assert_eq!(relative, absolute);
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_follows_symlink() {
        let real_dir = tempdir().unwrap();
        let link_dir = tempdir().unwrap();
        let tool = real_dir.path().join("tool");
        fs::write(&tool, "").unwrap();
        let link = link_dir.path().join("tool-link");
        std::os::unix::fs::symlink(&tool, &link).unwrap();

        let resolved = ScriptDir::resolve(&link).unwrap();

        assert_eq!(resolved.path(), fs::canonicalize(real_dir.path()).unwrap());
    }

    #[test]
    fn test_resolve_missing_path_is_fatal() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("no-such-tool");

        match ScriptDir::resolve(&missing) {
            Err(GenerationError::Resolve { path, source }) => {
                assert_eq!(path, missing);
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected resolve error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_dir_rejects_files() {
        let temp_dir = tempdir().unwrap();
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "").unwrap();

        assert!(ScriptDir::from_dir(&file).is_err());
        assert_eq!(
            ScriptDir::from_dir(temp_dir.path()).unwrap().path(),
            fs::canonicalize(temp_dir.path()).unwrap()
        );
    }

    #[test]
    fn test_current_executable_resolves() {
        let resolved = ScriptDir::current().unwrap();
        assert!(resolved.path().is_dir());
    }
}
