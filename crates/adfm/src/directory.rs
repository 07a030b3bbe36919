//! Directory operations, optionally performed under an impersonated account.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use adfm_core::{Error, Result};
use adfm_impersonation::ActiveDirectoryService;
use tracing::debug;

/// Directory create/delete/listing operations.
///
/// Listings are not recursive and are returned sorted by path.
#[derive(Debug, Clone)]
pub struct DirectoryService {
    impersonation: ActiveDirectoryService,
}

impl DirectoryService {
    /// Creates the service on top of an impersonation executor.
    #[must_use]
    pub fn new(impersonation: ActiveDirectoryService) -> Self {
        Self { impersonation }
    }

    /// Creates the directory and any missing parents. Existing directories are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the directory cannot be created.
    pub fn create(&self, path: impl AsRef<Path>) -> Result<()> {
        create_all(path.as_ref())
    }

    /// [`create`](Self::create) as the impersonated account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Logon`] if the logon fails, otherwise as [`create`](Self::create).
    pub fn create_under_user(&self, path: impl AsRef<Path>) -> Result<()> {
        self.under_user(|| create_all(path.as_ref()))
    }

    /// Returns true if a directory exists at `path`.
    #[must_use]
    pub fn is_exists(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref().is_dir()
    }

    /// [`is_exists`](Self::is_exists) as the impersonated account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Logon`] if the logon fails.
    pub fn is_exists_under_user(&self, path: impl AsRef<Path>) -> Result<bool> {
        self.under_user(|| Ok(path.as_ref().is_dir()))
    }

    /// Deletes the directory with everything below it. A missing directory is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if an existing directory cannot be removed.
    pub fn delete(&self, path: impl AsRef<Path>) -> Result<()> {
        delete_all(path.as_ref())
    }

    /// [`delete`](Self::delete) as the impersonated account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Logon`] if the logon fails, otherwise as [`delete`](Self::delete).
    pub fn delete_under_user(&self, path: impl AsRef<Path>) -> Result<()> {
        self.under_user(|| delete_all(path.as_ref()))
    }

    /// Lists the files directly inside `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the directory cannot be read.
    pub fn get_files(&self, path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        list(path.as_ref(), |entry| entry.is_file())
    }

    /// [`get_files`](Self::get_files) as the impersonated account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Logon`] if the logon fails, otherwise as [`get_files`](Self::get_files).
    pub fn get_files_under_user(&self, path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        self.under_user(|| list(path.as_ref(), |entry| entry.is_file()))
    }

    /// Lists the files directly inside `path` whose extension is one of `extensions`.
    ///
    /// Extensions are given without the leading dot and compared ASCII case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the directory cannot be read.
    pub fn get_files_with_extensions<S: AsRef<str>>(
        &self,
        path: impl AsRef<Path>,
        extensions: &[S],
    ) -> Result<Vec<PathBuf>> {
        list(path.as_ref(), |entry| {
            entry.is_file() && has_extension(entry, extensions)
        })
    }

    /// [`get_files_with_extensions`](Self::get_files_with_extensions) as the impersonated
    /// account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Logon`] if the logon fails, otherwise as
    /// [`get_files_with_extensions`](Self::get_files_with_extensions).
    pub fn get_files_with_extensions_under_user<S: AsRef<str>>(
        &self,
        path: impl AsRef<Path>,
        extensions: &[S],
    ) -> Result<Vec<PathBuf>> {
        self.under_user(|| {
            list(path.as_ref(), |entry| {
                entry.is_file() && has_extension(entry, extensions)
            })
        })
    }

    /// Lists the subdirectories directly inside `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the directory cannot be read.
    pub fn get_directories(&self, path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        list(path.as_ref(), |entry| entry.is_dir())
    }

    /// [`get_directories`](Self::get_directories) as the impersonated account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Logon`] if the logon fails, otherwise as
    /// [`get_directories`](Self::get_directories).
    pub fn get_directories_under_user(&self, path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        self.under_user(|| list(path.as_ref(), |entry| entry.is_dir()))
    }

    fn under_user<T>(&self, operation: impl FnOnce() -> Result<T>) -> Result<T> {
        self.impersonation.run_impersonated(|scope| {
            debug!(principal = %scope.principal(), "directory operation under impersonation");
            operation()
        })
    }
}

fn create_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|err| Error::io(path, &err))
}

fn delete_all(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Ok(());
    }
    fs::remove_dir_all(path).map_err(|err| Error::io(path, &err))
}

fn list(path: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(path).map_err(|err| Error::io(path, &err))? {
        let entry_path = entry.map_err(|err| Error::io(path, &err))?.path();
        if keep(&entry_path) {
            entries.push(entry_path);
        }
    }
    entries.sort();
    Ok(entries)
}

fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|wanted| wanted.as_ref().trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_match_ignores_case_and_leading_dot() {
        assert!(has_extension(Path::new("report.TXT"), &["txt"]));
        assert!(has_extension(Path::new("report.csv"), &["txt", ".csv"]));
        assert!(!has_extension(Path::new("report.txt.bak"), &["txt"]));
        assert!(!has_extension(Path::new("Makefile"), &["txt"]));
        assert!(!has_extension(Path::new("report.txt"), &[] as &[&str]));
    }
}
