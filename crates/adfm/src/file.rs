//! File operations, optionally performed under an impersonated account.
//!
//! Every operation has an `_under_user` twin that runs the same work through
//! [`ActiveDirectoryService::run_impersonated`]. The plain variants run as the calling process.

use std::fs;
use std::path::Path;

use adfm_core::{Error, Result};
use adfm_impersonation::ActiveDirectoryService;
use tracing::debug;

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

const BYTE_ORDER_MARK: char = '\u{feff}';

/// File create/overwrite/delete/read operations.
#[derive(Debug, Clone)]
pub struct FileService {
    impersonation: ActiveDirectoryService,
}

impl FileService {
    /// Creates the service on top of an impersonation executor.
    #[must_use]
    pub fn new(impersonation: ActiveDirectoryService) -> Self {
        Self { impersonation }
    }

    /// Writes `content` to a new file; an existing file is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be written.
    pub fn create_text(&self, path: impl AsRef<Path>, content: &str) -> Result<()> {
        create_with(path.as_ref(), content.as_bytes())
    }

    /// [`create_text`](Self::create_text) as the impersonated account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Logon`] if the logon fails, otherwise as [`create_text`](Self::create_text).
    pub fn create_text_under_user(&self, path: impl AsRef<Path>, content: &str) -> Result<()> {
        self.under_user(|| create_with(path.as_ref(), content.as_bytes()))
    }

    /// Writes `content` to a new file; an existing file is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be written.
    pub fn create_bytes(&self, path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
        create_with(path.as_ref(), content)
    }

    /// [`create_bytes`](Self::create_bytes) as the impersonated account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Logon`] if the logon fails, otherwise as [`create_bytes`](Self::create_bytes).
    pub fn create_bytes_under_user(&self, path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
        self.under_user(|| create_with(path.as_ref(), content))
    }

    /// Writes `lines` to a new file, each followed by the platform line terminator; an existing
    /// file is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be written.
    pub fn create_lines<I, S>(&self, path: impl AsRef<Path>, lines: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        create_with(path.as_ref(), join_lines(lines).as_bytes())
    }

    /// [`create_lines`](Self::create_lines) as the impersonated account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Logon`] if the logon fails, otherwise as [`create_lines`](Self::create_lines).
    pub fn create_lines_under_user<I, S>(&self, path: impl AsRef<Path>, lines: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.under_user(|| create_with(path.as_ref(), join_lines(lines).as_bytes()))
    }

    /// Replaces the file with `content`, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the old file cannot be removed or the new one written.
    pub fn overwrite_text(&self, path: impl AsRef<Path>, content: &str) -> Result<()> {
        overwrite_with(path.as_ref(), content.as_bytes())
    }

    /// [`overwrite_text`](Self::overwrite_text) as the impersonated account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Logon`] if the logon fails, otherwise as
    /// [`overwrite_text`](Self::overwrite_text).
    pub fn overwrite_text_under_user(&self, path: impl AsRef<Path>, content: &str) -> Result<()> {
        self.under_user(|| overwrite_with(path.as_ref(), content.as_bytes()))
    }

    /// Replaces the file with `content`, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the old file cannot be removed or the new one written.
    pub fn overwrite_bytes(&self, path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
        overwrite_with(path.as_ref(), content)
    }

    /// [`overwrite_bytes`](Self::overwrite_bytes) as the impersonated account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Logon`] if the logon fails, otherwise as
    /// [`overwrite_bytes`](Self::overwrite_bytes).
    pub fn overwrite_bytes_under_user(&self, path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
        self.under_user(|| overwrite_with(path.as_ref(), content))
    }

    /// Replaces the file with `lines`, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the old file cannot be removed or the new one written.
    pub fn overwrite_lines<I, S>(&self, path: impl AsRef<Path>, lines: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        overwrite_with(path.as_ref(), join_lines(lines).as_bytes())
    }

    /// [`overwrite_lines`](Self::overwrite_lines) as the impersonated account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Logon`] if the logon fails, otherwise as
    /// [`overwrite_lines`](Self::overwrite_lines).
    pub fn overwrite_lines_under_user<I, S>(&self, path: impl AsRef<Path>, lines: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.under_user(|| overwrite_with(path.as_ref(), join_lines(lines).as_bytes()))
    }

    /// Deletes the file if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if an existing file cannot be removed.
    pub fn delete(&self, path: impl AsRef<Path>) -> Result<()> {
        delete_if_present(path.as_ref())
    }

    /// [`delete`](Self::delete) as the impersonated account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Logon`] if the logon fails, otherwise as [`delete`](Self::delete).
    pub fn delete_under_user(&self, path: impl AsRef<Path>) -> Result<()> {
        self.under_user(|| delete_if_present(path.as_ref()))
    }

    /// Reads the whole file; a missing file reads as empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if an existing file cannot be read.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<Vec<u8>> {
        read_bytes(path.as_ref())
    }

    /// [`read`](Self::read) as the impersonated account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Logon`] if the logon fails, otherwise as [`read`](Self::read).
    pub fn read_under_user(&self, path: impl AsRef<Path>) -> Result<Vec<u8>> {
        self.under_user(|| read_bytes(path.as_ref()))
    }

    /// Reads the whole file as UTF-8 without a leading byte order mark; a missing file reads as an
    /// empty string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if an existing file cannot be read or is not UTF-8.
    pub fn read_text(&self, path: impl AsRef<Path>) -> Result<String> {
        read_string(path.as_ref())
    }

    /// [`read_text`](Self::read_text) as the impersonated account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Logon`] if the logon fails, otherwise as [`read_text`](Self::read_text).
    pub fn read_text_under_user(&self, path: impl AsRef<Path>) -> Result<String> {
        self.under_user(|| read_string(path.as_ref()))
    }

    /// Reads the file as lines split on `\r\n`, `\n` or `\r`, without terminators; a missing file
    /// reads as no lines.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if an existing file cannot be read or is not UTF-8.
    pub fn read_lines(&self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        read_string(path.as_ref()).map(|text| split_lines(&text))
    }

    /// [`read_lines`](Self::read_lines) as the impersonated account.
    ///
    /// The file is read completely before impersonation ends.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Logon`] if the logon fails, otherwise as [`read_lines`](Self::read_lines).
    pub fn read_lines_under_user(&self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        self.under_user(|| read_string(path.as_ref()).map(|text| split_lines(&text)))
    }

    /// Returns true if a file (not a directory) exists at `path`.
    #[must_use]
    pub fn is_exists(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref().is_file()
    }

    /// [`is_exists`](Self::is_exists) as the impersonated account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Logon`] if the logon fails.
    pub fn is_exists_under_user(&self, path: impl AsRef<Path>) -> Result<bool> {
        self.under_user(|| Ok(path.as_ref().is_file()))
    }

    fn under_user<T>(&self, operation: impl FnOnce() -> Result<T>) -> Result<T> {
        self.impersonation.run_impersonated(|scope| {
            debug!(principal = %scope.principal(), "file operation under impersonation");
            operation()
        })
    }
}

fn create_with(path: &Path, content: &[u8]) -> Result<()> {
    if path.is_file() {
        debug!(path = %path.display(), "file exists; create skipped");
        return Ok(());
    }
    fs::write(path, content).map_err(|err| Error::io(path, &err))
}

fn overwrite_with(path: &Path, content: &[u8]) -> Result<()> {
    delete_if_present(path)?;
    fs::write(path, content).map_err(|err| Error::io(path, &err))
}

fn delete_if_present(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Ok(());
    }
    fs::remove_file(path).map_err(|err| Error::io(path, &err))
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    if !path.is_file() {
        return Ok(Vec::new());
    }
    fs::read(path).map_err(|err| Error::io(path, &err))
}

fn read_string(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Ok(String::new());
    }
    let text = fs::read_to_string(path).map_err(|err| Error::io(path, &err))?;
    Ok(match text.strip_prefix(BYTE_ORDER_MARK) {
        Some(stripped) => stripped.to_owned(),
        None => text,
    })
}

fn join_lines<I, S>(lines: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines.into_iter().fold(String::new(), |mut out, line| {
        out.push_str(line.as_ref());
        out.push_str(LINE_ENDING);
        out
    })
}

/// Splits on `\r\n`, `\n` and a lone `\r`; a trailing terminator does not start a new line.
fn split_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let Some(end) = rest.find(&['\r', '\n'][..]) else {
            lines.push(rest.to_owned());
            break;
        };
        lines.push(rest[..end].to_owned());
        let terminator = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[end + terminator..];
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_lines_terminates_every_line() {
        assert_eq!(join_lines(Vec::<String>::new()), "");
        assert_eq!(join_lines(["a", "b"]), format!("a{LINE_ENDING}b{LINE_ENDING}"));
    }

    #[test]
    fn split_lines_handles_every_terminator() {
        assert_eq!(split_lines("a\r\nb\nc"), vec!["a", "b", "c"]);
        assert_eq!(split_lines("a\rb\r\n\nc\n"), vec!["a", "b", "", "c"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn text_reads_drop_the_byte_order_mark() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bom.txt");
        fs::write(&path, b"\xEF\xBB\xBFfirst\rsecond").unwrap();

        assert_eq!(read_string(&path).unwrap(), "first\rsecond");
        assert_eq!(split_lines(&read_string(&path).unwrap()), vec!["first", "second"]);
        assert_eq!(read_bytes(&path).unwrap().len(), 15);
    }
}
