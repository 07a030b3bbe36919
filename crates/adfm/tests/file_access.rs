//! Integration tests for the file and directory services.
//!
//! Impersonated variants run against a counting login provider that records logons, identity
//! switches and handle releases, so the tests run on every platform.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use adfm::{
    ActiveDirectoryFileManagement, ActiveDirectorySettings, DirectoryConfig, DirectoryService,
    Error, FileService, LoginProvider, LogonError, SecurityContext,
};
use secrecy::SecretString;
use tempfile::TempDir;

#[derive(Default)]
struct Counters {
    logons: AtomicUsize,
    releases: AtomicUsize,
    impersonating: AtomicBool,
    reject: AtomicBool,
}

struct CountingContext(Arc<Counters>);

impl SecurityContext for CountingContext {
    fn impersonate(&self) -> Result<(), LogonError> {
        self.0.impersonating.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn revert(&self) -> adfm::Result<()> {
        self.0.impersonating.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) -> adfm::Result<()> {
        self.0.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct CountingProvider(Arc<Counters>);

impl LoginProvider for CountingProvider {
    fn logon(
        &self,
        username: &str,
        domain: &str,
        _password: &SecretString,
    ) -> Result<Box<dyn SecurityContext>, LogonError> {
        if self.0.reject.load(Ordering::SeqCst) {
            return Err(LogonError::native(
                format!("{domain}\\{username}"),
                1326,
                "The user name or password is incorrect.",
            ));
        }
        self.0.logons.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingContext(self.0.clone())))
    }
}

fn services() -> (ActiveDirectoryFileManagement, Arc<Counters>) {
    let counters = Arc::new(Counters::default());
    let settings = ActiveDirectorySettings::new("svc-files", "s3cret", "corp.example.com")
        .expect("valid settings");
    let services = ActiveDirectoryFileManagement::with_parts(
        Arc::new(CountingProvider(counters.clone())),
        DirectoryConfig::new(Arc::new(settings)),
    );
    (services, counters)
}

fn files(services: &ActiveDirectoryFileManagement) -> &FileService {
    services.files()
}

fn directories(services: &ActiveDirectoryFileManagement) -> &DirectoryService {
    services.directories()
}

fn names(paths: &[std::path::PathBuf]) -> Vec<String> {
    paths
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn create_does_not_replace_existing_content() {
    let (services, _) = services();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.txt");

    files(&services).create_text(&path, "first").unwrap();
    files(&services).create_text(&path, "second").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "first");
}

#[test]
fn overwrite_replaces_or_creates() {
    let (services, _) = services();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.bin");

    files(&services).overwrite_bytes(&path, &[1, 2, 3]).unwrap();
    assert_eq!(files(&services).read(&path).unwrap(), vec![1, 2, 3]);

    files(&services).overwrite_bytes(&path, &[9]).unwrap();
    assert_eq!(files(&services).read(&path).unwrap(), vec![9]);
}

#[test]
fn lines_round_trip_through_platform_terminators() {
    let (services, _) = services();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("list.txt");

    files(&services).create_lines(&path, ["alpha", "beta"]).unwrap();

    let raw = files(&services).read_text(&path).unwrap();
    assert!(raw.ends_with(if cfg!(windows) { "\r\n" } else { "\n" }));
    assert_eq!(files(&services).read_lines(&path).unwrap(), vec!["alpha", "beta"]);

    files(&services).overwrite_lines(&path, ["gamma"]).unwrap();
    assert_eq!(files(&services).read_lines(&path).unwrap(), vec!["gamma"]);
}

#[test]
fn missing_files_read_as_empty() {
    let (services, _) = services();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.txt");

    assert!(files(&services).read(&path).unwrap().is_empty());
    assert_eq!(files(&services).read_text(&path).unwrap(), "");
    assert!(files(&services).read_lines(&path).unwrap().is_empty());
    assert!(!files(&services).is_exists(&path));
    files(&services).delete(&path).unwrap();
}

#[test]
fn file_existence_ignores_directories() {
    let (services, _) = services();
    let dir = TempDir::new().unwrap();

    assert!(!files(&services).is_exists(dir.path()));
    assert!(directories(&services).is_exists(dir.path()));
}

#[test]
fn write_into_missing_directory_reports_io_error() {
    let (services, _) = services();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("file.txt");

    let err = files(&services).create_text(&path, "x").unwrap_err();
    match err {
        Error::Io { path: reported, .. } => assert!(reported.ends_with("file.txt")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn directory_lifecycle_and_listings() {
    let (services, _) = services();
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("a").join("b");

    directories(&services).create(&root).unwrap();
    directories(&services).create(&root).unwrap();
    assert!(directories(&services).is_exists(&root));

    fs::write(root.join("report.TXT"), "r").unwrap();
    fs::write(root.join("data.csv"), "d").unwrap();
    fs::write(root.join("image.png"), "i").unwrap();
    fs::create_dir(root.join("archive")).unwrap();
    fs::write(root.join("archive").join("old.txt"), "o").unwrap();

    let all = directories(&services).get_files(&root).unwrap();
    assert_eq!(names(&all), vec!["data.csv", "image.png", "report.TXT"]);

    let filtered = directories(&services)
        .get_files_with_extensions(&root, &["txt", "csv"])
        .unwrap();
    assert_eq!(names(&filtered), vec!["data.csv", "report.TXT"]);

    let subdirs = directories(&services).get_directories(&root).unwrap();
    assert_eq!(names(&subdirs), vec!["archive"]);

    directories(&services).delete(dir.path().join("a")).unwrap();
    assert!(!directories(&services).is_exists(&root));
    directories(&services).delete(dir.path().join("a")).unwrap();
}

#[test]
fn listing_missing_directory_is_an_io_error() {
    let (services, _) = services();
    let dir = TempDir::new().unwrap();

    let err = directories(&services)
        .get_files(dir.path().join("nope"))
        .unwrap_err();
    assert_eq!(err.error_code(), "IO_ERROR");
}

#[test]
fn impersonated_operations_log_on_once_per_call() {
    let (services, counters) = services();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("as-user.txt");

    files(&services).create_text_under_user(&path, "hello").unwrap();
    assert_eq!(files(&services).read_text_under_user(&path).unwrap(), "hello");
    assert!(files(&services).is_exists_under_user(&path).unwrap());
    files(&services).delete_under_user(&path).unwrap();

    assert!(!Path::new(&path).exists());
    assert_eq!(counters.logons.load(Ordering::SeqCst), 4);
    assert_eq!(counters.releases.load(Ordering::SeqCst), 4);
    assert!(!counters.impersonating.load(Ordering::SeqCst));
}

#[test]
fn impersonated_directory_operations_release_handles() {
    let (services, counters) = services();
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("shared");

    directories(&services).create_under_user(&root).unwrap();
    fs::write(root.join("a.log"), "a").unwrap();
    let logs = directories(&services)
        .get_files_with_extensions_under_user(&root, &["LOG"])
        .unwrap();
    assert_eq!(names(&logs), vec!["a.log"]);
    assert!(directories(&services)
        .get_directories_under_user(&root)
        .unwrap()
        .is_empty());
    directories(&services).delete_under_user(&root).unwrap();

    assert!(!root.exists());
    assert_eq!(counters.logons.load(Ordering::SeqCst), 4);
    assert_eq!(counters.releases.load(Ordering::SeqCst), 4);
}

#[test]
fn rejected_logon_skips_the_operation() {
    let (services, counters) = services();
    counters.reject.store(true, Ordering::SeqCst);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("never.txt");

    let err = files(&services)
        .overwrite_text_under_user(&path, "x")
        .unwrap_err();

    match err {
        Error::Logon(logon) => {
            assert_eq!(logon.code(), Some(1326));
            assert_eq!(logon.principal(), "corp.example.com\\svc-files");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!path.exists());
    assert_eq!(counters.releases.load(Ordering::SeqCst), 0);
}

#[test]
fn failing_operation_still_releases_the_handle() {
    let (services, counters) = services();
    let dir = TempDir::new().unwrap();

    let err = directories(&services)
        .get_files_under_user(dir.path().join("nope"))
        .unwrap_err();

    assert_eq!(err.error_code(), "IO_ERROR");
    assert_eq!(counters.logons.load(Ordering::SeqCst), 1);
    assert_eq!(counters.releases.load(Ordering::SeqCst), 1);
    assert!(!counters.impersonating.load(Ordering::SeqCst));
}
