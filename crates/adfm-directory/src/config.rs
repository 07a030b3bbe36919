//! Configuration types for directory access.

use crate::{locator::DirectoryRootLocator, Result};
use adfm_core::{ActiveDirectorySettings, Error};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default connection timeout (seconds).
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 10;

const SUPPORTED_SCHEMES: &[&str] = &["ldap", "ldaps", "ldapi"];

/// Configuration for connecting to the directory.
///
/// The root locator is computed from the domain when the configuration is created and does not
/// change afterwards.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    settings: Arc<ActiveDirectorySettings>,
    root_locator: DirectoryRootLocator,
    url: String,
    tls_verify: bool,
    tls_ca_cert: Option<PathBuf>,
    connection_timeout_secs: u64,
}

impl DirectoryConfig {
    /// Creates a configuration that talks to `ldap://<domain>`.
    #[must_use]
    pub fn new(settings: Arc<ActiveDirectorySettings>) -> Self {
        let root_locator = DirectoryRootLocator::from_domain(settings.domain());
        let url = format!("ldap://{}", settings.domain());

        Self {
            settings,
            root_locator,
            url,
            tls_verify: true,
            tls_ca_cert: None,
            connection_timeout_secs: DEFAULT_CONNECTION_TIMEOUT_SECS,
        }
    }

    /// Returns the credential settings.
    #[must_use]
    pub fn settings(&self) -> &ActiveDirectorySettings {
        &self.settings
    }

    /// Returns the directory root locator.
    #[must_use]
    pub const fn root_locator(&self) -> &DirectoryRootLocator {
        &self.root_locator
    }

    /// Returns the LDAP endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Name used for the simple bind.
    ///
    /// Names that already carry a domain (`user@domain`, `DOMAIN\user`) are used as they are.
    /// Otherwise dotted domains produce a UPN and single-label domains a down-level name.
    #[must_use]
    pub fn bind_name(&self) -> String {
        let username = self.settings.username();
        let domain = self.settings.domain();

        if username.contains('@') || username.contains('\\') {
            username.to_string()
        } else if domain.contains('.') {
            format!("{username}@{domain}")
        } else {
            format!("{domain}\\{username}")
        }
    }

    /// Returns the connection timeout duration.
    #[must_use]
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Returns whether TLS certificate verification is enabled.
    #[must_use]
    pub const fn tls_verify(&self) -> bool {
        self.tls_verify
    }

    /// Optional custom CA certificate path.
    #[must_use]
    pub fn tls_ca_cert(&self) -> Option<&PathBuf> {
        self.tls_ca_cert.as_ref()
    }

    /// Overrides the LDAP endpoint (e.g. a specific domain controller over `ldaps://`).
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or does not use an LDAP scheme.
    pub fn with_url(mut self, url: impl Into<String>) -> Result<Self> {
        let url_string = url.into();
        let parsed = Url::parse(&url_string)?;
        if !SUPPORTED_SCHEMES.contains(&parsed.scheme()) {
            return Err(Error::ConfigError(format!(
                "unsupported directory URL scheme `{}`",
                parsed.scheme()
            )));
        }

        self.url = url_string;
        Ok(self)
    }

    /// Enables or disables TLS certificate verification.
    #[must_use]
    pub const fn with_tls_verification(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Sets the custom CA certificate path for TLS verification.
    #[must_use]
    pub fn with_tls_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Overrides the connection timeout in seconds.
    #[must_use]
    pub const fn with_connection_timeout_secs(mut self, seconds: u64) -> Self {
        self.connection_timeout_secs = seconds;
        self
    }
}
