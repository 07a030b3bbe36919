//! Credential configuration for impersonation and directory access.
//!
//! The same account is used to log on for impersonated work and to bind against the directory.
//! Settings are supplied once and never mutated afterwards.

use crate::Error;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Username, password and domain of the account used for impersonation and directory binds.
///
/// The password is kept as a [`SecretString`]: it is redacted from `Debug` output and skipped
/// when serializing.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ActiveDirectorySettings {
    /// Account name (`sAMAccountName`, UPN or `DOMAIN\user`)
    #[validate(length(min = 1, message = "username must not be empty"))]
    username: String,

    /// Account password
    #[serde(skip_serializing)]
    password: SecretString,

    /// Domain the account belongs to (e.g. `corp.example.com` or `CORP`)
    #[validate(length(min = 1, message = "domain must not be empty"))]
    domain: String,
}

impl ActiveDirectorySettings {
    /// Create new settings.
    ///
    /// # Arguments
    ///
    /// * `username` - The account name
    /// * `password` - The account password
    /// * `domain` - The domain of the account
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the username or domain is empty.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        domain: impl Into<String>,
    ) -> Result<Self, Error> {
        let settings = Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            domain: domain.into(),
        };

        settings.ensure_valid()?;
        Ok(settings)
    }

    /// Validates settings obtained through deserialization.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the username or domain is empty.
    pub fn ensure_valid(&self) -> Result<(), Error> {
        self.validate()
            .map_err(|e| Error::ConfigError(format!("Invalid Active Directory settings: {e}")))
    }

    /// Get the account name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Get the account password.
    #[must_use]
    pub const fn password(&self) -> &SecretString {
        &self.password
    }

    /// Get the account domain.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Down-level principal name (`DOMAIN\user`), suitable for logs and error messages.
    #[must_use]
    pub fn principal(&self) -> String {
        format!("{}\\{}", self.domain, self.username)
    }
}
