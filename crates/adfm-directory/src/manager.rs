//! Directory query/update engine for Active Directory users.

use crate::{
    client::{
        DirectoryEntry, DirectoryModification, LdapConnector, LdapSession, RealLdapConnector,
        SearchScope,
    },
    config::DirectoryConfig,
    locator::DirectoryRootLocator,
    Result,
};
use adfm_core::{ActiveDirectorySettings, Error, UserDetails};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::{debug, info, warn};

const ALL_USER_ATTRIBUTES: &[&str] = &["*"];
const ROOT_DSE_ATTRIBUTES: &[&str] = &["defaultNamingContext"];
const ROOT_DSE_FILTER: &str = "(objectClass=*)";

/// Outcome of resolving a user, keeping "absent" and "lookup failed" apart.
#[derive(Debug, Clone, PartialEq)]
pub enum PrincipalLookup<T> {
    /// Exactly the requested user was found.
    Found(T),
    /// The directory holds no matching user.
    NotFound,
    /// Connecting, binding, searching or writing failed.
    Fault(Error),
}

impl<T> PrincipalLookup<T> {
    /// Returns the found value, treating faults like absence.
    #[must_use]
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound | Self::Fault(_) => None,
        }
    }

    /// Returns true if the lookup failed rather than completed.
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }
}

impl<T> From<Result<Option<T>>> for PrincipalLookup<T> {
    fn from(result: Result<Option<T>>) -> Self {
        match result {
            Ok(Some(value)) => Self::Found(value),
            Ok(None) => Self::NotFound,
            Err(err) => Self::Fault(err),
        }
    }
}

/// Reads and updates Active Directory users identified by `sAMAccountName`.
///
/// Every operation opens its own connection, binds with the configured account and unbinds
/// before returning. The fail-safe operations ([`find_principal`], [`get_principal_attributes`],
/// [`update_principal_attributes`]) never return errors: faults are logged and reported as an
/// absent user, an empty bag or a no-op.
///
/// [`find_principal`]: ActiveDirectoryUserManager::find_principal
/// [`get_principal_attributes`]: ActiveDirectoryUserManager::get_principal_attributes
/// [`update_principal_attributes`]: ActiveDirectoryUserManager::update_principal_attributes
pub struct ActiveDirectoryUserManager {
    config: Arc<DirectoryConfig>,
    connector: Box<dyn LdapConnector>,
}

impl ActiveDirectoryUserManager {
    /// Creates a manager for `ldap://<domain>` using the given settings.
    #[must_use]
    pub fn new(settings: Arc<ActiveDirectorySettings>) -> Self {
        Self::with_config(DirectoryConfig::new(settings))
    }

    /// Creates a manager from a full directory configuration.
    #[must_use]
    pub fn with_config(config: DirectoryConfig) -> Self {
        let config = Arc::new(config);
        let connector: Box<dyn LdapConnector> = Box::new(RealLdapConnector::new(config.clone()));
        Self { config, connector }
    }

    #[cfg(test)]
    #[must_use]
    pub(crate) fn with_connector(
        config: DirectoryConfig,
        connector: Box<dyn LdapConnector>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            connector,
        }
    }

    /// Returns the directory root locator.
    #[must_use]
    pub fn root_locator(&self) -> &DirectoryRootLocator {
        self.config.root_locator()
    }

    /// Resolves a user and reports faults explicitly.
    #[must_use]
    pub fn lookup_principal(&self, sam_account_name: &str) -> PrincipalLookup<DirectoryEntry> {
        let lookup: PrincipalLookup<DirectoryEntry> = self
            .with_session(|session| self.search_user(session, sam_account_name))
            .into();
        log_fault("lookup", sam_account_name, &lookup);
        lookup
    }

    /// Resolves a user, returning `None` when absent or when the directory could not be queried.
    #[must_use]
    pub fn find_principal(&self, sam_account_name: &str) -> Option<DirectoryEntry> {
        self.lookup_principal(sam_account_name).found()
    }

    /// Collects every attribute of the user into a bag.
    ///
    /// Multi-valued attributes are joined with `"; "`, attributes without values read as an empty
    /// string and binary values are rendered as lowercase hex. Returns an empty bag when the user
    /// is absent or the directory could not be queried.
    #[must_use]
    pub fn get_principal_attributes(&self, sam_account_name: &str) -> UserDetails {
        self.find_principal(sam_account_name)
            .map(|entry| harvest_attributes(&entry))
            .unwrap_or_default()
    }

    /// Writes every attribute of `details` onto the user in a single modify request.
    ///
    /// Nothing is sent when `details` is empty. An empty value clears the attribute. Absent users
    /// and directory faults, including attribute names the schema rejects, leave the entry
    /// untouched without reporting an error.
    pub fn update_principal_attributes(&self, sam_account_name: &str, details: &UserDetails) {
        let outcome: PrincipalLookup<usize> = self
            .with_session(|session| {
                let Some(entry) = self.search_user(session, sam_account_name)? else {
                    return Ok(None);
                };

                let modifications = build_modifications(details);
                if !modifications.is_empty() {
                    session.modify(&entry.dn, &modifications)?;
                }
                Ok(Some(modifications.len()))
            })
            .into();

        match &outcome {
            PrincipalLookup::Found(0) => {
                debug!(sam_account_name, "no attributes supplied; nothing committed");
            }
            PrincipalLookup::Found(count) => {
                info!(sam_account_name, count, "committed directory attribute update");
            }
            PrincipalLookup::NotFound => {
                debug!(sam_account_name, "user not found; update skipped");
            }
            PrincipalLookup::Fault(_) => log_fault("update", sam_account_name, &outcome),
        }
    }

    /// Connects, binds, runs `operation` and unbinds on every path once connected.
    fn with_session<T>(
        &self,
        operation: impl FnOnce(&mut dyn LdapSession) -> Result<T>,
    ) -> Result<T> {
        let mut session = self.connector.connect()?;
        debug!(url = self.config.url(), "connected to directory");

        let result = session
            .simple_bind(
                &self.config.bind_name(),
                self.config.settings().password().expose_secret(),
            )
            .and_then(|()| operation(&mut *session));

        if let Err(err) = session.unbind() {
            debug!("directory unbind failed: {err}");
        }
        result
    }

    fn search_user(
        &self,
        session: &mut dyn LdapSession,
        sam_account_name: &str,
    ) -> Result<Option<DirectoryEntry>> {
        let base = self.search_base(session)?;
        let filter = user_search_filter(sam_account_name);
        debug!(%base, %filter, "searching directory");

        let entries =
            session.search(&base, SearchScope::Subtree, &filter, ALL_USER_ATTRIBUTES, 1)?;
        Ok(entries.into_iter().next())
    }

    /// Uses the locator's base, or the server's default naming context for single-label domains.
    fn search_base(&self, session: &mut dyn LdapSession) -> Result<String> {
        if let Some(base) = self.config.root_locator().search_base() {
            return Ok(base.to_string());
        }

        session
            .search("", SearchScope::Base, ROOT_DSE_FILTER, ROOT_DSE_ATTRIBUTES, 1)?
            .into_iter()
            .next()
            .and_then(|root| root.first("defaultNamingContext").map(str::to_owned))
            .ok_or_else(|| {
                Error::NotFound("directory root DSE has no defaultNamingContext".to_string())
            })
    }
}

impl std::fmt::Debug for ActiveDirectoryUserManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveDirectoryUserManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn log_fault<T>(operation: &str, sam_account_name: &str, lookup: &PrincipalLookup<T>) {
    if let PrincipalLookup::Fault(err) = lookup {
        warn!(operation, sam_account_name, "directory {operation} failed: {err}");
    }
}

fn harvest_attributes(entry: &DirectoryEntry) -> UserDetails {
    let mut details = UserDetails::new();

    for (name, values) in &entry.attributes {
        details.add_multi_valued(name.as_str(), values);
    }
    for (name, values) in &entry.binary_attributes {
        details.add_multi_valued(name.as_str(), values.iter().map(hex::encode));
    }

    details
}

fn build_modifications(details: &UserDetails) -> Vec<DirectoryModification> {
    details
        .iter()
        .map(|(attribute, value)| {
            if value.is_empty() {
                DirectoryModification::Clear {
                    attribute: attribute.to_string(),
                }
            } else {
                DirectoryModification::Replace {
                    attribute: attribute.to_string(),
                    values: vec![value.to_string()],
                }
            }
        })
        .collect()
}

fn user_search_filter(sam_account_name: &str) -> String {
    format!(
        "(&(objectClass=user)(sAMAccountName={}))",
        escape_filter_value(sam_account_name)
    )
}

/// Escapes a filter assertion value (RFC 4515).
fn escape_filter_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '*' => escaped.push_str("\\2a"),
            '(' => escaped.push_str("\\28"),
            ')' => escaped.push_str("\\29"),
            '\\' => escaped.push_str("\\5c"),
            '\0' => escaped.push_str("\\00"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
