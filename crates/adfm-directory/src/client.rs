//! LDAP connection seam and its `ldap3` implementation.

use crate::{config::DirectoryConfig, Result};
use adfm_core::Error;
use ldap3::{
    LdapConn, LdapConnSettings, LdapError, Mod, Scope, SearchEntry, SearchOptions, SearchResult,
};
use native_tls::{Certificate, TlsConnector, TlsConnectorBuilder};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

const SERVICE: &str = "ldap";
const RC_SIZE_LIMIT_EXCEEDED: u32 = 4;

/// Represents the search scope for LDAP queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Base object only.
    Base,
    /// Entire subtree.
    Subtree,
}

impl From<SearchScope> for Scope {
    fn from(scope: SearchScope) -> Self {
        match scope {
            SearchScope::Base => Scope::Base,
            SearchScope::Subtree => Scope::Subtree,
        }
    }
}

/// Snapshot of a single directory entry returned by a search.
///
/// The entry is detached from the connection it was read over and is only meaningful for the
/// call that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Distinguished name of the entry.
    pub dn: String,
    /// Textual attributes (values preserve server order).
    pub attributes: HashMap<String, Vec<String>>,
    /// Attributes whose values are not valid UTF-8 (e.g. `objectGUID`, `objectSid`).
    pub binary_attributes: HashMap<String, Vec<Vec<u8>>>,
}

impl DirectoryEntry {
    /// Returns the first value of the attribute if present.
    #[must_use]
    pub fn first(&self, attribute: &str) -> Option<&str> {
        self.attributes
            .get(attribute)
            .and_then(|values| values.first().map(String::as_str))
    }

    /// Returns all values for the attribute.
    #[must_use]
    pub fn values(&self, attribute: &str) -> Option<&[String]> {
        self.attributes.get(attribute).map(Vec::as_slice)
    }
}

impl From<SearchEntry> for DirectoryEntry {
    fn from(entry: SearchEntry) -> Self {
        Self {
            dn: entry.dn,
            attributes: entry.attrs,
            binary_attributes: entry.bin_attrs,
        }
    }
}

/// LDAP modification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryModification {
    /// Replace all values of the attribute.
    Replace {
        /// Attribute to modify.
        attribute: String,
        /// Replacement values.
        values: Vec<String>,
    },
    /// Remove every value of the attribute.
    Clear {
        /// Attribute to clear.
        attribute: String,
    },
}

impl DirectoryModification {
    /// Attribute the modification applies to.
    #[must_use]
    pub fn attribute(&self) -> &str {
        match self {
            Self::Replace { attribute, .. } | Self::Clear { attribute } => attribute,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub(crate) trait LdapSession {
    fn simple_bind(&mut self, dn: &str, password: &str) -> Result<()>;
    fn search(
        &mut self,
        base_dn: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[&'static str],
        size_limit: i32,
    ) -> Result<Vec<DirectoryEntry>>;
    fn modify(&mut self, dn: &str, modifications: &[DirectoryModification]) -> Result<()>;
    fn unbind(&mut self) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
pub(crate) trait LdapConnector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn LdapSession>>;
}

/// Real LDAP connector backed by the synchronous `ldap3` connection.
pub(crate) struct RealLdapConnector {
    config: Arc<DirectoryConfig>,
}

impl RealLdapConnector {
    pub(crate) fn new(config: Arc<DirectoryConfig>) -> Self {
        Self { config }
    }
}

impl LdapConnector for RealLdapConnector {
    fn connect(&self) -> Result<Box<dyn LdapSession>> {
        let settings = build_ldap_settings(&self.config)?;
        let conn = LdapConn::with_settings(settings, self.config.url()).map_err(map_ldap_error)?;
        Ok(Box::new(RealLdapSession { inner: conn }))
    }
}

struct RealLdapSession {
    inner: LdapConn,
}

impl LdapSession for RealLdapSession {
    fn simple_bind(&mut self, dn: &str, password: &str) -> Result<()> {
        self.inner
            .simple_bind(dn, password)
            .and_then(ldap3::LdapResult::success)
            .map_err(map_ldap_error)?;
        Ok(())
    }

    fn search(
        &mut self,
        base_dn: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[&'static str],
        size_limit: i32,
    ) -> Result<Vec<DirectoryEntry>> {
        let SearchResult(entries, result) = self
            .inner
            .with_search_options(SearchOptions::new().sizelimit(size_limit))
            .search(base_dn, scope.into(), filter, attributes.to_vec())
            .map_err(map_ldap_error)?;

        // A size-limited search that found more matches still carries the first entries.
        if result.rc != RC_SIZE_LIMIT_EXCEEDED {
            result.success().map_err(map_ldap_error)?;
        }

        Ok(entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(DirectoryEntry::from)
            .collect())
    }

    fn modify(&mut self, dn: &str, modifications: &[DirectoryModification]) -> Result<()> {
        let mods = modifications
            .iter()
            .map(|m| match m {
                DirectoryModification::Replace { attribute, values } => Mod::Replace(
                    attribute.clone(),
                    values.iter().cloned().collect::<HashSet<_>>(),
                ),
                DirectoryModification::Clear { attribute } => {
                    Mod::Replace(attribute.clone(), HashSet::new())
                }
            })
            .collect::<Vec<_>>();

        self.inner
            .modify(dn, mods)
            .and_then(ldap3::LdapResult::success)
            .map_err(map_ldap_error)?;
        Ok(())
    }

    fn unbind(&mut self) -> Result<()> {
        self.inner.unbind().map_err(map_ldap_error)
    }
}

fn build_ldap_settings(config: &DirectoryConfig) -> Result<LdapConnSettings> {
    let settings = LdapConnSettings::new().set_conn_timeout(config.connection_timeout());

    if !config.tls_verify() {
        return Ok(settings
            .set_connector(tls_connector(TlsConnector::builder().danger_accept_invalid_certs(true))?)
            .set_no_tls_verify(true));
    }

    match config.tls_ca_cert() {
        Some(path) => {
            let certificate = read_ca_certificate(path)?;
            Ok(settings.set_connector(tls_connector(
                TlsConnector::builder().add_root_certificate(certificate),
            )?))
        }
        None => Ok(settings),
    }
}

/// Loads the PEM certificate used to trust a domain controller signed by a private CA.
fn read_ca_certificate(path: &Path) -> Result<Certificate> {
    let pem = fs::read(path).map_err(|err| {
        Error::ConfigError(format!(
            "cannot read domain controller CA certificate {}: {err}",
            path.display()
        ))
    })?;
    Certificate::from_pem(&pem).map_err(|err| {
        Error::ConfigError(format!(
            "{} is not a PEM certificate: {err}",
            path.display()
        ))
    })
}

fn tls_connector(builder: &mut TlsConnectorBuilder) -> Result<TlsConnector> {
    builder
        .build()
        .map_err(|err| Error::ConfigError(format!("cannot set up LDAPS/StartTLS: {err}")))
}

fn map_ldap_error(err: LdapError) -> Error {
    Error::ExternalServiceError {
        service: SERVICE.to_string(),
        message: err.to_string(),
    }
}
