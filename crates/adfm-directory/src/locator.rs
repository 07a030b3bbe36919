//! Directory root locator derived from the configured domain.

use std::fmt;

/// Fixed prefix of every root locator.
pub const LDAP_PATH_PREFIX: &str = "LDAP://";

const DOMAIN_COMPONENT_SEPARATOR: &str = ",";

/// Root path of the directory, computed once from the domain name.
///
/// A dotted domain such as `corp.example.com` yields `LDAP://DC=corp,DC=example,DC=com`; a
/// single-label domain such as `CORP` yields the bare `LDAP://`, which leaves the naming context
/// to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRootLocator {
    path: String,
    search_base: Option<String>,
}

impl DirectoryRootLocator {
    /// Derives the locator from a domain name.
    #[must_use]
    pub fn from_domain(domain: &str) -> Self {
        let labels = domain.split('.').collect::<Vec<_>>();
        if labels.len() < 2 {
            return Self {
                path: LDAP_PATH_PREFIX.to_string(),
                search_base: None,
            };
        }

        let base = labels
            .iter()
            .map(|label| format!("DC={label}"))
            .collect::<Vec<_>>()
            .join(DOMAIN_COMPONENT_SEPARATOR);

        Self {
            path: format!("{LDAP_PATH_PREFIX}{base}"),
            search_base: Some(base),
        }
    }

    /// Full locator string (e.g. `LDAP://DC=corp,DC=example,DC=com`).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Search base distinguished name, absent for single-label domains.
    #[must_use]
    pub fn search_base(&self) -> Option<&str> {
        self.search_base.as_deref()
    }
}

impl fmt::Display for DirectoryRootLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_domain_becomes_domain_components() {
        let locator = DirectoryRootLocator::from_domain("corp.example.com");
        assert_eq!(locator.as_str(), "LDAP://DC=corp,DC=example,DC=com");
        assert_eq!(locator.search_base(), Some("DC=corp,DC=example,DC=com"));
    }

    #[test]
    fn two_labels_are_enough() {
        let locator = DirectoryRootLocator::from_domain("example.com");
        assert_eq!(locator.to_string(), "LDAP://DC=example,DC=com");
    }

    #[test]
    fn single_label_domain_is_bare_prefix() {
        let locator = DirectoryRootLocator::from_domain("CORP");
        assert_eq!(locator.as_str(), "LDAP://");
        assert_eq!(locator.search_base(), None);
    }
}
