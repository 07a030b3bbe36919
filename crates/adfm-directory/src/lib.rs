//! Active Directory (LDAP) user lookups and attribute updates.
//!
//! [`ActiveDirectoryUserManager`] resolves users by `sAMAccountName`, harvests their attributes
//! into a [`UserDetails`](adfm_core::UserDetails) bag and writes partial updates back as a single
//! modify request. Directory faults never reach the caller of the fail-safe operations; they are
//! logged and turned into an absent or empty result.

#![deny(missing_docs)]

mod client;
mod config;
mod locator;
mod manager;

pub use client::{DirectoryEntry, DirectoryModification, SearchScope};
pub use config::{DirectoryConfig, DEFAULT_CONNECTION_TIMEOUT_SECS};
pub use locator::{DirectoryRootLocator, LDAP_PATH_PREFIX};
pub use manager::{ActiveDirectoryUserManager, PrincipalLookup};

/// Convenient result alias that reuses the core error type.
pub type Result<T> = adfm_core::Result<T>;
