//! # adfm-core
//!
//! Core types shared by the impersonation executor, the Active Directory user manager and the
//! file/directory facades.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy, including the logon failure surfaced by impersonation
//! - [`settings`] - Credential configuration supplied once at construction
//! - [`details`] - Attribute bag describing a subset of a directory user's properties

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod details;
pub mod error;
pub mod settings;

// Re-export commonly used types
pub use details::{UserDetails, MULTI_VALUE_DELIMITER};
pub use error::{Error, LogonError, Result};
pub use settings::ActiveDirectorySettings;
