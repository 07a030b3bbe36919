//! # adfm
//!
//! File and directory access that runs either as the calling process or as an impersonated
//! Active Directory account, plus Active Directory user lookups and updates.
//!
//! ## Modules
//!
//! - [`file`] - File create/overwrite/delete/read operations
//! - [`directory`] - Directory create/delete/listing operations
//! - [`services`] - One-stop construction of every service from a single settings value

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod directory;
pub mod file;
pub mod services;

pub use adfm_core::{ActiveDirectorySettings, Error, LogonError, Result, UserDetails};
pub use adfm_directory::{
    ActiveDirectoryUserManager, DirectoryConfig, DirectoryEntry, DirectoryRootLocator,
    PrincipalLookup,
};
pub use adfm_impersonation::{
    ActiveDirectoryService, ImpersonationScope, LoginProvider, NativeLoginProvider,
    SecurityContext,
};
pub use directory::DirectoryService;
pub use file::FileService;
pub use services::ActiveDirectoryFileManagement;
