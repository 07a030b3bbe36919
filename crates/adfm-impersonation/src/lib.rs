//! Impersonated execution for Windows logons.
//!
//! [`ActiveDirectoryService`] logs on with the configured account, switches the calling thread
//! to that identity for the duration of a unit of work and releases the logon token on every exit
//! path. The native logon primitive sits behind [`LoginProvider`] so it can be replaced.

#![deny(missing_docs)]

#[cfg(windows)]
mod native;
mod provider;
mod service;

pub use provider::{LoginProvider, NativeLoginProvider, SecurityContext};
pub use service::{ActiveDirectoryService, ImpersonationScope};

/// Convenient result alias that reuses the core error type.
pub type Result<T> = adfm_core::Result<T>;
