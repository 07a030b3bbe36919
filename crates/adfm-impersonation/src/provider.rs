//! Login provider seam around the native "log on as user" primitive.

use adfm_core::LogonError;
use secrecy::SecretString;

use crate::Result;

/// Logged-on security context (an access token on Windows).
///
/// A context is owned by exactly one impersonated call. The executor calls [`close`] exactly once
/// per context, after [`revert`] when [`impersonate`] succeeded.
///
/// [`impersonate`]: SecurityContext::impersonate
/// [`revert`]: SecurityContext::revert
/// [`close`]: SecurityContext::close
#[cfg_attr(test, mockall::automock)]
pub trait SecurityContext {
    /// Switches the calling thread to this security context.
    ///
    /// # Errors
    ///
    /// Returns [`LogonError`] if the thread identity could not be switched.
    fn impersonate(&self) -> std::result::Result<(), LogonError>;

    /// Restores the calling thread's own identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS refused to revert the thread identity.
    fn revert(&self) -> Result<()>;

    /// Releases the underlying OS handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS refused to close the handle.
    fn close(&mut self) -> Result<()>;
}

/// Produces security contexts for a principal.
#[cfg_attr(test, mockall::automock)]
pub trait LoginProvider: Send + Sync {
    /// Performs a full interactive logon for `domain\username`.
    ///
    /// # Errors
    ///
    /// Returns [`LogonError`] carrying the native error code when the logon is rejected.
    fn logon(
        &self,
        username: &str,
        domain: &str,
        password: &SecretString,
    ) -> std::result::Result<Box<dyn SecurityContext>, LogonError>;
}

/// Login provider backed by `LogonUserW` (interactive logon, default provider).
///
/// On platforms other than Windows every logon fails with [`LogonError::unsupported`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeLoginProvider;

impl NativeLoginProvider {
    /// Creates the native provider.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LoginProvider for NativeLoginProvider {
    #[cfg(windows)]
    fn logon(
        &self,
        username: &str,
        domain: &str,
        password: &SecretString,
    ) -> std::result::Result<Box<dyn SecurityContext>, LogonError> {
        let token = crate::native::AccessToken::logon(username, domain, password)?;
        Ok(Box::new(token))
    }

    #[cfg(not(windows))]
    fn logon(
        &self,
        username: &str,
        domain: &str,
        _password: &SecretString,
    ) -> std::result::Result<Box<dyn SecurityContext>, LogonError> {
        Err(LogonError::unsupported(format!("{domain}\\{username}")))
    }
}
