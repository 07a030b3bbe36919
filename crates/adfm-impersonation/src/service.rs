//! Impersonation executor.

use std::marker::PhantomData;
use std::sync::Arc;

use adfm_core::{ActiveDirectorySettings, Error, LogonError};
use tracing::{debug, error, warn};

use crate::provider::{LoginProvider, NativeLoginProvider, SecurityContext};

/// Runs units of work under the identity described by [`ActiveDirectorySettings`].
///
/// Every call performs its own logon; nothing is cached between calls. Impersonation applies to
/// the calling thread only, so unrelated work must not run on that thread while a call is in
/// progress, and other threads keep their own identity.
#[derive(Clone)]
pub struct ActiveDirectoryService {
    settings: Arc<ActiveDirectorySettings>,
    provider: Arc<dyn LoginProvider>,
}

impl ActiveDirectoryService {
    /// Creates an executor that logs on through `LogonUserW`.
    #[must_use]
    pub fn new(settings: Arc<ActiveDirectorySettings>) -> Self {
        Self::with_provider(settings, Arc::new(NativeLoginProvider::new()))
    }

    /// Creates an executor with a custom login provider.
    #[must_use]
    pub fn with_provider(
        settings: Arc<ActiveDirectorySettings>,
        provider: Arc<dyn LoginProvider>,
    ) -> Self {
        Self { settings, provider }
    }

    /// Returns the settings used for logons.
    #[must_use]
    pub fn settings(&self) -> &ActiveDirectorySettings {
        &self.settings
    }

    /// Runs `work` while the current thread impersonates the configured account.
    ///
    /// The logon token is released before this returns, whether `work` succeeded, failed or
    /// panicked. Errors returned by `work` are passed through unchanged. If the thread identity
    /// cannot be restored while `work` is unwinding, the process is aborted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Logon`] (converted into `E`) if the logon or the identity switch fails;
    /// `work` is not invoked in that case. Returns [`Error::InternalError`] if the thread identity
    /// could not be restored after `work`, discarding the work's result. Otherwise returns
    /// whatever `work` returns.
    ///
    /// [`Error::Logon`]: adfm_core::Error::Logon
    /// [`Error::InternalError`]: adfm_core::Error::InternalError
    pub fn run_impersonated<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&ImpersonationScope<'_>) -> Result<T, E>,
        E: From<Error>,
    {
        let settings = &*self.settings;
        let context = self.provider.logon(
            settings.username(),
            settings.domain(),
            settings.password(),
        )
        .map_err(Error::from)?;
        let mut guard = ContextGuard::new(context, settings.principal());

        guard.impersonate().map_err(Error::from)?;
        debug!(principal = %guard.principal, "running work under impersonation");

        let scope = ImpersonationScope {
            settings,
            _not_send: PhantomData,
        };
        let result = work(&scope);
        guard.release()?;
        result
    }

    /// Runs `work`, which produces no value, while impersonating the configured account.
    ///
    /// # Errors
    ///
    /// Same as [`run_impersonated`](Self::run_impersonated).
    pub fn run_impersonated_action<E, F>(&self, work: F) -> Result<(), E>
    where
        F: FnOnce(&ImpersonationScope<'_>) -> Result<(), E>,
        E: From<Error>,
    {
        self.run_impersonated(work)
    }
}

impl std::fmt::Debug for ActiveDirectoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveDirectoryService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Capability handed to work running under impersonation.
///
/// Only exists while the thread is impersonating and cannot be sent to another thread.
pub struct ImpersonationScope<'a> {
    settings: &'a ActiveDirectorySettings,
    _not_send: PhantomData<*mut ()>,
}

impl ImpersonationScope<'_> {
    /// Account name being impersonated.
    #[must_use]
    pub fn username(&self) -> &str {
        self.settings.username()
    }

    /// Domain of the impersonated account.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.settings.domain()
    }

    /// Down-level principal name (`DOMAIN\user`).
    #[must_use]
    pub fn principal(&self) -> String {
        self.settings.principal()
    }
}

/// Closes the context when dropped. A context still impersonating at drop time is reverted
/// first; failing that revert aborts the process.
struct ContextGuard {
    context: Box<dyn SecurityContext>,
    principal: String,
    impersonating: bool,
}

impl ContextGuard {
    fn new(context: Box<dyn SecurityContext>, principal: String) -> Self {
        Self {
            context,
            principal,
            impersonating: false,
        }
    }

    fn impersonate(&mut self) -> Result<(), LogonError> {
        self.context.impersonate()?;
        self.impersonating = true;
        Ok(())
    }

    /// Restores the thread identity, then closes the context on drop.
    fn release(mut self) -> crate::Result<()> {
        if !self.impersonating {
            return Ok(());
        }
        self.impersonating = false;
        self.context.revert().map_err(|err| {
            error!(principal = %self.principal, "failed to revert impersonation: {err}");
            err
        })
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        if self.impersonating {
            if let Err(err) = self.context.revert() {
                error!(
                    principal = %self.principal,
                    "failed to revert impersonation while unwinding, aborting: {err}"
                );
                std::process::abort();
            }
        }
        if let Err(err) = self.context.close() {
            warn!(principal = %self.principal, "failed to release logon token: {err}");
        }
    }
}
