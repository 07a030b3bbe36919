//! Windows access tokens obtained through `LogonUserW`.

use ::windows::core::{Error as WinError, PCWSTR};
use ::windows::Win32::Foundation::{CloseHandle, HANDLE};
use ::windows::Win32::Security::{
    ImpersonateLoggedOnUser, LogonUserW, RevertToSelf, LOGON32_LOGON_INTERACTIVE,
    LOGON32_PROVIDER_DEFAULT,
};
use adfm_core::{Error, LogonError};
use secrecy::zeroize::Zeroizing;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::provider::SecurityContext;
use crate::Result;

const FACILITY_WIN32_MASK: u32 = 0xFFFF_0000;
const FACILITY_WIN32_PREFIX: u32 = 0x8007_0000;

/// Primary token of a logged-on user. Closed exactly once, at the latest on drop.
pub(crate) struct AccessToken {
    handle: HANDLE,
    principal: String,
    closed: bool,
}

impl AccessToken {
    pub(crate) fn logon(
        username: &str,
        domain: &str,
        password: &SecretString,
    ) -> std::result::Result<Self, LogonError> {
        let principal = format!("{domain}\\{username}");
        let username_w = to_wide(username);
        let domain_w = to_wide(domain);
        let password_w = Zeroizing::new(to_wide(password.expose_secret()));
        let mut handle = HANDLE::default();

        debug!(%principal, "logging on (interactive, default provider)");
        unsafe {
            LogonUserW(
                PCWSTR(username_w.as_ptr()),
                PCWSTR(domain_w.as_ptr()),
                PCWSTR(password_w.as_ptr()),
                LOGON32_LOGON_INTERACTIVE,
                LOGON32_PROVIDER_DEFAULT,
                &mut handle,
            )
        }
        .map_err(|e| logon_error(&principal, &e))?;

        Ok(Self {
            handle,
            principal,
            closed: false,
        })
    }
}

impl SecurityContext for AccessToken {
    fn impersonate(&self) -> std::result::Result<(), LogonError> {
        unsafe { ImpersonateLoggedOnUser(self.handle) }
            .map_err(|e| logon_error(&self.principal, &e))
    }

    fn revert(&self) -> Result<()> {
        unsafe { RevertToSelf() }.map_err(|e| Error::InternalError(format!("RevertToSelf: {e}")))
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        unsafe { CloseHandle(self.handle) }
            .map_err(|e| Error::InternalError(format!("CloseHandle: {e}")))
    }
}

impl Drop for AccessToken {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn logon_error(principal: &str, err: &WinError) -> LogonError {
    LogonError::native(principal, native_code(err), err.message())
}

/// Unwraps `HRESULT_FROM_WIN32` so callers see the plain Win32 error code.
fn native_code(err: &WinError) -> i32 {
    let hresult = err.code().0 as u32;
    if hresult & FACILITY_WIN32_MASK == FACILITY_WIN32_PREFIX {
        (hresult & 0xFFFF) as i32
    } else {
        hresult as i32
    }
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}
