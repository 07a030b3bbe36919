//! Service bundle built from a single settings value.

use std::sync::Arc;

use adfm_core::{ActiveDirectorySettings, Result};
use adfm_directory::{ActiveDirectoryUserManager, DirectoryConfig};
use adfm_impersonation::{ActiveDirectoryService, LoginProvider};
use tracing::info;

use crate::directory::DirectoryService;
use crate::file::FileService;

/// Every service of the crate, sharing one set of credentials.
///
/// ```no_run
/// use adfm::{ActiveDirectoryFileManagement, ActiveDirectorySettings};
///
/// # fn main() -> adfm::Result<()> {
/// let settings = ActiveDirectorySettings::new("svc-files", "s3cret", "corp.example.com")?;
/// let services = ActiveDirectoryFileManagement::new(settings)?;
///
/// services.files().create_text_under_user(r"\\fs01\share\hello.txt", "hello")?;
/// let details = services.users().get_principal_attributes("jdoe");
/// println!("{}", details.get_detail("mail"));
/// # Ok(())
/// # }
/// ```
pub struct ActiveDirectoryFileManagement {
    settings: Arc<ActiveDirectorySettings>,
    impersonation: ActiveDirectoryService,
    files: FileService,
    directories: DirectoryService,
    users: ActiveDirectoryUserManager,
}

impl ActiveDirectoryFileManagement {
    /// Builds every service with the native login provider and the default directory
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`adfm_core::Error::ConfigError`] if the settings are incomplete.
    pub fn new(settings: ActiveDirectorySettings) -> Result<Self> {
        settings.ensure_valid()?;
        let settings = Arc::new(settings);
        let impersonation = ActiveDirectoryService::new(settings.clone());
        let users = ActiveDirectoryUserManager::new(settings.clone());
        Ok(Self::assemble(settings, impersonation, users))
    }

    /// Builds every service around a custom login provider and directory configuration.
    ///
    /// The directory configuration carries the settings used for every service.
    #[must_use]
    pub fn with_parts(provider: Arc<dyn LoginProvider>, directory: DirectoryConfig) -> Self {
        let settings = Arc::new(directory.settings().clone());
        let impersonation = ActiveDirectoryService::with_provider(settings.clone(), provider);
        let users = ActiveDirectoryUserManager::with_config(directory);
        Self::assemble(settings, impersonation, users)
    }

    fn assemble(
        settings: Arc<ActiveDirectorySettings>,
        impersonation: ActiveDirectoryService,
        users: ActiveDirectoryUserManager,
    ) -> Self {
        info!(
            principal = %settings.principal(),
            root = %users.root_locator(),
            "active directory file management ready"
        );

        Self {
            files: FileService::new(impersonation.clone()),
            directories: DirectoryService::new(impersonation.clone()),
            settings,
            impersonation,
            users,
        }
    }

    /// Returns the shared settings.
    #[must_use]
    pub fn settings(&self) -> &ActiveDirectorySettings {
        &self.settings
    }

    /// Returns the impersonation executor.
    #[must_use]
    pub fn impersonation(&self) -> &ActiveDirectoryService {
        &self.impersonation
    }

    /// Returns the file service.
    #[must_use]
    pub fn files(&self) -> &FileService {
        &self.files
    }

    /// Returns the directory service.
    #[must_use]
    pub fn directories(&self) -> &DirectoryService {
        &self.directories
    }

    /// Returns the Active Directory user manager.
    #[must_use]
    pub fn users(&self) -> &ActiveDirectoryUserManager {
        &self.users
    }
}

impl std::fmt::Debug for ActiveDirectoryFileManagement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveDirectoryFileManagement")
            .field("settings", &self.settings)
            .field("root_locator", self.users.root_locator())
            .finish_non_exhaustive()
    }
}
