//! Runtime permissions the capture screen needs before touching the camera.

use crate::error::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Camera,
    WriteExternalStorage,
}

impl Permission {
    pub fn name(&self) -> &'static str {
        match self {
            Permission::Camera => "CAMERA",
            Permission::WriteExternalStorage => "WRITE_EXTERNAL_STORAGE",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything the capture screen asks for, in one combined request
pub const REQUIRED_PERMISSIONS: [Permission; 2] =
    [Permission::Camera, Permission::WriteExternalStorage];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

pub type PermissionResults = Vec<(Permission, PermissionStatus)>;

/// Operating system permission service
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    fn check(&self, permission: Permission) -> PermissionStatus;

    /// Ask the user for `permissions`; resolves once they answered
    async fn request(&self, permissions: &[Permission]) -> Result<PermissionResults>;
}

/// Permissions from `permissions` that are not currently granted
pub fn missing_permissions(
    provider: &dyn PermissionProvider,
    permissions: &[Permission],
) -> Vec<Permission> {
    permissions
        .iter()
        .copied()
        .filter(|permission| provider.check(*permission) != PermissionStatus::Granted)
        .collect()
}

pub fn all_granted(provider: &dyn PermissionProvider, permissions: &[Permission]) -> bool {
    missing_permissions(provider, permissions).is_empty()
}

/// In-memory permission provider
pub struct StaticPermissionProvider {
    granted: Mutex<HashSet<Permission>>,
    grant_on_request: bool,
    request_count: AtomicUsize,
}

impl StaticPermissionProvider {
    pub fn new<I: IntoIterator<Item = Permission>>(granted: I) -> Self {
        Self {
            granted: Mutex::new(granted.into_iter().collect()),
            grant_on_request: false,
            request_count: AtomicUsize::new(0),
        }
    }

    pub fn granting_all() -> Self {
        Self::new(REQUIRED_PERMISSIONS)
    }

    pub fn denying_all() -> Self {
        Self::new([])
    }

    /// Grant everything that gets requested, as a user accepting the dialog
    pub fn with_grant_on_request(mut self, grant: bool) -> Self {
        self.grant_on_request = grant;
        self
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PermissionProvider for StaticPermissionProvider {
    fn check(&self, permission: Permission) -> PermissionStatus {
        if self.granted.lock().contains(&permission) {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }

    async fn request(&self, permissions: &[Permission]) -> Result<PermissionResults> {
        self.request_count.fetch_add(1, Ordering::Relaxed);

        if self.grant_on_request {
            self.granted.lock().extend(permissions.iter().copied());
        }

        Ok(permissions
            .iter()
            .map(|permission| (*permission, self.check(*permission)))
            .collect())
    }
}

/// Permission provider backed by filesystem access checks.
///
/// Camera access means the device node is readable and writable; storage
/// access means the storage root (or its nearest existing ancestor) is
/// writable. There is no dialog to show, so a request re-checks.
pub struct DevicePermissionProvider {
    camera_device: Option<PathBuf>,
    storage_root: PathBuf,
}

impl DevicePermissionProvider {
    pub fn new(camera_device: Option<PathBuf>, storage_root: PathBuf) -> Self {
        Self {
            camera_device,
            storage_root,
        }
    }

    fn nearest_existing(path: &Path) -> Option<&Path> {
        path.ancestors().find(|candidate| candidate.exists())
    }
}

#[async_trait]
impl PermissionProvider for DevicePermissionProvider {
    fn check(&self, permission: Permission) -> PermissionStatus {
        let granted = match permission {
            Permission::Camera => match &self.camera_device {
                Some(device) => is_accessible(device, AccessMode::ReadWrite),
                None => true,
            },
            Permission::WriteExternalStorage => Self::nearest_existing(&self.storage_root)
                .map(|existing| is_accessible(existing, AccessMode::Write))
                .unwrap_or(false),
        };

        debug!("Permission {} granted: {}", permission, granted);
        if granted {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }

    async fn request(&self, permissions: &[Permission]) -> Result<PermissionResults> {
        let results: PermissionResults = permissions
            .iter()
            .map(|permission| (*permission, self.check(*permission)))
            .collect();

        for (permission, status) in &results {
            if *status == PermissionStatus::Denied {
                match permission {
                    Permission::Camera => warn!(
                        "No access to camera device {:?}; check video group membership",
                        self.camera_device
                    ),
                    Permission::WriteExternalStorage => warn!(
                        "Storage root {} is not writable",
                        self.storage_root.display()
                    ),
                }
            }
        }

        Ok(results)
    }
}

enum AccessMode {
    Write,
    ReadWrite,
}

#[cfg(unix)]
fn is_accessible(path: &Path, mode: AccessMode) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    let flags = match mode {
        AccessMode::Write => libc::W_OK,
        AccessMode::ReadWrite => libc::R_OK | libc::W_OK,
    };

    // SAFETY: c_path is a valid NUL-terminated string for the duration of the call
    unsafe { libc::access(c_path.as_ptr(), flags) == 0 }
}

#[cfg(not(unix))]
fn is_accessible(path: &Path, mode: AccessMode) -> bool {
    match std::fs::metadata(path) {
        Ok(metadata) => match mode {
            AccessMode::Write | AccessMode::ReadWrite => !metadata.permissions().readonly(),
        },
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_static_provider_grant_on_request() {
        let provider = StaticPermissionProvider::denying_all().with_grant_on_request(true);
        assert!(!all_granted(&provider, &REQUIRED_PERMISSIONS));

        let results = provider.request(&REQUIRED_PERMISSIONS).await.unwrap();
        assert!(results
            .iter()
            .all(|(_, status)| *status == PermissionStatus::Granted));
        assert!(all_granted(&provider, &REQUIRED_PERMISSIONS));
        assert_eq!(provider.request_count(), 1);
    }

    #[tokio::test]
    async fn test_static_provider_partial_grant() {
        let provider = StaticPermissionProvider::new([Permission::Camera]);
        assert_eq!(
            missing_permissions(&provider, &REQUIRED_PERMISSIONS),
            vec![Permission::WriteExternalStorage]
        );

        let results = provider.request(&REQUIRED_PERMISSIONS).await.unwrap();
        assert_eq!(
            results,
            vec![
                (Permission::Camera, PermissionStatus::Granted),
                (Permission::WriteExternalStorage, PermissionStatus::Denied),
            ]
        );
    }

    #[test]
    fn test_device_provider_checks_storage_ancestors() {
        let temp_dir = TempDir::new().unwrap();
        let provider =
            DevicePermissionProvider::new(None, temp_dir.path().join("not/yet/created"));

        assert_eq!(provider.check(Permission::Camera), PermissionStatus::Granted);
        assert_eq!(
            provider.check(Permission::WriteExternalStorage),
            PermissionStatus::Granted
        );
    }

    #[test]
    fn test_device_provider_missing_camera_device() {
        let temp_dir = TempDir::new().unwrap();
        let provider = DevicePermissionProvider::new(
            Some(temp_dir.path().join("video99")),
            temp_dir.path().to_path_buf(),
        );

        assert_eq!(provider.check(Permission::Camera), PermissionStatus::Denied);
    }

    #[test]
    fn test_permission_names() {
        assert_eq!(Permission::Camera.to_string(), "CAMERA");
        assert_eq!(
            Permission::WriteExternalStorage.name(),
            "WRITE_EXTERNAL_STORAGE"
        );
    }
}
