use super::types::{ExitReason, ScreenState, ScreenStats};
use crate::camera::{BoundUseCases, CameraPlatform, CaptureRequest, FlashMode, UseCaseBinding};
use crate::config::DemocamConfig;
use crate::error::{DemocamError, Result};
use crate::events::{ScreenEventReceiver, ScreenEventSender};
use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::notice::{LogNotifier, Notifier};
use crate::permissions::PermissionProvider;
use crate::storage::CaptureStorage;
use crate::surface::PreviewSurface;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Single-screen coordinator that owns the camera use cases, the flash
/// state and the capture in flight.
///
/// All state changes happen on the task driving [`CaptureCoordinator::run`]
/// (or [`CaptureCoordinator::pump`]); permission requests, preview updates
/// and capture completions come back to it as screen events.
pub struct CaptureCoordinator {
    pub(super) config: DemocamConfig,
    pub(super) camera: Arc<dyn CameraPlatform>,
    pub(super) permissions: Arc<dyn PermissionProvider>,
    pub(super) surface: Arc<dyn PreviewSurface>,
    pub(super) notifier: Arc<dyn Notifier>,
    pub(super) storage: CaptureStorage,
    pub(super) lifecycle: Lifecycle,

    pub(super) state: ScreenState,
    pub(super) exit_reason: Option<ExitReason>,
    pub(super) flash_mode: FlashMode,
    pub(super) binding: Option<UseCaseBinding>,
    pub(super) in_flight: Option<CaptureRequest>,
    pub(super) stats: ScreenStats,

    pub(super) events_tx: ScreenEventSender,
    pub(super) events_rx: ScreenEventReceiver,
    pub(super) cancellation_token: CancellationToken,
}

impl CaptureCoordinator {
    pub fn builder() -> CaptureCoordinatorBuilder {
        CaptureCoordinatorBuilder::new()
    }

    /// Sender for UI input (taps, rotation, visibility)
    pub fn events(&self) -> ScreenEventSender {
        self.events_tx.clone()
    }

    pub fn state(&self) -> ScreenState {
        self.state
    }

    pub fn flash_mode(&self) -> FlashMode {
        self.flash_mode
    }

    pub fn is_capture_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight_request(&self) -> Option<&CaptureRequest> {
        self.in_flight.as_ref()
    }

    pub fn bound_use_cases(&self) -> Option<BoundUseCases> {
        self.binding.as_ref().map(UseCaseBinding::use_cases)
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.current()
    }

    pub fn exit_reason(&self) -> Option<&ExitReason> {
        self.exit_reason.as_ref()
    }

    pub fn stats(&self) -> &ScreenStats {
        &self.stats
    }

    pub fn storage(&self) -> &CaptureStorage {
        &self.storage
    }
}

/// Builder for the capture coordinator
pub struct CaptureCoordinatorBuilder {
    config: Option<DemocamConfig>,
    camera: Option<Arc<dyn CameraPlatform>>,
    permissions: Option<Arc<dyn PermissionProvider>>,
    surface: Option<Arc<dyn PreviewSurface>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl CaptureCoordinatorBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            camera: None,
            permissions: None,
            surface: None,
            notifier: None,
        }
    }

    pub fn config(mut self, config: DemocamConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn camera(mut self, camera: Arc<dyn CameraPlatform>) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn permissions(mut self, permissions: Arc<dyn PermissionProvider>) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn surface(mut self, surface: Arc<dyn PreviewSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Defaults to notices written to the log
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn build(self) -> Result<CaptureCoordinator> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let camera = self
            .camera
            .ok_or_else(|| DemocamError::system("Camera platform must be specified"))?;
        let permissions = self
            .permissions
            .ok_or_else(|| DemocamError::system("Permission provider must be specified"))?;
        let surface = self
            .surface
            .ok_or_else(|| DemocamError::system("Preview surface must be specified"))?;
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(LogNotifier));

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let storage = CaptureStorage::new(&config.storage);

        Ok(CaptureCoordinator {
            config,
            camera,
            permissions,
            surface,
            notifier,
            storage,
            lifecycle: Lifecycle::new(),
            state: ScreenState::Created,
            exit_reason: None,
            flash_mode: FlashMode::Off,
            binding: None,
            in_flight: None,
            stats: ScreenStats::default(),
            events_tx,
            events_rx,
            cancellation_token: CancellationToken::new(),
        })
    }
}

impl Default for CaptureCoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
