pub mod camera;
pub mod config;
pub mod error;
pub mod events;
pub mod keyboard_input;
pub mod lifecycle;
pub mod notice;
pub mod permissions;
pub mod screen;
pub mod storage;
pub mod surface;
pub mod transform;

pub use camera::{
    CameraPlatform, CaptureFailure, CaptureFailureKind, CaptureRequest, CaptureResult, FlashMode,
    MockCameraPlatform, MockCaptureBehavior, Size, UseCaseBinding,
};
#[cfg(feature = "simulated_camera")]
pub use camera::SimulatedCameraPlatform;
pub use config::DemocamConfig;
pub use error::{CameraError, DemocamError, PermissionError, Result, StorageError};
pub use events::{Control, ScreenEvent, ScreenEventReceiver, ScreenEventSender};
pub use keyboard_input::{KeyAction, KeyboardInputHandler};
pub use lifecycle::{Lifecycle, LifecycleObserver, LifecycleState};
pub use notice::{ChannelNotifier, LogNotifier, Notice, NoticeDuration, Notifier};
pub use permissions::{
    DevicePermissionProvider, Permission, PermissionProvider, PermissionStatus,
    StaticPermissionProvider, REQUIRED_PERMISSIONS,
};
pub use screen::{CaptureCoordinator, CaptureCoordinatorBuilder, ExitReason, ScreenState, ScreenStats};
pub use storage::CaptureStorage;
pub use surface::{HeadlessSurface, PreviewSurface, SurfaceSnapshot};
pub use transform::{preview_transform, PreviewTransform, SurfaceRotation};
