mod mock;
mod platform;
#[cfg(feature = "simulated_camera")]
mod simulated;
mod types;


pub use mock::{MockCameraPlatform, MockCaptureBehavior};
pub use platform::{CameraPlatform, UseCaseBinding};
#[cfg(feature = "simulated_camera")]
pub use simulated::SimulatedCameraPlatform;
pub use types::{
    AspectRatio, BoundUseCases, CaptureFailure, CaptureFailureKind, CaptureMode, CaptureRequest,
    CaptureResult, FlashMode, ImageCaptureConfig, LensFacing, PreviewConfig, PreviewOutput, Size,
    UseCaseId,
};
