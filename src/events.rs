use crate::camera::{CaptureRequest, CaptureResult, PreviewOutput};
use crate::permissions::PermissionResults;
use tokio::sync::mpsc;

/// Tappable controls on the capture screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    CaptureButton,
    FlashToggle,
}

/// Everything the capture screen reacts to, delivered on its event loop
#[derive(Debug, Clone)]
pub enum ScreenEvent {
    /// The user tapped a control
    Tap(Control),
    /// The permission request finished
    PermissionsResult(PermissionResults),
    /// The preview use case produced a new output stream
    PreviewUpdated(PreviewOutput),
    /// The display rotation changed to the given surface rotation code
    RotationChanged(i32),
    /// The screen was shown or hidden
    VisibilityChanged(bool),
    /// A capture started by a tap completed
    CaptureFinished {
        request: CaptureRequest,
        result: CaptureResult,
    },
    /// The user asked to leave the screen
    Close,
}

impl ScreenEvent {
    /// Get the event type as a string for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            ScreenEvent::Tap(Control::CaptureButton) => "tap_capture",
            ScreenEvent::Tap(Control::FlashToggle) => "tap_flash",
            ScreenEvent::PermissionsResult(_) => "permissions_result",
            ScreenEvent::PreviewUpdated(_) => "preview_updated",
            ScreenEvent::RotationChanged(_) => "rotation_changed",
            ScreenEvent::VisibilityChanged(_) => "visibility_changed",
            ScreenEvent::CaptureFinished { .. } => "capture_finished",
            ScreenEvent::Close => "close",
        }
    }
}

pub type ScreenEventSender = mpsc::UnboundedSender<ScreenEvent>;
pub type ScreenEventReceiver = mpsc::UnboundedReceiver<ScreenEvent>;
