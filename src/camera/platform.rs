use super::types::{
    BoundUseCases, CaptureRequest, CaptureResult, FlashMode, ImageCaptureConfig, PreviewConfig,
    PreviewOutput, UseCaseId,
};
use crate::error::Result;
use crate::lifecycle::LifecycleObserver;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Camera service provided by the host platform.
///
/// The platform owns the sensor pipeline and encoding; the coordinator only
/// configures use cases and asks for captures. Bound use cases follow the
/// lifecycle they were bound with: suspended while it is inactive, resumed
/// when it becomes active again.
#[async_trait]
pub trait CameraPlatform: Send + Sync {
    /// Release every use case this platform has bound
    fn unbind_all(&self);

    /// Bind a preview and an image capture use case to `lifecycle`.
    /// New preview outputs are delivered on `preview_outputs`.
    fn bind_to_lifecycle(
        &self,
        lifecycle: LifecycleObserver,
        preview: PreviewConfig,
        capture: ImageCaptureConfig,
        preview_outputs: mpsc::UnboundedSender<PreviewOutput>,
    ) -> Result<BoundUseCases>;

    /// Release the given use cases. Unknown ids are ignored.
    fn unbind(&self, use_cases: &BoundUseCases);

    fn set_flash_mode(&self, image_capture: UseCaseId, mode: FlashMode) -> Result<()>;

    /// Capture one still image into `request.destination`
    async fn take_picture(&self, image_capture: UseCaseId, request: CaptureRequest)
        -> CaptureResult;

    /// Name of this platform for logging
    fn name(&self) -> &str;
}

/// Use cases bound to a lifecycle, released when dropped
pub struct UseCaseBinding {
    platform: Arc<dyn CameraPlatform>,
    use_cases: BoundUseCases,
}

impl UseCaseBinding {
    pub fn acquire(
        platform: Arc<dyn CameraPlatform>,
        lifecycle: LifecycleObserver,
        preview: PreviewConfig,
        capture: ImageCaptureConfig,
        preview_outputs: mpsc::UnboundedSender<PreviewOutput>,
    ) -> Result<Self> {
        let use_cases = platform.bind_to_lifecycle(lifecycle, preview, capture, preview_outputs)?;
        debug!(
            "Bound preview {} and image capture {} on {}",
            use_cases.preview,
            use_cases.image_capture,
            platform.name()
        );

        Ok(Self {
            platform,
            use_cases,
        })
    }

    pub fn use_cases(&self) -> BoundUseCases {
        self.use_cases
    }

    pub fn image_capture(&self) -> UseCaseId {
        self.use_cases.image_capture
    }

    pub fn preview(&self) -> UseCaseId {
        self.use_cases.preview
    }

    pub fn platform(&self) -> Arc<dyn CameraPlatform> {
        Arc::clone(&self.platform)
    }
}

impl Drop for UseCaseBinding {
    fn drop(&mut self) {
        debug!(
            "Releasing preview {} and image capture {}",
            self.use_cases.preview, self.use_cases.image_capture
        );
        self.platform.unbind(&self.use_cases);
    }
}
