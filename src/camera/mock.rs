use super::platform::CameraPlatform;
use super::types::{
    BoundUseCases, CaptureFailure, CaptureFailureKind, CaptureRequest, CaptureResult, FlashMode,
    ImageCaptureConfig, PreviewConfig, PreviewOutput, UseCaseId,
};
use crate::error::{CameraError, Result};
use crate::lifecycle::LifecycleObserver;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

/// How the mock answers `take_picture`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCaptureBehavior {
    /// Write a small placeholder payload to the destination
    Succeed,
    Fail {
        message: String,
        cause: Option<String>,
    },
    /// Never answer
    Hang,
}

struct MockBinding {
    use_cases: BoundUseCases,
    lifecycle: LifecycleObserver,
    preview: PreviewConfig,
    capture: ImageCaptureConfig,
    preview_outputs: mpsc::UnboundedSender<PreviewOutput>,
}

struct MockState {
    bindings: Vec<MockBinding>,
    bind_calls: usize,
    unbind_all_calls: usize,
    flash_history: Vec<(UseCaseId, FlashMode)>,
    captures: Vec<CaptureRequest>,
    behavior: MockCaptureBehavior,
    next_texture_id: u64,
}

/// In-memory camera platform for exercising the coordinator without hardware
pub struct MockCameraPlatform {
    state: Mutex<MockState>,
}

impl MockCameraPlatform {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                bindings: Vec::new(),
                bind_calls: 0,
                unbind_all_calls: 0,
                flash_history: Vec::new(),
                captures: Vec::new(),
                behavior: MockCaptureBehavior::Succeed,
                next_texture_id: 1,
            }),
        }
    }

    pub fn set_capture_behavior(&self, behavior: MockCaptureBehavior) {
        self.state.lock().behavior = behavior;
    }

    pub fn bind_count(&self) -> usize {
        self.state.lock().bind_calls
    }

    pub fn unbind_all_count(&self) -> usize {
        self.state.lock().unbind_all_calls
    }

    /// Preview use cases currently bound
    pub fn bound_preview_count(&self) -> usize {
        self.state.lock().bindings.len()
    }

    /// Image capture use cases currently bound
    pub fn bound_capture_count(&self) -> usize {
        self.state.lock().bindings.len()
    }

    /// Bound use cases whose lifecycle currently lets them run
    pub fn running_count(&self) -> usize {
        self.state
            .lock()
            .bindings
            .iter()
            .filter(|binding| binding.lifecycle.borrow().is_active())
            .count()
    }

    pub fn capture_config(&self, id: UseCaseId) -> Option<ImageCaptureConfig> {
        self.state
            .lock()
            .bindings
            .iter()
            .find(|binding| binding.use_cases.image_capture == id)
            .map(|binding| binding.capture)
    }

    pub fn preview_config(&self, id: UseCaseId) -> Option<PreviewConfig> {
        self.state
            .lock()
            .bindings
            .iter()
            .find(|binding| binding.use_cases.preview == id)
            .map(|binding| binding.preview)
    }

    /// Flash mode currently configured on an image capture use case
    pub fn flash_mode(&self, id: UseCaseId) -> Option<FlashMode> {
        self.capture_config(id).map(|capture| capture.flash_mode)
    }

    pub fn flash_history(&self) -> Vec<(UseCaseId, FlashMode)> {
        self.state.lock().flash_history.clone()
    }

    pub fn captures(&self) -> Vec<CaptureRequest> {
        self.state.lock().captures.clone()
    }

    /// Push a new preview output to every bound preview use case.
    /// Returns the number of listeners reached.
    pub fn emit_preview_output(&self) -> usize {
        let mut state = self.state.lock();
        let texture_id = state.next_texture_id;
        state.next_texture_id += 1;

        state
            .bindings
            .iter()
            .filter(|binding| {
                binding
                    .preview_outputs
                    .send(PreviewOutput {
                        texture_id,
                        size: binding.preview.target_resolution,
                        rotation_degrees: 0,
                    })
                    .is_ok()
            })
            .count()
    }
}

impl Default for MockCameraPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CameraPlatform for MockCameraPlatform {
    fn unbind_all(&self) {
        let mut state = self.state.lock();
        state.unbind_all_calls += 1;
        state.bindings.clear();
    }

    fn bind_to_lifecycle(
        &self,
        lifecycle: LifecycleObserver,
        preview: PreviewConfig,
        capture: ImageCaptureConfig,
        preview_outputs: mpsc::UnboundedSender<PreviewOutput>,
    ) -> Result<BoundUseCases> {
        let use_cases = BoundUseCases {
            preview: UseCaseId::new(),
            image_capture: UseCaseId::new(),
        };

        let mut state = self.state.lock();
        state.bind_calls += 1;
        state.bindings.push(MockBinding {
            use_cases,
            lifecycle,
            preview,
            capture,
            preview_outputs,
        });

        Ok(use_cases)
    }

    fn unbind(&self, use_cases: &BoundUseCases) {
        self.state
            .lock()
            .bindings
            .retain(|binding| binding.use_cases != *use_cases);
    }

    fn set_flash_mode(&self, image_capture: UseCaseId, mode: FlashMode) -> Result<()> {
        let mut state = self.state.lock();
        let binding = state
            .bindings
            .iter_mut()
            .find(|binding| binding.use_cases.image_capture == image_capture)
            .ok_or_else(|| CameraError::UnknownUseCase {
                id: image_capture.to_string(),
            })?;
        binding.capture.flash_mode = mode;
        state.flash_history.push((image_capture, mode));
        Ok(())
    }

    async fn take_picture(
        &self,
        image_capture: UseCaseId,
        request: CaptureRequest,
    ) -> CaptureResult {
        let behavior = {
            let mut state = self.state.lock();
            let running = state
                .bindings
                .iter()
                .find(|binding| binding.use_cases.image_capture == image_capture)
                .map(|binding| binding.lifecycle.borrow().is_active());

            match running {
                None => {
                    return Err(CaptureFailure::new(
                        CaptureFailureKind::Unknown,
                        "image capture use case is not bound",
                    ))
                }
                Some(false) => {
                    return Err(CaptureFailure::new(
                        CaptureFailureKind::Unknown,
                        "camera is suspended",
                    ))
                }
                Some(true) => {}
            }

            state.captures.push(request.clone());
            state.behavior.clone()
        };

        debug!("Mock capture into {}", request.destination.display());

        match behavior {
            MockCaptureBehavior::Succeed => {
                tokio::fs::write(&request.destination, b"mock jpeg")
                    .await
                    .map_err(|e| {
                        CaptureFailure::new(CaptureFailureKind::FileIo, "failed to write image")
                            .with_cause(e.to_string())
                    })?;
                Ok(request.destination)
            }
            MockCaptureBehavior::Fail { message, cause } => {
                let failure = CaptureFailure::new(CaptureFailureKind::Unknown, message);
                Err(match cause {
                    Some(cause) => failure.with_cause(cause),
                    None => failure,
                })
            }
            MockCaptureBehavior::Hang => std::future::pending::<CaptureResult>().await,
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
