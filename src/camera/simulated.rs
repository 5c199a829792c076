use super::platform::CameraPlatform;
use super::types::{
    BoundUseCases, CaptureFailure, CaptureFailureKind, CaptureMode, CaptureRequest, CaptureResult,
    FlashMode, ImageCaptureConfig, PreviewConfig, PreviewOutput, Size, UseCaseId,
};
use crate::error::{CameraError, Result};
use crate::lifecycle::{LifecycleObserver, LifecycleState};
use crate::transform::SurfaceRotation;
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, ColorType, Rgb, RgbImage};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

const JPEG_QUALITY: u8 = 85;

struct SimulatedBinding {
    use_cases: BoundUseCases,
    capture: ImageCaptureConfig,
    lifecycle: LifecycleObserver,
    cancellation_token: CancellationToken,
}

/// Camera platform that renders a test pattern instead of reading a sensor
pub struct SimulatedCameraPlatform {
    sensor: Size,
    bindings: Mutex<Vec<SimulatedBinding>>,
    texture_counter: Arc<AtomicU64>,
    capture_counter: AtomicU64,
}

impl SimulatedCameraPlatform {
    pub fn new(sensor: Size) -> Self {
        info!("Initializing simulated camera platform ({})", sensor);
        Self {
            sensor,
            bindings: Mutex::new(Vec::new()),
            texture_counter: Arc::new(AtomicU64::new(0)),
            capture_counter: AtomicU64::new(0),
        }
    }

    /// Number of captures completed so far
    pub fn capture_count(&self) -> u64 {
        self.capture_counter.load(Ordering::Relaxed)
    }

    fn capture_latency(mode: CaptureMode) -> Duration {
        match mode {
            CaptureMode::MinLatency => Duration::from_millis(30),
            CaptureMode::MaxQuality => Duration::from_millis(150),
        }
    }

    /// Emit a new preview output each time the lifecycle becomes active
    fn spawn_preview_task(
        &self,
        preview: PreviewConfig,
        mut lifecycle: LifecycleObserver,
        preview_outputs: mpsc::UnboundedSender<PreviewOutput>,
        cancellation_token: CancellationToken,
    ) {
        let texture_counter = Arc::clone(&self.texture_counter);

        tokio::spawn(async move {
            loop {
                let state = *lifecycle.borrow_and_update();
                if state == LifecycleState::Destroyed {
                    break;
                }

                if state.is_active() {
                    let output = PreviewOutput {
                        texture_id: texture_counter.fetch_add(1, Ordering::Relaxed) + 1,
                        size: preview.target_resolution,
                        rotation_degrees: 0,
                    };
                    trace!("Simulated preview output {}", output.texture_id);
                    if preview_outputs.send(output).is_err() {
                        break;
                    }
                }

                tokio::select! {
                    _ = cancellation_token.cancelled() => break,
                    changed = lifecycle.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }

            debug!("Simulated preview task stopped");
        });
    }
}

#[async_trait]
impl CameraPlatform for SimulatedCameraPlatform {
    fn unbind_all(&self) {
        let mut bindings = self.bindings.lock();
        for binding in bindings.drain(..) {
            binding.cancellation_token.cancel();
        }
    }

    fn bind_to_lifecycle(
        &self,
        lifecycle: LifecycleObserver,
        preview: PreviewConfig,
        capture: ImageCaptureConfig,
        preview_outputs: mpsc::UnboundedSender<PreviewOutput>,
    ) -> Result<BoundUseCases> {
        if preview.target_resolution.is_empty() {
            return Err(CameraError::Bind {
                details: format!("invalid preview resolution {}", preview.target_resolution),
            }
            .into());
        }

        let use_cases = BoundUseCases {
            preview: UseCaseId::new(),
            image_capture: UseCaseId::new(),
        };
        let cancellation_token = CancellationToken::new();

        self.spawn_preview_task(
            preview,
            lifecycle.clone(),
            preview_outputs,
            cancellation_token.clone(),
        );

        info!(
            "Simulated camera bound: preview {} ({}), capture {:?} lens {:?}",
            preview.target_resolution,
            preview.target_aspect_ratio,
            capture.capture_mode,
            capture.lens_facing
        );

        self.bindings.lock().push(SimulatedBinding {
            use_cases,
            capture,
            lifecycle,
            cancellation_token,
        });

        Ok(use_cases)
    }

    fn unbind(&self, use_cases: &BoundUseCases) {
        self.bindings.lock().retain(|binding| {
            if binding.use_cases == *use_cases {
                binding.cancellation_token.cancel();
                false
            } else {
                true
            }
        });
    }

    fn set_flash_mode(&self, image_capture: UseCaseId, mode: FlashMode) -> Result<()> {
        let mut bindings = self.bindings.lock();
        let binding = bindings
            .iter_mut()
            .find(|binding| binding.use_cases.image_capture == image_capture)
            .ok_or_else(|| CameraError::UnknownUseCase {
                id: image_capture.to_string(),
            })?;
        binding.capture.flash_mode = mode;
        debug!("Simulated flash mode set to {:?}", mode);
        Ok(())
    }

    async fn take_picture(
        &self,
        image_capture: UseCaseId,
        request: CaptureRequest,
    ) -> CaptureResult {
        let capture = {
            let bindings = self.bindings.lock();
            let binding = bindings
                .iter()
                .find(|binding| binding.use_cases.image_capture == image_capture)
                .ok_or_else(|| {
                    CaptureFailure::new(
                        CaptureFailureKind::Unknown,
                        "image capture use case is not bound",
                    )
                })?;

            if !binding.lifecycle.borrow().is_active() {
                return Err(CaptureFailure::new(
                    CaptureFailureKind::Unknown,
                    "camera is suspended",
                ));
            }
            binding.capture
        };

        tokio::time::sleep(Self::capture_latency(capture.capture_mode)).await;

        let sensor = self.sensor;
        let flash = capture.flash_mode;
        let encoded = tokio::task::spawn_blocking(move || {
            encode_test_pattern(sensor, capture.target_rotation, flash)
        })
        .await
        .map_err(|e| {
            CaptureFailure::new(CaptureFailureKind::Unknown, "encoder task failed")
                .with_cause(e.to_string())
        })??;

        // Only fill an existing destination; a placeholder removed after a
        // timeout must not be recreated by a late write
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&request.destination)
            .await
            .map_err(|e| {
                CaptureFailure::new(CaptureFailureKind::FileIo, "destination is gone")
                    .with_cause(e.to_string())
            })?;
        file.write_all(&encoded).await.map_err(|e| {
            CaptureFailure::new(CaptureFailureKind::FileIo, "failed to write image")
                .with_cause(e.to_string())
        })?;

        self.capture_counter.fetch_add(1, Ordering::Relaxed);
        debug!(
            "Simulated capture wrote {} bytes to {}",
            encoded.len(),
            request.destination.display()
        );

        Ok(request.destination)
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

/// Render a gradient test pattern and encode it as JPEG
fn encode_test_pattern(
    sensor: Size,
    rotation: SurfaceRotation,
    flash: FlashMode,
) -> std::result::Result<Vec<u8>, CaptureFailure> {
    let boost: u16 = if flash.is_on() { 60 } else { 0 };
    let pattern = RgbImage::from_fn(sensor.width, sensor.height, |x, y| {
        let r = (x * 255 / sensor.width.max(1)) as u16 + boost;
        let g = (y * 255 / sensor.height.max(1)) as u16 + boost;
        let b = 128 + boost;
        Rgb([r.min(255) as u8, g.min(255) as u8, b.min(255) as u8])
    });

    let oriented = match rotation {
        SurfaceRotation::Rotation0 => pattern,
        SurfaceRotation::Rotation90 => imageops::rotate90(&pattern),
        SurfaceRotation::Rotation180 => imageops::rotate180(&pattern),
        SurfaceRotation::Rotation270 => imageops::rotate270(&pattern),
    };

    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY)
        .encode(
            oriented.as_raw(),
            oriented.width(),
            oriented.height(),
            ColorType::Rgb8,
        )
        .map_err(|e| {
            CaptureFailure::new(CaptureFailureKind::Unknown, "JPEG encoding failed")
                .with_cause(e.to_string())
        })?;

    Ok(buffer)
}
