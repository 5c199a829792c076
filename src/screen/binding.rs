use super::{CaptureCoordinator, ScreenState};
use crate::camera::{
    AspectRatio, ImageCaptureConfig, PreviewConfig, PreviewOutput, UseCaseBinding,
};
use crate::error::{CameraError, Result};
use crate::events::ScreenEvent;
use crate::notice::Notice;
use crate::transform::{preview_transform, SurfaceRotation};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

impl CaptureCoordinator {
    /// Bind preview and image capture to the screen lifecycle.
    ///
    /// Any previous binding is released first, so calling this twice leaves
    /// one preview and one capture use case bound.
    pub fn bind_camera(&mut self) -> Result<()> {
        if let Some(previous) = self.binding.take() {
            debug!("Releasing previous camera binding");
            drop(previous);
        }
        self.camera.unbind_all();

        match self.bind_use_cases() {
            Ok(binding) => {
                info!(
                    "Camera bound on {} (preview {}, image capture {})",
                    self.camera.name(),
                    binding.preview(),
                    binding.image_capture()
                );
                self.binding = Some(binding);
                self.state = ScreenState::Bound;
                self.stats.binds += 1;
                Ok(())
            }
            Err(e) => {
                error!("Failed to bind camera: {}", e);
                self.state = ScreenState::Unbound;
                self.notifier.show(Notice::short("Camera unavailable"));
                Err(e)
            }
        }
    }

    fn bind_use_cases(&self) -> Result<UseCaseBinding> {
        let size = self.surface.measured_size();
        let aspect_ratio =
            AspectRatio::from_size(size).ok_or(CameraError::UnmeasuredSurface {
                width: size.width,
                height: size.height,
            })?;

        let preview = PreviewConfig {
            target_aspect_ratio: aspect_ratio,
            target_resolution: size,
        };

        let rotation_code = self.surface.display_rotation();
        let target_rotation = SurfaceRotation::from_code(rotation_code).unwrap_or_else(|| {
            warn!(
                "Unrecognized display rotation {}, capturing unrotated",
                rotation_code
            );
            SurfaceRotation::Rotation0
        });

        let capture = ImageCaptureConfig {
            capture_mode: self.config.camera.capture_mode,
            target_rotation,
            lens_facing: self.config.camera.lens_facing,
            flash_mode: self.flash_mode,
        };

        let (outputs_tx, mut outputs_rx) = mpsc::unbounded_channel();
        let binding = UseCaseBinding::acquire(
            Arc::clone(&self.camera),
            self.lifecycle.observe(),
            preview,
            capture,
            outputs_tx,
        )?;

        let events = self.events_tx.clone();
        tokio::spawn(async move {
            while let Some(output) = outputs_rx.recv().await {
                if events.send(ScreenEvent::PreviewUpdated(output)).is_err() {
                    break;
                }
            }
            trace!("Preview output forwarder stopped");
        });

        Ok(binding)
    }

    /// Reattach the surface to the new output and reapply the rotation
    pub fn on_preview_updated(&mut self, output: PreviewOutput) {
        if self.binding.is_none() {
            debug!("Dropping preview output {} with no binding", output.texture_id);
            return;
        }

        self.surface.reattach();
        self.surface.attach_output(&output);
        self.update_transform();
    }

    /// Apply the rotation transform for the surface's current display rotation
    pub fn update_transform(&mut self) -> bool {
        let rotation_code = self.surface.display_rotation();
        self.apply_rotation(rotation_code)
    }

    pub fn on_rotation_changed(&mut self, rotation_code: i32) -> bool {
        self.apply_rotation(rotation_code)
    }

    fn apply_rotation(&self, rotation_code: i32) -> bool {
        match preview_transform(rotation_code, self.surface.measured_size()) {
            Some(transform) => {
                trace!("Preview rotated {} degrees", transform.degrees());
                self.surface.set_transform(transform);
                true
            }
            None => {
                debug!("Ignoring unrecognized display rotation {}", rotation_code);
                false
            }
        }
    }
}
