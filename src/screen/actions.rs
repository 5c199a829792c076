use super::{CaptureCoordinator, ExitReason, ScreenState};
use crate::camera::{CaptureFailure, CaptureFailureKind, CaptureRequest, CaptureResult};
use crate::error::{CameraError, Result};
use crate::events::{Control, ScreenEvent};
use crate::notice::Notice;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

impl CaptureCoordinator {
    /// Dispatch one screen event
    pub fn handle_event(&mut self, event: ScreenEvent) -> Result<()> {
        trace!("Handling {}", event.event_type());

        if self.state == ScreenState::Finished
            && !matches!(event, ScreenEvent::CaptureFinished { .. })
        {
            debug!("Screen finished, ignoring {}", event.event_type());
            return Ok(());
        }

        match event {
            ScreenEvent::Tap(Control::CaptureButton) => self.take_photo(),
            ScreenEvent::Tap(Control::FlashToggle) => self.toggle_flash(),
            ScreenEvent::PermissionsResult(results) => self.on_permissions_result(results),
            ScreenEvent::PreviewUpdated(output) => {
                self.on_preview_updated(output);
                Ok(())
            }
            ScreenEvent::RotationChanged(rotation_code) => {
                self.on_rotation_changed(rotation_code);
                Ok(())
            }
            ScreenEvent::VisibilityChanged(visible) => {
                self.set_visible(visible);
                Ok(())
            }
            ScreenEvent::CaptureFinished { request, result } => {
                self.on_capture_finished(request, result);
                Ok(())
            }
            ScreenEvent::Close => {
                self.finish(ExitReason::UserRequest);
                Ok(())
            }
        }
    }

    /// Start one still capture into a fresh file under the capture folder.
    ///
    /// Rejected while another capture is in flight. The result arrives later
    /// as [`ScreenEvent::CaptureFinished`].
    pub fn take_photo(&mut self) -> Result<()> {
        let Some(binding) = self.binding.as_ref() else {
            warn!("Capture requested with no camera bound");
            self.notifier.show(Notice::short("Camera not ready"));
            return Err(CameraError::NotBound.into());
        };
        let image_capture = binding.image_capture();

        if let Some(in_flight) = &self.in_flight {
            debug!(
                "Rejecting capture, {} still in flight",
                in_flight.destination.display()
            );
            let path = in_flight.destination.clone();
            self.stats.taps_rejected += 1;
            self.notifier
                .show(Notice::short("Capture already in progress"));
            return Err(CameraError::CaptureInFlight { path }.into());
        }

        let destination = match self.storage.prepare_destination() {
            Ok(destination) => destination,
            Err(e) => {
                error!("Failed to prepare capture destination: {}", e);
                self.notifier.show(Notice::short("Image Not saved"));
                return Err(e);
            }
        };

        let request = CaptureRequest {
            destination,
            flash_mode: self.flash_mode,
        };
        info!(
            "Capturing photo into {} (flash {:?})",
            request.destination.display(),
            request.flash_mode
        );

        self.in_flight = Some(request.clone());
        self.stats.captures_started += 1;

        let camera = Arc::clone(&self.camera);
        let events = self.events_tx.clone();
        let cancellation_token = self.cancellation_token.child_token();
        let timeout = Duration::from_secs(self.config.camera.capture_timeout_seconds);

        tokio::spawn(async move {
            let capture = tokio::time::timeout(
                timeout,
                camera.take_picture(image_capture, request.clone()),
            );

            let result: CaptureResult = tokio::select! {
                biased;
                _ = cancellation_token.cancelled() => Err(CaptureFailure::new(
                    CaptureFailureKind::Cancelled,
                    "screen closed before the capture completed",
                )),
                outcome = capture => match outcome {
                    Ok(result) => result,
                    Err(_) => Err(CaptureFailure::new(
                        CaptureFailureKind::Timeout,
                        format!("no result after {:?}", timeout),
                    )),
                },
            };

            if events
                .send(ScreenEvent::CaptureFinished { request, result })
                .is_err()
            {
                debug!("Screen dropped before the capture result arrived");
            }
        });

        Ok(())
    }

    /// Report a finished capture to the user
    pub fn on_capture_finished(&mut self, request: CaptureRequest, result: CaptureResult) {
        if self.in_flight.as_ref() != Some(&request) {
            // Settled already, by finish()
            debug!(
                "Ignoring completion for {}, capture no longer in flight",
                request.destination.display()
            );
            return;
        }
        self.in_flight = None;

        match result {
            Ok(saved) => {
                self.stats.captures_succeeded += 1;
                info!("Photo saved to {}", saved.display());
                self.notifier
                    .show(Notice::long(format!("Pic captured at {}", saved.display())));
            }
            Err(failure) => {
                if failure.kind == CaptureFailureKind::Cancelled {
                    self.settle_cancelled(&request);
                    return;
                }

                remove_empty_placeholder(&request);

                self.stats.captures_failed += 1;
                match &failure.cause {
                    Some(cause) => error!(
                        "Capture into {} failed: {} (cause: {})",
                        request.destination.display(),
                        failure.message,
                        cause
                    ),
                    None => warn!(
                        "Capture into {} failed: {}",
                        request.destination.display(),
                        failure
                    ),
                }
                self.notifier.show(Notice::long(format!(
                    "Pic captured Failed at {}",
                    request.destination.display()
                )));
            }
        }
    }

    /// Flip the flash mode and push it to the bound capture use case
    pub fn toggle_flash(&mut self) -> Result<()> {
        let mode = self.flash_mode.toggled();

        if let Some(binding) = &self.binding {
            if let Err(e) = self.camera.set_flash_mode(binding.image_capture(), mode) {
                error!("Failed to set flash mode {:?}: {}", mode, e);
                self.notifier.show(Notice::short("Flash unavailable"));
                return Err(CameraError::Flash {
                    details: e.to_string(),
                }
                .into());
            }
        }

        self.flash_mode = mode;
        info!("Flash mode now {:?}", mode);
        self.notifier.show(Notice::short(if mode.is_on() {
            "Flash Enable"
        } else {
            "Flash Disable"
        }));

        Ok(())
    }

    /// Account for a cancelled capture and drop its empty placeholder
    pub(super) fn settle_cancelled(&mut self, request: &CaptureRequest) {
        remove_empty_placeholder(request);
        self.stats.captures_cancelled += 1;
        info!("Capture into {} cancelled", request.destination.display());
    }
}

/// Remove the empty destination file left behind by a failed capture
fn remove_empty_placeholder(request: &CaptureRequest) {
    let is_empty = std::fs::metadata(&request.destination)
        .map(|metadata| metadata.len() == 0)
        .unwrap_or(false);

    if is_empty {
        if let Err(e) = std::fs::remove_file(&request.destination) {
            debug!(
                "Could not remove placeholder {}: {}",
                request.destination.display(),
                e
            );
        }
    }
}
