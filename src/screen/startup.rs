use super::{CaptureCoordinator, ExitReason, ScreenState};
use crate::error::{PermissionError, Result};
use crate::events::ScreenEvent;
use crate::lifecycle::LifecycleState;
use crate::notice::Notice;
use crate::permissions::{
    all_granted, missing_permissions, PermissionResults, PermissionStatus, REQUIRED_PERMISSIONS,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

impl CaptureCoordinator {
    /// Show the screen and either bind the camera or ask for permissions
    pub fn on_create(&mut self) -> Result<()> {
        info!("Capture screen created");
        self.lifecycle.set(LifecycleState::Visible);

        if all_granted(self.permissions.as_ref(), &REQUIRED_PERMISSIONS) {
            return self.bind_camera();
        }

        info!(
            "Requesting permissions: {:?}",
            missing_permissions(self.permissions.as_ref(), &REQUIRED_PERMISSIONS)
        );
        self.state = ScreenState::AwaitingPermissions;

        let permissions = Arc::clone(&self.permissions);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let results = match permissions.request(&REQUIRED_PERMISSIONS).await {
                Ok(results) => results,
                Err(e) => {
                    error!("Permission request failed: {}", e);
                    REQUIRED_PERMISSIONS
                        .iter()
                        .map(|permission| (*permission, PermissionStatus::Denied))
                        .collect()
                }
            };
            if events.send(ScreenEvent::PermissionsResult(results)).is_err() {
                debug!("Screen closed before the permission result arrived");
            }
        });

        Ok(())
    }

    /// Bind the camera if everything is granted now, otherwise close the screen.
    ///
    /// A denial finishes the screen and reports the missing permissions.
    pub fn on_permissions_result(&mut self, results: PermissionResults) -> Result<()> {
        debug!("Permission results: {:?}", results);

        if self.state != ScreenState::AwaitingPermissions {
            warn!(
                "Ignoring permission result in state {:?}",
                self.state
            );
            return Ok(());
        }

        if all_granted(self.permissions.as_ref(), &REQUIRED_PERMISSIONS) {
            info!("All permissions granted");
            return self.bind_camera();
        }

        let missing = missing_permissions(self.permissions.as_ref(), &REQUIRED_PERMISSIONS);
        warn!("Permissions not granted: {:?}", missing);
        self.notifier
            .show(Notice::short("Permissions not granted by the user."));
        self.finish(ExitReason::PermissionsDenied);

        Err(PermissionError::Denied {
            missing: missing.iter().map(|p| p.name().to_string()).collect(),
        }
        .into())
    }

    /// Show or hide the screen; bound use cases follow
    pub fn set_visible(&mut self, visible: bool) {
        if self.state == ScreenState::Finished {
            return;
        }

        let state = if visible {
            LifecycleState::Visible
        } else {
            LifecycleState::Hidden
        };
        info!("Capture screen {}", if visible { "shown" } else { "hidden" });
        self.lifecycle.set(state);
    }

    /// Close the screen: cancel the capture in flight and release the camera
    pub fn finish(&mut self, reason: ExitReason) {
        if self.state == ScreenState::Finished {
            return;
        }

        info!("Capture screen finishing: {:?}", reason);
        self.cancellation_token.cancel();

        // The loop stops here, so the cancelled completion is never handled
        if let Some(request) = self.in_flight.take() {
            self.settle_cancelled(&request);
        }

        if let Some(binding) = self.binding.take() {
            drop(binding);
        }

        self.lifecycle.set(LifecycleState::Destroyed);
        self.state = ScreenState::Finished;
        self.exit_reason = Some(reason);
    }
}
