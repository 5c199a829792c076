use super::{CaptureCoordinator, ExitReason, ScreenState};
use crate::error::{DemocamError, Result};
use crate::events::ScreenEvent;
use tokio::signal;
use tracing::{error, info, warn};

enum Next {
    Event(ScreenEvent),
    Interrupted,
}

impl CaptureCoordinator {
    /// Run the screen until it finishes, with signal handling
    pub async fn run(&mut self) -> Result<ExitReason> {
        info!("Capture screen is running");

        if let Err(e) = self.on_create() {
            error!("Capture screen started without a camera: {}", e);
        }

        while self.state != ScreenState::Finished {
            // The coordinator holds its own sender, so recv() never yields None
            let next = tokio::select! {
                Some(event) = self.events_rx.recv() => Next::Event(event),
                _ = signal::ctrl_c() => Next::Interrupted,
            };

            match next {
                Next::Event(event) => {
                    let event_type = event.event_type();
                    if let Err(e) = self.handle_event(event) {
                        warn!("{} not handled: {}", event_type, e);
                    }
                }
                Next::Interrupted => {
                    info!("Received SIGINT signal (Ctrl+C)");
                    self.finish(ExitReason::Signal("SIGINT".to_string()));
                }
            }
        }

        let reason = self
            .exit_reason
            .clone()
            .unwrap_or(ExitReason::UserRequest);
        info!("Capture screen closed: {:?}", reason);
        Ok(reason)
    }

    /// Wait for the next screen event and handle it
    pub async fn pump(&mut self) -> Result<()> {
        let event = self
            .events_rx
            .recv()
            .await
            .ok_or_else(|| DemocamError::system("Screen event channel closed"))?;
        self.handle_event(event)
    }
}
