use crate::error::Result;
use crate::events::{Control, ScreenEvent, ScreenEventSender};
use crate::surface::{HeadlessSurface, PreviewSurface};
use crate::transform::SurfaceRotation;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What a key press asks the capture screen to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Capture,
    ToggleFlash,
    Rotate,
    ToggleVisibility,
    Quit,
}

impl KeyAction {
    /// Raw mode delivers Ctrl+C as a key press, so it maps to `Quit` here
    pub fn from_key(key: &KeyEvent) -> Option<Self> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') | KeyCode::Char('d') => Some(Self::Quit),
                _ => None,
            };
        }

        match key.code {
            KeyCode::Char(' ') | KeyCode::Char('c') | KeyCode::Enter => Some(Self::Capture),
            KeyCode::Char('f') => Some(Self::ToggleFlash),
            KeyCode::Char('r') => Some(Self::Rotate),
            KeyCode::Char('v') => Some(Self::ToggleVisibility),
            KeyCode::Char('q') | KeyCode::Esc => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Terminal keyboard driving the capture screen's controls
pub struct KeyboardInputHandler {
    events: ScreenEventSender,
    surface: Arc<HeadlessSurface>,
    cancellation_token: CancellationToken,
}

impl KeyboardInputHandler {
    pub fn new(events: ScreenEventSender, surface: Arc<HeadlessSurface>) -> Self {
        Self {
            events,
            surface,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start listening for keyboard input
    pub async fn start(&self) -> Result<()> {
        info!("Keyboard controls: SPACE capture, f flash, r rotate, v show/hide, q quit");

        let events = self.events.clone();
        let surface = Arc::clone(&self.surface);
        let cancellation_token = self.cancellation_token.clone();

        task::spawn_blocking(move || {
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                return;
            }

            let mut visible = true;

            loop {
                if cancellation_token.is_cancelled() {
                    debug!("Keyboard input handler stopping");
                    break;
                }

                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        let Ok(Event::Key(key_event)) = event::read() else {
                            continue;
                        };
                        if key_event.kind != KeyEventKind::Press {
                            continue;
                        }

                        let Some(action) = KeyAction::from_key(&key_event) else {
                            debug!("Key pressed: {:?}", key_event.code);
                            continue;
                        };

                        if action == KeyAction::ToggleVisibility {
                            visible = !visible;
                        }
                        let event = screen_event_for(action, &surface, visible);

                        if events.send(event).is_err() {
                            warn!("Capture screen closed, keyboard input no longer delivered");
                            break;
                        }
                        if action == KeyAction::Quit {
                            info!("Quit key pressed");
                            break;
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            }

            debug!("Keyboard input handler task exited");
        });

        Ok(())
    }

    /// Stop the keyboard input handler
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping keyboard input handler");
        self.cancellation_token.cancel();

        // Let the blocking task observe the cancellation and leave raw mode
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = disable_raw_mode();

        Ok(())
    }
}

/// Translate a key action into a screen event.
///
/// Rotating turns the headless display a quarter turn before reporting the
/// new rotation code.
fn screen_event_for(action: KeyAction, surface: &HeadlessSurface, visible: bool) -> ScreenEvent {
    match action {
        KeyAction::Capture => ScreenEvent::Tap(Control::CaptureButton),
        KeyAction::ToggleFlash => ScreenEvent::Tap(Control::FlashToggle),
        KeyAction::Rotate => {
            let current =
                SurfaceRotation::from_code(surface.display_rotation()).unwrap_or_default();
            let next = current.next();
            surface.set_rotation(next.code());
            info!("Display rotated to {} degrees", next.degrees());
            ScreenEvent::RotationChanged(next.code())
        }
        KeyAction::ToggleVisibility => ScreenEvent::VisibilityChanged(visible),
        KeyAction::Quit => ScreenEvent::Close,
    }
}
