use tokio::sync::watch;
use tracing::debug;

/// Visible state of the screen that owns camera resources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Visible,
    Hidden,
    Destroyed,
}

impl LifecycleState {
    /// Whether use cases bound to this lifecycle should be running
    pub fn is_active(&self) -> bool {
        matches!(self, LifecycleState::Visible)
    }
}

/// Owner side of a screen lifecycle
pub struct Lifecycle {
    sender: watch::Sender<LifecycleState>,
}

/// Read side handed to the camera platform when binding use cases
pub type LifecycleObserver = watch::Receiver<LifecycleState>;

impl Lifecycle {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(LifecycleState::Created);
        Self { sender }
    }

    pub fn observe(&self) -> LifecycleObserver {
        self.sender.subscribe()
    }

    pub fn current(&self) -> LifecycleState {
        *self.sender.borrow()
    }

    /// Move to `state`. Leaving `Destroyed` is not allowed.
    pub fn set(&self, state: LifecycleState) {
        self.sender.send_if_modified(|current| {
            if *current == state || *current == LifecycleState::Destroyed {
                return false;
            }
            debug!("Lifecycle {:?} -> {:?}", current, state);
            *current = state;
            true
        });
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
