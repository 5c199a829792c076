/// Where the capture screen is in its flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    Created,
    AwaitingPermissions,
    Bound,
    /// Binding failed; the screen stays up without a camera
    Unbound,
    Finished,
}

/// Why the capture screen closed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    PermissionsDenied,
    UserRequest,
    Signal(String),
}

impl ExitReason {
    /// Process exit code for the binary
    pub fn exit_code(&self) -> i32 {
        match self {
            ExitReason::PermissionsDenied => 1,
            ExitReason::UserRequest | ExitReason::Signal(_) => 0,
        }
    }
}

/// Counters kept by the coordinator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenStats {
    pub binds: u64,
    pub captures_started: u64,
    pub captures_succeeded: u64,
    pub captures_failed: u64,
    pub captures_cancelled: u64,
    pub taps_rejected: u64,
}
