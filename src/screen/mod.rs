mod actions;
mod binding;
mod coordinator;
mod runtime;
mod startup;
mod types;

#[cfg(test)]
mod tests;

pub use coordinator::{CaptureCoordinator, CaptureCoordinatorBuilder};
pub use types::{ExitReason, ScreenState, ScreenStats};
