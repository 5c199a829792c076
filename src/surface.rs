use crate::camera::{PreviewOutput, Size};
use crate::transform::PreviewTransform;
use parking_lot::Mutex;
use tracing::trace;

/// On-screen surface the preview stream renders into
pub trait PreviewSurface: Send + Sync {
    /// Size the surface was laid out at
    fn measured_size(&self) -> Size;

    /// Current display rotation code (0, 1, 2, 3 for the cardinal rotations)
    fn display_rotation(&self) -> i32;

    /// Detach the surface from its parent and re-add it as the first child
    fn reattach(&self);

    fn attach_output(&self, output: &PreviewOutput);

    fn set_transform(&self, transform: PreviewTransform);
}

/// Snapshot of a headless surface
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSnapshot {
    pub size: Size,
    pub rotation: i32,
    pub transform: PreviewTransform,
    pub output: Option<PreviewOutput>,
    pub reattach_count: u64,
    pub transform_updates: u64,
}

/// Preview surface with no window behind it, for terminals and tests
pub struct HeadlessSurface {
    state: Mutex<SurfaceSnapshot>,
}

impl HeadlessSurface {
    pub fn new(size: Size, rotation: i32) -> Self {
        Self {
            state: Mutex::new(SurfaceSnapshot {
                size,
                rotation,
                transform: PreviewTransform::identity(),
                output: None,
                reattach_count: 0,
                transform_updates: 0,
            }),
        }
    }

    pub fn set_rotation(&self, rotation: i32) {
        self.state.lock().rotation = rotation;
    }

    pub fn set_size(&self, size: Size) {
        self.state.lock().size = size;
    }

    pub fn snapshot(&self) -> SurfaceSnapshot {
        self.state.lock().clone()
    }
}

impl PreviewSurface for HeadlessSurface {
    fn measured_size(&self) -> Size {
        self.state.lock().size
    }

    fn display_rotation(&self) -> i32 {
        self.state.lock().rotation
    }

    fn reattach(&self) {
        self.state.lock().reattach_count += 1;
    }

    fn attach_output(&self, output: &PreviewOutput) {
        trace!("Attaching preview texture {}", output.texture_id);
        self.state.lock().output = Some(*output);
    }

    fn set_transform(&self, transform: PreviewTransform) {
        let mut state = self.state.lock();
        state.transform = transform;
        state.transform_updates += 1;
    }
}
