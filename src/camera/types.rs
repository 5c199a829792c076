use crate::transform::SurfaceRotation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Centre point in surface coordinates
    pub fn center(&self) -> (f32, f32) {
        (self.width as f32 / 2.0, self.height as f32 / 2.0)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Aspect ratio kept as a reduced fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectRatio {
    pub numerator: u32,
    pub denominator: u32,
}

impl AspectRatio {
    /// Build a ratio from a measured size. Returns `None` for empty sizes.
    pub fn from_size(size: Size) -> Option<Self> {
        if size.is_empty() {
            return None;
        }
        let divisor = gcd(size.width, size.height);
        Some(Self {
            numerator: size.width / divisor,
            denominator: size.height / divisor,
        })
    }

    pub fn as_f32(&self) -> f32 {
        self.numerator as f32 / self.denominator as f32
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.numerator, self.denominator)
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LensFacing {
    Back,
    Front,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    /// Favour shutter latency over image quality
    MinLatency,
    MaxQuality,
}

/// Flash setting for still capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashMode {
    #[default]
    Off,
    On,
}

impl FlashMode {
    pub fn toggled(self) -> Self {
        match self {
            FlashMode::Off => FlashMode::On,
            FlashMode::On => FlashMode::Off,
        }
    }

    pub fn is_on(self) -> bool {
        matches!(self, FlashMode::On)
    }
}

/// Preview use case settings derived from the preview surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewConfig {
    pub target_aspect_ratio: AspectRatio,
    pub target_resolution: Size,
}

/// Image capture use case settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageCaptureConfig {
    pub capture_mode: CaptureMode,
    pub target_rotation: SurfaceRotation,
    pub lens_facing: LensFacing,
    pub flash_mode: FlashMode,
}

/// A new output stream produced by the preview use case
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewOutput {
    /// Identifier of the texture the platform renders into
    pub texture_id: u64,
    pub size: Size,
    /// Sensor orientation relative to the display, in degrees
    pub rotation_degrees: u16,
}

/// Identifier of a use case bound by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UseCaseId(Uuid);

impl UseCaseId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UseCaseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UseCaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifiers of the preview and capture use cases bound together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundUseCases {
    pub preview: UseCaseId,
    pub image_capture: UseCaseId,
}

/// One still capture, created per tap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub destination: PathBuf,
    pub flash_mode: FlashMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFailureKind {
    /// Writing the image to the destination failed
    FileIo,
    /// The capture did not complete within the configured timeout
    Timeout,
    /// The screen finished while the capture was in flight
    Cancelled,
    Unknown,
}

/// Failure reported for a capture request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureFailure {
    pub kind: CaptureFailureKind,
    pub message: String,
    /// Underlying cause, when the platform provides one
    pub cause: Option<String>,
}

impl CaptureFailure {
    pub fn new<S: Into<String>>(kind: CaptureFailureKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause<S: Into<String>>(mut self, cause: S) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

impl fmt::Display for CaptureFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{:?}: {} ({})", self.kind, self.message, cause),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

pub type CaptureResult = std::result::Result<PathBuf, CaptureFailure>;
