//! Preview rotation transform.
//!
//! Display rotations arrive as surface rotation codes (0, 1, 2, 3). Each
//! cardinal code maps to a rotation about the centre of the measured
//! preview surface; unknown codes leave the current transform untouched.

use crate::camera::Size;
use cgmath::{Deg, Matrix3, SquareMatrix, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Cardinal display rotations, indexed by surface rotation code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SurfaceRotation {
    #[default]
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
}

impl SurfaceRotation {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(SurfaceRotation::Rotation0),
            1 => Some(SurfaceRotation::Rotation90),
            2 => Some(SurfaceRotation::Rotation180),
            3 => Some(SurfaceRotation::Rotation270),
            _ => None,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            SurfaceRotation::Rotation0 => 0,
            SurfaceRotation::Rotation90 => 1,
            SurfaceRotation::Rotation180 => 2,
            SurfaceRotation::Rotation270 => 3,
        }
    }

    /// Get rotation angle in degrees
    pub fn degrees(&self) -> u16 {
        match self {
            SurfaceRotation::Rotation0 => 0,
            SurfaceRotation::Rotation90 => 90,
            SurfaceRotation::Rotation180 => 180,
            SurfaceRotation::Rotation270 => 270,
        }
    }

    /// Next rotation clockwise
    pub fn next(self) -> Self {
        match self {
            SurfaceRotation::Rotation0 => SurfaceRotation::Rotation90,
            SurfaceRotation::Rotation90 => SurfaceRotation::Rotation180,
            SurfaceRotation::Rotation180 => SurfaceRotation::Rotation270,
            SurfaceRotation::Rotation270 => SurfaceRotation::Rotation0,
        }
    }
}

/// 2D affine transform in homogeneous coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewTransform {
    matrix: Matrix3<f32>,
    degrees: f32,
}

impl PreviewTransform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
            degrees: 0.0,
        }
    }

    /// Rotation by `degrees` about the pivot `(cx, cy)`
    pub fn rotation_about(degrees: f32, cx: f32, cy: f32) -> Self {
        let to_origin = Matrix3::from_translation(Vector2::new(-cx, -cy));
        let rotate = Matrix3::from_angle_z(Deg(degrees));
        let back = Matrix3::from_translation(Vector2::new(cx, cy));

        Self {
            matrix: back * rotate * to_origin,
            degrees,
        }
    }

    pub fn degrees(&self) -> f32 {
        self.degrees
    }

    pub fn matrix(&self) -> &Matrix3<f32> {
        &self.matrix
    }

    pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        let mapped = self.matrix * Vector3::new(x, y, 1.0);
        (mapped.x, mapped.y)
    }
}

impl Default for PreviewTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Transform for a display rotation code applied to a surface of `size`.
///
/// Returns `None` when the code is not one of the four cardinal rotations,
/// in which case the caller keeps its current transform.
pub fn preview_transform(rotation_code: i32, size: Size) -> Option<PreviewTransform> {
    let rotation = SurfaceRotation::from_code(rotation_code)?;
    let (cx, cy) = size.center();
    Some(PreviewTransform::rotation_about(
        rotation.degrees() as f32,
        cx,
        cy,
    ))
}
