//! Pinhole camera intrinsics of the stereo head.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Intrinsics as reported by the device info message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraInfo {
    /// Image width (pixels)
    pub width: u32,
    /// Image height (pixels)
    pub height: u32,
    /// Focal length (pixels)
    pub focal: f32,
    /// Principal point (cx, cy) in pixels
    pub principal_point: [f32; 2],
    /// Stereo baseline (meters)
    pub baseline: f32,
}

impl Default for CameraInfo {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            focal: 320.0, // ≈ 90° horizontal FoV
            principal_point: [320.0, 180.0],
            baseline: 0.12,
        }
    }
}

impl CameraInfo {
    /// Horizontal field of view in degrees.
    pub fn fov_h(&self) -> f32 {
        (2.0 * (self.width as f32 / (2.0 * self.focal)).atan()).to_degrees()
    }

    /// Vertical field of view in degrees.
    pub fn fov_v(&self) -> f32 {
        (2.0 * (self.height as f32 / (2.0 * self.focal)).atan()).to_degrees()
    }

    /// Ray through pixel centre `(u, v)` scaled to unit Z.
    pub fn pixel_ray(&self, u: f32, v: f32) -> Vector3<f32> {
        let [cx, cy] = self.principal_point;
        Vector3::new((u - cx) / self.focal, (v - cy) / self.focal, 1.0)
    }

    /// Depth (meters) of a stereo disparity in pixels; `None` for non-positive disparity.
    pub fn depth_from_disparity(&self, disparity: f32) -> Option<f32> {
        (disparity > 0.0).then(|| self.baseline * self.focal / disparity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn principal_ray_points_forward() {
        let cam = CameraInfo::default();
        let r = cam.pixel_ray(320.0, 180.0);
        assert_abs_diff_eq!(r.x, 0.0);
        assert_abs_diff_eq!(r.y, 0.0);
        assert_abs_diff_eq!(r.z, 1.0);
    }

    #[test]
    fn fov_matches_focal_length() {
        let cam = CameraInfo::default();
        assert_abs_diff_eq!(cam.fov_h(), 90.0, epsilon = 1e-3);
        assert!(cam.fov_v() < cam.fov_h());
    }

    #[test]
    fn disparity_to_depth() {
        let cam = CameraInfo::default();
        assert_abs_diff_eq!(cam.depth_from_disparity(19.2).unwrap(), 2.0, epsilon = 1e-5);
        assert!(cam.depth_from_disparity(0.0).is_none());
    }
}
