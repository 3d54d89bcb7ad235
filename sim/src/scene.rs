//! Overhead scene renderer: a camera hanging above flat ground with boxes
//! standing on it.
//!
//! Every pixel ray is intersected with the box tops and the ground plane.
//! Box sides are not modelled; from straight above they cover few pixels.
//! A fraction of pixels is invalid (NaN), like stereo holes.

use nalgebra::Vector3;
use perception_core::ground_plane::{BoundingBoxResult, GroundPlaneConfig};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use sensor_models::camera::CameraInfo;
use sensor_models::point_cloud::{camera_to_ros, pack_rgb, CloudPoint, PointCloud2};
use serde::{Deserialize, Serialize};

const GROUND_RGB: [u8; 3] = [90, 140, 70];
const BOX_RGB: [u8; 3] = [200, 120, 40];

/// A box resting on the ground, camera frame (meters).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneBox {
    /// Footprint centre (X, Y)
    pub center: [f32; 2],
    /// Extent along X, Y and height above ground
    pub size: [f32; 3],
}

impl SceneBox {
    fn top(&self, ground: f32) -> f32 {
        ground - self.size[2]
    }

    fn covers(&self, p: &Vector3<f32>) -> bool {
        (p.x - self.center[0]).abs() <= self.size[0] / 2.0
            && (p.y - self.center[1]).abs() <= self.size[1] / 2.0
    }
}

/// Camera, ground and objects of one overhead scene.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroundScene {
    pub camera: CameraInfo,
    /// Camera to ground distance (meters)
    pub ground: f32,
    /// Max depth noise on the ground (meters)
    pub ground_noise: f32,
    /// Fraction of pixels without a valid return
    pub invalid_ratio: f64,
    pub boxes: Vec<SceneBox>,
}

impl Default for GroundScene {
    fn default() -> Self {
        Self {
            camera: CameraInfo::default(),
            ground: 1.9,
            ground_noise: 0.01,
            invalid_ratio: 0.02,
            boxes: vec![SceneBox {
                center: [0.1, -0.05],
                size: [0.4, 0.3, 0.5],
            }],
        }
    }
}

impl GroundScene {
    /// Scene with `n` random boxes inside the default ground region.
    pub fn random(n: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let boxes = (0..n)
            .map(|_| SceneBox {
                center: [rng.gen_range(-0.5..0.5), rng.gen_range(-0.25..0.25)],
                size: [
                    rng.gen_range(0.1..0.4),
                    rng.gen_range(0.1..0.3),
                    rng.gen_range(0.1..0.8),
                ],
            })
            .collect();
        Self {
            boxes,
            ..Default::default()
        }
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.camera.width as usize, self.camera.height as usize)
    }

    /// Camera-frame points, row-major. Rows are rendered in parallel, each
    /// with its own seeded generator.
    pub fn render_points(&self, seed: u64) -> Vec<CloudPoint> {
        let (cols, rows) = self.dims();
        let mut points = vec![CloudPoint::default(); cols * rows];
        points
            .par_chunks_mut(cols)
            .enumerate()
            .for_each(|(row, out)| {
                let row_seed = seed.wrapping_mul(1_000_003).wrapping_add(row as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(row_seed);
                for (col, point) in out.iter_mut().enumerate() {
                    *point = self.shade(col, row, &mut rng);
                }
            });
        points
    }

    fn shade(&self, col: usize, row: usize, rng: &mut ChaCha8Rng) -> CloudPoint {
        if rng.gen::<f64>() < self.invalid_ratio {
            return CloudPoint {
                position: [f32::NAN; 3],
                rgb: [0, 0, 0],
            };
        }
        let ray = self.camera.pixel_ray(col as f32 + 0.5, row as f32 + 0.5);

        let hit = self
            .boxes
            .iter()
            .map(|b| (b, ray * b.top(self.ground)))
            .filter(|(b, p)| b.covers(p))
            .min_by(|a, b| a.1.z.total_cmp(&b.1.z));
        if let Some((_, p)) = hit {
            return CloudPoint {
                position: [p.x, p.y, p.z],
                rgb: BOX_RGB,
            };
        }

        let z = self.ground + rng.gen_range(-self.ground_noise..=self.ground_noise);
        let p = ray * z;
        CloudPoint {
            position: [p.x, p.y, p.z],
            rgb: GROUND_RGB,
        }
    }

    /// Dense 4-channel RGBD buffer `[packed rgb, X, Y, Z]`.
    pub fn render(&self, seed: u64) -> Vec<f32> {
        let points = self.render_points(seed);
        let mut buf = Vec::with_capacity(points.len() * 4);
        for p in &points {
            buf.push(pack_rgb(p.rgb));
            buf.extend_from_slice(&p.position);
        }
        buf
    }

    /// The same scene as a ROS-frame point cloud.
    pub fn to_cloud(&self, seed: u64) -> anyhow::Result<PointCloud2> {
        let points: Vec<CloudPoint> = self
            .render_points(seed)
            .into_iter()
            .map(|p| CloudPoint {
                position: camera_to_ros(p.position),
                rgb: p.rgb,
            })
            .collect();
        PointCloud2::from_points(self.camera.width, self.camera.height, &points)
    }

    /// Analytic box around every object top, clipped to the region.
    pub fn expected_bounds(&self, config: &GroundPlaneConfig) -> BoundingBoxResult {
        let (hw, hd) = (config.width / 2.0, config.depth / 2.0);
        self.boxes
            .iter()
            .fold(config.initial_bounds(), |mut acc, b| {
                acc.min_x = acc.min_x.min((b.center[0] - b.size[0] / 2.0).max(-hw));
                acc.max_x = acc.max_x.max((b.center[0] + b.size[0] / 2.0).min(hw));
                acc.min_y = acc.min_y.min((b.center[1] - b.size[1] / 2.0).max(-hd));
                acc.max_y = acc.max_y.max((b.center[1] + b.size[1] / 2.0).min(hd));
                acc.min_z = acc.min_z.min(b.top(self.ground));
                acc
            })
    }
}
