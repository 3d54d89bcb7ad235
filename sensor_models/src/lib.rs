//! `sensor_models` — Camera intrinsics and structured point-cloud buffers.

pub mod camera;
pub mod point_cloud;

pub use camera::CameraInfo;
pub use point_cloud::{CloudPoint, PointCloud2, PointField};
