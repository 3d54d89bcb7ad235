//! Structured point buffer in the ROS `sensor_msgs/PointCloud2` layout:
//! decoding, frame conversion, dense RGBD conversion and text export.
//!
//! # Coordinate frames
//! - **ROS**: x forward (depth), y left, z up.
//! - **Camera**: X = ROS y, Y = ROS z, Z = ROS x, so Z is the distance from
//!   the camera, as consumed by the ground-plane extractor.
//!
//! A point whose ROS x is NaN or negative carries no valid return and is
//! reported as all zeros.

use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// `PointField` datatype code for 32-bit floats.
pub const FLOAT32: u8 = 7;

/// Byte offset of the colour bytes when the cloud has no `rgb` field.
const DEFAULT_RGB_OFFSET: usize = 16;

/// Point stride used by [`PointCloud2::from_points`].
const DENSE_POINT_STEP: u32 = 32;

/// Describes one named channel inside a point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointField {
    pub name: String,
    pub offset: u32,
    pub datatype: u8,
    pub count: u32,
}

impl PointField {
    fn float32(name: &str, offset: u32) -> Self {
        Self {
            name: name.to_string(),
            offset,
            datatype: FLOAT32,
            count: 1,
        }
    }
}

/// A decoded point in the camera frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CloudPoint {
    pub position: [f32; 3],
    pub rgb: [u8; 3],
}

/// ROS frame → camera frame.
pub fn ros_to_camera([x, y, z]: [f32; 3]) -> [f32; 3] {
    [y, z, x]
}

/// Camera frame → ROS frame.
pub fn camera_to_ros([x, y, z]: [f32; 3]) -> [f32; 3] {
    [z, x, y]
}

/// Pack colour bytes into the float used by the RGBD layout.
pub fn pack_rgb([r, g, b]: [u8; 3]) -> f32 {
    f32::from_bits(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
}

/// Row-major structured point buffer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointCloud2 {
    /// Points per row
    pub width: u32,
    /// Number of rows
    pub height: u32,
    /// Bytes per point
    pub point_step: u32,
    /// Bytes per row (may include padding)
    pub row_step: u32,
    pub is_bigendian: bool,
    /// True when no point is invalid
    pub is_dense: bool,
    pub fields: Vec<PointField>,
    pub data: Vec<u8>,
}

impl PointCloud2 {
    pub fn field(&self, name: &str) -> Option<&PointField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check strides, buffer size and the presence of float x/y/z fields.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.row_step as u64 >= self.width as u64 * self.point_step as u64,
            "row_step {} shorter than {} points of {} bytes",
            self.row_step,
            self.width,
            self.point_step
        );
        ensure!(
            self.data.len() as u64 >= self.row_step as u64 * self.height as u64,
            "data holds {} bytes, expected {} rows of {}",
            self.data.len(),
            self.height,
            self.row_step
        );
        for name in ["x", "y", "z"] {
            let field = self
                .field(name)
                .with_context(|| format!("point cloud has no '{name}' field"))?;
            if field.datatype != FLOAT32 {
                bail!("field '{name}' has datatype {}, expected FLOAT32", field.datatype);
            }
            ensure!(
                field.offset as u64 + 4 <= self.point_step as u64,
                "field '{name}' at offset {} overflows point_step {}",
                field.offset,
                self.point_step
            );
        }
        if self.rgb_offset() as u64 + 3 > self.point_step as u64 {
            bail!("colour bytes overflow point_step {}", self.point_step);
        }
        Ok(())
    }

    fn rgb_offset(&self) -> usize {
        self.field("rgb")
            .or_else(|| self.field("rgba"))
            .map_or(DEFAULT_RGB_OFFSET, |f| f.offset as usize)
    }

    fn read_f32(&self, ix: usize) -> f32 {
        let bytes = [self.data[ix], self.data[ix + 1], self.data[ix + 2], self.data[ix + 3]];
        if self.is_bigendian {
            f32::from_be_bytes(bytes)
        } else {
            f32::from_le_bytes(bytes)
        }
    }

    /// Decode every point in row-major order, converted to the camera frame.
    pub fn points(&self) -> anyhow::Result<Vec<CloudPoint>> {
        self.validate()?;
        // Offsets exist after validation.
        let offset = |name: &str| self.field(name).map_or(0, |f| f.offset as usize);
        let (ox, oy, oz) = (offset("x"), offset("y"), offset("z"));
        let orgb = self.rgb_offset();

        let mut out = Vec::with_capacity(self.len());
        for row in 0..self.height as usize {
            for col in 0..self.width as usize {
                let ix = row * self.row_step as usize + col * self.point_step as usize;
                let ros = [
                    self.read_f32(ix + ox),
                    self.read_f32(ix + oy),
                    self.read_f32(ix + oz),
                ];
                if ros[0].is_nan() || ros[0] < 0.0 {
                    out.push(CloudPoint::default());
                    continue;
                }
                let c = ix + orgb;
                out.push(CloudPoint {
                    position: ros_to_camera(ros),
                    rgb: [self.data[c], self.data[c + 1], self.data[c + 2]],
                });
            }
        }
        Ok(out)
    }

    /// Dense 4-channel `[packed rgb, X, Y, Z]` buffer in the camera frame.
    pub fn to_rgbd(&self) -> anyhow::Result<Vec<f32>> {
        let points = self.points()?;
        let mut buf = Vec::with_capacity(points.len() * 4);
        for p in &points {
            buf.push(pack_rgb(p.rgb));
            buf.extend_from_slice(&p.position);
        }
        Ok(buf)
    }

    /// Write the text export: count, grid size, header, one line per point.
    pub fn write_export<W: Write>(&self, mut writer: W) -> anyhow::Result<()> {
        let points = self.points()?;
        writeln!(writer, "{}", self.len())?;
        writeln!(writer, "Grid size: {} x {}", self.width, self.height)?;
        writeln!(writer, "X; Y;  Z;  R;  G;  B;")?;
        for p in &points {
            let [x, y, z] = p.position;
            let [r, g, b] = p.rgb;
            writeln!(writer, "{x:.3}; {y:.3};  {z:.3};  {r};  {g};  {b};")?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Build a little-endian cloud from ROS-frame points (row-major, `width × height`).
    pub fn from_points(width: u32, height: u32, points: &[CloudPoint]) -> anyhow::Result<Self> {
        ensure!(
            points.len() == width as usize * height as usize,
            "{} points do not fill a {width}x{height} grid",
            points.len()
        );
        let step = DENSE_POINT_STEP as usize;
        let mut data = vec![0u8; points.len() * step];
        let mut is_dense = true;
        for (p, chunk) in points.iter().zip(data.chunks_exact_mut(step)) {
            for (i, v) in p.position.iter().enumerate() {
                chunk[i * 4..i * 4 + 4].copy_from_slice(&v.to_le_bytes());
            }
            chunk[DEFAULT_RGB_OFFSET..DEFAULT_RGB_OFFSET + 3].copy_from_slice(&p.rgb);
            is_dense &= p.position.iter().all(|v| v.is_finite());
        }
        Ok(Self {
            width,
            height,
            point_step: DENSE_POINT_STEP,
            row_step: DENSE_POINT_STEP * width,
            is_bigendian: false,
            is_dense,
            fields: vec![
                PointField::float32("x", 0),
                PointField::float32("y", 4),
                PointField::float32("z", 8),
                PointField::float32("rgb", DEFAULT_RGB_OFFSET as u32),
            ],
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(position: [f32; 3], rgb: [u8; 3]) -> CloudPoint {
        CloudPoint { position, rgb }
    }

    #[test]
    fn decode_converts_frame_and_zeroes_invalid() {
        let cloud = PointCloud2::from_points(
            3,
            1,
            &[
                pt([2.0, 0.5, -0.25], [10, 20, 30]),
                pt([f32::NAN, 1.0, 1.0], [1, 2, 3]),
                pt([-1.0, 1.0, 1.0], [4, 5, 6]),
            ],
        )
        .unwrap();
        assert!(!cloud.is_dense);
        let points = cloud.points().unwrap();
        assert_eq!(points[0], pt([0.5, -0.25, 2.0], [10, 20, 30]));
        assert_eq!(points[1], CloudPoint::default());
        assert_eq!(points[2], CloudPoint::default());
    }

    #[test]
    fn frame_conversion_round_trips() {
        let p = [1.0, 2.0, 3.0];
        assert_eq!(camera_to_ros(ros_to_camera(p)), p);
    }

    #[test]
    fn big_endian_and_padded_rows() {
        let mut data = vec![0u8; 2 * 40];
        for (row, x) in [(0usize, 1.5f32), (1, 2.5)] {
            let base = row * 40;
            data[base..base + 4].copy_from_slice(&x.to_be_bytes());
            data[base + 4..base + 8].copy_from_slice(&0.25f32.to_be_bytes());
            data[base + 8..base + 12].copy_from_slice(&(-0.5f32).to_be_bytes());
        }
        let cloud = PointCloud2 {
            width: 1,
            height: 2,
            point_step: 20,
            row_step: 40,
            is_bigendian: true,
            is_dense: true,
            fields: vec![
                PointField::float32("x", 0),
                PointField::float32("y", 4),
                PointField::float32("z", 8),
                PointField::float32("rgb", 12),
            ],
            data,
        };
        let points = cloud.points().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].position, [0.25, -0.5, 2.5]);
    }

    #[test]
    fn validation_rejects_short_data_and_missing_fields() {
        let mut cloud = PointCloud2::from_points(2, 2, &[CloudPoint::default(); 4]).unwrap();
        cloud.data.truncate(10);
        assert!(cloud.validate().is_err());

        let mut cloud = PointCloud2::from_points(1, 1, &[CloudPoint::default()]).unwrap();
        cloud.fields.retain(|f| f.name != "z");
        assert!(cloud.points().is_err());

        assert!(PointCloud2::from_points(2, 2, &[CloudPoint::default()]).is_err());
    }

    #[test]
    fn validation_rejects_offsets_past_u32_range() {
        let mut cloud = PointCloud2::from_points(1, 1, &[CloudPoint::default()]).unwrap();
        if let Some(y) = cloud.fields.iter_mut().find(|f| f.name == "y") {
            y.offset = u32::MAX - 1;
        }
        assert!(cloud.validate().is_err());

        let mut cloud = PointCloud2::from_points(1, 1, &[CloudPoint::default()]).unwrap();
        if let Some(rgb) = cloud.fields.iter_mut().find(|f| f.name == "rgb") {
            rgb.offset = u32::MAX;
        }
        assert!(cloud.validate().is_err());
    }

    #[test]
    fn rgbd_layout_feeds_extractor() {
        let cloud = PointCloud2::from_points(1, 1, &[pt([1.7, 0.1, 0.2], [255, 0, 0])]).unwrap();
        let buf = cloud.to_rgbd().unwrap();
        assert_eq!(buf.len(), 4);
        assert_eq!(buf[0].to_bits(), 0x00ff_0000);
        assert_eq!(&buf[1..], &[0.1, 0.2, 1.7]);
    }

    #[test]
    fn export_format() {
        let cloud = PointCloud2::from_points(
            2,
            1,
            &[pt([1.0, 0.5, 0.25], [1, 2, 3]), pt([f32::NAN, 0.0, 0.0], [9, 9, 9])],
        )
        .unwrap();
        let mut out = Vec::new();
        cloud.write_export(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "2",
                "Grid size: 2 x 1",
                "X; Y;  Z;  R;  G;  B;",
                "0.500; 0.250;  1.000;  1;  2;  3;",
                "0.000; 0.000;  0.000;  0;  0;  0;",
            ]
        );
    }
}
