//! Bounding box of objects resting on a ground plane, seen by a camera
//! hanging above the scene and looking down.
//!
//! # Frame layout
//! Row-major `f32` samples, `channels` values per pixel. The X coordinate sits
//! at `channel_offset`, followed by Y and Z. Z is the distance from the
//! camera, so the ground lies at `ceiling` and objects have smaller Z.
//!
//! # Region of interest
//! A sample is kept when every coordinate is finite and
//! `min_height ≤ z ≤ ceiling`, `|x| ≤ width / 2`, `|y| ≤ depth / 2`.
//! Row 0 and column 0 are skipped.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Observed region on the ground, in meters, camera frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundPlaneConfig {
    /// Distance from the camera to the ground
    pub ceiling: f32,
    /// Extent of the region along X
    pub width: f32,
    /// Extent of the region along Y
    pub depth: f32,
    /// Samples closer to the camera than this are ignored
    pub min_height: f32,
}

impl Default for GroundPlaneConfig {
    fn default() -> Self {
        Self {
            ceiling: 1.85,
            width: 1.6,
            depth: 0.9,
            min_height: 1.0,
        }
    }
}

impl GroundPlaneConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.width > 0.0 && self.depth > 0.0,
            "ground region must have positive width and depth, got {} x {}",
            self.width,
            self.depth
        );
        anyhow::ensure!(
            self.min_height < self.ceiling,
            "min_height ({}) must be below the ceiling ({})",
            self.min_height,
            self.ceiling
        );
        Ok(())
    }

    /// Extents reported when no sample falls inside the region.
    pub fn initial_bounds(&self) -> BoundingBoxResult {
        BoundingBoxResult {
            min_x: self.width,
            max_x: -self.width,
            min_y: self.depth,
            max_y: -self.depth,
            min_z: self.ceiling,
            max_z: self.ceiling,
        }
    }

    fn accepts(&self, p: &Vector3<f32>) -> bool {
        let half_w = self.width / 2.0;
        let half_d = self.depth / 2.0;
        p.iter().all(|c| c.is_finite())
            && p.z <= self.ceiling
            && p.z >= self.min_height
            && p.x.abs() <= half_w
            && p.y.abs() <= half_d
    }
}

/// Where the XYZ triple lives inside one sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameLayout {
    pub channels: usize,
    pub channel_offset: usize,
}

impl Default for FrameLayout {
    /// RGBD layout: packed colour followed by X, Y, Z.
    fn default() -> Self {
        Self {
            channels: 4,
            channel_offset: 1,
        }
    }
}

/// One borrowed frame of dense samples.
#[derive(Clone, Copy, Debug)]
pub struct GroundPlaneFrame<'a> {
    pub data: &'a [f32],
    pub cols: usize,
    pub rows: usize,
    pub layout: FrameLayout,
}

impl<'a> GroundPlaneFrame<'a> {
    /// Panics when `data` does not hold exactly `cols × rows × channels` values.
    pub fn new(data: &'a [f32], cols: usize, rows: usize, layout: FrameLayout) -> Self {
        assert!(
            layout.channel_offset + 3 <= layout.channels,
            "XYZ at offset {} does not fit in {} channels",
            layout.channel_offset,
            layout.channels
        );
        assert_eq!(
            data.len(),
            cols * rows * layout.channels,
            "frame buffer does not match {cols}x{rows}x{}",
            layout.channels
        );
        Self {
            data,
            cols,
            rows,
            layout,
        }
    }

    pub fn point(&self, col: usize, row: usize) -> Vector3<f32> {
        let i = (row * self.cols + col) * self.layout.channels + self.layout.channel_offset;
        Vector3::new(self.data[i], self.data[i + 1], self.data[i + 2])
    }
}

/// Six extrema of the accepted samples. `max_z` is always the ground.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBoxResult {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub min_z: f32,
    pub max_z: f32,
}

/// Overlay text for the three box dimensions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionLabels {
    pub height: String,
    pub width: String,
    pub depth: String,
}

impl BoundingBoxResult {
    /// Lengths along X, Y and Z.
    pub fn size(&self) -> Vector3<f32> {
        Vector3::new(
            self.max_x - self.min_x,
            self.max_y - self.min_y,
            self.max_z - self.min_z,
        )
    }

    pub fn center(&self) -> Vector3<f32> {
        Vector3::new(
            (self.max_x + self.min_x) / 2.0,
            (self.max_y + self.min_y) / 2.0,
            (self.max_z + self.min_z) / 2.0,
        )
    }

    /// Object height above the ground, width along Y, depth along X.
    pub fn labels(&self) -> DimensionLabels {
        let size = self.size();
        DimensionLabels {
            height: format!("H = {:.1} m", size.z),
            width: format!("W = {:.1} m", size.y),
            depth: format!("D = {:.1} m", size.x),
        }
    }

    fn include(&mut self, p: &Vector3<f32>) {
        self.max_x = self.max_x.max(p.x);
        self.min_x = self.min_x.min(p.x);
        self.max_y = self.max_y.max(p.y);
        self.min_y = self.min_y.min(p.y);
        self.min_z = self.min_z.min(p.z);
    }
}

/// Bounding box of the in-region samples of one frame.
pub fn extract(config: &GroundPlaneConfig, frame: &GroundPlaneFrame<'_>) -> BoundingBoxResult {
    let mut bounds = config.initial_bounds();
    let mut accepted = 0usize;
    for row in 1..frame.rows {
        for col in 1..frame.cols {
            let p = frame.point(col, row);
            if !config.accepts(&p) {
                continue;
            }
            bounds.include(&p);
            accepted += 1;
        }
    }
    trace!(accepted, cols = frame.cols, rows = frame.rows, "ground plane extraction");
    bounds
}

/// Extractor owning a scratch buffer that is reused while the frame size
/// stays the same.
pub struct GroundPlaneExtractor {
    pub config: GroundPlaneConfig,
    pub layout: FrameLayout,
    scratch: Vec<f32>,
    /// Columns, rows and channels the scratch buffer is sized for
    dims: (usize, usize, usize),
}

impl GroundPlaneExtractor {
    pub fn new(config: GroundPlaneConfig, layout: FrameLayout) -> Self {
        Self {
            config,
            layout,
            scratch: Vec::new(),
            dims: (0, 0, 0),
        }
    }

    fn prepare(&mut self, cols: usize, rows: usize) {
        let dims = (cols, rows, self.layout.channels);
        if self.dims != dims {
            self.scratch = vec![0.0; cols * rows * self.layout.channels];
            self.dims = dims;
        }
    }

    /// Copy `data` into the scratch buffer, then extract.
    pub fn process(&mut self, cols: usize, rows: usize, data: &[f32]) -> BoundingBoxResult {
        self.prepare(cols, rows);
        assert_eq!(data.len(), self.scratch.len(), "frame buffer does not match {cols}x{rows}");
        self.scratch.copy_from_slice(data);
        self.extract_scratch(cols, rows)
    }

    /// Decode a little-endian `f32` byte buffer into the scratch buffer, then extract.
    pub fn process_bytes(&mut self, cols: usize, rows: usize, bytes: &[u8]) -> BoundingBoxResult {
        self.prepare(cols, rows);
        assert_eq!(
            bytes.len(),
            self.scratch.len() * 4,
            "frame byte buffer does not match {cols}x{rows}"
        );
        for (dst, chunk) in self.scratch.iter_mut().zip(bytes.chunks_exact(4)) {
            *dst = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        self.extract_scratch(cols, rows)
    }

    fn extract_scratch(&self, cols: usize, rows: usize) -> BoundingBoxResult {
        let frame = GroundPlaneFrame::new(&self.scratch, cols, rows, self.layout);
        extract(&self.config, &frame)
    }

    /// Scratch capacity in samples (for diagnostics).
    pub fn scratch_len(&self) -> usize {
        self.scratch.len()
    }
}

impl Default for GroundPlaneExtractor {
    fn default() -> Self {
        Self::new(GroundPlaneConfig::default(), FrameLayout::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
