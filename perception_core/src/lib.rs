//! `perception_core` — ROI tracking and ground-plane bounding boxes.
//!
//! # Module layout
//! - [`types`]        — Rectangles, pixel points, ids, timestamps
//! - [`roi`]          — Tracked rectangle and freshness classes
//! - [`similarity`]   — "Same rectangle" test used for matching
//! - [`roi_tracker`]  — Reconcile / select / update / sweep / clear
//! - [`follow_me`]    — Enable switch, outbound messages, distance label
//! - [`ground_plane`] — Bounding box of points resting on the ground
//! - [`metrics`]      — Session statistics

pub mod follow_me;
pub mod ground_plane;
pub mod metrics;
pub mod roi;
pub mod roi_tracker;
pub mod similarity;
pub mod types;

pub use follow_me::{FollowMeSession, FrameView, Outbound};
pub use ground_plane::{
    BoundingBoxResult, FrameLayout, GroundPlaneConfig, GroundPlaneExtractor, GroundPlaneFrame,
};
pub use roi::{Freshness, RectangleOfInterest};
pub use roi_tracker::{
    AgingPolicy, ReconcileOutcome, RoiTracker, RoiTrackerConfig, SweepResult, TargetUpdate,
    TargetView,
};
pub use similarity::{OverlapMatcher, RectMatcher};
pub use types::{PixelPoint, Rect, RoiId, Timestamp};
