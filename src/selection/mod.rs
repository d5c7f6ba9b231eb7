// src/selection/mod.rs
// Watermark region selection - on-screen capture and native rescaling

mod normalize;
mod selector;

pub use normalize::{to_native, to_native_set, DisplayGeometry};
pub use selector::{Overlay, RegionSelector, MIN_DRAG_PX};

use serde::{Deserialize, Serialize};

/// A committed rectangle in displayed (on-screen) pixel space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRect {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Playback position (seconds) when the rectangle was drawn
    pub timestamp: f64,
}

/// A rectangle in native video pixels, the only form sent to the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionRect {
    pub id: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub timestamp: f64,
}

/// All selections for one job, serialized as `{"watermarks": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionSet {
    #[serde(default)]
    watermarks: Vec<SelectionRect>,
}

impl SelectionSet {
    pub fn new(watermarks: Vec<SelectionRect>) -> Self {
        Self { watermarks }
    }

    pub fn is_empty(&self) -> bool {
        self.watermarks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.watermarks.len()
    }

    pub fn rects(&self) -> &[SelectionRect] {
        &self.watermarks
    }
}
