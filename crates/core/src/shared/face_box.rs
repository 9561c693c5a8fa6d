use serde::{Deserialize, Serialize};

/// A detected face bounding box in source-image pixel coordinates.
///
/// Ordered `(top, right, bottom, left)` and serialized as a 4-element array
/// in that order. `top <= bottom` and `left <= right` are expected from
/// detectors but not enforced here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct FaceBox {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl FaceBox {
    pub fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Builds a box from corner coordinates, clamping to `[0, w] x [0, h]`.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64, frame_w: u32, frame_h: u32) -> Self {
        let clamp_x = |v: f64| v.round().clamp(0.0, frame_w as f64) as i32;
        let clamp_y = |v: f64| v.round().clamp(0.0, frame_h as f64) as i32;
        Self {
            top: clamp_y(y1.min(y2)),
            right: clamp_x(x1.max(x2)),
            bottom: clamp_y(y1.max(y2)),
            left: clamp_x(x1.min(x2)),
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> (i32, i32) {
        (self.left + self.width() / 2, self.top + self.height() / 2)
    }

    pub fn area(&self) -> i64 {
        self.width().max(0) as i64 * self.height().max(0) as i64
    }

    /// Scales every coordinate by `factor`, e.g. when drawing on a thumbnail.
    pub fn scaled(&self, factor: f64) -> Self {
        let s = |v: i32| (v as f64 * factor).round() as i32;
        Self::new(s(self.top), s(self.right), s(self.bottom), s(self.left))
    }
}

impl From<[i32; 4]> for FaceBox {
    fn from([top, right, bottom, left]: [i32; 4]) -> Self {
        Self::new(top, right, bottom, left)
    }
}

impl From<FaceBox> for [i32; 4] {
    fn from(b: FaceBox) -> Self {
        [b.top, b.right, b.bottom, b.left]
    }
}
