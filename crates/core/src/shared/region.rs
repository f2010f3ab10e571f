use serde::Serialize;

pub const DEFAULT_IOU_THRESHOLD: f64 = 0.3;

/// An axis-aligned candidate face rectangle in pixel coordinates.
///
/// Serializes to the `bounding_box` object of the response payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Width-to-height ratio; zero for a degenerate height.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height <= 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }

    /// True when the rectangle lies fully inside a `frame_w` x `frame_h` frame.
    pub fn in_bounds(&self, frame_w: u32, frame_h: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.width > 0
            && self.height > 0
            && self.x + self.width <= frame_w as i32
            && self.y + self.height <= frame_h as i32
    }

    pub fn iou(&self, other: &Region) -> f64 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = (self.x + self.width).min(other.x + other.width);
        let iy2 = (self.y + self.height).min(other.y + other.height);

        let inter = (ix2 - ix1).max(0) as f64 * (iy2 - iy1).max(0) as f64;
        if inter == 0.0 {
            return 0.0;
        }

        let area_a = self.width as f64 * self.height as f64;
        let area_b = other.width as f64 * other.height as f64;
        inter / (area_a + area_b - inter)
    }
}
