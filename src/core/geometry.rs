use serde::{Deserialize, Serialize};

/// Axis-aligned box in page pixel coordinates, `(x0, y0)` top-left.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        (self.x1 - self.x0).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x_center(), self.y_center())
    }

    pub fn x_center(&self) -> f32 {
        (self.x0 + self.x1) * 0.5
    }

    pub fn y_center(&self) -> f32 {
        (self.y0 + self.y1) * 0.5
    }

    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite()
    }

    /// True when `x0 <= x1` and `y0 <= y1`. Zero-width or zero-height boxes are ordered.
    pub fn is_ordered(&self) -> bool {
        self.x0 <= self.x1 && self.y0 <= self.y1
    }

    /// Drop the fractional part of every coordinate, toward zero.
    pub fn truncated(&self) -> Self {
        Self::new(self.x0.trunc(), self.y0.trunc(), self.x1.trunc(), self.y1.trunc())
    }

    /// Clamp to `[0, width] x [0, height]` and round outward to whole pixels.
    /// Returns `(x, y, w, h)`, or `None` when nothing is left.
    pub fn pixel_rect(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.x0.floor().clamp(0.0, width as f32) as u32;
        let y0 = self.y0.floor().clamp(0.0, height as f32) as u32;
        let x1 = self.x1.ceil().clamp(0.0, width as f32) as u32;
        let y1 = self.y1.ceil().clamp(0.0, height as f32) as u32;
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0, y0, x1 - x0, y1 - y0))
    }
}
