//! Pixel-space box coordinates and their normalized export form.

use serde::{Deserialize, Serialize};

/// A bounding box in pixel space, stored as centre + size.
///
/// `(x, y)` is the CENTRE of the box, not its top-left corner. Pixel
/// coordinates are the source of truth; the normalized form only exists at
/// export time.
///
/// Note: construction is permissive. Boxes drawn partially outside the image
/// are representable, and validation reports them rather than rejecting them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Coordinates {
    /// Creates a new box from its centre and size.
    #[inline]
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a box from two drag points (start and end of a gesture).
    ///
    /// The points may come in any order; the resulting size is always
    /// non-negative and the centre is truncated towards zero. Spans wider
    /// than `i64::MAX` saturate.
    pub fn from_drag(start: (i64, i64), end: (i64, i64)) -> Self {
        let span_x = start.0.abs_diff(end.0);
        let span_y = start.1.abs_diff(end.1);
        let left = start.0.min(end.0);
        let top = start.1.min(end.1);
        Self::new(
            left.saturating_add_unsigned(span_x / 2),
            top.saturating_add_unsigned(span_y / 2),
            i64::try_from(span_x).unwrap_or(i64::MAX),
            i64::try_from(span_y).unwrap_or(i64::MAX),
        )
    }

    /// Returns the box area in square pixels, saturating on overflow.
    ///
    /// Only zero when the width or the height is zero.
    #[inline]
    pub fn area(&self) -> i64 {
        self.width.saturating_mul(self.height)
    }

    /// Returns true if the centre lies within `[0, image_width] x [0, image_height]`.
    pub fn center_within(&self, image_width: u32, image_height: u32) -> bool {
        (0..=i64::from(image_width)).contains(&self.x)
            && (0..=i64::from(image_height)).contains(&self.y)
    }

    /// Converts pixel coordinates to normalized centre/size coordinates.
    ///
    /// Plain floating-point division, no rounding or clamping: values above
    /// 1.0 are kept for boxes that spill over the image edge. The caller must
    /// pass non-zero dimensions.
    pub fn to_normalized(&self, image_width: u32, image_height: u32) -> NormalizedBox {
        let w = f64::from(image_width);
        let h = f64::from(image_height);
        NormalizedBox {
            cx: self.x as f64 / w,
            cy: self.y as f64 / h,
            w: self.width as f64 / w,
            h: self.height as f64 / h,
        }
    }
}

/// A bounding box in normalized centre/size form (YOLO style).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NormalizedBox {
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

impl NormalizedBox {
    /// Scales the box back to (floating-point) pixel space.
    pub fn to_pixel(&self, image_width: u32, image_height: u32) -> (f64, f64, f64, f64) {
        let w = f64::from(image_width);
        let h = f64::from(image_height);
        (self.cx * w, self.cy * h, self.w * w, self.h * h)
    }

    /// Returns true if all components are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.cx.is_finite() && self.cy.is_finite() && self.w.is_finite() && self.h.is_finite()
    }
}
