//! Bounding box types in top-left and center form.

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

use super::{Normalized, Pixel};

/// An axis-aligned box as top-left corner plus extent (COCO `[x, y, w, h]`).
///
/// Construction does not enforce positive extent; degenerate boxes can be
/// represented so that callers can detect and count them.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYWH<TSpace> {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    _space: PhantomData<TSpace>,
}

/// An axis-aligned box as center point plus extent (YOLO layout).
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxCXCYWH<TSpace> {
    pub cx: f64,
    pub cy: f64,
    pub width: f64,
    pub height: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> BBoxXYWH<TSpace> {
    #[inline]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            _space: PhantomData,
        }
    }

    /// Right edge (`x + width`).
    #[inline]
    pub fn xmax(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (`y + height`).
    #[inline]
    pub fn ymax(&self) -> f64 {
        self.y + self.height
    }

    /// `width × height`; negative or zero for degenerate boxes.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// True when either extent is zero, negative or not a number.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    #[inline]
    pub fn to_array(&self) -> [f64; 4] {
        [self.x, self.y, self.width, self.height]
    }
}

impl<TSpace> BBoxCXCYWH<TSpace> {
    #[inline]
    pub fn new(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self {
            cx,
            cy,
            width,
            height,
            _space: PhantomData,
        }
    }

    /// Moves the reference point from the center to the top-left corner.
    #[inline]
    pub fn to_top_left(&self) -> BBoxXYWH<TSpace> {
        BBoxXYWH::new(
            self.cx - self.width / 2.0,
            self.cy - self.height / 2.0,
            self.width,
            self.height,
        )
    }
}

impl BBoxCXCYWH<Normalized> {
    /// Scales every component by the image dimensions.
    pub fn to_pixel(&self, image_width: f64, image_height: f64) -> BBoxCXCYWH<Pixel> {
        BBoxCXCYWH::new(
            self.cx * image_width,
            self.cy * image_height,
            self.width * image_width,
            self.height * image_height,
        )
    }
}

/// Slack allowed on the right and bottom edges, in pixels. `x + (W - x)`
/// does not always round back to `W`.
pub const EDGE_TOLERANCE: f64 = 1e-6;

impl BBoxXYWH<Pixel> {
    /// Clamps the box into an image of `image_width × image_height` pixels.
    ///
    /// The corner is clamped to `[0, W-1] × [0, H-1]`, then the extent is
    /// shrunk so the box never passes the right or bottom edge. Extents are
    /// never grown, so a degenerate input stays degenerate.
    pub fn clamp_to_image(&self, image_width: f64, image_height: f64) -> Self {
        let x = self.x.min(image_width - 1.0).max(0.0);
        let y = self.y.min(image_height - 1.0).max(0.0);
        let width = self.width.min(image_width - x);
        let height = self.height.min(image_height - y);
        Self::new(x, y, width, height)
    }

    /// True when the box satisfies the persisted-box invariant for an
    /// image of the given size.
    pub fn fits_image(&self, image_width: f64, image_height: f64) -> bool {
        self.is_finite() && !self.is_degenerate() && self.within_image(image_width, image_height)
    }

    /// True when the corner lies inside the image and the far edges do not
    /// pass the right or bottom border by more than [`EDGE_TOLERANCE`].
    pub fn within_image(&self, image_width: f64, image_height: f64) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.x < image_width
            && self.y < image_height
            && self.xmax() <= image_width + EDGE_TOLERANCE
            && self.ymax() <= image_height + EDGE_TOLERANCE
    }
}

impl<TSpace> std::fmt::Debug for BBoxXYWH<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxXYWH")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl<TSpace> std::fmt::Debug for BBoxCXCYWH<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxCXCYWH")
            .field("cx", &self.cx)
            .field("cy", &self.cy)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

// Serialized as a bare `[x, y, w, h]` array, the layout collection documents use.
impl<TSpace> Serialize for BBoxXYWH<TSpace> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_array().serialize(serializer)
    }
}

impl<'de, TSpace> Deserialize<'de> for BBoxXYWH<TSpace> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [x, y, width, height] = <[f64; 4]>::deserialize(deserializer)?;
        Ok(BBoxXYWH::new(x, y, width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_to_top_left() {
        let center: BBoxCXCYWH<Pixel> = BBoxCXCYWH::new(50.0, 40.0, 20.0, 10.0);
        let bbox = center.to_top_left();
        assert_eq!(bbox.to_array(), [40.0, 35.0, 20.0, 10.0]);
        assert_eq!(bbox.xmax(), 60.0);
        assert_eq!(bbox.ymax(), 40.0);
    }

    #[test]
    fn test_normalized_to_pixel_scales_each_axis() {
        let norm: BBoxCXCYWH<Normalized> = BBoxCXCYWH::new(0.5, 0.5, 0.2, 0.25);
        let px = norm.to_pixel(1000.0, 800.0);
        assert_eq!(px.cx, 500.0);
        assert_eq!(px.cy, 400.0);
        assert_eq!(px.width, 200.0);
        assert_eq!(px.height, 200.0);
    }

    #[test]
    fn test_clamp_shrinks_overhanging_box() {
        let bbox: BBoxXYWH<Pixel> = BBoxXYWH::new(-10.0, 90.0, 50.0, 30.0);
        let clamped = bbox.clamp_to_image(100.0, 100.0);
        assert_eq!(clamped.to_array(), [0.0, 90.0, 50.0, 10.0]);
        assert!(clamped.fits_image(100.0, 100.0));
    }

    #[test]
    fn test_clamp_pins_corner_inside_image() {
        let bbox: BBoxXYWH<Pixel> = BBoxXYWH::new(150.0, 5.0, 20.0, 20.0);
        let clamped = bbox.clamp_to_image(100.0, 100.0);
        assert_eq!(clamped.x, 99.0);
        assert_eq!(clamped.width, 1.0);
    }

    #[test]
    fn test_within_image_allows_edge_rounding_only() {
        let w = 1365.0;
        let x = 1364.3;
        let touching: BBoxXYWH<Pixel> = BBoxXYWH::new(x, 0.0, w - x, 10.0);
        assert!(touching.within_image(w, 2048.0));

        let past: BBoxXYWH<Pixel> = BBoxXYWH::new(x, 0.0, w - x + 1e-3, 10.0);
        assert!(!past.within_image(w, 2048.0));
        assert!(!past.fits_image(w, 2048.0));

        let outside: BBoxXYWH<Pixel> = BBoxXYWH::new(1365.0, 0.0, 1.0, 1.0);
        assert!(!outside.within_image(w, 2048.0));

        // Bounds only: a zero-width box inside the image is within it but does not fit.
        let flat: BBoxXYWH<Pixel> = BBoxXYWH::new(5.0, 5.0, 0.0, 5.0);
        assert!(flat.within_image(10.0, 10.0));
        assert!(!flat.fits_image(10.0, 10.0));
    }

    #[test]
    fn test_degenerate_detection() {
        let zero: BBoxXYWH<Pixel> = BBoxXYWH::new(1.0, 1.0, 0.0, 5.0);
        assert!(zero.is_degenerate());
        assert!(!zero.fits_image(10.0, 10.0));

        let nan: BBoxXYWH<Pixel> = BBoxXYWH::new(1.0, 1.0, f64::NAN, 5.0);
        assert!(nan.is_degenerate());
        assert!(!nan.is_finite());
    }

    #[test]
    fn test_serde_uses_array_layout() {
        let bbox: BBoxXYWH<Pixel> = BBoxXYWH::new(400.0, 300.0, 200.0, 200.0);
        let json = serde_json::to_string(&bbox).expect("serialize");
        assert_eq!(json, "[400.0,300.0,200.0,200.0]");
        let back: BBoxXYWH<Pixel> = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, bbox);
    }
}
