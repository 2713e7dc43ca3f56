//! Conversion from normalized center-form labels to clamped pixel boxes.

use super::{BBoxCXCYWH, BBoxXYWH, CategoryId, Normalized, Pixel};

/// One parsed normalized label: `class_id cx cy w h`.
///
/// `class_id` is 0-based as written by YOLO-style tools.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedBox {
    pub class_id: u64,
    pub bbox: BBoxCXCYWH<Normalized>,
}

impl NormalizedBox {
    pub fn new(class_id: u64, cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self {
            class_id,
            bbox: BBoxCXCYWH::new(cx, cy, width, height),
        }
    }
}

/// A pixel-space box with its 1-based category.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AbsoluteBox {
    pub category_id: CategoryId,
    pub bbox: BBoxXYWH<Pixel>,
}

/// Converts a normalized label into a pixel box clamped to the image.
///
/// Extents are scaled first, the center is then moved to the top-left
/// corner, and finally the box is clamped (see
/// [`BBoxXYWH::clamp_to_image`]). The category shifts from 0-based to
/// 1-based. The result may still be degenerate when the input extent was
/// zero or negative; callers decide whether to keep it.
pub fn normalized_to_absolute(
    label: &NormalizedBox,
    image_width: u32,
    image_height: u32,
) -> AbsoluteBox {
    let (w, h) = (image_width as f64, image_height as f64);
    let bbox = label.bbox.to_pixel(w, h).to_top_left().clamp_to_image(w, h);

    AbsoluteBox {
        category_id: CategoryId::new(label.class_id + 1),
        bbox,
    }
}

/// Clamps an already absolute box (e.g. read from CSV) to the image.
pub fn clamp_absolute(bbox: BBoxXYWH<Pixel>, image_width: u32, image_height: u32) -> BBoxXYWH<Pixel> {
    bbox.clamp_to_image(image_width as f64, image_height as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn centered_box_converts_without_clamping() {
        let label = NormalizedBox::new(0, 0.5, 0.5, 0.2, 0.25);
        let out = normalized_to_absolute(&label, 1000, 800);

        assert_eq!(out.category_id, CategoryId::new(1));
        assert!(approx(out.bbox.x, 400.0));
        assert!(approx(out.bbox.y, 300.0));
        assert!(approx(out.bbox.width, 200.0));
        assert!(approx(out.bbox.height, 200.0));
        assert!(approx(out.bbox.area(), 40000.0));
    }

    #[test]
    fn box_hanging_off_the_left_edge_is_clamped() {
        // cx=0.05, w=0.2 on 100px -> x=-5, clamped to 0, width stays 20.
        let label = NormalizedBox::new(2, 0.05, 0.5, 0.2, 0.2);
        let out = normalized_to_absolute(&label, 100, 100);

        assert_eq!(out.category_id, CategoryId::new(3));
        assert!(approx(out.bbox.x, 0.0));
        assert!(approx(out.bbox.width, 20.0));
        assert!(out.bbox.fits_image(100.0, 100.0));
    }

    #[test]
    fn box_hanging_off_the_bottom_right_is_shrunk() {
        let label = NormalizedBox::new(0, 0.95, 0.95, 0.2, 0.2);
        let out = normalized_to_absolute(&label, 200, 100);

        assert!(approx(out.bbox.x, 170.0));
        assert!(approx(out.bbox.width, 30.0));
        assert!(approx(out.bbox.y, 85.0));
        assert!(approx(out.bbox.height, 15.0));
        assert!(out.bbox.fits_image(200.0, 100.0));
    }

    #[test]
    fn zero_extent_stays_degenerate() {
        let label = NormalizedBox::new(0, 0.5, 0.5, 0.0, 0.1);
        let out = normalized_to_absolute(&label, 10, 10);
        assert!(out.bbox.is_degenerate());
    }

    #[test]
    fn clamp_absolute_matches_bbox_clamp() {
        let bbox = BBoxXYWH::<Pixel>::new(-3.0, 2.0, 50.0, 50.0);
        let clamped = clamp_absolute(bbox, 40, 30);
        assert_eq!(clamped.to_array(), [0.0, 2.0, 40.0, 28.0]);
    }
}
