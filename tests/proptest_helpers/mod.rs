#![allow(dead_code)]

use grapeset::ir::NormalizedBox;
use grapeset::mask::InstanceMask;
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

pub fn arb_image_dims() -> impl Strategy<Value = (u32, u32)> {
    (1u32..=4096, 1u32..=4096)
}

/// Labels that may fall partly or wholly outside the image, or have a
/// non-positive extent.
pub fn arb_normalized_box() -> impl Strategy<Value = NormalizedBox> {
    (
        0u64..3,
        -0.5f64..1.5,
        -0.5f64..1.5,
        -0.2f64..1.5,
        -0.2f64..1.5,
    )
        .prop_map(|(class_id, cx, cy, w, h)| NormalizedBox::new(class_id, cx, cy, w, h))
}

/// Image stems drawn from a small alphabet so lists overlap often.
pub fn arb_stem() -> impl Strategy<Value = String> {
    "[A-F][0-9]{1,2}"
}

pub fn arb_stem_list(max_len: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_stem(), 0..=max_len)
}

/// A random instance mask with 1..=4 channels.
pub fn arb_instance_mask() -> impl Strategy<Value = InstanceMask> {
    (1usize..=6, 1usize..=6, 1usize..=4).prop_flat_map(|(h, w, c)| {
        prop::collection::vec(prop_oneof![3 => Just(0u8), 1 => 1u8..=255], h * w * c).prop_map(
            move |values| InstanceMask::from_hwc(h, w, c, values).expect("valid mask shape"),
        )
    })
}
