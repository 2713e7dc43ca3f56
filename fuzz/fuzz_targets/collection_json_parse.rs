//! Fuzz target for collection JSON parsing.
//!
//! Run with:
//!   cargo +nightly fuzz run collection_json_parse
//!
//! Or with a corpus:
//!   cargo +nightly fuzz run collection_json_parse fuzz/corpus/collection_json_parse/

#![no_main]

use grapeset::ir::io_coco_json::from_collection_slice;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // 10MB is generous for a split collection.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_collection_slice(data);
});
