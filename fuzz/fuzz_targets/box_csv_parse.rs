//! Fuzz target for box CSV parsing and header resolution.
//!
//! Run with:
//!   cargo +nightly fuzz run box_csv_parse

#![no_main]

use grapeset::ir::io_box_csv::fuzz_parse_box_csv;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = fuzz_parse_box_csv(data);
});
