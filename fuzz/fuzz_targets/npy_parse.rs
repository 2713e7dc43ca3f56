//! Fuzz target for `.npy` header and body parsing.
//!
//! Shapes and dtypes come straight from the input, so this exercises the
//! shape and dtype dispatch as well as the Fortran-order reshuffle.

#![no_main]

use grapeset::mask::npy::parse_npy;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = parse_npy(data);
});
