//! Fuzz target for document JSON parsing.
//!
//! This fuzzer feeds arbitrary byte sequences to the document parser,
//! checking for panics, crashes, or hangs.

#![no_main]

use boxmark::model::io_json::fuzz_parse_document;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(input) = std::str::from_utf8(data) {
        let _ = fuzz_parse_document(input);
    }
});
