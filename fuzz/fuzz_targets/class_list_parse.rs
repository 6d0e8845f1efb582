//! Fuzz target for class-list YAML parsing.

#![no_main]

use boxmark::export::fuzz_parse_class_list;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    if let Ok(input) = std::str::from_utf8(data) {
        let _ = fuzz_parse_class_list(input);
    }
});
