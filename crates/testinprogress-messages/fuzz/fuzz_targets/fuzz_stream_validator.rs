// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for stream decoding and validation
//!
//! Feeds arbitrary line-delimited input through `parse_line` and `StreamValidator`;
//! neither should ever panic.

#![no_main]

use libfuzzer_sys::fuzz_target;

use testinprogress_messages::{StreamValidator, parse_line};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let mut validator = StreamValidator::new();

        for line in input.lines() {
            if let Ok(message) = parse_line(line) {
                let _ = validator.process(&message);
            }
        }

        let _ = validator.finish();
    }
});
