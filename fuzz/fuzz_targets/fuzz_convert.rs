// SPDX-License-Identifier: AGPL-3.0-or-later
#![no_main]

use folio_core::{convert, ConversionMode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        for (from, to) in [
            (ConversionMode::Markdown, ConversionMode::Html),
            (ConversionMode::Html, ConversionMode::Markdown),
        ] {
            let output = convert(input, from, to);
            assert!(output.is_ok(), "{from} -> {to} failed: {output:?}");
        }
    }
});
