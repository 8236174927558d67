#![no_main]

use libfuzzer_sys::fuzz_target;
use seedpass_core::vault::parse_document;

fuzz_target!(|data: &[u8]| {
    // Whatever sits in the vault slot, parsing and decoding each entry
    // must return Ok or Err without panicking.
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(entries) = parse_document(s) {
            for entry in &entries {
                let _ = entry.encrypted();
            }
        }
    }
});
