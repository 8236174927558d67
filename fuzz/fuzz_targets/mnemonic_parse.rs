#![no_main]

use libfuzzer_sys::fuzz_target;
use seedpass_core::seed::{normalize_seed, parse_mnemonic, validate_seed};

fuzz_target!(|data: &[u8]| {
    // Raw and normalized input must both parse to Ok or Err, never panic.
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = parse_mnemonic(s);

        let normalized = normalize_seed(s);
        assert!(normalized.bytes().all(|b| b == b' ' || b.is_ascii_lowercase()));
        assert_eq!(normalize_seed(&normalized), normalized);
        let _ = validate_seed(&normalized);
    }
});
