#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(query) = std::str::from_utf8(data) {
        // Parsing must never panic, only return errors
        _ = odata_sql::parse(query);
    }
});
