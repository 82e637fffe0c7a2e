#![no_main]

use libfuzzer_sys::fuzz_target;
use jsh_terminal::parser;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Every variable expands to the whole input, so rescanning is
        // exercised on arbitrary text and must stay within the budget.
        let lookup = |_: &str| Some(input.to_string());
        let _pipeline = parser::parse(input, &lookup, 64);

        let _unset = parser::parse(input, &|_| None, 64);
    }
});
