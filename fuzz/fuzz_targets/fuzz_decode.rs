//! Fuzz target for the instruction word decoder.
//!
//! Feeds arbitrary words to `decode` and `disassemble` to find panics, and
//! checks that decoded instructions re-encode to a stable canonical word.

#![no_main]

use carsim::{decode, disassemble, encode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|words: Vec<u32>| {
    // Limit input size to prevent OOM
    if words.len() > 4096 {
        return;
    }

    let lines = disassemble(&words);
    assert_eq!(lines.len(), words.len());

    for &word in &words {
        if let Ok(instr) = decode(word) {
            let canonical = encode(&instr);
            assert_eq!(decode(canonical), Ok(instr));
            assert_eq!(encode(&instr), canonical);
        }
    }
});
