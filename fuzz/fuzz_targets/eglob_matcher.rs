#![no_main]

use libfuzzer_sys::fuzz_target;
use trazar::eglob::match_eglob;

fuzz_target!(|data: &[u8]| {
    // First NUL splits the input into pattern and subject. Lengths are
    // capped because `*` backtracking is intentionally unbounded.
    let Some(split) = data.iter().position(|&b| b == 0) else {
        return;
    };
    let (pattern, subject) = (&data[..split], &data[split + 1..]);
    if pattern.len() > 64 || subject.len() > 64 {
        return;
    }
    if let (Ok(pattern), Ok(subject)) = (
        std::str::from_utf8(pattern),
        std::str::from_utf8(subject),
    ) {
        // Must produce a verdict without panicking, however unbalanced
        // the pattern.
        let _ = match_eglob(pattern, subject);
    }
});
