#![no_main]

use libfuzzer_sys::fuzz_target;

use kickoff::resolver::{MetaImageScanner, ScanOutcome};

fuzz_target!(|data: &[u8]| {
    // Feed the input in uneven chunks; the scanner must never panic or
    // buffer past its cap regardless of where chunk boundaries fall.
    let mut scanner = MetaImageScanner::new(4096);
    for chunk in data.chunks(97) {
        match scanner.push(chunk) {
            ScanOutcome::Found(_) | ScanOutcome::Exhausted => break,
            ScanOutcome::NeedMore => {}
        }
    }
    assert!(scanner.buffered() <= 4096);
    let _ = scanner.finish();
});
