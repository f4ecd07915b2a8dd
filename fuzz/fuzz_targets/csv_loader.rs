#![no_main]

use abtest_report::dataset::Dataset;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Malformed input must surface as an error, never a panic
    if let Ok(dataset) = Dataset::from_reader(data) {
        let _ = dataset.date_range();
        let _ = dataset.duplicate_users();
        let _ = abtest_report::stats::summarize(&dataset);
    }
});
