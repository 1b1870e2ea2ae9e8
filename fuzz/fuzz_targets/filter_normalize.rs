#![no_main]

use libfuzzer_sys::fuzz_target;
use tonegraph_dsp::{normalize_value, BiquadCoefficients};

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let Ok(specs) = normalize_value(&value) else {
        return;
    };
    assert!(specs.len() <= 2);
    for spec in &specs {
        let section = BiquadCoefficients::design(spec, 48_000.0);
        assert!(spec.center_freq.is_finite() && spec.center_freq > 0.0);
        let (_, phase) = section.magnitude_phase(1000.0, 48_000.0);
        assert!(phase.is_finite());
    }
});
