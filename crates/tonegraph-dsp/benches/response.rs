use criterion::{criterion_group, criterion_main, Criterion};
use tonegraph_dsp::{compute_response, FilterSlots, DEFAULT_SAMPLE_RATE};
use tonegraph_graph::{BiquadFilterType, FilterKind, ParametricEqParameters};

fn full_eq() -> FilterSlots {
    let mut eq = ParametricEqParameters::default();
    let kinds = [
        FilterKind::Highpass,
        FilterKind::Lowshelf,
        FilterKind::Peaking,
        FilterKind::Peaking,
        FilterKind::Notch,
        FilterKind::Bandpass,
        FilterKind::Highshelf,
        FilterKind::Linkwitz,
    ];
    for (slot, kind) in kinds.into_iter().enumerate() {
        eq = eq.with_filter(slot, BiquadFilterType::with_defaults(kind));
    }
    FilterSlots::from_parametric_eq(&eq)
}

fn bench_response(c: &mut Criterion) {
    let slots = full_eq();
    c.bench_function("eq response 8 slots x512", |b| {
        b.iter(|| compute_response(&slots, DEFAULT_SAMPLE_RATE).unwrap())
    });
    let single = FilterSlots::from_single(BiquadFilterType::with_defaults(FilterKind::Lowpass));
    c.bench_function("biquad response x512", |b| {
        b.iter(|| compute_response(&single, DEFAULT_SAMPLE_RATE).unwrap())
    });
}

criterion_group!(benches, bench_response);
criterion_main!(benches);
