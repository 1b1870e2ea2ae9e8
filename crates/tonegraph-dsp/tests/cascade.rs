use tonegraph_dsp::{compute_response, FilterSlots, DEFAULT_BINS, DEFAULT_SAMPLE_RATE};
use tonegraph_graph::{BiquadFilterType, ParametricEqParameters};

const PEAK: BiquadFilterType = BiquadFilterType::Peaking {
    filter_freq: 800.0,
    q_factor: 1.4,
    boost_db: 5.5,
};

#[test]
fn identical_peaks_add_in_db_and_phase() {
    let single = compute_response(&FilterSlots::from_single(PEAK), DEFAULT_SAMPLE_RATE).unwrap();
    let eq = ParametricEqParameters::default()
        .with_filter(0, PEAK)
        .with_filter(1, PEAK);
    let double =
        compute_response(&FilterSlots::from_parametric_eq(&eq), DEFAULT_SAMPLE_RATE).unwrap();

    assert_eq!(double.len(), DEFAULT_BINS);
    for bin in 0..DEFAULT_BINS {
        assert!((double.magnitudes_db[bin] - 2.0 * single.magnitudes_db[bin]).abs() < 1e-9);
        assert!((double.phases_rad[bin] - 2.0 * single.phases_rad[bin]).abs() < 1e-9);
    }
}

#[test]
fn constant_q_matches_peaking() {
    let constant_q = BiquadFilterType::ConstantQ {
        filter_freq: 800.0,
        q_factor: 1.4,
        boost_db: 5.5,
    };
    let a = compute_response(&FilterSlots::from_single(constant_q), DEFAULT_SAMPLE_RATE).unwrap();
    let b = compute_response(&FilterSlots::from_single(PEAK), DEFAULT_SAMPLE_RATE).unwrap();
    assert_eq!(a, b);
}

#[test]
fn bypass_slots_do_not_affect_the_cascade() {
    let sparse = ParametricEqParameters::default().with_filter(6, PEAK);
    let a = compute_response(&FilterSlots::from_parametric_eq(&sparse), DEFAULT_SAMPLE_RATE)
        .unwrap();
    let b = compute_response(&FilterSlots::from_single(PEAK), DEFAULT_SAMPLE_RATE).unwrap();
    assert_eq!(a, b);
}

#[test]
fn flat_linkwitz_approximation_is_transparent() {
    let linkwitz = BiquadFilterType::Linkwitz {
        f0: 50.0,
        q0: 0.6,
        fp: 30.0,
        qp: 0.707,
    };
    let response =
        compute_response(&FilterSlots::from_single(linkwitz), DEFAULT_SAMPLE_RATE).unwrap();
    assert!(response
        .magnitudes_db
        .iter()
        .all(|db| db.abs() < 1e-9));
}

#[test]
fn gain_filter_peaks_at_one_kilohertz() {
    let response = compute_response(
        &FilterSlots::from_single(BiquadFilterType::Gain { gain_db: 6.0 }),
        DEFAULT_SAMPLE_RATE,
    )
    .unwrap();
    let bin = response.nearest_bin(1000.0).unwrap();
    assert!((response.magnitudes_db[bin] - 6.0).abs() < 0.1);
    assert!(response.magnitudes_db[0].abs() < 0.5);
}
