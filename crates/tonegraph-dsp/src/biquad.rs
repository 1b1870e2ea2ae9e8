//! Biquad coefficient design (RBJ cookbook forms) and analytic evaluation.

use std::f64::consts::{LN_2, PI};

use num_complex::Complex64;

use crate::normalize::{FilterSpec, SpecKind};

const DEFAULT_Q: f64 = std::f64::consts::FRAC_1_SQRT_2;
const DEFAULT_BANDWIDTH: f64 = 1.0;
/// Lower bound for `sin(w0)` when converting bandwidth to alpha.
const SIN_EPSILON: f64 = 1e-8;

/// Second-order section normalized so that `a0 == 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiquadCoefficients {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoefficients {
    /// Pass-through section.
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    fn normalized(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Designs the section described by `spec` at `sample_rate`.
    ///
    /// The centre frequency is saturated at Nyquist.
    pub fn design(spec: &FilterSpec, sample_rate: f64) -> Self {
        let sample_rate = sample_rate.max(1.0);
        let freq = spec.center_freq.min(sample_rate / 2.0);
        let w0 = 2.0 * PI * freq / sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let q = spec.q.unwrap_or(DEFAULT_Q);
        let alpha_q = sin_w0 / (2.0 * q);

        match spec.kind {
            SpecKind::Lowpass => Self::normalized(
                (1.0 - cos_w0) / 2.0,
                1.0 - cos_w0,
                (1.0 - cos_w0) / 2.0,
                1.0 + alpha_q,
                -2.0 * cos_w0,
                1.0 - alpha_q,
            ),
            SpecKind::Highpass => Self::normalized(
                (1.0 + cos_w0) / 2.0,
                -(1.0 + cos_w0),
                (1.0 + cos_w0) / 2.0,
                1.0 + alpha_q,
                -2.0 * cos_w0,
                1.0 - alpha_q,
            ),
            SpecKind::Bandpass | SpecKind::Bandstop => {
                let bandwidth = spec.bandwidth.unwrap_or(DEFAULT_BANDWIDTH);
                let denom = if sin_w0.abs() > SIN_EPSILON {
                    sin_w0
                } else {
                    SIN_EPSILON
                };
                let alpha = sin_w0 * (LN_2 / 2.0 * bandwidth * w0 / denom).sinh();
                if spec.kind == SpecKind::Bandpass {
                    Self::normalized(alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
                } else {
                    Self::normalized(
                        1.0,
                        -2.0 * cos_w0,
                        1.0,
                        1.0 + alpha,
                        -2.0 * cos_w0,
                        1.0 - alpha,
                    )
                }
            }
            SpecKind::Notch => Self::normalized(
                1.0,
                -2.0 * cos_w0,
                1.0,
                1.0 + alpha_q,
                -2.0 * cos_w0,
                1.0 - alpha_q,
            ),
            SpecKind::Allpass => Self::normalized(
                1.0 - alpha_q,
                -2.0 * cos_w0,
                1.0 + alpha_q,
                1.0 + alpha_q,
                -2.0 * cos_w0,
                1.0 - alpha_q,
            ),
            SpecKind::Peaking => {
                let a = amplitude(spec);
                Self::normalized(
                    1.0 + alpha_q * a,
                    -2.0 * cos_w0,
                    1.0 - alpha_q * a,
                    1.0 + alpha_q / a,
                    -2.0 * cos_w0,
                    1.0 - alpha_q / a,
                )
            }
            SpecKind::Lowshelf => {
                let a = amplitude(spec);
                let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha_q;
                Self::normalized(
                    a * ((a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                    2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w0),
                    a * ((a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
                    (a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                    -2.0 * ((a - 1.0) + (a + 1.0) * cos_w0),
                    (a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
                )
            }
            SpecKind::Highshelf => {
                let a = amplitude(spec);
                let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha_q;
                Self::normalized(
                    a * ((a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                    -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0),
                    a * ((a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
                    (a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                    2.0 * ((a - 1.0) - (a + 1.0) * cos_w0),
                    (a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
                )
            }
        }
    }

    /// Complex response `H(e^{jw})` at `freq` hertz.
    pub fn response_at(&self, freq: f64, sample_rate: f64) -> Complex64 {
        let w = 2.0 * PI * freq / sample_rate.max(1.0);
        let z1 = Complex64::from_polar(1.0, -w);
        let z2 = z1 * z1;
        let numerator = self.b0 + self.b1 * z1 + self.b2 * z2;
        let denominator = 1.0 + self.a1 * z1 + self.a2 * z2;
        numerator / denominator
    }

    /// Linear magnitude and phase in radians at `freq` hertz.
    ///
    /// A phase that cannot be determined (for example `0/0` exactly at a
    /// zero on the unit circle) is reported as zero.
    pub fn magnitude_phase(&self, freq: f64, sample_rate: f64) -> (f64, f64) {
        let h = self.response_at(freq, sample_rate);
        let magnitude = h.norm();
        let phase = h.arg();
        (magnitude, if phase.is_finite() { phase } else { 0.0 })
    }
}

/// Square root of the linear gain, the `A` of the cookbook formulas.
fn amplitude(spec: &FilterSpec) -> f64 {
    10f64.powf(spec.gain_db.unwrap_or(0.0) / 40.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: f64 = 48_000.0;

    fn magnitude(spec: FilterSpec, freq: f64) -> f64 {
        BiquadCoefficients::design(&spec, FS)
            .magnitude_phase(freq, FS)
            .0
    }

    #[test]
    fn lowpass_passes_dc_and_is_3db_down_at_cutoff() {
        let spec = FilterSpec::with_q(SpecKind::Lowpass, 1000.0, DEFAULT_Q);
        assert!((magnitude(spec, 1.0) - 1.0).abs() < 1e-6);
        assert!((magnitude(spec, 1000.0) - DEFAULT_Q).abs() < 1e-6);
        assert!(magnitude(spec, 15_000.0) < 0.01);
    }

    #[test]
    fn highpass_blocks_dc() {
        let spec = FilterSpec::with_q(SpecKind::Highpass, 1000.0, DEFAULT_Q);
        assert!(magnitude(spec, 5.0) < 1e-3);
        assert!((magnitude(spec, 20_000.0) - 1.0).abs() < 0.01);
    }

    #[test]
    fn peaking_hits_its_gain_at_centre() {
        let spec = FilterSpec::with_gain(SpecKind::Peaking, 2000.0, 1.0, 6.0);
        let expected = 10f64.powf(6.0 / 20.0);
        assert!((magnitude(spec, 2000.0) - expected).abs() < 1e-9);
        assert!((magnitude(spec, 20.0) - 1.0).abs() < 1e-3);
    }

    #[test]
    fn shelves_reach_their_gain_far_from_corner() {
        let low = FilterSpec::with_gain(SpecKind::Lowshelf, 200.0, DEFAULT_Q, -12.0);
        let high = FilterSpec::with_gain(SpecKind::Highshelf, 2000.0, DEFAULT_Q, 12.0);
        let gain = 10f64.powf(12.0 / 20.0);
        assert!((magnitude(low, 2.0) - 1.0 / gain).abs() < 1e-3);
        assert!((magnitude(high, 23_000.0) - gain).abs() < 0.01);
    }

    #[test]
    fn notch_nulls_centre_and_allpass_is_flat() {
        let notch = FilterSpec::with_q(SpecKind::Notch, 1000.0, 2.0);
        assert!(magnitude(notch, 1000.0) < 1e-9);
        let allpass = FilterSpec::with_q(SpecKind::Allpass, 1000.0, 2.0);
        for freq in [20.0, 500.0, 1000.0, 9000.0] {
            assert!((magnitude(allpass, freq) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn bandpass_peaks_at_unity() {
        let spec = FilterSpec::with_bandwidth(SpecKind::Bandpass, 1000.0, 1.0);
        assert!((magnitude(spec, 1000.0) - 1.0).abs() < 1e-9);
        assert!(magnitude(spec, 50.0) < 0.1);
    }

    #[test]
    fn centre_frequency_saturates_at_nyquist() {
        let above = FilterSpec::with_q(SpecKind::Lowpass, 40_000.0, DEFAULT_Q);
        let at = FilterSpec::with_q(SpecKind::Lowpass, FS / 2.0, DEFAULT_Q);
        assert_eq!(
            BiquadCoefficients::design(&above, FS),
            BiquadCoefficients::design(&at, FS)
        );
    }

    #[test]
    fn identity_is_transparent() {
        let (magnitude, phase) = BiquadCoefficients::IDENTITY.magnitude_phase(1234.0, FS);
        assert!((magnitude - 1.0).abs() < 1e-12);
        assert!(phase.abs() < 1e-12);
    }
}
