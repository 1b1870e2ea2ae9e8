//! Conversions between linear magnitude and decibels.

use std::f64::consts::LN_10;

use crate::Decibels;

/// Smallest linear magnitude accepted before conversion to decibels.
///
/// Anything at or below this value (including zero, negative and `NaN`
/// magnitudes) converts to -200 dB instead of `-inf`.
pub const MAGNITUDE_FLOOR: f64 = 1e-10;

/// Converts a linear magnitude to decibels, flooring at [`MAGNITUDE_FLOOR`].
#[inline]
pub fn gain_to_db(gain: f64) -> Decibels {
    let floored = if gain > MAGNITUDE_FLOOR {
        gain
    } else {
        MAGNITUDE_FLOOR
    };
    20.0 * floored.log10()
}

/// Converts decibels to a linear magnitude.
#[inline]
pub fn db_to_gain(db: Decibels) -> f64 {
    if db == f64::NEG_INFINITY {
        0.0
    } else {
        (db * LN_10 / 20.0).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gain_roundtrip() {
        let values = [0.1, 0.5, 1.0, 2.0, 10.0];
        for value in values {
            let db = gain_to_db(value);
            let round = db_to_gain(db);
            assert!((round - value).abs() < 1e-12);
        }
    }

    #[test]
    fn singular_magnitudes_are_floored() {
        assert_eq!(gain_to_db(0.0), -200.0);
        assert_eq!(gain_to_db(-1.0), -200.0);
        assert_eq!(gain_to_db(f64::NAN), -200.0);
        assert!(gain_to_db(1e-12).is_finite());
    }
}
