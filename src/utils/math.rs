use std::f64::consts::PI;

/// Sampled N-dimensional Gaussian density at squared distance `dist2` from the centre.
///
/// The normalisation coefficient is the continuous one, `1 / (2πσ²)^(N/2)`, so a
/// sampled kernel does not sum to exactly 1.
pub fn gaussian(dist2: f64, sigma: f64, dim: usize) -> f64 {
    let sig2 = 2.0 * sigma * sigma;
    let coef = 1.0 / (PI * sig2).powf(dim as f64 / 2.0);
    coef * (-dist2 / sig2).exp()
}

/// Round to nearest, ties to even (C `rint` under the default rounding mode)
pub fn rint(v: f64) -> f64 {
    v.round_ties_even()
}

pub fn round_up(value: usize, align: usize) -> usize {
    debug_assert!(align > 0);
    value.div_ceil(align) * align
}

#[cfg(test)]
mod tests {
    use super::{gaussian, rint, round_up};

    #[test]
    fn gaussian_peak_matches_coefficient() {
        let sigma = 1.5;
        let peak_1d = gaussian(0.0, sigma, 1);
        assert!((peak_1d - 1.0 / (sigma * (2.0 * std::f64::consts::PI).sqrt())).abs() < 1e-12);

        let peak_2d = gaussian(0.0, sigma, 2);
        assert!((peak_2d - 1.0 / (2.0 * std::f64::consts::PI * sigma * sigma)).abs() < 1e-12);

        assert!(gaussian(4.0, sigma, 2) < peak_2d);
    }

    #[test]
    fn gaussian_3d_coefficient() {
        let two_pi = 2.0 * std::f64::consts::PI;
        assert!((gaussian(0.0, 1.0, 3) - 1.0 / two_pi.powf(1.5)).abs() < 1e-12);

        let sigma = 2.0f64;
        let peak = gaussian(0.0, sigma, 3);
        assert!((peak - 1.0 / (two_pi.powf(1.5) * sigma.powi(3))).abs() < 1e-12);
        // separable: the 3D density is the product of three 1D ones
        let d1 = gaussian(1.0, sigma, 1);
        let d3 = gaussian(3.0, sigma, 3);
        assert!((d3 - d1 * d1 * d1).abs() < 1e-15);
    }

    #[test]
    fn rint_rounds_half_to_even() {
        assert_eq!(rint(0.5), 0.0);
        assert_eq!(rint(1.5), 2.0);
        assert_eq!(rint(2.5), 2.0);
        assert_eq!(rint(-0.5), -0.0);
        assert_eq!(rint(0.75), 1.0);
    }

    #[test]
    fn round_up_to_alignment() {
        assert_eq!(round_up(0, 4), 0);
        assert_eq!(round_up(5, 4), 8);
        assert_eq!(round_up(8, 4), 8);
        assert_eq!(round_up(7, 1), 7);
    }
}
