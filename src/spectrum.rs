//! Plane-wave spectral amplitudes for the supported beam families
//!
//! The angular-spectrum representation writes the beam as a superposition of
//! plane waves over (theta, phi). Each family assigns a complex weight to a
//! propagation direction. The variant is resolved once from the parameters;
//! per-call evaluation never branches on configuration.

use num_complex::Complex64;

use crate::{BeamFamily, Parameters};

/// Spectral amplitude model, fixed at construction time.
///
/// Constants derived from the physical parameters (the half-product k*W_y/2,
/// the axicon ring position) are precomputed into the variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Spectrum {
    /// Finite-waist Gaussian angular spectrum, azimuthally isotropic.
    Gauss { half_kw: f64 },
    /// Gaussian envelope with orbital angular momentum winding of order m.
    LaguerreGauss { half_kw: f64, m: i32 },
    /// Narrow ring concentrated at the axicon angle, winding of order n.
    Bessel { half_kw: f64, n: i32, sin_theta_b: f64 },
}

impl Spectrum {
    /// Resolve the spectral variant for the given parameters.
    ///
    /// Laguerre-Gauss with m = 0 carries no winding and resolves to the
    /// plain Gaussian spectrum.
    pub fn for_params(params: &Parameters) -> Self {
        let half_kw = 0.5 * params.k * params.w_y;
        match params.family {
            BeamFamily::Gauss => Spectrum::Gauss { half_kw },
            BeamFamily::LaguerreGauss if params.m == 0 => Spectrum::Gauss { half_kw },
            BeamFamily::LaguerreGauss => Spectrum::LaguerreGauss {
                half_kw,
                m: params.m,
            },
            BeamFamily::Bessel => Spectrum::Bessel {
                half_kw,
                n: params.m,
                sin_theta_b: params.theta_b.sin(),
            },
        }
    }

    /// Complex spectral amplitude for the plane-wave direction (theta, phi).
    ///
    /// `sin_theta` is passed alongside `theta` because every caller already
    /// has it from the surface-element factor.
    pub fn amplitude(&self, sin_theta: f64, theta: f64, phi: f64) -> Complex64 {
        match *self {
            Spectrum::Gauss { half_kw } => {
                Complex64::new(gauss_envelope(half_kw, sin_theta), 0.0)
            }
            Spectrum::LaguerreGauss { half_kw, m } => {
                let envelope = gauss_envelope(half_kw, sin_theta) * theta.powi(m.abs());
                envelope * winding(m, phi)
            }
            Spectrum::Bessel {
                half_kw,
                n,
                sin_theta_b,
            } => {
                let envelope = gauss_envelope(half_kw, sin_theta - sin_theta_b);
                envelope * winding(n, phi)
            }
        }
    }
}

/// Gaussian envelope exp(-(k*W_y*s/2)^2) evaluated at s.
#[inline]
fn gauss_envelope(half_kw: f64, s: f64) -> f64 {
    (-(half_kw * s).powi(2)).exp()
}

/// Azimuthal phase factor exp(i*m*phi).
#[inline]
fn winding(m: i32, phi: f64) -> Complex64 {
    Complex64::new(0.0, f64::from(m) * phi).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn params(family: BeamFamily, m: i32) -> Parameters {
        Parameters {
            w_y: 0.2546,
            k: 31.4159,
            m,
            theta_b: 0.35,
            family,
        }
    }

    #[test]
    fn test_laguerre_gauss_order_zero_is_gauss() {
        let lg = Spectrum::for_params(&params(BeamFamily::LaguerreGauss, 0));
        let gauss = Spectrum::for_params(&params(BeamFamily::Gauss, 0));
        assert_eq!(lg, gauss);

        // The formulas agree at every sampled direction, exactly.
        for i in 0..32 {
            let theta = PI / 2.0 * i as f64 / 31.0;
            for j in 0..8 {
                let phi = 2.0 * PI * j as f64 / 8.0;
                assert_eq!(
                    lg.amplitude(theta.sin(), theta, phi),
                    gauss.amplitude(theta.sin(), theta, phi)
                );
            }
        }
    }

    #[test]
    fn test_gauss_is_azimuthally_isotropic() {
        let gauss = Spectrum::for_params(&params(BeamFamily::Gauss, 0));
        let theta = 0.7_f64;
        let reference = gauss.amplitude(theta.sin(), theta, 0.0);
        for j in 1..16 {
            let phi = 2.0 * PI * j as f64 / 16.0;
            assert_eq!(gauss.amplitude(theta.sin(), theta, phi), reference);
        }
    }

    #[test]
    fn test_winding_periodicity() {
        let lg = Spectrum::for_params(&params(BeamFamily::LaguerreGauss, 3));
        let bessel = Spectrum::for_params(&params(BeamFamily::Bessel, 2));
        let theta = 0.4_f64;
        for j in 0..8 {
            let phi = 2.0 * PI * j as f64 / 8.0 - PI;
            for spec in [&lg, &bessel] {
                let a = spec.amplitude(theta.sin(), theta, phi);
                let b = spec.amplitude(theta.sin(), theta, phi + 2.0 * PI);
                assert!((a - b).norm() < 1e-12);
            }
        }
    }

    #[test]
    fn test_envelope_magnitude_is_phi_invariant() {
        let lg = Spectrum::for_params(&params(BeamFamily::LaguerreGauss, 2));
        let theta = 0.9_f64;
        let reference = lg.amplitude(theta.sin(), theta, 0.3).norm();
        for j in 0..12 {
            let phi = 2.0 * PI * j as f64 / 12.0;
            assert!((lg.amplitude(theta.sin(), theta, phi).norm() - reference).abs() < 1e-12);
        }
    }

    #[test]
    fn test_bessel_ring_peaks_at_axicon_angle() {
        let bessel = Spectrum::for_params(&params(BeamFamily::Bessel, 0));
        let theta_b = 0.35_f64;
        let on_ring = bessel.amplitude(theta_b.sin(), theta_b, 0.0).norm();
        let off_ring = bessel.amplitude((theta_b + 0.2).sin(), theta_b + 0.2, 0.0).norm();
        assert!((on_ring - 1.0).abs() < 1e-12);
        assert!(off_ring < on_ring);
    }

    #[test]
    fn test_negative_order_conjugates_winding() {
        let plus = Spectrum::for_params(&params(BeamFamily::LaguerreGauss, 2));
        let minus = Spectrum::for_params(&params(BeamFamily::LaguerreGauss, -2));
        let theta = 0.5_f64;
        let phi = 1.1_f64;
        let a = plus.amplitude(theta.sin(), theta, phi);
        let b = minus.amplitude(theta.sin(), theta, phi);
        assert!((a - b.conj()).norm() < 1e-12);
    }
}
