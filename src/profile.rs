//! Beam field amplitude via angular-spectrum integration
//!
//! `BeamProfile` composes a spectral model with the plane-wave phase and
//! integrates sin(theta) * cos(theta) * f(theta, phi) * exp(i * phase) over
//! phi in [0, 2pi], theta in [0, pi/2], scaled by k^2. One evaluation per
//! source pixel; calls are pure and safe to issue concurrently.

use std::f64::consts::{FRAC_PI_2, PI};

use nalgebra::Vector3;
use num_complex::Complex64;

use crate::integrate::{IntegrationResult, Quadrature};
use crate::spectrum::Spectrum;
use crate::{BeamError, Parameters};

/// Phase accumulated by a plane wave of wavenumber `k` propagating in the
/// direction (theta, phi), projected onto the displacement (x, y, z).
///
/// phase = k * (sin(theta) * (y*sin(phi) - z*cos(phi)) + cos(theta) * x)
pub fn phase(theta: f64, phi: f64, x: f64, y: f64, z: f64, k: f64) -> f64 {
    let (sin_theta, cos_theta) = theta.sin_cos();
    let (sin_phi, cos_phi) = phi.sin_cos();
    k * (sin_theta * (y * sin_phi - z * cos_phi) + cos_theta * x)
}

/// Field amplitude function for one beam configuration.
///
/// Holds the immutable parameters, the resolved spectral variant and the
/// longitudinal source shift. No state is mutated after construction, so a
/// grid sampler may evaluate many points from worker threads.
#[derive(Debug, Clone)]
pub struct BeamProfile {
    x: f64,
    params: Parameters,
    spectrum: Spectrum,
    quadrature: Quadrature,
}

impl BeamProfile {
    /// Create a profile for the given longitudinal shift and parameters.
    ///
    /// Validates the parameters up front; invalid configurations (k <= 0,
    /// non-positive waist) are rejected here rather than surfacing as a
    /// degenerate quadrature on first use.
    pub fn new(x: f64, params: Parameters) -> Result<Self, BeamError> {
        params.validate()?;
        let spectrum = Spectrum::for_params(&params);
        tracing::info!(
            family = ?params.family,
            k = params.k,
            w_y = params.w_y,
            "calculating initial field configuration, this will take some time"
        );
        Ok(Self {
            x,
            params,
            spectrum,
            quadrature: Quadrature::default(),
        })
    }

    /// Same as [`BeamProfile::new`] with explicit quadrature settings.
    pub fn with_quadrature(
        x: f64,
        params: Parameters,
        quadrature: Quadrature,
    ) -> Result<Self, BeamError> {
        let mut profile = Self::new(x, params)?;
        profile.quadrature = quadrature;
        Ok(profile)
    }

    /// Beam parameters this profile was built with.
    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Longitudinal source shift.
    pub fn shift(&self) -> f64 {
        self.x
    }

    /// Complex field amplitude at the evaluation point.
    ///
    /// The transverse coordinates come from `point.y` and `point.z`; the
    /// longitudinal coordinate of the phase is the construction-time shift.
    pub fn amplitude(&self, point: &Vector3<f64>) -> Result<Complex64, BeamError> {
        Ok(self.evaluate(point)?.value)
    }

    /// Full integration result (amplitude plus per-part error estimates),
    /// scaled by the k^2 spectral normalization.
    pub fn evaluate(&self, point: &Vector3<f64>) -> Result<IntegrationResult, BeamError> {
        let k = self.params.k;
        let (x, y, z) = (self.x, point.y, point.z);

        let integrand = |theta: f64, phi: f64| -> Complex64 {
            let (sin_theta, cos_theta) = theta.sin_cos();
            let weight = sin_theta * cos_theta;
            let spectral = self.spectrum.amplitude(sin_theta, theta, phi);
            let propagator = Complex64::new(0.0, phase(theta, phi, x, y, z, k)).exp();
            weight * spectral * propagator
        };

        let raw = self
            .quadrature
            .complex_dblquad(integrand, 0.0, 2.0 * PI, |_| 0.0, |_| FRAC_PI_2)?;

        let scale = k * k;
        Ok(IntegrationResult {
            value: scale * raw.value,
            real_error: scale * raw.real_error,
            imag_error: scale * raw.imag_error,
        })
    }
}
