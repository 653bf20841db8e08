//! beamprofile: vortex beam source amplitudes for MEEP FDTD simulations
//!
//! This crate provides:
//! - Complex double quadrature of angular plane-wave spectra
//! - Gaussian, Laguerre-Gauss and Bessel beam spectral models
//! - A per-point field amplitude function suitable as a MEEP `amp_func`
//! - Grid sampling of source amplitudes and MEEP Python script generation
//!
//! The field amplitude at a point is the angular-spectrum integral
//! k^2 * int sin(theta) cos(theta) f(theta, phi) exp(i*phase) dtheta dphi
//! over phi in [0, 2pi] and theta in [0, pi/2]. The external FDTD solver
//! consumes the result as a source amplitude; time stepping, geometry and
//! field output stay on the solver side.

pub mod codegen;
pub mod grid;
pub mod integrate;
pub mod profile;
pub mod spectrum;

pub use codegen::{generate_meep_script, DerivedParameters, SimulationConfig};
pub use grid::{sample_source_grid, GridExtent, SourceGrid};
pub use integrate::{
    complex_dblquad, IntegrationError, IntegrationErrorKind, IntegrationResult, Quadrature,
};
pub use profile::{phase, BeamProfile};
pub use spectrum::Spectrum;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Beam family selector. Laguerre-Gauss with order 0 degenerates to the
/// plain Gaussian spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeamFamily {
    #[default]
    Gauss,
    LaguerreGauss,
    Bessel,
}

/// Physical beam parameters, fixed for the lifetime of a [`BeamProfile`].
///
/// A flat key-value record: deserializable from a flat JSON object such as
/// `{"w_y": 0.2546, "k": 31.4159, "m": 2, "family": "laguerre_gauss"}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Beam waist W_y (> 0).
    pub w_y: f64,
    /// Wavenumber k (> 0).
    pub k: f64,
    /// Orbital angular momentum order (m for Laguerre-Gauss, n for Bessel).
    /// Negative orders flip the winding handedness.
    #[serde(default)]
    pub m: i32,
    /// Axicon angle theta_B in radians (Bessel family only).
    #[serde(default)]
    pub theta_b: f64,
    /// Beam family.
    #[serde(default)]
    pub family: BeamFamily,
}

impl Parameters {
    /// Reject configurations the quadrature would silently turn into NaN:
    /// non-positive wavenumber or waist, axicon angle outside [0, pi/2).
    pub fn validate(&self) -> Result<(), BeamError> {
        if !(self.k > 0.0) || !self.k.is_finite() {
            return Err(BeamError::Configuration(format!(
                "wavenumber k must be positive and finite, got {}",
                self.k
            )));
        }
        if !(self.w_y > 0.0) || !self.w_y.is_finite() {
            return Err(BeamError::Configuration(format!(
                "beam waist w_y must be positive and finite, got {}",
                self.w_y
            )));
        }
        if self.family == BeamFamily::Bessel
            && !(0.0..std::f64::consts::FRAC_PI_2).contains(&self.theta_b)
        {
            return Err(BeamError::Configuration(format!(
                "axicon angle theta_b must lie in [0, pi/2), got {}",
                self.theta_b
            )));
        }
        Ok(())
    }
}

/// Error taxonomy for beam construction and evaluation.
#[derive(Debug, Clone, Error)]
pub enum BeamError {
    /// Missing or invalid parameter, detected at construction time.
    #[error("invalid beam configuration: {0}")]
    Configuration(String),
    /// A partial quadrature failed to converge or hit a domain error.
    /// Surfaces immediately; no partial result is returned.
    #[error("integration failed: {0}")]
    Integration(#[from] IntegrationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters_from_flat_json() {
        let params: Parameters = serde_json::from_str(
            r#"{"w_y": 0.2546, "k": 31.4159, "m": 2, "family": "laguerre_gauss"}"#,
        )
        .unwrap();
        assert_eq!(params.m, 2);
        assert_eq!(params.family, BeamFamily::LaguerreGauss);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_defaults_give_gauss() {
        let params: Parameters = serde_json::from_str(r#"{"w_y": 0.25, "k": 10.0}"#).unwrap();
        assert_eq!(params.family, BeamFamily::Gauss);
        assert_eq!(params.m, 0);
    }

    #[test]
    fn test_validation_rejects_bad_parameters() {
        let base = Parameters {
            w_y: 0.25,
            k: 10.0,
            m: 0,
            theta_b: 0.0,
            family: BeamFamily::Gauss,
        };

        let zero_k = Parameters { k: 0.0, ..base };
        assert!(matches!(
            zero_k.validate(),
            Err(BeamError::Configuration(_))
        ));

        let bad_waist = Parameters { w_y: -1.0, ..base };
        assert!(bad_waist.validate().is_err());

        let bad_axicon = Parameters {
            family: BeamFamily::Bessel,
            theta_b: 2.0,
            ..base
        };
        assert!(bad_axicon.validate().is_err());
    }
}
