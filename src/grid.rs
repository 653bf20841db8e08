//! Source-grid sampling of beam amplitudes
//!
//! The FDTD solver needs one complex amplitude per source pixel. Every
//! evaluation is pure and independent, so rows are dispatched across worker
//! threads; the first integration failure aborts the run.

use nalgebra::Vector3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::profile::BeamProfile;
use crate::BeamError;

/// Rectangular (y, z) sampling window for the source plane.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GridExtent {
    pub y_min: f64,
    pub y_max: f64,
    /// Number of samples along y (>= 2).
    pub ny: usize,
    pub z_min: f64,
    pub z_max: f64,
    /// Number of samples along z (>= 2).
    pub nz: usize,
}

impl GridExtent {
    /// Centered square window with the same pixel count per axis.
    pub fn square(half_width: f64, n: usize) -> Self {
        Self {
            y_min: -half_width,
            y_max: half_width,
            ny: n,
            z_min: -half_width,
            z_max: half_width,
            nz: n,
        }
    }

    fn validate(&self) -> Result<(), BeamError> {
        if self.ny < 2 || self.nz < 2 {
            return Err(BeamError::Configuration(format!(
                "grid needs at least 2 samples per axis, got {}x{}",
                self.ny, self.nz
            )));
        }
        if !(self.y_max > self.y_min) || !(self.z_max > self.z_min) {
            return Err(BeamError::Configuration(
                "grid extent is empty or inverted".to_string(),
            ));
        }
        Ok(())
    }

    /// y coordinate of column `iy`.
    pub fn y_at(&self, iy: usize) -> f64 {
        self.y_min + (self.y_max - self.y_min) * iy as f64 / (self.ny - 1) as f64
    }

    /// z coordinate of row `iz`.
    pub fn z_at(&self, iz: usize) -> f64 {
        self.z_min + (self.z_max - self.z_min) * iz as f64 / (self.nz - 1) as f64
    }
}

/// Sampled complex source amplitudes, row-major (z rows, y columns).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceGrid {
    pub extent: GridExtent,
    /// Real part per pixel.
    pub re: Vec<f64>,
    /// Imaginary part per pixel.
    pub im: Vec<f64>,
    /// |amplitude|^2 per pixel.
    pub intensity: Vec<f64>,
}

impl SourceGrid {
    /// Flat index of pixel (iy, iz).
    pub fn index(&self, iy: usize, iz: usize) -> usize {
        iz * self.extent.ny + iy
    }

    /// Peak intensity over the grid.
    pub fn peak_intensity(&self) -> f64 {
        self.intensity.iter().copied().fold(0.0, f64::max)
    }
}

/// Evaluate the beam amplitude at every pixel of the window.
///
/// Rows are sampled in parallel. Fails on the first integration error with
/// no partial grid.
pub fn sample_source_grid(
    profile: &BeamProfile,
    extent: &GridExtent,
) -> Result<SourceGrid, BeamError> {
    extent.validate()?;

    tracing::info!(
        ny = extent.ny,
        nz = extent.nz,
        "sampling source amplitude grid"
    );

    let rows: Vec<Vec<(f64, f64)>> = (0..extent.nz)
        .into_par_iter()
        .map(|iz| {
            let z = extent.z_at(iz);
            (0..extent.ny)
                .map(|iy| {
                    let point = Vector3::new(0.0, extent.y_at(iy), z);
                    let value = profile.amplitude(&point)?;
                    Ok((value.re, value.im))
                })
                .collect::<Result<Vec<_>, BeamError>>()
        })
        .collect::<Result<Vec<_>, BeamError>>()?;

    let n = extent.ny * extent.nz;
    let mut re = Vec::with_capacity(n);
    let mut im = Vec::with_capacity(n);
    let mut intensity = Vec::with_capacity(n);
    for row in rows {
        for (a, b) in row {
            re.push(a);
            im.push(b);
            intensity.push(a * a + b * b);
        }
    }

    Ok(SourceGrid {
        extent: *extent,
        re,
        im,
        intensity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BeamFamily, Parameters};

    fn profile() -> BeamProfile {
        let params = Parameters {
            w_y: 0.3,
            k: 12.0,
            m: 0,
            theta_b: 0.0,
            family: BeamFamily::Gauss,
        };
        BeamProfile::new(0.0, params).unwrap()
    }

    #[test]
    fn test_grid_shape_and_coordinates() {
        let extent = GridExtent::square(1.0, 5);
        assert!((extent.y_at(0) + 1.0).abs() < 1e-12);
        assert!((extent.y_at(4) - 1.0).abs() < 1e-12);
        assert!(extent.z_at(2).abs() < 1e-12);

        let grid = sample_source_grid(&profile(), &extent).unwrap();
        assert_eq!(grid.re.len(), 25);
        assert_eq!(grid.im.len(), 25);
        assert_eq!(grid.intensity.len(), 25);
    }

    #[test]
    fn test_gaussian_grid_peaks_on_axis() {
        let extent = GridExtent::square(0.8, 5);
        let grid = sample_source_grid(&profile(), &extent).unwrap();
        let center = grid.index(2, 2);
        assert!((grid.intensity[center] - grid.peak_intensity()).abs() < 1e-9);
        // Corner pixels sit well off-axis and must be dimmer.
        assert!(grid.intensity[grid.index(0, 0)] < grid.intensity[center]);
    }

    #[test]
    fn test_degenerate_extent_rejected() {
        let extent = GridExtent {
            y_min: 0.0,
            y_max: 0.0,
            ny: 4,
            z_min: -1.0,
            z_max: 1.0,
            nz: 4,
        };
        assert!(sample_source_grid(&profile(), &extent).is_err());

        let too_few = GridExtent::square(1.0, 1);
        assert!(sample_source_grid(&profile(), &too_few).is_err());
    }
}
