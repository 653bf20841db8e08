//! MEEP Python script generation
//!
//! Emits a runnable MEEP simulation script for a beam scattering at a planar
//! dielectric interface. The source amplitude comes from a grid sampled by
//! this crate: the script loads the JSON grid and bilinearly interpolates it
//! as the source `amp_func`, so the heavy per-pixel integration never runs
//! on the Python side.

use anyhow::Result;
use minijinja::{context, Environment};

use crate::BeamError;

const MEEP_TEMPLATE: &str = r##"#!/usr/bin/env python3
"""
MEEP FDTD simulation - beam scattering at a planar dielectric interface
{{ header_comment }}

Generated: {{ timestamp }}

The source amplitude grid was precomputed by beamprofile and is loaded from
{{ grid_path }}. Run with e.g.:

    mpirun -quiet -np 8 python3 this_script.py
"""

import json
import math

import meep as mp
import numpy as np

# =============================================================================
# Simulation parameters (MEEP normalized units)
# =============================================================================

SX = {{ "%.6f"|format(sx) }}               # cell size including PML, x
SY = {{ "%.6f"|format(sy) }}               # cell size including PML, y
PML_THICKNESS = {{ "%.6f"|format(pml_thickness) }}
FREQ = {{ "%.6f"|format(freq) }}           # vacuum frequency of the source
RUNTIME = {{ "%.6f"|format(runtime) }}     # simulation time in periods of FREQ
RESOLUTION = {{ "%.6f"|format(resolution) }}
COURANT = {{ "%.6f"|format(courant) }}

N1 = {{ "%.6f"|format(n1) }}               # index of the incident medium
N2 = {{ "%.6f"|format(n2) }}               # index of the refracted medium
CHI_RAD = {{ "%.9f"|format(chi_rad) }}     # angle of incidence
SOURCE_SHIFT = {{ "%.6f"|format(source_shift) }}
S_POL = {{ s_pol }}

GRID_PATH = "{{ grid_path }}"


# =============================================================================
# Precomputed source amplitude grid
# =============================================================================

with open(GRID_PATH) as fh:
    _grid = json.load(fh)

_ext = _grid["extent"]
_NY, _NZ = _ext["ny"], _ext["nz"]
_RE = np.array(_grid["re"]).reshape(_NZ, _NY)
_IM = np.array(_grid["im"]).reshape(_NZ, _NY)


def amp_func(r):
    """Bilinear interpolation of the precomputed complex amplitude."""
    fy = (r.y - _ext["y_min"]) / (_ext["y_max"] - _ext["y_min"]) * (_NY - 1)
    fz = (r.z - _ext["z_min"]) / (_ext["z_max"] - _ext["z_min"]) * (_NZ - 1)
    fy = min(max(fy, 0.0), _NY - 1)
    fz = min(max(fz, 0.0), _NZ - 1)
    iy, iz = int(fy), int(fz)
    jy, jz = min(iy + 1, _NY - 1), min(iz + 1, _NZ - 1)
    ty, tz = fy - iy, fz - iz

    def lerp2(a):
        top = a[iz, iy] * (1 - ty) + a[iz, jy] * ty
        bot = a[jz, iy] * (1 - ty) + a[jz, jy] * ty
        return top * (1 - tz) + bot * tz

    return complex(lerp2(_RE), lerp2(_IM))


# =============================================================================
# Geometry: inclined dielectric interface
# =============================================================================

def alpha(chi_rad):
    """Angle of the inclined plane with the y-axis in radians."""
    return math.pi / 2 - chi_rad


def delta_x(alpha):
    """Inclined plane offset to the center of the cell."""
    sin_alpha = math.sin(alpha)
    cos_alpha = math.cos(alpha)
    return (SX / 2) * (((math.sqrt(2) - cos_alpha) - sin_alpha) / sin_alpha)


cell = mp.Vector3(SX, SY, 0)
default_material = mp.Medium(index=N1)
geometry = [mp.Block(mp.Vector3(mp.inf, SX * math.sqrt(2), mp.inf),
                     center=mp.Vector3(+SX / 2 + delta_x(alpha(CHI_RAD)),
                                       -SY / 2),
                     e1=mp.Vector3(1 / math.tan(alpha(CHI_RAD)), 1, 0),
                     e2=mp.Vector3(-1, 1 / math.tan(alpha(CHI_RAD)), 0),
                     e3=mp.Vector3(0, 0, 1),
                     material=mp.Medium(index=N2))]

pml_layers = [mp.PML(PML_THICKNESS)]


# =============================================================================
# Source and simulation
# =============================================================================

sources = [mp.Source(src=mp.ContinuousSource(frequency=FREQ, width=0.5),
                     component=mp.Ez if S_POL else mp.Ey,
                     size=mp.Vector3(0, SY - 2 * PML_THICKNESS, 0),
                     center=mp.Vector3(SOURCE_SHIFT, 0, 0),
                     amp_func=amp_func)]

sim = mp.Simulation(cell_size=cell,
                    boundary_layers=pml_layers,
                    default_material=default_material,
                    Courant=COURANT,
                    geometry=geometry,
                    sources=sources,
                    resolution=RESOLUTION)

sim.use_output_directory()


def e_squared(r, ex, ey, ez):
    """|E|^2 at a point."""
    return mp.Vector3(ex, ey, ez).norm() ** 2


def output_efield2(sim):
    """Output E-field intensity."""
    name = "e2_s" if S_POL else "e2_p"
    return sim.output_field_function(name, [mp.Ex, mp.Ey, mp.Ez], e_squared,
                                     real_only=True)


sim.run(mp.at_beginning(mp.output_epsilon),
        mp.at_end(mp.output_efield_z if S_POL else mp.output_efield_y),
        mp.at_end(output_efield2),
        until=RUNTIME)
"##;

/// Driver-supplied simulation constants. These belong to the FDTD setup, not
/// to the beam core; defaults follow the reference scattering scripts.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Cell size including PML, x direction.
    pub sx: f64,
    /// Cell size including PML, y direction.
    pub sy: f64,
    /// PML layer thickness.
    pub pml_thickness: f64,
    /// Vacuum frequency of the source (4 to 12 is good).
    pub freq: f64,
    /// Simulation runtime in periods of `freq`.
    pub runtime: f64,
    /// Pixels per wavelength in the denser medium (20 to 30 is a good choice).
    pub pixel: f64,
    /// Index of refraction of the incident medium.
    pub n1: f64,
    /// Index of refraction of the refracted medium.
    pub n2: f64,
    /// Angle of incidence in degrees.
    pub chi_deg: f64,
    /// True for s-polarisation, false for p-polarisation.
    pub s_pol: bool,
    /// Reference medium for the dimensionless inputs:
    /// 0 - free space, 1 - incident medium, 2 - refracted medium.
    pub ref_medium: u8,
    /// Dimensionless beam width k*w_0.
    pub kw_0: f64,
    /// Dimensionless waist distance to the interface k*r_w.
    pub kr_w: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let sx = 10.0;
        let pml_thickness = 0.25;
        Self {
            sx,
            sy: 10.0,
            pml_thickness,
            freq: 12.0,
            runtime: 90.0,
            pixel: 15.0,
            n1: 1.0,
            n2: 0.65,
            chi_deg: 45.0,
            s_pol: true,
            ref_medium: 0,
            kw_0: 7.0,
            kr_w: 0.0,
        }
    }
}

/// MEEP quantities derived from a [`SimulationConfig`].
#[derive(Debug, Clone, Copy)]
pub struct DerivedParameters {
    /// Vacuum wavenumber 2*pi*freq.
    pub k_vac: f64,
    /// Wavenumber in the incident medium.
    pub k1: f64,
    /// Beam waist in MEEP length units.
    pub w_0: f64,
    /// Waist distance to the interface in MEEP length units.
    pub r_w: f64,
    /// Source position relative to the cell center.
    pub source_shift: f64,
    /// Longitudinal shift of the waist relative to the source plane.
    pub shift: f64,
    /// Grid resolution in pixels per length unit.
    pub resolution: f64,
    /// Courant factor (mandatory if either index is below 1).
    pub courant: f64,
}

impl SimulationConfig {
    /// Compute the derived MEEP parameters, as the reference driver does.
    pub fn derive(&self) -> Result<DerivedParameters, BeamError> {
        let k_vac = 2.0 * std::f64::consts::PI * self.freq;
        let k1 = self.n1 * k_vac;

        let n_ref = match self.ref_medium {
            0 => 1.0,
            1 => self.n1,
            2 => self.n2,
            other => {
                return Err(BeamError::Configuration(format!(
                    "reference medium must be 0, 1 or 2, got {other}"
                )))
            }
        };

        let w_0 = self.kw_0 / (n_ref * k_vac);
        let r_w = self.kr_w / (n_ref * k_vac);
        let source_shift = -0.4 * (self.sx - 2.0 * self.pml_thickness);
        let shift = source_shift + r_w;

        let denser = if self.n1 > self.n2 { self.n1 } else { self.n2 };
        let rarer = if self.n1 < self.n2 { self.n1 } else { self.n2 };

        Ok(DerivedParameters {
            k_vac,
            k1,
            w_0,
            r_w,
            source_shift,
            shift,
            resolution: self.pixel * denser * self.freq,
            courant: rarer / 2.0,
        })
    }
}

/// Render the MEEP Python script for the given setup.
///
/// `grid_path` is the JSON file the companion [`crate::SourceGrid`] was
/// written to; the script interpolates it as the source amplitude.
pub fn generate_meep_script(
    config: &SimulationConfig,
    derived: &DerivedParameters,
    grid_path: &str,
    header_comment: &str,
) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("meep", MEEP_TEMPLATE)?;
    let template = env.get_template("meep")?;

    let output = template.render(context! {
        header_comment => header_comment,
        timestamp => chrono::Utc::now().to_rfc3339(),
        grid_path => grid_path,
        sx => config.sx,
        sy => config.sy,
        pml_thickness => config.pml_thickness,
        freq => config.freq,
        runtime => config.runtime,
        resolution => derived.resolution,
        courant => derived.courant,
        n1 => config.n1,
        n2 => config.n2,
        chi_rad => config.chi_deg.to_radians(),
        source_shift => derived.source_shift,
        s_pol => if config.s_pol { "True" } else { "False" },
    })?;

    Ok(output)
}
