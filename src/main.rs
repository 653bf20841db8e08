//! beam-to-meep: CLI tool for sampling vortex beam source grids and
//! generating MEEP FDTD simulation scripts

use anyhow::{Context, Result};
use beamprofile::{
    generate_meep_script, sample_source_grid, BeamFamily, BeamProfile, GridExtent, Parameters,
    SimulationConfig,
};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "beam-to-meep")]
#[command(about = "Sample vortex beam source amplitudes and generate MEEP FDTD simulations")]
#[command(version)]
struct Args {
    /// Beam family (gauss, laguerre-gauss, bessel)
    #[arg(long, default_value = "laguerre-gauss")]
    family: String,

    /// Orbital angular momentum order (m for Laguerre-Gauss, n for Bessel)
    #[arg(short, long, default_value = "2")]
    m: i32,

    /// Axicon angle in degrees (Bessel family)
    #[arg(long, default_value = "20")]
    theta_b: f64,

    /// Dimensionless beam width k*w_0 (>5 is good)
    #[arg(long = "kw0", default_value = "7")]
    kw_0: f64,

    /// Dimensionless beam waist distance to the interface k*r_w
    #[arg(long = "krw", default_value = "0")]
    kr_w: f64,

    /// Vacuum frequency of the source (4 to 12 is good)
    #[arg(long, default_value = "12")]
    freq: f64,

    /// Index of refraction of the incident medium
    #[arg(long, default_value = "1.0")]
    n1: f64,

    /// Index of refraction of the refracted medium
    #[arg(long, default_value = "0.65")]
    n2: f64,

    /// Angle of incidence in degrees
    #[arg(long, default_value = "45")]
    chi: f64,

    /// s-polarisation if true, p-polarisation if false
    #[arg(long, default_value = "true", action = clap::ArgAction::Set)]
    s_pol: bool,

    /// Reference medium: 0 - free space, 1 - incident, 2 - refracted
    #[arg(long, default_value = "0")]
    ref_medium: u8,

    /// Pixels per wavelength in the denser medium
    #[arg(long, default_value = "15")]
    pixel: f64,

    /// Simulation runtime in periods of the source frequency
    #[arg(long, default_value = "90")]
    runtime: f64,

    /// Source grid samples per axis
    #[arg(long, default_value = "101")]
    samples: usize,

    /// Output Python file
    #[arg(short, long, default_value = "beam_sim.py")]
    output: PathBuf,

    /// Output grid JSON file
    #[arg(long, default_value = "beam_grid.json")]
    grid_output: PathBuf,

    /// Print the generated script to stdout instead of a file
    #[arg(long)]
    stdout: bool,
}

fn parse_family(s: &str) -> Result<BeamFamily> {
    match s.to_lowercase().as_str() {
        "gauss" | "gaussian" => Ok(BeamFamily::Gauss),
        "laguerre-gauss" | "laguerre_gauss" | "lg" => Ok(BeamFamily::LaguerreGauss),
        "bessel" => Ok(BeamFamily::Bessel),
        _ => anyhow::bail!("Unknown beam family: {}. Use: gauss, laguerre-gauss, or bessel", s),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let family = parse_family(&args.family)?;

    // FDTD setup constants, kept out of the beam core.
    let config = SimulationConfig {
        freq: args.freq,
        n1: args.n1,
        n2: args.n2,
        chi_deg: args.chi,
        s_pol: args.s_pol,
        ref_medium: args.ref_medium,
        pixel: args.pixel,
        runtime: args.runtime,
        kw_0: args.kw_0,
        kr_w: args.kr_w,
        ..SimulationConfig::default()
    };
    let derived = config.derive().context("Deriving MEEP parameters failed")?;

    let params = Parameters {
        w_y: derived.w_0,
        k: derived.k1,
        m: args.m,
        theta_b: args.theta_b.to_radians(),
        family,
    };

    let profile = BeamProfile::new(derived.shift, params)
        .context("Beam configuration rejected")?;

    // Sample the whole source line extent (the source spans the cell minus
    // the PML layers).
    let half_width = 0.5 * config.sy - config.pml_thickness;
    let extent = GridExtent::square(half_width, args.samples);
    let grid = sample_source_grid(&profile, &extent)
        .context("Sampling the source amplitude grid failed")?;

    let grid_json = serde_json::to_string(&grid).context("Serializing the source grid failed")?;
    fs::write(&args.grid_output, grid_json)
        .with_context(|| format!("Failed to write grid file: {:?}", args.grid_output))?;
    eprintln!("Wrote source grid: {:?}", args.grid_output);

    let header = format!(
        "Beam: {} (order {}), kw_0 = {}, k1 = {:.4}",
        args.family, args.m, args.kw_0, derived.k1
    );
    let script = generate_meep_script(
        &config,
        &derived,
        &args.grid_output.to_string_lossy(),
        &header,
    )
    .context("Script generation failed")?;

    if args.stdout {
        println!("{}", script);
    } else {
        fs::write(&args.output, &script)
            .with_context(|| format!("Failed to write output file: {:?}", args.output))?;
        eprintln!("Generated MEEP script: {:?}", args.output);
    }

    Ok(())
}
