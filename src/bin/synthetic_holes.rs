//! Synthetic Drillhole Dataset Generator
//!
//! Writes a consistent collar / survey / lab table set for exercising
//! `drillhole-trace run` end to end:
//! - collars scattered over a local grid, dipping 45-90° on random bearings
//! - surveys every 30 m with small random deviation between shots
//! - contiguous 1-3 m lab intervals, some running past the last survey shot
//!
//! Column names match the default `[fields]` config.
//!
//! # Usage
//!
//! ```bash
//! synthetic-holes --holes 200 --out data/ --seed 42
//! drillhole-trace run --collars data/collars.csv --surveys data/surveys.csv \
//!     --labs data/labs.csv --out out/
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use rand::prelude::*;
use rand_distr::{Distribution, Normal, Uniform};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "synthetic-holes")]
#[command(about = "Generate a synthetic collar / survey / lab dataset")]
struct Args {
    /// Number of holes
    #[arg(long, default_value = "50")]
    holes: usize,

    /// Output directory
    #[arg(long)]
    out: PathBuf,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Survey shot spacing (m)
    #[arg(long, default_value = "30")]
    spacing: f64,
}

/// One generated hole, angles in the default dip-positive-down convention
struct SyntheticHole {
    id: String,
    x: f64,
    y: f64,
    z: f64,
    dip: f64,
    bearing: f64,
    /// (depth, dip, bearing)
    shots: Vec<(f64, f64, f64)>,
    /// (from, to)
    samples: Vec<(f64, f64)>,
}

struct Generator {
    rng: StdRng,
    /// Shot-to-shot deviation in degrees
    deviation: Normal<f64>,
    spacing: f64,
}

impl Generator {
    fn new(seed: Option<u64>, spacing: f64) -> Result<Self> {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            rng,
            deviation: Normal::new(0.0, 1.5).context("Invalid deviation distribution")?,
            spacing,
        })
    }

    fn hole(&mut self, index: usize) -> SyntheticHole {
        let id = format!("SYN-{:04}", index + 1);
        let x = self.rng.gen_range(500_000.0..505_000.0);
        let y = self.rng.gen_range(7_000_000.0..7_005_000.0);
        let z = self.rng.gen_range(300.0..450.0);
        let dip: f64 = self.rng.gen_range(45.0..=90.0);
        let bearing: f64 = self.rng.gen_range(0.0..360.0);
        let depth: f64 = self.rng.gen_range(80.0..400.0);

        let mut shots = Vec::new();
        let (mut d, mut b) = (dip, bearing);
        let mut md = self.spacing;
        while md <= depth {
            d = (d + self.deviation.sample(&mut self.rng)).clamp(5.0, 90.0);
            b = (b + self.deviation.sample(&mut self.rng)).rem_euclid(360.0);
            shots.push((md, round(d, 2), round(b, 2)));
            md += self.spacing;
        }

        // Samples may run up to 10 m past the last shot
        let sample_len = Uniform::new_inclusive(1.0, 3.0);
        let end = depth + self.rng.gen_range(0.0..10.0);
        let mut samples = Vec::new();
        let mut from = self.rng.gen_range(0.0..20.0_f64).floor();
        while from < end {
            let to = round(from + sample_len.sample(&mut self.rng), 1);
            samples.push((from, to));
            from = to;
        }

        SyntheticHole {
            id,
            x: round(x, 2),
            y: round(y, 2),
            z: round(z, 2),
            dip: round(dip, 2),
            bearing: round(bearing, 2),
            shots,
            samples,
        }
    }
}

fn round(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

fn create(dir: &Path, name: &str) -> Result<BufWriter<File>> {
    let path = dir.join(name);
    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn write_tables(holes: &[SyntheticHole], dir: &Path) -> Result<(usize, usize)> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut collars = create(dir, "collars.csv")?;
    writeln!(collars, "holeID,x,y,z,dip,bearing")?;
    let mut surveys = create(dir, "surveys.csv")?;
    writeln!(surveys, "holeID,length,dip,bearing")?;
    let mut labs = create(dir, "labs.csv")?;
    writeln!(labs, "row_id,holeID,from,to")?;

    let (mut shot_count, mut sample_count) = (0, 0);
    for h in holes {
        writeln!(collars, "{},{},{},{},{},{}", h.id, h.x, h.y, h.z, h.dip, h.bearing)?;
        for (md, dip, bearing) in &h.shots {
            writeln!(surveys, "{},{},{},{}", h.id, md, dip, bearing)?;
            shot_count += 1;
        }
        for (from, to) in &h.samples {
            sample_count += 1;
            writeln!(labs, "{},{},{},{}", sample_count, h.id, from, to)?;
        }
    }
    collars.flush()?;
    surveys.flush()?;
    labs.flush()?;
    Ok((shot_count, sample_count))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    anyhow::ensure!(
        args.spacing.is_finite() && args.spacing > 0.0,
        "--spacing must be a positive number of metres"
    );

    let mut generator = Generator::new(args.seed, args.spacing)?;
    let holes: Vec<SyntheticHole> = (0..args.holes).map(|i| generator.hole(i)).collect();
    let (shots, samples) = write_tables(&holes, &args.out)?;

    info!(
        holes = holes.len(),
        shots,
        samples,
        out = %args.out.display(),
        seed = ?args.seed,
        "Synthetic dataset written"
    );
    Ok(())
}
