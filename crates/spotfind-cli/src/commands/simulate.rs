use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use nalgebra::Vector3;
use ndarray::Array3;
use spotfind_core::detection::OctreeConfig;
use spotfind_core::filters::FilterConfig;
use spotfind_core::geometry::Aabb;
use spotfind_core::{BoxMask, ImageStack, PeakFinder, PeakFinderConfig};

use crate::progress::BarSink;
use crate::summary;

#[derive(Clone, ValueEnum)]
pub enum FilterArg {
    Delta,
    Constant,
    Annular,
}

#[derive(Args)]
pub struct SimulateArgs {
    /// Peak finder config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of frames in the synthetic stack
    #[arg(long, default_value = "20")]
    pub frames: usize,

    /// Detector rows
    #[arg(long, default_value = "128")]
    pub rows: usize,

    /// Detector columns
    #[arg(long, default_value = "128")]
    pub cols: usize,

    /// Number of spots laid out on a regular grid
    #[arg(long, default_value = "9")]
    pub spots: usize,

    /// Flat background level
    #[arg(long, default_value = "10")]
    pub background: u32,

    /// Peak height of each spot above background
    #[arg(long, default_value = "400")]
    pub amplitude: f64,

    /// In-frame spot width (pixels)
    #[arg(long, default_value = "1.5")]
    pub sigma: f64,

    /// Spot width along the frame axis (frames)
    #[arg(long, default_value = "1.2")]
    pub frame_sigma: f64,

    /// Add a spot straddling the left detector edge
    #[arg(long)]
    pub edge_spot: bool,

    /// Mask a detector region over all frames
    #[arg(long, num_args = 4, value_names = ["X0", "Y0", "X1", "Y1"])]
    pub mask: Option<Vec<f64>>,

    /// Detection threshold on the filtered frames
    #[arg(long, default_value = "80")]
    pub threshold: f64,

    /// Minimum blob size (pixels)
    #[arg(long, default_value = "30")]
    pub min_size: usize,

    /// Maximum blob size (pixels)
    #[arg(long, default_value = "10000")]
    pub max_size: usize,

    /// Maximum number of frames a peak may span
    #[arg(long, default_value = "10")]
    pub max_frames: f64,

    /// Frame filter
    #[arg(long, value_enum, default_value = "annular")]
    pub filter: FilterArg,

    /// Constant filter radius
    #[arg(long, default_value = "2")]
    pub radius: usize,

    /// Annular filter radii (peak, inner, outer)
    #[arg(long, num_args = 3, value_names = ["R1", "R2", "R3"])]
    pub radii: Option<Vec<f64>>,

    /// First frame to search (-1 for the start)
    #[arg(long, default_value = "-1", allow_hyphen_values = true)]
    pub first_frame: i64,

    /// Last frame to search, exclusive (-1 for the end)
    #[arg(long, default_value = "-1", allow_hyphen_values = true)]
    pub last_frame: i64,
}

/// Spot center in pixel/frame coordinates.
struct Spot {
    x: f64,
    y: f64,
    z: f64,
}

pub fn run(args: &SimulateArgs) -> Result<()> {
    let config = if let Some(ref config_path) = args.config {
        super::config::load(config_path)?
    } else {
        build_config_from_args(args)?
    };

    let spots = layout_spots(args);
    let data = render_stack(args, &spots);
    let mut stack = ImageStack::new(data).context("Failed to build synthetic stack")?;
    if let Some(ref bounds) = args.mask {
        stack.add_mask(Box::new(mask_from_bounds(bounds, args.frames)?));
    }

    summary::print_search_summary(&config, (args.frames, args.rows, args.cols), spots.len());

    let sink = Arc::new(BarSink::new()?);
    let finder = PeakFinder::new(config)?.with_progress(sink.clone());

    let start = Instant::now();
    let search = finder.find(&stack);
    sink.finish();
    let search = search?;

    summary::print_peaks(&search);
    summary::print_rejections(&search.summary);
    println!("  Done in {:.2}s", start.elapsed().as_secs_f64());
    println!();

    Ok(())
}

fn build_config_from_args(args: &SimulateArgs) -> Result<PeakFinderConfig> {
    let filter = match args.filter {
        FilterArg::Delta => FilterConfig::Delta,
        FilterArg::Constant => FilterConfig::Constant {
            radius: args.radius,
        },
        FilterArg::Annular => match args.radii.as_deref() {
            Some(&[r1, r2, r3]) => FilterConfig::Annular { r1, r2, r3 },
            Some(_) => bail!("--radii expects three values"),
            None => FilterConfig::default(),
        },
    };

    Ok(PeakFinderConfig {
        threshold: args.threshold,
        min_size: args.min_size,
        max_size: args.max_size,
        max_frames: args.max_frames,
        first_frame: args.first_frame,
        last_frame: args.last_frame,
        octree: OctreeConfig::default(),
        filter,
        ..PeakFinderConfig::default()
    })
}

/// Box mask over `x0..x1`, `y0..y1` spanning every frame.
fn mask_from_bounds(bounds: &[f64], frames: usize) -> Result<BoxMask> {
    let &[x0, y0, x1, y1] = bounds else {
        bail!("--mask expects four values");
    };
    if !(x0 < x1 && y0 < y1) {
        bail!("--mask needs X0 < X1 and Y0 < Y1, got {x0} {y0} {x1} {y1}");
    }
    let aabb = Aabb::new(
        Vector3::new(x0, y0, 0.0),
        Vector3::new(x1, y1, frames as f64),
    );
    Ok(BoxMask::new(aabb))
}

/// Spots on a square grid, staggered through the frames.
fn layout_spots(args: &SimulateArgs) -> Vec<Spot> {
    let side = (args.spots as f64).sqrt().ceil().max(1.0) as usize;
    let dx = args.cols as f64 / (side + 1) as f64;
    let dy = args.rows as f64 / (side + 1) as f64;
    let dz = args.frames as f64 / (args.spots + 1) as f64;

    let mut spots: Vec<Spot> = (0..args.spots)
        .map(|k| Spot {
            x: dx * ((k % side) + 1) as f64,
            y: dy * ((k / side) + 1) as f64,
            z: dz * (k + 1) as f64,
        })
        .collect();

    if args.edge_spot {
        spots.push(Spot {
            x: 0.5,
            y: args.rows as f64 / 2.0,
            z: args.frames as f64 / 2.0,
        });
    }
    spots
}

fn render_stack(args: &SimulateArgs, spots: &[Spot]) -> Array3<u32> {
    let inv_xy = 1.0 / (2.0 * args.sigma * args.sigma);
    let inv_z = 1.0 / (2.0 * args.frame_sigma * args.frame_sigma);
    // Beyond this many widths a spot adds less than one count.
    let reach = 5.0;

    Array3::from_shape_fn((args.frames, args.rows, args.cols), |(f, r, c)| {
        let (x, y, z) = (c as f64, r as f64, f as f64);
        let signal: f64 = spots
            .iter()
            .filter(|s| {
                (s.x - x).abs() < reach * args.sigma
                    && (s.y - y).abs() < reach * args.sigma
                    && (s.z - z).abs() < reach * args.frame_sigma
            })
            .map(|s| {
                let d_xy = (s.x - x).powi(2) + (s.y - y).powi(2);
                let d_z = (s.z - z).powi(2);
                args.amplitude * (-d_xy * inv_xy - d_z * inv_z).exp()
            })
            .sum();
        args.background + signal.max(0.0).round() as u32
    })
}
