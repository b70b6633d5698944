//! Demo command
//!
//! Renders a synthetic focus volume and runs the full pipeline on it.

use crate::{DemoArgs, Policy};
use anyhow::{Context, Result, bail};
use lzp_core::Shape;
use lzp_surface::{
    ExtractSurfaceParameters, InMemorySource, LocalZProjector, MaterializePolicy, RawDirectorySink,
    ReferenceSurfaceParameters, RunOptions, RunStatus, SyntheticFocus,
};
use tracing::{debug, info, trace, warn};

/// Same parameters with the median post-filter turned off.
fn without_median(params: &ReferenceSurfaceParameters) -> Result<ReferenceSurfaceParameters> {
    Ok(ReferenceSurfaceParameters::builder()
        .method(params.method())
        .z_min(params.z_min())
        .z_max(params.z_max())
        .filter_window_size(params.filter_window_size())
        .gaussian_pre_filter(params.sigma())
        .target_channel(params.target_channel())
        .binning(params.binning())
        .build()?)
}

/// Replaces the half-range of every channel, keeping offsets and methods.
fn with_delta_z(params: &ExtractSurfaceParameters, channels: usize, delta_z: u32) -> ExtractSurfaceParameters {
    let dz = i32::try_from(delta_z).unwrap_or(i32::MAX);
    (0..channels)
        .fold(ExtractSurfaceParameters::builder(), |b, c| {
            b.delta_z(c, dz)
                .z_offset(c, params.offset(c))
                .projection_method(c, params.projection_method(c))
        })
        .build()
}

pub fn run(args: DemoArgs, verbose: u8) -> Result<()> {
    trace!(
        width = args.width,
        height = args.height,
        depth = args.depth,
        frames = args.frames,
        "demo::run"
    );

    if args.width == 0 || args.height == 0 || args.depth == 0 || args.channels == 0 || args.frames == 0 {
        bail!("Volume dimensions must be non-zero");
    }

    let mut reference = super::load_reference(args.reference.as_deref())?;
    if args.one_pass && reference.median_half_size() > 0 {
        warn!(
            half_size = reference.median_half_size(),
            "One-pass mode has no median post-filter, ignoring it"
        );
        reference = without_median(&reference)?;
    }
    let mut extract = super::load_extract(args.extract.as_deref())?;
    if let Some(dz) = args.delta_z {
        extract = with_delta_z(&extract, args.channels, dz);
    }
    debug!(?reference, ?extract, "Parameters");

    let synth = SyntheticFocus {
        focus_z: args.focus,
        tilt_x: args.tilt,
        drift: args.drift,
        ..SyntheticFocus::default()
    };
    let shape = Shape::stack(args.width, args.height, args.depth)
        .with_channels(args.channels)
        .with_frames(args.frames);
    info!(%shape, "Rendering synthetic volume");
    let source = InMemorySource::new(synth.render(shape)).with_name("synthetic");

    let options = RunOptions {
        policy: match args.policy {
            Policy::View => MaterializePolicy::ViewOnly,
            Policy::Copy => MaterializePolicy::MaterializeCopy,
        },
        input_name: None,
        save_each_frame: args.save_dir.is_some(),
        save_height_maps: args.save_height_maps,
    };

    let mut lzp = LocalZProjector::new(reference, extract).with_options(options);
    if let Some(dir) = &args.save_dir {
        let sink = RawDirectorySink::create(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
        info!(dir = %sink.dir().display(), "Saving raw frames");
        lzp = lzp.with_sink(sink);
    }

    let out = if args.one_pass {
        lzp.run_one_pass(&source)?
    } else {
        lzp.run(&source)?
    };

    for t in 0..args.frames {
        let hm = out.height_maps.plane(0, 0, t)?;
        let min = hm.iter().copied().min().unwrap_or(0);
        let max = hm.iter().copied().max().unwrap_or(0);
        let expected_min = (0..args.width).map(|x| synth.focus_at(x, t)).fold(f64::INFINITY, f64::min);
        let expected_max = (0..args.width)
            .map(|x| synth.focus_at(x, t))
            .fold(f64::NEG_INFINITY, f64::max);
        println!("t={t}: height map {min}..{max} (focus {expected_min:.1}..{expected_max:.1})");
    }

    match &out.status {
        RunStatus::Completed => {
            if verbose > 0 {
                println!("Projection: {}", out.projection.shape());
            }
        }
        RunStatus::Canceled {
            reason,
            completed_frames,
        } => println!("Canceled after {completed_frames} frames: {reason}"),
    }
    if let Some(dir) = &args.save_dir {
        println!("Saved frames to {}", dir.display());
    }
    Ok(())
}
