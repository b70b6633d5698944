//! Params command
//!
//! Writes default or recommended parameter files and validates existing ones.

use crate::{ParamsAction, ParamsArgs, ParamsKind};
use anyhow::{Context, Result};
use lzp_surface::{ExtractSurfaceParameters, ReferenceSurfaceParameters};
use std::path::Path;
use tracing::{info, trace};

/// JSON text for a parameter set.
fn render(kind: ParamsKind, recommended: bool) -> Result<String> {
    let json = match (kind, recommended) {
        (ParamsKind::Reference, true) => ReferenceSurfaceParameters::recommended().to_json()?,
        (ParamsKind::Reference, false) => ReferenceSurfaceParameters::default().to_json()?,
        (ParamsKind::Extract, true) => ExtractSurfaceParameters::recommended().to_json()?,
        (ParamsKind::Extract, false) => ExtractSurfaceParameters::default().to_json()?,
    };
    Ok(json)
}

/// Loads a file and re-serializes it, applying normalization.
fn normalize(input: &Path, kind: ParamsKind) -> Result<String> {
    let json = match kind {
        ParamsKind::Reference => super::load_reference(Some(input))?.to_json()?,
        ParamsKind::Extract => super::load_extract(Some(input))?.to_json()?,
    };
    Ok(json)
}

pub fn run(args: ParamsArgs, verbose: u8) -> Result<()> {
    match args.action {
        ParamsAction::Init {
            kind,
            output,
            recommended,
        } => {
            trace!(?kind, recommended, "params::init");
            let json = render(kind, recommended)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write: {}", path.display()))?;
                    info!(path = %path.display(), "Wrote parameters");
                    if verbose > 0 {
                        println!("Wrote {:?} parameters to {}", kind, path.display());
                    }
                }
                None => println!("{json}"),
            }
        }
        ParamsAction::Show { input, kind } => {
            trace!(input = %input.display(), ?kind, "params::show");
            println!("{}", normalize(&input, kind)?);
        }
    }
    Ok(())
}
