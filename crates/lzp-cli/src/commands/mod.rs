//! CLI command implementations

pub mod demo;
pub mod params;

use anyhow::{Context, Result};
use lzp_surface::{ExtractSurfaceParameters, ReferenceSurfaceParameters};
use std::path::Path;

/// Load reference surface parameters, or the recommended preset.
pub fn load_reference(path: Option<&Path>) -> Result<ReferenceSurfaceParameters> {
    match path {
        Some(p) => ReferenceSurfaceParameters::load(p)
            .with_context(|| format!("Failed to load reference parameters: {}", p.display())),
        None => Ok(ReferenceSurfaceParameters::recommended()),
    }
}

/// Load extraction parameters, or the recommended preset.
pub fn load_extract(path: Option<&Path>) -> Result<ExtractSurfaceParameters> {
    match path {
        Some(p) => ExtractSurfaceParameters::load(p)
            .with_context(|| format!("Failed to load extraction parameters: {}", p.display())),
        None => Ok(ExtractSurfaceParameters::recommended()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_reference(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(err.to_string().contains("nope.json"));
        assert_eq!(load_extract(None).unwrap(), ExtractSurfaceParameters::recommended());
    }
}
