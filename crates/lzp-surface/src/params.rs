//! Parameters for height-map estimation and surface extraction.
//!
//! Both parameter sets are immutable value objects built once per run:
//!
//! - [`ReferenceSurfaceParameters`] - how the height map is estimated on the
//!   target channel (binning, filter window, Z range, pre/post filters,
//!   [`SurfaceMethod`])
//! - [`ExtractSurfaceParameters`] - per-channel Z offset, half-range and
//!   [`ProjectionMethod`] used to extract intensities around the height map
//!
//! # JSON
//!
//! Parameters serialize to pretty-printed JSON with camelCase field names and
//! upper-case method names. Deserialization goes through the builders, so a
//! file can omit fields (they take builder defaults) but cannot smuggle in
//! values the builder would reject. An empty file loads the
//! [`recommended`](ReferenceSurfaceParameters::recommended) preset.
//!
//! ```rust
//! use lzp_surface::params::{ReferenceSurfaceParameters, SurfaceMethod};
//!
//! let params = ReferenceSurfaceParameters::builder()
//!     .method(SurfaceMethod::MaxOfVariance)
//!     .binning(4)
//!     .z_min(30)
//!     .z_max(5)
//!     .build()
//!     .unwrap();
//! assert_eq!((params.z_min(), params.z_max()), (5, 30));
//!
//! let json = params.to_json().unwrap();
//! assert_eq!(ReferenceSurfaceParameters::from_json(&json).unwrap(), params);
//! ```

use crate::{SurfaceError, SurfaceResult};
use lzp_ops::WindowStatistic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::path::Path;

/// Returns `(min(a, b), max(a, b))`.
#[inline]
pub fn normalize_range(a: i32, b: i32) -> (i32, i32) {
    (a.min(b), a.max(b))
}

/// Filter response maximized over Z to find the in-focus plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SurfaceMethod {
    /// Dense window mean.
    #[default]
    MaxOfMean,
    /// Dense window variance.
    #[serde(alias = "MAX_OF_STD")]
    MaxOfVariance,
    /// Block mean on a sparse grid, bilinearly interpolated.
    SparseMaxOfMean,
    /// Block variance on a sparse grid, bilinearly interpolated.
    #[serde(alias = "SPARSE_MAX_OF_STD")]
    SparseMaxOfVariance,
}

impl SurfaceMethod {
    /// All methods, in declaration order.
    pub const ALL: [SurfaceMethod; 4] = [
        Self::MaxOfMean,
        Self::MaxOfVariance,
        Self::SparseMaxOfMean,
        Self::SparseMaxOfVariance,
    ];

    /// Statistic evaluated per window or block.
    pub fn statistic(self) -> WindowStatistic {
        match self {
            Self::MaxOfMean | Self::SparseMaxOfMean => WindowStatistic::Mean,
            Self::MaxOfVariance | Self::SparseMaxOfVariance => WindowStatistic::Variance,
        }
    }

    /// Whether the statistic is approximated on a sparse grid.
    pub fn is_sparse(self) -> bool {
        matches!(self, Self::SparseMaxOfMean | Self::SparseMaxOfVariance)
    }
}

impl std::fmt::Display for SurfaceMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::MaxOfMean => "Max of mean",
            Self::MaxOfVariance => "Max of variance",
            Self::SparseMaxOfMean => "Mean max on grid",
            Self::SparseMaxOfVariance => "Variance max on grid",
        })
    }
}

impl std::str::FromStr for SurfaceMethod {
    type Err = SurfaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['_', ' ', '-'], "").as_str() {
            "mean" | "maxofmean" => Ok(Self::MaxOfMean),
            "variance" | "std" | "maxofvariance" | "maxofstd" => Ok(Self::MaxOfVariance),
            "sparsemean" | "sparsemaxofmean" => Ok(Self::SparseMaxOfMean),
            "sparsevariance" | "sparsestd" | "sparsemaxofvariance" => Ok(Self::SparseMaxOfVariance),
            _ => {
                let known: Vec<String> = Self::ALL.iter().map(|m| format!("{m:?}")).collect();
                Err(SurfaceError::invalid(format!(
                    "unknown surface method '{s}', expected one of {}",
                    known.join(", ")
                )))
            }
        }
    }
}

/// Height-map estimation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ReferenceSurfaceParametersBuilder")]
pub struct ReferenceSurfaceParameters {
    target_channel: usize,
    method: SurfaceMethod,
    filter_window_size: u32,
    z_min: i32,
    z_max: i32,
    sigma: f64,
    median_half_size: u32,
    binning: u32,
}

impl ReferenceSurfaceParameters {
    /// Starts a builder with default values.
    pub fn builder() -> ReferenceSurfaceParametersBuilder {
        ReferenceSurfaceParametersBuilder::default()
    }

    /// Preset suited to typical epithelium acquisitions: binning 6, window 6,
    /// gaussian sigma 0.7, median half-size 4, max of variance.
    pub fn recommended() -> Self {
        let defaults = ReferenceSurfaceParametersBuilder::default();
        Self {
            target_channel: defaults.target_channel,
            method: SurfaceMethod::MaxOfVariance,
            filter_window_size: 6,
            z_min: defaults.z_min,
            z_max: defaults.z_max,
            sigma: 0.7,
            median_half_size: 4,
            binning: 6,
        }
    }

    /// Channel the height map is estimated on.
    #[inline]
    pub fn target_channel(&self) -> usize {
        self.target_channel
    }

    /// Filter response method.
    #[inline]
    pub fn method(&self) -> SurfaceMethod {
        self.method
    }

    /// Filter window size in full-resolution pixels.
    #[inline]
    pub fn filter_window_size(&self) -> u32 {
        self.filter_window_size
    }

    /// Lowest Z plane scanned (may be negative before clamping to the stack).
    #[inline]
    pub fn z_min(&self) -> i32 {
        self.z_min
    }

    /// Highest Z plane scanned (may exceed the stack before clamping).
    #[inline]
    pub fn z_max(&self) -> i32 {
        self.z_max
    }

    /// Gaussian pre-filter sigma in binned pixels; 0 disables it.
    #[inline]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Median post-filter half-size in binned pixels; 0 disables it.
    #[inline]
    pub fn median_half_size(&self) -> u32 {
        self.median_half_size
    }

    /// XY binning factor.
    #[inline]
    pub fn binning(&self) -> u32 {
        self.binning
    }

    /// Half-size of the statistic window on the binned plane:
    /// `ceil(filter_window_size / binning / 2)`.
    pub fn filter_half_size(&self) -> usize {
        (self.filter_window_size as f64 / self.binning as f64 / 2.0).ceil() as usize
    }

    /// Z planes scanned in a stack of `depth` planes, or `None` if the
    /// configured range misses the stack entirely.
    pub fn z_range(&self, depth: usize) -> Option<RangeInclusive<usize>> {
        if depth == 0 || self.z_max < 0 {
            return None;
        }
        let lo = self.z_min.max(0) as usize;
        let hi = (self.z_max as usize).min(depth - 1);
        (lo <= hi).then_some(lo..=hi)
    }

    /// Serializes to pretty-printed JSON.
    pub fn to_json(&self) -> SurfaceResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses JSON; an empty (or blank) document yields [`recommended`](Self::recommended).
    pub fn from_json(json: &str) -> SurfaceResult<Self> {
        if json.trim().is_empty() {
            return Ok(Self::recommended());
        }
        Ok(serde_json::from_str(json)?)
    }

    /// Writes the parameters to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> SurfaceResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Reads parameters from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> SurfaceResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

impl Default for ReferenceSurfaceParameters {
    fn default() -> Self {
        let b = ReferenceSurfaceParametersBuilder::default();
        Self {
            target_channel: b.target_channel,
            method: b.method,
            filter_window_size: b.filter_window_size,
            z_min: b.z_min,
            z_max: b.z_max,
            sigma: b.sigma,
            median_half_size: b.median_half_size,
            binning: b.binning,
        }
    }
}

/// Builder for [`ReferenceSurfaceParameters`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReferenceSurfaceParametersBuilder {
    target_channel: usize,
    method: SurfaceMethod,
    filter_window_size: u32,
    z_min: i32,
    z_max: i32,
    sigma: f64,
    median_half_size: u32,
    binning: u32,
}

impl Default for ReferenceSurfaceParametersBuilder {
    fn default() -> Self {
        Self {
            target_channel: 0,
            method: SurfaceMethod::MaxOfMean,
            filter_window_size: 10,
            z_min: 0,
            z_max: u16::MAX as i32,
            sigma: 0.0,
            median_half_size: 0,
            binning: 1,
        }
    }
}

impl ReferenceSurfaceParametersBuilder {
    /// Sets the filter response method.
    pub fn method(mut self, method: SurfaceMethod) -> Self {
        self.method = method;
        self
    }

    /// Sets the first Z plane to scan.
    pub fn z_min(mut self, z_min: i32) -> Self {
        self.z_min = z_min;
        self
    }

    /// Sets the last Z plane to scan.
    pub fn z_max(mut self, z_max: i32) -> Self {
        self.z_max = z_max;
        self
    }

    /// Sets the filter window size, in full-resolution pixels.
    pub fn filter_window_size(mut self, size: u32) -> Self {
        self.filter_window_size = size;
        self
    }

    /// Sets the gaussian pre-filter sigma; 0 disables the pre-filter.
    pub fn gaussian_pre_filter(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    /// Sets the median post-filter half-size; 0 disables the post-filter.
    pub fn median_post_filter_half_size(mut self, half_size: u32) -> Self {
        self.median_half_size = half_size;
        self
    }

    /// Sets the channel the height map is estimated on.
    pub fn target_channel(mut self, channel: usize) -> Self {
        self.target_channel = channel;
        self
    }

    /// Sets the XY binning factor.
    pub fn binning(mut self, binning: u32) -> Self {
        self.binning = binning;
        self
    }

    /// Validates and builds the parameters.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::InvalidArgument`] listing every violated constraint:
    /// binning < 1, filter window < 1, negative or non-finite sigma.
    pub fn build(self) -> SurfaceResult<ReferenceSurfaceParameters> {
        let mut problems = Vec::new();
        if self.binning < 1 {
            problems.push(format!("binning cannot be lower than 1, was {}", self.binning));
        }
        if self.filter_window_size < 1 {
            problems.push(format!(
                "filter window size cannot be lower than 1, was {}",
                self.filter_window_size
            ));
        }
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            problems.push(format!("gaussian sigma must be >= 0, was {}", self.sigma));
        }
        if !problems.is_empty() {
            return Err(SurfaceError::invalid(format!(
                "error building reference surface parameters: {}",
                problems.join("; ")
            )));
        }

        let (z_min, z_max) = normalize_range(self.z_min, self.z_max);
        Ok(ReferenceSurfaceParameters {
            target_channel: self.target_channel,
            method: self.method,
            filter_window_size: self.filter_window_size,
            z_min,
            z_max,
            sigma: self.sigma,
            median_half_size: self.median_half_size,
            binning: self.binning,
        })
    }
}

impl TryFrom<ReferenceSurfaceParametersBuilder> for ReferenceSurfaceParameters {
    type Error = SurfaceError;

    fn try_from(builder: ReferenceSurfaceParametersBuilder) -> Result<Self, Self::Error> {
        builder.build()
    }
}

/// How intensities around the height map are turned into output samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectionMethod {
    /// Maximum intensity along Z.
    #[default]
    Mip,
    /// Mean intensity along Z.
    Mean,
    /// No reduction: copy the Z window into a thick slab.
    Collect,
}

impl std::fmt::Display for ProjectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Mip => "MIP",
            Self::Mean => "Mean",
            Self::Collect => "Collect",
        })
    }
}

impl std::str::FromStr for ProjectionMethod {
    type Err = SurfaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mip" | "max" => Ok(Self::Mip),
            "mean" => Ok(Self::Mean),
            "collect" => Ok(Self::Collect),
            _ => Err(SurfaceError::invalid(format!("unknown projection method '{s}'"))),
        }
    }
}

/// Shape of the per-frame extraction output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    /// One plane per channel.
    Projection,
    /// A slab of `depth = 1 + 2 * max_delta_z` planes per channel.
    Slab {
        /// Slab depth.
        depth: usize,
        /// Largest half-range among Collect channels.
        max_delta_z: u32,
    },
}

impl OutputLayout {
    /// Output planes per channel.
    pub fn depth(&self) -> usize {
        match self {
            Self::Projection => 1,
            Self::Slab { depth, .. } => *depth,
        }
    }

    /// Slab slice that receives reduced (non-Collect) channels.
    pub fn centre(&self) -> usize {
        match self {
            Self::Projection => 0,
            Self::Slab { max_delta_z, .. } => *max_delta_z as usize,
        }
    }
}

/// Per-channel extraction parameters.
///
/// Channels without an entry use offset 0, half-range 0 and
/// [`ProjectionMethod::Mip`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ExtractSurfaceParametersBuilder")]
pub struct ExtractSurfaceParameters {
    offsets: BTreeMap<usize, i32>,
    #[serde(rename = "deltaZs")]
    delta_zs: BTreeMap<usize, u32>,
    projection_methods: BTreeMap<usize, ProjectionMethod>,
}

impl ExtractSurfaceParameters {
    /// Starts an empty builder.
    pub fn builder() -> ExtractSurfaceParametersBuilder {
        ExtractSurfaceParametersBuilder::default()
    }

    /// Preset: half-range 2, offset 0 and MIP for channels 0 to 9.
    pub fn recommended() -> Self {
        (0..10)
            .fold(Self::builder(), |b, c| {
                b.delta_z(c, 2).z_offset(c, 0).projection_method(c, ProjectionMethod::Mip)
            })
            .build()
    }

    /// Z offset applied to the height map for `channel`.
    ///
    /// With a reference plane at Z = 15 and an offset of -4, intensities are
    /// collected around Z = 11.
    pub fn offset(&self, channel: usize) -> i32 {
        self.offsets.get(&channel).copied().unwrap_or(0)
    }

    /// Half-range of the Z window for `channel`: the window spans
    /// `ref + offset - delta_z ..= ref + offset + delta_z`.
    pub fn delta_z(&self, channel: usize) -> u32 {
        self.delta_zs.get(&channel).copied().unwrap_or(0)
    }

    /// Projection method for `channel`.
    pub fn projection_method(&self, channel: usize) -> ProjectionMethod {
        self.projection_methods
            .get(&channel)
            .copied()
            .unwrap_or_default()
    }

    /// Output layout for a source with `channels` channels.
    ///
    /// Any Collect channel switches the whole output to a slab sized for the
    /// largest Collect half-range.
    pub fn layout(&self, channels: usize) -> OutputLayout {
        let collect_dz = (0..channels)
            .filter(|&c| self.projection_method(c) == ProjectionMethod::Collect)
            .map(|c| self.delta_z(c))
            .max();
        match collect_dz {
            None => OutputLayout::Projection,
            Some(dz) => OutputLayout::Slab {
                depth: 1 + 2 * dz as usize,
                max_delta_z: dz,
            },
        }
    }

    /// Serializes to pretty-printed JSON.
    pub fn to_json(&self) -> SurfaceResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses JSON; an empty (or blank) document yields [`recommended`](Self::recommended).
    pub fn from_json(json: &str) -> SurfaceResult<Self> {
        if json.trim().is_empty() {
            return Ok(Self::recommended());
        }
        Ok(serde_json::from_str(json)?)
    }

    /// Writes the parameters to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> SurfaceResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Reads parameters from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> SurfaceResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

/// Builder for [`ExtractSurfaceParameters`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractSurfaceParametersBuilder {
    offsets: BTreeMap<usize, i32>,
    #[serde(rename = "deltaZs")]
    delta_zs: BTreeMap<usize, i32>,
    projection_methods: BTreeMap<usize, ProjectionMethod>,
}

impl ExtractSurfaceParametersBuilder {
    /// Sets the Z offset for `channel`.
    pub fn z_offset(mut self, channel: usize, offset: i32) -> Self {
        self.offsets.insert(channel, offset);
        self
    }

    /// Sets the Z half-range for `channel`. Negative values are taken as
    /// their absolute value, saturated at `i32::MAX`.
    pub fn delta_z(mut self, channel: usize, delta_z: i32) -> Self {
        self.delta_zs.insert(channel, delta_z);
        self
    }

    /// Sets the projection method for `channel`.
    pub fn projection_method(mut self, channel: usize, method: ProjectionMethod) -> Self {
        self.projection_methods.insert(channel, method);
        self
    }

    /// Builds the parameters.
    pub fn build(self) -> ExtractSurfaceParameters {
        ExtractSurfaceParameters {
            offsets: self.offsets,
            delta_zs: self
                .delta_zs
                .into_iter()
                .map(|(c, dz)| (c, dz.unsigned_abs().min(i32::MAX as u32)))
                .collect(),
            projection_methods: self.projection_methods,
        }
    }
}

impl From<ExtractSurfaceParametersBuilder> for ExtractSurfaceParameters {
    fn from(builder: ExtractSurfaceParametersBuilder) -> Self {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_range() {
        assert_eq!(normalize_range(5, 2), (2, 5));
        assert_eq!(normalize_range(-1, 3), (-1, 3));
        assert_eq!(normalize_range(4, 4), (4, 4));
    }

    #[test]
    fn test_builder_defaults() {
        let p = ReferenceSurfaceParameters::builder().build().unwrap();
        assert_eq!(p.method(), SurfaceMethod::MaxOfMean);
        assert_eq!(p.filter_window_size(), 10);
        assert_eq!(p.binning(), 1);
        assert_eq!((p.z_min(), p.z_max()), (0, 65535));
        assert_eq!(p.sigma(), 0.0);
        assert_eq!(p.median_half_size(), 0);
        assert_eq!(p, ReferenceSurfaceParameters::default());
    }

    #[test]
    fn test_builder_rejects_invalid() {
        assert!(ReferenceSurfaceParameters::builder().binning(0).build().is_err());
        assert!(ReferenceSurfaceParameters::builder().filter_window_size(0).build().is_err());
        assert!(ReferenceSurfaceParameters::builder().gaussian_pre_filter(-0.5).build().is_err());
        assert!(ReferenceSurfaceParameters::builder().gaussian_pre_filter(f64::NAN).build().is_err());

        let err = ReferenceSurfaceParameters::builder()
            .binning(0)
            .filter_window_size(0)
            .build()
            .unwrap_err()
            .to_string();
        assert!(err.contains("binning"));
        assert!(err.contains("window"));
    }

    #[test]
    fn test_filter_half_size() {
        let p = |w, b| {
            ReferenceSurfaceParameters::builder()
                .filter_window_size(w)
                .binning(b)
                .build()
                .unwrap()
                .filter_half_size()
        };
        assert_eq!(p(5, 1), 3);
        assert_eq!(p(6, 6), 1);
        assert_eq!(p(10, 1), 5);
        assert_eq!(p(1, 8), 1);
    }

    #[test]
    fn test_z_range_clamping() {
        let p = ReferenceSurfaceParameters::builder().z_min(-5).z_max(100).build().unwrap();
        assert_eq!(p.z_range(20), Some(0..=19));
        let p = ReferenceSurfaceParameters::builder().z_min(30).z_max(40).build().unwrap();
        assert_eq!(p.z_range(20), None);
        let p = ReferenceSurfaceParameters::builder().z_min(-5).z_max(-1).build().unwrap();
        assert_eq!(p.z_range(20), None);
        assert_eq!(ReferenceSurfaceParameters::default().z_range(0), None);
    }

    #[test]
    fn test_reference_json_roundtrip() {
        let p = ReferenceSurfaceParameters::builder()
            .method(SurfaceMethod::SparseMaxOfVariance)
            .binning(3)
            .filter_window_size(7)
            .z_min(2)
            .z_max(12)
            .gaussian_pre_filter(1.25)
            .median_post_filter_half_size(2)
            .target_channel(1)
            .build()
            .unwrap();
        let json = p.to_json().unwrap();
        assert!(json.contains("\"filterWindowSize\": 7"));
        assert!(json.contains("SPARSE_MAX_OF_VARIANCE"));
        assert_eq!(ReferenceSurfaceParameters::from_json(&json).unwrap(), p);
    }

    #[test]
    fn test_reference_json_partial_and_aliases() {
        let p = ReferenceSurfaceParameters::from_json(r#"{"method": "MAX_OF_STD", "zMin": 9, "zMax": 3}"#)
            .unwrap();
        assert_eq!(p.method(), SurfaceMethod::MaxOfVariance);
        assert_eq!((p.z_min(), p.z_max()), (3, 9));
        assert_eq!(p.filter_window_size(), 10);

        assert!(ReferenceSurfaceParameters::from_json(r#"{"binning": 0}"#).is_err());
        assert_eq!(
            ReferenceSurfaceParameters::from_json("  \n").unwrap(),
            ReferenceSurfaceParameters::recommended()
        );
    }

    #[test]
    fn test_extract_defaults_and_abs() {
        let p = ExtractSurfaceParameters::builder()
            .delta_z(1, -3)
            .z_offset(1, -4)
            .projection_method(1, ProjectionMethod::Mean)
            .build();
        assert_eq!(p.delta_z(1), 3);
        assert_eq!(p.offset(1), -4);
        assert_eq!(p.projection_method(1), ProjectionMethod::Mean);

        assert_eq!(p.delta_z(7), 0);
        assert_eq!(p.offset(7), 0);
        assert_eq!(p.projection_method(7), ProjectionMethod::Mip);
    }

    #[test]
    fn test_layout() {
        let p = ExtractSurfaceParameters::builder()
            .delta_z(0, 5)
            .projection_method(1, ProjectionMethod::Collect)
            .delta_z(1, 2)
            .projection_method(2, ProjectionMethod::Collect)
            .delta_z(2, 3)
            .build();
        assert_eq!(p.layout(1), OutputLayout::Projection);
        assert_eq!(p.layout(2), OutputLayout::Slab { depth: 5, max_delta_z: 2 });
        let slab = p.layout(3);
        assert_eq!(slab, OutputLayout::Slab { depth: 7, max_delta_z: 3 });
        assert_eq!(slab.centre(), 3);
    }

    #[test]
    fn test_extract_json_roundtrip() {
        let p = ExtractSurfaceParameters::recommended();
        let json = p.to_json().unwrap();
        assert!(json.contains("deltaZs"));
        assert!(json.contains("\"MIP\""));
        assert_eq!(ExtractSurfaceParameters::from_json(&json).unwrap(), p);

        let neg = ExtractSurfaceParameters::from_json(r#"{"deltaZs": {"0": -2}}"#).unwrap();
        assert_eq!(neg.delta_z(0), 2);

        let extreme = ExtractSurfaceParameters::builder()
            .delta_z(0, i32::MIN)
            .delta_z(1, i32::MAX)
            .build();
        assert_eq!(extreme.delta_z(0), i32::MAX as u32);
        let back = ExtractSurfaceParameters::from_json(&extreme.to_json().unwrap()).unwrap();
        assert_eq!(back, extreme);
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("variance".parse::<SurfaceMethod>().unwrap(), SurfaceMethod::MaxOfVariance);
        assert_eq!("sparse_mean".parse::<SurfaceMethod>().unwrap(), SurfaceMethod::SparseMaxOfMean);
        let err = "median".parse::<SurfaceMethod>().unwrap_err().to_string();
        assert!(err.contains("SparseMaxOfVariance"), "{err}");
        for m in SurfaceMethod::ALL {
            assert_eq!(format!("{m:?}").parse::<SurfaceMethod>().unwrap(), m);
        }
        assert_eq!("Collect".parse::<ProjectionMethod>().unwrap(), ProjectionMethod::Collect);
        assert!(SurfaceMethod::SparseMaxOfMean.is_sparse());
        assert_eq!(SurfaceMethod::MaxOfVariance.statistic(), WindowStatistic::Variance);
    }
}
