//! Per-frame outputs: live preview and persistence.

use lzp_core::{HeightMap, Sample, StackRef};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Base name used when the source has none.
pub const DEFAULT_OUTPUT_NAME: &str = "LocalZProjectorOutput";

/// Receives every finished frame, e.g. to refresh a preview.
pub trait FrameListener<T> {
    /// Height map of time point `t`, right after it is recorded.
    fn on_height_map(&mut self, _t: usize, _height_map: &HeightMap) {}

    /// Projection of time point `t`.
    fn on_frame(&mut self, t: usize, projection: StackRef<'_, T>);
}

/// Persists finished frames.
pub trait FrameSink<T> {
    /// Saves the projection of one time point under `name`.
    fn save_projection(&mut self, name: &str, projection: StackRef<'_, T>) -> io::Result<()>;

    /// Saves the height map of one time point under `name`.
    fn save_height_map(&mut self, name: &str, height_map: &HeightMap) -> io::Result<()>;
}

/// Output names for time point `t` of `frames`:
/// `<base>_LocalProjection_<t>` and `<base>_RefSurface_<t>`.
///
/// `t` is zero-padded to the number of digits of `frames`. The base is the
/// input name without its extension, or [`DEFAULT_OUTPUT_NAME`].
///
/// ```rust
/// use lzp_surface::sink::frame_file_names;
///
/// let (proj, surf) = frame_file_names(Some("embryo.tif"), 7, 120);
/// assert_eq!(proj, "embryo_LocalProjection_007");
/// assert_eq!(surf, "embryo_RefSurface_007");
/// ```
pub fn frame_file_names(input_name: Option<&str>, t: usize, frames: usize) -> (String, String) {
    let base = match input_name {
        Some(name) if !name.is_empty() => match name.rfind('.') {
            Some(dot) if dot > 0 => &name[..dot],
            _ => name,
        },
        _ => DEFAULT_OUTPUT_NAME,
    };
    let width = frames.max(1).to_string().len();
    (
        format!("{base}_LocalProjection_{t:0width$}"),
        format!("{base}_RefSurface_{t:0width$}"),
    )
}

/// Writes raw little-endian samples to `<dir>/<name>.raw`.
#[derive(Debug, Clone)]
pub struct RawDirectorySink {
    dir: PathBuf,
}

impl RawDirectorySink {
    /// Creates the sink, creating `dir` if needed.
    pub fn create(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a given output name is written to.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.raw"))
    }

    fn write_samples<T: Sample>(&self, name: &str, samples: &[T]) -> io::Result<()> {
        let path = self.path_for(name);
        let mut buf = Vec::with_capacity(samples.len() * (T::BITS as usize / 8));
        for &s in samples {
            s.write_le(&mut buf);
        }
        let mut writer = BufWriter::new(File::create(&path)?);
        writer.write_all(&buf)?;
        writer.flush()?;
        debug!(path = %path.display(), bytes = buf.len(), "Wrote raw output");
        Ok(())
    }
}

impl<T: Sample> FrameSink<T> for RawDirectorySink {
    fn save_projection(&mut self, name: &str, projection: StackRef<'_, T>) -> io::Result<()> {
        self.write_samples(name, projection.data())
    }

    fn save_height_map(&mut self, name: &str, height_map: &HeightMap) -> io::Result<()> {
        self.write_samples(name, height_map.data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lzp_core::Shape;

    #[test]
    fn test_frame_file_names() {
        assert_eq!(
            frame_file_names(Some("movie.ome.tif"), 3, 9),
            ("movie.ome_LocalProjection_3".into(), "movie.ome_RefSurface_3".into())
        );
        assert_eq!(frame_file_names(Some(".hidden"), 10, 100).0, ".hidden_LocalProjection_010");
        assert_eq!(frame_file_names(None, 0, 10).0, "LocalZProjectorOutput_LocalProjection_00");
        assert_eq!(frame_file_names(Some(""), 0, 1).1, "LocalZProjectorOutput_RefSurface_0");
    }

    #[test]
    fn test_raw_sink_writes_little_endian() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = RawDirectorySink::create(dir.path().join("out")).unwrap();
        assert_eq!(sink.dir(), dir.path().join("out"));
        assert!(sink.dir().is_dir());
        let data = [1u16, 0x0203];
        let view = StackRef::new(Shape::plane(2, 1), &data).unwrap();
        FrameSink::<u16>::save_projection(&mut sink, "p", view).unwrap();
        assert_eq!(fs::read(sink.path_for("p")).unwrap(), vec![1, 0, 3, 2]);

        let hm = HeightMap::filled(1, 1, 256);
        FrameSink::<u16>::save_height_map(&mut sink, "h", &hm).unwrap();
        assert_eq!(fs::read(sink.path_for("h")).unwrap(), vec![0, 1]);
    }
}
