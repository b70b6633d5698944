//! Scalar sample types stored in planes.
//!
//! Microscopy stacks come as 8/16-bit integers or floats. Unlike display
//! pixel formats, samples are handled in their raw numeric range: a `u16`
//! of 4000 converts to `4000.0`, not to a normalized fraction.
//!
//! # Example
//!
//! ```
//! use lzp_core::Sample;
//!
//! let v: u16 = Sample::from_f64(1234.6);
//! assert_eq!(v, 1235);
//!
//! // Integer conversions saturate.
//! let sat: u8 = Sample::from_f64(300.0);
//! assert_eq!(sat, 255);
//! ```

use half::f16;
use std::fmt;

/// Trait for the scalar types a [`Volume`](crate::Volume) can hold.
///
/// # Required Methods
///
/// - [`to_f64`](Sample::to_f64) - widen to `f64` without scaling
/// - [`from_f64`](Sample::from_f64) - narrow from `f64`; integers round to
///   nearest and saturate at the type bounds, NaN maps to zero
/// - [`write_le`](Sample::write_le) - append little-endian bytes (raw dumps)
pub trait Sample: Copy + Default + Send + Sync + PartialOrd + fmt::Debug + 'static {
    /// Number of bits per sample.
    const BITS: u32;

    /// Short type name, used in logs.
    const NAME: &'static str;

    /// Widens to `f64`.
    fn to_f64(self) -> f64;

    /// Narrows from `f64`.
    fn from_f64(v: f64) -> Self;

    /// Appends the little-endian encoding of this sample.
    fn write_le(self, out: &mut Vec<u8>);

    /// Zero value.
    #[inline]
    fn zero() -> Self {
        Self::default()
    }

    /// Larger of two samples; NaN on either side yields `self`.
    #[inline]
    fn max_of(self, other: Self) -> Self {
        if other > self { other } else { self }
    }
}

macro_rules! impl_int_sample {
    ($t:ty, $name:literal) => {
        impl Sample for $t {
            const BITS: u32 = <$t>::BITS;
            const NAME: &'static str = $name;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                // `as` saturates and maps NaN to 0.
                v.round() as $t
            }

            #[inline]
            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }
        }
    };
}

impl_int_sample!(u8, "u8");
impl_int_sample!(u16, "u16");
impl_int_sample!(u32, "u32");

impl Sample for f16 {
    const BITS: u32 = 16;
    const NAME: &'static str = "f16";

    #[inline]
    fn to_f64(self) -> f64 {
        self.to_f64()
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        f16::from_f64(v)
    }

    #[inline]
    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl Sample for f32 {
    const BITS: u32 = 32;
    const NAME: &'static str = "f32";

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl Sample for f64 {
    const BITS: u32 = 64;
    const NAME: &'static str = "f64";

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }

    #[inline]
    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

/// Widens a plane of samples to `f32` working precision.
pub fn plane_to_f32<T: Sample>(plane: &[T]) -> Vec<f32> {
    plane.iter().map(|v| v.to_f64() as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_int_rounding_and_saturation() {
        assert_eq!(<u8 as Sample>::from_f64(127.5), 128);
        assert_eq!(<u8 as Sample>::from_f64(-3.0), 0);
        assert_eq!(<u16 as Sample>::from_f64(1e9), u16::MAX);
        assert_eq!(<u16 as Sample>::from_f64(f64::NAN), 0);
    }

    #[test]
    fn test_raw_range() {
        assert_relative_eq!(4000u16.to_f64(), 4000.0);
        assert_relative_eq!(<f32 as Sample>::from_f64(0.25) as f64, 0.25);
    }

    #[test]
    fn test_f16_roundtrip() {
        let h = <f16 as Sample>::from_f64(1.5);
        assert_relative_eq!(h.to_f64(), 1.5);
    }

    #[test]
    fn test_write_le() {
        let mut out = Vec::new();
        0x1234u16.write_le(&mut out);
        assert_eq!(out, vec![0x34, 0x12]);
    }

    #[test]
    fn test_max_of() {
        assert_eq!(3u8.max_of(7), 7);
        assert_eq!(7u8.max_of(3), 7);
        assert_eq!(2.0f32.max_of(f32::NAN), 2.0);
    }
}
