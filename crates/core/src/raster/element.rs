//! Cell value types

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Numeric types a [`Raster`](super::Raster) cell may hold.
///
/// Land-cover codes arrive as integers, every factor is computed in `f64`.
pub trait RasterElement:
    Copy + Debug + PartialOrd + NumCast + Zero + Send + Sync + 'static
{
    /// Value used for missing cells when no explicit nodata is set
    fn default_nodata() -> Self;

    /// Whether `self` is a missing cell under the given nodata marker
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Whether the type is floating point
    fn is_float() -> bool;

    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }
}

macro_rules! integer_element {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::MIN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                nodata == Some(*self)
            }

            fn is_float() -> bool {
                false
            }
        }
    )*};
}

macro_rules! float_element {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::NAN
            }

            // NaN always counts as missing, with or without a marker.
            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                self.is_nan()
                    || nodata
                        .map(|nd| (self - nd).abs() < <$t>::EPSILON * 100.0)
                        .unwrap_or(false)
            }

            fn is_float() -> bool {
                true
            }
        }
    )*};
}

integer_element!(u8, u16, u32, i16, i32);
float_element!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_is_always_nodata() {
        assert!(f64::NAN.is_nodata(None));
        assert!(f64::NAN.is_nodata(Some(-9999.0)));
        assert!((-9999.0f64).is_nodata(Some(-9999.0)));
        assert!(!(1.0f64).is_nodata(None));
    }

    #[test]
    fn integer_nodata_is_exact() {
        assert!(0u8.is_nodata(Some(0)));
        assert!(!10u8.is_nodata(Some(0)));
        assert!(!0u8.is_nodata(None));
    }
}
