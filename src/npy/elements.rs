use super::{Element, ReadDataError};
use crate::Dtype;
use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};
#[cfg(feature = "num-complex")]
use num_complex::Complex;
use std::io;

/// A `float128` element (`f16` in a dtype string), kept as its raw bytes.
///
/// Rust has no native type matching the platform `long double`, so the value
/// is stored verbatim, in host byte order, and can be round-tripped but not
/// computed with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LongDouble(pub [u8; 16]);

/// A `complex256` element (`c32` in a dtype string), kept as its raw bytes.
///
/// See [`LongDouble`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ComplexLongDouble(pub [u8; 32]);

impl ComplexLongDouble {
    /// The real part.
    pub fn re(&self) -> LongDouble {
        let mut out = LongDouble::default();
        out.0.copy_from_slice(&self.0[..16]);
        out
    }

    /// The imaginary part.
    pub fn im(&self) -> LongDouble {
        let mut out = LongDouble::default();
        out.0.copy_from_slice(&self.0[16..]);
        out
    }
}

impl Element for bool {
    fn dtype() -> Dtype {
        Dtype::bool_8()
    }

    fn read_into<R: io::Read>(mut reader: R, out: &mut [Self]) -> Result<(), ReadDataError> {
        let mut bytes = vec![0; out.len()];
        reader.read_exact(&mut bytes)?;
        for (elem, byte) in out.iter_mut().zip(bytes) {
            *elem = match byte {
                0x00 => false,
                0x01 => true,
                _ => return Err(ReadDataError::InvalidBool(byte)),
            };
        }
        Ok(())
    }

    fn write_slice<W: io::Write>(slice: &[Self], mut writer: W) -> io::Result<()> {
        let bytes: Vec<u8> = slice.iter().map(|&b| u8::from(b)).collect();
        writer.write_all(&bytes)
    }
}

impl Element for i8 {
    fn dtype() -> Dtype {
        Dtype::int_8()
    }

    fn read_into<R: io::Read>(mut reader: R, out: &mut [Self]) -> Result<(), ReadDataError> {
        reader.read_i8_into(out)?;
        Ok(())
    }

    fn write_slice<W: io::Write>(slice: &[Self], mut writer: W) -> io::Result<()> {
        slice.iter().try_for_each(|&elem| writer.write_i8(elem))
    }
}

impl Element for u8 {
    fn dtype() -> Dtype {
        Dtype::uint_8()
    }

    fn read_into<R: io::Read>(mut reader: R, out: &mut [Self]) -> Result<(), ReadDataError> {
        reader.read_exact(out)?;
        Ok(())
    }

    fn write_slice<W: io::Write>(slice: &[Self], mut writer: W) -> io::Result<()> {
        writer.write_all(slice)
    }
}

macro_rules! impl_multibyte_element {
    ($elem:ty, $dtype:ident, $read_into:ident, $write:ident) => {
        impl Element for $elem {
            fn dtype() -> Dtype {
                Dtype::$dtype()
            }

            fn read_into<R: io::Read>(
                mut reader: R,
                out: &mut [Self],
            ) -> Result<(), ReadDataError> {
                reader.$read_into::<NativeEndian>(out)?;
                Ok(())
            }

            fn write_slice<W: io::Write>(slice: &[Self], mut writer: W) -> io::Result<()> {
                slice
                    .iter()
                    .try_for_each(|&elem| writer.$write::<NativeEndian>(elem))
            }
        }
    };
}

impl_multibyte_element!(i16, int_16, read_i16_into, write_i16);
impl_multibyte_element!(i32, int_32, read_i32_into, write_i32);
impl_multibyte_element!(i64, int_64, read_i64_into, write_i64);
impl_multibyte_element!(u16, uint_16, read_u16_into, write_u16);
impl_multibyte_element!(u32, uint_32, read_u32_into, write_u32);
impl_multibyte_element!(u64, uint_64, read_u64_into, write_u64);
impl_multibyte_element!(f32, float_32, read_f32_into, write_f32);
impl_multibyte_element!(f64, float_64, read_f64_into, write_f64);

#[cfg(feature = "num-complex")]
macro_rules! impl_complex_element {
    ($float:ty, $dtype:ident, $read_into:ident, $write:ident) => {
        impl Element for Complex<$float> {
            fn dtype() -> Dtype {
                Dtype::$dtype()
            }

            fn read_into<R: io::Read>(
                mut reader: R,
                out: &mut [Self],
            ) -> Result<(), ReadDataError> {
                let mut parts: Vec<$float> = vec![0.; out.len() * 2];
                reader.$read_into::<NativeEndian>(&mut parts)?;
                for (elem, pair) in out.iter_mut().zip(parts.chunks_exact(2)) {
                    *elem = Complex::new(pair[0], pair[1]);
                }
                Ok(())
            }

            fn write_slice<W: io::Write>(slice: &[Self], mut writer: W) -> io::Result<()> {
                for elem in slice {
                    writer.$write::<NativeEndian>(elem.re)?;
                    writer.$write::<NativeEndian>(elem.im)?;
                }
                Ok(())
            }
        }
    };
}

#[cfg(feature = "num-complex")]
impl_complex_element!(f32, complex_64, read_f32_into, write_f32);
#[cfg(feature = "num-complex")]
impl_complex_element!(f64, complex_128, read_f64_into, write_f64);

macro_rules! impl_raw_element {
    ($elem:ty, $dtype:ident) => {
        impl Element for $elem {
            fn dtype() -> Dtype {
                Dtype::$dtype()
            }

            fn read_into<R: io::Read>(
                mut reader: R,
                out: &mut [Self],
            ) -> Result<(), ReadDataError> {
                for elem in out {
                    reader.read_exact(&mut elem.0)?;
                }
                Ok(())
            }

            fn write_slice<W: io::Write>(slice: &[Self], mut writer: W) -> io::Result<()> {
                slice.iter().try_for_each(|elem| writer.write_all(&elem.0))
            }
        }
    };
}

impl_raw_element!(LongDouble, float_128);
impl_raw_element!(ComplexLongDouble, complex_256);

#[cfg(test)]
mod tests {
    use super::*;

    fn encode<T: Element>(slice: &[T]) -> Vec<u8> {
        let mut out = Vec::new();
        T::write_slice(slice, &mut out).unwrap();
        out
    }

    fn decode<T: Element>(bytes: &[u8], len: usize) -> Result<Vec<T>, ReadDataError> {
        let mut out = vec![T::default(); len];
        T::read_into(bytes, &mut out)?;
        Ok(out)
    }

    #[test]
    fn native_byte_layout() {
        assert_eq!(encode(&[0x0102_u16]), 0x0102_u16.to_ne_bytes());
        assert_eq!(encode(&[-2_i32]), (-2_i32).to_ne_bytes());
        assert_eq!(encode(&[1.5_f64]), 1.5_f64.to_ne_bytes());
        assert_eq!(encode(&[-1_i8, 5]), [0xff, 0x05]);
        assert_eq!(encode(&[true, false]), [1, 0]);
    }

    #[test]
    fn item_size_matches_dtype() {
        fn check<T: Element>() {
            assert_eq!(encode(&vec![T::default(); 3]).len(), 3 * T::dtype().item_size());
            assert_eq!(std::mem::size_of::<T>(), T::dtype().item_size());
        }
        check::<bool>();
        check::<i8>();
        check::<u16>();
        check::<i64>();
        check::<f32>();
        check::<LongDouble>();
        check::<ComplexLongDouble>();
        #[cfg(feature = "num-complex")]
        {
            check::<Complex<f32>>();
            check::<Complex<f64>>();
        }
    }

    #[test]
    fn read_back() {
        let values = [1.0_f32, -0.5, f32::MAX];
        assert_eq!(decode::<f32>(&encode(&values), 3).unwrap(), values);

        let values = [u64::MAX, 0, 42];
        assert_eq!(decode::<u64>(&encode(&values), 3).unwrap(), values);
    }

    #[cfg(feature = "num-complex")]
    #[test]
    fn complex_layout() {
        let values = [Complex::new(1.0_f64, -2.0), Complex::new(0.25, 8.0)];
        let bytes = encode(&values);
        assert_eq!(&bytes[..8], 1.0_f64.to_ne_bytes());
        assert_eq!(&bytes[8..16], (-2.0_f64).to_ne_bytes());
        assert_eq!(decode::<Complex<f64>>(&bytes, 2).unwrap(), values);
    }

    #[test]
    fn raw_long_double() {
        let mut raw = [0_u8; 32];
        raw.iter_mut().enumerate().for_each(|(i, b)| *b = i as u8);
        let value = ComplexLongDouble(raw);
        assert_eq!(value.re().0[0], 0);
        assert_eq!(value.im().0[0], 16);
        assert_eq!(decode::<ComplexLongDouble>(&encode(&[value]), 1).unwrap(), [value]);
    }

    #[test]
    fn invalid_bool() {
        assert!(matches!(
            decode::<bool>(&[0, 1, 2], 3),
            Err(ReadDataError::InvalidBool(2))
        ));
    }

    #[test]
    fn missing_data() {
        assert!(matches!(
            decode::<i32>(&[0, 0, 0, 0, 0], 2),
            Err(ReadDataError::Io(_))
        ));
    }
}
