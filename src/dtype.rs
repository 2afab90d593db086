//! The dtype model: element kind, item size and byte order.
//!
//! A [`Dtype`] is the parsed form of the `descr` entry of an `.npy` header,
//! such as `'<f8'` or `'|b1'`. Only the simple scalar descriptors are
//! supported; record and sub-array descriptors are not.

use crate::{
    endian::{host_byte_order, Endianness},
    Element,
};
use std::{fmt, mem};

/// The kind of value stored in an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// `b`
    Boolean,
    /// `i`
    Integer,
    /// `u`
    Unsigned,
    /// `f`
    Float,
    /// `c`
    Complex,
    /// Only carried by the null dtype.
    Unknown,
}

impl Kind {
    /// The character used for this kind in a dtype string.
    ///
    /// The null dtype's kind is spelled `!`.
    pub const fn as_char(self) -> char {
        match self {
            Self::Boolean => 'b',
            Self::Integer => 'i',
            Self::Unsigned => 'u',
            Self::Float => 'f',
            Self::Complex => 'c',
            Self::Unknown => '!',
        }
    }

    /// Parses a kind character. The sentinel `!` is not accepted.
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'b' => Some(Self::Boolean),
            'i' => Some(Self::Integer),
            'u' => Some(Self::Unsigned),
            'f' => Some(Self::Float),
            'c' => Some(Self::Complex),
            _ => None,
        }
    }

    /// Item sizes that may follow this kind in a dtype string with a byte
    /// order other than `|`.
    const fn multi_byte_sizes(self) -> &'static [usize] {
        match self {
            Self::Integer | Self::Unsigned => &[2, 4, 8],
            Self::Float => &[4, 8, 16],
            Self::Complex => &[8, 16, 32],
            Self::Boolean | Self::Unknown => &[],
        }
    }

    /// Item size implied when a dtype string has no size suffix.
    const fn default_item_size(self) -> Option<usize> {
        match self {
            Self::Integer | Self::Unsigned | Self::Float => Some(8),
            Self::Complex => Some(16),
            Self::Boolean | Self::Unknown => None,
        }
    }
}

/// Descriptor of an array element: its kind, size in bytes and byte order.
///
/// Every valid dtype corresponds to one of the supported element types (see
/// [`Element`]). The [null dtype](Dtype::null) stands in for "no dtype" and
/// serializes as `|!0`.
///
/// # Example
///
/// ```
/// use npy_array::Dtype;
///
/// let dtype = Dtype::from_string("|u1");
/// assert_eq!(dtype, Dtype::uint_8());
/// assert_eq!(dtype.to_string(), "|u1");
///
/// assert!(!Dtype::from_string("|i2").is_valid());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dtype {
    kind: Kind,
    item_size: usize,
    byte_order: Endianness,
}

impl Default for Dtype {
    fn default() -> Self {
        Self::null()
    }
}

impl Dtype {
    /// Single-byte dtypes have no byte order; all others use the host's.
    const fn native(kind: Kind, item_size: usize) -> Self {
        let byte_order = if item_size == 1 {
            Endianness::NotApplicable
        } else {
            host_byte_order()
        };
        Self { kind, item_size, byte_order }
    }

    /// The sentinel dtype: unknown kind, zero size, no byte order.
    pub const fn null() -> Self {
        Self {
            kind: Kind::Unknown,
            item_size: 0,
            byte_order: Endianness::NotApplicable,
        }
    }

    /// `|b1`
    pub const fn bool_8() -> Self {
        Self::native(Kind::Boolean, 1)
    }

    /// `|i1`
    pub const fn int_8() -> Self {
        Self::native(Kind::Integer, 1)
    }

    /// `i2` in host byte order.
    pub const fn int_16() -> Self {
        Self::native(Kind::Integer, 2)
    }

    /// `i4` in host byte order.
    pub const fn int_32() -> Self {
        Self::native(Kind::Integer, 4)
    }

    /// `i8` in host byte order.
    pub const fn int_64() -> Self {
        Self::native(Kind::Integer, 8)
    }

    /// `|u1`
    pub const fn uint_8() -> Self {
        Self::native(Kind::Unsigned, 1)
    }

    /// `u2` in host byte order.
    pub const fn uint_16() -> Self {
        Self::native(Kind::Unsigned, 2)
    }

    /// `u4` in host byte order.
    pub const fn uint_32() -> Self {
        Self::native(Kind::Unsigned, 4)
    }

    /// `u8` in host byte order.
    pub const fn uint_64() -> Self {
        Self::native(Kind::Unsigned, 8)
    }

    /// `f4` in host byte order.
    pub const fn float_32() -> Self {
        Self::native(Kind::Float, 4)
    }

    /// `f8` in host byte order.
    pub const fn float_64() -> Self {
        Self::native(Kind::Float, 8)
    }

    /// `f16` in host byte order (the platform `long double`, padded to 16
    /// bytes).
    pub const fn float_128() -> Self {
        Self::native(Kind::Float, 16)
    }

    /// `c8` in host byte order: two 32-bit floats.
    pub const fn complex_64() -> Self {
        Self::native(Kind::Complex, 8)
    }

    /// `c16` in host byte order: two 64-bit floats.
    pub const fn complex_128() -> Self {
        Self::native(Kind::Complex, 16)
    }

    /// `c32` in host byte order: two 128-bit floats.
    pub const fn complex_256() -> Self {
        Self::native(Kind::Complex, 32)
    }

    /// The canonical dtype of the element type `T`.
    pub fn from_type<T: Element>() -> Self {
        T::dtype()
    }

    /// Parses a dtype string such as `<f8`, `=i4`, `c` or `|b1`.
    ///
    /// Returns the null dtype if `s` is not a supported descriptor; check the
    /// result with [`Dtype::is_valid`].
    pub fn from_string(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "|b1" => return Some(Self::bool_8()),
            "|i1" => return Some(Self::int_8()),
            "|u1" => return Some(Self::uint_8()),
            _ => {}
        }

        let (byte_order, rest) = match s.chars().next().and_then(Endianness::from_char) {
            Some(Endianness::NotApplicable) => return None,
            Some(order) => (order.resolve(), &s[1..]),
            None => (host_byte_order(), s),
        };

        let mut chars = rest.chars();
        let kind = Kind::from_char(chars.next()?)?;
        let item_size = match chars.as_str() {
            "" => kind.default_item_size()?,
            "2" => 2,
            "4" => 4,
            "8" => 8,
            "16" => 16,
            "32" => 32,
            _ => return None,
        };
        kind.multi_byte_sizes()
            .contains(&item_size)
            .then_some(Self { kind, item_size, byte_order })
    }

    /// The element kind.
    pub const fn kind(&self) -> Kind {
        self.kind
    }

    /// The size of one element in bytes.
    pub const fn item_size(&self) -> usize {
        self.item_size
    }

    /// The byte order of one element.
    pub const fn byte_order(&self) -> Endianness {
        self.byte_order
    }

    /// Whether this is anything other than the null dtype.
    pub fn is_valid(&self) -> bool {
        *self != Self::null()
    }

    /// Moves the value out, leaving the null dtype in its place.
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.byte_order.as_char(),
            self.kind.as_char(),
            self.item_size
        )
    }
}
