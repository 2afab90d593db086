//! Byte order of the host and of `.npy` data.

use std::fmt;

/// Byte order of a multi-byte element, as spelled in a dtype string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endianness {
    /// `<`
    Little,
    /// `>`
    Big,
    /// `=`, only seen while parsing; always resolved to [`host_byte_order`].
    Native,
    /// `|`, for single-byte elements and the null dtype.
    NotApplicable,
}

impl Endianness {
    /// The character used for this byte order in a dtype string.
    pub const fn as_char(self) -> char {
        match self {
            Self::Little => '<',
            Self::Big => '>',
            Self::Native => '=',
            Self::NotApplicable => '|',
        }
    }

    /// Parses a byte-order character.
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '<' => Some(Self::Little),
            '>' => Some(Self::Big),
            '=' => Some(Self::Native),
            '|' => Some(Self::NotApplicable),
            _ => None,
        }
    }

    /// Replaces [`Endianness::Native`] with the concrete host order.
    pub const fn resolve(self) -> Self {
        match self {
            Self::Native => host_byte_order(),
            other => other,
        }
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

const HOST_BYTE_ORDER: Endianness = match 0x0102_u16.to_ne_bytes() {
    [0x01, 0x02] => Endianness::Big,
    _ => Endianness::Little,
};

/// Byte order of the machine this crate was compiled for.
///
/// Always [`Endianness::Little`] or [`Endianness::Big`].
pub const fn host_byte_order() -> Endianness {
    HOST_BYTE_ORDER
}
