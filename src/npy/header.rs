use crate::Dtype;
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use log::{debug, trace};
use std::{error::Error, fmt, io};

/// Magic string to indicate npy format.
const MAGIC_STRING: &[u8] = b"\x93NUMPY";

/// The only supported major version. The minor version is not checked.
const MAJOR_VERSION: u8 = 1;

/// Version written by this crate.
const VERSION: [u8; VERSION_NUM_BYTES] = [MAJOR_VERSION, 0];

/// 1 byte for major version, 1 byte for minor version.
const VERSION_NUM_BYTES: usize = 2;

/// Version 1.0 stores `HEADER_LEN` as a little-endian `u16`.
const HEADER_LEN_NUM_BYTES: usize = 2;

/// Bytes before the array format description.
const PREFIX_LEN: usize = MAGIC_STRING.len() + VERSION_NUM_BYTES + HEADER_LEN_NUM_BYTES;

/// The total header length (including magic string, version number, header
/// length value, array format description, padding, and final newline) must be
/// evenly divisible by this value.
const HEADER_DIVISOR: usize = 64;

/// Ways in which the header dictionary of a `.npy` file can be ill-formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// The header is missing a newline at the end.
    MissingNewline,
    /// The header contains non-ASCII characters, which version 1.0 forbids.
    NonAscii,
    /// The parentheses of the shape tuple are unbalanced.
    UnbalancedParentheses,
    /// An entry of the dictionary is not a `key: value` pair.
    MalformedEntry(String),
    /// An unknown key was found in the dictionary.
    UnknownKey(String),
    /// A key appeared more than once.
    DuplicateKey(&'static str),
    /// A required key was missing from the dictionary.
    MissingKey(&'static str),
    /// An illegal value was found for a key in the dictionary.
    IllegalValue {
        /// The key for which the value was illegal.
        key: &'static str,
        /// The illegal value, with quotes and whitespace removed.
        value: String,
    },
    /// `descr` is a valid dtype, but not the one of the array's element type.
    DtypeMismatch {
        /// The dtype of the element type.
        expected: Dtype,
        /// The dtype found in the header.
        found: Dtype,
    },
    /// `HEADER_LEN` exceeds what a version 1.0 header can encode.
    TooLong(usize),
}

impl Error for HeaderError {}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::MissingNewline => write!(f, "newline missing at end of header"),
            Self::NonAscii => write!(f, "non-ascii in array format string"),
            Self::UnbalancedParentheses => write!(f, "unbalanced parentheses in header"),
            Self::MalformedEntry(entry) => write!(f, "malformed entry: {entry:?}"),
            Self::UnknownKey(key) => write!(f, "unknown key: {key}"),
            Self::DuplicateKey(key) => write!(f, "duplicate key: {key}"),
            Self::MissingKey(key) => write!(f, "missing key: {key}"),
            Self::IllegalValue { key, value } => write!(f, "illegal value for key {key}: {value}"),
            Self::DtypeMismatch { expected, found } => {
                write!(f, "descriptor {found} does not match element type {expected}")
            }
            Self::TooLong(len) => write!(f, "HEADER_LEN {len} does not fit in 16 bits"),
        }
    }
}

/// Failures of [`Header::from_reader`], remapped onto `NpyError` by the
/// caller.
#[derive(Debug)]
pub(crate) enum ReadHeaderError {
    Io(io::Error),
    MagicString,
    Version { major: u8, minor: u8 },
    IllFormed(HeaderError),
}

impl From<io::Error> for ReadHeaderError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<HeaderError> for ReadHeaderError {
    fn from(err: HeaderError) -> Self {
        Self::IllFormed(err)
    }
}

/// The decoded header dictionary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Header {
    pub dtype: Dtype,
    pub fortran_order: bool,
    pub shape: Vec<usize>,
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{'descr': '{}', 'fortran_order': ", self.dtype)?;
        f.write_str(if self.fortran_order { "True" } else { "False" })?;
        f.write_str(", 'shape': (")?;
        for (i, dim) in self.shape.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{dim}")?;
        }
        if self.shape.len() == 1 {
            f.write_str(",")?;
        }
        f.write_str("), }")
    }
}

/// Splits `s` on commas that are not enclosed in parentheses.
///
/// A single trailing comma is allowed and does not produce an empty entry.
fn split_entries(s: &str) -> Result<Vec<&str>, HeaderError> {
    let mut entries = Vec::new();
    let mut depth = 0_usize;
    let mut start = 0;
    for (i, b) in s.bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(HeaderError::UnbalancedParentheses)?;
            }
            b',' if depth == 0 => {
                entries.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(HeaderError::UnbalancedParentheses);
    }
    if start < s.len() {
        entries.push(&s[start..]);
    }
    match entries.iter().find(|entry| entry.is_empty()) {
        Some(_) => Err(HeaderError::MalformedEntry(s.to_owned())),
        None => Ok(entries),
    }
}

fn parse_descr(value: &str) -> Result<Dtype, HeaderError> {
    let dtype = Dtype::from_string(value);
    if dtype.is_valid() {
        Ok(dtype)
    } else {
        Err(HeaderError::IllegalValue { key: "descr", value: value.to_owned() })
    }
}

fn parse_fortran_order(value: &str) -> Result<bool, HeaderError> {
    match value {
        "True" => Ok(true),
        "False" => Ok(false),
        _ => Err(HeaderError::IllegalValue { key: "fortran_order", value: value.to_owned() }),
    }
}

fn parse_shape(value: &str) -> Result<Vec<usize>, HeaderError> {
    fn parse_dim(dim: &str) -> Option<usize> {
        if dim.is_empty() || !dim.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        dim.parse().ok().filter(|&dim| dim > 0)
    }

    let illegal = || HeaderError::IllegalValue { key: "shape", value: value.to_owned() };
    let inner = value
        .strip_prefix('(')
        .and_then(|v| v.strip_suffix(')'))
        .ok_or_else(illegal)?;
    let inner = inner.strip_suffix(',').unwrap_or(inner);
    if inner.is_empty() {
        return Err(illegal());
    }
    inner
        .split(',')
        .map(|dim| parse_dim(dim).ok_or_else(illegal))
        .collect()
}

fn set_once<T>(slot: &mut Option<T>, key: &'static str, value: T) -> Result<(), HeaderError> {
    match slot.replace(value) {
        Some(_) => Err(HeaderError::DuplicateKey(key)),
        None => Ok(()),
    }
}

impl Header {
    /// Parses the array format description (without the trailing newline).
    pub(crate) fn parse(text: &str) -> Result<Self, HeaderError> {
        let stripped: String = text
            .chars()
            .filter(|c| !matches!(c, ' ' | '\n' | '{' | '}' | '\''))
            .collect();
        debug!("npy header: {stripped}");

        let mut dtype = None;
        let mut fortran_order = None;
        let mut shape = None;
        for entry in split_entries(&stripped)? {
            let (key, value) = entry
                .split_once(':')
                .ok_or_else(|| HeaderError::MalformedEntry(entry.to_owned()))?;
            match key {
                "descr" => set_once(&mut dtype, "descr", parse_descr(value)?)?,
                "fortran_order" => {
                    set_once(&mut fortran_order, "fortran_order", parse_fortran_order(value)?)?;
                }
                "shape" => set_once(&mut shape, "shape", parse_shape(value)?)?,
                _ => return Err(HeaderError::UnknownKey(key.to_owned())),
            }
        }
        let dtype = dtype.ok_or(HeaderError::MissingKey("descr"))?;
        let fortran_order = fortran_order.ok_or(HeaderError::MissingKey("fortran_order"))?;
        let shape = shape.ok_or(HeaderError::MissingKey("shape"))?;
        debug!(
            "npy header: byte order {}, item size {}, fortran order {}, shape {:?}",
            dtype.byte_order(),
            dtype.item_size(),
            fortran_order,
            shape,
        );
        Ok(Self { dtype, fortran_order, shape })
    }

    pub(crate) fn from_reader<R: io::Read>(mut reader: R) -> Result<Self, ReadHeaderError> {
        // Check for magic string
        {
            let mut buf = [0; MAGIC_STRING.len()];
            reader.read_exact(&mut buf)?;
            if buf != MAGIC_STRING {
                return Err(ReadHeaderError::MagicString);
            }
        }

        // Get version number
        let mut buf = [0; VERSION_NUM_BYTES];
        reader.read_exact(&mut buf)?;
        let [major, minor] = buf;
        if major != MAJOR_VERSION {
            return Err(ReadHeaderError::Version { major, minor });
        }

        // Get `HEADER_LEN`; `read_u16` swaps bytes on big-endian hosts
        let header_len = usize::from(reader.read_u16::<LittleEndian>()?);

        // Parse the dictionary describing the array's format
        let mut buf = vec![0; header_len];
        reader.read_exact(&mut buf)?;
        let without_newline = match buf.split_last() {
            Some((&b'\n', rest)) => rest,
            Some(_) | None => return Err(HeaderError::MissingNewline.into()),
        };
        if !without_newline.is_ascii() {
            return Err(HeaderError::NonAscii.into());
        }
        let text = std::str::from_utf8(without_newline).map_err(|_| HeaderError::NonAscii)?;
        Ok(Self::parse(text)?)
    }

    /// Encodes the full header: magic string, version, `HEADER_LEN`, the
    /// padded array format description and the final newline.
    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>, HeaderError> {
        /// Length of a '\n' char in bytes.
        const NEWLINE_LEN: usize = b"\n".len();

        let arr_format = self.to_string();
        let unpadded_total_len = PREFIX_LEN + arr_format.len() + NEWLINE_LEN;
        let padding_len = (HEADER_DIVISOR - unpadded_total_len % HEADER_DIVISOR) % HEADER_DIVISOR;
        let total_len = unpadded_total_len + padding_len;
        let header_len = total_len - PREFIX_LEN;
        let header_len_u16 =
            u16::try_from(header_len).map_err(|_| HeaderError::TooLong(header_len))?;

        let mut out = Vec::with_capacity(total_len);
        out.extend_from_slice(MAGIC_STRING);
        out.extend_from_slice(&VERSION);
        let mut len_bytes = [0; HEADER_LEN_NUM_BYTES];
        LittleEndian::write_u16(&mut len_bytes, header_len_u16);
        out.extend_from_slice(&len_bytes);
        out.extend_from_slice(arr_format.as_bytes());
        out.resize(total_len - NEWLINE_LEN, b' ');
        out.push(b'\n');

        debug_assert_eq!(out.len() % HEADER_DIVISOR, 0);
        trace!("npy header: writing {total_len} bytes: {arr_format}");
        Ok(out)
    }
}
