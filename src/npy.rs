mod elements;
mod header;

pub use self::{
    elements::{ComplexLongDouble, LongDouble},
    header::HeaderError,
};
use self::header::{Header, ReadHeaderError};
use crate::Dtype;
use log::debug;
use std::{
    any, fs, io, mem,
    ops::{Index, IndexMut},
    path::Path,
};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Reads an `.npy` file located at the specified path.
///
/// This is a convenience function for [`NpyArray::from_path`].
///
/// # Example
///
/// ```
/// use npy_array::{read_npy, NpyArray};
/// # use npy_array::NpyError;
///
/// let arr: NpyArray<i32> = read_npy("resources/array.npy")?;
/// assert_eq!(arr.shape(), [2, 3]);
/// # Ok::<_, NpyError>(())
/// ```
pub fn read_npy<P, T>(path: P) -> Result<NpyArray<T>, NpyError>
where
    P: AsRef<Path>,
    T: Element,
{
    NpyArray::from_path(path)
}

/// Writes an array to an `.npy` file at the specified path.
///
/// This function will create the file if it does not exist, or overwrite it if
/// it does. It is a convenience function for [`NpyArray::save`].
///
/// # Example
///
/// ```no_run
/// use npy_array::{write_npy, NpyArray};
/// # use npy_array::NpyError;
///
/// let arr = NpyArray::<i32>::with_shape_and_data([2, 3], [1, 2, 3, 4, 5, 6])?;
/// write_npy("array.npy", &arr)?;
/// # Ok::<_, NpyError>(())
/// ```
pub fn write_npy<P, T>(path: P, array: &NpyArray<T>) -> Result<(), NpyError>
where
    P: AsRef<Path>,
    T: Element,
{
    array.save(path)
}

/// An array element type that can be read from and written to an `.npy` file.
///
/// Implemented for [`bool`], the fixed-size integers up to 64 bits, [`f32`],
/// [`f64`], [`LongDouble`], [`ComplexLongDouble`] and, with the
/// `num-complex` feature, `Complex<f32>` and `Complex<f64>`.
pub trait Element: Sized + Clone + Default {
    /// The canonical dtype of this type.
    ///
    /// Implementations outside this crate may return [`Dtype::null`], in
    /// which case arrays of this type cannot be constructed.
    fn dtype() -> Dtype;

    /// Fills `out` with elements read from `reader` in host byte order.
    ///
    /// Returns `Err(_)` if `reader` ends before `out` is filled or if the
    /// bytes are not a valid representation of `Self`.
    fn read_into<R: io::Read>(reader: R, out: &mut [Self]) -> Result<(), ReadDataError>;

    /// Writes a slice of `Self` to the writer in host byte order.
    fn write_slice<W: io::Write>(slice: &[Self], writer: W) -> io::Result<()>;
}

/// An error reading array data.
#[derive(Debug, Error)]
pub enum ReadDataError {
    /// An error caused by I/O, including reaching EOF early.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A `bool` element was neither `0x00` nor `0x01`.
    #[error("invalid boolean byte {0:#04x}")]
    InvalidBool(u8),
}

/// The kind of an [`NpyError`], without its details.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Opening, reading or writing the file failed.
    InputOutput,
    /// The file does not start with `\x93NUMPY`.
    InvalidMagicString,
    /// The major version is not 1.
    UnsupportedVersion,
    /// The header dictionary is malformed or does not match the element type.
    IllFormedHeader,
    /// The array does not fit in memory.
    InsufficientMemory,
    /// The element type has no dtype.
    UnsupportedDtype,
    /// The shape does not describe the given data.
    UnmatchedShapeData,
    /// Any other failure.
    Generic,
}

/// An error constructing, reading or writing an [`NpyArray`].
#[derive(Debug, Error)]
pub enum NpyError {
    /// An error caused by I/O.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The start of the file does not match the magic string.
    #[error("start does not match magic string")]
    InvalidMagicString,
    /// The version number is not supported.
    #[error("unsupported version number: {major}.{minor}")]
    UnsupportedVersion {
        /// Major version number.
        major: u8,
        /// Minor version number.
        minor: u8,
    },
    /// An error in the header dictionary.
    #[error("ill-formed header: {0}")]
    IllFormedHeader(#[from] HeaderError),
    /// Allocating the data of this shape failed or its length overflows.
    #[error("insufficient memory for an array of shape {0:?}")]
    InsufficientMemory(Vec<usize>),
    /// The element type has no dtype.
    #[error("element type {0} has no dtype")]
    UnsupportedDtype(&'static str),
    /// The shape is empty, has a zero-length axis, or its number of elements
    /// differs from the length of the data.
    #[error("shape {shape:?} does not describe {len} elements")]
    UnmatchedShapeData {
        /// The requested shape.
        shape: Vec<usize>,
        /// The number of elements provided.
        len: usize,
    },
    /// Any other failure.
    #[error("{0}")]
    Generic(String),
}

impl NpyError {
    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::InputOutput,
            Self::InvalidMagicString => ErrorKind::InvalidMagicString,
            Self::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
            Self::IllFormedHeader(_) => ErrorKind::IllFormedHeader,
            Self::InsufficientMemory(_) => ErrorKind::InsufficientMemory,
            Self::UnsupportedDtype(_) => ErrorKind::UnsupportedDtype,
            Self::UnmatchedShapeData { .. } => ErrorKind::UnmatchedShapeData,
            Self::Generic(_) => ErrorKind::Generic,
        }
    }
}

impl From<ReadHeaderError> for NpyError {
    fn from(err: ReadHeaderError) -> Self {
        match err {
            ReadHeaderError::Io(err) => Self::Io(err),
            ReadHeaderError::MagicString => Self::InvalidMagicString,
            ReadHeaderError::Version { major, minor } => Self::UnsupportedVersion { major, minor },
            ReadHeaderError::IllFormed(err) => Self::IllFormedHeader(err),
        }
    }
}

impl From<ReadDataError> for NpyError {
    fn from(err: ReadDataError) -> Self {
        match err {
            ReadDataError::Io(err) => Self::Io(err),
            err @ ReadDataError::InvalidBool(_) => {
                Self::Generic(format!("error parsing data: {err}"))
            }
        }
    }
}

/// An out-of-range index into an [`NpyArray`].
///
/// This is a misuse of the array rather than a problem with a file, so it is
/// kept apart from [`NpyError`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IndexError {
    /// A flat index not below the number of elements.
    #[error("index {index} is out of range for array of size {size}")]
    OutOfRange {
        /// The requested index.
        index: usize,
        /// The number of elements.
        size: usize,
    },
    /// A multi-index of the wrong length, or with a component not below the
    /// corresponding axis length.
    #[error("index {index:?} is out of range for array of shape {shape:?}")]
    OutOfBounds {
        /// The requested multi-index.
        index: Vec<usize>,
        /// The shape of the array.
        shape: Vec<usize>,
    },
}

/// An owned, row-major, multi-dimensional array of `T` that can be loaded
/// from and saved to `.npy` files.
///
/// The `fortran_order` flag of a file is kept as metadata and written back on
/// save, but the data is always indexed in row-major (C) order.
///
/// # Example
///
/// ```
/// use npy_array::NpyArray;
///
/// let mut arr = NpyArray::<f64>::with_shape([2, 3])?;
/// arr[[1, 2]] = 4.5;
/// assert_eq!(arr[5], 4.5);
/// assert_eq!(arr.strides(), [3, 1]);
/// # Ok::<_, npy_array::NpyError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct NpyArray<T> {
    shape: Vec<usize>,
    strides: Vec<usize>,
    dtype: Dtype,
    fortran_order: bool,
    data: Vec<T>,
}

/// The empty array: no shape, null dtype, no data. This is what remains after
/// [`NpyArray::take`].
impl<T> Default for NpyArray<T> {
    fn default() -> Self {
        Self {
            shape: Vec::new(),
            strides: Vec::new(),
            dtype: Dtype::null(),
            fortran_order: false,
            data: Vec::new(),
        }
    }
}

fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for i in (1..shape.len()).rev() {
        strides[i - 1] = strides[i] * shape[i];
    }
    strides
}

/// Computes the number of elements of `shape`, where the element type is `T`.
///
/// Returns `None` if the number of elements or the length in bytes would
/// overflow `isize`.
fn shape_length_checked<T>(shape: &[usize]) -> Option<usize> {
    const MAX: usize = isize::MAX as usize;
    let len = shape.iter().try_fold(1_usize, |len, &dim| len.checked_mul(dim))?;
    (len.checked_mul(mem::size_of::<T>())? <= MAX).then_some(len)
}

fn element_dtype<T: Element>() -> Result<Dtype, NpyError> {
    let dtype = Dtype::from_type::<T>();
    if dtype.is_valid() {
        Ok(dtype)
    } else {
        Err(NpyError::UnsupportedDtype(any::type_name::<T>()))
    }
}

/// Allocates `product(shape)` default elements.
fn allocate<T: Element>(shape: &[usize]) -> Result<Vec<T>, NpyError> {
    let len = shape_length_checked::<T>(shape)
        .ok_or_else(|| NpyError::InsufficientMemory(shape.to_vec()))?;
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| NpyError::InsufficientMemory(shape.to_vec()))?;
    data.resize(len, T::default());
    Ok(data)
}

impl<T: Element> NpyArray<T> {
    fn from_parts(shape: Vec<usize>, dtype: Dtype, fortran_order: bool, data: Vec<T>) -> Self {
        debug_assert_eq!(shape.iter().product::<usize>(), data.len());
        Self {
            strides: row_major_strides(&shape),
            shape,
            dtype,
            fortran_order,
            data,
        }
    }

    /// Loads the `.npy` file at `path`.
    ///
    /// The file's `descr` must be exactly the dtype of `T`; no conversion of
    /// kind, size or byte order is performed.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, NpyError> {
        let path = path.as_ref();
        debug!("loading {}", path.display());
        let file = fs::File::open(path)?;
        Self::read_npy(io::BufReader::new(file))
    }

    /// Reads an array in [`.npy`
    /// format](https://numpy.org/doc/stable/reference/generated/numpy.lib.format.html)
    /// from `reader`.
    ///
    /// Bytes after the last element are left unread.
    pub fn read_npy<R: io::Read>(mut reader: R) -> Result<Self, NpyError> {
        let dtype = element_dtype::<T>()?;
        let header = Header::from_reader(&mut reader)?;
        if header.dtype != dtype {
            return Err(HeaderError::DtypeMismatch { expected: dtype, found: header.dtype }.into());
        }
        let mut data = allocate::<T>(&header.shape)?;
        T::read_into(&mut reader, &mut data)?;
        debug!("read {} elements of {dtype}", data.len());
        Ok(Self::from_parts(header.shape, dtype, header.fortran_order, data))
    }

    /// Creates an array of the given shape filled with `T::default()`.
    ///
    /// The shape must be non-empty with no zero-length axis.
    pub fn with_shape<S: Into<Vec<usize>>>(shape: S) -> Result<Self, NpyError> {
        let dtype = element_dtype::<T>()?;
        let shape = shape.into();
        if shape.is_empty() || shape.contains(&0) {
            return Err(NpyError::UnmatchedShapeData { shape, len: 0 });
        }
        let data = allocate::<T>(&shape)?;
        Ok(Self::from_parts(shape, dtype, false, data))
    }

    /// Creates an array of the given shape that takes ownership of `data`.
    ///
    /// `data` is in row-major order and its length must equal the product of
    /// the shape.
    pub fn with_shape_and_data<S, D>(shape: S, data: D) -> Result<Self, NpyError>
    where
        S: Into<Vec<usize>>,
        D: Into<Vec<T>>,
    {
        let dtype = element_dtype::<T>()?;
        let shape = shape.into();
        let data = data.into();
        let len = shape.iter().try_fold(1_usize, |len, &dim| len.checked_mul(dim));
        if shape.is_empty() || len != Some(data.len()) || data.is_empty() {
            return Err(NpyError::UnmatchedShapeData { shape, len: data.len() });
        }
        Ok(Self::from_parts(shape, dtype, false, data))
    }

    fn header(&self) -> Result<Vec<u8>, NpyError> {
        if !self.dtype.is_valid() {
            return Err(NpyError::UnsupportedDtype(any::type_name::<T>()));
        }
        let header = Header {
            dtype: self.dtype,
            fortran_order: self.fortran_order,
            shape: self.shape.clone(),
        };
        Ok(header.to_bytes()?)
    }

    fn write_with_header<W: io::Write>(
        &self,
        header: &[u8],
        mut writer: W,
    ) -> Result<(), NpyError> {
        writer.write_all(header)?;
        T::write_slice(&self.data, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Writes the array to `writer` in [`.npy`
    /// format](https://numpy.org/doc/stable/reference/generated/numpy.lib.format.html).
    ///
    /// If writes are expensive, wrap the writer in a [`std::io::BufWriter`].
    /// This method calls [`io::Write::flush()`] on the writer before
    /// returning.
    pub fn write_npy<W: io::Write>(&self, writer: W) -> Result<(), NpyError> {
        let header = self.header()?;
        self.write_with_header(&header, writer)
    }

    /// Saves the array to `path`, creating or replacing the file.
    ///
    /// The array is written to a temporary file in the same directory, which
    /// is renamed over `path` once complete. A failed save leaves any
    /// existing file at `path` untouched. The new file is created with the
    /// permissions of [`tempfile::NamedTempFile`] (`0o600` on Unix).
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), NpyError> {
        let path = path.as_ref();
        let header = self.header()?;
        debug!("saving {} elements of {} to {}", self.data.len(), self.dtype, path.display());
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        self.write_with_header(&header, io::BufWriter::new(file.as_file_mut()))?;
        file.persist(path).map_err(|err| err.error)?;
        Ok(())
    }
}

impl<T> NpyArray<T> {
    /// The length of each axis.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// The number of elements to skip to advance one step along each axis.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// The number of axes.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// The dtype of the elements; the null dtype for an empty array.
    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    /// Whether the file this array came from declared column-major order.
    pub fn fortran_order(&self) -> bool {
        self.fortran_order
    }

    /// Sets the `fortran_order` flag written by [`NpyArray::save`]. The data
    /// is not reordered.
    pub fn set_fortran_order(&mut self, fortran_order: bool) {
        self.fortran_order = fortran_order;
    }

    /// The number of elements.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// The size of the data in bytes.
    pub fn byte_size(&self) -> usize {
        self.data.len() * mem::size_of::<T>()
    }

    /// The elements in row-major order.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The elements in row-major order.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consumes the array, returning its elements in row-major order.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Moves the contents out, leaving the empty array in their place.
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// The element at flat position `index`.
    pub fn get(&self, index: usize) -> Result<&T, IndexError> {
        let size = self.size();
        self.data.get(index).ok_or(IndexError::OutOfRange { index, size })
    }

    /// The element at flat position `index`.
    pub fn get_mut(&mut self, index: usize) -> Result<&mut T, IndexError> {
        let size = self.size();
        self.data.get_mut(index).ok_or(IndexError::OutOfRange { index, size })
    }

    /// The element at a multi-index. A single-component index is a flat
    /// index, as with [`NpyArray::get`].
    pub fn at(&self, index: &[usize]) -> Result<&T, IndexError> {
        let offset = self.offset(index)?;
        self.data.get(offset).ok_or_else(|| self.out_of_bounds(index))
    }

    /// The element at a multi-index. A single-component index is a flat
    /// index, as with [`NpyArray::get_mut`].
    pub fn at_mut(&mut self, index: &[usize]) -> Result<&mut T, IndexError> {
        let offset = self.offset(index)?;
        let err = self.out_of_bounds(index);
        self.data.get_mut(offset).ok_or(err)
    }

    fn out_of_bounds(&self, index: &[usize]) -> IndexError {
        IndexError::OutOfBounds {
            index: index.to_vec(),
            shape: self.shape.clone(),
        }
    }

    /// Maps a multi-index to a flat position. The empty array has no valid
    /// multi-index.
    fn offset(&self, index: &[usize]) -> Result<usize, IndexError> {
        if let &[index] = index {
            let size = self.size();
            return if index < size {
                Ok(index)
            } else {
                Err(IndexError::OutOfRange { index, size })
            };
        }
        let in_bounds = !self.shape.is_empty()
            && index.len() == self.shape.len()
            && index.iter().zip(&self.shape).all(|(i, dim)| i < dim);
        if !in_bounds {
            return Err(self.out_of_bounds(index));
        }
        Ok(index.iter().zip(&self.strides).map(|(i, stride)| i * stride).sum())
    }
}

impl<T> Index<usize> for NpyArray<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if `index` is out of range.
    fn index(&self, index: usize) -> &T {
        self.get(index).unwrap_or_else(|err| panic!("{err}"))
    }
}

impl<T> IndexMut<usize> for NpyArray<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        self.get_mut(index).unwrap_or_else(|err| panic!("{err}"))
    }
}

impl<T> Index<&[usize]> for NpyArray<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if `index` is out of range.
    fn index(&self, index: &[usize]) -> &T {
        self.at(index).unwrap_or_else(|err| panic!("{err}"))
    }
}

impl<T> IndexMut<&[usize]> for NpyArray<T> {
    fn index_mut(&mut self, index: &[usize]) -> &mut T {
        self.at_mut(index).unwrap_or_else(|err| panic!("{err}"))
    }
}

impl<T, const N: usize> Index<[usize; N]> for NpyArray<T> {
    type Output = T;

    fn index(&self, index: [usize; N]) -> &T {
        &self[&index[..]]
    }
}

impl<T, const N: usize> IndexMut<[usize; N]> for NpyArray<T> {
    fn index_mut(&mut self, index: [usize; N]) -> &mut T {
        &mut self[&index[..]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default, Debug, PartialEq)]
    struct Opaque;

    impl Element for Opaque {
        fn dtype() -> Dtype {
            Dtype::null()
        }

        fn read_into<R: io::Read>(_: R, _: &mut [Self]) -> Result<(), ReadDataError> {
            Ok(())
        }

        fn write_slice<W: io::Write>(_: &[Self], _: W) -> io::Result<()> {
            Ok(())
        }
    }

    /// A byte whose writes always fail.
    #[derive(Clone, Default, Debug, PartialEq)]
    struct Unwritable(u8);

    impl Element for Unwritable {
        fn dtype() -> Dtype {
            Dtype::uint_8()
        }

        fn read_into<R: io::Read>(_: R, _: &mut [Self]) -> Result<(), ReadDataError> {
            Ok(())
        }

        fn write_slice<W: io::Write>(_: &[Self], _: W) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::WriteZero, "device full"))
        }
    }

    #[test]
    fn strides() {
        assert_eq!(row_major_strides(&[5]), [1]);
        assert_eq!(row_major_strides(&[2, 3]), [3, 1]);
        assert_eq!(row_major_strides(&[1, 256, 32, 32]), [262144, 1024, 32, 1]);
        assert!(row_major_strides(&[]).is_empty());
    }

    #[test]
    fn length_overflow() {
        assert_eq!(shape_length_checked::<u8>(&[2, 3, 4]), Some(24));
        assert_eq!(shape_length_checked::<u64>(&[usize::MAX, 2]), None);
        assert_eq!(shape_length_checked::<u64>(&[usize::MAX / 4]), None);
    }

    #[test]
    fn with_shape_defaults() {
        let arr = NpyArray::<i16>::with_shape(vec![4, 2]).unwrap();
        assert_eq!(arr.shape(), [4, 2]);
        assert_eq!(arr.strides(), [2, 1]);
        assert_eq!(arr.ndim(), 2);
        assert_eq!(arr.dtype(), Dtype::int_16());
        assert!(!arr.fortran_order());
        assert_eq!(arr.size(), 8);
        assert_eq!(arr.byte_size(), 16);
        assert!(arr.as_slice().iter().all(|&x| x == 0));
    }

    #[test]
    fn with_shape_and_data() {
        let arr = NpyArray::<u8>::with_shape_and_data([2, 3], [1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(arr.size(), 6);
        assert_eq!(arr.byte_size(), 6);
        assert_eq!(arr.dtype(), Dtype::uint_8());

        let shape = vec![3, 2];
        let data = vec![0.5_f32; 6];
        let arr = NpyArray::<f32>::with_shape_and_data(&shape[..], &data[..]).unwrap();
        assert_eq!(arr.shape(), shape);
        assert_eq!(arr.byte_size(), 24);
    }

    #[test]
    fn unmatched_shape_data() {
        let err = NpyArray::<u8>::with_shape_and_data([2, 3, 4], [1, 2, 3, 4]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnmatchedShapeData);

        let shapes: [Vec<usize>; 3] = [vec![], vec![0], vec![2, 0]];
        for shape in shapes {
            let err = NpyArray::<u8>::with_shape_and_data(shape.clone(), Vec::new()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnmatchedShapeData);
            let err = NpyArray::<u8>::with_shape(shape).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnmatchedShapeData);
        }
        let err = NpyArray::<u8>::with_shape_and_data(Vec::new(), vec![7]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnmatchedShapeData);
    }

    #[test]
    fn unsupported_dtype() {
        let err = NpyArray::<Opaque>::with_shape([3]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedDtype);
        let err = NpyArray::<Opaque>::with_shape_and_data([1], [Opaque]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedDtype);
        let err = NpyArray::<Opaque>::read_npy(&b"\x93NUMPY"[..]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedDtype);
    }

    #[test]
    fn linear_index() {
        let mut arr = NpyArray::<i32>::with_shape_and_data([2, 2], [1, 2, 3, 4]).unwrap();
        assert_eq!(arr.get(3), Ok(&4));
        assert_eq!(arr.get(4), Err(IndexError::OutOfRange { index: 4, size: 4 }));
        *arr.get_mut(0).unwrap() = 10;
        arr[1] += 1;
        assert_eq!(arr.as_slice(), [10, 3, 3, 4]);
        assert!(arr.get_mut(9).is_err());
    }

    #[test]
    fn multi_index() {
        let data: Vec<i32> = (0..24).collect();
        let mut arr = NpyArray::<i32>::with_shape_and_data([2, 3, 4], data).unwrap();
        assert_eq!(arr.at(&[1, 2, 3]), Ok(&23));
        assert_eq!(arr.at(&[1, 0, 2]), Ok(&14));
        assert_eq!(arr[[0, 1, 0]], 4);

        arr[[1, 1, 1]] = -1;
        assert_eq!(arr[17], -1);
        *arr.at_mut(&[0, 0, 0]).unwrap() = 100;
        assert_eq!(arr[0], 100);

        // A single component is a flat index.
        assert_eq!(arr.at(&[23]), Ok(&23));
        assert_eq!(arr.at(&[24]), Err(IndexError::OutOfRange { index: 24, size: 24 }));

        let bad: [&[usize]; 6] = [&[0, 3, 0], &[2, 0, 0], &[0, 0, 4], &[0, 0], &[0, 0, 0, 0], &[]];
        for index in bad {
            assert_eq!(
                arr.at(index),
                Err(IndexError::OutOfBounds { index: index.to_vec(), shape: vec![2, 3, 4] })
            );
        }
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn index_panics() {
        let arr = NpyArray::<f64>::with_shape([2, 2]).unwrap();
        let _ = arr[[0, 2]];
    }

    #[test]
    fn take_leaves_empty() {
        let mut a = NpyArray::<f64>::with_shape_and_data([3], [1.0, 2.0, 3.0]).unwrap();
        let b = a.take();

        assert_eq!(a.size(), 0);
        assert!(a.shape().is_empty());
        assert!(a.strides().is_empty());
        assert_eq!(a.dtype(), Dtype::null());
        assert!(!a.fortran_order());
        assert_eq!(a, NpyArray::default());

        assert_eq!(b.shape(), [3]);
        assert_eq!(b.dtype(), Dtype::float_64());
        assert_eq!(b.as_slice(), [1.0, 2.0, 3.0]);

        let c = mem::take(&mut a);
        assert_eq!(c.size(), 0);
    }

    #[test]
    fn failed_save_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kept.npy");
        let arr = NpyArray::<u8>::with_shape_and_data([3], [1, 2, 3]).unwrap();
        arr.save(&path).unwrap();
        let before = fs::read(&path).unwrap();

        let bad = NpyArray::<Unwritable>::with_shape([3]).unwrap();
        let err = bad.save(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputOutput);
        assert_eq!(fs::read(&path).unwrap(), before);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);

        let fresh = dir.path().join("never.npy");
        assert!(bad.save(&fresh).is_err());
        assert!(!fresh.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn index_taken_array() {
        let mut a = NpyArray::<f64>::with_shape([2]).unwrap();
        let _moved = a.take();

        let empty = IndexError::OutOfBounds { index: vec![], shape: vec![] };
        assert_eq!(a.at(&[]), Err(empty.clone()));
        assert_eq!(a.at_mut(&[]), Err(empty));
        assert_eq!(a.at(&[0]), Err(IndexError::OutOfRange { index: 0, size: 0 }));
        assert!(a.at(&[0, 0]).is_err());
        assert!(a.get(0).is_err());
        assert!(NpyArray::<u8>::default().at(&[]).is_err());
    }

    #[test]
    #[should_panic(expected = "out of range for array of shape []")]
    fn index_operator_on_taken_array_panics() {
        let mut a = NpyArray::<i32>::with_shape([1]).unwrap();
        let _moved = a.take();
        let _ = a[[0usize; 0]];
    }

    #[test]
    fn clone_is_deep() {
        let a = NpyArray::<u32>::with_shape_and_data([2], [1, 2]).unwrap();
        let mut b = a.clone();
        b[0] = 9;
        assert_eq!(a[0], 1);
        assert_eq!(b[0], 9);
        assert_ne!(a, b);
    }

    #[test]
    fn save_empty_array_fails() {
        let empty = NpyArray::<f32>::default();
        let mut out = Vec::new();
        let err = empty.write_npy(&mut out).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedDtype);
        assert!(out.is_empty());
    }

    #[test]
    fn write_read() {
        let mut arr = NpyArray::<i64>::with_shape_and_data([2, 3], [1, -2, 3, -4, 5, -6]).unwrap();
        arr.set_fortran_order(true);
        let mut out = Vec::new();
        arr.write_npy(&mut out).unwrap();
        assert_eq!(out.len(), 128 + 48);
        assert_eq!(NpyArray::<i64>::read_npy(&out[..]).unwrap(), arr);
    }

    #[test]
    fn dtype_mismatch() {
        let arr = NpyArray::<i32>::with_shape_and_data([2], [1, 2]).unwrap();
        let mut out = Vec::new();
        arr.write_npy(&mut out).unwrap();
        match NpyArray::<u32>::read_npy(&out[..]) {
            Err(NpyError::IllFormedHeader(HeaderError::DtypeMismatch { expected, found })) => {
                assert_eq!(expected, Dtype::uint_32());
                assert_eq!(found, Dtype::int_32());
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn invalid_bool_is_generic() {
        let arr = NpyArray::<u8>::with_shape_and_data([2], [1, 2]).unwrap();
        let mut out = Vec::new();
        arr.write_npy(&mut out).unwrap();
        // Patch the descr from '|u1' to '|b1'.
        let pos = out.windows(3).position(|w| w == b"|u1").unwrap();
        out[pos + 1] = b'b';
        let err = NpyArray::<bool>::read_npy(&out[..]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Generic);
    }

    #[test]
    fn missing_data() {
        let arr = NpyArray::<f32>::with_shape_and_data([4], [1.0; 4]).unwrap();
        let mut out = Vec::new();
        arr.write_npy(&mut out).unwrap();
        out.truncate(out.len() - 1);
        let err = NpyArray::<f32>::read_npy(&out[..]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputOutput);
    }
}
