#![doc = include_str!("../README.md")]
//! ## Operate .npy Files
//!
//! - Reading
//!   - [`NpyArray::from_path`] and the [`read_npy`] convenience function
//!   - [`NpyArray::read_npy`] for any [`std::io::Read`]
//! - Writing
//!   - [`NpyArray::save`] and the [`write_npy`] convenience function
//!   - [`NpyArray::write_npy`] for any [`std::io::Write`]
//! - Creating in memory: [`NpyArray::with_shape`],
//!   [`NpyArray::with_shape_and_data`]
//!
//! ## Dtypes
//!
//! [`Dtype`] models the `descr` entry of the header. It parses and prints the
//! compact descriptor strings (`"<f8"`, `"|b1"`, ...) and maps each
//! [`Element`] type to its canonical descriptor.
//!
//! ## Limitations
//!
//! - Only format version 1.0 is read and written.
//!
//! - Only simple scalar descriptors are supported, and the `descr` of a file
//!   must be exactly the host-byte-order dtype of the element type.
//!
//! - The `fortran_order` flag is preserved but the data is always treated as
//!   row-major.
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(missing_docs)]

mod dtype;
mod endian;
mod npy;

#[cfg(feature = "ndarray")]
mod impl_ndarray;

pub use crate::{
    dtype::{Dtype, Kind},
    endian::{host_byte_order, Endianness},
    npy::{
        read_npy, write_npy, ComplexLongDouble, Element, ErrorKind, HeaderError, IndexError,
        LongDouble, NpyArray, NpyError, ReadDataError,
    },
};
