use crate::{Element, NpyArray, NpyError};
use ndarray::{prelude::*, Data};

impl<A: Element> TryFrom<NpyArray<A>> for ArrayD<A> {
    type Error = NpyError;

    /// Converts to a row-major `ndarray` array. The `fortran_order` flag is
    /// not applied.
    ///
    /// The empty array left behind by [`NpyArray::take`] has no shape and
    /// fails with `UnmatchedShapeData`.
    fn try_from(array: NpyArray<A>) -> Result<Self, NpyError> {
        let shape = array.shape().to_vec();
        let data = array.into_vec();
        if shape.is_empty() {
            return Err(NpyError::UnmatchedShapeData { shape, len: data.len() });
        }
        ArrayD::from_shape_vec(IxDyn(&shape), data)
            .map_err(|err| NpyError::Generic(err.to_string()))
    }
}

impl<A, S, D> TryFrom<&ArrayBase<S, D>> for NpyArray<A>
where
    A: Element,
    S: Data<Elem = A>,
    D: Dimension,
{
    type Error = NpyError;

    /// Copies the elements in logical (row-major) order.
    fn try_from(array: &ArrayBase<S, D>) -> Result<Self, NpyError> {
        let data = match array.as_slice() {
            Some(slice) => slice.to_vec(),
            None => array.iter().cloned().collect(),
        };
        NpyArray::with_shape_and_data(array.shape(), data)
    }
}
