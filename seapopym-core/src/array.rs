//! Labelled n-dimensional arrays stored in the model state.

use crate::labels::Dim;
use ndarray::{ArrayD, Axis, IxDyn, Slice};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

/// Attribute metadata (`units`, `long_name`, ...) attached to arrays and coordinates.
pub type Attrs = BTreeMap<String, String>;

/// Element type of a [`DataArray`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    Float64,
    Bool,
}

impl DType {
    /// Size of one element in bytes.
    pub fn size_of(&self) -> usize {
        match self {
            DType::Float64 => std::mem::size_of::<f64>(),
            DType::Bool => std::mem::size_of::<bool>(),
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::Float64 => write!(f, "float64"),
            DType::Bool => write!(f, "bool"),
        }
    }
}

/// Typed storage of a [`DataArray`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Values {
    Float(ArrayD<f64>),
    Bool(ArrayD<bool>),
}

impl Values {
    pub fn dtype(&self) -> DType {
        match self {
            Values::Float(_) => DType::Float64,
            Values::Bool(_) => DType::Bool,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Values::Float(values) => values.shape(),
            Values::Bool(values) => values.shape(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Zero-filled (or all-false) storage of the given type and shape.
    pub fn zeros(dtype: DType, shape: &[usize]) -> Self {
        match dtype {
            DType::Float64 => Values::Float(ArrayD::zeros(IxDyn(shape))),
            DType::Bool => Values::Bool(ArrayD::from_elem(IxDyn(shape), false)),
        }
    }

    fn permuted(self, order: &[usize]) -> Self {
        match self {
            Values::Float(values) => Values::Float(values.permuted_axes(IxDyn(order))),
            Values::Bool(values) => Values::Bool(values.permuted_axes(IxDyn(order))),
        }
    }

    fn slice_axis(&self, axis: Axis, range: Range<usize>) -> Self {
        match self {
            Values::Float(values) => Values::Float(values.slice_axis(axis, Slice::from(range)).to_owned()),
            Values::Bool(values) => Values::Bool(values.slice_axis(axis, Slice::from(range)).to_owned()),
        }
    }

    fn index_axis(&self, axis: Axis, index: usize) -> Self {
        match self {
            Values::Float(values) => Values::Float(values.index_axis(axis, index).to_owned()),
            Values::Bool(values) => Values::Bool(values.index_axis(axis, index).to_owned()),
        }
    }
}

/// An array whose axes are named by [`Dim`]s.
///
/// Axes are always stored in canonical order, whatever order they were supplied in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataArray {
    dims: Vec<Dim>,
    values: Values,
    attrs: Attrs,
}

impl DataArray {
    /// Build an array, transposing it into canonical dimension order.
    ///
    /// Returns `None` if the number of dims doesn't match the array rank or a dim is repeated.
    pub fn new(dims: Vec<Dim>, values: Values) -> Option<Self> {
        if dims.len() != values.ndim() {
            return None;
        }
        let mut order: Vec<usize> = (0..dims.len()).collect();
        order.sort_by_key(|&i| dims[i]);
        let sorted: Vec<Dim> = order.iter().map(|&i| dims[i]).collect();
        if !Dim::is_canonical(&sorted) {
            return None;
        }
        Some(Self {
            dims: sorted,
            values: values.permuted(&order),
            attrs: Attrs::new(),
        })
    }

    pub fn float(dims: Vec<Dim>, values: ArrayD<f64>) -> Option<Self> {
        Self::new(dims, Values::Float(values))
    }

    pub fn boolean(dims: Vec<Dim>, values: ArrayD<bool>) -> Option<Self> {
        Self::new(dims, Values::Bool(values))
    }

    /// A zero-dimensional float value.
    pub fn scalar(value: f64) -> Self {
        Self {
            dims: vec![],
            values: Values::Float(ArrayD::from_elem(IxDyn(&[]), value)),
            attrs: Attrs::new(),
        }
    }

    /// A zero-dimensional boolean value.
    pub fn flag(value: bool) -> Self {
        Self {
            dims: vec![],
            values: Values::Bool(ArrayD::from_elem(IxDyn(&[]), value)),
            attrs: Attrs::new(),
        }
    }

    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// Merge attributes into the existing ones, replacing keys that already exist.
    pub fn assign_attrs(&mut self, attrs: &Attrs) {
        self.attrs
            .extend(attrs.iter().map(|(key, value)| (key.clone(), value.clone())));
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn dims(&self) -> &[Dim] {
        &self.dims
    }

    pub fn has_dim(&self, dim: Dim) -> bool {
        self.dims.contains(&dim)
    }

    pub fn axis(&self, dim: Dim) -> Option<Axis> {
        self.dims.iter().position(|d| *d == dim).map(Axis)
    }

    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    pub fn dtype(&self) -> DType {
        self.values.dtype()
    }

    pub fn values(&self) -> &Values {
        &self.values
    }

    pub fn nbytes(&self) -> usize {
        self.shape().iter().product::<usize>() * self.dtype().size_of()
    }

    pub fn as_float(&self) -> Option<&ArrayD<f64>> {
        match &self.values {
            Values::Float(values) => Some(values),
            Values::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<&ArrayD<bool>> {
        match &self.values {
            Values::Bool(values) => Some(values),
            Values::Float(_) => None,
        }
    }

    /// Values as floats, booleans mapping to 1.0 and 0.0.
    pub fn to_float(&self) -> ArrayD<f64> {
        match &self.values {
            Values::Float(values) => values.clone(),
            Values::Bool(values) => values.mapv(|v| if v { 1.0 } else { 0.0 }),
        }
    }

    /// The first element of a zero-dimensional (or any) array, as a float.
    pub fn first_value(&self) -> Option<f64> {
        match &self.values {
            Values::Float(values) => values.iter().next().copied(),
            Values::Bool(values) => values.iter().next().map(|v| if *v { 1.0 } else { 0.0 }),
        }
    }

    /// Select a single index along `dim`, dropping the dimension.
    pub fn select(&self, dim: Dim, index: usize) -> Option<Self> {
        let axis = self.axis(dim)?;
        if index >= self.values.shape()[axis.index()] {
            return None;
        }
        Some(Self {
            dims: self.dims.iter().copied().filter(|d| *d != dim).collect(),
            values: self.values.index_axis(axis, index),
            attrs: self.attrs.clone(),
        })
    }

    /// Keep a contiguous range along `dim`. Arrays without `dim` are returned unchanged.
    pub fn slice_dim(&self, dim: Dim, range: Range<usize>) -> Self {
        match self.axis(dim) {
            Some(axis) => Self {
                dims: self.dims.clone(),
                values: self.values.slice_axis(axis, range),
                attrs: self.attrs.clone(),
            },
            None => self.clone(),
        }
    }

    /// Float values broadcast against the canonical dims `target` of size `shape`.
    ///
    /// Returns `None` if this array has a dimension that `target` lacks or if a length differs.
    pub fn broadcast_float(&self, target: &[Dim], shape: &[usize]) -> Option<ArrayD<f64>> {
        let values = self.to_float();
        broadcast_to(&values, &self.dims, target, shape)
    }

    /// Overwrite the region of this array described by `offsets` with `block`.
    ///
    /// Offsets on dimensions this array does not have are ignored.
    /// Returns `false` if the element types or the region shape don't match.
    pub fn write_block(&mut self, offsets: &[(Dim, Range<usize>)], block: &DataArray) -> bool {
        let axes: Vec<(Axis, Range<usize>)> = offsets
            .iter()
            .filter_map(|(dim, range)| self.axis(*dim).map(|axis| (axis, range.clone())))
            .collect();
        match (&mut self.values, &block.values) {
            (Values::Float(target), Values::Float(source)) => {
                let mut view = target.view_mut();
                for (axis, range) in axes {
                    view.slice_axis_inplace(axis, Slice::from(range));
                }
                if view.shape() != source.shape() {
                    return false;
                }
                view.assign(source);
                true
            }
            (Values::Bool(target), Values::Bool(source)) => {
                let mut view = target.view_mut();
                for (axis, range) in axes {
                    view.slice_axis_inplace(axis, Slice::from(range));
                }
                if view.shape() != source.shape() {
                    return false;
                }
                view.assign(source);
                true
            }
            _ => false,
        }
    }
}

/// Broadcast `values` (with canonical dims `from`) to the canonical dims `to` of size `shape`.
pub fn broadcast_to<T: Clone>(
    values: &ArrayD<T>,
    from: &[Dim],
    to: &[Dim],
    shape: &[usize],
) -> Option<ArrayD<T>> {
    if from.iter().any(|dim| !to.contains(dim)) || to.len() != shape.len() {
        return None;
    }
    let mut view = values.view();
    for (i, dim) in to.iter().enumerate() {
        if !from.contains(dim) {
            view.insert_axis_inplace(Axis(i));
        }
    }
    let broadcast = view.broadcast(IxDyn(shape))?;
    Some(broadcast.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn transposes_to_canonical_order() {
        // (cohort, time) -> (time, cohort)
        let values = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]].into_dyn();
        let data = DataArray::float(vec![Dim::Cohort, Dim::Time], values).unwrap();
        assert_eq!(data.dims(), &[Dim::Time, Dim::Cohort]);
        assert_eq!(data.shape(), &[3, 2]);
        assert_eq!(data.as_float().unwrap()[[0, 1]], 4.0);
    }

    #[test]
    fn rejects_bad_dims() {
        let values = Array2::<f64>::zeros((2, 2)).into_dyn();
        assert!(DataArray::float(vec![Dim::Time], values.clone()).is_none());
        assert!(DataArray::float(vec![Dim::Time, Dim::Time], values).is_none());
    }

    #[test]
    fn broadcast_inserts_missing_axes() {
        let per_group = array![1.0, 2.0].into_dyn();
        let data = DataArray::float(vec![Dim::FunctionalGroup], per_group).unwrap();
        let target = [Dim::FunctionalGroup, Dim::Time, Dim::Y];
        let broadcast = data.broadcast_float(&target, &[2, 3, 1]).unwrap();
        assert_eq!(broadcast.shape(), &[2, 3, 1]);
        assert_eq!(broadcast[[1, 2, 0]], 2.0);
        assert!(data.broadcast_float(&[Dim::Time], &[3]).is_none());
    }

    #[test]
    fn broadcast_booleans_over_new_axes() {
        let mask = array![[true, false]].into_dyn();
        let from = [Dim::Y, Dim::X];
        let to = [Dim::Time, Dim::Y, Dim::X];
        let broadcast = broadcast_to(&mask, &from, &to, &[3, 1, 2]).unwrap();
        assert_eq!(broadcast.shape(), &[3, 1, 2]);
        assert!(broadcast[[2, 0, 0]]);
        assert!(!broadcast[[2, 0, 1]]);
        assert!(broadcast_to(&mask, &from, &to, &[3, 1, 3]).is_none());
        assert!(broadcast_to(&mask, &from, &[Dim::Y], &[1]).is_none());
    }

    #[test]
    fn write_block_into_region() {
        let mut full = DataArray::float(
            vec![Dim::Y, Dim::X],
            Array2::<f64>::zeros((2, 3)).into_dyn(),
        )
        .unwrap();
        let block = DataArray::float(vec![Dim::Y, Dim::X], array![[7.0, 8.0]].into_dyn()).unwrap();
        assert!(full.write_block(&[(Dim::Y, 1..2), (Dim::X, 1..3), (Dim::Time, 0..1)], &block));
        assert_eq!(
            full.as_float().unwrap(),
            &array![[0.0, 0.0, 0.0], [0.0, 7.0, 8.0]].into_dyn()
        );
        assert!(!full.write_block(&[(Dim::Y, 0..2)], &block));
    }

    #[test]
    fn select_drops_dimension() {
        let data = DataArray::boolean(
            vec![Dim::Time, Dim::Z],
            array![[true, false], [false, false]].into_dyn(),
        )
        .unwrap();
        let first = data.select(Dim::Time, 0).unwrap();
        assert_eq!(first.dims(), &[Dim::Z]);
        assert_eq!(first.as_bool().unwrap(), &array![true, false].into_dyn());
        assert!(data.select(Dim::Time, 2).is_none());
        assert!(data.select(Dim::Cohort, 0).is_none());
    }
}
