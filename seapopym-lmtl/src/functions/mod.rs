//! The transforms of the LMTL pipeline, each with its output template and kernel unit.
//!
//! Every transform has the same signature, `fn(&State) -> SeapopymResult<State>`: it reads the
//! variables it depends on and returns a patch holding only what it produced.

pub mod ageing;
pub mod apply_mask;
pub mod average_temperature;
pub mod biomass;
pub mod day_length;
pub mod global_mask;
pub mod mask_by_fgroup;
pub mod mask_temperature;
pub mod min_temperature;
pub mod mortality_field;
pub mod primary_production;
pub mod production;

use ndarray::{Array, ArrayD, Dimension};
use seapopym_core::array::{broadcast_to, DataArray};
use seapopym_core::errors::{SeapopymError, SeapopymResult};
use seapopym_core::labels::Dim;
use seapopym_core::state::State;

/// Lengths of `dims` in `state`.
pub(crate) fn shape(state: &State, dims: &[Dim], context: &str) -> SeapopymResult<Vec<usize>> {
    dims.iter()
        .map(|dim| {
            state
                .dim_len(*dim)
                .ok_or_else(|| SeapopymError::MissingDimension {
                    dimension: *dim,
                    template: context.to_string(),
                })
        })
        .collect()
}

/// A float variable broadcast over `dims`.
///
/// Per-group parameters (`functional_group`) or forcing fields (`time, Y, X`) can be read over a
/// larger set of dimensions.
pub(crate) fn float_over(
    state: &State,
    name: &str,
    context: &str,
    dims: &[Dim],
) -> SeapopymResult<ArrayD<f64>> {
    let data = state.require(name, context)?;
    let shape = shape(state, dims, context)?;
    data.broadcast_float(dims, &shape)
        .ok_or_else(|| mismatch(name, dims, data))
}

/// A boolean variable broadcast over `dims`.
pub(crate) fn bool_over(
    state: &State,
    name: &str,
    context: &str,
    dims: &[Dim],
) -> SeapopymResult<ArrayD<bool>> {
    let values = state.boolean(name, context)?;
    let data = state.require(name, context)?;
    let shape = shape(state, dims, context)?;
    broadcast_to(values, data.dims(), dims, &shape)
        .ok_or_else(|| mismatch(name, dims, data))
}

/// Fixed-dimension view of a dynamic array.
pub(crate) fn fixed<A, D: Dimension>(values: ArrayD<A>, name: &str) -> SeapopymResult<Array<A, D>> {
    let ndim = values.ndim();
    values.into_dimensionality::<D>().map_err(|_| {
        SeapopymError::Error(format!(
            "'{name}' has {ndim} dimensions, expected {}",
            D::NDIM.unwrap_or(ndim)
        ))
    })
}

/// NaN marks missing data. The recurrences treat it as zero.
pub(crate) fn sanitize<D: Dimension>(values: &mut Array<f64, D>) {
    values.mapv_inplace(|v| if v.is_nan() { 0.0 } else { v });
}

/// Build a patch holding `variables`, with the coordinates of `state` they span.
pub(crate) fn patch(state: &State, variables: Vec<(&str, DataArray)>) -> SeapopymResult<State> {
    let mut result = State::new();
    for (name, data) in variables {
        for dim in data.dims() {
            if result.coordinate(*dim).is_none() {
                if let Some(coordinate) = state.coordinate(*dim) {
                    result.set_coordinate(coordinate.clone());
                }
            }
        }
        result.insert(name, data)?;
    }
    Ok(result)
}

pub(crate) fn float_array(name: &str, dims: &[Dim], values: ArrayD<f64>) -> SeapopymResult<DataArray> {
    let ndim = values.ndim();
    DataArray::float(dims.to_vec(), values).ok_or_else(|| rank_error(name, dims, ndim))
}

pub(crate) fn bool_array(name: &str, dims: &[Dim], values: ArrayD<bool>) -> SeapopymResult<DataArray> {
    let ndim = values.ndim();
    DataArray::boolean(dims.to_vec(), values).ok_or_else(|| rank_error(name, dims, ndim))
}

fn rank_error(name: &str, dims: &[Dim], ndim: usize) -> SeapopymError {
    SeapopymError::Error(format!(
        "'{name}' has {ndim} dimensions but was labelled with {dims:?}"
    ))
}

fn mismatch(name: &str, dims: &[Dim], data: &DataArray) -> SeapopymError {
    SeapopymError::DimensionMismatch {
        variable: name.to_string(),
        expected: dims.to_vec(),
        found: data.dims().to_vec(),
    }
}

/// Position of each per-group layer label along the `Z` coordinate.
pub(crate) fn layer_positions(
    state: &State,
    name: &str,
    context: &str,
) -> SeapopymResult<Vec<usize>> {
    let layers = float_over(state, name, context, &[Dim::FunctionalGroup])?;
    let coordinate = state
        .coordinate(Dim::Z)
        .ok_or_else(|| SeapopymError::MissingDimension {
            dimension: Dim::Z,
            template: context.to_string(),
        })?;
    layers.iter().map(|label| coordinate.position(*label)).collect()
}
