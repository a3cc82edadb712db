//! The model state: coordinates plus named variables.
//!
//! A [`State`] is threaded through every kernel unit of a pipeline. Units read it through a shared
//! reference and hand back a patch, itself a `State`, which the kernel driver merges in.

use crate::array::{DType, DataArray};
use crate::chunk::{Block, ChunkSpec};
use crate::coordinates::Coordinate;
use crate::errors::{SeapopymError, SeapopymResult};
use crate::labels::Dim;
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    coords: BTreeMap<Dim, Coordinate>,
    variables: BTreeMap<String, DataArray>,
    chunks: ChunkSpec,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a coordinate.
    pub fn set_coordinate(&mut self, coordinate: Coordinate) {
        self.coords.insert(coordinate.dim(), coordinate);
    }

    pub fn with_coordinate(mut self, coordinate: Coordinate) -> Self {
        self.set_coordinate(coordinate);
        self
    }

    pub fn coordinate(&self, dim: Dim) -> Option<&Coordinate> {
        self.coords.get(&dim)
    }

    pub fn coordinates(&self) -> impl Iterator<Item = &Coordinate> {
        self.coords.values()
    }

    pub fn dim_len(&self, dim: Dim) -> Option<usize> {
        self.coords.get(&dim).map(Coordinate::len)
    }

    pub fn dim_lengths(&self) -> BTreeMap<Dim, usize> {
        self.coords
            .iter()
            .map(|(dim, coordinate)| (*dim, coordinate.len()))
            .collect()
    }

    /// Shape of an array spanning `dims` in this state.
    pub fn shape_of(&self, dims: &[Dim]) -> Option<Vec<usize>> {
        dims.iter().map(|dim| self.dim_len(*dim)).collect()
    }

    /// Insert a variable, checking its dimensions against the coordinates of the state.
    ///
    /// Dimensions without a coordinate are rejected, as are lengths that differ from the
    /// coordinate length.
    pub fn insert(&mut self, name: &str, data: DataArray) -> SeapopymResult<()> {
        let expected = self
            .shape_of(data.dims())
            .ok_or_else(|| SeapopymError::DimensionMismatch {
                variable: name.to_string(),
                expected: self.coords.keys().copied().collect(),
                found: data.dims().to_vec(),
            })?;
        if expected != data.shape() {
            return Err(SeapopymError::ShapeMismatch {
                variable: name.to_string(),
                expected,
                found: data.shape().to_vec(),
            });
        }
        self.variables.insert(name.to_string(), data);
        Ok(())
    }

    pub fn with_variable(mut self, name: &str, data: DataArray) -> SeapopymResult<Self> {
        self.insert(name, data)?;
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&DataArray> {
        self.variables.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut DataArray> {
        self.variables.get_mut(name)
    }

    /// A variable that `context` cannot run without.
    pub fn require(&self, name: &str, context: &str) -> SeapopymResult<&DataArray> {
        self.variables
            .get(name)
            .ok_or_else(|| SeapopymError::MissingVariable {
                variable: name.to_string(),
                context: context.to_string(),
            })
    }

    pub fn float(&self, name: &str, context: &str) -> SeapopymResult<&ArrayD<f64>> {
        let data = self.require(name, context)?;
        data.as_float().ok_or(SeapopymError::DTypeMismatch {
            variable: name.to_string(),
            expected: DType::Float64,
            found: data.dtype(),
        })
    }

    pub fn boolean(&self, name: &str, context: &str) -> SeapopymResult<&ArrayD<bool>> {
        let data = self.require(name, context)?;
        data.as_bool().ok_or(SeapopymError::DTypeMismatch {
            variable: name.to_string(),
            expected: DType::Bool,
            found: data.dtype(),
        })
    }

    /// A scalar configuration value.
    pub fn scalar(&self, name: &str, context: &str) -> SeapopymResult<f64> {
        self.require(name, context)?
            .first_value()
            .ok_or_else(|| SeapopymError::Error(format!("Variable '{name}' is empty")))
    }

    /// A boolean flag, falling back to `default` when the state doesn't carry it.
    pub fn flag_or(&self, name: &str, default: bool) -> bool {
        self.get(name)
            .and_then(DataArray::first_value)
            .map_or(default, |value| value != 0.0)
    }

    pub fn remove(&mut self, name: &str) -> Option<DataArray> {
        self.variables.remove(name)
    }

    pub fn variables(&self) -> impl Iterator<Item = (&String, &DataArray)> {
        self.variables.iter()
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Merge a patch into the state with the "override" policy.
    ///
    /// Variables and coordinates already present in the state are kept; only new names from the
    /// patch are added.
    pub fn merge(&mut self, patch: State) {
        for (dim, coordinate) in patch.coords {
            self.coords.entry(dim).or_insert(coordinate);
        }
        for (name, data) in patch.variables {
            if self.variables.contains_key(&name) {
                debug!(variable = %name, "Variable already in state, keeping the existing one");
                continue;
            }
            self.variables.insert(name, data);
        }
    }

    pub fn chunks(&self) -> &ChunkSpec {
        &self.chunks
    }

    /// True when kernel units should run block by block.
    pub fn is_chunked(&self) -> bool {
        !self.chunks.is_empty()
    }

    /// Partition the state into blocks of the given sizes.
    pub fn chunk(mut self, chunks: ChunkSpec) -> Self {
        self.chunks = chunks;
        self
    }

    pub fn unchunk(mut self) -> Self {
        self.chunks = ChunkSpec::default();
        self
    }

    /// Blocks of this state along its chunked dimensions.
    pub fn blocks(&self) -> Vec<Block> {
        self.chunks.blocks(&self.dim_lengths())
    }

    /// The materialized sub-state covered by `block`.
    pub fn select_block(&self, block: &Block) -> State {
        let mut coords = self.coords.clone();
        let mut variables = self.variables.clone();
        for (dim, range) in block.ranges() {
            if let Some(coordinate) = coords.get_mut(dim) {
                *coordinate = coordinate.slice(range.clone());
            }
            for data in variables.values_mut() {
                if data.has_dim(*dim) {
                    *data = data.slice_dim(*dim, range.clone());
                }
            }
        }
        State {
            coords,
            variables,
            chunks: ChunkSpec::default(),
        }
    }

    /// Memory footprint of the variables, in bytes.
    pub fn nbytes(&self) -> usize {
        self.variables.values().map(DataArray::nbytes).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinates::{new_latitude, new_longitude};
    use ndarray::{array, Array2};

    fn grid() -> State {
        State::new()
            .with_coordinate(new_latitude(vec![0.0, 1.0]))
            .with_coordinate(new_longitude(vec![10.0, 11.0, 12.0]))
    }

    #[test]
    fn insert_checks_shape() {
        let mut state = grid();
        let ok = DataArray::float(vec![Dim::Y, Dim::X], Array2::zeros((2, 3)).into_dyn()).unwrap();
        assert!(state.insert("a", ok).is_ok());

        let wrong = DataArray::float(vec![Dim::Y, Dim::X], Array2::zeros((3, 2)).into_dyn()).unwrap();
        assert!(matches!(
            state.insert("b", wrong),
            Err(SeapopymError::ShapeMismatch { .. })
        ));

        let unknown = DataArray::float(vec![Dim::Time], array![1.0].into_dyn()).unwrap();
        assert!(matches!(
            state.insert("c", unknown),
            Err(SeapopymError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn require_reports_context() {
        let state = grid();
        assert_eq!(
            state.require("temperature", "global_mask").unwrap_err(),
            SeapopymError::MissingVariable {
                variable: "temperature".to_string(),
                context: "global_mask".to_string()
            }
        );
    }

    #[test]
    fn merge_keeps_existing_variables() {
        let mut state = grid();
        state.insert("a", DataArray::scalar(1.0)).unwrap();
        let patch = State::new()
            .with_variable("a", DataArray::scalar(2.0))
            .unwrap()
            .with_variable("b", DataArray::scalar(3.0))
            .unwrap();
        state.merge(patch);
        assert_eq!(state.scalar("a", "test"), Ok(1.0));
        assert_eq!(state.scalar("b", "test"), Ok(3.0));
    }

    #[test]
    fn select_block_slices_variables_and_coordinates() {
        let values = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]].into_dyn();
        let state = grid()
            .with_variable("a", DataArray::float(vec![Dim::Y, Dim::X], values).unwrap())
            .unwrap()
            .with_variable("s", DataArray::scalar(7.0))
            .unwrap()
            .chunk(ChunkSpec::new().with(Dim::X, 2).unwrap());
        assert!(state.is_chunked());

        let blocks = state.blocks();
        assert_eq!(blocks.len(), 2);
        let last = state.select_block(&blocks[1]);
        assert!(!last.is_chunked());
        assert_eq!(last.dim_len(Dim::X), Some(1));
        assert_eq!(
            last.float("a", "test").unwrap(),
            &array![[3.0], [6.0]].into_dyn()
        );
        assert_eq!(last.scalar("s", "test"), Ok(7.0));
    }

    #[test]
    fn flags_default_when_absent() {
        let state = State::new()
            .with_variable("on", DataArray::flag(true))
            .unwrap();
        assert!(state.flag_or("on", false));
        assert!(!state.flag_or("off", false));
        assert!(state.flag_or("off", true));
    }

    #[test]
    fn serializes_to_json() {
        let state = grid()
            .with_variable("s", DataArray::scalar(1.5))
            .unwrap();
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"s\""));
        assert!(json.contains("degrees_north"));
    }
}
