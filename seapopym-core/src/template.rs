//! Output templates.
//!
//! A template describes the variables a kernel unit will produce (their names, dimensions,
//! element types and metadata) without computing them. Templates are resolved against the
//! current state every time they are needed and the result, a [`ShapeContract`], is never cached.

use crate::array::{Attrs, DType, DataArray, Values};
use crate::chunk::{Block, ChunkSpec};
use crate::coordinates::Coordinate;
use crate::errors::{SeapopymError, SeapopymResult};
use crate::labels::Dim;
use crate::state::State;

/// A dimension of a template variable.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateDim {
    /// Use the coordinate already present in the state.
    State(Dim),
    /// Use an explicitly supplied coordinate.
    Explicit(Coordinate),
}

impl TemplateDim {
    pub fn dim(&self) -> Dim {
        match self {
            TemplateDim::State(dim) => *dim,
            TemplateDim::Explicit(coordinate) => coordinate.dim(),
        }
    }
}

impl From<Dim> for TemplateDim {
    fn from(dim: Dim) -> Self {
        TemplateDim::State(dim)
    }
}

impl From<Coordinate> for TemplateDim {
    fn from(coordinate: Coordinate) -> Self {
        TemplateDim::Explicit(coordinate)
    }
}

/// Declaration of a single output variable.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateUnit {
    name: String,
    attrs: Attrs,
    dims: Vec<TemplateDim>,
    chunks: Option<ChunkSpec>,
    dtype: DType,
}

impl TemplateUnit {
    pub fn new(name: &str, dims: Vec<TemplateDim>) -> Self {
        Self {
            name: name.to_string(),
            attrs: Attrs::new(),
            dims,
            chunks: None,
            dtype: DType::Float64,
        }
    }

    /// Shorthand for a template whose dimensions all come from the state.
    pub fn from_state_dims(name: &str, dims: &[Dim]) -> Self {
        Self::new(name, dims.iter().copied().map(TemplateDim::from).collect())
    }

    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }

    /// Explicit block sizes. Without them the variable inherits the chunking of the state.
    pub fn with_chunks(mut self, chunks: ChunkSpec) -> Self {
        self.chunks = Some(chunks);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn chunks(&self) -> Option<&ChunkSpec> {
        self.chunks.as_ref()
    }

    /// Resolve the declared dimensions against `state`.
    pub fn generate(&self, state: &State) -> SeapopymResult<VariableShape> {
        let mut coordinates = self
            .dims
            .iter()
            .map(|dim| match dim {
                TemplateDim::State(dim) => {
                    state
                        .coordinate(*dim)
                        .cloned()
                        .ok_or_else(|| SeapopymError::MissingDimension {
                            dimension: *dim,
                            template: self.name.clone(),
                        })
                }
                TemplateDim::Explicit(coordinate) => Ok(coordinate.clone()),
            })
            .collect::<SeapopymResult<Vec<_>>>()?;
        coordinates.sort_by_key(Coordinate::dim);

        let dims: Vec<Dim> = coordinates.iter().map(Coordinate::dim).collect();
        let source = self.chunks.as_ref().unwrap_or(state.chunks());
        let chunks = source
            .iter()
            .filter(|(dim, _)| dims.contains(dim))
            .try_fold(ChunkSpec::new(), |chunks, (dim, size)| chunks.with(dim, size))?;

        Ok(VariableShape {
            name: self.name.clone(),
            shape: coordinates.iter().map(Coordinate::len).collect(),
            dims,
            dtype: self.dtype,
            attrs: self.attrs.clone(),
            chunks,
            coordinates,
        })
    }
}

/// Declared outputs of a kernel unit.
#[derive(Debug, Clone)]
pub enum Template {
    /// A fixed list of variables.
    Static(Vec<TemplateUnit>),
    /// Variables that depend on the state, such as outputs toggled by configuration flags.
    Dynamic(fn(&State) -> SeapopymResult<Vec<TemplateUnit>>),
}

impl Template {
    pub fn units(&self, state: &State) -> SeapopymResult<Vec<TemplateUnit>> {
        match self {
            Template::Static(units) => Ok(units.clone()),
            Template::Dynamic(declare) => declare(state),
        }
    }

    pub fn generate(&self, state: &State) -> SeapopymResult<ShapeContract> {
        ShapeContract::generate(&self.units(state)?, state)
    }
}

impl From<TemplateUnit> for Template {
    fn from(unit: TemplateUnit) -> Self {
        Template::Static(vec![unit])
    }
}

impl From<Vec<TemplateUnit>> for Template {
    fn from(units: Vec<TemplateUnit>) -> Self {
        Template::Static(units)
    }
}

/// A resolved template variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableShape {
    pub name: String,
    pub dims: Vec<Dim>,
    pub shape: Vec<usize>,
    pub dtype: DType,
    pub attrs: Attrs,
    pub chunks: ChunkSpec,
    pub coordinates: Vec<Coordinate>,
}

impl VariableShape {
    fn from_data(name: &str, data: &DataArray, state: &State) -> Self {
        Self {
            name: name.to_string(),
            dims: data.dims().to_vec(),
            shape: data.shape().to_vec(),
            dtype: data.dtype(),
            attrs: data.attrs().clone(),
            chunks: ChunkSpec::new(),
            coordinates: data
                .dims()
                .iter()
                .filter_map(|dim| state.coordinate(*dim).cloned())
                .collect(),
        }
    }

    pub fn nbytes(&self) -> usize {
        self.shape.iter().product::<usize>() * self.dtype.size_of()
    }

    /// Shape of the part of this variable covered by `block`.
    pub fn block_shape(&self, block: &Block) -> Vec<usize> {
        self.dims
            .iter()
            .zip(&self.shape)
            .map(|(dim, length)| block.range(*dim).map_or(*length, |range| range.len()))
            .collect()
    }

    /// Zero-filled array of this shape.
    pub fn zeros(&self) -> SeapopymResult<DataArray> {
        DataArray::new(self.dims.clone(), Values::zeros(self.dtype, &self.shape))
            .map(|data| data.with_attrs(self.attrs.clone()))
            .ok_or_else(|| {
                SeapopymError::Error(format!("Template '{}' has invalid dimensions", self.name))
            })
    }
}

/// The expected shape of a set of variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeContract {
    variables: Vec<VariableShape>,
}

impl ShapeContract {
    /// Resolve each template unit against `state`.
    pub fn generate(units: &[TemplateUnit], state: &State) -> SeapopymResult<Self> {
        let variables = units
            .iter()
            .map(|unit| unit.generate(state))
            .collect::<SeapopymResult<Vec<_>>>()?;
        Ok(Self { variables })
    }

    /// The shape of every variable already in `state`.
    pub fn from_state(state: &State) -> Self {
        Self {
            variables: state
                .variables()
                .map(|(name, data)| VariableShape::from_data(name, data, state))
                .collect(),
        }
    }

    pub fn variables(&self) -> &[VariableShape] {
        &self.variables
    }

    pub fn get(&self, name: &str) -> Option<&VariableShape> {
        self.variables.iter().find(|variable| variable.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.name.as_str()).collect()
    }

    /// Estimated memory footprint, in bytes.
    pub fn nbytes(&self) -> usize {
        self.variables.iter().map(VariableShape::nbytes).sum()
    }

    /// Add the variables of `other` whose names are not declared yet.
    pub fn merge(&mut self, other: ShapeContract) {
        for variable in other.variables {
            if self.get(&variable.name).is_none() {
                self.variables.push(variable);
            }
        }
    }

    /// Zero-filled state matching this contract.
    pub fn allocate(&self) -> SeapopymResult<State> {
        let mut state = State::new();
        for variable in &self.variables {
            for coordinate in &variable.coordinates {
                if state.coordinate(coordinate.dim()).is_none() {
                    state.set_coordinate(coordinate.clone());
                }
            }
            state.insert(&variable.name, variable.zeros()?)?;
        }
        Ok(state)
    }
}
