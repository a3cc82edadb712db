//! Kernel units and kernels.
//!
//! A [`KernelUnit`] pairs a transform function with the [`Template`] of its outputs. A [`Kernel`]
//! is an ordered pipeline of kernel units run against a single [`State`].
//!
//! Each unit reads the state through a shared reference and returns a patch. The kernel driver is
//! the only place where patches are merged and consumed inputs are dropped.
//!
//! How a unit is run depends on the state:
//! * an unchunked state is handed to the transform as a whole ([`Scheduler::Eager`]);
//! * a chunked state is split into blocks and the transform runs once per block through a
//!   [`BlockExecutor`] ([`Scheduler::Partitioned`]). Each block result is checked against the
//!   template before being written into the output.
//!
//! The transform is the same in both cases, so both schedulers give the same result.

use crate::array::DataArray;
use crate::chunk::{Block, ChunkSpec};
use crate::errors::{SeapopymError, SeapopymResult};
use crate::state::State;
use crate::template::{ShapeContract, Template, TemplateUnit, VariableShape};
use rayon::prelude::*;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Signature shared by every transform.
pub type KernelFunction = fn(&State) -> SeapopymResult<State>;

/// Runs a task over a set of blocks.
///
/// Results are returned in the order of `blocks`.
pub trait BlockExecutor: fmt::Debug + Send + Sync {
    fn execute(
        &self,
        blocks: &[Block],
        task: &(dyn Fn(&Block) -> SeapopymResult<State> + Sync),
    ) -> Vec<SeapopymResult<State>>;
}

/// Runs blocks on the global rayon thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct RayonExecutor;

impl BlockExecutor for RayonExecutor {
    fn execute(
        &self,
        blocks: &[Block],
        task: &(dyn Fn(&Block) -> SeapopymResult<State> + Sync),
    ) -> Vec<SeapopymResult<State>> {
        blocks.par_iter().map(task).collect()
    }
}

/// Runs blocks one after the other on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialExecutor;

impl BlockExecutor for SequentialExecutor {
    fn execute(
        &self,
        blocks: &[Block],
        task: &(dyn Fn(&Block) -> SeapopymResult<State> + Sync),
    ) -> Vec<SeapopymResult<State>> {
        blocks.iter().map(task).collect()
    }
}

/// How a kernel unit is run against a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduler {
    Eager,
    Partitioned,
}

impl Scheduler {
    pub fn for_state(state: &State) -> Self {
        if state.is_chunked() {
            Scheduler::Partitioned
        } else {
            Scheduler::Eager
        }
    }

    pub fn run(
        &self,
        unit: &KernelUnit,
        state: &State,
        executor: &dyn BlockExecutor,
    ) -> SeapopymResult<State> {
        match self {
            Scheduler::Eager => run_eager(unit, state),
            Scheduler::Partitioned => run_partitioned(unit, state, executor),
        }
    }
}

fn run_eager(unit: &KernelUnit, state: &State) -> SeapopymResult<State> {
    let mut result = (unit.function)(state)?;
    for declared in unit.declared(state)? {
        let data = result
            .get_mut(declared.name())
            .ok_or_else(|| SeapopymError::MissingOutput {
                variable: declared.name().to_string(),
                kernel_unit: unit.name.clone(),
            })?;
        data.assign_attrs(declared.attrs());
    }
    Ok(result)
}

fn run_partitioned(
    unit: &KernelUnit,
    state: &State,
    executor: &dyn BlockExecutor,
) -> SeapopymResult<State> {
    let contract = unit.contract(state)?;
    let mut output = contract.allocate()?;
    let blocks = state.blocks();
    debug!(kernel_unit = %unit.name, blocks = blocks.len(), "Dispatching blocks");

    let task = |block: &Block| (unit.function)(&state.select_block(block));
    let results = executor.execute(&blocks, &task);

    for (block, result) in blocks.iter().zip(results) {
        let result = result?;
        for expected in contract.variables() {
            let data = result
                .get(&expected.name)
                .ok_or_else(|| SeapopymError::MissingOutput {
                    variable: expected.name.clone(),
                    kernel_unit: unit.name.clone(),
                })?;
            check_block(expected, block, data)?;
            let target = output
                .get_mut(&expected.name)
                .ok_or_else(|| SeapopymError::Error(format!("'{}' was not allocated", expected.name)))?;
            if !target.write_block(block.ranges(), data) {
                return Err(SeapopymError::ShapeMismatch {
                    variable: expected.name.clone(),
                    expected: expected.block_shape(block),
                    found: data.shape().to_vec(),
                });
            }
        }
    }
    Ok(output)
}

fn check_block(expected: &VariableShape, block: &Block, data: &DataArray) -> SeapopymResult<()> {
    if data.dims() != expected.dims.as_slice() {
        return Err(SeapopymError::DimensionMismatch {
            variable: expected.name.clone(),
            expected: expected.dims.clone(),
            found: data.dims().to_vec(),
        });
    }
    if data.dtype() != expected.dtype {
        return Err(SeapopymError::DTypeMismatch {
            variable: expected.name.clone(),
            expected: expected.dtype,
            found: data.dtype(),
        });
    }
    let block_shape = expected.block_shape(block);
    if data.shape() != block_shape.as_slice() {
        return Err(SeapopymError::ShapeMismatch {
            variable: expected.name.clone(),
            expected: block_shape,
            found: data.shape().to_vec(),
        });
    }
    Ok(())
}

/// A transform and the declaration of its outputs.
#[derive(Clone)]
pub struct KernelUnit {
    name: String,
    function: KernelFunction,
    template: Template,
    chunks: Option<ChunkSpec>,
    to_remove_from_state: Vec<String>,
}

impl fmt::Debug for KernelUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelUnit")
            .field("name", &self.name)
            .field("template", &self.template)
            .field("chunks", &self.chunks)
            .field("to_remove_from_state", &self.to_remove_from_state)
            .finish()
    }
}

impl KernelUnit {
    pub fn new(name: &str, function: KernelFunction, template: impl Into<Template>) -> Self {
        Self {
            name: name.to_string(),
            function,
            template: template.into(),
            chunks: None,
            to_remove_from_state: vec![],
        }
    }

    /// Block sizes given to every declared output that doesn't set its own.
    pub fn with_chunks(mut self, chunks: ChunkSpec) -> Self {
        self.chunks = Some(chunks);
        self
    }

    /// Variables to drop from the state once this unit has run.
    pub fn removing(mut self, names: &[&str]) -> Self {
        self.to_remove_from_state = names.iter().map(|name| name.to_string()).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn to_remove_from_state(&self) -> &[String] {
        &self.to_remove_from_state
    }

    /// Declared outputs for this state.
    pub fn declared(&self, state: &State) -> SeapopymResult<Vec<TemplateUnit>> {
        let units = self.template.units(state)?;
        Ok(match &self.chunks {
            Some(chunks) => units
                .into_iter()
                .map(|unit| match unit.chunks() {
                    Some(_) => unit,
                    None => unit.with_chunks(chunks.clone()),
                })
                .collect(),
            None => units,
        })
    }

    /// The shape of the outputs for this state.
    pub fn contract(&self, state: &State) -> SeapopymResult<ShapeContract> {
        ShapeContract::generate(&self.declared(state)?, state)
    }

    /// Run the unit, choosing the scheduler from the state.
    pub fn run(&self, state: &State, executor: &dyn BlockExecutor) -> SeapopymResult<State> {
        Scheduler::for_state(state).run(self, state, executor)
    }
}

/// An ordered pipeline of kernel units.
#[derive(Debug, Clone)]
pub struct Kernel {
    name: String,
    units: Vec<KernelUnit>,
    executor: Arc<dyn BlockExecutor>,
}

impl Kernel {
    pub fn new(name: &str, units: Vec<KernelUnit>) -> Self {
        Self {
            name: name.to_string(),
            units,
            executor: Arc::new(RayonExecutor),
        }
    }

    /// Give every unit the same output block sizes.
    pub fn with_chunks(mut self, chunks: &ChunkSpec) -> Self {
        self.units = self
            .units
            .into_iter()
            .map(|unit| unit.with_chunks(chunks.clone()))
            .collect();
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn BlockExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn units(&self) -> &[KernelUnit] {
        &self.units
    }

    /// Run every unit in order, merging each result into the state.
    pub fn run(&self, mut state: State) -> SeapopymResult<State> {
        for unit in &self.units {
            let scheduler = Scheduler::for_state(&state);
            info!(
                kernel = %self.name,
                kernel_unit = %unit.name,
                scheduler = ?scheduler,
                "Running kernel unit"
            );
            let patch = scheduler.run(unit, &state, self.executor.as_ref())?;
            state.merge(patch);
            for name in &unit.to_remove_from_state {
                if state.remove(name).is_some() {
                    debug!(kernel_unit = %unit.name, variable = %name, "Dropped consumed variable");
                }
            }
        }
        Ok(state)
    }

    /// Shape of the state once every unit has run, without running any transform.
    pub fn template(&self, state: &State) -> SeapopymResult<ShapeContract> {
        let mut contract = ShapeContract::from_state(state);
        for unit in &self.units {
            contract.merge(unit.contract(state)?);
        }
        Ok(contract)
    }
}
