use super::{bool_array, patch};
use crate::attributes;
use seapopym_core::array::DType;
use seapopym_core::errors::{SeapopymError, SeapopymResult};
use seapopym_core::kernel::KernelUnit;
use seapopym_core::labels::{forcing, Dim};
use seapopym_core::state::State;
use seapopym_core::template::TemplateUnit;

const NAME: &str = "global_mask";

/// Ocean cells: where temperature is defined at the first timestep.
pub fn global_mask(state: &State) -> SeapopymResult<State> {
    let temperature = state.require(forcing::TEMPERATURE, NAME)?;
    let first = temperature
        .select(Dim::Time, 0)
        .ok_or_else(|| SeapopymError::DimensionMismatch {
            variable: forcing::TEMPERATURE.to_string(),
            expected: vec![Dim::Time, Dim::Y, Dim::X, Dim::Z],
            found: temperature.dims().to_vec(),
        })?;
    let mask = first.to_float().mapv(|v| !v.is_nan());
    patch(
        state,
        vec![(
            forcing::GLOBAL_MASK,
            bool_array(forcing::GLOBAL_MASK, first.dims(), mask)?,
        )],
    )
}

pub fn template() -> TemplateUnit {
    TemplateUnit::from_state_dims(forcing::GLOBAL_MASK, &[Dim::Y, Dim::X, Dim::Z])
        .with_attrs(attributes::global_mask())
        .with_dtype(DType::Bool)
}

pub fn kernel_unit() -> KernelUnit {
    KernelUnit::new(NAME, global_mask, template())
}
