use super::{bool_array, float_over, patch, shape};
use crate::attributes;
use ndarray::{ArrayD, IxDyn};
use seapopym_core::array::DType;
use seapopym_core::errors::SeapopymResult;
use seapopym_core::kernel::KernelUnit;
use seapopym_core::labels::{forcing, Dim};
use seapopym_core::state::State;
use seapopym_core::template::TemplateUnit;

const NAME: &str = "mask_temperature";
const DIMS: [Dim; 5] = [Dim::FunctionalGroup, Dim::Time, Dim::Y, Dim::X, Dim::Cohort];

/// True where the temperature seen by a group reaches the recruitment threshold of a cohort.
///
/// NaN on either side compares false.
pub fn mask_temperature(state: &State) -> SeapopymResult<State> {
    let average = float_over(
        state,
        forcing::AVG_TEMPERATURE_BY_FGROUP,
        NAME,
        &[Dim::FunctionalGroup, Dim::Time, Dim::Y, Dim::X],
    )?;
    let minimum = float_over(
        state,
        forcing::MIN_TEMPERATURE,
        NAME,
        &[Dim::FunctionalGroup, Dim::Cohort],
    )?;
    let shape = shape(state, &DIMS, NAME)?;
    let mask = ArrayD::from_shape_fn(IxDyn(&shape), |index| {
        average[[index[0], index[1], index[2], index[3]]] >= minimum[[index[0], index[4]]]
    });
    patch(
        state,
        vec![(forcing::MASK_TEMPERATURE, bool_array(forcing::MASK_TEMPERATURE, &DIMS, mask)?)],
    )
}

pub fn template() -> TemplateUnit {
    TemplateUnit::from_state_dims(forcing::MASK_TEMPERATURE, &DIMS)
        .with_attrs(attributes::mask_temperature())
        .with_dtype(DType::Bool)
}

pub fn kernel_unit() -> KernelUnit {
    KernelUnit::new(NAME, mask_temperature, template())
}

/// Drops the minimum temperature once consumed.
pub fn kernel_unit_light() -> KernelUnit {
    KernelUnit::new("mask_temperature_light", mask_temperature, template())
        .removing(&[forcing::MIN_TEMPERATURE])
}
