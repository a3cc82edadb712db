//! Fields seen by each functional group along its diel vertical migration.
//!
//! A group spends the day in its day layer and the night in its night layer, so the field it
//! experiences is `day_length * F(day_layer) + (1 - day_length) * F(night_layer)`.

use super::{bool_over, float_array, float_over, layer_positions, patch, shape};
use crate::attributes;
use ndarray::{ArrayD, Axis, IxDyn, Zip};
use seapopym_core::errors::SeapopymResult;
use seapopym_core::kernel::KernelUnit;
use seapopym_core::labels::{configuration, forcing, Dim};
use seapopym_core::state::State;
use seapopym_core::template::TemplateUnit;

const DIMS: [Dim; 4] = [Dim::FunctionalGroup, Dim::Time, Dim::Y, Dim::X];

/// Day/night weighted average of a (time, Y, X, Z) field, NaN outside the group mask.
fn layer_average(state: &State, field: &str, context: &str) -> SeapopymResult<ArrayD<f64>> {
    let values = float_over(state, field, context, &[Dim::Time, Dim::Y, Dim::X, Dim::Z])?;
    let day_length = float_over(state, forcing::DAY_LENGTH, context, &[Dim::Time, Dim::Y, Dim::X])?;
    let mask = bool_over(state, forcing::MASK_BY_FGROUP, context, &[Dim::FunctionalGroup, Dim::Y, Dim::X])?;
    let day = layer_positions(state, configuration::DAY_LAYER, context)?;
    let night = layer_positions(state, configuration::NIGHT_LAYER, context)?;

    let mut average = ArrayD::zeros(IxDyn(&shape(state, &DIMS, context)?));
    for (group, mut group_average) in average.axis_iter_mut(Axis(0)).enumerate() {
        let day_values = values.index_axis(Axis(3), day[group]);
        let night_values = values.index_axis(Axis(3), night[group]);
        let group_mask = mask.index_axis(Axis(0), group);
        for (t, mut slice) in group_average.axis_iter_mut(Axis(0)).enumerate() {
            Zip::from(&mut slice)
                .and(&day_length.index_axis(Axis(0), t))
                .and(&day_values.index_axis(Axis(0), t))
                .and(&night_values.index_axis(Axis(0), t))
                .and(&group_mask)
                .for_each(|out, &dl, &d, &n, &m| {
                    *out = if m { dl * d + (1.0 - dl) * n } else { f64::NAN };
                });
        }
    }
    Ok(average)
}

/// Temperature averaged over the day and night layers of each group.
pub fn average_temperature(state: &State) -> SeapopymResult<State> {
    let average = layer_average(state, forcing::TEMPERATURE, "average_temperature")?;
    patch(
        state,
        vec![(
            forcing::AVG_TEMPERATURE_BY_FGROUP,
            float_array(forcing::AVG_TEMPERATURE_BY_FGROUP, &DIMS, average)?,
        )],
    )
}

/// Acidity (pH) averaged over the day and night layers of each group.
pub fn average_acidity(state: &State) -> SeapopymResult<State> {
    let average = layer_average(state, forcing::ACIDITY, "average_acidity")?;
    patch(
        state,
        vec![(
            forcing::AVG_ACIDITY_BY_FGROUP,
            float_array(forcing::AVG_ACIDITY_BY_FGROUP, &DIMS, average)?,
        )],
    )
}

pub fn template() -> TemplateUnit {
    TemplateUnit::from_state_dims(forcing::AVG_TEMPERATURE_BY_FGROUP, &DIMS)
        .with_attrs(attributes::average_temperature())
}

pub fn acidity_template() -> TemplateUnit {
    TemplateUnit::from_state_dims(forcing::AVG_ACIDITY_BY_FGROUP, &DIMS)
        .with_attrs(attributes::average_acidity())
}

pub fn kernel_unit() -> KernelUnit {
    KernelUnit::new("average_temperature", average_temperature, template())
}

/// Drops the temperature, day length and group mask once consumed.
pub fn kernel_unit_light() -> KernelUnit {
    KernelUnit::new("average_temperature_light", average_temperature, template()).removing(&[
        forcing::TEMPERATURE,
        forcing::DAY_LENGTH,
        forcing::MASK_BY_FGROUP,
    ])
}

pub fn acidity_kernel_unit() -> KernelUnit {
    KernelUnit::new("average_acidity", average_acidity, acidity_template())
}
