use super::{bool_array, layer_positions, patch, shape};
use crate::attributes;
use ndarray::{ArrayD, Axis, IxDyn};
use seapopym_core::array::DType;
use seapopym_core::errors::SeapopymResult;
use seapopym_core::kernel::KernelUnit;
use seapopym_core::labels::{configuration, forcing, Dim};
use seapopym_core::state::State;
use seapopym_core::template::TemplateUnit;

const NAME: &str = "mask_by_fgroup";
const DIMS: [Dim; 3] = [Dim::FunctionalGroup, Dim::Y, Dim::X];

/// Cells where a functional group is at sea both in its day layer and in its night layer.
pub fn mask_by_fgroup(state: &State) -> SeapopymResult<State> {
    let global = super::bool_over(state, forcing::GLOBAL_MASK, NAME, &[Dim::Y, Dim::X, Dim::Z])?;
    let day = layer_positions(state, configuration::DAY_LAYER, NAME)?;
    let night = layer_positions(state, configuration::NIGHT_LAYER, NAME)?;

    let mut mask = ArrayD::from_elem(IxDyn(&shape(state, &DIMS, NAME)?), false);
    for (group, mut group_mask) in mask.axis_iter_mut(Axis(0)).enumerate() {
        let day_mask = global.index_axis(Axis(2), day[group]);
        let night_mask = global.index_axis(Axis(2), night[group]);
        ndarray::Zip::from(&mut group_mask)
            .and(&day_mask)
            .and(&night_mask)
            .for_each(|m, &d, &n| *m = d && n);
    }
    patch(
        state,
        vec![(forcing::MASK_BY_FGROUP, bool_array(forcing::MASK_BY_FGROUP, &DIMS, mask)?)],
    )
}

pub fn template() -> TemplateUnit {
    TemplateUnit::from_state_dims(forcing::MASK_BY_FGROUP, &DIMS)
        .with_attrs(attributes::mask_by_fgroup())
        .with_dtype(DType::Bool)
}

pub fn kernel_unit() -> KernelUnit {
    KernelUnit::new(NAME, mask_by_fgroup, template())
}

/// Drops the global mask once consumed.
pub fn kernel_unit_light() -> KernelUnit {
    KernelUnit::new("mask_by_fgroup_light", mask_by_fgroup, template())
        .removing(&[forcing::GLOBAL_MASK])
}
