use super::{float_array, float_over, patch};
use crate::attributes;
use ndarray::Zip;
use seapopym_core::errors::SeapopymResult;
use seapopym_core::kernel::KernelUnit;
use seapopym_core::labels::{configuration, forcing, Dim};
use seapopym_core::state::State;
use seapopym_core::template::TemplateUnit;

const NAME: &str = "primary_production_by_fgroup";
const DIMS: [Dim; 4] = [Dim::FunctionalGroup, Dim::Time, Dim::Y, Dim::X];

/// Share of the primary production transferred to each functional group.
pub fn primary_production_by_fgroup(state: &State) -> SeapopymResult<State> {
    let mut production = float_over(state, forcing::PRIMARY_PRODUCTION, NAME, &DIMS)?;
    let transfert = float_over(state, configuration::ENERGY_TRANSFERT, NAME, &DIMS)?;
    Zip::from(&mut production)
        .and(&transfert)
        .for_each(|pp, &e| *pp *= e);
    patch(
        state,
        vec![(
            forcing::PRIMARY_PRODUCTION_BY_FGROUP,
            float_array(forcing::PRIMARY_PRODUCTION_BY_FGROUP, &DIMS, production)?,
        )],
    )
}

pub fn template() -> TemplateUnit {
    TemplateUnit::from_state_dims(forcing::PRIMARY_PRODUCTION_BY_FGROUP, &DIMS)
        .with_attrs(attributes::primary_production_by_fgroup())
}

pub fn kernel_unit() -> KernelUnit {
    KernelUnit::new(NAME, primary_production_by_fgroup, template())
}

/// Drops the raw primary production once consumed.
pub fn kernel_unit_light() -> KernelUnit {
    KernelUnit::new(
        "primary_production_by_fgroup_light",
        primary_production_by_fgroup,
        template(),
    )
    .removing(&[forcing::PRIMARY_PRODUCTION])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::testing::{filled, grid};
    use approx::assert_relative_eq;
    use ndarray::array;
    use seapopym_core::array::DataArray;

    #[test]
    fn scaled_by_energy_transfert() {
        let base = grid(2, 3, 1);
        let state = base
            .clone()
            .with_variable(
                forcing::PRIMARY_PRODUCTION,
                filled(&base, &[Dim::Time, Dim::Y, Dim::X], 10.0),
            )
            .unwrap()
            .with_variable(
                configuration::ENERGY_TRANSFERT,
                DataArray::float(vec![Dim::FunctionalGroup], array![0.1, 0.5].into_dyn())
                    .unwrap(),
            )
            .unwrap();

        let result = primary_production_by_fgroup(&state).unwrap();
        let values = result
            .float(forcing::PRIMARY_PRODUCTION_BY_FGROUP, "test")
            .unwrap();
        assert_eq!(values.shape(), &[2, 3, 1, 1]);
        assert_relative_eq!(values[[0, 2, 0, 0]], 1.0);
        assert_relative_eq!(values[[1, 0, 0, 0]], 5.0);
    }

    #[test]
    fn light_unit_removes_forcing() {
        assert_eq!(
            kernel_unit_light().to_remove_from_state(),
            &[forcing::PRIMARY_PRODUCTION.to_string()]
        );
    }
}
