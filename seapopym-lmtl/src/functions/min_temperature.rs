use super::{float_array, float_over, patch};
use crate::attributes;
use ndarray::Zip;
use seapopym_core::errors::SeapopymResult;
use seapopym_core::kernel::KernelUnit;
use seapopym_core::labels::{configuration, forcing, Dim};
use seapopym_core::state::State;
use seapopym_core::template::TemplateUnit;

const NAME: &str = "min_temperature";
const DIMS: [Dim; 2] = [Dim::FunctionalGroup, Dim::Cohort];

/// Minimum temperature a cohort needs to be recruited.
///
/// Inverts `tau_r = tr_0 * exp(gamma_tr * T)` with the cohort mean age as `tau_r`:
/// `T = ln(mean_timestep / tr_0) / gamma_tr`. Padded cohorts stay NaN.
pub fn min_temperature(state: &State) -> SeapopymResult<State> {
    let mut values = float_over(state, configuration::MEAN_TIMESTEP, NAME, &DIMS)?;
    let tr_0 = float_over(state, configuration::TR_0, NAME, &DIMS)?;
    let gamma_tr = float_over(state, configuration::GAMMA_TR, NAME, &DIMS)?;
    Zip::from(&mut values)
        .and(&tr_0)
        .and(&gamma_tr)
        .for_each(|age, &tr, &gamma| *age = (*age / tr).ln() / gamma);
    patch(
        state,
        vec![(
            forcing::MIN_TEMPERATURE,
            float_array(forcing::MIN_TEMPERATURE, &DIMS, values)?,
        )],
    )
}

pub fn template() -> TemplateUnit {
    TemplateUnit::from_state_dims(forcing::MIN_TEMPERATURE, &DIMS)
        .with_attrs(attributes::min_temperature())
}

pub fn kernel_unit() -> KernelUnit {
    KernelUnit::new(NAME, min_temperature, template())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::testing::grid;
    use approx::assert_relative_eq;
    use ndarray::array;
    use seapopym_core::array::DataArray;

    #[test]
    fn older_cohorts_recruit_at_lower_temperature() {
        let state = grid(1, 1, 3)
            .with_variable(
                configuration::MEAN_TIMESTEP,
                DataArray::float(
                    vec![Dim::FunctionalGroup, Dim::Cohort],
                    array![[1.0, 5.0, f64::NAN]].into_dyn(),
                )
                .unwrap(),
            )
            .unwrap()
            .with_variable(
                configuration::TR_0,
                DataArray::float(vec![Dim::FunctionalGroup], array![10.0].into_dyn()).unwrap(),
            )
            .unwrap()
            .with_variable(
                configuration::GAMMA_TR,
                DataArray::float(vec![Dim::FunctionalGroup], array![-0.1].into_dyn()).unwrap(),
            )
            .unwrap();

        let result = min_temperature(&state).unwrap();
        let values = result.float(forcing::MIN_TEMPERATURE, "test").unwrap();
        assert_relative_eq!(values[[0, 0]], (0.1f64).ln() / -0.1);
        assert!(values[[0, 1]] < values[[0, 0]]);
        assert!(values[[0, 2]].is_nan());
    }
}
