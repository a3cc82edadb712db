use super::{fixed, float_array, float_over, patch, sanitize};
use crate::attributes;
use ndarray::{Array, ArrayBase, Axis, Data, Ix3, Ix4, RemoveAxis, Zip};
use seapopym_core::errors::SeapopymResult;
use seapopym_core::kernel::KernelUnit;
use seapopym_core::labels::{configuration, forcing, Dim};
use seapopym_core::state::State;
use seapopym_core::template::TemplateUnit;

const NAME: &str = "biomass";
const DIMS: [Dim; 4] = [Dim::FunctionalGroup, Dim::Time, Dim::Y, Dim::X];

/// Accumulate recruited production into standing biomass.
///
/// `B(t) = R(t) + M(t) * B(t - 1)` along the time axis (axis 1, after functional_group), with
/// `B(-1)` the initial conditions or zero. `mortality` is the surviving fraction per timestep.
pub fn biomass_sequence<S, T, D>(
    recruited: &ArrayBase<S, D>,
    mortality: &ArrayBase<T, D>,
    initial_conditions: Option<&Array<f64, D::Smaller>>,
) -> Array<f64, D>
where
    S: Data<Elem = f64>,
    T: Data<Elem = f64>,
    D: RemoveAxis,
{
    let time = Axis(1);
    let mut biomass = recruited.to_owned();
    let mut previous = initial_conditions.cloned();
    for (mut current, survival) in biomass.axis_iter_mut(time).zip(mortality.axis_iter(time)) {
        if let Some(previous) = &previous {
            Zip::from(&mut current)
                .and(&survival)
                .and(previous)
                .for_each(|b, &m, &p| *b += m * p);
        }
        previous = Some(current.to_owned());
    }
    biomass
}

pub fn biomass(state: &State) -> SeapopymResult<State> {
    let mut recruited = fixed::<f64, Ix4>(
        float_over(state, forcing::RECRUITED, NAME, &DIMS)?,
        forcing::RECRUITED,
    )?;
    let mut mortality = fixed::<f64, Ix4>(
        float_over(state, forcing::MORTALITY_FIELD, NAME, &DIMS)?,
        forcing::MORTALITY_FIELD,
    )?;
    sanitize(&mut recruited);
    sanitize(&mut mortality);
    let initial_conditions = if state.contains(configuration::INITIAL_CONDITION_BIOMASS) {
        let mut initial = fixed::<f64, Ix3>(
            float_over(
                state,
                configuration::INITIAL_CONDITION_BIOMASS,
                NAME,
                &[Dim::FunctionalGroup, Dim::Y, Dim::X],
            )?,
            configuration::INITIAL_CONDITION_BIOMASS,
        )?;
        sanitize(&mut initial);
        Some(initial)
    } else {
        None
    };

    let biomass = biomass_sequence(&recruited, &mortality, initial_conditions.as_ref());
    patch(
        state,
        vec![(forcing::BIOMASS, float_array(forcing::BIOMASS, &DIMS, biomass.into_dyn())?)],
    )
}

pub fn template() -> TemplateUnit {
    TemplateUnit::from_state_dims(forcing::BIOMASS, &DIMS).with_attrs(attributes::biomass())
}

pub fn kernel_unit() -> KernelUnit {
    KernelUnit::new(NAME, biomass, template())
}

/// Drops the recruited production and the mortality field once consumed.
pub fn kernel_unit_light() -> KernelUnit {
    KernelUnit::new("biomass_light", biomass, template())
        .removing(&[forcing::RECRUITED, forcing::MORTALITY_FIELD])
}
