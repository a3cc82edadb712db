//! Survival fraction over one timestep.
//!
//! The mortality rate grows with temperature, `lambda = lambda_0 * exp(gamma * T)`, and the
//! biomass left after a timestep is `exp(-dt * lambda)`. Equivalently the lifespan follows
//! `tau_m = tau_m_0 * exp(-gamma * T)` with `tau_m_0 = 1 / lambda_0`.

use super::{float_array, float_over, patch};
use crate::attributes;
use ndarray::Zip;
use seapopym_core::errors::SeapopymResult;
use seapopym_core::kernel::KernelUnit;
use seapopym_core::labels::{configuration, forcing, Dim};
use seapopym_core::state::State;
use seapopym_core::template::TemplateUnit;

const NAME: &str = "mortality_field";
const ACIDITY_NAME: &str = "mortality_temperature_acidity";
const DIMS: [Dim; 4] = [Dim::FunctionalGroup, Dim::Time, Dim::Y, Dim::X];

/// `exp(-dt * lambda_0 * exp(gamma * T))` over (functional_group, time, Y, X).
pub fn mortality_field(state: &State) -> SeapopymResult<State> {
    let timestep = state.scalar(configuration::TIMESTEP, NAME)?;
    let mut mortality = float_over(state, forcing::AVG_TEMPERATURE_BY_FGROUP, NAME, &DIMS)?;
    let lambda_0 = float_over(state, configuration::LAMBDA_TEMPERATURE_0, NAME, &DIMS)?;
    let gamma = float_over(state, configuration::GAMMA_LAMBDA_TEMPERATURE, NAME, &DIMS)?;
    Zip::from(&mut mortality)
        .and(&lambda_0)
        .and(&gamma)
        .for_each(|m, &l0, &g| *m = (-timestep * l0 * (g * *m).exp()).exp());
    patch(
        state,
        vec![(
            forcing::MORTALITY_FIELD,
            float_array(forcing::MORTALITY_FIELD, &DIMS, mortality)?,
        )],
    )
}

/// Mortality driven by both temperature and acidity (pH), the two rates adding up:
/// `exp(-dt * (lambda_pH * exp(gamma_pH * pH) + lambda_T * exp(gamma_T * T)))`.
pub fn mortality_acidity_field(state: &State) -> SeapopymResult<State> {
    let timestep = state.scalar(configuration::TIMESTEP, ACIDITY_NAME)?;
    let mut mortality =
        float_over(state, forcing::AVG_TEMPERATURE_BY_FGROUP, ACIDITY_NAME, &DIMS)?;
    let acidity = float_over(state, forcing::AVG_ACIDITY_BY_FGROUP, ACIDITY_NAME, &DIMS)?;
    let lambda_t = float_over(state, configuration::LAMBDA_TEMPERATURE_0, ACIDITY_NAME, &DIMS)?;
    let gamma_t = float_over(state, configuration::GAMMA_LAMBDA_TEMPERATURE, ACIDITY_NAME, &DIMS)?;
    let lambda_ph = float_over(state, configuration::LAMBDA_ACIDITY_0, ACIDITY_NAME, &DIMS)?;
    let gamma_ph = float_over(state, configuration::GAMMA_LAMBDA_ACIDITY, ACIDITY_NAME, &DIMS)?;
    Zip::from(&mut mortality)
        .and(&acidity)
        .and(&lambda_t)
        .and(&gamma_t)
        .and(&lambda_ph)
        .and(&gamma_ph)
        .for_each(|m, &ph, &lt, &gt, &lph, &gph| {
            let rate = lph * (gph * ph).exp() + lt * (gt * *m).exp();
            *m = (-timestep * rate).exp();
        });
    patch(
        state,
        vec![(
            forcing::MORTALITY_FIELD,
            float_array(forcing::MORTALITY_FIELD, &DIMS, mortality)?,
        )],
    )
}

pub fn template() -> TemplateUnit {
    TemplateUnit::from_state_dims(forcing::MORTALITY_FIELD, &DIMS)
        .with_attrs(attributes::mortality_field())
}

pub fn acidity_template() -> TemplateUnit {
    TemplateUnit::from_state_dims(forcing::MORTALITY_FIELD, &DIMS)
        .with_attrs(attributes::mortality_acidity_field())
}

pub fn kernel_unit() -> KernelUnit {
    KernelUnit::new(NAME, mortality_field, template())
}

/// Drops the average temperature once consumed.
pub fn kernel_unit_light() -> KernelUnit {
    KernelUnit::new("mortality_field_light", mortality_field, template())
        .removing(&[forcing::AVG_TEMPERATURE_BY_FGROUP])
}

pub fn acidity_kernel_unit() -> KernelUnit {
    KernelUnit::new(ACIDITY_NAME, mortality_acidity_field, acidity_template())
}
