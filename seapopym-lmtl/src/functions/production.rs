//! Time-stepped production: new production enters the youngest cohort, ages through the cohorts
//! and is recruited once the temperature mask allows it.

use super::ageing::{ageing, expand_cohort, sum_cohorts};
use super::{bool_over, fixed, float_array, float_over, patch, sanitize};
use crate::attributes;
use ndarray::{s, Array3, Array4, Array5, ArrayView3, ArrayView4, Axis, Ix2, Ix4, Ix5, Zip};
use seapopym_core::errors::SeapopymResult;
use seapopym_core::kernel::KernelUnit;
use seapopym_core::labels::{configuration, forcing, Dim};
use seapopym_core::state::State;
use seapopym_core::template::{Template, TemplateUnit};
use serde::{Deserialize, Serialize};

const NAME: &str = "production";
const RECRUITED_DIMS: [Dim; 4] = [Dim::FunctionalGroup, Dim::Time, Dim::Y, Dim::X];
const INITIAL_CONDITION_DIMS: [Dim; 4] = [Dim::FunctionalGroup, Dim::Y, Dim::X, Dim::Cohort];
const PREPRODUCTION_DIMS: [Dim; 5] = [Dim::FunctionalGroup, Dim::Time, Dim::Y, Dim::X, Dim::Cohort];

/// Which part of the unrecruited population is returned alongside the recruited production.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreproductionExport {
    /// Recruited production only.
    None,
    /// The pending pre-production at the end of the run, shaped like
    /// `initial_condition_production` so that a following run can start from it.
    #[default]
    Final,
    /// The available pre-production at every timestep.
    Full,
}

impl PreproductionExport {
    /// `compute_preproduction` takes precedence over `compute_initial_conditions`.
    pub fn from_flags(compute_preproduction: bool, compute_initial_conditions: bool) -> Self {
        if compute_preproduction {
            PreproductionExport::Full
        } else if compute_initial_conditions {
            PreproductionExport::Final
        } else {
            PreproductionExport::None
        }
    }

    pub fn from_state(state: &State) -> Self {
        Self::from_flags(
            state.flag_or(configuration::COMPUTE_PREPRODUCTION, false),
            state.flag_or(configuration::COMPUTE_INITIAL_CONDITIONS, true),
        )
    }
}

/// Output of the production loop of one functional group.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductionOutput {
    /// Recruited production summed over cohorts, (time, Y, X).
    pub recruited: Array3<f64>,
    /// (Y, X, cohort) for [`PreproductionExport::Final`],
    /// (time, Y, X, cohort) for [`PreproductionExport::Full`].
    pub preproduction: Option<Preproduction>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Preproduction {
    Final(Array3<f64>),
    Full(Array4<f64>),
}

/// Run the production loop of a single functional group.
///
/// * `primary_production`: (time, Y, X) production entering the first cohort.
/// * `mask_temperature`: (time, Y, X, cohort), true where a cohort is recruited.
/// * `timesteps_per_cohort`: one entry per cohort of the mask.
/// * `initial_production`: (Y, X, cohort) pre-production carried over from a previous run.
///
/// The inputs must not contain NaN. Ageing is skipped on the last timestep so that the final
/// pre-production is the one pending before that step.
pub fn production_sequence(
    primary_production: ArrayView3<f64>,
    mask_temperature: ArrayView4<bool>,
    timesteps_per_cohort: &[f64],
    initial_production: Option<ArrayView3<f64>>,
    export: PreproductionExport,
) -> ProductionOutput {
    let (timesteps, ny, nx) = primary_production.dim();
    let cohorts = timesteps_per_cohort.len();

    let mut next_preproduction = initial_production
        .map(|initial| initial.to_owned())
        .unwrap_or_else(|| Array3::zeros((ny, nx, cohorts)));
    let mut recruited = Array3::zeros((timesteps, ny, nx));
    let mut history = match export {
        PreproductionExport::Full => Some(Array4::zeros((timesteps, ny, nx, cohorts))),
        _ => None,
    };

    for t in 0..timesteps {
        let mut available =
            expand_cohort(&primary_production.index_axis(Axis(0), t), cohorts);
        available += &next_preproduction;
        let mask = mask_temperature.index_axis(Axis(0), t);

        if t + 1 < timesteps {
            let not_recruited = Zip::from(&available)
                .and(&mask)
                .map_collect(|&p, &m| if m { 0.0 } else { p });
            next_preproduction = ageing(&not_recruited, timesteps_per_cohort);
        }
        let recruited_by_cohort = Zip::from(&available)
            .and(&mask)
            .map_collect(|&p, &m| if m { p } else { 0.0 });
        recruited
            .index_axis_mut(Axis(0), t)
            .assign(&sum_cohorts(&recruited_by_cohort));
        if let Some(history) = history.as_mut() {
            history.index_axis_mut(Axis(0), t).assign(&available);
        }
    }

    let preproduction = match export {
        PreproductionExport::None => None,
        PreproductionExport::Final => Some(Preproduction::Final(next_preproduction)),
        PreproductionExport::Full => history.map(Preproduction::Full),
    };
    ProductionOutput {
        recruited,
        preproduction,
    }
}

/// Number of leading cohorts with a defined timestep count.
///
/// Groups with fewer cohorts than the shared cohort axis are padded with NaN.
fn valid_cohorts(timesteps_per_cohort: &[f64]) -> usize {
    timesteps_per_cohort
        .iter()
        .take_while(|count| count.is_finite())
        .count()
}

/// Recruited production of every functional group, and the pre-production export selected by the
/// `compute_preproduction` and `compute_initial_conditions` flags of the state.
pub fn production(state: &State) -> SeapopymResult<State> {
    let export = PreproductionExport::from_state(state);

    let mut primary_production = fixed::<f64, Ix4>(
        float_over(state, forcing::PRIMARY_PRODUCTION_BY_FGROUP, NAME, &RECRUITED_DIMS)?,
        forcing::PRIMARY_PRODUCTION_BY_FGROUP,
    )?;
    sanitize(&mut primary_production);
    let mask = fixed::<bool, Ix5>(
        bool_over(state, forcing::MASK_TEMPERATURE, NAME, &PREPRODUCTION_DIMS)?,
        forcing::MASK_TEMPERATURE,
    )?;
    let timesteps_number = fixed::<f64, Ix2>(
        float_over(
            state,
            configuration::TIMESTEPS_NUMBER,
            NAME,
            &[Dim::FunctionalGroup, Dim::Cohort],
        )?,
        configuration::TIMESTEPS_NUMBER,
    )?;
    let initial_production = if state.contains(configuration::INITIAL_CONDITION_PRODUCTION) {
        let mut initial = fixed::<f64, Ix4>(
            float_over(
                state,
                configuration::INITIAL_CONDITION_PRODUCTION,
                NAME,
                &INITIAL_CONDITION_DIMS,
            )?,
            configuration::INITIAL_CONDITION_PRODUCTION,
        )?;
        sanitize(&mut initial);
        Some(initial)
    } else {
        None
    };

    let (groups, timesteps, ny, nx) = primary_production.dim();
    let cohorts = mask.len_of(Axis(4));
    let mut recruited = Array4::zeros((groups, timesteps, ny, nx));
    let mut final_preproduction = (export == PreproductionExport::Final)
        .then(|| Array4::zeros((groups, ny, nx, cohorts)));
    let mut full_preproduction = (export == PreproductionExport::Full)
        .then(|| Array5::zeros((groups, timesteps, ny, nx, cohorts)));

    for group in 0..groups {
        let counts: Vec<f64> = timesteps_number.row(group).to_vec();
        let valid = valid_cohorts(&counts);
        let output = production_sequence(
            primary_production.index_axis(Axis(0), group),
            mask.slice(s![group, .., .., .., ..valid]),
            &counts[..valid],
            initial_production
                .as_ref()
                .map(|initial| initial.slice(s![group, .., .., ..valid])),
            export,
        );
        recruited.index_axis_mut(Axis(0), group).assign(&output.recruited);
        match output.preproduction {
            Some(Preproduction::Final(values)) => {
                if let Some(target) = final_preproduction.as_mut() {
                    target.slice_mut(s![group, .., .., ..valid]).assign(&values);
                }
            }
            Some(Preproduction::Full(values)) => {
                if let Some(target) = full_preproduction.as_mut() {
                    target.slice_mut(s![group, .., .., .., ..valid]).assign(&values);
                }
            }
            None => {}
        }
    }

    let mut variables = vec![(
        forcing::RECRUITED,
        float_array(forcing::RECRUITED, &RECRUITED_DIMS, recruited.into_dyn())?,
    )];
    if let Some(values) = final_preproduction {
        variables.push((
            forcing::PREPRODUCTION,
            float_array(forcing::PREPRODUCTION, &INITIAL_CONDITION_DIMS, values.into_dyn())?,
        ));
    }
    if let Some(values) = full_preproduction {
        variables.push((
            forcing::PREPRODUCTION,
            float_array(forcing::PREPRODUCTION, &PREPRODUCTION_DIMS, values.into_dyn())?,
        ));
    }
    patch(state, variables)
}

fn recruited_template() -> TemplateUnit {
    TemplateUnit::from_state_dims(forcing::RECRUITED, &RECRUITED_DIMS)
        .with_attrs(attributes::recruited())
}

/// The outputs depend on the export flags carried by the state.
pub fn templates(state: &State) -> SeapopymResult<Vec<TemplateUnit>> {
    let mut units = vec![recruited_template()];
    let dims: &[Dim] = match PreproductionExport::from_state(state) {
        PreproductionExport::None => return Ok(units),
        PreproductionExport::Final => &INITIAL_CONDITION_DIMS,
        PreproductionExport::Full => &PREPRODUCTION_DIMS,
    };
    units.push(
        TemplateUnit::from_state_dims(forcing::PREPRODUCTION, dims)
            .with_attrs(attributes::preproduction()),
    );
    Ok(units)
}

pub fn kernel_unit() -> KernelUnit {
    KernelUnit::new(NAME, production, Template::Dynamic(templates))
}
