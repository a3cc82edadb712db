//! Model configuration and its conversion into a [`State`].

pub mod environment;
pub mod forcing;
pub mod functional_group;
pub mod kernel;

pub use environment::{ChunkParameter, EnvironmentParameter};
pub use forcing::{ForcingParameter, ForcingUnit};
pub use functional_group::{
    AcidityParameter, FunctionalGroupParameter, FunctionalGroupUnit, FunctionalTypeParameter,
    MigratoryTypeParameter,
};
pub use kernel::KernelParameter;

use ndarray::{Array1, Array2};
use seapopym_core::array::{Attrs, DataArray};
use seapopym_core::coordinates::{new_cohort, new_functional_group};
use seapopym_core::errors::{SeapopymError, SeapopymResult};
use seapopym_core::labels::{configuration, Dim};
use seapopym_core::state::State;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Everything needed to build the state of a model without transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoTransportConfiguration {
    pub functional_group: FunctionalGroupParameter,
    pub forcing: ForcingParameter,
    #[serde(default)]
    pub environment: EnvironmentParameter,
    #[serde(default)]
    pub kernel: KernelParameter,
}

impl NoTransportConfiguration {
    pub fn new(functional_group: FunctionalGroupParameter, forcing: ForcingParameter) -> Self {
        Self {
            functional_group,
            forcing,
            environment: EnvironmentParameter::default(),
            kernel: KernelParameter::default(),
        }
    }

    pub fn with_environment(mut self, environment: EnvironmentParameter) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_kernel(mut self, kernel: KernelParameter) -> Self {
        self.kernel = kernel;
        self
    }

    /// Assemble the coordinates, parameters and forcing fields into a state.
    ///
    /// Groups with fewer cohorts than the longest one are padded with NaN along the cohort axis.
    pub fn to_state(&self) -> SeapopymResult<State> {
        let groups = &self.functional_group;
        groups.validate()?;
        let cohorts = groups
            .functional_group
            .iter()
            .map(|group| group.functional_type.cohorts(&group.name))
            .collect::<SeapopymResult<Vec<_>>>()?;
        check_cohort_timesteps(groups, &cohorts, self.forcing.timestep()?)?;
        let cohort_count = cohorts.iter().map(Vec::len).max().unwrap_or(0);

        let mut state = State::new()
            .with_coordinate(new_functional_group(&groups.names()))
            .with_coordinate(new_cohort(cohort_count));
        for coordinate in self.forcing.coordinates() {
            state.set_coordinate(coordinate);
        }
        self.check_layers(&state)?;

        for (name, data) in self.group_variables() {
            state.insert(name, data)?;
        }
        for (name, data) in cohort_variables(&cohorts, cohort_count) {
            state.insert(name, data)?;
        }
        self.forcing.insert_into(&mut state)?;
        for (name, data) in self.kernel.variables() {
            state.insert(name, data)?;
        }
        info!(
            functional_groups = groups.len(),
            cohorts = cohort_count,
            timesteps = self.forcing.time.len(),
            "Model state built"
        );
        Ok(state)
    }

    fn check_layers(&self, state: &State) -> SeapopymResult<()> {
        let layer = state
            .coordinate(Dim::Z)
            .ok_or_else(|| SeapopymError::Configuration("Missing layer coordinate".to_string()))?;
        for group in &self.functional_group.functional_group {
            for label in [
                group.migratory_type.day_layer,
                group.migratory_type.night_layer,
            ] {
                layer.position(f64::from(label)).map_err(|_| {
                    SeapopymError::Configuration(format!(
                        "Functional group '{}' lives in layer {label} which is not a layer of the forcing",
                        group.name
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Per-group scalars over the functional_group dimension.
    fn group_variables(&self) -> Vec<(&'static str, DataArray)> {
        let groups = &self.functional_group.functional_group;
        let per_group = |value: &dyn Fn(&FunctionalGroupUnit) -> f64| {
            Array1::from_iter(groups.iter().map(value)).into_dyn()
        };
        let mut columns: Vec<(&'static str, ndarray::ArrayD<f64>)> = vec![
            (configuration::ENERGY_TRANSFERT, per_group(&|g| g.energy_transfert)),
            (
                configuration::LAMBDA_TEMPERATURE_0,
                per_group(&|g| g.functional_type.lambda_temperature_0),
            ),
            (
                configuration::GAMMA_LAMBDA_TEMPERATURE,
                per_group(&|g| g.functional_type.gamma_lambda_temperature),
            ),
            (configuration::TR_0, per_group(&|g| g.functional_type.tr_0)),
            (configuration::GAMMA_TR, per_group(&|g| g.functional_type.gamma_tr)),
            (
                configuration::DAY_LAYER,
                per_group(&|g| f64::from(g.migratory_type.day_layer)),
            ),
            (
                configuration::NIGHT_LAYER,
                per_group(&|g| f64::from(g.migratory_type.night_layer)),
            ),
        ];
        if groups.iter().any(|group| group.acidity.is_some()) {
            columns.push((
                configuration::LAMBDA_ACIDITY_0,
                per_group(&|g| g.acidity.map_or(f64::NAN, |a| a.lambda_acidity_0)),
            ));
            columns.push((
                configuration::GAMMA_LAMBDA_ACIDITY,
                per_group(&|g| g.acidity.map_or(f64::NAN, |a| a.gamma_lambda_acidity)),
            ));
        }
        columns
            .into_iter()
            .filter_map(|(name, values)| {
                DataArray::float(vec![Dim::FunctionalGroup], values).map(|data| (name, data))
            })
            .collect()
    }
}

/// Every cohort must span a whole number of forcing timesteps.
fn check_cohort_timesteps(
    groups: &FunctionalGroupParameter,
    cohorts: &[Vec<u32>],
    timestep: f64,
) -> SeapopymResult<()> {
    for (group, counts) in groups.functional_group.iter().zip(cohorts) {
        if counts.iter().any(|count| f64::from(*count) % timestep != 0.0) {
            return Err(SeapopymError::Configuration(format!(
                "Functional group '{}': cohorts_timesteps {counts:?} are not multiples of the \
                 forcing timestep ({timestep} days)",
                group.name
            )));
        }
    }
    Ok(())
}

/// Cohort arrays over (functional_group, cohort): the timesteps per cohort and the first, last
/// and mean timestep of each cohort, counted from 1.
fn cohort_variables(cohorts: &[Vec<u32>], cohort_count: usize) -> Vec<(&'static str, DataArray)> {
    let shape = (cohorts.len(), cohort_count);
    let mut number = Array2::from_elem(shape, f64::NAN);
    let mut min = Array2::from_elem(shape, f64::NAN);
    let mut max = Array2::from_elem(shape, f64::NAN);
    let mut mean = Array2::from_elem(shape, f64::NAN);
    for (group, counts) in cohorts.iter().enumerate() {
        let mut elapsed = 0.0;
        for (cohort, count) in counts.iter().enumerate() {
            let count = f64::from(*count);
            elapsed += count;
            let first = elapsed - (count - 1.0);
            number[[group, cohort]] = count;
            max[[group, cohort]] = elapsed;
            min[[group, cohort]] = first;
            mean[[group, cohort]] = (elapsed + first) / 2.0;
        }
    }

    [
        (
            configuration::TIMESTEPS_NUMBER,
            number,
            "The number of timesteps represented in the cohort.",
        ),
        (configuration::MIN_TIMESTEP, min, "The minimum timestep index."),
        (configuration::MAX_TIMESTEP, max, "The maximum timestep index."),
        (configuration::MEAN_TIMESTEP, mean, "The mean timestep index."),
    ]
    .into_iter()
    .filter_map(|(name, values, description)| {
        let attrs = Attrs::from([("description".to_string(), description.to_string())]);
        DataArray::float(vec![Dim::FunctionalGroup, Dim::Cohort], values.into_dyn())
            .map(|data| (name, data.with_attrs(attrs)))
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ndarray::{ArrayD, IxDyn};
    use seapopym_core::labels::forcing;

    fn group(name: &str, tr_0: f64, cohorts: Option<Vec<u32>>, day_layer: u32) -> FunctionalGroupUnit {
        FunctionalGroupUnit {
            name: name.to_string(),
            energy_transfert: 0.1,
            functional_type: FunctionalTypeParameter {
                lambda_temperature_0: 1.0 / 150.0,
                gamma_lambda_temperature: 0.15,
                tr_0,
                gamma_tr: -0.11,
                cohorts_timesteps: cohorts,
            },
            migratory_type: MigratoryTypeParameter {
                day_layer,
                night_layer: 1,
            },
            acidity: None,
        }
    }

    fn forcing_parameter() -> ForcingParameter {
        forcing_every(1)
    }

    fn forcing_every(days: u64) -> ForcingParameter {
        let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let time: Vec<NaiveDate> = (0..3)
            .map(|step| start + chrono::Days::new(step * days))
            .collect();
        let temperature = ArrayD::from_elem(IxDyn(&[3, 1, 2, 3]), 20.0);
        let production = ArrayD::from_elem(IxDyn(&[3, 1, 2]), 1.0);
        ForcingParameter::new(
            time,
            vec![0.0],
            vec![0.0, 1.0],
            ForcingUnit::new(
                DataArray::float(vec![Dim::Time, Dim::Y, Dim::X, Dim::Z], temperature).unwrap(),
                "degC",
            ),
            ForcingUnit::new(
                DataArray::float(vec![Dim::Time, Dim::Y, Dim::X], production).unwrap(),
                "kg/m^2/day",
            ),
        )
    }

    #[test]
    fn cohorts_are_padded() {
        let configuration = NoTransportConfiguration::new(
            FunctionalGroupParameter::new(vec![
                group("D1N1", 3.0, None, 1),
                group("D2N1", 3.0, Some(vec![2, 1]), 2),
            ]),
            forcing_parameter(),
        );
        let state = configuration.to_state().unwrap();
        assert_eq!(state.dim_len(Dim::Cohort), Some(3));
        let number = state.float(configuration::TIMESTEPS_NUMBER, "test").unwrap();
        assert_eq!(number[[0, 2]], 1.0);
        assert_eq!(number[[1, 0]], 2.0);
        assert_eq!(number[[1, 1]], 1.0);
        assert!(number[[1, 2]].is_nan());
        let mean = state.float(configuration::MEAN_TIMESTEP, "test").unwrap();
        assert_eq!(mean[[0, 0]], 1.0);
        assert_eq!(mean[[1, 0]], 1.5);
        assert_eq!(mean[[1, 1]], 3.0);
        assert!(mean[[1, 2]].is_nan());
        let min = state.float(configuration::MIN_TIMESTEP, "test").unwrap();
        assert_eq!(min[[1, 1]], 3.0);
        assert!(min[[1, 2]].is_nan());
        let max = state.float(configuration::MAX_TIMESTEP, "test").unwrap();
        assert_eq!(max[[1, 0]], 2.0);
        assert!(max[[1, 2]].is_nan());
    }

    #[test]
    fn cohorts_must_be_multiples_of_the_timestep() {
        let weekly = NoTransportConfiguration::new(
            FunctionalGroupParameter::new(vec![group("D1N1", 3.0, None, 1)]),
            forcing_every(7),
        );
        assert!(matches!(
            weekly.to_state(),
            Err(SeapopymError::Configuration(message)) if message.contains("multiples")
        ));
        let daily = NoTransportConfiguration::new(
            FunctionalGroupParameter::new(vec![group("D1N1", 3.0, None, 1)]),
            forcing_every(1),
        );
        assert!(daily.to_state().is_ok());
    }

    #[test]
    fn state_holds_parameters_and_forcing() {
        let configuration = NoTransportConfiguration::new(
            FunctionalGroupParameter::new(vec![group("D1N1", 2.0, None, 1)]),
            forcing_parameter(),
        );
        let state = configuration.to_state().unwrap();
        for name in [
            configuration::ENERGY_TRANSFERT,
            configuration::DAY_LAYER,
            configuration::TIMESTEP,
            configuration::COMPUTE_INITIAL_CONDITIONS,
            forcing::TEMPERATURE,
            forcing::PRIMARY_PRODUCTION,
        ] {
            assert!(state.contains(name), "{name} missing");
        }
        assert!(!state.contains(configuration::LAMBDA_ACIDITY_0));
        assert_eq!(state.scalar(configuration::TIMESTEP, "test").unwrap(), 1.0);
        assert!(!state.flag_or(configuration::COMPUTE_PREPRODUCTION, true));
    }

    #[test]
    fn unknown_layer() {
        let configuration = NoTransportConfiguration::new(
            FunctionalGroupParameter::new(vec![group("D1N1", 2.0, None, 4)]),
            forcing_parameter(),
        );
        assert!(matches!(
            configuration.to_state(),
            Err(SeapopymError::Configuration(_))
        ));
    }
}
