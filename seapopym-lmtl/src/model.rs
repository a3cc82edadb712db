//! The LMTL model without transport.
//!
//! A [`NoTransportModel`] owns the state built from a [`NoTransportConfiguration`] and the
//! [`Kernel`] that computes biomass from it. Running the model replaces the state with the
//! kernel's output.

use crate::configuration::{EnvironmentParameter, NoTransportConfiguration};
use crate::functions::{
    apply_mask::apply_mask_to_state, average_temperature, biomass, day_length, global_mask,
    mask_by_fgroup, mask_temperature, min_temperature, mortality_field, primary_production,
    production,
};
use seapopym_core::array::DataArray;
use seapopym_core::chunk::ChunkSpec;
use seapopym_core::errors::{SeapopymError, SeapopymResult};
use seapopym_core::kernel::Kernel;
use seapopym_core::labels::{configuration, forcing, Dim};
use seapopym_core::state::State;
use seapopym_core::template::ShapeContract;
use tracing::info;

/// Mask, day length, temperature averaged over the migration, recruitment and biomass.
pub fn no_transport_kernel(chunk: &ChunkSpec) -> Kernel {
    Kernel::new(
        "no_transport",
        vec![
            global_mask::kernel_unit(),
            mask_by_fgroup::kernel_unit(),
            day_length::kernel_unit(),
            average_temperature::kernel_unit(),
            primary_production::kernel_unit(),
            min_temperature::kernel_unit(),
            mask_temperature::kernel_unit(),
            mortality_field::kernel_unit(),
            production::kernel_unit(),
            biomass::kernel_unit(),
        ],
    )
    .with_chunks(chunk)
}

/// Same as [`no_transport_kernel`] but each unit drops the inputs no later unit reads.
pub fn no_transport_light_kernel(chunk: &ChunkSpec) -> Kernel {
    Kernel::new(
        "no_transport_light",
        vec![
            global_mask::kernel_unit(),
            mask_by_fgroup::kernel_unit_light(),
            day_length::kernel_unit(),
            average_temperature::kernel_unit_light(),
            primary_production::kernel_unit_light(),
            min_temperature::kernel_unit(),
            mask_temperature::kernel_unit_light(),
            mortality_field::kernel_unit_light(),
            production::kernel_unit(),
            biomass::kernel_unit_light(),
        ],
    )
    .with_chunks(chunk)
}

/// Same as [`no_transport_kernel`] with a mortality driven by both temperature and acidity.
pub fn acidity_kernel(chunk: &ChunkSpec) -> Kernel {
    Kernel::new(
        "no_transport_acidity",
        vec![
            global_mask::kernel_unit(),
            mask_by_fgroup::kernel_unit(),
            day_length::kernel_unit(),
            average_temperature::kernel_unit(),
            average_temperature::acidity_kernel_unit(),
            primary_production::kernel_unit(),
            min_temperature::kernel_unit(),
            mask_temperature::kernel_unit(),
            mortality_field::acidity_kernel_unit(),
            production::kernel_unit(),
            biomass::kernel_unit(),
        ],
    )
    .with_chunks(chunk)
}

#[derive(Debug, Clone)]
pub struct NoTransportModel {
    state: State,
    kernel: Kernel,
    environment: EnvironmentParameter,
}

impl NoTransportModel {
    /// Build the state and the temperature-only pipeline.
    pub fn from_configuration(configuration: &NoTransportConfiguration) -> SeapopymResult<Self> {
        let chunk = configuration.environment.chunk.to_chunk_spec()?;
        Self::build(configuration, no_transport_kernel(&chunk))
    }

    /// Build the state and the pipeline that drops intermediate fields once consumed.
    pub fn light(configuration: &NoTransportConfiguration) -> SeapopymResult<Self> {
        let chunk = configuration.environment.chunk.to_chunk_spec()?;
        Self::build(configuration, no_transport_light_kernel(&chunk))
    }

    /// Build the state and the pipeline where acidity adds to the mortality.
    ///
    /// Requires an acidity forcing and acidity parameters for every functional group.
    pub fn with_acidity(configuration: &NoTransportConfiguration) -> SeapopymResult<Self> {
        if configuration.forcing.acidity.is_none() {
            return Err(SeapopymError::Configuration(
                "The acidity model needs an acidity forcing".to_string(),
            ));
        }
        if !configuration.functional_group.has_acidity() {
            return Err(SeapopymError::Configuration(
                "The acidity model needs acidity parameters for every functional group".to_string(),
            ));
        }
        let chunk = configuration.environment.chunk.to_chunk_spec()?;
        Self::build(configuration, acidity_kernel(&chunk))
    }

    fn build(configuration: &NoTransportConfiguration, kernel: Kernel) -> SeapopymResult<Self> {
        let state = apply_mask_to_state(configuration.to_state()?)?;
        info!(kernel = kernel.name(), variables = state.len(), "Model initialized");
        Ok(Self {
            state,
            kernel,
            environment: configuration.environment,
        })
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    pub fn environment(&self) -> &EnvironmentParameter {
        &self.environment
    }

    /// Shape of every variable once the model has run.
    pub fn template(&self) -> SeapopymResult<ShapeContract> {
        self.kernel.template(&self.state)
    }

    /// Estimated memory footprint of the final state, in bytes.
    pub fn expected_memory_usage(&self) -> SeapopymResult<usize> {
        let bytes = self.template()?.nbytes();
        info!(
            megabytes = bytes as f64 / 1e6,
            "Estimated memory usage of the model state"
        );
        Ok(bytes)
    }

    /// Partition the state with the configured block sizes so that the next run is block by
    /// block.
    pub fn initialize_partitioning(&mut self) -> SeapopymResult<()> {
        let chunks = self.environment.chunk.to_chunk_spec()?;
        info!(chunks = ?chunks, "Partitioning the model state");
        self.state = std::mem::take(&mut self.state).chunk(chunks);
        Ok(())
    }

    pub fn run(&mut self) -> SeapopymResult<()> {
        let state = std::mem::take(&mut self.state);
        self.state = self.kernel.run(state)?;
        Ok(())
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn into_state(self) -> State {
        self.state
    }

    /// Initial conditions for a run starting where this one ended.
    ///
    /// Returns the pending pre-production, over (functional_group, Y, X, cohort), and the biomass
    /// of the last timestep, over (functional_group, Y, X). The pending pre-production is only
    /// exported when `compute_initial_conditions` is set and `compute_preproduction` is not.
    pub fn export_initial_conditions(&self) -> SeapopymResult<(DataArray, DataArray)> {
        let context = "export_initial_conditions";
        let production = self.state.require(forcing::PREPRODUCTION, context)?;
        if production.has_dim(Dim::Time) {
            return Err(SeapopymError::Configuration(
                "The pre-production was exported at every timestep, enable \
                 compute_initial_conditions and disable compute_preproduction instead"
                    .to_string(),
            ));
        }
        let biomass = self.state.require(forcing::BIOMASS, context)?;
        let last = self
            .state
            .dim_len(Dim::Time)
            .and_then(|len| len.checked_sub(1))
            .ok_or_else(|| SeapopymError::MissingDimension {
                dimension: Dim::Time,
                template: context.to_string(),
            })?;
        let biomass = biomass
            .select(Dim::Time, last)
            .ok_or_else(|| SeapopymError::DimensionMismatch {
                variable: forcing::BIOMASS.to_string(),
                expected: vec![Dim::FunctionalGroup, Dim::Time, Dim::Y, Dim::X],
                found: biomass.dims().to_vec(),
            })?;
        info!(
            production = configuration::INITIAL_CONDITION_PRODUCTION,
            biomass = configuration::INITIAL_CONDITION_BIOMASS,
            "Exporting initial conditions"
        );
        Ok((production.clone(), biomass))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::{
        ChunkParameter, ForcingParameter, ForcingUnit, FunctionalGroupParameter,
        FunctionalGroupUnit, FunctionalTypeParameter, KernelParameter, MigratoryTypeParameter,
    };
    use chrono::NaiveDate;
    use ndarray::{ArrayD, IxDyn};

    fn configuration(days: usize) -> NoTransportConfiguration {
        let time: Vec<NaiveDate> = NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .iter_days()
            .take(days)
            .collect();
        let groups = (1..=2)
            .map(|layer| FunctionalGroupUnit {
                name: format!("D{layer}N1"),
                energy_transfert: 0.1,
                functional_type: FunctionalTypeParameter {
                    lambda_temperature_0: 1.0 / 150.0,
                    gamma_lambda_temperature: 0.15,
                    tr_0: 3.0,
                    gamma_tr: -0.11,
                    cohorts_timesteps: None,
                },
                migratory_type: MigratoryTypeParameter {
                    day_layer: layer,
                    night_layer: 1,
                },
                acidity: None,
            })
            .collect();
        NoTransportConfiguration::new(
            FunctionalGroupParameter::new(groups),
            ForcingParameter::new(
                time,
                vec![10.0, 20.0],
                vec![0.0],
                ForcingUnit::new(
                    DataArray::float(
                        vec![Dim::Time, Dim::Y, Dim::X, Dim::Z],
                        ArrayD::from_elem(IxDyn(&[days, 2, 1, 3]), 15.0),
                    )
                    .unwrap(),
                    "degC",
                ),
                ForcingUnit::new(
                    DataArray::float(
                        vec![Dim::Time, Dim::Y, Dim::X],
                        ArrayD::from_elem(IxDyn(&[days, 2, 1]), 1.0),
                    )
                    .unwrap(),
                    "kg/m^2/day",
                ),
            ),
        )
    }

    #[test]
    fn run_produces_biomass() {
        let mut model = NoTransportModel::from_configuration(&configuration(5)).unwrap();
        model.run().unwrap();
        let biomass = model.state().float(forcing::BIOMASS, "test").unwrap();
        assert_eq!(biomass.shape(), &[2, 5, 2, 1]);
        assert!(biomass.iter().all(|v| v.is_finite() && *v >= 0.0));
        assert!(biomass[[0, 4, 0, 0]] > biomass[[0, 0, 0, 0]]);
    }

    #[test]
    fn template_matches_the_run() {
        let mut model = NoTransportModel::from_configuration(&configuration(3)).unwrap();
        let template = model.template().unwrap();
        model.run().unwrap();
        for variable in template.variables() {
            let data = model.state().get(&variable.name).unwrap();
            assert_eq!(data.shape(), variable.shape.as_slice(), "{}", variable.name);
        }
        assert_eq!(model.expected_memory_usage().unwrap(), template.nbytes());
    }

    #[test]
    fn partitioned_run_matches_eager_run() {
        let configuration = configuration(4).with_environment(EnvironmentParameter {
            chunk: ChunkParameter {
                functional_group: Some(1),
                latitude: Some(1),
                longitude: None,
            },
        });
        let mut eager = NoTransportModel::from_configuration(&configuration).unwrap();
        eager.run().unwrap();
        let mut partitioned = NoTransportModel::from_configuration(&configuration).unwrap();
        partitioned.initialize_partitioning().unwrap();
        partitioned.run().unwrap();
        for name in [forcing::RECRUITED, forcing::BIOMASS, forcing::PREPRODUCTION] {
            assert_eq!(
                eager.state().get(name).unwrap().values(),
                partitioned.state().get(name).unwrap().values(),
                "{name}"
            );
        }
    }

    #[test]
    fn initial_conditions_continue_a_run() {
        let mut first = NoTransportModel::from_configuration(&configuration(4)).unwrap();
        first.run().unwrap();
        let (production, biomass) = first.export_initial_conditions().unwrap();
        assert_eq!(
            production.dims(),
            &[Dim::FunctionalGroup, Dim::Y, Dim::X, Dim::Cohort]
        );
        assert_eq!(biomass.dims(), &[Dim::FunctionalGroup, Dim::Y, Dim::X]);

        let mut configuration = configuration(2);
        configuration.forcing = configuration.forcing.with_initial_conditions(
            ForcingUnit::new(production, "kg/m^2/day"),
            ForcingUnit::new(biomass.clone(), "kg/m^2"),
        );
        let mut second = NoTransportModel::from_configuration(&configuration).unwrap();
        second.run().unwrap();
        let continued = second.state().float(forcing::BIOMASS, "test").unwrap();
        let previous = biomass.as_float().unwrap();
        assert!(continued[[0, 0, 0, 0]] > 0.0);
        assert!(continued[[0, 0, 0, 0]] >= previous[[0, 0, 0]] * 0.9);
    }

    #[test]
    fn full_preproduction_cannot_be_exported() {
        let configuration = configuration(3).with_kernel(KernelParameter {
            compute_preproduction: true,
            ..KernelParameter::default()
        });
        let mut model = NoTransportModel::from_configuration(&configuration).unwrap();
        model.run().unwrap();
        assert!(model.export_initial_conditions().is_err());
    }

    #[test]
    fn light_run_drops_intermediate_fields() {
        let mut full = NoTransportModel::from_configuration(&configuration(4)).unwrap();
        full.run().unwrap();
        let mut light = NoTransportModel::light(&configuration(4)).unwrap();
        light.run().unwrap();
        for name in [
            forcing::TEMPERATURE,
            forcing::PRIMARY_PRODUCTION,
            forcing::DAY_LENGTH,
            forcing::MASK_BY_FGROUP,
            forcing::AVG_TEMPERATURE_BY_FGROUP,
            forcing::MIN_TEMPERATURE,
            forcing::RECRUITED,
            forcing::MORTALITY_FIELD,
        ] {
            assert!(!light.state().contains(name), "{name} was kept");
        }
        assert_eq!(
            light.state().get(forcing::BIOMASS).unwrap().values(),
            full.state().get(forcing::BIOMASS).unwrap().values()
        );
        assert!(light.state().nbytes() < full.state().nbytes());
    }

    #[test]
    fn acidity_needs_forcing_and_parameters() {
        let result = NoTransportModel::with_acidity(&configuration(3));
        assert!(matches!(result, Err(SeapopymError::Configuration(_))));
    }
}
