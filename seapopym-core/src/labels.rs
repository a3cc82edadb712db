//! Dimension and variable names shared by every kernel.
//!
//! Variable names are plain string constants shared by kernels, configuration and tests.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named dimension of the model state.
///
/// The declaration order is the canonical order of dimensions in every array:
/// `functional_group, time, Y, X, Z, cohort`. `Ord` follows that order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dim {
    FunctionalGroup,
    Time,
    Y,
    X,
    Z,
    Cohort,
}

impl Dim {
    /// All dimensions in canonical order.
    pub const ORDERED: [Dim; 6] = [
        Dim::FunctionalGroup,
        Dim::Time,
        Dim::Y,
        Dim::X,
        Dim::Z,
        Dim::Cohort,
    ];

    /// The coordinate name used when the dimension is written out.
    pub fn name(&self) -> &'static str {
        match self {
            Dim::FunctionalGroup => "functional_group",
            Dim::Time => "time",
            Dim::Y => "latitude",
            Dim::X => "longitude",
            Dim::Z => "layer",
            Dim::Cohort => "cohort",
        }
    }

    /// Sort a list of dimensions into canonical order.
    pub fn canonical(dims: &[Dim]) -> Vec<Dim> {
        let mut dims = dims.to_vec();
        dims.sort();
        dims
    }

    /// True if the dimensions are unique and already in canonical order.
    pub fn is_canonical(dims: &[Dim]) -> bool {
        dims.windows(2).all(|w| w[0] < w[1])
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Names of the parameters stored in the state by the configuration.
pub mod configuration {
    pub const ENERGY_TRANSFERT: &str = "energy_transfert";
    pub const LAMBDA_TEMPERATURE_0: &str = "lambda_temperature_0";
    pub const GAMMA_LAMBDA_TEMPERATURE: &str = "gamma_lambda_temperature";
    pub const LAMBDA_ACIDITY_0: &str = "lambda_acidity_0";
    pub const GAMMA_LAMBDA_ACIDITY: &str = "gamma_lambda_acidity";
    pub const TR_0: &str = "tr_0";
    pub const GAMMA_TR: &str = "gamma_tr";
    pub const DAY_LAYER: &str = "day_layer";
    pub const NIGHT_LAYER: &str = "night_layer";
    pub const TIMESTEPS_NUMBER: &str = "timesteps_number";
    pub const MIN_TIMESTEP: &str = "min_timestep";
    pub const MAX_TIMESTEP: &str = "max_timestep";
    pub const MEAN_TIMESTEP: &str = "mean_timestep";
    pub const TIMESTEP: &str = "timestep";
    pub const INITIAL_CONDITION_PRODUCTION: &str = "initial_condition_production";
    pub const INITIAL_CONDITION_BIOMASS: &str = "initial_condition_biomass";
    pub const ANGLE_HORIZON_SUN: &str = "angle_horizon_sun";
    pub const COMPUTE_PREPRODUCTION: &str = "compute_preproduction";
    pub const COMPUTE_INITIAL_CONDITIONS: &str = "compute_initial_conditions";
}

/// Names of forcing fields and of the variables computed by the kernels.
pub mod forcing {
    pub const GLOBAL_MASK: &str = "mask";
    pub const MASK_BY_FGROUP: &str = "mask_fgroup";
    pub const DAY_LENGTH: &str = "day_length";
    pub const AVG_TEMPERATURE_BY_FGROUP: &str = "average_temperature";
    pub const AVG_ACIDITY_BY_FGROUP: &str = "average_acidity";
    pub const PRIMARY_PRODUCTION_BY_FGROUP: &str = "primary_production_by_fgroup";
    pub const MIN_TEMPERATURE: &str = "min_temperature";
    pub const MASK_TEMPERATURE: &str = "mask_temperature";
    pub const MORTALITY_FIELD: &str = "mortality_field";
    pub const RECRUITED: &str = "recruited";
    pub const PREPRODUCTION: &str = "preproduction";
    pub const BIOMASS: &str = "biomass";
    pub const TEMPERATURE: &str = "temperature";
    pub const PRIMARY_PRODUCTION: &str = "primary_production";
    pub const ACIDITY: &str = "acidity";
}
