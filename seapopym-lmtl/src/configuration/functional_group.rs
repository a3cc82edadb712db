//! Parameters of the functional groups.

use seapopym_core::errors::{SeapopymError, SeapopymResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Relation between temperature and the life cycle of a functional group.
///
/// Rates are per day, recruitment ages in days and sensitivities per degree Celsius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionalTypeParameter {
    /// Mortality rate at 0°C (1/day). Must be positive or zero.
    pub lambda_temperature_0: f64,
    /// Sensitivity of the mortality rate to temperature (1/°C). Must be strictly positive.
    pub gamma_lambda_temperature: f64,
    /// Maximum recruitment age, reached at 0°C (day). Must be positive or zero.
    pub tr_0: f64,
    /// Sensitivity of the recruitment age to temperature (1/°C). Must be strictly negative.
    pub gamma_tr: f64,
    /// Number of timesteps aggregated in each cohort.
    ///
    /// Defaults to one cohort per timestep up to the maximum recruitment age. The counts must sum
    /// to `ceil(tr_0)`.
    #[serde(default)]
    pub cohorts_timesteps: Option<Vec<u32>>,
}

impl FunctionalTypeParameter {
    fn validate(&self, group: &str) -> SeapopymResult<()> {
        check(group, "lambda_temperature_0", self.lambda_temperature_0, |v| v >= 0.0, ">= 0")?;
        check(group, "gamma_lambda_temperature", self.gamma_lambda_temperature, |v| v > 0.0, "> 0")?;
        check(group, "tr_0", self.tr_0, |v| v >= 0.0, ">= 0")?;
        check(group, "gamma_tr", self.gamma_tr, |v| v < 0.0, "< 0")
    }

    /// Timesteps per cohort, the last cohort spanning a single timestep.
    ///
    /// A last cohort spanning more than one timestep is split: one timestep moves into a new
    /// trailing cohort.
    pub fn cohorts(&self, group: &str) -> SeapopymResult<Vec<u32>> {
        let max_age = self.tr_0.ceil();
        let mut cohorts = match &self.cohorts_timesteps {
            Some(cohorts) => cohorts.clone(),
            None => vec![1; max_age as usize],
        };
        if cohorts.is_empty() {
            return Err(SeapopymError::Configuration(format!(
                "Functional group '{group}' has no cohort (tr_0 = {})",
                self.tr_0
            )));
        }
        if cohorts.contains(&0) {
            return Err(SeapopymError::Configuration(format!(
                "Functional group '{group}': cohorts_timesteps {cohorts:?} must be strictly positive"
            )));
        }
        let total: u32 = cohorts.iter().sum();
        if f64::from(total) != max_age {
            return Err(SeapopymError::Configuration(format!(
                "Functional group '{group}': cohorts_timesteps {cohorts:?} sum to {total} instead of \
                 the maximum recruitment age {max_age} (ceiled tr_0)"
            )));
        }
        let last = cohorts.len() - 1;
        if cohorts[last] != 1 {
            let previous = cohorts.clone();
            cohorts[last] -= 1;
            cohorts.push(1);
            warn!(
                functional_group = group,
                previous = ?previous,
                new = ?cohorts,
                "The last cohort must span a single timestep, splitting it"
            );
        }
        Ok(cohorts)
    }
}

/// Vertical position of a functional group, as labels of the layer coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigratoryTypeParameter {
    pub day_layer: u32,
    pub night_layer: u32,
}

/// Response of the mortality to acidity (pH).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcidityParameter {
    /// Mortality rate at pH 0 (1/day).
    pub lambda_acidity_0: f64,
    /// Sensitivity of the mortality rate to pH.
    pub gamma_lambda_acidity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionalGroupUnit {
    pub name: String,
    /// Share of the primary production transferred to the group, in [0, 1].
    pub energy_transfert: f64,
    pub functional_type: FunctionalTypeParameter,
    pub migratory_type: MigratoryTypeParameter,
    #[serde(default)]
    pub acidity: Option<AcidityParameter>,
}

impl FunctionalGroupUnit {
    pub fn validate(&self) -> SeapopymResult<()> {
        check(
            &self.name,
            "energy_transfert",
            self.energy_transfert,
            |v| (0.0..=1.0).contains(&v),
            "in [0, 1]",
        )?;
        self.functional_type.validate(&self.name)
    }
}

/// Every functional group of a simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionalGroupParameter {
    pub functional_group: Vec<FunctionalGroupUnit>,
}

impl FunctionalGroupParameter {
    pub fn new(functional_group: Vec<FunctionalGroupUnit>) -> Self {
        Self { functional_group }
    }

    /// Parse `[[functional_group]]` tables.
    pub fn from_toml(input: &str) -> SeapopymResult<Self> {
        let parameter: Self = toml::from_str(input)
            .map_err(|error| SeapopymError::Configuration(error.to_string()))?;
        parameter.validate()?;
        Ok(parameter)
    }

    pub fn validate(&self) -> SeapopymResult<()> {
        if self.functional_group.is_empty() {
            return Err(SeapopymError::Configuration(
                "At least one functional group is required".to_string(),
            ));
        }
        for (i, group) in self.functional_group.iter().enumerate() {
            if self.functional_group[..i].iter().any(|other| other.name == group.name) {
                return Err(SeapopymError::Configuration(format!(
                    "Functional group name '{}' is used twice",
                    group.name
                )));
            }
            group.validate()?;
        }
        Ok(())
    }

    pub fn names(&self) -> Vec<String> {
        self.functional_group.iter().map(|group| group.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.functional_group.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functional_group.is_empty()
    }

    /// True if every group carries acidity parameters.
    pub fn has_acidity(&self) -> bool {
        self.functional_group.iter().all(|group| group.acidity.is_some())
    }
}

fn check(
    group: &str,
    parameter: &str,
    value: f64,
    valid: impl Fn(f64) -> bool,
    expected: &str,
) -> SeapopymResult<()> {
    if valid(value) {
        Ok(())
    } else {
        Err(SeapopymError::Configuration(format!(
            "Functional group '{group}': {parameter} = {value} but it must be {expected}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn functional_type(tr_0: f64, cohorts: Option<Vec<u32>>) -> FunctionalTypeParameter {
        FunctionalTypeParameter {
            lambda_temperature_0: 1.0 / 150.0,
            gamma_lambda_temperature: 0.15,
            tr_0,
            gamma_tr: -0.11,
            cohorts_timesteps: cohorts,
        }
    }

    #[test]
    fn default_cohorts_follow_tr_0() {
        let cohorts = functional_type(10.38, None).cohorts("D1N1").unwrap();
        assert_eq!(cohorts, vec![1; 11]);
    }

    #[test]
    fn last_cohort_is_split() {
        let cohorts = functional_type(6.0, Some(vec![1, 2, 3])).cohorts("D1N1").unwrap();
        assert_eq!(cohorts, vec![1, 2, 2, 1]);
    }

    #[test]
    fn cohorts_must_sum_to_the_recruitment_age() {
        let result = functional_type(6.0, Some(vec![1, 2])).cohorts("D1N1");
        assert!(matches!(result, Err(SeapopymError::Configuration(_))));
        let result = functional_type(0.0, None).cohorts("D1N1");
        assert!(matches!(result, Err(SeapopymError::Configuration(_))));
    }

    #[test]
    fn parameter_bounds() {
        let mut group = FunctionalGroupUnit {
            name: "D1N1".to_string(),
            energy_transfert: 1.5,
            functional_type: functional_type(3.0, None),
            migratory_type: MigratoryTypeParameter {
                day_layer: 1,
                night_layer: 1,
            },
            acidity: None,
        };
        assert!(group.validate().is_err());
        group.energy_transfert = 0.1668;
        assert!(group.validate().is_ok());
        group.functional_type.gamma_tr = 0.1;
        assert!(group.validate().is_err());
    }

    #[test]
    fn from_toml() {
        let parameter = FunctionalGroupParameter::from_toml(
            r#"
            [[functional_group]]
            name = "D1N1"
            energy_transfert = 0.1668
            functional_type = { lambda_temperature_0 = 0.00667, gamma_lambda_temperature = 0.15, tr_0 = 10.38, gamma_tr = -0.11 }
            migratory_type = { day_layer = 1, night_layer = 1 }

            [[functional_group]]
            name = "D2N1"
            energy_transfert = 0.1557
            migratory_type = { day_layer = 2, night_layer = 1 }
            acidity = { lambda_acidity_0 = 0.01, gamma_lambda_acidity = -0.5 }

            [functional_group.functional_type]
            lambda_temperature_0 = 0.00667
            gamma_lambda_temperature = 0.15
            tr_0 = 10.38
            gamma_tr = -0.11
            cohorts_timesteps = [5, 5, 1]
            "#,
        )
        .unwrap();
        assert_eq!(parameter.names(), vec!["D1N1", "D2N1"]);
        assert!(!parameter.has_acidity());
        assert_eq!(
            parameter.functional_group[1].functional_type.cohorts_timesteps,
            Some(vec![5, 5, 1])
        );
    }

    #[test]
    fn duplicated_names() {
        let group = FunctionalGroupUnit {
            name: "D1N1".to_string(),
            energy_transfert: 0.1,
            functional_type: functional_type(3.0, None),
            migratory_type: MigratoryTypeParameter {
                day_layer: 1,
                night_layer: 1,
            },
            acidity: None,
        };
        let parameter = FunctionalGroupParameter::new(vec![group.clone(), group]);
        assert!(parameter.validate().is_err());
    }
}
