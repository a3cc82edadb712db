//! Forcing fields and the grid they are defined on.

use chrono::NaiveDate;
use seapopym_core::array::DataArray;
use seapopym_core::coordinates::{new_latitude, new_layer, new_longitude, new_time, Coordinate};
use seapopym_core::errors::{SeapopymError, SeapopymResult};
use seapopym_core::labels::{configuration, forcing};
use seapopym_core::state::State;
use seapopym_core::units::{standardize, StandardUnit};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A forcing field with the units it is expressed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForcingUnit {
    pub array: DataArray,
    pub units: String,
}

impl ForcingUnit {
    pub fn new(array: DataArray, units: &str) -> Self {
        Self {
            array,
            units: units.to_string(),
        }
    }

    /// The field converted to `standard` units.
    pub fn standardized(&self, name: &str, standard: StandardUnit) -> SeapopymResult<DataArray> {
        standardize(name, &self.array, &self.units, standard)
    }
}

/// Forcing fields of a simulation.
///
/// Temperature and acidity are (time, Y, X, Z) fields, primary production a (time, Y, X) field.
/// Initial conditions span (functional_group, Y, X, cohort) for production and
/// (functional_group, Y, X) for biomass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForcingParameter {
    pub time: Vec<NaiveDate>,
    pub latitude: Vec<f64>,
    pub longitude: Vec<f64>,
    /// Layer labels. Defaults to 1, 2, 3.
    #[serde(default)]
    pub layer: Option<Vec<f64>>,
    pub temperature: ForcingUnit,
    pub primary_production: ForcingUnit,
    #[serde(default)]
    pub acidity: Option<ForcingUnit>,
    #[serde(default)]
    pub initial_condition_production: Option<ForcingUnit>,
    #[serde(default)]
    pub initial_condition_biomass: Option<ForcingUnit>,
    /// Timestep in days. Derived from the time axis when absent.
    #[serde(default)]
    pub timestep: Option<f64>,
}

impl ForcingParameter {
    pub fn new(
        time: Vec<NaiveDate>,
        latitude: Vec<f64>,
        longitude: Vec<f64>,
        temperature: ForcingUnit,
        primary_production: ForcingUnit,
    ) -> Self {
        Self {
            time,
            latitude,
            longitude,
            layer: None,
            temperature,
            primary_production,
            acidity: None,
            initial_condition_production: None,
            initial_condition_biomass: None,
            timestep: None,
        }
    }

    pub fn with_layer(mut self, layer: Vec<f64>) -> Self {
        self.layer = Some(layer);
        self
    }

    pub fn with_acidity(mut self, acidity: ForcingUnit) -> Self {
        self.acidity = Some(acidity);
        self
    }

    pub fn with_initial_conditions(mut self, production: ForcingUnit, biomass: ForcingUnit) -> Self {
        self.initial_condition_production = Some(production);
        self.initial_condition_biomass = Some(biomass);
        self
    }

    pub fn with_timestep(mut self, timestep: f64) -> Self {
        self.timestep = Some(timestep);
        self
    }

    pub fn coordinates(&self) -> Vec<Coordinate> {
        vec![
            new_time(self.time.clone()),
            new_latitude(self.latitude.clone()),
            new_longitude(self.longitude.clone()),
            new_layer(self.layer.clone()),
        ]
    }

    /// The timestep of the time axis, in days.
    ///
    /// The time axis must be regular. A user supplied timestep must agree with it.
    pub fn timestep(&self) -> SeapopymResult<f64> {
        let mut steps: Vec<i64> = self
            .time
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).num_days())
            .collect();
        steps.sort_unstable();
        steps.dedup();
        let derived = match steps.as_slice() {
            [] => None,
            [step] if *step > 0 => Some(*step as f64),
            _ => {
                return Err(SeapopymError::Configuration(format!(
                    "The time axis is not regular, timesteps of {steps:?} days were found"
                )))
            }
        };
        match (derived, self.timestep) {
            (Some(derived), Some(given)) if derived != given => {
                Err(SeapopymError::Configuration(format!(
                    "The timestep is {given} days but the time axis has a timestep of {derived} days"
                )))
            }
            (Some(derived), _) => Ok(derived),
            (None, Some(given)) if given > 0.0 => Ok(given),
            _ => Err(SeapopymError::Configuration(
                "Cannot derive the timestep from a time axis with fewer than two dates".to_string(),
            )),
        }
    }

    /// Fields in standard units, under their state names.
    pub fn fields(&self) -> SeapopymResult<Vec<(&'static str, DataArray)>> {
        let mut fields = vec![
            (
                forcing::TEMPERATURE,
                self.temperature
                    .standardized(forcing::TEMPERATURE, StandardUnit::Temperature)?,
            ),
            (
                forcing::PRIMARY_PRODUCTION,
                self.primary_production
                    .standardized(forcing::PRIMARY_PRODUCTION, StandardUnit::Production)?,
            ),
        ];
        let optional = [
            (forcing::ACIDITY, &self.acidity, StandardUnit::Dimensionless),
            (
                configuration::INITIAL_CONDITION_PRODUCTION,
                &self.initial_condition_production,
                StandardUnit::Production,
            ),
            (
                configuration::INITIAL_CONDITION_BIOMASS,
                &self.initial_condition_biomass,
                StandardUnit::Biomass,
            ),
        ];
        for (name, unit, standard) in optional {
            if let Some(unit) = unit {
                fields.push((name, unit.standardized(name, standard)?));
            }
        }
        Ok(fields)
    }

    /// Insert the fields and the timestep into a state that already holds every coordinate.
    pub fn insert_into(&self, state: &mut State) -> SeapopymResult<()> {
        for (name, data) in self.fields()? {
            debug!(variable = name, units = ?data.attrs().get("units"), "Adding forcing");
            state.insert(name, data)?;
        }
        state.insert(configuration::TIMESTEP, DataArray::scalar(self.timestep()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};
    use seapopym_core::labels::Dim;

    fn field(dims: Vec<Dim>, shape: &[usize], value: f64) -> DataArray {
        DataArray::float(dims, ArrayD::from_elem(IxDyn(shape), value)).unwrap()
    }

    fn dates(days: &[u32]) -> Vec<NaiveDate> {
        days.iter()
            .map(|day| NaiveDate::from_ymd_opt(2020, 1, *day).unwrap())
            .collect()
    }

    fn parameter(days: &[u32]) -> ForcingParameter {
        let n = days.len();
        ForcingParameter::new(
            dates(days),
            vec![0.0],
            vec![0.0],
            ForcingUnit::new(
                field(vec![Dim::Time, Dim::Y, Dim::X, Dim::Z], &[n, 1, 1, 3], 288.15),
                "kelvin",
            ),
            ForcingUnit::new(
                field(vec![Dim::Time, Dim::Y, Dim::X], &[n, 1, 1], 1.0),
                "g/m^2/day",
            ),
        )
    }

    #[test]
    fn timestep_from_the_time_axis() {
        assert_eq!(parameter(&[1, 2, 3]).timestep().unwrap(), 1.0);
        assert_eq!(parameter(&[1, 8, 15]).timestep().unwrap(), 7.0);
        assert!(parameter(&[1, 2, 4]).timestep().is_err());
        assert!(parameter(&[1, 2, 3]).with_timestep(2.0).timestep().is_err());
        assert_eq!(parameter(&[1]).with_timestep(1.0).timestep().unwrap(), 1.0);
        assert!(parameter(&[1]).timestep().is_err());
    }

    #[test]
    fn fields_are_standardized() {
        let fields = parameter(&[1, 2]).fields().unwrap();
        let (name, temperature) = &fields[0];
        assert_eq!(*name, forcing::TEMPERATURE);
        approx::assert_relative_eq!(temperature.as_float().unwrap()[[0, 0, 0, 0]], 15.0, epsilon = 1e-9);
        assert_eq!(temperature.attrs().get("units").map(String::as_str), Some("degC"));
        let (_, production) = &fields[1];
        approx::assert_relative_eq!(production.as_float().unwrap()[[1, 0, 0]], 1e-3, epsilon = 1e-12);
    }

    #[test]
    fn unknown_units_are_rejected() {
        let mut parameter = parameter(&[1, 2]);
        parameter.primary_production.units = "furlong".to_string();
        assert!(matches!(
            parameter.fields(),
            Err(SeapopymError::IncompatibleUnits { .. })
        ));
    }

    #[test]
    fn shape_checked_against_coordinates() {
        let parameter = parameter(&[1, 2]);
        let mut state = State::new();
        for coordinate in parameter.coordinates() {
            state.set_coordinate(coordinate);
        }
        parameter.insert_into(&mut state).unwrap();
        assert_eq!(state.scalar(configuration::TIMESTEP, "test").unwrap(), 1.0);

        let mut state = State::new().with_coordinate(new_time(dates(&[1, 2, 3])));
        for coordinate in parameter.coordinates().into_iter().skip(1) {
            state.set_coordinate(coordinate);
        }
        assert!(matches!(
            parameter.insert_into(&mut state),
            Err(SeapopymError::ShapeMismatch { .. })
        ));
    }
}
