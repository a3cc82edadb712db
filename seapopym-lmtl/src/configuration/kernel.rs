use seapopym_core::array::DataArray;
use seapopym_core::labels::configuration;
use serde::{Deserialize, Serialize};

/// Switches read by the kernel functions from the state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelParameter {
    /// Angle between the sun and the horizon defining the day, in degrees.
    pub angle_horizon_sun: f64,
    /// Export the pending pre-production at the end of the run.
    pub compute_initial_conditions: bool,
    /// Export the pre-production at every timestep. Takes precedence over
    /// `compute_initial_conditions`.
    pub compute_preproduction: bool,
}

impl Default for KernelParameter {
    fn default() -> Self {
        Self {
            angle_horizon_sun: 0.0,
            compute_initial_conditions: true,
            compute_preproduction: false,
        }
    }
}

impl KernelParameter {
    /// Scalar state variables.
    pub fn variables(&self) -> Vec<(&'static str, DataArray)> {
        vec![
            (
                configuration::ANGLE_HORIZON_SUN,
                DataArray::scalar(self.angle_horizon_sun),
            ),
            (
                configuration::COMPUTE_INITIAL_CONDITIONS,
                DataArray::flag(self.compute_initial_conditions),
            ),
            (
                configuration::COMPUTE_PREPRODUCTION,
                DataArray::flag(self.compute_preproduction),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let parameter: KernelParameter = toml::from_str("compute_preproduction = true").unwrap();
        assert_eq!(parameter.angle_horizon_sun, 0.0);
        assert!(parameter.compute_initial_conditions);
        assert!(parameter.compute_preproduction);
        assert_eq!(parameter.variables().len(), 3);
    }
}
