//! Day length from latitude and day of the year.
//!
//! Uses the CBM model of Forsythe et al., Ecological Modelling 80 (1995) 87-95.

use super::{float_array, patch, shape};
use crate::attributes;
use chrono::Datelike;
use ndarray::{ArrayD, IxDyn};
use seapopym_core::errors::{SeapopymError, SeapopymResult};
use seapopym_core::kernel::KernelUnit;
use seapopym_core::labels::{configuration, forcing, Dim};
use seapopym_core::state::State;
use seapopym_core::template::TemplateUnit;
use std::f64::consts::PI;

const NAME: &str = "day_length";
const DIMS: [Dim; 3] = [Dim::Time, Dim::Y, Dim::X];
const HOURS_PER_DAY: f64 = 24.0;

/// Day length in hours.
///
/// `angle_horizon_sun` is the angle between the sun and the horizon, in degrees: 0 for sunrise to
/// sunset, 6 for civil, 12 for nautical and 18 for astronomical twilight.
pub fn forsythe(latitude: f64, day_of_year: u32, angle_horizon_sun: f64) -> f64 {
    let day = f64::from(day_of_year);
    // revolution angle of the earth
    let theta = 0.2163108 + 2.0 * (0.9671396 * (0.00860 * (day - 186.0)).tan()).atan();
    // declination of the sun
    let phi = (0.39795 * theta.cos()).asin();
    let latitude = latitude * PI / 180.0;
    let arg = ((angle_horizon_sun * PI / 180.0).sin() + latitude.sin() * phi.sin())
        / (latitude.cos() * phi.cos());
    HOURS_PER_DAY - (HOURS_PER_DAY / PI) * arg.clamp(-1.0, 1.0).acos()
}

/// Day length over (time, Y, X), in days.
pub fn day_length(state: &State) -> SeapopymResult<State> {
    let angle = state
        .get(configuration::ANGLE_HORIZON_SUN)
        .and_then(|value| value.first_value())
        .unwrap_or(0.0);
    let dates = state
        .coordinate(Dim::Time)
        .and_then(|time| time.dates())
        .ok_or_else(|| SeapopymError::MissingDimension {
            dimension: Dim::Time,
            template: NAME.to_string(),
        })?;
    let latitudes = state
        .coordinate(Dim::Y)
        .and_then(|latitude| latitude.labels())
        .ok_or_else(|| SeapopymError::MissingDimension {
            dimension: Dim::Y,
            template: NAME.to_string(),
        })?;

    let values = ArrayD::from_shape_fn(IxDyn(&shape(state, &DIMS, NAME)?), |index| {
        forsythe(latitudes[index[1]], dates[index[0]].ordinal(), angle) / HOURS_PER_DAY
    });
    patch(
        state,
        vec![(forcing::DAY_LENGTH, float_array(forcing::DAY_LENGTH, &DIMS, values)?)],
    )
}

pub fn template() -> TemplateUnit {
    TemplateUnit::from_state_dims(forcing::DAY_LENGTH, &DIMS).with_attrs(attributes::day_length())
}

pub fn kernel_unit() -> KernelUnit {
    KernelUnit::new(NAME, day_length, template())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::testing::grid;
    use approx::assert_relative_eq;
    use seapopym_core::coordinates::new_latitude;

    #[test]
    fn equator_is_about_twelve_hours() {
        for day in [1, 80, 172, 355] {
            let hours = forsythe(0.0, day, 0.0);
            assert_relative_eq!(hours, 12.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn polar_day_and_night() {
        assert_relative_eq!(forsythe(80.0, 172, 0.0), 24.0, epsilon = 1e-9);
        assert_relative_eq!(forsythe(80.0, 355, 0.0), 0.0, epsilon = 1e-9);
        assert!(forsythe(45.0, 172, 0.0) > forsythe(45.0, 355, 0.0));
    }

    #[test]
    fn twilight_lengthens_the_day() {
        assert!(forsythe(45.0, 100, 6.0) > forsythe(45.0, 100, 0.0));
    }

    #[test]
    fn day_length_in_days() {
        let state = grid(1, 3, 1).with_coordinate(new_latitude(vec![0.0, 60.0]));
        let result = day_length(&state).unwrap();
        let values = result.float(forcing::DAY_LENGTH, "test").unwrap();
        assert_eq!(values.shape(), &[3, 2, 1]);
        assert_relative_eq!(values[[0, 0, 0]], 0.5, epsilon = 1e-9);
        // high latitude winter days are short
        assert!(values[[0, 1, 0]] < 0.3);
    }
}
