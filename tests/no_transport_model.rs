//! End to end runs of the model built from a TOML description of the functional groups.

use approx::assert_relative_eq;
use chrono::NaiveDate;
use ndarray::{ArrayD, IxDyn};
use seapopym::core::array::DataArray;
use seapopym::core::labels::{forcing, Dim};
use seapopym::lmtl::configuration::{
    ForcingParameter, ForcingUnit, FunctionalGroupParameter, KernelParameter,
};
use seapopym::{NoTransportConfiguration, NoTransportModel, SeapopymError};

const GROUPS: &str = r#"
[[functional_group]]
name = "D1N1"
energy_transfert = 0.1668
functional_type = { lambda_temperature_0 = 0.00667, gamma_lambda_temperature = 0.15, tr_0 = 10.38, gamma_tr = -0.11 }
migratory_type = { day_layer = 1, night_layer = 1 }
acidity = { lambda_acidity_0 = 0.001, gamma_lambda_acidity = 0.1 }

[[functional_group]]
name = "D2N1"
energy_transfert = 0.1557
functional_type = { lambda_temperature_0 = 0.00667, gamma_lambda_temperature = 0.15, tr_0 = 10.38, gamma_tr = -0.11, cohorts_timesteps = [4, 4, 3] }
migratory_type = { day_layer = 2, night_layer = 1 }
acidity = { lambda_acidity_0 = 0.001, gamma_lambda_acidity = 0.1 }
"#;

fn forcing(days: usize) -> ForcingParameter {
    let time: Vec<NaiveDate> = NaiveDate::from_ymd_opt(2001, 6, 1)
        .unwrap()
        .iter_days()
        .take(days)
        .collect();
    let mut temperature = ArrayD::from_elem(IxDyn(&[days, 2, 2, 3]), 293.15);
    // land cell
    temperature
        .slice_each_axis_mut(|axis| match axis.axis.index() {
            1 | 2 => ndarray::Slice::from(1..2),
            _ => ndarray::Slice::from(..),
        })
        .fill(f64::NAN);
    ForcingParameter::new(
        time,
        vec![-10.0, 10.0],
        vec![150.0, 151.0],
        ForcingUnit::new(
            DataArray::float(vec![Dim::Time, Dim::Y, Dim::X, Dim::Z], temperature).unwrap(),
            "kelvin",
        ),
        ForcingUnit::new(
            DataArray::float(
                vec![Dim::Time, Dim::Y, Dim::X],
                ArrayD::from_elem(IxDyn(&[days, 2, 2]), 100.0),
            )
            .unwrap(),
            "mg/m^2/day",
        ),
    )
}

fn configuration(days: usize) -> NoTransportConfiguration {
    NoTransportConfiguration::new(
        FunctionalGroupParameter::from_toml(GROUPS).unwrap(),
        forcing(days),
    )
}

#[test]
fn biomass_over_ocean_only() {
    let mut model = NoTransportModel::from_configuration(&configuration(20)).unwrap();
    model.run().unwrap();
    let state = model.into_state();

    let mask = state.boolean(forcing::GLOBAL_MASK, "test").unwrap();
    assert!(!mask[[1, 1, 0]]);
    assert!(mask[[0, 0, 0]]);

    let biomass = state.float(forcing::BIOMASS, "test").unwrap();
    assert_eq!(biomass.shape(), &[2, 20, 2, 2]);
    assert!(biomass[[0, 19, 1, 1]].is_nan() || biomass[[0, 19, 1, 1]] == 0.0);
    assert!(biomass[[0, 19, 0, 0]] > biomass[[0, 0, 0, 0]]);
    // recruitment needs several days at 20 degC
    let recruited = state.float(forcing::RECRUITED, "test").unwrap();
    assert_relative_eq!(recruited[[0, 0, 0, 0]], 0.0);
}

#[test]
fn acidity_adds_mortality() {
    let days = 15;
    let acidity = DataArray::float(
        vec![Dim::Time, Dim::Y, Dim::X, Dim::Z],
        ArrayD::from_elem(IxDyn(&[days, 2, 2, 3]), 8.0),
    )
    .unwrap();
    let mut configuration = configuration(days);
    configuration.forcing = configuration
        .forcing
        .with_acidity(ForcingUnit::new(acidity, "dimensionless"));

    let mut temperature_only = NoTransportModel::from_configuration(&configuration).unwrap();
    temperature_only.run().unwrap();
    let mut with_acidity = NoTransportModel::with_acidity(&configuration).unwrap();
    with_acidity.run().unwrap();

    let expected = temperature_only.state().float(forcing::BIOMASS, "test").unwrap();
    let lower = with_acidity.state().float(forcing::BIOMASS, "test").unwrap();
    assert!(lower[[1, days - 1, 0, 1]] < expected[[1, days - 1, 0, 1]]);
}

#[test]
fn memory_estimate_covers_the_outputs() {
    let model = NoTransportModel::from_configuration(
        &configuration(10).with_kernel(KernelParameter {
            compute_preproduction: true,
            ..KernelParameter::default()
        }),
    )
    .unwrap();
    let template = model.template().unwrap();
    let preproduction = template.get(forcing::PREPRODUCTION).unwrap();
    assert_eq!(preproduction.shape, vec![2, 10, 2, 2, 11]);
    assert!(model.expected_memory_usage().unwrap() > model.state().nbytes());
}

#[test]
fn inconsistent_cohorts_are_rejected() {
    let groups = GROUPS.replace("[4, 4, 3]", "[4, 4]");
    let result = FunctionalGroupParameter::from_toml(&groups).and_then(|groups| {
        NoTransportConfiguration::new(groups, forcing(3)).to_state()
    });
    assert!(matches!(result, Err(SeapopymError::Configuration(_))));
}

#[test]
fn daily_cohorts_need_a_daily_forcing() {
    let mut configuration = configuration(3);
    configuration.forcing.time = NaiveDate::from_ymd_opt(2001, 6, 1)
        .unwrap()
        .iter_days()
        .step_by(7)
        .take(3)
        .collect();
    assert!(matches!(
        configuration.to_state(),
        Err(SeapopymError::Configuration(_))
    ));
}
