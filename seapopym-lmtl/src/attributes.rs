//! Metadata attached to the variables produced by the pipeline.

use seapopym_core::array::Attrs;
use seapopym_core::units::StandardUnit;

fn attrs(pairs: &[(&str, &str)]) -> Attrs {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

pub fn global_mask() -> Attrs {
    attrs(&[
        ("standard_name", "mask"),
        ("long_name", "mask"),
        ("flag_values", "[0, 1]"),
        ("flag_meanings", "0:land, 1:ocean"),
    ])
}

pub fn mask_by_fgroup() -> Attrs {
    global_mask()
}

pub fn day_length() -> Attrs {
    attrs(&[
        ("standard_name", "day_length"),
        ("long_name", "Day length"),
        ("description", "Day length at the surface using Forsythe's method."),
        ("units", StandardUnit::Time.symbol()),
    ])
}

pub fn average_temperature() -> Attrs {
    attrs(&[
        ("standard_name", "sea water temperature"),
        ("long_name", "average sea temperature by functional group"),
        (
            "description",
            "Average temperature by functional group according to their layer position during day and night.",
        ),
        ("units", StandardUnit::Temperature.symbol()),
    ])
}

pub fn average_acidity() -> Attrs {
    attrs(&[
        ("standard_name", "sea water acidity (pH)"),
        ("long_name", "average acidity (pH) by functional group"),
        (
            "description",
            "Average acidity (pH) by functional group according to their layer position during day and night.",
        ),
        ("units", StandardUnit::Dimensionless.symbol()),
    ])
}

pub fn primary_production_by_fgroup() -> Attrs {
    attrs(&[
        ("standard_name", "primary production"),
        ("long_name", "primary production by functional group"),
        (
            "description",
            "Primary production by functional group according to their energy transfert coefficient.",
        ),
        ("units", StandardUnit::Production.symbol()),
    ])
}

pub fn min_temperature() -> Attrs {
    attrs(&[
        ("standard_name", "minimum temperature"),
        ("long_name", "minimum temperature by cohort"),
        (
            "description",
            "Minimum temperature to recruit a cohort according to its age.",
        ),
        ("units", StandardUnit::Temperature.symbol()),
    ])
}

pub fn mask_temperature() -> Attrs {
    attrs(&[
        ("standard_name", "mask"),
        ("long_name", "cohort recruitment mask by functional group"),
        (
            "description",
            "Mask to recruit a cohort according to the temperature.",
        ),
        ("flag_values", "[0, 1]"),
        ("flag_meanings", "0:not recruited, 1:recruited"),
    ])
}

pub fn mortality_field() -> Attrs {
    attrs(&[
        ("standard_name", "mortality"),
        ("long_name", "mortality coefficient"),
        (
            "description",
            "Mortality coefficient according to the temperature.",
        ),
    ])
}

pub fn mortality_acidity_field() -> Attrs {
    attrs(&[
        ("standard_name", "mortality"),
        ("long_name", "mortality coefficient (T, pH)"),
        (
            "description",
            "Mortality coefficient according to the temperature and acidity (pH).",
        ),
    ])
}

pub fn recruited() -> Attrs {
    attrs(&[
        ("standard_name", "production"),
        ("long_name", "production"),
        ("units", StandardUnit::Production.symbol()),
    ])
}

pub fn preproduction() -> Attrs {
    attrs(&[
        ("standard_name", "preproduction"),
        ("long_name", "pre-production"),
        (
            "description",
            "The entire population before recruitment, divided into cohorts.",
        ),
        ("units", StandardUnit::Production.symbol()),
    ])
}

pub fn biomass() -> Attrs {
    attrs(&[
        ("long_name", "biomass"),
        ("description", "The biomass of the recruited individuals."),
        ("units", StandardUnit::Biomass.symbol()),
    ])
}
