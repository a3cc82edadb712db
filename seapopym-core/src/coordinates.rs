//! Coordinates attached to the dimensions of the model state.

use crate::array::Attrs;
use crate::errors::{SeapopymError, SeapopymResult};
use crate::labels::Dim;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Values carried by a coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CoordinateValues {
    /// Numeric labels (latitude, longitude, layer depth index, cohort index, ...)
    Labels(Vec<f64>),
    /// Calendar dates, used by the time axis
    Dates(Vec<NaiveDate>),
}

impl CoordinateValues {
    pub fn len(&self) -> usize {
        match self {
            CoordinateValues::Labels(values) => values.len(),
            CoordinateValues::Dates(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A labelled axis of the state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    dim: Dim,
    values: CoordinateValues,
    attrs: Attrs,
}

impl Coordinate {
    pub fn new(dim: Dim, values: CoordinateValues, attrs: Attrs) -> Self {
        Self { dim, values, attrs }
    }

    pub fn dim(&self) -> Dim {
        self.dim
    }

    pub fn values(&self) -> &CoordinateValues {
        &self.values
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Numeric labels, if this is not a date axis.
    pub fn labels(&self) -> Option<&[f64]> {
        match &self.values {
            CoordinateValues::Labels(values) => Some(values),
            CoordinateValues::Dates(_) => None,
        }
    }

    /// Calendar dates, if this is a date axis.
    pub fn dates(&self) -> Option<&[NaiveDate]> {
        match &self.values {
            CoordinateValues::Dates(values) => Some(values),
            CoordinateValues::Labels(_) => None,
        }
    }

    /// Position of a numeric label along the axis (`sel` by label).
    pub fn position(&self, label: f64) -> SeapopymResult<usize> {
        self.labels()
            .and_then(|values| values.iter().position(|value| *value == label))
            .ok_or(SeapopymError::LabelNotFound {
                dimension: self.dim,
                label,
            })
    }

    /// A contiguous sub-range of this coordinate.
    pub fn slice(&self, range: Range<usize>) -> Self {
        let values = match &self.values {
            CoordinateValues::Labels(values) => CoordinateValues::Labels(values[range].to_vec()),
            CoordinateValues::Dates(values) => CoordinateValues::Dates(values[range].to_vec()),
        };
        Self {
            dim: self.dim,
            values,
            attrs: self.attrs.clone(),
        }
    }
}

fn attrs(pairs: &[(&str, &str)]) -> Attrs {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

pub fn new_latitude(values: Vec<f64>) -> Coordinate {
    Coordinate::new(
        Dim::Y,
        CoordinateValues::Labels(values),
        attrs(&[
            ("long_name", "latitude"),
            ("standard_name", "latitude"),
            ("units", "degrees_north"),
            ("axis", "Y"),
        ]),
    )
}

pub fn new_longitude(values: Vec<f64>) -> Coordinate {
    Coordinate::new(
        Dim::X,
        CoordinateValues::Labels(values),
        attrs(&[
            ("long_name", "longitude"),
            ("standard_name", "longitude"),
            ("units", "degrees_east"),
            ("axis", "X"),
        ]),
    )
}

/// Vertical layers. Defaults to the epipelagic, upper and lower mesopelagic layers (1, 2, 3).
pub fn new_layer(values: Option<Vec<f64>>) -> Coordinate {
    let values = values.unwrap_or_else(|| vec![1.0, 2.0, 3.0]);
    Coordinate::new(
        Dim::Z,
        CoordinateValues::Labels(values),
        attrs(&[
            ("long_name", "layer"),
            ("standard_name", "layer"),
            ("positive", "down"),
            ("axis", "Z"),
            (
                "flag_meanings",
                "epipelagic upper-mesopelagic lower-mesopelagic",
            ),
        ]),
    )
}

pub fn new_time(values: Vec<NaiveDate>) -> Coordinate {
    Coordinate::new(
        Dim::Time,
        CoordinateValues::Dates(values),
        attrs(&[("long_name", "time"), ("standard_name", "time"), ("axis", "T")]),
    )
}

pub fn new_cohort(size: usize) -> Coordinate {
    Coordinate::new(
        Dim::Cohort,
        CoordinateValues::Labels((0..size).map(|i| i as f64).collect()),
        attrs(&[("long_name", "cohort"), ("standard_name", "cohort")]),
    )
}

pub fn new_functional_group(names: &[String]) -> Coordinate {
    let mut attributes = attrs(&[
        ("long_name", "functional group"),
        ("standard_name", "functional_group"),
    ]);
    attributes.insert("flag_meanings".to_string(), names.join(" "));
    Coordinate::new(
        Dim::FunctionalGroup,
        CoordinateValues::Labels((0..names.len()).map(|i| i as f64).collect()),
        attributes,
    )
}
