//! The low and mid trophic level (LMTL) model without transport.
//!
//! Primary production is transferred to functional groups of zooplankton and micronekton. Within
//! each group the production ages through cohorts until the temperature allows it to be recruited
//! into the biomass, which then decays with a temperature dependent mortality.
//!
//! [`configuration::NoTransportConfiguration`] builds the model state, the kernels of
//! [`model`] run the [`functions`] over it.

pub mod attributes;
pub mod configuration;
pub mod functions;
pub mod model;

pub use configuration::NoTransportConfiguration;
pub use functions::ageing::{ageing, expand_cohort};
pub use functions::biomass::biomass_sequence;
pub use functions::production::{production_sequence, Preproduction, PreproductionExport, ProductionOutput};
pub use model::{acidity_kernel, no_transport_kernel, no_transport_light_kernel, NoTransportModel};
