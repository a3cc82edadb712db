//! Building blocks for cohort-structured ecosystem models.
//!
//! The model state is a [`state::State`]: labelled coordinates plus named
//! [`array::DataArray`]s. Computations are organised as [`kernel::Kernel`]s, ordered lists of
//! [`kernel::KernelUnit`]s, each a transform plus the [`template::Template`] of its outputs.

pub mod array;
pub mod chunk;
pub mod coordinates;
pub mod errors;
pub mod kernel;
pub mod labels;
pub mod state;
pub mod template;
pub mod units;

pub use errors::{SeapopymError, SeapopymResult};
