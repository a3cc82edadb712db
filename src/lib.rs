//! Low and mid trophic level ecosystem model without transport.
//!
//! Re-exports the state and kernel machinery of [`core`] and the LMTL model of [`lmtl`].
//!
//! ```no_run
//! use seapopym::lmtl::{NoTransportConfiguration, NoTransportModel};
//!
//! fn run(configuration: &NoTransportConfiguration) -> seapopym::SeapopymResult<()> {
//!     let mut model = NoTransportModel::from_configuration(configuration)?;
//!     model.run()?;
//!     let (_production, _biomass) = model.export_initial_conditions()?;
//!     Ok(())
//! }
//! ```

pub use seapopym_core as core;
pub use seapopym_lmtl as lmtl;

pub use seapopym_core::errors::{SeapopymError, SeapopymResult};
pub use seapopym_core::kernel::{Kernel, KernelUnit};
pub use seapopym_core::state::State;
pub use seapopym_lmtl::{NoTransportConfiguration, NoTransportModel};
