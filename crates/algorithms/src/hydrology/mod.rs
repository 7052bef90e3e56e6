//! Hydrological conditioning and D8 routing of DEMs
//!
//! The LS factor needs an upslope contributing area per cell; it is derived
//! here as fill → D8 direction → accumulation.

pub(crate) mod d8;
mod fill_sinks;
mod flow_accumulation;
mod flow_direction;

pub use d8::{NO_FLOW, PIT};
pub use fill_sinks::{fill_sinks, FillSinks, FillSinksParams};
pub use flow_accumulation::{flow_accumulation, FlowAccumulation};
pub use flow_direction::{flow_direction, FlowDirection};
