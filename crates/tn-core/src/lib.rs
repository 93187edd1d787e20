//! tn-core: shared foundation for turbonet.
//!
//! Contains:
//! - ids (typed compact handles for nodes, ports and weak ports)
//! - error (shared error type)
//! - numeric (Real, tolerances, blending and residual helpers)
//! - units (uom SI types carried by port states)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

pub use error::{TnError, TnResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
