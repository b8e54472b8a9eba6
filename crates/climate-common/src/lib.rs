//! Common types shared across the climate overlay crates.

pub mod bounds;
pub mod crs;
pub mod error;
pub mod extent;
pub mod period;

pub use bounds::GeoBounds;
pub use crs::CrsCode;
pub use error::{ClimateError, ClimateResult};
pub use extent::GridExtent;
pub use period::{Period, Variable};
