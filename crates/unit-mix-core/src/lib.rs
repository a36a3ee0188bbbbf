pub mod error;
pub mod types;

#[cfg(feature = "unit_mix")]
pub mod unit_mix;

#[cfg(feature = "scenarios")]
pub mod scenarios;

pub use error::UnitMixError;
pub use types::*;

/// Standard result type for all unit-mix operations
pub type UnitMixResult<T> = Result<T, UnitMixError>;
