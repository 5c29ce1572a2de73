pub mod error;
pub mod types;

#[cfg(feature = "fixed_income")]
pub mod fixed_income;

#[cfg(feature = "portfolio")]
pub mod portfolio;

#[cfg(feature = "market_microstructure")]
pub mod market_microstructure;

pub use error::QuantFinanceError;
pub use types::*;

/// Standard result type for all quant-finance operations
pub type QuantFinanceResult<T> = Result<T, QuantFinanceError>;
