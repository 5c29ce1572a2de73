pub mod fixed_income;
pub mod market_microstructure;
pub mod portfolio;
