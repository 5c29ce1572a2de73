pub mod drawdown;
pub mod returns;
