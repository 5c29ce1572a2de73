pub mod bonds;
pub mod duration;
pub mod scenarios;
pub mod yields;
