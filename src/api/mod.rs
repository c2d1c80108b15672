pub mod dashboard;
pub mod predict;
pub mod queries;
