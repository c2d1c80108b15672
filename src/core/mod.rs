pub mod catalog;
pub mod insights;
pub mod metrics;
pub mod predictor;
