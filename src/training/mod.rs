//! Synthetic training: the metric curve, the repeating ticker that drives it and the
//! epoch-oriented simulator built on both.

pub mod curve;
pub mod insights;
pub mod simulator;
pub mod ticker;

pub use curve::{CurveParams, MetricCurve, NoiseRange, Sample, ACCURACY_CEILING, LOSS_FLOOR};
pub use insights::{Insights, TrainingStatus};
pub use simulator::{History, TrainingSimulator, TrainingState};
pub use ticker::Ticker;
