//! Core of a toy neural-network workbench.
//!
//! [`NetworkStore`] owns an editable layer architecture together with a short synthetic
//! training run, and [`TrainingSimulator`] runs an open-ended, epoch-oriented one. Neither
//! trains anything: loss and accuracy follow an exponential curve plus noise, advanced
//! by a [`Ticker`](training::Ticker) on the Tokio runtime.

pub mod config;
pub mod error;
pub mod export;
pub mod network;
pub mod training;

pub use config::SimulationConfig;
pub use error::{NexusError, Result};
pub use export::MetricRecord;
pub use network::{
    Activation, ArchitectureSummary, LayerConfig, LayerDraft, LayerId, LayerKind, LayerPatch,
    NetworkState, NetworkStore,
};
pub use training::{History, Insights, TrainingSimulator, TrainingState, TrainingStatus};
