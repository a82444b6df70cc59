use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use super::simulator::{History, TrainingState};

/// Epoch count the dashboard treats as a complete run.
pub const ASSUMED_MAX_EPOCHS: u32 = 100;

/// Seconds one epoch is assumed to take when estimating the remaining time.
const SECONDS_PER_EPOCH: f64 = 0.5;

/// Percentage of [`ASSUMED_MAX_EPOCHS`] reached after `epoch` epochs, capped at 100.
pub fn progress(epoch: u32) -> f64 {
    (f64::from(epoch) / f64::from(ASSUMED_MAX_EPOCHS) * 100.0).min(100.0)
}

/// Coarse classification of how a run is going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingStatus {
    Initializing,
    Starting,
    Learning,
    #[serde(rename = "Learning Well")]
    LearningWell,
    Converging,
}

impl TrainingStatus {
    /// Classifies the current loss and accuracy. Nothing is judged before epoch 1.
    pub fn classify(epoch: u32, loss: f64, accuracy: f64) -> Self {
        if epoch == 0 {
            Self::Initializing
        } else if loss < 0.1 && accuracy > 0.9 {
            Self::Converging
        } else if loss < 0.3 && accuracy > 0.7 {
            Self::LearningWell
        } else if loss < 0.5 {
            Self::Learning
        } else {
            Self::Starting
        }
    }
}

impl fmt::Display for TrainingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Initializing => "Initializing",
            Self::Starting => "Starting",
            Self::Learning => "Learning",
            Self::LearningWell => "Learning Well",
            Self::Converging => "Converging",
        };
        f.write_str(label)
    }
}

/// Derived, display-only view of a [`TrainingState`] and its [`History`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub status: TrainingStatus,
    /// Loss drop between the last two epochs. Positive while improving.
    pub learning_speed: f64,
    pub is_converging: bool,
    pub estimated_time_remaining: Duration,
}

impl Insights {
    pub fn evaluate(state: &TrainingState, history: &History) -> Self {
        let status = TrainingStatus::classify(state.epoch, state.loss, state.accuracy);

        let learning_speed = match history.loss.as_slice() {
            [.., prev, last] => prev - last,
            _ => 0.0,
        };

        let estimated_time_remaining = if state.is_running {
            let left = f64::from(ASSUMED_MAX_EPOCHS) - f64::from(state.epoch);
            Duration::from_secs_f64((left * SECONDS_PER_EPOCH).max(0.0))
        } else {
            Duration::ZERO
        };

        Self {
            status,
            learning_speed,
            is_converging: state.loss < 0.1 && state.accuracy > 0.9,
            estimated_time_remaining,
        }
    }

    /// Learning speed with four decimals, as the dashboard shows it.
    pub fn learning_speed_label(&self) -> String {
        format!("{:.4}", self.learning_speed)
    }

    /// Remaining time in seconds with one decimal, e.g. `"12.5s"`.
    pub fn time_remaining_label(&self) -> String {
        format!("{:.1}s", self.estimated_time_remaining.as_secs_f64())
    }
}
