use std::{
    ops::ControlFlow,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use serde::{Deserialize, Serialize};

use super::{insights, Insights, MetricCurve, Ticker};
use crate::config::SimulationConfig;

pub const DEFAULT_LEARNING_RATE: f64 = 0.01;
pub const DEFAULT_BATCH_SIZE: u32 = 32;

/// Current values of an epoch-oriented run.
///
/// `learning_rate` and `batch_size` are user-facing knobs only; the synthetic curve
/// never reads them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingState {
    pub epoch: u32,
    pub loss: f64,
    pub accuracy: f64,
    pub learning_rate: f64,
    pub batch_size: u32,
    pub is_running: bool,
}

impl Default for TrainingState {
    fn default() -> Self {
        Self {
            epoch: 0,
            loss: 0.0,
            accuracy: 0.0,
            learning_rate: DEFAULT_LEARNING_RATE,
            batch_size: DEFAULT_BATCH_SIZE,
            is_running: false,
        }
    }
}

/// Per-epoch loss and accuracy, index-aligned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub loss: Vec<f64>,
    pub accuracy: Vec<f64>,
}

impl History {
    pub fn len(&self) -> usize {
        self.loss.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loss.is_empty()
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: TrainingState,
    history: History,
    run: u64,
}

impl Inner {
    fn advance(
        &mut self,
        run: u64,
        curve: &mut MetricCurve,
        limit: Option<u32>,
    ) -> ControlFlow<()> {
        if self.run != run || !self.state.is_running {
            return ControlFlow::Break(());
        }

        let epoch = self.state.epoch + 1;
        let sample = curve.sample(epoch);

        self.state.epoch = epoch;
        self.state.loss = sample.loss;
        self.state.accuracy = sample.accuracy;
        self.history.loss.push(sample.loss);
        self.history.accuracy.push(sample.accuracy);

        log::debug!(
            "epoch {epoch}: loss={:.4} accuracy={:.4}",
            sample.loss,
            sample.accuracy
        );

        match limit {
            Some(limit) if epoch >= limit => {
                self.state.is_running = false;
                log::info!("simulation reached its epoch limit ({limit})");
                ControlFlow::Break(())
            }
            _ => ControlFlow::Continue(()),
        }
    }
}

/// Epoch-oriented synthetic training run.
///
/// Unlike the run owned by [`NetworkStore`](crate::NetworkStore), starting again after
/// a stop resumes from the current epoch; only [`TrainingSimulator::reset_training`]
/// goes back to zero.
#[derive(Debug)]
pub struct TrainingSimulator {
    config: SimulationConfig,
    inner: Arc<Mutex<Inner>>,
    ticker: Mutex<Option<Ticker>>,
}

impl TrainingSimulator {
    pub fn new() -> Self {
        Self::with_config(SimulationConfig::epoch())
    }

    pub fn with_config(config: SimulationConfig) -> Self {
        Self {
            config,
            inner: Arc::new(Mutex::new(Inner::default())),
            ticker: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_ticker(&self) -> MutexGuard<'_, Option<Ticker>> {
        self.ticker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts ticking. Does nothing if the simulator is already running.
    ///
    /// # Panics
    /// If called outside of a Tokio runtime.
    pub fn start_training(&self) {
        let mut ticker = self.lock_ticker();

        let run = {
            let mut inner = self.lock();
            if inner.state.is_running {
                log::debug!("start_training: simulator already running");
                return;
            }
            inner.run += 1;
            inner.state.is_running = true;
            log::info!("simulation started at epoch {}", inner.state.epoch);
            inner.run
        };

        let shared = Arc::clone(&self.inner);
        let mut curve = MetricCurve::new(self.config.curve, self.config.seed);
        let limit = self.config.max_steps;

        *ticker = Some(Ticker::spawn(self.config.tick_interval(), move || {
            shared
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .advance(run, &mut curve, limit)
        }));
    }

    /// Stops ticking and keeps the reached epoch and history. Idempotent.
    pub fn stop_training(&self) {
        let mut ticker = self.lock_ticker();
        if let Some(t) = ticker.take() {
            t.cancel();
        }

        let mut inner = self.lock();
        if inner.state.is_running {
            inner.state.is_running = false;
            log::info!("simulation stopped at epoch {}", inner.state.epoch);
        }
    }

    /// Stops, then restores the initial state and default hyperparameters.
    pub fn reset_training(&self) {
        self.stop_training();

        let mut inner = self.lock();
        inner.run += 1;
        inner.state = TrainingState::default();
        inner.history = History::default();
        log::info!("simulation reset");
    }

    pub fn update_learning_rate(&self, learning_rate: f64) {
        self.lock().state.learning_rate = learning_rate;
    }

    pub fn update_batch_size(&self, batch_size: u32) {
        self.lock().state.batch_size = batch_size;
    }

    pub fn state(&self) -> TrainingState {
        self.lock().state
    }

    pub fn history(&self) -> History {
        self.lock().history.clone()
    }

    pub fn is_training(&self) -> bool {
        self.lock().state.is_running
    }

    pub fn current_epoch(&self) -> u32 {
        self.lock().state.epoch
    }

    /// Percentage of an assumed 100-epoch run completed, capped at 100.
    pub fn progress(&self) -> f64 {
        insights::progress(self.current_epoch())
    }

    pub fn insights(&self) -> Insights {
        let inner = self.lock();
        Insights::evaluate(&inner.state, &inner.history)
    }
}

impl Default for TrainingSimulator {
    fn default() -> Self {
        Self::new()
    }
}
