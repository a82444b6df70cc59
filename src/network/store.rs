use std::{
    ops::ControlFlow,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use serde::{Deserialize, Serialize};

use super::{
    layer::{default_architecture, default_layer_draft},
    ArchitectureSummary, LayerConfig, LayerDraft, LayerId, LayerPatch,
};
use crate::{
    config::SimulationConfig,
    training::{MetricCurve, Ticker},
};

/// Snapshot of everything a [`NetworkStore`] owns.
///
/// `loss` and `accuracy` always have the same length. `activations` is reserved and
/// stays empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkState {
    pub layers: Vec<LayerConfig>,
    pub is_training: bool,
    /// Steps completed in the current run. With the default 100-step limit this is
    /// also the completion percentage.
    pub training_progress: u32,
    pub loss: Vec<f64>,
    pub accuracy: Vec<f64>,
    pub activations: Vec<Vec<f64>>,
}

impl Default for NetworkState {
    fn default() -> Self {
        Self {
            layers: default_architecture(),
            is_training: false,
            training_progress: 0,
            loss: Vec::new(),
            accuracy: Vec::new(),
            activations: Vec::new(),
        }
    }
}

/// Upper bound of [`NetworkState::training_progress`] when set by hand.
pub const MAX_PROGRESS: u32 = 100;

#[derive(Debug)]
struct Inner {
    state: NetworkState,
    /// Next id handed out by `add_layer`. Never rewinds, not even on reset.
    next_id: u64,
    /// Generation of the current training run. Ticks from older runs are ignored.
    run: u64,
}

impl Inner {
    fn new() -> Self {
        let state = NetworkState::default();
        let next_id = state.layers.iter().map(|l| l.id.get()).max().unwrap_or(0) + 1;

        Self {
            state,
            next_id,
            run: 0,
        }
    }

    fn find_mut(&mut self, id: LayerId) -> Option<&mut LayerConfig> {
        self.state.layers.iter_mut().find(|l| l.id == id)
    }

    /// Performs one step of training run `run`.
    fn advance(
        &mut self,
        run: u64,
        curve: &mut MetricCurve,
        limit: Option<u32>,
    ) -> ControlFlow<()> {
        if self.run != run || !self.state.is_training {
            return ControlFlow::Break(());
        }

        let state = &mut self.state;
        let step = match state.training_progress.checked_add(1) {
            Some(step) if limit.map_or(true, |limit| step <= limit) => step,
            _ => {
                state.is_training = false;
                log::info!("training finished after {} steps", state.training_progress);
                return ControlFlow::Break(());
            }
        };

        state.training_progress = step;
        let sample = curve.sample(step);
        state.loss.push(sample.loss);
        state.accuracy.push(sample.accuracy);

        log::debug!(
            "step {}: loss={:.4} accuracy={:.4}",
            state.training_progress,
            sample.loss,
            sample.accuracy
        );

        match limit {
            Some(limit) if state.training_progress >= limit => {
                state.is_training = false;
                log::info!("training finished after {} steps", state.training_progress);
                ControlFlow::Break(())
            }
            _ => ControlFlow::Continue(()),
        }
    }
}

/// Owner of the layer architecture and of the store-integrated training run.
///
/// Every method takes `&self`, so one store can be shared (e.g. behind an `Arc`) by
/// everything that displays or edits it. Dropping the store cancels its run.
#[derive(Debug)]
pub struct NetworkStore {
    config: SimulationConfig,
    inner: Arc<Mutex<Inner>>,
    ticker: Mutex<Option<Ticker>>,
}

impl NetworkStore {
    /// Creates a store holding the default architecture and the default run settings.
    pub fn new() -> Self {
        Self::with_config(SimulationConfig::store())
    }

    /// Creates a store whose training runs follow `config`.
    pub fn with_config(config: SimulationConfig) -> Self {
        Self {
            config,
            inner: Arc::new(Mutex::new(Inner::new())),
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

    // -------------------------------------------------------------------------
    // Architecture
    // -------------------------------------------------------------------------

    /// Appends a layer built from `draft` and returns the id it was given.
    pub fn add_layer(&self, draft: LayerDraft) -> LayerId {
        let mut inner = self.lock();
        let id = LayerId::new(inner.next_id);
        inner.next_id += 1;

        log::debug!("adding layer {id} ({:?}, {} units)", draft.kind, draft.units);
        inner.state.layers.push(LayerConfig::from_draft(id, draft));
        id
    }

    /// Appends the builder's default layer: dense, 8 units, relu, named after its position.
    pub fn add_default_layer(&self) -> LayerId {
        let len = self.lock().state.layers.len();
        self.add_layer(default_layer_draft(len))
    }

    /// Removes the layer with the given id. Unknown ids are ignored.
    pub fn remove_layer(&self, id: LayerId) {
        let mut inner = self.lock();
        let before = inner.state.layers.len();
        inner.state.layers.retain(|l| l.id != id);

        if inner.state.layers.len() == before {
            log::debug!("remove_layer: no layer with id {id}");
        }
    }

    /// Merges `patch` into the layer with the given id. Unknown ids are ignored.
    pub fn update_layer(&self, id: LayerId, patch: LayerPatch) {
        match self.lock().find_mut(id) {
            Some(layer) => layer.apply(patch),
            None => log::debug!("update_layer: no layer with id {id}"),
        }
    }

    /// Restores the default three-layer architecture and clears all training state.
    pub fn reset_network(&self) {
        let mut ticker = self.lock_ticker();
        if let Some(t) = ticker.take() {
            t.cancel();
        }

        let mut inner = self.lock();
        inner.run += 1;
        inner.state = NetworkState::default();
        log::info!("network reset to the default architecture");
    }

    // -------------------------------------------------------------------------
    // Training
    // -------------------------------------------------------------------------

    /// Starts a new training run, clearing progress and metrics first.
    ///
    /// Does nothing while a run is active, so at most one ticker ever drives the store.
    ///
    /// # Panics
    /// If called outside of a Tokio runtime.
    pub fn start_training(&self) {
        let mut ticker = self.lock_ticker();

        let run = {
            let mut inner = self.lock();
            if inner.state.is_training {
                log::debug!("start_training: already training");
                return;
            }

            inner.run += 1;
            let state = &mut inner.state;
            state.is_training = true;
            state.training_progress = 0;
            state.loss.clear();
            state.accuracy.clear();
            inner.run
        };

        log::info!(
            "training started (every {:?}, limit {:?})",
            self.config.tick_interval(),
            self.config.max_steps
        );

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

    /// Stops the current run, keeping its metrics. Idempotent.
    pub fn stop_training(&self) {
        let mut ticker = self.lock_ticker();
        if let Some(t) = ticker.take() {
            t.cancel();
        }

        let mut inner = self.lock();
        if inner.state.is_training {
            inner.state.is_training = false;
            log::info!("training stopped at step {}", inner.state.training_progress);
        }
    }

    /// Overwrites the progress counter, clamped into `0..=100`.
    ///
    /// A running run whose counter already sits at its step limit ends on the next tick
    /// without recording another step.
    pub fn update_training_progress(&self, progress: u32) {
        self.lock().state.training_progress = progress.min(MAX_PROGRESS);
    }

    /// Appends one loss/accuracy pair to the metric history.
    pub fn add_metrics(&self, loss: f64, accuracy: f64) {
        let mut inner = self.lock();
        inner.state.loss.push(loss);
        inner.state.accuracy.push(accuracy);
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Returns a copy of the whole state.
    pub fn snapshot(&self) -> NetworkState {
        self.lock().state.clone()
    }

    pub fn layers(&self) -> Vec<LayerConfig> {
        self.lock().state.layers.clone()
    }

    pub fn layer(&self, id: LayerId) -> Option<LayerConfig> {
        self.lock().state.layers.iter().find(|l| l.id == id).cloned()
    }

    pub fn is_training(&self) -> bool {
        self.lock().state.is_training
    }

    pub fn training_progress(&self) -> u32 {
        self.lock().state.training_progress
    }

    pub fn loss(&self) -> Vec<f64> {
        self.lock().state.loss.clone()
    }

    pub fn accuracy(&self) -> Vec<f64> {
        self.lock().state.accuracy.clone()
    }

    /// Latest loss, or 0 before the first step.
    pub fn current_loss(&self) -> f64 {
        self.lock().state.loss.last().copied().unwrap_or(0.0)
    }

    /// Latest accuracy, or 0 before the first step.
    pub fn current_accuracy(&self) -> f64 {
        self.lock().state.accuracy.last().copied().unwrap_or(0.0)
    }

    pub fn summary(&self) -> ArchitectureSummary {
        ArchitectureSummary::of(&self.lock().state.layers)
    }
}

impl Default for NetworkStore {
    fn default() -> Self {
        Self::new()
    }
}
