use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    error::{NexusError, Result},
    training::CurveParams,
};

/// Everything that drives one synthetic training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Milliseconds between two ticks.
    pub tick_interval_ms: u64,
    /// The run stops by itself after this many ticks. `None` runs until stopped.
    pub max_steps: Option<u32>,
    pub curve: CurveParams,
    /// Fixes the noise sequence. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl SimulationConfig {
    /// The run owned by [`NetworkStore`](crate::NetworkStore): 100 ms ticks, stops at 100.
    pub fn store() -> Self {
        Self {
            tick_interval_ms: 100,
            max_steps: Some(100),
            curve: CurveParams::store(),
            seed: None,
        }
    }

    /// The run owned by [`TrainingSimulator`](crate::TrainingSimulator): 500 ms ticks, no limit.
    pub fn epoch() -> Self {
        Self {
            tick_interval_ms: 500,
            max_steps: None,
            curve: CurveParams::epoch(),
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    /// Returns `NexusError::InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(NexusError::InvalidConfig(
                "tick_interval_ms must be greater than 0".into(),
            ));
        }
        if self.max_steps == Some(0) {
            return Err(NexusError::InvalidConfig(
                "max_steps must be greater than 0 when set".into(),
            ));
        }
        self.curve.validate()
    }

    /// Applies the overrides in a JSON document on top of `self`.
    ///
    /// Every field is optional. `"max_steps": 0` removes the step limit.
    ///
    /// # Errors
    /// Returns an error if the document is not valid JSON for these fields, or if
    /// the resulting configuration fails [`SimulationConfig::validate`].
    pub fn merge_json(self, json: &str) -> Result<Self> {
        let overrides: ConfigOverrides = serde_json::from_str(json)?;
        let merged = overrides.apply(self);
        merged.validate()?;
        Ok(merged)
    }

    /// Loads overrides for `self` from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, see [`SimulationConfig::merge_json`]
    /// for the rest.
    pub fn merge_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        log::info!("loading simulation config from {}", path.display());
        self.merge_json(&content)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::store()
    }
}

/// On-disk shape of a configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigOverrides {
    tick_interval_ms: Option<u64>,
    max_steps: Option<u32>,
    curve: Option<CurveParams>,
    seed: Option<u64>,
}

impl ConfigOverrides {
    fn apply(self, mut base: SimulationConfig) -> SimulationConfig {
        if let Some(ms) = self.tick_interval_ms {
            base.tick_interval_ms = ms;
        }
        if let Some(steps) = self.max_steps {
            base.max_steps = (steps > 0).then_some(steps);
        }
        if let Some(curve) = self.curve {
            base.curve = curve;
        }
        if let Some(seed) = self.seed {
            base.seed = Some(seed);
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert!(SimulationConfig::store().validate().is_ok());
        assert!(SimulationConfig::epoch().validate().is_ok());
        assert_eq!(SimulationConfig::store().tick_interval(), Duration::from_millis(100));
        assert_eq!(SimulationConfig::epoch().tick_interval(), Duration::from_millis(500));
    }

    #[test]
    fn empty_document_keeps_base() {
        let config = SimulationConfig::epoch().merge_json("{}").unwrap();
        assert_eq!(config, SimulationConfig::epoch());
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let config = SimulationConfig::store()
            .merge_json(r#"{ "tick_interval_ms": 10, "seed": 3 }"#)
            .unwrap();

        assert_eq!(config.tick_interval_ms, 10);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.max_steps, Some(100));
        assert_eq!(config.curve, CurveParams::store());
    }

    #[test]
    fn zero_max_steps_removes_limit() {
        let config = SimulationConfig::store()
            .merge_json(r#"{ "max_steps": 0 }"#)
            .unwrap();
        assert_eq!(config.max_steps, None);
    }

    #[test]
    fn rejects_zero_interval_and_unknown_fields() {
        let err = SimulationConfig::store()
            .merge_json(r#"{ "tick_interval_ms": 0 }"#)
            .unwrap_err();
        assert!(matches!(err, NexusError::InvalidConfig(_)));

        let err = SimulationConfig::store()
            .merge_json(r#"{ "learning_rate": 0.1 }"#)
            .unwrap_err();
        assert!(matches!(err, NexusError::Json(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = SimulationConfig::store()
            .merge_file("/definitely/not/here.json")
            .unwrap_err();
        assert!(matches!(err, NexusError::Io(_)));
    }
}
