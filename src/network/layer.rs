use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a layer inside a [`NetworkStore`](super::NetworkStore).
///
/// Ids are handed out by a per-store monotonic counter and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(u64);

impl LayerId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric value of this id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of layer kinds the builder offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Dense,
    Conv2d,
    Lstm,
    Dropout,
}

/// Activation functions a layer may be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Sigmoid,
    Tanh,
    Softmax,
}

/// One layer of the architecture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub id: LayerId,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    pub units: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation: Option<Activation>,
    pub name: String,
}

impl LayerConfig {
    /// Builds a layer from a draft and the id the store assigned to it.
    pub(crate) fn from_draft(id: LayerId, draft: LayerDraft) -> Self {
        Self {
            id,
            kind: draft.kind,
            units: draft.units,
            activation: draft.activation,
            name: draft.name,
        }
    }

    /// Merges every field present in `patch` into this layer. The id never changes.
    pub(crate) fn apply(&mut self, patch: LayerPatch) {
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(units) = patch.units {
            self.units = units;
        }
        if let Some(activation) = patch.activation {
            self.activation = activation;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
    }
}

/// A layer that has not been added to a store yet, so it carries no id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDraft {
    #[serde(rename = "type")]
    pub kind: LayerKind,
    pub units: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation: Option<Activation>,
    pub name: String,
}

impl LayerDraft {
    pub fn new(
        kind: LayerKind,
        units: u32,
        activation: Option<Activation>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            units,
            activation,
            name: name.into(),
        }
    }

    /// Shorthand for a dense layer, the kind the builder uses by default.
    pub fn dense(units: u32, activation: Activation, name: impl Into<String>) -> Self {
        Self::new(LayerKind::Dense, units, Some(activation), name)
    }
}

/// A partial update of a layer. `None` fields are left untouched.
///
/// `activation` is doubly optional so a patch can clear it: `Some(None)` removes the
/// activation, `None` keeps whatever the layer has.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerPatch {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<LayerKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation: Option<Option<Activation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl LayerPatch {
    pub fn kind(mut self, kind: LayerKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn units(mut self, units: u32) -> Self {
        self.units = Some(units);
        self
    }

    pub fn activation(mut self, activation: Option<Activation>) -> Self {
        self.activation = Some(activation);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// The three-layer architecture a fresh or reset store starts from.
pub(crate) fn default_architecture() -> Vec<LayerConfig> {
    vec![
        LayerConfig::from_draft(
            LayerId::new(1),
            LayerDraft::dense(4, Activation::Relu, "Input Layer"),
        ),
        LayerConfig::from_draft(
            LayerId::new(2),
            LayerDraft::dense(8, Activation::Relu, "Hidden Layer 1"),
        ),
        LayerConfig::from_draft(
            LayerId::new(3),
            LayerDraft::dense(1, Activation::Sigmoid, "Output Layer"),
        ),
    ]
}

/// The draft the architecture builder appends when asked for "another layer".
///
/// # Args
/// * `len` - Number of layers currently in the architecture.
pub fn default_layer_draft(len: usize) -> LayerDraft {
    LayerDraft::dense(8, Activation::Relu, format!("Layer {}", len + 1))
}
