pub mod layer;
mod store;
mod summary;

pub use layer::{
    default_layer_draft, Activation, LayerConfig, LayerDraft, LayerId, LayerKind, LayerPatch,
};
pub use store::{NetworkState, NetworkStore, MAX_PROGRESS};
pub use summary::{ArchitectureSummary, Complexity};
