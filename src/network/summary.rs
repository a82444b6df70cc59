use serde::{Deserialize, Serialize};

use super::LayerConfig;

/// Above this many neurons a view should switch to a reduced level of detail.
const DETAIL_LIMIT: u64 = 1000;

/// Coarse size class of an architecture, used to pick how much a view renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Complexity {
    /// Fewer than 500 neurons.
    Excellent,
    /// Fewer than 2000 neurons.
    Good,
    /// Anything larger.
    ConsiderOptimization,
}

/// Size figures for a layer list, assuming consecutive layers are fully connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureSummary {
    pub layers: usize,
    pub total_neurons: u64,
    pub total_connections: u64,
    pub complexity: Complexity,
    pub reduced_detail: bool,
}

impl ArchitectureSummary {
    /// Computes the summary of `layers` in their architecture order.
    pub fn of(layers: &[LayerConfig]) -> Self {
        let total_neurons: u64 = layers.iter().map(|l| u64::from(l.units)).sum();
        let total_connections: u64 = layers
            .windows(2)
            .map(|pair| u64::from(pair[0].units) * u64::from(pair[1].units))
            .sum();

        let complexity = match total_neurons {
            n if n < 500 => Complexity::Excellent,
            n if n < 2000 => Complexity::Good,
            _ => Complexity::ConsiderOptimization,
        };

        Self {
            layers: layers.len(),
            total_neurons,
            total_connections,
            complexity,
            reduced_detail: total_neurons > DETAIL_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::layer::default_architecture;

    #[test]
    fn default_architecture_summary() {
        let summary = ArchitectureSummary::of(&default_architecture());

        assert_eq!(summary.layers, 3);
        assert_eq!(summary.total_neurons, 13);
        // 4*8 + 8*1
        assert_eq!(summary.total_connections, 40);
        assert_eq!(summary.complexity, Complexity::Excellent);
        assert!(!summary.reduced_detail);
    }

    #[test]
    fn empty_architecture_has_no_connections() {
        let summary = ArchitectureSummary::of(&[]);
        assert_eq!(summary.total_neurons, 0);
        assert_eq!(summary.total_connections, 0);
    }

    #[test]
    fn large_architectures_request_reduced_detail() {
        let mut layers = default_architecture();
        layers[1].units = 1500;

        let summary = ArchitectureSummary::of(&layers);

        assert_eq!(summary.complexity, Complexity::Good);
        assert!(summary.reduced_detail);
    }
}
