//! Multilayer spiking-network engines with online STDP learning
//!
//! This crate builds the control engines on top of the `lsnn-core`
//! primitives: continuous-time and quantized multilayer propagation,
//! spike-timing-dependent plasticity with per-synapse rules, a
//! converter-wrapped scalar controller, and a distributed-sensing grid of
//! networks coupled through lattice-neighbor signals. Execution is
//! deterministic; with the `parallel` feature the grid controller
//! evaluates independent cells concurrently, which is sound because cells
//! only read the previous step's signal buffers.

#![deny(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod controller;
pub mod distributed;
pub mod error;
pub mod grid;
pub mod learning;
pub mod network;
pub mod quantized;
pub mod stdp;

// Re-export essential types
pub use controller::{SnnController, SpikingNetwork};
pub use distributed::{DistributedSpikingSensing, SpikingCell};
pub use error::{Result, RuntimeError};
pub use grid::{Dir, Grid};
pub use learning::{
    LearningMultilayerSpikingNetwork, MAX_WEIGHT_MAGNITUDE, STDP_LEARNING_WINDOW,
};
pub use network::{LayerActivity, MultilayerSpikingNetwork};
pub use quantized::{
    QuantizedLearningMultilayerSpikingNetwork, QuantizedMultilayerSpikingNetwork,
    QuantizedSpikingNetwork, SnnState,
};
pub use stdp::{AsymmetricParams, StdpRule, SymmetricParams};

#[cfg(test)]
mod tests {
    use super::*;
    use lsnn_core::{NeuronModel, SpikingNeuron};

    #[test]
    fn test_basic_integration() {
        // Test that all components can be imported and basic objects created
        let params = SymmetricParams::default();
        assert!(params.sigma > 0.0);

        let neuron = SpikingNeuron::new(NeuronModel::default()).unwrap();
        let neurons = network::layered_neurons(&[1, 1], &neuron);
        let net = MultilayerSpikingNetwork::new(neurons, vec![vec![vec![0.5]]]).unwrap();
        assert_eq!(net.layer_sizes(), vec![1, 1]);
    }
}
