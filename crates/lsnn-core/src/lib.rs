//! Core spiking-neuron primitives for the layered SNN controller stack
//!
//! This crate holds the single-neuron dynamics (leaky integrate-and-fire,
//! its homeostatic variant and the Izhikevich model), the continuous and
//! quantized spike-train representations, and the converters that map
//! scalar sensor readings to spike trains and spike trains back to bounded
//! actuation values. Networks, learning and distributed sensing live in
//! `lsnn-runtime`.

#![deny(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod neuron;
pub mod spike;

// Re-export essential types
pub use decoder::SpikeTrainToValue;
pub use encoder::ValueToSpikeTrain;
pub use error::{Result, SnnError};
pub use neuron::{
    HomeostaticLifParams, IzhikevichParams, LifParams, NeuronModel, SpikingNeuron,
};
pub use spike::{empty_quantized, QuantizedSpikeTrain, SpikeTrain, WeightedSpikeTrain, ARRAY_SIZE};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_integration() {
        // encode -> integrate -> decode on default components
        let mut encoder = ValueToSpikeTrain::default();
        let mut neuron = SpikingNeuron::new(NeuronModel::default()).unwrap();
        let mut decoder = SpikeTrainToValue::default();

        let window = 0.1;
        let input = encoder.convert(1.0, window);
        let mut weighted = WeightedSpikeTrain::new();
        for time in input.iter() {
            weighted.add(time, 1.0);
        }
        let output = neuron.compute(&weighted, window);
        let value = decoder.convert(&output, window);
        assert!((decoder::OUTPUT_LOWER_BOUND..=decoder::OUTPUT_UPPER_BOUND).contains(&value));
    }
}
