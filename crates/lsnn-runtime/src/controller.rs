//! Converter-wrapped network controller
//!
//! Wraps one continuous-time network with per-input encoders and per-output
//! decoders so a host control loop can drive it with plain scalars:
//! `apply(t, readings) -> control values`, `t` strictly increasing.

use crate::error::{Result, RuntimeError};
use crate::learning::LearningMultilayerSpikingNetwork;
use crate::network::MultilayerSpikingNetwork;
use lsnn_core::{SpikeTrain, SpikeTrainToValue, ValueToSpikeTrain};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tagged variant over the continuous-time network engines
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SpikingNetwork {
    /// Fixed-weight propagation only
    Plain(MultilayerSpikingNetwork),
    /// Propagation with online STDP learning
    Learning(LearningMultilayerSpikingNetwork),
}

impl SpikingNetwork {
    /// Propagate one step
    pub fn apply(&mut self, t: f64, inputs: &[SpikeTrain]) -> Result<Vec<SpikeTrain>> {
        match self {
            Self::Plain(network) => network.apply(t, inputs),
            Self::Learning(network) => network.apply(t, inputs),
        }
    }

    /// Neuron counts per layer
    pub fn layer_sizes(&self) -> Vec<usize> {
        match self {
            Self::Plain(network) => network.layer_sizes(),
            Self::Learning(network) => network.network().layer_sizes(),
        }
    }

    /// Restore construction-time state
    pub fn reset(&mut self) {
        match self {
            Self::Plain(network) => network.reset(),
            Self::Learning(network) => network.reset(),
        }
    }
}

/// Scalar-in, scalar-out controller around one spiking network
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SnnController {
    network: SpikingNetwork,
    encoders: Vec<ValueToSpikeTrain>,
    decoders: Vec<SpikeTrainToValue>,
    previous_time: f64,
}

impl SnnController {
    /// Create a controller; encoder and decoder counts must match the
    /// network's outer layers
    pub fn new(
        network: SpikingNetwork,
        encoders: Vec<ValueToSpikeTrain>,
        decoders: Vec<SpikeTrainToValue>,
    ) -> Result<Self> {
        let sizes = network.layer_sizes();
        let inputs = *sizes.first().unwrap_or(&0);
        let outputs = *sizes.last().unwrap_or(&0);
        if encoders.len() != inputs {
            return Err(RuntimeError::invalid_topology(format!(
                "{} encoders for a {}-input network",
                encoders.len(),
                inputs
            )));
        }
        if decoders.len() != outputs {
            return Err(RuntimeError::invalid_topology(format!(
                "{} decoders for a {}-output network",
                decoders.len(),
                outputs
            )));
        }
        Ok(Self {
            network,
            encoders,
            decoders,
            previous_time: 0.0,
        })
    }

    /// Create a controller with one clone of the given converters per
    /// network input/output
    pub fn uniform(
        network: SpikingNetwork,
        encoder: &ValueToSpikeTrain,
        decoder: &SpikeTrainToValue,
    ) -> Result<Self> {
        let sizes = network.layer_sizes();
        let encoders = vec![encoder.clone(); *sizes.first().unwrap_or(&0)];
        let decoders = vec![decoder.clone(); *sizes.last().unwrap_or(&0)];
        Self::new(network, encoders, decoders)
    }

    /// The wrapped network
    pub fn network(&self) -> &SpikingNetwork {
        &self.network
    }

    /// Encode readings, step the network, decode the output spikes
    pub fn apply(&mut self, t: f64, readings: &[f64]) -> Result<Vec<f64>> {
        if readings.len() != self.encoders.len() {
            return Err(RuntimeError::invalid_input(
                self.encoders.len(),
                readings.len(),
            ));
        }
        let window = t - self.previous_time;
        let inputs: Vec<SpikeTrain> = self
            .encoders
            .iter_mut()
            .zip(readings)
            .map(|(encoder, &value)| encoder.convert(value, window))
            .collect();
        let outputs = self.network.apply(t, &inputs)?;
        let values = self
            .decoders
            .iter_mut()
            .zip(&outputs)
            .map(|(decoder, train)| decoder.convert(train, window))
            .collect();
        self.previous_time = t;
        Ok(values)
    }

    /// Restore network, converters and clock to construction-time state
    pub fn reset(&mut self) {
        self.network.reset();
        self.previous_time = 0.0;
        for encoder in &mut self.encoders {
            encoder.reset();
        }
        for decoder in &mut self.decoders {
            decoder.reset();
        }
    }
}
