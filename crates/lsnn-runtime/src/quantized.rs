//! Quantized (discrete-time-bin) multilayer engines
//!
//! The quantized variant represents every window as [`ARRAY_SIZE`] uniform
//! bins holding integer spike counts. Propagation mirrors the continuous
//! engine bin by bin; learning correlates bin indices scaled by the bin
//! duration, and additionally learns against the following layer's
//! previous-window spikes (anticipatory correlation), an extra signal the
//! discrete representation makes cheap to compute and which has no
//! continuous-side analogue.

use crate::error::{Result, RuntimeError};
use crate::learning::{clip_weights, validate_rules, MAX_WEIGHT_MAGNITUDE};
use crate::network::{validate_shape, IZHIKEVICH_INPUT_GAIN};
use crate::stdp::{AsymmetricParams, StdpRule};
use lsnn_core::{empty_quantized, QuantizedSpikeTrain, SpikeTrainToValue, SpikingNeuron, ARRAY_SIZE};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Snapshot of a quantized network's activity at the end of a step
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SnnState {
    /// Per-neuron spike bins of the last window, `[layer][neuron]`
    pub spikes: Vec<Vec<QuantizedSpikeTrain>>,
    /// Per-neuron firing rates decoded from the spike bins
    pub firing_rates: Vec<Vec<f64>>,
    /// Copy of the current weight tensor
    pub weights: Vec<Vec<Vec<f64>>>,
}

/// Feed-forward layered spiking network over binned spike trains
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuantizedMultilayerSpikingNetwork {
    pub(crate) neurons: Vec<Vec<SpikingNeuron>>,
    pub(crate) weights: Vec<Vec<Vec<f64>>>,
    pub(crate) previous_application_time: f64,
    pub(crate) time_window_size: f64,
    /// Every neuron's spike bins from the last step, `[layer][neuron]`
    pub(crate) current_spikes: Vec<Vec<QuantizedSpikeTrain>>,
    snapshot_decoders: Vec<Vec<SpikeTrainToValue>>,
}

impl QuantizedMultilayerSpikingNetwork {
    /// Create a network with moving-average snapshot decoders
    pub fn new(neurons: Vec<Vec<SpikingNeuron>>, weights: Vec<Vec<Vec<f64>>>) -> Result<Self> {
        let decoder = SpikeTrainToValue::moving_average(
            lsnn_core::decoder::DEFAULT_FREQUENCY,
            0.8,
            1,
        )?;
        Self::with_snapshot_decoders(neurons, weights, &decoder)
    }

    /// Create a network with one clone of `decoder` per neuron for state
    /// reporting
    pub fn with_snapshot_decoders(
        neurons: Vec<Vec<SpikingNeuron>>,
        weights: Vec<Vec<Vec<f64>>>,
        decoder: &SpikeTrainToValue,
    ) -> Result<Self> {
        validate_shape(&neurons, &weights)?;
        let current_spikes = neurons
            .iter()
            .map(|layer| vec![empty_quantized(); layer.len()])
            .collect();
        let snapshot_decoders = neurons
            .iter()
            .map(|layer| vec![decoder.clone(); layer.len()])
            .collect();
        log::debug!(
            "created quantized spiking network with layers {:?}",
            neurons.iter().map(Vec::len).collect::<Vec<_>>()
        );
        Ok(Self {
            neurons,
            weights,
            previous_application_time: 0.0,
            time_window_size: 0.0,
            current_spikes,
            snapshot_decoders,
        })
    }

    /// Neuron counts per layer
    pub fn layer_sizes(&self) -> Vec<usize> {
        self.neurons.iter().map(Vec::len).collect()
    }

    /// The weight tensor, indexed `[layer][source][destination]`
    pub fn weights(&self) -> &[Vec<Vec<f64>>] {
        &self.weights
    }

    /// Width of the last evaluated window (s)
    pub fn time_window_size(&self) -> f64 {
        self.time_window_size
    }

    /// Propagate binned input spike trains through all layers
    pub fn apply(
        &mut self,
        t: f64,
        inputs: &[QuantizedSpikeTrain],
    ) -> Result<Vec<QuantizedSpikeTrain>> {
        if inputs.len() != self.neurons[0].len() {
            return Err(RuntimeError::invalid_input(
                self.neurons[0].len(),
                inputs.len(),
            ));
        }
        if let Some(bad) = inputs.iter().find(|train| train.len() != ARRAY_SIZE) {
            return Err(RuntimeError::invalid_input(ARRAY_SIZE, bad.len()));
        }
        self.time_window_size = t - self.previous_application_time;
        let mut incoming = input_gains(&self.neurons[0]);
        let mut previous_outputs: Vec<QuantizedSpikeTrain> = inputs.to_vec();
        for (layer_index, layer) in self.neurons.iter_mut().enumerate() {
            let mut layer_outputs = Vec::with_capacity(layer.len());
            for (neuron_index, neuron) in layer.iter_mut().enumerate() {
                let weighted = weighted_bins(&previous_outputs, &incoming[neuron_index]);
                neuron.set_sum_of_incoming_weights(incoming[neuron_index].iter().sum());
                let spikes = neuron.compute_quantized(&weighted, t);
                self.current_spikes[layer_index][neuron_index] = spikes.clone();
                layer_outputs.push(spikes);
            }
            if layer_index < self.weights.len() {
                let next_size = self.weights[layer_index]
                    .first()
                    .map(Vec::len)
                    .unwrap_or(0);
                incoming = (0..next_size)
                    .map(|dest| {
                        self.weights[layer_index]
                            .iter()
                            .map(|row| row[dest])
                            .collect()
                    })
                    .collect();
            }
            previous_outputs = layer_outputs;
        }
        self.previous_application_time = t;
        Ok(previous_outputs)
    }

    /// Snapshot the last step's spikes, decoded firing rates and weights
    pub fn state(&mut self) -> SnnState {
        let firing_rates = self
            .current_spikes
            .iter()
            .enumerate()
            .map(|(layer_index, layer)| {
                layer
                    .iter()
                    .enumerate()
                    .map(|(neuron_index, spikes)| {
                        self.snapshot_decoders[layer_index][neuron_index]
                            .convert_quantized(spikes, self.time_window_size)
                    })
                    .collect()
            })
            .collect();
        SnnState {
            spikes: self.current_spikes.clone(),
            firing_rates,
            weights: self.weights.clone(),
        }
    }

    /// Restore neurons, decoders, clock and spike buffers to
    /// construction-time state
    pub fn reset(&mut self) {
        self.previous_application_time = 0.0;
        self.time_window_size = 0.0;
        for layer in &mut self.neurons {
            for neuron in layer {
                neuron.reset();
            }
        }
        for layer in &mut self.snapshot_decoders {
            for decoder in layer {
                decoder.reset();
            }
        }
        for layer in &mut self.current_spikes {
            for spikes in layer {
                *spikes = empty_quantized();
            }
        }
    }
}

/// Quantized network with online STDP learning
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuantizedLearningMultilayerSpikingNetwork {
    network: QuantizedMultilayerSpikingNetwork,
    learning_rules: Vec<Vec<Vec<StdpRule>>>,
    initial_weights: Vec<Vec<Vec<f64>>>,
    /// Every neuron's spike bins from the immediately preceding window
    previous_output_spikes: Vec<Vec<QuantizedSpikeTrain>>,
    weights_clipping: bool,
    max_weight_magnitude: f64,
    /// Learning runs only while `t <= last_learning_time`; propagation is
    /// unaffected
    last_learning_time: f64,
}

impl QuantizedLearningMultilayerSpikingNetwork {
    /// Create a learning network; the weight tensor is copied so `reset()`
    /// can restore it
    pub fn new(
        neurons: Vec<Vec<SpikingNeuron>>,
        initial_weights: Vec<Vec<Vec<f64>>>,
        learning_rules: Vec<Vec<Vec<StdpRule>>>,
    ) -> Result<Self> {
        validate_rules(&initial_weights, &learning_rules)?;
        let previous_output_spikes = neurons
            .iter()
            .map(|layer| vec![empty_quantized(); layer.len()])
            .collect();
        let network = QuantizedMultilayerSpikingNetwork::new(neurons, initial_weights.clone())?;
        Ok(Self {
            network,
            learning_rules,
            initial_weights,
            previous_output_spikes,
            weights_clipping: false,
            max_weight_magnitude: MAX_WEIGHT_MAGNITUDE,
            last_learning_time: f64::INFINITY,
        })
    }

    /// Create a learning network with the default rule
    /// (asymmetric Hebbian) on every synapse
    pub fn with_default_rules(
        neurons: Vec<Vec<SpikingNeuron>>,
        initial_weights: Vec<Vec<Vec<f64>>>,
    ) -> Result<Self> {
        let rules = crate::learning::uniform_rules(
            &initial_weights,
            &StdpRule::AsymmetricHebbian(AsymmetricParams::default()),
        );
        Self::new(neurons, initial_weights, rules)
    }

    /// Propagate one step and apply the STDP weight updates
    pub fn apply(
        &mut self,
        t: f64,
        inputs: &[QuantizedSpikeTrain],
    ) -> Result<Vec<QuantizedSpikeTrain>> {
        let outputs = self.network.apply(t, inputs)?;
        let bin_dt = self.network.time_window_size / ARRAY_SIZE as f64;
        if t <= self.last_learning_time {
            self.learn(bin_dt);
        }
        self.previous_output_spikes = self.network.current_spikes.clone();
        if self.weights_clipping {
            clip_weights(&mut self.network.weights, self.max_weight_magnitude);
        }
        Ok(outputs)
    }

    fn learn(&mut self, bin_dt: f64) {
        let spikes = &self.network.current_spikes;
        let layer_count = spikes.len();
        for layer_index in 0..layer_count {
            for neuron_index in 0..spikes[layer_index].len() {
                // learning wrt the previous layer: this neuron's current
                // spikes vs the previous layer's current and previous spikes
                if layer_index > 0 {
                    for previous_neuron_index in 0..spikes[layer_index - 1].len() {
                        let rule = &self.learning_rules[layer_index - 1][previous_neuron_index]
                            [neuron_index];
                        let mut delta_w = 0.0;
                        for (b_out, &c_out) in
                            spikes[layer_index][neuron_index].iter().enumerate()
                        {
                            if c_out == 0 {
                                continue;
                            }
                            for (b_in, &c_in) in spikes[layer_index - 1][previous_neuron_index]
                                .iter()
                                .enumerate()
                            {
                                if c_in > 0 {
                                    delta_w += f64::from(c_out * c_in)
                                        * rule.compute_delta_w(
                                            (b_out as f64 - b_in as f64) * bin_dt,
                                        );
                                }
                            }
                            for (b_in, &c_in) in self.previous_output_spikes[layer_index - 1]
                                [previous_neuron_index]
                                .iter()
                                .enumerate()
                            {
                                if c_in > 0 {
                                    delta_w += f64::from(c_out * c_in)
                                        * rule.compute_delta_w(
                                            (b_out as f64 - b_in as f64 + ARRAY_SIZE as f64)
                                                * bin_dt,
                                        );
                                }
                            }
                        }
                        self.network.weights[layer_index - 1][previous_neuron_index]
                            [neuron_index] += delta_w;
                    }
                }
                // learning wrt the following layer: this neuron's current
                // spikes vs the following layer's previous spikes
                if layer_index + 1 < layer_count {
                    for following_neuron_index in 0..spikes[layer_index + 1].len() {
                        let rule = &self.learning_rules[layer_index][neuron_index]
                            [following_neuron_index];
                        let mut delta_w = 0.0;
                        for (b_out, &c_out) in
                            spikes[layer_index][neuron_index].iter().enumerate()
                        {
                            if c_out == 0 {
                                continue;
                            }
                            for (b_in, &c_in) in self.previous_output_spikes[layer_index + 1]
                                [following_neuron_index]
                                .iter()
                                .enumerate()
                            {
                                if c_in > 0 {
                                    delta_w += f64::from(c_out * c_in)
                                        * rule.compute_delta_w(
                                            (b_out as f64 - b_in as f64 + ARRAY_SIZE as f64)
                                                * bin_dt,
                                        );
                                }
                            }
                        }
                        self.network.weights[layer_index][neuron_index]
                            [following_neuron_index] += delta_w;
                    }
                }
            }
        }
    }

    /// Freeze learning after the given time, leaving propagation active
    pub fn set_last_learning_time(&mut self, last_learning_time: f64) {
        self.last_learning_time = last_learning_time;
    }

    /// Clamp every weight to `[-max_weight_magnitude, +max_weight_magnitude]`
    /// after each step
    pub fn enable_weights_clipping(&mut self, max_weight_magnitude: f64) {
        self.weights_clipping = true;
        self.max_weight_magnitude = max_weight_magnitude;
    }

    /// Disable post-step weight clamping
    pub fn disable_weights_clipping(&mut self) {
        self.weights_clipping = false;
    }

    /// The underlying network
    pub fn network(&self) -> &QuantizedMultilayerSpikingNetwork {
        &self.network
    }

    /// The current weight tensor
    pub fn weights(&self) -> &[Vec<Vec<f64>>] {
        self.network.weights()
    }

    /// Snapshot the last step's spikes, decoded firing rates and weights
    pub fn state(&mut self) -> SnnState {
        self.network.state()
    }

    /// Restore neurons, clock, spike history and weights to
    /// construction-time state
    pub fn reset(&mut self) {
        self.network.reset();
        self.network.weights = self.initial_weights.clone();
        for layer in &mut self.previous_output_spikes {
            for spikes in layer {
                *spikes = empty_quantized();
            }
        }
    }
}

/// Tagged variant over the quantized network engines
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum QuantizedSpikingNetwork {
    /// Fixed-weight propagation only
    Plain(QuantizedMultilayerSpikingNetwork),
    /// Propagation with online STDP learning
    Learning(QuantizedLearningMultilayerSpikingNetwork),
}

impl QuantizedSpikingNetwork {
    /// Propagate one step
    pub fn apply(
        &mut self,
        t: f64,
        inputs: &[QuantizedSpikeTrain],
    ) -> Result<Vec<QuantizedSpikeTrain>> {
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

    /// Snapshot the last step's spikes, decoded firing rates and weights
    pub fn state(&mut self) -> SnnState {
        match self {
            Self::Plain(network) => network.state(),
            Self::Learning(network) => network.state(),
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

fn input_gains(layer: &[SpikingNeuron]) -> Vec<Vec<f64>> {
    let mut incoming = vec![vec![0.0; layer.len()]; layer.len()];
    for (i, neuron) in layer.iter().enumerate() {
        incoming[i][i] = if neuron.model().is_izhikevich() {
            IZHIKEVICH_INPUT_GAIN
        } else {
            1.0
        };
    }
    incoming
}

/// Per-bin weighted input magnitude summed over all sources
fn weighted_bins(sources: &[QuantizedSpikeTrain], weights: &[f64]) -> Vec<f64> {
    let bins = sources.first().map(Vec::len).unwrap_or(0);
    let mut weighted = vec![0.0; bins];
    for (source, &weight) in sources.iter().zip(weights) {
        for (bin, &count) in source.iter().enumerate() {
            weighted[bin] += weight * f64::from(count);
        }
    }
    weighted
}
