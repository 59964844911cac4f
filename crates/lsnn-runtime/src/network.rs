//! Continuous-time multilayer propagation engine
//!
//! A [`MultilayerSpikingNetwork`] feeds input spike trains through ordered
//! layers in a single forward pass. Layer 0 passes inputs through an
//! identity gain; every following layer pulls the weight tensor transposed
//! into the propagation direction, accumulates simultaneous weighted spikes
//! additively, and integrates each neuron over the step window. Spikes are
//! rescaled into absolute time for the next layer and for learning.

use crate::error::{Result, RuntimeError};
use lsnn_core::{SpikeTrain, SpikingNeuron, WeightedSpikeTrain};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Input gain applied to Izhikevich input-layer neurons, compensating for
/// the model's millivolt dynamic range
pub const IZHIKEVICH_INPUT_GAIN: f64 = 100.0;

/// Per-layer spike record of one propagation step
#[derive(Debug, Clone, PartialEq)]
pub struct LayerActivity {
    /// Final layer's window-normalized output spike trains
    pub outputs: Vec<SpikeTrain>,
    /// Absolute-time spike trains of every neuron, indexed `[layer][neuron]`
    pub absolute: Vec<Vec<SpikeTrain>>,
}

/// Feed-forward layered spiking network
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MultilayerSpikingNetwork {
    pub(crate) neurons: Vec<Vec<SpikingNeuron>>,
    /// Weight tensor indexed `[layer][source][destination]`
    pub(crate) weights: Vec<Vec<Vec<f64>>>,
    pub(crate) previous_application_time: f64,
    spikes_tracker: bool,
    /// Absolute firing times of every neuron since the last reset,
    /// populated only while the tracker is enabled
    tracked_spikes: Vec<Vec<Vec<f64>>>,
}

impl MultilayerSpikingNetwork {
    /// Create a network from layered neurons and a matching weight tensor
    pub fn new(neurons: Vec<Vec<SpikingNeuron>>, weights: Vec<Vec<Vec<f64>>>) -> Result<Self> {
        validate_shape(&neurons, &weights)?;
        let tracked_spikes = neurons
            .iter()
            .map(|layer| vec![Vec::new(); layer.len()])
            .collect();
        log::debug!(
            "created multilayer spiking network with layers {:?}",
            neurons.iter().map(Vec::len).collect::<Vec<_>>()
        );
        Ok(Self {
            neurons,
            weights,
            previous_application_time: 0.0,
            spikes_tracker: false,
            tracked_spikes,
        })
    }

    /// Create a network from a flat weight vector in layer-major,
    /// destination-then-source order
    pub fn from_flat(neurons: Vec<Vec<SpikingNeuron>>, flat: &[f64]) -> Result<Self> {
        let sizes: Vec<usize> = neurons.iter().map(Vec::len).collect();
        let weights = unflat_weights(flat, &sizes)?;
        Self::new(neurons, weights)
    }

    /// Neuron counts per layer
    pub fn layer_sizes(&self) -> Vec<usize> {
        self.neurons.iter().map(Vec::len).collect()
    }

    /// The weight tensor, indexed `[layer][source][destination]`
    pub fn weights(&self) -> &[Vec<Vec<f64>>] {
        &self.weights
    }

    /// The weight tensor flattened in layer-major, destination-then-source
    /// order
    pub fn flat_weights(&self) -> Vec<f64> {
        flat_weights(&self.weights)
    }

    /// Enable recording of every neuron's absolute firing times
    pub fn enable_spikes_tracker(&mut self) {
        self.spikes_tracker = true;
    }

    /// Absolute firing times recorded by the tracker, `[layer][neuron]`
    pub fn tracked_spikes(&self) -> &[Vec<Vec<f64>>] {
        &self.tracked_spikes
    }

    /// Propagate input spike trains through all layers, returning the final
    /// layer's window-normalized spike trains
    pub fn apply(&mut self, t: f64, inputs: &[SpikeTrain]) -> Result<Vec<SpikeTrain>> {
        self.apply_detailed(t, inputs).map(|activity| activity.outputs)
    }

    /// Propagate and additionally return every layer's absolute-time spikes
    pub fn apply_detailed(&mut self, t: f64, inputs: &[SpikeTrain]) -> Result<LayerActivity> {
        if inputs.len() != self.neurons[0].len() {
            return Err(RuntimeError::invalid_input(
                self.neurons[0].len(),
                inputs.len(),
            ));
        }
        let delta_t = t - self.previous_application_time;
        let mut incoming = input_gain_matrix(&self.neurons[0]);
        let mut previous_outputs: Vec<SpikeTrain> = inputs.to_vec();
        let mut absolute: Vec<Vec<SpikeTrain>> = Vec::with_capacity(self.neurons.len());
        for (layer_index, layer) in self.neurons.iter_mut().enumerate() {
            let mut layer_outputs = Vec::with_capacity(layer.len());
            let mut layer_absolute = Vec::with_capacity(layer.len());
            for (neuron_index, neuron) in layer.iter_mut().enumerate() {
                let weighted = weighted_spike_train(&previous_outputs, &incoming[neuron_index]);
                neuron.set_sum_of_incoming_weights(incoming[neuron_index].iter().sum());
                let spikes = neuron.compute(&weighted, t);
                let rescaled = spikes.rescaled(self.previous_application_time, delta_t);
                if self.spikes_tracker {
                    self.tracked_spikes[layer_index][neuron_index]
                        .extend(rescaled.iter());
                }
                layer_absolute.push(rescaled);
                layer_outputs.push(spikes);
            }
            absolute.push(layer_absolute);
            if layer_index < self.weights.len() {
                // pull the next layer's incoming weights transposed
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
        Ok(LayerActivity {
            outputs: previous_outputs,
            absolute,
        })
    }

    /// Restore neurons, clock and tracker to construction-time state
    pub fn reset(&mut self) {
        self.previous_application_time = 0.0;
        for layer in &mut self.neurons {
            for neuron in layer {
                neuron.reset();
            }
        }
        for layer in &mut self.tracked_spikes {
            for neuron in layer {
                neuron.clear();
            }
        }
    }
}

/// Identity incoming-weight matrix of the input layer, with the Izhikevich
/// gain where the neuron model needs it
fn input_gain_matrix(layer: &[SpikingNeuron]) -> Vec<Vec<f64>> {
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

/// Sum, at each distinct spike time across all sources, the source's weight
/// (simultaneous spikes accumulate additively)
fn weighted_spike_train(sources: &[SpikeTrain], weights: &[f64]) -> WeightedSpikeTrain {
    let mut weighted = WeightedSpikeTrain::new();
    for (source, &weight) in sources.iter().zip(weights) {
        for time in source.iter() {
            weighted.add(time, weight);
        }
    }
    weighted
}

/// Number of weights implied by layer sizes
pub fn count_weights(layer_sizes: &[usize]) -> usize {
    layer_sizes.windows(2).map(|pair| pair[0] * pair[1]).sum()
}

/// Flatten a weight tensor in layer-major, destination-then-source order
pub fn flat_weights(weights: &[Vec<Vec<f64>>]) -> Vec<f64> {
    let mut flat = Vec::new();
    for layer in weights {
        let dest_count = layer.first().map(Vec::len).unwrap_or(0);
        for dest in 0..dest_count {
            for row in layer {
                flat.push(row[dest]);
            }
        }
    }
    flat
}

/// Rebuild a weight tensor from its flat form
pub fn unflat_weights(flat: &[f64], layer_sizes: &[usize]) -> Result<Vec<Vec<Vec<f64>>>> {
    let expected = count_weights(layer_sizes);
    if flat.len() != expected {
        return Err(RuntimeError::invalid_topology(format!(
            "expected {} flat weights for layers {:?}, found {}",
            expected,
            layer_sizes,
            flat.len()
        )));
    }
    let mut weights = Vec::with_capacity(layer_sizes.len().saturating_sub(1));
    let mut c = 0;
    for pair in layer_sizes.windows(2) {
        let (sources, dests) = (pair[0], pair[1]);
        let mut layer = vec![vec![0.0; dests]; sources];
        for dest in 0..dests {
            for row in layer.iter_mut() {
                row[dest] = flat[c];
                c += 1;
            }
        }
        weights.push(layer);
    }
    Ok(weights)
}

/// Check the weight tensor against the layer sizes
pub(crate) fn validate_shape<N>(neurons: &[Vec<N>], weights: &[Vec<Vec<f64>>]) -> Result<()> {
    if neurons.is_empty() || neurons.iter().any(Vec::is_empty) {
        return Err(RuntimeError::invalid_topology(
            "every layer must hold at least one neuron",
        ));
    }
    if weights.len() + 1 != neurons.len() {
        return Err(RuntimeError::invalid_topology(format!(
            "{} layers need {} weight matrices, found {}",
            neurons.len(),
            neurons.len() - 1,
            weights.len()
        )));
    }
    for (layer_index, layer) in weights.iter().enumerate() {
        if layer.len() != neurons[layer_index].len()
            || layer
                .iter()
                .any(|row| row.len() != neurons[layer_index + 1].len())
        {
            return Err(RuntimeError::invalid_topology(format!(
                "weight matrix {} must be {}x{}",
                layer_index,
                neurons[layer_index].len(),
                neurons[layer_index + 1].len()
            )));
        }
    }
    Ok(())
}

/// Build uniform layers of neurons cloned from a model template
pub fn layered_neurons(
    layer_sizes: &[usize],
    neuron: &SpikingNeuron,
) -> Vec<Vec<SpikingNeuron>> {
    layer_sizes
        .iter()
        .map(|&size| vec![neuron.clone(); size])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsnn_core::{NeuronModel, SpikingNeuron};

    fn lif() -> SpikingNeuron {
        SpikingNeuron::new(NeuronModel::default()).unwrap()
    }

    fn network(layer_sizes: &[usize], flat: &[f64]) -> MultilayerSpikingNetwork {
        MultilayerSpikingNetwork::from_flat(layered_neurons(layer_sizes, &lif()), flat).unwrap()
    }

    #[test]
    fn test_shape_validation() {
        let neurons = layered_neurons(&[2, 2, 1], &lif());
        assert!(MultilayerSpikingNetwork::new(neurons.clone(), vec![vec![vec![0.0; 2]; 2]])
            .is_err());
        let good = vec![vec![vec![0.0; 2]; 2], vec![vec![0.0; 1]; 2]];
        assert!(MultilayerSpikingNetwork::new(neurons, good).is_ok());
    }

    #[test]
    fn test_count_and_flat_roundtrip() {
        let sizes = [2usize, 3, 1];
        assert_eq!(count_weights(&sizes), 9);
        let flat: Vec<f64> = (0..9).map(f64::from).collect();
        let weights = unflat_weights(&flat, &sizes).unwrap();
        assert_eq!(weights[0].len(), 2);
        assert_eq!(weights[0][0].len(), 3);
        assert_eq!(weights[1].len(), 3);
        assert_eq!(flat_weights(&weights), flat);
    }

    #[test]
    fn test_input_size_mismatch_fails_without_mutation() {
        let mut net = network(&[2, 2, 1], &vec![0.0; 9]);
        let inputs = vec![SpikeTrain::from_times(vec![0.5])];
        let err = net.apply(0.1, &inputs).unwrap_err();
        assert_eq!(err, RuntimeError::invalid_input(2, 1));
        // clock untouched by the failed step
        assert_eq!(net.previous_application_time, 0.0);
    }

    #[test]
    fn test_zero_weights_keep_hidden_layers_silent() {
        let mut net = network(&[2, 2, 1], &vec![0.0; 9]);
        let inputs = vec![
            SpikeTrain::from_times(vec![0.2, 0.4, 0.6, 0.8]),
            SpikeTrain::from_times(vec![0.1, 0.5, 0.9]),
        ];
        for step in 1..=10 {
            let outputs = net.apply(step as f64 * 0.1, &inputs).unwrap();
            assert!(outputs[0].is_empty());
        }
    }

    #[test]
    fn test_strong_weights_drive_the_output() {
        let mut net = network(&[1, 1], &[10.0]);
        let inputs = vec![SpikeTrain::from_times(vec![0.2, 0.4, 0.6, 0.8])];
        let outputs = net.apply(0.1, &inputs).unwrap();
        assert!(!outputs[0].is_empty());
    }

    #[test]
    fn test_absolute_spikes_live_inside_the_window() {
        let mut net = network(&[1, 1], &[10.0]);
        net.apply(0.1, &[SpikeTrain::from_times(vec![0.5])]).unwrap();
        let inputs = vec![SpikeTrain::from_times(vec![0.2, 0.4, 0.6, 0.8])];
        let activity = net.apply_detailed(0.2, &inputs).unwrap();
        for layer in &activity.absolute {
            for train in layer {
                for time in train.iter() {
                    assert!(time > 0.1 && time <= 0.2);
                }
            }
        }
    }

    #[test]
    fn test_spikes_tracker_accumulates_across_steps() {
        let mut net = network(&[1, 1], &[10.0]);
        net.enable_spikes_tracker();
        let inputs = vec![SpikeTrain::from_times(vec![0.25, 0.5, 0.75, 1.0])];
        net.apply(0.1, &inputs).unwrap();
        net.apply(0.2, &inputs).unwrap();
        let tracked = &net.tracked_spikes()[0][0];
        assert!(!tracked.is_empty());
        assert!(tracked.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_reset_replays_identically() {
        let mut net = network(&[2, 2, 1], &vec![0.6; 9]);
        let inputs = vec![
            SpikeTrain::from_times(vec![0.2, 0.4, 0.6, 0.8]),
            SpikeTrain::from_times(vec![0.1, 0.5, 0.9]),
        ];
        let mut first = Vec::new();
        for step in 1..=5 {
            first.push(net.apply(step as f64 * 0.1, &inputs).unwrap());
        }
        net.reset();
        for step in 1..=5 {
            assert_eq!(net.apply(step as f64 * 0.1, &inputs).unwrap(), first[step - 1]);
        }
    }
}
