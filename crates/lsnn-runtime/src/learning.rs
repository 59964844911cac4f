//! Continuous-time online STDP learning network
//!
//! Wraps a [`MultilayerSpikingNetwork`] and, after each propagation step,
//! correlates every neuron's absolute-time spikes against its pre-synaptic
//! neurons' spikes from the current window and the immediately preceding
//! window, so causal pairs spanning the window boundary are not lost. Each
//! synapse's deltas are summed fully before the single additive weight
//! update; clipping, when enabled, runs after the whole step's update.

use crate::error::Result;
use crate::network::{
    count_weights, validate_shape, LayerActivity, MultilayerSpikingNetwork,
};
use crate::stdp::{StdpRule, SymmetricParams};
use lsnn_core::{SpikeTrain, SpikingNeuron};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest pre/post spike distance considered by learning (s)
pub const STDP_LEARNING_WINDOW: f64 = 0.04;
/// Default weight-clipping bound
pub const MAX_WEIGHT_MAGNITUDE: f64 = 1.2;

/// Multilayer spiking network with per-synapse online STDP learning
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LearningMultilayerSpikingNetwork {
    network: MultilayerSpikingNetwork,
    /// One rule per synapse, shaped like the weight tensor
    learning_rules: Vec<Vec<Vec<StdpRule>>>,
    initial_weights: Vec<Vec<Vec<f64>>>,
    /// Absolute-time spikes of the previous step, `[layer][neuron]`
    previous_output_spikes: Vec<Vec<SpikeTrain>>,
    weights_clipping: bool,
    max_weight_magnitude: f64,
}

impl LearningMultilayerSpikingNetwork {
    /// Create a learning network; the weight tensor is copied so `reset()`
    /// can restore it
    pub fn new(
        neurons: Vec<Vec<SpikingNeuron>>,
        initial_weights: Vec<Vec<Vec<f64>>>,
        learning_rules: Vec<Vec<Vec<StdpRule>>>,
    ) -> Result<Self> {
        validate_shape(&neurons, &initial_weights)?;
        validate_rules(&initial_weights, &learning_rules)?;
        let previous_output_spikes = neurons
            .iter()
            .map(|layer| vec![SpikeTrain::new(); layer.len()])
            .collect();
        let network = MultilayerSpikingNetwork::new(neurons, initial_weights.clone())?;
        Ok(Self {
            network,
            learning_rules,
            initial_weights,
            previous_output_spikes,
            weights_clipping: false,
            max_weight_magnitude: MAX_WEIGHT_MAGNITUDE,
        })
    }

    /// Create a learning network with the default rule
    /// (symmetric anti-Hebbian) on every synapse
    pub fn with_default_rules(
        neurons: Vec<Vec<SpikingNeuron>>,
        initial_weights: Vec<Vec<Vec<f64>>>,
    ) -> Result<Self> {
        let rules = default_rules(&initial_weights);
        Self::new(neurons, initial_weights, rules)
    }

    /// Propagate one step and apply the STDP weight updates
    pub fn apply(&mut self, t: f64, inputs: &[SpikeTrain]) -> Result<Vec<SpikeTrain>> {
        let LayerActivity { outputs, absolute } = self.network.apply_detailed(t, inputs)?;
        // learning pass, not on the inputs
        for layer_index in 1..absolute.len() {
            for (neuron_index, post_spikes) in absolute[layer_index].iter().enumerate() {
                for (previous_neuron_index, current_pre) in
                    absolute[layer_index - 1].iter().enumerate()
                {
                    let rule =
                        &self.learning_rules[layer_index - 1][previous_neuron_index][neuron_index];
                    let previous_pre =
                        &self.previous_output_spikes[layer_index - 1][previous_neuron_index];
                    let mut delta_w = 0.0;
                    for t_out in post_spikes.iter() {
                        for t_in in previous_pre.iter().chain(current_pre.iter()) {
                            if (t_out - t_in).abs() <= STDP_LEARNING_WINDOW {
                                delta_w += rule.compute_delta_w(t_out - t_in);
                            }
                        }
                    }
                    self.network.weights[layer_index - 1][previous_neuron_index][neuron_index] +=
                        delta_w;
                }
            }
        }
        self.previous_output_spikes = absolute;
        if self.weights_clipping {
            clip_weights(&mut self.network.weights, self.max_weight_magnitude);
        }
        Ok(outputs)
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
    pub fn network(&self) -> &MultilayerSpikingNetwork {
        &self.network
    }

    /// The underlying network, for tracker configuration
    pub fn network_mut(&mut self) -> &mut MultilayerSpikingNetwork {
        &mut self.network
    }

    /// The current weight tensor
    pub fn weights(&self) -> &[Vec<Vec<f64>>] {
        self.network.weights()
    }

    /// The learning rules, shaped like the weight tensor
    pub fn learning_rules(&self) -> &[Vec<Vec<StdpRule>>] {
        &self.learning_rules
    }

    /// Restore neurons, clock, spike history and weights to
    /// construction-time state
    pub fn reset(&mut self) {
        self.network.reset();
        self.network.weights = self.initial_weights.clone();
        for layer in &mut self.previous_output_spikes {
            for train in layer {
                train.clear();
            }
        }
    }
}

/// Fill a rule tensor shaped like `weights` with the given rule
pub fn uniform_rules(weights: &[Vec<Vec<f64>>], rule: &StdpRule) -> Vec<Vec<Vec<StdpRule>>> {
    weights
        .iter()
        .map(|layer| {
            layer
                .iter()
                .map(|row| vec![rule.clone(); row.len()])
                .collect()
        })
        .collect()
}

fn default_rules(weights: &[Vec<Vec<f64>>]) -> Vec<Vec<Vec<StdpRule>>> {
    uniform_rules(
        weights,
        &StdpRule::SymmetricAntiHebbian(SymmetricParams::default()),
    )
}

pub(crate) fn clip_weights(weights: &mut [Vec<Vec<f64>>], max_magnitude: f64) {
    for layer in weights {
        for row in layer {
            for weight in row {
                *weight = weight.clamp(-max_magnitude, max_magnitude);
            }
        }
    }
}

pub(crate) fn validate_rules(
    weights: &[Vec<Vec<f64>>],
    rules: &[Vec<Vec<StdpRule>>],
) -> Result<()> {
    use crate::error::RuntimeError;
    let same_shape = rules.len() == weights.len()
        && rules.iter().zip(weights).all(|(rule_layer, weight_layer)| {
            rule_layer.len() == weight_layer.len()
                && rule_layer
                    .iter()
                    .zip(weight_layer)
                    .all(|(rule_row, weight_row)| rule_row.len() == weight_row.len())
        });
    if !same_shape {
        return Err(RuntimeError::invalid_topology(
            "learning-rule tensor must be shaped like the weight tensor",
        ));
    }
    for layer in rules {
        for row in layer {
            for rule in row {
                rule.validate()?;
            }
        }
    }
    Ok(())
}

/// Flatten a rule tensor in layer-major, destination-then-source order
pub fn flat_rules(rules: &[Vec<Vec<StdpRule>>]) -> Vec<StdpRule> {
    let mut flat = Vec::new();
    for layer in rules {
        let dest_count = layer.first().map(Vec::len).unwrap_or(0);
        for dest in 0..dest_count {
            for row in layer {
                flat.push(row[dest].clone());
            }
        }
    }
    flat
}

/// Rebuild a rule tensor from its flat form
pub fn unflat_rules(flat: &[StdpRule], layer_sizes: &[usize]) -> Result<Vec<Vec<Vec<StdpRule>>>> {
    use crate::error::RuntimeError;
    let expected = count_weights(layer_sizes);
    if flat.len() != expected {
        return Err(RuntimeError::invalid_topology(format!(
            "expected {} flat rules for layers {:?}, found {}",
            expected,
            layer_sizes,
            flat.len()
        )));
    }
    let mut rules = Vec::with_capacity(layer_sizes.len().saturating_sub(1));
    let mut offset = 0;
    for pair in layer_sizes.windows(2) {
        let (sources, dests) = (pair[0], pair[1]);
        let layer = (0..sources)
            .map(|src| {
                (0..dests)
                    .map(|dest| flat[offset + dest * sources + src].clone())
                    .collect()
            })
            .collect();
        offset += sources * dests;
        rules.push(layer);
    }
    Ok(rules)
}
