//! Spiking neuron models
//!
//! A [`SpikingNeuron`] integrates weighted input spikes over the window
//! between two consecutive evaluations, subdividing it into uniform
//! sub-steps and firing whenever the membrane potential crosses the
//! threshold. Three models are supported: leaky integrate-and-fire (LIF),
//! LIF with a homeostatic threshold, and the two-variable Izhikevich model.

use crate::error::{Result, SnnError};
use crate::spike::{QuantizedSpikeTrain, SpikeTrain, WeightedSpikeTrain};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default number of membrane-potential updates per second of simulated time
pub const DEFAULT_UPDATE_FREQUENCY: u32 = 1000;

/// Seconds-to-milliseconds factor used by the Izhikevich dynamics
const TO_MILLIS: f64 = 1000.0;

/// Parameters for the leaky integrate-and-fire model
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LifParams {
    /// Resting membrane potential
    pub resting_potential: f64,
    /// Firing threshold potential
    pub threshold_potential: f64,
    /// Leak rate toward the resting potential (1/s)
    pub lambda_decay: f64,
}

impl Default for LifParams {
    fn default() -> Self {
        Self {
            resting_potential: 0.0,
            threshold_potential: 1.0,
            lambda_decay: 0.01,
        }
    }
}

impl LifParams {
    /// Create new LIF parameters with validation
    pub fn new(resting_potential: f64, threshold_potential: f64, lambda_decay: f64) -> Result<Self> {
        if threshold_potential <= resting_potential {
            return Err(SnnError::invalid_parameter(
                "threshold_potential",
                format!("{} (with resting_potential={})", threshold_potential, resting_potential),
                "> resting_potential",
            ));
        }
        if lambda_decay < 0.0 {
            return Err(SnnError::invalid_parameter(
                "lambda_decay",
                lambda_decay.to_string(),
                ">= 0.0",
            ));
        }
        Ok(Self {
            resting_potential,
            threshold_potential,
            lambda_decay,
        })
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        Self::new(
            self.resting_potential,
            self.threshold_potential,
            self.lambda_decay,
        )?;
        Ok(())
    }
}

/// Parameters for the LIF model with a homeostatic threshold
///
/// The effective threshold is the base threshold plus an adaptation term
/// `theta`; `theta` decays with the membrane leak rate and grows on each
/// spike proportionally to the total incoming synaptic drive reported by
/// the caller, so sustained strong drive raises the bar for firing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HomeostaticLifParams {
    /// Underlying LIF parameters
    pub lif: LifParams,
    /// Threshold increment applied on each spike, scaled by incoming drive
    pub theta_increment: f64,
}

impl Default for HomeostaticLifParams {
    fn default() -> Self {
        Self {
            lif: LifParams::default(),
            theta_increment: 0.2,
        }
    }
}

impl HomeostaticLifParams {
    /// Create new homeostatic LIF parameters with validation
    pub fn new(lif: LifParams, theta_increment: f64) -> Result<Self> {
        lif.validate()?;
        if theta_increment < 0.0 {
            return Err(SnnError::invalid_parameter(
                "theta_increment",
                theta_increment.to_string(),
                ">= 0.0",
            ));
        }
        Ok(Self {
            lif,
            theta_increment,
        })
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        Self::new(self.lif.clone(), self.theta_increment)?;
        Ok(())
    }
}

/// Parameters for the Izhikevich two-variable model (millivolt/millisecond
/// units; the membrane equation runs in milliseconds internally)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IzhikevichParams {
    /// Recovery time scale
    pub a: f64,
    /// Recovery sensitivity to the membrane potential
    pub b: f64,
    /// After-spike membrane reset value (also the resting potential)
    pub c: f64,
    /// After-spike recovery increment
    pub d: f64,
    /// Firing threshold potential (mV)
    pub threshold_potential: f64,
}

impl Default for IzhikevichParams {
    fn default() -> Self {
        // regular-spiking cortical parameters
        Self {
            a: 0.02,
            b: 0.2,
            c: -65.0,
            d: 2.0,
            threshold_potential: 30.0,
        }
    }
}

impl IzhikevichParams {
    /// Create new Izhikevich parameters with validation
    pub fn new(a: f64, b: f64, c: f64, d: f64, threshold_potential: f64) -> Result<Self> {
        if a <= 0.0 {
            return Err(SnnError::invalid_parameter("a", a.to_string(), "> 0.0"));
        }
        if threshold_potential <= c {
            return Err(SnnError::invalid_parameter(
                "threshold_potential",
                format!("{} (with c={})", threshold_potential, c),
                "> c",
            ));
        }
        Ok(Self {
            a,
            b,
            c,
            d,
            threshold_potential,
        })
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        Self::new(self.a, self.b, self.c, self.d, self.threshold_potential)?;
        Ok(())
    }
}

/// Tagged variant over the supported neuron models
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NeuronModel {
    /// Leaky integrate-and-fire
    Lif(LifParams),
    /// LIF with homeostatic threshold adaptation
    HomeostaticLif(HomeostaticLifParams),
    /// Izhikevich two-variable model
    Izhikevich(IzhikevichParams),
}

impl Default for NeuronModel {
    fn default() -> Self {
        Self::Lif(LifParams::default())
    }
}

impl NeuronModel {
    /// Resting membrane potential of the model
    pub fn resting_potential(&self) -> f64 {
        match self {
            Self::Lif(p) => p.resting_potential,
            Self::HomeostaticLif(p) => p.lif.resting_potential,
            Self::Izhikevich(p) => p.c,
        }
    }

    /// Base firing threshold of the model
    pub fn threshold_potential(&self) -> f64 {
        match self {
            Self::Lif(p) => p.threshold_potential,
            Self::HomeostaticLif(p) => p.lif.threshold_potential,
            Self::Izhikevich(p) => p.threshold_potential,
        }
    }

    /// Whether this is the Izhikevich model (which needs a larger input gain)
    pub fn is_izhikevich(&self) -> bool {
        matches!(self, Self::Izhikevich(_))
    }

    /// Validate model parameters
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Lif(p) => p.validate(),
            Self::HomeostaticLif(p) => p.validate(),
            Self::Izhikevich(p) => p.validate(),
        }
    }
}

/// Diagnostic time series recorded when tracing is enabled
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NeuronTrace {
    /// `(time, membrane potential)` samples, one per sub-step
    pub membrane_potential: Vec<(f64, f64)>,
    /// `(time, weighted magnitude)` of the non-zero input spikes
    pub input_spikes: Vec<(f64, f64)>,
}

/// A stateful spiking neuron
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpikingNeuron {
    model: NeuronModel,
    membrane_potential: f64,
    /// Izhikevich recovery variable, unused by the LIF models
    recovery: f64,
    /// Homeostatic threshold offset, unused by the other models
    theta: f64,
    last_evaluated_time: f64,
    last_input_time: f64,
    sum_of_incoming_weights: f64,
    update_frequency: u32,
    trace: Option<NeuronTrace>,
}

impl SpikingNeuron {
    /// Create a neuron from a validated model
    pub fn new(model: NeuronModel) -> Result<Self> {
        model.validate()?;
        let membrane_potential = model.resting_potential();
        let recovery = match &model {
            NeuronModel::Izhikevich(p) => p.b * p.c,
            _ => 0.0,
        };
        Ok(Self {
            model,
            membrane_potential,
            recovery,
            theta: 0.0,
            last_evaluated_time: 0.0,
            last_input_time: 0.0,
            sum_of_incoming_weights: 0.0,
            update_frequency: DEFAULT_UPDATE_FREQUENCY,
            trace: None,
        })
    }

    /// Override the membrane-update resolution (updates per simulated second)
    pub fn with_update_frequency(mut self, update_frequency: u32) -> Result<Self> {
        if update_frequency == 0 {
            return Err(SnnError::invalid_parameter(
                "update_frequency",
                update_frequency.to_string(),
                "> 0",
            ));
        }
        self.update_frequency = update_frequency;
        Ok(self)
    }

    /// The neuron model
    pub fn model(&self) -> &NeuronModel {
        &self.model
    }

    /// Current membrane potential
    pub fn membrane_potential(&self) -> f64 {
        self.membrane_potential
    }

    /// End of the last evaluated window
    pub fn last_evaluated_time(&self) -> f64 {
        self.last_evaluated_time
    }

    /// Report the total incoming synaptic weight, consumed by homeostasis
    pub fn set_sum_of_incoming_weights(&mut self, sum: f64) {
        self.sum_of_incoming_weights = sum;
    }

    /// Enable diagnostic recording of membrane potential and input spikes
    pub fn enable_trace(&mut self) {
        self.trace = Some(NeuronTrace::default());
    }

    /// Recorded diagnostics, if tracing is enabled
    pub fn trace(&self) -> Option<&NeuronTrace> {
        self.trace.as_ref()
    }

    /// Restore the state present right after construction
    pub fn reset(&mut self) {
        self.membrane_potential = self.model.resting_potential();
        self.recovery = match &self.model {
            NeuronModel::Izhikevich(p) => p.b * p.c,
            _ => 0.0,
        };
        self.theta = 0.0;
        self.last_evaluated_time = 0.0;
        self.last_input_time = 0.0;
        self.sum_of_incoming_weights = 0.0;
        if let Some(trace) = &mut self.trace {
            *trace = NeuronTrace::default();
        }
    }

    /// Integrate the window `[last_evaluated_time, t)` and return the
    /// window-normalized firing instants in `(0, 1]`
    ///
    /// `inputs` maps window-normalized instants to accumulated weighted
    /// spike magnitudes. A re-entrant call with the same `t` as the
    /// previous evaluation returns an empty train without mutating state.
    pub fn compute(&mut self, inputs: &WeightedSpikeTrain, t: f64) -> SpikeTrain {
        let mut spikes = SpikeTrain::new();
        let window = t - self.last_evaluated_time;
        if window == 0.0 {
            return spikes;
        }
        // normalized sub-step so that one step spans 1/update_frequency
        // seconds of absolute time
        let step = 1.0 / f64::from(self.update_frequency) / window;
        let mut grid = step;
        let mut index = 0;
        loop {
            let grid_pending = grid <= 1.0;
            let input_pending = index < inputs.len();
            if !grid_pending && !input_pending {
                break;
            }
            let (time, weight) = if input_pending {
                let (input_time, input_weight) = inputs.entry(index);
                if grid_pending && grid < input_time {
                    grid += step;
                    (grid - step, 0.0)
                } else {
                    if grid_pending && grid == input_time {
                        grid += step;
                    }
                    index += 1;
                    (input_time, input_weight)
                }
            } else {
                grid += step;
                (grid - step, 0.0)
            };
            if self.advance(time * window + self.last_evaluated_time, weight) {
                spikes.push(time);
            }
        }
        self.last_evaluated_time = t;
        spikes
    }

    /// Integrate one window given per-bin weighted input magnitudes and
    /// return per-bin spike counts (same bin count as `weighted`)
    ///
    /// Shares the same re-entrancy guard as [`compute`](Self::compute).
    pub fn compute_quantized(&mut self, weighted: &[f64], t: f64) -> QuantizedSpikeTrain {
        let mut counts = vec![0u32; weighted.len()];
        let window = t - self.last_evaluated_time;
        if window == 0.0 || weighted.is_empty() {
            return counts;
        }
        let bin = window / weighted.len() as f64;
        let start = self.last_evaluated_time;
        for (i, &magnitude) in weighted.iter().enumerate() {
            if self.advance(start + (i + 1) as f64 * bin, magnitude) {
                counts[i] += 1;
            }
        }
        self.last_evaluated_time = t;
        counts
    }

    /// Integrate up to `time` (absolute), apply the weighted input, and
    /// return whether the neuron fired
    fn advance(&mut self, time: f64, weighted: f64) -> bool {
        if let (Some(trace), true) = (&mut self.trace, weighted != 0.0) {
            trace.input_spikes.push((time, weighted));
        }
        self.accept_weighted_spike(time, weighted);
        if let Some(trace) = &mut self.trace {
            trace.membrane_potential.push((time, self.membrane_potential));
        }
        if self.membrane_potential >= self.effective_threshold() {
            self.reset_after_spike();
            if let Some(trace) = &mut self.trace {
                trace.membrane_potential.push((time, self.membrane_potential));
            }
            true
        } else {
            false
        }
    }

    fn effective_threshold(&self) -> f64 {
        self.model.threshold_potential() + self.theta
    }

    fn accept_weighted_spike(&mut self, time: f64, weighted: f64) {
        let delta = time - self.last_input_time;
        match &self.model {
            NeuronModel::Lif(p) => {
                let decay = (self.membrane_potential - p.resting_potential) * p.lambda_decay * delta;
                self.membrane_potential = self.membrane_potential - decay + weighted;
            }
            NeuronModel::HomeostaticLif(p) => {
                self.theta -= self.theta * p.lif.lambda_decay * delta;
                let decay =
                    (self.membrane_potential - p.lif.resting_potential) * p.lif.lambda_decay * delta;
                self.membrane_potential = self.membrane_potential - decay + weighted;
            }
            NeuronModel::Izhikevich(p) => {
                let delta_ms = delta * TO_MILLIS;
                let v = self.membrane_potential;
                let u = self.recovery;
                self.membrane_potential =
                    v + delta_ms * (0.04 * v * v + 5.0 * v + 140.0 - u + weighted);
                self.recovery = u + delta_ms * p.a * (p.b * self.membrane_potential - u);
            }
        }
        self.last_input_time = time;
    }

    fn reset_after_spike(&mut self) {
        match &self.model {
            NeuronModel::Lif(p) => {
                self.membrane_potential = p.resting_potential;
            }
            NeuronModel::HomeostaticLif(p) => {
                self.membrane_potential = p.lif.resting_potential;
                self.theta += p.theta_increment * self.sum_of_incoming_weights.abs();
            }
            NeuronModel::Izhikevich(p) => {
                self.membrane_potential = p.c;
                self.recovery += p.d;
            }
        }
    }
}

impl Default for SpikingNeuron {
    fn default() -> Self {
        Self::new(NeuronModel::default()).expect("default model is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_validation() {
        assert!(LifParams::new(0.0, 1.0, 0.01).is_ok());
        assert!(LifParams::new(1.0, 0.5, 0.01).is_err());
        assert!(LifParams::new(0.0, 1.0, -0.1).is_err());
        assert!(IzhikevichParams::new(0.02, 0.2, -65.0, 2.0, 30.0).is_ok());
        assert!(IzhikevichParams::new(0.0, 0.2, -65.0, 2.0, 30.0).is_err());
    }

    #[test]
    fn test_same_instant_call_is_a_noop() {
        let mut neuron = SpikingNeuron::default();
        let mut inputs = WeightedSpikeTrain::new();
        inputs.add(0.5, 2.0);
        assert!(neuron.compute(&inputs, 0.0).is_empty());
        assert_eq!(neuron.membrane_potential(), 0.0);

        let spikes = neuron.compute(&inputs, 0.1);
        assert!(!spikes.is_empty());
        let potential = neuron.membrane_potential();
        assert!(neuron.compute(&inputs, 0.1).is_empty());
        assert_eq!(neuron.membrane_potential(), potential);
    }

    #[test]
    fn test_lif_fires_at_threshold_and_resets() {
        let mut neuron = SpikingNeuron::default();
        let mut inputs = WeightedSpikeTrain::new();
        inputs.add(0.5, 1.5);
        let spikes = neuron.compute(&inputs, 0.1);
        assert_eq!(spikes.len(), 1);
        assert_eq!(spikes.as_slice(), &[0.5]);
        // after the spike only leak-free decay toward resting remains
        assert!(neuron.membrane_potential() <= 0.0 + 1e-9);
    }

    #[test]
    fn test_lif_subthreshold_stays_silent() {
        let mut neuron = SpikingNeuron::default();
        let mut inputs = WeightedSpikeTrain::new();
        inputs.add(0.3, 0.4);
        inputs.add(0.7, 0.4);
        let spikes = neuron.compute(&inputs, 0.1);
        assert!(spikes.is_empty());
        assert!(neuron.membrane_potential() > 0.0);
        assert!(neuron.membrane_potential() < 1.0);
    }

    #[test]
    fn test_no_input_no_spikes() {
        let mut neuron = SpikingNeuron::default();
        let spikes = neuron.compute(&WeightedSpikeTrain::new(), 0.1);
        assert!(spikes.is_empty());
        assert_eq!(neuron.last_evaluated_time(), 0.1);
    }

    #[test]
    fn test_reset_restores_construction_state() {
        let mut neuron = SpikingNeuron::default();
        let mut inputs = WeightedSpikeTrain::new();
        inputs.add(0.5, 0.7);
        neuron.compute(&inputs, 0.1);
        assert!(neuron.membrane_potential() != 0.0);
        neuron.reset();
        assert_eq!(neuron.membrane_potential(), 0.0);
        assert_eq!(neuron.last_evaluated_time(), 0.0);
    }

    #[test]
    fn test_homeostatic_threshold_grows() {
        let params = HomeostaticLifParams::default();
        let mut neuron = SpikingNeuron::new(NeuronModel::HomeostaticLif(params)).unwrap();
        neuron.set_sum_of_incoming_weights(1.0);
        let mut inputs = WeightedSpikeTrain::new();
        inputs.add(0.5, 1.1);
        let first = neuron.compute(&inputs, 0.1);
        assert_eq!(first.len(), 1);
        // the same drive no longer crosses the raised threshold
        let second = neuron.compute(&inputs, 0.2);
        assert!(second.is_empty());
    }

    #[test]
    fn test_izhikevich_fires_with_strong_drive() {
        let mut neuron =
            SpikingNeuron::new(NeuronModel::Izhikevich(IzhikevichParams::default())).unwrap();
        let mut inputs = WeightedSpikeTrain::new();
        inputs.add(0.5, 2000.0);
        let spikes = neuron.compute(&inputs, 0.1);
        assert!(!spikes.is_empty());
        // membrane reset to c after firing, recovery bumped by d
        assert!(neuron.membrane_potential() < 0.0);
    }

    #[test]
    fn test_quantized_compute_matches_bin_count() {
        let mut neuron = SpikingNeuron::default();
        let mut weighted = vec![0.0; 100];
        weighted[10] = 1.5;
        weighted[60] = 1.5;
        let counts = neuron.compute_quantized(&weighted, 0.1);
        assert_eq!(counts.len(), 100);
        assert_eq!(counts[10], 1);
        assert_eq!(counts[60], 1);
        assert_eq!(counts.iter().sum::<u32>(), 2);
    }

    #[test]
    fn test_trace_records_samples() {
        let mut neuron = SpikingNeuron::default();
        neuron.enable_trace();
        let mut inputs = WeightedSpikeTrain::new();
        inputs.add(0.5, 0.4);
        neuron.compute(&inputs, 0.1);
        let trace = neuron.trace().unwrap();
        assert_eq!(trace.input_spikes.len(), 1);
        assert!(!trace.membrane_potential.is_empty());
    }
}
