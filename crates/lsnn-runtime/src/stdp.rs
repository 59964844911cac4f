//! STDP learning rules
//!
//! A rule is a pure function from the time difference between a
//! post-synaptic and a pre-synaptic spike (`delta_t = t_post - t_pre`,
//! seconds) to a weight delta. The symmetric family uses a Ricker
//! (Mexican-hat) kernel, even in `delta_t`; the asymmetric family is
//! causal, with separate exponential branches for pre-before-post and
//! post-before-pre. Anti-Hebbian variants negate the Hebbian delta.

use crate::error::Result;
use lsnn_core::SnnError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters of the symmetric (Ricker-kernel) rule family
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SymmetricParams {
    /// Amplitude applied where the kernel is positive (potentiation)
    pub a_plus: f64,
    /// Amplitude applied where the kernel is negative (depression)
    pub a_minus: f64,
    /// Kernel width (s)
    pub sigma: f64,
}

impl Default for SymmetricParams {
    fn default() -> Self {
        Self {
            a_plus: 0.01,
            a_minus: 0.012,
            sigma: 0.01,
        }
    }
}

impl SymmetricParams {
    /// Create new symmetric rule parameters with validation
    pub fn new(a_plus: f64, a_minus: f64, sigma: f64) -> Result<Self> {
        if a_plus < 0.0 {
            return Err(SnnError::invalid_parameter("a_plus", a_plus.to_string(), ">= 0.0").into());
        }
        if a_minus < 0.0 {
            return Err(
                SnnError::invalid_parameter("a_minus", a_minus.to_string(), ">= 0.0").into(),
            );
        }
        if sigma <= 0.0 {
            return Err(SnnError::invalid_parameter("sigma", sigma.to_string(), "> 0.0").into());
        }
        Ok(Self {
            a_plus,
            a_minus,
            sigma,
        })
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        Self::new(self.a_plus, self.a_minus, self.sigma)?;
        Ok(())
    }
}

/// Parameters of the asymmetric (causal exponential) rule family
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AsymmetricParams {
    /// Amplitude of the pre-before-post branch
    pub a_plus: f64,
    /// Amplitude of the post-before-pre branch
    pub a_minus: f64,
    /// Decay constant of the pre-before-post branch (s)
    pub tau_plus: f64,
    /// Decay constant of the post-before-pre branch (s)
    pub tau_minus: f64,
}

impl Default for AsymmetricParams {
    fn default() -> Self {
        Self {
            a_plus: 0.01,
            a_minus: 0.012,
            tau_plus: 0.01,
            tau_minus: 0.01,
        }
    }
}

impl AsymmetricParams {
    /// Create new asymmetric rule parameters with validation
    pub fn new(a_plus: f64, a_minus: f64, tau_plus: f64, tau_minus: f64) -> Result<Self> {
        if a_plus < 0.0 {
            return Err(SnnError::invalid_parameter("a_plus", a_plus.to_string(), ">= 0.0").into());
        }
        if a_minus < 0.0 {
            return Err(
                SnnError::invalid_parameter("a_minus", a_minus.to_string(), ">= 0.0").into(),
            );
        }
        if tau_plus <= 0.0 {
            return Err(
                SnnError::invalid_parameter("tau_plus", tau_plus.to_string(), "> 0.0").into(),
            );
        }
        if tau_minus <= 0.0 {
            return Err(
                SnnError::invalid_parameter("tau_minus", tau_minus.to_string(), "> 0.0").into(),
            );
        }
        Ok(Self {
            a_plus,
            a_minus,
            tau_plus,
            tau_minus,
        })
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        Self::new(self.a_plus, self.a_minus, self.tau_plus, self.tau_minus)?;
        Ok(())
    }
}

/// Tagged variant over the STDP rule families
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StdpRule {
    /// Symmetric Hebbian: potentiates near-coincident spikes
    SymmetricHebbian(SymmetricParams),
    /// Symmetric anti-Hebbian: depresses near-coincident spikes
    SymmetricAntiHebbian(SymmetricParams),
    /// Asymmetric Hebbian: pre-before-post potentiates
    AsymmetricHebbian(AsymmetricParams),
    /// Asymmetric anti-Hebbian: pre-before-post depresses
    AsymmetricAntiHebbian(AsymmetricParams),
}

impl StdpRule {
    /// Weight delta for a post-minus-pre spike time difference (s)
    pub fn compute_delta_w(&self, delta_t: f64) -> f64 {
        match self {
            Self::SymmetricHebbian(p) => symmetric_delta(p, delta_t),
            Self::SymmetricAntiHebbian(p) => -symmetric_delta(p, delta_t),
            Self::AsymmetricHebbian(p) => asymmetric_delta(p, delta_t),
            Self::AsymmetricAntiHebbian(p) => -asymmetric_delta(p, delta_t),
        }
    }

    /// Validate rule parameters
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::SymmetricHebbian(p) | Self::SymmetricAntiHebbian(p) => p.validate(),
            Self::AsymmetricHebbian(p) | Self::AsymmetricAntiHebbian(p) => p.validate(),
        }
    }
}

/// Ricker (Mexican-hat) kernel: positive for `|delta_t| < sigma`, negative
/// out to a bounded distance, vanishing beyond
fn ricker(delta_t: f64, sigma: f64) -> f64 {
    let ratio = delta_t * delta_t / (sigma * sigma);
    (-ratio / 2.0).exp() * (1.0 - ratio)
}

fn symmetric_delta(params: &SymmetricParams, delta_t: f64) -> f64 {
    let g = ricker(delta_t, params.sigma);
    if g > 0.0 {
        params.a_plus * g
    } else if g < 0.0 {
        params.a_minus * g
    } else {
        0.0
    }
}

fn asymmetric_delta(params: &AsymmetricParams, delta_t: f64) -> f64 {
    if delta_t > 0.0 {
        params.a_plus * (-delta_t / params.tau_plus).exp()
    } else if delta_t < 0.0 {
        -params.a_minus * (delta_t / params.tau_minus).exp()
    } else {
        0.0
    }
}
