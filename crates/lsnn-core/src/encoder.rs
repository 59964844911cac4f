//! Value to spike-train encoders
//!
//! An encoder maps a bounded scalar (clipped to `[0, 1]`) to a firing
//! frequency between [`MIN_FREQUENCY`] and its nominal frequency, then
//! places spikes at the implied uniform interval inside the window. The
//! with-memory variant low-pass filters the value before encoding.

use crate::error::{Result, SnnError};
use crate::spike::{QuantizedSpikeTrain, SpikeTrain, ARRAY_SIZE};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lower bound of the encodable input value
pub const INPUT_LOWER_BOUND: f64 = 0.0;
/// Upper bound of the encodable input value
pub const INPUT_UPPER_BOUND: f64 = 1.0;
/// Default nominal firing frequency (Hz)
pub const DEFAULT_FREQUENCY: f64 = 50.0;
/// Firing frequency encoded for the lowest input value (Hz)
pub const MIN_FREQUENCY: f64 = 5.0;

/// Tagged variant over the value-to-spike-train encoders
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValueToSpikeTrain {
    /// Spikes at the uniform interval implied by the encoded frequency
    Uniform {
        /// Nominal firing frequency (Hz)
        frequency: f64,
    },
    /// Uniform encoding of an exponentially smoothed value
    UniformWithMemory {
        /// Nominal firing frequency (Hz)
        frequency: f64,
        /// Blend factor of the previous smoothed value, in `[0, 1)`
        memory: f64,
        /// Smoothed value carried across calls
        stored: Option<f64>,
    },
}

impl Default for ValueToSpikeTrain {
    fn default() -> Self {
        Self::Uniform {
            frequency: DEFAULT_FREQUENCY,
        }
    }
}

impl ValueToSpikeTrain {
    /// Uniform encoder with a validated nominal frequency
    pub fn uniform(frequency: f64) -> Result<Self> {
        validate_frequency(frequency)?;
        Ok(Self::Uniform { frequency })
    }

    /// With-memory encoder with a validated frequency and blend factor
    pub fn uniform_with_memory(frequency: f64, memory: f64) -> Result<Self> {
        validate_frequency(frequency)?;
        if !(0.0..1.0).contains(&memory) {
            return Err(SnnError::invalid_parameter(
                "memory",
                memory.to_string(),
                "in [0.0, 1.0)",
            ));
        }
        Ok(Self::UniformWithMemory {
            frequency,
            memory,
            stored: None,
        })
    }

    /// Reconfigure the nominal firing frequency
    pub fn set_frequency(&mut self, new_frequency: f64) -> Result<()> {
        validate_frequency(new_frequency)?;
        match self {
            Self::Uniform { frequency } => *frequency = new_frequency,
            Self::UniformWithMemory { frequency, .. } => *frequency = new_frequency,
        }
        Ok(())
    }

    /// Clear internal memory
    pub fn reset(&mut self) {
        if let Self::UniformWithMemory { stored, .. } = self {
            *stored = None;
        }
    }

    /// Encode `value` over a window of `window` seconds into a
    /// window-normalized spike train
    pub fn convert(&mut self, value: f64, window: f64) -> SpikeTrain {
        let mut spikes = SpikeTrain::new();
        if window <= 0.0 {
            return spikes;
        }
        let frequency = self.encode_frequency(value);
        let interval = 1.0 / frequency;
        let mut time = interval;
        while time <= window {
            spikes.push(time / window);
            time += interval;
        }
        spikes
    }

    /// Encode `value` into [`ARRAY_SIZE`] per-bin spike counts
    pub fn convert_quantized(&mut self, value: f64, window: f64) -> QuantizedSpikeTrain {
        self.convert(value, window).quantized(ARRAY_SIZE)
    }

    /// Map the (clipped, possibly smoothed) value to a firing frequency
    fn encode_frequency(&mut self, value: f64) -> f64 {
        let value = value.clamp(INPUT_LOWER_BOUND, INPUT_UPPER_BOUND);
        match self {
            Self::Uniform { frequency } => MIN_FREQUENCY + value * (*frequency - MIN_FREQUENCY),
            Self::UniformWithMemory {
                frequency,
                memory,
                stored,
            } => {
                let smoothed = match *stored {
                    Some(previous) => *memory * previous + (1.0 - *memory) * value,
                    None => value,
                };
                *stored = Some(smoothed);
                MIN_FREQUENCY + smoothed * (*frequency - MIN_FREQUENCY)
            }
        }
    }
}

fn validate_frequency(frequency: f64) -> Result<()> {
    if frequency <= MIN_FREQUENCY {
        return Err(SnnError::invalid_parameter(
            "frequency",
            frequency.to_string(),
            format!("> {}", MIN_FREQUENCY),
        ));
    }
    Ok(())
}
