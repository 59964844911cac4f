//! Spike-train to value decoders
//!
//! A decoder turns the spike count of a window into a firing rate,
//! normalizes it by its nominal frequency and maps it into `[-1, 1]` via
//! `2·rate − 1`. The moving-average variant keeps an exponential running
//! estimate across calls instead of a single-window count.

use crate::error::{Result, SnnError};
use crate::spike::{QuantizedSpikeTrain, SpikeTrain};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lower bound of the decoded output value
pub const OUTPUT_LOWER_BOUND: f64 = -1.0;
/// Upper bound of the decoded output value
pub const OUTPUT_UPPER_BOUND: f64 = 1.0;
/// Default nominal firing frequency (Hz)
pub const DEFAULT_FREQUENCY: f64 = 50.0;

/// Tagged variant over the spike-train-to-value decoders
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SpikeTrainToValue {
    /// Single-window average firing frequency
    AverageFrequency {
        /// Nominal firing frequency (Hz)
        frequency: f64,
    },
    /// Exponential moving average of the firing rate across windows
    MovingAverage {
        /// Nominal firing frequency (Hz)
        frequency: f64,
        /// Weight of the running estimate, in `[0, 1)`
        memory: f64,
        /// Sub-bin count used by the quantized conversion path
        bins: usize,
        /// Running rate estimate carried across calls
        average: Option<f64>,
    },
}

impl Default for SpikeTrainToValue {
    fn default() -> Self {
        Self::AverageFrequency {
            frequency: DEFAULT_FREQUENCY,
        }
    }
}

impl SpikeTrainToValue {
    /// Average-frequency decoder with a validated nominal frequency
    pub fn average_frequency(frequency: f64) -> Result<Self> {
        validate_frequency(frequency)?;
        Ok(Self::AverageFrequency { frequency })
    }

    /// Moving-average decoder with a validated decay factor and sub-bin count
    pub fn moving_average(frequency: f64, memory: f64, bins: usize) -> Result<Self> {
        validate_frequency(frequency)?;
        if !(0.0..1.0).contains(&memory) {
            return Err(SnnError::invalid_parameter(
                "memory",
                memory.to_string(),
                "in [0.0, 1.0)",
            ));
        }
        if bins == 0 {
            return Err(SnnError::invalid_parameter("bins", "0", "> 0"));
        }
        Ok(Self::MovingAverage {
            frequency,
            memory,
            bins,
            average: None,
        })
    }

    /// Reconfigure the nominal firing frequency
    pub fn set_frequency(&mut self, new_frequency: f64) -> Result<()> {
        validate_frequency(new_frequency)?;
        match self {
            Self::AverageFrequency { frequency } => *frequency = new_frequency,
            Self::MovingAverage { frequency, .. } => *frequency = new_frequency,
        }
        Ok(())
    }

    /// Clear internal memory
    pub fn reset(&mut self) {
        if let Self::MovingAverage { average, .. } = self {
            *average = None;
        }
    }

    /// Decode a window-normalized spike train observed over `window` seconds
    pub fn convert(&mut self, train: &SpikeTrain, window: f64) -> f64 {
        if window <= 0.0 {
            return OUTPUT_LOWER_BOUND;
        }
        match self {
            Self::AverageFrequency { frequency } => {
                normalize(train.len() as f64 / window / *frequency)
            }
            Self::MovingAverage {
                frequency,
                memory,
                average,
                ..
            } => {
                let rate = train.len() as f64 / window;
                let updated = match *average {
                    Some(previous) => *memory * previous + (1.0 - *memory) * rate,
                    None => rate,
                };
                *average = Some(updated);
                normalize(updated / *frequency)
            }
        }
    }

    /// Decode per-bin spike counts observed over `window` seconds
    ///
    /// The moving-average variant folds the window in `bins` chunks so the
    /// running estimate follows sub-window rate changes.
    pub fn convert_quantized(&mut self, train: &QuantizedSpikeTrain, window: f64) -> f64 {
        if window <= 0.0 || train.is_empty() {
            return OUTPUT_LOWER_BOUND;
        }
        match self {
            Self::AverageFrequency { frequency } => {
                let count: u32 = train.iter().sum();
                normalize(f64::from(count) / window / *frequency)
            }
            Self::MovingAverage {
                frequency,
                memory,
                bins,
                average,
            } => {
                let chunks = (*bins).min(train.len()).max(1);
                let chunk_len = train.len() / chunks;
                let chunk_window = window * chunk_len as f64 / train.len() as f64;
                let mut updated = average.unwrap_or(0.0);
                let mut seeded = average.is_some();
                for chunk in train.chunks(chunk_len).take(chunks) {
                    let rate = f64::from(chunk.iter().sum::<u32>()) / chunk_window;
                    if seeded {
                        updated = *memory * updated + (1.0 - *memory) * rate;
                    } else {
                        updated = rate;
                        seeded = true;
                    }
                }
                *average = Some(updated);
                normalize(updated / *frequency)
            }
        }
    }
}

/// Map a nominal-frequency-relative rate into `[-1, 1]`
fn normalize(value: f64) -> f64 {
    (value * 2.0 - 1.0).clamp(OUTPUT_LOWER_BOUND, OUTPUT_UPPER_BOUND)
}

fn validate_frequency(frequency: f64) -> Result<()> {
    if frequency <= 0.0 {
        return Err(SnnError::invalid_parameter(
            "frequency",
            frequency.to_string(),
            "> 0.0",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_decodes_to_lower_bound() {
        let mut decoder = SpikeTrainToValue::default();
        assert_eq!(decoder.convert(&SpikeTrain::new(), 0.1), -1.0);
    }

    #[test]
    fn test_nominal_rate_decodes_to_upper_bound() {
        let mut decoder = SpikeTrainToValue::default();
        // 5 spikes in 0.1 s = 50 Hz = nominal
        let train = SpikeTrain::from_times(vec![0.1, 0.3, 0.5, 0.7, 0.9]);
        assert_eq!(decoder.convert(&train, 0.1), 1.0);
    }

    #[test]
    fn test_half_rate_decodes_to_zero() {
        let mut decoder = SpikeTrainToValue::default();
        let train = SpikeTrain::from_times(vec![0.2, 0.4, 0.6, 0.8, 1.0]);
        // 5 spikes in 0.2 s = 25 Hz = half the nominal frequency
        let value = decoder.convert(&train, 0.2);
        assert!(value.abs() < 1e-9);
    }

    #[test]
    fn test_quantized_matches_continuous() {
        let mut continuous = SpikeTrainToValue::default();
        let mut quantized = SpikeTrainToValue::default();
        let train = SpikeTrain::from_times(vec![0.25, 0.5, 0.75]);
        let a = continuous.convert(&train, 0.1);
        let b = quantized.convert_quantized(&train.quantized(crate::spike::ARRAY_SIZE), 0.1);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_moving_average_lags_instant_rate() {
        let mut decoder = SpikeTrainToValue::moving_average(50.0, 0.8, 1).unwrap();
        let busy = SpikeTrain::from_times(vec![0.1, 0.3, 0.5, 0.7, 0.9]);
        let first = decoder.convert(&busy, 0.1);
        assert_eq!(first, 1.0);
        // silence pulls the estimate down gradually, not instantly
        let after_silence = decoder.convert(&SpikeTrain::new(), 0.1);
        assert!(after_silence > -1.0);
        assert!(after_silence < first);

        decoder.reset();
        assert_eq!(decoder.convert(&SpikeTrain::new(), 0.1), -1.0);
    }

    #[test]
    fn test_moving_average_validation() {
        assert!(SpikeTrainToValue::moving_average(50.0, 1.0, 4).is_err());
        assert!(SpikeTrainToValue::moving_average(50.0, 0.5, 0).is_err());
        assert!(SpikeTrainToValue::moving_average(0.0, 0.5, 4).is_err());
    }
}
