//! Spike-train representations shared by both time models
//!
//! The continuous model stores firing instants as strictly increasing `f64`
//! values; window-normalized trains live in `(0, 1]`, absolute trains carry
//! real timestamps. The quantized model divides the window into
//! [`ARRAY_SIZE`] uniform bins and counts spikes per bin.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of time bins of a quantized spike train
pub const ARRAY_SIZE: usize = 100;

/// Quantized spike train: one spike count per time bin
pub type QuantizedSpikeTrain = Vec<u32>;

/// Create an all-zero quantized spike train of [`ARRAY_SIZE`] bins
pub fn empty_quantized() -> QuantizedSpikeTrain {
    vec![0; ARRAY_SIZE]
}

/// Ordered set of firing instants
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpikeTrain {
    times: Vec<f64>,
}

impl SpikeTrain {
    /// Create an empty spike train
    pub fn new() -> Self {
        Self { times: Vec::new() }
    }

    /// Build a spike train from arbitrary instants, sorting and deduplicating
    pub fn from_times(mut times: Vec<f64>) -> Self {
        times.sort_by(f64::total_cmp);
        times.dedup();
        Self { times }
    }

    /// Insert a firing instant, keeping the train ordered and duplicate-free
    pub fn push(&mut self, time: f64) {
        match self.times.last() {
            Some(&last) if time > last => self.times.push(time),
            None => self.times.push(time),
            Some(&last) if time == last => {}
            _ => {
                if let Err(pos) = self.times.binary_search_by(|probe| probe.total_cmp(&time)) {
                    self.times.insert(pos, time);
                }
            }
        }
    }

    /// Number of spikes in the train
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether the train holds no spikes
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Iterate over firing instants in ascending order
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.times.iter().copied()
    }

    /// Firing instants as a slice
    pub fn as_slice(&self) -> &[f64] {
        &self.times
    }

    /// Remove all spikes
    pub fn clear(&mut self) {
        self.times.clear();
    }

    /// Map window-normalized instants into absolute time
    /// (`offset + scale * instant`)
    pub fn rescaled(&self, offset: f64, scale: f64) -> Self {
        Self {
            times: self.times.iter().map(|x| offset + scale * x).collect(),
        }
    }

    /// Quantize normalized instants in `(0, 1]` into `bins` spike counts
    pub fn quantized(&self, bins: usize) -> QuantizedSpikeTrain {
        let mut counts = vec![0u32; bins];
        for time in self.iter() {
            let index = ((time * bins as f64).ceil() as usize)
                .saturating_sub(1)
                .min(bins - 1);
            counts[index] += 1;
        }
        counts
    }
}

impl<'a> IntoIterator for &'a SpikeTrain {
    type Item = f64;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, f64>>;

    fn into_iter(self) -> Self::IntoIter {
        self.times.iter().copied()
    }
}

/// Time-keyed accumulation of weighted input spikes
///
/// Entries are kept sorted by time; inserting at an existing instant adds
/// to the stored magnitude, so simultaneous spikes from several sources
/// accumulate additively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightedSpikeTrain {
    entries: Vec<(f64, f64)>,
}

impl WeightedSpikeTrain {
    /// Create an empty weighted spike train
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a weighted spike at `time`, merging with an existing entry at the
    /// exact same instant
    pub fn add(&mut self, time: f64, weight: f64) {
        match self
            .entries
            .binary_search_by(|probe| probe.0.total_cmp(&time))
        {
            Ok(pos) => self.entries[pos].1 += weight,
            Err(pos) => self.entries.insert(pos, (time, weight)),
        }
    }

    /// Number of distinct instants
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no weighted spikes are stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index` as `(time, accumulated weight)`
    pub fn entry(&self, index: usize) -> (f64, f64) {
        self.entries[index]
    }

    /// Iterate over `(time, accumulated weight)` pairs in time order
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.entries.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_order_and_dedups() {
        let mut train = SpikeTrain::new();
        train.push(0.5);
        train.push(0.2);
        train.push(0.5);
        train.push(0.9);
        assert_eq!(train.as_slice(), &[0.2, 0.5, 0.9]);
    }

    #[test]
    fn test_from_times_sorts() {
        let train = SpikeTrain::from_times(vec![0.3, 0.1, 0.3, 0.2]);
        assert_eq!(train.as_slice(), &[0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_rescaled() {
        let train = SpikeTrain::from_times(vec![0.25, 0.5, 1.0]);
        let absolute = train.rescaled(2.0, 0.1);
        assert_eq!(absolute.as_slice(), &[2.025, 2.05, 2.1]);
    }

    #[test]
    fn test_quantized_bins() {
        let train = SpikeTrain::from_times(vec![0.005, 0.5, 1.0]);
        let counts = train.quantized(ARRAY_SIZE);
        assert_eq!(counts.len(), ARRAY_SIZE);
        assert_eq!(counts[0], 1);
        assert_eq!(counts[49], 1);
        assert_eq!(counts[99], 1);
        assert_eq!(counts.iter().sum::<u32>(), 3);
    }

    #[test]
    fn test_weighted_accumulation() {
        let mut weighted = WeightedSpikeTrain::new();
        weighted.add(0.5, 1.0);
        weighted.add(0.2, 0.3);
        weighted.add(0.5, 2.0);
        assert_eq!(weighted.len(), 2);
        assert_eq!(weighted.entry(0), (0.2, 0.3));
        assert_eq!(weighted.entry(1), (0.5, 3.0));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_spike_train_round_trips_through_json() {
        let train = SpikeTrain::from_times(vec![0.125, 0.5, 0.875]);
        let json = serde_json::to_string(&train).unwrap();
        let restored: SpikeTrain = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, train);
    }
}
