//! Distributed-sensing grid controller
//!
//! Each occupied grid cell owns one quantized spiking network whose first
//! `signals * 4` inputs and all-but-one outputs are per-direction signal
//! vectors exchanged with the four lattice neighbors. Signal grids are
//! double-buffered: every cell reads the neighbors' previous-step signals,
//! and the buffers are swapped once the whole step has been written, so no
//! cell ever observes a current-step value.

use crate::error::{Result, RuntimeError};
use crate::grid::{Dir, Grid};
use crate::quantized::QuantizedSpikingNetwork;
use lsnn_core::{empty_quantized, QuantizedSpikeTrain, SpikeTrainToValue, ValueToSpikeTrain};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One grid cell: a network with its sensor encoders and control decoder
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpikingCell {
    network: QuantizedSpikingNetwork,
    encoders: Vec<ValueToSpikeTrain>,
    decoder: SpikeTrainToValue,
}

impl SpikingCell {
    /// Create a cell; the network must accept `signals * 4` signal inputs
    /// ahead of the encoded sensor inputs and emit one control output ahead
    /// of `signals * 4` signal outputs
    pub fn new(
        network: QuantizedSpikingNetwork,
        encoders: Vec<ValueToSpikeTrain>,
        decoder: SpikeTrainToValue,
    ) -> Self {
        Self {
            network,
            encoders,
            decoder,
        }
    }

    /// Number of sensor readings the cell consumes per step
    pub fn sensor_count(&self) -> usize {
        self.encoders.len()
    }

    /// The cell's network
    pub fn network(&self) -> &QuantizedSpikingNetwork {
        &self.network
    }

    /// The cell's network, for state snapshots
    pub fn network_mut(&mut self) -> &mut QuantizedSpikingNetwork {
        &mut self.network
    }

    fn reset(&mut self) {
        self.network.reset();
        for encoder in &mut self.encoders {
            encoder.reset();
        }
        self.decoder.reset();
    }
}

/// Grid of independent spiking networks coupled through lattice signals
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DistributedSpikingSensing {
    /// Signal channels exchanged per direction
    signals: usize,
    cells: Grid<Option<SpikingCell>>,
    /// Signals written during the previous step, read by every cell
    last_signals: Grid<Vec<QuantizedSpikeTrain>>,
    /// Signals being written during the current step
    current_signals: Grid<Vec<QuantizedSpikeTrain>>,
    previous_time: f64,
}

impl DistributedSpikingSensing {
    /// Create a grid controller over occupied cells
    pub fn new(signals: usize, cells: Grid<Option<SpikingCell>>) -> Result<Self> {
        for (x, y, cell) in cells.iter() {
            if let Some(cell) = cell {
                let sizes = cell.network.layer_sizes();
                let expected_inputs = signals * Dir::ALL.len() + cell.encoders.len();
                let expected_outputs = 1 + signals * Dir::ALL.len();
                if sizes.first() != Some(&expected_inputs) {
                    return Err(RuntimeError::invalid_topology(format!(
                        "cell ({}, {}) needs {} network inputs, found {:?}",
                        x,
                        y,
                        expected_inputs,
                        sizes.first()
                    )));
                }
                if sizes.last() != Some(&expected_outputs) {
                    return Err(RuntimeError::invalid_topology(format!(
                        "cell ({}, {}) needs {} network outputs, found {:?}",
                        x,
                        y,
                        expected_outputs,
                        sizes.last()
                    )));
                }
            }
        }
        let last_signals = cells.map(|_, _, _| zero_signals(signals));
        let current_signals = cells.map(|_, _, _| zero_signals(signals));
        log::debug!(
            "created distributed sensing grid {}x{} with {} signals per direction",
            cells.width(),
            cells.height(),
            signals
        );
        Ok(Self {
            signals,
            cells,
            last_signals,
            current_signals,
            previous_time: 0.0,
        })
    }

    /// Signal channels exchanged per direction
    pub fn signals(&self) -> usize {
        self.signals
    }

    /// Cell at `(x, y)`, if occupied
    pub fn cell(&self, x: usize, y: usize) -> Option<&SpikingCell> {
        self.cells.get(x, y).and_then(Option::as_ref)
    }

    /// Cell at `(x, y)`, mutable, if occupied
    pub fn cell_mut(&mut self, x: usize, y: usize) -> Option<&mut SpikingCell> {
        self.cells.get_mut(x, y).and_then(Option::as_mut)
    }

    /// Run one control step over all occupied cells
    ///
    /// `readings` holds each occupied cell's sensor values; `t` must be
    /// strictly increasing across calls. Returns the decoded control value
    /// per occupied cell.
    pub fn compute_control_signals(
        &mut self,
        t: f64,
        readings: &Grid<Option<Vec<f64>>>,
    ) -> Result<Grid<Option<f64>>> {
        self.validate_readings(readings)?;
        let window = t - self.previous_time;
        let signals = self.signals;
        let width = self.cells.width();
        let last_signals = &self.last_signals;
        let step = |(index, cell): (usize, &mut Option<SpikingCell>)| -> Result<
            Option<(f64, Vec<QuantizedSpikeTrain>)>,
        > {
            let Some(cell) = cell.as_mut() else {
                return Ok(None);
            };
            let (x, y) = (index % width, index / width);
            let reading = readings
                .get(x, y)
                .and_then(|r| r.as_ref())
                .ok_or_else(|| RuntimeError::invalid_input(cell.encoders.len(), 0))?;
            let mut inputs = gather_last_signals(last_signals, signals, x, y);
            for (encoder, &value) in cell.encoders.iter_mut().zip(reading) {
                inputs.push(encoder.convert_quantized(value, window));
            }
            let mut outputs = cell.network.apply(t, &inputs)?;
            let control = cell.decoder.convert_quantized(&outputs[0], window);
            outputs.remove(0);
            Ok(Some((control, outputs)))
        };
        #[cfg(feature = "parallel")]
        let results: Vec<_> = self
            .cells
            .cells_mut()
            .par_iter_mut()
            .enumerate()
            .map(step)
            .collect();
        #[cfg(not(feature = "parallel"))]
        let results: Vec<_> = self
            .cells
            .cells_mut()
            .iter_mut()
            .enumerate()
            .map(step)
            .collect();
        let mut controls = readings.map(|_, _, _| None);
        for (index, result) in results.into_iter().enumerate() {
            if let Some((control, out_signals)) = result? {
                let (x, y) = (index % width, index / width);
                if let Some(slot) = controls.get_mut(x, y) {
                    *slot = Some(control);
                }
                if let Some(slot) = self.current_signals.get_mut(x, y) {
                    *slot = out_signals;
                }
            }
        }
        std::mem::swap(&mut self.last_signals, &mut self.current_signals);
        self.previous_time = t;
        Ok(controls)
    }

    /// Restore all cells, signal buffers and the clock to construction-time
    /// state
    pub fn reset(&mut self) {
        self.previous_time = 0.0;
        let signals = self.signals;
        for (_, _, slot) in self.last_signals.iter_mut() {
            *slot = zero_signals(signals);
        }
        for (_, _, slot) in self.current_signals.iter_mut() {
            *slot = zero_signals(signals);
        }
        for (_, _, cell) in self.cells.iter_mut() {
            if let Some(cell) = cell {
                cell.reset();
            }
        }
    }

    fn validate_readings(&self, readings: &Grid<Option<Vec<f64>>>) -> Result<()> {
        if readings.width() != self.cells.width() || readings.height() != self.cells.height() {
            return Err(RuntimeError::invalid_input(
                self.cells.width() * self.cells.height(),
                readings.width() * readings.height(),
            ));
        }
        for (x, y, cell) in self.cells.iter() {
            if let Some(cell) = cell {
                let found = readings
                    .get(x, y)
                    .and_then(|r| r.as_ref())
                    .map(Vec::len)
                    .unwrap_or(0);
                if found != cell.encoders.len() {
                    return Err(RuntimeError::invalid_input(cell.encoders.len(), found));
                }
            }
        }
        Ok(())
    }
}

fn zero_signals(signals: usize) -> Vec<QuantizedSpikeTrain> {
    vec![empty_quantized(); signals * Dir::ALL.len()]
}

/// Collect the previous-step signals facing this cell from its four
/// neighbors, rotated so a neighbor's opposite-direction block lands in
/// this cell's slot for that direction; missing neighbors contribute zeros
fn gather_last_signals(
    last_signals: &Grid<Vec<QuantizedSpikeTrain>>,
    signals: usize,
    x: usize,
    y: usize,
) -> Vec<QuantizedSpikeTrain> {
    let mut values = Vec::with_capacity(signals * Dir::ALL.len());
    for dir in Dir::ALL {
        let neighbor =
            last_signals.get_signed(x as isize + dir.dx(), y as isize + dir.dy());
        match neighbor {
            Some(trains) => {
                let start = dir.opposite().index() * signals;
                values.extend(trains[start..start + signals].iter().cloned());
            }
            None => values.extend(std::iter::repeat(empty_quantized()).take(signals)),
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::layered_neurons;
    use crate::quantized::QuantizedMultilayerSpikingNetwork;
    use lsnn_core::{NeuronModel, SpikingNeuron, ARRAY_SIZE};

    fn cell(signals: usize, sensors: usize, weight: f64) -> SpikingCell {
        let inputs = signals * 4 + sensors;
        let outputs = 1 + signals * 4;
        let sizes = [inputs, outputs];
        let neuron = SpikingNeuron::new(NeuronModel::default()).unwrap();
        let weights = vec![vec![vec![weight; outputs]; inputs]];
        let network =
            QuantizedMultilayerSpikingNetwork::new(layered_neurons(&sizes, &neuron), weights)
                .unwrap();
        SpikingCell::new(
            QuantizedSpikingNetwork::Plain(network),
            vec![ValueToSpikeTrain::default(); sensors],
            SpikeTrainToValue::default(),
        )
    }

    fn line_controller(length: usize, weight: f64) -> DistributedSpikingSensing {
        let cells = Grid::create(length, 1, |_, _| Some(cell(1, 1, weight)));
        DistributedSpikingSensing::new(1, cells).unwrap()
    }

    fn readings(grid: &DistributedSpikingSensing, values: &[f64]) -> Grid<Option<Vec<f64>>> {
        Grid::create(values.len(), 1, |x, _| {
            grid.cell(x, 0).map(|_| vec![values[x]])
        })
    }

    #[test]
    fn test_topology_validation() {
        // network sized for zero signals can not serve a one-signal grid
        let cells = Grid::create(1, 1, |_, _| Some(cell(0, 1, 0.0)));
        assert!(DistributedSpikingSensing::new(1, cells).is_err());
    }

    #[test]
    fn test_reading_shape_validation() {
        let mut controller = line_controller(2, 0.0);
        let bad = Grid::create(1, 1, |_, _| Some(vec![0.5]));
        assert!(controller.compute_control_signals(0.1, &bad).is_err());
        let missing = Grid::create(2, 1, |_, _| None::<Vec<f64>>);
        assert!(controller.compute_control_signals(0.1, &missing).is_err());
    }

    #[test]
    fn test_unoccupied_cells_are_skipped() {
        let cells = Grid::create(2, 1, |x, _| (x == 0).then(|| cell(1, 1, 0.0)));
        let mut controller = DistributedSpikingSensing::new(1, cells).unwrap();
        let readings = Grid::create(2, 1, |x, _| (x == 0).then(|| vec![0.5]));
        let controls = controller.compute_control_signals(0.1, &readings).unwrap();
        assert!(controls.get(0, 0).unwrap().is_some());
        assert!(controls.get(1, 0).unwrap().is_none());
    }

    #[test]
    fn test_signals_propagate_one_cell_per_step() {
        // strong weights so any spiking input drives every output; only
        // cell 0 is stimulated, and the value-0 encoders of the other
        // cells emit no spikes inside a 0.1 s window (minimum rate 5 Hz)
        let mut controller = line_controller(3, 10.0);
        let quiet = readings(&controller, &[0.0, 0.0, 0.0]);
        let loud = readings(&controller, &[1.0, 0.0, 0.0]);

        let step1 = controller.compute_control_signals(0.1, &loud).unwrap();
        assert!(step1.get(0, 0).unwrap().unwrap() > -1.0);
        assert_eq!(step1.get(1, 0).unwrap().unwrap(), -1.0);
        assert_eq!(step1.get(2, 0).unwrap().unwrap(), -1.0);

        // cell 1 sees cell 0's east-facing signals from the previous step
        let step2 = controller.compute_control_signals(0.2, &quiet).unwrap();
        assert!(step2.get(1, 0).unwrap().unwrap() > -1.0);
        assert_eq!(step2.get(2, 0).unwrap().unwrap(), -1.0);

        let step3 = controller.compute_control_signals(0.3, &quiet).unwrap();
        assert!(step3.get(2, 0).unwrap().unwrap() > -1.0);
    }

    #[test]
    fn test_reset_replays_identically() {
        let mut controller = line_controller(2, 2.0);
        let values = readings(&controller, &[0.8, 0.4]);
        let mut first = Vec::new();
        for step in 1..=4 {
            first.push(
                controller
                    .compute_control_signals(step as f64 * 0.1, &values)
                    .unwrap(),
            );
        }
        controller.reset();
        for step in 1..=4 {
            let replayed = controller
                .compute_control_signals(step as f64 * 0.1, &values)
                .unwrap();
            assert_eq!(replayed, first[step - 1]);
        }
    }

    #[test]
    fn test_gathered_signals_have_the_right_shape() {
        let controller = line_controller(2, 0.0);
        let gathered = gather_last_signals(&controller.last_signals, 1, 0, 0);
        assert_eq!(gathered.len(), 4);
        assert!(gathered.iter().all(|train| train.len() == ARRAY_SIZE));
    }
}
