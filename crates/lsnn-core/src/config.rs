//! Configuration-string parsing for neurons and converters
//!
//! Components are described by compact dash-separated specifications, e.g.
//! `"lif-0-1.0-0.01"`, `"unif_mem-50-0.8"` or `"avg_mem-0.8-4"`. Parsing is
//! the configuration-build step: malformed strings and out-of-range numbers
//! fail here with [`SnnError`], never during simulation.

use crate::decoder::{self, SpikeTrainToValue};
use crate::encoder::{self, ValueToSpikeTrain};
use crate::error::{Result, SnnError};
use crate::neuron::{HomeostaticLifParams, IzhikevichParams, LifParams, NeuronModel};

const TOKEN: char = '-';

/// Parse a neuron-model specification
///
/// Supported forms: `lif`, `lif-<vrest>-<vthresh>-<lambda>`, `lif_h`,
/// `lif_h-<vrest>-<vthresh>-<lambda>-<theta_inc>`, `izh`.
pub fn parse_neuron(spec: &str) -> Result<NeuronModel> {
    let values: Vec<&str> = spec.split(TOKEN).collect();
    match values[0] {
        "lif" => match values.len() {
            1 => Ok(NeuronModel::Lif(LifParams::default())),
            4 => Ok(NeuronModel::Lif(LifParams::new(
                parse_number(spec, values[1])?,
                parse_number(spec, values[2])?,
                parse_number(spec, values[3])?,
            )?)),
            _ => Err(bad_arity(spec)),
        },
        "lif_h" => match values.len() {
            1 => Ok(NeuronModel::HomeostaticLif(HomeostaticLifParams::default())),
            5 => Ok(NeuronModel::HomeostaticLif(HomeostaticLifParams::new(
                LifParams::new(
                    parse_number(spec, values[1])?,
                    parse_number(spec, values[2])?,
                    parse_number(spec, values[3])?,
                )?,
                parse_number(spec, values[4])?,
            )?)),
            _ => Err(bad_arity(spec)),
        },
        "izh" => match values.len() {
            1 => Ok(NeuronModel::Izhikevich(IzhikevichParams::default())),
            _ => Err(bad_arity(spec)),
        },
        other => Err(SnnError::invalid_config(format!(
            "unknown neuron model: {}",
            other
        ))),
    }
}

/// Parse a value-to-spike-train encoder specification
///
/// Supported forms: `unif`, `unif-<f>`, `unif_mem`, `unif_mem-<f>`,
/// `unif_mem-<f>-<memory>`.
pub fn parse_encoder(spec: &str) -> Result<ValueToSpikeTrain> {
    let values: Vec<&str> = spec.split(TOKEN).collect();
    match values[0] {
        "unif" => match values.len() {
            1 => Ok(ValueToSpikeTrain::default()),
            2 => ValueToSpikeTrain::uniform(parse_number(spec, values[1])?),
            _ => Err(bad_arity(spec)),
        },
        "unif_mem" => match values.len() {
            1 => ValueToSpikeTrain::uniform_with_memory(encoder::DEFAULT_FREQUENCY, 0.5),
            2 => ValueToSpikeTrain::uniform_with_memory(parse_number(spec, values[1])?, 0.5),
            3 => ValueToSpikeTrain::uniform_with_memory(
                parse_number(spec, values[1])?,
                parse_number(spec, values[2])?,
            ),
            _ => Err(bad_arity(spec)),
        },
        other => Err(SnnError::invalid_config(format!(
            "unknown value to spike train converter: {}",
            other
        ))),
    }
}

/// Parse a spike-train-to-value decoder specification
///
/// Supported forms: `avg`, `avg-<f>`, `avg_mem`, `avg_mem-<memory>`,
/// `avg_mem-<memory>-<bins>`.
pub fn parse_decoder(spec: &str) -> Result<SpikeTrainToValue> {
    let values: Vec<&str> = spec.split(TOKEN).collect();
    match values[0] {
        "avg" => match values.len() {
            1 => Ok(SpikeTrainToValue::default()),
            2 => SpikeTrainToValue::average_frequency(parse_number(spec, values[1])?),
            _ => Err(bad_arity(spec)),
        },
        "avg_mem" => match values.len() {
            1 => SpikeTrainToValue::moving_average(decoder::DEFAULT_FREQUENCY, 0.8, 1),
            2 => SpikeTrainToValue::moving_average(
                decoder::DEFAULT_FREQUENCY,
                parse_number(spec, values[1])?,
                1,
            ),
            3 => SpikeTrainToValue::moving_average(
                decoder::DEFAULT_FREQUENCY,
                parse_number(spec, values[1])?,
                parse_usize(spec, values[2])?,
            ),
            _ => Err(bad_arity(spec)),
        },
        other => Err(SnnError::invalid_config(format!(
            "unknown spike train to value converter: {}",
            other
        ))),
    }
}

fn parse_number(spec: &str, field: &str) -> Result<f64> {
    field.parse::<f64>().map_err(|_| {
        SnnError::invalid_config(format!("malformed number {:?} in spec {:?}", field, spec))
    })
}

fn parse_usize(spec: &str, field: &str) -> Result<usize> {
    field.parse::<usize>().map_err(|_| {
        SnnError::invalid_config(format!("malformed integer {:?} in spec {:?}", field, spec))
    })
}

fn bad_arity(spec: &str) -> SnnError {
    SnnError::invalid_config(format!("wrong number of fields in spec {:?}", spec))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_neuron_variants() {
        assert!(matches!(parse_neuron("lif").unwrap(), NeuronModel::Lif(_)));
        assert!(matches!(
            parse_neuron("lif-0-1.0-0.01").unwrap(),
            NeuronModel::Lif(_)
        ));
        assert!(matches!(
            parse_neuron("lif_h").unwrap(),
            NeuronModel::HomeostaticLif(_)
        ));
        assert!(matches!(
            parse_neuron("izh").unwrap(),
            NeuronModel::Izhikevich(_)
        ));
    }

    #[test]
    fn test_parse_neuron_rejects_garbage() {
        assert!(parse_neuron("perceptron").is_err());
        assert!(parse_neuron("lif-0-1.0").is_err());
        assert!(parse_neuron("lif-a-b-c").is_err());
        // out-of-range numbers fail at build time too
        assert!(parse_neuron("lif-1.0-0.5-0.01").is_err());
    }

    #[test]
    fn test_parse_encoder_variants() {
        assert!(matches!(
            parse_encoder("unif").unwrap(),
            ValueToSpikeTrain::Uniform { .. }
        ));
        assert!(matches!(
            parse_encoder("unif-60").unwrap(),
            ValueToSpikeTrain::Uniform { frequency } if frequency == 60.0
        ));
        assert!(matches!(
            parse_encoder("unif_mem-50-0.8").unwrap(),
            ValueToSpikeTrain::UniformWithMemory { .. }
        ));
        assert!(parse_encoder("poisson").is_err());
    }

    #[test]
    fn test_parse_decoder_variants() {
        assert!(matches!(
            parse_decoder("avg").unwrap(),
            SpikeTrainToValue::AverageFrequency { .. }
        ));
        assert!(matches!(
            parse_decoder("avg_mem-0.9-4").unwrap(),
            SpikeTrainToValue::MovingAverage { bins: 4, .. }
        ));
        assert!(parse_decoder("avg_mem-2.0").is_err());
        assert!(parse_decoder("median").is_err());
    }
}
