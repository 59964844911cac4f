//! Property tests for weight management and structural serialization

use lsnn_core::{NeuronModel, SpikingNeuron, ValueToSpikeTrain};
use lsnn_runtime::network::{count_weights, layered_neurons, unflat_weights};
use lsnn_runtime::LearningMultilayerSpikingNetwork;
use proptest::prelude::*;

fn lif() -> SpikingNeuron {
    SpikingNeuron::new(NeuronModel::default()).unwrap()
}

fn learning_network(
    layer_sizes: &[usize],
    flat: &[f64],
) -> LearningMultilayerSpikingNetwork {
    let weights = unflat_weights(flat, layer_sizes).unwrap();
    LearningMultilayerSpikingNetwork::with_default_rules(
        layered_neurons(layer_sizes, &lif()),
        weights,
    )
    .unwrap()
}

proptest! {
    #[test]
    fn clipping_keeps_every_weight_inside_the_bound(
        seed_weights in proptest::collection::vec(-3.0f64..3.0, 4),
        bound in 0.1f64..2.0,
        steps in 1usize..8,
    ) {
        let mut net = learning_network(&[1, 2, 1], &seed_weights);
        net.enable_weights_clipping(bound);
        let mut encoder = ValueToSpikeTrain::default();
        for step in 1..=steps {
            let t = step as f64 * 0.1;
            let inputs = vec![encoder.convert(1.0, 0.1)];
            net.apply(t, &inputs).unwrap();
            for layer in net.weights() {
                for row in layer {
                    for &w in row {
                        prop_assert!(w.abs() <= bound);
                    }
                }
            }
        }
    }

    #[test]
    fn flat_weight_roundtrip_is_lossless(
        sizes in proptest::collection::vec(1usize..5, 2..5),
    ) {
        let flat: Vec<f64> = (0..count_weights(&sizes)).map(|i| i as f64 * 0.5).collect();
        let weights = unflat_weights(&flat, &sizes).unwrap();
        prop_assert_eq!(weights.len(), sizes.len() - 1);
        for (layer_index, layer) in weights.iter().enumerate() {
            prop_assert_eq!(layer.len(), sizes[layer_index]);
            for row in layer {
                prop_assert_eq!(row.len(), sizes[layer_index + 1]);
            }
        }
        prop_assert_eq!(lsnn_runtime::network::flat_weights(&weights), flat);
    }
}

#[cfg(feature = "serde")]
mod serialization {
    use super::*;
    use lsnn_runtime::{
        Grid, QuantizedLearningMultilayerSpikingNetwork, StdpRule, SymmetricParams,
    };

    #[test]
    fn learning_network_round_trips_through_json() {
        let net = learning_network(&[2, 2, 1], &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        let json = serde_json::to_string(&net).unwrap();
        let restored: LearningMultilayerSpikingNetwork = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, net);
    }

    #[test]
    fn quantized_learning_network_round_trips_through_json() {
        let rules = vec![vec![vec![
            StdpRule::SymmetricHebbian(SymmetricParams::default());
            1
        ]]];
        let net = QuantizedLearningMultilayerSpikingNetwork::new(
            layered_neurons(&[1, 1], &lif()),
            vec![vec![vec![0.7]]],
            rules,
        )
        .unwrap();
        let json = serde_json::to_string(&net).unwrap();
        let restored: QuantizedLearningMultilayerSpikingNetwork =
            serde_json::from_str(&json).unwrap();
        assert_eq!(restored, net);
    }

    #[test]
    fn replay_from_deserialized_state_matches_the_original() {
        // persist before driving, then replay the same schedule on the
        // restored instance
        let mut original = learning_network(&[1, 2, 1], &[1.0, 1.2, 0.8, 0.9]);
        let json = serde_json::to_string(&original).unwrap();
        let mut restored: LearningMultilayerSpikingNetwork =
            serde_json::from_str(&json).unwrap();

        let inputs = vec![lsnn_core::SpikeTrain::from_times(vec![0.2, 0.5, 0.8])];
        for step in 1..=10 {
            let t = step as f64 * 0.1;
            let a = original.apply(t, &inputs).unwrap();
            let b = restored.apply(t, &inputs).unwrap();
            assert_eq!(a, b);
            assert_eq!(original.weights(), restored.weights());
        }
    }

    #[test]
    fn grids_round_trip_through_json() {
        let grid = Grid::create(3, 2, |x, y| (x + 10 * y) as f64);
        let json = serde_json::to_string(&grid).unwrap();
        let restored: Grid<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, grid);
    }
}
