//! Percentile thresholds over one numeric attribute.
//!
//! Thresholds are computed once per dataset and never patched; a new dataset
//! means a new `Thresholds` value.

use crate::physics::Simulation;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Thresholds {
    pub p40: f32,
    pub p60: f32,
    pub p80: f32,
    pub max: f32,
}

impl Thresholds {
    /// Non-finite samples are ignored. An empty (or all non-finite) sample
    /// yields all-zero thresholds.
    pub fn compute(samples: impl IntoIterator<Item = f32>) -> Self {
        let mut sorted = samples
            .into_iter()
            .filter(|value| value.is_finite())
            .collect::<Vec<_>>();
        if sorted.is_empty() {
            return Self::default();
        }

        sorted.sort_by(f32::total_cmp);
        Self {
            p40: percentile(&sorted, 40.0),
            p60: percentile(&sorted, 60.0),
            p80: percentile(&sorted, 80.0),
            max: sorted[sorted.len() - 1],
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.max <= self.p40
    }
}

/// Percentile of an ascending slice, interpolating linearly between the two
/// nearest ranks (rank = p/100 * (n - 1)).
pub fn percentile(sorted: &[f32], p: f32) -> f32 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        len => {
            let rank = (p.clamp(0.0, 100.0) / 100.0) * (len - 1) as f32;
            let lower = rank.floor() as usize;
            let upper = (lower + 1).min(len - 1);
            let fraction = rank - lower as f32;
            sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
        }
    }
}

/// One threshold set per encoded attribute. Node color reads `volatility`,
/// edge opacity reads `pressure`.
///
/// Computed over the bound graph, so duplicate nodes and dangling
/// connections dropped by `Simulation::initialize` never shift the tiers.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DatasetThresholds {
    pub volatility: Thresholds,
    pub pressure: Thresholds,
}

impl DatasetThresholds {
    pub fn from_simulation(simulation: &Simulation) -> Self {
        Self {
            volatility: Thresholds::compute(
                simulation.nodes().iter().map(|node| node.volatility),
            ),
            pressure: Thresholds::compute(
                simulation
                    .connections()
                    .iter()
                    .map(|connection| connection.pressure),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{Tier, tier_of};
    use crate::model::{Connection, NodeRecord};
    use crate::physics::{Bounds, SimulationConfig};

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn empty_input_yields_zero_thresholds() {
        assert_eq!(Thresholds::compute(Vec::new()), Thresholds::default());
        assert_eq!(
            Thresholds::compute([f32::NAN, f32::INFINITY]),
            Thresholds::default()
        );
    }

    #[test]
    fn percentiles_interpolate_between_ranks() {
        let thresholds = Thresholds::compute([0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        // rank 2.0, 3.0, 4.0 over six samples
        assert!(approx_eq(thresholds.p40, 2.0));
        assert!(approx_eq(thresholds.p60, 3.0));
        assert!(approx_eq(thresholds.p80, 4.0));
        assert!(approx_eq(thresholds.max, 5.0));

        let sorted = [10.0, 20.0];
        assert!(approx_eq(percentile(&sorted, 40.0), 14.0));
        assert!(approx_eq(percentile(&sorted, 100.0), 20.0));
        assert!(approx_eq(percentile(&[7.0], 80.0), 7.0));
    }

    #[test]
    fn thresholds_are_ordered_regardless_of_input_order() {
        let samples = [
            0.91, 0.02, 0.5, 0.33, 0.33, 0.77, 0.0, 1.0, 0.12, 0.64, 0.5, 0.48,
        ];
        let thresholds = Thresholds::compute(samples);
        assert!(thresholds.p40 <= thresholds.p60);
        assert!(thresholds.p60 <= thresholds.p80);
        assert!(thresholds.p80 <= thresholds.max);
        assert!(approx_eq(thresholds.max, 1.0));

        let mut reversed = samples;
        reversed.reverse();
        assert_eq!(Thresholds::compute(reversed), thresholds);
    }

    #[test]
    fn dataset_thresholds_ignore_dropped_elements() {
        let mut a = NodeRecord::new("a");
        a.volatility = 0.1;
        let mut b = NodeRecord::new("b");
        b.volatility = 0.2;
        let mut duplicate = NodeRecord::new("a");
        duplicate.volatility = 0.9;

        let simulation = Simulation::initialize(
            vec![a, b, duplicate],
            vec![
                Connection::new("a", "b").with_pressure(0.1),
                Connection::new("a", "ghost").with_pressure(1.0),
            ],
            Bounds::new(400.0, 300.0).expect("bounds"),
            SimulationConfig::default(),
        )
        .expect("simulation");
        let thresholds = DatasetThresholds::from_simulation(&simulation);

        assert!(approx_eq(thresholds.volatility.p40, 0.14));
        assert!(approx_eq(thresholds.volatility.p60, 0.16));
        assert!(approx_eq(thresholds.volatility.p80, 0.18));
        assert!(approx_eq(thresholds.volatility.max, 0.2));

        assert!(approx_eq(thresholds.pressure.p40, 0.1));
        assert!(approx_eq(thresholds.pressure.max, 0.1));
        assert_eq!(tier_of(0.1, &thresholds.pressure), Tier::High);
    }

    #[test]
    fn constant_samples_are_degenerate() {
        let thresholds = Thresholds::compute([0.4; 9]);
        assert!(approx_eq(thresholds.p40, 0.4));
        assert!(approx_eq(thresholds.max, 0.4));
        assert!(thresholds.is_degenerate());
    }
}
