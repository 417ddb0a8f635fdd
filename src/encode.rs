//! Data-to-visual mappings.
//!
//! Every mapping here is a free function over its inputs: ranking a value
//! against a `Thresholds` set, then projecting the rank onto a color, an
//! opacity, a stroke width or a radius. All outputs are clamped to their
//! documented ranges, and degenerate thresholds (equal boundaries) never
//! divide by zero.

use eframe::egui::Color32;
use serde::{Deserialize, Serialize};

use crate::stats::Thresholds;

pub const MIN_EDGE_WIDTH: f32 = 0.5;
pub const MAX_EDGE_WIDTH: f32 = 5.0;
pub const MIN_RADIUS: f32 = 4.0;
pub const MAX_RADIUS: f32 = 18.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    None,
    Low,
    Mid,
    High,
}

impl Tier {
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Mid => "mid",
            Self::High => "high",
        }
    }
}

/// NaN ranks as `Tier::None`, the bottom of every range.
pub fn tier_of(value: f32, thresholds: &Thresholds) -> Tier {
    if value.is_nan() || value < thresholds.p40 {
        Tier::None
    } else if value < thresholds.p60 {
        Tier::Low
    } else if value < thresholds.p80 {
        Tier::Mid
    } else {
        Tier::High
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub none: Color32,
    pub low: Color32,
    pub high: Color32,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            none: Color32::from_rgb(100, 116, 139),
            low: Color32::from_rgb(250, 204, 21),
            high: Color32::from_rgb(239, 68, 68),
        }
    }
}

pub fn color_of(value: f32, thresholds: &Thresholds) -> Color32 {
    color_of_with(value, thresholds, &Palette::default())
}

pub fn color_of_with(value: f32, thresholds: &Thresholds, palette: &Palette) -> Color32 {
    match tier_of(value, thresholds) {
        Tier::None => palette.none,
        Tier::Low => palette.low,
        Tier::Mid => {
            let span = thresholds.p80 - thresholds.p60;
            if span <= f32::EPSILON {
                return palette.high;
            }
            lerp_color(palette.low, palette.high, (value - thresholds.p60) / span)
        }
        Tier::High => palette.high,
    }
}

pub fn lerp_color(from: Color32, to: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let channel = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * amount).round() as u8;

    Color32::from_rgb(
        channel(from.r(), to.r()),
        channel(from.g(), to.g()),
        channel(from.b(), to.b()),
    )
}

/// Stroke width for an edge attribute in [0, 1].
pub fn width_of(value: f32) -> f32 {
    let value = if value.is_nan() { 0.0 } else { value };
    MIN_EDGE_WIDTH + (MAX_EDGE_WIDTH - MIN_EDGE_WIDTH) * value.clamp(0.0, 1.0)
}

/// Node radius from its connection count.
///
/// Log scaling is the usual choice: connection counts are right-skewed, and
/// a linear scale squeezes most nodes into the bottom of the range.
pub fn radius_of(connection_count: u32, max_connections: u32, use_log: bool) -> f32 {
    if max_connections == 0 {
        return MIN_RADIUS;
    }

    let count = connection_count as f32;
    let max = max_connections as f32;
    let t = if use_log {
        (count + 1.0).ln() / (max + 1.0).ln()
    } else {
        count / max
    };

    MIN_RADIUS + (MAX_RADIUS - MIN_RADIUS) * t.clamp(0.0, 1.0)
}

/// Maps a value onto [0, 1] through the same four tiers as `color_of`:
/// none -> [0, 0.25], low -> [0.25, 0.5], mid -> [0.5, 0.75],
/// high -> [0.75, 1], interpolating linearly inside each tier.
pub fn normalize_tiered(value: f32, thresholds: &Thresholds) -> f32 {
    if value.is_nan() {
        return 0.0;
    }

    let within = |lower: f32, upper: f32, degenerate: f32| {
        let span = upper - lower;
        if span <= f32::EPSILON {
            degenerate
        } else {
            ((value - lower) / span).clamp(0.0, 1.0)
        }
    };

    let normalized = match tier_of(value, thresholds) {
        Tier::None => {
            if thresholds.p40 <= 0.0 {
                0.0
            } else {
                0.25 * (value / thresholds.p40).clamp(0.0, 1.0)
            }
        }
        Tier::Low => 0.25 + 0.25 * within(thresholds.p40, thresholds.p60, 1.0),
        Tier::Mid => 0.5 + 0.25 * within(thresholds.p60, thresholds.p80, 1.0),
        Tier::High => 0.75 + 0.25 * within(thresholds.p80, thresholds.max, 1.0),
    };

    normalized.clamp(0.0, 1.0)
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpacityConfig {
    pub min_opacity: f32,
    pub max_opacity: f32,
    /// Values above 1 push near-median pressure toward `min_opacity` and
    /// leave the extremes visible.
    pub exponent: f32,
}

impl Default for OpacityConfig {
    fn default() -> Self {
        Self {
            min_opacity: 0.08,
            max_opacity: 0.9,
            exponent: 2.0,
        }
    }
}

pub fn opacity_of(pressure: f32, thresholds: &Thresholds, config: &OpacityConfig) -> f32 {
    let defaults = OpacityConfig::default();
    let min = finite_or(config.min_opacity, defaults.min_opacity).clamp(0.0, 1.0);
    let max = finite_or(config.max_opacity, defaults.max_opacity).clamp(min, 1.0);
    let exponent = if config.exponent.is_finite() && config.exponent > 0.0 {
        config.exponent
    } else {
        1.0
    };

    let normalized = normalize_tiered(pressure, thresholds);
    (min + (max - min) * normalized.powf(exponent)).clamp(min, max)
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    fn thresholds() -> Thresholds {
        Thresholds {
            p40: 0.25,
            p60: 0.5,
            p80: 0.75,
            max: 1.0,
        }
    }

    fn samples() -> Vec<f32> {
        (0..=120).map(|step| step as f32 / 100.0 - 0.1).collect()
    }

    #[test]
    fn tiers_follow_thresholds() {
        let thresholds = thresholds();
        assert_eq!(tier_of(0.1, &thresholds), Tier::None);
        assert_eq!(tier_of(0.25, &thresholds), Tier::Low);
        assert_eq!(tier_of(0.6, &thresholds), Tier::Mid);
        assert_eq!(tier_of(0.75, &thresholds), Tier::High);
        assert_eq!(tier_of(3.0, &thresholds), Tier::High);
        assert_eq!(tier_of(f32::NAN, &thresholds), Tier::None);
        assert_eq!(color_of(f32::NAN, &thresholds), Palette::default().none);
    }

    #[test]
    fn color_tiers_and_mid_interpolation() {
        let thresholds = thresholds();
        let palette = Palette::default();
        assert_eq!(color_of(0.0, &thresholds), palette.none);
        assert_eq!(color_of(0.3, &thresholds), palette.low);
        assert_eq!(color_of(0.5, &thresholds), palette.low);
        assert_eq!(
            color_of(0.625, &thresholds),
            lerp_color(palette.low, palette.high, 0.5)
        );
        assert_eq!(color_of(0.9, &thresholds), palette.high);
    }

    #[test]
    fn color_is_monotonic_in_tier_and_blend() {
        let thresholds = thresholds();
        let palette = Palette::default();
        let mut previous_tier = Tier::None;
        let mut previous_green = u8::MAX;
        for value in samples() {
            let tier = tier_of(value, &thresholds);
            assert!(tier >= previous_tier);
            if tier != previous_tier {
                previous_green = u8::MAX;
            }
            previous_tier = tier;

            // low -> high runs yellow to red, so green only ever drops in mid
            if tier == Tier::Mid {
                let green = color_of_with(value, &thresholds, &palette).g();
                assert!(green <= previous_green);
                previous_green = green;
            }
        }
    }

    #[test]
    fn degenerate_mid_tier_uses_high_color() {
        let thresholds = Thresholds {
            p40: 0.5,
            p60: 0.5,
            p80: 0.5,
            max: 0.5,
        };
        let palette = Palette::default();
        assert_eq!(color_of(0.5, &thresholds), palette.high);
        assert_eq!(color_of(0.1, &thresholds), palette.none);
        assert!(approx_eq(normalize_tiered(0.5, &thresholds), 1.0));

        let zeros = Thresholds::default();
        assert_eq!(color_of(0.0, &zeros), palette.high);
        assert!(approx_eq(normalize_tiered(0.0, &zeros), 1.0));
        assert!(approx_eq(normalize_tiered(-1.0, &zeros), 0.0));
    }

    #[test]
    fn width_endpoints_and_clamping() {
        assert!(approx_eq(width_of(0.0), 0.5));
        assert!(approx_eq(width_of(1.0), 5.0));
        assert!(approx_eq(width_of(0.5), 2.75));
        assert!(approx_eq(width_of(-2.0), 0.5));
        assert!(approx_eq(width_of(7.0), 5.0));
        assert!(approx_eq(width_of(f32::NAN), 0.5));
    }

    #[test]
    fn radius_endpoints_for_both_scales() {
        for max in [1, 2, 7, 40, 1_000] {
            assert!(approx_eq(radius_of(0, max, true), MIN_RADIUS));
            assert!(approx_eq(radius_of(max, max, true), MAX_RADIUS));
            assert!(approx_eq(radius_of(0, max, false), MIN_RADIUS));
            assert!(approx_eq(radius_of(max, max, false), MAX_RADIUS));
            assert!(approx_eq(radius_of(max * 3, max, true), MAX_RADIUS));
        }
        assert!(approx_eq(radius_of(5, 0, true), MIN_RADIUS));
    }

    #[test]
    fn log_radius_spreads_low_counts() {
        let linear = radius_of(3, 100, false);
        let log = radius_of(3, 100, true);
        assert!(log > linear);
        assert!(radius_of(10, 100, true) > radius_of(3, 100, true));
    }

    #[test]
    fn tiered_normalization_hits_tier_boundaries() {
        let thresholds = thresholds();
        assert!(approx_eq(normalize_tiered(0.0, &thresholds), 0.0));
        assert!(approx_eq(normalize_tiered(0.125, &thresholds), 0.125));
        assert!(approx_eq(normalize_tiered(0.25, &thresholds), 0.25));
        assert!(approx_eq(normalize_tiered(0.5, &thresholds), 0.5));
        assert!(approx_eq(normalize_tiered(0.625, &thresholds), 0.625));
        assert!(approx_eq(normalize_tiered(0.75, &thresholds), 0.75));
        assert!(approx_eq(normalize_tiered(1.0, &thresholds), 1.0));
        assert!(approx_eq(normalize_tiered(4.0, &thresholds), 1.0));
    }

    #[test]
    fn opacity_is_monotonic_and_bounded() {
        let thresholds = thresholds();
        let config = OpacityConfig::default();
        let mut previous = f32::NEG_INFINITY;
        for value in samples() {
            let opacity = opacity_of(value, &thresholds, &config);
            assert!(opacity >= previous - 1e-6);
            assert!(opacity >= config.min_opacity - 1e-6);
            assert!(opacity <= config.max_opacity + 1e-6);
            previous = opacity;
        }
        assert!(approx_eq(
            opacity_of(1.0, &thresholds, &config),
            config.max_opacity
        ));
        assert!(approx_eq(
            opacity_of(0.0, &thresholds, &config),
            config.min_opacity
        ));
    }

    #[test]
    fn opacity_tolerates_non_finite_config() {
        let thresholds = thresholds();
        let broken = OpacityConfig {
            min_opacity: f32::NAN,
            max_opacity: f32::INFINITY,
            exponent: f32::NAN,
        };
        let defaults = OpacityConfig::default();
        assert!(approx_eq(
            opacity_of(1.0, &thresholds, &broken),
            defaults.max_opacity
        ));
        assert!(approx_eq(
            opacity_of(0.0, &thresholds, &broken),
            defaults.min_opacity
        ));

        let inverted = OpacityConfig {
            min_opacity: 0.7,
            max_opacity: 0.2,
            ..OpacityConfig::default()
        };
        assert!(approx_eq(opacity_of(0.5, &thresholds, &inverted), 0.7));
    }

    #[test]
    fn opacity_exponent_separates_extremes() {
        let thresholds = thresholds();
        let linear = OpacityConfig {
            exponent: 1.0,
            ..OpacityConfig::default()
        };
        let curved = OpacityConfig {
            exponent: 3.0,
            ..OpacityConfig::default()
        };
        // median pressure fades, the extreme does not
        assert!(opacity_of(0.5, &thresholds, &curved) < opacity_of(0.5, &thresholds, &linear));
        assert!(approx_eq(
            opacity_of(1.0, &thresholds, &curved),
            opacity_of(1.0, &thresholds, &linear)
        ));
    }
}
