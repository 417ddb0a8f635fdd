use std::collections::hash_map::DefaultHasher;
use std::f32::consts::PI;
use std::hash::{Hash, Hasher};

use eframe::egui::{Vec2, vec2};

/// Traded volume with a thousands suffix, e.g. `$12.50K`.
pub fn format_volume(volume: f64) -> String {
    const UNITS: [&str; 4] = ["", "K", "M", "B"];

    if !volume.is_finite() || volume <= 0.0 {
        return "$0".to_owned();
    }

    let mut value = volume;
    let mut unit = 0usize;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    if unit == 0 {
        format!("${value:.0}")
    } else {
        format!("${value:.2}{}", UNITS[unit])
    }
}

/// Deterministic pair in [-1, 1]² derived from an id, stable across runs.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

/// Offset of the `index`-th seed on a sunflower spiral.
pub fn phyllotaxis(index: usize, spacing: f32) -> Vec2 {
    let golden_angle = PI * (3.0 - 5.0_f32.sqrt());
    let radius = spacing * (0.5 + index as f32).sqrt();
    let angle = index as f32 * golden_angle;
    vec2(angle.cos(), angle.sin()) * radius
}
