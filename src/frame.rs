//! Per-tick snapshot of everything the viewer paints.

use eframe::egui::{Color32, Vec2};
use serde::{Deserialize, Serialize};

use crate::encode::{OpacityConfig, Tier, color_of, opacity_of, tier_of, width_of};
use crate::physics::Simulation;
use crate::stats::DatasetThresholds;
use crate::viewport::{ViewTransform, Viewport};

const EDGE_COLOR: Color32 = Color32::from_rgb(148, 163, 184);

/// Node radius is not here: it comes from `SimNode::radius`, so the drawn
/// circle always matches the collision circle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    pub opacity: OpacityConfig,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeVisual {
    /// Index into `Simulation::nodes`.
    pub index: usize,
    /// Layout coordinates; apply `Frame::transform` to draw.
    pub position: Vec2,
    pub color: Color32,
    pub radius: f32,
    pub tier: Tier,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeVisual {
    pub source: usize,
    pub target: usize,
    pub from: Vec2,
    pub to: Vec2,
    /// Stroke color with `opacity` already applied.
    pub color: Color32,
    pub width: f32,
    pub opacity: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub nodes: Vec<NodeVisual>,
    pub edges: Vec<EdgeVisual>,
    pub transform: ViewTransform,
}

/// Re-derives every visual attribute from the current simulation state.
/// Edge width encodes correlation, edge opacity encodes pressure and node
/// color encodes volatility.
pub fn encode_frame(
    simulation: &Simulation,
    thresholds: &DatasetThresholds,
    config: &EncodingConfig,
    viewport: &Viewport,
) -> Frame {
    let nodes = simulation.nodes();

    let node_visuals = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| NodeVisual {
            index,
            position: node.position,
            color: color_of(node.volatility, &thresholds.volatility),
            radius: node.radius,
            tier: tier_of(node.volatility, &thresholds.volatility),
        })
        .collect();

    let edge_visuals = simulation
        .connections()
        .iter()
        .filter_map(|connection| {
            let (source, target) = connection.indices()?;
            let opacity = opacity_of(connection.pressure, &thresholds.pressure, &config.opacity);
            Some(EdgeVisual {
                source,
                target,
                from: nodes[source].position,
                to: nodes[target].position,
                color: EDGE_COLOR.gamma_multiply(opacity),
                width: width_of(connection.correlation),
                opacity,
            })
        })
        .collect();

    Frame {
        nodes: node_visuals,
        edges: edge_visuals,
        transform: viewport.transform(),
    }
}
