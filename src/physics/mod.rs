//! Force-directed layout engine.
//!
//! `Simulation` owns every node's kinematic state in a flat arena indexed by
//! position in `nodes`, with the `id -> index` map built once at
//! initialization. Each call to [`Simulation::step`] advances exactly one
//! tick:
//!
//! - repulsion through a Barnes-Hut quadtree, `O(n log n)` per tick with
//!   exact pairwise sums inside leaves of at most 12 nodes,
//! - soft collision between overlapping nodes, pruned by the same tree,
//! - springs along connections, shorter and stiffer as correlation rises,
//! - a pull toward the center of the layout bounds,
//! - velocity decay, then semi-implicit Euler integration.
//!
//! All forces are scaled by a cooling factor `alpha` that decays every tick,
//! so any graph reaches a calm state in a bounded number of ticks. Scaling
//! every force uniformly slows the layout without moving its equilibrium.
//! [`Simulation::reheat`] restores full strength.
//!
//! The engine never schedules itself. Callers step it once per frame (never
//! concurrently) and stop once [`Simulation::is_settled`] reports a stable
//! layout.

mod forces;
mod quadtree;

use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::encode::radius_of;
use crate::error::ConfigurationError;
use crate::model::{Connection, Endpoint, NodeRecord};
use crate::util::{phyllotaxis, stable_pair};
use forces::{Collision, Repulsion};
use quadtree::QuadTree;

/// Velocity gained per unit of force in one 60 Hz tick.
const ACCELERATION: f32 = 0.055;
const SEED_SPACING: f32 = 12.0;
/// Cooling level restored while a node is dragged.
const DRAG_ALPHA: f32 = 0.3;
const SLEEP_SPEED_SQ: f32 = 0.02 * 0.02;
const SLEEP_FORCE_SQ: f32 = 0.08 * 0.08;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub repulsion_strength: f32,
    pub softening: f32,
    /// Barnes-Hut opening angle; 0 degenerates to exact pairwise repulsion.
    pub theta: f32,
    pub spring_strength: f32,
    pub spring_damping: f32,
    /// Rest length of a fully correlated connection.
    pub link_distance_min: f32,
    /// Rest length of an uncorrelated connection.
    pub link_distance_max: f32,
    pub collision_strength: f32,
    pub collision_spacing: f32,
    pub center_pull: f32,
    /// Fraction of velocity kept per 60 Hz tick.
    pub velocity_damping: f32,
    pub max_force: f32,
    pub max_speed: f32,
    /// Fraction of `alpha` lost per 60 Hz tick.
    pub alpha_decay: f32,
    /// Floor for `alpha`.
    pub alpha_min: f32,
    /// Average kinetic energy per node below which a tick counts as calm.
    pub settle_energy: f32,
    /// Consecutive calm ticks before the layout is considered settled.
    pub settle_ticks: u32,
    /// Log-scaled node radius; also what the viewer draws.
    pub log_radius: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            repulsion_strength: 60_000.0,
            softening: 620.0,
            theta: 0.72,
            spring_strength: 0.016,
            spring_damping: 0.22,
            link_distance_min: 70.0,
            link_distance_max: 200.0,
            collision_strength: 1.2,
            collision_spacing: 1.6,
            center_pull: 0.002,
            velocity_damping: 0.9,
            max_force: 250.0,
            max_speed: 26.0,
            alpha_decay: 0.01,
            alpha_min: 0.001,
            settle_energy: 0.001,
            settle_ticks: 30,
            log_radius: true,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let non_negative = [
            ("repulsion_strength", self.repulsion_strength),
            ("theta", self.theta),
            ("spring_strength", self.spring_strength),
            ("spring_damping", self.spring_damping),
            ("collision_strength", self.collision_strength),
            ("collision_spacing", self.collision_spacing),
            ("center_pull", self.center_pull),
            ("settle_energy", self.settle_energy),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigurationError::parameter(
                    name,
                    format!("expected a finite non-negative value, got {value}"),
                ));
            }
        }

        let positive = [
            ("softening", self.softening),
            ("link_distance_min", self.link_distance_min),
            ("link_distance_max", self.link_distance_max),
            ("max_force", self.max_force),
            ("max_speed", self.max_speed),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigurationError::parameter(
                    name,
                    format!("expected a finite positive value, got {value}"),
                ));
            }
        }

        if self.link_distance_min > self.link_distance_max {
            return Err(ConfigurationError::parameter(
                "link_distance_min",
                format!(
                    "{} exceeds link_distance_max {}",
                    self.link_distance_min, self.link_distance_max
                ),
            ));
        }
        if !(self.velocity_damping > 0.0 && self.velocity_damping < 1.0) {
            return Err(ConfigurationError::parameter(
                "velocity_damping",
                format!("expected a value in (0, 1), got {}", self.velocity_damping),
            ));
        }
        for (name, value) in [("alpha_decay", self.alpha_decay), ("alpha_min", self.alpha_min)] {
            if !(0.0..1.0).contains(&value) {
                return Err(ConfigurationError::parameter(
                    name,
                    format!("expected a value in [0, 1), got {value}"),
                ));
            }
        }
        if self.settle_ticks == 0 {
            return Err(ConfigurationError::parameter(
                "settle_ticks",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    fn rest_length(&self, correlation: f32) -> f32 {
        self.link_distance_max - (self.link_distance_max - self.link_distance_min) * correlation
    }
}

/// Layout area. Centering pulls toward its midpoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Result<Self, ConfigurationError> {
        if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
            Ok(Self { width, height })
        } else {
            Err(ConfigurationError::InvalidBounds { width, height })
        }
    }

    pub fn center(self) -> Vec2 {
        vec2(self.width * 0.5, self.height * 0.5)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimNode {
    pub id: String,
    pub label: Option<String>,
    pub position: Vec2,
    pub velocity: Vec2,
    pub volatility: f32,
    pub volume: f64,
    pub connection_count: u32,
    /// Collision radius, on the same scale as the rendered radius.
    pub radius: f32,
}

impl SimNode {
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

/// Input elements dropped while binding the graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BindReport {
    pub duplicate_nodes: usize,
    pub dangling_edges: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    /// Average of `|v|² / 2` over all nodes.
    pub kinetic_energy: f32,
    pub max_speed: f32,
    pub alpha: f32,
    /// Nodes whose position or velocity went non-finite and were reset.
    pub corrected: usize,
    pub settled: bool,
}

#[derive(Default)]
struct Scratch {
    forces: Vec<Vec2>,
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    radii: Vec<f32>,
}

type TickObserver = Box<dyn FnMut(&TickReport)>;

pub struct Simulation {
    nodes: Vec<SimNode>,
    connections: Vec<Connection>,
    index_by_id: HashMap<String, usize>,
    bounds: Bounds,
    config: SimulationConfig,
    max_connections: u32,
    bind_report: BindReport,
    tick: u64,
    alpha: f32,
    calm_ticks: u32,
    scratch: Scratch,
    observers: Vec<TickObserver>,
}

impl Simulation {
    /// Builds the node arena and binds every connection to it.
    ///
    /// Nodes sharing an id keep the first occurrence. Connections whose
    /// endpoints do not resolve are dropped and counted in
    /// [`Simulation::bind_report`]. Nodes without a position are seeded on a
    /// sunflower spiral around the bounds center, so the same input always
    /// produces the same layout.
    pub fn initialize(
        nodes: Vec<NodeRecord>,
        connections: Vec<Connection>,
        bounds: Bounds,
        config: SimulationConfig,
    ) -> Result<Self, ConfigurationError> {
        let bounds = Bounds::new(bounds.width, bounds.height)?;
        config.validate()?;

        let mut bind_report = BindReport::default();
        let mut index_by_id = HashMap::with_capacity(nodes.len());
        let mut records = Vec::with_capacity(nodes.len());
        for record in nodes {
            if index_by_id.contains_key(&record.id) {
                debug!(id = %record.id, "skipping duplicate node");
                bind_report.duplicate_nodes += 1;
                continue;
            }
            index_by_id.insert(record.id.clone(), records.len());
            records.push(record);
        }

        let node_count = records.len();
        let resolve = |endpoint: &Endpoint| match endpoint {
            Endpoint::Unbound(id) => index_by_id.get(id).copied(),
            Endpoint::Bound(index) => (*index < node_count).then_some(*index),
        };

        let mut degree = vec![0u32; node_count];
        let mut bound = Vec::with_capacity(connections.len());
        for mut connection in connections {
            let (Some(source), Some(target)) =
                (resolve(&connection.source), resolve(&connection.target))
            else {
                debug!(
                    source = ?connection.source,
                    target = ?connection.target,
                    "skipping connection with a missing endpoint"
                );
                bind_report.dangling_edges += 1;
                continue;
            };

            connection.source = Endpoint::Bound(source);
            connection.target = Endpoint::Bound(target);
            degree[source] += 1;
            if source != target {
                degree[target] += 1;
            }
            bound.push(connection);
        }

        let counts = records
            .iter()
            .zip(&degree)
            .map(|(record, &degree)| record.connection_count.unwrap_or(degree))
            .collect::<Vec<_>>();
        let max_connections = counts.iter().copied().max().unwrap_or(0);

        let center = bounds.center();
        let nodes = records
            .into_iter()
            .zip(counts)
            .enumerate()
            .map(|(index, (record, connection_count))| {
                let position = record
                    .position
                    .map(|[x, y]| vec2(x, y))
                    .filter(|position| position.is_finite())
                    .unwrap_or_else(|| center + seed_offset(&record.id, index));

                SimNode {
                    position,
                    velocity: Vec2::ZERO,
                    volatility: record.volatility,
                    volume: record.volume,
                    connection_count,
                    radius: radius_of(connection_count, max_connections, config.log_radius),
                    label: record.label,
                    id: record.id,
                }
            })
            .collect::<Vec<_>>();

        debug!(
            nodes = nodes.len(),
            connections = bound.len(),
            duplicate_nodes = bind_report.duplicate_nodes,
            dangling_edges = bind_report.dangling_edges,
            "simulation initialized"
        );

        Ok(Self {
            nodes,
            connections: bound,
            index_by_id,
            bounds,
            config,
            max_connections,
            bind_report,
            tick: 0,
            alpha: 1.0,
            calm_ticks: 0,
            scratch: Scratch::default(),
            observers: Vec::new(),
        })
    }

    /// Advances the layout by one tick of `delta_seconds` (nominally 1/60)
    /// and notifies observers.
    pub fn step(&mut self, delta_seconds: f32) -> TickReport {
        let time_scale = if delta_seconds.is_finite() && delta_seconds > 0.0 {
            (delta_seconds * 60.0).clamp(0.25, 3.0)
        } else {
            1.0
        };

        self.tick += 1;
        self.alpha = (self.alpha * (1.0 - self.config.alpha_decay).powf(time_scale))
            .max(self.config.alpha_min);
        self.accumulate_forces();
        let (kinetic_energy, max_speed, corrected) = self.integrate(time_scale);

        let was_settled = self.is_settled();
        if kinetic_energy < self.config.settle_energy {
            self.calm_ticks = self.calm_ticks.saturating_add(1);
        } else {
            self.calm_ticks = 0;
        }
        let settled = self.is_settled();
        if settled && !was_settled {
            debug!(tick = self.tick, kinetic_energy, "layout settled");
        }
        if corrected > 0 {
            warn!(
                tick = self.tick,
                corrected, "reset non-finite node state after numerical instability"
            );
        }

        let report = TickReport {
            tick: self.tick,
            kinetic_energy,
            max_speed,
            alpha: self.alpha,
            corrected,
            settled,
        };
        for observer in &mut self.observers {
            observer(&report);
        }
        report
    }

    fn accumulate_forces(&mut self) {
        let config = self.config;
        let center = self.bounds.center();
        let scratch = &mut self.scratch;

        scratch.forces.clear();
        scratch.forces.resize(self.nodes.len(), Vec2::ZERO);
        scratch.positions.clear();
        scratch.positions.extend(self.nodes.iter().map(|node| node.position));
        scratch.velocities.clear();
        scratch.velocities.extend(self.nodes.iter().map(|node| {
            if node.velocity.is_finite() {
                node.velocity
            } else {
                Vec2::ZERO
            }
        }));
        scratch.radii.clear();
        scratch.radii.extend(self.nodes.iter().map(|node| node.radius));

        let forces = &mut scratch.forces;
        let positions = &scratch.positions;
        let velocities = &scratch.velocities;

        if self.nodes.len() >= 2
            && let Some(tree) = QuadTree::build(positions)
        {
            let repulsion = Repulsion {
                strength: config.repulsion_strength,
                softening: config.softening,
                theta: config.theta,
            };
            for (index, force) in forces.iter_mut().enumerate() {
                if positions[index].is_finite() {
                    *force += repulsion.accumulate(&tree, index, positions);
                }
            }

            let max_radius = scratch.radii.iter().copied().fold(0.0_f32, f32::max);
            let reach = max_radius * 2.0 * config.collision_spacing;
            if reach > 0.0 && config.collision_strength > 0.0 {
                let collision = Collision {
                    strength: config.collision_strength,
                    spacing: config.collision_spacing,
                    reach_sq: reach * reach,
                };
                collision.accumulate(&tree, &tree, true, positions, &scratch.radii, forces);
            }
        }

        for connection in &self.connections {
            let Some((from, to)) = connection.indices() else {
                continue;
            };
            if from == to {
                continue;
            }

            let delta = positions[from] - positions[to];
            let distance = delta.length();
            if !distance.is_finite() || distance <= 1e-4 {
                continue;
            }
            let direction = delta / distance;

            let correlation = if connection.correlation.is_nan() {
                0.0
            } else {
                connection.correlation.clamp(0.0, 1.0)
            };
            let stiffness = config.spring_strength * (0.35 + 0.65 * correlation);
            let stretch = (distance - config.rest_length(correlation)) * stiffness;
            let closing_speed = (velocities[from] - velocities[to]).dot(direction);
            let correction = direction * (stretch + closing_speed * config.spring_damping);

            forces[from] -= correction;
            forces[to] += correction;
        }

        for (force, position) in forces.iter_mut().zip(positions) {
            *force -= (*position - center) * config.center_pull;
        }
    }

    /// Semi-implicit Euler: velocity from force, then position from the new
    /// velocity. Returns `(kinetic_energy, max_speed, corrected)`.
    fn integrate(&mut self, time_scale: f32) -> (f32, f32, usize) {
        let config = self.config;
        let damping = config.velocity_damping.powf(time_scale);
        let max_force_sq = config.max_force * config.max_force;
        let max_speed_sq = config.max_speed * config.max_speed;
        let center = self.bounds.center();

        let mut energy = 0.0_f32;
        let mut max_speed_sq_seen = 0.0_f32;
        let mut corrected = 0usize;
        for (index, node) in self.nodes.iter_mut().enumerate() {
            let mut force = self.scratch.forces[index] * self.alpha;
            let force_sq = force.length_sq();
            if force_sq > max_force_sq {
                force *= config.max_force / force_sq.sqrt();
            }

            let mut velocity = (node.velocity + force * (ACCELERATION * time_scale)) * damping;
            let mut speed_sq = velocity.length_sq();
            if speed_sq > max_speed_sq {
                velocity *= config.max_speed / speed_sq.sqrt();
                speed_sq = max_speed_sq;
            }
            if speed_sq < SLEEP_SPEED_SQ && force_sq < SLEEP_FORCE_SQ {
                velocity = Vec2::ZERO;
                speed_sq = 0.0;
            }

            let position = node.position + velocity * time_scale;
            if velocity.is_finite() && position.is_finite() {
                node.velocity = velocity;
                node.position = position;
            } else {
                let previous = self.scratch.positions[index];
                node.velocity = Vec2::ZERO;
                node.position = if previous.is_finite() {
                    previous
                } else {
                    center + seed_offset(&node.id, index)
                };
                speed_sq = 0.0;
                corrected += 1;
            }

            energy += speed_sq * 0.5;
            max_speed_sq_seen = max_speed_sq_seen.max(speed_sq);
        }

        let average = if self.nodes.is_empty() {
            0.0
        } else {
            energy / self.nodes.len() as f32
        };
        (average, max_speed_sq_seen.sqrt(), corrected)
    }

    pub fn is_settled(&self) -> bool {
        self.calm_ticks >= self.config.settle_ticks
    }

    /// Moves the centering target. Positions and velocities are kept; a
    /// settled layout wakes up to drift toward the new center.
    pub fn resize(&mut self, width: f32, height: f32) -> Result<(), ConfigurationError> {
        let bounds = Bounds::new(width, height)?;
        if bounds != self.bounds {
            self.bounds = bounds;
            self.reheat();
        }
        Ok(())
    }

    /// Restores full force strength and clears the settled state.
    pub fn reheat(&mut self) {
        self.warm(1.0);
    }

    /// Switches between log and linear radius scaling. Collision uses the
    /// new radii on the next tick, so a change wakes the layout.
    pub fn set_log_radius(&mut self, use_log: bool) {
        if self.config.log_radius == use_log {
            return;
        }

        self.config.log_radius = use_log;
        for node in &mut self.nodes {
            node.radius = radius_of(node.connection_count, self.max_connections, use_log);
        }
        self.reheat();
    }

    fn warm(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha);
        self.calm_ticks = 0;
    }

    /// Places a node directly, e.g. while it is being dragged. Non-finite
    /// positions are ignored.
    pub fn set_position(&mut self, id: &str, position: Vec2) -> bool {
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };
        if !position.is_finite() {
            return false;
        }

        let node = &mut self.nodes[index];
        node.position = position;
        node.velocity = Vec2::ZERO;
        self.warm(DRAG_ALPHA);
        true
    }

    /// Registers a callback run after every tick.
    pub fn subscribe(&mut self, observer: impl FnMut(&TickReport) + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn positions(&self) -> impl Iterator<Item = (&str, Vec2)> {
        self.nodes
            .iter()
            .map(|node| (node.id.as_str(), node.position))
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    /// Bound connections only; every endpoint is `Endpoint::Bound`.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&SimNode> {
        self.node_index(id).map(|index| &self.nodes[index])
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections
    }

    pub fn bind_report(&self) -> BindReport {
        self.bind_report
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

fn seed_offset(id: &str, index: usize) -> Vec2 {
    let (jx, jy) = stable_pair(id);
    phyllotaxis(index, SEED_SPACING) + vec2(jx, jy) * 0.5
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn bounds() -> Bounds {
        Bounds::new(800.0, 600.0).expect("bounds")
    }

    fn cycle(count: usize, correlation: f32) -> (Vec<NodeRecord>, Vec<Connection>) {
        let nodes = (0..count)
            .map(|index| NodeRecord::new(format!("m{index}")))
            .collect();
        let connections = (0..count)
            .map(|index| {
                Connection::new(format!("m{index}"), format!("m{}", (index + 1) % count))
                    .with_correlation(correlation)
            })
            .collect();
        (nodes, connections)
    }

    fn cycle_simulation() -> Simulation {
        let (nodes, connections) = cycle(5, 1.0);
        Simulation::initialize(nodes, connections, bounds(), SimulationConfig::default())
            .expect("simulation")
    }

    #[test]
    fn rejects_non_positive_bounds() {
        for (width, height) in [(0.0, 100.0), (100.0, -1.0), (f32::NAN, 10.0)] {
            let result = Simulation::initialize(
                Vec::new(),
                Vec::new(),
                Bounds { width, height },
                SimulationConfig::default(),
            );
            assert!(matches!(
                result,
                Err(ConfigurationError::InvalidBounds { .. })
            ));
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let config = SimulationConfig {
            velocity_damping: 1.5,
            ..SimulationConfig::default()
        };
        let result = Simulation::initialize(Vec::new(), Vec::new(), bounds(), config);
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidParameter {
                name: "velocity_damping",
                ..
            })
        ));

        let config = SimulationConfig {
            link_distance_min: 300.0,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn duplicate_nodes_keep_the_first_occurrence() {
        let mut first = NodeRecord::new("a");
        first.volatility = 0.1;
        let mut second = NodeRecord::new("a");
        second.volatility = 0.9;

        let simulation = Simulation::initialize(
            vec![first, NodeRecord::new("b"), second],
            Vec::new(),
            bounds(),
            SimulationConfig::default(),
        )
        .expect("simulation");

        assert_eq!(simulation.nodes().len(), 2);
        assert_eq!(simulation.node("a").map(|node| node.volatility), Some(0.1));
        assert_eq!(simulation.bind_report().duplicate_nodes, 1);
    }

    #[test]
    fn dangling_connections_are_dropped() {
        let simulation = Simulation::initialize(
            vec![NodeRecord::new("a"), NodeRecord::new("b")],
            vec![
                Connection::new("a", "b").with_pressure(0.4),
                Connection::new("a", "ghost"),
                Connection::new("ghost", "b"),
            ],
            bounds(),
            SimulationConfig::default(),
        )
        .expect("dangling edges are not fatal");

        assert_eq!(simulation.connections().len(), 1);
        assert_eq!(simulation.connections()[0].indices(), Some((0, 1)));
        assert_eq!(simulation.bind_report().dangling_edges, 2);
        assert_eq!(simulation.node("a").map(|node| node.connection_count), Some(1));
        assert_eq!(simulation.max_connections(), 1);
    }

    #[test]
    fn binding_rewrites_endpoints_to_arena_indices() {
        let simulation = cycle_simulation();
        for connection in simulation.connections() {
            assert!(matches!(connection.source, Endpoint::Bound(_)));
            assert!(matches!(connection.target, Endpoint::Bound(_)));
        }
        assert_eq!(simulation.connections()[4].indices(), Some((4, 0)));
        assert_eq!(simulation.node_index("m3"), Some(3));
    }

    #[test]
    fn seeding_is_deterministic_and_keeps_given_positions() {
        let mut pinned = NodeRecord::new("fixed");
        pinned.position = Some([5.0, 6.0]);
        let build = || {
            let (mut nodes, connections) = cycle(5, 0.5);
            nodes.push(pinned.clone());
            Simulation::initialize(nodes, connections, bounds(), SimulationConfig::default())
                .expect("simulation")
        };

        let first = build();
        let second = build();
        assert_eq!(
            first.positions().collect::<Vec<_>>(),
            second.positions().collect::<Vec<_>>()
        );
        assert_eq!(first.node("fixed").map(|node| node.position), Some(vec2(5.0, 6.0)));
        assert!(first.nodes().iter().all(|node| node.velocity == Vec2::ZERO));
        for node in first.nodes() {
            if node.id != "fixed" {
                assert!((node.position - bounds().center()).length() < 40.0);
            }
        }
    }

    #[test]
    fn cycle_converges_and_settles() {
        let mut simulation = cycle_simulation();
        let mut energies = Vec::new();
        while !simulation.is_settled() {
            assert!(simulation.tick_count() < 2_000, "layout never settled");
            energies.push(simulation.step(1.0 / 60.0).kinetic_energy);
        }

        let window = 20.min(energies.len() / 2).max(1);
        let early = energies[..window].iter().sum::<f32>() / window as f32;
        let late = energies[energies.len() - window..].iter().sum::<f32>() / window as f32;
        assert!(late < early, "energy did not decay: {early} -> {late}");

        let positions = simulation.nodes().iter().map(|node| node.position).collect::<Vec<_>>();
        for index in 0..positions.len() {
            let next = (index + 1) % positions.len();
            let spacing = (positions[index] - positions[next]).length();
            assert!(spacing > 30.0 && spacing < 400.0, "edge length {spacing}");
        }
    }

    #[test]
    fn resize_keeps_state_and_wakes_the_layout() {
        let mut simulation = cycle_simulation();
        for _ in 0..2_000 {
            if simulation.is_settled() {
                break;
            }
            simulation.step(1.0 / 60.0);
        }
        assert!(simulation.is_settled());

        let before = simulation.positions().map(|(_, position)| position).collect::<Vec<_>>();
        simulation.resize(1200.0, 900.0).expect("resize");
        assert!(!simulation.is_settled());
        assert_eq!(simulation.bounds().center(), vec2(600.0, 450.0));
        assert_eq!(
            simulation.positions().map(|(_, position)| position).collect::<Vec<_>>(),
            before
        );

        assert!(simulation.resize(0.0, 10.0).is_err());
        assert_eq!(simulation.bounds().width, 1200.0);
    }

    #[test]
    fn radius_scale_switch_rescales_and_wakes_the_layout() {
        let nodes = ["hub", "a", "b", "c"].map(NodeRecord::new).to_vec();
        let connections = ["a", "b", "c"]
            .map(|leaf| Connection::new("hub", leaf))
            .to_vec();
        let mut simulation =
            Simulation::initialize(nodes, connections, bounds(), SimulationConfig::default())
                .expect("simulation");
        for _ in 0..2_000 {
            if simulation.is_settled() {
                break;
            }
            simulation.step(1.0 / 60.0);
        }
        assert!(simulation.is_settled());

        let leaf_log = simulation.node("a").map(|node| node.radius);
        simulation.set_log_radius(true);
        assert!(simulation.is_settled());

        simulation.set_log_radius(false);
        assert!(!simulation.is_settled());
        assert!(!simulation.config().log_radius);
        let leaf_linear = simulation.node("a").map(|node| node.radius);
        assert_eq!(leaf_linear, Some(radius_of(1, 3, false)));
        assert!(leaf_linear < leaf_log);
        assert_eq!(simulation.node("hub").map(|node| node.radius), Some(radius_of(3, 3, false)));
    }

    #[test]
    fn non_finite_state_is_reset_instead_of_propagated() {
        let mut simulation = cycle_simulation();
        simulation.nodes[2].velocity = vec2(f32::NAN, 0.0);
        simulation.nodes[3].position = vec2(f32::INFINITY, 1.0);

        let mut corrected = 0;
        for _ in 0..5 {
            corrected += simulation.step(1.0 / 60.0).corrected;
        }
        assert!(corrected >= 1);
        for node in simulation.nodes() {
            assert!(node.position.is_finite(), "{} at {:?}", node.id, node.position);
            assert!(node.velocity.is_finite());
        }
    }

    #[test]
    fn observers_see_every_tick() {
        let mut simulation = cycle_simulation();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        simulation.subscribe(move |report| sink.borrow_mut().push(report.tick));

        simulation.step(1.0 / 60.0);
        simulation.step(1.0 / 60.0);
        simulation.step(f32::NAN);
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn dragging_a_node_moves_it_and_reheats() {
        let mut simulation = cycle_simulation();
        assert!(simulation.set_position("m0", vec2(10.0, 10.0)));
        assert_eq!(simulation.node("m0").map(|node| node.position), Some(vec2(10.0, 10.0)));
        assert!(!simulation.set_position("m0", vec2(f32::NAN, 0.0)));
        assert!(!simulation.set_position("missing", vec2(0.0, 0.0)));
    }

    #[test]
    fn empty_graph_steps_and_settles() {
        let mut simulation =
            Simulation::initialize(Vec::new(), Vec::new(), bounds(), SimulationConfig::default())
                .expect("simulation");
        for _ in 0..SimulationConfig::default().settle_ticks {
            let report = simulation.step(1.0 / 60.0);
            assert_eq!(report.kinetic_energy, 0.0);
        }
        assert!(simulation.is_settled());
    }
}
