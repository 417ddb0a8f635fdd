use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadTree;

const MIN_SEPARATION: f32 = 1e-4;

/// Unit vector from `b` to `a`. Coincident points get a fixed direction per
/// pair so they still separate.
fn direction_between(a: Vec2, b: Vec2, first: usize, second: usize) -> (Vec2, f32) {
    let delta = a - b;
    let distance = delta.length();
    if distance > MIN_SEPARATION {
        return (delta / distance, distance);
    }

    let angle = ((first as f32) * 0.618_034 + (second as f32) * 0.414_214) * TAU;
    (vec2(angle.cos(), angle.sin()), 0.0)
}

#[derive(Clone, Copy)]
pub(super) struct Repulsion {
    pub(super) strength: f32,
    pub(super) softening: f32,
    pub(super) theta: f32,
}

impl Repulsion {
    fn magnitude(self, mass: f32, distance_sq: f32) -> f32 {
        self.strength * mass / (distance_sq + self.softening)
    }

    /// Adds the repulsion felt by node `index` from everything in `tree`.
    /// Cells that are far enough away relative to their size act as a single
    /// body at their centroid.
    pub(super) fn accumulate(self, tree: &QuadTree, index: usize, positions: &[Vec2]) -> Vec2 {
        if tree.mass <= 0.0 {
            return Vec2::ZERO;
        }

        let point = positions[index];
        if tree.is_leaf() {
            return tree
                .members
                .iter()
                .filter(|&&other| other != index)
                .map(|&other| {
                    let (direction, distance) =
                        direction_between(point, positions[other], index, other);
                    direction * self.magnitude(1.0, distance * distance)
                })
                .fold(Vec2::ZERO, |sum, force| sum + force);
        }

        let delta = point - tree.centroid;
        let distance_sq = delta.length_sq().max(MIN_SEPARATION);
        let distance = distance_sq.sqrt();
        let far_enough = !tree.square.contains(point) && tree.square.side() / distance < self.theta;
        if far_enough {
            return (delta / distance) * self.magnitude(tree.mass, distance_sq);
        }

        tree.children()
            .map(|child| self.accumulate(child, index, positions))
            .fold(Vec2::ZERO, |sum, force| sum + force)
    }
}

#[derive(Clone, Copy)]
pub(super) struct Collision {
    pub(super) strength: f32,
    /// Multiplier on the summed radii below which two nodes overlap.
    pub(super) spacing: f32,
    pub(super) reach_sq: f32,
}

impl Collision {
    fn resolve_pair(
        self,
        from: usize,
        to: usize,
        positions: &[Vec2],
        radii: &[f32],
        forces: &mut [Vec2],
    ) {
        let (direction, distance) = direction_between(positions[from], positions[to], from, to);
        let min_distance = (radii[from] + radii[to]) * self.spacing;
        if distance < min_distance {
            let push = direction * ((min_distance - distance) * self.strength);
            forces[from] += push;
            forces[to] -= push;
        }
    }

    /// Pushes overlapping nodes apart. Walks pairs of cells and prunes any
    /// pair whose squares are further apart than the largest possible
    /// overlap distance.
    pub(super) fn accumulate(
        self,
        a: &QuadTree,
        b: &QuadTree,
        same: bool,
        positions: &[Vec2],
        radii: &[f32],
        forces: &mut [Vec2],
    ) {
        if a.square.gap_sq(b.square) > self.reach_sq {
            return;
        }

        match (a.is_leaf(), b.is_leaf()) {
            (true, true) => {
                if same {
                    for (offset, &from) in a.members.iter().enumerate() {
                        for &to in &a.members[offset + 1..] {
                            self.resolve_pair(from, to, positions, radii, forces);
                        }
                    }
                } else {
                    for &from in &a.members {
                        for &to in &b.members {
                            self.resolve_pair(from, to, positions, radii, forces);
                        }
                    }
                }
            }
            _ if same => {
                let children = a.children().collect::<Vec<_>>();
                for (offset, first) in children.iter().enumerate() {
                    self.accumulate(first, first, true, positions, radii, forces);
                    for second in &children[offset + 1..] {
                        self.accumulate(first, second, false, positions, radii, forces);
                    }
                }
            }
            (false, true) => {
                for child in a.children() {
                    self.accumulate(child, b, false, positions, radii, forces);
                }
            }
            (true, false) => {
                for child in b.children() {
                    self.accumulate(a, child, false, positions, radii, forces);
                }
            }
            (false, false) => {
                if a.square.half >= b.square.half {
                    for child in a.children() {
                        self.accumulate(child, b, false, positions, radii, forces);
                    }
                } else {
                    for child in b.children() {
                        self.accumulate(a, child, false, positions, radii, forces);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scattered(count: usize) -> Vec<Vec2> {
        (0..count)
            .map(|index| {
                let angle = index as f32 * 2.399_963;
                let radius = 12.0 * (index as f32 + 0.5).sqrt();
                vec2(angle.cos() * radius, angle.sin() * radius)
            })
            .collect()
    }

    /// Exact net repulsion plus the sum of the individual magnitudes.
    fn brute_force_repulsion(
        repulsion: Repulsion,
        index: usize,
        positions: &[Vec2],
    ) -> (Vec2, f32) {
        (0..positions.len())
            .filter(|&other| other != index)
            .map(|other| {
                let (direction, distance) =
                    direction_between(positions[index], positions[other], index, other);
                direction * repulsion.magnitude(1.0, distance * distance)
            })
            .fold((Vec2::ZERO, 0.0), |(sum, total), force| {
                (sum + force, total + force.length())
            })
    }

    #[test]
    fn barnes_hut_tracks_exact_repulsion() {
        let positions = scattered(200);
        let tree = QuadTree::build(&positions).expect("tree");
        let repulsion = Repulsion {
            strength: 1_000.0,
            softening: 50.0,
            theta: 0.72,
        };

        for index in [0, 17, 99, 199] {
            let approximate = repulsion.accumulate(&tree, index, &positions);
            let (exact, total) = brute_force_repulsion(repulsion, index, &positions);
            let error = (approximate - exact).length();
            assert!(
                error <= total * 0.1,
                "node {index}: {approximate:?} vs {exact:?}"
            );
        }
    }

    #[test]
    fn collision_matches_pairwise_check() {
        let positions = scattered(80);
        let radii = vec![6.0; positions.len()];
        let tree = QuadTree::build(&positions).expect("tree");
        let collision = Collision {
            strength: 1.0,
            spacing: 2.0,
            reach_sq: 24.0 * 24.0,
        };

        let mut forces = vec![Vec2::ZERO; positions.len()];
        collision.accumulate(&tree, &tree, true, &positions, &radii, &mut forces);

        let mut expected = vec![Vec2::ZERO; positions.len()];
        for from in 0..positions.len() {
            for to in (from + 1)..positions.len() {
                collision.resolve_pair(from, to, &positions, &radii, &mut expected);
            }
        }

        for (got, want) in forces.iter().zip(&expected) {
            assert!((*got - *want).length() < 1e-3, "{got:?} vs {want:?}");
        }
    }

    #[test]
    fn coincident_nodes_are_pushed_apart() {
        let positions = vec![vec2(1.0, 1.0), vec2(1.0, 1.0)];
        let radii = vec![5.0, 5.0];
        let tree = QuadTree::build(&positions).expect("tree");
        let collision = Collision {
            strength: 1.0,
            spacing: 1.0,
            reach_sq: 100.0,
        };

        let mut forces = vec![Vec2::ZERO; 2];
        collision.accumulate(&tree, &tree, true, &positions, &radii, &mut forces);
        assert!(forces[0].length() > 9.0);
        assert!((forces[0] + forces[1]).length() < 1e-4);
    }
}
