use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 12;
const MAX_DEPTH: usize = 10;

/// Axis-aligned square region of the layout plane.
#[derive(Clone, Copy, Debug)]
pub(super) struct Square {
    pub(super) center: Vec2,
    pub(super) half: f32,
}

impl Square {
    /// Smallest square (padded by one unit) around every finite point.
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let (min, max) = points
            .iter()
            .filter(|point| point.is_finite())
            .fold(None, |acc: Option<(Vec2, Vec2)>, &point| {
                Some(match acc {
                    None => (point, point),
                    Some((min, max)) => (min.min(point), max.max(point)),
                })
            })?;

        let span = (max - min).max_elem().max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half: span * 0.5 + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half && (point.y - self.center.y).abs() <= self.half
    }

    pub(super) fn side(self) -> f32 {
        self.half * 2.0
    }

    fn quadrant(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half * 0.5;
        let dx = if quadrant & 1 == 0 { -quarter } else { quarter };
        let dy = if quadrant & 2 == 0 { -quarter } else { quarter };
        Self {
            center: self.center + vec2(dx, dy),
            half: quarter,
        }
    }

    /// Squared gap between two squares, zero when they touch or overlap.
    pub(super) fn gap_sq(self, other: Self) -> f32 {
        let reach = self.half + other.half;
        let gap_x = ((self.center.x - other.center.x).abs() - reach).max(0.0);
        let gap_y = ((self.center.y - other.center.y).abs() - reach).max(0.0);
        gap_x * gap_x + gap_y * gap_y
    }
}

/// Barnes-Hut quadtree over node positions. Leaves keep the indices of the
/// nodes they hold; inner nodes keep only the aggregate mass and centroid.
pub(super) struct QuadTree {
    pub(super) square: Square,
    pub(super) centroid: Vec2,
    pub(super) mass: f32,
    pub(super) members: Vec<usize>,
    pub(super) children: [Option<Box<QuadTree>>; 4],
}

impl QuadTree {
    /// Returns `None` when no position is finite. Non-finite positions are
    /// left out of the tree.
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let square = Square::enclosing(positions)?;
        let members = (0..positions.len())
            .filter(|&index| positions[index].is_finite())
            .collect();
        Some(Self::subdivide(square, members, positions, 0))
    }

    fn subdivide(square: Square, members: Vec<usize>, positions: &[Vec2], depth: usize) -> Self {
        let mass = members.len() as f32;
        let centroid = if members.is_empty() {
            square.center
        } else {
            members
                .iter()
                .fold(Vec2::ZERO, |sum, &index| sum + positions[index])
                / mass
        };

        let mut tree = Self {
            square,
            centroid,
            mass,
            members,
            children: Default::default(),
        };
        if depth >= MAX_DEPTH || tree.members.len() <= LEAF_CAPACITY {
            return tree;
        }

        let mut buckets: [Vec<usize>; 4] = Default::default();
        for &index in &tree.members {
            buckets[square.quadrant(positions[index])].push(index);
        }
        // coincident points would recurse forever without splitting anything
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() < 2 {
            return tree;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if !bucket.is_empty() {
                tree.children[quadrant] = Some(Box::new(Self::subdivide(
                    square.child(quadrant),
                    bucket,
                    positions,
                    depth + 1,
                )));
            }
        }
        tree.members.clear();
        tree
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    pub(super) fn children(&self) -> impl Iterator<Item = &QuadTree> {
        self.children.iter().filter_map(|child| child.as_deref())
    }
}
