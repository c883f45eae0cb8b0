//! Deterministic grid searches used by mob navigation.
//!
//! Two flavours share the same open-set ordering:
//! - [`astar_path_3d`] plans a full route over caller-validated standing cells.
//! - [`local_first_step`] explores a small box around the mob and returns only
//!   the first move toward whichever explored cell ends up closest to the goal.
//!
//! Both are intended for **simulation use**, so tie-breaking is total and the
//! neighbour expansion order is fixed.

use glam::IVec3;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

/// A 3D grid position with a total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

impl From<IVec3> for GridPos {
    fn from(v: IVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<GridPos> for IVec3 {
    fn from(p: GridPos) -> Self {
        IVec3::new(p.x, p.y, p.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    /// Total estimated cost.
    f: i64,
    /// Cost so far.
    g: i64,
    pos: GridPos,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert comparisons so the smallest (f, g, pos) is popped first.
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.g.cmp(&self.g))
            .then_with(|| other.pos.cmp(&self.pos))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Fixed-point scale for route costs (1000 = one block).
const COST_SCALE: f64 = 1000.0;

const HORIZONTAL_DIRS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

fn euclid_floor(a: GridPos, b: GridPos) -> i64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    let dz = (a.z - b.z) as f64;
    ((dx * dx + dy * dy + dz * dz).sqrt() * COST_SCALE).floor() as i64
}

fn step_cost(dx: i32, dy: i32, dz: i32) -> i64 {
    // rounded up so the floored euclidean heuristic never overestimates
    (((dx * dx + dy * dy + dz * dz) as f64).sqrt() * COST_SCALE).ceil() as i64
}

fn rebuild_path(came_from: &BTreeMap<GridPos, GridPos>, start: GridPos, end: GridPos) -> Vec<GridPos> {
    let mut path = vec![end];
    let mut cur = end;
    while let Some(prev) = came_from.get(&cur).copied() {
        path.push(prev);
        if prev == start {
            break;
        }
        cur = prev;
    }
    path.reverse();
    path
}

/// Deterministic A* over standing cells with 8 horizontal neighbours and a
/// vertical step of at most `max_step` per move.
///
/// `is_passable` decides whether a body may stand at a cell (support and
/// clearance are the caller's concern) and must be deterministic. The start
/// cell is never tested. Diagonal moves additionally require both orthogonal
/// cells at the destination height, so routes never cut corners.
pub fn astar_path_3d(
    start: IVec3,
    goal: IVec3,
    mut is_passable: impl FnMut(IVec3) -> bool,
    max_step: i32,
    max_expansions: usize,
) -> Option<Vec<IVec3>> {
    let start = GridPos::from(start);
    let goal = GridPos::from(goal);
    if start == goal {
        return Some(vec![start.into()]);
    }
    if !is_passable(goal.into()) {
        return None;
    }

    let mut open = BinaryHeap::new();
    open.push(OpenNode {
        g: 0,
        f: euclid_floor(start, goal),
        pos: start,
    });

    let mut came_from: BTreeMap<GridPos, GridPos> = BTreeMap::new();
    let mut g_score: BTreeMap<GridPos, i64> = BTreeMap::new();
    g_score.insert(start, 0);
    let mut closed: BTreeSet<GridPos> = BTreeSet::new();
    let mut passable_cache: BTreeMap<GridPos, bool> = BTreeMap::new();
    let mut passable = |pos: GridPos| {
        *passable_cache
            .entry(pos)
            .or_insert_with(|| is_passable(pos.into()))
    };

    let mut dys = vec![0];
    for step in 1..=max_step.max(0) {
        dys.push(step);
        dys.push(-step);
    }

    let mut expansions = 0usize;
    while let Some(node) = open.pop() {
        if !closed.insert(node.pos) {
            continue;
        }

        if node.pos == goal {
            let path = rebuild_path(&came_from, start, goal);
            return Some(path.into_iter().map(IVec3::from).collect());
        }

        expansions += 1;
        if expansions > max_expansions {
            return None;
        }

        let current_g = g_score.get(&node.pos).copied().unwrap_or(i64::MAX);
        for &dy in &dys {
            for (dx, dz) in HORIZONTAL_DIRS {
                let neighbor = node.pos.offset(dx, dy, dz);
                if closed.contains(&neighbor) || !passable(neighbor) {
                    continue;
                }
                if dx != 0
                    && dz != 0
                    && !(passable(node.pos.offset(dx, dy, 0)) && passable(node.pos.offset(0, dy, dz)))
                {
                    continue;
                }

                let tentative_g = current_g.saturating_add(step_cost(dx, dy, dz));
                let best_g = g_score.get(&neighbor).copied().unwrap_or(i64::MAX);
                if tentative_g >= best_g {
                    continue;
                }

                came_from.insert(neighbor, node.pos);
                g_score.insert(neighbor, tentative_g);
                open.push(OpenNode {
                    g: tentative_g,
                    f: tentative_g.saturating_add(euclid_floor(neighbor, goal)),
                    pos: neighbor,
                });
            }
        }
    }

    None
}

/// Bounds and biases for [`local_first_step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalSearch {
    /// Cells explored on each horizontal axis around the start.
    pub horizontal_radius: i32,
    /// Cells explored above and below the start.
    pub vertical_radius: i32,
    pub max_expansions: usize,
    /// Make step-ups cheaper than flat moves (target is well above us).
    pub prefer_ascent: bool,
}

impl Default for LocalSearch {
    fn default() -> Self {
        Self {
            horizontal_radius: 8,
            vertical_radius: 3,
            max_expansions: 400,
            prefer_ascent: false,
        }
    }
}

const FLAT_COST: i64 = 2;
const DROP_COST: i64 = 2;
const ASCENT_COST: i64 = 3;
const BIASED_ASCENT_COST: i64 = 1;

fn standable(
    p: GridPos,
    is_open: &mut impl FnMut(IVec3) -> bool,
    is_floor: &mut impl FnMut(IVec3) -> bool,
) -> bool {
    is_open(p.into()) && is_open(p.offset(0, 1, 0).into()) && is_floor(p.offset(0, -1, 0).into())
}

fn manhattan(a: GridPos, b: GridPos) -> i64 {
    ((a.x - b.x).abs() + (a.y - b.y).abs() + (a.z - b.z).abs()) as i64
}

/// Uniform-cost exploration of standing cells around `start`, returning the
/// first move toward the explored cell with the smallest remaining
/// `|dx| + |dy| + |dz|` to `goal`.
///
/// A cell is standable when it and the cell above are open and the cell below
/// is floor. Moves go to the four horizontal neighbours: flat, one block up
/// (head room above the current cell required) or one block down. Returns
/// `None` when no explored cell is closer than the start.
pub fn local_first_step(
    start: IVec3,
    goal: IVec3,
    search: &LocalSearch,
    mut is_open: impl FnMut(IVec3) -> bool,
    mut is_floor: impl FnMut(IVec3) -> bool,
) -> Option<IVec3> {
    let origin = GridPos::from(start);
    let goal = GridPos::from(goal);
    let within = |p: GridPos| {
        (p.x - origin.x).abs() <= search.horizontal_radius
            && (p.z - origin.z).abs() <= search.horizontal_radius
            && (p.y - origin.y).abs() <= search.vertical_radius
    };
    let ascent_cost = if search.prefer_ascent {
        BIASED_ASCENT_COST
    } else {
        ASCENT_COST
    };

    let mut open = BinaryHeap::new();
    open.push(OpenNode {
        f: 0,
        g: 0,
        pos: origin,
    });
    let mut came_from: BTreeMap<GridPos, GridPos> = BTreeMap::new();
    let mut g_score: BTreeMap<GridPos, i64> = BTreeMap::new();
    g_score.insert(origin, 0);
    let mut closed: BTreeSet<GridPos> = BTreeSet::new();
    let mut best = (manhattan(origin, goal), 0i64, origin);

    let mut expansions = 0usize;
    while let Some(node) = open.pop() {
        if !closed.insert(node.pos) {
            continue;
        }
        let h = manhattan(node.pos, goal);
        if (h, node.g, node.pos) < best {
            best = (h, node.g, node.pos);
        }
        if h == 0 {
            break;
        }
        expansions += 1;
        if expansions > search.max_expansions {
            break;
        }

        let head_room = is_open(node.pos.offset(0, 2, 0).into());
        for (dx, dz) in &HORIZONTAL_DIRS[..4] {
            let flat = node.pos.offset(*dx, 0, *dz);
            let candidates = [
                (flat, FLAT_COST),
                (flat.offset(0, 1, 0), ascent_cost),
                (flat.offset(0, -1, 0), DROP_COST),
            ];
            for (index, (next, cost)) in candidates.into_iter().enumerate() {
                if !within(next) || closed.contains(&next) {
                    continue;
                }
                let reachable = match index {
                    0 => standable(next, &mut is_open, &mut is_floor),
                    1 => head_room && standable(next, &mut is_open, &mut is_floor),
                    _ => {
                        is_open(flat.offset(0, 1, 0).into())
                            && standable(next, &mut is_open, &mut is_floor)
                    }
                };
                if !reachable {
                    continue;
                }
                let tentative_g = node.g + cost;
                if tentative_g >= g_score.get(&next).copied().unwrap_or(i64::MAX) {
                    continue;
                }
                came_from.insert(next, node.pos);
                g_score.insert(next, tentative_g);
                open.push(OpenNode {
                    f: tentative_g,
                    g: tentative_g,
                    pos: next,
                });
                // first standable variant wins for this column
                break;
            }
        }
    }

    let (_, _, best_pos) = best;
    if best_pos == origin {
        return None;
    }
    rebuild_path(&came_from, origin, best_pos)
        .get(1)
        .copied()
        .map(IVec3::from)
}
