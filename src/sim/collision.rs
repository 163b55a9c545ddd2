//! Collision detection and response
//!
//! Two oracles live here:
//! - entity-vs-entity AABB overlap (centre + half extents, strict inequality)
//! - entity-vs-tile-grid sampling for the platformer, which probes a few
//!   points just outside the body's bottom, left and right edges

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::KinematicBody;
use super::tilemap::{TileGrid, TileKind, TilePalette};
use crate::consts::TILE_SAMPLE_EPSILON;

/// Collision extents attached to an entity, centred on its position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Explicit resize; the only sanctioned mutation after construction
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
    }
}

/// Check whether two centred boxes overlap.
///
/// Touching edges do not count: centres exactly `hw_a + hw_b` apart on x
/// are reported as separate.
#[inline]
pub fn overlaps(a_pos: Vec2, a_box: &BoundingBox, b_pos: Vec2, b_box: &BoundingBox) -> bool {
    let a_half = a_box.half_extents();
    let b_half = b_box.half_extents();
    (a_pos.x - b_pos.x).abs() < a_half.x + b_half.x && (a_pos.y - b_pos.y).abs() < a_half.y + b_half.y
}

/// Per-frame terrain contact state
///
/// Cleared at the start of every tile pass and only set from that pass's
/// samples; nothing is carried over from the previous frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactFlags {
    pub grounded: bool,
    pub blocked_left: bool,
    pub blocked_right: bool,
}

/// Result of one tile pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileContactReport {
    pub flags: ContactFlags,
    /// Some sample touched a lethal tile
    pub lethal: bool,
}

/// Sample points for a body of the given half extents at `pos`
struct Probes {
    bottom: [Vec2; 2],
    left: [Vec2; 2],
    right: [Vec2; 2],
}

impl Probes {
    fn new(pos: Vec2, half: Vec2) -> Self {
        let eps = TILE_SAMPLE_EPSILON;
        let feet = pos.y - half.y - eps;
        let upper = pos.y + half.y * 0.5;
        let lower = pos.y - half.y * 0.5;
        Self {
            bottom: [
                Vec2::new(pos.x - half.x + eps, feet),
                Vec2::new(pos.x + half.x - eps, feet),
            ],
            left: [
                Vec2::new(pos.x - half.x - eps, upper),
                Vec2::new(pos.x - half.x - eps, lower),
            ],
            right: [
                Vec2::new(pos.x + half.x + eps, upper),
                Vec2::new(pos.x + half.x + eps, lower),
            ],
        }
    }
}

/// Probe the grid around a body without changing it
pub fn sample_tile_contacts(
    body: &KinematicBody,
    bbox: &BoundingBox,
    grid: &TileGrid,
    palette: &TilePalette,
) -> TileContactReport {
    let probes = Probes::new(body.position, bbox.half_extents());
    let mut report = TileContactReport::default();

    // a clamped cell is never a floor; the feet snap skips those too
    let mut below = false;
    for &p in &probes.bottom {
        let cell = grid.cell_at(p);
        let kind = palette.kind_of(grid.index_at(cell.col, cell.row));
        report.lethal |= kind.is_lethal();
        below |= cell.in_bounds && kind.is_solid_from_above();
    }

    let mut check = |points: &[Vec2; 2], test: fn(TileKind) -> bool| -> bool {
        let mut hit = false;
        for &p in points {
            let kind = grid.kind_at(p, palette);
            report.lethal |= kind.is_lethal();
            hit |= test(kind);
        }
        hit
    };

    let left = check(&probes.left, TileKind::is_solid_side);
    let right = check(&probes.right, TileKind::is_solid_side);

    report.flags = ContactFlags {
        // one-way: only lands while falling or resting
        grounded: below && body.velocity.y <= 0.0,
        blocked_left: left,
        blocked_right: right,
    };
    report
}

/// Tile pass: reset flags, sample, then stop the body where the terrain says so.
///
/// Landing zeroes downward velocity and rests the feet on the tile top.
/// A blocked side zeroes velocity heading into it for this pass only.
pub fn resolve_tile_contacts(
    body: &mut KinematicBody,
    bbox: &BoundingBox,
    flags: &mut ContactFlags,
    grid: &TileGrid,
    palette: &TilePalette,
) -> TileContactReport {
    *flags = ContactFlags::default();
    let report = sample_tile_contacts(body, bbox, grid, palette);

    if report.flags.grounded {
        body.velocity.y = 0.0;
        let half = bbox.half_extents();
        let probes = Probes::new(body.position, half);
        let surface = probes
            .bottom
            .iter()
            .map(|&p| grid.cell_at(p))
            .filter(|cell| cell.in_bounds)
            .filter(|cell| palette.kind_of(grid.index_at(cell.col, cell.row)).is_solid_from_above())
            .map(|cell| grid.row_top(cell.row))
            .reduce(f32::max);
        if let Some(top) = surface {
            body.position.y = top + half.y;
        }
    }
    if report.flags.blocked_left && body.velocity.x < 0.0 {
        body.velocity.x = 0.0;
    }
    if report.flags.blocked_right && body.velocity.x > 0.0 {
        body.velocity.x = 0.0;
    }

    *flags = report.flags;
    report
}
