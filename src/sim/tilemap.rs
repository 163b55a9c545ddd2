//! Tile grid for the platformer
//!
//! A grid is a row-major list of tile indices loaded once from a plain-text
//! map: one integer per cell, separated by commas and/or whitespace, one
//! row per line. Row 0 is the top row; world y decreases as rows increase.
//!
//! What a tile index *means* (solid, one-way, lethal) comes from a
//! [`TilePalette`], so the same map file can be reinterpreted per game.

use std::collections::HashMap;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Collision semantics of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Empty,
    /// Solid from above only (one-way platform)
    Platform,
    /// Blocks horizontal movement only
    Wall,
    /// Solid from above and from the sides
    Solid,
    /// Kills the player on contact
    Lethal,
}

impl TileKind {
    /// Can a body stand on top of this tile?
    pub fn is_solid_from_above(self) -> bool {
        matches!(self, TileKind::Platform | TileKind::Solid)
    }

    /// Does this tile block movement into it from the left or right?
    pub fn is_solid_side(self) -> bool {
        matches!(self, TileKind::Wall | TileKind::Solid)
    }

    pub fn is_lethal(self) -> bool {
        matches!(self, TileKind::Lethal)
    }
}

/// Fixed lookup table from tile index to [`TileKind`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilePalette {
    kinds: HashMap<u32, TileKind>,
}

impl Default for TilePalette {
    /// The sprite-sheet indices used by the bundled platformer map
    fn default() -> Self {
        Self::from_pairs([(122, TileKind::Solid), (152, TileKind::Wall)])
    }
}

impl TilePalette {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u32, TileKind)>) -> Self {
        Self {
            kinds: pairs.into_iter().collect(),
        }
    }

    /// Indices not in the table are empty
    pub fn kind_of(&self, index: u32) -> TileKind {
        self.kinds.get(&index).copied().unwrap_or_default()
    }
}

/// A cell address after clamping into the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellIndex {
    pub col: usize,
    pub row: usize,
    /// False when the query fell outside the grid and was clamped
    pub in_bounds: bool,
}

/// Immutable tile grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TileGridData")]
pub struct TileGrid {
    width: usize,
    height: usize,
    cell_size: f32,
    /// World position of the top-left corner of cell (0, 0)
    origin: Vec2,
    cells: Vec<u32>,
}

/// Serialized form of a [`TileGrid`], validated on the way in
#[derive(Deserialize)]
struct TileGridData {
    width: usize,
    height: usize,
    cell_size: f32,
    origin: Vec2,
    cells: Vec<u32>,
}

impl TryFrom<TileGridData> for TileGrid {
    type Error = GameError;

    fn try_from(data: TileGridData) -> Result<Self, Self::Error> {
        if data.width == 0 || data.width.checked_mul(data.height) != Some(data.cells.len()) {
            return Err(GameError::MalformedTileMap {
                line: 0,
                reason: format!(
                    "{}x{} grid needs {} cells, found {}",
                    data.width,
                    data.height,
                    data.width.saturating_mul(data.height),
                    data.cells.len()
                ),
            });
        }
        let rows = data.cells.chunks(data.width).map(<[u32]>::to_vec).collect();
        Self::from_rows(rows, data.cell_size, data.origin)
    }
}

impl TileGrid {
    /// Build a grid from already-parsed rows
    pub fn from_rows(rows: Vec<Vec<u32>>, cell_size: f32, origin: Vec2) -> Result<Self, GameError> {
        if !(cell_size > 0.0) {
            return Err(GameError::MalformedTileMap {
                line: 0,
                reason: format!("cell size must be positive, got {cell_size}"),
            });
        }
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(GameError::MalformedTileMap {
                line: 0,
                reason: "tile map has no cells".to_string(),
            });
        }
        if let Some(bad) = rows.iter().position(|r| r.len() != width) {
            return Err(GameError::MalformedTileMap {
                line: bad + 1,
                reason: format!("expected {} tiles, found {}", width, rows[bad].len()),
            });
        }

        Ok(Self {
            width,
            height,
            cell_size,
            origin,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// Parse the plain-text map format
    pub fn parse(text: &str, cell_size: f32, origin: Vec2) -> Result<Self, GameError> {
        let mut rows = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let row = line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|tok| !tok.is_empty())
                .map(|tok| {
                    tok.parse::<u32>().map_err(|e| GameError::MalformedTileMap {
                        line: line_no + 1,
                        reason: format!("bad tile index {tok:?}: {e}"),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }

        let grid = Self::from_rows(rows, cell_size, origin)?;
        log::debug!("Parsed {}x{} tile map", grid.width, grid.height);
        Ok(grid)
    }

    /// Read and parse a map file
    pub fn load(path: &Path, cell_size: f32, origin: Vec2) -> Result<Self, GameError> {
        let text = std::fs::read_to_string(path).map_err(|source| GameError::AssetRead {
            path: path.to_path_buf(),
            source,
        })?;
        let grid = Self::parse(&text, cell_size, origin)?;
        log::info!("Loaded tile map {}", path.display());
        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Raw tile index, with the address clamped into the grid
    pub fn index_at(&self, col: usize, row: usize) -> u32 {
        let col = col.min(self.width - 1);
        let row = row.min(self.height - 1);
        self.cells[row * self.width + col]
    }

    /// Map a world point to the cell containing it, clamping out-of-range
    /// queries onto the nearest edge cell.
    pub fn cell_at(&self, point: Vec2) -> CellIndex {
        let col = ((point.x - self.origin.x) / self.cell_size).floor();
        let row = ((self.origin.y - point.y) / self.cell_size).floor();

        let (col, col_ok) = clamp_axis(col, self.width);
        let (row, row_ok) = clamp_axis(row, self.height);
        if !(col_ok && row_ok) {
            log::trace!("Tile query {:?} outside grid, clamped to ({col}, {row})", point);
        }
        CellIndex {
            col,
            row,
            in_bounds: col_ok && row_ok,
        }
    }

    /// Kind of the tile under a world point
    pub fn kind_at(&self, point: Vec2, palette: &TilePalette) -> TileKind {
        let cell = self.cell_at(point);
        palette.kind_of(self.index_at(cell.col, cell.row))
    }

    /// World y of the top edge of a row
    pub fn row_top(&self, row: usize) -> f32 {
        self.origin.y - row as f32 * self.cell_size
    }

    /// World position of a cell's centre
    pub fn cell_center(&self, col: usize, row: usize) -> Vec2 {
        Vec2::new(
            self.origin.x + (col as f32 + 0.5) * self.cell_size,
            self.origin.y - (row as f32 + 0.5) * self.cell_size,
        )
    }

    /// Iterate `(col, row, index)` over every cell, row by row
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, u32)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, &idx)| (i % self.width, i / self.width, idx))
    }
}

/// Clamp a floored coordinate into `0..len`; NaN lands on 0
fn clamp_axis(value: f32, len: usize) -> (usize, bool) {
    if value.is_nan() || value < 0.0 {
        (0, false)
    } else if value >= len as f32 {
        (len - 1, false)
    } else {
        (value as usize, true)
    }
}
