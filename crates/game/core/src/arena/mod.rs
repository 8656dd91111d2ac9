//! The four-layer cell grid the tank lives in.
//!
//! Every cell holds one tile per [`Layer`]; vacancies hold the `Empty` sentinel.
//! A parallel virtual layer stores laser glyphs, and a dirty set tracks which
//! cells the display needs to redraw.

mod layout;
mod scan;

pub use layout::{parse_layout, render_layout};

use sha2::{Digest, Sha256};
use strum::{AsRefStr, Display, EnumIter};
use tracing::trace;

use crate::config::GameConfig;
use crate::direction::Direction;
use crate::engine::LaserType;
use crate::error::{ErrorSeverity, GameError};
use crate::state::Position;
use crate::tile::Tile;

/// Stacking order inside a cell, bottom to top.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Layer {
    LowerGround,
    UpperGround,
    LowerObjects,
    UpperObjects,
}

impl Layer {
    pub const ALL: [Layer; GameConfig::LAYER_COUNT] = [
        Layer::LowerGround,
        Layer::UpperGround,
        Layer::LowerObjects,
        Layer::UpperObjects,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Laser beam segment drawn on the virtual layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaserGlyph {
    pub laser: LaserType,
    pub direction: Direction,
}

/// One cell's full layer stack.
pub type Cell = [Tile; GameConfig::LAYER_COUNT];

/// Errors raised while building or addressing an arena.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    #[error("invalid arena dimensions {columns}x{rows}x{floors}")]
    InvalidDimensions { columns: i32, rows: i32, floors: i32 },

    #[error("position {position} is outside the arena")]
    OutOfBounds { position: Position },

    #[error("unknown layout glyph '{glyph}' at line {line}, column {column}")]
    LayoutParse {
        line: usize,
        column: usize,
        glyph: char,
    },

    #[error("layout line {line} has {found} columns, expected {expected}")]
    RaggedLayout {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("arena has no tank")]
    MissingTank,

    #[error("arena has {count} tanks, expected one")]
    MultipleTanks { count: usize },
}

impl GameError for ArenaError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::OutOfBounds { .. }
            | Self::InvalidDimensions { .. }
            | Self::LayoutParse { .. }
            | Self::RaggedLayout { .. } => ErrorSeverity::Validation,
            Self::MissingTank | Self::MultipleTanks { .. } => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDimensions { .. } => "ARENA_INVALID_DIMENSIONS",
            Self::OutOfBounds { .. } => "ARENA_OUT_OF_BOUNDS",
            Self::LayoutParse { .. } => "ARENA_LAYOUT_PARSE",
            Self::RaggedLayout { .. } => "ARENA_RAGGED_LAYOUT",
            Self::MissingTank => "ARENA_MISSING_TANK",
            Self::MultipleTanks { .. } => "ARENA_MULTIPLE_TANKS",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Arena {
    columns: i32,
    rows: i32,
    floors: i32,
    cells: Vec<Cell>,
    glyphs: Vec<Option<LaserGlyph>>,
    dirty: Vec<bool>,
    wrap_horizontal: bool,
    wrap_vertical: bool,
}

impl Arena {
    /// Creates an arena of plain ground with every other layer empty.
    pub fn new(columns: i32, rows: i32, floors: i32) -> Result<Self, ArenaError> {
        let dimension_ok = |d: i32| (GameConfig::MIN_DIMENSION..=GameConfig::MAX_DIMENSION).contains(&d);
        if !dimension_ok(columns)
            || !dimension_ok(rows)
            || !(1..=GameConfig::MAX_FLOORS).contains(&floors)
        {
            return Err(ArenaError::InvalidDimensions {
                columns,
                rows,
                floors,
            });
        }

        let count = (columns * rows * floors) as usize;
        let blank: Cell = [Tile::ground(), Tile::empty(), Tile::empty(), Tile::empty()];
        Ok(Self {
            columns,
            rows,
            floors,
            cells: vec![blank; count],
            glyphs: vec![None; count],
            dirty: vec![true; count],
            wrap_horizontal: false,
            wrap_vertical: false,
        })
    }

    /// Enables per-axis wraparound: horizontal wraps columns, vertical wraps rows.
    #[must_use]
    pub fn with_wraparound(mut self, horizontal: bool, vertical: bool) -> Self {
        self.wrap_horizontal = horizontal;
        self.wrap_vertical = vertical;
        self
    }

    pub fn columns(&self) -> i32 {
        self.columns
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn floors(&self) -> i32 {
        self.floors
    }

    /// Maps a position onto the grid, applying wraparound on enabled axes.
    ///
    /// Returns `None` when the position lies outside a non-wrapping edge or
    /// on a floor that does not exist.
    pub fn normalize(&self, position: Position) -> Option<Position> {
        if !(0..self.floors).contains(&position.z) {
            return None;
        }
        let x = if self.wrap_horizontal {
            position.x.rem_euclid(self.columns)
        } else if (0..self.columns).contains(&position.x) {
            position.x
        } else {
            return None;
        };
        let y = if self.wrap_vertical {
            position.y.rem_euclid(self.rows)
        } else if (0..self.rows).contains(&position.y) {
            position.y
        } else {
            return None;
        };
        Some(Position::new(x, y, position.z))
    }

    pub fn contains(&self, position: Position) -> bool {
        self.normalize(position).is_some()
    }

    fn index(&self, position: Position) -> Option<usize> {
        let p = self.normalize(position)?;
        Some(((p.z * self.rows + p.y) * self.columns + p.x) as usize)
    }

    fn position_of(&self, index: usize) -> Position {
        let index = index as i32;
        let per_floor = self.columns * self.rows;
        let z = index / per_floor;
        let rest = index % per_floor;
        Position::new(rest % self.columns, rest / self.columns, z)
    }

    /// All positions in storage order: floor, then row, then column.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.cells.len()).map(|index| self.position_of(index))
    }

    pub fn get(&self, position: Position, layer: Layer) -> Option<&Tile> {
        let index = self.index(position)?;
        Some(&self.cells[index][layer.index()])
    }

    /// Mutable access; the cell is marked dirty.
    pub fn get_mut(&mut self, position: Position, layer: Layer) -> Option<&mut Tile> {
        let index = self.index(position)?;
        self.dirty[index] = true;
        Some(&mut self.cells[index][layer.index()])
    }

    pub fn cell(&self, position: Position) -> Option<&Cell> {
        self.index(position).map(|index| &self.cells[index])
    }

    /// Replaces a tile and returns the previous occupant of that slot.
    pub fn set(&mut self, position: Position, layer: Layer, tile: Tile) -> Result<Tile, ArenaError> {
        let index = self
            .index(position)
            .ok_or(ArenaError::OutOfBounds { position })?;
        self.dirty[index] = true;
        Ok(std::mem::replace(&mut self.cells[index][layer.index()], tile))
    }

    /// Like [`Arena::set`], but silently ignores positions off the grid.
    pub fn morph(&mut self, position: Position, layer: Layer, tile: Tile) {
        if let Err(err) = self.set(position, layer, tile) {
            trace!(target: "lasertank::arena", %err, "morph ignored");
        }
    }

    pub fn glyph(&self, position: Position) -> Option<LaserGlyph> {
        self.index(position).and_then(|index| self.glyphs[index])
    }

    pub fn set_glyph(&mut self, position: Position, glyph: LaserGlyph) {
        if let Some(index) = self.index(position) {
            self.glyphs[index] = Some(glyph);
            self.dirty[index] = true;
        }
    }

    /// Clears `glyph` at `position`. A glyph another bolt drew over it since is kept.
    pub fn clear_glyph(&mut self, position: Position, glyph: LaserGlyph) {
        if let Some(index) = self.index(position)
            && self.glyphs[index] == Some(glyph)
        {
            self.glyphs[index] = None;
            self.dirty[index] = true;
        }
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.iter().filter(|glyph| glyph.is_some()).count()
    }

    pub fn clear_glyphs(&mut self) {
        for (glyph, dirty) in self.glyphs.iter_mut().zip(self.dirty.iter_mut()) {
            if glyph.take().is_some() {
                *dirty = true;
            }
        }
    }

    pub fn mark_dirty(&mut self, position: Position) {
        if let Some(index) = self.index(position) {
            self.dirty[index] = true;
        }
    }

    pub fn mark_all_dirty(&mut self) {
        self.dirty.fill(true);
    }

    /// Drains the dirty set.
    pub fn take_dirty(&mut self) -> Vec<Position> {
        let mut changed = Vec::new();
        for index in 0..self.dirty.len() {
            if std::mem::take(&mut self.dirty[index]) {
                changed.push(self.position_of(index));
            }
        }
        changed
    }

    /// Locates the player tank on the upper-objects layer.
    pub fn find_tank(&self) -> Option<Position> {
        self.tanks().next()
    }

    pub(crate) fn tanks(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell[Layer::UpperObjects.index()].is_tank())
            .map(|(index, _)| self.position_of(index))
    }

    /// Advances the animation frame of every animated tile. Returns the number toggled.
    pub fn toggle_animation_frames(&mut self) -> usize {
        let mut toggled = 0;
        for (cell, dirty) in self.cells.iter_mut().zip(self.dirty.iter_mut()) {
            for tile in cell.iter_mut() {
                if tile.is_of_type(crate::tile::TypeFlags::ANIMATED) {
                    tile.toggle_frame();
                    *dirty = true;
                    toggled += 1;
                }
            }
        }
        toggled
    }

    pub(crate) fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub(crate) fn restore_cells(&mut self, cells: Vec<Cell>) {
        debug_assert_eq!(cells.len(), self.cells.len());
        self.cells = cells;
        self.glyphs.fill(None);
        self.mark_all_dirty();
    }

    /// SHA-256 over dimensions, wrap flags and every tile. Glyphs and frames are excluded.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.columns.to_le_bytes());
        hasher.update(self.rows.to_le_bytes());
        hasher.update(self.floors.to_le_bytes());
        hasher.update([u8::from(self.wrap_horizontal), u8::from(self.wrap_vertical)]);

        let mut buffer = Vec::with_capacity(64);
        for cell in &self.cells {
            for tile in cell {
                buffer.clear();
                tile.encode(&mut buffer);
                hasher.update(&buffer);
            }
        }
        hasher.finalize().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileKind;

    #[test]
    fn rejects_bad_dimensions() {
        assert!(matches!(
            Arena::new(0, 4, 1),
            Err(ArenaError::InvalidDimensions { .. })
        ));
        assert!(Arena::new(4, 4, 0).is_err());
        assert!(Arena::new(1, 1, 1).is_ok());
    }

    #[test]
    fn normalize_respects_wrap_axes() {
        let arena = Arena::new(5, 4, 1).unwrap().with_wraparound(true, false);
        assert_eq!(
            arena.normalize(Position::new(-1, 2, 0)),
            Some(Position::new(4, 2, 0))
        );
        assert_eq!(
            arena.normalize(Position::new(7, 0, 0)),
            Some(Position::new(2, 0, 0))
        );
        assert_eq!(arena.normalize(Position::new(0, -1, 0)), None);
        assert_eq!(arena.normalize(Position::new(0, 0, 1)), None);
    }

    #[test]
    fn set_returns_previous_and_marks_dirty() {
        let mut arena = Arena::new(3, 3, 1).unwrap();
        arena.take_dirty();
        let at = Position::new(1, 1, 0);
        let old = arena.set(at, Layer::LowerObjects, Tile::wall()).unwrap();
        assert!(old.is_empty());
        assert_eq!(arena.take_dirty(), vec![at]);
        assert!(arena.take_dirty().is_empty());
    }

    #[test]
    fn morph_ignores_out_of_bounds() {
        let mut arena = Arena::new(2, 2, 1).unwrap();
        let before = arena.digest();
        arena.morph(Position::new(5, 5, 0), Layer::LowerObjects, Tile::wall());
        assert_eq!(arena.digest(), before);
        assert!(matches!(
            arena.set(Position::new(-1, 0, 0), Layer::LowerObjects, Tile::wall()),
            Err(ArenaError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn glyphs_stay_one_per_cell() {
        let mut arena = Arena::new(4, 1, 1).unwrap();
        let at = Position::new(2, 0, 0);
        let glyph = |direction| LaserGlyph {
            laser: LaserType::Green,
            direction,
        };
        arena.set_glyph(at, glyph(Direction::Horizontal));
        arena.set_glyph(at, glyph(Direction::Vertical));
        assert_eq!(arena.glyph_count(), 1);
        assert_eq!(arena.glyph(at).map(|g| g.direction), Some(Direction::Vertical));
        arena.clear_glyphs();
        assert_eq!(arena.glyph_count(), 0);
    }

    #[test]
    fn digest_ignores_glyphs_but_tracks_tiles() {
        let mut arena = Arena::new(3, 3, 1).unwrap();
        let base = arena.digest();
        arena.set_glyph(
            Position::new(0, 0, 0),
            LaserGlyph {
                laser: LaserType::Red,
                direction: Direction::Horizontal,
            },
        );
        assert_eq!(arena.digest(), base);
        arena.morph(Position::new(0, 0, 0), Layer::LowerGround, Tile::new(TileKind::Ice));
        assert_ne!(arena.digest(), base);
    }

    #[test]
    fn positions_round_trip_through_index() {
        let arena = Arena::new(3, 2, 2).unwrap();
        let all: Vec<_> = arena.positions().collect();
        assert_eq!(all.len(), 12);
        assert_eq!(all[0], Position::ORIGIN);
        assert_eq!(all[4], Position::new(1, 1, 0));
        assert_eq!(all[11], Position::new(2, 1, 1));
    }
}
