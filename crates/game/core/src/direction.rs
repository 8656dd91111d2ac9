//! Pure mapping between signed grid offsets and compass directions.
//!
//! Screen coordinates: `x` grows east, `y` grows south, so north is `(0, -1)`.

use strum::{AsRefStr, Display, EnumIter};

/// Compass direction of a tile, a bolt, or a step vector.
///
/// `Horizontal` and `Vertical` only describe laser glyphs; they carry no
/// offset of their own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    #[default]
    None,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    Horizontal,
    Vertical,
}

impl Direction {
    pub const ORTHOGONAL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub const DIAGONAL: [Direction; 4] = [
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::NorthWest,
    ];

    /// Unit offset for this direction; `(0, 0)` for `None` and glyph-only values.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::NorthEast => (1, -1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::South => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
            Direction::None | Direction::Horizontal | Direction::Vertical => (0, 0),
        }
    }

    pub const fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::NorthEast => Direction::SouthWest,
            Direction::East => Direction::West,
            Direction::SouthEast => Direction::NorthWest,
            Direction::South => Direction::North,
            Direction::SouthWest => Direction::NorthEast,
            Direction::West => Direction::East,
            Direction::NorthWest => Direction::SouthEast,
            other => other,
        }
    }

    pub const fn is_diagonal(self) -> bool {
        matches!(
            self,
            Direction::NorthEast | Direction::SouthEast | Direction::SouthWest | Direction::NorthWest
        )
    }

    pub const fn is_orthogonal(self) -> bool {
        matches!(
            self,
            Direction::North | Direction::East | Direction::South | Direction::West
        )
    }

    /// Quarter turn clockwise. Glyph-only values are returned unchanged.
    pub const fn clockwise(self) -> Direction {
        match self {
            Direction::North => Direction::East,
            Direction::NorthEast => Direction::SouthEast,
            Direction::East => Direction::South,
            Direction::SouthEast => Direction::SouthWest,
            Direction::South => Direction::West,
            Direction::SouthWest => Direction::NorthWest,
            Direction::West => Direction::North,
            Direction::NorthWest => Direction::NorthEast,
            other => other,
        }
    }
}

/// Direction a step `(dx, dy)` points to. Only the sign of each axis matters.
pub fn resolve_relative(dx: i32, dy: i32) -> Direction {
    match (dx.signum(), dy.signum()) {
        (0, -1) => Direction::North,
        (1, -1) => Direction::NorthEast,
        (1, 0) => Direction::East,
        (1, 1) => Direction::SouthEast,
        (0, 1) => Direction::South,
        (-1, 1) => Direction::SouthWest,
        (-1, 0) => Direction::West,
        (-1, -1) => Direction::NorthWest,
        _ => Direction::None,
    }
}

/// Direction a step `(dx, dy)` came from.
pub fn resolve_relative_invert(dx: i32, dy: i32) -> Direction {
    resolve_relative(-dx, -dy)
}

/// Glyph orientation for a bolt: orthogonal steps collapse to an axis.
pub fn resolve_relative_hv(dx: i32, dy: i32) -> Direction {
    match (dx.signum(), dy.signum()) {
        (0, 0) => Direction::None,
        (_, 0) => Direction::Horizontal,
        (0, _) => Direction::Vertical,
        (sx, sy) => resolve_relative(sx, sy),
    }
}

/// Inverse of [`resolve_relative`].
pub fn unresolve(direction: Direction) -> (i32, i32) {
    direction.delta()
}

/// Whether a bolt travelling `(dx, dy)` strikes the reflective face of a
/// diagonal mirror facing `mirror`.
///
/// A mirror facing `(mx, my)` reflects a vertical bolt moving along `my` and a
/// horizontal bolt moving along `mx`. Everything else hits the back.
pub fn hits_reflective_side(mirror: Direction, dx: i32, dy: i32) -> bool {
    if !mirror.is_diagonal() {
        return false;
    }
    let (mx, my) = mirror.delta();
    let (dx, dy) = (dx.signum(), dy.signum());
    (dx == 0 && dy == my) || (dy == 0 && dx == mx)
}

/// Exit direction after a bolt moving `(dx, dy)` bounced off the reflective
/// face of `mirror`.
pub fn reflect(mirror: Direction, dx: i32, dy: i32) -> Direction {
    let (mx, my) = mirror.delta();
    match (dx, dy) {
        (0, _) => resolve_relative(mx, 0),
        (_, 0) => resolve_relative(0, my),
        _ => Direction::None,
    }
}
