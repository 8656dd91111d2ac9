//! Line and area scans over the arena.

use super::{Arena, Layer};
use crate::direction::Direction;
use crate::state::Position;
use crate::tile::{Material, TileKind};

impl Arena {
    /// Free cells between `from` and the first magnetic tile along `direction`.
    ///
    /// Zero when a solid non-magnetic tile or the arena edge comes first.
    pub fn magnetic_distance(&self, from: Position, direction: Direction) -> i32 {
        let (dx, dy) = direction.delta();
        if (dx, dy) == (0, 0) || direction.is_diagonal() {
            return 0;
        }
        let limit = self.columns.max(self.rows);
        for distance in 1..=limit {
            let Some(cell) = self.cell(from.offset(dx * distance, dy * distance)) else {
                return 0;
            };
            for tile in cell {
                if tile.material() == Material::Magnetic {
                    return distance - 1;
                }
                if tile.is_solid() {
                    return 0;
                }
            }
        }
        0
    }

    /// First live anti-tank facing back at `tank` along one of the four axes.
    ///
    /// The beam of sight stops at the first solid tile in each direction.
    pub fn linear_scan_anti(&self, tank: Position) -> Option<Position> {
        let limit = self.columns.max(self.rows);
        for direction in Direction::ORTHOGONAL {
            let (dx, dy) = direction.delta();
            'ray: for distance in 1..=limit {
                let target = tank.offset(dx * distance, dy * distance);
                let Some(cell) = self.cell(target) else {
                    break;
                };
                for tile in cell {
                    if tile.kind() == TileKind::AntiTank && tile.direction() == direction.opposite() {
                        return self.normalize(target);
                    }
                    if tile.is_solid() {
                        break 'ray;
                    }
                }
                if self.normalize(target) == Some(tank) {
                    break;
                }
            }
        }
        None
    }

    /// Every on-grid cell within Chebyshev radius `radius` of `center`, excluding the center.
    pub fn range_cells(&self, center: Position, radius: i32) -> Vec<Position> {
        let mut cells = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if (dx, dy) == (0, 0) {
                    continue;
                }
                if let Some(position) = self.normalize(center.offset(dx, dy))
                    && !cells.contains(&position)
                    && position != center
                {
                    cells.push(position);
                }
            }
        }
        cells
    }

    /// Whether `tank` lies within the square of radius `radius` around `center`.
    pub fn circular_scan_tank(&self, center: Position, radius: i32, tank: Position) -> bool {
        center
            .chebyshev(tank)
            .is_some_and(|distance| distance <= radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Tile;

    fn strip(columns: i32) -> Arena {
        Arena::new(columns, 1, 1).unwrap()
    }

    #[test]
    fn magnet_counts_gap_to_magnetic_wall() {
        let mut arena = strip(8);
        arena.morph(Position::new(5, 0, 0), Layer::LowerObjects, Tile::new(TileKind::MagneticWall));
        assert_eq!(arena.magnetic_distance(Position::new(1, 0, 0), Direction::East), 3);
        assert_eq!(arena.magnetic_distance(Position::new(4, 0, 0), Direction::East), 0);
        assert_eq!(arena.magnetic_distance(Position::new(1, 0, 0), Direction::West), 0);
    }

    #[test]
    fn magnet_blocked_by_plain_wall() {
        let mut arena = strip(8);
        arena.morph(Position::new(3, 0, 0), Layer::LowerObjects, Tile::wall());
        arena.morph(Position::new(6, 0, 0), Layer::LowerObjects, Tile::new(TileKind::MagneticBox));
        assert_eq!(arena.magnetic_distance(Position::new(0, 0, 0), Direction::East), 0);
    }

    #[test]
    fn anti_tank_must_face_the_tank() {
        let mut arena = strip(8);
        let tank = Position::new(1, 0, 0);
        arena.morph(Position::new(5, 0, 0), Layer::LowerObjects, Tile::anti_tank(Direction::East));
        assert_eq!(arena.linear_scan_anti(tank), None);
        arena.morph(Position::new(5, 0, 0), Layer::LowerObjects, Tile::anti_tank(Direction::West));
        assert_eq!(arena.linear_scan_anti(tank), Some(Position::new(5, 0, 0)));
        arena.morph(Position::new(3, 0, 0), Layer::LowerObjects, Tile::new(TileKind::Box));
        assert_eq!(arena.linear_scan_anti(tank), None);
    }

    #[test]
    fn stunned_anti_tank_does_not_count() {
        let mut arena = strip(5);
        arena.morph(
            Position::new(3, 0, 0),
            Layer::LowerObjects,
            Tile::new(TileKind::StunnedAntiTank).facing(Direction::West),
        );
        assert_eq!(arena.linear_scan_anti(Position::ORIGIN), None);
    }

    #[test]
    fn range_cells_clip_at_edges() {
        let arena = Arena::new(5, 5, 1).unwrap();
        assert_eq!(arena.range_cells(Position::new(2, 2, 0), 1).len(), 8);
        assert_eq!(arena.range_cells(Position::ORIGIN, 1).len(), 3);
    }

    #[test]
    fn circular_scan_is_square_and_floor_bound() {
        let arena = Arena::new(9, 9, 2).unwrap();
        let center = Position::new(4, 4, 0);
        assert!(arena.circular_scan_tank(center, 1, Position::new(5, 5, 0)));
        assert!(!arena.circular_scan_tank(center, 1, Position::new(6, 4, 0)));
        assert!(!arena.circular_scan_tank(center, 1, Position::new(4, 4, 1)));
    }
}
