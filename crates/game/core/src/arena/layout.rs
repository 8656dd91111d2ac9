//! Plain-text arena layouts.
//!
//! One character per cell, one line per row. Floors are separated by a line
//! holding only `-`. Ground glyphs fill the lower-ground layer, movers and
//! frost fields the upper ground, the tank the upper objects, and everything
//! else the lower objects over plain ground.

use super::{Arena, ArenaError, Layer};
use crate::direction::Direction;
use crate::state::{KeyColor, Position};
use crate::tile::{Tile, TileKind};

const FLOOR_SEPARATOR: &str = "-";

/// Builds an arena from a layout string.
pub fn parse_layout(text: &str) -> Result<Arena, ArenaError> {
    let mut floors: Vec<Vec<(usize, &str)>> = vec![Vec::new()];
    for (number, line) in text.lines().enumerate() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if line == FLOOR_SEPARATOR {
            floors.push(Vec::new());
            continue;
        }
        if let Some(floor) = floors.last_mut() {
            floor.push((number + 1, line));
        }
    }
    floors.retain(|floor| !floor.is_empty());

    let expected = floors
        .first()
        .and_then(|floor| floor.first())
        .map_or(0, |(_, line)| line.chars().count());
    let rows = floors.first().map_or(0, Vec::len);

    let mut arena = Arena::new(expected as i32, rows as i32, floors.len() as i32)?;
    for (z, floor) in floors.iter().enumerate() {
        if floor.len() != rows {
            let line = floor.last().map_or(0, |(number, _)| *number);
            return Err(ArenaError::RaggedLayout {
                line,
                expected: rows,
                found: floor.len(),
            });
        }
        for (y, (number, line)) in floor.iter().enumerate() {
            let found = line.chars().count();
            if found != expected {
                return Err(ArenaError::RaggedLayout {
                    line: *number,
                    expected,
                    found,
                });
            }
            for (x, glyph) in line.chars().enumerate() {
                let placed = tile_for(glyph).ok_or(ArenaError::LayoutParse {
                    line: *number,
                    column: x + 1,
                    glyph,
                })?;
                if let Some((layer, tile)) = placed {
                    arena.set(Position::new(x as i32, y as i32, z as i32), layer, tile)?;
                }
            }
        }
    }
    arena.take_dirty();
    Ok(arena)
}

/// Glyph lookup. `Some(None)` is plain ground with nothing on it.
fn tile_for(glyph: char) -> Option<Option<(Layer, Tile)>> {
    use TileKind::*;
    let ground = |kind: TileKind| Some(Some((Layer::LowerGround, Tile::new(kind))));
    let mover = |direction| Some(Some((Layer::UpperGround, Tile::new(TankMover).facing(direction))));
    let tank = |direction| Some(Some((Layer::UpperObjects, Tile::tank(direction))));
    let object = |tile: Tile| Some(Some((Layer::LowerObjects, tile)));

    match glyph {
        '.' => Some(None),
        '~' => ground(Water),
        '=' => ground(DeepWater),
        '%' => ground(Lava),
        '*' => ground(Ice),
        ':' => ground(ThinIce),
        '_' => ground(Bridge),
        'u' => mover(Direction::North),
        'r' => mover(Direction::East),
        'd' => mover(Direction::South),
        'l' => mover(Direction::West),
        'f' => Some(Some((Layer::UpperGround, Tile::new(FrostField)))),
        '^' => tank(Direction::North),
        '>' => tank(Direction::East),
        'v' => tank(Direction::South),
        '<' => tank(Direction::West),
        '#' => object(Tile::wall()),
        'H' => object(Tile::new(HotWall)),
        'y' => object(Tile::new(IcyWall)),
        'm' => object(Tile::new(MagneticWall)),
        'Q' => object(Tile::new(CrystalBlock)),
        'c' => object(Tile::new(CrackedWall)),
        'B' => object(Tile::new(Box)),
        'W' => object(Tile::new(WoodenBox)),
        'I' => object(Tile::new(IcyBox)),
        'J' => object(Tile::new(JumpBox)),
        'M' => object(Tile::new(MagneticBox)),
        'G' => object(Tile::new(StickyBox)),
        '1' => object(Tile::mirror(Direction::NorthEast)),
        '2' => object(Tile::mirror(Direction::SouthEast)),
        '3' => object(Tile::mirror(Direction::SouthWest)),
        '4' => object(Tile::mirror(Direction::NorthWest)),
        '5' => object(Tile::rotary_mirror(Direction::NorthEast)),
        '6' => object(Tile::rotary_mirror(Direction::SouthEast)),
        '7' => object(Tile::rotary_mirror(Direction::SouthWest)),
        '8' => object(Tile::rotary_mirror(Direction::NorthWest)),
        'U' => object(Tile::new(StairsUp)),
        'V' => object(Tile::new(StairsDown)),
        'b' => object(Tile::new(Barrel)),
        'x' => object(Tile::new(ExplodingBarrel)),
        'F' => object(Tile::new(Flag)),
        'k' => object(Tile::new(Key(KeyColor::Red))),
        'D' => object(Tile::new(Door(KeyColor::Red))),
        'N' => object(Tile::anti_tank(Direction::North)),
        'E' => object(Tile::anti_tank(Direction::East)),
        'S' => object(Tile::anti_tank(Direction::South)),
        'A' => object(Tile::anti_tank(Direction::West)),
        _ => None,
    }
}

/// Renders the arena back into layout text, topmost visible tile per cell.
///
/// Tiles without a glyph of their own render as `?`.
pub fn render_layout(arena: &Arena) -> String {
    let mut out = String::new();
    for z in 0..arena.floors() {
        if z > 0 {
            out.push_str(FLOOR_SEPARATOR);
            out.push('\n');
        }
        for y in 0..arena.rows() {
            for x in 0..arena.columns() {
                let glyph = arena
                    .cell(Position::new(x, y, z))
                    .map_or('?', glyph_for);
                out.push(glyph);
            }
            out.push('\n');
        }
    }
    out
}

fn glyph_for(cell: &super::Cell) -> char {
    Layer::ALL
        .iter()
        .rev()
        .map(|layer| &cell[layer.index()])
        .find(|tile| !tile.is_empty())
        .map_or('.', tile_glyph)
}

fn tile_glyph(tile: &Tile) -> char {
    use TileKind::*;
    let facing = |n, e, s, w| match tile.direction() {
        Direction::North => n,
        Direction::East => e,
        Direction::South => s,
        Direction::West => w,
        _ => '?',
    };
    let diagonal = |ne, se, sw, nw| match tile.direction() {
        Direction::NorthEast => ne,
        Direction::SouthEast => se,
        Direction::SouthWest => sw,
        Direction::NorthWest => nw,
        _ => '?',
    };
    match tile.kind() {
        Ground => '.',
        Water => '~',
        DeepWater => '=',
        Lava => '%',
        Ice => '*',
        ThinIce => ':',
        Bridge => '_',
        TankMover => facing('u', 'r', 'd', 'l'),
        FrostField => 'f',
        Tank(_) => facing('^', '>', 'v', '<'),
        Wall => '#',
        HotWall => 'H',
        IcyWall => 'y',
        MagneticWall => 'm',
        CrystalBlock => 'Q',
        CrackedWall => 'c',
        Box => 'B',
        WoodenBox => 'W',
        IcyBox => 'I',
        JumpBox => 'J',
        MagneticBox => 'M',
        StickyBox => 'G',
        Mirror => diagonal('1', '2', '3', '4'),
        RotaryMirror => diagonal('5', '6', '7', '8'),
        StairsUp => 'U',
        StairsDown => 'V',
        Barrel => 'b',
        ExplodingBarrel => 'x',
        Flag => 'F',
        Key(KeyColor::Red) => 'k',
        Door(KeyColor::Red) => 'D',
        AntiTank => facing('N', 'E', 'S', 'A'),
        _ => '?',
    }
}
