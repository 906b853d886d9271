//! Tile map and collision queries

use glam::Vec2;

use super::math::round_to_int;

/// Edge length of one tile in world units
pub const TILE_SIZE: i32 = 32;

pub const COLFLAG_SOLID: i32 = 1;
pub const COLFLAG_DEATH: i32 = 2;
pub const COLFLAG_NOHOOK: i32 = 4;

/// The collision value divided by this is an accelerator's player-count threshold
pub const ACCEL_THRESHOLD_DIVISOR: i32 = 8;

/// How far outside the map (in tiles) a position may drift before it is clipped
const GAME_LAYER_MARGIN: i32 = 200;

/// One map cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tile {
    /// Flag bits in the low three bits, accelerator threshold above them
    pub collision: i32,
    /// Accelerator direction code, 0..=15
    pub direction: i32,
    /// Accelerator strength
    pub power: i32,
}

impl Tile {
    pub const AIR: Tile = Tile {
        collision: 0,
        direction: 0,
        power: 0,
    };

    pub fn solid() -> Self {
        Self {
            collision: COLFLAG_SOLID,
            ..Self::AIR
        }
    }

    pub fn unhookable() -> Self {
        Self {
            collision: COLFLAG_SOLID | COLFLAG_NOHOOK,
            ..Self::AIR
        }
    }

    pub fn death() -> Self {
        Self {
            collision: COLFLAG_DEATH,
            ..Self::AIR
        }
    }

    /// Accelerator that switches on while `threshold >= live players`
    pub fn accelerator(direction: i32, power: i32, threshold: i32) -> Self {
        Self {
            collision: threshold * ACCEL_THRESHOLD_DIVISOR,
            direction,
            power,
        }
    }
}

/// Result of a successful line trace
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineHit {
    /// Collision value of the tile that stopped the trace
    pub flags: i32,
    /// First sampled point inside a solid tile
    pub at: Vec2,
    /// Last sampled point before it
    pub before: Vec2,
}

/// Map parsing errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MapError {
    #[error("map has no rows")]
    Empty,

    #[error("row {line} has {found} tiles, expected {expected}")]
    Ragged {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown tile {ch:?} at row {line}, column {column}")]
    UnknownTile { line: usize, column: usize, ch: char },
}

/// Rectangular tile grid, row-major
#[derive(Debug, Clone)]
pub struct TileMap {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    spawn_points: Vec<Vec2>,
}

impl TileMap {
    /// Empty map of the given size in tiles (at least 1x1)
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            tiles: vec![Tile::AIR; (width * height) as usize],
            spawn_points: Vec::new(),
        }
    }

    /// Parse an ASCII map.
    ///
    /// `.` air, `#` solid, `N` unhookable solid, `X` death, `S` spawn point,
    /// `>` `<` `^` `v` accelerators (power 5, active up to one live player).
    /// Blank lines and lines starting with `;` are skipped.
    pub fn parse(text: &str) -> Result<Self, MapError> {
        let rows: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim_end()))
            .filter(|(_, l)| !l.is_empty() && !l.starts_with(';'))
            .collect();

        let Some(&(_, first)) = rows.first() else {
            return Err(MapError::Empty);
        };
        let width = first.chars().count();

        let mut map = TileMap::new(width as i32, rows.len() as i32);
        for (ty, &(line, row)) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != width {
                return Err(MapError::Ragged {
                    line,
                    expected: width,
                    found,
                });
            }

            for (tx, ch) in row.chars().enumerate() {
                let tile = match ch {
                    '.' => Tile::AIR,
                    '#' => Tile::solid(),
                    'N' => Tile::unhookable(),
                    'X' => Tile::death(),
                    'S' => {
                        map.spawn_points.push(tile_center(tx as i32, ty as i32));
                        Tile::AIR
                    }
                    '>' => Tile::accelerator(0, 5, 1),
                    '<' => Tile::accelerator(1, 5, 1),
                    'v' => Tile::accelerator(8, 5, 1),
                    '^' => Tile::accelerator(9, 5, 1),
                    _ => {
                        return Err(MapError::UnknownTile {
                            line,
                            column: tx + 1,
                            ch,
                        })
                    }
                };
                map.set_tile(tx as i32, ty as i32, tile);
            }
        }

        Ok(map)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn spawn_points(&self) -> &[Vec2] {
        &self.spawn_points
    }

    pub fn add_spawn_point(&mut self, pos: Vec2) {
        self.spawn_points.push(pos);
    }

    /// Replace a tile; out-of-range coordinates are ignored
    pub fn set_tile(&mut self, tx: i32, ty: i32, tile: Tile) -> bool {
        if tx < 0 || ty < 0 || tx >= self.width || ty >= self.height {
            return false;
        }
        self.tiles[(ty * self.width + tx) as usize] = tile;
        true
    }

    /// Fill a rectangle of tiles (inclusive bounds)
    pub fn fill(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, tile: Tile) {
        for ty in y0..=y1 {
            for tx in x0..=x1 {
                self.set_tile(tx, ty, tile);
            }
        }
    }

    // World coordinates outside the map read the nearest edge tile.
    fn tile_at(&self, x: f32, y: f32) -> Tile {
        let nx = (round_to_int(x) / TILE_SIZE).clamp(0, self.width - 1);
        let ny = (round_to_int(y) / TILE_SIZE).clamp(0, self.height - 1);
        self.tiles[(ny * self.width + nx) as usize]
    }

    pub fn collision_at(&self, x: f32, y: f32) -> i32 {
        self.tile_at(x, y).collision
    }

    pub fn flags_at(&self, x: f32, y: f32) -> i32 {
        self.tile_at(x, y).direction
    }

    pub fn power_at(&self, x: f32, y: f32) -> i32 {
        self.tile_at(x, y).power
    }

    /// Whether the point lies in a solid tile
    pub fn check_point(&self, x: f32, y: f32) -> bool {
        self.collision_at(x, y) & COLFLAG_SOLID != 0
    }

    pub fn check_point_v(&self, pos: Vec2) -> bool {
        self.check_point(pos.x, pos.y)
    }

    pub fn is_death(&self, x: f32, y: f32) -> bool {
        self.collision_at(x, y) & COLFLAG_DEATH != 0
    }

    /// Whether any corner of the axis-aligned box centred on `pos` is solid
    pub fn test_box(&self, pos: Vec2, size: Vec2) -> bool {
        let half = size * 0.5;
        self.check_point(pos.x - half.x, pos.y - half.y)
            || self.check_point(pos.x + half.x, pos.y - half.y)
            || self.check_point(pos.x - half.x, pos.y + half.y)
            || self.check_point(pos.x + half.x, pos.y + half.y)
    }

    /// Sample the segment once per world unit and report the first solid point
    pub fn intersect_line(&self, from: Vec2, to: Vec2) -> Option<LineHit> {
        let distance = from.distance(to);
        let end = (distance + 1.0) as i32;
        let mut last = from;

        for i in 0..end {
            let a = if distance > 0.0 { i as f32 / distance } else { 0.0 };
            let pos = from.lerp(to, a);
            if self.check_point_v(pos) {
                return Some(LineHit {
                    flags: self.collision_at(pos.x, pos.y),
                    at: pos,
                    before: last,
                });
            }
            last = pos;
        }

        None
    }

    /// Step a point by `vel`, reflecting the blocked velocity components
    /// (scaled by `elasticity`) instead of moving when the target is solid
    pub fn move_point(&self, pos: &mut Vec2, vel: &mut Vec2, elasticity: f32) {
        let p = *pos;
        let v = *vel;
        if !self.check_point_v(p + v) {
            *pos = p + v;
            return;
        }

        let mut affected = 0;
        if self.check_point(p.x + v.x, p.y) {
            vel.x *= -elasticity;
            affected += 1;
        }
        if self.check_point(p.x, p.y + v.y) {
            vel.y *= -elasticity;
            affected += 1;
        }
        if affected == 0 {
            *vel *= -elasticity;
        }
    }

    /// Move a box through the map in unit steps, stopping (or bouncing with
    /// `elasticity`) on the blocked axis
    pub fn move_box(&self, pos: &mut Vec2, vel: &mut Vec2, size: Vec2, elasticity: f32) {
        let distance = vel.length();
        if distance <= 0.00001 {
            return;
        }

        let max = distance as i32;
        let fraction = 1.0 / (max + 1) as f32;
        let mut p = *pos;
        let mut v = *vel;

        for _ in 0..=max {
            let mut next = p + v * fraction;
            if self.test_box(next, size) {
                let mut hits = 0;

                if self.test_box(Vec2::new(p.x, next.y), size) {
                    next.y = p.y;
                    v.y *= -elasticity;
                    hits += 1;
                }

                if self.test_box(Vec2::new(next.x, p.y), size) {
                    next.x = p.x;
                    v.x *= -elasticity;
                    hits += 1;
                }

                // Corner hit: neither axis alone collides, stop both.
                if hits == 0 {
                    next = p;
                    v *= -elasticity;
                }
            }
            p = next;
        }

        *pos = p;
        *vel = v;
    }

    /// Whether a position has wandered far outside the playable layer
    pub fn game_layer_clipped(&self, pos: Vec2) -> bool {
        let rx = round_to_int(pos.x) / TILE_SIZE;
        let ry = round_to_int(pos.y) / TILE_SIZE;
        rx < -GAME_LAYER_MARGIN
            || rx >= self.width + GAME_LAYER_MARGIN
            || ry < -GAME_LAYER_MARGIN
            || ry >= self.height + GAME_LAYER_MARGIN
    }
}

/// World position of a tile's centre
pub fn tile_center(tx: i32, ty: i32) -> Vec2 {
    Vec2::new(
        (tx * TILE_SIZE + TILE_SIZE / 2) as f32,
        (ty * TILE_SIZE + TILE_SIZE / 2) as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor_map() -> TileMap {
        TileMap::parse(
            "\
.....
..S..
.....
#####",
        )
        .unwrap()
    }

    #[test]
    fn parse_reads_tiles_and_spawns() {
        let map = floor_map();
        assert_eq!((map.width(), map.height()), (5, 4));
        assert_eq!(map.spawn_points(), &[tile_center(2, 1)]);
        assert!(map.check_point(10.0, 100.0));
        assert!(!map.check_point(10.0, 90.0));
    }

    #[test]
    fn parse_rejects_ragged_and_unknown() {
        assert_eq!(
            TileMap::parse("...\n..").unwrap_err(),
            MapError::Ragged {
                line: 2,
                expected: 3,
                found: 2
            }
        );
        assert!(matches!(
            TileMap::parse("..?").unwrap_err(),
            MapError::UnknownTile { ch: '?', .. }
        ));
        assert_eq!(TileMap::parse("; only a comment\n").unwrap_err(), MapError::Empty);
    }

    #[test]
    fn outside_reads_clamp_to_edge() {
        let map = floor_map();
        assert!(map.check_point(-500.0, 5000.0));
        assert!(!map.check_point(-500.0, -5000.0));
    }

    #[test]
    fn accelerator_encodes_threshold_above_flags() {
        let tile = Tile::accelerator(0, 5, 3);
        assert_eq!(tile.collision / ACCEL_THRESHOLD_DIVISOR, 3);
        assert_eq!(tile.collision & COLFLAG_SOLID, 0);
    }

    #[test]
    fn line_trace_stops_at_floor() {
        let map = floor_map();
        let hit = map
            .intersect_line(Vec2::new(80.0, 16.0), Vec2::new(80.0, 120.0))
            .expect("floor hit");
        assert_eq!(hit.flags & COLFLAG_SOLID, COLFLAG_SOLID);
        assert!(hit.at.y >= 96.0 - 1.0);
        assert!(hit.before.y < hit.at.y);
        assert!(map
            .intersect_line(Vec2::new(16.0, 16.0), Vec2::new(140.0, 16.0))
            .is_none());
    }

    #[test]
    fn move_box_lands_on_floor() {
        let map = floor_map();
        let mut pos = Vec2::new(80.0, 60.0);
        let mut vel = Vec2::new(0.0, 40.0);
        map.move_box(&mut pos, &mut vel, Vec2::splat(28.0), 0.0);
        assert!(pos.y + 14.0 <= 96.5);
        assert_eq!(vel.y, 0.0);
    }

    #[test]
    fn far_positions_are_clipped() {
        let map = floor_map();
        assert!(!map.game_layer_clipped(Vec2::new(-100.0, 50.0)));
        assert!(map.game_layer_clipped(Vec2::new(-7000.0, 50.0)));
        assert!(map.game_layer_clipped(Vec2::new(50.0, 32.0 * 210.0)));
    }
}
