mod load;

pub use load::WorldLoadError;

use engine::{Vec2, Viewport};

/// Width of a tile in pixels.
pub const TILE_W: i32 = 16;
/// Height of a tile in pixels.
pub const TILE_H: i32 = 16;

/// Upper bound on a cell's height attribute.
pub const MAX_HEIGHT: i32 = 8;

/// Shade of a fully eroded cell (depth equals height).
pub const MIN_SHADE: f32 = 0.25;
const SHADE_SLOPE: f32 = (1.0 - MIN_SHADE) / MAX_HEIGHT as f32;

/// A type of terrain, identified by its character code and carrying the
/// image resource shared by every cell of that type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terrain {
    pub ch: char,
    pub resource: &'static str,
}

/// Registry of known terrain types, keyed by character code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerrainSet {
    entries: Vec<Terrain>,
}

impl TerrainSet {
    pub fn standard() -> Self {
        Self {
            entries: vec![
                Terrain {
                    ch: 'w',
                    resource: "assets/water.png",
                },
                Terrain {
                    ch: 'g',
                    resource: "assets/grass.png",
                },
                Terrain {
                    ch: 'm',
                    resource: "assets/mountain.png",
                },
            ],
        }
    }

    pub fn get(&self, ch: char) -> Option<&Terrain> {
        self.entries.iter().find(|terrain| terrain.ch == ch)
    }
}

/// A single cell of the world. Invariant, enforced at load:
/// `0 <= depth <= height <= MAX_HEIGHT`. Immutable after load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loc {
    pub height: i32,
    pub depth: i32,
    pub terrain: char,
}

impl Loc {
    /// Brightness factor in `[MIN_SHADE, 1]`, linear in `height - depth`:
    /// a fully eroded cell shades to `MIN_SHADE`, a full-height cell with no
    /// depth to exactly 1. Absolute height does not matter.
    pub fn shade(&self) -> f32 {
        SHADE_SLOPE * (self.height - self.depth) as f32 + MIN_SHADE
    }
}

/// One entry of the grid traversal: a cell, its coordinates, and its
/// resolved shade.
#[derive(Debug, Clone, Copy)]
pub struct Cell<'a> {
    pub x: i32,
    pub y: i32,
    pub loc: &'a Loc,
    pub shade: f32,
}

/// A toroidal grid of terrain cells plus the camera pixel offset into it.
///
/// Coordinate lookups wrap at the edges; the offset is always kept inside
/// `[0, width*TILE_W) x [0, height*TILE_H)`.
#[derive(Debug, PartialEq)]
pub struct World {
    width: i32,
    height: i32,
    locs: Vec<Loc>,
    start: (i32, i32),
    offset: Vec2,
    terrain: TerrainSet,
}

impl World {
    pub(crate) fn from_parts(
        width: i32,
        height: i32,
        locs: Vec<Loc>,
        start: (i32, i32),
        terrain: TerrainSet,
    ) -> Self {
        debug_assert_eq!(locs.len(), (width * height) as usize);
        Self {
            width,
            height,
            locs,
            start,
            offset: Vec2::ZERO,
            terrain,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// The start coordinate from the world description. Not bounds-checked
    /// at load; wrapped lookups tolerate any value.
    pub fn start(&self) -> (i32, i32) {
        self.start
    }

    pub fn terrain(&self) -> &TerrainSet {
        &self.terrain
    }

    /// Unwrapped direct lookup. Panics outside `[0,width) x [0,height)`;
    /// callers with world coordinates use `at_coord`.
    pub fn at(&self, x: i32, y: i32) -> &Loc {
        assert!(
            x >= 0 && x < self.width && y >= 0 && y < self.height,
            "unwrapped lookup ({x}, {y}) outside {} by {} grid",
            self.width,
            self.height
        );
        &self.locs[(x * self.height + y) as usize]
    }

    /// Wrapped lookup: both coordinates normalize into range with floor
    /// semantics, so negative inputs land in `[0, dim)`.
    pub fn at_coord(&self, x: i32, y: i32) -> &Loc {
        self.at(x.rem_euclid(self.width), y.rem_euclid(self.height))
    }

    /// World extent in pixels.
    pub fn pixel_dims(&self) -> Vec2 {
        Vec2::from_whole(self.width * TILE_W, self.height * TILE_H)
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Applies a scroll delta and renormalizes the offset into
    /// `[0, dim)` on each axis. Floor semantics: any signed delta, including
    /// ones exceeding a full world dimension, lands back in range.
    pub fn scroll(&mut self, delta: Vec2) {
        let dims = self.pixel_dims();
        self.offset = Vec2::new(
            (self.offset.x + delta.x).rem_euclid(dims.x),
            (self.offset.y + delta.y).rem_euclid(dims.y),
        );
    }

    /// Sets the offset so the start cell's center lands at the viewport
    /// center.
    pub fn center(&mut self, viewport: Viewport) {
        let (x0, y0) = self.start;
        let dims = self.pixel_dims();
        let target = Vec2::from_whole(
            viewport.width as i32 / 2 - (x0 * TILE_W + TILE_W / 2),
            viewport.height as i32 / 2 - (y0 * TILE_H + TILE_H / 2),
        );
        self.offset = Vec2::new(target.x.rem_euclid(dims.x), target.y.rem_euclid(dims.y));
    }

    /// Lazy, restartable traversal of every cell with its coordinates and
    /// resolved shade; the presentation layer builds its draw batch from
    /// this.
    pub fn cells(&self) -> impl Iterator<Item = Cell<'_>> + '_ {
        (0..self.width).flat_map(move |x| {
            (0..self.height).map(move |y| {
                let loc = self.at(x, y);
                Cell {
                    x,
                    y,
                    loc,
                    shade: loc.shade(),
                }
            })
        })
    }
}
