use thiserror::Error;

use engine::fixed::FRAC_BITS;

use super::{Loc, TerrainSet, World, MAX_HEIGHT, TILE_H, TILE_W};

/// World construction failures. All are fatal: the grid either loads fully
/// valid or not at all, with no partial object produced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldLoadError {
    #[error("invalid world size: {reason}")]
    InvalidSize { reason: String },
    #[error("failed to read location record {index}")]
    MalformedRecord { index: usize },
    #[error("location {index} has invalid height {height}")]
    InvalidHeight { index: usize, height: i32 },
    #[error("location {index} of height {height} has invalid depth {depth}")]
    InvalidDepth {
        index: usize,
        height: i32,
        depth: i32,
    },
    #[error("unknown terrain type {terrain:?} at location {index}")]
    UnknownTerrain { index: usize, terrain: char },
    #[error("failed to read the start location")]
    MissingStart,
}

impl World {
    /// Reads a world from its whitespace-delimited textual description:
    ///
    /// ```text
    /// <width> <height>
    /// (<terrainChar> <height> <depth>) x width*height    -- x*height+y order
    /// <startX> <startY>
    /// ```
    ///
    /// Records are read sequentially, so record `i` is cell
    /// `(i / height, i % height)`. Tokens after the start coordinate are
    /// ignored.
    pub fn read(text: &str, terrain: TerrainSet) -> Result<World, WorldLoadError> {
        let mut tokens = text.split_whitespace();

        let (width, height) = read_size(&mut tokens)?;
        let cell_count = (width as i64 * height as i64) as usize;

        let mut locs = Vec::with_capacity(cell_count);
        for index in 0..cell_count {
            let ch = read_terrain_char(&mut tokens, index)?;
            let cell_height =
                next_i32(&mut tokens).ok_or(WorldLoadError::MalformedRecord { index })?;
            let cell_depth =
                next_i32(&mut tokens).ok_or(WorldLoadError::MalformedRecord { index })?;

            if cell_height < 0 || cell_height > MAX_HEIGHT {
                return Err(WorldLoadError::InvalidHeight {
                    index,
                    height: cell_height,
                });
            }
            if cell_depth < 0 || cell_depth > cell_height {
                return Err(WorldLoadError::InvalidDepth {
                    index,
                    height: cell_height,
                    depth: cell_depth,
                });
            }
            if terrain.get(ch).is_none() {
                return Err(WorldLoadError::UnknownTerrain { index, terrain: ch });
            }

            locs.push(Loc {
                height: cell_height,
                depth: cell_depth,
                terrain: ch,
            });
        }

        let x0 = next_i32(&mut tokens).ok_or(WorldLoadError::MissingStart)?;
        let y0 = next_i32(&mut tokens).ok_or(WorldLoadError::MissingStart)?;

        Ok(World::from_parts(width, height, locs, (x0, y0), terrain))
    }
}

fn read_size<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
) -> Result<(i32, i32), WorldLoadError> {
    let invalid = |reason: String| WorldLoadError::InvalidSize { reason };

    let width =
        next_i32(tokens).ok_or_else(|| invalid("failed to read width and height".to_string()))?;
    let height =
        next_i32(tokens).ok_or_else(|| invalid("failed to read width and height".to_string()))?;

    if width <= 0 || height <= 0 {
        return Err(invalid(format!("{width} by {height} must be positive")));
    }
    if width as i64 * height as i64 > i32::MAX as i64 {
        return Err(invalid(format!("{width} by {height} is too big")));
    }
    if !pixel_extent_fits(width, TILE_W) || !pixel_extent_fits(height, TILE_H) {
        return Err(invalid(format!(
            "{width} by {height} exceeds the pixel coordinate range"
        )));
    }

    Ok((width, height))
}

/// Whether a full row/column of tiles stays within fixed-point pixel range.
fn pixel_extent_fits(cells: i32, tile: i32) -> bool {
    cells as i64 * tile as i64 * (1i64 << FRAC_BITS) <= i32::MAX as i64
}

fn read_terrain_char<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    index: usize,
) -> Result<char, WorldLoadError> {
    let token = tokens
        .next()
        .ok_or(WorldLoadError::MalformedRecord { index })?;
    let mut chars = token.chars();
    let ch = chars
        .next()
        .ok_or(WorldLoadError::MalformedRecord { index })?;
    if chars.next().is_some() {
        return Err(WorldLoadError::MalformedRecord { index });
    }
    Ok(ch)
}

fn next_i32<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Option<i32> {
    tokens.next()?.parse().ok()
}
