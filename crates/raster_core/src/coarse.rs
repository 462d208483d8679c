// Copyright 2024 the Vectra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coarse binning: clip monotonic segments into per-tile fragments and
//! propagate winding deltas ("backdrop") across fully-crossed tile rows.

use crate::segment::{SegmentList, Vec2};
use crate::tile::{TileEntry, TileGrid, TILE_SIZE};

const EPS: f32 = 1e-3;

/// Bin every segment in `segments` into `grid`, clearing `grid` first.
///
/// For each tile row a segment touches, the segment is clipped into the
/// tile columns it crosses and a [`TileEntry`] is recorded for each. If the
/// segment crosses the *entire* height of a row (a "full vertical
/// crossing"), its winding is additionally folded into the backdrop of the
/// tile immediately to the right of the rightmost column it touched in that
/// row -- the delta every tile further right inherits, before any of its own
/// local geometry is considered.
pub fn bin(segments: &mut SegmentList, grid: &mut TileGrid) {
    grid.reset();
    if segments.is_empty() {
        return;
    }
    segments.sort_by_tile_row();

    let tiles_x = grid.tiles_x();
    let tiles_y = grid.tiles_y();

    for ty in 0..tiles_y {
        let row_y0 = (ty * TILE_SIZE) as f32;
        let row_y1 = row_y0 + TILE_SIZE as f32;

        for seg in segments.touching_row(ty as i32) {
            let y_lo = seg.p0.y.max(row_y0);
            let y_hi = seg.p1.y.min(row_y1);
            if y_hi - y_lo < EPS {
                continue;
            }
            let x_a = seg.x_at_y(y_lo);
            let x_b = seg.x_at_y(y_hi);
            let row_p0 = Vec2::new(x_a, y_lo);
            let row_p1 = Vec2::new(x_b, y_hi);

            let xmin = x_a.min(x_b);
            let xmax = x_a.max(x_b);
            let tx_lo_raw = (xmin / TILE_SIZE as f32).floor() as i64;
            let tx_hi_raw = (xmax / TILE_SIZE as f32).floor() as i64;

            let col_lo = tx_lo_raw.max(0);
            let col_hi = tx_hi_raw.min(tiles_x as i64 - 1);
            for tx in col_lo..=col_hi {
                let tx = tx as u32;
                let col_x0 = (tx * TILE_SIZE) as f32;
                let col_x1 = col_x0 + TILE_SIZE as f32;
                if let Some((p0, p1, touches_left)) =
                    clip_to_column(row_p0, row_p1, col_x0, col_x1)
                {
                    let local_p0 = Vec2::new(p0.x - col_x0, p0.y - row_y0);
                    let local_p1 = Vec2::new(p1.x - col_x0, p1.y - row_y0);
                    let y_edge = if touches_left {
                        Some(if p0.x <= col_x0 + EPS {
                            local_p0.y
                        } else {
                            local_p1.y
                        })
                    } else {
                        None
                    };
                    grid.get_mut(tx, ty).entries.push(TileEntry {
                        p0: local_p0,
                        p1: local_p1,
                        y_edge,
                        winding: seg.winding,
                    });
                }
            }

            let full_crossing = y_lo <= row_y0 + EPS && y_hi >= row_y1 - EPS;
            if full_crossing {
                let target = tx_hi_raw + 1;
                if target < tiles_x as i64 {
                    let target = target.max(0) as u32;
                    grid.get_mut(target, ty).backdrop += seg.winding as i32;
                }
            }
        }
    }
}

/// Clip the segment `(p0, p1)` (already clipped to a single tile row) to the
/// vertical strip `[col_x0, col_x1)`, returning the clipped endpoints
/// (reordered so `.y` is non-decreasing, matching the rest of the fragment)
/// plus whether the fragment touches the column's left edge.
fn clip_to_column(p0: Vec2, p1: Vec2, col_x0: f32, col_x1: f32) -> Option<(Vec2, Vec2, bool)> {
    if (p0.x - p1.x).abs() < EPS {
        // Vertical within the row: the whole fragment lives in one column.
        if p0.x < col_x0 - EPS || p0.x > col_x1 + EPS {
            return None;
        }
        let touches_left = (p0.x - col_x0).abs() < EPS;
        return Some((p0, p1, touches_left));
    }

    let inv_slope = (p1.y - p0.y) / (p1.x - p0.x);
    let y_at = |x: f32| p0.y + (x - p0.x) * inv_slope;

    let xlo = p0.x.min(p1.x);
    let xhi = p0.x.max(p1.x);
    let clip_xlo = xlo.max(col_x0);
    let clip_xhi = xhi.min(col_x1);
    if clip_xlo > clip_xhi + EPS {
        return None;
    }

    let y1 = y_at(clip_xlo);
    let y2 = y_at(clip_xhi);
    let (a, b) = if y1 <= y2 {
        (Vec2::new(clip_xlo, y1), Vec2::new(clip_xhi, y2))
    } else {
        (Vec2::new(clip_xhi, y2), Vec2::new(clip_xlo, y1))
    };
    let touches_left = (xlo - col_x0).abs() < EPS;
    Some((a, b, touches_left))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affine::{Affine, Point};
    use crate::flatten::flatten;
    use crate::path::Path;

    fn bin_path(path: &Path, width: u32, height: u32) -> TileGrid {
        let mut segs = SegmentList::new();
        flatten(path, Affine::IDENTITY, 0.25, &mut segs);
        let mut grid = TileGrid::new(width, height);
        bin(&mut segs, &mut grid);
        grid
    }

    /// A 16x16 square exactly filling tile (0, 0). Its left edge (closing
    /// line, winding -1) is entirely left of tile (1, 0) and deposits its
    /// winding into that tile's backdrop; its right edge sits exactly on
    /// tile (1, 0)'s own left border, so it shows up there as a local
    /// `TileEntry` instead (target tile 2 doesn't exist, so nothing lands
    /// there). Fine rasterization cancels the two within tile (1, 0) by
    /// crossing that entry immediately at the tile's first pixel column.
    #[test]
    fn axis_aligned_tile_square() {
        let path = Path::rect(0.0, 0.0, 16.0, 16.0);
        let grid = bin_path(&path, 32, 16);
        assert_eq!(grid.get(1, 0).backdrop, -1);
        assert_eq!(grid.get(1, 0).entries().len(), 1);
    }

    /// A rectangle whose left edge (x=4) fully crosses every tile row and
    /// whose right edge (x=60) lies in the last tile column, one short of
    /// needing to propagate anywhere. Tiles (1, 1) and (2, 1) both sit
    /// strictly between the two edges with no local geometry of their own,
    /// so the left edge's backdrop deposit on tile (1, 1) has to reach
    /// tile (2, 1) too -- not just the tile immediately next to the edge --
    /// for fine rasterization to carry the "inside" winding all the way
    /// across.
    #[test]
    fn interior_tile_gets_backdrop_from_left_edge() {
        let path = Path::rect(4.0, 0.0, 60.0, 48.0);
        let grid = bin_path(&path, 64, 48);
        assert_eq!(grid.get(1, 1).backdrop, -1);
        assert!(grid.get(1, 1).entries().is_empty());
        assert_eq!(grid.get(2, 1).backdrop, 0);
        assert!(grid.get(2, 1).entries().is_empty());
    }

    #[test]
    fn empty_segment_list_yields_all_empty_tiles() {
        let path = Path::new();
        let grid = bin_path(&path, 32, 32);
        for ty in 0..grid.tiles_y() {
            for tile in grid.row(ty) {
                assert!(tile.is_empty());
            }
        }
    }

    #[test]
    fn triangle_produces_entries_in_its_bounding_tiles() {
        let mut path = Path::new();
        path.move_to(Point::new(0.0, 0.0));
        path.line_to(Point::new(20.0, 0.0));
        path.line_to(Point::new(10.0, 20.0));
        path.close();
        let grid = bin_path(&path, 32, 32);
        let mut total_entries = 0;
        for ty in 0..grid.tiles_y() {
            for tile in grid.row(ty) {
                total_entries += tile.entries().len();
            }
        }
        assert!(total_entries > 0);
    }
}
