// Copyright 2024 the Vectra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fine rasterization: per-tile signed-area accumulation into 8-bit alpha
//! coverage, emitted one image scanline at a time.

use crate::tile::{Tile, TileGrid, TILE_SIZE};
use crate::FillRule;

const EPS: f32 = 1e-6;
const TS: usize = TILE_SIZE as usize;

/// Owns the scratch row buffer reused across [`Fine::rasterize`] calls so a
/// driver running many frames doesn't reallocate per call.
#[derive(Default)]
pub struct Fine {
    row_buf: Vec<u8>,
}

impl Fine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk `grid` tile-row by tile-row, emitting one 8-bit alpha scanline
    /// per image row via `callback(y, row)`. `width`/`height` clip the last
    /// partial tile column/row when the viewport isn't a multiple of
    /// [`TILE_SIZE`].
    pub fn rasterize(
        &mut self,
        grid: &TileGrid,
        width: u32,
        height: u32,
        fill_rule: FillRule,
        mut callback: impl FnMut(u32, &[u8]),
    ) {
        self.row_buf.clear();
        self.row_buf.resize(width as usize, 0);

        for ty in 0..grid.tiles_y() {
            for py in 0..TILE_SIZE {
                let y = ty * TILE_SIZE + py;
                if y >= height {
                    break;
                }
                // `running` is the winding prefix sum across this entire
                // tile row: each tile's backdrop is folded in before that
                // tile is rasterized, and what carries into the next tile is
                // exactly that -- never contaminated by this tile's own
                // local area/cover, which `rasterize_tile_row` keeps in a
                // separate accumulator that starts over at every tile.
                let mut running = 0f32;
                for (tx, tile) in grid.row(ty).enumerate() {
                    running += tile.backdrop as f32;
                    let signed = rasterize_tile_row(tile, py, running);
                    let base = tx * TS;
                    for (i, &s) in signed.iter().enumerate() {
                        let x = base + i;
                        if x >= width as usize {
                            break;
                        }
                        self.row_buf[x] = to_alpha(s, fill_rule);
                    }
                }
                callback(y, &self.row_buf);
            }
        }
    }
}

fn to_alpha(signed: f32, fill_rule: FillRule) -> u8 {
    let coverage = match fill_rule {
        FillRule::NonZero => signed.abs().clamp(0.0, 1.0),
        FillRule::EvenOdd => {
            let m = signed.rem_euclid(2.0);
            1.0 - (m - 1.0).abs()
        }
    };
    (coverage.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// Signed winding+area accumulation for one local pixel row of one tile.
///
/// `running` is this tile's share of the row-wide prefix sum -- every
/// earlier tile's backdrop, plus this tile's own -- computed once by the
/// caller and held fixed across all `TS` columns here. Only this tile's own
/// entries feed `area`/`cover`; a tile with no entries of its own is just
/// `running` repeated across every column, which is what lets an interior
/// tile with no local geometry still render as fully inside.
fn rasterize_tile_row(tile: &Tile, py: u32, running: f32) -> [f32; TS] {
    let mut area = [0f32; TS];
    let mut cover = [0f32; TS];
    let row_y0 = py as f32;
    let row_y1 = row_y0 + 1.0;

    for entry in tile.entries() {
        let y_lo = entry.p0.y.max(row_y0);
        let y_hi = entry.p1.y.min(row_y1);
        if y_hi - y_lo < EPS {
            continue;
        }
        let span = entry.p1.y - entry.p0.y;
        let (x_lo, x_hi) = if span.abs() < EPS {
            (entry.p0.x, entry.p1.x)
        } else {
            let t_lo = (y_lo - entry.p0.y) / span;
            let t_hi = (y_hi - entry.p0.y) / span;
            (
                entry.p0.x + (entry.p1.x - entry.p0.x) * t_lo,
                entry.p0.x + (entry.p1.x - entry.p0.x) * t_hi,
            )
        };
        accumulate_fragment(&mut area, &mut cover, x_lo, x_hi, y_hi - y_lo, entry.winding);
    }

    let mut local = 0f32;
    let mut out = [0f32; TS];
    for c in 0..TS {
        local += cover[c];
        out[c] = running + local + area[c];
    }
    out
}

/// Distribute a row-clipped fragment's signed winding*height mass across the
/// pixel columns it spans. `dy` is the fraction of the pixel row's height
/// the fragment occupies (`<= 1.0`); `x0`/`x1` are its tile-local endpoints
/// at that fragment's two y extremes (order doesn't matter -- `winding`
/// alone carries the sign).
///
/// Each touched column `c` receives its own analytic partial coverage in
/// `area[c]`, and the *full* mass handled so far is latched into
/// `cover[c + 1]` so a left-to-right running sum sees the correct total
/// winding once it has passed every column the fragment touched.
fn accumulate_fragment(area: &mut [f32; TS], cover: &mut [f32; TS], x0: f32, x1: f32, dy: f32, winding: i8) {
    if dy.abs() < EPS {
        return;
    }
    let w = winding as f32;

    if (x0 - x1).abs() < EPS {
        let c = (x0.floor() as i32).clamp(0, TS as i32 - 1) as usize;
        let frac = (x0 - c as f32).clamp(0.0, 1.0);
        area[c] += w * dy * (1.0 - frac);
        if c + 1 < TS {
            cover[c + 1] += w * dy;
        }
        return;
    }

    let (xa, xb) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
    let dx = xb - xa;
    let cmin = (xa.floor() as i32).clamp(0, TS as i32 - 1);
    let cmax = (xb.floor() as i32).clamp(0, TS as i32 - 1);

    for c in cmin..=cmax {
        let col_x0 = c as f32;
        let col_x1 = col_x0 + 1.0;
        let clip_lo = xa.max(col_x0);
        let clip_hi = xb.min(col_x1);
        if clip_hi <= clip_lo {
            continue;
        }
        let frac_span = (clip_hi - clip_lo) / dx;
        let h_c = dy * frac_span;
        let d_c = w * h_c;
        let avg_frac = 0.5 * ((clip_lo - col_x0) + (clip_hi - col_x0));
        let c = c as usize;
        area[c] += d_c * (1.0 - avg_frac);
        if c + 1 < TS {
            cover[c + 1] += d_c;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affine::{Affine, Point};
    use crate::coarse::bin;
    use crate::flatten::flatten;
    use crate::path::Path;
    use crate::segment::SegmentList;

    fn rasterize_path(path: &Path, width: u32, height: u32, fill_rule: FillRule) -> Vec<Vec<u8>> {
        let mut segs = SegmentList::new();
        flatten(path, Affine::IDENTITY, 0.25, &mut segs);
        let mut grid = TileGrid::new(width, height);
        bin(&mut segs, &mut grid);
        let mut fine = Fine::new();
        let mut rows = vec![vec![0u8; width as usize]; height as usize];
        fine.rasterize(&grid, width, height, fill_rule, |y, row| {
            rows[y as usize].copy_from_slice(row);
        });
        rows
    }

    #[test]
    fn tile_aligned_square_is_fully_opaque_inside() {
        let path = Path::rect(0.0, 0.0, 16.0, 16.0);
        let rows = rasterize_path(&path, 16, 16, FillRule::NonZero);
        for row in &rows {
            for &px in row {
                assert_eq!(px, 255);
            }
        }
    }

    #[test]
    fn outside_square_is_transparent() {
        let path = Path::rect(4.0, 4.0, 12.0, 12.0);
        let rows = rasterize_path(&path, 16, 16, FillRule::NonZero);
        assert_eq!(rows[0][0], 0);
        assert_eq!(rows[15][15], 0);
        assert_eq!(rows[8][8], 255);
    }

    #[test]
    fn half_covered_column_is_half_alpha() {
        // A rectangle whose right edge sits exactly at x = 8.5.
        let path = Path::rect(0.0, 0.0, 8.5, 16.0);
        let rows = rasterize_path(&path, 16, 16, FillRule::NonZero);
        assert_eq!(rows[5][0], 255);
        assert_eq!(rows[5][8], 128);
        assert_eq!(rows[5][9], 0);
    }

    /// A rectangle spanning three tile columns: both edges fully cross the
    /// row (so the middle tile's backdrop carries the winding in from the
    /// left edge), but the middle tile has no local entries of its own at
    /// all. Regression test for the prefix sum having to reach past the
    /// tile immediately next to an edge.
    #[test]
    fn three_tile_wide_rect_has_an_opaque_backdrop_only_middle_tile() {
        let path = Path::rect(4.0, 0.0, 44.0, 16.0);
        let rows = rasterize_path(&path, 48, 16, FillRule::NonZero);
        for row in &rows {
            for x in 0..4usize {
                assert_eq!(row[x], 0, "expected transparent outside the left edge");
            }
            for x in 4..44usize {
                assert_eq!(row[x], 255, "expected opaque at column {x}");
            }
            for x in 44..48usize {
                assert_eq!(row[x], 0, "expected transparent outside the right edge");
            }
        }
    }

    /// Nested same-winding squares: NonZero keeps the inner region filled
    /// (winding 2, |2| clamps to 1), EvenOdd punches a hole (winding 2 is
    /// even).
    #[test]
    fn fill_rule_divergence_on_nested_squares() {
        let mut path = Path::new();
        path.move_to(Point::new(0.0, 0.0));
        path.line_to(Point::new(16.0, 0.0));
        path.line_to(Point::new(16.0, 16.0));
        path.line_to(Point::new(0.0, 16.0));
        path.close();
        path.move_to(Point::new(4.0, 4.0));
        path.line_to(Point::new(12.0, 4.0));
        path.line_to(Point::new(12.0, 12.0));
        path.line_to(Point::new(4.0, 12.0));
        path.close();

        let nz = rasterize_path(&path, 16, 16, FillRule::NonZero);
        let eo = rasterize_path(&path, 16, 16, FillRule::EvenOdd);
        assert_eq!(nz[8][8], 255);
        assert_eq!(eo[8][8], 0);
        // Both rules agree in the outer ring, away from the nested square.
        assert_eq!(nz[1][1], 255);
        assert_eq!(eo[1][1], 255);
    }
}
