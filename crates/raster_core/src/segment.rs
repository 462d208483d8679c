// Copyright 2024 the Vectra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic line segments and the growable buffer that holds them.

use crate::tile::TILE_SIZE;

/// Distances/coordinates below this are treated as zero when deciding
/// whether a flattened segment is horizontal or degenerate.
const EPS: f32 = 1e-6;

/// A 2D point/vector in device space, post-flatten precision (`f32`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    pub fn lerp(self, other: Vec2, t: f32) -> Vec2 {
        Vec2::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }
}

/// A monotonic line segment: `p0.y <= p1.y`.
///
/// `winding` is `+1` if the original (pre-flip) direction ran in the path's
/// traversal order, `-1` if the segment was flipped to enforce monotonicity.
#[derive(Clone, Copy, Debug)]
pub struct LineSegment {
    pub p0: Vec2,
    pub p1: Vec2,
    pub winding: i8,
    /// First tile row this segment touches (inclusive; top-of-tile rule).
    pub tile_y0: i32,
    /// Last tile row this segment touches (inclusive; bottom-of-tile rule,
    /// i.e. a segment ending exactly on a row boundary belongs to the row
    /// above, not below).
    pub tile_y1: i32,
}

impl LineSegment {
    /// Build a monotonic segment from two device-space endpoints, enforcing
    /// `p0.y <= p1.y` and flipping `winding` when the inputs were flipped.
    /// Returns `None` for horizontal (`|dy| < EPS`) or degenerate
    /// (`|dx| < EPS && |dy| < EPS`) inputs, per spec.
    pub fn new(a: Vec2, b: Vec2) -> Option<LineSegment> {
        let dx = a.x - b.x;
        let dy = a.y - b.y;
        if dy.abs() < EPS {
            return None;
        }
        let (p0, p1, winding) = if a.y <= b.y { (a, b, 1) } else { (b, a, -1) };
        let _ = dx;
        let tile_y0 = row_top(p0.y);
        let tile_y1 = row_bottom(p1.y);
        Some(LineSegment {
            p0,
            p1,
            winding,
            tile_y0,
            tile_y1,
        })
    }

    /// Linearly interpolate the x coordinate at a given y within the
    /// segment's y range.
    pub fn x_at_y(&self, y: f32) -> f32 {
        let span = self.p1.y - self.p0.y;
        if span.abs() < EPS {
            return self.p0.x;
        }
        let t = ((y - self.p0.y) / span).clamp(0.0, 1.0);
        self.p0.x + (self.p1.x - self.p0.x) * t
    }
}

/// Tile row containing `y`, for a segment's top endpoint (top-inclusive).
fn row_top(y: f32) -> i32 {
    (y / TILE_SIZE as f32).floor() as i32
}

/// Tile row containing `y`, for a segment's bottom endpoint
/// (bottom-exclusive: a value exactly on the boundary belongs to the row
/// above it).
fn row_bottom(y: f32) -> i32 {
    let q = y / TILE_SIZE as f32;
    let f = q.floor();
    if (q - f).abs() < 1e-4 {
        f as i32 - 1
    } else {
        f as i32
    }
}

/// A growable sequence of [`LineSegment`]s, reusable across frames.
#[derive(Clone, Debug, Default)]
pub struct SegmentList {
    segments: Vec<LineSegment>,
    order: Vec<u32>,
    sorted: bool,
}

impl SegmentList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the list but keep the backing allocation.
    pub fn reset(&mut self) {
        self.segments.clear();
        self.order.clear();
        self.sorted = false;
    }

    /// Push a line, monotonizing it and dropping horizontal/degenerate
    /// inputs. Returns whether a segment was actually emitted.
    pub fn push_line(&mut self, a: Vec2, b: Vec2) -> bool {
        match LineSegment::new(a, b) {
            Some(seg) => {
                self.segments.push(seg);
                self.sorted = false;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[LineSegment] {
        &self.segments
    }

    /// Axis-aligned bounding box over all segment endpoints, if any.
    pub fn bounds(&self) -> Option<(Vec2, Vec2)> {
        let mut iter = self.segments.iter();
        let first = iter.next()?;
        let mut lo = Vec2::new(first.p0.x.min(first.p1.x), first.p0.y);
        let mut hi = Vec2::new(first.p0.x.max(first.p1.x), first.p1.y);
        for seg in iter {
            lo.x = lo.x.min(seg.p0.x).min(seg.p1.x);
            lo.y = lo.y.min(seg.p0.y);
            hi.x = hi.x.max(seg.p0.x).max(seg.p1.x);
            hi.y = hi.y.max(seg.p1.y);
        }
        Some((lo, hi))
    }

    /// The highest tile row touched by any segment, or `-1` if empty.
    pub fn max_tile_row(&self) -> i32 {
        self.segments.iter().map(|s| s.tile_y1).max().unwrap_or(-1)
    }

    /// Stable sort by first tile row, enabling [`Self::touching_row`].
    pub fn sort_by_tile_row(&mut self) {
        self.order = (0..self.segments.len() as u32).collect();
        self.order
            .sort_by_key(|&i| self.segments[i as usize].tile_y0);
        self.sorted = true;
    }

    /// An ordered scan of segments touching tile row `row`. Panics if the
    /// list hasn't been sorted via [`Self::sort_by_tile_row`] since the last
    /// mutation.
    pub fn touching_row(&self, row: i32) -> impl Iterator<Item = &LineSegment> + '_ {
        assert!(self.sorted, "SegmentList must be sorted before querying");
        let cutoff = self
            .order
            .partition_point(|&i| self.segments[i as usize].tile_y0 <= row);
        self.order[..cutoff]
            .iter()
            .map(move |&i| &self.segments[i as usize])
            .filter(move |s| s.tile_y1 >= row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flips_to_enforce_monotonicity() {
        let seg = LineSegment::new(Vec2::new(0.0, 10.0), Vec2::new(0.0, 0.0)).unwrap();
        assert!(seg.p0.y <= seg.p1.y);
        assert_eq!(seg.winding, -1);
    }

    #[test]
    fn keeps_original_order_winding() {
        let seg = LineSegment::new(Vec2::new(0.0, 0.0), Vec2::new(0.0, 10.0)).unwrap();
        assert_eq!(seg.winding, 1);
    }

    #[test]
    fn drops_horizontal() {
        assert!(LineSegment::new(Vec2::new(0.0, 5.0), Vec2::new(10.0, 5.0)).is_none());
    }

    #[test]
    fn drops_degenerate() {
        assert!(LineSegment::new(Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn bottom_boundary_belongs_to_row_above() {
        // A segment ending exactly at y = 16 (a tile boundary) should be
        // assigned to row 0, not row 1.
        let seg = LineSegment::new(Vec2::new(0.0, 0.0), Vec2::new(0.0, 16.0)).unwrap();
        assert_eq!(seg.tile_y0, 0);
        assert_eq!(seg.tile_y1, 0);
    }

    #[test]
    fn touching_row_query() {
        let mut list = SegmentList::new();
        list.push_line(Vec2::new(0.0, 0.0), Vec2::new(0.0, 40.0));
        list.push_line(Vec2::new(5.0, 20.0), Vec2::new(5.0, 24.0));
        list.sort_by_tile_row();
        let row1: Vec<_> = list.touching_row(1).collect();
        assert_eq!(row1.len(), 2);
        let row2: Vec<_> = list.touching_row(2).collect();
        assert_eq!(row2.len(), 1);
    }
}
