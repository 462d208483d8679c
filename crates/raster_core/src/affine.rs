// Copyright 2024 the Vectra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 2D points and the affine transform applied during flattening.

use std::ops::{Add, Mul, Sub};

/// A point in path space (pre-transform) or device space (post-transform).
///
/// Kept as `f64` end to end in the path/affine layer; flattened segments are
/// narrowed to `f32` once they enter [`crate::segment`], matching the
/// precision the tiling and fine stages operate at.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub(crate) fn distance(&self, other: Point) -> f64 {
        (*self - other).length()
    }

    pub(crate) fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn to_f32(self) -> crate::segment::Vec2 {
        crate::segment::Vec2::new(self.x as f32, self.y as f32)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// A 2x3 affine transform, `(x, y) -> (a*x + c*y + e, b*x + d*y + f)`.
///
/// Mirrors `kurbo::Affine`'s row-major coefficient layout and composition
/// convention (the corpus's `peniko::kurbo::Affine` is the ambient type for
/// this family of crates; this one is hand-rolled because the data model is
/// part of what this spec fixes, not an incidental detail).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(coeffs: [f64; 6]) -> Self {
        Affine {
            a: coeffs[0],
            b: coeffs[1],
            c: coeffs[2],
            d: coeffs[3],
            e: coeffs[4],
            f: coeffs[5],
        }
    }

    pub fn translate(dx: f64, dy: f64) -> Self {
        Affine {
            e: dx,
            f: dy,
            ..Affine::IDENTITY
        }
    }

    pub fn scale(s: f64) -> Self {
        Affine {
            a: s,
            d: s,
            ..Affine::IDENTITY
        }
    }

    /// Apply the transform to a point.
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Pre-concatenate `self` with `other`, i.e. `self.then(other)` maps a
    /// point by applying `self` first, then `other`.
    pub fn then(&self, other: Affine) -> Affine {
        Affine {
            a: other.a * self.a + other.c * self.b,
            b: other.b * self.a + other.d * self.b,
            c: other.a * self.c + other.c * self.d,
            d: other.b * self.c + other.d * self.d,
            e: other.a * self.e + other.c * self.f + other.e,
            f: other.b * self.e + other.d * self.f + other.f,
        }
    }

    /// The largest absolute scale factor along either axis, used to rescale
    /// a device-space tolerance back into path space (mirrors the teacher's
    /// stroke-tolerance hack in `flatten.rs`).
    pub fn max_scale(&self) -> f64 {
        self.a.abs().max(self.d.abs()).max(1e-12)
    }
}

impl Default for Affine {
    fn default() -> Self {
        Affine::IDENTITY
    }
}

impl Mul<Point> for Affine {
    type Output = Point;
    fn mul(self, rhs: Point) -> Point {
        self.apply(rhs)
    }
}
