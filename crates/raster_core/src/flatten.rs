// Copyright 2024 the Vectra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flattening: curved path elements to Wang-bounded monotonic line segments.

use crate::affine::{Affine, Point};
use crate::path::{Path, PathEl};
use crate::segment::SegmentList;

/// Substituted whenever the caller passes a non-positive tolerance.
pub const DEFAULT_TOLERANCE: f64 = 0.25;

const CLOSE_EPS: f64 = 1e-6;
const MAX_SUBDIVISIONS: u32 = 64;

/// Flatten `path` through `affine` into `out`, clearing `out` first.
///
/// All points are transformed by `affine` *before* any flattening decision is
/// made, so `tolerance` is measured in the transformed (device) space. A
/// non-positive tolerance is replaced by [`DEFAULT_TOLERANCE`]; an empty path
/// produces an empty `out`. This function never fails.
pub fn flatten(path: &Path, affine: Affine, tolerance: f64, out: &mut SegmentList) {
    out.reset();
    let tol = if tolerance > 0.0 {
        tolerance
    } else {
        DEFAULT_TOLERANCE
    };

    let mut cursor = Point::ZERO;
    let mut subpath_start = Point::ZERO;
    let mut closed = true;

    for el in path.iter() {
        match el {
            PathEl::MoveTo(p) => {
                let p = affine.apply(p);
                if !closed && cursor.distance(subpath_start) > CLOSE_EPS {
                    emit_line(out, cursor, subpath_start);
                }
                cursor = p;
                subpath_start = p;
                closed = false;
            }
            PathEl::LineTo(p) => {
                let p = affine.apply(p);
                emit_line(out, cursor, p);
                cursor = p;
            }
            PathEl::QuadTo(c, p) => {
                let c = affine.apply(c);
                let p = affine.apply(p);
                flatten_quad(out, cursor, c, p, tol);
                cursor = p;
            }
            PathEl::CubicTo(c1, c2, p) => {
                let c1 = affine.apply(c1);
                let c2 = affine.apply(c2);
                let p = affine.apply(p);
                flatten_cubic(out, cursor, c1, c2, p, tol);
                cursor = p;
            }
            PathEl::Close => {
                closed = true;
                if cursor.distance(subpath_start) > CLOSE_EPS {
                    emit_line(out, cursor, subpath_start);
                }
                cursor = subpath_start;
            }
        }
    }

    if !closed && cursor.distance(subpath_start) > CLOSE_EPS {
        emit_line(out, cursor, subpath_start);
    }
}

fn emit_line(out: &mut SegmentList, a: Point, b: Point) {
    out.push_line(a.to_f32(), b.to_f32());
}

/// Wang's formula for a quadratic: `n = ceil(sqrt(d / (8 * tol)))`, where
/// `d = |P0 - 2*C + P1|`.
fn flatten_quad(out: &mut SegmentList, p0: Point, c: Point, p1: Point, tol: f64) {
    let d = (p0 - c * 2.0 + p1).length();
    let n = ((d / (8.0 * tol)).sqrt()).ceil() as u32;
    let n = n.clamp(1, MAX_SUBDIVISIONS);

    let mut prev = p0;
    for i in 1..=n {
        let t = i as f64 / n as f64;
        let mt = 1.0 - t;
        let pt = p0 * (mt * mt) + c * (2.0 * mt * t) + p1 * (t * t);
        emit_line(out, prev, pt);
        prev = pt;
    }
}

/// Wang's formula for a cubic: `n = ceil(0.75 * sqrt(sqrt(d / tol)))`, where
/// `d = max(|3*(C1 - 2*C2 + P1)|, |3*(P0 - 2*C1 + C2)|)`.
fn flatten_cubic(out: &mut SegmentList, p0: Point, c1: Point, c2: Point, p1: Point, tol: f64) {
    let d0 = (c1 * 3.0 - c2 * 6.0 + p1 * 3.0).length();
    let d1 = (p0 * 3.0 - c1 * 6.0 + c2 * 3.0).length();
    let d = d0.max(d1);
    let n = (0.75 * (d / tol).sqrt().sqrt()).ceil() as u32;
    let n = n.clamp(1, MAX_SUBDIVISIONS);

    let mut prev = p0;
    for i in 1..=n {
        let t = i as f64 / n as f64;
        let mt = 1.0 - t;
        let pt = p0 * (mt * mt * mt)
            + c1 * (3.0 * mt * mt * t)
            + c2 * (3.0 * mt * t * t)
            + p1 * (t * t * t);
        emit_line(out, prev, pt);
        prev = pt;
    }
}
