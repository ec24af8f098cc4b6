//! The path-to-mesh tessellator.
//!
//! A [`Path`] owns one flattened contour (an ordered point walk, open or
//! closed) and the two vertex buffers produced from it. The pipeline per
//! path and per frame is: append points, [`Path::flatten`],
//! [`Path::calculate_joins`], then [`Path::expand_fill`] and/or
//! [`Path::expand_stroke`]. The resulting buffers are triangle-strip and
//! triangle-fan friendly and carry the antialiasing coverage ramp in
//! their `(u, v)` attributes, so the fragment stage stays trivial.

use std::f32::consts::PI;

use bitflags::bitflags;

use crate::geometry::{Bounds, Position, Vector};
use crate::vertex::Vertex;

bitflags! {
    /// Per-point classification assigned while flattening and calculating
    /// joins. Flags merge with bitwise-or when two near-coincident points
    /// collapse into one.
    #[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct PointFlags: u8 {
        const CORNER        = 0x01;
        const LEFT          = 0x02;
        const BEVEL         = 0x04;
        const INNERBEVEL    = 0x08;
    }
}

/// Declares which side of a contour is solid, which fixes the polygon
/// orientation after flattening.
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Solidity {
    Solid = 1,
    Hole = 2,
}

impl Default for Solidity {
    fn default() -> Self {
        Self::Solid
    }
}

/// End-of-line style for open strokes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

impl Default for LineCap {
    fn default() -> Self {
        Self::Butt
    }
}

/// Corner style where two stroke segments meet.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

impl Default for LineJoin {
    fn default() -> Self {
        Self::Miter
    }
}

/// Result of join calculation. Convex paths qualify for a cheaper
/// single-sided antialiasing fringe when filling.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Convexity {
    Convex,
    Concave,
    Unknown,
}

impl Default for Convexity {
    fn default() -> Self {
        Self::Unknown
    }
}

/// One vertex of the flattened contour together with its derived
/// per-edge data. `dpos`/`len` describe the edge from this point to its
/// successor; `dmpos` is the miter extrusion vector computed during join
/// calculation.
#[derive(Copy, Clone, Debug, Default)]
struct Point {
    pos: Position,
    dpos: Vector,
    len: f32,
    dmpos: Vector,
    flags: PointFlags,
}

impl Point {
    fn new(x: f32, y: f32, flags: PointFlags) -> Self {
        Self {
            pos: Position { x, y },
            flags,
            ..Default::default()
        }
    }

    fn approx_eq(&self, other: &Self, tolerance: f32) -> bool {
        Position::equals(self.pos, other.pos, tolerance)
    }
}

/// A single flattened contour and the fill/stroke meshes expanded from it.
///
/// The point arena and both output buffers are exclusively owned, so
/// distinct paths can be tessellated on different threads without any
/// coordination. Output buffers are rewritten, never appended to, which
/// makes repeated expansion calls idempotent.
#[derive(Clone, Debug, Default)]
pub struct Path {
    points: Vec<Point>,
    solidity: Solidity,
    dist_tol: f32,
    closed: bool,
    bevel: usize,
    convexity: Convexity,
    bounds: Bounds,
    fill: Vec<Vertex>,
    stroke: Vec<Vertex>,
}

impl Path {
    pub fn new(solidity: Solidity) -> Self {
        Self {
            solidity,
            dist_tol: 0.01,
            ..Default::default()
        }
    }

    /// Sets the distance below which two consecutive points are treated
    /// as one. Usually derived from the device pixel ratio.
    pub fn set_distance_tolerance(&mut self, dist_tol: f32) {
        self.dist_tol = dist_tol;
    }

    /// Discards the contour and both output meshes so the path can be
    /// refilled with new geometry, keeping the allocations for reuse
    /// across frames. The solidity and distance tolerance are retained.
    pub fn clear(&mut self) {
        self.points.clear();
        self.closed = false;
        self.bevel = 0;
        self.convexity = Convexity::Unknown;
        self.bounds = Bounds::default();
        self.fill.clear();
        self.stroke.clear();
    }

    /// Appends a raw point. A point within the distance tolerance of the
    /// previously appended one is merged into it by or-ing the flags
    /// instead of being inserted.
    pub fn add_point(&mut self, x: f32, y: f32, flags: PointFlags) {
        let point = Point::new(x, y, flags);

        if let Some(last) = self.points.last_mut() {
            if last.approx_eq(&point, self.dist_tol) {
                last.flags |= point.flags;
                return;
            }
        }

        self.points.push(point);
    }

    /// Marks the contour closed. Flattening also closes implicitly when
    /// the last point coincides with the first.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn solidity(&self) -> Solidity {
        self.solidity
    }

    pub fn convexity(&self) -> Convexity {
        self.convexity
    }

    /// Number of points classified as needing bevel geometry by the last
    /// [`calculate_joins`](Self::calculate_joins) call.
    pub fn bevel_count(&self) -> usize {
        self.bevel
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// The fill mesh produced by [`expand_fill`](Self::expand_fill),
    /// consumed as a triangle fan.
    pub fn fill(&self) -> &[Vertex] {
        &self.fill
    }

    /// The stroke (or fill-fringe) mesh, consumed as a triangle strip.
    pub fn stroke(&self) -> &[Vertex] {
        &self.stroke
    }

    /// Turns the appended point sequence into the canonical contour:
    /// detects closure, normalizes the winding to match the declared
    /// solidity, computes per-edge directions and lengths, and
    /// accumulates the bounding box.
    ///
    /// An empty path stays empty and inert; every later operation on it
    /// yields empty output rather than an error.
    pub fn flatten(&mut self) {
        if self.points.is_empty() {
            return;
        }

        // A trailing duplicate of the first point means the caller traced
        // the contour all the way around.
        if self.points.len() > 1 {
            let first = self.points[0];
            if self.points.last().unwrap().approx_eq(&first, self.dist_tol) {
                self.points.pop();
                self.closed = true;
            }
        }

        if self.points.len() > 2 {
            let area = polygon_area(&self.points);

            if (self.solidity == Solidity::Solid && area < 0.0)
                || (self.solidity == Solidity::Hole && area > 0.0)
            {
                self.points.reverse();
            }
        }

        for i in 0..self.points.len() {
            let p1 = self.points[i];

            let p0 = if i == 0 {
                self.points.last_mut().unwrap()
            } else {
                &mut self.points[i - 1]
            };

            p0.dpos = p1.pos - p0.pos;
            p0.len = p0.dpos.normalize();

            let pos = p0.pos;
            self.bounds.include(pos);
        }

        log::trace!(
            "flattened contour: {} points, closed: {}",
            self.points.len(),
            self.closed
        );
    }

    /// Classifies every join for the given stroke width: computes miter
    /// extrusion vectors, marks left turns, and decides miter vs. bevel
    /// vs. inner bevel per corner. Sets the convexity flag: `Convex`
    /// requires every point to turn the same way as the winding *and*
    /// the edge directions to sweep each axis exactly twice, which rules
    /// out self-intersecting contours whose turns are all one-sided.
    pub fn calculate_joins(&mut self, stroke_width: f32, line_join: LineJoin, miter_limit: f32) {
        if self.points.is_empty() {
            return;
        }

        let inv_stroke_width = if stroke_width > 0.0 { 1.0 / stroke_width } else { 0.0 };
        let mut nleft = 0;

        self.bevel = 0;

        let mut x_sign = 0;
        let mut y_sign = 0;
        let mut x_first_sign = 0; // Sign of the first nonzero edge vector x
        let mut y_first_sign = 0; // Sign of the first nonzero edge vector y
        let mut x_flips = 0; // Number of sign changes in x
        let mut y_flips = 0; // Number of sign changes in y

        for i in 0..self.points.len() {
            let p0 = if i == 0 {
                *self.points.last().unwrap()
            } else {
                self.points[i - 1]
            };

            let p1 = &mut self.points[i];

            let dl0 = p0.dpos.orthogonal();
            let dl1 = p1.dpos.orthogonal();

            // Miter extrusion: average of the adjacent edge normals,
            // rescaled so offsetting by it lands on the miter point. The
            // scale clamp bounds spikes at near-180-degree turns.
            p1.dmpos = (dl0 + dl1) * 0.5;
            let dmr2 = p1.dmpos.mag2();

            if dmr2 > 0.000_001 {
                let scale = (1.0 / dmr2).min(600.0);
                p1.dmpos *= scale;
            }

            // Keep only the corner flag from previous runs.
            p1.flags &= PointFlags::CORNER;

            let cross = p0.dpos.cross(p1.dpos);

            if cross > 0.0 {
                nleft += 1;
                p1.flags |= PointFlags::LEFT;
            }

            // Track how often the edge direction reverses along each axis.
            if p1.dpos.x > 0.0 {
                if x_sign == 0 {
                    x_first_sign = 1;
                } else if x_sign < 0 {
                    x_flips += 1;
                }
                x_sign = 1;
            } else if p1.dpos.x < 0.0 {
                if x_sign == 0 {
                    x_first_sign = -1;
                } else if x_sign > 0 {
                    x_flips += 1;
                }
                x_sign = -1;
            }

            if p1.dpos.y > 0.0 {
                if y_sign == 0 {
                    y_first_sign = 1;
                } else if y_sign < 0 {
                    y_flips += 1;
                }
                y_sign = 1;
            } else if p1.dpos.y < 0.0 {
                if y_sign == 0 {
                    y_first_sign = -1;
                } else if y_sign > 0 {
                    y_flips += 1;
                }
                y_sign = -1;
            }

            // The concave side of a sharp enough corner needs its own
            // bevel geometry; the threshold shrinks with the adjacent
            // edge lengths.
            let limit = (p0.len.min(p1.len) * inv_stroke_width).max(1.01);

            if (dmr2 * limit * limit) < 1.0 {
                p1.flags |= PointFlags::INNERBEVEL;
            }

            if p1.flags.contains(PointFlags::CORNER)
                && ((dmr2 * miter_limit * miter_limit) < 1.0
                    || line_join == LineJoin::Bevel
                    || line_join == LineJoin::Round)
            {
                p1.flags |= PointFlags::BEVEL;
            }

            if p1.flags.intersects(PointFlags::BEVEL | PointFlags::INNERBEVEL) {
                self.bevel += 1;
            }
        }

        // The wrap from the last edge back to the first may hide a flip.
        if x_sign != 0 && x_first_sign != 0 && x_sign != x_first_sign {
            x_flips += 1;
        }

        if y_sign != 0 && y_first_sign != 0 && y_sign != y_first_sign {
            y_flips += 1;
        }

        let convex = x_flips == 2 && y_flips == 2;

        self.convexity = if nleft == self.points.len() && convex {
            Convexity::Convex
        } else {
            Convexity::Concave
        };
    }

    /// Expands the contour into an antialiased stroke strip of the given
    /// half-width.
    ///
    /// Closed contours walk every point and re-emit the first offset pair
    /// at the end so the strip wraps with correct fringe interpolation.
    /// Open contours start and end with cap geometry instead. `u0`/`u1`
    /// are the texture coordinates baked into the left/right strip edges
    /// to drive the antialiasing ramp; `ncap` controls the resolution of
    /// round caps and round joins.
    ///
    /// A path with fewer than two points produces an empty buffer.
    #[allow(clippy::too_many_arguments)]
    pub fn expand_stroke(
        &mut self,
        fringe: f32,
        u0: f32,
        u1: f32,
        half_width: f32,
        line_cap: LineCap,
        line_join: LineJoin,
        ncap: usize,
    ) {
        self.stroke.clear();

        if self.points.len() < 2 {
            return;
        }

        let ncap = ncap.max(2);
        let looped = self.closed;

        let per_bevel = if line_join == LineJoin::Round { ncap + 2 } else { 5 };
        let mut cverts = (self.points.len() + self.bevel * per_bevel + 1) * 2;
        if !looped {
            cverts += if line_cap == LineCap::Round {
                (ncap * 2 + 2) * 2
            } else {
                12
            };
        }
        self.stroke.reserve(cverts);

        let (start, end, mut prev) = if looped {
            (0, self.points.len(), self.points.len() - 1)
        } else {
            (1, self.points.len() - 1, 0)
        };

        if !looped {
            let p0 = self.points[0];
            let p1 = self.points[1];
            let delta = segment_direction(&p0, &p1);

            match line_cap {
                LineCap::Butt => {
                    butt_cap_start(&mut self.stroke, &p0, delta, half_width, -fringe * 0.5, fringe, u0, u1)
                }
                LineCap::Square => butt_cap_start(
                    &mut self.stroke,
                    &p0,
                    delta,
                    half_width,
                    half_width - fringe,
                    fringe,
                    u0,
                    u1,
                ),
                LineCap::Round => round_cap_start(&mut self.stroke, &p0, delta, half_width, ncap, u0, u1),
            }
        }

        for i in start..end {
            let p0 = self.points[prev];
            let p1 = self.points[i];

            if p1.flags.intersects(PointFlags::BEVEL | PointFlags::INNERBEVEL) {
                if line_join == LineJoin::Round {
                    round_join(&mut self.stroke, &p0, &p1, half_width, half_width, u0, u1, ncap);
                } else {
                    bevel_join(&mut self.stroke, &p0, &p1, half_width, half_width, u0, u1);
                }
            } else {
                self.stroke.push(Vertex::pos(p1.pos + p1.dmpos * half_width, u0, 1.0));
                self.stroke.push(Vertex::pos(p1.pos - p1.dmpos * half_width, u1, 1.0));
            }

            prev = i;
        }

        if looped {
            // Duplicating the first offset pair closes the strip without
            // breaking the fringe interpolation.
            let v0 = self.stroke[0];
            let v1 = self.stroke[1];
            self.stroke.push(Vertex::new(v0.x, v0.y, u0, 1.0));
            self.stroke.push(Vertex::new(v1.x, v1.y, u1, 1.0));
        } else {
            let p0 = self.points[self.points.len() - 2];
            let p1 = self.points[self.points.len() - 1];
            let delta = segment_direction(&p0, &p1);

            match line_cap {
                LineCap::Butt => {
                    butt_cap_end(&mut self.stroke, &p1, delta, half_width, -fringe * 0.5, fringe, u0, u1)
                }
                LineCap::Square => butt_cap_end(
                    &mut self.stroke,
                    &p1,
                    delta,
                    half_width,
                    half_width - fringe,
                    fringe,
                    u0,
                    u1,
                ),
                LineCap::Round => round_cap_end(&mut self.stroke, &p1, delta, half_width, ncap, u0, u1),
            }
        }
    }

    /// Expands the contour into a fill mesh, optionally with an
    /// antialiasing fringe ring.
    ///
    /// Without a fringe the fill is one vertex per point and the stroke
    /// buffer is cleared. With a fringe the fill body is pulled inward by
    /// half the fringe width (with bevel-aware corner handling) and a
    /// thin stroke ring is emitted around the boundary; `convex` contours
    /// get a single-sided ring so they can be drawn without stenciling.
    ///
    /// A path with fewer than three points produces empty buffers.
    pub fn expand_fill(&mut self, fringe: f32, has_fringe: bool, convex: bool, half_width: f32) {
        self.fill.clear();
        self.stroke.clear();

        if self.points.len() < 3 {
            return;
        }

        let woff = 0.5 * fringe;

        let mut cverts = self.points.len() + self.bevel + 1;
        if has_fringe {
            cverts += (self.points.len() + self.bevel * 5 + 1) * 2;
            self.stroke.reserve((self.points.len() + self.bevel * 5 + 1) * 2);
        }
        self.fill.reserve(cverts);

        if has_fringe {
            let mut prev = self.points.len() - 1;

            for i in 0..self.points.len() {
                let p0 = self.points[prev];
                let p1 = self.points[i];

                if p1.flags.contains(PointFlags::BEVEL) {
                    if p1.flags.contains(PointFlags::LEFT) {
                        self.fill.push(Vertex::pos(p1.pos + p1.dmpos * woff, 0.5, 1.0));
                    } else {
                        self.fill
                            .push(Vertex::pos(p1.pos + p0.dpos.orthogonal() * woff, 0.5, 1.0));
                        self.fill
                            .push(Vertex::pos(p1.pos + p1.dpos.orthogonal() * woff, 0.5, 1.0));
                    }
                } else {
                    self.fill.push(Vertex::pos(p1.pos + p1.dmpos * woff, 0.5, 1.0));
                }

                prev = i;
            }
        } else {
            for point in &self.points {
                self.fill.push(Vertex::pos(point.pos, 0.5, 1.0));
            }
        }

        if has_fringe {
            let rw = half_width - woff;
            let ru = 1.0;

            // A convex interior never needs an inward coverage ramp, so
            // the outer side collapses to the body offset.
            let (lw, lu) = if convex {
                (woff, 0.5)
            } else {
                (half_width + woff, 0.0)
            };

            let mut prev = self.points.len() - 1;

            for i in 0..self.points.len() {
                let p0 = self.points[prev];
                let p1 = self.points[i];

                if p1.flags.intersects(PointFlags::BEVEL | PointFlags::INNERBEVEL) {
                    bevel_join(&mut self.stroke, &p0, &p1, lw, rw, lu, ru);
                } else {
                    self.stroke.push(Vertex::pos(p1.pos + p1.dmpos * lw, lu, 1.0));
                    self.stroke.push(Vertex::pos(p1.pos - p1.dmpos * rw, ru, 1.0));
                }

                prev = i;
            }

            let v0 = self.stroke[0];
            let v1 = self.stroke[1];
            self.stroke.push(Vertex::new(v0.x, v0.y, lu, 1.0));
            self.stroke.push(Vertex::new(v1.x, v1.y, ru, 1.0));
        }
    }
}

/// Number of segments needed to trace `arc` radians at `radius` without
/// deviating more than `tolerance` from the true circle. Callers use this
/// to pick the `ncap` argument of [`Path::expand_stroke`].
pub fn curve_divisions(radius: f32, arc: f32, tolerance: f32) -> usize {
    let da = (radius / (radius + tolerance)).acos() * 2.0;

    ((arc / da).ceil() as usize).max(2)
}

/// Signed area of the contour walk, trapezoid form. Positive for a walk
/// whose turns are all "left" in our cross convention.
fn polygon_area(points: &[Point]) -> f32 {
    let mut area = 0.0;
    let mut prev = points.len() - 1;

    for (i, p1) in points.iter().enumerate() {
        let p0 = &points[prev];
        area += (p1.pos.x - p0.pos.x) * (p1.pos.y + p0.pos.y);
        prev = i;
    }

    area * 0.5
}

/// Unit direction of the segment `p0 -> p1`. Falls back to the +x axis
/// when the segment is degenerate, so cap construction never sees NaN.
fn segment_direction(p0: &Point, p1: &Point) -> Vector {
    let mut delta = p1.pos - p0.pos;

    if delta.normalize() <= 1e-6 {
        delta = Vector::x(1.0);
    }

    delta
}

#[allow(clippy::too_many_arguments)]
fn butt_cap_start(verts: &mut Vec<Vertex>, p: &Point, delta: Vector, w: f32, d: f32, aa: f32, u0: f32, u1: f32) {
    let ppos = p.pos - delta * d;
    let dl = delta.orthogonal();

    verts.push(Vertex::pos(ppos + dl * w - delta * aa, u0, 0.0));
    verts.push(Vertex::pos(ppos - dl * w - delta * aa, u1, 0.0));
    verts.push(Vertex::pos(ppos + dl * w, u0, 1.0));
    verts.push(Vertex::pos(ppos - dl * w, u1, 1.0));
}

#[allow(clippy::too_many_arguments)]
fn butt_cap_end(verts: &mut Vec<Vertex>, p: &Point, delta: Vector, w: f32, d: f32, aa: f32, u0: f32, u1: f32) {
    let ppos = p.pos + delta * d;
    let dl = delta.orthogonal();

    verts.push(Vertex::pos(ppos + dl * w, u0, 1.0));
    verts.push(Vertex::pos(ppos - dl * w, u1, 1.0));
    verts.push(Vertex::pos(ppos + dl * w + delta * aa, u0, 0.0));
    verts.push(Vertex::pos(ppos - dl * w + delta * aa, u1, 0.0));
}

fn round_cap_start(verts: &mut Vec<Vertex>, p: &Point, delta: Vector, w: f32, ncap: usize, u0: f32, u1: f32) {
    let ppos = p.pos;
    let dl = delta.orthogonal();

    for i in 0..ncap {
        let a = i as f32 / (ncap - 1) as f32 * PI;
        let offset = Vector::from_angle(a).with_basis(-dl, -delta) * w;

        verts.push(Vertex::pos(ppos + offset, u0, 1.0));
        verts.push(Vertex::pos(ppos, 0.5, 1.0));
    }

    verts.push(Vertex::pos(ppos + dl * w, u0, 1.0));
    verts.push(Vertex::pos(ppos - dl * w, u1, 1.0));
}

fn round_cap_end(verts: &mut Vec<Vertex>, p: &Point, delta: Vector, w: f32, ncap: usize, u0: f32, u1: f32) {
    let ppos = p.pos;
    let dl = delta.orthogonal();

    verts.push(Vertex::pos(ppos + dl * w, u0, 1.0));
    verts.push(Vertex::pos(ppos - dl * w, u1, 1.0));

    for i in 0..ncap {
        let a = i as f32 / (ncap - 1) as f32 * PI;
        let offset = Vector::from_angle(a).with_basis(-dl, delta) * w;

        verts.push(Vertex::pos(ppos, 0.5, 1.0));
        verts.push(Vertex::pos(ppos + offset, u0, 1.0));
    }
}

/// Left/right edge anchor points for a join. Inner bevels anchor on the
/// two edge normals separately; otherwise both sides sit on the miter
/// extrusion.
fn choose_bevel(inner: bool, p0: &Point, p1: &Point, w: f32) -> (Position, Position) {
    if inner {
        (p1.pos + p0.dpos.orthogonal() * w, p1.pos + p1.dpos.orthogonal() * w)
    } else {
        let pos = p1.pos + p1.dmpos * w;
        (pos, pos)
    }
}

#[allow(clippy::too_many_arguments)]
fn round_join(verts: &mut Vec<Vertex>, p0: &Point, p1: &Point, lw: f32, rw: f32, lu: f32, ru: f32, ncap: usize) {
    let dl0 = p0.dpos.orthogonal();
    let dl1 = p1.dpos.orthogonal();

    if p1.flags.contains(PointFlags::LEFT) {
        let (l0, l1) = choose_bevel(p1.flags.contains(PointFlags::INNERBEVEL), p0, p1, lw);
        let a0 = (-dl0).angle();
        let mut a1 = (-dl1).angle();

        if a1 > a0 {
            a1 -= PI * 2.0;
        }

        verts.push(Vertex::pos(l0, lu, 1.0));
        verts.push(Vertex::pos(p1.pos - dl0 * rw, ru, 1.0));

        let n = (((a0 - a1) / PI * ncap as f32).ceil() as usize).clamp(2, ncap);

        for i in 0..n {
            let u = i as f32 / (n - 1) as f32;
            let a = a0 + u * (a1 - a0);
            let rpos = p1.pos + Vector::from_angle(a) * rw;

            verts.push(Vertex::pos(p1.pos, 0.5, 1.0));
            verts.push(Vertex::pos(rpos, ru, 1.0));
        }

        verts.push(Vertex::pos(l1, lu, 1.0));
        verts.push(Vertex::pos(p1.pos - dl1 * rw, ru, 1.0));
    } else {
        let (r0, r1) = choose_bevel(p1.flags.contains(PointFlags::INNERBEVEL), p0, p1, -rw);
        let a0 = dl0.angle();
        let mut a1 = dl1.angle();

        if a1 < a0 {
            a1 += PI * 2.0;
        }

        verts.push(Vertex::pos(p1.pos + dl0 * rw, lu, 1.0));
        verts.push(Vertex::pos(r0, ru, 1.0));

        let n = (((a1 - a0) / PI * ncap as f32).ceil() as usize).clamp(2, ncap);

        for i in 0..n {
            let u = i as f32 / (n - 1) as f32;
            let a = a0 + u * (a1 - a0);
            let lpos = p1.pos + Vector::from_angle(a) * lw;

            verts.push(Vertex::pos(lpos, lu, 1.0));
            verts.push(Vertex::pos(p1.pos, 0.5, 1.0));
        }

        verts.push(Vertex::pos(p1.pos + dl1 * rw, lu, 1.0));
        verts.push(Vertex::pos(r1, ru, 1.0));
    }
}

#[allow(clippy::branches_sharing_code)]
fn bevel_join(verts: &mut Vec<Vertex>, p0: &Point, p1: &Point, lw: f32, rw: f32, lu: f32, ru: f32) {
    let dl0 = p0.dpos.orthogonal();
    let dl1 = p1.dpos.orthogonal();

    if p1.flags.contains(PointFlags::LEFT) {
        let (l0, l1) = choose_bevel(p1.flags.contains(PointFlags::INNERBEVEL), p0, p1, lw);

        verts.push(Vertex::pos(l0, lu, 1.0));
        verts.push(Vertex::pos(p1.pos - dl0 * rw, ru, 1.0));

        if p1.flags.contains(PointFlags::BEVEL) {
            verts.push(Vertex::pos(l0, lu, 1.0));
            verts.push(Vertex::pos(p1.pos - dl0 * rw, ru, 1.0));

            verts.push(Vertex::pos(l1, lu, 1.0));
            verts.push(Vertex::pos(p1.pos - dl1 * rw, ru, 1.0));
        } else {
            let r0 = p1.pos - p1.dmpos * rw;

            verts.push(Vertex::pos(p1.pos, 0.5, 1.0));
            verts.push(Vertex::pos(p1.pos - dl0 * rw, ru, 1.0));

            verts.push(Vertex::pos(r0, ru, 1.0));
            verts.push(Vertex::pos(r0, ru, 1.0));

            verts.push(Vertex::pos(p1.pos, 0.5, 1.0));
            verts.push(Vertex::pos(p1.pos - dl1 * rw, ru, 1.0));
        }

        verts.push(Vertex::pos(l1, lu, 1.0));
        verts.push(Vertex::pos(p1.pos - dl1 * rw, ru, 1.0));
    } else {
        let (r0, r1) = choose_bevel(p1.flags.contains(PointFlags::INNERBEVEL), p0, p1, -rw);

        verts.push(Vertex::pos(p1.pos + dl0 * lw, lu, 1.0));
        verts.push(Vertex::pos(r0, ru, 1.0));

        if p1.flags.contains(PointFlags::BEVEL) {
            verts.push(Vertex::pos(p1.pos + dl0 * lw, lu, 1.0));
            verts.push(Vertex::pos(r0, ru, 1.0));

            verts.push(Vertex::pos(p1.pos + dl1 * lw, lu, 1.0));
            verts.push(Vertex::pos(r1, ru, 1.0));
        } else {
            let l0 = p1.pos + p1.dmpos * lw;

            verts.push(Vertex::pos(p1.pos + dl0 * lw, lu, 1.0));
            verts.push(Vertex::pos(p1.pos, 0.5, 1.0));

            verts.push(Vertex::pos(l0, lu, 1.0));
            verts.push(Vertex::pos(l0, lu, 1.0));

            verts.push(Vertex::pos(p1.pos + dl1 * lw, lu, 1.0));
            verts.push(Vertex::pos(p1.pos, 0.5, 1.0));
        }

        verts.push(Vertex::pos(p1.pos + dl1 * lw, lu, 1.0));
        verts.push(Vertex::pos(r1, ru, 1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f32) -> Path {
        let mut path = Path::new(Solidity::Solid);
        path.add_point(0.0, 0.0, PointFlags::CORNER);
        path.add_point(side, 0.0, PointFlags::CORNER);
        path.add_point(side, side, PointFlags::CORNER);
        path.add_point(0.0, side, PointFlags::CORNER);
        path.close();
        path.flatten();
        path
    }

    #[test]
    fn trailing_duplicate_closes_the_contour() {
        let mut path = Path::new(Solidity::Solid);
        path.add_point(0.0, 0.0, PointFlags::CORNER);
        path.add_point(10.0, 0.0, PointFlags::CORNER);
        path.add_point(10.0, 10.0, PointFlags::CORNER);
        path.add_point(0.0, 10.0, PointFlags::CORNER);
        path.add_point(0.0, 0.0, PointFlags::CORNER);
        path.flatten();

        assert_eq!(path.point_count(), 4);
        assert!(path.is_closed());
    }

    #[test]
    fn consecutive_near_duplicates_merge_flags() {
        let mut path = Path::new(Solidity::Solid);
        path.add_point(0.0, 0.0, PointFlags::empty());
        path.add_point(0.005, 0.0, PointFlags::CORNER);

        assert_eq!(path.point_count(), 1);
        assert!(path.points[0].flags.contains(PointFlags::CORNER));
    }

    #[test]
    fn flatten_is_idempotent_over_its_own_output() {
        let mut path = Path::new(Solidity::Solid);
        path.add_point(0.0, 0.0, PointFlags::CORNER);
        path.add_point(10.0, 0.0, PointFlags::CORNER);
        path.add_point(10.0, 0.004, PointFlags::CORNER);
        path.add_point(10.0, 10.0, PointFlags::CORNER);
        path.add_point(0.0, 10.0, PointFlags::CORNER);
        path.flatten();

        let positions: Vec<(f32, f32)> = path.points.iter().map(|p| (p.pos.x, p.pos.y)).collect();

        let mut again = Path::new(Solidity::Solid);
        for &(x, y) in &positions {
            again.add_point(x, y, PointFlags::CORNER);
        }
        again.flatten();

        assert_eq!(again.point_count(), path.point_count());
        for (p, &(x, y)) in again.points.iter().zip(&positions) {
            assert!((p.pos.x - x).abs() < 1e-6);
            assert!((p.pos.y - y).abs() < 1e-6);
        }
    }

    #[test]
    fn solid_winding_reverses_negative_area() {
        let mut path = Path::new(Solidity::Solid);
        path.add_point(0.0, 0.0, PointFlags::CORNER);
        path.add_point(10.0, 0.0, PointFlags::CORNER);
        path.add_point(10.0, 10.0, PointFlags::CORNER);
        path.add_point(0.0, 10.0, PointFlags::CORNER);

        assert!(polygon_area(&path.points) < 0.0);
        path.flatten();
        assert!(polygon_area(&path.points) > 0.0);

        // The walk was reversed in place.
        assert_eq!(path.points[0].pos, Position { x: 0.0, y: 10.0 });
    }

    #[test]
    fn hole_winding_keeps_negative_area() {
        let mut path = Path::new(Solidity::Hole);
        path.add_point(0.0, 0.0, PointFlags::CORNER);
        path.add_point(10.0, 0.0, PointFlags::CORNER);
        path.add_point(10.0, 10.0, PointFlags::CORNER);
        path.add_point(0.0, 10.0, PointFlags::CORNER);
        path.flatten();

        assert!(polygon_area(&path.points) < 0.0);
    }

    #[test]
    fn bounds_enclose_every_point() {
        let mut path = Path::new(Solidity::Solid);
        path.add_point(-3.0, 7.0, PointFlags::CORNER);
        path.add_point(12.0, -1.0, PointFlags::CORNER);
        path.add_point(5.0, 20.0, PointFlags::CORNER);
        path.flatten();

        let bounds = path.bounds();
        assert_eq!(bounds.minx, -3.0);
        assert_eq!(bounds.miny, -1.0);
        assert_eq!(bounds.maxx, 12.0);
        assert_eq!(bounds.maxy, 20.0);

        for p in &path.points {
            assert!(bounds.contains(p.pos.x, p.pos.y));
        }
    }

    #[test]
    fn single_point_path_is_inert() {
        let mut path = Path::new(Solidity::Solid);
        path.add_point(5.0, 5.0, PointFlags::CORNER);
        path.flatten();

        assert_eq!(path.point_count(), 1);
        assert!(path.bounds().contains(5.0, 5.0));

        path.calculate_joins(1.0, LineJoin::Miter, 10.0);
        path.expand_stroke(1.0, 0.0, 1.0, 1.0, LineCap::Butt, LineJoin::Miter, 8);
        assert!(path.stroke().is_empty());

        path.expand_fill(1.0, true, false, 1.0);
        assert!(path.fill().is_empty());
        assert!(path.stroke().is_empty());
    }

    #[test]
    fn empty_path_operations_are_no_ops() {
        let mut path = Path::new(Solidity::Solid);
        path.flatten();
        path.calculate_joins(1.0, LineJoin::Miter, 10.0);
        path.expand_stroke(1.0, 0.0, 1.0, 1.0, LineCap::Round, LineJoin::Round, 8);
        path.expand_fill(1.0, true, false, 1.0);

        assert!(path.is_empty());
        assert!(path.fill().is_empty());
        assert!(path.stroke().is_empty());
        assert_eq!(path.convexity(), Convexity::Unknown);
    }

    #[test]
    fn hexagon_is_convex() {
        let mut path = Path::new(Solidity::Solid);
        for i in 0..6 {
            let a = i as f32 / 6.0 * PI * 2.0;
            path.add_point(50.0 + a.cos() * 20.0, 50.0 + a.sin() * 20.0, PointFlags::CORNER);
        }
        path.close();
        path.flatten();
        path.calculate_joins(1.0, LineJoin::Miter, 10.0);

        assert_eq!(path.convexity(), Convexity::Convex);
        assert_eq!(path.bevel_count(), 0);
    }

    #[test]
    fn l_shape_is_concave_with_inner_bevel() {
        let mut path = Path::new(Solidity::Solid);
        path.add_point(0.0, 0.0, PointFlags::CORNER);
        path.add_point(10.0, 0.0, PointFlags::CORNER);
        path.add_point(10.0, 5.0, PointFlags::CORNER);
        path.add_point(5.0, 5.0, PointFlags::CORNER);
        path.add_point(5.0, 10.0, PointFlags::CORNER);
        path.add_point(0.0, 10.0, PointFlags::CORNER);
        path.close();
        path.flatten();
        path.calculate_joins(4.0, LineJoin::Miter, 10.0);

        assert_eq!(path.convexity(), Convexity::Concave);
        assert!(path.points.iter().any(|p| p.flags.contains(PointFlags::INNERBEVEL)));
    }

    #[test]
    fn pentagram_is_concave_despite_uniform_turns() {
        let mut path = Path::new(Solidity::Solid);
        path.add_point(50.0, 0.0, PointFlags::CORNER);
        path.add_point(21.0, 90.0, PointFlags::CORNER);
        path.add_point(98.0, 35.0, PointFlags::CORNER);
        path.add_point(2.0, 35.0, PointFlags::CORNER);
        path.add_point(79.0, 90.0, PointFlags::CORNER);
        path.close();
        path.flatten();
        path.calculate_joins(1.0, LineJoin::Miter, 10.0);

        // Every corner of the star turns the same way, but the contour
        // crosses itself: the edge directions reverse four times per
        // axis instead of the two a convex walk makes.
        assert!(path.points.iter().all(|p| p.flags.contains(PointFlags::LEFT)));
        assert_eq!(path.convexity(), Convexity::Concave);
    }

    #[test]
    fn clear_allows_reuse_across_frames() {
        let mut path = square(10.0);
        path.calculate_joins(1.0, LineJoin::Miter, 10.0);
        path.expand_stroke(1.0, 0.0, 1.0, 1.0, LineCap::Butt, LineJoin::Miter, 8);
        path.expand_fill(1.0, true, true, 1.0);

        path.clear();

        assert!(path.is_empty());
        assert!(!path.is_closed());
        assert_eq!(path.convexity(), Convexity::Unknown);
        assert_eq!(path.bevel_count(), 0);
        assert!(path.fill().is_empty());
        assert!(path.stroke().is_empty());
        assert!(!path.bounds().contains(5.0, 5.0));

        // Refill the same allocation with a different contour.
        path.add_point(0.0, 0.0, PointFlags::CORNER);
        path.add_point(30.0, 0.0, PointFlags::CORNER);
        path.add_point(30.0, 30.0, PointFlags::CORNER);
        path.add_point(0.0, 30.0, PointFlags::CORNER);
        path.close();
        path.flatten();
        path.calculate_joins(1.0, LineJoin::Miter, 10.0);
        path.expand_stroke(1.0, 0.0, 1.0, 1.0, LineCap::Butt, LineJoin::Miter, 8);

        assert_eq!(path.point_count(), 4);
        assert_eq!(path.convexity(), Convexity::Convex);
        assert_eq!(path.stroke().len(), 2 * 4 + 2);
        assert_eq!(path.bounds().maxx, 30.0);
    }

    #[test]
    fn closed_miter_stroke_vertex_count() {
        let mut path = square(10.0);
        path.calculate_joins(1.0, LineJoin::Miter, 10.0);
        path.expand_stroke(1.0, 0.0, 1.0, 1.0, LineCap::Butt, LineJoin::Miter, 8);

        // Two vertices per point plus the duplicated pair closing the strip.
        assert_eq!(path.stroke().len(), 2 * 4 + 2);

        let stroke = path.stroke();
        assert_eq!(stroke[stroke.len() - 2].x, stroke[0].x);
        assert_eq!(stroke[stroke.len() - 2].y, stroke[0].y);
        assert_eq!(stroke[stroke.len() - 1].x, stroke[1].x);
        assert_eq!(stroke[stroke.len() - 1].y, stroke[1].y);
    }

    #[test]
    fn closed_bevel_stroke_vertex_count() {
        let mut path = square(10.0);
        path.calculate_joins(1.0, LineJoin::Bevel, 10.0);
        assert_eq!(path.bevel_count(), 4);

        path.expand_stroke(1.0, 0.0, 1.0, 1.0, LineCap::Butt, LineJoin::Bevel, 8);

        // Eight vertices per outer bevel corner plus strip closure.
        assert_eq!(path.stroke().len(), 4 * 8 + 2);
    }

    #[test]
    fn closed_round_join_stroke_vertex_count() {
        let mut path = square(10.0);
        path.calculate_joins(1.0, LineJoin::Round, 10.0);
        path.expand_stroke(1.0, 0.0, 1.0, 1.0, LineCap::Butt, LineJoin::Round, 8);

        // A quarter turn at ncap = 8 resolves to a 4-segment arc fan:
        // 2 + 2*4 + 2 vertices per corner, plus strip closure.
        assert_eq!(path.stroke().len(), 4 * 12 + 2);
    }

    #[test]
    fn open_round_caps_vertex_count() {
        for ncap in [2usize, 5, 8, 16] {
            let mut path = Path::new(Solidity::Solid);
            path.add_point(0.0, 0.0, PointFlags::CORNER);
            path.add_point(10.0, 0.0, PointFlags::CORNER);
            path.flatten();
            path.calculate_joins(1.0, LineJoin::Miter, 10.0);
            path.expand_stroke(1.0, 0.0, 1.0, 1.0, LineCap::Round, LineJoin::Miter, ncap);

            // Each semicircular cap is ncap fan pairs plus one edge pair.
            assert_eq!(path.stroke().len(), 4 + 4 * ncap);
        }
    }

    #[test]
    fn open_butt_caps_vertex_count() {
        let mut path = Path::new(Solidity::Solid);
        path.add_point(0.0, 0.0, PointFlags::CORNER);
        path.add_point(10.0, 0.0, PointFlags::CORNER);
        path.flatten();
        path.calculate_joins(1.0, LineJoin::Miter, 10.0);
        path.expand_stroke(1.0, 0.0, 1.0, 1.0, LineCap::Butt, LineJoin::Miter, 8);

        assert_eq!(path.stroke().len(), 8);
    }

    #[test]
    fn open_three_point_miter_stroke() {
        let mut path = Path::new(Solidity::Solid);
        path.add_point(0.0, 0.0, PointFlags::CORNER);
        path.add_point(10.0, 0.0, PointFlags::CORNER);
        path.add_point(20.0, 0.0, PointFlags::CORNER);
        path.flatten();
        path.calculate_joins(1.0, LineJoin::Miter, 10.0);
        path.expand_stroke(1.0, 0.0, 1.0, 1.0, LineCap::Square, LineJoin::Miter, 8);

        // Two cap quads plus one interior offset pair.
        assert_eq!(path.stroke().len(), 4 + 2 + 4);
    }

    #[test]
    fn expand_stroke_is_idempotent() {
        let mut path = square(10.0);
        path.calculate_joins(1.0, LineJoin::Miter, 10.0);
        path.expand_stroke(1.0, 0.0, 1.0, 1.0, LineCap::Butt, LineJoin::Miter, 8);
        let first = path.stroke().to_vec();

        path.expand_stroke(1.0, 0.0, 1.0, 1.0, LineCap::Butt, LineJoin::Miter, 8);
        assert_eq!(path.stroke(), first.as_slice());
    }

    #[test]
    fn fill_without_fringe_uses_point_positions() {
        let mut path = square(10.0);
        path.calculate_joins(1.0, LineJoin::Miter, 2.4);
        path.expand_fill(1.0, false, true, 1.0);

        assert_eq!(path.fill().len(), 4);
        assert!(path.stroke().is_empty());

        for (v, p) in path.fill().iter().zip(&path.points) {
            assert_eq!(v.x, p.pos.x);
            assert_eq!(v.y, p.pos.y);
            assert_eq!(v.u, 0.5);
            assert_eq!(v.v, 1.0);
        }
    }

    #[test]
    fn convex_fill_fringe_ring() {
        let mut path = square(10.0);
        path.calculate_joins(1.0, LineJoin::Miter, 2.4);
        assert_eq!(path.convexity(), Convexity::Convex);

        path.expand_fill(1.0, true, true, 1.0);

        assert_eq!(path.fill().len(), 4);
        // One offset pair per point plus the duplicated closing pair.
        assert_eq!(path.stroke().len(), 2 * 4 + 2);

        // Convex paths get the single-sided fringe: the outer edge keeps
        // full coverage in u.
        assert_eq!(path.stroke()[0].u, 0.5);
        assert_eq!(path.stroke()[1].u, 1.0);

        // The fill body is pulled inward off the raw corner positions.
        for v in path.fill() {
            assert!(v.x > 0.0 && v.x < 10.0);
            assert!(v.y > 0.0 && v.y < 10.0);
        }
    }

    #[test]
    fn concave_fill_fringe_is_double_sided() {
        let mut path = Path::new(Solidity::Solid);
        path.add_point(0.0, 0.0, PointFlags::CORNER);
        path.add_point(10.0, 0.0, PointFlags::CORNER);
        path.add_point(10.0, 5.0, PointFlags::CORNER);
        path.add_point(5.0, 5.0, PointFlags::CORNER);
        path.add_point(5.0, 10.0, PointFlags::CORNER);
        path.add_point(0.0, 10.0, PointFlags::CORNER);
        path.close();
        path.flatten();
        path.calculate_joins(1.0, LineJoin::Miter, 2.4);
        assert_eq!(path.convexity(), Convexity::Concave);

        path.expand_fill(1.0, true, false, 1.0);

        assert!(!path.stroke().is_empty());
        // Double-sided fringe ramps from zero coverage on the outside.
        assert_eq!(path.stroke()[0].u, 0.0);
    }

    #[test]
    fn degenerate_final_segment_gets_unit_cap_direction() {
        // Zero tolerance lets coincident points through, producing a
        // zero-length segment.
        let mut path = Path::new(Solidity::Solid);
        path.set_distance_tolerance(0.0);
        path.add_point(5.0, 5.0, PointFlags::CORNER);
        path.add_point(5.0, 5.0, PointFlags::CORNER);
        path.flatten();
        path.calculate_joins(1.0, LineJoin::Miter, 10.0);
        path.expand_stroke(1.0, 0.0, 1.0, 1.0, LineCap::Square, LineJoin::Miter, 8);

        for v in path.stroke() {
            assert!(v.x.is_finite());
            assert!(v.y.is_finite());
        }
    }

    #[test]
    fn curve_divisions_grows_with_radius() {
        let coarse = curve_divisions(1.0, PI, 0.25);
        let fine = curve_divisions(40.0, PI, 0.25);

        assert!(coarse >= 2);
        assert!(fine > coarse);
    }
}
