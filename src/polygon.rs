//! Convex or non-convex 2-D polygon primitive and the collision kernel's core transforms.
//!
//! A [`Polygon`] is a value type: every transform (`rotated`, `translated`, `expanded_*`,
//! `place_as_*`) returns a freshly allocated polygon and never mutates its receiver. This makes
//! polygons safely shareable read-only.

use cgmath::{Basis2, Deg, InnerSpace, Point2, Rotation, Rotation2, Vector2};
use std::f64::consts::PI;

use crate::error::KernelError;

/// An ordered sequence of 2-D points, optionally closed (last point equal to first).
///
/// Two essentially-equivalent representations share this type: *closed* polygons (constructed
/// with `close = true`) and *open* polylines (single line segments, scratch lines). The overlap
/// algorithm treats both uniformly by iterating consecutive-vertex segments; a closed polygon's
/// explicit repeated last point is what turns the final segment into the closing edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    points: Vec<Point2<f64>>,
}

impl Polygon {
    /// Build a polygon from parallel x/y coordinate arrays.
    ///
    /// When `close` is true and the last point differs from the first, an explicit copy of the
    /// first point is appended. Fails with [`KernelError::ShapeMismatch`] if the arrays differ in
    /// length, or [`KernelError::NumericDegenerate`] if any coordinate is non-finite.
    pub fn new(xs: &[f64], ys: &[f64], close: bool) -> Result<Self, KernelError> {
        if xs.len() != ys.len() {
            return Err(KernelError::ShapeMismatch {
                x_len: xs.len(),
                y_len: ys.len(),
            });
        }

        let mut points = Vec::new();
        points
            .try_reserve_exact(xs.len() + close as usize)
            .map_err(|_| KernelError::OutOfMemory {
                requested: xs.len() + close as usize,
            })?;
        points.extend(xs.iter().zip(ys.iter()).map(|(&x, &y)| Point2::new(x, y)));

        if close {
            if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
                if first != last {
                    points.push(first);
                }
            }
        }

        for p in &points {
            if !p.x.is_finite() || !p.y.is_finite() {
                return Err(KernelError::NumericDegenerate);
            }
        }

        Ok(Self { points })
    }

    /// Build a polygon directly from already-constructed points, skipping the finite/shape
    /// checks `new` performs. Used internally by transforms that are known to preserve those
    /// invariants.
    fn from_points(points: Vec<Point2<f64>>) -> Self {
        Self { points }
    }

    /// Borrow the vertices, in order.
    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    /// Number of vertices (including the repeated closing vertex, for closed polygons).
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the polygon has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Rotate about the origin by `angle_deg` degrees, returning a new polygon.
    pub fn rotated(&self, angle_deg: f64) -> Self {
        let rot: Basis2<f64> = Rotation2::from_angle(Deg(angle_deg));
        Self::from_points(self.points.iter().map(|p| rot.rotate_point(*p)).collect())
    }

    /// Translate by `(dx, dy)`, returning a new polygon.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        let d = Vector2::new(dx, dy);
        Self::from_points(self.points.iter().map(|p| p + d).collect())
    }

    /// Move every point by `dr` along the ray from the origin through that point. Negative `dr`
    /// contracts toward the origin.
    ///
    /// A vertex exactly at the origin has an undefined direction to expand along (`atan2(0, 0)`
    /// is conventionally `0`, so such a point would move to `(dr, 0)`); input polygons are never
    /// expected to carry origin vertices, but a debug assertion catches the case early.
    pub fn expanded_radially(&self, dr: f64) -> Self {
        Self::from_points(
            self.points
                .iter()
                .map(|p| {
                    debug_assert!(
                        p.x != 0.0 || p.y != 0.0,
                        "expanded_radially on an origin vertex is undefined"
                    );
                    let theta = p.y.atan2(p.x);
                    Point2::new(p.x + dr * theta.cos(), p.y + dr * theta.sin())
                })
                .collect(),
        )
    }

    /// Fan points out from (or collapse toward) the x-axis by `da_deg` degrees: a point's polar
    /// angle increases by `da_deg` when positive, decreases when negative, and is unchanged when
    /// it sits exactly on the x-axis.
    pub fn expanded_angularly(&self, da_deg: f64) -> Self {
        let da = da_deg.to_radians();
        Self::from_points(
            self.points
                .iter()
                .map(|p| {
                    let r = (p.x * p.x + p.y * p.y).sqrt();
                    let theta = p.y.atan2(p.x);
                    let theta = match theta.partial_cmp(&0.0) {
                        Some(std::cmp::Ordering::Greater) => theta + da,
                        Some(std::cmp::Ordering::Less) => theta - da,
                        _ => theta,
                    };
                    Point2::new(r * theta.cos(), r * theta.sin())
                })
                .collect(),
        )
    }

    /// Add `right` to x for points with x > 0, subtract `left` from x for points with x < 0;
    /// points with x == 0 are unchanged.
    pub fn expanded_x(&self, left: f64, right: f64) -> Self {
        Self::from_points(
            self.points
                .iter()
                .map(|p| {
                    let x = match p.x.partial_cmp(&0.0) {
                        Some(std::cmp::Ordering::Greater) => p.x + right,
                        Some(std::cmp::Ordering::Less) => p.x - left,
                        _ => p.x,
                    };
                    Point2::new(x, p.y)
                })
                .collect(),
        )
    }

    /// Place a polygon defined in the phi-pivot frame into petal coordinates, given the
    /// positioner's pose: rotate by `(theta_deg + phi_deg)`, then translate by
    /// `(x0 + R1*cos(theta), y0 + R1*sin(theta))`.
    pub fn place_as_phi_arm(&self, theta_deg: f64, phi_deg: f64, x0: f64, y0: f64, r1: f64) -> Self {
        let theta_rad = theta_deg.to_radians();
        self.rotated(theta_deg + phi_deg).translated(
            x0 + r1 * theta_rad.cos(),
            y0 + r1 * theta_rad.sin(),
        )
    }

    /// Place a polygon defined in the positioner's local frame (theta axis at the origin) into
    /// petal coordinates: rotate by `theta_deg`, then translate by `(x0, y0)`.
    pub fn place_as_central_body(&self, theta_deg: f64, x0: f64, y0: f64) -> Self {
        self.rotated(theta_deg).translated(x0, y0)
    }

    /// Place a full-phi-range swept arc (built by [`crate::keepout::build_arc_p`]) into petal
    /// coordinates.
    ///
    /// `arcP[p]` already bakes in the phi-range centering and the `R1` translation during
    /// construction, so placing it needs only the remaining theta rotation and offset
    /// translation — the same transform as [`Polygon::place_as_central_body`], exposed under its
    /// own name because it is conceptually placing an arm sweep, not a body.
    pub fn place_as_phi_arc(&self, theta_deg: f64, x0: f64, y0: f64) -> Self {
        self.rotated(theta_deg).translated(x0, y0)
    }

    /// Place the shared ferrule disk at a positioner's arm tip: translate by `(r2, 0)` in the
    /// phi-pivot frame first (the disk sits at the end of the phi arm, `R2` out from the pivot),
    /// then place as the phi arm itself — rotate by `(theta_deg + phi_deg)` and translate by
    /// `(x0 + R1*cos(theta), y0 + R1*sin(theta))`.
    pub fn place_as_ferrule(
        &self,
        theta_deg: f64,
        phi_deg: f64,
        x0: f64,
        y0: f64,
        r1: f64,
        r2: f64,
    ) -> Self {
        self.translated(r2, 0.0).place_as_phi_arm(theta_deg, phi_deg, x0, y0, r1)
    }

    /// Axis-aligned bounding box as `(xmin, xmax, ymin, ymax)`, or `None` for an empty polygon.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut iter = self.points.iter();
        let first = iter.next()?;
        let mut xmin = first.x;
        let mut xmax = first.x;
        let mut ymin = first.y;
        let mut ymax = first.y;
        for p in iter {
            xmin = xmin.min(p.x);
            xmax = xmax.max(p.x);
            ymin = ymin.min(p.y);
            ymax = ymax.max(p.y);
        }
        Some((xmin, xmax, ymin, ymax))
    }

    /// Cheap bounding-box rejection followed by exact segment-intersection overlap test.
    ///
    /// No tolerance is applied: two segments "collide" when they cross in open parameter space or
    /// share an endpoint. Parallel segments (including collinear, overlapping ones) are treated as
    /// non-intersecting by design — tangent contact is not a collision.
    pub fn collides_with(&self, other: &Polygon) -> bool {
        let (Some(a), Some(b)) = (self.bounds(), other.bounds()) else {
            return false;
        };
        let (axmin, axmax, aymin, aymax) = a;
        let (bxmin, bxmax, bymin, bymax) = b;
        if axmax < bxmin || bxmax < axmin || aymax < bymin || bymax < aymin {
            return false;
        }
        segments_overlap(&self.points, &other.points)
    }

    /// True iff any vertex lies strictly inside the disk of radius `r` centered at `(cx, cy)`.
    ///
    /// This is an intentionally loose, cheap screen against circular "retracted" envelopes: it
    /// can miss a pure edge crossing that avoids every vertex. The calling classifier tolerates
    /// that compromise in exchange for speed.
    pub fn collides_with_circle(&self, cx: f64, cy: f64, r: f64) -> bool {
        let r2 = r * r;
        self.points.iter().any(|p| {
            let dx = p.x - cx;
            let dy = p.y - cy;
            dx * dx + dy * dy < r2
        })
    }

    /// Build a regular `npts`-sided polygon approximating a circle of the given `diameter`.
    ///
    /// `outside = false` inscribes the polygon (every vertex lies on the circle);
    /// `outside = true` circumscribes it (every edge is tangent to the circle). Fails with
    /// [`KernelError::InvalidArgument`] if `diameter <= 0` or `npts <= 2`.
    pub fn circle_poly_points(diameter: f64, npts: usize, outside: bool) -> Result<Self, KernelError> {
        if diameter <= 0.0 {
            return Err(KernelError::InvalidArgument("circle diameter must be positive"));
        }
        if npts <= 2 {
            return Err(KernelError::InvalidArgument(
                "circle resolution must exceed 2 points",
            ));
        }

        let radius = if outside {
            (diameter / 2.0) / (PI / npts as f64).cos()
        } else {
            diameter / 2.0
        };

        let mut xs = Vec::with_capacity(npts);
        let mut ys = Vec::with_capacity(npts);
        for i in 0..npts {
            let angle = 2.0 * PI * (i as f64) / (npts as f64);
            xs.push(radius * angle.cos());
            ys.push(radius * angle.sin());
        }
        Polygon::new(&xs, &ys, true)
    }
}

/// Signed 2-D cross product of `a` and `b`.
fn cross(a: Vector2<f64>, b: Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Exact 2-D segment intersection test. Parallel segments (det == 0) never intersect by
/// convention, matching the overlap algorithm's contract.
fn segments_intersect(a1: Point2<f64>, a2: Point2<f64>, b1: Point2<f64>, b2: Point2<f64>) -> bool {
    let da = a2 - a1;
    let db = b2 - b1;
    let det = cross(db, da);
    if det == 0.0 {
        return false;
    }
    let s = (da.x * (b1.y - a1.y) + da.y * (a1.x - b1.x)) / det;
    let t = (db.x * (a1.y - b1.y) + db.y * (b1.x - a1.x)) / -det;
    (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t)
}

/// Iterate every pair of consecutive-vertex segments across two vertex lists and short-circuit on
/// the first intersecting pair.
fn segments_overlap(a: &[Point2<f64>], b: &[Point2<f64>]) -> bool {
    if a.len() < 2 || b.len() < 2 {
        return false;
    }
    for i in 0..a.len() - 1 {
        for j in 0..b.len() - 1 {
            if segments_intersect(a[i], a[i + 1], b[j], b[j + 1]) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangle() -> Polygon {
        Polygon::new(&[0.0, 1.0, 1.0], &[0.0, 0.0, 1.0], true).unwrap()
    }

    fn signed_area(poly: &Polygon) -> f64 {
        let pts = poly.points();
        let mut area = 0.0;
        for i in 0..pts.len() - 1 {
            area += pts[i].x * pts[i + 1].y - pts[i + 1].x * pts[i].y;
        }
        area / 2.0
    }

    #[test]
    fn new_rejects_mismatched_arrays() {
        let err = Polygon::new(&[0.0, 1.0], &[0.0], true).unwrap_err();
        assert!(matches!(err, KernelError::ShapeMismatch { x_len: 2, y_len: 1 }));
    }

    #[test]
    fn new_appends_closing_vertex() {
        let p = Polygon::new(&[0.0, 1.0, 1.0], &[0.0, 0.0, 1.0], true).unwrap();
        assert_eq!(p.len(), 4);
        assert_eq!(p.points()[0], p.points()[3]);
    }

    #[test]
    fn new_rejects_non_finite() {
        let err = Polygon::new(&[0.0, f64::NAN], &[0.0, 1.0], false).unwrap_err();
        assert!(matches!(err, KernelError::NumericDegenerate));
    }

    #[test]
    fn rotation_preserves_vertex_count_and_signed_area() {
        let t = triangle();
        let rotated = t.rotated(37.0);
        assert_eq!(t.len(), rotated.len());
        assert_relative_eq!(signed_area(&t), signed_area(&rotated), epsilon = 1e-9);
    }

    #[test]
    fn translation_is_additive() {
        let t = triangle();
        let a = t.translated(1.0, 2.0).translated(3.0, -4.0);
        let b = t.translated(4.0, -2.0);
        for (p, q) in a.points().iter().zip(b.points()) {
            assert_relative_eq!(p.x, q.x, epsilon = 1e-9);
            assert_relative_eq!(p.y, q.y, epsilon = 1e-9);
        }
    }

    #[test]
    fn rotation_is_additive() {
        let t = triangle();
        let a = t.rotated(20.0).rotated(70.0);
        let b = t.rotated(90.0);
        for (p, q) in a.points().iter().zip(b.points()) {
            assert_relative_eq!(p.x, q.x, epsilon = 1e-9);
            assert_relative_eq!(p.y, q.y, epsilon = 1e-9);
        }
    }

    #[test]
    fn translate_then_inverse_is_identity() {
        let t = triangle();
        let round_trip = t.translated(5.0, -3.0).translated(-5.0, 3.0);
        for (p, q) in t.points().iter().zip(round_trip.points()) {
            assert_relative_eq!(p.x, q.x, epsilon = 1e-9);
            assert_relative_eq!(p.y, q.y, epsilon = 1e-9);
        }
    }

    #[test]
    fn rotate_then_inverse_is_identity() {
        let t = triangle();
        let round_trip = t.rotated(123.0).rotated(-123.0);
        for (p, q) in t.points().iter().zip(round_trip.points()) {
            assert_relative_eq!(p.x, q.x, epsilon = 1e-9);
            assert_relative_eq!(p.y, q.y, epsilon = 1e-9);
        }
    }

    #[test]
    fn expand_radially_then_inverse_is_identity() {
        let t = triangle().translated(5.0, 5.0); // keep every vertex off the origin
        let round_trip = t.expanded_radially(2.0).expanded_radially(-2.0);
        for (p, q) in t.points().iter().zip(round_trip.points()) {
            assert_relative_eq!(p.x, q.x, epsilon = 1e-9);
            assert_relative_eq!(p.y, q.y, epsilon = 1e-9);
        }
    }

    #[test]
    fn place_as_phi_arm_matches_explicit_composition() {
        let t = triangle();
        let (theta, phi, x0, y0, r1) = (20.0, -100.0, 10.0, -4.0, 3.0);
        let explicit = t.rotated(phi).translated(r1, 0.0).rotated(theta).translated(x0, y0);
        let placed = t.place_as_phi_arm(theta, phi, x0, y0, r1);
        for (p, q) in explicit.points().iter().zip(placed.points()) {
            assert_relative_eq!(p.x, q.x, epsilon = 1e-9);
            assert_relative_eq!(p.y, q.y, epsilon = 1e-9);
        }
    }

    // Scenario 1 — triangle self-overlap.
    #[test]
    fn triangle_self_and_translated_overlap() {
        let t = triangle();
        assert!(t.collides_with(&t));
        assert!(t.collides_with(&t.translated(0.5, 0.0)));
        assert!(!t.collides_with(&t.translated(10.0, 0.0)));
        assert!(t.collides_with(&t.translated(0.5, 0.0).rotated(30.0)));
    }

    // Scenario 2 — disjoint polylines rejected by the bounding-box check.
    #[test]
    fn disjoint_polyline_does_not_collide() {
        let xs: Vec<f64> = (0..10).map(|v| v as f64).collect();
        let ys: Vec<f64> = (10..20).map(|v| v as f64).collect();
        let a = Polygon::new(&xs, &ys, false).unwrap();
        let t = triangle();
        assert!(!a.collides_with(&t));
        assert!(a.collides_with(&a.rotated(45.0)));
    }

    #[test]
    fn bounding_box_rejection_is_sound() {
        let a = Polygon::new(&[0.0, 1.0, 1.0, 0.0], &[0.0, 0.0, 1.0, 1.0], true).unwrap();
        let b = a.translated(100.0, 100.0);
        assert!(!a.collides_with(&b));
    }

    #[test]
    fn circumscribed_circle_segments_are_tangent() {
        let diameter = 10.0;
        let n = 16;
        let poly = Polygon::circle_poly_points(diameter, n, true).unwrap();
        let r = diameter / 2.0;
        for i in 0..poly.len() - 1 {
            let a = poly.points()[i];
            let b = poly.points()[i + 1];
            // distance from origin to the line through a, b should equal r
            let edge = b - a;
            let numerator = (edge.x * a.y - edge.y * a.x).abs();
            let dist = numerator / edge.magnitude();
            assert_relative_eq!(dist, r, epsilon = 1e-9);
        }
    }

    #[test]
    fn inscribed_circle_vertices_lie_on_circle() {
        let diameter = 7.0;
        let n = 12;
        let poly = Polygon::circle_poly_points(diameter, n, false).unwrap();
        let r = diameter / 2.0;
        for p in poly.points() {
            let dist = (p.x * p.x + p.y * p.y).sqrt();
            assert_relative_eq!(dist, r, epsilon = 1e-9);
        }
    }

    #[test]
    fn circle_poly_points_rejects_bad_arguments() {
        assert!(Polygon::circle_poly_points(0.0, 8, true).is_err());
        assert!(Polygon::circle_poly_points(1.0, 2, true).is_err());
    }

    #[test]
    fn collides_with_circle_is_vertex_only() {
        let square = Polygon::new(&[-1.0, 1.0, 1.0, -1.0], &[-1.0, -1.0, 1.0, 1.0], true).unwrap();
        assert!(square.collides_with_circle(0.0, 0.0, 2.0));
        assert!(!square.collides_with_circle(0.0, 0.0, 1.0));
    }
}
