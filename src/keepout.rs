//! Envelope & keepout builder.
//!
//! Translates raw configured polygon point lists and scalar parameters into the per-positioner
//! derived polygons consumed by the classifier: the placed fixed envelopes, the per-positioner
//! `T[p]`/`P[p]`/`arcP[p]` keepouts (phi-pivot frame, ready for [`Polygon::place_as_phi_arm`] /
//! [`Polygon::place_as_central_body`]), the circular clear-rotation envelopes, and the shared
//! ferrule disk (ready for [`Polygon::place_as_ferrule`]).

use crate::error::KernelError;
use crate::polygon::Polygon;
use crate::transform::PoslocTransform;
use crate::types::FixedCase;

/// The petal perimeter and guide camera keepouts, already rotated and translated into petal
/// coordinates at load time.
#[derive(Debug, Clone)]
pub struct FixedEnvelopes {
    /// Petal perimeter envelope, in petal coordinates.
    pub keepout_ptl: Polygon,
    /// Guide camera envelope, in petal coordinates.
    pub keepout_gfa: Polygon,
}

impl FixedEnvelopes {
    /// Rotate each raw polygon by `petal_rot_deg` then translate by `(petal_x0, petal_y0)`.
    pub fn load(
        keepout_ptl_raw: &Polygon,
        keepout_gfa_raw: &Polygon,
        petal_x0: f64,
        petal_y0: f64,
        petal_rot_deg: f64,
    ) -> Self {
        Self {
            keepout_ptl: keepout_ptl_raw.rotated(petal_rot_deg).translated(petal_x0, petal_y0),
            keepout_gfa: keepout_gfa_raw.rotated(petal_rot_deg).translated(petal_x0, petal_y0),
        }
    }

    /// Borrow the polygon for a given fixed case.
    pub fn polygon_for(&self, case: FixedCase) -> &Polygon {
        match case {
            FixedCase::Ptl => &self.keepout_ptl,
            FixedCase::Gfa => &self.keepout_gfa,
        }
    }

    /// Iterate `(case, polygon)` pairs, in a stable PTL-then-GFA order.
    pub fn iter(&self) -> impl Iterator<Item = (FixedCase, &Polygon)> {
        [
            (FixedCase::Ptl, &self.keepout_ptl),
            (FixedCase::Gfa, &self.keepout_gfa),
        ]
        .into_iter()
    }
}

/// The three nested clear-rotation circles for one positioner location, plus the
/// margin-padded `Eo` used against neighbors classified as retracted.
#[derive(Debug, Clone)]
pub struct CircleEnvelopes {
    /// Smallest circle guaranteed to contain the phi arm once `phi >= PHI_EO`.
    pub eo: Polygon,
    /// Smallest circle guaranteed to contain the phi arm once `phi >= PHI_EI`.
    pub ei: Polygon,
    /// Circle containing the arm at any reachable phi; used only for neighbor discovery.
    pub ee: Polygon,
    /// Radius (mm) of the `Eo` circle padded by `EO_RADIAL_TOL`, used by the case-IV retracted
    /// circle test. Kept as a scalar (not a polygon) because that test is a cheap
    /// vertex-in-disk check against a raw radius, not a polygon overlap.
    pub eo_radius_with_margin: f64,
}

impl CircleEnvelopes {
    /// Construct circumscribed circle polygons for `Eo`, `Ei`, `Ee`. `eo_radius_with_margin` is
    /// taken as already computed by the caller (the registry derives it once from
    /// `ENVELOPE_EO`/`EO_RADIAL_TOL` and hands the same value to every positioner's circles and
    /// to the classifier, so the two never drift apart).
    pub fn build(
        eo_diam: f64,
        ei_diam: f64,
        ee_diam: f64,
        resolution_eo: usize,
        resolution_ei: usize,
        resolution_ee: usize,
        eo_radius_with_margin: f64,
    ) -> Result<Self, KernelError> {
        Ok(Self {
            eo: Polygon::circle_poly_points(eo_diam, resolution_eo, true)?,
            ei: Polygon::circle_poly_points(ei_diam, resolution_ei, true)?,
            ee: Polygon::circle_poly_points(ee_diam, resolution_ee, true)?,
            eo_radius_with_margin,
        })
    }
}

/// Build the shared ferrule disk, one per petal: a circle of `ferrule_diameter_mm` approximated
/// by `ferrule_resolution` points. Unplaced — [`Polygon::place_as_ferrule`] positions it at a
/// specific positioner's arm tip using that positioner's `R2`.
pub fn build_ferrule(ferrule_diameter_mm: f64, ferrule_resolution: usize) -> Result<Polygon, KernelError> {
    Polygon::circle_poly_points(ferrule_diameter_mm, ferrule_resolution, true)
}

/// Fixed-order transform sequence building `P[p]`: copy -> `expanded_radially(dR_P)` ->
/// `expanded_angularly(dA_P)` -> `translated(R1_err, 0)` -> `expanded_x(R1_err, max(R2_err, 0))`.
///
/// `R1_err = R1[p] - R1_nominal`, `R2_err = R2[p] - R2_nominal`. The R2 error is clamped
/// non-negative before use because the true mechanical shape can only safely grow, never
/// contract, from the nominal keepout.
pub fn build_phi_arm(
    general_keepout_p_raw: &Polygon,
    dr_p: f64,
    da_p: f64,
    r1: f64,
    r1_nominal: f64,
    r2: f64,
    r2_nominal: f64,
) -> Polygon {
    let r1_err = r1 - r1_nominal;
    let r2_err = (r2 - r2_nominal).max(0.0);
    general_keepout_p_raw
        .expanded_radially(dr_p)
        .expanded_angularly(da_p)
        .translated(r1_err, 0.0)
        .expanded_x(r1_err, r2_err)
}

/// Fixed-order transform sequence building `T[p]`: copy -> `expanded_radially(dR_T)` ->
/// `expanded_angularly(dA_T)`.
pub fn build_theta_body(general_keepout_t_raw: &Polygon, dr_t: f64, da_t: f64) -> Polygon {
    general_keepout_t_raw.expanded_radially(dr_t).expanded_angularly(da_t)
}

/// Build the swept locus of `P[p]` over the full mechanical phi range, for use when phi cannot be
/// bounded more tightly (e.g. before a positioner's exact pose is known).
///
/// Algorithm: expand the nominal phi arm angularly by half the full travel range (which leaves
/// the tip vertex on the +x axis untouched, since `expanded_angularly` is a no-op exactly at
/// `theta == 0`); locate that tip vertex and its radial distance `r` from the origin; replace it
/// with a polyline of `n_arc + 1` points tracing a circular arc of radius `r` spanning the full
/// travel range, centred on the +x axis; rotate the whole composite by the centre of the phi
/// range (converted from internal-TP to poslocTP via `transform`); translate by `(r1, 0)`.
///
/// Returns `Err(KernelError::InvalidArgument)` if `phi_arm` carries no vertex exactly on the
/// positive x-axis (nothing to splice the arc into) — such an arm keepout does not describe a
/// positioner with a single well-defined nominal tip direction.
pub fn build_arc_p(
    phi_arm: &Polygon,
    phi_range_min_deg: f64,
    phi_range_max_deg: f64,
    n_arc: usize,
    r1: f64,
    transform: &dyn PoslocTransform,
) -> Result<Polygon, KernelError> {
    let angular_range = phi_range_max_deg - phi_range_min_deg;

    let tip_idx = phi_arm
        .points()
        .iter()
        .position(|p| p.x > 0.0 && p.y == 0.0)
        .ok_or(KernelError::InvalidArgument(
            "phi arm keepout has no vertex on the positive x-axis to sweep an arc from",
        ))?;
    let tip = phi_arm.points()[tip_idx];
    let r = (tip.x * tip.x + tip.y * tip.y).sqrt();

    let expanded = phi_arm.expanded_angularly(angular_range / 2.0);

    let half_range_rad = angular_range.to_radians() / 2.0;
    let mut arc_xs = Vec::with_capacity(n_arc + 1);
    let mut arc_ys = Vec::with_capacity(n_arc + 1);
    for i in 0..=n_arc {
        let frac = i as f64 / n_arc as f64;
        let angle = -half_range_rad + frac * 2.0 * half_range_rad;
        arc_xs.push(r * angle.cos());
        arc_ys.push(r * angle.sin());
    }

    let mut xs: Vec<f64> = expanded.points()[..tip_idx].iter().map(|p| p.x).collect();
    xs.extend(arc_xs);
    xs.extend(expanded.points()[tip_idx + 1..].iter().map(|p| p.x));

    let mut ys: Vec<f64> = expanded.points()[..tip_idx].iter().map(|p| p.y).collect();
    ys.extend(arc_ys);
    ys.extend(expanded.points()[tip_idx + 1..].iter().map(|p| p.y));

    let composite = Polygon::new(&xs, &ys, true)?;

    let (_internal_center_theta, center_phi) =
        transform.internal_to_posloc(0.0, (phi_range_min_deg + phi_range_max_deg) / 2.0);

    Ok(composite.rotated(center_phi).translated(r1, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::IdentityTransform;

    fn square_arm() -> Polygon {
        // a "paddle" shape with its tip on the +x axis
        Polygon::new(&[0.0, 10.0, 10.0, 0.0], &[-1.0, -1.0, 1.0, 1.0], true).unwrap()
    }

    #[test]
    fn build_phi_arm_applies_sequence_in_order() {
        let base = square_arm();
        let out = build_phi_arm(&base, 0.1, 1.0, 3.2, 3.0, 3.1, 3.0);
        let expected = base
            .expanded_radially(0.1)
            .expanded_angularly(1.0)
            .translated(0.2, 0.0)
            .expanded_x(0.2, 0.1);
        assert_eq!(out, expected);
    }

    #[test]
    fn build_phi_arm_clamps_negative_r2_err() {
        let base = square_arm();
        let out = build_phi_arm(&base, 0.0, 0.0, 3.0, 3.0, 2.5, 3.0);
        let expected = base
            .expanded_radially(0.0)
            .expanded_angularly(0.0)
            .translated(0.0, 0.0)
            .expanded_x(0.0, 0.0);
        assert_eq!(out, expected);
    }

    #[test]
    fn fixed_envelopes_are_placed_into_petal_coordinates() {
        let raw = square_arm();
        let placed = FixedEnvelopes::load(&raw, &raw, 100.0, -50.0, 0.0);
        for (p, q) in placed.keepout_ptl.points().iter().zip(raw.points()) {
            assert_eq!(p.x, q.x + 100.0);
            assert_eq!(p.y, q.y - 50.0);
        }
    }

    #[test]
    fn circle_envelopes_carry_the_radius_they_were_given() {
        let circles = CircleEnvelopes::build(10.0, 8.0, 20.0, 16, 16, 16, 5.5).unwrap();
        assert_eq!(circles.eo_radius_with_margin, 5.5);
    }

    #[test]
    fn build_ferrule_produces_closed_circle() {
        let ferrule = build_ferrule(4.0, 12).unwrap();
        assert_eq!(ferrule.points().first(), ferrule.points().last());
        assert_eq!(ferrule.len(), 13);
    }

    /// A paddle with an explicit vertex on the +x axis, for `build_arc_p`'s tip-splice step.
    fn tipped_arm() -> Polygon {
        Polygon::new(
            &[0.0, 0.0, 8.0, 10.0, 8.0],
            &[-1.0, 1.0, 1.0, 0.0, -1.0],
            true,
        )
        .unwrap()
    }

    #[test]
    fn build_arc_p_produces_closed_finite_polygon() {
        let arm = tipped_arm();
        let arc = build_arc_p(&arm, -180.0, 180.0, 8, 3.0, &IdentityTransform).unwrap();
        assert_eq!(arc.points().first(), arc.points().last());
        assert!(arc.points().iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn build_arc_p_rejects_tipless_arm() {
        let no_tip = square_arm();
        assert!(build_arc_p(&no_tip, -100.0, 100.0, 4, 3.0, &IdentityTransform).is_err());
    }
}
