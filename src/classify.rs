//! Spatial collision classifier.
//!
//! Given two positioners' current poses (or one positioner and the petal's fixed envelopes),
//! decides which collision case applies and invokes the polygon kernel to confirm
//! it. The decision table is read top-to-bottom; cases `IV`/`III`/`II` have that relative
//! priority whenever more than one test in the same branch would otherwise fire.

use crate::keepout::FixedEnvelopes;
use crate::polygon::Polygon;
use crate::types::{CollisionCase, FixedCase, Pose};

/// Everything the classifier needs about one positioner: its placement, its unplaced keepouts,
/// and the flags that gate the Eo/Ei shortcuts. Borrowed from a [`crate::registry::Registry`]
/// for the duration of one classification call.
#[derive(Debug, Clone, Copy)]
pub struct PositionerGeom<'a> {
    /// Theta-axis offset x (mm, petal coordinates).
    pub x0: f64,
    /// Theta-axis offset y (mm, petal coordinates).
    pub y0: f64,
    /// Theta-arm length (mm), used to place the phi arm.
    pub r1: f64,
    /// Central-body keepout, local frame (unplaced).
    pub theta_body: &'a Polygon,
    /// Phi-arm keepout, phi-pivot frame (unplaced).
    pub phi_arm: &'a Polygon,
    /// Full-phi-range swept arc, if built (unplaced).
    pub phi_arc: Option<&'a Polygon>,
    /// Whether the caller has asserted this positioner's arm is parked.
    pub classified_as_retracted: bool,
}

impl<'a> PositionerGeom<'a> {
    fn placed_arm(&self, pose: Pose) -> Polygon {
        self.phi_arm.place_as_phi_arm(pose.theta, pose.phi, self.x0, self.y0, self.r1)
    }

    fn placed_body(&self, pose: Pose) -> Polygon {
        self.theta_body.place_as_central_body(pose.theta, self.x0, self.y0)
    }

    fn placed_arc(&self, theta_deg: f64) -> Option<Polygon> {
        self.phi_arc.map(|arc| arc.place_as_phi_arc(theta_deg, self.x0, self.y0))
    }
}

/// Petal-wide scalars the classifier needs beyond the two positioners' own geometry.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyConfig {
    /// `PHI_EO` (degrees).
    pub phi_eo_deg: f64,
    /// `PHI_EI` (degrees).
    pub phi_ei_deg: f64,
    /// `Eo` radius (mm) padded by `EO_RADIAL_TOL`, for the case-IV retracted-circle test.
    pub eo_radius_with_margin: f64,
}

fn within_eo(cfg: &ClassifyConfig, pose: Pose, geom: &PositionerGeom) -> bool {
    pose.phi >= cfg.phi_eo_deg || geom.classified_as_retracted
}

/// Classify a pair of positioners currently at `pose_a`/`pose_b`, per the six-branch decision
/// table: both retracted, one-sided retracted-circle shortcuts, one-sided body shortcuts, then
/// the general arm/body/arm cascade.
pub fn classify_pair(
    cfg: &ClassifyConfig,
    a: &PositionerGeom,
    pose_a: Pose,
    b: &PositionerGeom,
    pose_b: Pose,
) -> CollisionCase {
    let a_within_eo = within_eo(cfg, pose_a, a);
    let b_within_eo = within_eo(cfg, pose_b, b);

    // 1. Both within Eo -> no collision by geometry.
    if a_within_eo && b_within_eo {
        return CollisionCase::I;
    }

    // 2. A's arm not provably clear, B retracted: test A's arm against B's padded Eo circle.
    if !a_within_eo && b.classified_as_retracted {
        let arm_a = a.placed_arm(pose_a);
        return if arm_a.collides_with_circle(b.x0, b.y0, cfg.eo_radius_with_margin) {
            CollisionCase::IV
        } else {
            CollisionCase::I
        };
    }

    // 3. Symmetric case, roles swapped.
    if !b_within_eo && a.classified_as_retracted {
        let arm_b = b.placed_arm(pose_b);
        return if arm_b.collides_with_circle(a.x0, a.y0, cfg.eo_radius_with_margin) {
            CollisionCase::IV
        } else {
            CollisionCase::I
        };
    }

    let b_within_ei = pose_b.phi >= cfg.phi_ei_deg;
    let a_within_ei = pose_a.phi >= cfg.phi_ei_deg;

    // 4. A's arm not provably clear of Eo, B's arm provably clear of Ei: test A's arm vs B's body.
    if pose_a.phi < cfg.phi_eo_deg && b_within_ei {
        let arm_a = a.placed_arm(pose_a);
        let body_b = b.placed_body(pose_b);
        return if arm_a.collides_with(&body_b) { CollisionCase::III } else { CollisionCase::I };
    }

    // 5. Symmetric case, roles swapped.
    if pose_b.phi < cfg.phi_eo_deg && a_within_ei {
        let arm_b = b.placed_arm(pose_b);
        let body_a = a.placed_body(pose_a);
        return if arm_b.collides_with(&body_a) { CollisionCase::III } else { CollisionCase::I };
    }

    // 6. Neither shortcut applies: test body collisions before the more expensive arm-arm test,
    // in the classifier's intrinsic IV > III > II priority.
    let arm_a = a.placed_arm(pose_a);
    let arm_b = b.placed_arm(pose_b);
    let body_a = a.placed_body(pose_a);
    let body_b = b.placed_body(pose_b);

    if arm_a.collides_with(&body_b) {
        return CollisionCase::III;
    }
    if arm_b.collides_with(&body_a) {
        return CollisionCase::III;
    }
    if arm_a.collides_with(&arm_b) {
        return CollisionCase::II;
    }
    CollisionCase::I
}

/// Classify one positioner against the petal's fixed envelopes. Tests in `fixed.iter()` order
/// (PTL before GFA); the first envelope hit wins and is returned as its own pseudo-case.
///
/// `use_arc` selects the full-phi-range swept arc (if the positioner has one built) instead of
/// the arm placed at its exact current phi — used when phi is not yet known precisely enough to
/// trust the tighter test.
pub fn classify_fixed(
    a: &PositionerGeom,
    pose_a: Pose,
    fixed: &FixedEnvelopes,
    only: &[FixedCase],
    use_arc: bool,
) -> CollisionCase {
    let probe = if use_arc {
        match a.placed_arc(pose_a.theta) {
            Some(arc) => arc,
            None => a.placed_arm(pose_a),
        }
    } else {
        a.placed_arm(pose_a)
    };

    for (case, poly) in fixed.iter() {
        if !only.contains(&case) {
            continue;
        }
        if probe.collides_with(poly) {
            return case;
        }
    }
    CollisionCase::I
}

/// One side of the full-range phi variant's opponent: either a registered neighbor (tested with
/// its own body and its own arm-or-arc) or the petal's fixed envelopes.
#[derive(Debug, Clone, Copy)]
pub enum PhiRangeTarget<'a> {
    /// Test against a neighbor positioner at a known (or assumed worst-case) pose.
    Neighbor {
        /// The neighbor's geometry.
        geom: &'a PositionerGeom<'a>,
        /// The neighbor's pose. Only `theta` is required to be accurate; `phi` is ignored when
        /// `neighbor_use_arc` is true.
        pose: Pose,
        /// Use the neighbor's own full-range arc rather than its arm at `pose`.
        neighbor_use_arc: bool,
    },
    /// Test against the petal's fixed envelopes.
    Fixed {
        /// The fixed envelopes to test against.
        fixed: &'a FixedEnvelopes,
        /// Which fixed cases are reachable from `a` (only these are tested).
        only: &'a [FixedCase],
    },
}

/// Full-range phi variant: used to determine whether it is safe to unretract `a`'s phi arm
/// without knowing a neighbor's exact phi, by sweeping `a`'s arm through its entire mechanical
/// range and testing that swept locus instead of a single pose.
pub fn classify_phi_range(
    cfg: &ClassifyConfig,
    a: &PositionerGeom,
    theta_a: f64,
    target: PhiRangeTarget,
) -> CollisionCase {
    let arc_a = match a.placed_arc(theta_a) {
        Some(arc) => arc,
        None => return CollisionCase::I,
    };

    match target {
        PhiRangeTarget::Neighbor { geom, pose, neighbor_use_arc } => {
            let body = geom.placed_body(pose);
            if arc_a.collides_with(&body) {
                return CollisionCase::III;
            }
            let opponent_arm = if neighbor_use_arc {
                geom.placed_arc(pose.theta)
            } else {
                Some(geom.placed_arm(pose))
            };
            if let Some(opponent_arm) = opponent_arm {
                if arc_a.collides_with(&opponent_arm) {
                    return CollisionCase::II;
                }
            }
            if geom.classified_as_retracted
                && arc_a.collides_with_circle(geom.x0, geom.y0, cfg.eo_radius_with_margin)
            {
                return CollisionCase::IV;
            }
            CollisionCase::I
        }
        PhiRangeTarget::Fixed { fixed, only } => {
            for (case, poly) in fixed.iter() {
                if only.contains(&case) && arc_a.collides_with(poly) {
                    return case;
                }
            }
            CollisionCase::I
        }
    }
}
