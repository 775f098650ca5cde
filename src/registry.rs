//! Positioner registry.
//!
//! Owns calibration and derived keepouts for every registered positioner on a petal, and the
//! neighbor / fixed-case sets the driver and classifier consult. The registry never reads
//! global/process state: every scalar and raw polygon it needs comes from the
//! [`PetalConfig`]/[`PositionerConfig`] the caller constructs and passes in explicitly.

use std::collections::HashMap;

use log::{debug, warn};

use crate::classify::{ClassifyConfig, PositionerGeom};
use crate::config::{PetalConfig, PositionerConfig};
use crate::error::KernelError;
use crate::keepout::{self, CircleEnvelopes, FixedEnvelopes};
use crate::polygon::Polygon;
use crate::transform::PoslocTransform;
use crate::types::{FixedCase, Pose};

const MAX_NEIGHBORS: usize = 6;

/// One registered positioner's calibration, derived keepouts, and neighbor sets.
#[derive(Debug, Clone)]
pub struct PositionerRecord {
    /// Dense 1-based animation index, assigned at [`Registry::add`] time.
    pub anim_index: usize,
    /// Integer device location, used by the locational neighbor strategy.
    pub device_loc: i64,
    /// Last calibration supplied for this positioner.
    pub calib: PositionerConfig,
    /// `T[p]`: central-body keepout, local frame.
    pub theta_body: Polygon,
    /// `P[p]`: phi-arm keepout, phi-pivot frame.
    pub phi_arm: Polygon,
    /// `arcP[p]`: full-phi-range swept locus, if built.
    pub phi_arc: Option<Polygon>,
    /// This positioner location's clear-rotation circles.
    pub circles: CircleEnvelopes,
    /// Other positioners this one can possibly interact with.
    pub neighbors: Vec<String>,
    /// Fixed envelopes this positioner's arm can reach.
    pub fixed_cases: Vec<FixedCase>,
}

/// Owns every registered positioner on one petal plus the petal-wide fixed envelopes and circle
/// parameters they are built from.
#[derive(Debug)]
pub struct Registry {
    config: PetalConfig,
    general_keepout_p_raw: Polygon,
    general_keepout_t_raw: Polygon,
    keepout_ptl_raw: Polygon,
    keepout_gfa_raw: Polygon,
    fixed: FixedEnvelopes,
    ferrule_raw: Polygon,
    eo_radius_with_margin: f64,
    positioners: HashMap<String, PositionerRecord>,
    next_anim_index: usize,
}

impl Registry {
    /// Build a new registry from a petal configuration, loading the fixed envelopes immediately.
    pub fn new(config: PetalConfig) -> Result<Self, KernelError> {
        let general_keepout_p_raw =
            Polygon::new(&config.general_keepout_p_raw.0, &config.general_keepout_p_raw.1, true)?;
        let general_keepout_t_raw =
            Polygon::new(&config.general_keepout_t_raw.0, &config.general_keepout_t_raw.1, true)?;
        let keepout_ptl_raw = Polygon::new(&config.keepout_ptl_raw.0, &config.keepout_ptl_raw.1, true)?;
        let keepout_gfa_raw = Polygon::new(&config.keepout_gfa_raw.0, &config.keepout_gfa_raw.1, true)?;

        let fixed = FixedEnvelopes::load(
            &keepout_ptl_raw,
            &keepout_gfa_raw,
            config.petal_x0,
            config.petal_y0,
            config.petal_rotation_deg,
        );

        let ferrule_raw = keepout::build_ferrule(config.ferrule_diameter_mm, config.ferrule_resolution)?;
        let eo_radius_with_margin = config.eo_radial_tol_mm + config.envelope_eo_mm / 2.0;

        Ok(Self {
            config,
            general_keepout_p_raw,
            general_keepout_t_raw,
            keepout_ptl_raw,
            keepout_gfa_raw,
            fixed,
            ferrule_raw,
            eo_radius_with_margin,
            positioners: HashMap::new(),
            next_anim_index: 1,
        })
    }

    /// Borrow the loaded fixed envelopes.
    pub fn fixed_envelopes(&self) -> &FixedEnvelopes {
        &self.fixed
    }

    /// Petal-wide classification scalars (PHI_EO/PHI_EI/Eo-with-margin radius). Positioner
    /// locations enter the classifier separately via [`Registry::geom`].
    pub fn classify_config(&self) -> ClassifyConfig {
        ClassifyConfig {
            phi_eo_deg: self.config.phi_eo_deg,
            phi_ei_deg: self.config.phi_ei_deg,
            eo_radius_with_margin: self.eo_radius_with_margin,
        }
    }

    /// Place the shared ferrule disk at `posid`'s arm tip for pose `(theta, phi)`, scaled out to
    /// that positioner's own `R2`. Intended for animation/reporting, not the collision kernel
    /// itself, which never tests the ferrule.
    pub fn place_ferrule(&self, posid: &str, pose: Pose) -> Result<Polygon, KernelError> {
        let calib = self
            .positioners
            .get(posid)
            .ok_or_else(|| KernelError::UnknownPositioner(posid.to_string()))?
            .calib;
        Ok(self.ferrule_raw.place_as_ferrule(pose.theta, pose.phi, calib.x0, calib.y0, calib.r1, calib.r2))
    }

    /// Register a new positioner, building its derived keepouts and circles from `calib`.
    /// Assigns the next dense 1-based animation index.
    pub fn add(&mut self, posid: impl Into<String>, device_loc: i64, calib: PositionerConfig) -> Result<(), KernelError> {
        let posid = posid.into();
        let record = self.build_record(device_loc, calib)?;
        let anim_index = self.next_anim_index;
        self.next_anim_index += 1;
        debug!(target: "petal_anticollision::registry", "registered positioner {posid} at device_loc {device_loc} (anim_index {anim_index})");
        self.positioners.insert(posid, PositionerRecord { anim_index, ..record });
        Ok(())
    }

    fn build_record(&self, device_loc: i64, calib: PositionerConfig) -> Result<PositionerRecord, KernelError> {
        if !calib.is_finite() {
            return Err(KernelError::NumericDegenerate);
        }

        let theta_body = keepout::build_theta_body(
            &self.general_keepout_t_raw,
            calib.keepout_expansion_theta_radial,
            calib.keepout_expansion_theta_angular,
        );
        let phi_arm = keepout::build_phi_arm(
            &self.general_keepout_p_raw,
            calib.keepout_expansion_phi_radial,
            calib.keepout_expansion_phi_angular,
            calib.r1,
            self.config.r1_nominal,
            calib.r2,
            self.config.r2_nominal,
        );
        let circles = CircleEnvelopes::build(
            self.config.envelope_eo_mm,
            self.config.envelope_ei_mm,
            self.config.envelope_ee_mm,
            self.config.resolution_eo,
            self.config.resolution_ei,
            self.config.resolution_ee,
            self.eo_radius_with_margin,
        )?;

        Ok(PositionerRecord {
            anim_index: 0,
            device_loc,
            calib,
            theta_body,
            phi_arm,
            phi_arc: None,
            circles,
            neighbors: Vec::new(),
            fixed_cases: Vec::new(),
        })
    }

    /// Build this positioner's full-phi-range swept arc (`arcP[p]`), using `transform` to
    /// convert the mechanical phi range's centre from internal-TP to poslocTP.
    pub fn build_arc_for(&mut self, posid: &str, transform: &dyn PoslocTransform) -> Result<(), KernelError> {
        let r1 = self
            .positioners
            .get(posid)
            .ok_or_else(|| KernelError::UnknownPositioner(posid.to_string()))?
            .calib
            .r1;
        let phi_arm = self.positioners[posid].phi_arm.clone();
        let arc = keepout::build_arc_p(
            &phi_arm,
            self.config.phi_range_min_deg,
            self.config.phi_range_max_deg,
            self.config.arc_resolution,
            r1,
            transform,
        )?;
        self.positioners.get_mut(posid).unwrap().phi_arc = Some(arc);
        Ok(())
    }

    /// Re-read `calib` for every registered positioner and rebuild per-positioner keepouts and
    /// circles. Neighbor sets are left untouched — call [`Registry::identify_neighbors`]
    /// afterward if calibration changed enough to matter.
    pub fn refresh_calibrations(&mut self, calibrations: &HashMap<String, PositionerConfig>) -> Result<(), KernelError> {
        for (posid, calib) in calibrations {
            let device_loc = self
                .positioners
                .get(posid)
                .ok_or_else(|| KernelError::UnknownPositioner(posid.clone()))?
                .device_loc;
            let anim_index = self.positioners[posid].anim_index;
            let neighbors = self.positioners[posid].neighbors.clone();
            let fixed_cases = self.positioners[posid].fixed_cases.clone();
            let rebuilt = self.build_record(device_loc, *calib)?;
            self.positioners.insert(
                posid.clone(),
                PositionerRecord { anim_index, neighbors, fixed_cases, ..rebuilt },
            );
            debug!(target: "petal_anticollision::registry", "refreshed calibration for {posid}");
        }
        Ok(())
    }

    /// Build `neighbors[p]` and `fixed_cases[p]` for `posid` using the geometric (`Ee`-vs-`Ee`)
    /// strategy, falling back to the locational `device_loc` map from [`PetalConfig`] when
    /// present to skip positioners that cannot possibly be adjacent.
    pub fn identify_neighbors(&mut self, posid: &str) -> Result<(), KernelError> {
        let (x0, y0, device_loc, ee) = {
            let rec = self
                .positioners
                .get(posid)
                .ok_or_else(|| KernelError::UnknownPositioner(posid.to_string()))?;
            (rec.calib.x0, rec.calib.y0, rec.device_loc, rec.circles.ee.clone())
        };
        let ee_here = ee.translated(x0, y0);

        let candidate_locs: Option<std::collections::HashSet<i64>> =
            self.config.device_loc_neighbors.as_ref().map(|map| {
                map.get(&device_loc).into_iter().flatten().copied().collect()
            });

        let mut neighbors = Vec::new();
        for (other_id, other_rec) in &self.positioners {
            if other_id == posid {
                continue;
            }
            if let Some(locs) = &candidate_locs {
                if !locs.contains(&other_rec.device_loc) {
                    continue;
                }
            }
            let ee_other = other_rec.circles.ee.translated(other_rec.calib.x0, other_rec.calib.y0);
            if ee_here.collides_with(&ee_other) {
                neighbors.push(other_id.clone());
            }
        }

        if neighbors.len() > MAX_NEIGHBORS {
            warn!(
                target: "petal_anticollision::registry",
                "positioner {posid} has {} geometric neighbors, exceeding the hex bound of {MAX_NEIGHBORS}",
                neighbors.len()
            );
            return Err(KernelError::CalibrationInvalid { posid: posid.to_string(), count: neighbors.len() });
        }

        let mut fixed_cases = Vec::new();
        for (case, poly) in self.fixed.iter() {
            if ee_here.collides_with(poly) {
                fixed_cases.push(case);
            }
        }

        debug!(
            target: "petal_anticollision::registry",
            "positioner {posid}: {} neighbors, fixed_cases {:?}",
            neighbors.len(),
            fixed_cases
        );

        let rec = self.positioners.get_mut(posid).unwrap();
        rec.neighbors = neighbors;
        rec.fixed_cases = fixed_cases;
        Ok(())
    }

    /// Borrow a positioner's geometry for use by the classifier.
    pub fn geom(&self, posid: &str) -> Result<PositionerGeom<'_>, KernelError> {
        let rec = self
            .positioners
            .get(posid)
            .ok_or_else(|| KernelError::UnknownPositioner(posid.to_string()))?;
        Ok(PositionerGeom {
            x0: rec.calib.x0,
            y0: rec.calib.y0,
            r1: rec.calib.r1,
            theta_body: &rec.theta_body,
            phi_arm: &rec.phi_arm,
            phi_arc: rec.phi_arc.as_ref(),
            classified_as_retracted: rec.calib.classified_as_retracted,
        })
    }

    /// Borrow a positioner's record.
    pub fn record(&self, posid: &str) -> Result<&PositionerRecord, KernelError> {
        self.positioners.get(posid).ok_or_else(|| KernelError::UnknownPositioner(posid.to_string()))
    }

    /// Iterate all registered posids.
    pub fn posids(&self) -> impl Iterator<Item = &str> {
        self.positioners.keys().map(|s| s.as_str())
    }
}
