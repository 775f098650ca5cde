//! Caller-constructed configuration records.
//!
//! The registry never reads process-wide or global state: every scalar and raw polygon point
//! list it needs is bundled into one of these two plain records and handed in explicitly by the
//! caller.

use std::collections::HashMap;

/// Raw polygon point lists and petal-wide scalars, constructed once by the caller and passed to
/// [`crate::registry::Registry::new`].
#[derive(Debug, Clone)]
pub struct PetalConfig {
    /// Petal perimeter keepout, raw (x, y) coordinate arrays, petal-local mm, pre-placement.
    pub keepout_ptl_raw: (Vec<f64>, Vec<f64>),
    /// Guide camera keepout, raw (x, y) coordinate arrays, petal-local mm, pre-placement.
    pub keepout_gfa_raw: (Vec<f64>, Vec<f64>),
    /// Petal placement translation, x (mm).
    pub petal_x0: f64,
    /// Petal placement translation, y (mm).
    pub petal_y0: f64,
    /// Petal placement rotation (degrees).
    pub petal_rotation_deg: f64,

    /// General (nominal) phi-arm keepout, raw (x, y) arrays, phi-pivot frame.
    pub general_keepout_p_raw: (Vec<f64>, Vec<f64>),
    /// General (nominal) theta-body keepout, raw (x, y) arrays, local frame.
    pub general_keepout_t_raw: (Vec<f64>, Vec<f64>),
    /// Nominal value of `LENGTH_R1` used to compute per-positioner `R1_err`.
    pub r1_nominal: f64,
    /// Nominal value of `LENGTH_R2` used to compute per-positioner `R2_err`.
    pub r2_nominal: f64,

    /// `PHI_EO`: phi angle (degrees) above which the arm is guaranteed inside the Eo circle.
    pub phi_eo_deg: f64,
    /// `PHI_EI`: phi angle (degrees) above which the arm is guaranteed inside the Ei circle.
    pub phi_ei_deg: f64,
    /// `ENVELOPE_EO`: diameter (mm) of the outer retracted-arm circle.
    pub envelope_eo_mm: f64,
    /// `ENVELOPE_EI`: diameter (mm) of the inner retracted-arm circle.
    pub envelope_ei_mm: f64,
    /// Diameter (mm) of the extreme-range circle `Ee`, used only for neighbor discovery.
    pub envelope_ee_mm: f64,
    /// Circle-approximation resolution for `Eo`.
    pub resolution_eo: usize,
    /// Circle-approximation resolution for `Ei`.
    pub resolution_ei: usize,
    /// Circle-approximation resolution for `Ee`.
    pub resolution_ee: usize,
    /// Margin (mm) added to the Eo diameter for the case-IV retracted-circle test.
    pub eo_radial_tol_mm: f64,

    /// Ferrule disk diameter (mm), shared by every positioner on the petal.
    pub ferrule_diameter_mm: f64,
    /// Ferrule disk circle-approximation resolution.
    pub ferrule_resolution: usize,

    /// Minimum mechanical phi travel (degrees), used by `build_arcP`.
    pub phi_range_min_deg: f64,
    /// Maximum mechanical phi travel (degrees), used by `build_arcP`.
    pub phi_range_max_deg: f64,
    /// Number of segments used to approximate the swept arc in `build_arcP`.
    pub arc_resolution: usize,

    /// Optional precomputed `device_loc -> neighboring device_locs` map, for the locational
    /// neighbor-identification strategy. When absent, the registry falls back to the geometric
    /// (`Ee`-vs-`Ee`) strategy exclusively.
    pub device_loc_neighbors: Option<HashMap<i64, Vec<i64>>>,
}

/// Per-positioner calibration and keepout-expansion scalars, constructed by the caller and passed
/// to [`crate::registry::Registry::add`] / [`crate::registry::Registry::refresh_calibrations`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionerConfig {
    /// `LENGTH_R1`: theta-arm length (mm).
    pub r1: f64,
    /// `LENGTH_R2`: phi-arm length (mm).
    pub r2: f64,
    /// `OFFSET_X`: positioner's theta-axis x offset in petal coordinates (mm).
    pub x0: f64,
    /// `OFFSET_Y`: positioner's theta-axis y offset in petal coordinates (mm).
    pub y0: f64,
    /// `OFFSET_T`: theta zero-point offset (degrees).
    pub t0: f64,
    /// `OFFSET_P`: phi zero-point offset (degrees).
    pub p0: f64,
    /// `KEEPOUT_EXPANSION_PHI_RADIAL`.
    pub keepout_expansion_phi_radial: f64,
    /// `KEEPOUT_EXPANSION_PHI_ANGULAR`.
    pub keepout_expansion_phi_angular: f64,
    /// `KEEPOUT_EXPANSION_THETA_RADIAL`.
    pub keepout_expansion_theta_radial: f64,
    /// `KEEPOUT_EXPANSION_THETA_ANGULAR`.
    pub keepout_expansion_theta_angular: f64,
    /// `CLASSIFIED_AS_RETRACTED`: caller asserts the arm is parked, skipping geometric Eo tests.
    pub classified_as_retracted: bool,
    /// `CTRL_ENABLED`: whether the positioner accepts motion commands. Not consulted by the
    /// collision kernel itself; carried through for collaborators (e.g. a scheduler) that read
    /// the registry.
    pub ctrl_enabled: bool,
}

impl PositionerConfig {
    /// True iff every calibration scalar is finite.
    pub fn is_finite(&self) -> bool {
        [
            self.r1,
            self.r2,
            self.x0,
            self.y0,
            self.t0,
            self.p0,
            self.keepout_expansion_phi_radial,
            self.keepout_expansion_phi_angular,
            self.keepout_expansion_theta_radial,
            self.keepout_expansion_theta_angular,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}
