//! # petal-anticollision
//!
//! The anti-collision kernel for one robotic fiber positioner petal: given each positioner's
//! calibration and a planned sequence of moves, decides whether any two neighboring arms (or an
//! arm and a fixed petal envelope) would ever occupy the same space.
//!
//! The kernel is organized as a pipeline of six components, each a module here:
//!
//! * [`polygon`] — the 2-D polygon primitive and its rigid/expansion transforms.
//! * [`keepout`] — builds per-positioner keepout polygons and clear-rotation circles from raw
//!   configuration.
//! * [`registry`] — owns every registered positioner's calibration, derived keepouts, and
//!   neighbor sets for a petal.
//! * [`sweep`] — expands a move table into an exact, then quantized, `(t, theta, phi)` trace.
//! * [`classify`] — the spatial decision table that turns two poses into a collision case.
//! * [`driver`] — steps one or two sweeps in lockstep, invoking the classifier and recording the
//!   first collision found.
//!
//! [`config`], [`types`], [`transform`], and [`error`] hold the configuration records, small
//! shared value types, the caller-supplied kinematic callback, and the crate's single error type
//! respectively.
//!
//! # Example
//!
//! ```rust
//! use petal_anticollision::config::{PetalConfig, PositionerConfig};
//! use petal_anticollision::registry::Registry;
//! use petal_anticollision::sweep::MoveTable;
//! use petal_anticollision::driver::SpacetimeDriver;
//! use petal_anticollision::types::Pose;
//!
//! # fn main() -> Result<(), petal_anticollision::error::KernelError> {
//! let config = PetalConfig {
//!     keepout_ptl_raw: (vec![-400.0, 400.0, 400.0, -400.0], vec![-400.0, -400.0, 400.0, 400.0]),
//!     keepout_gfa_raw: (vec![390.0, 395.0, 395.0, 390.0], vec![0.0, 0.0, 5.0, 5.0]),
//!     petal_x0: 0.0,
//!     petal_y0: 0.0,
//!     petal_rotation_deg: 0.0,
//!     general_keepout_p_raw: (vec![0.0, 5.0, 5.0, 0.0], vec![-0.6, -0.6, 0.6, 0.6]),
//!     general_keepout_t_raw: (vec![-1.0, 1.0, 1.0, -1.0], vec![-1.0, -1.0, 1.0, 1.0]),
//!     r1_nominal: 3.0,
//!     r2_nominal: 3.0,
//!     phi_eo_deg: -30.0,
//!     phi_ei_deg: -60.0,
//!     envelope_eo_mm: 10.0,
//!     envelope_ei_mm: 8.0,
//!     envelope_ee_mm: 14.0,
//!     resolution_eo: 16,
//!     resolution_ei: 16,
//!     resolution_ee: 16,
//!     eo_radial_tol_mm: 0.5,
//!     ferrule_diameter_mm: 3.0,
//!     ferrule_resolution: 12,
//!     phi_range_min_deg: -180.0,
//!     phi_range_max_deg: 180.0,
//!     arc_resolution: 8,
//!     device_loc_neighbors: None,
//! };
//! let mut registry = Registry::new(config)?;
//!
//! let calib = PositionerConfig {
//!     r1: 3.0, r2: 3.0, x0: 0.0, y0: 0.0, t0: 0.0, p0: 0.0,
//!     keepout_expansion_phi_radial: 0.0, keepout_expansion_phi_angular: 0.0,
//!     keepout_expansion_theta_radial: 0.0, keepout_expansion_theta_angular: 0.0,
//!     classified_as_retracted: false, ctrl_enabled: true,
//! };
//! registry.add("P001", 1, calib)?;
//! registry.add("P002", 2, PositionerConfig { x0: 6.0, ..calib })?;
//! registry.identify_neighbors("P001")?;
//!
//! let table = MoveTable {
//!     d_theta: vec![90.0],
//!     d_phi: vec![0.0],
//!     prepause: vec![0.0],
//!     move_time: vec![2.0],
//!     postpause: vec![0.0],
//! };
//! let driver = SpacetimeDriver::new(&registry);
//! let (sweep_a, _sweep_b) = driver.run_pair(
//!     "P001", Pose::new(-90.0, 0.0), &table,
//!     "P002", Pose::new(0.0, 0.0), &table,
//!     0.1, 0.0, 0,
//! )?;
//! println!("collision case: {}", sweep_a.collision_case);
//! # Ok(())
//! # }
//! ```

#![deny(missing_debug_implementations, trivial_casts, unsafe_code, unused_import_braces, unused_qualifications)]
#![warn(missing_docs)]

pub mod classify;
pub mod config;
pub mod driver;
pub mod error;
pub mod keepout;
pub mod polygon;
pub mod registry;
pub mod sweep;
pub mod transform;
pub mod types;
