//! Spacetime driver.
//!
//! Walks one or two quantized sweeps in lockstep, invoking the spatial classifier
//! at every step where something moved, and records the first colliding step on each
//! participant's [`Sweep`].

use log::info;

use crate::classify;
use crate::error::KernelError;
use crate::registry::Registry;
use crate::sweep::{MoveTable, Sweep};
use crate::types::{CollisionCase, FixedCase, Pose};

/// Drives sweeps for positioners registered in a [`Registry`], in either positioner-vs-positioner
/// or positioner-vs-fixed mode.
#[derive(Debug)]
pub struct SpacetimeDriver<'a> {
    registry: &'a Registry,
}

impl<'a> SpacetimeDriver<'a> {
    /// Borrow a registry to drive sweeps against.
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Build and quantize one sweep, without running any collision check.
    fn prepare_sweep(
        posid: &str,
        init_pose: Pose,
        table: &MoveTable,
        start_time: f64,
        dt: f64,
    ) -> Result<Sweep, KernelError> {
        let mut sweep = Sweep::new(posid.to_string());
        sweep.fill_exact(init_pose, table, start_time)?;
        sweep.quantize(dt)?;
        Ok(sweep)
    }

    /// Run the two-positioner mode: step both sweeps in lockstep, checking the pairwise
    /// classifier whenever either moved, and record the first collision (if any) identically on
    /// both returned sweeps.
    #[allow(clippy::too_many_arguments)]
    pub fn run_pair(
        &self,
        posid_a: &str,
        init_a: Pose,
        table_a: &MoveTable,
        posid_b: &str,
        init_b: Pose,
        table_b: &MoveTable,
        dt: f64,
        start_time: f64,
        skip: usize,
    ) -> Result<(Sweep, Sweep), KernelError> {
        let mut sweep_a = Self::prepare_sweep(posid_a, init_a, table_a, start_time, dt)?;
        let mut sweep_b = Self::prepare_sweep(posid_b, init_b, table_b, start_time, dt)?;

        let geom_a = self.registry.geom(posid_a)?;
        let geom_b = self.registry.geom(posid_b)?;
        let cfg = self.registry.classify_config();

        let mut step_a = 0usize;
        let mut step_b = 0usize;
        let mut remaining_a = sweep_a.time.len();
        let mut remaining_b = sweep_b.time.len();

        while remaining_a > 0 || remaining_b > 0 {
            let moved_a = remaining_a > 0 && step_a >= skip && sweep_a.was_moving(step_a);
            let moved_b = remaining_b > 0 && step_b >= skip && sweep_b.was_moving(step_b);

            if moved_a || moved_b {
                let pose_a = sweep_a.tp[step_a];
                let pose_b = sweep_b.tp[step_b];
                let case = classify::classify_pair(&cfg, &geom_a, pose_a, &geom_b, pose_b);
                if case.is_collision() {
                    let t = sweep_a.time[step_a].max(sweep_b.time[step_b]);
                    Self::record_collision(&mut sweep_a, case, posid_b, t, step_a);
                    Self::record_collision(&mut sweep_b, case, posid_a, t, step_b);
                    break;
                }
            }

            if remaining_a > 0 {
                remaining_a -= 1;
                if remaining_a > 0 {
                    step_a += 1;
                }
            }
            if remaining_b > 0 {
                remaining_b -= 1;
                if remaining_b > 0 {
                    step_b += 1;
                }
            }
        }

        info!(
            target: "petal_anticollision::driver",
            "pair run {posid_a}/{posid_b}: case {}, collision_time {}",
            sweep_a.collision_case, sweep_a.collision_time
        );

        Ok((sweep_a, sweep_b))
    }

    /// Run the positioner-vs-fixed mode: step a single sweep, checking against the positioner's
    /// own `fixed_cases` whenever it moved.
    pub fn run_fixed(
        &self,
        posid: &str,
        init: Pose,
        table: &MoveTable,
        dt: f64,
        start_time: f64,
        skip: usize,
    ) -> Result<Sweep, KernelError> {
        let mut sweep = Self::prepare_sweep(posid, init, table, start_time, dt)?;

        let geom = self.registry.geom(posid)?;
        let fixed = self.registry.fixed_envelopes();
        let only: Vec<FixedCase> = self.registry.record(posid)?.fixed_cases.clone();

        let mut step = 0usize;
        let mut remaining = sweep.time.len();

        while remaining > 0 {
            if step >= skip && sweep.was_moving(step) {
                let pose = sweep.tp[step];
                let case = classify::classify_fixed(&geom, pose, fixed, &only, false);
                if case.is_collision() {
                    let t = sweep.time[step];
                    Self::record_collision(&mut sweep, case, case.to_string().as_str(), t, step);
                    break;
                }
            }
            remaining -= 1;
            if remaining > 0 {
                step += 1;
            }
        }

        info!(
            target: "petal_anticollision::driver",
            "fixed run {posid}: case {}, collision_time {}",
            sweep.collision_case, sweep.collision_time
        );

        Ok(sweep)
    }

    fn record_collision(sweep: &mut Sweep, case: CollisionCase, neighbor: &str, time: f64, idx: usize) {
        sweep.collision_case = case;
        sweep.collision_neighbor = Some(neighbor.to_string());
        sweep.collision_time = time;
        sweep.collision_idx = Some(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PetalConfig, PositionerConfig};
    use crate::registry::Registry;

    fn square(half: f64) -> (Vec<f64>, Vec<f64>) {
        (vec![-half, half, half, -half], vec![-half, -half, half, half])
    }

    fn base_config() -> PetalConfig {
        PetalConfig {
            keepout_ptl_raw: (vec![-100.0, 100.0, 100.0, -100.0], vec![-100.0, -100.0, 100.0, 100.0]),
            keepout_gfa_raw: square(1.0),
            petal_x0: 0.0,
            petal_y0: 0.0,
            petal_rotation_deg: 0.0,
            general_keepout_p_raw: (vec![0.0, 5.0, 5.0, 0.0], vec![-0.5, -0.5, 0.5, 0.5]),
            general_keepout_t_raw: square(0.5),
            r1_nominal: 3.0,
            r2_nominal: 3.0,
            phi_eo_deg: 1000.0,
            phi_ei_deg: 1000.0,
            envelope_eo_mm: 10.0,
            envelope_ei_mm: 8.0,
            envelope_ee_mm: 14.0,
            resolution_eo: 16,
            resolution_ei: 16,
            resolution_ee: 16,
            eo_radial_tol_mm: 0.5,
            ferrule_diameter_mm: 3.0,
            ferrule_resolution: 12,
            phi_range_min_deg: -180.0,
            phi_range_max_deg: 180.0,
            arc_resolution: 8,
            device_loc_neighbors: None,
        }
    }

    fn calib_at(x0: f64, y0: f64) -> PositionerConfig {
        PositionerConfig {
            r1: 3.0,
            r2: 3.0,
            x0,
            y0,
            t0: 0.0,
            p0: 0.0,
            keepout_expansion_phi_radial: 0.0,
            keepout_expansion_phi_angular: 0.0,
            keepout_expansion_theta_radial: 0.0,
            keepout_expansion_theta_angular: 0.0,
            classified_as_retracted: false,
            ctrl_enabled: true,
        }
    }

    fn stationary_table(n: usize, dwell: f64) -> MoveTable {
        MoveTable {
            d_theta: vec![0.0; n],
            d_phi: vec![0.0; n],
            prepause: vec![0.0; n],
            move_time: vec![dwell; n],
            postpause: vec![0.0; n],
        }
    }

    #[test]
    fn driver_reports_case_i_when_arms_stay_clear() {
        let mut reg = Registry::new(base_config()).unwrap();
        reg.add("A", 1, calib_at(0.0, 0.0)).unwrap();
        reg.add("B", 2, calib_at(1000.0, 0.0)).unwrap();
        let driver = SpacetimeDriver::new(&reg);

        let table = stationary_table(1, 1.0);
        let (sweep_a, sweep_b) = driver
            .run_pair("A", Pose::new(0.0, 0.0), &table, "B", Pose::new(0.0, 0.0), &table, 0.1, 0.0, 0)
            .unwrap();

        assert_eq!(sweep_a.collision_case, CollisionCase::I);
        assert_eq!(sweep_b.collision_case, CollisionCase::I);
    }

    #[test]
    fn driver_reports_matching_collision_time_on_both_sweeps() {
        let mut reg = Registry::new(base_config()).unwrap();
        reg.add("A", 1, calib_at(0.0, 0.0)).unwrap();
        reg.add("B", 2, calib_at(6.0, 0.0)).unwrap();
        let driver = SpacetimeDriver::new(&reg);

        // A's arm (local tip at x=5) swings from straight up to straight at B over one second.
        let table_a = MoveTable {
            d_theta: vec![90.0],
            d_phi: vec![0.0],
            prepause: vec![0.0],
            move_time: vec![1.0],
            postpause: vec![0.0],
        };
        let table_b = stationary_table(1, 1.0);

        let (sweep_a, sweep_b) = driver
            .run_pair("A", Pose::new(-90.0, 0.0), &table_a, "B", Pose::new(0.0, 0.0), &table_b, 0.1, 0.0, 0)
            .unwrap();

        assert!(sweep_a.collision_case.is_collision());
        assert_eq!(sweep_a.collision_case, sweep_b.collision_case);
        assert_eq!(sweep_a.collision_time, sweep_b.collision_time);
        assert_eq!(sweep_a.collision_neighbor.as_deref(), Some("B"));
        assert_eq!(sweep_b.collision_neighbor.as_deref(), Some("A"));
    }
}
