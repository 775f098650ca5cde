//! Time-sweep engine.
//!
//! Expands a high-level [`MoveTable`] into an exact piecewise-linear `(t, theta, phi)` trace,
//! then quantizes that trace onto a fixed timestep. A [`Sweep`] owns its own time/pose arrays and
//! is consumed read-only by the spacetime driver, animators, and reporters.

use crate::error::KernelError;
use crate::transform::PoslocTransform;
use crate::types::{Axis, CollisionCase, Pose};

/// Row-parallel move table: each row is "wait `prepause`, then linearly ramp `(theta, phi)` by
/// `(d_theta, d_phi)` over `move_time`, then wait `postpause`".
#[derive(Debug, Clone, Default)]
pub struct MoveTable {
    /// Per-row theta delta (degrees).
    pub d_theta: Vec<f64>,
    /// Per-row phi delta (degrees).
    pub d_phi: Vec<f64>,
    /// Per-row pre-move dwell (seconds).
    pub prepause: Vec<f64>,
    /// Per-row move duration (seconds).
    pub move_time: Vec<f64>,
    /// Per-row post-move dwell (seconds).
    pub postpause: Vec<f64>,
}

impl MoveTable {
    /// Number of rows, taken from `d_theta`'s length.
    pub fn nrows(&self) -> usize {
        self.d_theta.len()
    }

    /// Validate that every row-parallel array has the same length and every timing value is
    /// non-negative.
    pub fn validate(&self) -> Result<(), KernelError> {
        let n = self.nrows();
        let check = |field: &'static str, len: usize| -> Result<(), KernelError> {
            if len != n {
                Err(KernelError::MoveTableMismatch { field, expected: n, actual: len })
            } else {
                Ok(())
            }
        };
        check("d_phi", self.d_phi.len())?;
        check("prepause", self.prepause.len())?;
        check("move_time", self.move_time.len())?;
        check("postpause", self.postpause.len())?;

        if self.move_time.iter().any(|&v| v < 0.0) {
            return Err(KernelError::InvalidArgument("move_time must be non-negative"));
        }
        if self.prepause.iter().chain(self.postpause.iter()).any(|&v| v < 0.0) {
            return Err(KernelError::InvalidArgument("prepause/postpause must be non-negative"));
        }
        Ok(())
    }
}

/// A time-ordered record of one positioner's planned motion, together with any collision
/// metadata the driver attaches once it has been stepped.
#[derive(Debug, Clone)]
pub struct Sweep {
    /// The positioner this sweep belongs to.
    pub posid: String,
    /// Sample times (seconds), strictly increasing.
    pub time: Vec<f64>,
    /// `(theta, phi)` pose at each sample, poslocTP frame, degrees.
    pub tp: Vec<Pose>,
    /// Whether the pose changed between sample `k-1` and `k`; `was_moving[0]` is always `false`.
    pub was_moving: Vec<bool>,
    /// The collision case found for this sweep, `I` until the driver records a strike.
    pub collision_case: CollisionCase,
    /// Time of the first recorded collision (seconds); `+inf` if none.
    pub collision_time: f64,
    /// Sample index of the first recorded collision; `None` if none.
    pub collision_idx: Option<usize>,
    /// The other participant in the recorded collision: a posid, `"PTL"`, or `"GFA"`.
    pub collision_neighbor: Option<String>,
    /// Time at which a caller froze this sweep via [`Sweep::register_as_frozen`]; `+inf` if not
    /// frozen.
    pub frozen_time: f64,
}

impl Sweep {
    /// Create an empty sweep for the given positioner (state `Empty`).
    pub fn new(posid: impl Into<String>) -> Self {
        Self {
            posid: posid.into(),
            time: Vec::new(),
            tp: Vec::new(),
            was_moving: Vec::new(),
            collision_case: CollisionCase::I,
            collision_time: f64::INFINITY,
            collision_idx: None,
            collision_neighbor: None,
            frozen_time: f64::INFINITY,
        }
    }

    /// Expand `table` into the exact piecewise-linear trace starting from `init_pose` at
    /// `start_time` (state `Empty` -> `ExactFilled`). Appends a new sample for every nonzero
    /// `prepause`/`move_time`/`postpause` segment in each row, in that order.
    pub fn fill_exact(&mut self, init_pose: Pose, table: &MoveTable, start_time: f64) -> Result<(), KernelError> {
        table.validate()?;
        if !init_pose.is_finite() || !start_time.is_finite() {
            return Err(KernelError::NumericDegenerate);
        }

        self.time = vec![start_time];
        self.tp = vec![init_pose];

        for i in 0..table.nrows() {
            if table.prepause[i] > 0.0 {
                let t = *self.time.last().unwrap() + table.prepause[i];
                let pose = *self.tp.last().unwrap();
                self.time.push(t);
                self.tp.push(pose);
            }
            if table.move_time[i] > 0.0 {
                let t = *self.time.last().unwrap() + table.move_time[i];
                let pose = self.tp.last().unwrap().offset(table.d_theta[i], table.d_phi[i]);
                self.time.push(t);
                self.tp.push(pose);
            }
            if table.postpause[i] > 0.0 {
                let t = *self.time.last().unwrap() + table.postpause[i];
                let pose = *self.tp.last().unwrap();
                self.time.push(t);
                self.tp.push(pose);
            }
        }

        for p in &self.tp {
            if !p.is_finite() {
                return Err(KernelError::NumericDegenerate);
            }
        }

        self.recompute_was_moving();
        Ok(())
    }

    /// Convert the exact trace into a uniform-step trace at timestep `dt` (state `ExactFilled` ->
    /// `Quantized`). For each exact segment `[i-1, i]`, `n = floor(delta_t / dt)` steps of
    /// `(d_theta/n, d_phi/n)` are inserted; if `n == 0` but the pose changed across the segment, a
    /// single step is forced so the motion is never silently dropped. The final sample of each
    /// original segment always lands exactly on that segment's exact end pose, regardless of
    /// rounding in the intermediate steps.
    pub fn quantize(&mut self, dt: f64) -> Result<(), KernelError> {
        if dt <= 0.0 {
            return Err(KernelError::InvalidArgument("quantize timestep must be positive"));
        }
        if self.time.is_empty() {
            return Ok(());
        }

        let mut qt = vec![self.time[0]];
        let mut qp = vec![self.tp[0]];

        for i in 1..self.time.len() {
            let t_prev_exact = self.time[i - 1];
            let t_next_exact = self.time[i];
            let p_prev_exact = self.tp[i - 1];
            let p_next_exact = self.tp[i];

            let delta_t = t_next_exact - *qt.last().unwrap();
            let mut n = (delta_t / dt).floor() as i64;
            let pose_changed = p_next_exact != p_prev_exact;
            if n <= 0 && pose_changed {
                n = 1;
            }
            if n <= 0 {
                continue;
            }
            let n = n as usize;

            let d_theta = (p_next_exact.theta - p_prev_exact.theta) / n as f64;
            let d_phi = (p_next_exact.phi - p_prev_exact.phi) / n as f64;
            let t0 = *qt.last().unwrap();
            let p0 = *qp.last().unwrap();

            for k in 1..=n {
                let t = t0 + k as f64 * dt;
                let pose = if k == n {
                    p_next_exact
                } else {
                    Pose::new(p0.theta + k as f64 * d_theta, p0.phi + k as f64 * d_phi)
                };
                qt.push(t);
                qp.push(pose);
            }
            // Fix up the final step of this segment to land exactly on the exact end time too.
            *qt.last_mut().unwrap() = t_next_exact;
        }

        self.time = qt;
        self.tp = qp;
        self.recompute_was_moving();
        Ok(())
    }

    /// Append zero-motion samples at timestep `dt` until the trace reaches `max_time` (state ->
    /// `Extended`). Used to align sweeps whose move tables ended at different times.
    pub fn extend(&mut self, dt: f64, max_time: f64) {
        if self.time.is_empty() || dt <= 0.0 {
            return;
        }
        let last_pose = *self.tp.last().unwrap();
        loop {
            let t = *self.time.last().unwrap() + dt;
            if t > max_time {
                break;
            }
            self.time.push(t);
            self.tp.push(last_pose);
        }
        self.recompute_was_moving();
    }

    /// Recompute the cached `was_moving` array: `false` at index 0, `tp[k] != tp[k-1]` elsewhere.
    fn recompute_was_moving(&mut self) {
        self.was_moving = (0..self.tp.len())
            .map(|k| k > 0 && self.tp[k] != self.tp[k - 1])
            .collect();
    }

    /// `true` iff sample `k` differs from sample `k-1`. `k == 0` and out-of-range `k` are
    /// `false`.
    pub fn was_moving(&self, k: usize) -> bool {
        self.was_moving.get(k).copied().unwrap_or(false)
    }

    /// Axis-restricted variant of [`Sweep::was_moving`].
    pub fn axis_was_moving(&self, k: usize, axis: Axis) -> bool {
        if k == 0 || k >= self.tp.len() {
            return false;
        }
        match axis {
            Axis::Theta => self.tp[k].theta != self.tp[k - 1].theta,
            Axis::Phi => self.tp[k].phi != self.tp[k - 1].phi,
        }
    }

    /// Verify that no adjacent pair of samples, converted to the positioner's internal-TP frame
    /// via `transform`, differs in theta or phi by more than `stepsize` degrees. A hardstop wrap
    /// deliberately produces a huge jump here and is meant to be flagged, not smoothed over.
    pub fn check_continuity(&self, stepsize: f64, transform: &dyn PoslocTransform) -> bool {
        let internal: Vec<(f64, f64)> = self
            .tp
            .iter()
            .map(|p| transform.posloc_to_internal(p.theta, p.phi))
            .collect();
        internal.windows(2).all(|w| {
            let (t0, p0) = w[0];
            let (t1, p1) = w[1];
            (t1 - t0).abs() <= stepsize && (p1 - p0).abs() <= stepsize
        })
    }

    /// Record that a scheduler-imposed halt froze this sweep at `at_time`, independent of any
    /// geometric collision. Does not alter `collision_case`.
    pub fn register_as_frozen(&mut self, at_time: f64) {
        self.frozen_time = at_time;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Scenario 4 — sweep construction.
    fn scenario_4_table() -> MoveTable {
        let d_theta = vec![10.0, -20.0, 0.0, 0.0, 0.0];
        let d_phi = vec![0.0, 0.0, -10.0, 20.0, -10.0];
        let t_dot = [10.0_f64, 10.0, 1.0, 10.0, 20.0];
        let p_dot = [5.0_f64, 5.0, 5.0, 5.0, 5.0];
        let move_time: Vec<f64> = (0..5)
            .map(|i| (d_theta[i].abs() / t_dot[i]).max(d_phi[i].abs() / p_dot[i]))
            .collect();
        MoveTable {
            d_theta,
            d_phi,
            prepause: vec![0.0, 1.0, 0.0, 0.0, 0.0],
            move_time,
            postpause: vec![0.0, 0.0, 0.0, 0.0, 1.0],
        }
    }

    #[test]
    fn fill_exact_sample_count_and_final_time() {
        let table = scenario_4_table();
        let mut sweep = Sweep::new("P001");
        sweep.fill_exact(Pose::new(100.0, -100.0), &table, 10.0).unwrap();

        let expected_samples = 1
            + table.prepause.iter().filter(|&&v| v > 0.0).count()
            + table.move_time.iter().filter(|&&v| v > 0.0).count()
            + table.postpause.iter().filter(|&&v| v > 0.0).count();
        assert_eq!(sweep.time.len(), expected_samples);
        assert_eq!(*sweep.time.last().unwrap(), 23.0);
    }

    #[test]
    fn quantize_lands_on_exact_final_pose() {
        let table = scenario_4_table();
        let mut sweep = Sweep::new("P001");
        sweep.fill_exact(Pose::new(100.0, -100.0), &table, 10.0).unwrap();
        sweep.quantize(0.1).unwrap();

        assert_eq!(*sweep.time.last().unwrap(), 23.0);
        let last = sweep.tp.last().unwrap();
        assert!((last.theta - 90.0).abs() < 1e-9);
        assert!((last.phi - (-100.0)).abs() < 1e-9);
    }

    #[test]
    fn quantize_is_strictly_monotonic() {
        let table = scenario_4_table();
        let mut sweep = Sweep::new("P001");
        sweep.fill_exact(Pose::new(0.0, 0.0), &table, 0.0).unwrap();
        sweep.quantize(0.1).unwrap();
        for w in sweep.time.windows(2) {
            assert!(w[1] > w[0]);
        }
    }

    #[test]
    fn was_moving_matches_pose_changes() {
        let table = scenario_4_table();
        let mut sweep = Sweep::new("P001");
        sweep.fill_exact(Pose::new(0.0, 0.0), &table, 0.0).unwrap();
        sweep.quantize(0.1).unwrap();

        assert!(!sweep.was_moving(0));
        for k in 1..sweep.tp.len() {
            assert_eq!(sweep.was_moving(k), sweep.tp[k] != sweep.tp[k - 1]);
        }
    }

    #[test]
    fn requantizing_identical_input_is_deterministic() {
        let table = scenario_4_table();
        let mut a = Sweep::new("P001");
        a.fill_exact(Pose::new(5.0, -5.0), &table, 2.0).unwrap();
        a.quantize(0.25).unwrap();

        let mut b = Sweep::new("P001");
        b.fill_exact(Pose::new(5.0, -5.0), &table, 2.0).unwrap();
        b.quantize(0.25).unwrap();

        assert_eq!(a.time, b.time);
        assert_eq!(a.tp, b.tp);
    }

    #[test]
    fn mismatched_row_lengths_are_rejected() {
        let mut table = scenario_4_table();
        table.d_phi.pop();
        let err = table.validate().unwrap_err();
        assert!(matches!(err, KernelError::MoveTableMismatch { field: "d_phi", .. }));
    }

    #[test]
    fn extend_reaches_max_time_without_moving() {
        let mut sweep = Sweep::new("P001");
        let table = MoveTable {
            d_theta: vec![0.0],
            d_phi: vec![0.0],
            prepause: vec![0.0],
            move_time: vec![1.0],
            postpause: vec![0.0],
        };
        sweep.fill_exact(Pose::new(0.0, 0.0), &table, 0.0).unwrap();
        sweep.quantize(0.5).unwrap();
        let before = sweep.time.len();
        sweep.extend(0.5, 3.0);
        assert!(sweep.time.len() > before);
        assert!(*sweep.time.last().unwrap() <= 3.0);
        assert!(sweep.was_moving.iter().skip(before).all(|&m| !m));
    }
}
