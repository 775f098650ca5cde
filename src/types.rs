//! Small shared value types used across the kernel's components.

/// A (θ, φ) pose in the poslocTP frame, degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Theta angle, degrees.
    pub theta: f64,
    /// Phi angle, degrees.
    pub phi: f64,
}

impl Pose {
    /// Construct a new pose.
    pub fn new(theta: f64, phi: f64) -> Self {
        Self { theta, phi }
    }

    /// Apply a (dθ, dφ) delta, returning the resulting pose.
    pub fn offset(&self, d_theta: f64, d_phi: f64) -> Self {
        Self {
            theta: self.theta + d_theta,
            phi: self.phi + d_phi,
        }
    }

    /// True if both components are finite.
    pub fn is_finite(&self) -> bool {
        self.theta.is_finite() && self.phi.is_finite()
    }
}

/// Which axis of a pose moved between two samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// The theta (central body) axis.
    Theta,
    /// The phi (arm) axis.
    Phi,
}

/// The fixed petal-level keepout envelopes a positioner's arm can strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixedCase {
    /// Petal perimeter envelope.
    Ptl,
    /// Guide camera envelope.
    Gfa,
}

impl FixedCase {
    /// The pseudo-posid string used to report this fixed case as a collision neighbor.
    pub fn as_str(self) -> &'static str {
        match self {
            FixedCase::Ptl => "PTL",
            FixedCase::Gfa => "GFA",
        }
    }
}

impl std::fmt::Display for FixedCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of a single spatial collision test between two participants.
///
/// `I` is "no collision"; `II`-`IV` rank in the classifier's intrinsic priority order
/// (`IV` > `III` > `II`) when more than one would otherwise fire in the same step. `Ptl`/`Gfa`
/// are pseudo-cases used only by the fixed-envelope classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionCase {
    /// No collision.
    I,
    /// Arm vs. arm.
    II,
    /// Arm vs. central body of a neighbor.
    III,
    /// Arm vs. the retracted envelope circle of a neighbor.
    IV,
    /// Arm vs. the petal perimeter envelope.
    Ptl,
    /// Arm vs. the guide camera envelope.
    Gfa,
}

impl CollisionCase {
    /// True for any case other than `I`.
    pub fn is_collision(self) -> bool {
        self != CollisionCase::I
    }
}

impl std::fmt::Display for CollisionCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CollisionCase::I => "I",
            CollisionCase::II => "II",
            CollisionCase::III => "III",
            CollisionCase::IV => "IV",
            CollisionCase::Ptl => "PTL",
            CollisionCase::Gfa => "GFA",
        };
        f.write_str(s)
    }
}
