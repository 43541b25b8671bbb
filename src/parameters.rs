//! Simulation parameters and execution configuration.

use thiserror::Error;

use crate::math::Scalar;

/// Parameters controlling the numerical integration performed by each step.
///
/// The defaults are tuned for a 60 Hz timestep with SI units (meters, seconds,
/// kilograms). Changing `dt` between steps is supported but discouraged: the
/// solver's warm-started impulses are scaled for the previous timestep, so
/// convergence degrades for a few steps after every change.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct IntegrationParameters {
    /// The timestep length in seconds.
    ///
    /// Default: `1.0 / 60.0`
    pub dt: Scalar,
    /// Number of velocity-impulse iterations run by the solver each step.
    ///
    /// More iterations improve stacking stability at a linear cost.
    /// The solver always terminates after this many iterations regardless
    /// of residual error.
    ///
    /// Default: `8`
    pub solver_iterations: usize,
    /// Distance below which the narrow phase generates speculative contacts
    /// for shapes that are close but not yet touching.
    ///
    /// Default: `0.002`
    pub prediction_distance: Scalar,
    /// Fraction of penetration corrected per step by the positional bias
    /// (Baumgarte stabilization).
    ///
    /// Default: `0.2`
    pub erp: Scalar,
    /// Penetration depth tolerated without positional correction.
    ///
    /// Default: `0.005`
    pub allowed_penetration: Scalar,
    /// Minimum approach speed for restitution to be applied. Slower impacts
    /// are treated as inelastic to avoid jitter at rest.
    ///
    /// Default: `1.0`
    pub restitution_threshold: Scalar,
    /// The maximum linear velocity allowed for a body to accumulate sleep time.
    ///
    /// Setting a negative threshold disables sleeping entirely.
    ///
    /// Default: `0.15`
    pub sleep_linear_threshold: Scalar,
    /// The maximum angular velocity allowed for a body to accumulate sleep time.
    ///
    /// Default: `0.15`
    pub sleep_angular_threshold: Scalar,
    /// How long in seconds an island must stay below the sleep thresholds
    /// before it is deactivated.
    ///
    /// Default: `0.5`
    pub sleep_time_threshold: Scalar,
    /// A body with continuous collision detection enabled is only swept when
    /// its per-step travel exceeds this factor times its smallest collider
    /// extent. Keeps the sweep cost bounded to genuinely fast bodies.
    ///
    /// Default: `0.5`
    pub ccd_motion_threshold_factor: Scalar,
}

impl Default for IntegrationParameters {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            solver_iterations: 8,
            prediction_distance: 0.002,
            erp: 0.2,
            allowed_penetration: 0.005,
            restitution_threshold: 1.0,
            sleep_linear_threshold: 0.15,
            sleep_angular_threshold: 0.15,
            sleep_time_threshold: 0.5,
            ccd_motion_threshold_factor: 0.5,
        }
    }
}

impl IntegrationParameters {
    /// The inverse timestep, or zero for a zero timestep.
    #[inline]
    pub fn inv_dt(&self) -> Scalar {
        if self.dt > 0.0 { 1.0 / self.dt } else { 0.0 }
    }
}

/// An invalid execution configuration.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Parallel execution reorders floating-point reductions, which is
    /// incompatible with bit-reproducible results.
    #[error("strict determinism cannot be combined with parallel execution")]
    StrictDeterminismWithParallelism,
}

/// Execution configuration for a [`PhysicsPipeline`](crate::pipeline::PhysicsPipeline).
///
/// Parallel execution and strict determinism are mutually exclusive; the
/// conflict is rejected here, at configuration time, rather than silently
/// ignored during stepping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationConfig {
    parallel: bool,
    strict_determinism: bool,
}

impl SimulationConfig {
    /// Creates a configuration, rejecting conflicting flag combinations.
    ///
    /// `parallel` requests that independent broad-phase proxy refreshes run
    /// on a rayon pool; it only takes effect when the crate is compiled with
    /// the `parallel` feature. `strict_determinism` requests bit-reproducible
    /// stepping and forbids any parallel path.
    pub fn new(parallel: bool, strict_determinism: bool) -> Result<Self, ConfigError> {
        if parallel && strict_determinism {
            return Err(ConfigError::StrictDeterminismWithParallelism);
        }
        Ok(Self {
            parallel,
            strict_determinism,
        })
    }

    /// Whether parallel execution was requested.
    #[inline]
    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Whether strict determinism was requested.
    #[inline]
    pub fn strict_determinism(&self) -> bool {
        self.strict_determinism
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_parallel_strict_determinism() {
        assert!(SimulationConfig::new(false, false).is_ok());
        assert!(SimulationConfig::new(true, false).is_ok());
        assert!(SimulationConfig::new(false, true).is_ok());
        assert_eq!(
            SimulationConfig::new(true, true),
            Err(ConfigError::StrictDeterminismWithParallelism)
        );
    }
}
