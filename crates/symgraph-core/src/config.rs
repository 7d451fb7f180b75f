use crate::{Result, TrackerError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning knobs for the tracker. All of the impact formula's empirical
/// constants live in [`ImpactWeights`] rather than in code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Maximum BFS depth for impact analysis, path finding and the cycle
    /// reachability check.
    pub max_analysis_depth: usize,
    /// Maximum number of dirty symbols drained per background tick.
    pub batch_size: usize,
    /// Sleep between background drains, in milliseconds. Coalesces bursts of
    /// related edits into a single analysis pass.
    pub processing_interval_ms: u64,
    /// Minimum impact score for a background result to be fanned out to
    /// subscribers.
    pub impact_threshold: f64,
    /// Maximum retained change-log entries.
    pub change_log_capacity: usize,
    /// Change-log retention window, in seconds.
    pub change_retention_secs: u64,
    /// Interval between change-log cleanup runs, in seconds.
    pub cleanup_interval_secs: u64,
    pub weights: ImpactWeights,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_analysis_depth: 10,
            batch_size: 50,
            processing_interval_ms: 1_000,
            impact_threshold: 0.1,
            change_log_capacity: 10_000,
            change_retention_secs: 7 * 24 * 60 * 60,
            cleanup_interval_secs: 60 * 60,
            weights: ImpactWeights::default(),
        }
    }
}

impl TrackerConfig {
    pub fn processing_interval(&self) -> Duration {
        Duration::from_millis(self.processing_interval_ms)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    pub fn change_retention(&self) -> Duration {
        Duration::from_secs(self.change_retention_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_analysis_depth == 0 {
            return Err(TrackerError::InvalidConfig(
                "max_analysis_depth must be at least 1".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(TrackerError::InvalidConfig(
                "batch_size must be at least 1".into(),
            ));
        }
        if self.change_log_capacity == 0 {
            return Err(TrackerError::InvalidConfig(
                "change_log_capacity must be at least 1".into(),
            ));
        }
        if !self.impact_threshold.is_finite() || self.impact_threshold < 0.0 {
            return Err(TrackerError::InvalidConfig(
                "impact_threshold must be a non-negative number".into(),
            ));
        }
        self.weights.validate()
    }
}

/// Empirical constants of the impact score:
///
/// `(direct·w_d + indirect·w_i + breaking·w_b) × kind multiplier × public boost`,
/// capped at `score_cap`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactWeights {
    pub direct: f64,
    pub indirect: f64,
    pub breaking: f64,
    /// Extra multiplier applied when the changed symbol is public.
    pub public_boost: f64,
    pub score_cap: f64,
}

impl Default for ImpactWeights {
    fn default() -> Self {
        Self {
            direct: 0.5,
            indirect: 0.1,
            breaking: 1.0,
            public_boost: 1.3,
            score_cap: 10.0,
        }
    }
}

impl ImpactWeights {
    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("direct", self.direct),
            ("indirect", self.indirect),
            ("breaking", self.breaking),
            ("public_boost", self.public_boost),
            ("score_cap", self.score_cap),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(TrackerError::InvalidConfig(format!(
                    "impact weight {} must be a non-negative number",
                    name
                )));
            }
        }
        if self.score_cap == 0.0 {
            return Err(TrackerError::InvalidConfig(
                "score_cap must be positive".into(),
            ));
        }
        Ok(())
    }
}
