//! Step counting and efficiency ratings

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringConfig {
    /// Finishing within `minSteps * graceMultiplier` steps still earns `Good`
    pub grace_multiplier: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            grace_multiplier: 1.5,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.grace_multiplier.is_finite() || self.grace_multiplier < 1.0 {
            return Err(EngineError::InvalidConfig(format!(
                "graceMultiplier must be a finite number >= 1, got {}",
                self.grace_multiplier
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Rating {
    Pass,
    Good,
    Perfect,
}

impl Rating {
    pub fn stars(self) -> u8 {
        match self {
            Rating::Pass => 1,
            Rating::Good => 2,
            Rating::Perfect => 3,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProgressScorer {
    min_steps: u32,
    step_count: u32,
    config: ScoringConfig,
}

impl ProgressScorer {
    pub fn new(min_steps: u32, config: ScoringConfig) -> Self {
        ProgressScorer {
            min_steps,
            step_count: 0,
            config,
        }
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    pub fn min_steps(&self) -> u32 {
        self.min_steps
    }

    pub fn record_step(&mut self) {
        self.step_count += 1;
    }

    pub fn reset(&mut self) {
        self.step_count = 0;
    }

    /// Rating for the current step count. A level without a par
    /// (`min_steps == 0`) always rates `Perfect`.
    pub fn rate(&self) -> Rating {
        if self.min_steps == 0 || self.step_count <= self.min_steps {
            Rating::Perfect
        } else if f64::from(self.step_count)
            <= f64::from(self.min_steps) * self.config.grace_multiplier
        {
            Rating::Good
        } else {
            Rating::Pass
        }
    }
}
