//! Inclusive numeric ranges used by configuration records.

use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};

/// Inclusive floating point range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatRange {
    pub min: f64,
    pub max: f64,
}

impl FloatRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Check the range is finite and ordered; `what` names it in the error.
    pub fn validate(&self, what: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(SimError::config(format!("{what}: range bounds must be finite")));
        }
        if self.min > self.max {
            return Err(SimError::config(format!(
                "{what}: min {} is greater than max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }

    /// Like [`validate`](Self::validate) but also requires `min >= 0`.
    pub fn validate_non_negative(&self, what: &str) -> Result<()> {
        self.validate(what)?;
        if self.min < 0.0 {
            return Err(SimError::config(format!("{what}: range must not be negative")));
        }
        Ok(())
    }
}

/// Inclusive integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: u64,
    pub max: u64,
}

impl CountRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn validate(&self, what: &str) -> Result<()> {
        if self.min > self.max {
            return Err(SimError::config(format!(
                "{what}: min {} is greater than max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}
