//! Threshold sources
//!
//! `SharedThresholds` is the hot-reload handle: the host (or an operator
//! console) replaces the value, and the detector picks it up on the next
//! tick. Values are stored as given and validated when loaded, so a bad
//! write degrades to the last-known-good set instead of being lost silently.

use parking_lot::RwLock;

use crate::domain::Thresholds;
use crate::error::ConfigError;
use crate::ports::ThresholdSource;

/// A fixed threshold set
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticThresholds(Thresholds);

impl StaticThresholds {
    pub fn new(thresholds: Thresholds) -> Self {
        Self(thresholds)
    }
}

impl ThresholdSource for StaticThresholds {
    fn load(&self) -> Result<Thresholds, ConfigError> {
        Ok(self.0)
    }
}

/// A threshold set that can be replaced while the detector runs
#[derive(Debug, Default)]
pub struct SharedThresholds {
    current: RwLock<Thresholds>,
}

impl SharedThresholds {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            current: RwLock::new(thresholds),
        }
    }

    pub fn replace(&self, thresholds: Thresholds) {
        *self.current.write() = thresholds;
    }

    /// Replace from a JSON document. A document that does not parse leaves
    /// the current value untouched.
    pub fn replace_json(&self, document: &str) -> Result<(), ConfigError> {
        let thresholds: Thresholds = serde_json::from_str(document)?;
        self.replace(thresholds);
        Ok(())
    }

    pub fn current(&self) -> Thresholds {
        *self.current.read()
    }
}

impl ThresholdSource for SharedThresholds {
    fn load(&self) -> Result<Thresholds, ConfigError> {
        let thresholds = self.current();
        thresholds.validate()?;
        Ok(thresholds)
    }
}
