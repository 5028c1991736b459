//! Configuration for the input handler.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::InputError;
use crate::mutation::NbspPolicy;

/// Input handling configuration.
///
/// Every field has a default, so hosts only need to supply what they change:
///
/// ```
/// use weaver_input::InputConfig;
///
/// let config = InputConfig::from_json(r#"{ "undo_step_size": 5 }"#).unwrap();
/// assert_eq!(config.undo_step_size, 5);
/// assert!(config.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Initial state of the input command.
    pub enabled: bool,
    /// How browser-inserted non-breaking spaces are rewritten.
    pub nbsp: NbspPolicy,
    /// Typed characters per undo step before the change buffer starts a new one.
    pub undo_step_size: usize,
    /// Window after compositionend during which a composition-start keydown
    /// is ignored (Safari fires one after the composition already ended).
    pub composition_grace_ms: u64,
    /// Undo history depth for the reference model.
    pub max_undo_steps: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            nbsp: NbspPolicy::Boundary,
            undo_step_size: 20,
            composition_grace_ms: 500,
            max_undo_steps: 100,
        }
    }
}

impl InputConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, InputError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.undo_step_size == 0 {
            return Err(InputError::Config("undo_step_size must be at least 1".into()));
        }
        if self.max_undo_steps == 0 {
            return Err(InputError::Config("max_undo_steps must be at least 1".into()));
        }
        Ok(())
    }

    pub fn composition_grace(&self) -> Duration {
        Duration::from_millis(self.composition_grace_ms)
    }
}
