use serde::{Deserialize, Serialize};

use super::defaults;
use crate::errors::ConfigError;
use crate::models::ActionType;

/// Scalar engagement strength per action type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionWeights {
    pub view: f64,
    pub register: f64,
    pub like: f64,
}

impl ActionWeights {
    pub fn new(view: f64, register: f64, like: f64) -> Self {
        Self {
            view,
            register,
            like,
        }
    }

    /// Weight of an action. Exhaustive: a new action type will not compile
    /// until it is given a weight here.
    pub fn weight(&self, action: ActionType) -> f64 {
        match action {
            ActionType::View => self.view,
            ActionType::Register => self.register,
            ActionType::Like => self.like,
        }
    }

    /// Weights must be finite, non-negative, and ordered by engagement strength.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for action in ActionType::ALL {
            let w = self.weight(action);
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::ValidationFailed {
                    field: format!("weights.{}", action.as_str().to_ascii_lowercase()),
                    message: format!("must be a finite non-negative number, got {w}"),
                });
            }
        }
        if self.view > self.register || self.register > self.like {
            return Err(ConfigError::ValidationFailed {
                field: "weights".to_string(),
                message: "must satisfy view <= register <= like".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ActionWeights {
    fn default() -> Self {
        Self {
            view: defaults::DEFAULT_VIEW_WEIGHT,
            register: defaults::DEFAULT_REGISTER_WEIGHT,
            like: defaults::DEFAULT_LIKE_WEIGHT,
        }
    }
}
