use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::EventError;

/// Kind of interaction a user had with an item, ordered by engagement strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    View,
    Register,
    Like,
}

impl ActionType {
    /// All variants, weakest first.
    pub const ALL: [ActionType; 3] = [ActionType::View, ActionType::Register, ActionType::Like];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "VIEW",
            Self::Register => "REGISTER",
            Self::Like => "LIKE",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = EventError;

    /// Accepts `VIEW` as well as the `ACTION_VIEW` spelling used by producers,
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.strip_prefix("ACTION_").unwrap_or(&upper) {
            "VIEW" => Ok(Self::View),
            "REGISTER" => Ok(Self::Register),
            "LIKE" => Ok(Self::Like),
            _ => Err(EventError::UnknownActionType {
                action_type: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_spellings() {
        assert_eq!("VIEW".parse::<ActionType>().unwrap(), ActionType::View);
        assert_eq!("action_like".parse::<ActionType>().unwrap(), ActionType::Like);
        assert_eq!(" Register ".parse::<ActionType>().unwrap(), ActionType::Register);
    }

    #[test]
    fn rejects_unknown() {
        let err = "SHARE".parse::<ActionType>().unwrap_err();
        assert!(err.to_string().contains("SHARE"));
    }

    #[test]
    fn display_matches_wire_name() {
        for action in ActionType::ALL {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json.trim_matches('"'), action.to_string());
        }
    }
}
