//! Subscription topics

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Logical stream a subscriber listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Embeds,
    Messages,
}

impl Topic {
    pub const ALL: [Topic; 2] = [Topic::Embeds, Topic::Messages];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Embeds => "embeds",
            Self::Messages => "messages",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Topic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "embeds" => Ok(Self::Embeds),
            "messages" => Ok(Self::Messages),
            other => Err(format!("unknown topic '{other}'")),
        }
    }
}
