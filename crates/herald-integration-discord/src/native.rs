//! Discord wire types
//!
//! The subset of Discord's message JSON the mapper reads. Gateway and REST
//! payloads deserialize straight into these; serenity models are bridged
//! through their own JSON form.

use chrono::{DateTime, Utc};
use herald::RelayError;
use serde::{Deserialize, Deserializer, Serialize};

/// Discord component type for buttons
pub const COMPONENT_BUTTON: u8 = 2;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DiscordMessage {
    #[serde(deserialize_with = "snowflake")]
    pub id: String,
    #[serde(deserialize_with = "snowflake")]
    pub channel_id: String,
    pub author: DiscordUser,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub mentions: Vec<DiscordUser>,
    #[serde(default)]
    pub embeds: Vec<DiscordEmbed>,
    #[serde(default)]
    pub components: Vec<DiscordComponent>,
    #[serde(default)]
    pub reactions: Vec<DiscordReaction>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DiscordUser {
    #[serde(deserialize_with = "snowflake")]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub bot: Option<bool>,
}

impl DiscordUser {
    /// Global display name, falling back to the username
    pub fn display_name(&self) -> &str {
        self.global_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DiscordEmbed {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub color: Option<u32>,
    #[serde(default)]
    pub author: Option<DiscordEmbedAuthor>,
    #[serde(default)]
    pub fields: Vec<DiscordEmbedField>,
    #[serde(default)]
    pub footer: Option<DiscordEmbedFooter>,
    #[serde(default)]
    pub image: Option<DiscordEmbedMedia>,
    #[serde(default)]
    pub thumbnail: Option<DiscordEmbedMedia>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DiscordEmbedAuthor {
    pub name: String,
    #[serde(default)]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DiscordEmbedField {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DiscordEmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DiscordEmbedMedia {
    pub url: String,
}

/// Action row or leaf component
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DiscordComponent {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub components: Vec<DiscordComponent>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DiscordReaction {
    #[serde(default)]
    pub count: Option<u64>,
    pub emoji: DiscordEmoji,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DiscordEmoji {
    #[serde(default)]
    pub name: Option<String>,
}

impl DiscordMessage {
    /// Bridge a serenity model through its JSON form
    pub fn from_serenity(message: &serenity::model::channel::Message) -> Result<Self, RelayError> {
        let value = serde_json::to_value(message)
            .map_err(|e| RelayError::Validation(format!("Unencodable Discord message: {e}")))?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, RelayError> {
        serde_json::from_value(value)
            .map_err(|e| RelayError::Validation(format!("Invalid Discord message: {e}")))
    }

    /// Buttons anywhere in the component tree, in order
    pub fn buttons(&self) -> Vec<&DiscordComponent> {
        fn walk<'a>(components: &'a [DiscordComponent], out: &mut Vec<&'a DiscordComponent>) {
            for component in components {
                if component.kind == COMPONENT_BUTTON {
                    out.push(component);
                }
                walk(&component.components, out);
            }
        }

        let mut out = Vec::new();
        walk(&self.components, &mut out);
        out
    }

    /// Reported count for a unicode reaction
    pub fn reaction_count(&self, emoji: &str) -> Option<u64> {
        self.reactions
            .iter()
            .find(|r| r.emoji.name.as_deref() == Some(emoji))
            .and_then(|r| r.count)
    }
}

/// Snowflakes arrive as strings from the API but numbers from some tooling
fn snowflake<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}
