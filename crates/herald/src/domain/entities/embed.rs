//! Embed Entity
//!
//! A rich event post observed on (or posted to) the chat platform, in the
//! shape pushed to overlay and dashboard consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Platform cap on fields per embed
pub const MAX_EMBED_FIELDS: usize = 25;
/// Platform cap on a field name, in characters
pub const MAX_FIELD_NAME_CHARS: usize = 256;
/// Platform cap on a field value, in characters
pub const MAX_FIELD_VALUE_CHARS: usize = 1024;
/// Platform cap on buttons attached to one message
pub const MAX_BUTTONS: usize = 25;
/// Platform cap on a button label, in characters
pub const MAX_BUTTON_LABEL_CHARS: usize = 80;

/// Embed as delivered to consumers. Identity is the platform message id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmbedRecord {
    /// Platform message id
    pub id: String,
    pub channel_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<EmbedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<ButtonRecord>>,
    /// Mentioned user ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentions: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

/// Interactive control rendered under an embed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ButtonRecord {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
}

impl EmbedRecord {
    /// Create an empty embed for a message
    pub fn new(id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            timestamp: None,
            color: None,
            author: None,
            title: None,
            description: None,
            fields: Vec::new(),
            thumbnail_url: None,
            image_url: None,
            buttons: None,
            mentions: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_buttons(mut self, buttons: Vec<ButtonRecord>) -> Self {
        self.buttons = Some(buttons);
        self
    }

    /// Clamp fields and buttons to the platform limits.
    pub fn enforce_limits(mut self) -> Self {
        self.fields.truncate(MAX_EMBED_FIELDS);
        for field in &mut self.fields {
            truncate_chars(&mut field.name, MAX_FIELD_NAME_CHARS);
            truncate_chars(&mut field.value, MAX_FIELD_VALUE_CHARS);
        }
        if let Some(buttons) = self.buttons.as_mut() {
            buttons.truncate(MAX_BUTTONS);
            for button in buttons.iter_mut() {
                truncate_chars(&mut button.label, MAX_BUTTON_LABEL_CHARS);
            }
        }
        self
    }

    /// Find a control by its custom id
    pub fn button(&self, custom_id: &str) -> Option<&ButtonRecord> {
        self.buttons
            .as_deref()?
            .iter()
            .find(|b| b.custom_id.as_deref() == Some(custom_id))
    }
}

impl ButtonRecord {
    pub fn with_custom_id(label: impl Into<String>, custom_id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: None,
            custom_id: Some(custom_id.into()),
        }
    }

    pub fn link(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: Some(url.into()),
            custom_id: None,
        }
    }
}

/// Content of an embed to be posted, before the platform assigns an id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmbedDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<u32>,
    #[serde(default)]
    pub fields: Vec<EmbedField>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl EmbedDraft {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.fields.is_empty()
            && self.image_url.is_none()
    }
}

/// Truncate in place to at most `max` characters.
pub fn truncate_chars(text: &mut String, max: usize) {
    if let Some((idx, _)) = text.char_indices().nth(max) {
        text.truncate(idx);
    }
}
