//! Translation of Discord messages into relay records

use chrono::Utc;
use herald::domain::entities::{
    ButtonRecord, ChatMessageRecord, EmbedAuthor, EmbedField, EmbedRecord, MentionRecord,
};
use regex::Regex;
use tracing::trace;

use crate::native::{DiscordEmbed, DiscordMessage};

/// Emojis tallied when an embed carries no buttons of its own
pub const DEFAULT_RSVP_EMOJIS: [&str; 3] = ["✅", "❓", "❌"];

/// Why a message passed the author check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relevance {
    /// No expected author configured
    NoAuthorFilter,
    /// Posted by the expected author
    ExpectedAuthor,
    /// Other author, but nothing to attribute
    NoEmbed,
    /// Other author with embeds; accepted anyway
    Permissive,
}

impl Relevance {
    pub fn is_relevant(self) -> bool {
        match self {
            Relevance::NoAuthorFilter
            | Relevance::ExpectedAuthor
            | Relevance::NoEmbed
            | Relevance::Permissive => true,
        }
    }
}

struct RsvpTally {
    emoji: String,
    footer: Option<Regex>,
}

pub struct ContentMapper {
    tallies: Vec<RsvpTally>,
}

impl ContentMapper {
    pub fn new<I, S>(rsvp_emojis: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tallies = rsvp_emojis
            .into_iter()
            .map(Into::<String>::into)
            .filter(|emoji| !emoji.is_empty())
            .map(|emoji| {
                let footer = Regex::new(&format!(r"{}\s*(\d+)", regex::escape(&emoji))).ok();
                RsvpTally { emoji, footer }
            })
            .collect();
        Self { tallies }
    }

    pub fn rsvp_emojis(&self) -> impl Iterator<Item = &str> {
        self.tallies.iter().map(|t| t.emoji.as_str())
    }

    /// The configured RSVP emoji `label` starts with, if any
    pub fn leading_emoji<'a>(&'a self, label: &str) -> Option<&'a str> {
        let label = label.trim_start();
        self.rsvp_emojis().find(|emoji| label.starts_with(emoji))
    }

    pub fn is_rsvp_emoji(&self, candidate: &str) -> bool {
        self.rsvp_emojis().any(|emoji| emoji == candidate)
    }

    /// Map the first embed of `message`, if it has one
    pub fn map_message_embed(&self, message: &DiscordMessage) -> Option<EmbedRecord> {
        message
            .embeds
            .first()
            .map(|embed| self.map_embed(embed, message))
    }

    pub fn map_embed(&self, embed: &DiscordEmbed, message: &DiscordMessage) -> EmbedRecord {
        let mut record = EmbedRecord::new(message.id.clone(), message.channel_id.clone());
        record.timestamp = embed.timestamp.or(message.timestamp);
        record.color = embed.color;
        record.author = embed.author.as_ref().map(|a| EmbedAuthor {
            name: a.name.clone(),
            icon_url: a.icon_url.clone(),
        });
        record.title = embed.title.clone();
        record.description = embed.description.clone();
        record.fields = embed
            .fields
            .iter()
            .map(|f| EmbedField {
                name: f.name.clone(),
                value: f.value.clone(),
            })
            .collect();
        record.thumbnail_url = embed.thumbnail.as_ref().map(|m| m.url.clone());
        record.image_url = embed.image.as_ref().map(|m| m.url.clone());

        let buttons = self.explicit_buttons(message);
        record.buttons = if buttons.is_empty() {
            let tallied = self.tally_buttons(embed, message);
            (!tallied.is_empty()).then_some(tallied)
        } else {
            Some(buttons)
        };

        let mentions: Vec<String> = message.mentions.iter().map(|u| u.id.clone()).collect();
        record.mentions = (!mentions.is_empty()).then_some(mentions);

        record.enforce_limits()
    }

    fn explicit_buttons(&self, message: &DiscordMessage) -> Vec<ButtonRecord> {
        message
            .buttons()
            .into_iter()
            .map(|b| ButtonRecord {
                label: b.label.clone().unwrap_or_default(),
                url: b.url.clone(),
                custom_id: b.custom_id.clone(),
            })
            .collect()
    }

    /// Synthesize one control per RSVP emoji from reaction counts, falling
    /// back to counts written in the footer ("✅ 3 | ❌ 1").
    fn tally_buttons(&self, embed: &DiscordEmbed, message: &DiscordMessage) -> Vec<ButtonRecord> {
        let footer = embed.footer.as_ref().map(|f| f.text.as_str());
        self.tallies
            .iter()
            .filter_map(|tally| {
                let count = message.reaction_count(&tally.emoji).or_else(|| {
                    let captures = tally.footer.as_ref()?.captures(footer?)?;
                    captures.get(1)?.as_str().parse().ok()
                })?;
                Some(ButtonRecord::with_custom_id(
                    format!("{} {}", tally.emoji, count),
                    tally.emoji.clone(),
                ))
            })
            .collect()
    }

    pub fn map_message(&self, message: &DiscordMessage) -> ChatMessageRecord {
        let timestamp_ms = message
            .timestamp
            .unwrap_or_else(Utc::now)
            .timestamp_millis();
        let mentions = message
            .mentions
            .iter()
            .map(|u| MentionRecord {
                id: u.id.clone(),
                name: u.display_name().to_string(),
            })
            .collect();

        ChatMessageRecord::new(
            message.id.clone(),
            message.channel_id.clone(),
            message.author.id.clone(),
            message.author.display_name(),
            message.content.clone(),
        )
        .with_mentions(mentions)
        .with_timestamp_ms(timestamp_ms)
    }

    pub fn relevance(message: &DiscordMessage, expected_author: Option<&str>) -> Relevance {
        let relevance = match expected_author {
            None => Relevance::NoAuthorFilter,
            Some(expected) if message.author.id == expected => Relevance::ExpectedAuthor,
            Some(_) if message.embeds.is_empty() => Relevance::NoEmbed,
            Some(_) => Relevance::Permissive,
        };
        trace!(message_id = %message.id, ?relevance, "Author relevance");
        relevance
    }

    /// Whether an embed from this message should be relayed
    pub fn is_relevant_author(message: &DiscordMessage, expected_author: Option<&str>) -> bool {
        Self::relevance(message, expected_author).is_relevant()
    }
}

impl Default for ContentMapper {
    fn default() -> Self {
        Self::new(DEFAULT_RSVP_EMOJIS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{
        DiscordComponent, DiscordEmbedFooter, DiscordEmoji, DiscordReaction, DiscordUser,
        COMPONENT_BUTTON,
    };

    fn message(embed: DiscordEmbed) -> DiscordMessage {
        DiscordMessage {
            id: "900".into(),
            channel_id: "42".into(),
            author: DiscordUser {
                id: "7".into(),
                username: "raidbot".into(),
                global_name: None,
                bot: Some(true),
            },
            embeds: vec![embed],
            ..Default::default()
        }
    }

    fn reaction(emoji: &str, count: u64) -> DiscordReaction {
        DiscordReaction {
            count: Some(count),
            emoji: DiscordEmoji {
                name: Some(emoji.into()),
            },
        }
    }

    fn labels(record: &EmbedRecord) -> Vec<&str> {
        record
            .buttons
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|b| b.label.as_str())
            .collect()
    }

    #[test]
    fn test_reactions_become_rsvp_buttons() {
        let mut msg = message(DiscordEmbed {
            title: Some("Friday raid".into()),
            ..Default::default()
        });
        msg.reactions = vec![reaction("❌", 1), reaction("✅", 3), reaction("🎉", 9)];

        let record = ContentMapper::default().map_message_embed(&msg).unwrap();
        assert_eq!(labels(&record), vec!["✅ 3", "❌ 1"]);
        assert_eq!(record.buttons.as_ref().unwrap()[0].custom_id.as_deref(), Some("✅"));
        assert_eq!(record.id, "900");
        assert_eq!(record.channel_id, "42");
    }

    #[test]
    fn test_footer_counts_fill_missing_reactions() {
        let mut msg = message(DiscordEmbed {
            footer: Some(DiscordEmbedFooter {
                text: "✅ 12 | ❓2 | ❌ none".into(),
            }),
            ..Default::default()
        });
        msg.reactions = vec![reaction("✅", 4)];

        let record = ContentMapper::default().map_message_embed(&msg).unwrap();
        assert_eq!(labels(&record), vec!["✅ 4", "❓ 2"]);
    }

    #[test]
    fn test_explicit_buttons_win_over_reactions() {
        let mut msg = message(DiscordEmbed::default());
        msg.reactions = vec![reaction("✅", 3)];
        msg.components = vec![DiscordComponent {
            kind: 1,
            components: vec![DiscordComponent {
                kind: COMPONENT_BUTTON,
                label: Some("Sign up".into()),
                url: Some("https://example.com".into()),
                ..Default::default()
            }],
            ..Default::default()
        }];

        let record = ContentMapper::default().map_message_embed(&msg).unwrap();
        assert_eq!(labels(&record), vec!["Sign up"]);
        assert_eq!(
            record.buttons.unwrap()[0].url.as_deref(),
            Some("https://example.com")
        );
    }

    #[test]
    fn test_no_buttons_or_tallies_leaves_buttons_absent() {
        let msg = message(DiscordEmbed::default());
        let record = ContentMapper::default().map_message_embed(&msg).unwrap();
        assert!(record.buttons.is_none());
        assert!(record.mentions.is_none());
    }

    #[test]
    fn test_message_without_embed_maps_to_none() {
        let msg = DiscordMessage::default();
        assert!(ContentMapper::default().map_message_embed(&msg).is_none());
    }

    #[test]
    fn test_map_chat_message() {
        let mut msg = message(DiscordEmbed::default());
        msg.embeds.clear();
        msg.content = "see you there <@8>".into();
        msg.author.global_name = Some("Raid Bot".into());
        msg.mentions = vec![DiscordUser {
            id: "8".into(),
            username: "bea".into(),
            global_name: Some("Bea".into()),
            bot: None,
        }];
        msg.timestamp = "2024-05-01T18:30:00Z".parse().ok();

        let record = ContentMapper::default().map_message(&msg);
        assert_eq!(record.author_name, "Raid Bot");
        assert_eq!(record.mentions[0].name, "Bea");
        assert_eq!(record.timestamp_ms, 1_714_588_200_000);
    }

    #[test]
    fn test_relevance_is_permissive() {
        let msg = message(DiscordEmbed::default());
        assert_eq!(
            ContentMapper::relevance(&msg, None),
            Relevance::NoAuthorFilter
        );
        assert_eq!(
            ContentMapper::relevance(&msg, Some("7")),
            Relevance::ExpectedAuthor
        );
        let other = ContentMapper::relevance(&msg, Some("99"));
        assert_eq!(other, Relevance::Permissive);
        assert!(other.is_relevant());

        let mut chat = message(DiscordEmbed::default());
        chat.embeds.clear();
        assert_eq!(ContentMapper::relevance(&chat, Some("99")), Relevance::NoEmbed);
        assert!(ContentMapper::is_relevant_author(&chat, Some("99")));
    }

    #[test]
    fn test_leading_emoji() {
        let mapper = ContentMapper::default();
        assert_eq!(mapper.leading_emoji("✅ Going"), Some("✅"));
        assert_eq!(mapper.leading_emoji("Maybe ❓"), None);
        assert!(mapper.is_rsvp_emoji("❌"));
        assert!(!mapper.is_rsvp_emoji("🎉"));
    }
}
