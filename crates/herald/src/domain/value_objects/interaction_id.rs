//! Interaction identifiers
//!
//! Wire ids of the form `prefix:slug:hash8` that correlate a rendered control
//! with a platform action. The hash covers the raw label only, so two controls
//! with the same label share an id regardless of their position.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::domain::errors::RelayError;

/// Hard platform limit on a component custom id, in characters
pub const MAX_INTERACTION_ID_CHARS: usize = 100;
/// Prefix used for RSVP controls
pub const DEFAULT_PREFIX: &str = "rsvp";

const HASH_HEX_LEN: usize = 8;
const MAX_PREFIX_CHARS: usize = 32;
const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// Parsed interaction id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InteractionId {
    prefix: String,
    slug: String,
    hash: String,
}

impl InteractionId {
    /// Parse `prefix:slug:hash8`.
    pub fn parse(id: &str) -> Result<Self, RelayError> {
        let malformed = || RelayError::MalformedId(id.to_string());

        if id.chars().count() > MAX_INTERACTION_ID_CHARS {
            return Err(malformed());
        }

        let mut parts = id.split(':');
        let (Some(prefix), Some(slug), Some(hash), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };

        if !is_valid_prefix(prefix)
            || slug.is_empty()
            || !slug.chars().all(is_slug_char)
            || hash.len() != HASH_HEX_LEN
            || !hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        {
            return Err(malformed());
        }

        Ok(Self {
            prefix: prefix.to_string(),
            slug: slug.to_string(),
            hash: hash.to_string(),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }
}

impl fmt::Display for InteractionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.prefix, self.slug, self.hash)
    }
}

impl FromStr for InteractionId {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for InteractionId {
    type Error = RelayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<InteractionId> for String {
    fn from(id: InteractionId) -> Self {
        id.to_string()
    }
}

/// Derives interaction ids from control labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierCodec {
    prefix: String,
}

impl IdentifierCodec {
    pub fn new(prefix: impl Into<String>) -> Result<Self, RelayError> {
        let prefix = prefix.into();
        if !is_valid_prefix(&prefix) || prefix.len() > MAX_PREFIX_CHARS {
            return Err(RelayError::Validation(format!(
                "invalid interaction id prefix '{prefix}'"
            )));
        }
        Ok(Self { prefix })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Encode a label; `row`/`col` only feed the fallback slug.
    pub fn encode(&self, label: &str, row: usize, col: usize) -> InteractionId {
        // prefix + two separators + hash
        let budget = MAX_INTERACTION_ID_CHARS - self.prefix.len() - 2 - HASH_HEX_LEN;

        let mut slug = truncate_graphemes(&slugify(label), budget);
        if slug.is_empty() {
            slug = truncate_graphemes(&format!("btn-{row}-{col}"), budget);
        }

        InteractionId {
            prefix: self.prefix.clone(),
            slug,
            hash: format!("{:08x}", fnv1a32(label.as_bytes())),
        }
    }

    pub fn decode(&self, id: &str) -> Result<InteractionId, RelayError> {
        InteractionId::parse(id)
    }
}

impl Default for IdentifierCodec {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

/// 32-bit FNV-1a
pub fn fnv1a32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ u32::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// Lowercase, keeping letters, digits, `-` and `_`.
fn slugify(label: &str) -> String {
    label
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// A character `slugify` can emit
fn is_slug_char(c: char) -> bool {
    (c.is_alphanumeric() || c == '-' || c == '_') && c.to_lowercase().eq(std::iter::once(c))
}

fn truncate_graphemes(text: &str, max_chars: usize) -> String {
    let mut used = 0;
    let mut out = String::new();
    for grapheme in text.graphemes(true) {
        let width = grapheme.chars().count();
        if used + width > max_chars {
            break;
        }
        used += width;
        out.push_str(grapheme);
    }
    out
}

fn is_valid_prefix(prefix: &str) -> bool {
    !prefix.is_empty()
        && prefix
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_yes() {
        let codec = IdentifierCodec::default();
        let id = codec.encode("Yes!", 0, 0);
        assert_eq!(id.slug(), "yes");
        assert_eq!(id.hash(), "dc811cc3");
        assert_eq!(id.to_string(), "rsvp:yes:dc811cc3");
    }

    #[test]
    fn test_encode_is_deterministic() {
        let codec = IdentifierCodec::default();
        let first = codec.encode("Yes!", 0, 0);
        for _ in 0..10 {
            assert_eq!(codec.encode("Yes!", 0, 0), first);
        }
    }

    #[test]
    fn test_hash_ignores_position() {
        let codec = IdentifierCodec::default();
        assert_eq!(codec.encode("Maybe", 0, 1), codec.encode("Maybe", 3, 4));
    }

    #[test]
    fn test_fallback_slug_for_symbol_only_label() {
        let codec = IdentifierCodec::default();
        let id = codec.encode("✅ !!", 2, 3);
        assert_eq!(id.slug(), "btn-2-3");
        assert_eq!(id.hash(), format!("{:08x}", fnv1a32("✅ !!".as_bytes())));
    }

    #[test]
    fn test_emoji_label_keeps_words() {
        let codec = IdentifierCodec::default();
        let id = codec.encode("✅ Going", 0, 0);
        assert_eq!(id.to_string(), "rsvp:going:b622116c");
    }

    #[test]
    fn test_length_bound_for_long_labels() {
        let codec = IdentifierCodec::default();
        let labels = [
            "a".repeat(1000),
            "Ünïcödé-".repeat(120),
            "नमस्ते".repeat(160),
            "x_".repeat(500),
        ];
        for label in &labels {
            let id = codec.encode(label, 4, 4).to_string();
            assert!(id.chars().count() <= MAX_INTERACTION_ID_CHARS, "{id}");
            assert!(InteractionId::parse(&id).is_ok());
        }
    }

    #[test]
    fn test_truncation_respects_grapheme_boundaries() {
        // Devanagari syllables combine a consonant with alphabetic vowel signs
        let label = "कि".repeat(100);
        let id = IdentifierCodec::default().encode(&label, 0, 0);
        assert!(id.slug().chars().count() % 2 == 0);
        assert_eq!(id.slug().chars().count(), 86);
    }

    #[test]
    fn test_decode_round_trip_parts() {
        let parsed = InteractionId::parse("rsvp:going:b622116c").unwrap();
        assert_eq!(parsed.prefix(), "rsvp");
        assert_eq!(parsed.slug(), "going");
        assert_eq!(parsed.hash(), "b622116c");
    }

    #[test]
    fn test_decode_rejects_malformed() {
        for bad in [
            "",
            "rsvp",
            "rsvp:yes",
            "rsvp:yes:DC811CC3",
            "rsvp:yes:dc811cc",
            "rsvp::dc811cc3",
            ":yes:dc811cc3",
            "rsvp:yes:dc811cc3:extra",
            "rsvp:Y E S:dc811cc3",
            "rsvp:Yes:dc811cc3",
            "rsvp:yes!:dc811cc3",
            "✅",
        ] {
            assert!(
                matches!(InteractionId::parse(bad), Err(RelayError::MalformedId(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_encoded_ids_parse_back() {
        let codec = IdentifierCodec::default();
        for label in ["✅ Going", "Ça Marche", "Straße", "日本語 OK", "***", "x".repeat(300).as_str()] {
            let id = codec.encode(label, 1, 2);
            assert_eq!(codec.decode(&id.to_string()).unwrap(), id, "{label}");
        }
    }

    #[test]
    fn test_custom_prefix_validation() {
        assert!(IdentifierCodec::new("poll").is_ok());
        assert!(IdentifierCodec::new("").is_err());
        assert!(IdentifierCodec::new("has:colon").is_err());
        assert!(IdentifierCodec::new("p".repeat(40)).is_err());
    }
}
