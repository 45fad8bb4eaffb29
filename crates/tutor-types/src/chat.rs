//! Conversation turn and log types.
//!
//! A `Turn` is one message in a topic's conversation. Its role is fixed at
//! construction, only user turns carry images, and only model turns
//! produced by the fallback tier carry a tier marker. The stored JSON form
//! is validated on the way back in so a hand-edited or corrupted log cannot
//! produce a turn that breaks those rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::image::ImageAttachment;
use crate::llm::Tier;

/// Author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Model => write!(f, "model"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "model" => Ok(Role::Model),
            other => Err(format!("invalid role: '{other}'")),
        }
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TurnRecord", into = "TurnRecord")]
pub struct Turn {
    role: Role,
    text: String,
    image: Option<ImageAttachment>,
    tier: Option<Tier>,
}

impl Turn {
    /// A user turn. `text` may be empty when an image is attached.
    pub fn user(text: impl Into<String>, image: Option<ImageAttachment>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            image,
            tier: None,
        }
    }

    /// A model turn. Only `Tier::Fallback` is recorded; a primary answer
    /// carries no marker.
    pub fn model(text: impl Into<String>, tier: Option<Tier>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
            image: None,
            tier: tier.filter(|t| *t == Tier::Fallback),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn image(&self) -> Option<&ImageAttachment> {
        self.image.as_ref()
    }

    pub fn tier(&self) -> Option<Tier> {
        self.tier
    }

    /// True when this answer came from the fallback model.
    pub fn is_fallback(&self) -> bool {
        self.tier == Some(Tier::Fallback)
    }
}

/// Wire/storage form of a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TurnRecord {
    role: Role,
    #[serde(default)]
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tier: Option<Tier>,
}

impl TryFrom<TurnRecord> for Turn {
    type Error = String;

    fn try_from(record: TurnRecord) -> Result<Self, Self::Error> {
        match record.role {
            Role::User => {
                if record.tier.is_some() {
                    return Err("user turn cannot carry a tier marker".to_string());
                }
                let image = record
                    .image
                    .map(|uri| ImageAttachment::from_data_uri(&uri))
                    .transpose()
                    .map_err(|e| e.to_string())?;
                Ok(Turn::user(record.text, image))
            }
            Role::Model => {
                if record.image.is_some() {
                    return Err("model turn cannot carry an image".to_string());
                }
                if record.tier == Some(Tier::Primary) {
                    return Err("only fallback turns are tier-marked".to_string());
                }
                Ok(Turn::model(record.text, record.tier))
            }
        }
    }
}

impl From<Turn> for TurnRecord {
    fn from(turn: Turn) -> Self {
        Self {
            role: turn.role,
            text: turn.text,
            image: turn.image.map(|i| i.as_data_uri().to_string()),
            tier: turn.tier,
        }
    }
}

/// Ordered turns of one topic, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationLog {
    turns: Vec<Turn>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }
}

impl From<Vec<Turn>> for ConversationLog {
    fn from(turns: Vec<Turn>) -> Self {
        Self { turns }
    }
}

impl<'a> IntoIterator for &'a ConversationLog {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_image() -> ImageAttachment {
        ImageAttachment::from_bytes("image/png", &[0x89, b'P', b'N', b'G']).unwrap()
    }

    #[test]
    fn test_role_roundtrip() {
        for role in [Role::User, Role::Model] {
            let parsed: Role = role.to_string().parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_model_turn_drops_primary_marker() {
        let turn = Turn::model("x=5", Some(Tier::Primary));
        assert_eq!(turn.tier(), None);
        assert!(!turn.is_fallback());

        let turn = Turn::model("x=5", Some(Tier::Fallback));
        assert!(turn.is_fallback());
    }

    #[test]
    fn test_turn_json_shape() {
        let turn = Turn::model("x=5", Some(Tier::Fallback));
        let json = serde_json::to_string(&turn).unwrap();
        assert_eq!(json, r#"{"role":"model","text":"x=5","tier":"fallback"}"#);

        let turn = Turn::user("hello", None);
        let json = serde_json::to_string(&turn).unwrap();
        assert_eq!(json, r#"{"role":"user","text":"hello"}"#);
    }

    #[test]
    fn test_user_turn_with_image_serializes_data_uri() {
        let turn = Turn::user("", Some(tiny_image()));
        let value = serde_json::to_value(&turn).unwrap();
        assert!(value["image"].as_str().unwrap().starts_with("data:image/png;base64,"));
        assert_eq!(value["text"], "");
    }

    #[test]
    fn test_rejects_user_turn_with_tier() {
        let json = r#"{"role":"user","text":"hi","tier":"fallback"}"#;
        assert!(serde_json::from_str::<Turn>(json).is_err());
    }

    #[test]
    fn test_rejects_model_turn_with_image() {
        let uri = tiny_image().as_data_uri().to_string();
        let json = format!(r#"{{"role":"model","text":"hi","image":"{uri}"}}"#);
        assert!(serde_json::from_str::<Turn>(&json).is_err());
    }

    #[test]
    fn test_rejects_malformed_image() {
        let json = r#"{"role":"user","text":"hi","image":"not a data uri"}"#;
        assert!(serde_json::from_str::<Turn>(json).is_err());
    }

    #[test]
    fn test_missing_text_defaults_empty() {
        let turn: Turn = serde_json::from_str(r#"{"role":"model"}"#).unwrap();
        assert_eq!(turn.text(), "");
    }

    #[test]
    fn test_log_roundtrip() {
        let mut log = ConversationLog::new();
        log.push(Turn::user("", Some(tiny_image())));
        log.push(Turn::model("a cat", None));
        log.push(Turn::user("and now?", None));
        log.push(Turn::model("still a cat", Some(Tier::Fallback)));

        let json = serde_json::to_string(&log).unwrap();
        assert!(json.starts_with('['));
        let parsed: ConversationLog = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, log);
    }
}
