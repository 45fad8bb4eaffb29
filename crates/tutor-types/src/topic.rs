//! The fixed catalog of tutoring topics.
//!
//! Each topic owns exactly one system instruction and one storage key.
//! The catalog never changes at runtime; configuration may only swap the
//! instruction text of a topic (see `TutorConfig::instructions`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rule shared by every subject tutor: multiple-choice answers come from the
/// options the student actually supplied.
const CHOICE_RULE: &str = "When a multiple-choice question is provided (for example as an image), \
you must pick the answer from the options that are actually shown. Never invent an option that is \
not there.";

/// A tutoring subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    Japanese,
    Math,
    English,
    Physics,
    Chemistry,
    PolEco,
    #[serde(rename = "J_History")]
    JapaneseHistory,
    #[serde(rename = "W_History")]
    WorldHistory,
    Free,
}

impl Topic {
    /// Every topic, in catalog order.
    pub const ALL: [Topic; 9] = [
        Topic::Japanese,
        Topic::Math,
        Topic::English,
        Topic::Physics,
        Topic::Chemistry,
        Topic::PolEco,
        Topic::JapaneseHistory,
        Topic::WorldHistory,
        Topic::Free,
    ];

    /// Stable identifier, used in storage keys and on the command line.
    pub fn id(self) -> &'static str {
        match self {
            Topic::Japanese => "Japanese",
            Topic::Math => "Math",
            Topic::English => "English",
            Topic::Physics => "Physics",
            Topic::Chemistry => "Chemistry",
            Topic::PolEco => "PolEco",
            Topic::JapaneseHistory => "J_History",
            Topic::WorldHistory => "W_History",
            Topic::Free => "Free",
        }
    }

    /// Human-readable name for menus.
    pub fn label(self) -> &'static str {
        match self {
            Topic::Japanese => "Japanese language",
            Topic::Math => "Mathematics",
            Topic::English => "English",
            Topic::Physics => "Physics",
            Topic::Chemistry => "Chemistry",
            Topic::PolEco => "Politics & Economics",
            Topic::JapaneseHistory => "Japanese History",
            Topic::WorldHistory => "World History",
            Topic::Free => "Free conversation",
        }
    }

    /// Key under which this topic's conversation log is persisted.
    pub fn storage_key(self) -> String {
        format!("history_{}", self.id())
    }

    /// Built-in system instruction for this topic.
    pub fn default_instruction(self) -> String {
        let persona = match self {
            Topic::Japanese => {
                "You are a professional tutor of Japanese language and literature. \
                 Explain your reasoning logically."
            }
            Topic::Math => {
                "You are a professional mathematics tutor. Write all formulas as LaTeX \
                 (for example $y=ax^2+bx+c$). When a problem arrives as an image, read its \
                 equations and figures and walk through the solution step by step."
            }
            Topic::English => "You are a strict native English teacher.",
            Topic::Physics => {
                "You are a professional physics tutor. Choose the most appropriate of the \
                 presented options and explain the physics behind it."
            }
            Topic::Chemistry => {
                "You are a professional chemistry tutor. Read any apparatus and reaction \
                 equations shown in images, then explain why the correct answer is correct."
            }
            Topic::PolEco => {
                "You are a professional tutor of politics and economics. Read graphs and \
                 source material carefully before answering."
            }
            Topic::JapaneseHistory => {
                "You are a strict professional tutor of Japanese history. Base your \
                 explanations on the standard high-school textbook account."
            }
            Topic::WorldHistory => {
                "You are a strict professional tutor of world history. For map and artwork \
                 questions, explain using the process of elimination."
            }
            Topic::Free => return format!("You are a capable general assistant. {CHOICE_RULE}"),
        };
        format!("{persona} {CHOICE_RULE}")
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Topic {
    type Err = String;

    /// Accepts the identifier (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Topic::ALL
            .into_iter()
            .find(|t| t.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown topic: '{wanted}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_topic_roundtrip() {
        for topic in Topic::ALL {
            let parsed: Topic = topic.to_string().parse().unwrap();
            assert_eq!(topic, parsed);
        }
        assert_eq!("j_history".parse::<Topic>().unwrap(), Topic::JapaneseHistory);
        assert!("Biology".parse::<Topic>().is_err());
    }

    #[test]
    fn test_storage_keys_are_distinct() {
        let keys: HashSet<String> = Topic::ALL.iter().map(|t| t.storage_key()).collect();
        assert_eq!(keys.len(), Topic::ALL.len());
        assert_eq!(Topic::Physics.storage_key(), "history_Physics");
        assert_eq!(Topic::WorldHistory.storage_key(), "history_W_History");
    }

    #[test]
    fn test_serde_uses_ids() {
        let json = serde_json::to_string(&Topic::JapaneseHistory).unwrap();
        assert_eq!(json, "\"J_History\"");
        let parsed: Topic = serde_json::from_str("\"W_History\"").unwrap();
        assert_eq!(parsed, Topic::WorldHistory);
    }

    #[test]
    fn test_every_instruction_carries_choice_rule() {
        for topic in Topic::ALL {
            assert!(topic.default_instruction().contains("Never invent an option"));
        }
        assert!(Topic::Math.default_instruction().contains("LaTeX"));
    }
}
