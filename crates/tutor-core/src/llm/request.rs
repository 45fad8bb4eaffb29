//! Turns conversation state into a provider-neutral completion request.
//!
//! Pure: no IO, no mutation. History is text only; images are sent just once,
//! with the turn that attached them.

use tutor_types::chat::ConversationLog;
use tutor_types::image::{ImageAttachment, ImageError};
use tutor_types::llm::{CompletionRequest, ContentPart, HistoryEntry};

/// Stand-in for prior turns with no text. The wire protocol rejects empty
/// text parts.
pub const EMPTY_TURN_PLACEHOLDER: &str = "(an image or file was sent)";

/// Text sent alongside an image when the user typed nothing.
pub const DEFAULT_IMAGE_PROMPT: &str = "explain this image";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("nothing to send: no text and no image")]
    EmptyTurn,

    #[error("attached image cannot be sent: {0}")]
    InvalidImage(#[from] ImageError),
}

/// Everything that stays the same between tiers.
#[derive(Debug, Clone, Copy)]
pub struct RequestParams<'a> {
    pub model: &'a str,
    pub system_instruction: &'a str,
    pub temperature: f64,
}

/// Rewrite prior turns as text-only history entries.
pub fn build_history(log: &ConversationLog) -> Vec<HistoryEntry> {
    log.iter()
        .map(|turn| {
            let text = if turn.text().trim().is_empty() {
                EMPTY_TURN_PLACEHOLDER.to_string()
            } else {
                turn.text().to_string()
            };
            HistoryEntry {
                role: turn.role(),
                content: vec![ContentPart::Text(text)],
            }
        })
        .collect()
}

/// Content parts for the turn being sent: image first, then text.
pub fn build_content(
    text: &str,
    image: Option<&ImageAttachment>,
) -> Result<Vec<ContentPart>, RequestError> {
    match image {
        Some(image) => {
            let data = image.decode()?;
            let text = if text.is_empty() {
                DEFAULT_IMAGE_PROMPT
            } else {
                text
            };
            Ok(vec![
                ContentPart::InlineData {
                    mime_type: image.mime_type().to_string(),
                    data,
                },
                ContentPart::text(text),
            ])
        }
        None if text.trim().is_empty() => Err(RequestError::EmptyTurn),
        None => Ok(vec![ContentPart::text(text)]),
    }
}

/// Build the full request. `prior` must not yet contain the pending turn.
pub fn build_request(
    params: RequestParams<'_>,
    prior: &ConversationLog,
    text: &str,
    image: Option<&ImageAttachment>,
) -> Result<CompletionRequest, RequestError> {
    let content = build_content(text, image)?;
    Ok(CompletionRequest {
        model: params.model.to_string(),
        system_instruction: params.system_instruction.to_string(),
        temperature: params.temperature,
        history: build_history(prior),
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_types::chat::{Role, Turn};
    use tutor_types::llm::Tier;

    fn params() -> RequestParams<'static> {
        RequestParams {
            model: "primary",
            system_instruction: "You are a tutor.",
            temperature: 0.4,
        }
    }

    fn png() -> ImageAttachment {
        ImageAttachment::from_bytes("image/png", b"\x89PNG").unwrap()
    }

    #[test]
    fn test_history_replaces_blank_text() {
        let log = ConversationLog::from(vec![
            Turn::user("", Some(png())),
            Turn::model("a diagram", None),
            Turn::user("   ", None),
            Turn::model("ok", Some(Tier::Fallback)),
        ]);
        let history = build_history(&log);

        assert_eq!(history.len(), 4);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, vec![ContentPart::text(EMPTY_TURN_PLACEHOLDER)]);
        assert_eq!(history[1].content, vec![ContentPart::text("a diagram")]);
        assert_eq!(history[2].content, vec![ContentPart::text(EMPTY_TURN_PLACEHOLDER)]);
        assert_eq!(history[3].role, Role::Model);
    }

    #[test]
    fn test_history_never_carries_images() {
        let log = ConversationLog::from(vec![Turn::user("look", Some(png()))]);
        let history = build_history(&log);
        assert!(history[0]
            .content
            .iter()
            .all(|p| matches!(p, ContentPart::Text(_))));
    }

    #[test]
    fn test_image_only_uses_default_prompt() {
        let content = build_content("", Some(&png())).unwrap();
        assert_eq!(content.len(), 2);
        assert_eq!(
            content[0],
            ContentPart::InlineData {
                mime_type: "image/png".to_string(),
                data: b"\x89PNG".to_vec(),
            }
        );
        assert_eq!(content[1], ContentPart::text(DEFAULT_IMAGE_PROMPT));
    }

    #[test]
    fn test_image_with_text_keeps_text() {
        let content = build_content("which option?", Some(&png())).unwrap();
        assert!(matches!(content[0], ContentPart::InlineData { .. }));
        assert_eq!(content[1].as_text(), Some("which option?"));
    }

    #[test]
    fn test_text_only() {
        let content = build_content("2+3?", None).unwrap();
        assert_eq!(content, vec![ContentPart::text("2+3?")]);
    }

    #[test]
    fn test_empty_turn_rejected() {
        assert_eq!(build_content("", None), Err(RequestError::EmptyTurn));
        assert_eq!(build_content("  \n", None), Err(RequestError::EmptyTurn));
    }

    #[test]
    fn test_bad_base64_rejected() {
        let broken = ImageAttachment::from_data_uri("data:image/png;base64,!!!!").unwrap();
        let err = build_content("hi", Some(&broken)).unwrap_err();
        assert!(matches!(err, RequestError::InvalidImage(_)));
    }

    #[test]
    fn test_build_request_carries_params() {
        let prior = ConversationLog::from(vec![Turn::user("hi", None), Turn::model("hello", None)]);
        let request = build_request(params(), &prior, "2+3?", None).unwrap();

        assert_eq!(request.model, "primary");
        assert_eq!(request.system_instruction, "You are a tutor.");
        assert!((request.temperature - 0.4).abs() < f64::EPSILON);
        assert_eq!(request.history.len(), 2);
        assert_eq!(request.content, vec![ContentPart::text("2+3?")]);
    }
}
