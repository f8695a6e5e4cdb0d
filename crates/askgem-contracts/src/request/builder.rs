use super::depth::ReasoningOptions;
use super::message::{ContentPart, Message};

pub const MARKDOWN_SUFFIX: &str = ". Answer in markdown.";
pub const CLIPBOARD_PREFILL_MAX_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub message: Message,
    pub options: Option<ReasoningOptions>,
}

/// Composes the user turn. The query is not re-validated here and the
/// options are carried through as given.
pub fn build_request(
    query: &str,
    image: Option<Vec<u8>>,
    options: Option<ReasoningOptions>,
) -> PreparedRequest {
    let mut parts = vec![ContentPart::Text(format!("{query}{MARKDOWN_SUFFIX}"))];
    if let Some(bytes) = image {
        parts.push(ContentPart::Image(bytes));
    }
    PreparedRequest {
        message: Message::user(parts),
        options,
    }
}

/// Initial query draft taken from clipboard text.
pub fn prefill_query(clipboard: Option<&str>) -> Option<String> {
    let text = clipboard?;
    if text.trim().is_empty() || text.chars().count() >= CLIPBOARD_PREFILL_MAX_CHARS {
        return None;
    }
    Some(text.to_string())
}
