use crate::limits::rate_limit_message;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureKind {
    /// Missing or empty input, caught before any remote call.
    Validation,
    RateLimited { wait_ms: u64 },
    Io,
    /// Quick query found nothing to send.
    NoImage,
    Remote,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Validation => "validation",
            FailureKind::RateLimited { .. } => "rate_limited",
            FailureKind::Io => "io",
            FailureKind::NoImage => "no_image",
            FailureKind::Remote => "remote",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFailure {
    kind: FailureKind,
    message: String,
}

impl QueryFailure {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Validation,
            message: message.into(),
        }
    }

    pub fn rate_limited(wait_ms: u64) -> Self {
        Self {
            kind: FailureKind::RateLimited { wait_ms },
            message: rate_limit_message(wait_ms),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Io,
            message: message.into(),
        }
    }

    pub fn no_image() -> Self {
        Self {
            kind: FailureKind::NoImage,
            message: "No PNG Image Found".to_string(),
        }
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Remote,
            message: message.into(),
        }
    }

    /// Wraps any error from the model client, keeping the whole cause chain.
    pub fn from_remote(err: &anyhow::Error) -> Self {
        Self::remote(error_chain_text(err, 2000))
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Text shown in place of the response.
    pub fn user_message(&self) -> String {
        match self.kind {
            FailureKind::Io | FailureKind::Remote => format!("Error: {}", self.message),
            FailureKind::Validation | FailureKind::RateLimited { .. } | FailureKind::NoImage => {
                self.message.clone()
            }
        }
    }
}

impl std::fmt::Display for QueryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for QueryFailure {}

pub fn error_chain_text(err: &anyhow::Error, max_chars: usize) -> String {
    let mut parts: Vec<String> = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if parts
            .last()
            .map(|existing| existing == trimmed)
            .unwrap_or(false)
        {
            continue;
        }
        parts.push(trimmed.to_string());
    }
    if parts.is_empty() {
        return truncate_text(&err.to_string(), max_chars);
    }
    truncate_text(&parts.join(" | caused by: "), max_chars)
}

pub fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::{error_chain_text, FailureKind, QueryFailure};

    #[test]
    fn remote_failures_render_with_error_prefix() {
        let err = anyhow::anyhow!("API key not valid. Please pass a valid API key.");
        let failure = QueryFailure::from_remote(&err);
        assert_eq!(failure.kind(), FailureKind::Remote);
        assert_eq!(
            failure.user_message(),
            "Error: API key not valid. Please pass a valid API key."
        );
    }

    #[test]
    fn rate_limited_failure_carries_wait_and_message() {
        let failure = QueryFailure::rate_limited(4200);
        assert_eq!(failure.kind(), FailureKind::RateLimited { wait_ms: 4200 });
        assert_eq!(
            failure.user_message(),
            "Rate limit exceeded. Please wait 5 seconds before making another request."
        );
    }

    #[test]
    fn no_image_message_matches_quick_query_wording() {
        assert_eq!(QueryFailure::no_image().user_message(), "No PNG Image Found");
        assert_eq!(QueryFailure::no_image().kind().as_str(), "no_image");
    }

    #[test]
    fn error_chain_text_joins_distinct_causes() {
        let err = Err::<(), _>(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ))
        .context("Gemini request failed")
        .err()
        .unwrap_or_else(|| anyhow::anyhow!("unreachable"));
        assert_eq!(
            error_chain_text(&err, 200),
            "Gemini request failed | caused by: connection refused"
        );
        assert_eq!(error_chain_text(&err, 6), "Gemini…");
    }
}
