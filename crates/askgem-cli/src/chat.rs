use std::path::{Path, PathBuf};

use askgem_contracts::chat::{Intent, CHAT_HELP_COMMANDS};
use askgem_contracts::errors::QueryFailure;
use askgem_contracts::request::Depth;
use askgem_engine::{display_text, format_outcome, QueryEngine, QueryForm, QueryOutcome};

/// What the terminal loop should do after one line of input.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ChatReply {
    pub lines: Vec<String>,
    /// Text to place on the clipboard.
    pub copy: Option<String>,
    pub quit: bool,
}

impl ChatReply {
    fn say(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
            ..Self::default()
        }
    }
}

/// The interactive query form: current depth, attached image, the pending
/// clipboard draft and the response on screen.
pub struct ChatSession {
    engine: QueryEngine,
    depth: Depth,
    image: Option<PathBuf>,
    draft: Option<String>,
    last_response: Option<String>,
    show_thoughts: bool,
}

impl ChatSession {
    pub fn new(
        engine: QueryEngine,
        depth: Depth,
        draft: Option<String>,
        show_thoughts: bool,
    ) -> Self {
        Self {
            engine,
            depth,
            image: None,
            draft,
            last_response: None,
            show_thoughts,
        }
    }

    pub fn depth(&self) -> Depth {
        self.depth
    }

    pub fn image(&self) -> Option<&Path> {
        self.image.as_deref()
    }

    pub fn draft(&self) -> Option<&str> {
        self.draft.as_deref()
    }

    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }

    pub fn handle(&mut self, intent: &Intent, now_ms: u64) -> ChatReply {
        match intent.action.as_str() {
            "noop" => {
                let Some(text) = self.draft.clone() else {
                    return ChatReply::default();
                };
                let reply = self.submit(text, now_ms);
                // The draft stays until a submission of it succeeds.
                if self.last_response().is_some() {
                    self.draft = None;
                }
                reply
            }
            "submit" => {
                self.draft = None;
                let text = intent.prompt.clone().unwrap_or_default();
                self.submit(text, now_ms)
            }
            "set_depth" => match intent.arg("depth").map(str::parse::<Depth>) {
                Some(Ok(depth)) => {
                    self.depth = depth;
                    ChatReply::say(format!("Depth set to {depth}"))
                }
                Some(Err(err)) => ChatReply::say(err),
                None => ChatReply::say("/depth requires quick, balanced or deep"),
            },
            "attach_image" => match intent.arg("path").map(PathBuf::from) {
                Some(path) if path.is_file() => {
                    let reply = ChatReply::say(format!("Image set to {}", path.display()));
                    self.image = Some(path);
                    reply
                }
                Some(path) => ChatReply::say(format!("Image not found ({})", path.display())),
                None => ChatReply::say("/image requires a path"),
            },
            "clear_image" => {
                self.image = None;
                ChatReply::say("Image cleared")
            }
            "copy" => match self.last_response.clone() {
                Some(text) => ChatReply {
                    copy: Some(text),
                    ..ChatReply::default()
                },
                None => ChatReply::say("Nothing to copy yet"),
            },
            "back" => {
                self.last_response = None;
                let attached = self
                    .image()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "none".to_string());
                ChatReply::say(format!(
                    "Back to the query form (depth: {}, image: {attached})",
                    self.depth
                ))
            }
            "quick_query" => {
                let result = self.engine.quick_query();
                self.show(&result)
            }
            "help" => ChatReply::say(format!("Commands: {}", CHAT_HELP_COMMANDS.join(" "))),
            "quit" => ChatReply {
                quit: true,
                ..ChatReply::default()
            },
            _ => {
                let command = intent.arg("command").unwrap_or_default();
                ChatReply::say(format!(
                    "Unknown command /{command}. Type /help for commands."
                ))
            }
        }
    }

    fn submit(&mut self, query: String, now_ms: u64) -> ChatReply {
        let form = QueryForm {
            query,
            image: self.image.clone(),
            depth: self.depth,
        };
        let result = self.engine.submit(&form, now_ms);
        self.show(&result)
    }

    fn show(&mut self, result: &Result<QueryOutcome, QueryFailure>) -> ChatReply {
        match result {
            Ok(outcome) => {
                self.last_response = Some(outcome.text.clone());
                ChatReply::say(format_outcome(outcome, self.show_thoughts))
            }
            Err(_) => {
                self.last_response = None;
                ChatReply::say(display_text(result))
            }
        }
    }
}
