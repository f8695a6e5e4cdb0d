use std::collections::BTreeMap;

use serde_json::Value;

use super::command_registry::{
    CommandSpec, DEPTH_PRESET_COMMANDS, NO_ARG_COMMANDS, RAW_ARG_COMMANDS, SINGLE_PATH_COMMANDS,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub action: String,
    pub raw: String,
    pub prompt: Option<String>,
    pub command_args: BTreeMap<String, Value>,
}

impl Intent {
    fn new(action: &str, raw: &str) -> Self {
        Self {
            action: action.to_string(),
            raw: raw.to_string(),
            prompt: None,
            command_args: BTreeMap::new(),
        }
    }

    pub fn arg(&self, key: &str) -> Option<&str> {
        self.command_args
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<&'static str> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn parse_path_args(arg: &str) -> Vec<String> {
    if arg.trim().is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect(),
        Err(_) => arg
            .split_whitespace()
            .map(str::to_string)
            .filter(|value| !value.is_empty())
            .collect(),
    }
}

fn parse_single_path_arg(arg: &str) -> String {
    let parts = parse_path_args(arg);
    match parts.len() {
        0 => String::new(),
        1 => parts[0].clone(),
        _ => parts.join(" "),
    }
}

/// Turns one line of chat input into an intent. Plain text submits a query.
pub fn parse_intent(text: &str) -> Intent {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return Intent::new("noop", text);
    }

    if let Some(slash_tail) = raw_trimmed.strip_prefix('/') {
        let command_len = slash_tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            .count();
        if command_len > 0 {
            let command = slash_tail[..command_len].to_ascii_lowercase();
            let remainder = &slash_tail[command_len..];
            let arg = remainder.trim();

            if let Some(action) = find_action(&command, RAW_ARG_COMMANDS) {
                let mut intent = Intent::new(action, text);
                intent
                    .command_args
                    .insert("depth".to_string(), Value::String(arg.to_string()));
                return intent;
            }

            if DEPTH_PRESET_COMMANDS.iter().any(|value| *value == command) {
                let mut intent = Intent::new("set_depth", text);
                intent
                    .command_args
                    .insert("depth".to_string(), Value::String(command));
                return intent;
            }

            if let Some(action) = find_action(&command, SINGLE_PATH_COMMANDS) {
                let mut intent = Intent::new(action, text);
                intent.command_args.insert(
                    "path".to_string(),
                    Value::String(parse_single_path_arg(arg)),
                );
                return intent;
            }

            if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
                return Intent::new(action, text);
            }

            let mut intent = Intent::new("unknown", text);
            intent
                .command_args
                .insert("command".to_string(), Value::String(command));
            intent
                .command_args
                .insert("arg".to_string(), Value::String(arg.to_string()));
            return intent;
        }
    }

    let mut intent = Intent::new("submit", text);
    intent.prompt = Some(raw_trimmed.to_string());
    intent
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::parse_intent;

    #[test]
    fn plain_text_submits_trimmed_prompt() {
        let intent = parse_intent("  What is 2+2?  ");
        assert_eq!(intent.action, "submit");
        assert_eq!(intent.prompt.as_deref(), Some("What is 2+2?"));
    }

    #[test]
    fn blank_line_is_noop() {
        assert_eq!(parse_intent("   ").action, "noop");
        assert_eq!(parse_intent("").action, "noop");
    }

    #[test]
    fn depth_command_and_shortcuts() {
        let depth = parse_intent("/depth Deep");
        assert_eq!(depth.action, "set_depth");
        assert_eq!(depth.arg("depth"), Some("Deep"));

        for preset in ["quick", "balanced", "deep"] {
            let intent = parse_intent(&format!("/{preset}"));
            assert_eq!(intent.action, "set_depth");
            assert_eq!(intent.command_args["depth"], json!(preset));
        }
    }

    #[test]
    fn image_command_accepts_quoted_paths() {
        let intent = parse_intent("/image \"/tmp/Screen Shot 1.png\"");
        assert_eq!(intent.action, "attach_image");
        assert_eq!(intent.command_args["path"], json!("/tmp/Screen Shot 1.png"));

        let alias = parse_intent("/use a.png");
        assert_eq!(alias.action, "attach_image");
        assert_eq!(alias.arg("path"), Some("a.png"));

        let missing = parse_intent("/image");
        assert_eq!(missing.arg("path"), None);
    }

    #[test]
    fn no_arg_commands_map_to_actions() {
        assert_eq!(parse_intent("/clear_image").action, "clear_image");
        assert_eq!(parse_intent("/copy").action, "copy");
        assert_eq!(parse_intent("/back").action, "back");
        assert_eq!(parse_intent("/screenshot").action, "quick_query");
        assert_eq!(parse_intent("/HELP").action, "help");
        assert_eq!(parse_intent("/quit").action, "quit");
        assert_eq!(parse_intent("/exit").action, "quit");
    }

    #[test]
    fn unknown_command_keeps_name_and_argument() {
        let intent = parse_intent("/magic foo bar");
        assert_eq!(intent.action, "unknown");
        assert_eq!(intent.command_args["command"], json!("magic"));
        assert_eq!(intent.command_args["arg"], json!("foo bar"));
    }

    #[test]
    fn lone_slash_is_submitted_as_text() {
        let intent = parse_intent("/ what does this regex mean");
        assert_eq!(intent.action, "submit");
    }
}
