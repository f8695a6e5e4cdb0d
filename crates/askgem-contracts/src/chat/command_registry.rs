#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

pub(crate) const RAW_ARG_COMMANDS: &[CommandSpec] = &[CommandSpec {
    command: "depth",
    action: "set_depth",
}];

pub(crate) const DEPTH_PRESET_COMMANDS: &[&str] = &["quick", "balanced", "deep"];

pub(crate) const SINGLE_PATH_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "image",
        action: "attach_image",
    },
    CommandSpec {
        command: "use",
        action: "attach_image",
    },
];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "clear_image",
        action: "clear_image",
    },
    CommandSpec {
        command: "copy",
        action: "copy",
    },
    CommandSpec {
        command: "back",
        action: "back",
    },
    CommandSpec {
        command: "screenshot",
        action: "quick_query",
    },
    CommandSpec {
        command: "help",
        action: "help",
    },
    CommandSpec {
        command: "quit",
        action: "quit",
    },
    CommandSpec {
        command: "exit",
        action: "quit",
    },
];

pub const CHAT_HELP_COMMANDS: &[&str] = &[
    "/depth",
    "/quick",
    "/balanced",
    "/deep",
    "/image",
    "/clear_image",
    "/copy",
    "/back",
    "/screenshot",
    "/help",
    "/quit",
];
