mod builder;
mod depth;
mod message;

pub use builder::{
    build_request, prefill_query, PreparedRequest, CLIPBOARD_PREFILL_MAX_CHARS, MARKDOWN_SUFFIX,
};
pub use depth::{
    Depth, ReasoningOptions, BALANCED_THINKING_BUDGET, DEEP_THINKING_BUDGET,
    QUICK_THINKING_BUDGET, SCREENSHOT_THINKING_BUDGET,
};
pub use message::{ContentPart, Message, Role};
