use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const QUICK_THINKING_BUDGET: u32 = 0;
pub const BALANCED_THINKING_BUDGET: u32 = 5426;
pub const DEEP_THINKING_BUDGET: u32 = 18240;
pub const SCREENSHOT_THINKING_BUDGET: u32 = 12640;

/// Provider-side reasoning configuration, sent as Gemini's `thinkingConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningOptions {
    pub thinking_budget: u32,
    pub include_thoughts: bool,
}

impl ReasoningOptions {
    /// Preset for the latest-screenshot quick query.
    pub fn screenshot() -> Self {
        Self {
            thinking_budget: SCREENSHOT_THINKING_BUDGET,
            include_thoughts: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    Quick,
    #[default]
    Balanced,
    Deep,
}

impl Depth {
    pub const ALL: [Depth; 3] = [Depth::Quick, Depth::Balanced, Depth::Deep];

    pub fn as_str(&self) -> &'static str {
        match self {
            Depth::Quick => "quick",
            Depth::Balanced => "balanced",
            Depth::Deep => "deep",
        }
    }

    pub fn reasoning(&self) -> ReasoningOptions {
        match self {
            Depth::Quick => ReasoningOptions {
                thinking_budget: QUICK_THINKING_BUDGET,
                include_thoughts: false,
            },
            Depth::Balanced => ReasoningOptions {
                thinking_budget: BALANCED_THINKING_BUDGET,
                include_thoughts: false,
            },
            Depth::Deep => ReasoningOptions {
                thinking_budget: DEEP_THINKING_BUDGET,
                include_thoughts: true,
            },
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Depth {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        Depth::ALL
            .into_iter()
            .find(|depth| depth.as_str() == normalized)
            .ok_or_else(|| format!("unknown depth '{raw}' (expected quick, balanced or deep)"))
    }
}

#[cfg(test)]
mod tests {
    use super::{Depth, ReasoningOptions};

    #[test]
    fn budgets_increase_with_depth() {
        let quick = Depth::Quick.reasoning();
        let balanced = Depth::Balanced.reasoning();
        let deep = Depth::Deep.reasoning();
        assert!(deep.thinking_budget > balanced.thinking_budget);
        assert!(balanced.thinking_budget > quick.thinking_budget);
    }

    #[test]
    fn only_deep_requests_thoughts() {
        let with_trace: Vec<Depth> = Depth::ALL
            .into_iter()
            .filter(|depth| depth.reasoning().include_thoughts)
            .collect();
        assert_eq!(with_trace, vec![Depth::Deep]);
    }

    #[test]
    fn depth_parses_case_insensitively_and_round_trips_names() {
        assert_eq!(" Deep ".parse::<Depth>(), Ok(Depth::Deep));
        for depth in Depth::ALL {
            assert_eq!(depth.to_string().parse::<Depth>(), Ok(depth));
        }
        assert!("extreme".parse::<Depth>().is_err());
        assert_eq!(Depth::default(), Depth::Balanced);
    }

    #[test]
    fn reasoning_serializes_as_thinking_config() -> anyhow::Result<()> {
        let value = serde_json::to_value(ReasoningOptions::screenshot())?;
        assert_eq!(
            value,
            serde_json::json!({"thinkingBudget": 12640, "includeThoughts": true})
        );
        Ok(())
    }
}
