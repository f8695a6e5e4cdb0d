pub const DEFAULT_MINIMUM_INTERVAL_MS: u64 = 5000;

/// Timestamp of the last accepted submission in one interactive session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitState {
    last_accepted_ms: Option<u64>,
}

impl RateLimitState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(last_accepted_ms: u64) -> Self {
        Self {
            last_accepted_ms: Some(last_accepted_ms),
        }
    }

    pub fn last_accepted_ms(&self) -> Option<u64> {
        self.last_accepted_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Accepted,
    Rejected { wait_ms: u64 },
}

/// Accepts when `now_ms - last >= minimum_interval_ms`; only acceptance moves the state.
pub fn try_acquire(
    state: &mut RateLimitState,
    now_ms: u64,
    minimum_interval_ms: u64,
) -> RateLimitDecision {
    if let Some(last) = state.last_accepted_ms {
        let ready_at = last.saturating_add(minimum_interval_ms);
        if now_ms < ready_at {
            return RateLimitDecision::Rejected {
                wait_ms: ready_at - now_ms,
            };
        }
    }
    state.last_accepted_ms = Some(now_ms);
    RateLimitDecision::Accepted
}

pub fn rate_limit_message(wait_ms: u64) -> String {
    let seconds = wait_ms.div_ceil(1000);
    format!(
        "Rate limit exceeded. Please wait {seconds} seconds before making another request."
    )
}
