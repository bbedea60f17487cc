use super::*;

impl TicketPriority {
    /// Reward for a clean first-try completion.
    pub const fn full_points(&self) -> u32 {
        match self {
            Self::High => 6,
            Self::Medium => 4,
            Self::Low => 2,
        }
    }

    /// Reward for a partial success (cleanup judged incomplete).
    pub const fn half_points(&self) -> u32 {
        self.full_points() / 2
    }
}

/// Points paid out for a single completion attempt.
///
/// A first failed attempt pays half up front; a later success on the same
/// ticket pays only the remaining half, so the total across attempts never
/// exceeds the full amount. Repeated failures pay nothing beyond the first
/// half.
pub const fn points_awarded(
    priority: TicketPriority,
    had_prior_failure: bool,
    success: bool,
) -> u32 {
    match (success, had_prior_failure) {
        (true, false) => priority.full_points(),
        (true, true) => priority.full_points() - priority.half_points(),
        (false, false) => priority.half_points(),
        (false, true) => 0,
    }
}

/// Black-box judgment of an after-photo: does it show the same location,
/// and was the cleanup successful?
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ComparisonResult {
    pub same_location: bool,
    pub cleanup_successful: bool,
}

impl ComparisonResult {
    pub const fn is_success(&self) -> bool {
        self.same_location && self.cleanup_successful
    }
}

// Older comparison endpoints answer with a bare boolean.
impl From<bool> for ComparisonResult {
    fn from(ok: bool) -> Self {
        Self {
            same_location: ok,
            cleanup_successful: ok,
        }
    }
}
