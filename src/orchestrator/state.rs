use std::fmt;

/// Lifecycle of one collection run.
///
/// `Done`, `Aborted` and `Failed` are terminal. `Failed` is only reachable
/// from `Authenticating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Idle,
    Authenticating,
    ListingFacilities,
    CollectingDetails,
    Aggregating,
    Done,
    Aborted,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Done | RunState::Aborted | RunState::Failed)
    }

    /// Whether the machine may move from `self` to `next`.
    pub fn can_transition_to(self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (from, _) if from.is_terminal() => false,
            (_, Aborted) => true,
            (Idle, Authenticating)
            | (Authenticating, ListingFacilities)
            | (Authenticating, Failed)
            | (ListingFacilities, CollectingDetails)
            | (ListingFacilities, Aggregating)
            | (CollectingDetails, Aggregating)
            | (Aggregating, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Authenticating => "authenticating",
            RunState::ListingFacilities => "listing facilities",
            RunState::CollectingDetails => "collecting details",
            RunState::Aggregating => "aggregating",
            RunState::Done => "done",
            RunState::Aborted => "aborted",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}
