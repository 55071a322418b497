/// URL state definitions for the frontier ledger
///
/// Every URL the frontier knows about is in exactly one of these states.
use std::fmt;

/// Lifecycle of a URL inside the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlState {
    /// Queued and waiting for a worker
    Pending,

    /// Handed to a worker and not yet completed
    InFlight,

    /// Processed; terminal and deduplicating
    Complete,
}

impl UrlState {
    /// Returns true if the URL will never be handed out again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Converts the state to its ledger representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::Complete => "complete",
        }
    }

    /// Parses a state from its ledger representation
    ///
    /// Returns None if the string doesn't match any known state.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_flight" => Some(Self::InFlight),
            "complete" => Some(Self::Complete),
            _ => None,
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
