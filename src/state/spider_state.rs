//! Coordinator lifecycle states
//!
//! `Seeding -> Running -> Draining -> Completed`, with `Running -> Completed`
//! when the page budget or frontier ends the job before the deadline does.
use serde::Serialize;
use std::fmt;

/// Represents where a spider job is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpiderState {
    /// Seed URL is being admitted and robots.txt fetched
    Seeding,

    /// Batches are being drained and fetched
    Running,

    /// Overall deadline passed; in-flight fetches finish, nothing new starts
    Draining,

    /// Terminal: the summary is frozen
    Completed,
}

impl SpiderState {
    /// Returns true if this is the terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns true if new batches may still be drained
    pub fn accepts_work(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: SpiderState) -> bool {
        matches!(
            (self, next),
            (Self::Seeding, Self::Running)
                | (Self::Seeding, Self::Completed)
                | (Self::Running, Self::Draining)
                | (Self::Running, Self::Completed)
                | (Self::Draining, Self::Completed)
        )
    }

    /// String form used in logs and progress snapshots
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seeding => "seeding",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for SpiderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
