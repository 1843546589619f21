//! # Vote State Machine
//!
//! At most one vote exists per (voter, thread). A new vote moves the thread
//! aggregate by its voice, a repeat is a no-op and a flip moves it by twice
//! the new voice. Adapters decide the transition against the row they hold
//! under the store's uniqueness guarantee, never against a stale read.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// The signed unit value of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Voice {
    Up,
    Down,
}

impl Voice {
    pub fn value(self) -> i32 {
        match self {
            Voice::Up => 1,
            Voice::Down => -1,
        }
    }
}

impl TryFrom<i32> for Voice {
    type Error = AppError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            1 => Ok(Voice::Up),
            -1 => Ok(Voice::Down),
            other => Err(AppError::ValidationError(format!(
                "voice must be 1 or -1, got {other}"
            ))),
        }
    }
}

impl From<Voice> for i32 {
    fn from(voice: Voice) -> Self {
        voice.value()
    }
}

/// What a vote does to the stored row and to the thread aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTransition {
    /// First vote of this voter on this thread
    Cast(Voice),
    /// Same voice as before
    Unchanged,
    /// Opposite voice, row updated in place
    Flipped(Voice),
}

impl VoteTransition {
    pub fn decide(prior: Option<Voice>, next: Voice) -> Self {
        match prior {
            None => VoteTransition::Cast(next),
            Some(prior) if prior == next => VoteTransition::Unchanged,
            Some(_) => VoteTransition::Flipped(next),
        }
    }

    /// Change to apply to the thread's aggregate.
    pub fn delta(self) -> i32 {
        match self {
            VoteTransition::Cast(voice) => voice.value(),
            VoteTransition::Unchanged => 0,
            VoteTransition::Flipped(voice) => 2 * voice.value(),
        }
    }

    /// Label used for metrics and logs.
    pub fn label(self) -> &'static str {
        match self {
            VoteTransition::Cast(_) => "cast",
            VoteTransition::Unchanged => "unchanged",
            VoteTransition::Flipped(_) => "flipped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_accepts_only_unit_values() {
        assert_eq!(Voice::try_from(1), Ok(Voice::Up));
        assert_eq!(Voice::try_from(-1), Ok(Voice::Down));
        assert!(matches!(Voice::try_from(0), Err(AppError::ValidationError(_))));
        assert!(matches!(Voice::try_from(2), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn voice_deserializes_from_integer() {
        let voice: Voice = serde_json::from_str("-1").unwrap();
        assert_eq!(voice, Voice::Down);
        assert!(serde_json::from_str::<Voice>("5").is_err());
    }

    #[test]
    fn repeat_then_flip_sequence() {
        // aggregate 5: +1 → 6, +1 again → 6, -1 → 4
        let mut aggregate = 5;
        let mut prior = None;
        for (voice, expected) in [(Voice::Up, 6), (Voice::Up, 6), (Voice::Down, 4)] {
            aggregate += VoteTransition::decide(prior, voice).delta();
            prior = Some(voice);
            assert_eq!(aggregate, expected);
        }
    }

    #[test]
    fn transitions_cover_every_prior_state() {
        assert_eq!(VoteTransition::decide(None, Voice::Down), VoteTransition::Cast(Voice::Down));
        assert_eq!(VoteTransition::decide(Some(Voice::Down), Voice::Down), VoteTransition::Unchanged);
        assert_eq!(
            VoteTransition::decide(Some(Voice::Down), Voice::Up),
            VoteTransition::Flipped(Voice::Up)
        );
        assert_eq!(VoteTransition::Flipped(Voice::Down).delta(), -2);
    }
}
