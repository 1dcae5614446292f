//! Recurrence signal derived from the memory index at intake time

use serde::{Deserialize, Serialize};

use super::ComplaintId;

/// Answer to "has this location/issue recurred?", derived once at intake
/// and never re-derived afterwards.
///
/// Matches always reference complaints committed before this one started,
/// so two in-flight submissions can never match each other.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurrenceSignal {
    /// True when at least one prior complaint matched
    pub recurring: bool,
    /// Number of prior complaints matched
    pub match_count: u32,
    /// IDs of matched prior complaints, oldest first
    pub matched_ids: Vec<ComplaintId>,
}

impl RecurrenceSignal {
    /// Zero signal: nothing matched (also the empty-index answer).
    pub fn none() -> Self {
        Self {
            recurring: false,
            match_count: 0,
            matched_ids: Vec::new(),
        }
    }

    pub fn from_matches(matched_ids: Vec<ComplaintId>) -> Self {
        Self {
            recurring: !matched_ids.is_empty(),
            match_count: matched_ids.len() as u32,
            matched_ids,
        }
    }
}
