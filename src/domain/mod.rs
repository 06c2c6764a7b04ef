//! Domain records for the planner: events, songs, role assignments and
//! attendance rows.
//!
//! Persistence lives behind the [`PlannerStore`] trait in [`store`]; the
//! dialog engine only touches it in commit phases.

pub mod store;

pub use store::{InMemoryStore, NewEvent, PlannerStore, StoreError, StoreResult};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A planned event (service, rehearsal, ...) with its setlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub date: NaiveDate,
    /// Start time, 24h.
    pub time: NaiveTime,
    pub location: String,
    /// Song ids in setlist order.
    pub setlist: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

/// A song in the team's library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    pub title: String,
    pub artist: Option<String>,
    /// Musical key, e.g. "G" or "Bm".
    pub key: Option<String>,
    /// Chord chart, free-form multiline text.
    pub chords: Option<String>,
}

/// Editable song fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SongField {
    Title,
    Artist,
    Key,
}

impl SongField {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Artist => "artist",
            Self::Key => "key",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "title" => Some(Self::Title),
            "artist" => Some(Self::Artist),
            "key" => Some(Self::Key),
            _ => None,
        }
    }
}

/// Renamable event fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventField {
    Title,
    Location,
}

impl EventField {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Location => "location",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "title" => Some(Self::Title),
            "location" => Some(Self::Location),
            _ => None,
        }
    }
}

/// One member serving in one role at one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub event_id: i64,
    pub role: String,
    pub member_id: String,
}

/// Attendance answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpChoice {
    Yes,
    No,
    Maybe,
}

impl RsvpChoice {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Maybe => "maybe",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            "maybe" => Some(Self::Maybe),
            _ => None,
        }
    }
}

/// One member's attendance row for one event. At most one per (event, member);
/// answering again overwrites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rsvp {
    pub event_id: i64,
    pub member_id: String,
    pub choice: RsvpChoice,
    pub responded_at: DateTime<Utc>,
}
