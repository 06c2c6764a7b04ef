//! Planner persistence trait and the in-memory implementation.
//!
//! The dialog engine consumes [`PlannerStore`] only at commit time; everything
//! before the terminal step accumulates in session payloads. Swapping in a
//! database-backed store is a matter of implementing this trait.

use super::{Event, EventField, RoleAssignment, Rsvp, RsvpChoice, Song, SongField};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store error type. Commit-phase failures surface to the user and leave the
/// session in place for a retry.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("song {0} not found")]
    SongNotFound(i64),

    #[error("event {0} not found")]
    EventNotFound(i64),

    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Fields collected by the event wizard, handed to the store at commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    /// Song ids in setlist order.
    pub setlist: Vec<i64>,
}

/// Persistence operations used by the bot.
#[async_trait]
pub trait PlannerStore: Send + Sync {
    // Songs
    async fn list_songs(&self) -> Vec<Song>;
    async fn get_song(&self, id: i64) -> Option<Song>;
    async fn add_song(&self, title: &str) -> Song;
    async fn update_song_field(&self, id: i64, field: SongField, value: &str) -> StoreResult<()>;
    async fn set_chords(&self, id: i64, chart: &str) -> StoreResult<()>;
    async fn remove_song(&self, id: i64) -> StoreResult<()>;

    // Events
    async fn create_event(&self, draft: NewEvent) -> StoreResult<Event>;
    async fn list_events(&self) -> Vec<Event>;
    async fn get_event(&self, id: i64) -> Option<Event>;
    async fn rename_event_field(&self, id: i64, field: EventField, value: &str) -> StoreResult<()>;

    // Roles
    async fn assign_role(&self, event_id: i64, role: &str, member_id: &str) -> StoreResult<()>;
    async fn roles_for_event(&self, event_id: i64) -> Vec<RoleAssignment>;

    // Attendance
    async fn record_rsvp(&self, event_id: i64, member_id: &str, choice: RsvpChoice) -> StoreResult<()>;
    async fn rsvps_for_event(&self, event_id: i64) -> Vec<Rsvp>;
}

/// In-memory store. Keyed by id with concurrent maps; id counters are atomic.
#[derive(Default)]
pub struct InMemoryStore {
    songs: DashMap<i64, Song>,
    events: DashMap<i64, Event>,
    roles: DashMap<i64, Vec<RoleAssignment>>,
    /// Keyed by (event id, member id) so re-answering overwrites.
    rsvps: DashMap<(i64, String), Rsvp>,
    next_song_id: AtomicI64,
    next_event_id: AtomicI64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            next_song_id: AtomicI64::new(1),
            next_event_id: AtomicI64::new(1),
            ..Self::default()
        }
    }
}

#[async_trait]
impl PlannerStore for InMemoryStore {
    async fn list_songs(&self) -> Vec<Song> {
        let mut songs: Vec<Song> = self.songs.iter().map(|e| e.value().clone()).collect();
        songs.sort_by_key(|s| s.id);
        songs
    }

    async fn get_song(&self, id: i64) -> Option<Song> {
        self.songs.get(&id).map(|e| e.value().clone())
    }

    async fn add_song(&self, title: &str) -> Song {
        let id = self.next_song_id.fetch_add(1, Ordering::Relaxed);
        let song = Song {
            id,
            title: title.trim().to_string(),
            artist: None,
            key: None,
            chords: None,
        };
        self.songs.insert(id, song.clone());
        song
    }

    async fn update_song_field(&self, id: i64, field: SongField, value: &str) -> StoreResult<()> {
        let mut entry = self.songs.get_mut(&id).ok_or(StoreError::SongNotFound(id))?;
        let value = value.trim();
        match field {
            SongField::Title => entry.title = value.to_string(),
            SongField::Artist => entry.artist = Some(value.to_string()),
            SongField::Key => entry.key = Some(value.to_string()),
        }
        Ok(())
    }

    async fn set_chords(&self, id: i64, chart: &str) -> StoreResult<()> {
        let mut entry = self.songs.get_mut(&id).ok_or(StoreError::SongNotFound(id))?;
        entry.chords = Some(chart.to_string());
        Ok(())
    }

    async fn remove_song(&self, id: i64) -> StoreResult<()> {
        self.songs
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::SongNotFound(id))
    }

    async fn create_event(&self, draft: NewEvent) -> StoreResult<Event> {
        if draft.title.trim().is_empty() {
            return Err(StoreError::InvalidEvent("empty title".into()));
        }

        // Setlist rows must reference live songs at commit time.
        for song_id in &draft.setlist {
            if !self.songs.contains_key(song_id) {
                return Err(StoreError::SongNotFound(*song_id));
            }
        }

        let id = self.next_event_id.fetch_add(1, Ordering::Relaxed);
        let event = Event {
            id,
            title: draft.title.trim().to_string(),
            date: draft.date,
            time: draft.time,
            location: draft.location,
            setlist: draft.setlist,
            created_at: Utc::now(),
        };
        self.events.insert(id, event.clone());
        Ok(event)
    }

    async fn list_events(&self) -> Vec<Event> {
        let mut events: Vec<Event> = self.events.iter().map(|e| e.value().clone()).collect();
        events.sort_by_key(|e| (e.date, e.time, e.id));
        events
    }

    async fn get_event(&self, id: i64) -> Option<Event> {
        self.events.get(&id).map(|e| e.value().clone())
    }

    async fn rename_event_field(&self, id: i64, field: EventField, value: &str) -> StoreResult<()> {
        let mut entry = self.events.get_mut(&id).ok_or(StoreError::EventNotFound(id))?;
        let value = value.trim();
        if value.is_empty() {
            return Err(StoreError::InvalidEvent("empty value".into()));
        }
        match field {
            EventField::Title => entry.title = value.to_string(),
            EventField::Location => entry.location = value.to_string(),
        }
        Ok(())
    }

    async fn assign_role(&self, event_id: i64, role: &str, member_id: &str) -> StoreResult<()> {
        if !self.events.contains_key(&event_id) {
            return Err(StoreError::EventNotFound(event_id));
        }
        let mut slots = self.roles.entry(event_id).or_default();
        // One member per role per event; re-assigning replaces.
        slots.retain(|a| a.role != role);
        slots.push(RoleAssignment {
            event_id,
            role: role.to_string(),
            member_id: member_id.to_string(),
        });
        Ok(())
    }

    async fn roles_for_event(&self, event_id: i64) -> Vec<RoleAssignment> {
        self.roles
            .get(&event_id)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    async fn record_rsvp(&self, event_id: i64, member_id: &str, choice: RsvpChoice) -> StoreResult<()> {
        if !self.events.contains_key(&event_id) {
            return Err(StoreError::EventNotFound(event_id));
        }
        self.rsvps.insert(
            (event_id, member_id.to_string()),
            Rsvp {
                event_id,
                member_id: member_id.to_string(),
                choice,
                responded_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn rsvps_for_event(&self, event_id: i64) -> Vec<Rsvp> {
        let mut rows: Vec<Rsvp> = self
            .rsvps
            .iter()
            .filter(|e| e.key().0 == event_id)
            .map(|e| e.value().clone())
            .collect();
        rows.sort_by(|a, b| a.member_id.cmp(&b.member_id));
        rows
    }
}
