//! Dialog sessions and the owner-keyed session store.
//!
//! At most one session exists per owner. Starting a new dialog silently
//! replaces any prior session; expiry is evaluated lazily at lookup time, so
//! correctness never depends on a sweep running.

use super::graph::{ChordStep, DialogKind, EditStep, Modality, WizardStep};
use crate::domain::{EventField, SongField};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use dashmap::DashMap;

/// Chat participant identifier (Telegram user id as a string).
pub type OwnerId = String;

/// Sessions older than this are expired.
pub const SESSION_TTL_SECS: i64 = 10 * 60;

/// Current step plus the explicit history stack used by "back".
///
/// Back restores exactly the step that was active before the current one was
/// entered; nothing else in the engine is allowed to guess a previous step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCursor<S> {
    current: S,
    history: Vec<S>,
}

impl<S: Copy + Eq> StepCursor<S> {
    pub fn new(start: S) -> Self {
        Self { current: start, history: Vec::new() }
    }

    pub fn current(&self) -> S {
        self.current
    }

    /// Move forward, remembering the step we leave.
    pub fn advance(&mut self, next: S) {
        self.history.push(self.current);
        self.current = next;
    }

    /// Rewind one step. Returns the restored step, or `None` at the start.
    pub fn back(&mut self) -> Option<S> {
        let prev = self.history.pop()?;
        self.current = prev;
        Some(prev)
    }

    /// Full restart: forget all history and jump to `start`.
    pub fn restart(&mut self, start: S) {
        self.history.clear();
        self.current = start;
    }
}

/// Accumulated answers of the event wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDraft {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub location: Option<String>,
    /// Selected song ids, in toggle order, deduplicated.
    pub setlist: Vec<i64>,
    /// The "custom" template button arms free-text title entry.
    pub awaiting_title: bool,
    /// The "custom" date button arms free-text date entry.
    pub awaiting_date: bool,
}

impl EventDraft {
    /// Idempotent toggle: a second press on the same id removes it again.
    pub fn toggle_song(&mut self, song_id: i64) {
        if let Some(pos) = self.setlist.iter().position(|id| *id == song_id) {
            self.setlist.remove(pos);
        } else {
            self.setlist.push(song_id);
        }
    }
}

/// Accumulated answers of the song-edit dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongEditDraft {
    pub song_id: i64,
    /// Title captured at dialog start, used in prompts.
    pub song_title: String,
    pub field: Option<SongField>,
    pub value: Option<String>,
}

/// Accumulated answers of the chord-entry dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordDraft {
    pub song_id: i64,
    pub song_title: String,
    pub chart: Option<String>,
}

/// Accumulated answers of the event-rename dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameDraft {
    pub event_id: i64,
    pub event_title: String,
    pub field: Option<EventField>,
    pub value: Option<String>,
}

/// Per-kind dialog state: step cursor plus the kind's own draft shape.
///
/// The payload shape is fixed by the variant, so a session can never be
/// reinterpreted under a different dialog kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogState {
    EventWizard { cursor: StepCursor<WizardStep>, draft: EventDraft },
    SongEdit { cursor: StepCursor<EditStep>, draft: SongEditDraft },
    ChordEntry { cursor: StepCursor<ChordStep>, draft: ChordDraft },
    RenameEvent { cursor: StepCursor<EditStep>, draft: RenameDraft },
}

impl DialogState {
    pub fn kind(&self) -> DialogKind {
        match self {
            Self::EventWizard { .. } => DialogKind::EventWizard,
            Self::SongEdit { .. } => DialogKind::SongEdit,
            Self::ChordEntry { .. } => DialogKind::ChordEntry,
            Self::RenameEvent { .. } => DialogKind::RenameEvent,
        }
    }

    /// Accepted input modality of the current step.
    pub fn modality(&self) -> Modality {
        match self {
            Self::EventWizard { cursor, .. } => cursor.current().spec().modality,
            Self::SongEdit { cursor, .. } | Self::RenameEvent { cursor, .. } => {
                cursor.current().spec().modality
            }
            Self::ChordEntry { cursor, .. } => cursor.current().spec().modality,
        }
    }

    /// Whether "back" is valid from the current step.
    pub fn allows_back(&self) -> bool {
        match self {
            Self::EventWizard { cursor, .. } => cursor.current().spec().allows_back,
            Self::SongEdit { cursor, .. } | Self::RenameEvent { cursor, .. } => {
                cursor.current().spec().allows_back
            }
            Self::ChordEntry { cursor, .. } => cursor.current().spec().allows_back,
        }
    }

    /// Step name for log fields.
    pub fn step_name(&self) -> &'static str {
        match self {
            Self::EventWizard { cursor, .. } => cursor.current().as_str(),
            Self::SongEdit { cursor, .. } | Self::RenameEvent { cursor, .. } => {
                cursor.current().as_str()
            }
            Self::ChordEntry { cursor, .. } => cursor.current().as_str(),
        }
    }
}

/// One in-progress dialog for one owner.
#[derive(Debug, Clone)]
pub struct Session {
    pub owner: OwnerId,
    pub state: DialogState,
    pub created_at: DateTime<Utc>,
}

impl Session {
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        (now - self.created_at).num_seconds() > SESSION_TTL_SECS
    }
}

/// Owner-keyed session store with lazy expiry.
///
/// Backed by a concurrent map; per-owner operations need no cross-owner
/// locking. All operations are total: there is no not-found error, only
/// `None`.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<OwnerId, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace the owner's session, stamping `created_at` to now.
    /// Any previous session for the owner is discarded.
    pub fn set(&self, owner: &str, state: DialogState) {
        self.sessions.insert(
            owner.to_string(),
            Session {
                owner: owner.to_string(),
                state,
                created_at: Utc::now(),
            },
        );
    }

    /// Fetch the live session. An expired entry is evicted and reported as
    /// absent.
    pub fn get(&self, owner: &str) -> Option<Session> {
        let now = Utc::now();
        let expired = match self.sessions.get(owner) {
            Some(entry) => entry.value().is_expired_at(now),
            None => return None,
        };
        if expired {
            self.sessions.remove(owner);
            return None;
        }
        self.sessions.get(owner).map(|entry| entry.value().clone())
    }

    /// Write back a mutated session, preserving its `created_at`.
    pub fn save(&self, session: Session) {
        self.sessions.insert(session.owner.clone(), session);
    }

    /// Remove the owner's session; no-op if none exists.
    pub fn clear(&self, owner: &str) {
        self.sessions.remove(owner);
    }

    /// Dialog kind of the owner's live session, if any. Applies lazy expiry.
    pub fn active_kind(&self, owner: &str) -> Option<DialogKind> {
        self.get(owner).map(|s| s.state.kind())
    }

    /// Opportunistic sweep; `get` already evicts lazily, so nothing depends
    /// on this being called.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired_at(now));
        before - self.sessions.len()
    }

    #[cfg(test)]
    fn backdate(&self, owner: &str, secs: i64) {
        if let Some(mut entry) = self.sessions.get_mut(owner) {
            entry.created_at -= chrono::Duration::seconds(secs);
        }
    }
}

/// Fresh wizard state at the first step.
pub fn new_wizard_state() -> DialogState {
    DialogState::EventWizard {
        cursor: StepCursor::new(WizardStep::Template),
        draft: EventDraft::default(),
    }
}
