//! Dialog coordinator: one request/response cycle per inbound event.
//!
//! The coordinator is the only component that creates and destroys sessions;
//! step executors are the only code that mutates them. Processing for one
//! owner is serialized behind a per-owner mutex; different owners proceed in
//! parallel.

use super::classifier::{classify, NonDialogInput, Route};
use super::flows::{ChordEntryFlow, DialogFlow, EventWizardFlow, RenameEventFlow, SongEditFlow};
use super::graph::DialogKind;
use super::outbound::OutboundDirective;
use super::session::{OwnerId, SessionStore};
use crate::channel::InboundEvent;
use crate::commands;
use crate::config::PlannerConfig;
use crate::domain::{PlannerStore, RsvpChoice};
use crate::i18n::{MsgArg, MsgKey, MsgText};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct DialogCoordinator {
    sessions: SessionStore,
    /// Per-owner processing locks. Entries are retained for the process
    /// lifetime; the owner population is a bounded team roster.
    locks: DashMap<OwnerId, Arc<Mutex<()>>>,
    store: Arc<dyn PlannerStore>,
    wizard: EventWizardFlow,
    song_edit: SongEditFlow,
    chord_entry: ChordEntryFlow,
    rename: RenameEventFlow,
}

impl DialogCoordinator {
    pub fn new(store: Arc<dyn PlannerStore>, presets: PlannerConfig) -> Self {
        Self {
            sessions: SessionStore::new(),
            locks: DashMap::new(),
            wizard: EventWizardFlow::new(store.clone(), presets),
            song_edit: SongEditFlow::new(store.clone()),
            chord_entry: ChordEntryFlow::new(store.clone()),
            rename: RenameEventFlow::new(store.clone()),
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn PlannerStore> {
        &self.store
    }

    /// Whether the owner has a live session, and of what kind. Used by outer
    /// routing and applies lazy expiry like any other lookup.
    pub fn active_kind(&self, owner: &str) -> Option<DialogKind> {
        self.sessions.active_kind(owner)
    }

    /// Evict expired sessions opportunistically. Lookup-time expiry already
    /// guarantees correctness without this.
    pub fn purge_expired_sessions(&self) -> usize {
        self.sessions.purge_expired()
    }

    fn flow_for(&self, kind: DialogKind) -> &dyn DialogFlow {
        match kind {
            DialogKind::EventWizard => &self.wizard,
            DialogKind::SongEdit => &self.song_edit,
            DialogKind::ChordEntry => &self.chord_entry,
            DialogKind::RenameEvent => &self.rename,
        }
    }

    fn owner_lock(&self, owner: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(owner.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Handle one inbound event for its owner. The single entry point for
    /// both modalities.
    pub async fn handle(&self, event: &InboundEvent) -> Vec<OutboundDirective> {
        let lock = self.owner_lock(&event.owner);
        let _guard = lock.lock().await;

        let session = self.sessions.get(&event.owner);
        let route = classify(event, session.as_ref().map(|s| &s.state));

        tracing::debug!(
            event_id = %event.id,
            owner = %event.owner,
            kind = session.as_ref().map(|s| s.state.kind().as_str()).unwrap_or("-"),
            step = session.as_ref().map(|s| s.state.step_name()).unwrap_or("-"),
            "inbound event classified"
        );

        match route {
            Route::Cancel => {
                if session.is_some() {
                    self.sessions.clear(&event.owner);
                    tracing::info!(owner = %event.owner, "dialog cancelled");
                    vec![OutboundDirective::text(MsgKey::Cancelled)]
                } else {
                    vec![OutboundDirective::text(MsgKey::NothingToCancel)]
                }
            }
            Route::Dialog(input) => {
                let Some(mut session) = session else {
                    return vec![OutboundDirective::text(MsgKey::SessionExpired)];
                };
                let flow = self.flow_for(session.state.kind());
                match flow.apply(&mut session.state, input).await {
                    Ok(outcome) => {
                        if outcome.termination.is_some() {
                            self.sessions.clear(&event.owner);
                        } else {
                            self.sessions.save(session);
                        }
                        outcome.directives
                    }
                    Err(err) => {
                        // Engine bug: the stored session stays as it was (we
                        // mutated a copy), the user gets a neutral notice.
                        tracing::error!(owner = %event.owner, error = %err, "step executor failed");
                        vec![OutboundDirective::text(MsgKey::NotUnderstood)]
                    }
                }
            }
            Route::NonDialog(input) => self.handle_non_dialog(event, input).await,
            Route::Miss => match session {
                Some(session) => {
                    let flow = self.flow_for(session.state.kind());
                    vec![
                        OutboundDirective::text(MsgKey::NotUnderstood),
                        flow.prompt(&session.state).await,
                    ]
                }
                None => vec![OutboundDirective::text(MsgKey::NotUnderstood)],
            },
        }
    }

    async fn handle_non_dialog(
        &self,
        event: &InboundEvent,
        input: NonDialogInput,
    ) -> Vec<OutboundDirective> {
        match input {
            NonDialogInput::Command(text) => {
                commands::handle_command(self, &event.owner, &text).await
            }
            NonDialogInput::Rsvp { event_id, choice } => {
                match self.store.record_rsvp(event_id, &event.owner, choice).await {
                    Ok(()) => vec![OutboundDirective::text(MsgText::with_args(
                        MsgKey::RsvpRecorded,
                        vec![MsgArg::Key(rsvp_key(choice))],
                    ))],
                    Err(err) => {
                        tracing::debug!(event_id, error = %err, "rsvp for missing event");
                        vec![OutboundDirective::text(MsgKey::RsvpEventGone)]
                    }
                }
            }
            NonDialogInput::StaleDialogToken => {
                vec![OutboundDirective::text(MsgKey::SessionExpired)]
            }
            NonDialogInput::UnknownCallback => {
                vec![OutboundDirective::text(MsgKey::NotUnderstood)]
            }
        }
    }

    // ------------------------------------------------------------------
    // Dialog entry points. Called from command handling, which runs under
    // the owner's lock already; they must not re-acquire it.
    // ------------------------------------------------------------------

    /// Start the event wizard, replacing any prior session.
    pub async fn start_event_wizard(&self, owner: &str) -> Vec<OutboundDirective> {
        let state = EventWizardFlow::initial_state();
        let prompt = self.wizard.prompt(&state).await;
        self.sessions.set(owner, state);
        tracing::info!(owner, kind = DialogKind::EventWizard.as_str(), "dialog started");
        vec![prompt]
    }

    /// Start editing a song; refuses if the song does not exist.
    pub async fn start_song_edit(&self, owner: &str, song_id: i64) -> Vec<OutboundDirective> {
        let Some(song) = self.store.get_song(song_id).await else {
            return vec![OutboundDirective::text(MsgText::with_args(
                MsgKey::SongMissing,
                vec![MsgArg::text(song_id.to_string())],
            ))];
        };
        let state = SongEditFlow::initial_state(&song);
        let prompt = self.song_edit.prompt(&state).await;
        self.sessions.set(owner, state);
        tracing::info!(owner, kind = DialogKind::SongEdit.as_str(), song_id, "dialog started");
        vec![prompt]
    }

    /// Start chord-chart entry for a song.
    pub async fn start_chord_entry(&self, owner: &str, song_id: i64) -> Vec<OutboundDirective> {
        let Some(song) = self.store.get_song(song_id).await else {
            return vec![OutboundDirective::text(MsgText::with_args(
                MsgKey::SongMissing,
                vec![MsgArg::text(song_id.to_string())],
            ))];
        };
        let state = ChordEntryFlow::initial_state(&song);
        let prompt = self.chord_entry.prompt(&state).await;
        self.sessions.set(owner, state);
        tracing::info!(owner, kind = DialogKind::ChordEntry.as_str(), song_id, "dialog started");
        vec![prompt]
    }

    /// Start renaming an event.
    pub async fn start_rename(&self, owner: &str, event_id: i64) -> Vec<OutboundDirective> {
        let Some(target) = self.store.get_event(event_id).await else {
            return vec![OutboundDirective::text(MsgText::with_args(
                MsgKey::EventMissing,
                vec![MsgArg::text(event_id.to_string())],
            ))];
        };
        let state = RenameEventFlow::initial_state(&target);
        let prompt = self.rename.prompt(&state).await;
        self.sessions.set(owner, state);
        tracing::info!(owner, kind = DialogKind::RenameEvent.as_str(), event_id, "dialog started");
        vec![prompt]
    }
}

fn rsvp_key(choice: RsvpChoice) -> MsgKey {
    match choice {
        RsvpChoice::Yes => MsgKey::BtnYes,
        RsvpChoice::No => MsgKey::BtnNo,
        RsvpChoice::Maybe => MsgKey::BtnMaybe,
    }
}
