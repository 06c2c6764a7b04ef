//! End-to-end dialog engine tests: full wizard runs, cancellation, expiry
//! behavior, back navigation and commit failure recovery.

use async_trait::async_trait;
use ensemble_bot::channel::InboundEvent;
use ensemble_bot::config::PlannerConfig;
use ensemble_bot::dialog::classifier::DialogInput;
use ensemble_bot::dialog::flows::{DialogFlow, EventWizardFlow};
use ensemble_bot::dialog::{ActionToken, DialogCoordinator, DialogKind, NavAction, OutboundDirective};
use ensemble_bot::domain::{
    Event, EventField, InMemoryStore, NewEvent, PlannerStore, RoleAssignment, Rsvp, RsvpChoice,
    Song, SongField, StoreError, StoreResult,
};
use ensemble_bot::i18n::{MsgArg, MsgKey};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

async fn seed_songs(store: &Arc<InMemoryStore>, count: usize) {
    for i in 0..count {
        store.add_song(&format!("Song {}", i + 1)).await;
    }
}

async fn text(coord: &DialogCoordinator, owner: &str, text: &str) -> Vec<OutboundDirective> {
    coord.handle(&InboundEvent::text(owner, text)).await
}

async fn press(coord: &DialogCoordinator, owner: &str, data: &str) -> Vec<OutboundDirective> {
    coord.handle(&InboundEvent::callback(owner, data)).await
}

fn keys(directives: &[OutboundDirective]) -> Vec<MsgKey> {
    directives.iter().map(|d| d.text.key).collect()
}

/// Walk the wizard up to the confirm step: sunday template, 25/01/2025,
/// 10:30, first preset location, toggle songs 3 and 7.
async fn walk_to_confirm(coord: &DialogCoordinator, owner: &str) {
    text(coord, owner, "/newevent").await;
    press(coord, owner, "ev:tpl:sunday").await;
    press(coord, owner, "ev:date:2025-01-25").await;
    press(coord, owner, "ev:time:10:30").await;
    press(coord, owner, "ev:loc:0").await;
    press(coord, owner, "song:tog:3").await;
    press(coord, owner, "song:tog:7").await;
    press(coord, owner, "song:done").await;
}

#[tokio::test]
async fn sunday_wizard_commits_exactly_one_event() {
    let store = Arc::new(InMemoryStore::new());
    seed_songs(&store, 7).await;
    let coord = DialogCoordinator::new(store.clone(), PlannerConfig::default());

    text(&coord, "ana", "/newevent").await;
    assert_eq!(coord.active_kind("ana"), Some(DialogKind::EventWizard));

    press(&coord, "ana", "ev:tpl:sunday").await;
    press(&coord, "ana", "ev:date:2025-01-25").await;
    press(&coord, "ana", "ev:time:10:30").await;
    press(&coord, "ana", "ev:loc:0").await;
    press(&coord, "ana", "song:tog:3").await;
    press(&coord, "ana", "song:tog:7").await;

    // Nothing may be committed before the confirm step
    assert!(store.list_events().await.is_empty());

    let summary = press(&coord, "ana", "song:done").await;
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].text.key, MsgKey::WizardSummary);
    assert_eq!(
        summary[0].text.args,
        vec![
            MsgArg::text("Serviciu"),
            MsgArg::text("25/01/2025"),
            MsgArg::text("10:30"),
            MsgArg::text("Main Hall"),
            MsgArg::text("2"),
        ]
    );

    let committed = press(&coord, "ana", "fin:ok").await;
    assert_eq!(keys(&committed)[0], MsgKey::WizardCommitted);

    let events = store.list_events().await;
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.title, "Serviciu");
    assert_eq!(event.date.format("%d/%m/%Y").to_string(), "25/01/2025");
    assert_eq!(event.time.format("%H:%M").to_string(), "10:30");
    assert_eq!(event.location, "Main Hall");
    // Setlist rows in toggle order
    assert_eq!(event.setlist, vec![3, 7]);

    // Session is gone after commit
    assert_eq!(coord.active_kind("ana"), None);
}

#[tokio::test]
async fn toggle_twice_is_idempotent() {
    let store = Arc::new(InMemoryStore::new());
    seed_songs(&store, 7).await;
    let coord = DialogCoordinator::new(store.clone(), PlannerConfig::default());

    text(&coord, "ana", "/newevent").await;
    press(&coord, "ana", "ev:tpl:sunday").await;
    press(&coord, "ana", "ev:date:2025-01-25").await;
    press(&coord, "ana", "ev:time:10:30").await;
    press(&coord, "ana", "ev:loc:0").await;
    press(&coord, "ana", "song:tog:3").await;
    press(&coord, "ana", "song:tog:3").await;
    press(&coord, "ana", "song:done").await;

    let summary = press(&coord, "ana", "fin:ok").await;
    assert_eq!(keys(&summary)[0], MsgKey::WizardCommitted);
    assert_eq!(store.list_events().await[0].setlist, Vec::<i64>::new());
}

#[tokio::test]
async fn cancel_clears_session_and_stale_tokens_miss() {
    let store = Arc::new(InMemoryStore::new());
    seed_songs(&store, 3).await;
    let coord = DialogCoordinator::new(store.clone(), PlannerConfig::default());

    text(&coord, "ana", "/newevent").await;
    press(&coord, "ana", "ev:tpl:sunday").await;
    press(&coord, "ana", "ev:date:2025-01-25").await;
    // Mid-wizard at the time step
    let ack = text(&coord, "ana", "/cancel").await;
    assert_eq!(keys(&ack), vec![MsgKey::Cancelled]);
    assert_eq!(coord.active_kind("ana"), None);

    // A later callback referencing the dead wizard's tokens is a routing
    // miss with an explicit restart instruction, not applied state.
    let stale = press(&coord, "ana", "ev:time:10:30").await;
    assert_eq!(keys(&stale), vec![MsgKey::SessionExpired]);
    assert!(store.list_events().await.is_empty());
}

#[tokio::test]
async fn cancel_with_no_session_is_acknowledged() {
    let store = Arc::new(InMemoryStore::new());
    let coord = DialogCoordinator::new(store, PlannerConfig::default());

    let ack = text(&coord, "ana", "/cancel").await;
    assert_eq!(keys(&ack), vec![MsgKey::NothingToCancel]);
}

#[tokio::test]
async fn invalid_custom_date_stays_on_date_entry() {
    let store = Arc::new(InMemoryStore::new());
    let coord = DialogCoordinator::new(store, PlannerConfig::default());

    text(&coord, "ana", "/newevent").await;
    press(&coord, "ana", "ev:tpl:sunday").await;
    press(&coord, "ana", "ev:date:custom").await;

    // 31/02/2025 does not exist in the calendar
    let rejected = text(&coord, "ana", "31/02/2025").await;
    assert_eq!(
        keys(&rejected),
        vec![MsgKey::WizardInvalidDate, MsgKey::WizardDatePrompt]
    );
    assert_eq!(coord.active_kind("ana"), Some(DialogKind::EventWizard));

    // A valid date still moves forward afterwards
    let accepted = text(&coord, "ana", "14/02/2025").await;
    assert_eq!(keys(&accepted), vec![MsgKey::WizardTime]);
}

#[tokio::test]
async fn typed_date_requires_the_custom_button_first() {
    let store = Arc::new(InMemoryStore::new());
    let coord = DialogCoordinator::new(store, PlannerConfig::default());

    text(&coord, "ana", "/newevent").await;
    press(&coord, "ana", "ev:tpl:sunday").await;

    // Typing a date before arming custom entry re-shows the date keyboard
    let rejected = text(&coord, "ana", "14/02/2025").await;
    assert_eq!(keys(&rejected), vec![MsgKey::NotUnderstood, MsgKey::WizardDate]);

    press(&coord, "ana", "ev:date:custom").await;
    let accepted = text(&coord, "ana", "14/02/2025").await;
    assert_eq!(keys(&accepted), vec![MsgKey::WizardTime]);
}

#[tokio::test]
async fn starting_a_second_dialog_replaces_the_first() {
    let store = Arc::new(InMemoryStore::new());
    let song = store.add_song("Oceans").await;
    let coord = DialogCoordinator::new(store, PlannerConfig::default());

    text(&coord, "ana", "/newevent").await;
    assert_eq!(coord.active_kind("ana"), Some(DialogKind::EventWizard));

    text(&coord, "ana", &format!("/song {}", song.id)).await;
    assert_eq!(coord.active_kind("ana"), Some(DialogKind::SongEdit));
}

#[tokio::test]
async fn toggling_a_deleted_song_is_a_noop_with_notice() {
    let store = Arc::new(InMemoryStore::new());
    seed_songs(&store, 3).await;
    let coord = DialogCoordinator::new(store.clone(), PlannerConfig::default());

    text(&coord, "ana", "/newevent").await;
    press(&coord, "ana", "ev:tpl:sunday").await;
    press(&coord, "ana", "ev:date:2025-01-25").await;
    press(&coord, "ana", "ev:time:10:30").await;
    press(&coord, "ana", "ev:loc:0").await;
    press(&coord, "ana", "song:tog:1").await;

    // Song 2 disappears between keyboard render and click
    store.remove_song(2).await.unwrap();
    let out = press(&coord, "ana", "song:tog:2").await;
    assert_eq!(keys(&out), vec![MsgKey::WizardSongGone, MsgKey::WizardSongs]);

    press(&coord, "ana", "song:done").await;
    press(&coord, "ana", "fin:ok").await;
    assert_eq!(store.list_events().await[0].setlist, vec![1]);
}

#[tokio::test]
async fn free_text_adds_song_mid_wizard() {
    let store = Arc::new(InMemoryStore::new());
    let coord = DialogCoordinator::new(store.clone(), PlannerConfig::default());

    text(&coord, "ana", "/newevent").await;
    press(&coord, "ana", "ev:tpl:rehearsal").await;
    press(&coord, "ana", "ev:date:2025-01-25").await;
    press(&coord, "ana", "ev:time:18:00").await;
    press(&coord, "ana", "ev:loc:0").await;

    let out = text(&coord, "ana", "Way Maker").await;
    assert_eq!(keys(&out), vec![MsgKey::WizardSongAdded, MsgKey::WizardSongs]);

    press(&coord, "ana", "song:done").await;
    press(&coord, "ana", "fin:ok").await;

    let events = store.list_events().await;
    assert_eq!(events[0].title, "Repetiție");
    assert_eq!(events[0].setlist.len(), 1);
    let song = store.get_song(events[0].setlist[0]).await.unwrap();
    assert_eq!(song.title, "Way Maker");
}

#[tokio::test]
async fn confirm_edit_restarts_data_collection() {
    let store = Arc::new(InMemoryStore::new());
    seed_songs(&store, 7).await;
    let coord = DialogCoordinator::new(store.clone(), PlannerConfig::default());

    walk_to_confirm(&coord, "ana").await;
    let out = press(&coord, "ana", "fin:edit").await;
    // Full restart of data collection, not a partial back
    assert_eq!(keys(&out), vec![MsgKey::WizardTemplate]);

    // Walking forward again shows a summary built from scratch
    press(&coord, "ana", "ev:tpl:youth").await;
    press(&coord, "ana", "ev:date:2025-02-01").await;
    press(&coord, "ana", "ev:time:18:00").await;
    press(&coord, "ana", "ev:loc:0").await;
    let summary = press(&coord, "ana", "song:done").await;
    assert_eq!(
        summary[0].text.args[0],
        MsgArg::text("Seară de tineret")
    );
    assert_eq!(summary[0].text.args[4], MsgArg::text("0"));
}

#[tokio::test]
async fn owners_do_not_share_sessions() {
    let store = Arc::new(InMemoryStore::new());
    let coord = DialogCoordinator::new(store, PlannerConfig::default());

    text(&coord, "ana", "/newevent").await;
    assert_eq!(coord.active_kind("ana"), Some(DialogKind::EventWizard));
    assert_eq!(coord.active_kind("bogdan"), None);

    // Bogdan's cancel does not touch Ana's wizard
    text(&coord, "bogdan", "/cancel").await;
    assert_eq!(coord.active_kind("ana"), Some(DialogKind::EventWizard));
}

#[tokio::test]
async fn song_edit_flow_end_to_end() {
    let store = Arc::new(InMemoryStore::new());
    let song = store.add_song("Oceans").await;
    let coord = DialogCoordinator::new(store.clone(), PlannerConfig::default());

    text(&coord, "ana", &format!("/song {}", song.id)).await;
    press(&coord, "ana", "fld:song:artist").await;
    text(&coord, "ana", "Hillsong United").await;
    let out = press(&coord, "ana", "fin:ok").await;
    assert_eq!(keys(&out), vec![MsgKey::EditSaved]);

    assert_eq!(
        store.get_song(song.id).await.unwrap().artist.as_deref(),
        Some("Hillsong United")
    );
    assert_eq!(coord.active_kind("ana"), None);
}

#[tokio::test]
async fn chord_entry_keeps_line_breaks() {
    let store = Arc::new(InMemoryStore::new());
    let song = store.add_song("Oceans").await;
    let coord = DialogCoordinator::new(store.clone(), PlannerConfig::default());

    text(&coord, "ana", &format!("/chords {}", song.id)).await;
    text(&coord, "ana", "Verse: Bm  A/C#  D\nChorus: G  D  A").await;
    press(&coord, "ana", "fin:ok").await;

    assert_eq!(
        store.get_song(song.id).await.unwrap().chords.as_deref(),
        Some("Verse: Bm  A/C#  D\nChorus: G  D  A")
    );
}

#[tokio::test]
async fn rename_flow_updates_event() {
    let store = Arc::new(InMemoryStore::new());
    let event = store
        .create_event(NewEvent {
            title: "Serviciu".into(),
            date: chrono::NaiveDate::from_ymd_opt(2025, 1, 25).unwrap(),
            time: chrono::NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            location: "Main Hall".into(),
            setlist: vec![],
        })
        .await
        .unwrap();
    let coord = DialogCoordinator::new(store.clone(), PlannerConfig::default());

    text(&coord, "ana", &format!("/rename {}", event.id)).await;
    press(&coord, "ana", "fld:event:location").await;
    text(&coord, "ana", "Youth Room").await;
    press(&coord, "ana", "fin:ok").await;

    assert_eq!(store.get_event(event.id).await.unwrap().location, "Youth Room");
}

#[tokio::test]
async fn rsvp_after_commit_records_attendance() {
    let store = Arc::new(InMemoryStore::new());
    seed_songs(&store, 7).await;
    let coord = DialogCoordinator::new(store.clone(), PlannerConfig::default());

    walk_to_confirm(&coord, "ana").await;
    press(&coord, "ana", "fin:ok").await;
    let event_id = store.list_events().await[0].id;

    let out = press(&coord, "bogdan", &format!("rsvp:{event_id}:yes")).await;
    assert_eq!(keys(&out), vec![MsgKey::RsvpRecorded]);

    let rows = store.rsvps_for_event(event_id).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].member_id, "bogdan");
    assert_eq!(rows[0].choice, RsvpChoice::Yes);

    // RSVP for a nonexistent event degrades to a notice
    let gone = press(&coord, "bogdan", "rsvp:999:no").await;
    assert_eq!(keys(&gone), vec![MsgKey::RsvpEventGone]);
}

// ---------------------------------------------------------------------------
// Back navigation is a pure rewind
// ---------------------------------------------------------------------------

#[tokio::test]
async fn back_then_same_input_reproduces_identical_payload() {
    let store = Arc::new(InMemoryStore::new());
    let flow = EventWizardFlow::new(store, PlannerConfig::default());
    let mut state = EventWizardFlow::initial_state();

    let sunday = ActionToken::Template(ensemble_bot::dialog::EventTemplate::Sunday);
    let date = ActionToken::DatePick(chrono::NaiveDate::from_ymd_opt(2025, 1, 25).unwrap());
    let time = ActionToken::TimePick(chrono::NaiveTime::from_hms_opt(10, 30, 0).unwrap());

    flow.apply(&mut state, DialogInput::Token(sunday)).await.unwrap();
    flow.apply(&mut state, DialogInput::Token(date)).await.unwrap();
    flow.apply(&mut state, DialogInput::Token(time.clone())).await.unwrap();

    let snapshot = state.clone();

    flow.apply(&mut state, DialogInput::Token(ActionToken::Nav(NavAction::Back)))
        .await
        .unwrap();
    assert_ne!(state, snapshot);

    flow.apply(&mut state, DialogInput::Token(time)).await.unwrap();
    assert_eq!(state, snapshot);
}

// ---------------------------------------------------------------------------
// Per-owner serialization
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_toggles_for_one_owner_are_not_lost() {
    let store = Arc::new(InMemoryStore::new());
    seed_songs(&store, 10).await;
    let coord = Arc::new(DialogCoordinator::new(store.clone(), PlannerConfig::default()));

    text(&coord, "ana", "/newevent").await;
    press(&coord, "ana", "ev:tpl:sunday").await;
    press(&coord, "ana", "ev:date:2025-01-25").await;
    press(&coord, "ana", "ev:time:10:30").await;
    press(&coord, "ana", "ev:loc:0").await;

    let mut handles = Vec::new();
    for id in 1..=10 {
        let coord = coord.clone();
        handles.push(tokio::spawn(async move {
            let event = InboundEvent::callback("ana", format!("song:tog:{id}"));
            coord.handle(&event).await
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    press(&coord, "ana", "song:done").await;
    press(&coord, "ana", "fin:ok").await;

    // Every toggle applied exactly once; racing updates may reorder but
    // never drop or duplicate.
    let mut setlist = store.list_events().await[0].setlist.clone();
    setlist.sort_unstable();
    assert_eq!(setlist, (1..=10).collect::<Vec<i64>>());
}

// ---------------------------------------------------------------------------
// Commit failure keeps the session for a retry
// ---------------------------------------------------------------------------

/// Store whose event creation can be toggled to fail, for commit-retry tests.
struct FlakyStore {
    inner: InMemoryStore,
    fail_create: AtomicBool,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: InMemoryStore::new(),
            fail_create: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl PlannerStore for FlakyStore {
    async fn list_songs(&self) -> Vec<Song> {
        self.inner.list_songs().await
    }
    async fn get_song(&self, id: i64) -> Option<Song> {
        self.inner.get_song(id).await
    }
    async fn add_song(&self, title: &str) -> Song {
        self.inner.add_song(title).await
    }
    async fn update_song_field(&self, id: i64, field: SongField, value: &str) -> StoreResult<()> {
        self.inner.update_song_field(id, field, value).await
    }
    async fn set_chords(&self, id: i64, chart: &str) -> StoreResult<()> {
        self.inner.set_chords(id, chart).await
    }
    async fn remove_song(&self, id: i64) -> StoreResult<()> {
        self.inner.remove_song(id).await
    }
    async fn create_event(&self, draft: NewEvent) -> StoreResult<Event> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("storage offline".into()));
        }
        self.inner.create_event(draft).await
    }
    async fn list_events(&self) -> Vec<Event> {
        self.inner.list_events().await
    }
    async fn get_event(&self, id: i64) -> Option<Event> {
        self.inner.get_event(id).await
    }
    async fn rename_event_field(&self, id: i64, field: EventField, value: &str) -> StoreResult<()> {
        self.inner.rename_event_field(id, field, value).await
    }
    async fn assign_role(&self, event_id: i64, role: &str, member_id: &str) -> StoreResult<()> {
        self.inner.assign_role(event_id, role, member_id).await
    }
    async fn roles_for_event(&self, event_id: i64) -> Vec<RoleAssignment> {
        self.inner.roles_for_event(event_id).await
    }
    async fn record_rsvp(&self, event_id: i64, member_id: &str, choice: RsvpChoice) -> StoreResult<()> {
        self.inner.record_rsvp(event_id, member_id, choice).await
    }
    async fn rsvps_for_event(&self, event_id: i64) -> Vec<Rsvp> {
        self.inner.rsvps_for_event(event_id).await
    }
}

#[tokio::test]
async fn failed_commit_preserves_session_for_retry() {
    let store = Arc::new(FlakyStore::new());
    let coord = DialogCoordinator::new(store.clone(), PlannerConfig::default());

    text(&coord, "ana", "/newevent").await;
    press(&coord, "ana", "ev:tpl:sunday").await;
    press(&coord, "ana", "ev:date:2025-01-25").await;
    press(&coord, "ana", "ev:time:10:30").await;
    press(&coord, "ana", "ev:loc:0").await;
    press(&coord, "ana", "song:done").await;

    let failed = press(&coord, "ana", "fin:ok").await;
    assert_eq!(keys(&failed)[0], MsgKey::CommitFailed);
    // Session survives so prior steps need no re-entry
    assert_eq!(coord.active_kind("ana"), Some(DialogKind::EventWizard));

    store.fail_create.store(false, Ordering::SeqCst);
    let retried = press(&coord, "ana", "fin:ok").await;
    assert_eq!(keys(&retried)[0], MsgKey::WizardCommitted);
    assert_eq!(store.list_events().await.len(), 1);
    assert_eq!(coord.active_kind("ana"), None);
}
