//! The event wizard: template → date → time → location → songs → confirm.

use super::{nav_row, DialogFlow, StepOutcome, Termination};
use crate::config::PlannerConfig;
use crate::dialog::classifier::DialogInput;
use crate::dialog::graph::{DialogKind, WizardStep};
use crate::dialog::outbound::{Button, Keyboard, OutboundDirective};
use crate::dialog::session::{new_wizard_state, DialogState, EventDraft};
use crate::dialog::token::{ActionToken, ConfirmAction, NavAction};
use crate::domain::{Event, NewEvent, PlannerStore, RsvpChoice, StoreError};
use crate::i18n::{MsgArg, MsgKey, MsgText};
use anyhow::bail;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveTime, Utc};
use std::sync::Arc;

/// Display format for dates in prompts and summaries.
const DATE_FMT: &str = "%d/%m/%Y";
/// 24-hour time format, both for typed input and display.
const TIME_FMT: &str = "%H:%M";

pub struct EventWizardFlow {
    store: Arc<dyn PlannerStore>,
    presets: PlannerConfig,
}

impl EventWizardFlow {
    pub fn new(store: Arc<dyn PlannerStore>, presets: PlannerConfig) -> Self {
        Self { store, presets }
    }

    /// Fresh wizard state at the template step.
    pub fn initial_state() -> DialogState {
        new_wizard_state()
    }

    fn template_keyboard() -> Keyboard {
        use crate::dialog::token::EventTemplate;
        Keyboard::new()
            .row(vec![
                Button::key(MsgKey::BtnTemplateSunday, ActionToken::Template(EventTemplate::Sunday)),
                Button::key(MsgKey::BtnTemplateRehearsal, ActionToken::Template(EventTemplate::Rehearsal)),
            ])
            .row(vec![
                Button::key(MsgKey::BtnTemplateYouth, ActionToken::Template(EventTemplate::Youth)),
                Button::key(MsgKey::BtnCustom, ActionToken::Template(EventTemplate::Custom)),
            ])
            .row(nav_row(false))
    }

    fn date_keyboard(&self) -> Keyboard {
        let today = Utc::now().date_naive();
        let dates = upcoming_sundays(today, self.presets.date_options);
        let row = dates
            .into_iter()
            .map(|d| Button::text(d.format(DATE_FMT).to_string(), ActionToken::DatePick(d)))
            .collect();
        Keyboard::new()
            .row(row)
            .row(vec![Button::key(MsgKey::BtnCustom, ActionToken::DateCustom)])
            .row(nav_row(true))
    }

    fn time_keyboard(&self) -> Keyboard {
        let row = self
            .presets
            .time_presets
            .iter()
            .filter_map(|preset| {
                NaiveTime::parse_from_str(preset, TIME_FMT)
                    .ok()
                    .map(|t| Button::text(preset.clone(), ActionToken::TimePick(t)))
            })
            .collect();
        Keyboard::new().row(row).row(nav_row(true))
    }

    fn location_keyboard(&self) -> Keyboard {
        let mut kb = Keyboard::new();
        for (idx, location) in self.presets.locations.iter().enumerate() {
            kb = kb.row(vec![Button::text(location.clone(), ActionToken::LocationPick(idx))]);
        }
        kb.row(nav_row(true))
    }

    async fn songs_keyboard(&self, draft: &EventDraft) -> Keyboard {
        let mut kb = Keyboard::new();
        for song in self.store.list_songs().await {
            let selected = draft.setlist.contains(&song.id);
            let label = if selected {
                format!("✅ {}", song.title)
            } else {
                song.title.clone()
            };
            kb = kb.row(vec![Button::text(label, ActionToken::SongToggle(song.id))]);
        }
        kb.row(vec![
            Button::key(MsgKey::BtnDone, ActionToken::SongDone),
            Button::key(MsgKey::BtnSkip, ActionToken::SongSkip),
        ])
        .row(nav_row(true))
    }

    fn summary(draft: &EventDraft) -> MsgText {
        let date = draft
            .date
            .map(|d| d.format(DATE_FMT).to_string())
            .unwrap_or_else(|| "—".into());
        let time = draft
            .time
            .map(|t| t.format(TIME_FMT).to_string())
            .unwrap_or_else(|| "—".into());
        MsgText::with_args(
            MsgKey::WizardSummary,
            vec![
                MsgArg::text(draft.title.clone().unwrap_or_else(|| "—".into())),
                MsgArg::text(date),
                MsgArg::text(time),
                MsgArg::text(draft.location.clone().unwrap_or_else(|| "—".into())),
                MsgArg::text(draft.setlist.len().to_string()),
            ],
        )
    }

    fn confirm_keyboard() -> Keyboard {
        Keyboard::new()
            .row(vec![
                Button::key(MsgKey::BtnConfirm, ActionToken::Confirm(ConfirmAction::Ok)),
                Button::key(MsgKey::BtnEdit, ActionToken::Confirm(ConfirmAction::Edit)),
            ])
            .row(nav_row(true))
    }

    /// The committing side effect. Only reachable from the confirm step.
    async fn commit(&self, draft: &EventDraft) -> Result<Event, StoreError> {
        let (Some(title), Some(date), Some(time), Some(location)) = (
            draft.title.clone(),
            draft.date,
            draft.time,
            draft.location.clone(),
        ) else {
            return Err(StoreError::InvalidEvent("incomplete draft".into()));
        };

        self.store
            .create_event(NewEvent {
                title,
                date,
                time,
                location,
                setlist: draft.setlist.clone(),
            })
            .await
    }

    /// Announcement with attendance buttons, sent after a successful commit.
    fn announcement(event: &Event) -> OutboundDirective {
        let text = MsgText::with_args(
            MsgKey::EventAnnouncement,
            vec![
                MsgArg::text(event.title.clone()),
                MsgArg::text(event.date.format(DATE_FMT).to_string()),
                MsgArg::text(event.time.format(TIME_FMT).to_string()),
                MsgArg::text(event.location.clone()),
            ],
        );
        let rsvp = |choice: RsvpChoice| ActionToken::Rsvp { event_id: event.id, choice };
        let keyboard = Keyboard::new().row(vec![
            Button::key(MsgKey::BtnYes, rsvp(RsvpChoice::Yes)),
            Button::key(MsgKey::BtnMaybe, rsvp(RsvpChoice::Maybe)),
            Button::key(MsgKey::BtnNo, rsvp(RsvpChoice::No)),
        ]);
        OutboundDirective::with_keyboard(text, keyboard)
    }
}

#[async_trait]
impl DialogFlow for EventWizardFlow {
    fn kind(&self) -> DialogKind {
        DialogKind::EventWizard
    }

    async fn prompt(&self, state: &DialogState) -> OutboundDirective {
        let DialogState::EventWizard { cursor, draft } = state else {
            return OutboundDirective::text(MsgKey::NotUnderstood);
        };
        match cursor.current() {
            WizardStep::Template if draft.awaiting_title => OutboundDirective::with_keyboard(
                MsgKey::WizardTitlePrompt,
                Keyboard::new().row(nav_row(false)),
            ),
            WizardStep::Template => {
                OutboundDirective::with_keyboard(MsgKey::WizardTemplate, Self::template_keyboard())
            }
            WizardStep::Date if draft.awaiting_date => OutboundDirective::with_keyboard(
                MsgKey::WizardDatePrompt,
                Keyboard::new().row(nav_row(true)),
            ),
            WizardStep::Date => {
                OutboundDirective::with_keyboard(MsgKey::WizardDate, self.date_keyboard())
            }
            WizardStep::Time => {
                OutboundDirective::with_keyboard(MsgKey::WizardTime, self.time_keyboard())
            }
            WizardStep::Location => {
                OutboundDirective::with_keyboard(MsgKey::WizardLocation, self.location_keyboard())
            }
            WizardStep::Songs => OutboundDirective::with_keyboard(
                MsgText::with_args(
                    MsgKey::WizardSongs,
                    vec![MsgArg::text(draft.setlist.len().to_string())],
                ),
                self.songs_keyboard(draft).await,
            ),
            WizardStep::Confirm => {
                OutboundDirective::with_keyboard(Self::summary(draft), Self::confirm_keyboard())
            }
        }
    }

    #[allow(clippy::too_many_lines)]
    async fn apply(&self, state: &mut DialogState, input: DialogInput) -> anyhow::Result<StepOutcome> {
        let DialogState::EventWizard { cursor, draft } = state else {
            bail!("event wizard invoked with {} session", state.kind().as_str());
        };

        let mut notices: Vec<OutboundDirective> = Vec::new();

        match input {
            DialogInput::Token(token) => match token {
                ActionToken::Nav(NavAction::Back) => {
                    // Back out of an armed free-text sub-state before leaving
                    // the step itself.
                    if cursor.current() == WizardStep::Date && draft.awaiting_date {
                        draft.awaiting_date = false;
                    } else {
                        cursor.back();
                    }
                }
                ActionToken::Template(tpl) if cursor.current() == WizardStep::Template => {
                    match tpl.title() {
                        Some(title) => {
                            draft.title = Some(title.to_string());
                            cursor.advance(WizardStep::Date);
                        }
                        None => draft.awaiting_title = true,
                    }
                }
                ActionToken::DatePick(date) if cursor.current() == WizardStep::Date => {
                    draft.date = Some(date);
                    draft.awaiting_date = false;
                    cursor.advance(WizardStep::Time);
                }
                ActionToken::DateCustom if cursor.current() == WizardStep::Date => {
                    draft.awaiting_date = true;
                }
                ActionToken::TimePick(time) if cursor.current() == WizardStep::Time => {
                    draft.time = Some(time);
                    cursor.advance(WizardStep::Location);
                }
                ActionToken::LocationPick(idx) if cursor.current() == WizardStep::Location => {
                    match self.presets.locations.get(idx) {
                        Some(location) => {
                            draft.location = Some(location.clone());
                            cursor.advance(WizardStep::Songs);
                        }
                        None => notices.push(OutboundDirective::text(MsgKey::NotUnderstood)),
                    }
                }
                // Sub-flow token: recognized at any wizard step, mutates the
                // selection without advancing.
                ActionToken::SongToggle(song_id) => {
                    if self.store.get_song(song_id).await.is_some() {
                        draft.toggle_song(song_id);
                    } else {
                        notices.push(OutboundDirective::text(MsgKey::WizardSongGone));
                    }
                }
                ActionToken::SongDone if cursor.current() == WizardStep::Songs => {
                    cursor.advance(WizardStep::Confirm);
                }
                ActionToken::SongSkip if cursor.current() == WizardStep::Songs => {
                    draft.setlist.clear();
                    cursor.advance(WizardStep::Confirm);
                }
                ActionToken::Confirm(ConfirmAction::Ok)
                    if cursor.current() == WizardStep::Confirm =>
                {
                    match self.commit(draft).await {
                        Ok(event) => {
                            tracing::info!(event_id = event.id, title = %event.title, "event committed");
                            return Ok(StepOutcome::terminate(
                                Termination::Committed,
                                vec![
                                    OutboundDirective::text(MsgKey::WizardCommitted),
                                    Self::announcement(&event),
                                ],
                            ));
                        }
                        Err(err) => {
                            tracing::warn!(error = %err, "event commit failed, keeping session");
                            notices.push(OutboundDirective::text(MsgText::with_args(
                                MsgKey::CommitFailed,
                                vec![MsgArg::text(err.to_string())],
                            )));
                        }
                    }
                }
                ActionToken::Confirm(ConfirmAction::Edit)
                    if cursor.current() == WizardStep::Confirm =>
                {
                    // Deliberate full restart, not a partial back.
                    *draft = EventDraft::default();
                    cursor.restart(WizardStep::Template);
                }
                _ => notices.push(OutboundDirective::text(MsgKey::NotUnderstood)),
            },
            DialogInput::Text(text) => {
                let text = text.trim();
                match cursor.current() {
                    WizardStep::Template if draft.awaiting_title => {
                        if text.is_empty() {
                            notices.push(OutboundDirective::text(MsgKey::NotUnderstood));
                        } else {
                            draft.title = Some(text.to_string());
                            draft.awaiting_title = false;
                            cursor.advance(WizardStep::Date);
                        }
                    }
                    WizardStep::Date if draft.awaiting_date => {
                        match NaiveDate::parse_from_str(text, DATE_FMT) {
                            Ok(date) => {
                                draft.date = Some(date);
                                draft.awaiting_date = false;
                                cursor.advance(WizardStep::Time);
                            }
                            Err(_) => notices.push(OutboundDirective::text(MsgText::with_args(
                                MsgKey::WizardInvalidDate,
                                vec![MsgArg::text(text)],
                            ))),
                        }
                    }
                    WizardStep::Time => match NaiveTime::parse_from_str(text, TIME_FMT) {
                        Ok(time) => {
                            draft.time = Some(time);
                            cursor.advance(WizardStep::Location);
                        }
                        Err(_) => notices.push(OutboundDirective::text(MsgText::with_args(
                            MsgKey::WizardInvalidTime,
                            vec![MsgArg::text(text)],
                        ))),
                    },
                    WizardStep::Location => {
                        if text.is_empty() {
                            notices.push(OutboundDirective::text(MsgKey::NotUnderstood));
                        } else {
                            draft.location = Some(text.to_string());
                            cursor.advance(WizardStep::Songs);
                        }
                    }
                    WizardStep::Songs => {
                        if text.is_empty() {
                            notices.push(OutboundDirective::text(MsgKey::NotUnderstood));
                        } else {
                            let song = self.store.add_song(text).await;
                            draft.setlist.push(song.id);
                            notices.push(OutboundDirective::text(MsgText::with_args(
                                MsgKey::WizardSongAdded,
                                vec![MsgArg::text(song.title)],
                            )));
                        }
                    }
                    _ => notices.push(OutboundDirective::text(MsgKey::NotUnderstood)),
                }
            }
        }

        let mut directives = notices;
        directives.push(self.prompt(state).await);
        Ok(StepOutcome::stay(directives))
    }
}

/// The next `count` Sundays on or after `from`.
fn upcoming_sundays(from: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let offset = (7 - from.weekday().num_days_from_sunday()) % 7;
    let first = from + chrono::Duration::days(i64::from(offset));
    (0..count)
        .map(|week| first + chrono::Duration::weeks(week as i64))
        .collect()
}
