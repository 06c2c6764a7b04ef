//! Chord-chart entry: paste the chart, confirm.

use super::{nav_row, DialogFlow, StepOutcome, Termination};
use crate::dialog::classifier::DialogInput;
use crate::dialog::graph::{ChordStep, DialogKind};
use crate::dialog::outbound::{Button, Keyboard, OutboundDirective};
use crate::dialog::session::{ChordDraft, DialogState, StepCursor};
use crate::dialog::token::{ActionToken, ConfirmAction, NavAction};
use crate::domain::{PlannerStore, Song};
use crate::i18n::{MsgArg, MsgKey, MsgText};
use anyhow::bail;
use async_trait::async_trait;
use std::sync::Arc;

pub struct ChordEntryFlow {
    store: Arc<dyn PlannerStore>,
}

impl ChordEntryFlow {
    pub fn new(store: Arc<dyn PlannerStore>) -> Self {
        Self { store }
    }

    pub fn initial_state(song: &Song) -> DialogState {
        DialogState::ChordEntry {
            cursor: StepCursor::new(ChordStep::Chart),
            draft: ChordDraft {
                song_id: song.id,
                song_title: song.title.clone(),
                chart: None,
            },
        }
    }

    fn confirm_keyboard() -> Keyboard {
        Keyboard::new()
            .row(vec![
                Button::key(MsgKey::BtnConfirm, ActionToken::Confirm(ConfirmAction::Ok)),
                Button::key(MsgKey::BtnEdit, ActionToken::Confirm(ConfirmAction::Edit)),
            ])
            .row(nav_row(true))
    }
}

#[async_trait]
impl DialogFlow for ChordEntryFlow {
    fn kind(&self) -> DialogKind {
        DialogKind::ChordEntry
    }

    async fn prompt(&self, state: &DialogState) -> OutboundDirective {
        let DialogState::ChordEntry { cursor, draft } = state else {
            return OutboundDirective::text(MsgKey::NotUnderstood);
        };
        match cursor.current() {
            ChordStep::Chart => OutboundDirective::with_keyboard(
                MsgText::with_args(
                    MsgKey::ChordPrompt,
                    vec![MsgArg::text(draft.song_title.clone())],
                ),
                Keyboard::new().row(nav_row(false)),
            ),
            ChordStep::Confirm => OutboundDirective::with_keyboard(
                MsgText::with_args(
                    MsgKey::ChordSummary,
                    vec![
                        MsgArg::text(draft.song_title.clone()),
                        MsgArg::text(draft.chart.clone().unwrap_or_default()),
                    ],
                ),
                Self::confirm_keyboard(),
            ),
        }
    }

    async fn apply(&self, state: &mut DialogState, input: DialogInput) -> anyhow::Result<StepOutcome> {
        let DialogState::ChordEntry { cursor, draft } = state else {
            bail!("chord entry invoked with {} session", state.kind().as_str());
        };

        let mut notices: Vec<OutboundDirective> = Vec::new();

        match input {
            DialogInput::Token(ActionToken::Nav(NavAction::Back)) => {
                cursor.back();
            }
            // Multiline charts arrive as one message; keep line breaks.
            DialogInput::Text(text) if cursor.current() == ChordStep::Chart => {
                if text.trim().is_empty() {
                    notices.push(OutboundDirective::text(MsgKey::NotUnderstood));
                } else {
                    draft.chart = Some(text.trim_end().to_string());
                    cursor.advance(ChordStep::Confirm);
                }
            }
            DialogInput::Token(ActionToken::Confirm(ConfirmAction::Ok))
                if cursor.current() == ChordStep::Confirm =>
            {
                let Some(chart) = draft.chart.clone() else {
                    bail!("chord confirm reached with no chart");
                };
                match self.store.set_chords(draft.song_id, &chart).await {
                    Ok(()) => {
                        return Ok(StepOutcome::terminate(
                            Termination::Committed,
                            vec![OutboundDirective::text(MsgKey::ChordSaved)],
                        ));
                    }
                    Err(err) => {
                        tracing::warn!(song_id = draft.song_id, error = %err, "chord commit failed");
                        notices.push(OutboundDirective::text(MsgText::with_args(
                            MsgKey::CommitFailed,
                            vec![MsgArg::text(err.to_string())],
                        )));
                    }
                }
            }
            DialogInput::Token(ActionToken::Confirm(ConfirmAction::Edit))
                if cursor.current() == ChordStep::Confirm =>
            {
                draft.chart = None;
                cursor.restart(ChordStep::Chart);
            }
            _ => notices.push(OutboundDirective::text(MsgKey::NotUnderstood)),
        }

        let mut directives = notices;
        directives.push(self.prompt(state).await);
        Ok(StepOutcome::stay(directives))
    }
}
