//! Song editing: pick a field, type the new value, confirm.

use super::{nav_row, DialogFlow, StepOutcome, Termination};
use crate::dialog::classifier::DialogInput;
use crate::dialog::graph::{DialogKind, EditStep};
use crate::dialog::outbound::{Button, Keyboard, OutboundDirective};
use crate::dialog::session::{DialogState, SongEditDraft, StepCursor};
use crate::dialog::token::{ActionToken, ConfirmAction, NavAction};
use crate::domain::{PlannerStore, Song, SongField};
use crate::i18n::{MsgArg, MsgKey, MsgText};
use anyhow::bail;
use async_trait::async_trait;
use std::sync::Arc;

pub struct SongEditFlow {
    store: Arc<dyn PlannerStore>,
}

impl SongEditFlow {
    pub fn new(store: Arc<dyn PlannerStore>) -> Self {
        Self { store }
    }

    /// Fresh state for editing one song.
    pub fn initial_state(song: &Song) -> DialogState {
        DialogState::SongEdit {
            cursor: StepCursor::new(EditStep::Field),
            draft: SongEditDraft {
                song_id: song.id,
                song_title: song.title.clone(),
                field: None,
                value: None,
            },
        }
    }

    fn field_keyboard() -> Keyboard {
        Keyboard::new()
            .row(vec![
                Button::key(MsgKey::FieldTitle, ActionToken::SongFieldPick(SongField::Title)),
                Button::key(MsgKey::FieldArtist, ActionToken::SongFieldPick(SongField::Artist)),
                Button::key(MsgKey::FieldKey, ActionToken::SongFieldPick(SongField::Key)),
            ])
            .row(nav_row(false))
    }

    fn confirm_keyboard() -> Keyboard {
        Keyboard::new()
            .row(vec![
                Button::key(MsgKey::BtnConfirm, ActionToken::Confirm(ConfirmAction::Ok)),
                Button::key(MsgKey::BtnEdit, ActionToken::Confirm(ConfirmAction::Edit)),
            ])
            .row(nav_row(true))
    }

    fn field_key(field: SongField) -> MsgKey {
        match field {
            SongField::Title => MsgKey::FieldTitle,
            SongField::Artist => MsgKey::FieldArtist,
            SongField::Key => MsgKey::FieldKey,
        }
    }
}

#[async_trait]
impl DialogFlow for SongEditFlow {
    fn kind(&self) -> DialogKind {
        DialogKind::SongEdit
    }

    async fn prompt(&self, state: &DialogState) -> OutboundDirective {
        let DialogState::SongEdit { cursor, draft } = state else {
            return OutboundDirective::text(MsgKey::NotUnderstood);
        };
        match cursor.current() {
            EditStep::Field => OutboundDirective::with_keyboard(
                MsgText::with_args(
                    MsgKey::EditChooseField,
                    vec![MsgArg::text(draft.song_title.clone())],
                ),
                Self::field_keyboard(),
            ),
            EditStep::Value => {
                let field = draft.field.unwrap_or(SongField::Title);
                OutboundDirective::with_keyboard(
                    MsgText::with_args(
                        MsgKey::EditValuePrompt,
                        vec![MsgArg::Key(Self::field_key(field))],
                    ),
                    Keyboard::new().row(nav_row(true)),
                )
            }
            EditStep::Confirm => {
                let field = draft.field.unwrap_or(SongField::Title);
                OutboundDirective::with_keyboard(
                    MsgText::with_args(
                        MsgKey::EditSummary,
                        vec![
                            MsgArg::Key(Self::field_key(field)),
                            MsgArg::text(draft.song_title.clone()),
                            MsgArg::text(draft.value.clone().unwrap_or_default()),
                        ],
                    ),
                    Self::confirm_keyboard(),
                )
            }
        }
    }

    async fn apply(&self, state: &mut DialogState, input: DialogInput) -> anyhow::Result<StepOutcome> {
        let DialogState::SongEdit { cursor, draft } = state else {
            bail!("song edit invoked with {} session", state.kind().as_str());
        };

        let mut notices: Vec<OutboundDirective> = Vec::new();

        match input {
            DialogInput::Token(ActionToken::Nav(NavAction::Back)) => {
                cursor.back();
            }
            DialogInput::Token(ActionToken::SongFieldPick(field))
                if cursor.current() == EditStep::Field =>
            {
                draft.field = Some(field);
                cursor.advance(EditStep::Value);
            }
            DialogInput::Token(ActionToken::Confirm(ConfirmAction::Ok))
                if cursor.current() == EditStep::Confirm =>
            {
                let (Some(field), Some(value)) = (draft.field, draft.value.clone()) else {
                    bail!("song edit confirm reached with incomplete draft");
                };
                match self.store.update_song_field(draft.song_id, field, &value).await {
                    Ok(()) => {
                        return Ok(StepOutcome::terminate(
                            Termination::Committed,
                            vec![OutboundDirective::text(MsgKey::EditSaved)],
                        ));
                    }
                    Err(err) => {
                        tracing::warn!(song_id = draft.song_id, error = %err, "song edit commit failed");
                        notices.push(OutboundDirective::text(MsgText::with_args(
                            MsgKey::CommitFailed,
                            vec![MsgArg::text(err.to_string())],
                        )));
                    }
                }
            }
            DialogInput::Token(ActionToken::Confirm(ConfirmAction::Edit))
                if cursor.current() == EditStep::Confirm =>
            {
                draft.field = None;
                draft.value = None;
                cursor.restart(EditStep::Field);
            }
            DialogInput::Text(text) if cursor.current() == EditStep::Value => {
                let text = text.trim();
                if text.is_empty() {
                    notices.push(OutboundDirective::text(MsgKey::NotUnderstood));
                } else {
                    draft.value = Some(text.to_string());
                    cursor.advance(EditStep::Confirm);
                }
            }
            _ => notices.push(OutboundDirective::text(MsgKey::NotUnderstood)),
        }

        let mut directives = notices;
        directives.push(self.prompt(state).await);
        Ok(StepOutcome::stay(directives))
    }
}
