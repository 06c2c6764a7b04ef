//! Event renaming: pick title or location, type the new value, confirm.

use super::{nav_row, DialogFlow, StepOutcome, Termination};
use crate::dialog::classifier::DialogInput;
use crate::dialog::graph::{DialogKind, EditStep};
use crate::dialog::outbound::{Button, Keyboard, OutboundDirective};
use crate::dialog::session::{DialogState, RenameDraft, StepCursor};
use crate::dialog::token::{ActionToken, ConfirmAction, NavAction};
use crate::domain::{Event, EventField, PlannerStore};
use crate::i18n::{MsgArg, MsgKey, MsgText};
use anyhow::bail;
use async_trait::async_trait;
use std::sync::Arc;

pub struct RenameEventFlow {
    store: Arc<dyn PlannerStore>,
}

impl RenameEventFlow {
    pub fn new(store: Arc<dyn PlannerStore>) -> Self {
        Self { store }
    }

    pub fn initial_state(event: &Event) -> DialogState {
        DialogState::RenameEvent {
            cursor: StepCursor::new(EditStep::Field),
            draft: RenameDraft {
                event_id: event.id,
                event_title: event.title.clone(),
                field: None,
                value: None,
            },
        }
    }

    fn field_keyboard() -> Keyboard {
        Keyboard::new()
            .row(vec![
                Button::key(MsgKey::FieldTitle, ActionToken::EventFieldPick(EventField::Title)),
                Button::key(MsgKey::FieldLocation, ActionToken::EventFieldPick(EventField::Location)),
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

    fn field_key(field: EventField) -> MsgKey {
        match field {
            EventField::Title => MsgKey::FieldTitle,
            EventField::Location => MsgKey::FieldLocation,
        }
    }
}

#[async_trait]
impl DialogFlow for RenameEventFlow {
    fn kind(&self) -> DialogKind {
        DialogKind::RenameEvent
    }

    async fn prompt(&self, state: &DialogState) -> OutboundDirective {
        let DialogState::RenameEvent { cursor, draft } = state else {
            return OutboundDirective::text(MsgKey::NotUnderstood);
        };
        match cursor.current() {
            EditStep::Field => OutboundDirective::with_keyboard(
                MsgText::with_args(
                    MsgKey::RenameChooseField,
                    vec![MsgArg::text(draft.event_title.clone())],
                ),
                Self::field_keyboard(),
            ),
            EditStep::Value => {
                let field = draft.field.unwrap_or(EventField::Title);
                OutboundDirective::with_keyboard(
                    MsgText::with_args(
                        MsgKey::EditValuePrompt,
                        vec![MsgArg::Key(Self::field_key(field))],
                    ),
                    Keyboard::new().row(nav_row(true)),
                )
            }
            EditStep::Confirm => {
                let field = draft.field.unwrap_or(EventField::Title);
                OutboundDirective::with_keyboard(
                    MsgText::with_args(
                        MsgKey::EditSummary,
                        vec![
                            MsgArg::Key(Self::field_key(field)),
                            MsgArg::text(draft.event_title.clone()),
                            MsgArg::text(draft.value.clone().unwrap_or_default()),
                        ],
                    ),
                    Self::confirm_keyboard(),
                )
            }
        }
    }

    async fn apply(&self, state: &mut DialogState, input: DialogInput) -> anyhow::Result<StepOutcome> {
        let DialogState::RenameEvent { cursor, draft } = state else {
            bail!("rename invoked with {} session", state.kind().as_str());
        };

        let mut notices: Vec<OutboundDirective> = Vec::new();

        match input {
            DialogInput::Token(ActionToken::Nav(NavAction::Back)) => {
                cursor.back();
            }
            DialogInput::Token(ActionToken::EventFieldPick(field))
                if cursor.current() == EditStep::Field =>
            {
                draft.field = Some(field);
                cursor.advance(EditStep::Value);
            }
            DialogInput::Token(ActionToken::Confirm(ConfirmAction::Ok))
                if cursor.current() == EditStep::Confirm =>
            {
                let (Some(field), Some(value)) = (draft.field, draft.value.clone()) else {
                    bail!("rename confirm reached with incomplete draft");
                };
                match self.store.rename_event_field(draft.event_id, field, &value).await {
                    Ok(()) => {
                        return Ok(StepOutcome::terminate(
                            Termination::Committed,
                            vec![OutboundDirective::text(MsgKey::EditSaved)],
                        ));
                    }
                    Err(err) => {
                        tracing::warn!(event_id = draft.event_id, error = %err, "rename commit failed");
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
