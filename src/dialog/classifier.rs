//! Inbound event classification.
//!
//! Given a raw inbound event and the owner's current session (if any), decide
//! where it routes. Priority order:
//!
//! 1. Global cancel (text keyword or nav token) beats everything.
//! 2. RSVP tokens live on event announcements, not dialog keyboards, and
//!    route to non-dialog handling whether or not a session exists.
//! 3. No session: plain command/callback handling, with an explicit
//!    "session expired" signal for tokens that only make sense in a dialog.
//! 4. Active session: the event must match what the current step accepts.
//!    Song-toggle tokens are recognized across all wizard steps (one rendered
//!    keyboard may outlive the step that issued it), as are back/cancel.
//! 5. Anything else is a routing miss: never a crash, never a silent advance.

use super::graph::DialogKind;
use super::session::DialogState;
use super::token::{ActionToken, NavAction};
use crate::channel::{InboundEvent, InboundPayload};
use crate::domain::RsvpChoice;

/// Global cancel keyword, accepted regardless of step.
const CANCEL_COMMAND: &str = "/cancel";

/// Where an inbound event routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Tear down the owner's session (if any) and acknowledge.
    Cancel,
    /// Feed the active session's step machine.
    Dialog(DialogInput),
    /// No dialog involvement; handled by the outer command layer.
    NonDialog(NonDialogInput),
    /// Doesn't match anything the current step accepts.
    Miss,
}

/// Input already matched to the active session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogInput {
    Token(ActionToken),
    Text(String),
}

/// Input with no (matching) session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NonDialogInput {
    /// Free text, possibly a command.
    Command(String),
    /// Attendance answer from an event announcement.
    Rsvp { event_id: i64, choice: RsvpChoice },
    /// A dialog-scoped token arrived but its session is gone or replaced.
    StaleDialogToken,
    /// Callback data we cannot decode at all.
    UnknownCallback,
}

/// Classify one inbound event against the owner's current session state.
pub fn classify(event: &InboundEvent, session: Option<&DialogState>) -> Route {
    match &event.payload {
        InboundPayload::Text { text } => {
            if text.trim().eq_ignore_ascii_case(CANCEL_COMMAND) {
                return Route::Cancel;
            }
            match session {
                Some(state) if state.modality().accepts_text() => {
                    Route::Dialog(DialogInput::Text(text.clone()))
                }
                Some(_) => Route::Miss,
                None => Route::NonDialog(NonDialogInput::Command(text.clone())),
            }
        }
        InboundPayload::Callback { data, .. } => {
            let Some(token) = ActionToken::decode(data) else {
                return match session {
                    Some(_) => Route::Miss,
                    None => Route::NonDialog(NonDialogInput::UnknownCallback),
                };
            };

            if token == ActionToken::Nav(NavAction::Cancel) {
                return Route::Cancel;
            }
            if let ActionToken::Rsvp { event_id, choice } = token {
                return Route::NonDialog(NonDialogInput::Rsvp { event_id, choice });
            }

            match session {
                Some(state) if token_accepted(state, &token) => {
                    Route::Dialog(DialogInput::Token(token))
                }
                // A button from a dead session of a *different* kind gets the
                // explicit restart signal; wrong-step tokens of the live kind
                // are plain misses.
                Some(state) if foreign_kind(state, &token) => {
                    Route::NonDialog(NonDialogInput::StaleDialogToken)
                }
                Some(_) => Route::Miss,
                None => Route::NonDialog(NonDialogInput::StaleDialogToken),
            }
        }
    }
}

/// Whether a token belongs to a dialog kind other than the active session's.
fn foreign_kind(state: &DialogState, token: &ActionToken) -> bool {
    let kind = state.kind();
    match token {
        ActionToken::Template(_)
        | ActionToken::DatePick(_)
        | ActionToken::DateCustom
        | ActionToken::TimePick(_)
        | ActionToken::LocationPick(_)
        | ActionToken::SongToggle(_)
        | ActionToken::SongDone
        | ActionToken::SongSkip => kind != DialogKind::EventWizard,
        ActionToken::SongFieldPick(_) => kind != DialogKind::SongEdit,
        ActionToken::EventFieldPick(_) => kind != DialogKind::RenameEvent,
        // Nav and confirm tokens are shared by every kind
        _ => false,
    }
}

/// Token vocabulary check for the current step.
///
/// Step-scoped families match only their own step; back matches wherever the
/// graph allows it; wizard song toggles match at any wizard step (sub-flow
/// tokens mutate the draft without advancing, see the wizard executor).
fn token_accepted(state: &DialogState, token: &ActionToken) -> bool {
    use super::graph::{ChordStep, EditStep, WizardStep};

    if *token == ActionToken::Nav(NavAction::Back) {
        return state.allows_back();
    }

    match state {
        DialogState::EventWizard { cursor, .. } => match token {
            ActionToken::SongToggle(_) => true,
            ActionToken::Template(_) => cursor.current() == WizardStep::Template,
            ActionToken::DatePick(_) | ActionToken::DateCustom => {
                cursor.current() == WizardStep::Date
            }
            ActionToken::TimePick(_) => cursor.current() == WizardStep::Time,
            ActionToken::LocationPick(_) => cursor.current() == WizardStep::Location,
            ActionToken::SongDone | ActionToken::SongSkip => {
                cursor.current() == WizardStep::Songs
            }
            ActionToken::Confirm(_) => cursor.current() == WizardStep::Confirm,
            _ => false,
        },
        DialogState::SongEdit { cursor, .. } => match token {
            ActionToken::SongFieldPick(_) => cursor.current() == EditStep::Field,
            ActionToken::Confirm(_) => cursor.current() == EditStep::Confirm,
            _ => false,
        },
        DialogState::RenameEvent { cursor, .. } => match token {
            ActionToken::EventFieldPick(_) => cursor.current() == EditStep::Field,
            ActionToken::Confirm(_) => cursor.current() == EditStep::Confirm,
            _ => false,
        },
        DialogState::ChordEntry { cursor, .. } => match token {
            ActionToken::Confirm(_) => cursor.current() == ChordStep::Confirm,
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::session::{new_wizard_state, ChordDraft, StepCursor};
    use crate::dialog::graph::ChordStep;
    use crate::dialog::token::ConfirmAction;

    fn wizard_at(step: crate::dialog::graph::WizardStep) -> DialogState {
        let mut state = new_wizard_state();
        if let DialogState::EventWizard { cursor, .. } = &mut state {
            while cursor.current() != step {
                let next = cursor.current().forward_targets()[0];
                cursor.advance(next);
            }
        }
        state
    }

    #[test]
    fn cancel_text_beats_everything() {
        let state = wizard_at(crate::dialog::graph::WizardStep::Time);
        let event = InboundEvent::text("ana", "  /CANCEL ");
        assert_eq!(classify(&event, Some(&state)), Route::Cancel);
        assert_eq!(classify(&event, None), Route::Cancel);
    }

    #[test]
    fn cancel_token_beats_everything() {
        let event = InboundEvent::callback("ana", "nav:cancel");
        assert_eq!(classify(&event, None), Route::Cancel);
    }

    #[test]
    fn no_session_text_routes_to_commands() {
        let event = InboundEvent::text("ana", "/songs");
        assert_eq!(
            classify(&event, None),
            Route::NonDialog(NonDialogInput::Command("/songs".into()))
        );
    }

    #[test]
    fn stale_dialog_token_without_session() {
        let event = InboundEvent::callback("ana", "song:tog:3");
        assert_eq!(
            classify(&event, None),
            Route::NonDialog(NonDialogInput::StaleDialogToken)
        );
    }

    #[test]
    fn rsvp_routes_non_dialog_even_with_session() {
        let state = wizard_at(crate::dialog::graph::WizardStep::Date);
        let event = InboundEvent::callback("ana", "rsvp:5:yes");
        assert_eq!(
            classify(&event, Some(&state)),
            Route::NonDialog(NonDialogInput::Rsvp { event_id: 5, choice: RsvpChoice::Yes })
        );
    }

    #[test]
    fn step_token_accepted_at_its_step() {
        let state = wizard_at(crate::dialog::graph::WizardStep::Date);
        let event = InboundEvent::callback("ana", "ev:date:2025-01-25");
        assert!(matches!(
            classify(&event, Some(&state)),
            Route::Dialog(DialogInput::Token(ActionToken::DatePick(_)))
        ));
    }

    #[test]
    fn foreign_step_token_is_a_miss() {
        let state = wizard_at(crate::dialog::graph::WizardStep::Date);
        let event = InboundEvent::callback("ana", "fin:ok");
        assert_eq!(classify(&event, Some(&state)), Route::Miss);
    }

    #[test]
    fn song_toggle_recognized_across_wizard_steps() {
        // A toggle token from the songs keyboard still routes while the user
        // has navigated back to the date step.
        let state = wizard_at(crate::dialog::graph::WizardStep::Date);
        let event = InboundEvent::callback("ana", "song:tog:7");
        assert_eq!(
            classify(&event, Some(&state)),
            Route::Dialog(DialogInput::Token(ActionToken::SongToggle(7)))
        );
    }

    #[test]
    fn back_rejected_on_first_step() {
        let state = new_wizard_state();
        let event = InboundEvent::callback("ana", "nav:back");
        assert_eq!(classify(&event, Some(&state)), Route::Miss);
    }

    #[test]
    fn back_accepted_past_first_step() {
        let state = wizard_at(crate::dialog::graph::WizardStep::Time);
        let event = InboundEvent::callback("ana", "nav:back");
        assert_eq!(
            classify(&event, Some(&state)),
            Route::Dialog(DialogInput::Token(ActionToken::Nav(NavAction::Back)))
        );
    }

    #[test]
    fn text_rejected_on_callback_only_step() {
        let state = wizard_at(crate::dialog::graph::WizardStep::Confirm);
        let event = InboundEvent::text("ana", "yes please");
        assert_eq!(classify(&event, Some(&state)), Route::Miss);
    }

    #[test]
    fn foreign_kind_token_signals_expired_session() {
        // A chord-entry session must never consume event-wizard tokens; the
        // user is told to restart that dialog instead.
        let state = DialogState::ChordEntry {
            cursor: StepCursor::new(ChordStep::Chart),
            draft: ChordDraft { song_id: 1, song_title: "x".into(), chart: None },
        };
        let event = InboundEvent::callback("ana", "ev:tpl:sunday");
        assert_eq!(
            classify(&event, Some(&state)),
            Route::NonDialog(NonDialogInput::StaleDialogToken)
        );
    }

    #[test]
    fn undecodable_callback_with_session_is_miss() {
        let state = new_wizard_state();
        let event = InboundEvent::callback("ana", "gibberish");
        assert_eq!(classify(&event, Some(&state)), Route::Miss);

        let confirm = InboundEvent::callback("ana", "fin:ok");
        assert!(matches!(
            classify(&confirm, Some(&wizard_at(crate::dialog::graph::WizardStep::Confirm))),
            Route::Dialog(DialogInput::Token(ActionToken::Confirm(ConfirmAction::Ok)))
        ));
    }
}
