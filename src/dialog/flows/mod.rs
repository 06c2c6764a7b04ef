//! Step executors, one per dialog kind.
//!
//! An executor validates input for the current step, mutates the session
//! state in place and reports what happened. Only each flow's terminal step
//! may trigger a committing side effect; every earlier step just accumulates
//! draft data. Commit failures report and leave the session alone so the user
//! can retry.

mod chord_entry;
mod event_wizard;
mod rename;
mod song_edit;

pub use chord_entry::ChordEntryFlow;
pub use event_wizard::EventWizardFlow;
pub use rename::RenameEventFlow;
pub use song_edit::SongEditFlow;

use super::classifier::DialogInput;
use super::graph::DialogKind;
use super::outbound::{Button, OutboundDirective};
use super::session::DialogState;
use super::token::{ActionToken, NavAction};
use crate::i18n::MsgKey;
use async_trait::async_trait;

/// How a dialog ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The terminal step's side effect succeeded.
    Committed,
    /// Cancelled or otherwise abandoned; nothing was persisted.
    Discarded,
}

/// Result of applying one inbound input to a session.
#[derive(Debug)]
pub struct StepOutcome {
    pub directives: Vec<OutboundDirective>,
    /// `Some` ends the session; `None` keeps it (stay or advance).
    pub termination: Option<Termination>,
}

impl StepOutcome {
    /// Session continues (the state carries the possibly-new step).
    pub fn stay(directives: Vec<OutboundDirective>) -> Self {
        Self { directives, termination: None }
    }

    pub fn terminate(termination: Termination, directives: Vec<OutboundDirective>) -> Self {
        Self { directives, termination: Some(termination) }
    }
}

/// One dialog kind's step executor.
#[async_trait]
pub trait DialogFlow: Send + Sync {
    fn kind(&self) -> DialogKind;

    /// Prompt for the current step: sent on entry, after back and as the
    /// re-prompt on routing misses and validation failures.
    async fn prompt(&self, state: &DialogState) -> OutboundDirective;

    /// Apply one classified input, mutating `state` in place.
    ///
    /// `Err` means an engine bug (e.g. a state/kind mismatch), not a user
    /// error; user-level failures come back as directives.
    async fn apply(&self, state: &mut DialogState, input: DialogInput) -> anyhow::Result<StepOutcome>;
}

/// The back/cancel row appended to step keyboards.
pub(crate) fn nav_row(allows_back: bool) -> Vec<Button> {
    let mut row = Vec::with_capacity(2);
    if allows_back {
        row.push(Button::key(MsgKey::BtnBack, ActionToken::Nav(NavAction::Back)));
    }
    row.push(Button::key(MsgKey::BtnCancel, ActionToken::Nav(NavAction::Cancel)));
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nav_row_hides_back_on_first_step() {
        assert_eq!(nav_row(false).len(), 1);
        assert_eq!(nav_row(true).len(), 2);
    }
}
