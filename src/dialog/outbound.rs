//! Outbound directives emitted by the dialog engine.
//!
//! Directives carry message keys and structured buttons, never rendered
//! strings; the delivery side localizes and formats. A delivery failure must
//! never corrupt session state, which is why the engine hands directives off
//! instead of sending anything itself.

use super::token::ActionToken;
use crate::i18n::{MsgKey, MsgText};
use async_trait::async_trait;

/// Button label: a message key for fixed controls, literal text for data
/// (song titles, dates).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    Key(MsgKey),
    Text(String),
}

/// One inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: Label,
    pub token: ActionToken,
}

impl Button {
    pub fn key(key: MsgKey, token: ActionToken) -> Self {
        Self { label: Label::Key(key), token }
    }

    pub fn text(label: impl Into<String>, token: ActionToken) -> Self {
        Self { label: Label::Text(label.into()), token }
    }
}

/// Button rows, rendered as an inline keyboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        self.rows.push(buttons);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One message to deliver to the owner's chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundDirective {
    pub text: MsgText,
    pub keyboard: Option<Keyboard>,
}

impl OutboundDirective {
    pub fn text(text: impl Into<MsgText>) -> Self {
        Self { text: text.into(), keyboard: None }
    }

    pub fn with_keyboard(text: impl Into<MsgText>, keyboard: Keyboard) -> Self {
        Self { text: text.into(), keyboard: Some(keyboard) }
    }
}

/// Delivery collaborator. Implementations localize, format and send.
#[async_trait]
pub trait OutboundSink: Send + Sync {
    /// Deliver one directive to a chat. Errors are the sink's own problem to
    /// report; callers log and move on.
    async fn deliver(&self, chat_id: &str, directive: OutboundDirective) -> anyhow::Result<()>;

    /// Acknowledge the button press that triggered processing, if the
    /// transport has such a concept.
    async fn ack_callback(&self, _query_id: &str) -> anyhow::Result<()> {
        Ok(())
    }
}
