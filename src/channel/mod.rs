//! Transport adapters.
//!
//! Adapters normalize platform updates into [`InboundEvent`]s for the dialog
//! engine and deliver [`OutboundDirective`]s back out.
//!
//! [`OutboundDirective`]: crate::dialog::OutboundDirective

pub mod sink;
pub mod telegram;

pub use sink::TelegramSink;
pub use telegram::{TelegramChannel, TelegramError};

use crate::dialog::OwnerId;

/// Normalized inbound event: either a typed message or a button press,
/// always scoped to one owner.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    /// Unique event id, for log correlation.
    pub id: String,
    /// The chat participant driving the dialog.
    pub owner: OwnerId,
    /// Chat to address replies to (equals `owner` in private chats).
    pub chat_id: String,
    pub payload: InboundPayload,
}

/// The two input modalities.
#[derive(Debug, Clone)]
pub enum InboundPayload {
    /// Free text typed by the user.
    Text { text: String },
    /// Inline-button press carrying opaque callback data.
    Callback { query_id: String, data: String },
}

impl InboundEvent {
    pub fn text(owner: impl Into<String>, text: impl Into<String>) -> Self {
        let owner = owner.into();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: owner.clone(),
            owner,
            payload: InboundPayload::Text { text: text.into() },
        }
    }

    pub fn callback(owner: impl Into<String>, data: impl Into<String>) -> Self {
        let owner = owner.into();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: owner.clone(),
            owner,
            payload: InboundPayload::Callback {
                query_id: uuid::Uuid::new_v4().to_string(),
                data: data.into(),
            },
        }
    }
}
