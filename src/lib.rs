//! ensemble-bot - chat-driven planning assistant for volunteer music teams.
//!
//! Tracks events, role assignments, song setlists and attendance responses,
//! driven entirely through Telegram messages and inline-button callbacks.
//!
//! ## Architecture
//!
//! ```text
//! Telegram getUpdates → channel adapter → per-owner worker queue
//!                                              ↓
//!                       classifier → dialog coordinator → step executors
//!                                              ↓                ↓
//! User ←── sendMessage ←── outbound sink ← directives     planner store
//! ```
//!
//! The core is the conversational workflow engine in [`dialog`]: an
//! owner-keyed session store with lazy expiry, typed action tokens, explicit
//! per-kind step graphs and one coordinator entry point per inbound event.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod bot;
pub mod channel;
pub mod commands;
pub mod config;
pub mod dialog;
pub mod domain;
pub mod i18n;
pub mod logging;

// Re-export commonly used types
pub use bot::BotRuntime;
pub use channel::{InboundEvent, InboundPayload, TelegramChannel, TelegramSink};
pub use config::Config;
pub use dialog::{
    ActionToken, DialogCoordinator, DialogKind, OutboundDirective, OutboundSink, SessionStore,
};
pub use domain::{InMemoryStore, PlannerStore};
pub use i18n::{Localizer, MsgKey};
