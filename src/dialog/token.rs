//! Typed callback action tokens.
//!
//! Every inline-keyboard button carries an encoded [`ActionToken`]. Tokens are
//! decoded exactly once, at the classifier boundary; the rest of the engine
//! only ever sees structured values. The encoded form must stay under
//! Telegram's 64-byte callback-data limit.

use crate::domain::{EventField, RsvpChoice, SongField};
use chrono::{NaiveDate, NaiveTime};

/// Navigation actions available on (almost) every keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    Back,
    Cancel,
}

/// Event templates offered on the wizard's first step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTemplate {
    Sunday,
    Rehearsal,
    Youth,
    Custom,
}

impl EventTemplate {
    /// Preset title, or `None` for the free-text template.
    pub const fn title(self) -> Option<&'static str> {
        match self {
            Self::Sunday => Some("Serviciu"),
            Self::Rehearsal => Some("Repetiție"),
            Self::Youth => Some("Seară de tineret"),
            Self::Custom => None,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Sunday => "sunday",
            Self::Rehearsal => "rehearsal",
            Self::Youth => "youth",
            Self::Custom => "custom",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "sunday" => Some(Self::Sunday),
            "rehearsal" => Some(Self::Rehearsal),
            "youth" => Some(Self::Youth),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// Terminal-step actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    /// Commit the dialog's side effect.
    Ok,
    /// Restart data collection from the first step.
    Edit,
}

/// One decoded button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionToken {
    Nav(NavAction),
    Template(EventTemplate),
    DatePick(NaiveDate),
    DateCustom,
    TimePick(NaiveTime),
    /// Index into the configured location presets.
    LocationPick(usize),
    SongToggle(i64),
    SongDone,
    SongSkip,
    Confirm(ConfirmAction),
    SongFieldPick(SongField),
    EventFieldPick(EventField),
    Rsvp { event_id: i64, choice: RsvpChoice },
}

impl ActionToken {
    /// Encode into callback data.
    pub fn encode(&self) -> String {
        match self {
            Self::Nav(NavAction::Back) => "nav:back".into(),
            Self::Nav(NavAction::Cancel) => "nav:cancel".into(),
            Self::Template(tpl) => format!("ev:tpl:{}", tpl.as_str()),
            Self::DatePick(date) => format!("ev:date:{}", date.format("%Y-%m-%d")),
            Self::DateCustom => "ev:date:custom".into(),
            Self::TimePick(time) => format!("ev:time:{}", time.format("%H:%M")),
            Self::LocationPick(idx) => format!("ev:loc:{idx}"),
            Self::SongToggle(id) => format!("song:tog:{id}"),
            Self::SongDone => "song:done".into(),
            Self::SongSkip => "song:skip".into(),
            Self::Confirm(ConfirmAction::Ok) => "fin:ok".into(),
            Self::Confirm(ConfirmAction::Edit) => "fin:edit".into(),
            Self::SongFieldPick(field) => format!("fld:song:{}", field.as_str()),
            Self::EventFieldPick(field) => format!("fld:event:{}", field.as_str()),
            Self::Rsvp { event_id, choice } => format!("rsvp:{event_id}:{}", choice.as_str()),
        }
    }

    /// Decode callback data. Unknown or malformed data yields `None` (the
    /// classifier treats that as a routing miss, never an error).
    pub fn decode(data: &str) -> Option<Self> {
        let mut parts = data.splitn(3, ':');
        let family = parts.next()?;
        let action = parts.next()?;
        let rest = parts.next();

        match (family, action, rest) {
            ("nav", "back", None) => Some(Self::Nav(NavAction::Back)),
            ("nav", "cancel", None) => Some(Self::Nav(NavAction::Cancel)),
            ("ev", "tpl", Some(tpl)) => EventTemplate::parse(tpl).map(Self::Template),
            ("ev", "date", Some("custom")) => Some(Self::DateCustom),
            ("ev", "date", Some(date)) => NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .ok()
                .map(Self::DatePick),
            ("ev", "time", Some(time)) => NaiveTime::parse_from_str(time, "%H:%M")
                .ok()
                .map(Self::TimePick),
            ("ev", "loc", Some(idx)) => idx.parse().ok().map(Self::LocationPick),
            ("song", "tog", Some(id)) => id.parse().ok().map(Self::SongToggle),
            ("song", "done", None) => Some(Self::SongDone),
            ("song", "skip", None) => Some(Self::SongSkip),
            ("fin", "ok", None) => Some(Self::Confirm(ConfirmAction::Ok)),
            ("fin", "edit", None) => Some(Self::Confirm(ConfirmAction::Edit)),
            ("fld", "song", Some(field)) => SongField::parse(field).map(Self::SongFieldPick),
            ("fld", "event", Some(field)) => EventField::parse(field).map(Self::EventFieldPick),
            ("rsvp", event_id, Some(choice)) => {
                let event_id = event_id.parse().ok()?;
                let choice = RsvpChoice::parse(choice)?;
                Some(Self::Rsvp { event_id, choice })
            }
            _ => None,
        }
    }

    /// Whether the token only makes sense inside a live dialog session.
    ///
    /// RSVP buttons live on event announcements and work forever; everything
    /// else belongs to a dialog keyboard, and arriving without a session means
    /// the session expired or was replaced.
    pub fn is_dialog_scoped(&self) -> bool {
        !matches!(self, Self::Rsvp { .. })
    }
}
