//! Plain text commands, handled outside any dialog session.
//!
//! This is the layer the classifier's "no session" path falls through to.
//! Dialog-starting commands hand off to the coordinator's entry points.

use crate::dialog::{DialogCoordinator, OutboundDirective};
use crate::i18n::{MsgArg, MsgKey, MsgText};

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    NewEvent,
    Events,
    Songs,
    AddSong(String),
    EditSong(i64),
    Chords(i64),
    Rename(i64),
    Assign { event_id: i64, role: String, member: String },
    Unknown,
}

/// Parse one message into a command. Anything unrecognized (including plain
/// chatter) is `Unknown`.
pub fn parse(text: &str) -> Command {
    let mut words = text.split_whitespace();
    let Some(head) = words.next() else {
        return Command::Unknown;
    };

    match head.to_ascii_lowercase().as_str() {
        "/start" => Command::Start,
        "/help" => Command::Help,
        "/newevent" => Command::NewEvent,
        "/events" => Command::Events,
        "/songs" => Command::Songs,
        "/addsong" => {
            let title = words.collect::<Vec<_>>().join(" ");
            if title.is_empty() {
                Command::Unknown
            } else {
                Command::AddSong(title)
            }
        }
        "/song" => match words.next().and_then(|id| id.parse().ok()) {
            Some(id) => Command::EditSong(id),
            None => Command::Unknown,
        },
        "/chords" => match words.next().and_then(|id| id.parse().ok()) {
            Some(id) => Command::Chords(id),
            None => Command::Unknown,
        },
        "/rename" => match words.next().and_then(|id| id.parse().ok()) {
            Some(id) => Command::Rename(id),
            None => Command::Unknown,
        },
        "/assign" => {
            let event_id = words.next().and_then(|id| id.parse().ok());
            let role = words.next().map(str::to_string);
            let member = words.next().map(str::to_string);
            match (event_id, role, member) {
                (Some(event_id), Some(role), Some(member)) => {
                    Command::Assign { event_id, role, member }
                }
                _ => Command::Unknown,
            }
        }
        _ => Command::Unknown,
    }
}

/// Execute one command for an owner. Runs under the owner's coordinator lock.
pub async fn handle_command(
    coordinator: &DialogCoordinator,
    owner: &str,
    text: &str,
) -> Vec<OutboundDirective> {
    match parse(text) {
        Command::Start => vec![OutboundDirective::text(MsgKey::Welcome)],
        Command::Help => vec![OutboundDirective::text(MsgKey::Help)],
        Command::NewEvent => coordinator.start_event_wizard(owner).await,
        Command::EditSong(id) => coordinator.start_song_edit(owner, id).await,
        Command::Chords(id) => coordinator.start_chord_entry(owner, id).await,
        Command::Rename(id) => coordinator.start_rename(owner, id).await,
        Command::Events => {
            let events = coordinator.store().list_events().await;
            if events.is_empty() {
                return vec![OutboundDirective::text(MsgKey::EventsEmpty)];
            }
            let lines = events
                .iter()
                .map(|e| {
                    format!(
                        "#{} {} — {} {} @ {}",
                        e.id,
                        e.title,
                        e.date.format("%d/%m/%Y"),
                        e.time.format("%H:%M"),
                        e.location
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            vec![OutboundDirective::text(MsgText::with_args(
                MsgKey::EventsList,
                vec![MsgArg::text(lines)],
            ))]
        }
        Command::Songs => {
            let songs = coordinator.store().list_songs().await;
            if songs.is_empty() {
                return vec![OutboundDirective::text(MsgKey::SongsEmpty)];
            }
            let lines = songs
                .iter()
                .map(|s| {
                    let mut line = format!("#{} {}", s.id, s.title);
                    if let Some(artist) = &s.artist {
                        line.push_str(&format!(" — {artist}"));
                    }
                    if let Some(key) = &s.key {
                        line.push_str(&format!(" ({key})"));
                    }
                    line
                })
                .collect::<Vec<_>>()
                .join("\n");
            vec![OutboundDirective::text(MsgText::with_args(
                MsgKey::SongsList,
                vec![MsgArg::text(lines)],
            ))]
        }
        Command::AddSong(title) => {
            let song = coordinator.store().add_song(&title).await;
            vec![OutboundDirective::text(MsgText::with_args(
                MsgKey::SongAdded,
                vec![MsgArg::text(song.title), MsgArg::text(song.id.to_string())],
            ))]
        }
        Command::Assign { event_id, role, member } => {
            match coordinator.store().assign_role(event_id, &role, &member).await {
                Ok(()) => vec![OutboundDirective::text(MsgKey::EditSaved)],
                Err(_) => vec![OutboundDirective::text(MsgText::with_args(
                    MsgKey::EventMissing,
                    vec![MsgArg::text(event_id.to_string())],
                ))],
            }
        }
        Command::Unknown => vec![OutboundDirective::text(MsgKey::UnknownCommand)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_commands() {
        assert_eq!(parse("/start"), Command::Start);
        assert_eq!(parse("/HELP"), Command::Help);
        assert_eq!(parse("  /newevent  "), Command::NewEvent);
    }

    #[test]
    fn parse_commands_with_arguments() {
        assert_eq!(parse("/addsong Amazing Grace"), Command::AddSong("Amazing Grace".into()));
        assert_eq!(parse("/song 3"), Command::EditSong(3));
        assert_eq!(parse("/chords 7"), Command::Chords(7));
        assert_eq!(parse("/rename 2"), Command::Rename(2));
        assert_eq!(
            parse("/assign 1 drums andrei"),
            Command::Assign { event_id: 1, role: "drums".into(), member: "andrei".into() }
        );
    }

    #[test]
    fn parse_rejects_malformed_arguments() {
        assert_eq!(parse("/song"), Command::Unknown);
        assert_eq!(parse("/song seven"), Command::Unknown);
        assert_eq!(parse("/addsong"), Command::Unknown);
        assert_eq!(parse("/assign 1 drums"), Command::Unknown);
        assert_eq!(parse("just chatting"), Command::Unknown);
        assert_eq!(parse(""), Command::Unknown);
    }
}
