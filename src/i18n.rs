//! Message catalogs.
//!
//! The dialog engine emits typed message keys plus arguments; only this module
//! turns them into user-facing text. Engine logic never branches on rendered
//! strings, so adding a language is purely additive here.

use serde::{Deserialize, Serialize};

/// Every user-facing message the bot can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MsgKey {
    // Global
    Welcome,
    Help,
    UnknownCommand,
    NotUnderstood,
    Cancelled,
    NothingToCancel,
    SessionExpired,

    // Event wizard
    WizardTemplate,
    WizardTitlePrompt,
    WizardDate,
    WizardDatePrompt,
    WizardInvalidDate,
    WizardTime,
    WizardInvalidTime,
    WizardLocation,
    WizardSongs,
    WizardSongAdded,
    WizardSongGone,
    WizardSummary,
    WizardCommitted,
    CommitFailed,
    EventAnnouncement,

    // Song edit / chord entry / rename
    EditChooseField,
    EditValuePrompt,
    EditSummary,
    EditSaved,
    ChordPrompt,
    ChordSummary,
    ChordSaved,
    RenameChooseField,
    SongMissing,
    EventMissing,

    // Lists
    EventsList,
    EventsEmpty,
    SongsList,
    SongsEmpty,
    SongAdded,

    // RSVP
    RsvpRecorded,
    RsvpEventGone,

    // Field names (used as arguments and button labels)
    FieldTitle,
    FieldArtist,
    FieldKey,
    FieldLocation,

    // Buttons
    BtnBack,
    BtnCancel,
    BtnDone,
    BtnSkip,
    BtnConfirm,
    BtnEdit,
    BtnCustom,
    BtnTemplateSunday,
    BtnTemplateRehearsal,
    BtnTemplateYouth,
    BtnYes,
    BtnNo,
    BtnMaybe,
}

/// One argument of a localizable message.
///
/// Arguments are either raw data (song titles, dates) or message keys that
/// themselves localize (field names, RSVP choices).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MsgArg {
    Text(String),
    Key(MsgKey),
}

impl MsgArg {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

/// A message key plus its positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsgText {
    pub key: MsgKey,
    pub args: Vec<MsgArg>,
}

impl MsgText {
    pub fn new(key: MsgKey) -> Self {
        Self { key, args: Vec::new() }
    }

    pub fn with_args(key: MsgKey, args: Vec<MsgArg>) -> Self {
        Self { key, args }
    }
}

impl From<MsgKey> for MsgText {
    fn from(key: MsgKey) -> Self {
        Self::new(key)
    }
}

/// Resolves message keys for a fixed language tag.
#[derive(Debug, Clone)]
pub struct Localizer {
    lang: Lang,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lang {
    En,
    Ro,
}

impl Localizer {
    /// Create a localizer for a language tag. Unknown tags fall back to English.
    pub fn new(lang_tag: &str) -> Self {
        let lang = match lang_tag {
            "ro" => Lang::Ro,
            _ => Lang::En,
        };
        Self { lang }
    }

    /// Render a message: template lookup plus `{0}`/`{1}`... substitution.
    pub fn render(&self, text: &MsgText) -> String {
        let mut out = template(self.lang, text.key).to_string();
        for (i, arg) in text.args.iter().enumerate() {
            let value = match arg {
                MsgArg::Text(s) => s.clone(),
                MsgArg::Key(key) => template(self.lang, *key).to_string(),
            };
            out = out.replace(&format!("{{{i}}}"), &value);
        }
        out
    }
}

fn template(lang: Lang, key: MsgKey) -> &'static str {
    match lang {
        Lang::En => template_en(key),
        Lang::Ro => template_ro(key),
    }
}

#[allow(clippy::too_many_lines)]
fn template_en(key: MsgKey) -> &'static str {
    match key {
        MsgKey::Welcome => "Hi! I help plan services, rehearsals and setlists. Send /help to see what I can do.",
        MsgKey::Help => "Commands:\n/newevent – plan a new event\n/events – upcoming events\n/songs – song library\n/addsong <title> – add a song\n/song <id> – edit a song\n/chords <id> – enter a chord chart\n/rename <event id> – rename an event\n/assign <event id> <role> <member> – assign a role\n/cancel – abandon the current dialog",
        MsgKey::UnknownCommand => "I don't know that command. Send /help for the list.",
        MsgKey::NotUnderstood => "I didn't understand that.",
        MsgKey::Cancelled => "Okay, cancelled.",
        MsgKey::NothingToCancel => "Nothing in progress to cancel.",
        MsgKey::SessionExpired => "That menu has expired. Start again from the command, e.g. /newevent.",

        MsgKey::WizardTemplate => "What kind of event are we planning?",
        MsgKey::WizardTitlePrompt => "Send a title for the event.",
        MsgKey::WizardDate => "Pick a date, or choose Custom to type one.",
        MsgKey::WizardDatePrompt => "Send the date as DD/MM/YYYY.",
        MsgKey::WizardInvalidDate => "\"{0}\" is not a valid date. Use DD/MM/YYYY.",
        MsgKey::WizardTime => "Pick a time, or send one as HH:MM (24h).",
        MsgKey::WizardInvalidTime => "\"{0}\" is not a valid time. Use HH:MM (24h).",
        MsgKey::WizardLocation => "Where will it be? Pick one or send a location.",
        MsgKey::WizardSongs => "Toggle songs for the setlist ({0} selected), or send a title to add a new song.",
        MsgKey::WizardSongAdded => "Added \"{0}\" to the library and the setlist.",
        MsgKey::WizardSongGone => "That song was deleted in the meantime.",
        MsgKey::WizardSummary => "{0}\n📅 {1}  🕒 {2}\n📍 {3}\n🎵 {4} songs\n\nCreate this event?",
        MsgKey::WizardCommitted => "Event created.",
        MsgKey::CommitFailed => "Could not save: {0}\nPress Confirm to try again.",
        MsgKey::EventAnnouncement => "{0}\n📅 {1}  🕒 {2}\n📍 {3}\n\nCan you make it?",

        MsgKey::EditChooseField => "\"{0}\" – what do you want to change?",
        MsgKey::EditValuePrompt => "Send the new {0}.",
        MsgKey::EditSummary => "Set {0} of \"{1}\" to \"{2}\"?",
        MsgKey::EditSaved => "Saved.",
        MsgKey::ChordPrompt => "Send the chord chart for \"{0}\". Line breaks are kept.",
        MsgKey::ChordSummary => "Save this chart for \"{0}\"?\n\n{1}",
        MsgKey::ChordSaved => "Chart saved.",
        MsgKey::RenameChooseField => "\"{0}\" – what do you want to rename?",
        MsgKey::SongMissing => "Song {0} doesn't exist.",
        MsgKey::EventMissing => "Event {0} doesn't exist.",

        MsgKey::EventsList => "Upcoming events:\n{0}",
        MsgKey::EventsEmpty => "No events planned yet. Start one with /newevent.",
        MsgKey::SongsList => "Song library:\n{0}",
        MsgKey::SongsEmpty => "The song library is empty. Add one with /addsong <title>.",
        MsgKey::SongAdded => "Added \"{0}\" as song #{1}.",

        MsgKey::RsvpRecorded => "Marked you as \"{0}\".",
        MsgKey::RsvpEventGone => "That event no longer exists.",

        MsgKey::FieldTitle => "title",
        MsgKey::FieldArtist => "artist",
        MsgKey::FieldKey => "key",
        MsgKey::FieldLocation => "location",

        MsgKey::BtnBack => "« Back",
        MsgKey::BtnCancel => "Cancel",
        MsgKey::BtnDone => "Done",
        MsgKey::BtnSkip => "Skip",
        MsgKey::BtnConfirm => "✅ Confirm",
        MsgKey::BtnEdit => "✏️ Edit",
        MsgKey::BtnCustom => "Custom…",
        MsgKey::BtnTemplateSunday => "Sunday service",
        MsgKey::BtnTemplateRehearsal => "Rehearsal",
        MsgKey::BtnTemplateYouth => "Youth evening",
        MsgKey::BtnYes => "I'm in",
        MsgKey::BtnNo => "Can't make it",
        MsgKey::BtnMaybe => "Maybe",
    }
}

#[allow(clippy::too_many_lines)]
fn template_ro(key: MsgKey) -> &'static str {
    match key {
        MsgKey::Welcome => "Salut! Te ajut să planifici servicii, repetiții și liste de cântări. Trimite /help pentru comenzi.",
        MsgKey::Help => "Comenzi:\n/newevent – planifică un eveniment\n/events – evenimente viitoare\n/songs – biblioteca de cântări\n/addsong <titlu> – adaugă o cântare\n/song <id> – editează o cântare\n/chords <id> – introdu acordurile\n/rename <id eveniment> – redenumește un eveniment\n/assign <id eveniment> <rol> <membru> – atribuie un rol\n/cancel – abandonează dialogul curent",
        MsgKey::UnknownCommand => "Nu cunosc comanda. Trimite /help pentru listă.",
        MsgKey::NotUnderstood => "Nu am înțeles.",
        MsgKey::Cancelled => "Bine, am anulat.",
        MsgKey::NothingToCancel => "Nu este nimic de anulat.",
        MsgKey::SessionExpired => "Meniul a expirat. Pornește din nou de la comandă, de ex. /newevent.",

        MsgKey::WizardTemplate => "Ce fel de eveniment planificăm?",
        MsgKey::WizardTitlePrompt => "Trimite un titlu pentru eveniment.",
        MsgKey::WizardDate => "Alege o dată sau apasă Personalizat ca să o scrii.",
        MsgKey::WizardDatePrompt => "Trimite data în formatul ZZ/LL/AAAA.",
        MsgKey::WizardInvalidDate => "\"{0}\" nu este o dată validă. Folosește ZZ/LL/AAAA.",
        MsgKey::WizardTime => "Alege o oră sau trimite una ca HH:MM.",
        MsgKey::WizardInvalidTime => "\"{0}\" nu este o oră validă. Folosește HH:MM.",
        MsgKey::WizardLocation => "Unde va avea loc? Alege sau trimite o locație.",
        MsgKey::WizardSongs => "Bifează cântările pentru listă ({0} selectate) sau trimite un titlu nou.",
        MsgKey::WizardSongAdded => "Am adăugat \"{0}\" în bibliotecă și în listă.",
        MsgKey::WizardSongGone => "Cântarea a fost ștearsă între timp.",
        MsgKey::WizardSummary => "{0}\n📅 {1}  🕒 {2}\n📍 {3}\n🎵 {4} cântări\n\nCreăm evenimentul?",
        MsgKey::WizardCommitted => "Eveniment creat.",
        MsgKey::CommitFailed => "Nu am putut salva: {0}\nApasă Confirmă pentru a reîncerca.",
        MsgKey::EventAnnouncement => "{0}\n📅 {1}  🕒 {2}\n📍 {3}\n\nPoți ajunge?",

        MsgKey::EditChooseField => "\"{0}\" – ce vrei să schimbi?",
        MsgKey::EditValuePrompt => "Trimite noul {0}.",
        MsgKey::EditSummary => "Setăm {0} pentru \"{1}\" la \"{2}\"?",
        MsgKey::EditSaved => "Salvat.",
        MsgKey::ChordPrompt => "Trimite acordurile pentru \"{0}\". Rândurile se păstrează.",
        MsgKey::ChordSummary => "Salvăm acordurile pentru \"{0}\"?\n\n{1}",
        MsgKey::ChordSaved => "Acorduri salvate.",
        MsgKey::RenameChooseField => "\"{0}\" – ce vrei să redenumești?",
        MsgKey::SongMissing => "Cântarea {0} nu există.",
        MsgKey::EventMissing => "Evenimentul {0} nu există.",

        MsgKey::EventsList => "Evenimente viitoare:\n{0}",
        MsgKey::EventsEmpty => "Niciun eveniment planificat. Pornește unul cu /newevent.",
        MsgKey::SongsList => "Biblioteca de cântări:\n{0}",
        MsgKey::SongsEmpty => "Biblioteca este goală. Adaugă o cântare cu /addsong <titlu>.",
        MsgKey::SongAdded => "Am adăugat \"{0}\" ca #{1}.",

        MsgKey::RsvpRecorded => "Te-am notat cu \"{0}\".",
        MsgKey::RsvpEventGone => "Evenimentul nu mai există.",

        MsgKey::FieldTitle => "titlul",
        MsgKey::FieldArtist => "artistul",
        MsgKey::FieldKey => "tonalitatea",
        MsgKey::FieldLocation => "locația",

        MsgKey::BtnBack => "« Înapoi",
        MsgKey::BtnCancel => "Anulează",
        MsgKey::BtnDone => "Gata",
        MsgKey::BtnSkip => "Sari peste",
        MsgKey::BtnConfirm => "✅ Confirmă",
        MsgKey::BtnEdit => "✏️ Modifică",
        MsgKey::BtnCustom => "Personalizat…",
        MsgKey::BtnTemplateSunday => "Serviciu duminical",
        MsgKey::BtnTemplateRehearsal => "Repetiție",
        MsgKey::BtnTemplateYouth => "Seară de tineret",
        MsgKey::BtnYes => "Vin",
        MsgKey::BtnNo => "Nu pot",
        MsgKey::BtnMaybe => "Poate",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_positional_args() {
        let loc = Localizer::new("en");
        let text = MsgText::with_args(
            MsgKey::WizardInvalidDate,
            vec![MsgArg::text("31/02/2025")],
        );
        assert_eq!(
            loc.render(&text),
            "\"31/02/2025\" is not a valid date. Use DD/MM/YYYY."
        );
    }

    #[test]
    fn render_resolves_key_args() {
        let loc = Localizer::new("en");
        let text = MsgText::with_args(
            MsgKey::EditValuePrompt,
            vec![MsgArg::Key(MsgKey::FieldArtist)],
        );
        assert_eq!(loc.render(&text), "Send the new artist.");
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        let loc = Localizer::new("de");
        assert_eq!(loc.render(&MsgText::new(MsgKey::Cancelled)), "Okay, cancelled.");
    }

    #[test]
    fn romanian_catalog_is_wired() {
        let loc = Localizer::new("ro");
        assert_eq!(loc.render(&MsgText::new(MsgKey::Cancelled)), "Bine, am anulat.");
    }
}
