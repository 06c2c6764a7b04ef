//! Step graph definitions.
//!
//! One step enum per dialog kind, each with a static spec table (accepted
//! input modality, back availability) and an explicit forward-target table.
//! The tables are configuration data: authored here, never mutated, and
//! audited by the tests at the bottom ("every step has an exit", "the terminal
//! step is reachable").
//!
//! Cancel is accepted from every step of every kind and is therefore not part
//! of the per-step tables.

use serde::{Deserialize, Serialize};

/// Which step graph a session is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DialogKind {
    EventWizard,
    SongEdit,
    ChordEntry,
    RenameEvent,
}

impl DialogKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EventWizard => "event-wizard",
            Self::SongEdit => "song-edit",
            Self::ChordEntry => "chord-entry",
            Self::RenameEvent => "rename-event",
        }
    }
}

/// Input modality a step accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Callback,
    Text,
    Both,
}

impl Modality {
    pub const fn accepts_callback(self) -> bool {
        matches!(self, Self::Callback | Self::Both)
    }

    pub const fn accepts_text(self) -> bool {
        matches!(self, Self::Text | Self::Both)
    }
}

/// Static description of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSpec {
    pub modality: Modality,
    pub allows_back: bool,
}

/// Steps of the event wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStep {
    Template,
    Date,
    Time,
    Location,
    Songs,
    Confirm,
}

impl WizardStep {
    pub const fn spec(self) -> StepSpec {
        match self {
            // Template takes text after the "custom" button arms title entry
            Self::Template => StepSpec { modality: Modality::Both, allows_back: false },
            Self::Date => StepSpec { modality: Modality::Both, allows_back: true },
            Self::Time => StepSpec { modality: Modality::Both, allows_back: true },
            Self::Location => StepSpec { modality: Modality::Both, allows_back: true },
            Self::Songs => StepSpec { modality: Modality::Both, allows_back: true },
            Self::Confirm => StepSpec { modality: Modality::Callback, allows_back: true },
        }
    }

    /// Forward transitions (excluding back/cancel). `Confirm -> Template` is
    /// the "edit" full restart; the commit exit is the terminal transition.
    pub const fn forward_targets(self) -> &'static [WizardStep] {
        match self {
            Self::Template => &[Self::Date],
            Self::Date => &[Self::Time],
            Self::Time => &[Self::Location],
            Self::Location => &[Self::Songs],
            Self::Songs => &[Self::Confirm],
            Self::Confirm => &[Self::Template],
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::Date => "date",
            Self::Time => "time",
            Self::Location => "location",
            Self::Songs => "songs",
            Self::Confirm => "confirm",
        }
    }

    pub const ALL: &'static [WizardStep] = &[
        Self::Template,
        Self::Date,
        Self::Time,
        Self::Location,
        Self::Songs,
        Self::Confirm,
    ];
}

/// Steps of the pick-a-field-then-a-value dialogs (song edit, event rename).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditStep {
    Field,
    Value,
    Confirm,
}

impl EditStep {
    pub const fn spec(self) -> StepSpec {
        match self {
            Self::Field => StepSpec { modality: Modality::Callback, allows_back: false },
            Self::Value => StepSpec { modality: Modality::Text, allows_back: true },
            Self::Confirm => StepSpec { modality: Modality::Callback, allows_back: true },
        }
    }

    pub const fn forward_targets(self) -> &'static [EditStep] {
        match self {
            Self::Field => &[Self::Value],
            Self::Value => &[Self::Confirm],
            Self::Confirm => &[Self::Field],
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Field => "field",
            Self::Value => "value",
            Self::Confirm => "confirm",
        }
    }

    pub const ALL: &'static [EditStep] = &[Self::Field, Self::Value, Self::Confirm];
}

/// Steps of the chord-chart entry dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChordStep {
    Chart,
    Confirm,
}

impl ChordStep {
    pub const fn spec(self) -> StepSpec {
        match self {
            Self::Chart => StepSpec { modality: Modality::Text, allows_back: false },
            Self::Confirm => StepSpec { modality: Modality::Callback, allows_back: true },
        }
    }

    pub const fn forward_targets(self) -> &'static [ChordStep] {
        match self {
            Self::Chart => &[Self::Confirm],
            Self::Confirm => &[Self::Chart],
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chart => "chart",
            Self::Confirm => "confirm",
        }
    }

    pub const ALL: &'static [ChordStep] = &[Self::Chart, Self::Confirm];
}
