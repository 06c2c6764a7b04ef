//! The conversational workflow engine.
//!
//! One chat participant walks through a multi-step, branching dialog where
//! each step is satisfied by a button press or by free text, steps can be
//! revisited with "back", abandoned with "cancel", or silently expire. Many
//! independent step graphs (event wizard, song editing, chord entry, event
//! renaming) share the same session mechanism.
//!
//! ```text
//! InboundEvent → classifier ─┬→ cancel teardown
//!                            ├→ step executor → session store → directives
//!                            └→ non-dialog (commands, RSVP, stale tokens)
//! ```

pub mod classifier;
pub mod coordinator;
pub mod flows;
pub mod graph;
pub mod outbound;
pub mod session;
pub mod token;

pub use classifier::{classify, DialogInput, NonDialogInput, Route};
pub use coordinator::DialogCoordinator;
pub use flows::{DialogFlow, StepOutcome, Termination};
pub use graph::{DialogKind, Modality, StepSpec};
pub use outbound::{Button, Keyboard, Label, OutboundDirective, OutboundSink};
pub use session::{DialogState, OwnerId, Session, SessionStore, SESSION_TTL_SECS};
pub use token::{ActionToken, ConfirmAction, EventTemplate, NavAction};
