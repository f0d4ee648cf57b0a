//! Meeting session state machine.
//!
//! Tracks the active meeting through recording, upload, notes and chat, and
//! mirrors the remote processing lifecycle in a single [`Session`] record.

pub mod controller;
pub mod naming;
pub mod outcome;
pub mod state;
pub mod timer;
pub mod view;

pub use controller::SessionController;
pub use naming::{DefaultName, FixedName, MeetingNamer};
pub use outcome::{Outcome, Rejection};
pub use state::{CandidateFile, ChatEntry, ChatRole, Operation, Phase, Session};
pub use timer::{RecordingTimer, TimerReading};
pub use view::{ChatLine, SessionView};
