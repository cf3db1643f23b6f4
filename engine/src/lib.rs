//! Agent Loop, Event Stream, and Notes/Scratchpad store (spec.md §4.G,
//! §4.H, §4.I) — the piece that drives provider<->tool turn cycles over
//! the primitives `forge-tools` and `forge-context` already provide.

pub mod agent_loop;
pub mod error;
pub mod event_stream;
pub mod notes;
pub mod testing;

pub use agent_loop::{AgentLoop, DisabledTools};
pub use error::AgentError;
pub use event_stream::EventStream;
pub use notes::{Note, NoteStore};
