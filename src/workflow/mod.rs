//! GTD workflow engine: collect → clarify → organize.
//!
//! `clarifying` is a caller-side step, never a stored state. These functions
//! compute decisions and move plans; `service` turns them into storage calls.

pub mod clarify;
pub mod collect;
pub mod event;
pub mod organize;

pub use clarify::{clarify, Clarification, ClarifyDecision, Outcome};
pub use collect::{collect, InboxItem, InferredPriority, InferredStatus};
pub use event::WorkflowEvent;
pub use organize::{organize, ArchiveInstruction};
