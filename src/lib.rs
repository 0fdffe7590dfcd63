//! `gtdmail`: a GTD workflow engine over cloud-synced Maildir mailboxes.
//!
//! Work items are `.eml` messages carrying `X-GTD-*` headers. They live in
//! per-address mailboxes under `Organization/` and `People/`, and move from
//! `new/` through clarification into dot-prefixed GTD folders.

pub mod compose;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod mailbox;
pub mod model;
pub mod parser;
pub mod service;
pub mod store;
pub mod workflow;
