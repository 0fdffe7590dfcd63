//! Message construction: `.eml` encoding for outgoing work items.

pub mod eml;
