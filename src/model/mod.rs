//! Core data model: addresses, mailboxes, folders and work-item messages.

pub mod address;
pub mod mailbox;
pub mod message;
