//! Message decoding: `.eml` parser, header handling and Maildir filenames.

pub mod eml;
pub mod filename;
pub mod header;
