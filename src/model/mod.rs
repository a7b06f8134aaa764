//! Core data model types: the message, its header and body, content
//! metadata and addresses.

pub mod address;
pub mod content;
pub mod header;
pub mod message;
