//! Discord channel message sender.
//!
//! Posts a message, optionally with file attachments, to a channel via
//! the Discord REST API. Works with bot tokens and user tokens.

pub mod client;
pub mod types;

pub use client::{Client, Error};
pub use types::{Attachment, Credentials, Identity, MessagePayload, MessageResponse};
