//! Discord API types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which kind of account a token belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Identity {
    /// Sent as `Authorization: Bot <token>`.
    #[default]
    Bot,
    /// Sent as the bare token.
    User,
}

/// Token plus the identity it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub identity: Identity,
}

impl Credentials {
    /// `Authorization` header value for this identity.
    pub fn header_value(&self) -> String {
        match self.identity {
            Identity::Bot => format!("Bot {}", self.token),
            Identity::User => self.token.clone(),
        }
    }
}

/// A message to post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePayload {
    pub content: String,
    /// Local files to attach.
    pub attachments: Vec<PathBuf>,
}

/// JSON body of a create-message request.
#[derive(Debug, Serialize)]
pub(crate) struct CreateMessage<'a> {
    pub content: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentSlot<'a>>,
}

/// Attachment metadata matching a `files[n]` multipart part.
#[derive(Debug, Serialize)]
pub(crate) struct AttachmentSlot<'a> {
    pub id: usize,
    pub filename: &'a str,
}

/// Response to a created message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageResponse {
    pub id: String,
    pub channel_id: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// An uploaded attachment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_value_per_identity() {
        let bot = Credentials {
            token: "abc".into(),
            identity: Identity::Bot,
        };
        let user = Credentials {
            token: "abc".into(),
            identity: Identity::User,
        };
        assert_eq!(bot.header_value(), "Bot abc");
        assert_eq!(user.header_value(), "abc");
    }

    #[test]
    fn create_message_omits_empty_attachments() {
        let body = CreateMessage {
            content: "hi",
            attachments: Vec::new(),
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"content":"hi"}"#);
    }

    #[test]
    fn identity_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Identity::User).unwrap(), r#""user""#);
        let parsed: Identity = serde_json::from_str(r#""bot""#).unwrap();
        assert_eq!(parsed, Identity::Bot);
    }
}
