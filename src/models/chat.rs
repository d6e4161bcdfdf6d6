//! Machine-generated chat lines.
//!
//! The chat UI recognises workflow references posted as `"{type}/{id}"`
//! and renders them as cards. The prefixes below are shared with the UI and
//! must not change.

use serde::{Deserialize, Serialize};
use std::fmt;

const AGREEMENT_PREFIX: &str = "agreement";
const CALENDAR_PREFIX: &str = "calendar";
const RESCHEDULE_PREFIX: &str = "reschedule";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReference {
    /// A training agreement document.
    Agreement(String),
    /// A trainer's calendar, keyed by trainer id.
    Calendar(String),
    /// A pending reschedule request.
    Reschedule(String),
}

impl ChatReference {
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Parse a chat line back into a reference. Returns `None` for plain text.
    pub fn parse(text: &str) -> Option<ChatReference> {
        let (kind, id) = text.split_once('/')?;
        if id.is_empty() {
            return None;
        }

        match kind {
            AGREEMENT_PREFIX => Some(ChatReference::Agreement(id.to_string())),
            CALENDAR_PREFIX => Some(ChatReference::Calendar(id.to_string())),
            RESCHEDULE_PREFIX => Some(ChatReference::Reschedule(id.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for ChatReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatReference::Agreement(id) => write!(f, "{}/{}", AGREEMENT_PREFIX, id),
            ChatReference::Calendar(id) => write!(f, "{}/{}", CALENDAR_PREFIX, id),
            ChatReference::Reschedule(id) => write!(f, "{}/{}", RESCHEDULE_PREFIX, id),
        }
    }
}

// A system line posted into a trainer/client conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub chat_id: String,
    pub sender_id: String,
    pub text: String,
}

impl ChatMessage {
    pub fn new(chat_id: &str, sender_id: &str, text: &str) -> Self {
        Self {
            chat_id: chat_id.to_string(),
            sender_id: sender_id.to_string(),
            text: text.to_string(),
        }
    }

    pub fn reference(&self) -> Option<ChatReference> {
        ChatReference::parse(&self.text)
    }
}
