// ABOUTME: Consultation session record and chat turn types
// ABOUTME: A consultation stores the whole ordered turn list of one client session
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

use serde::{Deserialize, Serialize};

/// Author of a chat turn; system prompts are never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// The patient
    User,
    /// The AI assistant
    Assistant,
}

impl TurnRole {
    /// Parse a role string from a client payload
    #[must_use]
    pub fn parse(role: &str) -> Option<Self> {
        match role {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }

    /// Wire name of the role
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One message of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Author
    pub role: TurnRole,
    /// Message text
    pub content: String,
}

impl ChatTurn {
    /// Create a patient turn
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Database representation of a consultation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    /// Row ID
    pub id: String,
    /// Owner; `None` for rows created before ownership was recorded
    pub user_id: Option<String>,
    /// Client-generated session identifier (globally unique)
    pub session_id: String,
    /// Language code the session was held in
    pub language: String,
    /// Ordered turns, user and assistant interleaved
    pub messages: Vec<ChatTurn>,
    /// When the session was first saved (RFC 3339)
    pub created_at: String,
    /// When the session was last saved (RFC 3339)
    pub updated_at: String,
}
