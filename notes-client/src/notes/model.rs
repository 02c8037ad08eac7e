use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub type NoteId = i64;

/// A note as confirmed by the gateway. Only notes with a server-assigned id
/// exist as `Note`; unsaved input lives in a [`Draft`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_link: Option<String>,
}

/// Trimmed, non-empty payload for the create and update calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteFields {
    pub title: String,
    pub content: String,
}

/// Form buffer for a note being composed or edited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub title: String,
    pub content: String,
}

impl Draft {
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
        }
    }

    pub fn validate(&self) -> Result<NoteFields> {
        let title = self.title.trim();
        let content = self.content.trim();
        if title.is_empty() || content.is_empty() {
            return Err(Error::validation("Please fill in both title and content"));
        }

        Ok(NoteFields {
            title: title.to_string(),
            content: content.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub share_link: String,
}
