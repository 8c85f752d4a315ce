use crate::api::SourceItem;
use serde::{Deserialize, Serialize};

/// Label shown for a citation the backend left untitled.
pub const CITATION_PLACEHOLDER: &str = "Document";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub label: Option<String>,
    pub url: String,
    pub page: Option<u32>,
}

impl Citation {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(CITATION_PLACEHOLDER)
    }

    pub fn display_page(&self) -> String {
        self.page
            .map(|p| p.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

impl From<SourceItem> for Citation {
    fn from(source: SourceItem) -> Self {
        Self {
            label: source.title,
            url: source.url,
            page: source.page,
        }
    }
}

/// One turn of the conversation. Fields are private: an entry is never
/// changed once it is in a [`Transcript`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptEntry {
    role: Role,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    citations: Option<Vec<Citation>>,
}

impl TranscriptEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            citations: None,
        }
    }

    pub fn assistant(content: impl Into<String>, citations: Vec<Citation>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            citations: Some(citations),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// `None` for user entries, possibly empty for assistant entries.
    pub fn citations(&self) -> Option<&[Citation]> {
        self.citations.as_deref()
    }
}

/// Append-only conversation log in insertion order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, entry: TranscriptEntry) -> &TranscriptEntry {
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    /// True when the newest entry is a user question still waiting for its reply.
    pub fn has_unanswered_question(&self) -> bool {
        self.last().is_some_and(|e| e.role == Role::User)
    }
}
