pub mod chat;
pub mod upload;

pub use chat::{ChatState, ConversationSession, IgnoreReason, QuestionTicket, Submission};
pub use upload::{UploadDraft, UploadFile, UploadState, UploadSubmission, UploadTicket};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

/// A transient, dismissable alert for the user. Produced by the session
/// state machines, shown by whatever front-end drives them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub description: String,
    /// How long to keep it on screen; `None` leaves it to the front-end.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl Notification {
    fn new(severity: Severity, title: &str, description: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.to_string(),
            description: description.into(),
            duration_ms: None,
        }
    }

    pub fn success(title: &str, description: impl Into<String>) -> Self {
        Self::new(Severity::Success, title, description)
    }

    pub fn warning(title: &str, description: impl Into<String>) -> Self {
        Self::new(Severity::Warning, title, description)
    }

    pub fn error(title: &str, description: impl Into<String>) -> Self {
        Self::new(Severity::Error, title, description)
    }

    pub fn with_duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = Some(ms);
        self
    }
}

/// Local input problems caught before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("question is empty")]
    BlankQuestion,
    #[error("question is {len} characters, the limit is {max}")]
    QuestionTooLong { len: usize, max: usize },
    #[error("no file selected")]
    MissingFile,
    #[error("no title entered")]
    MissingTitle,
    #[error("no file selected and no title entered")]
    MissingFileAndTitle,
}

impl ValidationError {
    pub fn to_notification(&self) -> Notification {
        match self {
            ValidationError::BlankQuestion => {
                Notification::warning("Empty Question", "質問を入力してください。")
            }
            ValidationError::QuestionTooLong { max, .. } => Notification::warning(
                "Question Too Long",
                format!("質問は{}文字以内で入力してください。", max),
            ),
            ValidationError::MissingFile
            | ValidationError::MissingTitle
            | ValidationError::MissingFileAndTitle => Notification::warning(
                "Missing Information",
                "ファイルとタイトルを入力してください。",
            ),
        }
    }
}
