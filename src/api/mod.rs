pub mod client;

pub use client::ApiClient;

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::time::Duration;

/// Body of `POST /chat/`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatInput {
    pub questions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SourceItem {
    #[serde(default)]
    pub title: Option<String>,
    pub url: String,
    #[serde(default, deserialize_with = "lenient_page")]
    pub page: Option<u32>,
}

/// A page that is not a whole number in `u32` range becomes `None`
/// instead of failing the whole response.
fn lenient_page<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let page = match value {
        Some(serde_json::Value::Number(n)) => match n.as_u64() {
            Some(v) => u32::try_from(v).ok(),
            None => n
                .as_f64()
                .filter(|f| f.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(f))
                .map(|f| f as u32),
        },
        _ => None,
    };
    Ok(page)
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AnswerItem {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub sources: Option<Vec<SourceItem>>,
}

/// Response of `POST /chat/`. The backend may send `null` or omit
/// `responses` entirely; both mean "no answer".
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ChatOutput {
    #[serde(default)]
    pub responses: Option<Vec<AnswerItem>>,
}

impl ChatOutput {
    /// Take the first answer, the only one a single-question request uses.
    pub fn into_first_answer(self) -> Option<AnswerItem> {
        self.responses.and_then(|r| r.into_iter().next())
    }
}

/// Response of `POST /upload`. Extra fields are ignored.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UploadOutput {
    pub processed_pages: u64,
}

/// Multipart payload for `POST /upload`.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    /// Shared with the draft, not copied.
    pub bytes: Bytes,
    pub title: String,
}

impl UploadRequest {
    pub fn mime_type(&self) -> &'static str {
        match file_extension(&self.file_name).as_str() {
            "pdf" => "application/pdf",
            "txt" => "text/plain",
            "md" | "markdown" => "text/markdown",
            _ => "application/octet-stream",
        }
    }
}

/// Lower-cased extension of a file name, empty when there is none.
pub fn file_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}
