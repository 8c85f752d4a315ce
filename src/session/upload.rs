use super::{Notification, ValidationError};
use crate::api::{file_extension, ApiClient, ApiError, UploadOutput, UploadRequest};
use bytes::Bytes;
use std::path::Path;
use tracing::{info, warn};

/// File types the backend knows how to ingest. Only a hint for the
/// front-end; nothing here refuses other files.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["pdf", "txt", "md"];

const SUCCESS_MS: u64 = 5000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        Ok(Self {
            file_name,
            bytes: Bytes::from(bytes),
        })
    }

    pub fn is_accepted_extension(&self) -> bool {
        ACCEPTED_EXTENSIONS.contains(&file_extension(&self.file_name).as_str())
    }
}

/// The user's not-yet-submitted upload. An empty or whitespace-only title
/// counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadDraft {
    pub file: Option<UploadFile>,
    pub title: String,
}

impl UploadDraft {
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.file.is_some(), self.has_title()) {
            (true, true) => Ok(()),
            (false, true) => Err(ValidationError::MissingFile),
            (true, false) => Err(ValidationError::MissingTitle),
            (false, false) => Err(ValidationError::MissingFileAndTitle),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Editing,
    Submitting { ticket: u64 },
}

/// Handle for the upload in flight. Not `Clone`; consumed by
/// [`UploadSubmission::complete`].
#[derive(Debug)]
pub struct UploadTicket {
    id: u64,
    request: UploadRequest,
}

impl UploadTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn request(&self) -> &UploadRequest {
        &self.request
    }
}

/// Upload form state: `Editing -> Submitting -> Editing`.
#[derive(Debug)]
pub struct UploadSubmission {
    draft: UploadDraft,
    state: UploadState,
    next_ticket: u64,
}

impl Default for UploadSubmission {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadSubmission {
    pub fn new() -> Self {
        Self {
            draft: UploadDraft::default(),
            state: UploadState::Editing,
            next_ticket: 0,
        }
    }

    pub fn draft(&self) -> &UploadDraft {
        &self.draft
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, UploadState::Submitting { .. })
    }

    /// Replace the chosen file.
    pub fn select_file(&mut self, file: UploadFile) {
        if !file.is_accepted_extension() {
            warn!(file_name = %file.file_name, "File type is not one the backend advertises");
        }
        self.draft.file = Some(file);
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.draft.title = title.into();
    }

    /// Validate the draft and move to `Submitting`. On refusal the
    /// returned warning should be shown and no request sent.
    pub fn begin_submit(&mut self) -> Result<UploadTicket, Notification> {
        if self.is_in_flight() {
            warn!("Upload refused, another upload is in progress");
            return Err(Notification::warning(
                "Upload In Progress",
                "アップロード中です。完了までお待ちください。",
            ));
        }
        if let Err(e) = self.draft.validate() {
            warn!("Upload refused: {}", e);
            return Err(e.to_notification());
        }
        let (Some(file), title) = (&self.draft.file, &self.draft.title) else {
            return Err(ValidationError::MissingFile.to_notification());
        };

        self.next_ticket += 1;
        let id = self.next_ticket;
        self.state = UploadState::Submitting { ticket: id };
        info!(ticket = id, file_name = %file.file_name, bytes = file.bytes.len(), "Upload started");

        Ok(UploadTicket {
            id,
            request: UploadRequest {
                file_name: file.file_name.clone(),
                bytes: file.bytes.clone(),
                title: title.clone(),
            },
        })
    }

    /// Apply the outcome of the upload behind `ticket`. The draft is
    /// cleared on success and kept on failure so the user can retry.
    pub fn complete(
        &mut self,
        ticket: UploadTicket,
        result: Result<UploadOutput, ApiError>,
    ) -> Option<Notification> {
        if self.state != (UploadState::Submitting { ticket: ticket.id }) {
            warn!(ticket = ticket.id, "Dropping result for an upload that is not pending");
            return None;
        }
        self.state = UploadState::Editing;

        match result {
            Ok(output) => {
                info!(
                    ticket = ticket.id,
                    processed_pages = output.processed_pages,
                    "Upload finished"
                );
                self.draft = UploadDraft::default();
                Some(
                    Notification::success(
                        "Upload Successful",
                        format!(
                            "{} ページをデータベースに登録しました。",
                            output.processed_pages
                        ),
                    )
                    .with_duration_ms(SUCCESS_MS),
                )
            }
            Err(e) => {
                warn!(ticket = ticket.id, error = %e, "Upload failed");
                Some(Notification::error(
                    "Upload Failed",
                    "サーバーエラーが発生しました。",
                ))
            }
        }
    }

    /// Validate, send and apply in one go.
    pub async fn submit(&mut self, client: &ApiClient) -> Option<Notification> {
        match self.begin_submit() {
            Ok(ticket) => {
                let result = client.upload(ticket.request()).await;
                self.complete(ticket, result)
            }
            Err(notification) => Some(notification),
        }
    }
}
