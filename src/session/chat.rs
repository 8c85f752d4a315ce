use super::{Notification, ValidationError};
use crate::api::{ApiClient, ApiError, ChatOutput};
use crate::config::ClientConfig;
use crate::transcript::{Citation, Transcript, TranscriptEntry};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Assistant reply recorded when a question could not be answered.
pub const CHAT_ERROR_MESSAGE: &str = "エラーが発生しました。サーバーの状態を確認してください。";
const CONNECTION_ERROR_TITLE: &str = "Connection Error";
const CONNECTION_ERROR_DESCRIPTION: &str = "AIサーバーとの通信に失敗しました。";
const CONNECTION_ERROR_MS: u64 = 3000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    AwaitingResponse { ticket: u64, question: String },
}

/// Handle for the one outstanding question. Deliberately not `Clone`:
/// handing it back to [`ConversationSession::complete`] consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct QuestionTicket {
    session: Uuid,
    id: u64,
    question: String,
}

impl QuestionTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn question(&self) -> &str {
        &self.question
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Blank,
    InFlight,
}

/// Result of offering a question to the session.
#[derive(Debug)]
pub enum Submission {
    /// Accepted; the caller must send it and report back with the ticket.
    Sent(QuestionTicket),
    /// Silently dropped, nothing changed.
    Ignored(IgnoreReason),
    /// Refused with a warning, nothing appended and the input kept.
    Rejected(Notification),
}

/// Conversation state: the transcript plus the single-flight gate.
///
/// Transitions are `Idle -> AwaitingResponse -> Idle`. Every accepted
/// question gets exactly one assistant entry, either the backend's first
/// answer or [`CHAT_ERROR_MESSAGE`].
#[derive(Debug)]
pub struct ConversationSession {
    id: Uuid,
    greeting: String,
    max_question_chars: usize,
    transcript: Transcript,
    state: ChatState,
    input: String,
    next_ticket: u64,
}

impl ConversationSession {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            greeting: config.greeting.clone(),
            max_question_chars: config.max_question_chars,
            transcript: Transcript::new(),
            state: ChatState::Idle,
            input: String::new(),
            next_ticket: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, ChatState::AwaitingResponse { .. })
    }

    /// The question currently waiting for a reply, for a pending indicator.
    pub fn pending_question(&self) -> Option<&str> {
        match &self.state {
            ChatState::AwaitingResponse { question, .. } => Some(question),
            ChatState::Idle => None,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Add the greeting if nothing has been said yet. Safe to call on every
    /// render; the greeting appears once.
    pub fn activate(&mut self) {
        if self.transcript.is_empty() {
            self.transcript
                .push(TranscriptEntry::assistant(self.greeting.clone(), Vec::new()));
            debug!(session_id = %self.id, "Greeting added");
        }
    }

    /// Submit whatever is in the input box.
    pub fn submit_input(&mut self) -> Submission {
        let text = self.input.clone();
        self.submit_question(&text)
    }

    pub fn submit_question(&mut self, text: &str) -> Submission {
        if self.is_in_flight() {
            debug!(session_id = %self.id, "Question ignored, a reply is still pending");
            return Submission::Ignored(IgnoreReason::InFlight);
        }
        if text.trim().is_empty() {
            return Submission::Ignored(IgnoreReason::Blank);
        }
        let len = text.chars().count();
        if len > self.max_question_chars {
            let err = ValidationError::QuestionTooLong {
                len,
                max: self.max_question_chars,
            };
            warn!(session_id = %self.id, "Question rejected: {}", err);
            return Submission::Rejected(err.to_notification());
        }

        self.activate();
        self.transcript.push(TranscriptEntry::user(text));
        self.input.clear();

        self.next_ticket += 1;
        let id = self.next_ticket;
        self.state = ChatState::AwaitingResponse {
            ticket: id,
            question: text.to_string(),
        };
        info!(session_id = %self.id, ticket = id, "Question sent");

        Submission::Sent(QuestionTicket {
            session: self.id,
            id,
            question: text.to_string(),
        })
    }

    /// Apply the outcome of the request behind `ticket`. Returns the
    /// notification to show, if any. A ticket that is not the one being
    /// awaited changes nothing.
    pub fn complete(
        &mut self,
        ticket: QuestionTicket,
        result: Result<ChatOutput, ApiError>,
    ) -> Option<Notification> {
        if !self.is_awaiting(&ticket) {
            warn!(
                session_id = %self.id,
                ticket = ticket.id,
                "Dropping reply for a question that is not pending"
            );
            return None;
        }
        self.state = ChatState::Idle;

        match result.map(ChatOutput::into_first_answer) {
            Ok(Some(answer)) => {
                let citations: Vec<Citation> = answer
                    .sources
                    .unwrap_or_default()
                    .into_iter()
                    .map(Citation::from)
                    .collect();
                info!(
                    session_id = %self.id,
                    ticket = ticket.id,
                    citations = citations.len(),
                    "Answer received"
                );
                self.transcript
                    .push(TranscriptEntry::assistant(answer.answer, citations));
                None
            }
            Ok(None) => {
                warn!(session_id = %self.id, ticket = ticket.id, "Backend returned no answers");
                Some(self.record_failure())
            }
            Err(e) => {
                warn!(session_id = %self.id, ticket = ticket.id, error = %e, "Question failed");
                Some(self.record_failure())
            }
        }
    }

    /// Give up on the question behind `ticket` without a reply. The
    /// question still gets the canned assistant entry, and the session
    /// goes back to `Idle`.
    pub fn abandon(&mut self, ticket: QuestionTicket) -> Option<Notification> {
        if !self.is_awaiting(&ticket) {
            return None;
        }
        self.state = ChatState::Idle;
        warn!(session_id = %self.id, ticket = ticket.id, "Question abandoned before a reply");
        Some(self.record_failure())
    }

    /// Submit, send and apply in one go. Dropping the returned future
    /// before it finishes abandons the question.
    pub async fn ask(&mut self, client: &ApiClient, text: &str) -> Option<Notification> {
        match self.submit_question(text) {
            Submission::Sent(ticket) => {
                let question = ticket.question.clone();
                let mut pending = PendingReply {
                    session: self,
                    ticket: Some(ticket),
                };
                let result = client.chat(std::slice::from_ref(&question)).await;
                let ticket = pending.ticket.take()?;
                pending.session.complete(ticket, result)
            }
            Submission::Ignored(_) => None,
            Submission::Rejected(notification) => Some(notification),
        }
    }

    fn is_awaiting(&self, ticket: &QuestionTicket) -> bool {
        let awaited = match &self.state {
            ChatState::AwaitingResponse { ticket: id, .. } => *id == ticket.id,
            ChatState::Idle => false,
        };
        awaited && ticket.session == self.id
    }

    fn record_failure(&mut self) -> Notification {
        self.transcript
            .push(TranscriptEntry::assistant(CHAT_ERROR_MESSAGE, Vec::new()));
        Notification::error(CONNECTION_ERROR_TITLE, CONNECTION_ERROR_DESCRIPTION)
            .with_duration_ms(CONNECTION_ERROR_MS)
    }
}

/// Settles the question if `ask` is dropped while the request is out.
struct PendingReply<'a> {
    session: &'a mut ConversationSession,
    ticket: Option<QuestionTicket>,
}

impl Drop for PendingReply<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.session.abandon(ticket);
        }
    }
}
