//! Command-line front-end.
//!
//! Argument definitions use `clap` derive. Settings resolve as
//! CLI flag > environment > config file > defaults.

use crate::api::{ApiClient, ApiError, ChatOutput};
use crate::config::{default_config_path, ClientConfig, ConfigError};
use crate::render;
use crate::session::chat::{IgnoreReason, QuestionTicket, Submission};
use crate::session::upload::ACCEPTED_EXTENSIONS;
use crate::session::{
    ConversationSession, Severity, UploadFile, UploadSubmission, ValidationError,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

pub const CONFIG_ENV: &str = "AOZORA_CONFIG";
pub const BASE_URL_ENV: &str = "AOZORA_BASE_URL";

/// Ask questions about ingested documents and add new ones.
#[derive(Parser, Debug)]
#[command(name = "aozora-client", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL, e.g. http://127.0.0.1:8005
    #[arg(long = "base-url", global = true)]
    pub base_url: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive chat (the default).
    Chat,
    /// Ask a single question and print the answer.
    Ask { question: String },
    /// Add a document to the knowledge base.
    Upload {
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
        #[arg(short = 't', long = "title")]
        title: String,
    },
}

impl CliArgs {
    /// Explicit config path: --config flag > AOZORA_CONFIG env var.
    pub fn explicit_config_path(&self) -> Option<PathBuf> {
        self.config
            .clone()
            .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from))
    }

    /// Load the config and apply overrides. An explicit path must load;
    /// the default path may be missing.
    pub fn load_config(&self) -> Result<ClientConfig, ConfigError> {
        let config = match self.explicit_config_path() {
            Some(path) => ClientConfig::load(&path)?,
            None => ClientConfig::load_or_default(&default_config_path())?,
        };
        let config = apply_overrides(
            config,
            self.base_url.clone(),
            std::env::var(BASE_URL_ENV).ok(),
            self.log_level.clone(),
        );
        config.validate()?;
        Ok(config)
    }
}

/// Base URL: flag > env > file. Log level: flag > file.
pub fn apply_overrides(
    mut config: ClientConfig,
    flag_base_url: Option<String>,
    env_base_url: Option<String>,
    flag_log_level: Option<String>,
) -> ClientConfig {
    if let Some(url) = flag_base_url.or(env_base_url) {
        config.base_url = url;
    }
    if let Some(level) = flag_log_level {
        config.log_level = level;
    }
    config
}

/// Interactive chat on a fresh session.
pub async fn run_chat<R, W>(
    config: &ClientConfig,
    client: ApiClient,
    input: R,
    out: &mut W,
) -> anyhow::Result<bool>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut session = ConversationSession::new(config);
    chat_loop(&mut session, client, input, out).await?;
    Ok(true)
}

/// Each input line is a question. The request runs on a spawned task and
/// reports back over a channel, so input is still read while an answer is
/// pending. At end of input a pending question is still waited for.
pub async fn chat_loop<R, W>(
    session: &mut ConversationSession,
    client: ApiClient,
    input: R,
    out: &mut W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    session.activate();
    for entry in session.transcript().entries() {
        writeln!(out, "{}", render::entry(entry))?;
    }
    writeln!(out, "(type a question, /quit to exit)")?;

    let mut lines = input.lines();
    let (tx, mut rx) = mpsc::unbounded_channel::<Result<ChatOutput, ApiError>>();
    let mut pending: Option<QuestionTicket> = None;
    let mut input_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if input_open => {
                match line? {
                    None => {
                        input_open = false;
                        if pending.is_none() {
                            break;
                        }
                    }
                    Some(line) if line.trim() == "/quit" => break,
                    Some(line) => {
                        session.set_input(line);
                        match session.submit_input() {
                            Submission::Sent(ticket) => {
                                writeln!(out, "Thinking...")?;
                                let client = client.clone();
                                let tx = tx.clone();
                                let question = ticket.question().to_string();
                                tokio::spawn(async move {
                                    let result = client.chat(std::slice::from_ref(&question)).await;
                                    let _ = tx.send(result);
                                });
                                pending = Some(ticket);
                            }
                            Submission::Ignored(IgnoreReason::InFlight) => {
                                writeln!(out, "(still answering the previous question)")?;
                            }
                            Submission::Ignored(IgnoreReason::Blank) => {}
                            Submission::Rejected(note) => {
                                writeln!(out, "{}", render::notification(&note))?;
                            }
                        }
                    }
                }
            }
            Some(result) = rx.recv() => {
                if let Some(ticket) = pending.take() {
                    let note = session.complete(ticket, result);
                    if let Some(entry) = session.transcript().last() {
                        writeln!(out, "{}", render::entry(entry))?;
                    }
                    if let Some(note) = note {
                        writeln!(out, "{}", render::notification(&note))?;
                    }
                }
                if !input_open {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// One question, one answer. Returns false when no real answer came back.
pub async fn run_ask<W: Write>(
    config: &ClientConfig,
    client: &ApiClient,
    question: &str,
    out: &mut W,
) -> anyhow::Result<bool> {
    if question.trim().is_empty() {
        writeln!(
            out,
            "{}",
            render::notification(&ValidationError::BlankQuestion.to_notification())
        )?;
        return Ok(false);
    }

    let mut session = ConversationSession::new(config);
    let note = session.ask(client, question).await;
    if !session.transcript().has_unanswered_question() && session.transcript().len() > 1 {
        if let Some(entry) = session.transcript().last() {
            writeln!(out, "{}", render::entry(entry))?;
        }
    }
    match note {
        Some(note) => {
            writeln!(out, "{}", render::notification(&note))?;
            Ok(false)
        }
        None => Ok(true),
    }
}

pub async fn run_upload<W: Write>(
    client: &ApiClient,
    path: &Path,
    title: &str,
    out: &mut W,
) -> anyhow::Result<bool> {
    let file = UploadFile::from_path(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if !file.is_accepted_extension() {
        writeln!(
            out,
            "note: {} is not one of .{}; the server may reject it",
            file.file_name,
            ACCEPTED_EXTENSIONS.join(", .")
        )?;
    }

    let mut form = UploadSubmission::new();
    form.select_file(file);
    form.set_title(title);
    match form.submit(client).await {
        Some(note) => {
            writeln!(out, "{}", render::notification(&note))?;
            Ok(note.severity == Severity::Success)
        }
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_none() {
        let args = CliArgs::parse_from(["aozora-client"]);
        assert!(args.command.is_none());
    }

    #[test]
    fn test_parse_upload() {
        let args = CliArgs::parse_from([
            "aozora-client",
            "--base-url",
            "http://rag:9000",
            "upload",
            "-f",
            "guide.pdf",
            "--title",
            "Guide",
        ]);
        assert_eq!(args.base_url.as_deref(), Some("http://rag:9000"));
        assert_eq!(
            args.command,
            Some(Command::Upload {
                file: PathBuf::from("guide.pdf"),
                title: "Guide".into(),
            })
        );
    }

    #[test]
    fn test_global_flag_after_subcommand() {
        let args = CliArgs::parse_from(["aozora-client", "ask", "hi", "-l", "debug"]);
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert_eq!(
            args.command,
            Some(Command::Ask {
                question: "hi".into()
            })
        );
    }

    #[test]
    fn test_override_precedence() {
        let file = ClientConfig {
            base_url: "http://file:1".into(),
            ..Default::default()
        };

        let c = apply_overrides(file.clone(), None, None, None);
        assert_eq!(c.base_url, "http://file:1");

        let c = apply_overrides(file.clone(), None, Some("http://env:2".into()), None);
        assert_eq!(c.base_url, "http://env:2");

        let c = apply_overrides(
            file,
            Some("http://flag:3".into()),
            Some("http://env:2".into()),
            Some("debug".into()),
        );
        assert_eq!(c.base_url, "http://flag:3");
        assert_eq!(c.log_level, "debug");
    }
}
