//! Interactive line-oriented console.
//!
//! Each input line is one event: a plain line is a patient question,
//! slash commands are operator actions. Every event runs to completion
//! before the next line is read.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::session::{Session, SessionState};

/// Warning shown when no credential was found at startup
pub const MISSING_KEY_WARNING: &str =
    "Warning: No OpenAI API key found. Please add OPENAI_API_KEY to your environment or .env file.";

const HELP: &str = "Commands:
  <question>          ask the assistant
  /reply <text>       send an operator reply to the patient
  /feedback <notes>   record clinician feedback on the last reply
  /ledger             show stored feedback
  /history            show the conversation
  /help               show this help
  /quit               exit";

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain line: a patient question
    Ask(String),
    /// `/reply`: operator reply injected as the assistant
    Reply(String),
    /// `/feedback`: clinician notes on the last reply
    Feedback(String),
    /// `/ledger`
    Ledger,
    /// `/history`
    History,
    /// `/help`
    Help,
    /// `/quit` or `/exit`
    Quit,
    /// Unrecognized slash command
    Unknown(String),
    /// Blank line
    Empty,
}

impl Command {
    /// Parse an input line
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        if !line.starts_with('/') {
            return Command::Ask(line.to_string());
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim().to_string()),
            None => (line, String::new()),
        };

        match name {
            "/reply" => Command::Reply(rest),
            "/feedback" => Command::Feedback(rest),
            "/ledger" => Command::Ledger,
            "/history" => Command::History,
            "/help" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        }
    }
}

/// Drives a [`Session`] from a line reader
pub struct Console<'a> {
    session: &'a Session,
    missing_key: bool,
}

impl<'a> Console<'a> {
    /// Console over a session, without the missing-key warning
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            missing_key: false,
        }
    }

    /// Show the missing-credential warning on startup
    pub fn warn_missing_key(mut self, missing: bool) -> Self {
        self.missing_key = missing;
        self
    }

    /// Run until `/quit` or EOF
    pub async fn run<R, W>(
        &self,
        state: &mut SessionState,
        reader: R,
        mut writer: W,
    ) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(session_id = %state.id(), "Console session started");

        write_line(&mut writer, "Antenatal Nutrition Chatbot (type /help for commands)").await?;
        if self.missing_key {
            write_line(&mut writer, MISSING_KEY_WARNING).await?;
        }

        let mut lines = reader.lines();

        loop {
            writer.write_all(b"> ").await?;
            writer.flush().await?;

            let Some(line) = lines.next_line().await? else {
                info!("EOF received, ending session");
                break;
            };

            let command = Command::parse(&line);
            debug!(?command, "Console command");

            if command == Command::Quit {
                break;
            }
            self.handle(state, command, &mut writer).await?;
        }

        writer.flush().await
    }

    async fn handle<W>(
        &self,
        state: &mut SessionState,
        command: Command,
        writer: &mut W,
    ) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        match command {
            Command::Ask(question) => {
                if let Some(reply) = self.session.ask(state, &question).await {
                    write_line(writer, &format!("assistant: {}", reply)).await?;
                }
            }
            Command::Reply(text) => {
                if self.session.inject_reply(state, &text) {
                    write_line(writer, &format!("assistant: {}", text)).await?;
                } else {
                    write_line(writer, "Warning: operator reply is empty; nothing sent.").await?;
                }
            }
            Command::Feedback(notes) => match self.session.submit_feedback(state, &notes).await {
                Ok(entry) => {
                    write_line(writer, &format!("Feedback recorded: {}", entry.text)).await?;
                }
                Err(e) => write_line(writer, &format!("Warning: {}", e)).await?,
            },
            Command::Ledger => {
                write_line(writer, "Stored feedback:").await?;
                write_line(writer, &state.ledger().feed()).await?;
            }
            Command::History => {
                for turn in state.transcript() {
                    write_line(writer, &format!("{}: {}", turn.role, turn.text)).await?;
                }
            }
            Command::Help => write_line(writer, HELP).await?,
            Command::Unknown(name) => {
                write_line(writer, &format!("Unknown command {} (try /help)", name)).await?;
            }
            Command::Empty | Command::Quit => {}
        }
        Ok(())
    }
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, text: &str) -> std::io::Result<()> {
    writer.write_all(text.as_bytes()).await?;
    writer.write_all(b"\n").await
}
