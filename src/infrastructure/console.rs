//! Terminal collaborators for interactive runs

use crate::domain::services::{CollaboratorError, InputSource, OutputSink};
use async_trait::async_trait;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// Reads one utterance per line
pub struct LineInput<R> {
    lines: Mutex<Lines<R>>,
    prompt: Option<String>,
}

/// Line input over the process's standard input
pub type StdinInput = LineInput<BufReader<Stdin>>;

impl StdinInput {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin())).with_prompt("> ")
    }
}

impl<R: AsyncBufRead + Unpin + Send> LineInput<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: Mutex::new(reader.lines()),
            prompt: None,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> InputSource for LineInput<R> {
    async fn request_input(&self) -> Result<String, CollaboratorError> {
        if let Some(prompt) = &self.prompt {
            let mut stdout = std::io::stdout();
            let _ = write!(stdout, "{prompt}");
            let _ = stdout.flush();
        }

        let mut lines = self.lines.lock().await;
        match lines.next_line().await {
            Ok(Some(line)) => Ok(line.trim_end_matches('\r').to_string()),
            Ok(None) => Err(CollaboratorError::Closed),
            Err(e) => Err(CollaboratorError::failed(format!("failed to read input: {e}"))),
        }
    }
}

/// Prints speak output to stdout
#[derive(Debug, Default, Clone)]
pub struct StdoutSink {
    prefix: String,
}

impl StdoutSink {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl OutputSink for StdoutSink {
    fn emit(&self, text: &str) {
        println!("{}{text}", self.prefix);
    }
}
