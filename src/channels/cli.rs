//! CLI channel — stdin/stdout REPL for local testing.
//!
//! Keyboards are rendered as `/cb <tag>` hints; typing `/cb menu` presses
//! the corresponding button.

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::channels::{Channel, EventPayload, EventStream, InboundEvent, Outbound};
use crate::error::ChannelError;

/// A simple CLI channel that reads from stdin and writes to stdout.
pub struct CliChannel;

impl CliChannel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn one input line into an event payload.
fn parse_line(line: &str) -> EventPayload {
    match line.strip_prefix("/cb ") {
        Some(tag) => EventPayload::Callback(tag.trim().to_string()),
        None => EventPayload::Text(line.to_string()),
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            eprint!("> ");
                            continue;
                        }
                        let event = InboundEvent::new("cli", "local-user", parse_line(&line));
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn respond(
        &self,
        _event: &InboundEvent,
        response: Outbound,
    ) -> Result<(), ChannelError> {
        println!("\n{}", response.text);
        if let Some(keyboard) = &response.keyboard {
            for row in &keyboard.rows {
                for button in row {
                    println!("  [{}] → /cb {}", button.label, button.callback);
                }
            }
        }
        eprint!("> ");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
