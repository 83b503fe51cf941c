//! CLI channel — interactive terminal-based chat.
//!
//! The simplest transport: reads lines from stdin, writes answers to
//! stdout. Used for `verdant chat` interactive mode.

use async_trait::async_trait;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use verdant_core::error::GatewayError;
use verdant_core::gateway::{Answer, Channel, InboundMessage};
use verdant_core::message::UserId;

/// The sender ID assigned to the local terminal user.
pub const LOCAL_USER: &str = "local_user";

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

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(
        &self,
    ) -> Result<mpsc::Receiver<Result<InboundMessage, GatewayError>>, GatewayError> {
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let stdin = io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            continue;
                        }

                        if matches!(line.as_str(), "exit" | "quit" | "/exit" | "/quit" | ":q") {
                            break;
                        }

                        let msg = InboundMessage::new(LOCAL_USER, line, "cli");
                        if tx.send(Ok(msg)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF (Ctrl+D)
                    Err(e) => {
                        let _ = tx.send(Err(GatewayError::Closed(e.to_string()))).await;
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn deliver(&self, _user: &UserId, answer: &Answer) -> Result<(), GatewayError> {
        println!("{}", answer.text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_name() {
        let ch = CliChannel::new();
        assert_eq!(ch.name(), "cli");
    }

    #[tokio::test]
    async fn deliver_does_not_error() {
        let ch = CliChannel::new();
        let answer = Answer::text("hello");
        assert!(ch.deliver(&UserId::new(LOCAL_USER), &answer).await.is_ok());
    }
}
