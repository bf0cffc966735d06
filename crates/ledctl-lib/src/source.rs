//! Command producers — CLI batch or a whitespace-delimited stream.

use std::io::{BufRead, BufReader};
use std::sync::mpsc::SyncSender;

use crate::engine::Message;

/// Where commands come from. Exactly one source feeds a session.
pub enum CommandSource {
    /// Fixed list of tokens (positional arguments).
    Batch(Vec<String>),
    /// Line-oriented reader; each whitespace-separated token is one command.
    Stream(Box<dyn BufRead + Send>),
}

impl CommandSource {
    pub fn stdin() -> Self {
        CommandSource::Stream(Box::new(BufReader::new(std::io::stdin())))
    }

    pub fn batch<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSource::Batch(tokens.into_iter().map(Into::into).collect())
    }

    /// Send every token, then `Stop`. Returns the number of commands
    /// handed over.
    ///
    /// Blocks on each send until the serializer takes the command. If the
    /// serializer has already stopped, the remaining input is dropped.
    pub fn produce(self, tx: &SyncSender<Message>) -> usize {
        let mut sent = 0;
        let finished = match self {
            CommandSource::Batch(tokens) => tokens
                .into_iter()
                .all(|token| send(tx, token, &mut sent)),
            CommandSource::Stream(mut reader) => {
                // Raw bytes: a line that is not UTF-8 still yields tokens,
                // which the serializer then rejects one by one.
                let mut buf = Vec::new();
                loop {
                    buf.clear();
                    match reader.read_until(b'\n', &mut buf) {
                        Ok(0) => break true,
                        Ok(_) => {
                            let line = String::from_utf8_lossy(&buf);
                            let delivered = line
                                .split_whitespace()
                                .all(|token| send(tx, token.to_string(), &mut sent));
                            if !delivered {
                                break false;
                            }
                        }
                        Err(e) => {
                            log::warn!("stopped reading commands: {e}");
                            break true;
                        }
                    }
                }
            }
        };
        if finished && tx.send(Message::Stop).is_err() {
            log::debug!("serializer stopped before the stop signal was sent");
        }
        sent
    }
}

fn send(tx: &SyncSender<Message>, token: String, sent: &mut usize) -> bool {
    match tx.send(Message::Command(token)) {
        Ok(()) => {
            *sent += 1;
            true
        }
        Err(e) => {
            if let Message::Command(token) = e.0 {
                log::debug!("serializer stopped, dropping command {token:?}");
            }
            false
        }
    }
}
