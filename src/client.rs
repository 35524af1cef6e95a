//! Client struct definition
//!
//! Represents one connected client: protocol identity, registration
//! state, and the outbound line queue.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::message::ANON_NICK;
use crate::types::ConnId;

/// Connected client information
///
/// Nickname and username stay empty until the client sets them; the
/// outbound sender feeds the connection's writer task. Registration
/// progresses `pass_ok` → `registered`; `authenticated` is set only at
/// the moment registration completes.
#[derive(Debug)]
pub struct Client {
    /// Unique identifier for this connection
    pub id: ConnId,
    /// Nickname (empty until set by NICK)
    pub nickname: String,
    /// Username (empty until set by USER)
    pub username: String,
    /// Shared password was presented correctly
    pub pass_ok: bool,
    /// Registration completed (001 already sent)
    pub registered: bool,
    /// Allowed to use channel and messaging commands
    pub authenticated: bool,
    /// Server → Client line queue (unbounded)
    sender: mpsc::UnboundedSender<String>,
}

impl Client {
    /// Create a new client with the given ID and outbound sender
    pub fn new(id: ConnId, sender: mpsc::UnboundedSender<String>) -> Self {
        Self {
            id,
            nickname: String::new(),
            username: String::new(),
            pass_ok: false,
            registered: false,
            authenticated: false,
            sender,
        }
    }

    /// Enqueue one wire line (without terminator) for this client
    ///
    /// Returns an error if the writer task is gone (client disconnected).
    pub fn send(&self, line: impl Into<String>) -> Result<(), SendError> {
        self.sender
            .send(line.into())
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Nickname used in message prefixes; falls back while unset
    pub fn display_nick(&self) -> &str {
        if self.nickname.is_empty() {
            ANON_NICK
        } else {
            &self.nickname
        }
    }

    /// Check whether both identity fields have been provided
    pub fn has_identity(&self) -> bool {
        !self.nickname.is_empty() && !self.username.is_empty()
    }

    pub fn set_nickname(&mut self, nick: String) {
        self.nickname = nick;
    }

    pub fn set_username(&mut self, user: String) {
        self.username = user;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let client = Client::new(ConnId::next(), tx);

        assert!(client.nickname.is_empty());
        assert!(!client.pass_ok);
        assert!(!client.registered);
        assert!(!client.authenticated);
        assert_eq!(client.display_nick(), "anon");
    }

    #[test]
    fn test_client_identity() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut client = Client::new(ConnId::next(), tx);

        assert!(!client.has_identity());
        client.set_nickname("alice".to_string());
        assert!(!client.has_identity());
        client.set_username("a".to_string());
        assert!(client.has_identity());
        assert_eq!(client.display_nick(), "alice");
    }

    #[test]
    fn test_send_queues_line() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let client = Client::new(ConnId::next(), tx);

        client.send("PING :x").unwrap();
        assert_eq!(rx.try_recv().unwrap(), "PING :x");
    }

    #[test]
    fn test_send_after_writer_gone() {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = Client::new(ConnId::next(), tx);
        drop(rx);

        assert!(client.send("x").is_err());
    }
}
