//! Multi-channel IRC-style chat server library
//!
//! A line-protocol chat server built with tokio, using the Actor
//! pattern for state management.
//!
//! # Features
//! - Shared-password authentication (PASS/NICK/USER registration)
//! - Named `#channels` created on demand, destroyed when empty
//! - Channel modes: invite-only, topic lock, join key, member limit
//! - Operator privileges: KICK, INVITE, TOPIC on locked channels, MODE
//! - PRIVMSG/NOTICE to channels and users, WHO/NAMES queries
//! - CAP negotiation stub and PING/PONG keepalive
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `Server` is the central actor owning all clients and channels
//! - Each connection has a handler task pair framing lines with `LineCodec`
//! - No locks needed - all state access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use irc_server_v1::{handle_connection, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:6667").await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     tokio::spawn(Server::new(cmd_rx, "secret".to_string()).run());
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         let cmd_tx = cmd_tx.clone();
//!         tokio::spawn(handle_connection(stream, cmd_tx));
//!     }
//! }
//! ```

pub mod channel;
pub mod client;
pub mod codec;
pub mod error;
pub mod handler;
pub mod message;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use channel::Channel;
pub use client::Client;
pub use codec::LineCodec;
pub use error::{AppError, SendError};
pub use handler::handle_connection;
pub use message::{Command, Reply, SERVER_NAME};
pub use server::{Server, ServerCommand};
pub use types::ConnId;
