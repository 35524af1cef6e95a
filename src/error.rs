//! Error types for the chat server
//!
//! Defines application-level errors and message send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Covers fatal connection errors only; protocol-level user errors are
/// answered with numeric replies and never surface here.
#[derive(Debug, Error)]
pub enum AppError {
    /// Line framing or transport error (fatal - connection is torn down)
    #[error("codec error: {0}")]
    Codec(#[from] crate::codec::CodecError),

    /// Channel send error (fatal - internal channel broken)
    #[error("Channel send error")]
    ChannelSend,
}

/// Message send errors
///
/// Occurs when attempting to send messages through closed channels.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
