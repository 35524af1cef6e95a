//! TCP connection handler
//!
//! Handles one client connection: line framing, command parsing, and
//! bidirectional plumbing between the socket and the server actor.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::codec::LineCodec;
use crate::error::AppError;
use crate::message::Command;
use crate::server::ServerCommand;
use crate::types::ConnId;

/// Handle a new TCP connection
///
/// Registers the connection with the server actor, then pumps lines in
/// both directions until the peer disconnects, the transport fails, or
/// the actor drops this client's outbound queue (QUIT).
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<ServerCommand>,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let mut framed = Framed::new(stream, LineCodec);

    let conn_id = ConnId::next();
    info!("client {} connected from {}", conn_id, peer_addr);

    // Create the unbounded server -> client line queue
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();

    // Register with the server actor
    if cmd_tx
        .send(ServerCommand::Connect { id: conn_id, sender: line_tx })
        .await
        .is_err()
    {
        warn!("failed to register client {} - server closed", conn_id);
        return Err(AppError::ChannelSend);
    }

    let result = connection_loop(conn_id, &mut framed, &mut line_rx, &cmd_tx).await;

    // Notify the actor either way; a no-op if the client already QUIT
    let _ = cmd_tx.send(ServerCommand::Disconnect { id: conn_id }).await;
    let _ = framed.close().await;

    info!("client {} disconnected", conn_id);
    result
}

/// Pump lines between the socket and the actor until either side ends
///
/// Inbound lines already buffered are all extracted and forwarded
/// before the next read, so pipelined commands are never stalled.
async fn connection_loop(
    conn_id: ConnId,
    framed: &mut Framed<TcpStream, LineCodec>,
    line_rx: &mut mpsc::UnboundedReceiver<String>,
    cmd_tx: &mpsc::Sender<ServerCommand>,
) -> Result<(), AppError> {
    loop {
        tokio::select! {
            frame = framed.next() => {
                let line = match frame {
                    Some(Ok(line)) => line,
                    Some(Err(e)) => {
                        // transport-level failure: torn down like a disconnect
                        warn!("client {}: read error: {}", conn_id, e);
                        return Ok(());
                    }
                    None => return Ok(()), // peer closed the connection
                };
                let Some(command) = Command::parse(&line) else {
                    continue; // blank line
                };
                if cmd_tx
                    .send(ServerCommand::Incoming { id: conn_id, command })
                    .await
                    .is_err()
                {
                    debug!("server closed, ending connection {}", conn_id);
                    return Ok(());
                }
            }
            queued = line_rx.recv() => {
                match queued {
                    Some(line) => framed.send(line).await?,
                    // the actor dropped our queue: QUIT teardown
                    None => return Ok(()),
                }
            }
        }
    }
}
