//! Per-connection control loop.
//!
//! Each accepted socket gets one handler task and one writer task. The
//! handler walks the connection through its lifecycle:
//!
//! ```text
//! Connecting ──> Authenticating ──> Active ──> Closing ──> Closed
//!                     │                                      ▲
//!                     └────────── failed login ──────────────┘
//! ```
//!
//! Reads are fixed-buffer: one receive returns whatever bytes are currently
//! available, up to the buffer capacity, so a single read may carry several
//! commands or a partial one. Outbound messages are queued on an unbounded
//! channel and written by the writer task with a trailing newline; there is
//! no backpressure and no idle timeout.

use std::sync::Arc;

use palaver_proto::{Command, parse_line};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
};

use crate::{
    credentials::{CredentialStore, scrub},
    registry::SessionRegistry,
    router::Router,
};

/// Receive buffer capacity, and therefore the most one read can return.
const RECV_BUFFER_SIZE: usize = 1024;

/// Run one connection to completion.
///
/// Cleanup - session deregistration, writer shutdown, socket close - runs on
/// every exit path, including authentication failure and abrupt peer
/// disconnects.
pub async fn handle(
    id: u64,
    stream: TcpStream,
    credentials: Arc<CredentialStore>,
    sessions: Arc<SessionRegistry>,
    router: Router,
) {
    let (mut read_half, write_half) = stream.into_split();
    let (outbound, rx) = mpsc::unbounded_channel::<String>();

    let writer = tokio::spawn(write_outbound(write_half, rx));

    let Some(username) = authenticate(id, &mut read_half, &credentials, &outbound).await else {
        let _ = outbound.send("Authentication failed.".to_string());
        tracing::debug!(connection = id, "authentication failed");

        // Dropping the last sender lets the writer flush the refusal and
        // close the socket.
        drop(outbound);
        let _ = writer.await;
        return;
    };

    // Identities come from a monotonic counter; a collision means a bug in
    // the accept loop.
    if !sessions.register(id, &username, outbound.clone()) {
        tracing::error!(connection = id, "connection identity already registered");
        drop(outbound);
        let _ = writer.await;
        return;
    }

    tracing::info!(connection = id, username = %username, "authenticated");
    let _ = outbound.send("Welcome to the chat server!".to_string());
    sessions.broadcast(id, &format!("{username} has joined the chat."));

    read_loop(id, &mut read_half, &router).await;

    sessions.broadcast(id, &format!("{username} has left the chat."));
    sessions.unregister(id);
    tracing::info!(connection = id, username = %username, "disconnected");

    drop(outbound);
    let _ = writer.await;
}

/// The Authenticating state: prompt for and check credentials.
///
/// Every space character is stripped from both fields, wherever it appears.
/// Returns `None` on read failure or credential mismatch.
async fn authenticate(
    id: u64,
    read_half: &mut OwnedReadHalf,
    credentials: &CredentialStore,
    outbound: &UnboundedSender<String>,
) -> Option<String> {
    let _ = outbound.send("Enter username: ".to_string());
    let username = scrub(&read_chunk(read_half).await?);

    let _ = outbound.send("Enter password: ".to_string());
    let password = scrub(&read_chunk(read_half).await?);

    if credentials.verify(&username, &password) {
        Some(username)
    } else {
        tracing::debug!(connection = id, username = %username, "credential mismatch");
        None
    }
}

/// The Active state: read, parse, dispatch until exit or disconnect.
async fn read_loop(id: u64, read_half: &mut OwnedReadHalf, router: &Router) {
    loop {
        let Some(text) = read_chunk(read_half).await else {
            break;
        };
        if text.is_empty() {
            continue;
        }

        let mut exit = false;
        for command in parse_line(&text) {
            // Exit abandons the rest of the line as well as the loop.
            if command == Command::Exit {
                exit = true;
                break;
            }
            router.dispatch(id, &command);
        }
        if exit {
            break;
        }
    }
}

/// Read whatever bytes are currently available, up to the buffer capacity.
///
/// Returns `None` on EOF or read error - both end the connection the same
/// way. The bytes are decoded lossily and trailing CR/LF is stripped.
async fn read_chunk(read_half: &mut OwnedReadHalf) -> Option<String> {
    let mut buf = [0u8; RECV_BUFFER_SIZE];
    let received = read_half.read(&mut buf).await.ok()?;
    if received == 0 {
        return None;
    }

    let text = String::from_utf8_lossy(&buf[..received]);
    Some(text.trim_end_matches(['\r', '\n']).to_string())
}

/// Writer task: drain the outbound queue into the socket.
///
/// Each payload goes out as one newline-terminated line. A failed write
/// stops the writer; anything queued after that is dropped silently, which
/// is how delivery to a dead peer degrades.
async fn write_outbound(mut write_half: OwnedWriteHalf, mut rx: UnboundedReceiver<String>) {
    while let Some(line) = rx.recv().await {
        if let Err(error) = write_half.write_all(format!("{line}\n").as_bytes()).await {
            tracing::warn!("outbound write failed: {error}");
            break;
        }
    }
}
