//! TCP accept loop and server assembly.

use std::{
    net::SocketAddr,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::net::TcpListener;

use crate::{
    connection,
    credentials::CredentialStore,
    error::ServerError,
    groups::GroupRegistry,
    registry::SessionRegistry,
    router::Router,
};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (e.g., "0.0.0.0:12345").
    pub bind_address: String,
    /// Path to the credential file, `username:password` per line.
    pub users_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:12345".to_string(),
            users_path: PathBuf::from("users.txt"),
        }
    }
}

/// Production chat server.
///
/// Owns the listener, the credential store, and the two registries shared by
/// every connection handler. The Rust runtime ignores SIGPIPE at startup, so
/// a write to a peer that already closed surfaces as a normal I/O error on
/// that one connection and never takes the process down.
pub struct Server {
    listener: TcpListener,
    credentials: Arc<CredentialStore>,
    sessions: Arc<SessionRegistry>,
    groups: Arc<GroupRegistry>,
    next_connection_id: AtomicU64,
}

impl Server {
    /// Load credentials and bind the listener.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let credentials = CredentialStore::load(&config.users_path)?;
        tracing::info!("loaded {} credential entries", credentials.len());

        let listener = TcpListener::bind(&config.bind_address).await.map_err(|e| {
            ServerError::Transport(format!("failed to bind '{}': {e}", config.bind_address))
        })?;

        Ok(Self {
            listener,
            credentials: Arc::new(credentials),
            sessions: Arc::new(SessionRegistry::new()),
            groups: Arc::new(GroupRegistry::new()),
            next_connection_id: AtomicU64::new(1),
        })
    }

    /// Local address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener
            .local_addr()
            .map_err(|e| ServerError::Transport(format!("failed to get local address: {e}")))
    }

    /// Accept connections until shut down.
    ///
    /// A failed accept is logged and the loop continues. Each accepted
    /// stream gets a fresh connection identity and its own handler task;
    /// per-connection failures never escalate past that task.
    pub async fn run(self) -> Result<(), ServerError> {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(connection = id, %peer, "accepted");

                    let credentials = Arc::clone(&self.credentials);
                    let sessions = Arc::clone(&self.sessions);
                    let router = Router::new(Arc::clone(&self.sessions), Arc::clone(&self.groups));

                    tokio::spawn(connection::handle(id, stream, credentials, sessions, router));
                },
                Err(error) => {
                    tracing::error!("accept error: {error}");
                },
            }
        }
    }
}
