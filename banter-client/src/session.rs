//! Session controller
//!
//! The top-level state machine for one chat session. A single controller
//! task exclusively owns the transport connection, the credential, the
//! message log and the presence set; everything else observes snapshots
//! through a watch channel. All mutation is sequential reaction to
//! commands from the `ChatSession` handle or to tagged signals from the
//! connection task, so events from a connection that has been torn down
//! can never leak into a newer session.

use tokio::sync::{mpsc, watch};
use tokio::time::{Duration, Instant};

use banter_protocol::{ChatMessage, ClientEvent, ServerEvent, UserIdentity};
use banter_utils::{BanterError, Result};

use crate::auth::{AuthClient, Credential};
use crate::connection::{ConnSignal, Connection, ConnectionEvent, ConnectionId};
use crate::presence::PresenceTracker;
use crate::stream::{self, MessageStream};

/// Session manager configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Chat server address (host:port)
    pub server_addr: String,
    /// Base URL of the auth endpoints
    pub auth_base_url: String,
    /// How long to wait for the server to confirm the handshake
    pub handshake_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:5002".into(),
            auth_base_url: "http://127.0.0.1:5001".into(),
            handshake_timeout: Duration::from_secs(10),
        }
    }
}

/// Snapshot of the session as exposed to the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No session; nothing attempted yet
    Unauthenticated,
    /// Login accepted locally; credential exchange and transport connect
    /// in flight
    Connecting,
    /// Transport up, waiting for the server to confirm the credential
    Authenticating,
    /// Fully established session
    Active {
        user: UserIdentity,
        messages: Vec<ChatMessage>,
        online: Vec<UserIdentity>,
    },
    /// The session failed; `reason` stays readable until the next login
    Errored { reason: String },
    /// Logged out
    Closed,
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    /// The most recent error message, if the session is in error
    pub fn error_reason(&self) -> Option<&str> {
        match self {
            Self::Errored { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Commands from the handle to the controller task
enum Command {
    Login { name: String },
    Logout,
    Submit { text: String },
}

/// Result of one spawned HTTP login, tagged with its attempt
struct LoginOutcome {
    attempt: ConnectionId,
    result: Result<Credential>,
}

/// Handle to a running session controller.
///
/// `login` and `logout` are fire-and-forget; their completion is observed
/// through subsequent state changes, never through a blocking return.
pub struct ChatSession {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SessionState>,
}

impl ChatSession {
    /// Spawn a session controller task and return its handle
    pub fn spawn(config: SessionConfig) -> Self {
        let auth = AuthClient::new(config.auth_base_url.clone());
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (conn_events_tx, conn_events_rx) = mpsc::channel(100);
        let (login_results_tx, login_results_rx) = mpsc::channel(8);
        let (state_tx, state_rx) = watch::channel(SessionState::Unauthenticated);

        let controller = Controller {
            config,
            auth,
            commands: commands_rx,
            conn_events: conn_events_rx,
            conn_events_tx,
            login_results: login_results_rx,
            login_results_tx,
            state_tx,
            phase: Phase::Unauthenticated,
            conn: None,
            next_conn: 0,
        };
        tokio::spawn(controller.run());

        Self {
            commands: commands_tx,
            state: state_rx,
        }
    }

    /// Begin a login attempt. Any in-flight or established session is
    /// torn down first; observe the outcome via `subscribe`.
    pub fn login(&self, name: impl Into<String>) {
        let _ = self.commands.send(Command::Login { name: name.into() });
    }

    /// End the session. The local transition to Closed is unconditional;
    /// the server notification is best effort.
    pub fn logout(&self) {
        let _ = self.commands.send(Command::Logout);
    }

    /// Validate and forward one outgoing message.
    ///
    /// Empty (after trimming) text and submission outside an Active
    /// session are rejected here, before anything touches the network.
    pub fn submit(&self, text: &str) -> Result<()> {
        let text = stream::prepare_submission(text)?;
        if !self.state.borrow().is_active() {
            return Err(BanterError::NotActive);
        }
        self.commands
            .send(Command::Submit { text })
            .map_err(|_| BanterError::internal("session controller gone"))?;
        Ok(())
    }

    /// Current state snapshot
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Subscribe to state-change notifications
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }
}

/// Internal controller phase. Mirrors the published `SessionState` but
/// additionally owns the credential, the log and the presence set.
enum Phase {
    Unauthenticated,
    Connecting {
        attempt: ConnectionId,
        /// Set once the HTTP login resolves, before the transport opens
        credential: Option<Credential>,
    },
    Authenticating {
        credential: Credential,
        deadline: Instant,
        /// Events arriving before the backlog are staged here
        stream: MessageStream,
        presence: PresenceTracker,
    },
    Active {
        credential: Credential,
        stream: MessageStream,
        presence: PresenceTracker,
    },
    Errored {
        reason: String,
    },
    Closed,
}

struct Controller {
    config: SessionConfig,
    auth: AuthClient,
    commands: mpsc::UnboundedReceiver<Command>,
    conn_events: mpsc::Receiver<ConnectionEvent>,
    conn_events_tx: mpsc::Sender<ConnectionEvent>,
    login_results: mpsc::Receiver<LoginOutcome>,
    login_results_tx: mpsc::Sender<LoginOutcome>,
    state_tx: watch::Sender<SessionState>,
    phase: Phase,
    conn: Option<Connection>,
    next_conn: u64,
}

impl Controller {
    async fn run(mut self) {
        loop {
            // The handshake timer only runs while Authenticating
            let deadline = match &self.phase {
                Phase::Authenticating { deadline, .. } => Some(*deadline),
                _ => None,
            };
            let handshake_timer = async move {
                match deadline {
                    Some(d) => tokio::time::sleep_until(d).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                cmd = self.commands.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd),
                        // Handle dropped; the session is over
                        None => break,
                    }
                }
                Some(ev) = self.conn_events.recv() => self.handle_conn_event(ev),
                Some(outcome) = self.login_results.recv() => self.handle_login_outcome(outcome),
                _ = handshake_timer => self.handle_handshake_timeout(),
            }
        }
        self.teardown_conn();
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Login { name } => self.start_login(name),
            Command::Logout => self.logout(),
            Command::Submit { text } => self.submit(text),
        }
    }

    /// Start a fresh login attempt. Always begins from a clean transport;
    /// anything in flight is cancelled and its events become stale by id.
    fn start_login(&mut self, name: String) {
        self.teardown_conn();
        let attempt = self.next_connection_id();
        tracing::info!(%attempt, %name, "Starting login");
        self.phase = Phase::Connecting {
            attempt,
            credential: None,
        };
        self.publish();

        let auth = self.auth.clone();
        let results = self.login_results_tx.clone();
        tokio::spawn(async move {
            let result = auth.login(&name).await;
            let _ = results.send(LoginOutcome { attempt, result }).await;
        });
    }

    /// Tear down locally no matter what; the server notification is a
    /// detached best-effort task whose failure is only logged.
    fn logout(&mut self) {
        if let Some(credential) = self.current_credential() {
            let auth = self.auth.clone();
            let token = credential.token.clone();
            tokio::spawn(async move {
                if let Err(e) = auth.logout(&token).await {
                    tracing::warn!("Logout notification failed: {}", e);
                }
            });
        }
        self.teardown_conn();
        self.phase = Phase::Closed;
        self.publish();
        tracing::info!("Session closed");
    }

    fn submit(&mut self, text: String) {
        if !matches!(self.phase, Phase::Active { .. }) {
            tracing::debug!("Submit ignored, no active session");
            return;
        }
        match &self.conn {
            // No optimistic append: the message joins the log when the
            // server echoes it back
            Some(conn) => conn.sender().send_nowait(ClientEvent::ChatMessage(text)),
            None => tracing::debug!("Submit ignored, connection gone"),
        }
    }

    fn handle_login_outcome(&mut self, outcome: LoginOutcome) {
        let Phase::Connecting {
            attempt,
            credential,
        } = &mut self.phase
        else {
            tracing::debug!(attempt = %outcome.attempt, "Discarding login result outside Connecting");
            return;
        };
        if *attempt != outcome.attempt {
            tracing::debug!(attempt = %outcome.attempt, "Discarding stale login result");
            return;
        }

        match outcome.result {
            Ok(cred) => {
                let id = *attempt;
                *credential = Some(cred);
                tracing::debug!(attempt = %id, "Credential obtained, opening transport");
                self.conn = Some(Connection::open(
                    id,
                    self.config.server_addr.clone(),
                    self.conn_events_tx.clone(),
                ));
            }
            Err(e) => {
                tracing::warn!("Login rejected: {}", e);
                self.phase = Phase::Errored {
                    reason: e.to_string(),
                };
                self.publish();
            }
        }
    }

    fn handle_conn_event(&mut self, ev: ConnectionEvent) {
        if self.conn.as_ref().map(Connection::id) != Some(ev.conn) {
            tracing::debug!(conn = %ev.conn, "Discarding signal from stale connection");
            return;
        }
        match ev.signal {
            ConnSignal::Connected => self.on_transport_connected(ev.conn),
            ConnSignal::Event(event) => self.on_server_event(event),
            ConnSignal::TransportError(detail) => self.fail(detail),
            ConnSignal::Disconnected => self.fail(BanterError::ConnectionClosed.to_string()),
        }
    }

    /// Transport is up: run the handshake. Sent exactly once per
    /// connection; the checked precondition is the Connecting phase with
    /// a resolved credential.
    fn on_transport_connected(&mut self, conn: ConnectionId) {
        match std::mem::replace(&mut self.phase, Phase::Unauthenticated) {
            Phase::Connecting {
                attempt,
                credential: Some(credential),
            } => {
                debug_assert_eq!(attempt, conn);
                if let Some(c) = &self.conn {
                    c.sender().send_nowait(ClientEvent::Authenticate {
                        token: credential.token.clone(),
                    });
                }
                tracing::debug!(%conn, "Transport connected, authenticating");
                self.phase = Phase::Authenticating {
                    credential,
                    deadline: Instant::now() + self.config.handshake_timeout,
                    stream: MessageStream::new(),
                    presence: PresenceTracker::new(),
                };
                self.publish();
            }
            other => {
                tracing::warn!(%conn, "Transport connected in unexpected state");
                self.phase = other;
            }
        }
    }

    fn on_server_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::RecentMessages(messages) => self.on_backlog(messages),
            ServerEvent::NewMessage(message) => self.on_new_message(message),
            ServerEvent::OnlineUsers(users) => self.on_online_users(users),
            ServerEvent::Error { message } => {
                tracing::warn!("Server error event: {}", message);
                self.fail(message);
            }
        }
    }

    /// The backlog doubles as the handshake confirmation: it is the first
    /// event the server sends after accepting the credential.
    fn on_backlog(&mut self, messages: Vec<ChatMessage>) {
        match std::mem::replace(&mut self.phase, Phase::Unauthenticated) {
            Phase::Authenticating {
                credential,
                mut stream,
                presence,
                ..
            } => {
                if let Err(e) = stream.on_backlog(messages) {
                    tracing::warn!("{}", e);
                }
                tracing::info!(user = %credential.user.name, "Session active");
                self.phase = Phase::Active {
                    credential,
                    stream,
                    presence,
                };
                self.publish();
            }
            Phase::Active {
                credential,
                mut stream,
                presence,
            } => {
                // A second backlog is a protocol error; log it and keep
                // the session going
                if let Err(e) = stream.on_backlog(messages) {
                    tracing::warn!("{}", e);
                }
                self.phase = Phase::Active {
                    credential,
                    stream,
                    presence,
                };
            }
            other => {
                tracing::warn!("Backlog received in unexpected state");
                self.phase = other;
            }
        }
    }

    fn on_new_message(&mut self, message: ChatMessage) {
        match &mut self.phase {
            Phase::Active { stream, .. } => {
                stream.on_incoming(message);
                self.publish();
            }
            Phase::Authenticating { stream, .. } => {
                // Staged; the backlog replaces the log wholesale when it
                // lands
                stream.on_incoming(message);
            }
            _ => tracing::warn!("Live message in unexpected state"),
        }
    }

    fn on_online_users(&mut self, users: Vec<UserIdentity>) {
        match &mut self.phase {
            Phase::Active { presence, .. } => {
                presence.on_snapshot(users);
                self.publish();
            }
            Phase::Authenticating { presence, .. } => {
                // Staged until activation rather than dropped
                presence.on_snapshot(users);
            }
            _ => tracing::warn!("Presence snapshot in unexpected state"),
        }
    }

    fn handle_handshake_timeout(&mut self) {
        if matches!(self.phase, Phase::Authenticating { .. }) {
            let seconds = self.config.handshake_timeout.as_secs();
            self.fail(BanterError::HandshakeTimeout { seconds }.to_string());
        }
    }

    fn fail(&mut self, reason: String) {
        tracing::warn!("Session error: {}", reason);
        self.teardown_conn();
        self.phase = Phase::Errored { reason };
        self.publish();
    }

    fn current_credential(&self) -> Option<&Credential> {
        match &self.phase {
            Phase::Connecting { credential, .. } => credential.as_ref(),
            Phase::Authenticating { credential, .. } | Phase::Active { credential, .. } => {
                Some(credential)
            }
            _ => None,
        }
    }

    fn teardown_conn(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            conn.close();
        }
    }

    fn next_connection_id(&mut self) -> ConnectionId {
        self.next_conn += 1;
        ConnectionId(self.next_conn)
    }

    fn publish(&self) {
        let snapshot = match &self.phase {
            Phase::Unauthenticated => SessionState::Unauthenticated,
            Phase::Connecting { .. } => SessionState::Connecting,
            Phase::Authenticating { .. } => SessionState::Authenticating,
            Phase::Active {
                credential,
                stream,
                presence,
            } => SessionState::Active {
                user: credential.user.clone(),
                messages: stream.messages().to_vec(),
                online: presence.online().to_vec(),
            },
            Phase::Errored { reason } => SessionState::Errored {
                reason: reason.clone(),
            },
            Phase::Closed => SessionState::Closed,
        };
        self.state_tx.send_replace(snapshot);
    }
}
