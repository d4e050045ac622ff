//! Session state management for browser automation runs.
//!
//! This module provides the [`Session`] type, which tracks the state of an
//! automation run: action history, the dialog most recently observed, and
//! event broadcasting for observers.
//!
//! # Architecture
//!
//! A session acts as the central state record for one driver/browser pairing:
//!
//! - Actions performed through the executor are logged to the session
//! - Observers subscribe to session events via broadcast channels
//! - The action log is maintained as a ring buffer to limit memory usage
//! - Actions are persisted to JSON Lines files in `~/.klaxon/logs/`
//!
//! # Example
//!
//! ```no_run
//! use klaxon_core::session::Session;
//! use klaxon_core::action::{ActionType, ActionResult};
//!
//! #[tokio::main]
//! async fn main() {
//!     let session = Session::new(Some("127.0.0.1:4444".to_string()), "default");
//!
//!     // Subscribe to events (for an observer)
//!     let mut rx = session.subscribe();
//!
//!     // Log an action
//!     session.log_action(
//!         ActionType::AcceptDialog,
//!         ActionResult::Success,
//!         None,
//!     ).await;
//! }
//! ```

use std::collections::VecDeque;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex, RwLock};
use uuid::Uuid;

use crate::action::{ActionLog, ActionResult, ActionType};

/// Maximum number of action log entries to retain in the ring buffer.
const MAX_ACTION_LOG_SIZE: usize = 1000;

/// Returns the klaxon state directory (`~/.klaxon`).
pub fn klaxon_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".klaxon")
}

/// Returns the logs directory path (`~/.klaxon/logs/`).
///
/// Creates the directory if it doesn't exist.
fn logs_dir() -> PathBuf {
    let dir = klaxon_dir().join("logs");
    std::fs::create_dir_all(&dir).ok();
    dir
}

/// Events broadcast to observers when session state changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    /// A new action was logged to the session.
    ActionLogged(ActionLog),

    /// A dialog was observed open, with its message text.
    DialogOpened(Arc<String>),

    /// The session has started.
    Started {
        /// The unique identifier for this session.
        session_id: Uuid,
    },

    /// The session has ended.
    Ended,
}

/// Shared session state for an automation run.
///
/// The session maintains:
/// - A unique identifier and creation timestamp
/// - The bridge endpoint the run is talking to (if connected)
/// - A ring buffer of recent actions (up to 1000 entries)
/// - A broadcast channel for notifying observers of state changes
/// - A persistent log file in `~/.klaxon/logs/`
///
/// Sessions are created via [`Session::new`], which returns an `Arc<Session>`
/// for safe sharing across async tasks.
pub struct Session {
    /// The unique identifier for this session.
    pub id: Uuid,

    /// When this session was created.
    pub created_at: DateTime<Utc>,

    /// The bridge endpoint this run is connected to, if any.
    pub bridge_endpoint: Option<String>,

    /// Ring buffer of action log entries (private, access via methods).
    action_log: RwLock<VecDeque<ActionLog>>,

    /// Broadcast channel for session events.
    event_tx: broadcast::Sender<SessionEvent>,

    /// Buffered writer for persistent JSON Lines log file.
    log_writer: Mutex<Option<BufWriter<std::fs::File>>>,
}

impl Session {
    /// Creates a new session.
    ///
    /// # Arguments
    ///
    /// * `bridge_endpoint` - Optional endpoint of the bridge this run talks to
    /// * `session_name` - Name used for the persistent log file
    ///
    /// # Returns
    ///
    /// An `Arc<Session>` for safe sharing across async tasks. The session is
    /// initialized with a new UUID, the current timestamp, an empty action
    /// log, and a persistent log file at
    /// `~/.klaxon/logs/{session_name}_{timestamp}.jsonl`.
    pub fn new(bridge_endpoint: Option<String>, session_name: &str) -> Arc<Self> {
        Self::new_with_log_dir(bridge_endpoint, session_name, logs_dir())
    }

    /// Like [`new`](Self::new), but writing the JSONL log under `log_dir`.
    ///
    /// Tests use this to avoid polluting `~/.klaxon/logs`.
    pub fn new_with_log_dir(
        bridge_endpoint: Option<String>,
        session_name: &str,
        log_dir: PathBuf,
    ) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(100);
        let created_at = Utc::now();

        let log_writer = {
            std::fs::create_dir_all(&log_dir).ok();
            let timestamp = created_at.format("%Y%m%d_%H%M%S");
            let log_path = log_dir.join(format!("{}_{}.jsonl", session_name, timestamp));
            std::fs::File::create(&log_path).ok().map(BufWriter::new)
        };

        Arc::new(Self {
            id: Uuid::new_v4(),
            created_at,
            bridge_endpoint,
            action_log: RwLock::new(VecDeque::with_capacity(MAX_ACTION_LOG_SIZE)),
            event_tx,
            log_writer: Mutex::new(log_writer),
        })
    }

    /// Subscribes to session events.
    ///
    /// Returns a broadcast receiver that will receive [`SessionEvent`]s as
    /// they occur. Note that broadcast receivers may miss events if they lag
    /// too far behind.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Logs an action and broadcasts it to observers.
    ///
    /// Creates an [`ActionLog`] entry with the given action and result, adds
    /// it to the session's ring buffer, writes it to the persistent log file,
    /// and broadcasts it to all subscribers. When `dialog_text` is provided
    /// (the action observed an open dialog), a [`SessionEvent::DialogOpened`]
    /// event is broadcast as well.
    ///
    /// # Returns
    ///
    /// The created [`ActionLog`] entry.
    pub async fn log_action(
        &self,
        action: ActionType,
        result: ActionResult,
        dialog_text: Option<String>,
    ) -> ActionLog {
        let log = ActionLog::new(action, result, None);

        // Update action log with ring buffer behavior
        {
            let mut action_log = self.action_log.write().await;
            if action_log.len() >= MAX_ACTION_LOG_SIZE {
                action_log.pop_front(); // Remove oldest entry
            }
            action_log.push_back(log.clone());
        }

        // Write to persistent log file
        {
            let mut writer_guard = self.log_writer.lock().await;
            if let Some(ref mut writer) = *writer_guard {
                if let Ok(json) = serde_json::to_string(&log) {
                    let _ = writeln!(writer, "{}", json);
                    let _ = writer.flush();
                }
            }
        }

        // Broadcast dialog observation if any (ignore if no subscribers)
        if let Some(text) = dialog_text {
            let _ = self
                .event_tx
                .send(SessionEvent::DialogOpened(Arc::new(text)));
        }

        // Broadcast action (ignore if no subscribers)
        let _ = self.event_tx.send(SessionEvent::ActionLogged(log.clone()));

        log
    }

    /// Returns all action log entries.
    ///
    /// A copy of the internal log in chronological order; modifications do
    /// not affect the session.
    pub async fn get_action_log(&self) -> Vec<ActionLog> {
        self.action_log.read().await.iter().cloned().collect()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("bridge_endpoint", &self.bridge_endpoint)
            .field("action_log", &"<RwLock<VecDeque<ActionLog>>>")
            .field("event_tx", &"<broadcast::Sender>")
            .field("log_writer", &"<Mutex<Option<BufWriter<File>>>>")
            .finish()
    }
}
