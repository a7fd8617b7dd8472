//! Connection and activity state published to observers

use serde::Serialize;
use std::fmt;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    NoUrlAndCredential,
    NoUrl,
    NoCredential,
    Connecting,
    Connected,
    NoConnection,
    Unauthorized,
    /// The integration is switched off in settings
    Disabled,
}

impl ConnectionStatus {
    /// Starting state for a client with the given settings; `Connecting` when
    /// nothing is missing
    pub fn initial(url: &str, credential: &str, credential_required: bool) -> Self {
        match (url.is_empty(), credential.is_empty()) {
            (true, true) => ConnectionStatus::NoUrlAndCredential,
            (true, false) => ConnectionStatus::NoUrl,
            (false, true) if credential_required => ConnectionStatus::NoCredential,
            _ => ConnectionStatus::Connecting,
        }
    }

    /// Whether settings allow a connection attempt at all
    pub fn is_configured(self) -> bool {
        !matches!(
            self,
            ConnectionStatus::NoUrlAndCredential
                | ConnectionStatus::NoUrl
                | ConnectionStatus::NoCredential
                | ConnectionStatus::Disabled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionStatus::NoUrlAndCredential => "no url and credential",
            ConnectionStatus::NoUrl => "no url",
            ConnectionStatus::NoCredential => "no credential",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::NoConnection => "no connection",
            ConnectionStatus::Unauthorized => "unauthorized",
            ConnectionStatus::Disabled => "disabled",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a client is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    #[default]
    Idle,
    Retrieving,
    Uploading,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub status: ConnectionStatus,
    /// Last error message; empty when healthy
    pub message: String,
    pub activity: ActivityStatus,
}

/// Publishes every status transition to subscribers
#[derive(Debug)]
pub struct StatusHandle {
    sender: watch::Sender<StatusSnapshot>,
}

impl StatusHandle {
    pub fn new(status: ConnectionStatus) -> Self {
        let (sender, _) = watch::channel(StatusSnapshot {
            status,
            message: String::new(),
            activity: ActivityStatus::Idle,
        });
        Self { sender }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.sender.borrow().clone()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.sender.borrow().status
    }

    pub fn message(&self) -> String {
        self.sender.borrow().message.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.sender.subscribe()
    }

    pub fn set(&self, status: ConnectionStatus, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(status = %status, message = %message, "Status changed");
        self.sender.send_modify(|snapshot| {
            snapshot.status = status;
            snapshot.message = message;
        });
    }

    /// Mark an activity for as long as the returned guard lives
    pub fn activity(&self, activity: ActivityStatus) -> ActivityGuard<'_> {
        self.sender.send_modify(|snapshot| snapshot.activity = activity);
        ActivityGuard { handle: self }
    }
}

pub struct ActivityGuard<'a> {
    handle: &'a StatusHandle,
}

impl Drop for ActivityGuard<'_> {
    fn drop(&mut self) {
        self.handle
            .sender
            .send_modify(|snapshot| snapshot.activity = ActivityStatus::Idle);
    }
}
