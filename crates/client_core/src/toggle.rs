//! Start/stop toggle for the managed system.
//!
//! `is_admin` only decides whether the toggle is offered; the control
//! service still authorizes each request itself.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::{auth::AuthService, system_control::SystemControlService};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToggleState {
    #[default]
    Idle,
    /// A start or stop request is in flight.
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToggleSnapshot {
    pub running: bool,
    pub loading: bool,
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Caller is not an admin; nothing was sent.
    NotAuthorized,
    /// Another toggle is still in flight; nothing was sent.
    Busy,
    Started,
    Stopped,
    /// The request failed and `running` kept its previous value.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleEvent {
    StateChanged(ToggleSnapshot),
}

#[derive(Default)]
struct ToggleInner {
    running: bool,
    state: ToggleState,
    is_admin: bool,
}

impl ToggleInner {
    fn snapshot(&self) -> ToggleSnapshot {
        ToggleSnapshot {
            running: self.running,
            loading: self.state == ToggleState::Pending,
            is_admin: self.is_admin,
        }
    }
}

pub struct ControlToggle {
    auth: AuthService,
    service: Arc<dyn SystemControlService>,
    inner: Mutex<ToggleInner>,
    events: broadcast::Sender<ToggleEvent>,
}

impl ControlToggle {
    pub fn new(auth: AuthService, service: Arc<dyn SystemControlService>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            auth,
            service,
            inner: Mutex::new(ToggleInner::default()),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ToggleEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> ToggleSnapshot {
        self.inner.lock().await.snapshot()
    }

    pub async fn state(&self) -> ToggleState {
        self.inner.lock().await.state
    }

    /// Reads the admin flag once, then fetches the current status.
    pub async fn activate(&self) -> ToggleSnapshot {
        let is_admin = self.auth.is_admin();
        {
            let mut inner = self.inner.lock().await;
            inner.is_admin = is_admin;
            self.publish(inner.snapshot());
        }
        info!(is_admin, "control toggle activated");
        self.refresh_status().await
    }

    /// A failed fetch leaves `running` as it was.
    pub async fn refresh_status(&self) -> ToggleSnapshot {
        match self.service.get_status().await {
            Ok(status) => {
                let mut inner = self.inner.lock().await;
                inner.running = status.running;
                let snapshot = inner.snapshot();
                self.publish(snapshot);
                snapshot
            }
            Err(error) => {
                warn!(%error, "status refresh failed");
                self.snapshot().await
            }
        }
    }

    pub async fn toggle(&self) -> ToggleOutcome {
        let was_running = {
            let mut inner = self.inner.lock().await;
            if !inner.is_admin {
                return ToggleOutcome::NotAuthorized;
            }
            if inner.state == ToggleState::Pending {
                return ToggleOutcome::Busy;
            }
            inner.state = ToggleState::Pending;
            self.publish(inner.snapshot());
            inner.running
        };

        let result = if was_running {
            self.service.stop_system().await
        } else {
            self.service.start_system().await
        };

        let mut inner = self.inner.lock().await;
        inner.state = ToggleState::Idle;
        let outcome = match result {
            Ok(()) => {
                inner.running = !was_running;
                info!(running = inner.running, "system toggled");
                if was_running {
                    ToggleOutcome::Stopped
                } else {
                    ToggleOutcome::Started
                }
            }
            Err(error) => {
                // No user-facing notification yet; the outcome carries it.
                warn!(%error, was_running, "toggle request failed");
                ToggleOutcome::Failed {
                    reason: error.to_string(),
                }
            }
        };
        self.publish(inner.snapshot());
        outcome
    }

    fn publish(&self, snapshot: ToggleSnapshot) {
        let _ = self.events.send(ToggleEvent::StateChanged(snapshot));
    }
}

#[cfg(test)]
#[path = "tests/toggle_tests.rs"]
mod tests;
