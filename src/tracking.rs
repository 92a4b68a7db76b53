//! Usage tracking on the client side: every transition reports where the
//! session got to, without waiting for the answer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::WizardError;
use crate::state::FormState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageStatus {
    Started,
    InProgress,
    Completed,
    Abandoned,
}

impl UsageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageStatus::Started => "started",
            UsageStatus::InProgress => "in_progress",
            UsageStatus::Completed => "completed",
            UsageStatus::Abandoned => "abandoned",
        }
    }

    /// Unrecognised statuses are recorded as `started`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "in_progress" => UsageStatus::InProgress,
            "completed" => UsageStatus::Completed,
            "abandoned" => UsageStatus::Abandoned,
            _ => UsageStatus::Started,
        }
    }
}

/// One tracking event, in the shape the tracking endpoint accepts
/// (`form_state` travels as a JSON string).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEvent {
    pub user_id: String,
    pub status: UsageStatus,
    pub steps_completed: usize,
    pub form_state: String,
}

/// Where usage events go.
#[async_trait]
pub trait UsageSink: Send + Sync {
    /// Hands the event off and returns at once. Delivery failures are the
    /// sink's to log.
    fn send(&self, event: UsageEvent);

    /// Delivers the event and waits for it, for the last event before the
    /// process goes away.
    async fn send_beacon(&self, event: UsageEvent) -> Result<(), WizardError>;
}

pub struct Tracker {
    sink: Arc<dyn UsageSink>,
    session_id: String,
    enabled: bool,
}

impl Tracker {
    pub fn new(sink: Arc<dyn UsageSink>, session_id: String, enabled: bool) -> Self {
        Self {
            sink,
            session_id,
            enabled,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn set_session_id(&mut self, session_id: String) {
        self.session_id = session_id;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn event(&self, status: UsageStatus, steps_completed: usize, state: &FormState) -> UsageEvent {
        UsageEvent {
            user_id: self.session_id.clone(),
            status,
            steps_completed,
            form_state: state.to_json(),
        }
    }

    pub fn track(&self, status: UsageStatus, steps_completed: usize, state: &FormState) {
        if !self.enabled {
            return;
        }
        log::debug!("Tracking {} ({} steps)", status.as_str(), steps_completed);
        self.sink.send(self.event(status, steps_completed, state));
    }

    /// Sends `event` and waits at most `timeout` for it to be delivered.
    pub async fn beacon(&self, event: UsageEvent, timeout: Duration) {
        if !self.enabled {
            return;
        }
        match tokio::time::timeout(timeout, self.sink.send_beacon(event)).await {
            Ok(Ok(())) => log::debug!("Abandonment beacon delivered."),
            Ok(Err(e)) => log::warn!("Abandonment beacon failed: {}", e),
            Err(_) => log::warn!("Abandonment beacon timed out after {:?}.", timeout),
        }
    }
}

#[cfg(test)]
pub mod testing {
    //! An in-memory sink shared by the engine tests.
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingSink {
        pub events: Mutex<Vec<UsageEvent>>,
        pub beacons: Mutex<Vec<UsageEvent>>,
    }

    impl RecordingSink {
        pub fn statuses(&self) -> Vec<(UsageStatus, usize)> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|e| (e.status, e.steps_completed))
                .collect()
        }
    }

    #[async_trait]
    impl UsageSink for RecordingSink {
        fn send(&self, event: UsageEvent) {
            self.events.lock().unwrap().push(event);
        }

        async fn send_beacon(&self, event: UsageEvent) -> Result<(), WizardError> {
            self.beacons.lock().unwrap().push(event);
            Ok(())
        }
    }
}
