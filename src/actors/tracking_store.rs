use actix::prelude::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::WizardError;
use crate::tracking::{UsageEvent, UsageStatus};

/// The latest known state of one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRow {
    pub status: UsageStatus,
    pub steps_completed: usize,
    pub form_state: Option<serde_json::Value>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    pub total: usize,
    pub started: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub abandoned: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    Recorded,
    /// An `abandoned` event for a session that already completed.
    AlreadyCompleted,
}

/// One row per session id. Every event replaces the row, except that a
/// completed session is never marked abandoned.
#[derive(Default)]
pub struct TrackingStoreActor {
    rows: HashMap<String, UsageRow>,
}

impl TrackingStoreActor {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, event: UsageEvent) -> Result<RecordOutcome, WizardError> {
        let user_id = event.user_id.trim();
        if user_id.is_empty() {
            return Err(WizardError::BadRequest("user_id is required".to_string()));
        }

        if event.status == UsageStatus::Abandoned {
            if let Some(existing) = self.rows.get(user_id) {
                if existing.status == UsageStatus::Completed {
                    log::debug!("Session {} already completed; ignoring abandonment.", user_id);
                    return Ok(RecordOutcome::AlreadyCompleted);
                }
            }
        }

        let form_state = if event.form_state.trim().is_empty() {
            None
        } else {
            match serde_json::from_str(&event.form_state) {
                Ok(value) => Some(value),
                Err(e) => {
                    log::debug!("Storing session {} without its unreadable form state: {}", user_id, e);
                    None
                }
            }
        };

        self.rows.insert(
            user_id.to_string(),
            UsageRow {
                status: event.status,
                steps_completed: event.steps_completed,
                form_state,
                updated_at: Utc::now(),
            },
        );
        Ok(RecordOutcome::Recorded)
    }

    fn stats(&self) -> UsageStats {
        let mut stats = UsageStats {
            total: self.rows.len(),
            ..Default::default()
        };
        for row in self.rows.values() {
            match row.status {
                UsageStatus::Started => stats.started += 1,
                UsageStatus::InProgress => stats.in_progress += 1,
                UsageStatus::Completed => stats.completed += 1,
                UsageStatus::Abandoned => stats.abandoned += 1,
            }
        }
        stats
    }
}

impl Actor for TrackingStoreActor {
    type Context = Context<Self>;
}

#[derive(Message)]
#[rtype(result = "Result<RecordOutcome, WizardError>")]
pub struct RecordUsage(pub UsageEvent);

impl Handler<RecordUsage> for TrackingStoreActor {
    type Result = Result<RecordOutcome, WizardError>;

    fn handle(&mut self, msg: RecordUsage, _ctx: &mut Context<Self>) -> Self::Result {
        self.record(msg.0)
    }
}

#[derive(Message)]
#[rtype(result = "UsageStats")]
pub struct GetStats;

impl Handler<GetStats> for TrackingStoreActor {
    type Result = MessageResult<GetStats>;

    fn handle(&mut self, _msg: GetStats, _ctx: &mut Context<Self>) -> Self::Result {
        MessageResult(self.stats())
    }
}

#[derive(Message)]
#[rtype(result = "Option<UsageRow>")]
pub struct GetRow(pub String);

impl Handler<GetRow> for TrackingStoreActor {
    type Result = MessageResult<GetRow>;

    fn handle(&mut self, msg: GetRow, _ctx: &mut Context<Self>) -> Self::Result {
        MessageResult(self.rows.get(&msg.0).cloned())
    }
}

/// Drops every row. Answers with how many there were.
#[derive(Message)]
#[rtype(result = "usize")]
pub struct ResetStats;

impl Handler<ResetStats> for TrackingStoreActor {
    type Result = usize;

    fn handle(&mut self, _msg: ResetStats, _ctx: &mut Context<Self>) -> Self::Result {
        let cleared = self.rows.len();
        self.rows.clear();
        log::info!("Usage statistics reset ({} session(s) cleared).", cleared);
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(user_id: &str, status: UsageStatus, steps: usize) -> UsageEvent {
        UsageEvent {
            user_id: user_id.to_string(),
            status,
            steps_completed: steps,
            form_state: r#"{"size":"small"}"#.to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_completed_is_never_abandoned() {
        let addr = TrackingStoreActor::new().start();
        addr.send(RecordUsage(event("wf_1", UsageStatus::InProgress, 1))).await.unwrap().unwrap();
        addr.send(RecordUsage(event("wf_1", UsageStatus::Completed, 3))).await.unwrap().unwrap();

        let outcome = addr
            .send(RecordUsage(event("wf_1", UsageStatus::Abandoned, 1)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome, RecordOutcome::AlreadyCompleted);

        let row = addr.send(GetRow("wf_1".into())).await.unwrap().unwrap();
        assert_eq!(row.status, UsageStatus::Completed);
        assert_eq!(row.steps_completed, 3);
    }

    #[actix_rt::test]
    async fn test_one_row_per_session_and_stats() {
        let addr = TrackingStoreActor::new().start();
        addr.send(RecordUsage(event("a", UsageStatus::Started, 0))).await.unwrap().unwrap();
        addr.send(RecordUsage(event("a", UsageStatus::InProgress, 1))).await.unwrap().unwrap();
        addr.send(RecordUsage(event("b", UsageStatus::Completed, 3))).await.unwrap().unwrap();
        addr.send(RecordUsage(event("c", UsageStatus::Abandoned, 2))).await.unwrap().unwrap();
        addr.send(RecordUsage(event("d", UsageStatus::Started, 0))).await.unwrap().unwrap();

        let stats = addr.send(GetStats).await.unwrap();
        assert_eq!(
            stats,
            UsageStats { total: 4, started: 1, in_progress: 1, completed: 1, abandoned: 1 }
        );

        assert_eq!(addr.send(ResetStats).await.unwrap(), 4);
        assert_eq!(addr.send(GetStats).await.unwrap(), UsageStats::default());
    }

    #[actix_rt::test]
    async fn test_empty_user_id_is_rejected() {
        let addr = TrackingStoreActor::new().start();
        let result = addr.send(RecordUsage(event("  ", UsageStatus::Started, 0))).await.unwrap();
        assert!(matches!(result, Err(WizardError::BadRequest(_))));
        assert_eq!(addr.send(GetStats).await.unwrap().total, 0);
    }

    #[actix_rt::test]
    async fn test_unreadable_form_state_is_dropped() {
        let addr = TrackingStoreActor::new().start();
        let mut bad = event("a", UsageStatus::InProgress, 1);
        bad.form_state = "{nope".to_string();
        addr.send(RecordUsage(bad)).await.unwrap().unwrap();
        let row = addr.send(GetRow("a".into())).await.unwrap().unwrap();
        assert!(row.form_state.is_none());

        addr.send(RecordUsage(event("a", UsageStatus::InProgress, 1))).await.unwrap().unwrap();
        let row = addr.send(GetRow("a".into())).await.unwrap().unwrap();
        assert_eq!(row.form_state, Some(serde_json::json!({"size": "small"})));
    }
}
