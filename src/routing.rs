//! HTTP handlers for the collaborators the wizard client talks to:
//! configuration, content cards, content search, usage tracking and stats.
//!
//! Every JSON answer uses the `{success, data}` envelope. Failures carry
//! `{kind, message}` as their data.

use actix::Addr;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::actors::document::{DocumentActor, GetCatalog, GetDocument};
use crate::actors::tracking_store::{GetStats, RecordOutcome, RecordUsage, ResetStats, TrackingStoreActor};
use crate::errors::{ErrorBody, WizardError};
use crate::templates;
use crate::tracking::{UsageEvent, UsageStatus};

#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

/// Server-side switches the handlers need.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub tracking_enabled: bool,
}

fn success<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(Envelope { success: true, data })
}

fn failure(status: StatusCode, body: ErrorBody) -> HttpResponse {
    HttpResponse::build(status).json(Envelope { success: false, data: body })
}

fn error_response(e: &WizardError) -> HttpResponse {
    let status = match e {
        WizardError::BadRequest(_) | WizardError::InvalidSelection(_) => StatusCode::BAD_REQUEST,
        WizardError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    failure(status, ErrorBody::from(e))
}

fn mailbox_failure(e: actix::MailboxError) -> HttpResponse {
    log::error!("An actor did not answer: {}. It might be shutting down.", e);
    failure(
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorBody {
            kind: "internal",
            message: "internal error".to_string(),
        },
    )
}

pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub async fn get_wizard(documents: web::Data<Addr<DocumentActor>>) -> HttpResponse {
    match documents.send(GetDocument).await {
        Ok(document) => success(document.as_ref()),
        Err(e) => mailbox_failure(e),
    }
}

pub async fn get_card(path: web::Path<u64>, documents: web::Data<Addr<DocumentActor>>) -> HttpResponse {
    let content_id = path.into_inner();
    if content_id == 0 {
        return error_response(&WizardError::BadRequest("invalid content id".to_string()));
    }
    let (document, catalog) = match (documents.send(GetDocument).await, documents.send(GetCatalog).await) {
        (Ok(document), Ok(catalog)) => (document, catalog),
        (Err(e), _) | (_, Err(e)) => return mailbox_failure(e),
    };
    let Some(entry) = catalog.get(content_id) else {
        return error_response(&WizardError::NotFound(format!("content {}", content_id)));
    };
    match templates::render_card(entry, &document.styles) {
        Ok(html) => success(html),
        Err(e) => error_response(&e),
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn search(query: web::Query<SearchQuery>, documents: web::Data<Addr<DocumentActor>>) -> HttpResponse {
    let catalog = match documents.send(GetCatalog).await {
        Ok(catalog) => catalog,
        Err(e) => return mailbox_failure(e),
    };
    match catalog.search(&query.q) {
        Ok(hits) => success(hits),
        Err(e) => error_response(&e),
    }
}

/// The tracking form as posted. Everything is optional and read leniently:
/// a bad count becomes 0 and an unknown status becomes `started`.
#[derive(Debug, Deserialize)]
pub struct TrackForm {
    pub user_id: Option<String>,
    pub status: Option<String>,
    pub steps_completed: Option<String>,
    pub form_state: Option<String>,
}

impl From<TrackForm> for UsageEvent {
    fn from(form: TrackForm) -> Self {
        UsageEvent {
            user_id: form.user_id.unwrap_or_default(),
            status: UsageStatus::parse(form.status.as_deref().unwrap_or_default()),
            steps_completed: form
                .steps_completed
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(0),
            form_state: form.form_state.unwrap_or_default(),
        }
    }
}

pub async fn track(
    form: web::Form<TrackForm>,
    store: web::Data<Addr<TrackingStoreActor>>,
    settings: web::Data<ServerSettings>,
) -> HttpResponse {
    if !settings.tracking_enabled {
        return success(Message { message: "tracking disabled".to_string() });
    }
    let event = UsageEvent::from(form.into_inner());
    match store.send(RecordUsage(event)).await {
        Ok(Ok(RecordOutcome::Recorded)) => success(Message { message: "tracked".to_string() }),
        Ok(Ok(RecordOutcome::AlreadyCompleted)) => {
            success(Message { message: "user already completed".to_string() })
        }
        Ok(Err(e)) => error_response(&e),
        Err(e) => mailbox_failure(e),
    }
}

pub async fn stats(store: web::Data<Addr<TrackingStoreActor>>) -> HttpResponse {
    match store.send(GetStats).await {
        Ok(stats) => success(stats),
        Err(e) => mailbox_failure(e),
    }
}

pub async fn reset_stats(store: web::Data<Addr<TrackingStoreActor>>) -> HttpResponse {
    match store.send(ResetStats).await {
        Ok(cleared) => success(serde_json::json!({ "cleared": cleared })),
        Err(e) => mailbox_failure(e),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/api/wizard", web::get().to(get_wizard))
        .route("/api/cards/{id}", web::get().to(get_card))
        .route("/api/search", web::get().to(search))
        .route("/api/track", web::post().to(track))
        .route("/api/stats", web::get().to(stats))
        .route("/api/stats", web::delete().to(reset_stats));
}
