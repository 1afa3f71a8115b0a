use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{debug, error, info, warn};

use crate::draft::parse_draft_pick;
use crate::store::{record_draft_pick, DraftOutcome, PlayerStore};
use crate::teams::TeamTable;

pub mod signature;

/// Envelope posted by the Events API.
#[derive(Debug, Deserialize)]
pub struct SlackPayload {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub challenge: Option<String>,
    pub event: Option<SlackEvent>,
}

#[derive(Debug, Deserialize)]
pub struct SlackEvent {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub subtype: Option<String>,
    pub bot_id: Option<String>,
    pub text: Option<String>,
}

impl SlackEvent {
    /// Text of a plain message written by a person, if this is one.
    /// Edits, bot posts and other subtyped events yield `None`.
    fn authored_text(&self) -> Option<&str> {
        if self.kind != "message" || self.subtype.is_some() || self.bot_id.is_some() {
            return None;
        }
        self.text.as_deref()
    }
}

#[derive(Serialize)]
pub struct WebhookResponse {
    pub status: String,
    pub message: String,
}

#[derive(Serialize)]
struct ChallengeResponse {
    challenge: String,
}

fn reply(code: StatusCode, message: impl Into<String>) -> Response {
    let status = if code.is_success() { "success" } else { "error" };
    (
        code,
        Json(WebhookResponse {
            status: status.to_string(),
            message: message.into(),
        }),
    )
        .into_response()
}

/// Acknowledge a request we chose not to act on. Still a 200 so Slack
/// doesn't retry.
fn ignored(reason: &str) -> Response {
    debug!(reason, "ignoring event");
    reply(StatusCode::OK, format!("ignored: {reason}"))
}

// AppState to share data between routes
#[derive(Clone)]
pub struct AppState {
    pub signing_secret: Arc<str>,
    pub teams: Arc<TeamTable>,
    pub store: Arc<dyn PlayerStore>,
}

// Handler for Slack Events API POST requests
async fn handle_events(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let payload: SlackPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "rejecting webhook with malformed JSON");
            return reply(StatusCode::BAD_REQUEST, "Invalid JSON body");
        }
    };

    // The handshake arrives before any signature can be checked
    if payload.kind == "url_verification" {
        return match payload.challenge {
            Some(challenge) => {
                info!("answering url verification challenge");
                Json(ChallengeResponse { challenge }).into_response()
            }
            None => reply(StatusCode::BAD_REQUEST, "Missing challenge"),
        };
    }

    let now = Utc::now();
    if let Err(e) =
        signature::verify_request(&state.signing_secret, &headers, &body, now.timestamp())
    {
        warn!(error = %e, "rejecting webhook with bad signature");
        return reply(StatusCode::UNAUTHORIZED, "Invalid signature");
    }

    if payload.kind != "event_callback" {
        return ignored("not an event callback");
    }
    let Some(text) = payload.event.as_ref().and_then(SlackEvent::authored_text) else {
        return ignored("not an authored message");
    };

    let Some(pick) = parse_draft_pick(text) else {
        return ignored("not a draft pick");
    };
    info!(
        round = pick.round,
        pick = pick.pick,
        team = %pick.team_name,
        position = %pick.position,
        player = %pick.player_name,
        "parsed draft pick"
    );

    let Some(team_code) = state.teams.code_for(&pick.team_name) else {
        info!(team = %pick.team_name, "unrecognized team");
        return ignored("unrecognized team");
    };

    match record_draft_pick(state.store.as_ref(), &pick, team_code, now).await {
        Ok(DraftOutcome::Recorded { player_id, mark }) => reply(
            StatusCode::OK,
            format!(
                "Marked {player_id} drafted by {} (round {}, pick {})",
                mark.team, mark.round, mark.pick
            ),
        ),
        Ok(DraftOutcome::PlayerNotFound) => {
            reply(StatusCode::OK, format!("Player not found: {}", pick.player_name))
        }
        Ok(DraftOutcome::MissingId) => {
            reply(StatusCode::OK, format!("Player has no ID: {}", pick.player_name))
        }
        Err(e) => {
            error!(error = %e, player = %pick.player_name, "failed to record draft pick");
            reply(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update player store")
        }
    }
}

// Health check endpoint
async fn health_check() -> (StatusCode, Json<WebhookResponse>) {
    (
        StatusCode::OK,
        Json(WebhookResponse {
            status: "success".to_string(),
            message: "Webhook server is running".to_string(),
        }),
    )
}

fn panic_response(_: Box<dyn Any + Send + 'static>) -> Response {
    error!("webhook handler panicked");
    reply(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
}

/// Build the router. Non-POST requests to `events_path` get a 405 from the
/// method router; a panicking handler becomes a 500.
pub fn app_router(state: AppState, events_path: &str) -> Router {
    Router::new()
        .route(events_path, post(handle_events))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
}

/// Serve until Ctrl-C.
pub async fn start_webhook_server(
    state: AppState,
    port: u16,
    events_path: &str,
) -> Result<(), std::io::Error> {
    let app = app_router(state, events_path);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, path = events_path, "webhook server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down webhook server");
}
