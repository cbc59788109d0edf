//! Route handlers.
//!
//! The handlers here are a thin shell around the dispatch core: the
//! inbox handler authorizes the request through its [`RequestContext`]
//! and hands the fan-out to the dispatcher. Heavier federation logic
//! (actor resolution, signature verification against fetched keys)
//! belongs to upstream collaborators.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
};
use serde_json::{Value, json};
use tracing::{debug, info};
use url::Url;

use crate::context::RequestContext;
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

pub async fn home(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": "pylon",
        "version": env!("CARGO_PKG_VERSION"),
        "host": state.config.server.host,
        "uptime_seconds": state.uptime().num_seconds(),
        "subscribers": state.registry.len(),
    }))
}

/// Accept one signed activity and fan it out to subscribed instances.
pub async fn inbox(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<RequestContext>>,
    Json(activity): Json<Value>,
) -> AppResult<StatusCode> {
    let Some(signature) = ctx.signature() else {
        return Err(AppError::unauthorized(
            "missing or malformed signature header",
        ));
    };

    let Some(origin) = signature.key_host().map(str::to_owned) else {
        return Err(AppError::unauthorized("signature keyId has no host"));
    };

    let Some(kind) = activity
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_owned)
    else {
        return Err(AppError::bad_request("activity has no type"));
    };

    if let Some(actor) = activity.get("actor") {
        ctx.set_actor(actor.clone());
    }
    ctx.set_instance(json!(origin));
    ctx.set_message(activity.clone());

    let origin_inbox: Url = format!("https://{origin}/inbox")
        .parse()
        .map_err(|_| AppError::bad_request("signature keyId host is not usable"))?;

    match kind.as_str() {
        "Follow" => {
            if state.registry.add(origin_inbox) {
                info!(instance = %origin, "instance subscribed");
            }
        }
        "Undo" => {
            if state.registry.remove(&origin_inbox) {
                info!(instance = %origin, "instance unsubscribed");
            }
        }
        _ => {
            // The same activity can arrive from several subscribers;
            // only the first copy is relayed.
            if let Some(id) = activity.get("id").and_then(Value::as_str)
                && let Some(seen) = state.caches.get("objects")
            {
                if seen.get(&id.to_owned()).is_some() {
                    debug!(activity = %kind, id, "duplicate activity skipped");
                    return Ok(StatusCode::ACCEPTED);
                }
                seen.insert(id.to_owned(), Value::Null);
            }

            let mut fanned_out = 0usize;
            for inbox in state.registry.snapshot() {
                // Never echo an activity back at its origin.
                if inbox.host_str() == Some(origin.as_str()) {
                    continue;
                }
                state.dispatcher.push(inbox, activity.clone());
                fanned_out += 1;
            }
            debug!(activity = %kind, instance = %origin, fanned_out, "activity relayed");
        }
    }

    Ok(StatusCode::ACCEPTED)
}

/// Dev-only runtime counters.
pub async fn stats(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "uptime_seconds": state.uptime().num_seconds(),
        "workers": state.dispatcher.worker_count(),
        "queue_depths": state.dispatcher.queue_depths(),
        "push_limit": state.gate.capacity(),
        "available_permits": state.gate.available(),
        "subscribers": state.registry.len(),
    }))
}
