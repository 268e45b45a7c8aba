//! In-memory development backend for maskdeck.
//!
//! Reproduces the production backend's wire contract (form-encoded requests,
//! FastAPI-style `{"detail": ...}` errors, ids stringified in responses) so
//! the client and the integration tests can drive the real HTTP path. State
//! lives in memory only.
//!
//! Ids are minted above 2^53 on purpose: any client that routes them through
//! a double-precision number corrupts them visibly.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use clap::Parser;
use tokio::sync::RwLock;

#[derive(Parser)]
#[command(name = "maskdeck-server")]
#[command(about = "Maskdeck development backend (in-memory)", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8000")]
    addr: SocketAddr,

    /// Write bound address to this file (dev/test convenience)
    #[arg(long)]
    addr_file: Option<PathBuf>,

    /// Pre-registered development user id
    #[arg(long, default_value = "42")]
    dev_user_id: String,

    /// Pre-registered development user name
    #[arg(long, default_value = "dev")]
    dev_username: String,
}

const FIRST_MASK_ID: u64 = 9_007_199_254_740_993; // 2^53 + 1

#[derive(Clone, Debug, serde::Serialize)]
struct MaskRow {
    id: String,
    user_id: String,
    mask_name: String,
    api_key: Option<String>,
    title: Option<String>,
    description: Option<String>,
    site_url: Vec<String>,
    created_at: String,
}

struct AppState {
    // Newest-first, matching the production ORDER BY created_at DESC.
    masks: RwLock<Vec<MaskRow>>,
    // Latest completed render per mask id. A re-queued job does not clear a
    // previous render; the poll endpoint always serves the newest completed one.
    renders: RwLock<HashMap<String, String>>,
    users: RwLock<HashMap<String, String>>,
    next_id: AtomicU64,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(err) = run().await {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let mut users = HashMap::new();
    users.insert(args.dev_user_id.clone(), args.dev_username.clone());

    let state = Arc::new(AppState {
        masks: RwLock::new(Vec::new()),
        renders: RwLock::new(HashMap::new()),
        users: RwLock::new(users),
        next_id: AtomicU64::new(FIRST_MASK_ID),
    });

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/masks/", get(list_masks))
        .route("/masks/add/", post(add_mask))
        .route("/masks/update/:id", put(rename_mask))
        .route("/masks/delete/:id", delete(delete_mask))
        .route("/describing/:id", get(mask_detail))
        .route("/describing/update/:id", put(update_detail))
        .route("/jobs/by-mask/:id", get(job_by_mask))
        .route("/jobs/by-mask/:id/complete", post(complete_job))
        .route("/embed/:id", get(embed_page))
        .route("/users/profile/", get(user_profile))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("bind {}", args.addr))?;
    let local_addr = listener.local_addr().context("read listener local addr")?;
    log::info!("maskdeck-server listening on {}", local_addr);

    if let Some(addr_file) = &args.addr_file {
        std::fs::write(addr_file, local_addr.to_string())
            .with_context(|| format!("write addr file {}", addr_file.display()))?;
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

async fn healthz() -> Response {
    Json(serde_json::json!({"ok": true})).into_response()
}

async fn list_masks(State(state): State<Arc<AppState>>) -> Response {
    let masks = state.masks.read().await;
    Json(masks.clone()).into_response()
}

async fn add_mask(State(state): State<Arc<AppState>>, body: String) -> Response {
    let form = FormFields::parse(&body);
    let Some(mask_name) = form.first("mask_name") else {
        return unprocessable("mask_name is required");
    };
    let Some(user_id) = form.first("user_id") else {
        return unprocessable("user_id is required");
    };

    let id = state.next_id.fetch_add(1, Ordering::SeqCst).to_string();
    let row = MaskRow {
        id,
        user_id: user_id.to_string(),
        mask_name: mask_name.to_string(),
        api_key: form.all("api_keys").first().cloned(),
        title: form.first("title").map(str::to_string),
        description: form.first("description").map(str::to_string),
        site_url: form.all("site_url"),
        created_at: now_rfc3339(),
    };

    let mut masks = state.masks.write().await;
    masks.insert(0, row.clone());
    Json(row).into_response()
}

async fn rename_mask(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: String,
) -> Response {
    let form = FormFields::parse(&body);
    let Some(mask_name) = form.first("mask_name") else {
        return unprocessable("mask_name is required");
    };

    let mut masks = state.masks.write().await;
    let Some(row) = masks.iter_mut().find(|m| m.id == id) else {
        return not_found("Mask not found");
    };
    row.mask_name = mask_name.to_string();
    Json(row.clone()).into_response()
}

async fn delete_mask(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let mut masks = state.masks.write().await;
    let before = masks.len();
    masks.retain(|m| m.id != id);
    if masks.len() == before {
        return not_found("Mask not found");
    }
    Json(serde_json::json!({"message": "Mask deleted successfully", "id": id})).into_response()
}

async fn mask_detail(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let masks = state.masks.read().await;
    let Some(row) = masks.iter().find(|m| m.id == id) else {
        return not_found("Mask not found");
    };
    Json(serde_json::json!({
        "id": row.id,
        "user_id": row.user_id,
        "title": row.title,
        "description": row.description,
        "site_url": row.site_url,
        "created_at": row.created_at,
    }))
    .into_response()
}

async fn update_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: String,
) -> Response {
    let form = FormFields::parse(&body);

    let mut masks = state.masks.write().await;
    let Some(row) = masks.iter_mut().find(|m| m.id == id) else {
        return not_found("Mask not found");
    };

    row.title = form.first("title").map(str::to_string);
    row.description = form.first("description").map(str::to_string);
    row.site_url = form.all("site_url");
    row.api_key = form.all("api_keys").first().cloned();
    if let Some(mask_name) = form.first("mask_name") {
        row.mask_name = mask_name.to_string();
    }

    // The real backend queues a fresh rendering job here; the previous
    // completed render keeps being served until a new one lands.
    let job_id = state.next_id.fetch_add(1, Ordering::SeqCst).to_string();
    Json(serde_json::json!({
        "status": "Job Triggered",
        "job_id": job_id,
        "mask_details": {"id": row.id, "user_id": row.user_id, "title": row.title},
    }))
    .into_response()
}

async fn job_by_mask(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let renders = state.renders.read().await;
    match renders.get(&id) {
        Some(html) => Json(serde_json::json!({"html_code": html})).into_response(),
        None => not_found("No completed job found for this mask"),
    }
}

// Dev-only stand-in for the rendering pipeline: installs the posted body as
// the mask's completed render.
async fn complete_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: String,
) -> Response {
    let mut renders = state.renders.write().await;
    renders.insert(id, body);
    Json(serde_json::json!({"status": "completed"})).into_response()
}

async fn embed_page(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let renders = state.renders.read().await;
    match renders.get(&id) {
        Some(html) => Html(html.clone()).into_response(),
        None => Html(
            "<html><body style=\"font-family: sans-serif\">\
             <h2>Widget Generating...</h2><p>Please check back in a moment.</p>\
             <script>setTimeout(function(){ location.reload(); }, 5000);</script>\
             </body></html>"
                .to_string(),
        )
        .into_response(),
    }
}

async fn user_profile(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(user_id) = params.get("user_id") else {
        return unprocessable("user_id is required");
    };
    let users = state.users.read().await;
    match users.get(user_id) {
        Some(username) => {
            Json(serde_json::json!({"id": user_id, "username": username})).into_response()
        }
        None => not_found("User not found"),
    }
}

// Ordered form decoding; repeated keys keep their submission order, which is
// what makes `site_url`/`api_keys` lists round-trip positionally.
struct FormFields(Vec<(String, String)>);

impl FormFields {
    fn parse(body: &str) -> Self {
        Self(
            url::form_urlencoded::parse(body.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        )
    }

    fn first(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn all(&self, key: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .collect()
    }
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

fn not_found(detail: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"detail": detail})),
    )
        .into_response()
}

fn unprocessable(detail: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(serde_json::json!({"detail": detail})),
    )
        .into_response()
}
