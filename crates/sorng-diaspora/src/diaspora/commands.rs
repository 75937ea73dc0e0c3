//! Tauri commands for the diaspora* integration.
//!
//! Each function is a `#[tauri::command]` that can be invoked
//! from the frontend via `invoke("diaspora_command_name", { ... })`.

use crate::diaspora::error::DiasporaError;
use crate::diaspora::service::DiasporaServiceState;
use crate::diaspora::types::*;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

// ── Configuration ───────────────────────────────────────────────────

#[tauri::command]
pub async fn diaspora_get_config(
    state: tauri::State<'_, DiasporaServiceState>,
) -> Result<DiasporaConfig, String> {
    let svc = state.lock().await;
    Ok(svc.config())
}

#[tauri::command]
pub async fn diaspora_set_config(
    state: tauri::State<'_, DiasporaServiceState>,
    config: DiasporaConfig,
) -> Result<(), String> {
    let mut svc = state.lock().await;
    svc.update_config(config);
    Ok(())
}

#[tauri::command]
pub async fn diaspora_get_pod_url(
    state: tauri::State<'_, DiasporaServiceState>,
    path: Option<String>,
) -> Result<String, String> {
    let svc = state.lock().await;
    Ok(svc.get_pod_url(path.as_deref().unwrap_or("")))
}

// ── Session ─────────────────────────────────────────────────────────

#[tauri::command]
pub async fn diaspora_init(
    state: tauri::State<'_, DiasporaServiceState>,
    pod: Option<String>,
    secure: Option<bool>,
) -> Result<(), String> {
    let mut svc = state.lock().await;
    svc.init(pod.as_deref(), secure).await.map_err(|e| e.message)
}

#[tauri::command]
pub async fn diaspora_login(
    state: tauri::State<'_, DiasporaServiceState>,
    username: String,
    password: String,
    force: Option<bool>,
) -> Result<(), String> {
    let mut svc = state.lock().await;
    svc.login(&username, &password, force.unwrap_or(false))
        .await
        .map_err(|e| e.message)
}

#[tauri::command]
pub async fn diaspora_logout(state: tauri::State<'_, DiasporaServiceState>) -> Result<(), String> {
    let mut svc = state.lock().await;
    svc.logout();
    Ok(())
}

#[tauri::command]
pub async fn diaspora_deinit(state: tauri::State<'_, DiasporaServiceState>) -> Result<(), String> {
    let mut svc = state.lock().await;
    svc.deinit();
    Ok(())
}

#[tauri::command]
pub async fn diaspora_is_logged_in(
    state: tauri::State<'_, DiasporaServiceState>,
) -> Result<bool, String> {
    let svc = state.lock().await;
    Ok(svc.is_logged_in())
}

/// Last structured error, kind and context included.
#[tauri::command]
pub async fn diaspora_last_error(
    state: tauri::State<'_, DiasporaServiceState>,
) -> Result<Option<DiasporaError>, String> {
    let svc = state.lock().await;
    Ok(svc.last_error().cloned())
}

#[tauri::command]
pub async fn diaspora_export_session(
    state: tauri::State<'_, DiasporaServiceState>,
) -> Result<SessionSnapshot, String> {
    let svc = state.lock().await;
    Ok(svc.export_session())
}

#[tauri::command]
pub async fn diaspora_restore_session(
    state: tauri::State<'_, DiasporaServiceState>,
    snapshot: SessionSnapshot,
) -> Result<(), String> {
    let mut svc = state.lock().await;
    svc.restore_session(snapshot);
    Ok(())
}

// ── Operations ──────────────────────────────────────────────────────

/// Post a status message. `aspects` defaults to public.
#[tauri::command]
pub async fn diaspora_post(
    state: tauri::State<'_, DiasporaServiceState>,
    text: String,
    aspects: Option<Vec<String>>,
    extra_fields: Option<Map<String, Value>>,
) -> Result<PostResult, String> {
    let mut svc = state.lock().await;
    svc.post(
        &text,
        aspects.unwrap_or_default(),
        extra_fields.unwrap_or_default(),
    )
    .await
    .map_err(|e| e.message)
}

#[tauri::command]
pub async fn diaspora_delete(
    state: tauri::State<'_, DiasporaServiceState>,
    kind: String,
    id: String,
) -> Result<(), String> {
    let mut svc = state.lock().await;
    svc.delete(&kind, &id).await.map_err(|e| e.message)
}

#[tauri::command]
pub async fn diaspora_get_aspects(
    state: tauri::State<'_, DiasporaServiceState>,
    force: Option<bool>,
) -> Result<BTreeMap<String, String>, String> {
    let mut svc = state.lock().await;
    svc.get_aspects(force.unwrap_or(false))
        .await
        .map_err(|e| e.message)
}

#[tauri::command]
pub async fn diaspora_get_services(
    state: tauri::State<'_, DiasporaServiceState>,
    force: Option<bool>,
) -> Result<BTreeMap<String, String>, String> {
    let mut svc = state.lock().await;
    svc.get_services(force.unwrap_or(false))
        .await
        .map_err(|e| e.message)
}
