// ABOUTME: API request handlers for images, bulk actions, registry and health.
// ABOUTME: Validate the request, call ImageService, serialize the result.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::error::ApiError;
use super::state::AppState;
use crate::images::{DeleteOutcome, ImageError, ImageRecord, LoadReport, PushOutcome};
use crate::registry::{RegistryHealth, RegistrySettings, RegistrySettingsView, check_health};
use crate::runtime::{BinaryProbe, CommandRunner};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    pub image: String,
    /// Retag into the configured registry before pushing.
    #[serde(default = "default_true")]
    pub use_registry: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushResponse {
    pub message: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRequest {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub images: Vec<String>,
    pub output_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub message: String,
    pub path: PathBuf,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRequest {
    pub file_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRequest {
    pub images: Vec<String>,
    #[serde(default = "default_true")]
    pub use_registry: bool,
}

fn default_true() -> bool {
    true
}

fn message(text: String) -> Json<Value> {
    Json(json!({ "message": text }))
}

fn require_images(images: &[String]) -> Result<(), ApiError> {
    if images.is_empty() {
        return Err(ImageError::EmptyNameList.into());
    }
    Ok(())
}

// The settings store does blocking file I/O; keep it off the async workers.
impl<R, P> AppState<R, P> {
    async fn load_registry(&self) -> Result<RegistrySettings, ApiError> {
        let store = Arc::clone(&self.registry);
        Ok(tokio::task::spawn_blocking(move || store.load()).await??)
    }

    async fn save_registry(
        &self,
        settings: RegistrySettings,
    ) -> Result<RegistrySettings, ApiError> {
        let store = Arc::clone(&self.registry);
        let saved =
            tokio::task::spawn_blocking(move || store.save(&settings).map(|()| settings)).await??;
        Ok(saved)
    }

    async fn registry_for(
        &self,
        use_registry: bool,
    ) -> Result<Option<RegistrySettings>, ApiError> {
        if !use_registry {
            return Ok(None);
        }
        let settings = self.load_registry().await?;
        Ok(settings.is_configured().then_some(settings))
    }
}

// ============================================================================
// Health
// ============================================================================

pub async fn health<R, P>(State(state): State<AppState<R, P>>) -> Json<Value>
where
    R: CommandRunner + 'static,
    P: BinaryProbe + 'static,
{
    let (runtime, runtime_error) = match state.images.executor().detect() {
        Ok(runtime) => (Some(runtime.to_string()), None),
        Err(e) => (None, Some(e.to_string())),
    };

    Json(json!({
        "status": "ok",
        "runtime": runtime,
        "runtimeError": runtime_error,
        "environment": state.info.environment,
        "hostname": state.info.hostname,
        "namespace": state.info.namespace,
        "podName": state.info.pod_name,
        "kubeconfig": state.info.kubeconfig,
    }))
}

// ============================================================================
// Images
// ============================================================================

pub async fn list_images<R, P>(
    State(state): State<AppState<R, P>>,
) -> Result<Json<Vec<ImageRecord>>, ApiError>
where
    R: CommandRunner + 'static,
    P: BinaryProbe + 'static,
{
    let listing = state.images.list_images().await?;
    Ok(Json(listing.images))
}

pub async fn get_image<R, P>(
    State(state): State<AppState<R, P>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError>
where
    R: CommandRunner + 'static,
    P: BinaryProbe + 'static,
{
    let details = state.images.inspect_image(&name).await?;
    Ok(Json(details))
}

pub async fn delete_image<R, P>(
    State(state): State<AppState<R, P>>,
    Path(name): Path<String>,
) -> Result<Json<DeleteOutcome>, ApiError>
where
    R: CommandRunner + 'static,
    P: BinaryProbe + 'static,
{
    let text = state.images.delete_image(&name).await?;
    Ok(Json(DeleteOutcome {
        image_name: name,
        success: true,
        message: Some(text),
        error: None,
    }))
}

pub async fn pull_image<R, P>(
    State(state): State<AppState<R, P>>,
    Json(request): Json<PullRequest>,
) -> Result<Json<Value>, ApiError>
where
    R: CommandRunner + 'static,
    P: BinaryProbe + 'static,
{
    let text = state.images.pull_image(&request.image).await?;
    Ok(message(text))
}

pub async fn push_image<R, P>(
    State(state): State<AppState<R, P>>,
    Json(request): Json<PushRequest>,
) -> Result<Json<PushResponse>, ApiError>
where
    R: CommandRunner + 'static,
    P: BinaryProbe + 'static,
{
    let registry = state.registry_for(request.use_registry).await?;
    let target = state
        .images
        .push_image(&request.image, registry.as_ref())
        .await?;
    Ok(Json(PushResponse {
        message: format!("Successfully pushed {target}"),
        target,
    }))
}

pub async fn tag_image<R, P>(
    State(state): State<AppState<R, P>>,
    Json(request): Json<TagRequest>,
) -> Result<Json<Value>, ApiError>
where
    R: CommandRunner + 'static,
    P: BinaryProbe + 'static,
{
    let text = state
        .images
        .tag_image(&request.source, &request.target)
        .await?;
    Ok(message(text))
}

pub async fn save_image<R, P>(
    State(state): State<AppState<R, P>>,
    Json(request): Json<SaveRequest>,
) -> Result<Json<SaveResponse>, ApiError>
where
    R: CommandRunner + 'static,
    P: BinaryProbe + 'static,
{
    let names = NonEmpty::from_vec(request.images).ok_or(ImageError::EmptyNameList)?;
    let archive = state
        .images
        .save_image(&names, &request.output_path)
        .await?;
    Ok(Json(SaveResponse {
        message: format!("Saved {} image(s)", archive.images.len()),
        path: archive.path,
        size: archive.size,
    }))
}

pub async fn load_image<R, P>(
    State(state): State<AppState<R, P>>,
    Json(request): Json<LoadRequest>,
) -> Result<Json<LoadReport>, ApiError>
where
    R: CommandRunner + 'static,
    P: BinaryProbe + 'static,
{
    let report = state.images.load_image(&request.file_path).await?;
    Ok(Json(report))
}

// ============================================================================
// Bulk
// ============================================================================

pub async fn bulk_delete<R, P>(
    State(state): State<AppState<R, P>>,
    Json(request): Json<BulkRequest>,
) -> Result<Json<Vec<DeleteOutcome>>, ApiError>
where
    R: CommandRunner + 'static,
    P: BinaryProbe + 'static,
{
    require_images(&request.images)?;
    Ok(Json(state.images.delete_images(&request.images).await))
}

pub async fn bulk_push<R, P>(
    State(state): State<AppState<R, P>>,
    Json(request): Json<BulkRequest>,
) -> Result<Json<Vec<PushOutcome>>, ApiError>
where
    R: CommandRunner + 'static,
    P: BinaryProbe + 'static,
{
    require_images(&request.images)?;
    let registry = state.registry_for(request.use_registry).await?;
    Ok(Json(
        state
            .images
            .push_images(&request.images, registry.as_ref())
            .await,
    ))
}

// ============================================================================
// Registry
// ============================================================================

pub async fn registry_health<R, P>(
    State(state): State<AppState<R, P>>,
) -> Result<Json<RegistryHealth>, ApiError>
where
    R: CommandRunner + 'static,
    P: BinaryProbe + 'static,
{
    let settings = state.load_registry().await?;
    Ok(Json(check_health(&state.http, &settings).await))
}

pub async fn get_registry_config<R, P>(
    State(state): State<AppState<R, P>>,
) -> Result<Json<RegistrySettingsView>, ApiError>
where
    R: CommandRunner + 'static,
    P: BinaryProbe + 'static,
{
    let settings = state.load_registry().await?;
    Ok(Json(RegistrySettingsView::from(&settings)))
}

pub async fn put_registry_config<R, P>(
    State(state): State<AppState<R, P>>,
    Json(settings): Json<RegistrySettings>,
) -> Result<Json<RegistrySettingsView>, ApiError>
where
    R: CommandRunner + 'static,
    P: BinaryProbe + 'static,
{
    let settings = state.save_registry(settings).await?;
    Ok(Json(RegistrySettingsView::from(&settings)))
}
