use crate::config::{self, AppConfig};
use crate::dashboard::{Dashboard, JobCard};
use crate::identity::{resolve, CompletionOutcome, IdentityProvider, Rendition, TokenStore};
use crate::editor::Editor;
use crate::selection::{DisplayGeometry, Overlay};
use crate::service::{HttpJobService, JobId, JobService, VideoUpload};
use crate::session::{JobOrchestrator, Notice, SessionEvents, SessionProgress, Step};
use futures_util::StreamExt;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tauri::{AppHandle, Emitter, Manager, State};
use tauri_plugin_opener::OpenerExt;
use tokio::io::AsyncWriteExt;

struct AppState {
    editor: Editor,
    dashboard: Dashboard,
    service: Arc<HttpJobService>,
    tokens: Arc<TokenStore>,
    config: Mutex<AppConfig>,
    config_path: PathBuf,
}

impl AppState {
    fn persist_token(&self, token: Option<&str>) -> Result<(), String> {
        let mut config = self.config.lock().map_err(|e| e.to_string())?;
        config.set_auth_token(token);
        config::save(&self.config_path, &config).map_err(|e| e.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct StepPayload {
    job_id: JobId,
    step: Step,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressPayload {
    job_id: JobId,
    progress: u8,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct PreviewPayload {
    job_id: JobId,
    outcome: CompletionOutcome,
}

/// Forwards session events to the webview
struct TauriEvents {
    app: AppHandle,
}

impl SessionEvents for TauriEvents {
    fn notice(&self, notice: Notice) {
        let _ = self.app.emit("notice", notice);
    }

    fn step_changed(&self, job_id: &JobId, step: Step) {
        let payload = StepPayload {
            job_id: job_id.clone(),
            step,
        };
        let _ = self.app.emit("session:step", payload);
    }

    fn progress(&self, job_id: &JobId, progress: u8) {
        let payload = ProgressPayload {
            job_id: job_id.clone(),
            progress,
        };
        let _ = self.app.emit("session:progress", payload);
    }

    fn completed(&self, job_id: &JobId, outcome: &CompletionOutcome) {
        match outcome {
            CompletionOutcome::NavigateToDashboard => {
                if let Err(e) = show_dashboard(&self.app) {
                    tracing::warn!("Could not open dashboard after job {}: {}", job_id, e);
                }
            }
            CompletionOutcome::ShowPreview { .. } => {
                let payload = PreviewPayload {
                    job_id: job_id.clone(),
                    outcome: outcome.clone(),
                };
                let _ = self.app.emit("session:preview", payload);
            }
        }
    }

    fn redraw(&self, overlay: &Overlay) {
        let _ = self.app.emit("selector:redraw", overlay.clone());
    }
}

fn show_dashboard(app: &AppHandle) -> Result<(), String> {
    let Some(window) = app.get_webview_window("dashboard") else {
        return Err("dashboard window not found".to_string());
    };

    window.show().map_err(|e| e.to_string())?;
    window.unminimize().map_err(|e| e.to_string())?;
    window.set_focus().map_err(|e| e.to_string())?;
    let _ = app.emit_to("dashboard", "dashboard:refresh", ());
    Ok(())
}

#[tauri::command]
async fn upload_video(
    path: String,
    state: State<'_, AppState>,
    app_handle: AppHandle,
) -> Result<SessionProgress, String> {
    let video = match VideoUpload::from_path(&path) {
        Ok(video) => video,
        Err(e) => {
            let _ = app_handle.emit("notice", Notice::warning(e.to_string()));
            return Err(e.to_string());
        }
    };

    state.editor.upload(&video).await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn open_job(job_id: String, state: State<'_, AppState>) -> Result<SessionProgress, String> {
    state.editor.open(JobId::new(job_id)).await.map_err(|e| e.to_string())
}

#[tauri::command]
fn toggle_selection(state: State<'_, AppState>) -> Overlay {
    state.editor.toggle_selection()
}

#[tauri::command]
fn pointer_down(x: f64, y: f64, state: State<'_, AppState>) -> Overlay {
    state.editor.pointer_down(x, y)
}

#[tauri::command]
fn pointer_move(x: f64, y: f64, state: State<'_, AppState>) -> Overlay {
    state.editor.pointer_move(x, y)
}

#[tauri::command]
fn pointer_up(playback_secs: f64, state: State<'_, AppState>) -> Overlay {
    state.editor.pointer_up(playback_secs)
}

#[tauri::command]
fn remove_selection(id: String, state: State<'_, AppState>) -> Overlay {
    state.editor.remove(&id)
}

#[tauri::command]
fn set_display_geometry(geometry: DisplayGeometry, state: State<'_, AppState>) -> Overlay {
    state.editor.set_geometry(geometry)
}

#[tauri::command]
async fn proceed_to_review(state: State<'_, AppState>) -> Result<SessionProgress, String> {
    state.editor.proceed().await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn back_to_selection(state: State<'_, AppState>) -> Result<SessionProgress, String> {
    state.editor.orchestrator().back().await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn start_processing(state: State<'_, AppState>) -> Result<SessionProgress, String> {
    state.editor.orchestrator().start_processing().await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn close_session(state: State<'_, AppState>) -> Result<(), String> {
    state.editor.close().await;
    Ok(())
}

#[tauri::command]
async fn session_snapshot(state: State<'_, AppState>) -> Result<Option<SessionProgress>, String> {
    Ok(state.editor.orchestrator().snapshot().await)
}

/// Source video for the selection surface
#[tauri::command]
fn video_stream_url(job_id: String, state: State<'_, AppState>) -> Result<String, String> {
    let access = resolve(&state.tokens.current());
    Ok(state
        .service
        .stream_url(&access, &JobId::new(job_id), Rendition::Full))
}

#[tauri::command]
async fn list_jobs(state: State<'_, AppState>) -> Result<Vec<JobCard>, String> {
    state.dashboard.jobs().await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn delete_job(job_id: String, state: State<'_, AppState>, app_handle: AppHandle) -> Result<(), String> {
    state
        .dashboard
        .delete(&JobId::new(job_id))
        .await
        .map_err(|e| e.to_string())?;
    let _ = app_handle.emit_to("dashboard", "dashboard:refresh", ());
    Ok(())
}

#[tauri::command]
async fn download_job(job_id: String, state: State<'_, AppState>, app_handle: AppHandle) -> Result<String, String> {
    let link = state
        .dashboard
        .download_link(&JobId::new(job_id))
        .await
        .map_err(|e| e.to_string())?;
    app_handle
        .opener()
        .open_url(link.download_url.as_str(), None::<&str>)
        .map_err(|e| e.to_string())?;
    Ok(link.download_url)
}

/// Stream a job's video to disk in the rendition the viewer is entitled to
#[tauri::command]
async fn save_video(job_id: String, destination: String, state: State<'_, AppState>) -> Result<u64, String> {
    let job_id = JobId::new(job_id);
    let access = resolve(&state.tokens.current());
    let rendition = Rendition::for_family(access.family());

    let stream = state
        .service
        .video_stream(&access, &job_id, rendition)
        .await
        .map_err(|e| e.to_string())?;
    futures_util::pin_mut!(stream);

    let mut file = tokio::fs::File::create(&destination)
        .await
        .map_err(|e| format!("Failed to create {}: {}", destination, e))?;
    let mut written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| e.to_string())?;
        file.write_all(&chunk).await.map_err(|e| e.to_string())?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(|e| e.to_string())?;

    tracing::info!("Saved job {} ({:?}, {} bytes) to {}", job_id, rendition, written, destination);
    Ok(written)
}

#[tauri::command]
fn set_auth_token(token: String, state: State<'_, AppState>, app_handle: AppHandle) -> Result<(), String> {
    state.tokens.set(&token);
    state.persist_token(Some(&token))?;
    tracing::info!("Signed in");
    let _ = app_handle.emit_to("dashboard", "dashboard:refresh", ());
    Ok(())
}

#[tauri::command]
fn sign_out(state: State<'_, AppState>, app_handle: AppHandle) -> Result<(), String> {
    state.tokens.clear();
    state.persist_token(None)?;
    tracing::info!("Signed out");
    if let Some(window) = app_handle.get_webview_window("dashboard") {
        let _ = window.hide();
    }
    Ok(())
}

fn build_state(app: &AppHandle) -> Result<AppState, Box<dyn std::error::Error>> {
    let data_dir = app.path().app_data_dir()?;
    let config_path = config::config_path(&data_dir)?;
    let config = config::load_or_create(&config_path)?;

    let service = Arc::new(HttpJobService::new(&config.resolve_api_base_url())?);
    let tokens = Arc::new(TokenStore::new(config.auth_token()));
    let events = Arc::new(TauriEvents { app: app.clone() });

    let orchestrator = JobOrchestrator::new(service.clone(), tokens.clone(), events.clone(), config.poll_interval());
    let dashboard = Dashboard::new(service.clone(), tokens.clone());

    Ok(AppState {
        editor: Editor::new(orchestrator, events),
        dashboard,
        service,
        tokens,
        config: Mutex::new(config),
        config_path,
    })
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Load environment variables from .env file
    let _ = dotenvy::dotenv();
    crate::init_logging();

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let state = build_state(app.handle())?;
            if state.tokens.current().is_authenticated() {
                tracing::info!("Restored saved sign-in");
            }
            app.manage(state);

            if let Some(dashboard) = app.get_webview_window("dashboard") {
                let _ = dashboard.hide();
            }
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            upload_video,
            open_job,
            toggle_selection,
            pointer_down,
            pointer_move,
            pointer_up,
            remove_selection,
            set_display_geometry,
            proceed_to_review,
            back_to_selection,
            start_processing,
            close_session,
            session_snapshot,
            video_stream_url,
            list_jobs,
            delete_job,
            download_job,
            save_video,
            set_auth_token,
            sign_out
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
