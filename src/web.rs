use actix_files::Files;
use actix_web::{middleware, web, App, HttpResponse, HttpServer, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

use crate::assignment::{RosterEntry, Session, Slot};
use crate::directory::DirectorySource;
use crate::display::summary;
use crate::error::AssignmentError;
use crate::form::{quick_fill, FormDocument, ProjectionReport};
use crate::storage::SaveStatus;

pub struct AppState {
    pub session: Mutex<Session>,
    pub save_status: watch::Receiver<SaveStatus>,
    pub directory_source: Arc<dyn DirectorySource>,
}

#[derive(Deserialize)]
pub struct RosterQuery {
    #[serde(default)]
    search: String,
}

#[derive(Serialize)]
pub struct RosterResponse {
    directory_empty: bool,
    entries: Vec<RosterEntry>,
}

#[derive(Serialize)]
pub struct AssignmentResponse {
    slots: Vec<Slot>,
    notes: String,
}

#[derive(Deserialize)]
pub struct PlaceRequest {
    code: String,
    role: String,
}

#[derive(Deserialize)]
pub struct ClearRequest {
    role: String,
}

#[derive(Deserialize)]
pub struct GroupRequest {
    title: Option<String>,
}

#[derive(Deserialize)]
pub struct ReloadRequest {
    #[serde(default)]
    confirm: bool,
}

#[derive(Serialize)]
pub struct FillResponse {
    form: FormDocument,
    report: ProjectionReport,
    message: String,
}

fn lock(state: &AppState) -> Result<MutexGuard<'_, Session>> {
    state
        .session
        .lock()
        .map_err(|_| actix_web::error::ErrorInternalServerError("session lock poisoned"))
}

fn rejected(e: AssignmentError) -> HttpResponse {
    let body = serde_json::json!({"success": false, "error": e.to_string()});
    match e {
        AssignmentError::UnknownSlot(_)
        | AssignmentError::UnknownGroup(_)
        | AssignmentError::UnknownPerson(_) => HttpResponse::NotFound().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

fn assignment_response(session: &Session) -> AssignmentResponse {
    AssignmentResponse {
        slots: session.slots(),
        notes: session.notes().to_string(),
    }
}

// Roster with visibility derived from the assignment
async fn get_roster(
    query: web::Query<RosterQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let session = lock(&state)?;
    Ok(HttpResponse::Ok().json(RosterResponse {
        directory_empty: session.directory_is_empty(),
        entries: session.roster_view(&query.search),
    }))
}

async fn get_assignments(state: web::Data<AppState>) -> Result<HttpResponse> {
    let session = lock(&state)?;
    Ok(HttpResponse::Ok().json(assignment_response(&session)))
}

async fn get_summary(state: web::Data<AppState>) -> Result<HttpResponse> {
    let session = lock(&state)?;
    let text = summary(session.model(), session.store());
    Ok(HttpResponse::Ok().json(serde_json::json!({"summary": text})))
}

async fn get_status(state: web::Data<AppState>) -> Result<HttpResponse> {
    let status = state.save_status.borrow().clone();
    Ok(HttpResponse::Ok().json(status))
}

async fn place(
    req: web::Json<PlaceRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let mut session = lock(&state)?;
    match session.place_code(&req.code, &req.role) {
        Ok(transition) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "transition": transition,
            "assignments": assignment_response(&session),
        }))),
        Err(e) => Ok(rejected(e)),
    }
}

async fn clear(
    req: web::Json<ClearRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let mut session = lock(&state)?;
    match session.clear(&req.role) {
        Ok(transition) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "transition": transition,
        }))),
        Err(e) => Ok(rejected(e)),
    }
}

async fn create_group(
    req: web::Json<GroupRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let mut session = lock(&state)?;
    let title = req
        .title
        .as_deref()
        .unwrap_or(crate::assignment::groups::DEFAULT_CUSTOM_TITLE);
    let id = session.create_custom_group(title);
    Ok(HttpResponse::Created().json(serde_json::json!({"success": true, "id": id})))
}

async fn rename_group(
    path: web::Path<String>,
    req: web::Json<GroupRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let mut session = lock(&state)?;
    let title = req.title.clone().unwrap_or_default();
    match session.rename_group(&path, &title) {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({"success": true}))),
        Err(e) => Ok(rejected(e)),
    }
}

async fn delete_group(path: web::Path<String>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut session = lock(&state)?;
    match session.delete_group(&path) {
        Ok(released) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "released": released,
        }))),
        Err(e) => Ok(rejected(e)),
    }
}

async fn create_slot(path: web::Path<String>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut session = lock(&state)?;
    match session.create_dynamic_slot(&path) {
        Ok(role) => Ok(HttpResponse::Created().json(serde_json::json!({"success": true, "role": role}))),
        Err(e) => Ok(rejected(e)),
    }
}

async fn delete_slot(path: web::Path<String>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut session = lock(&state)?;
    match session.delete_slot(&path) {
        Ok(released) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "released": released,
        }))),
        Err(e) => Ok(rejected(e)),
    }
}

// Re-reads the directory; destroys the current assignment
async fn reload(
    req: web::Json<ReloadRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !req.confirm {
        return Ok(rejected(AssignmentError::ReloadNotConfirmed));
    }
    let directory = match state.directory_source.load().await {
        Ok(directory) => directory,
        Err(e) => {
            return Ok(HttpResponse::BadGateway().json(serde_json::json!({
                "success": false,
                "error": e.to_string()
            })))
        }
    };
    let mut session = lock(&state)?;
    match session.reload(directory, req.confirm) {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "directory_empty": session.directory_is_empty(),
        }))),
        Err(e) => Ok(rejected(e)),
    }
}

// Projects the current assignment into the posted form
async fn fill(
    form: web::Json<FormDocument>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let mut form = form.into_inner();
    let report = {
        let session = lock(&state)?;
        quick_fill(&mut form, session.store().assignments(), session.notes())
    };
    let message = crate::display::render_report(&report);
    Ok(HttpResponse::Ok().json(FillResponse {
        form,
        report,
        message,
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/roster", web::get().to(get_roster))
        .route("/api/assignments", web::get().to(get_assignments))
        .route("/api/summary", web::get().to(get_summary))
        .route("/api/status", web::get().to(get_status))
        .route("/api/place", web::post().to(place))
        .route("/api/clear", web::post().to(clear))
        .route("/api/groups", web::post().to(create_group))
        .route("/api/groups/{id}", web::put().to(rename_group))
        .route("/api/groups/{id}", web::delete().to(delete_group))
        .route("/api/groups/{id}/slots", web::post().to(create_slot))
        .route("/api/slots/{role}", web::delete().to(delete_slot))
        .route("/api/reload", web::post().to(reload))
        .route("/api/fill", web::post().to(fill));
}

pub async fn start_server(
    port: u16,
    state: AppState,
    static_dir: Option<PathBuf>,
) -> std::io::Result<()> {
    let app_state = web::Data::new(state);
    info!("Access the editor at http://localhost:{}", port);

    HttpServer::new(move || {
        let app = App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure);
        match &static_dir {
            Some(dir) => app.service(Files::new("/static", dir).index_file("index.html")),
            None => app,
        }
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
