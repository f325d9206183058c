//!
//! schoolhub mock `/api` server
//! ----------------------------
//! Axum router that stands in for the real backend during development and tests.
//!
//! Responsibilities:
//! - Bearer-token authentication of every endpoint except login, logout and refresh.
//! - An artificial delay per endpoint class, scaled by `ServerConfig::latency_scale`.
//! - Translation of `ApiError` into `{status, error}` JSON bodies.
//!
//! The data itself lives behind the `SchoolBackend` trait; `MockBackend` serves fixtures.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{debug, info};

mod backend;
pub mod fixtures;
mod mock;
mod tokens;

pub use backend::{ApiError, ApiResult, Latency, SchoolBackend};
pub use mock::{synthesize_account, MockBackend};
pub use tokens::TokenRegistry;

use crate::api::contract::*;
use crate::config::ServerConfig;
use crate::identity::Account;
use crate::token_prefix;

/// Shared handler state: the backend and the latency scale factor.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn SchoolBackend>,
    pub latency_scale: f64,
}

impl AppState {
    pub fn new(backend: Arc<dyn SchoolBackend>, latency_scale: f64) -> Self { Self { backend, latency_scale } }

    async fn delay(&self, class: Latency) {
        let d = class.scaled(self.latency_scale);
        if !d.is_zero() { tokio::time::sleep(d).await; }
    }

    /// Delay, then resolve the caller from the bearer token.
    async fn authorized(&self, headers: &HeaderMap, class: Latency) -> ApiResult<Account> {
        self.delay(class).await;
        let Some(token) = bearer_token(headers) else {
            return Err(ApiError::unauthorized("missing_token", "authorization header is required"));
        };
        match self.backend.authorize(&token).await {
            Ok(a) => Ok(a),
            Err(e) => {
                debug!(token = %token_prefix(&token), "rejected bearer token");
                Err(e)
            }
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let v = headers.get("authorization")?.to_str().ok()?;
    let (scheme, token) = v.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") { return None; }
    let token = token.trim();
    if token.is_empty() { None } else { Some(token.to_string()) }
}

/// Router with every endpoint mounted under `/api`.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/refresh", post(refresh))
        .route("/user/me", get(user_me))
        .route("/student/{id}", get(student).put(update_student))
        .route("/student/{id}/attendance", get(student_attendance))
        .route("/student/{id}/activities", get(student_activities))
        .route("/teacher/{id}/classes", get(teacher_classes))
        .route("/grades", get(grades))
        .route("/grades/bulk", post(grades_bulk))
        .route("/attendance/bulk", post(attendance_bulk))
        .route("/activities", get(activities).post(create_activity))
        .route("/materials", get(materials))
        .route("/schedule", get(schedule))
        .route("/classes", get(classes))
        .route("/classes/{id}", get(class))
        .route("/classes/{id}/students", get(class_students))
        .route("/storage/upload", post(storage_upload))
        .route("/storage/list", get(storage_list))
        .route("/storage/{path}", delete(storage_delete))
        .route("/biometrics/enroll", post(biometric_enroll))
        .route("/biometrics/verify", post(biometric_verify))
        .route("/biometrics/enrolled", get(biometric_enrolled))
        .route("/biometrics/device/status", get(device_status))
        .route("/biometrics/{student_id}", delete(biometric_delete))
        .route("/pdf/boletim", post(pdf_report_card))
        .route("/pdf/attendance", post(pdf_attendance))
        .route("/pdf/pedagogical-report", post(pdf_pedagogical_report));

    Router::new()
        .route("/", get(|| async { "schoolhub mock ok" }))
        .nest("/api", api)
        .with_state(state)
}

/// Serve on an already bound listener until the task is dropped.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> anyhow::Result<()> {
    axum::serve(listener, router(state)).await.context("mock server stopped")?;
    Ok(())
}

/// Bind `0.0.0.0:<port>` and serve a fresh `MockBackend`.
pub async fn run_with_config(config: &ServerConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind mock server on {}", addr))?;
    let backend = Arc::new(MockBackend::new(config));
    info!(target: "schoolhub", "Starting mock server on {} (latency scale {}, token ttl {}s)", addr, config.latency_scale, config.token_ttl_secs);
    serve(listener, AppState::new(backend, config.latency_scale)).await
}

/// Bind an ephemeral localhost port and serve in the background. Returns the bound address.
pub async fn spawn_local(backend: Arc<dyn SchoolBackend>, latency_scale: f64) -> anyhow::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.context("bind 127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let state = AppState::new(backend, latency_scale);
    tokio::spawn(async move {
        if let Err(e) = serve(listener, state).await {
            tracing::error!("mock server error: {:#}", e);
        }
    });
    debug!("mock server listening on {}", addr);
    Ok(addr)
}

// ---- auth ----

async fn login(State(st): State<AppState>, Json(req): Json<LoginRequest>) -> ApiResult<Json<LoginResponse>> {
    st.delay(Latency::Write).await;
    Ok(Json(st.backend.login(req).await?))
}

async fn logout(State(st): State<AppState>, headers: HeaderMap) -> ApiResult<Json<LogoutResponse>> {
    st.delay(Latency::Fast).await;
    let token = bearer_token(&headers);
    Ok(Json(st.backend.logout(token.as_deref()).await?))
}

async fn refresh(State(st): State<AppState>, Json(req): Json<RefreshRequest>) -> ApiResult<Json<RefreshResponse>> {
    st.delay(Latency::Fast).await;
    Ok(Json(st.backend.refresh(req).await?))
}

async fn user_me(State(st): State<AppState>, headers: HeaderMap) -> ApiResult<Json<Account>> {
    Ok(Json(st.authorized(&headers, Latency::Normal).await?))
}

// ---- students / teachers ----

async fn student(State(st): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> ApiResult<Json<StudentInfo>> {
    st.authorized(&headers, Latency::Normal).await?;
    Ok(Json(st.backend.student(&id).await?))
}

async fn update_student(State(st): State<AppState>, headers: HeaderMap, Path(id): Path<String>, Json(update): Json<ProfileUpdate>) -> ApiResult<Json<Account>> {
    let caller = st.authorized(&headers, Latency::Write).await?;
    Ok(Json(st.backend.update_profile(caller, &id, update).await?))
}

async fn student_attendance(State(st): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> ApiResult<Json<Vec<AttendanceRecord>>> {
    st.authorized(&headers, Latency::Normal).await?;
    Ok(Json(st.backend.student_attendance(&id).await?))
}

async fn student_activities(State(st): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> ApiResult<Json<Vec<Activity>>> {
    st.authorized(&headers, Latency::Normal).await?;
    Ok(Json(st.backend.student_activities(&id).await?))
}

async fn teacher_classes(State(st): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> ApiResult<Json<Vec<ClassInfo>>> {
    st.authorized(&headers, Latency::Normal).await?;
    Ok(Json(st.backend.teacher_classes(&id).await?))
}

// ---- grades / attendance ----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GradesQuery {
    student_id: Option<String>,
}

async fn grades(State(st): State<AppState>, headers: HeaderMap, Query(q): Query<GradesQuery>) -> ApiResult<Json<Vec<GradeRecord>>> {
    st.authorized(&headers, Latency::Normal).await?;
    Ok(Json(st.backend.grades(q.student_id.as_deref()).await?))
}

async fn grades_bulk(State(st): State<AppState>, headers: HeaderMap, Json(req): Json<BulkGradesRequest>) -> ApiResult<Json<BulkWriteResponse>> {
    st.authorized(&headers, Latency::Write).await?;
    Ok(Json(st.backend.submit_grades(req).await?))
}

async fn attendance_bulk(State(st): State<AppState>, headers: HeaderMap, Json(req): Json<BulkAttendanceRequest>) -> ApiResult<Json<BulkWriteResponse>> {
    st.authorized(&headers, Latency::Write).await?;
    Ok(Json(st.backend.submit_attendance(req).await?))
}

// ---- activities / materials / schedule / classes ----

async fn activities(State(st): State<AppState>, headers: HeaderMap) -> ApiResult<Json<Vec<Activity>>> {
    st.authorized(&headers, Latency::Normal).await?;
    Ok(Json(st.backend.activities().await?))
}

async fn create_activity(State(st): State<AppState>, headers: HeaderMap, Json(req): Json<NewActivity>) -> ApiResult<Json<CreatedActivity>> {
    st.authorized(&headers, Latency::Write).await?;
    Ok(Json(st.backend.create_activity(req).await?))
}

async fn materials(State(st): State<AppState>, headers: HeaderMap) -> ApiResult<Json<Vec<Material>>> {
    st.authorized(&headers, Latency::Normal).await?;
    Ok(Json(st.backend.materials().await?))
}

async fn schedule(State(st): State<AppState>, headers: HeaderMap) -> ApiResult<Json<Vec<ScheduleDay>>> {
    st.authorized(&headers, Latency::Normal).await?;
    Ok(Json(st.backend.schedule().await?))
}

async fn classes(State(st): State<AppState>, headers: HeaderMap) -> ApiResult<Json<Vec<ClassInfo>>> {
    st.authorized(&headers, Latency::Normal).await?;
    Ok(Json(st.backend.classes().await?))
}

async fn class(State(st): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> ApiResult<Json<ClassInfo>> {
    st.authorized(&headers, Latency::Normal).await?;
    Ok(Json(st.backend.class(&id).await?))
}

async fn class_students(State(st): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> ApiResult<Json<Vec<StudentInfo>>> {
    st.authorized(&headers, Latency::Normal).await?;
    Ok(Json(st.backend.class_students(&id).await?))
}

// ---- storage ----

#[derive(Debug, Deserialize)]
struct StorageListQuery {
    bucket: Option<String>,
    path: Option<String>,
}

async fn storage_upload(State(st): State<AppState>, headers: HeaderMap, mut multipart: Multipart) -> ApiResult<Json<StorageUploadResponse>> {
    st.authorized(&headers, Latency::Upload).await?;
    let bad = |e: axum::extract::multipart::MultipartError| ApiError::bad_request("bad_multipart".to_string(), e.to_string());
    let mut bucket = None;
    let mut file: Option<(String, usize)> = None;
    while let Some(field) = multipart.next_field().await.map_err(bad)? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let name = field.file_name().filter(|n| !n.is_empty()).unwrap_or("file").to_string();
                let data = field.bytes().await.map_err(bad)?;
                file = Some((name, data.len()));
            }
            Some("bucket") => bucket = Some(field.text().await.map_err(bad)?),
            _ => {}
        }
    }
    let Some((name, size)) = file else {
        return Err(ApiError::bad_request("missing_file", "multipart field 'file' is required"));
    };
    Ok(Json(st.backend.storage_upload(bucket.as_deref(), &name, size).await?))
}

async fn storage_list(State(st): State<AppState>, headers: HeaderMap, Query(q): Query<StorageListQuery>) -> ApiResult<Json<Vec<Material>>> {
    st.authorized(&headers, Latency::Normal).await?;
    Ok(Json(st.backend.storage_list(q.bucket.as_deref(), q.path.as_deref()).await?))
}

async fn storage_delete(State(st): State<AppState>, headers: HeaderMap, Path(path): Path<String>) -> ApiResult<Json<SuccessResponse>> {
    st.authorized(&headers, Latency::Normal).await?;
    Ok(Json(st.backend.storage_delete(&path).await?))
}

// ---- biometrics ----

async fn biometric_enroll(State(st): State<AppState>, headers: HeaderMap, Json(req): Json<BiometricEnrollRequest>) -> ApiResult<Json<BiometricEnrollResponse>> {
    st.authorized(&headers, Latency::VerySlow).await?;
    Ok(Json(st.backend.enroll_fingerprint(req).await?))
}

async fn biometric_verify(State(st): State<AppState>, headers: HeaderMap, Json(req): Json<BiometricVerifyRequest>) -> ApiResult<Json<BiometricVerifyResponse>> {
    st.authorized(&headers, Latency::Slow).await?;
    Ok(Json(st.backend.verify_fingerprint(req).await?))
}

async fn biometric_delete(State(st): State<AppState>, headers: HeaderMap, Path(student_id): Path<String>) -> ApiResult<Json<SuccessResponse>> {
    st.authorized(&headers, Latency::Normal).await?;
    Ok(Json(st.backend.delete_biometric(&student_id).await?))
}

async fn biometric_enrolled(State(st): State<AppState>, headers: HeaderMap) -> ApiResult<Json<Vec<StudentInfo>>> {
    st.authorized(&headers, Latency::Normal).await?;
    Ok(Json(st.backend.enrolled_students().await?))
}

async fn device_status(State(st): State<AppState>, headers: HeaderMap) -> ApiResult<Json<DeviceStatus>> {
    st.authorized(&headers, Latency::Fast).await?;
    Ok(Json(st.backend.device_status().await?))
}

// ---- pdf ----

async fn pdf_report_card(State(st): State<AppState>, headers: HeaderMap, Json(req): Json<PdfRequest>) -> ApiResult<Json<PdfUrl>> {
    st.authorized(&headers, Latency::VerySlow).await?;
    Ok(Json(st.backend.report_card_pdf(req).await?))
}

async fn pdf_attendance(State(st): State<AppState>, headers: HeaderMap, Json(req): Json<PdfRequest>) -> ApiResult<Json<PdfUrl>> {
    st.authorized(&headers, Latency::Slow).await?;
    Ok(Json(st.backend.attendance_pdf(req).await?))
}

async fn pdf_pedagogical_report(State(st): State<AppState>, headers: HeaderMap, Json(req): Json<PdfRequest>) -> ApiResult<Json<PdfUrl>> {
    st.authorized(&headers, Latency::Slow).await?;
    Ok(Json(st.backend.pedagogical_report_pdf(req).await?))
}
