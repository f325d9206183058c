use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::api::contract::*;
use crate::identity::Account;

/// Server-side error model. Every handler failure becomes one of these and is
/// rendered as `{status, error}` with the matching HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest { code: String, message: String },
    #[error("{message}")]
    Unauthorized { code: String, message: String },
    #[error("{message}")]
    NotFound { code: String, message: String },
    #[error("{message}")]
    Internal { code: String, message: String },
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn bad_request<S: Into<String>>(code: S, msg: S) -> Self { ApiError::BadRequest { code: code.into(), message: msg.into() } }
    pub fn unauthorized<S: Into<String>>(code: S, msg: S) -> Self { ApiError::Unauthorized { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { ApiError::NotFound { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { ApiError::Internal { code: code.into(), message: msg.into() } }

    pub fn code_str(&self) -> &str {
        match self {
            ApiError::BadRequest { code, .. }
            | ApiError::Unauthorized { code, .. }
            | ApiError::NotFound { code, .. }
            | ApiError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest { message, .. }
            | ApiError::Unauthorized { message, .. }
            | ApiError::NotFound { message, .. }
            | ApiError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        (status, Json(json!({"status": self.code_str(), "error": self.message()}))).into_response()
    }
}

/// Artificial delay class of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Latency {
    /// logout, refresh, device status
    Fast,
    /// reads
    Normal,
    /// login, bulk writes, activity create
    Write,
    /// storage upload
    Upload,
    /// biometric verify, attendance and pedagogical PDFs
    Slow,
    /// biometric enroll, report card PDF
    VerySlow,
}

impl Latency {
    pub fn base(&self) -> Duration {
        Duration::from_millis(match self {
            Latency::Fast => 300,
            Latency::Normal => 500,
            Latency::Write => 800,
            Latency::Upload => 1000,
            Latency::Slow => 1500,
            Latency::VerySlow => 2000,
        })
    }

    /// Delay after applying the scale factor. Zero, negative or non-finite scales disable it.
    pub fn scaled(&self, scale: f64) -> Duration {
        if !scale.is_finite() || scale <= 0.0 { return Duration::ZERO; }
        self.base().mul_f64(scale)
    }
}

/// The `/api` backend as seen by the HTTP layer. Authentication of protected calls
/// happens in the router through `authorize`; data methods assume a valid caller.
#[async_trait]
pub trait SchoolBackend: Send + Sync {
    async fn login(&self, req: LoginRequest) -> ApiResult<LoginResponse>;
    async fn logout(&self, token: Option<&str>) -> ApiResult<LogoutResponse>;
    async fn refresh(&self, req: RefreshRequest) -> ApiResult<RefreshResponse>;
    async fn authorize(&self, token: &str) -> ApiResult<Account>;

    async fn student(&self, id: &str) -> ApiResult<StudentInfo>;
    /// Profile edit of `caller`; `id` must be the caller's own account.
    async fn update_profile(&self, caller: Account, id: &str, update: ProfileUpdate) -> ApiResult<Account>;
    async fn student_attendance(&self, id: &str) -> ApiResult<Vec<AttendanceRecord>>;
    async fn student_activities(&self, id: &str) -> ApiResult<Vec<Activity>>;
    async fn teacher_classes(&self, teacher_id: &str) -> ApiResult<Vec<ClassInfo>>;

    async fn grades(&self, student_id: Option<&str>) -> ApiResult<Vec<GradeRecord>>;
    async fn submit_grades(&self, req: BulkGradesRequest) -> ApiResult<BulkWriteResponse>;
    async fn submit_attendance(&self, req: BulkAttendanceRequest) -> ApiResult<BulkWriteResponse>;

    async fn activities(&self) -> ApiResult<Vec<Activity>>;
    async fn create_activity(&self, req: NewActivity) -> ApiResult<CreatedActivity>;
    async fn materials(&self) -> ApiResult<Vec<Material>>;
    async fn schedule(&self) -> ApiResult<Vec<ScheduleDay>>;
    async fn classes(&self) -> ApiResult<Vec<ClassInfo>>;
    async fn class(&self, id: &str) -> ApiResult<ClassInfo>;
    async fn class_students(&self, id: &str) -> ApiResult<Vec<StudentInfo>>;

    async fn storage_upload(&self, bucket: Option<&str>, file_name: &str, size: usize) -> ApiResult<StorageUploadResponse>;
    async fn storage_list(&self, bucket: Option<&str>, path: Option<&str>) -> ApiResult<Vec<Material>>;
    async fn storage_delete(&self, path: &str) -> ApiResult<SuccessResponse>;

    async fn enroll_fingerprint(&self, req: BiometricEnrollRequest) -> ApiResult<BiometricEnrollResponse>;
    async fn verify_fingerprint(&self, req: BiometricVerifyRequest) -> ApiResult<BiometricVerifyResponse>;
    async fn delete_biometric(&self, student_id: &str) -> ApiResult<SuccessResponse>;
    async fn enrolled_students(&self) -> ApiResult<Vec<StudentInfo>>;
    async fn device_status(&self) -> ApiResult<DeviceStatus>;

    async fn report_card_pdf(&self, req: PdfRequest) -> ApiResult<PdfUrl>;
    async fn attendance_pdf(&self, req: PdfRequest) -> ApiResult<PdfUrl>;
    async fn pedagogical_report_pdf(&self, req: PdfRequest) -> ApiResult<PdfUrl>;
}
