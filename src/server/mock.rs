use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use super::backend::{ApiError, ApiResult, SchoolBackend};
use super::fixtures;
use super::tokens::TokenRegistry;
use crate::api::contract::*;
use crate::config::ServerConfig;
use crate::identity::{unit_name, Account, AccountStatus, Role};
use crate::token_prefix;

/// Fixture-backed backend. Reads come from `fixtures`; writes are acknowledged and dropped.
pub struct MockBackend {
    tokens: TokenRegistry,
    pdf_offline: AtomicBool,
}

// FNV-1a, so synthesized ids and names stay stable across runs for the same identifier.
fn stable_hash(s: &str) -> u64 {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in s.as_bytes() {
        h ^= *b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    h
}

/// Account the mock hands out for a login: shape and naming follow the production
/// directory, content is derived from the credentials alone.
pub fn synthesize_account(req: &LoginRequest) -> Account {
    let role = req.user_type;
    let h = stable_hash(&format!("{}:{}", role, req.identifier));
    let names = fixtures::names_for(role);
    let is_student = role == Role::Student;
    Account {
        id: format!("{}{:06}", role.id_prefix(), h % 1_000_000),
        name: names[(h as usize) % names.len()].to_string(),
        email: format!("{}@escola.edu.br", req.identifier),
        role,
        unit_id: req.unit_id.clone(),
        unit_name: unit_name(&req.unit_id).to_string(),
        avatar: Some(format!("/avatars/{}-default.png", role)),
        rm: is_student.then(|| req.identifier.clone()),
        course: is_student.then(|| fixtures::COURSES[(h as usize / 7) % fixtures::COURSES.len()].to_string()),
        status: AccountStatus::Active,
        registration_date: Some(Utc::now().to_rfc3339()),
        biometric_id: None,
    }
}

fn pdf_url(kind: &str, id: Option<&str>) -> PdfUrl {
    let ts = Utc::now().timestamp_millis();
    let url = match id {
        Some(id) => format!("https://mock-pdf.com/{}-{}-{}.pdf", kind, id, ts),
        None => format!("https://mock-pdf.com/{}-{}.pdf", kind, ts),
    };
    PdfUrl { url }
}

impl MockBackend {
    pub fn new(config: &ServerConfig) -> Self {
        Self { tokens: TokenRegistry::new(Duration::from_secs(config.token_ttl_secs)), pdf_offline: AtomicBool::new(false) }
    }

    /// Make every `/pdf/*` endpoint fail with an internal error until switched back.
    pub fn set_pdf_offline(&self, offline: bool) { self.pdf_offline.store(offline, Ordering::SeqCst); }

    fn pdf_available(&self) -> ApiResult<()> {
        if self.pdf_offline.load(Ordering::SeqCst) {
            return Err(ApiError::internal("pdf_unavailable", "PDF service is unavailable"));
        }
        Ok(())
    }

    /// Expire every access token currently issued; refresh tokens stay valid.
    pub fn expire_access_tokens(&self) -> usize { self.tokens.expire_all_access() }

    /// Invalidate every refresh token so the next refresh attempt fails.
    pub fn revoke_refresh_tokens(&self) -> usize { self.tokens.revoke_all_refresh() }
}

#[async_trait]
impl SchoolBackend for MockBackend {
    async fn login(&self, req: LoginRequest) -> ApiResult<LoginResponse> {
        if req.identifier.trim().is_empty() || req.password.is_empty() || req.unit_id.trim().is_empty() {
            return Err(ApiError::bad_request("missing_fields", "identifier, password and unitId are required"));
        }
        let user = synthesize_account(&req);
        let issued = self.tokens.issue(&user);
        info!(user = %user.id, role = %user.role, unit = %user.unit_id, "mock login");
        Ok(LoginResponse { token: issued.access, refresh_token: issued.refresh, user, expires_in: issued.expires_in })
    }

    async fn logout(&self, token: Option<&str>) -> ApiResult<LogoutResponse> {
        if let Some(t) = token {
            let known = self.tokens.logout(t);
            debug!(token = %token_prefix(t), known, "mock logout");
        }
        Ok(LogoutResponse { success: true })
    }

    async fn refresh(&self, req: RefreshRequest) -> ApiResult<RefreshResponse> {
        match self.tokens.refresh(&req.refresh_token) {
            Some((token, expires_in)) => Ok(RefreshResponse { token, expires_in }),
            None => Err(ApiError::unauthorized("invalid_refresh_token", "refresh token is invalid or revoked")),
        }
    }

    async fn authorize(&self, token: &str) -> ApiResult<Account> {
        self.tokens
            .validate(token)
            .ok_or_else(|| ApiError::unauthorized("invalid_token", "access token is invalid or expired"))
    }

    async fn student(&self, id: &str) -> ApiResult<StudentInfo> {
        let all = fixtures::students();
        // unknown ids fall back to the first student, like the fixture server always has
        let found = all.iter().find(|s| s.id == id).or(all.first()).cloned();
        found.ok_or_else(|| ApiError::not_found("not_found", "no students"))
    }

    async fn update_profile(&self, caller: Account, id: &str, update: ProfileUpdate) -> ApiResult<Account> {
        if caller.id != id {
            return Err(ApiError::not_found("not_found", "only the signed-in account can be edited"));
        }
        let mut account = caller;
        update.apply(&mut account);
        self.tokens.replace_account(&account);
        debug!(user = %account.id, "profile updated");
        Ok(account)
    }

    async fn student_attendance(&self, id: &str) -> ApiResult<Vec<AttendanceRecord>> {
        Ok(fixtures::attendance().into_iter().filter(|a| a.student_id == id).collect())
    }

    async fn student_activities(&self, _id: &str) -> ApiResult<Vec<Activity>> { Ok(fixtures::activities()) }

    async fn teacher_classes(&self, _teacher_id: &str) -> ApiResult<Vec<ClassInfo>> { Ok(fixtures::classes()) }

    async fn grades(&self, student_id: Option<&str>) -> ApiResult<Vec<GradeRecord>> {
        let all = fixtures::grades();
        Ok(match student_id {
            Some(id) => all.into_iter().filter(|g| g.student_id == id).collect(),
            None => all,
        })
    }

    async fn submit_grades(&self, req: BulkGradesRequest) -> ApiResult<BulkWriteResponse> {
        debug!(count = req.grades.len(), "grades bulk accepted (not stored)");
        Ok(BulkWriteResponse { success: true, count: req.grades.len(), message: "Grades submitted successfully".into() })
    }

    async fn submit_attendance(&self, req: BulkAttendanceRequest) -> ApiResult<BulkWriteResponse> {
        debug!(count = req.attendance.len(), "attendance bulk accepted (not stored)");
        Ok(BulkWriteResponse { success: true, count: req.attendance.len(), message: "Attendance recorded successfully".into() })
    }

    async fn activities(&self) -> ApiResult<Vec<Activity>> { Ok(fixtures::activities()) }

    async fn create_activity(&self, req: NewActivity) -> ApiResult<CreatedActivity> {
        if req.title.trim().is_empty() {
            return Err(ApiError::bad_request("missing_fields", "title is required"));
        }
        Ok(CreatedActivity {
            id: format!("ACT_{}", uuid::Uuid::new_v4().simple()),
            activity: req,
            created_at: Utc::now().to_rfc3339(),
        })
    }

    async fn materials(&self) -> ApiResult<Vec<Material>> { Ok(fixtures::materials()) }

    async fn schedule(&self) -> ApiResult<Vec<ScheduleDay>> { Ok(fixtures::schedule()) }

    async fn classes(&self) -> ApiResult<Vec<ClassInfo>> { Ok(fixtures::classes()) }

    async fn class(&self, id: &str) -> ApiResult<ClassInfo> {
        let all = fixtures::classes();
        let found = all.iter().find(|c| c.id == id).or(all.first()).cloned();
        found.ok_or_else(|| ApiError::not_found("not_found", "no classes"))
    }

    async fn class_students(&self, _id: &str) -> ApiResult<Vec<StudentInfo>> { Ok(fixtures::students()) }

    async fn storage_upload(&self, bucket: Option<&str>, file_name: &str, size: usize) -> ApiResult<StorageUploadResponse> {
        let path = format!("uploads/{}-{}", Utc::now().timestamp_millis(), file_name);
        debug!(bucket = bucket.unwrap_or("default"), path = %path, size, "storage upload accepted (not stored)");
        Ok(StorageUploadResponse { signed_url: format!("https://mock-storage.com/{}", path), path })
    }

    async fn storage_list(&self, _bucket: Option<&str>, _path: Option<&str>) -> ApiResult<Vec<Material>> {
        Ok(fixtures::materials())
    }

    async fn storage_delete(&self, path: &str) -> ApiResult<SuccessResponse> {
        debug!(path, "storage delete acknowledged");
        Ok(SuccessResponse { success: true, message: None })
    }

    async fn enroll_fingerprint(&self, req: BiometricEnrollRequest) -> ApiResult<BiometricEnrollResponse> {
        Ok(BiometricEnrollResponse {
            success: true,
            biometric_id: format!("BIO_{}", uuid::Uuid::new_v4().simple()),
            message: format!("Fingerprint enrolled for {}", req.student_name),
        })
    }

    async fn verify_fingerprint(&self, _req: BiometricVerifyRequest) -> ApiResult<BiometricVerifyResponse> {
        let first = fixtures::students().into_iter().next();
        Ok(BiometricVerifyResponse {
            success: first.is_some(),
            student_id: first.as_ref().map(|s| s.id.clone()),
            student_name: first.map(|s| s.name),
            confidence: 0.98,
            message: "Student identified".into(),
        })
    }

    async fn delete_biometric(&self, _student_id: &str) -> ApiResult<SuccessResponse> {
        Ok(SuccessResponse { success: true, message: Some("Biometric data removed".into()) })
    }

    async fn enrolled_students(&self) -> ApiResult<Vec<StudentInfo>> {
        Ok(fixtures::students().into_iter().filter(|s| s.biometric_enrolled).collect())
    }

    async fn device_status(&self) -> ApiResult<DeviceStatus> {
        Ok(DeviceStatus {
            connected: true,
            model: Some("ESP32 Fingerprint Reader".into()),
            message: "Device connected and operational".into(),
        })
    }

    async fn report_card_pdf(&self, req: PdfRequest) -> ApiResult<PdfUrl> {
        self.pdf_available()?;
        let Some(id) = req.student_id.as_deref() else {
            return Err(ApiError::bad_request("missing_fields", "studentId is required"));
        };
        Ok(pdf_url("boletim", Some(id)))
    }

    async fn attendance_pdf(&self, req: PdfRequest) -> ApiResult<PdfUrl> {
        self.pdf_available()?;
        Ok(pdf_url("attendance", req.class_id.as_deref()))
    }

    async fn pedagogical_report_pdf(&self, req: PdfRequest) -> ApiResult<PdfUrl> {
        self.pdf_available()?;
        Ok(pdf_url("report", req.class_id.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(identifier: &str, role: Role) -> LoginRequest {
        LoginRequest { identifier: identifier.into(), password: "x".into(), unit_id: "001".into(), user_type: role }
    }

    #[test]
    fn synthesized_account_shape() {
        let a = synthesize_account(&req("123456", Role::Student));
        assert!(a.id.starts_with("STU"));
        assert_eq!(a.id.len(), 9);
        assert_eq!(a.email, "123456@escola.edu.br");
        assert_eq!(a.rm.as_deref(), Some("123456"));
        assert!(a.course.is_some());
        assert_eq!(a.unit_name, "Escola Estadual Central");
        assert!(a.check_invariants().is_ok());

        let t = synthesize_account(&req("prof01", Role::Director));
        assert!(t.id.starts_with("DIR"));
        assert_eq!(t.rm, None);
        assert_eq!(t.avatar.as_deref(), Some("/avatars/director-default.png"));
    }

    #[test]
    fn synthesized_account_is_stable() {
        let a = synthesize_account(&req("123456", Role::Student));
        let b = synthesize_account(&req("123456", Role::Student));
        assert_eq!((a.id, a.name), (b.id, b.name));
    }

    #[tokio::test]
    async fn login_requires_fields() {
        let m = MockBackend::new(&ServerConfig::instant());
        let mut r = req("123456", Role::Student);
        r.password.clear();
        assert!(matches!(m.login(r).await, Err(ApiError::BadRequest { .. })));
    }

    #[tokio::test]
    async fn bulk_writes_are_not_durable() {
        let m = MockBackend::new(&ServerConfig::instant());
        let before = m.grades(Some("STU001")).await.unwrap();
        let sub = GradeSubmission { student_id: "STU001".into(), subject: "Matemática".into(), bimester: 4, grade: 3.0 };
        let r = m.submit_grades(BulkGradesRequest { grades: vec![sub.clone(), sub] }).await.unwrap();
        assert_eq!(r.count, 2);
        assert!(r.success);
        assert_eq!(m.grades(Some("STU001")).await.unwrap(), before);
    }

    #[tokio::test]
    async fn profile_edit_is_limited_to_the_caller() {
        let m = MockBackend::new(&ServerConfig::instant());
        let l = m.login(req("prof01", Role::Teacher)).await.unwrap();
        let update = ProfileUpdate { avatar: Some("/avatars/me.png".into()), ..Default::default() };
        let other = m.update_profile(l.user.clone(), "TEA999999", update.clone()).await;
        assert!(matches!(other, Err(ApiError::NotFound { .. })));

        let edited = m.update_profile(l.user.clone(), &l.user.id, update).await.unwrap();
        assert_eq!(edited.avatar.as_deref(), Some("/avatars/me.png"));
        assert_eq!(m.authorize(&l.token).await.unwrap(), edited);
    }

    #[tokio::test]
    async fn offline_pdf_service_fails_every_pdf() {
        let m = MockBackend::new(&ServerConfig::instant());
        m.set_pdf_offline(true);
        let r = PdfRequest { student_id: Some("STU001".into()), class_id: None };
        assert!(matches!(m.report_card_pdf(r.clone()).await, Err(ApiError::Internal { .. })));
        assert!(m.attendance_pdf(r).await.is_err());
        m.set_pdf_offline(false);
        assert!(m.pedagogical_report_pdf(PdfRequest::default()).await.is_ok());
    }

    #[tokio::test]
    async fn upload_echoes_a_signed_path() {
        let m = MockBackend::new(&ServerConfig::instant());
        let r = m.storage_upload(Some("avatars"), "foto.png", 12).await.unwrap();
        assert!(r.path.starts_with("uploads/"));
        assert!(r.path.ends_with("-foto.png"));
        assert_eq!(r.signed_url, format!("https://mock-storage.com/{}", r.path));
    }

    #[tokio::test]
    async fn refresh_after_revocation_is_unauthorized() {
        let m = MockBackend::new(&ServerConfig::instant());
        let l = m.login(req("123456", Role::Student)).await.unwrap();
        m.revoke_refresh_tokens();
        let r = m.refresh(RefreshRequest { refresh_token: l.refresh_token }).await;
        assert!(matches!(r, Err(ApiError::Unauthorized { .. })));
    }
}
