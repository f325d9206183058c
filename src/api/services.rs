//! Data services used by the screens. Thin typed wrappers over `ApiClient::request`;
//! errors are returned as-is for the calling screen to turn into a notice.

use reqwest::Method;
use tracing::{info, warn};
use urlencoding::encode;

use super::client::{ApiClient, Payload};
use super::contract::*;
use super::report_card;
use crate::error::{AppError, AppResult};
use crate::identity::{Account, Session};

impl ApiClient {
    // ---- students ----

    pub async fn student(&self, id: &str) -> AppResult<StudentInfo> {
        self.get(&format!("/student/{}", encode(id))).await
    }

    pub async fn student_attendance(&self, id: &str) -> AppResult<Vec<AttendanceRecord>> {
        self.get(&format!("/student/{}/attendance", encode(id))).await
    }

    pub async fn student_activities(&self, id: &str) -> AppResult<Vec<Activity>> {
        self.get(&format!("/student/{}/activities", encode(id))).await
    }

    /// Edit the signed-in user's profile. The backend answers with the whole account,
    /// which replaces the stored one; student-only fields are dropped for staff.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> AppResult<Session> {
        let Some(user) = self.session().current().user().cloned() else {
            return Err(AppError::Unauthorized);
        };
        let updated: Account = self.put(&format!("/student/{}", encode(&user.id)), update).await?;
        let session = self.session().replace_account(updated)?;
        info!(user = %user.id, "profile updated");
        Ok(session)
    }

    pub async fn grades(&self, student_id: Option<&str>) -> AppResult<Vec<GradeRecord>> {
        match student_id {
            Some(id) => self.get(&format!("/grades?studentId={}", encode(id))).await,
            None => self.get("/grades").await,
        }
    }

    // ---- teachers / classes ----

    pub async fn teacher_classes(&self, teacher_id: &str) -> AppResult<Vec<ClassInfo>> {
        self.get(&format!("/teacher/{}/classes", encode(teacher_id))).await
    }

    pub async fn classes(&self) -> AppResult<Vec<ClassInfo>> { self.get("/classes").await }

    pub async fn class(&self, id: &str) -> AppResult<ClassInfo> {
        self.get(&format!("/classes/{}", encode(id))).await
    }

    pub async fn class_students(&self, id: &str) -> AppResult<Vec<StudentInfo>> {
        self.get(&format!("/classes/{}/students", encode(id))).await
    }

    /// Not durable: the backend only reports how many rows it was sent.
    pub async fn submit_grades(&self, grades: Vec<GradeSubmission>) -> AppResult<BulkWriteResponse> {
        self.post("/grades/bulk", &BulkGradesRequest { grades }).await
    }

    /// Not durable, same as `submit_grades`.
    pub async fn submit_attendance(&self, attendance: Vec<AttendanceSubmission>) -> AppResult<BulkWriteResponse> {
        self.post("/attendance/bulk", &BulkAttendanceRequest { attendance }).await
    }

    // ---- activities / materials / schedule ----

    pub async fn activities(&self) -> AppResult<Vec<Activity>> { self.get("/activities").await }

    pub async fn create_activity(&self, activity: &NewActivity) -> AppResult<CreatedActivity> {
        self.post("/activities", activity).await
    }

    pub async fn materials(&self) -> AppResult<Vec<Material>> { self.get("/materials").await }

    pub async fn schedule(&self) -> AppResult<Vec<ScheduleDay>> { self.get("/schedule").await }

    // ---- storage ----

    pub async fn storage_upload(&self, file_name: &str, bytes: Vec<u8>, bucket: Option<&str>) -> AppResult<StorageUploadResponse> {
        let body = Payload::File {
            field_text: bucket.map(|b| vec![("bucket".to_string(), b.to_string())]).unwrap_or_default(),
            file_name: file_name.to_string(),
            bytes,
        };
        let v = self.request(Method::POST, "/storage/upload", body).await?;
        Ok(serde_json::from_value(v)?)
    }

    pub async fn storage_list(&self, bucket: &str, path: Option<&str>) -> AppResult<Vec<Material>> {
        let mut url = format!("/storage/list?bucket={}", encode(bucket));
        if let Some(p) = path { url.push_str(&format!("&path={}", encode(p))); }
        self.get(&url).await
    }

    pub async fn storage_delete(&self, path: &str) -> AppResult<SuccessResponse> {
        self.delete(&format!("/storage/{}", encode(path))).await
    }

    // ---- biometrics ----

    pub async fn enroll_fingerprint(&self, student_id: &str, student_name: &str) -> AppResult<BiometricEnrollResponse> {
        let req = BiometricEnrollRequest {
            student_id: student_id.to_string(),
            student_name: student_name.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        self.post("/biometrics/enroll", &req).await
    }

    pub async fn verify_fingerprint(&self) -> AppResult<BiometricVerifyResponse> {
        self.post("/biometrics/verify", &BiometricVerifyRequest { timestamp: chrono::Utc::now().to_rfc3339() }).await
    }

    pub async fn delete_biometric(&self, student_id: &str) -> AppResult<SuccessResponse> {
        self.delete(&format!("/biometrics/{}", encode(student_id))).await
    }

    pub async fn enrolled_students(&self) -> AppResult<Vec<StudentInfo>> { self.get("/biometrics/enrolled").await }

    /// Device status never errors: any failure reads as a disconnected reader.
    pub async fn device_status(&self) -> DeviceStatus {
        match self.get::<DeviceStatus>("/biometrics/device/status").await {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!("biometric device status unavailable: {}", e);
                DeviceStatus { connected: false, model: None, message: "Biometric device not connected".to_string() }
            }
        }
    }

    // ---- pdf ----

    /// Backend report card, or a locally rendered one (`file://` URL) when the PDF
    /// service fails. Session expiry is never papered over.
    pub async fn report_card_pdf(&self, student_id: &str) -> AppResult<PdfUrl> {
        let req = PdfRequest { student_id: Some(student_id.to_string()), class_id: None };
        match self.post::<_, PdfUrl>("/pdf/boletim", &req).await {
            Ok(url) => Ok(url),
            Err(e) if e.forces_logout() => Err(e),
            Err(e) => {
                warn!("backend report card unavailable ({}); rendering locally", e);
                self.render_report_card(student_id).await
            }
        }
    }

    async fn render_report_card(&self, student_id: &str) -> AppResult<PdfUrl> {
        let student = self.student(student_id).await?;
        let grades = self.grades(Some(student_id)).await?;
        let today = chrono::Local::now().format("%d/%m/%Y").to_string();
        let bytes = report_card::render(&student, &grades, &today)?;
        let path = report_card::write(self.report_dir(), student_id, &bytes).await?;
        info!(path = %path.display(), "report card rendered locally");
        Ok(PdfUrl { url: report_card::file_url(&path) })
    }

    pub async fn attendance_pdf(&self, class_id: Option<&str>) -> AppResult<PdfUrl> {
        self.post("/pdf/attendance", &PdfRequest { student_id: None, class_id: class_id.map(|s| s.to_string()) }).await
    }

    pub async fn pedagogical_report_pdf(&self, class_id: Option<&str>) -> AppResult<PdfUrl> {
        self.post("/pdf/pedagogical-report", &PdfRequest { student_id: None, class_id: class_id.map(|s| s.to_string()) }).await
    }
}
