//! Wire contract of the `/api` backend: one request/response type per endpoint.
//! JSON with camelCase keys. Both the HTTP client and the mock backend are written
//! against these types, never against ad hoc JSON.

use serde::{Deserialize, Serialize};

use crate::identity::{Account, Credentials, Role};

// ---- auth ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
    pub unit_id: String,
    pub user_type: Role,
}

impl From<&Credentials> for LoginRequest {
    fn from(c: &Credentials) -> Self {
        Self { identifier: c.identifier.clone(), password: c.password.clone(), unit_id: c.unit_id.clone(), user_type: c.user_type }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub refresh_token: String,
    pub user: Account,
    /// Seconds until `token` expires.
    pub expires_in: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub token: String,
    pub expires_in: u64,
}

// ---- school data ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub teacher_id: String,
    pub teacher_name: String,
    /// Enrolled student count.
    pub students: u32,
    pub schedule: String,
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInfo {
    pub id: String,
    pub name: String,
    pub rm: String,
    pub call_number: u32,
    pub course: String,
    pub avatar: String,
    pub age: u32,
    #[serde(default)]
    pub observations: String,
    #[serde(default)]
    pub biometric_enrolled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeStatus {
    Excellent,
    Good,
    Regular,
    Insufficient,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRecord {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub subject: String,
    pub bimester1: Option<f64>,
    pub bimester2: Option<f64>,
    pub bimester3: Option<f64>,
    pub bimester4: Option<f64>,
    pub average: f64,
    pub status: GradeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeSubmission {
    pub student_id: String,
    pub subject: String,
    pub bimester: u8,
    pub grade: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BulkGradesRequest {
    #[serde(default)]
    pub grades: Vec<GradeSubmission>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Justified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub student_id: String,
    pub date: String,
    pub class_id: String,
    pub subject: String,
    pub status: AttendanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSubmission {
    pub student_id: String,
    pub class_id: String,
    pub date: String,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BulkAttendanceRequest {
    #[serde(default)]
    pub attendance: Vec<AttendanceSubmission>,
}

/// Reply of every bulk write. `count` echoes the input length; nothing is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkWriteResponse {
    pub success: bool,
    pub count: usize,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Pending,
    Submitted,
    Graded,
    Late,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub title: String,
    pub subject: String,
    pub description: String,
    pub due_date: String,
    pub status: ActivityStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_date: Option<String>,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<f64>,
    pub max_grade: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    pub title: String,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    pub due_date: String,
    pub weight: f64,
    pub max_grade: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedActivity {
    pub id: String,
    #[serde(flatten)]
    pub activity: NewActivity,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: String,
    pub title: String,
    pub subject: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub uploaded_at: String,
    pub uploaded_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub time: String,
    pub subject: String,
    pub teacher: String,
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDay {
    pub day: String,
    pub classes: Vec<ScheduleSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUploadResponse {
    pub path: String,
    pub signed_url: String,
}

/// Body of `PUT /student/{id}`. Absent fields keep their current value; the reply is
/// the whole updated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
}

impl ProfileUpdate {
    /// Parse `field=value` pairs. Unknown fields are reported back by name.
    pub fn from_pairs<'a, I: IntoIterator<Item = &'a str>>(pairs: I) -> Result<Self, String> {
        let mut u = ProfileUpdate::default();
        for pair in pairs {
            let Some((k, v)) = pair.split_once('=') else { return Err(pair.to_string()); };
            let v = Some(v.to_string());
            match k {
                "name" => u.name = v,
                "email" => u.email = v,
                "avatar" => u.avatar = v,
                "rm" => u.rm = v,
                "course" => u.course = v,
                other => return Err(other.to_string()),
            }
        }
        Ok(u)
    }

    pub fn apply(&self, account: &mut Account) {
        if let Some(v) = &self.name { account.name = v.clone(); }
        if let Some(v) = &self.email { account.email = v.clone(); }
        if let Some(v) = &self.avatar { account.avatar = Some(v.clone()); }
        if let Some(v) = &self.rm { account.rm = Some(v.clone()); }
        if let Some(v) = &self.course { account.course = Some(v.clone()); }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ---- biometrics ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiometricEnrollRequest {
    pub student_id: String,
    pub student_name: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiometricEnrollResponse {
    pub success: bool,
    pub biometric_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiometricVerifyRequest {
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiometricVerifyResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    pub confidence: f64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub message: String,
}

// ---- pdf ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PdfRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfUrl {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_response_uses_wire_names() {
        let v = serde_json::json!({
            "token": "t", "refreshToken": "r", "expiresIn": 3600,
            "user": {"id": "TEA001", "name": "Prof. Roberto Lima", "email": "roberto.lima@escola.edu.br",
                     "role": "teacher", "unitId": "001", "unitName": "Escola Estadual Central", "status": "active"}
        });
        let r: LoginResponse = serde_json::from_value(v).unwrap();
        assert_eq!(r.refresh_token, "r");
        assert_eq!(r.user.role, Role::Teacher);
    }

    #[test]
    fn material_kind_is_type_on_the_wire() {
        let m = Material {
            id: "MAT_001".into(), title: "t".into(), subject: "s".into(), kind: "pdf".into(),
            url: "/m.pdf".into(), uploaded_at: "2024-01-10".into(), uploaded_by: "x".into(),
        };
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["type"], "pdf");
        assert!(v.get("kind").is_none());
    }

    #[test]
    fn created_activity_flattens_input() {
        let c = CreatedActivity {
            id: "ACT_1".into(),
            activity: NewActivity { title: "Quiz".into(), subject: "Física".into(), description: String::new(), due_date: "2024-02-01".into(), weight: 1.0, max_grade: 10.0 },
            created_at: "2024-01-20T10:00:00Z".into(),
        };
        let v = serde_json::to_value(&c).unwrap();
        assert_eq!(v["title"], "Quiz");
        assert_eq!(v["dueDate"], "2024-02-01");
        assert_eq!(v["createdAt"], "2024-01-20T10:00:00Z");
    }

    #[test]
    fn profile_update_pairs() {
        let u = ProfileUpdate::from_pairs(["name=Ana Lima", "avatar=/a.png"]).unwrap();
        assert_eq!(u.name.as_deref(), Some("Ana Lima"));
        assert_eq!(u.avatar.as_deref(), Some("/a.png"));
        assert_eq!(u.email, None);
        assert_eq!(ProfileUpdate::from_pairs(["age=3"]), Err("age".to_string()));
        assert_eq!(ProfileUpdate::from_pairs(["name"]), Err("name".to_string()));
        let v = serde_json::to_value(&u).unwrap();
        assert!(v.get("email").is_none());
    }
}
