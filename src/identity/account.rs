use serde::{Deserialize, Serialize};

use super::role::Role;
use crate::error::{AppError, AppResult, FieldError};

/// Known school units: (unit id, unit name).
pub const UNITS: &[(&str, &str)] = &[
    ("001", "Escola Estadual Central"),
    ("002", "Colégio Municipal Norte"),
    ("003", "Instituto Educacional Sul"),
    ("004", "Campus Universitário Leste"),
];

pub const FALLBACK_UNIT_NAME: &str = "Unidade Escolar";

pub fn unit_name(unit_id: &str) -> &'static str {
    UNITS.iter().find(|(id, _)| *id == unit_id).map(|(_, name)| *name).unwrap_or(FALLBACK_UNIT_NAME)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

/// An authenticated identity. Serialized with camelCase keys; this is also the `user_data` format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub unit_id: String,
    pub unit_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Enrollment number. Students only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rm: Option<String>,
    /// Course/grade. Students only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(default)]
    pub status: AccountStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biometric_id: Option<String>,
}

impl Account {
    pub fn is_student(&self) -> bool { self.role == Role::Student }

    /// Enforce the student-only fields: `rm` and `course` are dropped for every other role.
    pub fn normalized(mut self) -> Self {
        if !self.is_student() {
            self.rm = None;
            self.course = None;
        }
        self
    }

    /// Check the student-only field rule without changing anything.
    pub fn check_invariants(&self) -> AppResult<()> {
        match (self.is_student(), self.rm.is_some(), self.course.is_some()) {
            (true, false, _) => Err(AppError::Decode(format!("student account {} has no rm", self.id))),
            (false, true, _) | (false, _, true) => {
                Err(AppError::Decode(format!("{} account {} carries student-only fields", self.role, self.id)))
            }
            _ => Ok(()),
        }
    }
}

/// What the login form submits. Never persisted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Enrollment number (RM) for students, generic identifier otherwise.
    pub identifier: String,
    pub password: String,
    pub unit_id: String,
    /// Declared by the user before submit, not derived by the server.
    pub user_type: Role,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("password", &"<redacted>")
            .field("unit_id", &self.unit_id)
            .field("user_type", &self.user_type)
            .finish()
    }
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, password: impl Into<String>, unit_id: impl Into<String>, user_type: Role) -> Self {
        Self { identifier: identifier.into(), password: password.into(), unit_id: unit_id.into(), user_type }
    }

    /// Required-field check done by the form layer before login is attempted.
    pub fn validate(&self) -> AppResult<()> {
        let mut errs = Vec::new();
        if self.identifier.trim().is_empty() {
            errs.push(FieldError::new("identifier", self.user_type.login_form().identifier_label.to_string() + " is required"));
        }
        if self.password.is_empty() {
            errs.push(FieldError::new("password", "Password is required"));
        }
        if self.unit_id.trim().is_empty() {
            errs.push(FieldError::new("unitId", "Select a school unit"));
        }
        if errs.is_empty() { Ok(()) } else { Err(AppError::Validation(errs)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teacher_with_student_fields() -> Account {
        Account {
            id: "TEA000001".into(),
            name: "Prof. Roberto Lima".into(),
            email: "roberto@escola.edu.br".into(),
            role: Role::Teacher,
            unit_id: "001".into(),
            unit_name: unit_name("001").into(),
            avatar: None,
            rm: Some("999".into()),
            course: Some("3º Ano".into()),
            status: AccountStatus::Active,
            registration_date: None,
            biometric_id: None,
        }
    }

    #[test]
    fn normalize_strips_student_fields_for_other_roles() {
        let a = teacher_with_student_fields();
        assert!(a.check_invariants().is_err());
        let n = a.normalized();
        assert_eq!(n.rm, None);
        assert_eq!(n.course, None);
        assert!(n.check_invariants().is_ok());
    }

    #[test]
    fn student_without_rm_is_invalid() {
        let mut a = teacher_with_student_fields();
        a.role = Role::Student;
        a.rm = None;
        assert!(a.check_invariants().is_err());
        a.rm = Some("123456".into());
        assert!(a.clone().normalized().rm.is_some());
        assert!(a.check_invariants().is_ok());
    }

    #[test]
    fn serializes_camel_case_and_omits_empty() {
        let a = teacher_with_student_fields().normalized();
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(v["unitId"], "001");
        assert_eq!(v["role"], "teacher");
        assert_eq!(v["status"], "active");
        assert!(v.get("rm").is_none());
        let back: Account = serde_json::from_value(v).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn unknown_unit_falls_back() {
        assert_eq!(unit_name("003"), "Instituto Educacional Sul");
        assert_eq!(unit_name("999"), FALLBACK_UNIT_NAME);
    }

    #[test]
    fn credentials_validation_and_redaction() {
        let c = Credentials::new("", "", "001", Role::Student);
        match c.validate() {
            Err(AppError::Validation(f)) => {
                let names: Vec<&str> = f.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(names, vec!["identifier", "password"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        let ok = Credentials::new("123456", "secret", "001", Role::Student);
        assert!(ok.validate().is_ok());
        assert!(!format!("{:?}", ok).contains("secret"));
    }
}
