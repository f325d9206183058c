use serde::Serialize;

use super::Screen;
use crate::identity::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub title: &'static str,
    pub screen: Screen,
    pub url: &'static str,
}

const fn item(title: &'static str, screen: Screen) -> MenuItem {
    MenuItem { title, screen, url: screen.path() }
}

const STUDENT: &[MenuItem] = &[
    item("Dashboard", Screen::Dashboard),
    item("Class schedule", Screen::Schedule),
    item("Grades and report card", Screen::Grades),
    item("Attendance", Screen::Attendance),
    item("Assignments", Screen::Assignments),
    item("Study materials", Screen::Materials),
    item("Transcript", Screen::Transcript),
    item("Messages", Screen::Messages),
    item("Notifications", Screen::Notifications),
];

const TEACHER: &[MenuItem] = &[
    item("Dashboard", Screen::Dashboard),
    item("My classes", Screen::Classes),
    item("Roll call", Screen::Attendance),
    item("Activities", Screen::Assignments),
    item("Grades and assessments", Screen::Grades),
    item("Materials", Screen::Materials),
    item("Reports", Screen::Reports),
    item("Messages", Screen::Messages),
    item("Incidents", Screen::Incidents),
];

const COORDINATOR: &[MenuItem] = &[
    item("Dashboard", Screen::Dashboard),
    item("Classes and schedules", Screen::Classes),
    item("Teachers", Screen::Teachers),
    item("Students", Screen::Students),
    item("Grades", Screen::Grades),
    item("Attendance", Screen::Attendance),
    item("Reports", Screen::Reports),
    item("Incidents", Screen::Incidents),
    item("Messages", Screen::Messages),
];

const SECRETARY: &[MenuItem] = &[
    item("Dashboard", Screen::Dashboard),
    item("Students", Screen::Students),
    item("Enrollments", Screen::Enrollments),
    item("Classes and schedules", Screen::Classes),
    item("Transcripts", Screen::Transcript),
    item("Reports", Screen::Reports),
    item("Messages", Screen::Messages),
];

const DIRECTOR: &[MenuItem] = &[
    item("Dashboard", Screen::Dashboard),
    item("Students", Screen::Students),
    item("Teachers", Screen::Teachers),
    item("Classes and schedules", Screen::Classes),
    item("Enrollments", Screen::Enrollments),
    item("Reports", Screen::Reports),
    item("School resources", Screen::Resources),
    item("Messages", Screen::Messages),
    item("Settings", Screen::Settings),
];

const DEVELOPER: &[MenuItem] = &[
    item("Dashboard", Screen::Dashboard),
    item("Monitoring", Screen::Monitoring),
    item("System logs", Screen::Logs),
    item("Database", Screen::Database),
    item("APIs and tokens", Screen::Apis),
    item("Analytics", Screen::Analytics),
    item("Settings", Screen::Settings),
];

/// Navigation menu for a role. Depends on the role alone.
pub fn menu_for(role: Role) -> &'static [MenuItem] {
    match role {
        Role::Student => STUDENT,
        Role::Teacher => TEACHER,
        Role::Coordinator => COORDINATOR,
        Role::Secretary => SECRETARY,
        Role::Director => DIRECTOR,
        Role::Developer => DEVELOPER,
    }
}

/// Sidebar heading shown above the menu.
pub fn section_label(role: Role) -> &'static str {
    match role {
        Role::Student => "Student area",
        Role::Teacher => "Teacher area",
        Role::Coordinator => "Coordination area",
        Role::Secretary => "Secretary area",
        Role::Director => "Board area",
        Role::Developer => "Developer area",
    }
}
