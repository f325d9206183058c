//! Role router: path parsing, the authentication gate, per-role dashboards and menus.
//! Everything here is pure; the only input besides the path is the current `Session`.

mod menu;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::identity::{Role, Session};

pub use menu::{menu_for, section_label, MenuItem};

pub const LOGIN_PATH: &str = "/";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Every named screen a path can lead to, including menu-only destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    Dashboard,
    Grades,
    Attendance,
    Assignments,
    Schedule,
    Materials,
    Profile,
    Settings,
    Classes,
    Transcript,
    Messages,
    Notifications,
    Reports,
    Incidents,
    Students,
    Teachers,
    Enrollments,
    Resources,
    Monitoring,
    Logs,
    Database,
    Apis,
    Analytics,
}

impl Screen {
    pub const ALL: [Screen; 23] = [
        Screen::Dashboard, Screen::Grades, Screen::Attendance, Screen::Assignments,
        Screen::Schedule, Screen::Materials, Screen::Profile, Screen::Settings,
        Screen::Classes, Screen::Transcript, Screen::Messages, Screen::Notifications,
        Screen::Reports, Screen::Incidents, Screen::Students, Screen::Teachers,
        Screen::Enrollments, Screen::Resources, Screen::Monitoring, Screen::Logs,
        Screen::Database, Screen::Apis, Screen::Analytics,
    ];

    pub const fn path(&self) -> &'static str {
        match self {
            Screen::Dashboard => DASHBOARD_PATH,
            Screen::Grades => "/grades",
            Screen::Attendance => "/attendance",
            Screen::Assignments => "/assignments",
            Screen::Schedule => "/schedule",
            Screen::Materials => "/materials",
            Screen::Profile => "/profile",
            Screen::Settings => "/settings",
            Screen::Classes => "/classes",
            Screen::Transcript => "/transcript",
            Screen::Messages => "/messages",
            Screen::Notifications => "/notifications",
            Screen::Reports => "/reports",
            Screen::Incidents => "/incidents",
            Screen::Students => "/students",
            Screen::Teachers => "/teachers",
            Screen::Enrollments => "/enrollments",
            Screen::Resources => "/resources",
            Screen::Monitoring => "/monitoring",
            Screen::Logs => "/logs",
            Screen::Database => "/database",
            Screen::Apis => "/apis",
            Screen::Analytics => "/analytics",
        }
    }

    fn from_path(path: &str) -> Option<Screen> {
        Screen::ALL.iter().copied().find(|s| s.path() == path)
    }

    /// Screens every signed-in role may open regardless of its menu.
    pub fn always_reachable(&self) -> bool {
        matches!(self, Screen::Dashboard | Screen::Profile | Screen::Settings)
    }
}

/// Parsed location, before the gate is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Screen(Screen),
    ClassRoom { class_id: String },
    NotFound(String),
}

static CLASS_ROOM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/classes/([^/]+)/room$").unwrap());

impl Route {
    pub fn parse(path: &str) -> Route {
        // query string and fragment never take part in matching
        let path = path.split(['?', '#']).next().unwrap_or("");
        let trimmed = if path.len() > 1 { path.trim_end_matches('/') } else { path };
        if trimmed.is_empty() || trimmed == LOGIN_PATH {
            return Route::Login;
        }
        if let Some(s) = Screen::from_path(trimmed) {
            return Route::Screen(s);
        }
        if let Some(c) = CLASS_ROOM_RE.captures(trimmed) {
            return Route::ClassRoom { class_id: c[1].to_string() };
        }
        Route::NotFound(trimmed.to_string())
    }
}

/// Per-role landing view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dashboard {
    Student,
    Teacher,
    Coordinator,
    Secretary,
    Director,
    Developer,
}

/// Dashboard lookup from a raw role string. Anything outside the role set lands on
/// `Unrecognized` instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DashboardView {
    Known(Dashboard),
    Unrecognized(String),
}

pub fn dashboard_for(role: Role) -> Dashboard {
    match role {
        Role::Student => Dashboard::Student,
        Role::Teacher => Dashboard::Teacher,
        Role::Coordinator => Dashboard::Coordinator,
        Role::Secretary => Dashboard::Secretary,
        Role::Director => Dashboard::Director,
        Role::Developer => Dashboard::Developer,
    }
}

pub fn dashboard_for_raw(raw: &str) -> DashboardView {
    match raw.parse::<Role>() {
        Ok(r) => DashboardView::Known(dashboard_for(r)),
        Err(_) => DashboardView::Unrecognized(raw.to_string()),
    }
}

/// What to render for a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// The public login view. Also what every gated path shows without a session.
    Login,
    Redirect(&'static str),
    Dashboard(Dashboard),
    Screen(Screen),
    ClassRoom { class_id: String },
    NotFound(String),
}

impl View {
    pub fn is_login(&self) -> bool { matches!(self, View::Login) }
}

pub fn can_open(role: Role, screen: Screen) -> bool {
    screen.always_reachable() || menu_for(role).iter().any(|m| m.screen == screen)
}

/// Apply the gate and role rules to a path.
pub fn resolve(session: &Session, path: &str) -> View {
    let route = Route::parse(path);
    let role = match session.role() {
        Some(r) if session.is_authenticated() => r,
        _ => return View::Login,
    };
    match route {
        Route::Login => View::Redirect(DASHBOARD_PATH),
        Route::Screen(Screen::Dashboard) => View::Dashboard(dashboard_for(role)),
        Route::Screen(s) if can_open(role, s) => View::Screen(s),
        Route::Screen(_) => View::Redirect(DASHBOARD_PATH),
        Route::ClassRoom { class_id } if can_open(role, Screen::Classes) => View::ClassRoom { class_id },
        Route::ClassRoom { .. } => View::Redirect(DASHBOARD_PATH),
        Route::NotFound(p) => View::NotFound(p),
    }
}
