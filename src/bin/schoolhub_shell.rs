//!
//! schoolhub shell
//! ---------------
//! Interactive terminal front end for the dashboard core: sign in as any role, move
//! between routes, list the role menu and fetch screen data from the `/api` backend.
//! With `--embedded` a mock backend is started in-process on an ephemeral port.

use std::sync::Arc;

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt};

use schoolhub::app::AppContext;
use schoolhub::config::{has_flag, ClientConfig, ServerConfig};
use schoolhub::api::contract::ProfileUpdate;
use schoolhub::error::{AppError, AppResult, Notice, NoticeKind};
use schoolhub::identity::{Credentials, Role, Session, UNITS};
use schoolhub::routing::{self, View};
use schoolhub::server::{self, MockBackend};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--embedded] [--api-url <url>] [--storage <file>] [--timeout <secs>] [--report-dir <dir>] [--latency <scale>] [--no-latency]\n\nFlags:\n  --embedded           start a mock backend in-process and talk to it\n  --api-url <url>      backend base url (default http://localhost:8080/api, env SCHOOLHUB_API_URL)\n  --storage <file>     local session file (default .schoolhub/local_storage.json, env SCHOOLHUB_STORAGE)\n  --timeout <secs>     per-request timeout (default 30)\n  --report-dir <dir>   where locally rendered PDFs go (default .schoolhub/reports, env SCHOOLHUB_REPORT_DIR)\n  --latency <scale>    mock latency multiplier when --embedded\n  --no-latency         disable mock latency when --embedded\n  -h, --help           show this help\n\nInteractive commands:\n  login <role> <identifier> <password> <unitId>   sign in (roles: student teacher coordinator secretary director developer)\n  form <role>                                     show the login form copy for a role\n  units                                           list school units\n  go <path>                                       navigate, e.g. go /grades\n  where                                           show current location and view\n  menu                                            list the navigation menu of the signed-in role\n  whoami                                          show the current session\n  fetch <grades|schedule|classes|materials|activities|attendance|device>\n  profile <field>=<value>...                      edit your profile (fields: name email avatar rm course)\n  upload <file> [bucket]                          upload a local file to storage\n  boletim [studentId]                             report card PDF (rendered locally if the backend fails)\n  logout                                          sign out\n  help                                            show this help\n  quit | exit                                     leave the shell"
    );
}

fn print_json<T: Serialize>(v: &T) {
    match serde_json::to_string_pretty(v) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("error: {}", e),
    }
}

fn describe(view: &View, session: &Session) -> String {
    match view {
        View::Login => "login".to_string(),
        View::Redirect(to) => format!("redirect -> {}", to),
        View::Dashboard(d) => {
            let label = session.role().map(routing::section_label).unwrap_or("");
            format!("dashboard {:?} ({})", d, label)
        }
        View::Screen(s) => format!("screen {:?} ({})", s, s.path()),
        View::ClassRoom { class_id } => format!("class room {}", class_id),
        View::NotFound(p) => format!("not found: {}", p),
    }
}

fn show_notice(n: &Notice) {
    match n.kind {
        NoticeKind::Silent => {}
        NoticeKind::Inline => {
            for f in &n.fields { eprintln!("  {}: {}", f.field, f.message); }
        }
        NoticeKind::Toast | NoticeKind::Screen => eprintln!("! {}", n.message),
    }
}

async fn fetch(ctx: &AppContext, what: &str) -> AppResult<()> {
    let api = ctx.api();
    let session = ctx.session();
    let user_id = session.user().map(|u| u.id.clone()).unwrap_or_default();
    match what {
        "grades" => {
            let sid = if session.role() == Some(Role::Student) { Some(user_id.as_str()) } else { None };
            print_json(&api.grades(sid).await?);
        }
        "schedule" => print_json(&api.schedule().await?),
        "classes" => print_json(&api.classes().await?),
        "materials" => print_json(&api.materials().await?),
        "activities" => print_json(&api.activities().await?),
        "attendance" => print_json(&api.student_attendance(&user_id).await?),
        "device" => print_json(&api.device_status().await),
        other => eprintln!("unknown data set: {}", other),
    }
    Ok(())
}

fn report_failure(ctx: &AppContext, e: &AppError) {
    show_notice(&ctx.handle_error(e));
    if e.is_transient() { eprintln!("  (temporary failure; run the command again to retry)"); }
    if ctx.render().is_login() { println!("view: login"); }
}

async fn upload(ctx: &AppContext, file: &str, bucket: Option<&str>) -> AppResult<()> {
    let bytes = tokio::fs::read(file).await?;
    let name = std::path::Path::new(file).file_name().and_then(|n| n.to_str()).unwrap_or("file");
    print_json(&ctx.api().storage_upload(name, bytes, bucket).await?);
    Ok(())
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))?;
    fmt().with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().collect();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        print_usage("schoolhub_shell");
        return Ok(());
    }

    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let mut cfg = ClientConfig::from_env_and_args(&args);
    if has_flag(&args, "--embedded") {
        let scfg = ServerConfig::from_env_and_args(&args);
        let backend = Arc::new(MockBackend::new(&scfg));
        let addr = rt.block_on(server::spawn_local(backend, scfg.latency_scale))?;
        cfg = cfg.with_base_url(format!("http://{}/api", addr));
        println!("embedded mock backend on {}", addr);
    }

    let ctx = AppContext::with_file_store(&cfg)
        .with_context(|| format!("failed to open local storage at {}", cfg.storage_path.display()))?;
    let first = ctx.render();
    println!("schoolhub shell against {}. Type 'help' for commands.", cfg.api_base_url);
    println!("view: {}", describe(&first, &ctx.session()));

    let mut rl = DefaultEditor::new().context("failed to initialise line editor")?;
    loop {
        let line = match rl.readline("schoolhub> ") {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) => { println!("CTRL-C detected. Type 'quit' to exit."); continue; }
            Err(ReadlineError::Eof) => break,
            Err(e) => { eprintln!("input error: {}", e); break; }
        };
        let line = line.trim();
        if line.is_empty() { continue; }
        let _ = rl.add_history_entry(line);
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0].to_ascii_lowercase().as_str() {
            "quit" | "exit" => break,
            "help" => print_usage("schoolhub_shell"),
            "units" => {
                for (id, name) in UNITS { println!("{}  {}", id, name); }
            }
            "form" => {
                let Some(raw) = parts.get(1) else { eprintln!("usage: form <role>"); continue; };
                match raw.parse::<Role>() {
                    Ok(r) => {
                        let f = r.login_form();
                        println!("{}\n{}\nidentifier: {}", f.title, f.description, f.identifier_label);
                    }
                    Err(e) => show_notice(&e.notice()),
                }
            }
            "login" => {
                if parts.len() < 5 { eprintln!("usage: login <role> <identifier> <password> <unitId>"); continue; }
                let role = match parts[1].parse::<Role>() {
                    Ok(r) => r,
                    Err(e) => { show_notice(&e.notice()); continue; }
                };
                let creds = Credentials::new(parts[2], parts[3], parts[4], role);
                match rt.block_on(ctx.login(&creds)) {
                    Ok(view) => println!("view: {}", describe(&view, &ctx.session())),
                    Err(e) => show_notice(&ctx.handle_error(&e)),
                }
            }
            "go" => {
                let Some(path) = parts.get(1) else { eprintln!("usage: go <path>"); continue; };
                let view = ctx.navigate(path);
                println!("view: {}", describe(&view, &ctx.session()));
            }
            "where" => {
                let view = ctx.render();
                println!("{} -> {}", ctx.location(), describe(&view, &ctx.session()));
            }
            "menu" => match ctx.session().role() {
                Some(role) => {
                    println!("{}", routing::section_label(role));
                    for item in routing::menu_for(role) { println!("  {:<28} {}", item.title, item.url); }
                }
                None => println!("not signed in"),
            },
            "whoami" => print_json(&ctx.session()),
            "fetch" => {
                let Some(what) = parts.get(1) else { eprintln!("usage: fetch <data set>"); continue; };
                if let Err(e) = rt.block_on(fetch(&ctx, what)) { report_failure(&ctx, &e); }
            }
            "profile" => {
                if parts.len() < 2 { eprintln!("usage: profile <field>=<value>..."); continue; }
                let update = match ProfileUpdate::from_pairs(parts[1..].iter().copied()) {
                    Ok(u) => u,
                    Err(field) => { eprintln!("unknown profile field: {}", field); continue; }
                };
                match rt.block_on(ctx.api().update_profile(&update)) {
                    Ok(s) => print_json(&s),
                    Err(e) => report_failure(&ctx, &e),
                }
            }
            "upload" => {
                let Some(file) = parts.get(1) else { eprintln!("usage: upload <file> [bucket]"); continue; };
                if let Err(e) = rt.block_on(upload(&ctx, file, parts.get(2).copied())) { report_failure(&ctx, &e); }
            }
            "boletim" => {
                let own = ctx.session().user().map(|u| u.id.clone()).unwrap_or_default();
                let id = parts.get(1).map(|s| s.to_string()).unwrap_or(own);
                match rt.block_on(ctx.api().report_card_pdf(&id)) {
                    Ok(pdf) => println!("{}", pdf.url),
                    Err(e) => report_failure(&ctx, &e),
                }
            }
            "logout" => {
                // the shell keeps the runtime alive, so the backend notification gets sent
                let view = rt.block_on(async { ctx.logout() });
                println!("view: {}", describe(&view, &ctx.session()));
            }
            other => eprintln!("unknown command: {} (try 'help')", other),
        }
    }
    Ok(())
}
