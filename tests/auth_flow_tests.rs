use std::sync::Arc;
use std::time::Duration;

use schoolhub::app::AppContext;
use schoolhub::config::{ClientConfig, ServerConfig};
use schoolhub::error::{AppError, NoticeKind};
use schoolhub::identity::{Account, Credentials, Role, Session, AUTH_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_DATA_KEY};
use schoolhub::routing::{Dashboard, View, LOGIN_PATH};
use schoolhub::storage::{LocalStore, MemoryStore};

mod common;

fn student_creds() -> Credentials {
    Credentials::new("123456", "x", "001", Role::Student)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn student_login_resolves_authenticated_session() -> anyhow::Result<()> {
    let h = common::start().await?;
    let view = h.ctx.login(&student_creds()).await?;
    assert_eq!(view, View::Dashboard(Dashboard::Student));

    let s = h.ctx.session();
    assert!(s.is_authenticated());
    let user = s.user().expect("user");
    assert_eq!(user.role, Role::Student);
    assert_eq!(user.rm.as_deref(), Some("123456"));

    // both keys persisted and they deserialize back to the same account
    let token = h.kv.get(AUTH_TOKEN_KEY)?.expect("auth_token");
    let stored: Account = serde_json::from_str(&h.kv.get(USER_DATA_KEY)?.expect("user_data"))?;
    assert_eq!(Some(token.as_str()), s.token());
    assert_eq!(&stored, user);
    assert!(h.kv.get(REFRESH_TOKEN_KEY)?.is_some());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn logout_removes_keys_and_resets_session() -> anyhow::Result<()> {
    let h = common::start().await?;
    h.ctx.login(&student_creds()).await?;
    let old_token = h.ctx.session().token().map(|t| t.to_string()).expect("token");

    let view = h.ctx.logout();
    assert_eq!(view, View::Login);
    assert_eq!(h.ctx.session(), Session::empty());
    assert!(!h.kv.contains(AUTH_TOKEN_KEY)?);
    assert!(!h.kv.contains(USER_DATA_KEY)?);
    assert!(h.kv.is_empty());

    // the detached notification eventually revokes the token on the backend
    let mut revoked = false;
    for _ in 0..50 {
        if h.backend.expire_access_tokens() == 0 { revoked = true; break; }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(revoked, "backend still holds {}", &old_token[..8]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn expired_token_is_refreshed_transparently() -> anyhow::Result<()> {
    let h = common::start().await?;
    h.ctx.login(&student_creds()).await?;
    let before = h.ctx.session().token().map(|t| t.to_string());

    assert_eq!(h.backend.expire_access_tokens(), 1);
    let me = h.ctx.api().current_user().await?;
    assert_eq!(me.rm.as_deref(), Some("123456"));

    let after = h.ctx.session();
    assert!(after.is_authenticated());
    assert_ne!(after.token().map(|t| t.to_string()), before);
    assert_eq!(h.kv.get(AUTH_TOKEN_KEY)?.as_deref(), after.token());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_refresh_clears_session_and_shows_login() -> anyhow::Result<()> {
    let h = common::start().await?;
    h.ctx.login(&student_creds()).await?;
    h.ctx.navigate("/grades");

    h.backend.expire_access_tokens();
    h.backend.revoke_refresh_tokens();
    let err = h.ctx.api().grades(None).await.expect_err("refresh must fail");
    assert_eq!(err, AppError::SessionExpired);
    assert!(h.kv.is_empty());

    h.ctx.handle_error(&err);
    assert_eq!(h.ctx.location(), LOGIN_PATH);
    assert_eq!(h.ctx.render(), View::Login);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn retried_request_still_unauthorized_is_not_refreshed_twice() -> anyhow::Result<()> {
    // with a zero ttl every access token, refreshed ones included, is dead on arrival
    let h = common::start_with(ServerConfig { token_ttl_secs: 0, ..ServerConfig::instant() }).await?;
    h.ctx.login(&student_creds()).await?;
    let err = h.ctx.api().schedule().await.expect_err("retry must fail");
    assert_eq!(err, AppError::Unauthorized);
    // a plain 401 after a successful refresh keeps the session
    assert!(h.ctx.session().is_authenticated());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_backend_reads_as_invalid_credentials() -> anyhow::Result<()> {
    let cfg = ClientConfig::default().with_base_url(common::dead_base_url());
    let kv = Arc::new(MemoryStore::new());
    let store: Arc<dyn LocalStore> = kv.clone();
    let ctx = AppContext::init(&cfg, store)?;
    let err = ctx.login(&student_creds()).await.expect_err("no server");
    assert_eq!(err, AppError::InvalidCredentials);
    assert!(!ctx.session().is_loading());
    assert!(kv.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn second_login_replaces_the_first() -> anyhow::Result<()> {
    let h = common::start().await?;
    h.ctx.login(&student_creds()).await?;
    let view = h.ctx.login(&Credentials::new("prof01", "x", "002", Role::Teacher)).await?;
    assert_eq!(view, View::Dashboard(Dashboard::Teacher));
    let user = h.ctx.session().user().cloned().expect("user");
    assert_eq!(user.role, Role::Teacher);
    assert_eq!(user.rm, None);
    assert_eq!(user.unit_name, "Colégio Municipal Norte");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn calls_past_the_client_timeout_fail_generically() -> anyhow::Result<()> {
    // at scale 1 login waits 800 ms and the pedagogical report 1500 ms
    let h = common::start_with(ServerConfig { latency_scale: 1.0, ..ServerConfig::instant() }).await?;

    let impatient = ClientConfig { timeout: Duration::from_millis(400), ..h.config.clone() };
    let ctx = AppContext::in_memory(&impatient)?;
    assert!(matches!(ctx.login(&student_creds()).await, Err(AppError::InvalidCredentials)));
    assert!(!ctx.session().is_authenticated());

    let patient = ClientConfig { timeout: Duration::from_millis(1200), ..h.config.clone() };
    let ctx = AppContext::in_memory(&patient)?;
    ctx.login(&Credentials::new("prof01", "pw", "001", Role::Teacher)).await?;
    let err = match ctx.api().pedagogical_report_pdf(None).await {
        Ok(pdf) => anyhow::bail!("expected a timeout, got {}", pdf.url),
        Err(e) => e,
    };
    assert_eq!(err, AppError::Timeout);
    assert_eq!(ctx.handle_error(&err).kind, NoticeKind::Screen);
    assert!(ctx.session().is_authenticated());
    Ok(())
}
