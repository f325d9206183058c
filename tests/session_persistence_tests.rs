use std::sync::Arc;

use schoolhub::app::AppContext;
use schoolhub::identity::{Credentials, Role, Session, SessionStore, AUTH_TOKEN_KEY, USER_DATA_KEY};
use schoolhub::routing::{Dashboard, View};
use schoolhub::storage::{FileStore, LocalStore};

mod common;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn session_survives_process_restart() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let h = common::start().await?;
    let mut cfg = h.config.clone();
    cfg.storage_path = tmp.path().join("state").join("local_storage.json");

    let first = AppContext::with_file_store(&cfg)?;
    first.login(&Credentials::new("prof01", "pw", "003", Role::Teacher)).await?;
    let signed_in = first.session();
    drop(first);

    let second = AppContext::with_file_store(&cfg)?;
    assert_eq!(second.session(), signed_in);
    assert_eq!(second.navigate("/"), View::Dashboard(Dashboard::Teacher));
    assert_eq!(second.location(), "/dashboard");

    second.logout();
    drop(second);
    let third = AppContext::with_file_store(&cfg)?;
    assert_eq!(third.session(), Session::empty());
    Ok(())
}

#[test]
fn restore_is_idempotent_on_disk() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("kv.json");
    let kv: Arc<dyn LocalStore> = Arc::new(FileStore::open(&path)?);
    kv.set(AUTH_TOKEN_KEY, "tok-abc")?;
    kv.set(
        USER_DATA_KEY,
        r#"{"id":"STU000042","name":"Ana Silva","email":"123456@escola.edu.br","role":"student","unitId":"001","unitName":"Escola Estadual Central","rm":"123456","status":"active"}"#,
    )?;

    let store = SessionStore::new(kv);
    let a = store.restore();
    let b = store.restore();
    assert!(a.is_authenticated());
    assert_eq!(a, b);
    assert_eq!(a.token(), Some("tok-abc"));
    Ok(())
}

#[test]
fn corrupted_user_data_restores_empty_and_self_heals() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("kv.json");
    {
        let kv = FileStore::open(&path)?;
        kv.set(AUTH_TOKEN_KEY, "tok-abc")?;
        kv.set(USER_DATA_KEY, "{not json")?;
    }
    let kv: Arc<dyn LocalStore> = Arc::new(FileStore::open(&path)?);
    let store = SessionStore::new(kv.clone());
    assert_eq!(store.restore(), Session::empty());
    assert!(!kv.contains(AUTH_TOKEN_KEY)?);
    assert!(!kv.contains(USER_DATA_KEY)?);

    // the cleanup reached the file too
    let reopened = FileStore::open(&path)?;
    assert!(!reopened.contains(USER_DATA_KEY)?);
    Ok(())
}

#[test]
fn unparseable_store_file_starts_empty() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("kv.json");
    std::fs::write(&path, b"\x00\x01 garbage")?;
    let kv: Arc<dyn LocalStore> = Arc::new(FileStore::open(&path)?);
    let store = SessionStore::new(kv);
    assert_eq!(store.restore(), Session::empty());
    Ok(())
}
