#![allow(dead_code)]

use std::sync::Arc;

use schoolhub::app::AppContext;
use schoolhub::config::{ClientConfig, ServerConfig};
use schoolhub::server::{self, MockBackend};
use schoolhub::storage::{LocalStore, MemoryStore};

pub struct Harness {
    pub backend: Arc<MockBackend>,
    pub config: ClientConfig,
    pub kv: Arc<MemoryStore>,
    pub ctx: AppContext,
}

/// Mock backend on 127.0.0.1:<ephemeral> with no latency, plus a client context on a memory store.
pub async fn start_with(server_cfg: ServerConfig) -> anyhow::Result<Harness> {
    let backend = Arc::new(MockBackend::new(&server_cfg));
    let addr = server::spawn_local(backend.clone(), server_cfg.latency_scale).await?;
    let config = ClientConfig::default().with_base_url(format!("http://{}/api", addr));
    let kv = Arc::new(MemoryStore::new());
    let store: Arc<dyn LocalStore> = kv.clone();
    let ctx = AppContext::init(&config, store)?;
    Ok(Harness { backend, config, kv, ctx })
}

pub async fn start() -> anyhow::Result<Harness> {
    start_with(ServerConfig::instant()).await
}

/// Base url of a port nothing listens on.
pub fn dead_base_url() -> String {
    let l = std::net::TcpListener::bind(("127.0.0.1", 0)).expect("bind 127.0.0.1:0");
    let port = l.local_addr().expect("local addr").port();
    drop(l);
    format!("http://127.0.0.1:{}/api", port)
}
