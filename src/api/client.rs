use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::contract::{LoginRequest, LoginResponse, LogoutResponse, RefreshRequest, RefreshResponse};
use super::AuthApi;
use crate::config::ClientConfig;
use crate::error::{AppError, AppResult};
use crate::identity::{Account, SessionStore};
use crate::{token_prefix, tprintln};

/// Request body. Multipart forms are rebuilt per attempt since a form can only be sent once.
#[derive(Debug, Clone)]
pub enum Payload {
    Empty,
    Json(Value),
    File { field_text: Vec<(String, String)>, file_name: String, bytes: Vec<u8> },
}

impl Payload {
    fn apply(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Payload::Empty => req,
            Payload::Json(v) => req.json(v),
            Payload::File { field_text, file_name, bytes } => {
                let mut form = reqwest::multipart::Form::new();
                for (k, v) in field_text { form = form.text(k.clone(), v.clone()); }
                let part = reqwest::multipart::Part::bytes(bytes.clone()).file_name(file_name.clone());
                req.multipart(form.part("file", part))
            }
        }
    }
}

/// JSON-over-HTTP request layer.
///
/// Every call carries `Authorization: Bearer <token>` from the session store. A 401
/// triggers exactly one refresh followed by exactly one retry; if the refresh fails the
/// session is cleared and the call reports `SessionExpired`.
#[derive(Clone)]
pub struct ApiClient {
    base: String,
    client: reqwest::Client,
    session: Arc<SessionStore>,
    report_dir: PathBuf,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: Arc<SessionStore>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Network(format!("http client init: {}", e)))?;
        Ok(Self {
            base: config.api_base_url.trim_end_matches('/').to_string(),
            client,
            session,
            report_dir: config.report_dir.clone(),
        })
    }

    pub fn base_url(&self) -> &str { &self.base }

    pub fn session(&self) -> &Arc<SessionStore> { &self.session }

    pub fn report_dir(&self) -> &Path { &self.report_dir }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') { format!("{}{}", self.base, path) } else { format!("{}/{}", self.base, path) }
    }

    async fn send_once(&self, method: &Method, path: &str, body: &Payload, token: Option<&str>) -> AppResult<reqwest::Response> {
        let mut req = self.client.request(method.clone(), self.url(path));
        if let Some(t) = token { req = req.bearer_auth(t); }
        Ok(body.apply(req).send().await?)
    }

    async fn read_json(resp: reqwest::Response) -> AppResult<Value> {
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(|s| s.to_string()))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            return Err(AppError::Http { status: status.as_u16(), message });
        }
        Ok(resp.json::<Value>().await?)
    }

    /// Issue a request with the refresh-once/retry-once policy.
    pub async fn request(&self, method: Method, path: &str, body: Payload) -> AppResult<Value> {
        let token = self.session.token();
        let resp = self.send_once(&method, path, &body, token.as_deref()).await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Self::read_json(resp).await;
        }
        debug!("{} {} -> 401, attempting token refresh", method, path);
        let new_token = match self.refresh().await {
            Ok(t) => t,
            Err(e) => {
                warn!("token refresh failed ({}); clearing session", e);
                self.session.clear();
                return Err(AppError::SessionExpired);
            }
        };
        let retry = self.send_once(&method, path, &body, Some(&new_token)).await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            warn!("{} {} still unauthorized after refresh", method, path);
            return Err(AppError::Unauthorized);
        }
        Self::read_json(retry).await
    }

    /// Exchange the stored refresh token for a new access token and store it.
    pub async fn refresh(&self) -> AppResult<String> {
        let Some(refresh_token) = self.session.refresh_token() else {
            return Err(AppError::SessionExpired);
        };
        let resp = self.client
            .post(self.url("/auth/refresh"))
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;
        let v = Self::read_json(resp).await?;
        let r: RefreshResponse = serde_json::from_value(v)?;
        self.session.set_token(&r.token)?;
        tprintln!("api.refresh token={} expires_in={}", token_prefix(&r.token), r.expires_in);
        Ok(r.token)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let v = self.request(Method::GET, path, Payload::Empty).await?;
        Ok(serde_json::from_value(v)?)
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> AppResult<T> {
        let v = self.request(Method::POST, path, Payload::Json(serde_json::to_value(body)?)).await?;
        Ok(serde_json::from_value(v)?)
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> AppResult<T> {
        let v = self.request(Method::PUT, path, Payload::Json(serde_json::to_value(body)?)).await?;
        Ok(serde_json::from_value(v)?)
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let v = self.request(Method::DELETE, path, Payload::Empty).await?;
        Ok(serde_json::from_value(v)?)
    }

    /// `GET /user/me`.
    pub async fn current_user(&self) -> AppResult<Account> {
        let a: Account = self.get("/user/me").await?;
        Ok(a.normalized())
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, req: &LoginRequest) -> AppResult<LoginResponse> {
        // Login never goes through the refresh path: a 401 here is just a rejection.
        let resp = self.client.post(self.url("/auth/login")).json(req).send().await?;
        let v = Self::read_json(resp).await?;
        Ok(serde_json::from_value(v)?)
    }

    async fn logout(&self, token: Option<String>) -> AppResult<LogoutResponse> {
        let resp = self.send_once(&Method::POST, "/auth/logout", &Payload::Empty, token.as_deref()).await?;
        let v = Self::read_json(resp).await?;
        Ok(serde_json::from_value(v)?)
    }
}
