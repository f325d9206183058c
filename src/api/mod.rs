//! Client side of the `/api` contract: typed wire structs, the token-aware HTTP
//! request layer, and the data services screens call.

mod client;
mod report_card;
pub mod contract;
mod services;

use async_trait::async_trait;

pub use client::{ApiClient, Payload};

use crate::error::AppResult;
use contract::{LoginRequest, LoginResponse, LogoutResponse};

/// What the authentication flow needs from a backend. `ApiClient` is the HTTP
/// implementation; tests can substitute their own.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, req: &LoginRequest) -> AppResult<LoginResponse>;

    /// Tell the backend a token is no longer in use. Callers do not wait on the outcome.
    async fn logout(&self, token: Option<String>) -> AppResult<LogoutResponse>;
}
