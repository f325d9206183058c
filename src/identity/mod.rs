//! Identity and session management for the dashboard client.
//! Keep the public surface thin and split implementation across sub-modules.

pub mod account;
pub mod role;
mod session;
mod session_store;
mod auth_flow;

pub use account::{Account, AccountStatus, Credentials, FALLBACK_UNIT_NAME, UNITS, unit_name};
pub use role::{LoginFormInfo, Role};
pub use session::{Session, SessionToken};
pub use session_store::{SessionStore, AUTH_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_DATA_KEY};
pub use auth_flow::AuthFlow;
