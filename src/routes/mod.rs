mod auth;
mod health_check;

pub use auth::{login, profile, refresh, register};
pub use health_check::health_check;
