pub mod auth_service;
pub mod credential_service;
pub mod profile_service;

pub use auth_service::{LoginPolicy, Unthrottled};
pub use credential_service::CredentialManager;
