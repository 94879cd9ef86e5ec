pub mod api;
pub mod api_client;
pub mod auth_service;
pub mod chat_service;
pub mod fence;
pub mod guru_service;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{Api, AuthResponse, ChatUpdate};
pub use api_client::{ApiClient, DEFAULT_BASE_URL};
pub use auth_service::AuthService;
pub use chat_service::ChatService;
pub use guru_service::GuruService;
pub use storage::LocalStore;
