// Adapters layer: concrete implementations for external systems (files, tokens, HTTP API).

pub mod credentials;
pub mod http;
pub mod storage;

pub use credentials::Credentials;
pub use http::FritzClient;
pub use storage::LocalStorage;
