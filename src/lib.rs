pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{FileStore, MemoryStore};
pub use core::{
    api_client::ApiClient,
    cache::TtlCache,
    interceptor::{install_api_namespace_interceptor, InterceptedClient, NamespaceInterceptor},
    namespace::{build_api_url, build_websocket_url, resolve_api_endpoint},
    websocket::{ReconnectConfig, ReconnectingSocket},
};
pub use utils::error::{Result, SalonError};
