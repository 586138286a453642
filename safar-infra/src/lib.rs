pub mod app_config;
pub mod provider_client;
pub mod token_client;

pub use app_config::Config;
pub use provider_client::HttpFlightProvider;
pub use token_client::{auth_context, HttpTokenSource};
