pub mod checkout;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod notify;
pub mod services;
pub mod state;
pub mod token_store;

pub use client::ApiClient;
pub use config::Config;
pub use error::ApiError;
pub use state::AppServices;
pub use token_store::TokenStore;
