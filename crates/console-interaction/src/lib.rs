//! HTTP collaborators for the console backend.

pub mod console_api_client;

pub use console_api_client::ConsoleApiClient;
