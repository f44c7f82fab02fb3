//! Process bootstrap for the sequence console: tracing setup and service wiring.

pub mod runtime;
pub mod telemetry;

pub use runtime::ConsoleRuntime;
pub use telemetry::{env_filter, init_tracing};
