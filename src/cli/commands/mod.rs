//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod doctor;
mod seed;
mod serve;
mod tools;

pub use ask::run_ask;
pub use chat::{run_chat, EXAMPLE_QUERIES};
pub use config::run_config;
pub use doctor::run_doctor;
pub use seed::run_seed;
pub use serve::run_serve;
pub use tools::run_tools;
