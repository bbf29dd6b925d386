pub mod cli;
pub mod config;
pub mod credits;
pub mod errors;
pub mod export;
pub mod extract;
pub mod fallback;
pub mod log;
pub mod merge;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod ux;
pub mod validate;
pub mod wire;
