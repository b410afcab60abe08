pub mod aggregate;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod filter;
pub mod logging;
pub mod projection;
pub mod schema;
pub mod source;
