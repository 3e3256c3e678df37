pub mod config;
pub mod error;
pub mod identity;
pub mod observability;
pub mod questions;
pub mod security;
pub mod server;
pub mod users;
