pub mod auth;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod notifications;
pub mod server;
pub mod services;
pub mod state;
