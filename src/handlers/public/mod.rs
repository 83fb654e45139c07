// handlers/public/mod.rs - Handlers reachable without a session

pub mod auth;

pub use auth::{session_get, signin_post, signout_post};
