//! Request authentication interceptor backed by a remote OAuth access-token service.
//!
//! - `services::oauth::Authenticator::authenticate_request` strips untrusted identity
//!   headers, resolves `?access_token=` remotely and stamps `X-Caller-Id` / `X-Client-Id`
//!   (plus a typed `AuthCtx` extension) on success.
//! - `services::oauth::{is_public, caller_id, client_id}` are the read-only queries
//!   downstream handlers use.
//! - `app` wires the interceptor into an axum server.
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
