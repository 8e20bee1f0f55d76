//! Agora - discussion forum server
//!
//! Route-level authorization: every registered `(path, method)` pair is a
//! permission, roles hold sets of them, and a middleware checks the matched
//! route against the caller's role on each request.
//! It exposes all modules for testing purposes.

pub mod accounts;
pub mod bootstrap;
pub mod entities;
pub mod errors;
pub mod gate;
pub mod identity;
pub mod notice;
pub mod permissions;
pub mod roles;
pub mod routes;
pub mod session;
pub mod settings;
pub mod web;
