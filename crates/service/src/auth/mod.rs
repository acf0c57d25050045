//! Auth module: three-layer architecture (domain, repository, service).
//!
//! This module centralizes registration, login, refresh-token rotation and
//! logout under the service crate. Password hashing and the token codec are
//! leaf modules with no store access.

pub mod cart;
pub mod domain;
pub mod errors;
pub mod events;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;
pub mod repo;

pub use errors::AuthError;
pub use service::{AuthConfig, AuthService};
