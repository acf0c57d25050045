//! Service layer for the storefront's authentication and session lifecycle.
//! - Separates business logic from data access and transport.
//! - Collaborators (account store, cart provisioner, event publisher) are traits
//!   with a SeaORM/HTTP implementation and an in-memory double.
//! - Provides clear error types and documented interfaces.

pub mod auth;
#[cfg(test)]
pub mod test_support;
