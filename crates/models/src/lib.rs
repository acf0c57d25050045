//! SeaORM entities for accounts, refresh tokens and carts, plus the
//! connection helpers shared by the service and server crates.

pub mod errors;
pub mod db;
pub mod account;
pub mod refresh_token;
pub mod cart;

#[cfg(test)]
mod tests;
