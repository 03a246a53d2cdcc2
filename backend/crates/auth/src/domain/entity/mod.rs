//! Entity Module

pub mod federated_identity;
pub mod user;
