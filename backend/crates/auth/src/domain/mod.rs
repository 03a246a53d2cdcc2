//! Domain Layer
//!
//! Contains entities, value objects, repository traits and outbound ports.

pub mod entity;
pub mod gateway;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{federated_identity::FederatedIdentity, user::User};
pub use gateway::{EmailSender, IdentityProvider};
pub use repository::{KeyValueCache, UserRepository};
