//! Users module: domain, repository, store and service layers.
//!
//! Registration, login and lookup over a single JSON-backed collection keyed
//! by normalized (lowercase) email.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod store;

pub use errors::UserError;
pub use service::UserService;
pub use store::UserStore;
