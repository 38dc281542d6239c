//! Service layer for the student hub backend.
//! - `storage` holds the generic JSON-file persistence helper.
//! - `users` holds registration, login and lookup on top of a JSON-backed store.
//! - Nothing here depends on the web framework.

pub mod errors;
pub mod storage;
pub mod users;
