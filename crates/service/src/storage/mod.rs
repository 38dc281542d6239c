//! Storage abstractions for service layer
//!
//! Contains reusable file-backed helpers for services that persist a
//! single JSON document.

pub mod json_document;
