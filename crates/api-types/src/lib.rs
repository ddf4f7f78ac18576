//! API types shared by the gallery server and its clients.
//!
//! This crate contains:
//! - Row types (e.g., `Photo`) - the API representation of database entities
//! - Response types (e.g., `PhotoResponse`) - the serialized form sent over HTTP

pub mod photo;

pub use photo::*;
