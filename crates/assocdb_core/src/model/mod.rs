//! Domain model for objects and their satellite entities.
//!
//! # Responsibility
//! - Define the five entity kinds and the four association kinds.
//! - Define read models returned by repositories and services.
//!
//! # Invariants
//! - Every entity is identified by a store-generated integer id.
//! - Entity names are unique within their kind and never blank.

pub mod entity;
