#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(deprecated)]

//!
//! guardian-core is an object-level permission layer.
//!
//! It answers "does subject S have permission P on object O?" where grants
//! attach to individual entity instances. Grants are held by users or by
//! groups; users inherit their groups' grants one level deep.
//!
//! The crate consumes three collaborators through traits: a permission
//! catalog, a group membership provider and an entity resolver. Grant storage
//! sits behind [`store::GrantStore`].

// Identifier types (UserId, GroupId, EntityType, ...).
pub mod types;

// Entity references, permission kinds, subjects and grant rows.
pub mod primitives;

pub use primitives::*;

pub mod catalog;

// Group membership and entity resolution collaborators.
pub mod access;

pub mod store;

pub mod config;

pub mod error;

// Assignment and resolution engine.
pub mod engine;

pub use engine::{Guardian, Objects};

#[cfg(feature = "logging")]
pub mod telemetry;

#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;
