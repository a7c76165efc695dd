//! Collaborator-facing access modules: group membership and entity resolution.
//!
//! Both are owned outside this crate; the engine only consumes the traits.
//! In-memory implementations are provided for tests and embedding.

pub mod membership;
pub mod resolver;

pub use membership::*;
pub use resolver::*;
