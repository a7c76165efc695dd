pub mod core;
pub mod objects;
pub mod resolution;


// Re-export the primary types so callers can use `crate::engine::*`.
pub use self::core::Guardian;
pub use objects::Objects;
