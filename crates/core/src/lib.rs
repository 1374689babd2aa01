//! `construcard-core` — shared domain primitives.
//!
//! Nothing in here knows about sessions, storage or rendering.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{Email, UserId};
