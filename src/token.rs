//! Token models persisted by caches.

pub mod record;
pub mod secret;

pub use record::*;
pub use secret::*;
