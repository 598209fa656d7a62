//! Refresh token lifecycle: records and the orchestrating store.

pub mod record;
pub mod store;

pub use record::{RefreshTokenRecord, RefreshTokenView, TokenMetadata};
pub use store::RefreshTokenStore;
