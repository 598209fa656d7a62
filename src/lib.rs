//! Shared authentication primitives.
//!
//! Provides secure random token generation, keyed token fingerprinting,
//! compact signed tokens (HS-family JWS), PKCE challenge handling, and
//! refresh token lifecycle management over abstract storage collaborators.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod hasher;
pub mod jwt;
pub mod pkce;
pub mod policy;
pub mod random;
pub mod refresh;
pub mod storage;

// Re-exports for convenience
pub use config::AuthConfig;
pub use error::AuthError;
pub use hasher::KeyedHasher;
pub use jwt::CompactTokenCodec;
pub use random::RandomTokenGenerator;
pub use refresh::RefreshTokenStore;
