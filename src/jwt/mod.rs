//! Compact signed tokens (HS-family JWS).

pub mod claims;
pub mod codec;
pub mod encoding;

pub use claims::{ClaimSet, ClaimsBuilder};
pub use codec::{CompactTokenCodec, SigningAlgorithm};
