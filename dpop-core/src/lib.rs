//! Key material, JWK thumbprints, and the protocol claim shapes shared by the
//! DPoP proof generator and proof validator.

pub mod claims;
pub mod error;
pub mod keys;

pub use claims::{Audience, ClientAssertionClaims, ConfirmationClaim, DpopProofClaims};
pub use error::KeyError;
pub use keys::KeyPair;
