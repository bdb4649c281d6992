pub mod claims;
pub mod error;
pub mod factory;
pub mod jwks;
pub mod policy;
pub mod verifier;

#[cfg(test)]
pub mod testutil;

pub use claims::Claims;
pub use error::AuthError;
pub use factory::build_verifier;
pub use policy::{Denied, Requirement, Strategy};
pub use verifier::TokenVerifier;
