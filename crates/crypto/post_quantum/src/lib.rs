pub mod errors;
pub mod public_key;
pub mod signature;

pub use public_key::PQPublicKey;
pub use signature::PQSignature;
