#![warn(clippy::unwrap_used)]

pub mod attestation;
pub mod attestation_data;
pub mod checkpoint;
pub mod constants;
pub mod sync_committee;
pub mod validator_registration;
