pub mod attestation_data;
pub mod broadcast;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
