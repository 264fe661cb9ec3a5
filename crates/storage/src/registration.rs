use std::sync::Arc;

use ream_consensus_misc::validator_registration::ValidatorRegistration;
use thiserror::Error;
use tracing::debug;

use crate::{cache::RegistrationCache, db::ReamDB, errors::StoreError, tables::table::Table};

#[derive(Error, Debug)]
pub enum RegistrationError {
    /// Absent from both the cache and the database.
    #[error("No validator registration found for validator index {0}")]
    NotFound(u64),

    #[error("Failed to access validator registrations: {0}")]
    Store(#[from] StoreError),
}

/// Read-through access to validator registrations. The database is the system of record; the
/// cache is filled from it on a miss.
#[derive(Debug, Clone)]
pub struct RegistrationProvider {
    cache: Arc<RegistrationCache>,
    db: ReamDB,
}

impl RegistrationProvider {
    pub fn new(cache: Arc<RegistrationCache>, db: ReamDB) -> Self {
        Self { cache, db }
    }

    pub fn registration_by_validator_index(
        &self,
        validator_index: u64,
    ) -> Result<ValidatorRegistration, RegistrationError> {
        match self.cache.registration_by_index(validator_index) {
            Ok(registration) => return Ok(registration),
            Err(RegistrationError::NotFound(_)) => {}
            Err(err) => return Err(err),
        }

        let registration = self
            .db
            .validator_registration_provider()
            .get(validator_index)?
            .ok_or(RegistrationError::NotFound(validator_index))?;
        debug!(validator_index, "Loaded validator registration from database");

        self.cache
            .update_registrations([(validator_index, registration.clone())]);
        Ok(registration)
    }

    /// Writes through to the database first, then the cache.
    pub fn save_registrations(
        &self,
        registrations: Vec<(u64, ValidatorRegistration)>,
    ) -> Result<(), RegistrationError> {
        self.db
            .validator_registration_provider()
            .insert_batch(registrations.clone())?;
        self.cache.update_registrations(registrations);
        Ok(())
    }
}
