use std::{fs, path::PathBuf, sync::Arc};

use redb::{Builder, Database};
use tracing::info;

use crate::{
    errors::StoreError,
    tables::validator_registration::{VALIDATOR_REGISTRATION_TABLE, ValidatorRegistrationTable},
};

pub const REDB_FILE: &str = "ream.redb";

/// The size of the cache for the database
///
/// 64 MiB
pub const REDB_CACHE_SIZE: usize = 64 * 1_024 * 1_024;

#[derive(Clone, Debug)]
pub struct ReamDB {
    db: Arc<Database>,
}

impl ReamDB {
    pub fn new(data_dir: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&data_dir)?;
        let db = Builder::new()
            .set_cache_size(REDB_CACHE_SIZE)
            .create(data_dir.join(REDB_FILE))?;

        let write_txn = db.begin_write()?;
        write_txn.open_table(VALIDATOR_REGISTRATION_TABLE)?;
        write_txn.commit()?;

        info!("Opened database at {data_dir:?}");

        Ok(ReamDB { db: Arc::new(db) })
    }

    pub fn validator_registration_provider(&self) -> ValidatorRegistrationTable {
        ValidatorRegistrationTable {
            db: self.db.clone(),
        }
    }
}
