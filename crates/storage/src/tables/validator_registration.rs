use std::{any::type_name, sync::Arc};

use ream_consensus_misc::validator_registration::ValidatorRegistration;
use redb::{Database, Durability, TableDefinition};
use ssz::{Decode, Encode};

use crate::{errors::StoreError, tables::table::Table};

/// Table definition for the Validator Registration table
///
/// Key: validator_index
/// Value: SSZ encoded ValidatorRegistration
pub(crate) const VALIDATOR_REGISTRATION_TABLE: TableDefinition<u64, &[u8]> =
    TableDefinition::new("validator_registration");

pub struct ValidatorRegistrationTable {
    pub db: Arc<Database>,
}

impl Table for ValidatorRegistrationTable {
    type Key = u64;

    type Value = ValidatorRegistration;

    fn get(&self, key: Self::Key) -> Result<Option<Self::Value>, StoreError> {
        let read_txn = self.db.begin_read()?;

        let table = read_txn.open_table(VALIDATOR_REGISTRATION_TABLE)?;
        let Some(result) = table.get(key)? else {
            return Ok(None);
        };

        ValidatorRegistration::from_ssz_bytes(result.value())
            .map(Some)
            .map_err(|err| StoreError::Decode {
                type_name: type_name::<ValidatorRegistration>(),
                message: format!("{err:?}"),
            })
    }

    fn insert(&self, key: Self::Key, value: Self::Value) -> Result<(), StoreError> {
        self.insert_batch(vec![(key, value)])
    }

    fn insert_batch(&self, entries: Vec<(Self::Key, Self::Value)>) -> Result<(), StoreError> {
        let mut write_txn = self.db.begin_write()?;
        write_txn.set_durability(Durability::Immediate);
        let mut table = write_txn.open_table(VALIDATOR_REGISTRATION_TABLE)?;
        for (key, value) in entries {
            table.insert(key, value.as_ssz_bytes().as_slice())?;
        }
        drop(table);
        write_txn.commit()?;
        Ok(())
    }
}
